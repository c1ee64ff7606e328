use itertools::Itertools;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::mpsc;
use tracing::warn;

use crate::exercises::{self, Exercise};
use crate::store::PrefStore;
use crate::util::parse_flag;

const NAMESPACE: &str = "workout_goals";
const KEY_GOALS: &str = "goals";

/// Priority assigned to the first goal in an empty set
pub const DEFAULT_PRIORITY: i32 = 1;

/// A user-selected exercise with ordering priority and an active flag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Goal {
    pub exercise: &'static Exercise,
    pub selected: bool,
    pub priority: i32,
    pub active: bool,
}

/// Single source of truth for the goal set.
///
/// Goals are kept sorted by priority descending, persisted on every
/// mutation, and snapshots are pushed to subscribers so views never
/// poll. At most one goal is active at any time.
pub struct GoalRepository {
    store: Rc<dyn PrefStore>,
    goals: Vec<Goal>,
    subscribers: Vec<mpsc::Sender<Vec<Goal>>>,
}

impl GoalRepository {
    pub fn new(store: Rc<dyn PrefStore>) -> Self {
        let goals = match store.get(NAMESPACE, KEY_GOALS) {
            Some(raw) => parse_goals(&raw),
            None => Vec::new(),
        };
        Self {
            store,
            goals,
            subscribers: Vec::new(),
        }
    }

    /// Current goal set, highest priority first
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// Receive the current snapshot immediately, then one per mutation
    pub fn subscribe(&mut self) -> mpsc::Receiver<Vec<Goal>> {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(self.goals.clone());
        self.subscribers.push(tx);
        rx
    }

    /// Mark the exercise as a selected goal with the highest priority.
    ///
    /// An exercise already in the set is re-selected and moved to the
    /// top rather than duplicated.
    pub fn select_goal(&mut self, exercise: &'static Exercise) {
        let next_priority = self
            .goals
            .iter()
            .map(|g| g.priority)
            .max()
            .map_or(DEFAULT_PRIORITY, |max| max + 1);

        if let Some(goal) = self.goals.iter_mut().find(|g| g.exercise.id == exercise.id) {
            goal.selected = true;
            goal.priority = next_priority;
        } else {
            self.goals.push(Goal {
                exercise,
                selected: true,
                priority: next_priority,
                active: false,
            });
        }
        self.goals.sort_by(|a, b| b.priority.cmp(&a.priority));
        self.persist();
        self.publish();
    }

    /// Remove the goal for the exercise and renumber the remainder so
    /// priorities stay dense and descending
    pub fn deselect_goal(&mut self, exercise: &Exercise) {
        let before = self.goals.len();
        self.goals.retain(|g| g.exercise.id != exercise.id);
        if self.goals.len() == before {
            return;
        }
        let len = self.goals.len();
        for (index, goal) in self.goals.iter_mut().enumerate() {
            goal.priority = (len - index) as i32;
        }
        self.persist();
        self.publish();
    }

    /// Make this the single active goal. Every active flag is cleared
    /// first, so an exercise outside the set leaves no goal active.
    pub fn set_active_goal(&mut self, exercise: &Exercise) {
        for goal in self.goals.iter_mut() {
            goal.active = goal.exercise.id == exercise.id;
        }
        self.persist();
        self.publish();
    }

    pub fn clear_active_goal(&mut self) {
        for goal in self.goals.iter_mut() {
            goal.active = false;
        }
        self.persist();
        self.publish();
    }

    /// Up to `count` catalog exercises that are not already selected
    pub fn get_random_exercises(&self, count: usize) -> Vec<&'static Exercise> {
        let selected: HashSet<&str> = self
            .goals
            .iter()
            .filter(|g| g.selected)
            .map(|g| g.exercise.id)
            .collect();
        let available: Vec<&'static Exercise> = exercises::all()
            .iter()
            .filter(|e| !selected.contains(e.id))
            .collect();
        if available.len() <= count {
            return available;
        }
        available
            .choose_multiple(&mut rand::thread_rng(), count)
            .copied()
            .collect()
    }

    pub fn has_selected_goals(&self) -> bool {
        self.goals.iter().any(|g| g.selected)
    }

    pub fn get_active_goal(&self) -> Option<&Goal> {
        self.goals.iter().find(|g| g.active)
    }

    pub fn first_selected_goal(&self) -> Option<&Goal> {
        self.goals.iter().find(|g| g.selected)
    }

    fn persist(&self) {
        let blob = serialize_goals(&self.goals);
        if let Err(e) = self.store.put(NAMESPACE, KEY_GOALS, &blob) {
            warn!(error = %e, "failed to persist goal list");
        }
    }

    fn publish(&mut self) {
        let snapshot = self.goals.clone();
        self.subscribers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}

/// One record per goal: `exerciseId|selected|priority|active`, joined by `;`
fn serialize_goals(goals: &[Goal]) -> String {
    goals
        .iter()
        .map(|g| {
            format!(
                "{}|{}|{}|{}",
                g.exercise.id, g.selected, g.priority, g.active
            )
        })
        .join(";")
}

/// Records that are malformed or reference an unknown exercise are
/// dropped; survivors are sorted by priority descending
fn parse_goals(raw: &str) -> Vec<Goal> {
    let mut goals: Vec<Goal> = raw.split(';').filter_map(parse_record).collect();
    goals.sort_by(|a, b| b.priority.cmp(&a.priority));
    goals
}

fn parse_record(record: &str) -> Option<Goal> {
    let parts: Vec<&str> = record.split('|').collect();
    if parts.len() != 4 {
        if !record.is_empty() {
            warn!(record, "dropping malformed goal record");
        }
        return None;
    }
    let Some(exercise) = exercises::find(parts[0]) else {
        warn!(id = parts[0], "dropping goal for unknown exercise");
        return None;
    };
    let priority = match parts[2].parse::<i32>() {
        Ok(p) => p,
        Err(_) => {
            warn!(record, "dropping goal record with unreadable priority");
            return None;
        }
    };
    Some(Goal {
        exercise,
        selected: parse_flag(parts[1]),
        priority,
        active: parse_flag(parts[3]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn repo() -> GoalRepository {
        GoalRepository::new(Rc::new(Store::open_in_memory().unwrap()))
    }

    fn exercise(id: &str) -> &'static Exercise {
        exercises::find(id).unwrap()
    }

    fn assert_dense_descending(goals: &[Goal]) {
        let ids: HashSet<&str> = goals.iter().map(|g| g.exercise.id).collect();
        assert_eq!(ids.len(), goals.len(), "duplicate exercise ids");
        for (index, goal) in goals.iter().enumerate() {
            assert_eq!(
                goal.priority,
                (goals.len() - index) as i32,
                "priorities not dense descending: {:?}",
                goals.iter().map(|g| (g.exercise.id, g.priority)).collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn first_goal_gets_default_priority() {
        let mut repo = repo();
        repo.select_goal(exercise("push_ups"));
        assert_eq!(repo.goals().len(), 1);
        assert_eq!(repo.goals()[0].priority, DEFAULT_PRIORITY);
        assert!(repo.goals()[0].selected);
        assert!(!repo.goals()[0].active);
    }

    #[test]
    fn later_goals_stack_on_top() {
        let mut repo = repo();
        repo.select_goal(exercise("push_ups"));
        repo.select_goal(exercise("squats"));
        repo.select_goal(exercise("running"));

        let ids: Vec<&str> = repo.goals().iter().map(|g| g.exercise.id).collect();
        assert_eq!(ids, vec!["running", "squats", "push_ups"]);
        assert_dense_descending(repo.goals());
    }

    #[test]
    fn reselect_moves_goal_to_top_without_duplicating() {
        let mut repo = repo();
        repo.select_goal(exercise("push_ups"));
        repo.select_goal(exercise("squats"));
        repo.select_goal(exercise("push_ups"));

        let ids: Vec<&str> = repo.goals().iter().map(|g| g.exercise.id).collect();
        assert_eq!(ids, vec!["push_ups", "squats"]);
        assert_eq!(repo.goals()[0].priority, 3);
        assert_eq!(repo.goals()[1].priority, 2);
    }

    #[test]
    fn deselect_renumbers_dense_descending() {
        let mut repo = repo();
        repo.select_goal(exercise("push_ups"));
        repo.select_goal(exercise("squats"));
        repo.deselect_goal(exercise("squats"));

        assert_eq!(repo.goals().len(), 1);
        assert_eq!(repo.goals()[0].exercise.id, "push_ups");
        assert_eq!(repo.goals()[0].priority, 1);
    }

    #[test]
    fn deselect_middle_goal_keeps_relative_order() {
        let mut repo = repo();
        repo.select_goal(exercise("push_ups"));
        repo.select_goal(exercise("squats"));
        repo.select_goal(exercise("running"));
        repo.deselect_goal(exercise("squats"));

        let ids: Vec<&str> = repo.goals().iter().map(|g| g.exercise.id).collect();
        assert_eq!(ids, vec!["running", "push_ups"]);
        assert_dense_descending(repo.goals());
    }

    #[test]
    fn deselect_unknown_id_is_a_complete_noop() {
        let mut repo = repo();
        repo.select_goal(exercise("push_ups"));
        let rx = repo.subscribe();
        rx.try_recv().unwrap();

        repo.deselect_goal(exercise("squats"));

        assert_eq!(repo.goals().len(), 1);
        assert_dense_descending(repo.goals());
        assert!(rx.try_recv().is_err(), "absent id must not publish");
    }

    #[test]
    fn any_mutation_sequence_keeps_invariants() {
        let mut repo = repo();
        repo.select_goal(exercise("push_ups"));
        repo.select_goal(exercise("squats"));
        repo.select_goal(exercise("running"));
        repo.deselect_goal(exercise("push_ups"));
        repo.select_goal(exercise("cycling"));
        repo.select_goal(exercise("squats"));
        repo.deselect_goal(exercise("running"));
        assert_dense_descending(repo.goals());
    }

    #[test]
    fn at_most_one_goal_is_active() {
        let mut repo = repo();
        repo.select_goal(exercise("push_ups"));
        repo.select_goal(exercise("squats"));
        repo.set_active_goal(exercise("push_ups"));
        repo.set_active_goal(exercise("squats"));

        let active: Vec<&str> = repo
            .goals()
            .iter()
            .filter(|g| g.active)
            .map(|g| g.exercise.id)
            .collect();
        assert_eq!(active, vec!["squats"]);
    }

    #[test]
    fn set_active_for_unknown_exercise_clears_the_active_flag() {
        let mut repo = repo();
        repo.select_goal(exercise("push_ups"));
        repo.set_active_goal(exercise("push_ups"));
        repo.set_active_goal(exercise("tree_pose"));
        assert!(repo.get_active_goal().is_none());
        assert_eq!(repo.goals().len(), 1, "goal set itself is untouched");
    }

    #[test]
    fn clear_active_goal_clears_all() {
        let mut repo = repo();
        repo.select_goal(exercise("push_ups"));
        repo.set_active_goal(exercise("push_ups"));
        repo.clear_active_goal();
        assert!(repo.get_active_goal().is_none());
    }

    #[test]
    fn goals_survive_reload_through_shared_store() {
        let store: Rc<dyn PrefStore> = Rc::new(Store::open_in_memory().unwrap());
        {
            let mut repo = GoalRepository::new(Rc::clone(&store));
            repo.select_goal(exercise("push_ups"));
            repo.select_goal(exercise("squats"));
            repo.set_active_goal(exercise("squats"));
        }
        let repo = GoalRepository::new(store);
        let ids: Vec<&str> = repo.goals().iter().map(|g| g.exercise.id).collect();
        assert_eq!(ids, vec!["squats", "push_ups"]);
        assert_eq!(repo.get_active_goal().map(|g| g.exercise.id), Some("squats"));
    }

    #[test]
    fn blob_roundtrip_preserves_flags_and_priorities() {
        let goals = vec![
            Goal {
                exercise: exercise("squats"),
                selected: true,
                priority: 2,
                active: true,
            },
            Goal {
                exercise: exercise("push_ups"),
                selected: false,
                priority: 1,
                active: false,
            },
        ];
        let blob = serialize_goals(&goals);
        assert_eq!(blob, "squats|true|2|true;push_ups|false|1|false");
        assert_eq!(parse_goals(&blob), goals);
    }

    #[test]
    fn malformed_and_unknown_records_are_dropped() {
        let blob = "push_ups|true|2|false;bogus;squats|true|notanumber|false;phantom_lifts|true|1|false";
        let goals = parse_goals(blob);
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].exercise.id, "push_ups");
    }

    #[test]
    fn empty_blob_parses_to_empty_list() {
        assert!(parse_goals("").is_empty());
    }

    #[test]
    fn load_sorts_by_priority_descending() {
        let blob = "push_ups|true|1|false;squats|true|3|false;running|true|2|false";
        let goals = parse_goals(blob);
        let ids: Vec<&str> = goals.iter().map(|g| g.exercise.id).collect();
        assert_eq!(ids, vec!["squats", "running", "push_ups"]);
    }

    #[test]
    fn random_exercises_exclude_selected_goals() {
        let mut repo = repo();
        repo.select_goal(exercise("push_ups"));
        repo.select_goal(exercise("running"));

        let suggestions = repo.get_random_exercises(5);
        assert_eq!(suggestions.len(), 5);
        let ids: HashSet<&str> = suggestions.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), 5, "duplicate suggestions");
        assert!(!ids.contains("push_ups"));
        assert!(!ids.contains("running"));
    }

    #[test]
    fn random_exercises_return_whole_pool_when_small() {
        let mut repo = repo();
        for e in exercises::all() {
            repo.select_goal(e);
        }
        repo.deselect_goal(exercise("tree_pose"));
        repo.deselect_goal(exercise("planks"));

        let suggestions = repo.get_random_exercises(5);
        let ids: HashSet<&str> = suggestions.iter().map(|e| e.id).collect();
        assert_eq!(ids, HashSet::from(["tree_pose", "planks"]));
    }

    #[test]
    fn has_selected_goals_ignores_unselected_records() {
        let store: Rc<dyn PrefStore> = Rc::new(Store::open_in_memory().unwrap());
        store
            .put(NAMESPACE, KEY_GOALS, "push_ups|false|1|false")
            .unwrap();
        let repo = GoalRepository::new(store);
        assert_eq!(repo.goals().len(), 1);
        assert!(!repo.has_selected_goals());
    }

    #[test]
    fn subscribers_get_current_snapshot_then_updates() {
        let mut repo = repo();
        repo.select_goal(exercise("push_ups"));

        let rx = repo.subscribe();
        let initial = rx.try_recv().unwrap();
        assert_eq!(initial.len(), 1);

        repo.select_goal(exercise("squats"));
        let updated = rx.try_recv().unwrap();
        assert_eq!(updated.len(), 2);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_subscribers_are_pruned_on_publish() {
        let mut repo = repo();
        let rx = repo.subscribe();
        drop(rx);
        repo.select_goal(exercise("push_ups"));

        let rx2 = repo.subscribe();
        repo.select_goal(exercise("squats"));
        assert_eq!(rx2.try_recv().unwrap().len(), 1);
        assert_eq!(rx2.try_recv().unwrap().len(), 2);
    }
}
