use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Broad training category an exercise belongs to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExerciseCategory {
    Strength,
    Cardio,
    Flexibility,
    Balance,
    Sports,
}

impl ExerciseCategory {
    /// Estimated calories burned per whole minute of exercise
    pub fn calories_per_minute(&self) -> i32 {
        match self {
            ExerciseCategory::Cardio => 8,
            ExerciseCategory::Sports => 7,
            ExerciseCategory::Strength => 6,
            ExerciseCategory::Balance => 4,
            ExerciseCategory::Flexibility => 3,
        }
    }
}

/// Muscle groups used to describe what an exercise works
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Forearms,
    Abs,
    Glutes,
    Quads,
    Hamstrings,
    Calves,
    #[strum(serialize = "Full Body")]
    FullBody,
}

/// Static catalog entry; never created or destroyed at runtime
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exercise {
    pub id: &'static str,
    pub name: &'static str,
    pub category: ExerciseCategory,
    pub muscle_groups: &'static [MuscleGroup],
}

/// Owned copy of a catalog entry, embedded in persisted session records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecord {
    pub id: String,
    pub name: String,
    pub category: ExerciseCategory,
    pub muscle_groups: Vec<MuscleGroup>,
}

impl From<&Exercise> for ExerciseRecord {
    fn from(exercise: &Exercise) -> Self {
        Self {
            id: exercise.id.to_string(),
            name: exercise.name.to_string(),
            category: exercise.category,
            muscle_groups: exercise.muscle_groups.to_vec(),
        }
    }
}

use ExerciseCategory::*;
use MuscleGroup::*;

pub const EXERCISES: &[Exercise] = &[
    // Strength
    Exercise {
        id: "push_ups",
        name: "Push-ups",
        category: Strength,
        muscle_groups: &[Chest, Triceps, Shoulders],
    },
    Exercise {
        id: "pull_ups",
        name: "Pull-ups",
        category: Strength,
        muscle_groups: &[Back, Biceps, Shoulders],
    },
    Exercise {
        id: "squats",
        name: "Squats",
        category: Strength,
        muscle_groups: &[Quads, Glutes, Abs],
    },
    Exercise {
        id: "deadlifts",
        name: "Deadlifts",
        category: Strength,
        muscle_groups: &[Back, Glutes, Hamstrings],
    },
    Exercise {
        id: "planks",
        name: "Planks",
        category: Strength,
        muscle_groups: &[Abs],
    },
    // Cardio
    Exercise {
        id: "running",
        name: "Running",
        category: Cardio,
        muscle_groups: &[FullBody],
    },
    Exercise {
        id: "cycling",
        name: "Cycling",
        category: Cardio,
        muscle_groups: &[Quads, Glutes, Calves],
    },
    Exercise {
        id: "jumping_jacks",
        name: "Jumping Jacks",
        category: Cardio,
        muscle_groups: &[FullBody],
    },
    Exercise {
        id: "burpees",
        name: "Burpees",
        category: Cardio,
        muscle_groups: &[FullBody],
    },
    Exercise {
        id: "mountain_climbers",
        name: "Mountain Climbers",
        category: Cardio,
        muscle_groups: &[Abs, Shoulders],
    },
    // Flexibility
    Exercise {
        id: "yoga_stretches",
        name: "Yoga Stretches",
        category: Flexibility,
        muscle_groups: &[FullBody],
    },
    Exercise {
        id: "hamstring_stretches",
        name: "Hamstring Stretches",
        category: Flexibility,
        muscle_groups: &[Hamstrings, Glutes],
    },
    Exercise {
        id: "hip_flexor_stretches",
        name: "Hip Flexor Stretches",
        category: Flexibility,
        muscle_groups: &[Glutes, Quads],
    },
    Exercise {
        id: "shoulder_stretches",
        name: "Shoulder Stretches",
        category: Flexibility,
        muscle_groups: &[Shoulders, Back],
    },
    Exercise {
        id: "chest_stretches",
        name: "Chest Stretches",
        category: Flexibility,
        muscle_groups: &[Chest, Shoulders],
    },
    // Balance
    Exercise {
        id: "single_leg_stands",
        name: "Single Leg Stands",
        category: Balance,
        muscle_groups: &[Quads, Glutes, Abs],
    },
    Exercise {
        id: "tree_pose",
        name: "Tree Pose",
        category: Balance,
        muscle_groups: &[Quads, Glutes, Abs],
    },
    Exercise {
        id: "heel_to_toe_walk",
        name: "Heel to Toe Walk",
        category: Balance,
        muscle_groups: &[Calves, Abs],
    },
    // Sports
    Exercise {
        id: "basketball_drills",
        name: "Basketball Drills",
        category: Sports,
        muscle_groups: &[FullBody],
    },
    Exercise {
        id: "soccer_drills",
        name: "Soccer Drills",
        category: Sports,
        muscle_groups: &[Quads, Glutes, Calves],
    },
    Exercise {
        id: "tennis_drills",
        name: "Tennis Drills",
        category: Sports,
        muscle_groups: &[Shoulders, Biceps, Quads],
    },
];

pub fn all() -> &'static [Exercise] {
    EXERCISES
}

pub fn find(id: &str) -> Option<&'static Exercise> {
    EXERCISES.iter().find(|e| e.id == id)
}

pub fn by_category(category: ExerciseCategory) -> Vec<&'static Exercise> {
    EXERCISES.iter().filter(|e| e.category == category).collect()
}

pub fn by_muscle_group(group: MuscleGroup) -> Vec<&'static Exercise> {
    EXERCISES
        .iter()
        .filter(|e| e.muscle_groups.contains(&group))
        .collect()
}
