// Engine modules, shared with the integration tests.
// The TUI layer stays in main.rs so this surface has no terminal coupling.
pub mod app_dirs;
pub mod exercises;
pub mod goals;
pub mod runtime;
pub mod sessions;
pub mod store;
pub mod summary;
pub mod tracker;
pub mod util;
