// Export modules for use in tests
pub mod app;
pub mod clipboard;
pub mod emphasis;
pub mod escape;
pub mod event_source;
pub mod export;
pub mod lines;
pub mod markup;
pub mod notification;
pub mod panic_handler;
pub mod settings;
pub mod syntax_highlighter;
pub mod theme;
pub mod transient;
pub mod viewer;

pub mod test_utils;

pub use app::{App, AppAction, run_app_with_event_source};
pub use emphasis::EmphasisSet;
pub use viewer::{CodeViewer, SourceDocument};
