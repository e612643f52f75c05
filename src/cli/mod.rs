pub mod commands;
pub mod progress;
pub mod ui;
pub mod util;

pub use progress::{ConsoleProgress, ProgressState, format_bytes, format_duration};
pub use ui::Output;
pub use util::CommandContext;
