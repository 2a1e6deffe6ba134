//! Headless prompt: stdin lines drive the capture controller.

pub mod command;
pub mod terminal;

pub use command::PromptCommand;
pub use terminal::{describe_event, render_library, run_terminal, TerminalSink};
