pub mod fs;
pub mod logging;

pub use logging::preview;
