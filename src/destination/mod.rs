//! Places a formatted line can be written to
//!
//! Every destination serializes its own writes, so a logger can hand the same
//! line to several destinations from any number of threads.

mod console;
mod memory;
pub mod policy;
pub mod retention;
mod rotating;

pub use console::ConsoleDestination;
pub use memory::MemoryDestination;
pub use policy::{Clock, ManualClock, RotateWhen, RotationPolicy, SystemClock};
pub use rotating::RotatingFileDestination;

use crate::error::DestinationWriteError;

/// A sink for formatted log lines
pub trait Destination: Send + Sync {
    /// Write `line` followed by a newline
    fn write_line(&self, line: &str) -> Result<(), DestinationWriteError>;

    fn flush(&self) -> Result<(), DestinationWriteError> {
        Ok(())
    }
}
