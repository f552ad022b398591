//! Library surface of the autocommit agent
//!
//! The binary wires these together; integration tests drive them directly.

pub mod logging;
pub mod reporter;
pub mod supervisor;

pub use reporter::DesktopReporter;
pub use supervisor::Supervisor;
