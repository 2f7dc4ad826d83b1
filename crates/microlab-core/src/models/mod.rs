//! Domain models for the microlab system.

mod answers;
mod exam;
mod patient;
mod template;

pub use answers::*;
pub use exam::*;
pub use patient::*;
pub use template::*;
