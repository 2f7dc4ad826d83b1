//! Export functionality for exam history.

mod history;

pub use history::*;
