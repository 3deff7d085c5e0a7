//! Data models for the loyalty tracker.
//!
//! Field names are snake_case on the wire and match what the frontend reads.

mod change_log;
mod company;
mod dashboard;
mod member;
mod postit;

pub use change_log::*;
pub use company::*;
pub use dashboard::*;
pub use member::*;
pub use postit::*;
