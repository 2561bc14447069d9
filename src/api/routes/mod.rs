//! API route modules.

pub mod calls;
pub mod dashboard;
pub mod process;
pub mod recording;
