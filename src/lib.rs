//! Command line tracker for the time you spend on tasks. Every start/pause pair
//! is recorded as a session interval, tasks carry tags, and recorded time can be
//! broken down by tag and by calendar day straight from the terminal.
//!

pub mod cli;
pub mod core;
pub mod storage;
pub mod utils;
