//! Command handlers.
//!
//! Each handler is a thin wrapper: validate CLI input, call into the library
//! crates, format output for the terminal.

pub mod merge_voices;
pub mod serve;
pub mod voices;
