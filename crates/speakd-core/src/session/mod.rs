//! Session orchestration: chunk accumulation, registry, and throughput stats.
//!
//! A session is one logical utterance split across several `speak` chunks.
//! [`SessionRegistry`] owns every open session; [`SessionLease`] gives one
//! `speak` exclusive access to its session for the duration of the request.

mod accumulator;
mod registry;
mod stats;

pub use accumulator::AudioAccumulator;
pub use registry::{FinalizedSession, SessionInfo, SessionLease, SessionOptions, SessionRegistry};
pub use stats::SessionStats;
