//! Replay engine for re-issuing captured traffic
//!
//! The [`Scheduler`] feeds records into a bounded queue, a [`WorkerPool`]
//! drains it, and each worker runs [`replay_record`] on what it takes.
//! All of them observe one cancellation scope.

mod engine;
mod pool;
mod procedure;
mod scheduler;

pub use engine::ReplayEngine;
pub use pool::{ReplayStats, ReplaySummary, WorkerPool};
pub use procedure::{build_request, replay_record, Outcome};
pub use scheduler::{Cycle, Scheduler, WorkReceiver};
