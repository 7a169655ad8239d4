pub mod batch;
pub mod pool;

pub use batch::{batch_ranges, evaluate_fittings, run_batch, score_fittings, BatchFailure, BatchOutcome};
pub use pool::{BatchRunner, WorkerPool};
