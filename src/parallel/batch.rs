//! Batch distribution for parallel fitting evaluation.
//!
//! Work is split into batches with [batch_ranges]; each batch runs in parallel on threads
//! held by one [WorkerPool] runner for the whole run, and cancellation is checked between batches. One item failing never
//! affects the others: failures are collected next to the successful results.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::data::provider::StaticDataProvider;
use crate::dogma::attributes::TypeId;
use crate::dogma::engine::{ComprehensiveFittingStats, DogmaEngine, FittingRequest};
use crate::effectiveness::{FittingEffectiveness, FittingEffectivenessCalculator};
use crate::error::{FittingError, FittingResult};
use crate::parallel::pool::WorkerPool;

/// Number of batches a run is split into; cancellation and progress are checked between them.
const BATCH_COUNT: usize = 16;

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; later batches may be smaller.
///
/// # Example
/// ```
/// # use eva_fitting::parallel::batch_ranges;
/// let ranges = batch_ranges(100, 4);
/// assert_eq!(ranges, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + if i < remainder { 1 } else { 0 };
        let end = start + size;
        ranges.push((start, end));
        start = end;
    }
    ranges
}

#[derive(Debug)]
pub struct BatchFailure {
    /// Position of the failed item in the input.
    pub index: usize,
    pub error: FittingError,
}

#[derive(Debug)]
pub struct BatchOutcome<R> {
    /// Successful results with their input positions, in input order.
    pub results: Vec<(usize, R)>,
    pub failures: Vec<BatchFailure>,
    /// Set when the run stopped early; items after the last finished batch were never started.
    pub cancelled: bool,
    pub total: usize,
}

impl<R> BatchOutcome<R> {
    pub fn completed(&self) -> usize {
        self.results.len() + self.failures.len()
    }
}

/// Evaluate `f` over `items` in parallel batches, reporting `on_progress(done, total)` after
/// each batch. Setting `cancel` stops the run before the next batch starts.
pub fn run_batch<T, R, F, G>(
    items: &[T],
    pool: &WorkerPool,
    cancel: &AtomicBool,
    mut on_progress: G,
    f: F,
) -> BatchOutcome<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> FittingResult<R> + Sync,
    G: FnMut(usize, usize),
{
    let total = items.len();
    let mut outcome = BatchOutcome {
        results: Vec::with_capacity(total),
        failures: Vec::new(),
        cancelled: false,
        total,
    };

    let runner = pool.runner();
    for (start, end) in batch_ranges(total, BATCH_COUNT) {
        if cancel.load(Ordering::Relaxed) {
            tracing::info!(done = start, total, "batch cancelled");
            outcome.cancelled = true;
            break;
        }
        let batch: Vec<(usize, FittingResult<R>)> = runner.install(|| {
            items[start..end]
                .par_iter()
                .enumerate()
                .map(|(offset, item)| (start + offset, f(item)))
                .collect()
        });
        for (index, result) in batch {
            match result {
                Ok(value) => outcome.results.push((index, value)),
                Err(error) => {
                    tracing::warn!(index, error = %error, "batch item failed");
                    outcome.failures.push(BatchFailure { index, error });
                }
            }
        }
        on_progress(end, total);
    }

    outcome
}

/// Run the dogma pipeline for every request.
pub fn evaluate_fittings<P: StaticDataProvider>(
    engine: &DogmaEngine<P>,
    requests: &[FittingRequest],
    pool: &WorkerPool,
    cancel: &AtomicBool,
) -> BatchOutcome<ComprehensiveFittingStats> {
    run_batch(requests, pool, cancel, |_, _| {}, |request| engine.calculate_fitting(request))
}

/// Score every request for one activity and order the successes by overall score, best first.
pub fn score_fittings<P: StaticDataProvider>(
    calculator: &FittingEffectivenessCalculator<P>,
    requests: &[FittingRequest],
    activity_id: &str,
    pool: &WorkerPool,
    cancel: &AtomicBool,
) -> BatchOutcome<FittingEffectiveness> {
    let mut outcome = run_batch(requests, pool, cancel, |_, _| {}, |request| {
        calculator.evaluate_request(request, activity_id, None)
    });
    outcome.results.sort_by(|(left_index, left), (right_index, right)| {
        right
            .overall_score
            .total_cmp(&left.overall_score)
            .then_with(|| left_index.cmp(right_index))
    });
    outcome
}

/// Hull type IDs of the failed items, for reporting.
pub fn failed_hulls(requests: &[FittingRequest], failures: &[BatchFailure]) -> Vec<TypeId> {
    failures
        .iter()
        .filter_map(|failure| requests.get(failure.index).map(|r| r.ship_type_id))
        .collect()
}
