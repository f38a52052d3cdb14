use crate::upload::SubmitMode;
use tracing::trace;

// Trace-level counters; a metrics backend can subscribe to the
// `stocksync.metrics` target without the core depending on one.

pub fn batch_submitted(
    marketplace: &'static str,
    operation: &'static str,
    size: usize,
    mode: SubmitMode,
) {
    trace!(
        target = "stocksync.metrics",
        marketplace = marketplace,
        operation = operation,
        size = size as u64,
        dry_run = mode == SubmitMode::DryRun,
        "batches_submitted_inc"
    );
}

pub fn stage_elapsed(stage: &str, elapsed_ms: u128) {
    trace!(
        target = "stocksync.metrics",
        stage = stage,
        elapsed_ms = elapsed_ms as u64,
        "stage_elapsed"
    );
}
