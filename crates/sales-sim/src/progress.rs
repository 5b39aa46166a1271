//! Progress hooks for long simulations.

use crate::SimulationRun;

/// Observer notified as a simulation advances.
///
/// Every method defaults to a no-op so implementors only override what they show.
pub trait ProgressReporter {
    fn run_started(&mut self, _label: &str, _total_units: u64, _chunks: u64) {}

    /// Called after each chunk; `done` counts from 1 up to `chunks`.
    fn chunk_finished(&mut self, _label: &str, _done: u64, _chunks: u64) {}

    fn run_finished(&mut self, _run: &SimulationRun) {}
}

/// Reporter that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

impl<P: ProgressReporter + ?Sized> ProgressReporter for &mut P {
    fn run_started(&mut self, label: &str, total_units: u64, chunks: u64) {
        (**self).run_started(label, total_units, chunks)
    }

    fn chunk_finished(&mut self, label: &str, done: u64, chunks: u64) {
        (**self).chunk_finished(label, done, chunks)
    }

    fn run_finished(&mut self, run: &SimulationRun) {
        (**self).run_finished(run)
    }
}
