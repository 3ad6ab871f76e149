// ============================================================
// Layer 6 - Training Progress Line
// ============================================================
// Prints the in-place progress line during a training epoch:
//
//   Train Epoch: 3 [6400/50000 (13%)]	Loss: 0.734512
//
// Each line starts with '\r' so the terminal overwrites the
// previous one. A line is due roughly every 1/20th of the
// epoch:
//
//   interval = num_items / (20 * batch_size)     (integer division)
//   emit when (batch_idx + 1) % interval == 0
//
// When the interval works out to 0 (fewer than 20 batches'
// worth of items) nothing is printed for that epoch.
//
// Reference: Rust Book §12 (Writing to Standard Output)

use std::io::{self, Write};

/// Snapshot of one finished training batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchProgress {
    pub epoch:       usize,
    pub batch_idx:   usize,
    pub batch_size:  usize,
    pub num_items:   usize,
    pub num_batches: usize,
    /// Mean loss of this batch
    pub loss:        f64,
}

impl BatchProgress {
    /// Examples processed so far, assuming full batches
    pub fn processed(&self) -> usize {
        (self.batch_idx + 1) * self.batch_size
    }

    pub fn percent(&self) -> f64 {
        100.0 * (self.batch_idx + 1) as f64 / self.num_batches.max(1) as f64
    }
}

/// Batches between two progress lines, or None when no line should be
/// printed this epoch.
pub fn report_interval(num_items: usize, batch_size: usize) -> Option<usize> {
    num_items
        .checked_div(batch_size.saturating_mul(20))
        .filter(|&interval| interval > 0)
}

/// True when batch `batch_idx` should print a progress line.
pub fn is_report_due(batch_idx: usize, num_items: usize, batch_size: usize) -> bool {
    report_interval(num_items, batch_size)
        .is_some_and(|interval| (batch_idx + 1) % interval == 0)
}

pub fn format_progress(p: &BatchProgress) -> String {
    format!(
        "Train Epoch: {} [{}/{} ({:.0}%)]\tLoss: {:.6}",
        p.epoch,
        p.processed(),
        p.num_items,
        p.percent(),
        p.loss,
    )
}

/// Writes progress lines to a sink. Write errors are logged and
/// swallowed: a broken terminal must not abort a training run.
pub struct ProgressReporter<W: Write> {
    sink:    W,
    printed: bool,
}

impl ProgressReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ProgressReporter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, printed: false }
    }

    pub fn report(&mut self, p: &BatchProgress) {
        let result = write!(self.sink, "\r{}", format_progress(p)).and_then(|_| self.sink.flush());
        match result {
            Ok(())   => self.printed = true,
            Err(err) => tracing::warn!("Cannot write progress line: {}", err),
        }
    }

    /// End the in-place line so the next output starts on a fresh line.
    pub fn finish(&mut self) {
        if !self.printed {
            return;
        }
        if let Err(err) = writeln!(self.sink) {
            tracing::warn!("Cannot write progress line: {}", err);
        }
        self.printed = false;
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn progress(batch_idx: usize) -> BatchProgress {
        BatchProgress {
            epoch: 2,
            batch_idx,
            batch_size: 64,
            num_items: 6400,
            num_batches: 100,
            loss: 0.5,
        }
    }

    #[test]
    fn test_format_matches_expected_line() {
        assert_eq!(
            format_progress(&progress(4)),
            "Train Epoch: 2 [320/6400 (5%)]\tLoss: 0.500000"
        );
    }

    #[test]
    fn test_report_interval() {
        // 6400 / (20 * 64) = 5
        assert_eq!(report_interval(6400, 64), Some(5));
        assert!(is_report_due(4, 6400, 64));
        assert!(!is_report_due(5, 6400, 64));
    }

    #[test]
    fn test_small_dataset_never_reports() {
        // fewer than 20 * batch_size items → interval 0
        assert_eq!(report_interval(10, 4), None);
        assert_eq!(report_interval(0, 4), None);
        assert_eq!(report_interval(10, 0), None);
        assert!(!is_report_due(0, 10, 4));
    }

    #[test]
    fn test_reporter_writes_carriage_return_lines() {
        let mut out = Vec::new();
        let mut reporter = ProgressReporter::new(&mut out);
        reporter.report(&progress(4));
        reporter.report(&progress(9));
        reporter.finish();
        drop(reporter);

        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            "\rTrain Epoch: 2 [320/6400 (5%)]\tLoss: 0.500000\
             \rTrain Epoch: 2 [640/6400 (10%)]\tLoss: 0.500000\n"
        );
    }

    #[test]
    fn test_finish_without_reports_writes_nothing() {
        let mut out = Vec::new();
        ProgressReporter::new(&mut out).finish();
        assert!(out.is_empty());
    }
}
