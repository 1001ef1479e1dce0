//! Monotonic progress reporting.

/// Share of the run before recognition starts.
pub const LOADED: u8 = 10;

/// Share of the run once recognition is done.
pub const RECOGNIZED: u8 = 90;

/// Finished.
pub const DONE: u8 = 100;

/// Map engine progress (0..=100) into the 10..=90 band of the whole run.
pub fn remap_engine_progress(engine: u8) -> u8 {
    let engine = engine.min(100) as f32;
    LOADED + (engine * 0.8).round() as u8
}

/// Forwards progress to a callback, dropping values that would go backwards
/// or repeat, and clamping to 100.
pub struct ProgressReporter<F: FnMut(u8)> {
    callback: F,
    last: Option<u8>,
}

impl<F: FnMut(u8)> ProgressReporter<F> {
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            last: None,
        }
    }

    pub fn report(&mut self, value: u8) {
        let value = value.min(DONE);
        if self.last.is_none_or(|last| value > last) {
            self.last = Some(value);
            (self.callback)(value);
        }
    }

    /// Last value delivered to the callback.
    pub fn last(&self) -> Option<u8> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remap_engine_progress() {
        assert_eq!(remap_engine_progress(0), 10);
        assert_eq!(remap_engine_progress(50), 50);
        assert_eq!(remap_engine_progress(33), 36);
        assert_eq!(remap_engine_progress(100), 90);
        assert_eq!(remap_engine_progress(250), 90);
    }

    #[test]
    fn test_reporter_is_monotonic() {
        let mut seen = Vec::new();
        {
            let mut reporter = ProgressReporter::new(|p| seen.push(p));
            for p in [0, 10, 10, 5, 42, 30, 90, 200] {
                reporter.report(p);
            }
            assert_eq!(reporter.last(), Some(100));
        }
        assert_eq!(seen, vec![0, 10, 42, 90, 100]);
    }
}
