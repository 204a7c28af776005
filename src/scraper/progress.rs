/// Receives progress checkpoints from a running scrape.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8, message: &str);
}

/// Tracks the last value sent so session checkpoints never go backwards
/// and stay below 100 until the owner finalizes.
#[derive(Debug, Default)]
pub(crate) struct Checkpoints {
    last: u8,
}

impl Checkpoints {
    pub(crate) const CEILING: u8 = 99;

    pub(crate) fn emit(&mut self, sink: &dyn ProgressSink, percent: u8, message: &str) {
        self.last = self.last.max(percent.min(Self::CEILING));
        sink.report(self.last, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<u8>>);

    impl ProgressSink for Recorder {
        fn report(&self, percent: u8, _message: &str) {
            self.0.lock().unwrap().push(percent);
        }
    }

    #[test]
    fn test_checkpoints_monotonic_and_capped() {
        let sink = Recorder::default();
        let mut cp = Checkpoints::default();
        for p in [5, 25, 20, 100, 40] {
            cp.emit(&sink, p, "step");
        }
        assert_eq!(*sink.0.lock().unwrap(), vec![5, 25, 25, 99, 99]);
    }
}
