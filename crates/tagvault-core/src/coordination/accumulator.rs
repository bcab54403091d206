//! Shared accumulator for attempt-all rounds.
//!
//! The only mutable state shared between concurrent attempts. Each attempt
//! records exactly once; attempts whose task died before recording are
//! back-filled as aborted after the join.

use std::sync::{Mutex, PoisonError};

use crate::outcome::AttemptError;

pub(crate) type AttemptResult<S> = Result<S, AttemptError>;

#[derive(Debug)]
pub(crate) struct Accumulator<S> {
    entries: Mutex<Vec<(usize, AttemptResult<S>)>>,
}

impl<S> Accumulator<S> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Record the result of attempt `index`.
    pub(crate) fn record(&self, index: usize, result: AttemptResult<S>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((index, result));
    }

    /// Take every entry, ordered by attempt index, back-filling indices in
    /// `0..expected` that never recorded.
    pub(crate) fn drain(&self, expected: usize) -> Vec<(usize, AttemptResult<S>)> {
        let mut entries =
            std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner));
        for index in 0..expected {
            if !entries.iter().any(|(i, _)| *i == index) {
                entries.push((
                    index,
                    Err(AttemptError::Aborted(
                        "attempt task ended without reporting".to_string(),
                    )),
                ));
            }
        }
        entries.sort_by_key(|(i, _)| *i);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_orders_and_backfills() {
        let acc: Accumulator<()> = Accumulator::with_capacity(3);
        acc.record(2, Ok(()));
        acc.record(0, Err(AttemptError::Cancelled));

        let entries = acc.drain(3);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], (0, Err(AttemptError::Cancelled)));
        assert!(matches!(entries[1], (1, Err(AttemptError::Aborted(_)))));
        assert_eq!(entries[2], (2, Ok(())));
    }
}
