//! Global wall-clock budget.

use std::time::{Duration, Instant};

/// A deadline fixed once at construction. Every consumer asks for what is
/// left, so sequential sub-solves can never spend more than the budget.
#[derive(Clone, Copy, Debug)]
pub struct TimeLimit {
    started: Instant,
    budget: Option<Duration>,
}

impl TimeLimit {
    pub fn new(budget: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left; `None` without a budget.
    pub fn remaining(&self) -> Option<Duration> {
        self.budget.map(|b| b.saturating_sub(self.elapsed()))
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining().is_some_and(|r| r.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn unlimited_never_runs_out() {
        let t = TimeLimit::unlimited();
        assert_eq!(t.remaining(), None);
        assert!(!t.is_exhausted());
    }

    #[test]
    fn sequential_slices_fit_the_budget() {
        let budget = Duration::from_millis(60);
        let t = TimeLimit::new(Some(budget));
        let mut spent = Duration::ZERO;
        for _ in 0..4 {
            let slice = t.remaining().expect("bounded");
            let step = slice.min(Duration::from_millis(25));
            let before = Instant::now();
            thread::sleep(step);
            spent += before.elapsed();
        }
        assert!(t.is_exhausted());
        // Sleep overshoot is the only slack.
        assert!(spent <= budget + Duration::from_millis(40), "spent {spent:?}");
    }
}
