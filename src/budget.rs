//! Wall-clock budget for one conversion request.
//!
//! A [`RenderBudget`] is created once when a request starts and passed
//! explicitly into the batch loop. Before each URL is attempted the loop
//! asks [`RenderBudget::should_abort`]; once the usable budget is spent no
//! new render starts, while a render already in flight runs to its own
//! per-operation timeout.
//!
//! ```text
//! start                         start + hard_deadline - safety_margin
//!   |------------ usable --------------|---- margin ----|
//!   ^ URL 1  ^ URL 2  ^ URL 3          ^ checks from here on abort
//! ```

use std::time::{Duration, Instant};

/// Time left before `start + hard_deadline - safety_margin`, measured at `now`.
///
/// Saturates at zero once the usable window has passed.
///
/// # Example
///
/// ```rust
/// use std::time::{Duration, Instant};
/// use url2pdf_api::budget::remaining_budget_at;
///
/// let start = Instant::now();
/// let left = remaining_budget_at(
///     start,
///     Duration::from_secs(10),
///     Duration::from_secs(2),
///     start + Duration::from_secs(3),
/// );
/// assert_eq!(left, Duration::from_secs(5));
/// ```
pub fn remaining_budget_at(
    start: Instant,
    hard_deadline: Duration,
    safety_margin: Duration,
    now: Instant,
) -> Duration {
    let usable = hard_deadline.saturating_sub(safety_margin);
    let elapsed = now.saturating_duration_since(start);
    usable.saturating_sub(elapsed)
}

/// [`remaining_budget_at`] measured against the current instant.
pub fn remaining_budget(start: Instant, hard_deadline: Duration, safety_margin: Duration) -> Duration {
    remaining_budget_at(start, hard_deadline, safety_margin, Instant::now())
}

/// Budget for one request, fixed at request start.
#[derive(Debug, Clone, Copy)]
pub struct RenderBudget {
    start: Instant,
    hard_deadline: Duration,
    safety_margin: Duration,
}

impl RenderBudget {
    /// Budget starting at `start` with `hard_deadline` measured from it.
    pub fn new(start: Instant, hard_deadline: Duration, safety_margin: Duration) -> Self {
        Self {
            start,
            hard_deadline,
            safety_margin,
        }
    }

    /// Budget starting now.
    pub fn starting_now(hard_deadline: Duration, safety_margin: Duration) -> Self {
        Self::new(Instant::now(), hard_deadline, safety_margin)
    }

    /// Budget starting now and ending at an absolute host deadline.
    ///
    /// A deadline already in the past yields an exhausted budget.
    pub fn until(deadline: Instant, safety_margin: Duration) -> Self {
        let start = Instant::now();
        Self::new(
            start,
            deadline.saturating_duration_since(start),
            safety_margin,
        )
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn hard_deadline(&self) -> Duration {
        self.hard_deadline
    }

    pub fn safety_margin(&self) -> Duration {
        self.safety_margin
    }

    /// Time elapsed since the budget started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Usable time left right now.
    pub fn remaining(&self) -> Duration {
        self.remaining_at(Instant::now())
    }

    /// Usable time left at `now`.
    pub fn remaining_at(&self, now: Instant) -> Duration {
        remaining_budget_at(self.start, self.hard_deadline, self.safety_margin, now)
    }

    /// Whether no further unit of work may start at `now`.
    ///
    /// True once elapsed time reaches `hard_deadline - safety_margin`.
    pub fn should_abort_at(&self, now: Instant) -> bool {
        self.remaining_at(now).is_zero()
    }

    /// [`should_abort_at`](Self::should_abort_at) for the current instant.
    pub fn should_abort(&self) -> bool {
        self.should_abort_at(Instant::now())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: Duration = Duration::from_secs(10);
    const MARGIN: Duration = Duration::from_secs(2);

    /// Verifies remaining = deadline - elapsed - margin.
    #[test]
    fn test_remaining_budget_subtracts_margin() {
        let start = Instant::now();

        assert_eq!(
            remaining_budget_at(start, LIMIT, MARGIN, start),
            Duration::from_secs(8)
        );
        assert_eq!(
            remaining_budget_at(start, LIMIT, MARGIN, start + Duration::from_millis(7_500)),
            Duration::from_millis(500)
        );
    }

    /// Verifies the budget saturates instead of going negative.
    #[test]
    fn test_remaining_budget_saturates() {
        let start = Instant::now();

        assert_eq!(
            remaining_budget_at(start, LIMIT, MARGIN, start + Duration::from_secs(30)),
            Duration::ZERO
        );
        assert_eq!(
            remaining_budget_at(start, MARGIN, LIMIT, start),
            Duration::ZERO,
            "margin larger than deadline leaves nothing usable"
        );
    }

    /// Verifies the abort decision flips exactly at deadline - margin.
    #[test]
    fn test_should_abort_threshold() {
        let start = Instant::now();
        let budget = RenderBudget::new(start, LIMIT, MARGIN);

        assert!(!budget.should_abort_at(start));
        assert!(!budget.should_abort_at(start + Duration::from_millis(7_999)));
        assert!(budget.should_abort_at(start + Duration::from_secs(8)));
        assert!(budget.should_abort_at(start + Duration::from_millis(8_001)));
    }

    /// Verifies a fresh budget is usable and a past deadline is not.
    #[test]
    fn test_budget_constructors() {
        let budget = RenderBudget::starting_now(LIMIT, MARGIN);
        assert!(!budget.should_abort());
        assert!(budget.remaining() <= Duration::from_secs(8));
        assert_eq!(budget.hard_deadline(), LIMIT);
        assert_eq!(budget.safety_margin(), MARGIN);

        let expired = RenderBudget::until(Instant::now(), MARGIN);
        assert!(expired.should_abort());
        assert_eq!(expired.remaining(), Duration::ZERO);
    }
}
