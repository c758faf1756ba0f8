use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Per-provider hourly usage budget,
/// the typed equivalent of the original's `usage_counts`/`hourly_limits`
/// pair with its own one-hour reset.
pub struct ProviderBudget {
    hourly_limit: u32,
    state: Mutex<BudgetState>,
}

struct BudgetState {
    used: u32,
    window_started_at: Instant,
}

const RESET_WINDOW: Duration = Duration::from_secs(3600);

impl ProviderBudget {
    pub fn new(hourly_limit: u32) -> Self {
        Self {
            hourly_limit,
            state: Mutex::new(BudgetState {
                used: 0,
                window_started_at: Instant::now(),
            }),
        }
    }

    fn reset_if_expired(&self, state: &mut BudgetState) {
        if state.window_started_at.elapsed() >= RESET_WINDOW {
            state.used = 0;
            state.window_started_at = Instant::now();
        }
    }

    pub fn can_use(&self) -> bool {
        let mut state = self.state.lock();
        self.reset_if_expired(&mut state);
        state.used < self.hourly_limit
    }

    pub fn record_use(&self) {
        let mut state = self.state.lock();
        self.reset_if_expired(&mut state);
        state.used += 1;
    }

    /// Marks the provider as fully saturated until the window resets,
    /// mirroring the original's "set usage to the limit" on a rate error.
    pub fn mark_saturated(&self) {
        let mut state = self.state.lock();
        state.used = self.hourly_limit;
    }

    pub fn status(&self) -> BudgetStatus {
        let mut state = self.state.lock();
        self.reset_if_expired(&mut state);
        BudgetStatus {
            used: state.used,
            limit: self.hourly_limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetStatus {
    pub used: u32,
    pub limit: u32,
}

impl BudgetStatus {
    pub fn available(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }

    pub fn percentage(&self) -> f64 {
        if self.limit == 0 {
            0.0
        } else {
            self.used as f64 / self.limit as f64 * 100.0
        }
    }
}
