//! Adaptive inter-request pacing for batch runs.
//!
//! Tracks one delay per provider. A rate-limit-class failure doubles that
//! provider's delay up to a cap; a streak of successes halves it back toward
//! the base. The batch orchestrator sleeps the worst current delay (plus
//! jitter) between rows, so a throttled provider slows the batch down only
//! as long as it keeps rejecting requests.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;

use crate::types::{LookupOutcome, ProviderKind};

/// Consecutive successes required before a provider's delay decays.
const DECAY_AFTER_SUCCESSES: u32 = 3;

#[derive(Debug, Clone, Copy)]
struct ProviderPace {
    delay_ms: u64,
    success_streak: u32,
}

/// Per-provider pacing state shared across a batch run.
#[derive(Debug)]
pub struct AdaptivePacer {
    base_ms: u64,
    max_ms: u64,
    state: Mutex<HashMap<ProviderKind, ProviderPace>>,
}

impl AdaptivePacer {
    #[must_use]
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_ms,
            max_ms: max_ms.max(base_ms),
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Feeds one lookup outcome into the pacing state.
    ///
    /// Only rate-limit-class failures (auth/quota rejections) escalate the
    /// delay. Other failures reset the success streak without escalating:
    /// a timeout says nothing about quotas, so it neither backs off further
    /// nor counts toward decay.
    pub fn record(&self, kind: ProviderKind, outcome: &LookupOutcome) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let pace = state.entry(kind).or_insert(ProviderPace {
            delay_ms: self.base_ms,
            success_streak: 0,
        });

        match outcome {
            LookupOutcome::Success { .. } => {
                pace.success_streak += 1;
                if pace.success_streak >= DECAY_AFTER_SUCCESSES && pace.delay_ms > self.base_ms {
                    pace.delay_ms = (pace.delay_ms / 2).max(self.base_ms);
                    pace.success_streak = 0;
                    tracing::debug!(
                        provider = %kind,
                        delay_ms = pace.delay_ms,
                        "pacing delay decayed after sustained success"
                    );
                }
            }
            LookupOutcome::Unavailable { reason } if reason.is_rate_limit_class() => {
                pace.success_streak = 0;
                let escalated = pace.delay_ms.saturating_mul(2).min(self.max_ms);
                if escalated != pace.delay_ms {
                    pace.delay_ms = escalated;
                    tracing::warn!(
                        provider = %kind,
                        delay_ms = pace.delay_ms,
                        "rate-limit response — pacing delay escalated"
                    );
                }
            }
            LookupOutcome::Unavailable { .. } => {
                pace.success_streak = 0;
            }
        }
    }

    /// Current delay for one provider, in milliseconds.
    #[must_use]
    pub fn current_delay_ms(&self, kind: ProviderKind) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(self.base_ms, |pace| pace.delay_ms)
    }

    /// The delay a batch should observe before its next row: the worst
    /// current delay across all providers.
    #[must_use]
    pub fn row_delay_ms(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|pace| pace.delay_ms)
            .max()
            .unwrap_or(self.base_ms)
    }

    /// Sleeps for the current row delay plus up to 25% jitter.
    pub async fn pause(&self) {
        let delay_ms = self.row_delay_ms();
        let jitter_cap = delay_ms / 4;
        let jitter = if jitter_cap > 0 {
            rand::rng().random_range(0..=jitter_cap)
        } else {
            0
        };
        tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
    }
}
