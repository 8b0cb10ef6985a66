//! Bounded-retry accounting for the generators' search loops.
//!
//! Every loop that could spin on a pathological configuration (disjointness
//! search, inverse pairing, triple sampling, oversampling) owns a
//! [`StallGuard`]. The guard counts consecutive unproductive attempts and
//! breaks the loop with [`LoopOutcome::Stalled`] once the budget is spent.

use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;

/// How a bounded loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoopOutcome {
    /// The loop reached its target.
    Reached,
    /// The loop gave up after this many consecutive unproductive attempts.
    Stalled { attempts: usize },
}

impl LoopOutcome {
    pub fn is_reached(self) -> bool {
        matches!(self, LoopOutcome::Reached)
    }
}

#[derive(Debug, Clone)]
pub struct StallGuard {
    limit: usize,
    misses: usize,
}

impl StallGuard {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            misses: 0,
        }
    }

    /// Record one attempt. Progress resets the miss counter; a miss that
    /// exhausts the budget breaks with the stalled outcome.
    pub fn record(&mut self, progress: bool) -> ControlFlow<LoopOutcome> {
        if progress {
            self.misses = 0;
            return ControlFlow::Continue(());
        }
        self.misses += 1;
        if self.misses >= self.limit {
            ControlFlow::Break(LoopOutcome::Stalled {
                attempts: self.misses,
            })
        } else {
            ControlFlow::Continue(())
        }
    }

    pub fn reset(&mut self) {
        self.misses = 0;
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}
