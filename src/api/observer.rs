//! Per-call instrumentation hook for the HTTP handlers.

use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Outcome {
    Success,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

pub trait InvocationObserver: Send + Sync {
    fn observe(&self, entity: &'static str, outcome: Outcome);
}

/// Counts invocations by `(entity, outcome)`.
#[derive(Default)]
pub struct InvocationCounter {
    counts: Mutex<BTreeMap<(&'static str, Outcome), u64>>,
}

impl InvocationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, entity: &'static str, outcome: Outcome) -> u64 {
        self.counts
            .lock()
            .map(|counts| counts.get(&(entity, outcome)).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl InvocationObserver for InvocationCounter {
    fn observe(&self, entity: &'static str, outcome: Outcome) {
        tracing::debug!("api invocation entity={} status={}", entity, outcome.as_str());
        match self.counts.lock() {
            Ok(mut counts) => *counts.entry((entity, outcome)).or_insert(0) += 1,
            Err(_) => tracing::warn!("invocation counter lock poisoned"),
        }
    }
}
