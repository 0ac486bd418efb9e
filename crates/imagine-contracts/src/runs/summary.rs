use std::path::PathBuf;
use std::time::Duration;

use crate::errors::ErrorCategory;

/// Result of one target, kept in order as the run's outcome log.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetOutcome {
    Success {
        key: String,
        path: PathBuf,
        elapsed: Duration,
    },
    Failure {
        key: String,
        category: ErrorCategory,
        message: String,
    },
}

impl TargetOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub success_count: u64,
    pub failure_count: u64,
}

impl RunSummary {
    pub fn record(self, outcome: &TargetOutcome) -> Self {
        if outcome.is_success() {
            Self {
                success_count: self.success_count + 1,
                ..self
            }
        } else {
            Self {
                failure_count: self.failure_count + 1,
                ..self
            }
        }
    }

    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a TargetOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(Self::default(), |summary, outcome| summary.record(outcome))
    }

    pub fn total(&self) -> u64 {
        self.success_count + self.failure_count
    }
}
