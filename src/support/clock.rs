//! Wall-clock source for the charging orchestrator.
//!
//! The orchestrator compares wall-clock time against charge windows and
//! suspension deadlines. `TokioClock` derives that time from the tokio timer,
//! so a paused runtime (`start_paused = true`) advances both together.

use chrono::{DateTime, Duration, Utc};
use tokio::time::Instant;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock anchored to a start time and advanced by the tokio timer
#[derive(Debug, Clone)]
pub struct TokioClock {
    anchor: DateTime<Utc>,
    started: Instant,
}

impl TokioClock {
    /// Clock that follows the system time
    pub fn system() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Clock that reads `anchor` right now and advances with tokio time
    pub fn starting_at(anchor: DateTime<Utc>) -> Self {
        Self {
            anchor,
            started: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.started.elapsed();
        // Saturates after ~292k years, far beyond any session.
        let elapsed = Duration::from_std(elapsed).unwrap_or(Duration::MAX);
        self.anchor + elapsed
    }
}
