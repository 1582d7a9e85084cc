use std::time::Duration;

use chrono::Utc;

use crate::domain::repository::OtpChallengeRepository;
use crate::error::OnboardServiceError;

/// Deletes expired challenges. Verification re-checks `expires_at` on every read, so this
/// only keeps the table small.
pub struct SweepExpiredChallengesUseCase<C: OtpChallengeRepository> {
    pub challenges: C,
}

impl<C: OtpChallengeRepository> SweepExpiredChallengesUseCase<C> {
    pub async fn execute(&self) -> Result<u64, OnboardServiceError> {
        self.challenges.delete_expired(Utc::now()).await
    }

    /// Sweep every `period` until the task is dropped. Failures are logged and retried on
    /// the next tick.
    pub async fn run(self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.execute().await {
                Ok(0) => {}
                Ok(deleted) => tracing::debug!(deleted, "expired otp challenges swept"),
                Err(e) => tracing::warn!(error = %e, "otp expiry sweep failed"),
            }
        }
    }
}
