use chrono::Utc;
use rand::RngExt;

use onboard_domain::contact::{Email, PersonName};
use onboard_domain::id::ChallengeId;
use onboard_domain::phone::Phone;

use crate::domain::repository::{
    CrmSyncScheduler, DeliveryChannel, OtpChallengeRepository, OtpHasher, UserRepository,
};
use crate::domain::types::{
    ISSUE_COOLDOWN_SECS, MAX_VERIFY_ATTEMPTS, OtpChallenge, OtpSettings, User, VerifiedProfile,
};
use crate::error::OnboardServiceError;

/// Uniform random code in `[10^(len-1), 10^len - 1]` from the thread-local CSPRNG.
pub fn generate_otp(length: u32) -> String {
    let low = 10u64.pow(length - 1);
    let high = 10u64.pow(length) - 1;
    rand::rng().random_range(low..=high).to_string()
}

// ── Issue ────────────────────────────────────────────────────────────────────

pub struct RequestOtpInput {
    pub name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug)]
pub struct RequestOtpOutput {
    pub challenge_id: ChallengeId,
    pub expires_in_minutes: i64,
}

pub struct RequestOtpUseCase<C, D, H>
where
    C: OtpChallengeRepository,
    D: DeliveryChannel,
    H: OtpHasher,
{
    pub challenges: C,
    pub delivery: D,
    pub hasher: H,
    pub settings: OtpSettings,
    /// Country code assumed for numbers entered without `+`.
    pub default_country_code: String,
}

impl<C, D, H> RequestOtpUseCase<C, D, H>
where
    C: OtpChallengeRepository,
    D: DeliveryChannel,
    H: OtpHasher,
{
    pub async fn execute(
        &self,
        input: RequestOtpInput,
    ) -> Result<RequestOtpOutput, OnboardServiceError> {
        // 1. Validate before touching any store
        let name = PersonName::parse(&input.name)?;
        let phone = Phone::normalize(&input.phone, &self.default_country_code)?;
        let email = Email::parse(&input.email)?;

        // 2. Per-phone cooldown → 429
        if self
            .challenges
            .has_recent_for_phone(phone.as_str(), ISSUE_COOLDOWN_SECS)
            .await?
        {
            return Err(OnboardServiceError::RateLimited);
        }

        // 3. Generate + hash; only the hash is persisted
        let otp = generate_otp(self.settings.length);
        let secret_hash = self.hasher.hash(&otp)?;
        let now = Utc::now();
        let challenge_id = ChallengeId::new();
        let challenge = OtpChallenge {
            id: challenge_id.0,
            phone: phone.to_string(),
            name: name.into_inner(),
            email: email.into_inner(),
            secret_hash,
            is_used: false,
            attempts: 0,
            expires_at: now + self.settings.expiry,
            created_at: now,
        };
        self.challenges.create(&challenge).await?;

        // 4. Deliver; a failed send must not leave a usable challenge behind
        match self.delivery.send_otp(&phone, &otp).await {
            Ok(receipt) => {
                tracing::info!(
                    challenge_id = %challenge.id,
                    phone = %phone,
                    message_id = receipt.message_id.as_deref().unwrap_or("-"),
                    "otp issued"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, phone = %phone, "otp delivery failed");
                if let Err(rollback) = self.challenges.delete(challenge.id).await {
                    tracing::error!(
                        error = %rollback,
                        challenge_id = %challenge.id,
                        "failed to roll back undelivered challenge"
                    );
                }
                return Err(OnboardServiceError::DeliveryFailed);
            }
        }

        Ok(RequestOtpOutput {
            challenge_id,
            expires_in_minutes: self.settings.expiry_minutes(),
        })
    }
}

// ── Verify ───────────────────────────────────────────────────────────────────

pub struct VerifyOtpInput {
    pub challenge_id: String,
    pub otp: String,
    pub phone: String,
}

#[derive(Debug)]
pub struct VerifyOtpOutput {
    pub user: User,
}

pub struct VerifyOtpUseCase<C, U, H, S>
where
    C: OtpChallengeRepository,
    U: UserRepository,
    H: OtpHasher,
    S: CrmSyncScheduler,
{
    pub challenges: C,
    pub users: U,
    pub hasher: H,
    pub crm_sync: S,
    pub default_country_code: String,
}

impl<C, U, H, S> VerifyOtpUseCase<C, U, H, S>
where
    C: OtpChallengeRepository,
    U: UserRepository,
    H: OtpHasher,
    S: CrmSyncScheduler,
{
    pub async fn execute(
        &self,
        input: VerifyOtpInput,
    ) -> Result<VerifyOtpOutput, OnboardServiceError> {
        let otp = input.otp.trim();
        if input.challenge_id.trim().is_empty() || otp.is_empty() || input.phone.trim().is_empty()
        {
            return Err(OnboardServiceError::Validation(
                "OTP ID, OTP, and phone number are required".to_owned(),
            ));
        }

        // 1. Load by (id, phone); anything that cannot match is simply not found
        let ChallengeId(challenge_id) = input
            .challenge_id
            .trim()
            .parse()
            .map_err(|_| OnboardServiceError::ChallengeNotFound)?;
        let phone = Phone::normalize(&input.phone, &self.default_country_code)
            .map_err(|_| OnboardServiceError::ChallengeNotFound)?;
        let challenge = self
            .challenges
            .find_by_id_and_phone(challenge_id, phone.as_str())
            .await?
            .ok_or(OnboardServiceError::ChallengeNotFound)?;

        // 2. Terminal states
        if challenge.is_used {
            return Err(OnboardServiceError::AlreadyUsed);
        }
        if challenge.is_expired_at(Utc::now()) {
            return Err(OnboardServiceError::Expired);
        }

        // 3. Count the attempt durably before judging it
        let attempts = self
            .challenges
            .increment_attempts(challenge.id)
            .await?
            .ok_or(OnboardServiceError::ChallengeNotFound)?;
        if attempts > MAX_VERIFY_ATTEMPTS {
            return Err(OnboardServiceError::TooManyAttempts);
        }

        // 4. Compare
        if !self.hasher.verify(otp, &challenge.secret_hash)? {
            let attempts_remaining = (MAX_VERIFY_ATTEMPTS - attempts).max(0) as u32;
            return Err(OnboardServiceError::InvalidOtp { attempts_remaining });
        }

        // 5. Consume; losing a race to a concurrent verify counts as already used
        if !self.challenges.mark_used(challenge.id).await? {
            return Err(OnboardServiceError::AlreadyUsed);
        }

        // 6. Upsert the user with the profile carried on the challenge
        let user = self
            .users
            .upsert_verified(&VerifiedProfile {
                phone: challenge.phone.clone(),
                name: challenge.name.clone(),
                email: challenge.email.clone(),
                verified_at: Utc::now(),
            })
            .await?;

        // 7. Fire-and-forget CRM sync
        if !user.crm_synced {
            self.crm_sync.schedule(user.clone());
        }

        tracing::info!(user_id = %user.id, phone = %user.phone, "otp verified");

        Ok(VerifyOtpOutput { user })
    }
}
