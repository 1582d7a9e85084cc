//! Argon2id hashing for OTP secrets.

use argon2::Argon2;
use argon2::password_hash::{
    self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};

use crate::domain::repository::OtpHasher;
use crate::error::OnboardServiceError;

/// Salted Argon2id with default parameters, stored in PHC string format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2OtpHasher;

impl OtpHasher for Argon2OtpHasher {
    fn hash(&self, otp: &str) -> Result<String, OnboardServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(otp.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("hash otp: {e}"))?;
        Ok(hash.to_string())
    }

    fn verify(&self, otp: &str, hash: &str) -> Result<bool, OnboardServiceError> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("invalid otp hash: {e}"))?;
        match Argon2::default().verify_password(otp.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(anyhow::anyhow!("verify otp: {e}").into()),
        }
    }
}
