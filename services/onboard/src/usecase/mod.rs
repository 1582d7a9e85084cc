pub mod crm_sync;
pub mod otp;
pub mod sweep;
pub mod user;
