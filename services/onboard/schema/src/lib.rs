pub mod otp_challenges;
pub mod users;
