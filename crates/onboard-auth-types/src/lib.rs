//! Session token types shared by the onboarding service and anything that consumes its tokens.

pub mod bearer;
pub mod token;
