//! Ambient HTTP-service plumbing shared by onboarding binaries: error bodies, health
//! probes, request ids, tracing setup, env config.

pub mod config;
pub mod error;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
