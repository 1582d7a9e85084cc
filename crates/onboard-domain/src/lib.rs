//! Domain types shared across the onboarding workspace.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; `infra/` and `handlers/` only convert at the edges.

pub mod contact;
pub mod id;
pub mod lead;
pub mod phone;
