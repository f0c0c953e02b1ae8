//! Sign-in Bot — Telegram onboarding and sign-in link issuance.

pub mod channel;
pub mod config;
pub mod error;
pub mod registration;
pub mod store;
