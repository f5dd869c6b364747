//! Common utilities and types shared across Query Gateway components.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (size limits, clock skew, time-claim checks)
pub mod jwt;
