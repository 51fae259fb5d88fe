//! Shared utilities for Campfire: logger setup and time helpers.

pub mod logger;
pub mod time;
