//! Adapters Layer - External implementations
//!
//! - `systemd`: service port over systemctl/journalctl + unit management
//! - `telegram`: Bot API notifier for restart outcomes
//! - `cli`: clap command surface

pub mod cli;
pub mod systemd;
pub mod telegram;
