//! systemd adapter
//!
//! Service-port implementation over systemctl/journalctl plus unit file
//! install/uninstall/enable/disable.

pub mod client;
pub mod unit;

pub use client::SystemdService;
pub use unit::{install, set_enabled, uninstall, unit_path, UnitError};
