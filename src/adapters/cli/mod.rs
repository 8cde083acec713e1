//! CLI adapter

pub mod commands;

pub use commands::{
    CleanCmd, CliApp, Command, DisableCmd, EnableCmd, InstallCmd, LogsCmd, RestartCmd, StartCmd,
    StatusCmd, StopCmd, UninstallCmd,
};
