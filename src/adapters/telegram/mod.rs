//! Telegram adapter

pub mod client;

pub use client::{NotifyError, TelegramNotifier};
