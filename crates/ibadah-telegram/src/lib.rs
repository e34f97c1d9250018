//! Telegram Bot API client for the ibadah bot.
//!
//! Long-polling only (no webhook). `api` holds the HTTP client, `types`
//! the subset of Bot API objects the bot uses (messages, callback
//! queries, inline and reply keyboards), and `polling` the getUpdates
//! loop that feeds the dispatcher.

pub mod api;
pub mod polling;
pub mod types;

pub use api::TelegramApi;
pub use polling::{BotEvent, run_polling_loop};
