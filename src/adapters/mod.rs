//! External service clients
//!
//! Thin reqwest wrappers around the APIs the fetchers pull from, plus the
//! Telegram notification channel. Fetchers own normalization; these clients
//! only move JSON.

pub mod blockscout;
pub mod lps;
pub mod swap_api;
pub mod telegram;

pub use blockscout::BlockscoutClient;
pub use lps::LpsClient;
pub use swap_api::SwapApiClient;
pub use telegram::TelegramNotifier;
