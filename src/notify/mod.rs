//! Messaging delivery
//!
//! The orchestrator reports through this seam: cycle notices as text,
//! artifacts as file uploads. Delivery failures are reported per artifact
//! and never fail the backup outcome that produced them.

mod console;
mod errors;
mod telegram;

pub use console::ConsoleMessenger;
pub use errors::{NotifyError, NotifyResult};
pub use telegram::TelegramMessenger;

use std::path::Path;

use async_trait::async_trait;

/// Delivery endpoint for cycle notices and artifacts.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> NotifyResult<()>;

    async fn send_file(&self, chat_id: i64, path: &Path, caption: &str) -> NotifyResult<()>;
}
