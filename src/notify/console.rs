//! Log-only messenger
//!
//! Used by the CLI when no bot token is configured, so cycles stay runnable
//! without network delivery. Artifacts are left in place and their paths
//! logged instead of uploaded.

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use super::errors::NotifyResult;
use super::Messenger;

pub struct ConsoleMessenger;

#[async_trait]
impl Messenger for ConsoleMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> NotifyResult<()> {
        info!(chat_id, "{text}");
        Ok(())
    }

    async fn send_file(&self, chat_id: i64, path: &Path, caption: &str) -> NotifyResult<()> {
        info!(chat_id, path = %path.display(), "{caption}");
        Ok(())
    }
}
