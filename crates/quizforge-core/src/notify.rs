//! Score notifiers.

use async_trait::async_trait;

use crate::traits::{Notifier, ScoreNotice};

/// Writes notices to the tracing log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notice: &ScoreNotice) -> anyhow::Result<()> {
        anyhow::ensure!(
            !notice.recipient.trim().is_empty(),
            "notice has no recipient"
        );
        tracing::info!(
            recipient = %notice.recipient,
            subject = %notice.subject(),
            "{}",
            notice.body()
        );
        Ok(())
    }
}
