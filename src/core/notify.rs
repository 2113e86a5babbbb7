use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// Delivers rendered reports somewhere outside the process.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Sends the daily report, followed by the monthly comparison when present.
    async fn notify(&self, daily: &str, monthly: Option<&str>) -> Result<()>;
}

/// Writes reports to the log. Always configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, daily: &str, monthly: Option<&str>) -> Result<()> {
        info!("\n{daily}");
        if let Some(monthly) = monthly {
            info!("\n{monthly}");
        }
        Ok(())
    }
}
