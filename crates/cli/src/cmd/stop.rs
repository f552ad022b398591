//! Stop the autocommit daemon

use anyhow::Result;

pub async fn run() -> Result<()> {
    crate::daemon::stop().await
}
