use super::print_refresh_report;
use crate::project::Project;
use webflow_cloud::{CancellationToken, OpContext};

pub async fn handle(project: &Project, cancel: &CancellationToken) -> anyhow::Result<()> {
    let lock = project.state.acquire_lock().await?;
    tracing::debug!("Acquired state lock");
    let mut state = project.state.load().await?;

    let ctx = OpContext::new().with_cancel(cancel.clone());
    let report = project.reconciler().refresh(&mut state, &ctx).await?;
    tracing::info!(
        refreshed = report.refreshed.len(),
        removed = report.removed.len(),
        "Refresh finished"
    );

    project.state.save(&state).await?;
    lock.release().await?;
    tracing::debug!("Released state lock");

    print_refresh_report(&report);
    Ok(())
}
