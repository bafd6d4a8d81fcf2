use super::{print_apply_result, print_plan, print_refresh_report};
use crate::project::Project;
use colored::Colorize;
use webflow_cloud::{CancellationToken, OpContext};

pub async fn handle(
    project: &Project,
    dry_run: bool,
    refresh: bool,
    yes: bool,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let desired = project.load_desired()?;

    // a dry run only reads state, so it does not need the lock
    let lock = if dry_run {
        None
    } else {
        Some(project.state.acquire_lock().await?)
    };
    if lock.is_some() {
        tracing::debug!("Acquired state lock");
    }

    let mut state = project.state.load().await?;
    let reconciler = project.reconciler();
    let ctx = OpContext::new()
        .with_cancel(cancel.clone())
        .with_dry_run(dry_run);

    if refresh && !dry_run {
        let report = reconciler.refresh(&mut state, &ctx).await?;
        tracing::info!(
            refreshed = report.refreshed.len(),
            removed = report.removed.len(),
            "Refresh finished"
        );
        print_refresh_report(&report);
    }

    let plan = reconciler.plan(&desired, &state)?;
    print_plan(&plan);
    if !plan.has_changes {
        return release(lock).await;
    }

    if !yes && !dry_run {
        println!();
        println!("{}", "Warning: this changes live Webflow resources.".yellow());
        println!("Run again with --yes to apply");
        return release(lock).await;
    }

    if dry_run {
        println!();
        println!("{}", "Dry run: no API calls are made and state is not saved".yellow());
    }

    let result = reconciler.apply(&plan, &desired, &mut state, &ctx).await;
    tracing::info!(
        succeeded = result.succeeded.len(),
        failed = result.failed.len(),
        dry_run,
        duration_ms = result.duration_ms,
        "Apply finished"
    );

    if !dry_run {
        project.state.save(&state).await?;
    }
    release(lock).await?;

    print_apply_result(&result);
    if !result.is_success() {
        anyhow::bail!("{} action(s) failed", result.failed.len());
    }
    Ok(())
}

pub(crate) async fn release(lock: Option<webflow_cloud::StateLock>) -> anyhow::Result<()> {
    if let Some(lock) = lock {
        lock.release().await?;
        tracing::debug!("Released state lock");
    }
    Ok(())
}
