use super::apply::release;
use super::{print_apply_result, print_plan};
use crate::project::Project;
use colored::Colorize;
use webflow_cloud::{CancellationToken, OpContext, ResourceSet};

pub async fn handle(
    project: &Project,
    dry_run: bool,
    yes: bool,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
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
    let plan = reconciler.plan_destroy(&state);

    print_plan(&plan);
    if !plan.has_changes {
        return release(lock).await;
    }

    if !yes && !dry_run {
        println!();
        println!(
            "{}",
            "Warning: this deletes every managed resource from Webflow.".red()
        );
        println!("Run again with --yes to destroy");
        return release(lock).await;
    }

    let ctx = OpContext::new()
        .with_cancel(cancel.clone())
        .with_dry_run(dry_run);
    let result = reconciler
        .apply(&plan, &ResourceSet::new(), &mut state, &ctx)
        .await;
    tracing::info!(
        succeeded = result.succeeded.len(),
        failed = result.failed.len(),
        dry_run,
        duration_ms = result.duration_ms,
        "Destroy finished"
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
