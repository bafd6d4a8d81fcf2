use super::{print_plan, print_refresh_report};
use crate::project::Project;
use webflow_cloud::{CancellationToken, OpContext};

/// Plans never write state, even after a refresh
pub async fn handle(
    project: &Project,
    refresh: bool,
    json: bool,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let desired = project.load_desired()?;
    let mut state = project.state.load().await?;
    let reconciler = project.reconciler();

    if refresh {
        let ctx = OpContext::new().with_cancel(cancel.clone());
        let report = reconciler.refresh(&mut state, &ctx).await?;
        if !json {
            print_refresh_report(&report);
        }
    }

    let plan = reconciler.plan(&desired, &state)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}
