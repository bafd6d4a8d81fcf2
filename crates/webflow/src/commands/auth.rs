use crate::project::Project;
use colored::Colorize;
use webflow_cloud::CancellationToken;

pub async fn handle(project: &Project, cancel: &CancellationToken) -> anyhow::Result<()> {
    println!("{}", "Checking Webflow API token...".blue());
    let status = project.provider.check_auth(cancel).await?;

    if !status.authenticated {
        println!("{}", "✗ Not authenticated".red().bold());
        if let Some(error) = &status.error {
            println!("  {}", error);
        }
        anyhow::bail!("authentication failed");
    }

    println!("{}", "✓ Authenticated".green().bold());
    if let Some(info) = &status.account_info {
        println!("  {}", info.cyan());
    }
    if !status.scopes.is_empty() {
        println!("  scopes: {}", status.scopes.join(", "));
    }
    Ok(())
}
