pub mod apply;
pub mod auth;
pub mod destroy;
pub mod plan;
pub mod refresh;

use colored::Colorize;
use webflow_cloud::{ActionType, ApplyResult, Plan, RefreshReport};

pub fn print_plan(plan: &Plan) {
    if !plan.has_changes {
        println!("{}", "No changes. Webflow matches the desired state.".green());
        return;
    }

    println!("{}", "Planned changes:".bold());
    for action in &plan.actions {
        let marker = match action.action_type {
            ActionType::Create => "+".green(),
            ActionType::Update => "~".yellow(),
            ActionType::Replace => "-/+".red(),
            ActionType::Delete => "-".red(),
            ActionType::NoOp => continue,
        };
        println!(
            "  {} {} {}",
            marker,
            action.resource_type.cyan(),
            action.resource_name
        );
        if let Some(id) = &action.remote_id {
            println!("      id: {}", id.dimmed());
        }
        for field in action.changed_field_summary() {
            println!("      {}", field);
        }
    }

    println!();
    println!("Plan: {}", plan.summary());
}

pub fn print_apply_result(result: &ApplyResult) {
    println!();
    for success in &result.succeeded {
        println!("  {} {}", "✓".green(), success.message);
    }
    for failure in &result.failed {
        println!(
            "  {} {}: {}",
            "✗".red(),
            failure.action_id,
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }

    println!();
    let summary = format!(
        "{} succeeded, {} failed in {}ms",
        result.succeeded.len(),
        result.failed.len(),
        result.duration_ms
    );
    if result.is_success() {
        println!("{}", summary.green().bold());
    } else {
        println!("{}", summary.red().bold());
    }
}

pub fn print_refresh_report(report: &RefreshReport) {
    println!("Refreshed {} resource(s)", report.refreshed.len());
    for name in &report.removed {
        println!(
            "  {} {} no longer exists in Webflow, dropped from state",
            "!".yellow(),
            name
        );
    }
}
