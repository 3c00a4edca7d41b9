use anyhow::Result;
use colored::Colorize;
use declarative::{Action, ExecutionPlan, PlannedChange};

use super::Workspace;
use crate::Context;
use crate::cli::PlanArgs;
use crate::resource::ResourceServerConfig;
use crate::ui;

pub fn run(ctx: &Context, args: &PlanArgs) -> Result<()> {
    let mut ws = Workspace::open(ctx)?;
    if !args.no_refresh {
        for alias in ws.refresh()? {
            ui::warn(&format!("{alias} no longer exists remotely"));
        }
    }

    let plan = ws.plan(args.target.as_deref())?;
    display(&plan, ctx.verbose > 0);
    Ok(())
}

/// Render one field of a resource server for plan output
fn field_value(state: &ResourceServerConfig, field: &str) -> String {
    match field {
        "identifier" => ui::quoted(&state.identifier),
        "name" => ui::quoted(&state.name),
        "user_pool_id" => ui::quoted(&state.user_pool_id),
        "scopes" => {
            let names: Vec<&str> = state
                .scopes
                .iter()
                .map(|s| s.scope_name.as_str())
                .collect();
            format!("[{}]", names.join(", "))
        }
        _ => String::new(),
    }
}

const FIELDS: [&str; 4] = ["identifier", "name", "user_pool_id", "scopes"];

fn change_lines(change: &PlannedChange<ResourceServerConfig>) -> Vec<String> {
    match (&change.action, &change.prior, &change.desired) {
        (Action::Create, _, Some(desired)) => FIELDS
            .iter()
            .map(|f| format!("{f} = {}", field_value(desired, f)))
            .collect(),
        (Action::Update { fields } | Action::Replace { fields }, Some(prior), Some(desired)) => {
            let forces = matches!(change.action, Action::Replace { .. });
            fields
                .iter()
                .map(|f| {
                    let line = format!(
                        "{f}: {} → {}",
                        field_value(prior, f),
                        field_value(desired, f)
                    );
                    if forces && (f == "identifier" || f == "user_pool_id") {
                        format!("{line} (forces replacement)")
                    } else {
                        line
                    }
                })
                .collect()
        }
        (Action::Delete, _, _) => change
            .id
            .iter()
            .map(|id| format!("id = {}", ui::quoted(id)))
            .collect(),
        _ => Vec::new(),
    }
}

/// Display a plan in a user-friendly format
pub fn display(plan: &ExecutionPlan<ResourceServerConfig>, verbose: bool) {
    if !plan.has_changes() {
        println!();
        println!("  {} No changes. Infrastructure matches the manifest.", "✓".green());
        return;
    }

    ui::header("Plan");
    for change in &plan.changes {
        if !change.action.is_change() {
            if verbose {
                println!("  {} {}", ui::action_symbol(&change.action), change.address.to_string().dimmed());
            }
            continue;
        }

        println!(
            "  {} {} {}",
            ui::action_symbol(&change.action),
            change.address.to_string().bold(),
            format!("will {}", change.action).dimmed()
        );
        for line in change_lines(change) {
            ui::dim(&format!("    {line}"));
        }
    }

    println!();
    println!("  {} {}", "Plan:".bold(), plan.summary());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ScopeDef;
    use declarative::{Address, Timeouts};

    fn change(
        action: Action,
        prior: Option<ResourceServerConfig>,
        desired: Option<ResourceServerConfig>,
    ) -> PlannedChange<ResourceServerConfig> {
        PlannedChange {
            address: Address::new("t", "api"),
            action,
            id: prior.as_ref().map(|p| p.identifier.clone()),
            prior,
            desired,
            timeouts: Timeouts::default(),
        }
    }

    #[test]
    fn test_create_lines_list_every_field() {
        let mut desired = ResourceServerConfig::new("api", "API", "pool");
        desired.scopes.insert(ScopeDef::new("read", "Read"));
        let lines = change_lines(&change(Action::Create, None, Some(desired)));
        assert_eq!(
            lines,
            vec![
                "identifier = \"api\"",
                "name = \"API\"",
                "user_pool_id = \"pool\"",
                "scopes = [read]",
            ]
        );
    }

    #[test]
    fn test_replace_marks_forcing_fields() {
        let prior = ResourceServerConfig::new("api", "API", "pool");
        let desired = ResourceServerConfig::new("api2", "API 2", "pool");
        let lines = change_lines(&change(
            Action::Replace {
                fields: vec!["identifier".into(), "name".into()],
            },
            Some(prior),
            Some(desired),
        ));
        assert_eq!(
            lines,
            vec![
                "identifier: \"api\" → \"api2\" (forces replacement)",
                "name: \"API\" → \"API 2\"",
            ]
        );
    }

    #[test]
    fn test_delete_shows_id() {
        let prior = ResourceServerConfig::new("api", "API", "pool");
        let lines = change_lines(&change(Action::Delete, Some(prior), None));
        assert_eq!(lines, vec!["id = \"api\""]);
    }
}
