use anyhow::Result;
use colored::Colorize;
use declarative::{AttributeType, Lifecycle};

use crate::Context;
use crate::resource::{ResourceServerBinding, TYPE_NAME};
use crate::state::StateFile;
use crate::ui;

/// Whether an alias matches a `type`, `type.alias` or `alias` target
fn matches(alias: &str, target: &str) -> bool {
    match target.split_once('.') {
        Some((ty, a)) => ty == TYPE_NAME && a == alias,
        None => target == TYPE_NAME || target == alias,
    }
}

pub fn run(ctx: &Context, target: Option<&str>) -> Result<()> {
    let state = StateFile::load(&ctx.state)?;

    ui::header("Recorded State");
    ui::kv("State file", &ctx.state.display().to_string());
    ui::kv("Last updated", &state.last_updated.to_rfc3339());

    let entries: Vec<_> = state
        .resources
        .iter()
        .filter(|(alias, _)| target.is_none_or(|t| matches(alias, t)))
        .collect();

    if entries.is_empty() {
        println!();
        ui::dim("No resources recorded");
        return Ok(());
    }

    for (alias, entry) in entries {
        ui::section(&format!("{}.{}", entry.resource_type, alias));
        let attrs = &entry.attributes;
        ui::kv("id", &entry.id);
        ui::kv("name", &attrs.name);
        ui::kv("identifier", &attrs.identifier);
        ui::kv("user_pool_id", &attrs.user_pool_id);
        if let Some(delete) = entry.timeouts.delete {
            ui::kv("delete timeout", &format!("{}s", delete.as_secs()));
        }
        for scope in &attrs.scopes {
            ui::kv(
                "scope",
                &format!(
                    "{} {}",
                    scope.scope_name,
                    format!("({})", scope.scope_description).dimmed()
                ),
            );
        }
        for identifier in &attrs.scope_identifiers {
            ui::kv("scope_identifier", identifier);
        }
    }
    Ok(())
}

fn type_label(ty: &AttributeType) -> &'static str {
    match ty {
        AttributeType::String => "string",
        AttributeType::ListOfStrings => "list(string)",
        AttributeType::Set(_) => "set(block)",
    }
}

/// Print the resource schema
pub fn schema(json: bool) -> Result<()> {
    let binding = ResourceServerBinding::new();
    let schema = binding.schema();

    if json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    ui::header(binding.type_name());
    for (name, attr) in &schema.attributes {
        let mut flags = Vec::new();
        if attr.required {
            flags.push("required");
        }
        if attr.optional {
            flags.push("optional");
        }
        if attr.computed {
            flags.push("computed");
        }
        if attr.force_new {
            flags.push("forces replacement");
        }
        println!(
            "  {:<18} {:<14} {}",
            name.bold(),
            type_label(&attr.ty),
            flags.join(", ").dimmed()
        );
        if let Some(desc) = &attr.description {
            ui::dim(&format!("  {desc}"));
        }
        if let AttributeType::Set(block) = &attr.ty {
            for (field, inner) in &block.attributes {
                println!("    {:<16} {}", field, type_label(&inner.ty));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_target() {
        assert!(matches("api", "api"));
        assert!(matches("api", TYPE_NAME));
        assert!(matches("api", &format!("{TYPE_NAME}.api")));
        assert!(!matches("api", &format!("{TYPE_NAME}.other")));
        assert!(!matches("api", "other"));
    }

    #[test]
    fn test_schema_renders() {
        schema(false).unwrap();
        schema(true).unwrap();
    }
}
