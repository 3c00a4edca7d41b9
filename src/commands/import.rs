use anyhow::{Result, bail};
use declarative::{Lifecycle, Recorded};

use super::Workspace;
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, alias: &str, id: &str) -> Result<()> {
    let mut ws = Workspace::open(ctx)?;
    if let Some(existing) = ws.state.resources.get(alias) {
        bail!(
            "{alias} is already managed (id {}); remove it from state first",
            existing.id
        );
    }

    let data = ws.binding.import(id, &ws.client)?;
    let declared = ws.manifest.declared()?;
    let timeouts = declared
        .get(alias)
        .map(|d| d.timeouts)
        .unwrap_or_default()
        .or(*data.timeouts());

    let resource_id = data.id().to_string();
    ws.state.set(
        alias,
        Some(Recorded {
            id: resource_id.clone(),
            state: data.into_state(),
            timeouts,
        }),
    );
    ws.save()?;

    ui::success(&format!("Imported {resource_id} as {alias}"));
    if !declared.contains_key(alias) {
        ui::warn(&format!(
            "{alias} is not declared in {}; the next apply will destroy it",
            ctx.manifest.display()
        ));
    }
    Ok(())
}
