use anyhow::Result;

use super::Workspace;
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let mut ws = Workspace::open(ctx)?;
    let total = ws.state.resources.len();
    let gone = ws.refresh()?;

    for alias in &gone {
        ui::warn(&format!("{alias} no longer exists remotely, removed from state"));
    }
    ws.save()?;

    ui::success(&format!(
        "Refreshed {} resource(s), {} removed",
        total,
        gone.len()
    ));
    Ok(())
}
