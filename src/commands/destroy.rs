use anyhow::{Result, bail};
use declarative::{ExecuteOptions, ExecutionPlan};

use super::{Workspace, plan, print_summary};
use crate::Context;
use crate::cli::DestroyArgs;
use crate::ui;

pub fn run(ctx: &Context, args: &DestroyArgs) -> Result<()> {
    let mut ws = Workspace::open(ctx)?;
    let plan = ExecutionPlan::destroy(&ws.binding, &ws.state.recorded())
        .filter_by_target(args.target.as_deref());

    if plan.is_empty() {
        ui::info("Nothing to destroy");
        return Ok(());
    }
    plan::display(&plan, ctx.verbose > 0);

    let opts = ExecuteOptions {
        dry_run: false,
        fail_fast: args.fail_fast,
    };
    let summary = ws.execute(ctx, plan, &opts, args.yes)?;
    ws.save()?;

    if summary.deleted == 0 && summary.failed == 0 {
        println!();
        ui::warn("Aborted");
        return Ok(());
    }
    print_summary(&summary);

    if !summary.is_success() {
        bail!("{} resource(s) could not be destroyed", summary.failed);
    }
    Ok(())
}
