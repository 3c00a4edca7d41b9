use anyhow::{Result, bail};
use declarative::ExecuteOptions;

use super::{Workspace, plan, print_summary};
use crate::Context;
use crate::cli::ApplyArgs;
use crate::ui;

pub fn run(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let mut ws = Workspace::open(ctx)?;
    if !args.no_refresh {
        for alias in ws.refresh()? {
            ui::warn(&format!("{alias} no longer exists remotely"));
        }
    }

    let plan = ws.plan(args.target.as_deref())?;
    plan::display(&plan, ctx.verbose > 0);

    if !plan.has_changes() {
        return if args.dry_run { Ok(()) } else { ws.save() };
    }

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        fail_fast: args.fail_fast,
    };
    let summary = ws.execute(ctx, plan, &opts, args.yes)?;
    if args.dry_run {
        println!();
        ui::info(&format!("Dry run - {} change(s) not applied", summary.skipped));
        return Ok(());
    }
    ws.save()?;

    if summary.total_changes() == 0 && summary.failed == 0 {
        println!();
        ui::warn("Aborted");
        return Ok(());
    }
    print_summary(&summary);

    if !summary.is_success() {
        bail!("{} change(s) failed", summary.failed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{MANIFEST, context};
    use crate::state::StateFile;

    fn args(dry_run: bool) -> ApplyArgs {
        ApplyArgs {
            target: None,
            yes: true,
            dry_run,
            fail_fast: false,
            no_refresh: false,
        }
    }

    #[test]
    fn test_dry_run_writes_no_state() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), MANIFEST);

        run(&ctx, &args(true)).unwrap();
        assert!(!ctx.state.exists());

        run(&ctx, &args(false)).unwrap();
        assert_eq!(StateFile::load(&ctx.state).unwrap().resources.len(), 1);
    }

    #[test]
    fn test_dry_run_leaves_recorded_state_alone() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), MANIFEST);
        run(&ctx, &args(false)).unwrap();
        let before = std::fs::read_to_string(&ctx.state).unwrap();

        std::fs::write(&ctx.manifest, "").unwrap();
        run(&ctx, &args(true)).unwrap();
        assert_eq!(std::fs::read_to_string(&ctx.state).unwrap(), before);
    }
}
