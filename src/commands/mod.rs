//! Command implementations for the idpform CLI
//!
//! Every command that talks to the API opens a [`Workspace`]: the manifest,
//! the recorded state and a client built from the provider settings.

pub mod apply;
pub mod destroy;
pub mod import;
pub mod plan;
pub mod refresh;
pub mod show;

use anyhow::{Context as AnyhowContext, Result};
use cognito::Client;
use colored::Colorize;
use declarative::{
    AutoConfirm, ExecuteOptions, ExecuteOutcome, ExecuteSummary, ExecutionPlan, execute,
};
use std::path::PathBuf;

use crate::Context;
use crate::config::{self, Manifest};
use crate::progress::{PromptConfirm, SpinnerProgress};
use crate::resource::{ResourceServerBinding, ResourceServerConfig};
use crate::state::StateFile;

/// Manifest, recorded state and API client for one invocation
pub struct Workspace {
    pub manifest: Manifest,
    pub state: StateFile,
    pub client: Client,
    pub binding: ResourceServerBinding,
    state_path: PathBuf,
}

impl Workspace {
    pub fn open(ctx: &Context) -> Result<Self> {
        let manifest = Manifest::load(&ctx.manifest)?;
        let state = StateFile::load(&ctx.state)?;

        let client = if ctx.offline {
            log::info!("Running offline against an in-memory API");
            config::offline_client(&manifest, &state.recorded())
        } else {
            manifest.provider.clone().with_env_overrides().client()?
        };

        Ok(Self {
            manifest,
            state,
            client,
            binding: ResourceServerBinding::new(),
            state_path: ctx.state.clone(),
        })
    }

    /// Re-read every recorded resource, returning aliases that vanished
    pub fn refresh(&mut self) -> Result<Vec<String>> {
        let refreshed = declarative::refresh(&self.binding, &self.client, &self.state.recorded())?;

        let mut gone = Vec::new();
        for (alias, recorded) in refreshed {
            if recorded.is_none() {
                gone.push(alias.clone());
            }
            self.state.set(&alias, recorded);
        }
        Ok(gone)
    }

    /// Plan converging recorded state to the manifest
    pub fn plan(&self, target: Option<&str>) -> Result<ExecutionPlan<ResourceServerConfig>> {
        let declared = self.manifest.declared()?;
        let plan = ExecutionPlan::build(&self.binding, &declared, &self.state.recorded())?;
        Ok(plan.filter_by_target(target))
    }

    /// Run a plan and merge the resulting state changes
    pub fn execute(
        &mut self,
        ctx: &Context,
        plan: ExecutionPlan<ResourceServerConfig>,
        opts: &ExecuteOptions,
        yes: bool,
    ) -> Result<ExecuteSummary> {
        let mut progress = SpinnerProgress::new(ctx.quiet);
        let outcome: ExecuteOutcome<ResourceServerConfig> = if yes {
            execute(&self.binding, &self.client, plan, opts, &mut progress, &mut AutoConfirm)?
        } else {
            execute(&self.binding, &self.client, plan, opts, &mut progress, &mut PromptConfirm)?
        };

        self.state.apply_changes(outcome.states);
        Ok(outcome.summary)
    }

    /// Persist recorded state
    pub fn save(&mut self) -> Result<()> {
        self.state
            .touch(&self.state_path)
            .with_context(|| format!("Could not save state to {}", self.state_path.display()))
    }
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Apply complete!", "✓".green().bold());
    } else {
        println!("  {} Apply finished with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} created", summary.created);
    }
    if summary.updated > 0 {
        println!("    • {} updated", summary.updated);
    }
    if summary.replaced > 0 {
        println!("    • {} replaced", summary.replaced);
    }
    if summary.deleted > 0 {
        println!("    • {} destroyed", summary.deleted);
    }
    if summary.skipped > 0 {
        println!("    • {} skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {}", summary.failed, "failed".red());
    }
}
