use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::DEFAULT_MANIFEST;

#[derive(Parser)]
#[command(name = "idpform")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative management of user pool resource servers", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Manifest file
    #[arg(short, long, global = true, env = "IDPFORM_MANIFEST", default_value = DEFAULT_MANIFEST)]
    pub manifest: PathBuf,

    /// State file (defaults to <manifest>.state.toml)
    #[arg(long, global = true, env = "IDPFORM_STATE")]
    pub state: Option<PathBuf>,

    /// Use an in-memory API seeded from manifest and state instead of the network
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change
    Plan(PlanArgs),

    /// Create, update or replace resources to match the manifest
    Apply(ApplyArgs),

    /// Delete every recorded resource
    Destroy(DestroyArgs),

    /// Re-read recorded resources and update state
    Refresh,

    /// Adopt an existing resource server into state
    Import {
        /// Alias to record it under
        alias: String,

        /// `user_pool_id|identifier`
        id: String,
    },

    /// Show recorded state
    Show {
        /// Only show this alias or `type.alias`
        target: Option<String>,
    },

    /// Print the resource schema
    Schema {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Plan / Apply / Destroy
// ============================================================================

#[derive(Args)]
pub struct PlanArgs {
    /// Only plan a specific target (type, type.alias or alias)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Skip re-reading recorded resources before planning
    #[arg(long)]
    pub no_refresh: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Only apply a specific target (type, type.alias or alias)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Show the plan without making changes
    #[arg(short, long)]
    pub dry_run: bool,

    /// Stop at the first failed change
    #[arg(long)]
    pub fail_fast: bool,

    /// Skip re-reading recorded resources before planning
    #[arg(long)]
    pub no_refresh: bool,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Only destroy a specific target (type, type.alias or alias)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Stop at the first failed change
    #[arg(long)]
    pub fail_fast: bool,
}
