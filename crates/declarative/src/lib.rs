//! # Declarative
//!
//! A framework for declarative management of remote resources.
//!
//! This crate provides the engine-side abstractions for declaring desired
//! state, reading remote state, and converging the two.
//!
//! ## Core Concepts
//!
//! - **Lifecycle**: a resource type binding with create/read/update/delete
//! - **ResourceData**: typed state plus identity key and changed fields
//! - **Schema**: which fields are required, computed or force replacement
//! - **ExecutionPlan**: the changes needed to converge recorded state
//! - **Executor**: applies a plan one change at a time
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ExecutionPlan, ExecuteOptions, AutoConfirm, NoProgress, execute};
//!
//! let plan = ExecutionPlan::build(&binding, &declared, &recorded)?;
//! println!("{}", plan.summary());
//!
//! let outcome = execute(
//!     &binding,
//!     &client,
//!     plan,
//!     &ExecuteOptions::default(),
//!     &mut NoProgress,
//!     &mut AutoConfirm,
//! )?;
//! ```
//!
//! ## Provider Traits
//!
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//! - [`RetryCallback`]: Observes retries inside lifecycle operations

pub mod context;
pub mod data;
pub mod diff;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod retry;
pub mod schema;
pub mod types;

// Re-export main types at crate root
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback};
pub use data::ResourceData;
pub use diff::{Action, DiffSummary, compute_action};
pub use executor::{ExecuteOutcome, StateChange, execute, refresh};
pub use planner::{Address, Declared, ExecutionPlan, PlannedChange, Recorded};
pub use resource::Lifecycle;
pub use retry::{LogCallback, RetryCallback, RetryConfig, RetryError, retry};
pub use schema::{Attribute, AttributeType, Block, Schema};
pub use types::{
    ApplyResult, DEFAULT_TIMEOUT, ExecuteOptions, ExecuteSummary, Timeouts, parse_duration,
};
