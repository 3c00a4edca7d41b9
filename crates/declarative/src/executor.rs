//! Execution engine - applies planned changes and refreshes recorded state
//!
//! Changes run one at a time in plan order. Each lifecycle call receives
//! the client handle explicitly; nothing is shared between calls except the
//! `ResourceData` built for that change.

use crate::context::{ConfirmCallback, ProgressCallback};
use crate::data::ResourceData;
use crate::diff::Action;
use crate::planner::{ExecutionPlan, PlannedChange, Recorded};
use crate::resource::Lifecycle;
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary};
use anyhow::{Context, Result, anyhow};
use std::collections::BTreeMap;

/// How an alias's recorded state changed
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange<S> {
    /// Record this state
    Set(Recorded<S>),
    /// Forget the alias
    Removed,
}

/// Result of executing a plan
#[derive(Debug, Clone)]
pub struct ExecuteOutcome<S> {
    pub summary: ExecuteSummary,
    /// State changes keyed by alias; aliases not present are unchanged
    pub states: BTreeMap<String, StateChange<S>>,
    /// Failure messages keyed by address
    pub errors: Vec<(String, String)>,
}

impl<S> Default for ExecuteOutcome<S> {
    fn default() -> Self {
        Self {
            summary: ExecuteSummary::default(),
            states: BTreeMap::new(),
            errors: Vec::new(),
        }
    }
}

/// Execute a plan
///
/// # Arguments
/// * `resource` - The resource type binding
/// * `client` - API handle passed to every lifecycle call
/// * `plan` - The execution plan to run
/// * `opts` - Execution options (dry_run, fail_fast)
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback
pub fn execute<L, P, C>(
    resource: &L,
    client: &L::Client,
    plan: ExecutionPlan<L::State>,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteOutcome<L::State>>
where
    L: Lifecycle,
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let mut outcome = ExecuteOutcome::default();
    let total_changes = plan.summary().total();

    if total_changes == 0 {
        outcome.summary.no_change = plan.changes.len();
        return Ok(outcome);
    }

    // Confirm before proceeding (unless dry_run)
    let skip_reason = if opts.dry_run {
        Some("Dry run")
    } else if !confirm.confirm(&format!("Apply {total_changes} change(s)?"))? {
        Some("Declined")
    } else {
        None
    };
    if let Some(reason) = skip_reason {
        for change in plan.changes.iter().filter(|c| c.action.is_change()) {
            outcome.summary.add_result(&ApplyResult::Skipped {
                reason: reason.to_string(),
            });
            log::debug!("Skipping {}: {}", change.address, reason);
        }
        return Ok(outcome);
    }

    progress.on_plan_start(total_changes);
    for change in &plan.changes {
        if !change.action.is_change() {
            outcome.summary.add_result(&ApplyResult::NoChange);
            continue;
        }

        progress.on_change_start(&change.address, &change.action);
        let (result, state) = apply_change(resource, client, change);
        progress.on_change_complete(&change.address, &result);

        if let ApplyResult::Failed { error } = &result {
            log::error!("{}: {}", change.address, error);
            outcome
                .errors
                .push((change.address.to_string(), error.clone()));
        } else {
            log::info!("{}: {:?}", change.address, result);
        }
        if let Some(state) = state {
            outcome.states.insert(change.address.alias.clone(), state);
        }

        let failed = !result.is_success();
        outcome.summary.add_result(&result);
        if failed && opts.fail_fast {
            break;
        }
    }
    progress.on_plan_complete();

    Ok(outcome)
}

/// Re-read every recorded resource from the remote side
///
/// Resources whose identity key is cleared by the read map to `None`.
pub fn refresh<L>(
    resource: &L,
    client: &L::Client,
    recorded: &BTreeMap<String, Recorded<L::State>>,
) -> Result<BTreeMap<String, Option<Recorded<L::State>>>>
where
    L: Lifecycle,
{
    let mut refreshed = BTreeMap::new();
    for (alias, rec) in recorded {
        let mut data = ResourceData::with_id(rec.id.clone(), rec.state.clone())
            .with_timeouts(rec.timeouts);
        resource
            .read(&mut data, client)
            .with_context(|| format!("Failed to refresh {}.{}", resource.type_name(), alias))?;

        let entry = if data.exists() {
            Some(to_recorded(data))
        } else {
            log::info!(
                "{}.{} no longer exists remotely",
                resource.type_name(),
                alias
            );
            None
        };
        refreshed.insert(alias.clone(), entry);
    }
    Ok(refreshed)
}

fn to_recorded<S>(data: ResourceData<S>) -> Recorded<S> {
    let id = data.id().to_string();
    let timeouts = *data.timeouts();
    Recorded {
        id,
        state: data.into_state(),
        timeouts,
    }
}

fn failed(err: &anyhow::Error) -> ApplyResult {
    ApplyResult::Failed {
        error: format!("{err:#}"),
    }
}

/// Apply a single change, returning its result and the state to record
fn apply_change<L: Lifecycle>(
    resource: &L,
    client: &L::Client,
    change: &PlannedChange<L::State>,
) -> (ApplyResult, Option<StateChange<L::State>>) {
    match &change.action {
        Action::NoOp => (ApplyResult::NoChange, None),
        Action::Create => match create(resource, client, change) {
            Ok(state) => (ApplyResult::Created, Some(state)),
            Err((err, state)) => (failed(&err), state),
        },
        Action::Update { fields } => match update(resource, client, change, fields) {
            Ok(state) => (ApplyResult::Updated, Some(state)),
            Err(err) => (failed(&err), None),
        },
        Action::Replace { .. } => {
            if let Err(err) = delete(resource, client, change) {
                return (failed(&err), None);
            }
            match create(resource, client, change) {
                Ok(state) => (ApplyResult::Replaced, Some(state)),
                Err((err, state)) => (failed(&err), state.or(Some(StateChange::Removed))),
            }
        }
        Action::Delete => match delete(resource, client, change) {
            Ok(()) => (ApplyResult::Deleted, Some(StateChange::Removed)),
            Err(err) => (failed(&err), None),
        },
    }
}

type CreateFailure<S> = (anyhow::Error, Option<StateChange<S>>);

fn create<L: Lifecycle>(
    resource: &L,
    client: &L::Client,
    change: &PlannedChange<L::State>,
) -> std::result::Result<StateChange<L::State>, CreateFailure<L::State>> {
    let desired = change
        .desired
        .clone()
        .ok_or_else(|| (anyhow!("No desired state for {}", change.address), None))?;
    let mut data = ResourceData::new(desired).with_timeouts(change.timeouts);

    match resource.create(&mut data, client) {
        Ok(()) if data.exists() => Ok(StateChange::Set(to_recorded(data))),
        Ok(()) => Err((
            anyhow!("{} was created but could not be read back", change.address),
            None,
        )),
        // Created remotely but the follow-up read failed: keep tracking it
        Err(err) if data.exists() => Err((err, Some(StateChange::Set(to_recorded(data))))),
        Err(err) => Err((err, None)),
    }
}

fn update<L: Lifecycle>(
    resource: &L,
    client: &L::Client,
    change: &PlannedChange<L::State>,
    fields: &[String],
) -> Result<StateChange<L::State>> {
    let desired = change
        .desired
        .clone()
        .ok_or_else(|| anyhow!("No desired state for {}", change.address))?;
    let id = change
        .id
        .clone()
        .ok_or_else(|| anyhow!("No recorded id for {}", change.address))?;
    let mut data = ResourceData::with_id(id, desired)
        .with_changes(fields.iter().cloned())
        .with_timeouts(change.timeouts);

    resource.update(&mut data, client)?;
    if data.exists() {
        Ok(StateChange::Set(to_recorded(data)))
    } else {
        Ok(StateChange::Removed)
    }
}

fn delete<L: Lifecycle>(
    resource: &L,
    client: &L::Client,
    change: &PlannedChange<L::State>,
) -> Result<()> {
    let prior = change
        .prior
        .clone()
        .ok_or_else(|| anyhow!("No recorded state for {}", change.address))?;
    let id = change.id.clone().unwrap_or_default();
    let mut data = ResourceData::with_id(id, prior).with_timeouts(change.timeouts);
    resource.delete(&mut data, client)
}
