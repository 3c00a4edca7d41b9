//! Terminal progress and confirmation for plan execution.

use anyhow::Result;
use colored::Colorize;
use declarative::{Action, Address, ApplyResult, ConfirmCallback, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner with a message
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("  {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Symbol shown next to a finished change
pub fn result_symbol(result: &ApplyResult) -> colored::ColoredString {
    match result {
        ApplyResult::NoChange => "○".dimmed(),
        ApplyResult::Created
        | ApplyResult::Updated
        | ApplyResult::Replaced
        | ApplyResult::Deleted => "✓".green(),
        ApplyResult::Failed { .. } => "✗".red(),
        ApplyResult::Skipped { .. } => "⊘".yellow(),
    }
}

fn describe(result: &ApplyResult) -> String {
    match result {
        ApplyResult::NoChange => "unchanged".to_string(),
        ApplyResult::Created => "created".to_string(),
        ApplyResult::Updated => "updated".to_string(),
        ApplyResult::Replaced => "replaced".to_string(),
        ApplyResult::Deleted => "destroyed".to_string(),
        ApplyResult::Failed { error } => format!("failed: {error}"),
        ApplyResult::Skipped { reason } => format!("skipped: {reason}"),
    }
}

/// One spinner per change, replaced by a result line when it finishes
#[derive(Default)]
pub struct SpinnerProgress {
    current: Option<ProgressBar>,
    quiet: bool,
}

impl SpinnerProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            current: None,
            quiet,
        }
    }
}

impl ProgressCallback for SpinnerProgress {
    fn on_plan_start(&mut self, count: usize) {
        if !self.quiet {
            println!();
            println!("  {} Applying {} change(s)...", "→".cyan(), count);
        }
    }

    fn on_change_start(&mut self, address: &Address, action: &Action) {
        if !self.quiet {
            self.current = Some(spinner(&format!("{} {address}", action.symbol())));
        }
    }

    fn on_change_complete(&mut self, address: &Address, result: &ApplyResult) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
        if !self.quiet || !result.is_success() {
            println!(
                "    {} {} {}",
                result_symbol(result),
                address,
                describe(result).dimmed()
            );
        }
    }

    fn on_plan_complete(&mut self) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
    }
}

/// Interactive yes/no prompt
pub struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        use dialoguer::Confirm;

        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;

        Ok(confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_results() {
        assert_eq!(describe(&ApplyResult::Deleted), "destroyed");
        assert_eq!(
            describe(&ApplyResult::Failed {
                error: "boom".into()
            }),
            "failed: boom"
        );
    }

    #[test]
    fn test_quiet_progress_has_no_spinner() {
        let mut progress = SpinnerProgress::new(true);
        let address = Address::new("t", "a");
        progress.on_change_start(&address, &Action::Create);
        assert!(progress.current.is_none());
        progress.on_change_complete(&address, &ApplyResult::Created);
        progress.on_plan_complete();
    }
}
