use colored::{ColoredString, Colorize};
use declarative::Action;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Colored plan symbol for an action
pub fn action_symbol(action: &Action) -> ColoredString {
    let symbol = action.symbol();
    match action {
        Action::NoOp => symbol.dimmed(),
        Action::Create => symbol.green(),
        Action::Update { .. } => symbol.yellow(),
        Action::Replace { .. } => symbol.magenta(),
        Action::Delete => symbol.red(),
    }
}

/// Quote a value for plan output, `(empty)` for blanks
pub fn quoted(value: &str) -> String {
    if value.is_empty() {
        "(empty)".to_string()
    } else {
        format!("\"{value}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted() {
        assert_eq!(quoted("api"), "\"api\"");
        assert_eq!(quoted(""), "(empty)");
    }

    #[test]
    fn test_action_symbol_text() {
        colored::control::set_override(false);
        assert_eq!(action_symbol(&Action::Create).to_string(), "+");
        assert_eq!(
            action_symbol(&Action::Replace { fields: vec![] }).to_string(),
            "-/+"
        );
    }
}
