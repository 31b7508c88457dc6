//! UI utilities for Shopfront CLI.

use std::io::{self, BufRead, Write};

use shopfront_core::api::Price;

/// Width of horizontal rules.
pub const RULE_WIDTH: usize = 72;

/// Print a horizontal rule.
pub fn rule() {
    println!("{}", "─".repeat(RULE_WIDTH));
}

/// Format a price with the configured currency symbol.
pub fn price(amount: Price, symbol: &str) -> String {
    format!("{symbol}{amount}")
}

/// Shorten `text` to at most `width` characters, marking the cut with `…`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Ask a yes/no question on stdin. Anything but `y`/`yes` is a no.
pub fn confirm(question: &str) -> io::Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Print an error with its code and suggestion when it comes from the core
/// library.
pub fn report_error(err: &anyhow::Error) {
    for line in error_report(err) {
        eprintln!("{line}");
    }
}

fn error_report(err: &anyhow::Error) -> Vec<String> {
    let mut lines = vec![format!("Error: {err:#}")];

    if let Some(core) = err.downcast_ref::<shopfront_core::Error>() {
        if let Some(code) = core.code() {
            lines.push(format!("  Code: {code}"));
        }
        if let Some(suggestion) = core.suggestion() {
            lines.push(format!("  Hint: {suggestion}"));
        }
        if core.is_recoverable() {
            lines.push("  This may be temporary. Try the command again.".to_string());
        }
    }
    lines
}

/// Print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
