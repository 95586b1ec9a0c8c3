//! Terminal output for RIS requests and responses

use std::time::Duration;

use colored::{Color, Colorize};
use indicatif::{ProgressBar, ProgressStyle};

const LABEL_WIDTH: usize = 16;

/// Outcome line for a command that succeeded.
pub fn ok(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Outcome line for a command that failed. Goes to stderr.
pub fn fail(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Follow-up advice after an outcome line.
pub fn hint(message: &str) {
    println!("  {} {}", "→".blue(), message.dimmed());
}

/// A `WARNING_n` or `ERROR_n` entry reported by RIS.
pub fn reported(kind: &str, message: &str) {
    let tag = format!("[{}]", kind);
    let tag = if kind == "ERROR" { tag.red() } else { tag.yellow() };
    println!("  {} {}", tag, message);
}

/// Section title.
pub fn section(title: &str) {
    println!("\n{}", title.bold().underline());
}

/// Label and value, labels padded to a common width.
pub fn field(label: &str, value: &str) {
    println!("  {:<width$} {}", label.cyan(), value, width = LABEL_WIDTH);
}

/// The `AUTO` decision, colored by outcome.
pub fn decision(code: &str) {
    let (meaning, color) = decision_style(code);
    let value = format!("{} ({})", code, meaning).color(color).bold();
    println!("  {:<width$} {}", "Decision".cyan(), value, width = LABEL_WIDTH);
}

fn decision_style(code: &str) -> (&'static str, Color) {
    match code {
        "A" => ("approve", Color::Green),
        "R" => ("review", Color::Yellow),
        "E" => ("escalate", Color::Yellow),
        "D" => ("decline", Color::Red),
        _ => ("unknown", Color::White),
    }
}

/// Spinner shown while a request is in flight to RIS.
pub fn request_spinner(what: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("Sending {} to RIS...", what));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Pretty-printed JSON.
pub fn json(value: &serde_json::Value) {
    if let Ok(pretty) = serde_json::to_string_pretty(value) {
        println!("{}", pretty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_style() {
        assert_eq!(decision_style("A"), ("approve", Color::Green));
        assert_eq!(decision_style("D"), ("decline", Color::Red));
        assert_eq!(decision_style("R").0, "review");
        assert_eq!(decision_style("E").0, "escalate");
        assert_eq!(decision_style("?").0, "unknown");
    }
}
