//! CLI output formatting utilities.
//!
//! Colored status lines go to stdout, errors and warnings to stderr. Results
//! that scripts consume (paths, digests, JSON) are printed bare.

use std::time::Duration;

use anyhow::Context;
use owo_colors::{OwoColorize, Stream, Style};

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
}

/// First 12 characters of a digest, for display.
pub fn truncate_hash(hash: &str) -> &str {
  &hash[..hash.len().min(12)]
}

pub fn format_duration(duration: Duration) -> String {
  match (duration.as_secs(), duration.subsec_millis()) {
    (secs, _) if secs >= 60 => format!("{}m {}s", secs / 60, secs % 60),
    (0, millis) => format!("{}ms", millis),
    (secs, millis) => format!("{}.{:02}s", secs, millis / 10),
  }
}

/// `symbol message`, with the symbol (and for problems, the message) styled
/// when `stream` is a color terminal.
fn status_line(stream: Stream, symbol: &str, style: Style, message: &str, tint_message: bool) -> String {
  let symbol = symbol.if_supports_color(stream, |s| s.style(style));
  if tint_message {
    format!("{} {}", symbol, message.if_supports_color(stream, |s| s.style(style)))
  } else {
    format!("{} {}", symbol, message)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{}",
    status_line(Stream::Stdout, symbols::SUCCESS, Style::new().green(), message, false)
  );
}

pub fn print_info(message: &str) {
  println!(
    "{}",
    status_line(Stream::Stdout, symbols::INFO, Style::new().blue(), message, false)
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{}",
    status_line(Stream::Stderr, symbols::WARNING, Style::new().yellow(), message, true)
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{}",
    status_line(Stream::Stderr, symbols::ERROR, Style::new().red(), message, true)
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!("  {}: {}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()), value);
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truncates_digests() {
    assert_eq!(truncate_hash("9f86d081884c7d659a2feaa0"), "9f86d081884c");
    assert_eq!(truncate_hash("short"), "short");
    assert_eq!(truncate_hash(""), "");
  }

  #[test]
  fn formats_build_durations() {
    assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
    assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
  }
}
