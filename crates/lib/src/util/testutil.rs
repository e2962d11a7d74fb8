//! Test utilities for viter-lib.
//!
//! Scratch project trees and cross-platform shell commands for build tests.

use std::path::Path;

/// Write a file relative to `root`, creating parent directories.
pub fn write_file(root: &Path, relative_path: &str, content: &str) {
  let path = root.join(relative_path);
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(&path, content).unwrap();
}

/// Returns the shell command argv to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> Vec<String> {
  vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()]
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> Vec<String> {
  vec!["cmd.exe".to_string(), "/C".to_string(), script.to_string()]
}

/// Returns a script that echoes an environment variable.
#[cfg(unix)]
pub fn echo_env(var: &str) -> String {
  format!("echo \"${}\"", var)
}

#[cfg(windows)]
pub fn echo_env(var: &str) -> String {
  format!("echo %{}%", var)
}
