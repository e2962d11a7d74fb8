//! File-based compile locking for mutual exclusion across processes.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::COMPILE_LOCK_FILENAME;

/// Written into the lock file by the holder, so a process that finds the lock
/// taken can say who has it.
#[derive(Debug, Serialize, Deserialize)]
pub struct LockMetadata {
  pub version: u32,
  pub pid: u32,
  pub started_at_unix: u64,
  pub env: String,
}

#[derive(Debug, Error)]
pub enum CompileLockError {
  /// Another process is building and the caller chose not to wait.
  #[error("a build for {env} is already running (pid {pid}, started at unix time {started_at_unix}); lock file: {lock_path}")]
  Contention {
    env: String,
    pid: u32,
    started_at_unix: u64,
    lock_path: PathBuf,
  },

  /// The lock is held but its holder could not be identified.
  #[error("a build is already running; lock file: {lock_path}")]
  ContentionUnknown { lock_path: PathBuf },

  #[error("failed to create cache directory: {0}")]
  CreateDir(#[source] io::Error),

  #[error("failed to open compile lock: {0}")]
  OpenFile(#[source] io::Error),

  #[error("failed to write compile lock metadata: {0}")]
  WriteMetadata(#[source] io::Error),

  #[error("failed to take compile lock: {0}")]
  LockFailed(#[source] io::Error),
}

/// Exclusive advisory lock on `<cache_path>/.compile.lock`, released on drop.
pub struct CompileLock {
  _file: File,
  lock_path: PathBuf,
}

impl CompileLock {
  /// Take the lock if it is free; otherwise report who holds it.
  pub fn try_acquire(cache_path: &Path, env: &str) -> Result<Self, CompileLockError> {
    let (file, lock_path) = open_lock_file(cache_path)?;
    match lock(&file, false) {
      Ok(()) => Self::hold(file, lock_path, env),
      Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(holder_of(&lock_path)),
      Err(e) => Err(CompileLockError::LockFailed(e)),
    }
  }

  /// Take the lock, blocking the calling thread until it is free.
  pub fn acquire(cache_path: &Path, env: &str) -> Result<Self, CompileLockError> {
    let (file, lock_path) = open_lock_file(cache_path)?;
    lock(&file, true).map_err(CompileLockError::LockFailed)?;
    Self::hold(file, lock_path, env)
  }

  fn hold(file: File, lock_path: PathBuf, env: &str) -> Result<Self, CompileLockError> {
    write_metadata(&file, env)?;
    debug!(env = %env, path = ?lock_path, "compile lock taken");
    Ok(CompileLock { _file: file, lock_path })
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }
}

fn open_lock_file(cache_path: &Path) -> Result<(File, PathBuf), CompileLockError> {
  fs::create_dir_all(cache_path).map_err(CompileLockError::CreateDir)?;

  let lock_path = cache_path.join(COMPILE_LOCK_FILENAME);
  let file = OpenOptions::new()
    .read(true)
    .write(true)
    .create(true)
    .truncate(false)
    .open(&lock_path)
    .map_err(CompileLockError::OpenFile)?;

  Ok((file, lock_path))
}

fn write_metadata(file: &File, env: &str) -> Result<(), CompileLockError> {
  let metadata = LockMetadata {
    version: 1,
    pid: std::process::id(),
    started_at_unix: SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .unwrap_or_default()
      .as_secs(),
    env: env.to_string(),
  };

  file.set_len(0).map_err(CompileLockError::WriteMetadata)?;
  let mut writer = io::BufWriter::new(file);
  serde_json::to_writer(&mut writer, &metadata).map_err(|e| CompileLockError::WriteMetadata(io::Error::other(e)))?;
  writer.flush().map_err(CompileLockError::WriteMetadata)
}

/// Contention error naming the current holder. On Windows the held region
/// cannot be read, so this degrades to `ContentionUnknown`.
fn holder_of(lock_path: &Path) -> CompileLockError {
  let holder = fs::read_to_string(lock_path)
    .ok()
    .and_then(|contents| serde_json::from_str::<LockMetadata>(&contents).ok());

  match holder {
    Some(LockMetadata {
      env,
      pid,
      started_at_unix,
      ..
    }) => CompileLockError::Contention {
      env,
      pid,
      started_at_unix,
      lock_path: lock_path.to_path_buf(),
    },
    None => CompileLockError::ContentionUnknown {
      lock_path: lock_path.to_path_buf(),
    },
  }
}

#[cfg(unix)]
fn lock(file: &File, wait: bool) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  let operation = if wait {
    FlockOperation::LockExclusive
  } else {
    FlockOperation::NonBlockingLockExclusive
  };

  flock(file.as_fd(), operation).map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn lock(file: &File, wait: bool) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::HANDLE;
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};

  let handle = file.as_raw_handle() as HANDLE;
  let flags = if wait {
    LOCKFILE_EXCLUSIVE_LOCK
  } else {
    LOCKFILE_FAIL_IMMEDIATELY | LOCKFILE_EXCLUSIVE_LOCK
  };

  // SAFETY: OVERLAPPED is a plain data struct that is valid when zero-initialized.
  // LockFileEx is safe to call with a valid file handle and zeroed OVERLAPPED.
  let result = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(handle, flags, 0, 1, 0, &mut overlapped)
  };

  if result == 0 {
    let err = io::Error::last_os_error();
    // ERROR_LOCK_VIOLATION
    if err.raw_os_error() == Some(33) {
      return Err(io::Error::from(io::ErrorKind::WouldBlock));
    }
    Err(err)
  } else {
    Ok(())
  }
}
