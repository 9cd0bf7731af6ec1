//! File-backed mirror surface.
//!
//! The snapshot is written as a JSON document that a widget process can
//! watch. The widget talks back by appending one JSON remote event per line
//! (`"MARK_NEXT_SET"`, `"SKIP_REST"`) to the inbox file.
//!
//! Writers and the poller take `<inbox>.lock` (created with `create_new`)
//! around their file operations. The poller renames the inbox to
//! `<inbox>.draining` before reading it, so a writer that ignores the lock
//! starts a fresh inbox instead of appending to a file about to be deleted.

use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::boundary::SyncBoundary;
use super::types::{RemoteEvent, SyncSnapshot};
use crate::error::SyncError;

/// A lock held longer than this is assumed abandoned by a dead process.
const LOCK_STALE_AFTER: Duration = Duration::from_secs(2);
const LOCK_RETRY: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct FileBoundary {
    surface_path: PathBuf,
    inbox_path: PathBuf,
}

impl FileBoundary {
    pub fn new(surface_path: impl Into<PathBuf>, inbox_path: impl Into<PathBuf>) -> Self {
        Self {
            surface_path: surface_path.into(),
            inbox_path: inbox_path.into(),
        }
    }

    pub fn surface_path(&self) -> &Path {
        &self.surface_path
    }

    pub fn inbox_path(&self) -> &Path {
        &self.inbox_path
    }

    /// Append a remote event to the inbox, as the widget would.
    pub fn send_remote(&self, event: RemoteEvent) -> Result<(), SyncError> {
        let line = format!("{}\n", serde_json::to_string(&event)?);
        let _lock = InboxLock::acquire(self.sibling(".lock"))?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inbox_path)
            .map_err(|e| io_error(&self.inbox_path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| io_error(&self.inbox_path, e))
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.inbox_path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Move the inbox aside and read it. Leftovers of a poll that died
    /// between rename and delete come first.
    fn take_inbox(&self) -> Result<String, SyncError> {
        let draining = self.sibling(".draining");
        let _lock = InboxLock::acquire(self.sibling(".lock"))?;
        let mut content = take_file(&draining)?;
        match fs::rename(&self.inbox_path, &draining) {
            Ok(()) => content.push_str(&take_file(&draining)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(&self.inbox_path, e)),
        }
        Ok(content)
    }
}

impl SyncBoundary for FileBoundary {
    fn init(&mut self) -> Result<(), SyncError> {
        if let Some(parent) = self.surface_path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        Ok(())
    }

    fn publish(&mut self, snapshot: &SyncSnapshot) -> Result<(), SyncError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        // Readers see either the old or the new document.
        let tmp = self.surface_path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &self.surface_path).map_err(|e| io_error(&self.surface_path, e))
    }

    fn clear(&mut self) -> Result<(), SyncError> {
        match fs::remove_file(&self.surface_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&self.surface_path, e)),
        }
    }

    fn poll_remote(&mut self) -> Result<Vec<RemoteEvent>, SyncError> {
        if !self.inbox_path.exists() && !self.sibling(".draining").exists() {
            return Ok(Vec::new());
        }
        let content = self.take_inbox()?;

        let mut events = Vec::new();
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match serde_json::from_str::<RemoteEvent>(line) {
                Ok(event) => events.push(event),
                Err(e) => tracing::warn!(line, error = %e, "ignoring unknown remote event"),
            }
        }
        Ok(events)
    }
}

/// Exclusive use of the inbox, released on drop.
struct InboxLock {
    path: PathBuf,
}

impl InboxLock {
    fn acquire(path: PathBuf) -> Result<Self, SyncError> {
        let waiting_since = Instant::now();
        loop {
            match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if waiting_since.elapsed() >= LOCK_STALE_AFTER {
                        tracing::warn!(path = %path.display(), "breaking stale inbox lock");
                        match fs::remove_file(&path) {
                            Ok(()) => {}
                            Err(e) if e.kind() == ErrorKind::NotFound => {}
                            Err(e) => return Err(io_error(&path, e)),
                        }
                    } else {
                        std::thread::sleep(LOCK_RETRY);
                    }
                }
                Err(e) => return Err(io_error(&path, e)),
            }
        }
    }
}

impl Drop for InboxLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release inbox lock");
        }
    }
}

/// Read and delete `path`. A missing file reads as empty.
fn take_file(path: &Path) -> Result<String, SyncError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(String::new()),
        Err(e) => return Err(io_error(path, e)),
    };
    fs::remove_file(path).map_err(|e| io_error(path, e))?;
    Ok(content)
}

fn io_error(path: &Path, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.to_path_buf(),
        source,
    }
}
