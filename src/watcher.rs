//! Live-follow support: a cancellable, pull-based sequence of lines
//! appended to a file after a starting byte offset.
//!
//! Filesystem events from `notify` wake the session up; a fallback poll
//! interval covers missed events and bounds cancellation latency. The
//! session owns its file handle exclusively for its whole lifetime.

use memchr::memchr;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Fallback poll interval; also bounds how long cancellation can take.
const FALLBACK_POLL: Duration = Duration::from_millis(200);

/// File change notification
#[derive(Debug, Clone)]
pub enum FileEvent {
    Modified,
    Error(String),
}

/// Thin wrapper around the recommended `notify` backend for a single file.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<FileEvent>,
}

impl FileWatcher {
    /// Create a new file watcher for the given path
    pub fn new<P: AsRef<Path>>(path: P) -> notify::Result<Self> {
        let (tx, rx) = channel();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    // Only care about content changes
                    if matches!(
                        event.kind,
                        notify::EventKind::Modify(_) | notify::EventKind::Create(_)
                    ) {
                        let _ = tx.send(FileEvent::Modified);
                    }
                }
                Err(e) => {
                    let _ = tx.send(FileEvent::Error(e.to_string()));
                }
            }
        })?;

        watcher.watch(path.as_ref(), RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
        })
    }

    /// Wait up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<FileEvent> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

/// An active watch on a file: owns the file handle, the last-read offset,
/// and the cancellation flag. Iterating yields complete appended lines in
/// append order; `next()` returns `None` once cancelled.
pub struct FollowSession {
    path: PathBuf,
    file: File,
    offset: u64,
    /// Bytes of an unterminated trailing line, prefixed onto the next read
    carry: Vec<u8>,
    pending: VecDeque<String>,
    watcher: FileWatcher,
    cancel: Arc<AtomicBool>,
    failed: bool,
}

impl FollowSession {
    /// Start following `path` from `offset` (normally the end of the file
    /// at watch-start time).
    pub fn start(path: &Path, offset: u64, cancel: Arc<AtomicBool>) -> io::Result<Self> {
        let watcher = FileWatcher::new(path).map_err(io::Error::other)?;
        let file = File::open(path)?;
        debug!(path = %path.display(), offset, "follow session started");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            offset,
            carry: Vec::new(),
            pending: VecDeque::new(),
            watcher,
            cancel,
            failed: false,
        })
    }

    /// Read newly appended bytes and queue any complete lines.
    fn poll_once(&mut self) -> io::Result<()> {
        let len = self.file.metadata()?.len();

        if len < self.offset {
            // Rotated or truncated externally: resume from the current end
            debug!(
                path = %self.path.display(),
                old_offset = self.offset,
                new_len = len,
                "file shrank, re-seeking to end"
            );
            self.offset = len;
            self.carry.clear();
            return Ok(());
        }
        if len == self.offset {
            return Ok(());
        }

        self.file.seek(SeekFrom::Start(self.offset))?;
        let mut buf = Vec::with_capacity((len - self.offset) as usize);
        (&mut self.file)
            .take(len - self.offset)
            .read_to_end(&mut buf)?;
        self.offset += buf.len() as u64;
        self.carry.extend_from_slice(&buf);

        while let Some(pos) = memchr(b'\n', &self.carry) {
            let mut line: Vec<u8> = self.carry.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            self.pending
                .push_back(String::from_utf8_lossy(&line).into_owned());
        }
        Ok(())
    }
}

impl Iterator for FollowSession {
    type Item = io::Result<String>;

    /// Blocks between polls; never busy-spins. After a cancellation signal
    /// or a fatal I/O error there are no further emissions.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if self.cancel.load(Ordering::SeqCst) {
                debug!(path = %self.path.display(), "follow session cancelled");
                return None;
            }
            if let Some(line) = self.pending.pop_front() {
                return Some(Ok(line));
            }

            match self.watcher.recv_timeout(FALLBACK_POLL) {
                Some(FileEvent::Error(e)) => {
                    self.failed = true;
                    return Some(Err(io::Error::other(e)));
                }
                // Poll on timeout too, in case an event was missed
                Some(FileEvent::Modified) | None => {}
            }
            if let Err(e) = self.poll_once() {
                self.failed = true;
                return Some(Err(e));
            }
        }
    }
}
