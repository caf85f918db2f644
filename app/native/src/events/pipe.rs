//! FIFO event ingestion.
//!
//! yabai signals run `aegis event <name>`, which writes one line into a named
//! pipe. A dedicated thread reads the pipe and posts each line to the router.
//!
//! The reader opens the FIFO read+write so it never sees end-of-file when the
//! last writer goes away, and waits with `poll(2)` so it can notice a stop
//! request or a replaced endpoint between events.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::AsFd;
use std::os::unix::fs::{FileTypeExt, MetadataExt, OpenOptionsExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use nix::sys::stat::Mode;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use super::router::RouterHandle;
use super::types::EventKind;
use crate::config::EventsConfig;
use crate::error::AegisError;

/// Longest line accepted from the pipe; longer input is discarded.
const MAX_LINE_LEN: usize = 256;

/// Where and how to read events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipeSettings {
    pub path: PathBuf,
    /// Create the FIFO when it is missing.
    pub create: bool,
    /// How often the reader wakes up to check for stop and endpoint changes.
    pub poll_interval: Duration,
}

impl From<&EventsConfig> for PipeSettings {
    fn from(config: &EventsConfig) -> Self {
        Self {
            path: config.resolved_pipe_path(),
            create: config.create_pipe,
            poll_interval: config.poll_interval(),
        }
    }
}

/// Running ingestion thread.
///
/// Dropping it stops the reader as well; [`Ingestion::stop`] additionally
/// waits for the thread to exit.
#[derive(Debug)]
pub struct Ingestion {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Ingestion {
    /// Starts reading `settings.path` on a new thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn start(settings: PipeSettings, router: RouterHandle) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let thread = thread::Builder::new()
            .name("aegis-ingestion".to_string())
            .spawn(move || PipeReader::new(settings, router, thread_stop).run())?;

        Ok(Self { stop, thread: Some(thread) })
    }

    /// Stops the reader and waits for it to release the pipe.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::error!("ingestion: reader thread panicked");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool { self.thread.as_ref().is_some_and(|t| !t.is_finished()) }
}

impl Drop for Ingestion {
    fn drop(&mut self) { self.stop.store(true, Ordering::SeqCst); }
}

/// Why a read loop ended.
enum ReadOutcome {
    /// Stop requested or the router is gone.
    Stop,
    /// The endpoint changed or failed; open it again.
    Reopen,
}

/// (device, inode) of an opened endpoint.
type Identity = (u64, u64);

struct PipeReader {
    settings: PipeSettings,
    router: RouterHandle,
    stop: Arc<AtomicBool>,
    reported_unavailable: bool,
}

impl PipeReader {
    fn new(settings: PipeSettings, router: RouterHandle, stop: Arc<AtomicBool>) -> Self {
        Self { settings, router, stop, reported_unavailable: false }
    }

    fn stopping(&self) -> bool { self.stop.load(Ordering::SeqCst) }

    fn run(mut self) {
        tracing::debug!("ingestion: reading {}", self.settings.path.display());

        while !self.stopping() {
            match open_endpoint(&self.settings.path, self.settings.create) {
                Ok((file, identity)) => {
                    if self.reported_unavailable {
                        tracing::info!("ingestion: {} is available again", self.settings.path.display());
                        self.reported_unavailable = false;
                    }
                    match self.read_loop(&file, identity) {
                        ReadOutcome::Stop => break,
                        ReadOutcome::Reopen => {
                            tracing::debug!("ingestion: endpoint changed, reopening");
                        }
                    }
                }
                Err(err) => {
                    if !self.reported_unavailable {
                        tracing::warn!("ingestion: {err}; waiting for the pipe to appear");
                        self.reported_unavailable = true;
                    }
                    self.wait_for_endpoint();
                }
            }
        }

        tracing::debug!("ingestion: stopped");
    }

    fn read_loop(&self, file: &File, identity: Identity) -> ReadOutcome {
        let timeout = poll_timeout(self.settings.poll_interval);
        let mut buffer = [0_u8; 1024];
        let mut line = Vec::with_capacity(MAX_LINE_LEN);
        let mut reader = file;
        let mut checked = Instant::now();

        loop {
            if self.stopping() {
                return ReadOutcome::Stop;
            }

            // A writer holding the old endpoint open keeps poll busy, so the
            // path is also rechecked on a timer.
            if checked.elapsed() >= self.settings.poll_interval {
                if endpoint_identity(&self.settings.path) != Some(identity) {
                    return ReadOutcome::Reopen;
                }
                checked = Instant::now();
            }

            let mut fds = [PollFd::new(file.as_fd(), PollFlags::POLLIN)];
            match poll(&mut fds, timeout) {
                Ok(0) => {
                    if endpoint_identity(&self.settings.path) != Some(identity) {
                        return ReadOutcome::Reopen;
                    }
                    checked = Instant::now();
                    continue;
                }
                Ok(_) => {}
                Err(Errno::EINTR) => continue,
                Err(err) => {
                    tracing::warn!("ingestion: poll failed: {err}");
                    return ReadOutcome::Reopen;
                }
            }

            let read = match reader.read(&mut buffer) {
                Ok(read) => read,
                Err(err) if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                    continue;
                }
                Err(err) => {
                    tracing::warn!("ingestion: read failed: {err}");
                    return ReadOutcome::Reopen;
                }
            };

            for &byte in &buffer[..read] {
                if byte != b'\n' {
                    if line.len() < MAX_LINE_LEN {
                        line.push(byte);
                    }
                    continue;
                }

                let kind = EventKind::parse(&String::from_utf8_lossy(&line));
                if kind == EventKind::Unknown {
                    tracing::debug!("ingestion: unknown event {:?}", String::from_utf8_lossy(&line));
                }
                line.clear();

                if kind != EventKind::Unknown && !self.router.post_blocking(kind) {
                    tracing::debug!("ingestion: router is gone");
                    return ReadOutcome::Stop;
                }
            }
        }
    }

    /// Blocks until the endpoint can be opened or a stop is requested.
    fn wait_for_endpoint(&self) {
        let (tx, rx) = std::sync::mpsc::channel();
        let watch_dir = self.settings.path.parent().unwrap_or_else(|| Path::new("/"));

        // The watcher only shortens the wait; polling alone is enough.
        let _watcher: Option<RecommendedWatcher> = match notify::recommended_watcher(tx) {
            Ok(mut watcher) => match watcher.watch(watch_dir, RecursiveMode::NonRecursive) {
                Ok(()) => Some(watcher),
                Err(err) => {
                    tracing::debug!("ingestion: cannot watch {}: {err}", watch_dir.display());
                    None
                }
            },
            Err(err) => {
                tracing::debug!("ingestion: watcher unavailable: {err}");
                None
            }
        };

        // Wait before the first check so a failing mkfifo is not retried in a
        // tight loop.
        loop {
            match rx.recv_timeout(self.settings.poll_interval) {
                Ok(_) | Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                    thread::sleep(self.settings.poll_interval);
                }
            }

            if self.stopping() || endpoint_ready(&self.settings.path, self.settings.create) {
                return;
            }
        }
    }
}

fn poll_timeout(interval: Duration) -> PollTimeout {
    let millis = u16::try_from(interval.as_millis()).unwrap_or(u16::MAX).max(1);
    PollTimeout::from(millis)
}

fn is_fifo(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.file_type().is_fifo())
}

fn endpoint_identity(path: &Path) -> Option<Identity> {
    fs::metadata(path)
        .ok()
        .filter(|meta| meta.file_type().is_fifo())
        .map(|meta| (meta.dev(), meta.ino()))
}

/// Whether [`open_endpoint`] is expected to succeed now.
fn endpoint_ready(path: &Path, create: bool) -> bool {
    if is_fifo(path) {
        return true;
    }
    create && !path.exists() && path.parent().is_some_and(Path::is_dir)
}

/// Creates the FIFO at `path` (owner read/write only).
///
/// # Errors
///
/// Returns an error if the FIFO cannot be created.
pub fn create_fifo(path: &Path) -> io::Result<()> {
    nix::unistd::mkfifo(path, Mode::S_IRUSR | Mode::S_IWUSR).map_err(io::Error::from)?;
    tracing::info!("ingestion: created {}", path.display());
    Ok(())
}

fn open_endpoint(path: &Path, create: bool) -> Result<(File, Identity), AegisError> {
    let unavailable = |reason: String| {
        AegisError::IngestionUnavailable(format!("{}: {reason}", path.display()))
    };

    match fs::metadata(path) {
        Ok(meta) if !meta.file_type().is_fifo() => {
            return Err(unavailable("exists but is not a FIFO".to_string()));
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound && create => {
            match create_fifo(path) {
                Ok(()) => {}
                // Another process created it first.
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
                Err(err) => return Err(unavailable(err.to_string())),
            }
        }
        Err(err) => return Err(unavailable(err.to_string())),
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(OFlag::O_NONBLOCK.bits())
        .open(path)
        .map_err(|err| unavailable(err.to_string()))?;

    let meta = file.metadata().map_err(|err| unavailable(err.to_string()))?;
    if !meta.file_type().is_fifo() {
        return Err(unavailable("exists but is not a FIFO".to_string()));
    }

    Ok((file, (meta.dev(), meta.ino())))
}

/// Writes one event line into the pipe without blocking.
///
/// Returns `Ok(false)` when nobody is listening (no reader, missing pipe or a
/// full buffer); signal handlers must never hang on an absent daemon.
///
/// # Errors
///
/// Returns an error if the path exists but is not a FIFO, or the write fails
/// for another reason.
pub fn write_event(path: &Path, event: &str) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(meta) if !meta.file_type().is_fifo() => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a FIFO", path.display()),
            ));
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    }

    let mut fifo = match OpenOptions::new()
        .write(true)
        .custom_flags(OFlag::O_NONBLOCK.bits())
        .open(path)
    {
        Ok(fifo) => fifo,
        Err(err) if err.raw_os_error() == Some(Errno::ENXIO as i32) => return Ok(false),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };

    let line = format!("{}\n", event.trim());
    match fifo.write_all(line.as_bytes()) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(false),
        Err(err) => Err(err),
    }
}
