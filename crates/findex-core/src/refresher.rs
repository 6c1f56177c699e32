//! Periodic background rescans.
//!
//! The refresher owns a single thread that loops forever:
//!
//! ```text
//! Idle -> Scanning -> publish -> Idle (wait scan_interval) -> Scanning -> ...
//! ```
//!
//! The wait doubles as the control point: a rescan request cuts it short and
//! a shutdown request ends the loop. The control channel holds one message,
//! so rescan requests made while one is already pending are dropped.
//! Shutdown is advisory. The caller waits a bounded time for the thread to
//! reach a quiescent point and otherwise leaves it behind; an abandoned scan
//! stops at the next entry and is never published.
//!
//! A scan that panics is logged and counts as a failed pass; the loop waits
//! for the next tick as usual.

use crate::config::Config;
use crate::error::Result;
use crate::index::Index;
use crate::scanner::Scanner;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How long [`RefresherHandle::shutdown_default`] waits for the thread
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(100);

/// What the refresher thread is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefresherStatus {
    /// A scan is in progress
    Scanning,

    /// Waiting for the next tick
    Idle,

    /// The loop has exited
    Stopped,
}

impl RefresherStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => RefresherStatus::Scanning,
            1 => RefresherStatus::Idle,
            _ => RefresherStatus::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            RefresherStatus::Scanning => 0,
            RefresherStatus::Idle => 1,
            RefresherStatus::Stopped => 2,
        }
    }
}

impl fmt::Display for RefresherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefresherStatus::Scanning => write!(f, "scanning"),
            RefresherStatus::Idle => write!(f, "idle"),
            RefresherStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// Messages from the handle to the loop
enum Control {
    Rescan,
    Shutdown,
}

/// State shared between the handle and the loop.
struct SharedState {
    status: AtomicU8,
    scans_completed: AtomicU64,
    stop: AtomicBool,
}

impl SharedState {
    fn set_status(&self, status: RefresherStatus) {
        self.status.store(status.as_u8(), Ordering::Release);
    }
}

/// Starts the background refresher.
pub struct Refresher;

impl Refresher {
    /// Spawn the refresher thread. The first scan starts immediately.
    pub fn start(config: Arc<Config>, scanner: Scanner, index: Arc<Index>) -> Result<RefresherHandle> {
        let state = Arc::new(SharedState {
            status: AtomicU8::new(RefresherStatus::Idle.as_u8()),
            scans_completed: AtomicU64::new(0),
            stop: AtomicBool::new(false),
        });
        let (control_tx, control_rx) = crossbeam_channel::bounded(1);
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);

        let thread_state = Arc::clone(&state);
        let thread = thread::Builder::new()
            .name("findex-refresher".to_string())
            .spawn(move || {
                refresh_loop(&config, &scanner, &index, &thread_state, &control_rx);
                thread_state.set_status(RefresherStatus::Stopped);
                let _ = done_tx.send(());
            })?;

        Ok(RefresherHandle {
            control: control_tx,
            done: done_rx,
            thread: Some(thread),
            state,
        })
    }
}

/// Handle to the running refresher.
///
/// Dropping the handle requests shutdown without waiting.
pub struct RefresherHandle {
    control: Sender<Control>,
    done: Receiver<()>,
    thread: Option<JoinHandle<()>>,
    state: Arc<SharedState>,
}

impl RefresherHandle {
    /// Current loop status
    pub fn status(&self) -> RefresherStatus {
        RefresherStatus::from_u8(self.state.status.load(Ordering::Acquire))
    }

    /// True while a scan is in progress
    pub fn is_scanning(&self) -> bool {
        self.status() == RefresherStatus::Scanning
    }

    /// Number of scans that have been published
    pub fn scans_completed(&self) -> u64 {
        self.state.scans_completed.load(Ordering::Acquire)
    }

    /// Cut the current wait short and rescan now.
    ///
    /// While a scan is running this queues at most one more scan after it;
    /// further requests are dropped until that one starts.
    pub fn rescan_now(&self) {
        let _ = self.control.try_send(Control::Rescan);
    }

    /// Ask the loop to stop and wait at most `timeout` for it.
    ///
    /// Returns true if the thread finished in time. Otherwise it is left
    /// running until its next quiescent point, where it exits without
    /// publishing.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        self.signal_stop();

        let Some(thread) = self.thread.take() else {
            return true;
        };

        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let _ = thread.join();
                debug!("Refresher stopped");
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Refresher still busy, abandoning it"
                );
                false
            }
        }
    }

    /// [`shutdown`](Self::shutdown) with [`DEFAULT_SHUTDOWN_TIMEOUT`].
    pub fn shutdown_default(&mut self) -> bool {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT)
    }

    fn signal_stop(&self) {
        self.state.stop.store(true, Ordering::Release);
        // A full channel already holds a message that wakes the loop, which
        // then sees the stop flag.
        let _ = self.control.try_send(Control::Shutdown);
    }
}

impl Drop for RefresherHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.signal_stop();
        }
    }
}

impl fmt::Debug for RefresherHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefresherHandle")
            .field("status", &self.status())
            .field("scans_completed", &self.scans_completed())
            .finish()
    }
}

/// How one pass of the loop ended
enum Pass {
    Published,
    Abandoned,
}

/// Main loop: scan, publish, wait, repeat.
fn refresh_loop(
    config: &Config,
    scanner: &Scanner,
    index: &Index,
    state: &SharedState,
    control: &Receiver<Control>,
) {
    info!(
        patterns = config.paths.len(),
        interval_s = config.scan_interval,
        resolver = scanner.resolver().name(),
        "Refresher started"
    );

    loop {
        state.set_status(RefresherStatus::Scanning);
        let pass = panic::catch_unwind(AssertUnwindSafe(|| {
            scan_and_publish(config, scanner, index, state)
        }));
        match pass {
            Ok(Pass::Published) => {
                state.set_status(RefresherStatus::Idle);
                state.scans_completed.fetch_add(1, Ordering::AcqRel);
            }
            Ok(Pass::Abandoned) => return,
            Err(_) => {
                state.set_status(RefresherStatus::Idle);
                error!("Scan panicked, keeping the previous index until the next pass");
            }
        }

        match control.recv_timeout(config.scan_interval()) {
            Ok(Control::Rescan) => debug!("Rescan requested"),
            Err(RecvTimeoutError::Timeout) => {}
            Ok(Control::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
        }
        if state.stop.load(Ordering::Acquire) {
            break;
        }
    }

    info!("Refresher stopped");
}

/// Run one full scan and publish it, unless shutdown is requested first.
fn scan_and_publish(config: &Config, scanner: &Scanner, index: &Index, state: &SharedState) -> Pass {
    let start = Instant::now();
    info!("Updating index");

    let mut entries = Vec::new();
    for entry in scanner.scan(config) {
        if state.stop.load(Ordering::Acquire) {
            info!(scanned = entries.len(), "Scan abandoned for shutdown");
            return Pass::Abandoned;
        }
        entries.push(entry);
    }
    if state.stop.load(Ordering::Acquire) {
        info!(scanned = entries.len(), "Scan abandoned for shutdown");
        return Pass::Abandoned;
    }

    let snapshot = index.publish(entries);
    info!(
        entries = snapshot.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Index updated"
    );
    Pass::Published
}
