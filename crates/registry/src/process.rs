// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One scope worker process: spawn, readiness, and termination.

use std::sync::Arc;
use std::time::{Duration, Instant};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use scopes_core::{Error, Result};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// How long a freshly spawned scope gets to report readiness.
pub const READY_TIMEOUT: Duration = Duration::from_millis(1500);

/// Grace period between SIGTERM and SIGKILL on stop, and the bound on a
/// `Stopping → Stopped` wait in `locate`.
pub const STOP_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

struct ProcInner {
    child: Option<Child>,
}

/// Process record for one scope. State transitions run under the async
/// `inner` lock, so at most one spawn or stop is in flight per scope; the
/// registry mutex is never held across these waits.
pub struct ScopeProcess {
    scope_id: String,
    exec_argv: Vec<String>,
    state: Mutex<ProcessState>,
    last_ping: Mutex<Option<Instant>>,
    ready_tx: Mutex<Option<oneshot::Sender<()>>>,
    inner: tokio::sync::Mutex<ProcInner>,
}

impl ScopeProcess {
    pub fn new(scope_id: impl Into<String>, exec_argv: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            scope_id: scope_id.into(),
            exec_argv,
            state: Mutex::new(ProcessState::Stopped),
            last_ping: Mutex::new(None),
            ready_tx: Mutex::new(None),
            inner: tokio::sync::Mutex::new(ProcInner { child: None }),
        })
    }

    pub fn state(&self) -> ProcessState {
        *self.state.lock()
    }

    pub fn exec_argv(&self) -> &[String] {
        &self.exec_argv
    }

    pub fn last_ping(&self) -> Option<Instant> {
        *self.last_ping.lock()
    }

    fn set_state(&self, state: ProcessState) {
        *self.state.lock() = state;
    }

    /// Called when the child publishes its endpoint and reports `Ready`.
    pub fn mark_ready(&self) {
        *self.last_ping.lock() = Some(Instant::now());
        if let Some(tx) = self.ready_tx.lock().take() {
            let _ = tx.send(());
        }
    }

    /// Make sure the worker is `Running`, spawning it if necessary.
    ///
    /// A child that exited on its own is reaped here and replaced by a
    /// fresh spawn. Spawn failure and ready timeout surface as
    /// `ResourceError`; on timeout the child is killed first.
    pub async fn ensure_running(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;

        match self.state() {
            ProcessState::Running => {
                if let Some(child) = inner.child.as_mut() {
                    match child.try_wait() {
                        Ok(None) => return Ok(()),
                        Ok(Some(status)) => {
                            warn!(scope_id = %self.scope_id, %status, "scope process died");
                            inner.child = None;
                            self.set_state(ProcessState::Stopped);
                        }
                        Err(e) => {
                            return Err(Error::ResourceError(format!(
                                "cannot inspect scope {:?} process: {}",
                                self.scope_id, e
                            )));
                        }
                    }
                } else {
                    self.set_state(ProcessState::Stopped);
                }
            }
            ProcessState::Stopping => {
                // stop() holds the inner lock for its whole grace period,
                // so once we are here the stop has completed.
                self.set_state(ProcessState::Stopped);
            }
            ProcessState::Stopped | ProcessState::Starting => {}
        }

        self.spawn_locked(&mut inner).await
    }

    async fn spawn_locked(&self, inner: &mut ProcInner) -> Result<()> {
        let Some(program) = self.exec_argv.first() else {
            return Err(Error::ResourceError(format!(
                "scope {:?} has no exec data configured",
                self.scope_id
            )));
        };

        self.set_state(ProcessState::Starting);
        let (tx, rx) = oneshot::channel();
        *self.ready_tx.lock() = Some(tx);

        let child = Command::new(program)
            .args(&self.exec_argv[1..])
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                self.set_state(ProcessState::Stopped);
                Error::ResourceError(format!("cannot spawn scope {:?}: {}", self.scope_id, e))
            })?;
        debug!(scope_id = %self.scope_id, pid = ?child.id(), "scope process spawned");
        inner.child = Some(child);

        match tokio::time::timeout(READY_TIMEOUT, rx).await {
            Ok(Ok(())) => {
                self.set_state(ProcessState::Running);
                info!(scope_id = %self.scope_id, "scope process ready");
                Ok(())
            }
            _ => {
                self.ready_tx.lock().take();
                if let Some(mut child) = inner.child.take() {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                }
                self.set_state(ProcessState::Stopped);
                Err(Error::ResourceError(format!(
                    "scope {:?} did not signal ready within {:?}",
                    self.scope_id, READY_TIMEOUT
                )))
            }
        }
    }

    /// Terminate the worker: SIGTERM, bounded wait, then SIGKILL.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        let Some(mut child) = inner.child.take() else {
            self.set_state(ProcessState::Stopped);
            return;
        };
        self.set_state(ProcessState::Stopping);

        if let Some(pid) = child.id() {
            let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            match tokio::time::timeout(STOP_GRACE, child.wait()).await {
                Ok(_) => debug!(scope_id = %self.scope_id, "scope process stopped"),
                Err(_) => {
                    warn!(scope_id = %self.scope_id, "scope process ignored SIGTERM, killing");
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                }
            }
        } else {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
        self.set_state(ProcessState::Stopped);
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
