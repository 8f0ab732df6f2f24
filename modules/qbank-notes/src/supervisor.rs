// Note-server supervisor: spawn, capture stdio, poll for readiness,
// terminate gracefully, and never let a failure here take the rest of the
// process down with it.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use qbank_common::error::SupervisorError;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_millis(400);
const HEALTH_CHECK_ATTEMPTS: u32 = 30;
const INITIAL_BACKOFF: Duration = Duration::from_millis(50);
const MAX_BACKOFF: Duration = Duration::from_millis(1_000);
const STOP_GRACE: Duration = Duration::from_secs(5);
const STDIO_RING_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Starts, health-checks, and stops the external note-server subprocess.
/// Owns the port and the subprocess handle exclusively — no other component
/// may bind the port while this supervisor holds it.
pub struct NoteServerSupervisor {
    executable_name: String,
    port: u16,
    notes_dir: PathBuf,
    state: Mutex<SupervisorState>,
    child: Mutex<Option<Child>>,
    stdio_log: Arc<Mutex<VecDeque<String>>>,
    http: reqwest::Client,
}

impl NoteServerSupervisor {
    pub fn new(port: u16, notes_dir: impl Into<PathBuf>) -> Self {
        Self::with_executable_name("note-server", port, notes_dir)
    }

    pub fn with_executable_name(executable_name: &str, port: u16, notes_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable_name: executable_name.to_string(),
            port,
            notes_dir: notes_dir.into(),
            state: Mutex::new(SupervisorState::Stopped),
            child: Mutex::new(None),
            stdio_log: Arc::new(Mutex::new(VecDeque::with_capacity(STDIO_RING_CAPACITY))),
            http: reqwest::Client::new(),
        }
    }

    pub async fn state(&self) -> SupervisorState {
        *self.state.lock().await
    }

    pub async fn is_running(&self) -> bool {
        matches!(*self.state.lock().await, SupervisorState::Running)
    }

    /// Recent captured stdout/stderr lines, oldest first. Diagnostic only.
    pub async fn recent_output(&self) -> Vec<String> {
        self.stdio_log.lock().await.iter().cloned().collect()
    }

    /// Bring the note server to `Running`. If a foreign process is already
    /// serving the port, adopt it (`Starting` -> `Running` without spawning).
    /// If the port is bound but unresponsive, fail fast with `PortInUse`
    /// rather than fight over the port.
    pub async fn start(&self) -> Result<bool, SupervisorError> {
        {
            let mut state = self.state.lock().await;
            if *state == SupervisorState::Running {
                return Ok(true);
            }
            *state = SupervisorState::Starting;
        }

        match self.probe_port().await {
            PortProbe::Serving => {
                *self.state.lock().await = SupervisorState::Running;
                tracing::info!(port = self.port, "note-server already serving; adopting");
                return Ok(true);
            }
            PortProbe::BoundUnresponsive => {
                *self.state.lock().await = SupervisorState::Stopped;
                return Err(SupervisorError::PortInUse(self.port));
            }
            PortProbe::NotBound => {}
        }

        let executable = match locate_on_path(&self.executable_name) {
            Some(path) => path,
            None => {
                *self.state.lock().await = SupervisorState::Stopped;
                return Err(SupervisorError::ExecutableNotFound);
            }
        };

        tokio::fs::create_dir_all(&self.notes_dir).await?;

        let mut command = Command::new(&executable);
        command
            .arg("web")
            .arg(format!("--port={}", self.port))
            .arg("--writable")
            .env("NOTES_DIR", &self.notes_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn()?;
        self.capture_stdio(&mut child);

        match self.wait_for_health(&mut child).await {
            Ok(()) => {
                *self.child.lock().await = Some(child);
                *self.state.lock().await = SupervisorState::Running;
                tracing::info!(port = self.port, "note-server healthy");
                Ok(true)
            }
            Err(e) => {
                let _ = child.start_kill();
                *self.state.lock().await = SupervisorState::Stopped;
                tracing::warn!(error = %e, recent_output = ?self.recent_output().await, "note-server failed to become healthy");
                Err(e)
            }
        }
    }

    /// Send a graceful terminate signal; force-kill if still alive after the
    /// grace period. A no-op if nothing is running.
    pub async fn stop(&self) {
        *self.state.lock().await = SupervisorState::Stopping;

        let mut guard = self.child.lock().await;
        if let Some(mut child) = guard.take() {
            if let Some(pid) = child.id() {
                let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            }

            let waited = timeout(STOP_GRACE, child.wait()).await;
            if waited.is_err() {
                tracing::warn!("note-server did not exit within grace period; force-killing");
                let _ = child.start_kill();
                let _ = child.wait().await;
            }
        }

        *self.state.lock().await = SupervisorState::Stopped;
    }

    fn capture_stdio(&self, child: &mut Child) {
        if let Some(stdout) = child.stdout.take() {
            self.spawn_line_reader(stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            self.spawn_line_reader(stderr);
        }
    }

    fn spawn_line_reader<R>(&self, reader: R)
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
    {
        // Note: the ring buffer is process-local and best-effort; a crash
        // loses whatever wasn't already logged via `tracing::warn!` above.
        let log = Arc::clone(&self.stdio_log);
        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let mut buf = log.lock().await;
                if buf.len() >= STDIO_RING_CAPACITY {
                    buf.pop_front();
                }
                buf.push_back(line);
            }
        });
    }

    async fn wait_for_health(&self, child: &mut Child) -> Result<(), SupervisorError> {
        let mut backoff = INITIAL_BACKOFF;
        for attempt in 1..=HEALTH_CHECK_ATTEMPTS {
            if let Some(status) = child.try_wait()? {
                return Err(SupervisorError::ExitedEarly(status.code()));
            }

            if matches!(self.probe_port().await, PortProbe::Serving) {
                return Ok(());
            }

            if attempt == HEALTH_CHECK_ATTEMPTS {
                break;
            }
            tokio::time::sleep(backoff).await;
            backoff = std::cmp::min(backoff * 2, MAX_BACKOFF);
        }
        Err(SupervisorError::HealthCheckTimeout(HEALTH_CHECK_ATTEMPTS))
    }

    async fn probe_port(&self) -> PortProbe {
        let url = format!("http://127.0.0.1:{}/", self.port);
        match timeout(HEALTH_CHECK_TIMEOUT, self.http.get(&url).send()).await {
            Ok(Ok(_response)) => PortProbe::Serving,
            Ok(Err(e)) if e.is_connect() => PortProbe::NotBound,
            Ok(Err(_)) => PortProbe::BoundUnresponsive,
            Err(_elapsed) => PortProbe::BoundUnresponsive,
        }
    }
}

enum PortProbe {
    Serving,
    BoundUnresponsive,
    NotBound,
}

/// Search `PATH` for an executable named `name`. There is no script-based
/// fallback; the note server is always a PATH binary.
fn locate_on_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            Some(candidate)
        } else {
            None
        }
    })
}

#[cfg(unix)]
fn is_executable(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &std::path::Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_on_path_finds_nothing_for_bogus_name() {
        assert!(locate_on_path("definitely-not-a-real-binary-xyz").is_none());
    }

    #[test]
    fn locate_on_path_finds_a_known_coreutil() {
        // `ls` is present on every CI and dev box this runs on.
        assert!(locate_on_path("ls").is_some());
    }

    #[tokio::test]
    async fn start_fails_fast_when_executable_missing() {
        let supervisor = NoteServerSupervisor::with_executable_name(
            "definitely-not-a-real-note-server-binary",
            58_234,
            std::env::temp_dir().join("qbank-notes-test"),
        );
        let err = supervisor.start().await.unwrap_err();
        assert!(matches!(err, SupervisorError::ExecutableNotFound));
        assert_eq!(supervisor.state().await, SupervisorState::Stopped);
    }

    #[tokio::test]
    async fn stop_on_never_started_supervisor_is_a_no_op() {
        let supervisor = NoteServerSupervisor::new(58_235, std::env::temp_dir().join("qbank-notes-test2"));
        supervisor.stop().await;
        assert_eq!(supervisor.state().await, SupervisorState::Stopped);
    }
}
