//! Data producer invocation.
//!
//! The producer is an external program (by default `python3 getdat.py`)
//! that writes the sensor dump to the data file. It is spawned with its
//! stdout and stderr captured and logged line by line as they arrive. A
//! watchdog kills it once the configured timeout expires.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinSet;
use tracing::{info, warn};

use troutwatch_core::config::ProducerConfig;
use troutwatch_core::reading::{Reading, parse_readings};

/// How long the pipes are still read after the watchdog kills the producer.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Errors from one producer run.
#[derive(Debug, thiserror::Error)]
pub enum ProducerError {
    /// The program could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that was launched.
        program: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Waiting on the child failed.
    #[error("failed to wait for producer: {source}")]
    Wait {
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The program exited unsuccessfully.
    #[error("producer exited with {}", exit_label(*code))]
    Exit {
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The watchdog killed the program.
    #[error("producer timed out after {after_ms} ms")]
    Timeout {
        /// Timeout that expired.
        after_ms: u64,
        /// Standard output captured before the kill.
        stdout: String,
        /// Standard error captured before the kill.
        stderr: String,
    },

    /// The program succeeded but its data file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    DataFile {
        /// Data file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
        /// Captured standard error of the run.
        stderr: String,
    },
}

fn exit_label(code: Option<i32>) -> String {
    code.map_or_else(|| "no exit code (killed)".to_owned(), |c| format!("code {c}"))
}

impl ProducerError {
    /// Captured standard output, when the failure carries it.
    pub fn stdout(&self) -> Option<&str> {
        match self {
            Self::Exit { stdout, .. } | Self::Timeout { stdout, .. } => Some(stdout),
            _ => None,
        }
    }

    /// Captured standard error, when the failure carries it.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Exit { stderr, .. }
            | Self::Timeout { stderr, .. }
            | Self::DataFile { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// Captured output of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProducerOutput {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

/// A successful run plus the data it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected {
    /// Captured process output.
    pub output: ProducerOutput,
    /// Data file contents.
    pub raw: String,
    /// Readings parsed from `raw`.
    pub readings: Vec<Reading>,
}

/// Run the producer once and wait for it, killing it on timeout.
pub async fn run(config: &ProducerConfig) -> Result<ProducerOutput, ProducerError> {
    let mut child = Command::new(&config.program)
        .args(&config.args)
        .current_dir(&config.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ProducerError::Spawn {
            program: config.program.clone(),
            source,
        })?;

    info!(program = %config.program, args = ?config.args, pid = child.id(), "producer started");

    let stdout = Captured::default();
    let stderr = Captured::default();
    let mut readers = JoinSet::new();
    readers.spawn(collect_lines(child.stdout.take(), Pipe::Stdout, stdout.clone()));
    readers.spawn(collect_lines(child.stderr.take(), Pipe::Stderr, stderr.clone()));
    let timeout = Duration::from_millis(config.timeout_ms);

    let finished = tokio::time::timeout(timeout, async {
        let status = child.wait().await;
        while readers.join_next().await.is_some() {}
        status
    })
    .await;

    let Ok(status) = finished else {
        if let Err(e) = child.start_kill() {
            warn!(error = %e, "failed to kill timed-out producer");
        }
        warn!(timeout_ms = config.timeout_ms, "producer killed by watchdog");
        // Descendants may keep the pipes open after the kill.
        let drained = tokio::time::timeout(DRAIN_GRACE, async {
            while readers.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            readers.abort_all();
        }
        return Err(ProducerError::Timeout {
            after_ms: config.timeout_ms,
            stdout: stdout.take(),
            stderr: stderr.take(),
        });
    };

    let status = status.map_err(|source| ProducerError::Wait { source })?;
    if !status.success() {
        warn!(code = ?status.code(), "producer failed");
        return Err(ProducerError::Exit {
            code: status.code(),
            stdout: stdout.take(),
            stderr: stderr.take(),
        });
    }

    info!("producer finished");
    Ok(ProducerOutput {
        stdout: stdout.take(),
        stderr: stderr.take(),
    })
}

/// Run the producer, then read and parse the data file it wrote.
pub async fn collect(config: &ProducerConfig, data_file: &Path) -> Result<Collected, ProducerError> {
    let output = run(config).await?;
    let bytes = tokio::fs::read(data_file)
        .await
        .map_err(|source| ProducerError::DataFile {
            path: data_file.to_path_buf(),
            source,
            stderr: output.stderr.clone(),
        })?;
    let raw = String::from_utf8_lossy(&bytes).into_owned();
    let readings = parse_readings(&raw);
    Ok(Collected {
        output,
        raw,
        readings,
    })
}

#[derive(Debug, Clone, Copy)]
enum Pipe {
    Stdout,
    Stderr,
}

/// Output buffer shared between a pipe reader and [`run`].
#[derive(Debug, Clone, Default)]
struct Captured(Arc<Mutex<String>>);

impl Captured {
    fn push_line(&self, line: &str) {
        let mut buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        buf.push_str(line);
        buf.push('\n');
    }

    fn take(&self) -> String {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

async fn collect_lines<R>(pipe: Option<R>, which: Pipe, sink: Captured)
where
    R: AsyncRead + Unpin,
{
    let Some(pipe) = pipe else {
        return;
    };

    let mut lines = BufReader::new(pipe).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                match which {
                    Pipe::Stdout => info!(line = %line, "producer stdout"),
                    Pipe::Stderr => warn!(line = %line, "producer stderr"),
                }
                sink.push_line(&line);
            }
            Ok(None) => break,
            Err(e) => {
                warn!(pipe = ?which, error = %e, "producer output unreadable");
                break;
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str, timeout_ms: u64) -> ProducerConfig {
        ProducerConfig {
            program: "sh".to_owned(),
            args: vec!["-c".to_owned(), script.to_owned()],
            working_dir: PathBuf::from("."),
            timeout_ms,
        }
    }

    #[tokio::test]
    async fn captures_output() {
        let result = run(&shell("echo out; echo err >&2", 5_000)).await;
        let output = result.ok().unwrap_or_default();
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[tokio::test]
    async fn nonzero_exit_is_error() {
        let result = run(&shell("echo boom >&2; exit 3", 5_000)).await;
        assert!(matches!(&result, Err(ProducerError::Exit { code: Some(3), .. })));
        let err = result.err();
        assert_eq!(err.as_ref().and_then(ProducerError::stderr), Some("boom\n"));
        assert_eq!(err.as_ref().and_then(ProducerError::stdout), Some(""));
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let config = ProducerConfig {
            program: "/nonexistent/troutwatch-producer".to_owned(),
            args: Vec::new(),
            working_dir: PathBuf::from("."),
            timeout_ms: 1_000,
        };
        assert!(matches!(run(&config).await, Err(ProducerError::Spawn { .. })));
    }

    #[tokio::test]
    async fn slow_program_times_out() {
        let started = std::time::Instant::now();
        let result = run(&shell("sleep 10", 200)).await;
        assert!(matches!(result, Err(ProducerError::Timeout { after_ms: 200, .. })));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn timeout_keeps_captured_output() {
        let started = std::time::Instant::now();
        let result = run(&shell("echo started; echo warming >&2; sleep 10", 500)).await;
        assert!(matches!(&result, Err(ProducerError::Timeout { after_ms: 500, .. })));
        let err = result.err();
        assert_eq!(err.as_ref().and_then(ProducerError::stdout), Some("started\n"));
        assert_eq!(err.as_ref().and_then(ProducerError::stderr), Some("warming\n"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn collect_reads_data_file() {
        let dir = tempfile::tempdir().ok();
        let Some(dir) = dir else { return };
        let data = dir.path().join("data.txt");
        let script = format!("printf 'Temp air = 9 C\\n' > '{}'", data.display());

        let collected = collect(&shell(&script, 5_000), &data).await;
        let collected = collected.ok();
        assert_eq!(collected.as_ref().map(|c| c.readings.len()), Some(1));
        assert_eq!(collected.map(|c| c.raw), Some("Temp air = 9 C\n".to_owned()));
    }

    #[tokio::test]
    async fn collect_without_data_file_is_error() {
        let dir = tempfile::tempdir().ok();
        let Some(dir) = dir else { return };
        let data = dir.path().join("missing.txt");
        let result = collect(&shell("true", 5_000), &data).await;
        assert!(matches!(result, Err(ProducerError::DataFile { .. })));
    }
}
