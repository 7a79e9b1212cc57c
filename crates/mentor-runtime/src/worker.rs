//! Local worker tier.
//!
//! The worker is an external program that receives one request as its last
//! argument and prints one JSON document on stdout:
//!
//! ```text
//! python3 enhanced_ai_agent.py '{"action":"evaluate_answer",...}'
//! ```
//!
//! [`WorkerTransport`] is the seam; [`SubprocessWorker`] is the process-spawn
//! implementation used in production.

use async_trait::async_trait;
use mentor_core::Request;
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::config::WorkerConfig;
use crate::providers::ProviderError;

/// Longest stderr excerpt kept in errors and logs.
const MAX_STDERR: usize = 1024;

/// Something that can answer a request with raw JSON.
#[async_trait]
pub trait WorkerTransport: Send + Sync {
    /// Run one request. The returned JSON is not yet checked against the
    /// action's shape.
    async fn invoke(&self, request: &Request) -> Result<JsonValue, ProviderError>;

    /// Extra time past the tier budget the transport may need to clean up
    /// after its own deadline fires.
    fn reap_grace(&self) -> Duration {
        Duration::ZERO
    }

    /// Name for logs.
    fn name(&self) -> &str {
        "worker"
    }
}

/// Spawns one child process per request.
#[derive(Debug, Clone)]
pub struct SubprocessWorker {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    timeout: Duration,
    kill_grace: Duration,
}

impl SubprocessWorker {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            timeout: Duration::from_secs(30),
            kill_grace: Duration::from_secs(2),
        }
    }

    /// Worker described by `config`, with `timeout` as its deadline.
    pub fn from_config(config: &WorkerConfig, timeout: Duration) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            working_dir: config.working_dir.clone(),
            timeout,
            kill_grace: config.kill_grace,
        }
    }

    /// Arguments placed before the request JSON.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, payload: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(payload)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        cmd
    }
}

#[async_trait]
impl WorkerTransport for SubprocessWorker {
    async fn invoke(&self, request: &Request) -> Result<JsonValue, ProviderError> {
        let payload = request
            .to_wire_json()
            .map_err(|e| ProviderError::SpawnFailed(format!("failed to encode request: {}", e)))?;

        let start = Instant::now();
        let mut child = self
            .command(&payload)
            .spawn()
            .map_err(|e| ProviderError::SpawnFailed(format!("{}: {}", self.program, e)))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let finished = {
            let run = async {
                let (out, err) = tokio::join!(drain(stdout), drain(stderr));
                let status = child.wait().await;
                (out, err, status)
            };
            tokio::time::timeout(self.timeout, run).await
        };

        let (stdout, stderr, status) = match finished {
            Ok(done) => done,
            Err(_) => {
                if let Err(e) = child.start_kill() {
                    tracing::debug!(error = %e, "Worker already gone at kill");
                }
                match tokio::time::timeout(self.kill_grace, child.wait()).await {
                    Ok(_) => tracing::debug!(program = %self.program, "Timed-out worker reaped"),
                    Err(_) => tracing::warn!(
                        program = %self.program,
                        grace_ms = self.kill_grace.as_millis() as u64,
                        "Timed-out worker not reaped within grace period"
                    ),
                }
                return Err(ProviderError::Timeout(self.timeout));
            }
        };

        let stderr = excerpt(&stderr.unwrap_or_default());
        if !stderr.is_empty() {
            tracing::debug!(program = %self.program, stderr = %stderr, "Worker stderr");
        }

        let status = status.map_err(|e| ProviderError::WorkerExit {
            code: None,
            stderr: format!("failed to wait for worker: {}", e),
        })?;
        let stdout = stdout.map_err(|e| {
            ProviderError::MalformedWorkerOutput(format!("failed to read stdout: {}", e))
        })?;

        tracing::debug!(
            program = %self.program,
            code = ?status.code(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Worker exited"
        );

        check_status(status, &stdout, stderr)?;
        parse_stdout(&stdout)
    }

    fn reap_grace(&self) -> Duration {
        self.kill_grace + Duration::from_millis(250)
    }

    fn name(&self) -> &str {
        &self.program
    }
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Nonzero exit fails the call. Workers often report their error on stdout,
/// so that is used when stderr is empty.
fn check_status(status: ExitStatus, stdout: &[u8], stderr: String) -> Result<(), ProviderError> {
    if status.success() {
        return Ok(());
    }

    let detail = if stderr.is_empty() {
        excerpt(stdout)
    } else {
        stderr
    };

    Err(ProviderError::WorkerExit {
        code: status.code(),
        stderr: detail,
    })
}

fn parse_stdout(stdout: &[u8]) -> Result<JsonValue, ProviderError> {
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();
    if text.is_empty() {
        return Err(ProviderError::MalformedWorkerOutput("empty stdout".to_string()));
    }

    serde_json::from_str(text).map_err(|e| ProviderError::MalformedWorkerOutput(e.to_string()))
}

fn excerpt(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.len() <= MAX_STDERR {
        return text.to_string();
    }

    let mut end = MAX_STDERR;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use mentor_core::request::{EvaluateAnswer, GenerateQuestion};
    use mentor_core::ErrorKind;

    /// Worker running `script` under `sh -c`; the request JSON arrives as `$1`.
    fn sh(script: &str) -> SubprocessWorker {
        SubprocessWorker::new("sh")
            .args(["-c", script, "mentor-worker"])
            .timeout(Duration::from_secs(5))
            .kill_grace(Duration::from_secs(1))
    }

    fn request() -> Request {
        Request::EvaluateAnswer(EvaluateAnswer::new("What is 2+2?", "4").with_correct_answer("4"))
    }

    #[tokio::test]
    async fn test_stdout_json_is_returned() {
        let value = sh(r#"printf '%s' '{"score": 100, "feedback": "ok"}'"#)
            .invoke(&request())
            .await
            .unwrap();
        assert_eq!(value["score"], 100);
    }

    #[tokio::test]
    async fn test_request_is_last_argument() {
        let value = sh(r#"printf '%s' "$1""#).invoke(&request()).await.unwrap();
        assert_eq!(value["action"], "evaluate_answer");
        assert_eq!(value["answer"], "4");
    }

    #[tokio::test]
    async fn test_nonzero_exit() {
        let err = sh(r#"echo '{"error": "model unavailable"}'; exit 1"#)
            .invoke(&Request::GenerateQuestion(GenerateQuestion::default()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ProcessExitError);
        match err {
            ProviderError::WorkerExit { code, stderr } => {
                assert_eq!(code, Some(1));
                assert!(stderr.contains("model unavailable"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stderr_preferred_in_exit_error() {
        let err = sh("echo 'Traceback: boom' >&2; exit 3")
            .invoke(&request())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("status 3"));
        assert!(err.to_string().contains("Traceback: boom"));
    }

    #[tokio::test]
    async fn test_killed_by_signal() {
        let err = sh("kill -9 $$").invoke(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::WorkerExit { code: None, .. }));
    }

    #[tokio::test]
    async fn test_malformed_stdout() {
        for script in ["echo 'not json'", "true"] {
            let err = sh(script).invoke(&request()).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedWorkerOutput, "script: {}", script);
        }
    }

    #[tokio::test]
    async fn test_stderr_noise_does_not_fail_success() {
        let value = sh(r#"echo 'loading model' >&2; echo '{}'"#)
            .invoke(&request())
            .await
            .unwrap();
        assert!(value.as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let err = SubprocessWorker::new("/nonexistent/mentor-worker-binary")
            .invoke(&request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProcessSpawnError);
    }

    #[tokio::test]
    async fn test_slow_worker_times_out_and_is_killed() {
        let worker = sh("sleep 10; echo '{}'").timeout(Duration::from_millis(200));

        let start = Instant::now();
        let err = worker.invoke(&request()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let value = sh(r#"printf '{"dir": "%s"}' "$(pwd -P)""#)
            .working_dir(dir.path())
            .invoke(&request())
            .await
            .unwrap();

        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(value["dir"], &*expected.to_string_lossy());
    }

    #[test]
    fn test_from_config() {
        let config = WorkerConfig::default();
        let worker = SubprocessWorker::from_config(&config, Duration::from_secs(7));
        assert_eq!(worker.program(), "python3");
        assert_eq!(worker.timeout, Duration::from_secs(7));
        assert!(worker.reap_grace() > config.kill_grace);
    }

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let long = "é".repeat(MAX_STDERR);
        let cut = excerpt(long.as_bytes());
        assert!(cut.ends_with("..."));
        assert!(cut.len() <= MAX_STDERR + 3);
    }
}
