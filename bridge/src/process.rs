//! Subprocess command bridge
//!
//! Every invocation spawns one abstract-cli process. Standard output is fed
//! through [`JsonStreamDecoder`] while standard error is collected into a
//! buffer; the exit status decides the outcome once both pipes are closed:
//!
//! | condition                       | outcome                         |
//! |---------------------------------|---------------------------------|
//! | exit 0, at least one value      | first value                     |
//! | exit 0, no value                | [`EmptyOutputPolicy`]           |
//! | exit != 0                       | `Process` error with stderr     |
//! | malformed stdout before a value | `Decode` error, process killed  |
//! | spawn failure                   | `Spawn` error                   |
//!
//! Credential and endpoint flags always precede the operation arguments, so a
//! first-occurrence-wins flag parser never lets trailing arguments replace
//! them.

use async_trait::async_trait;
use crate::config::{BridgeConfig, EmptyOutputPolicy};
use crate::decoder::JsonStreamDecoder;
use crate::error::{BridgeError, BridgeResult};
use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

const READ_CHUNK: usize = 8 * 1024;
const TOKEN_FLAG: &str = "--user-token=";
const API_URL_FLAG: &str = "--api-url=";

/// Cloneable handle used to abandon in-flight invocations.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    state: Arc<watch::Sender<bool>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Completes once [`cancel`](Self::cancel) has been called on any clone.
    pub async fn cancelled(&self) {
        let mut receiver = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

/// Per-call overrides for deadline and cancellation.
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl InvokeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Runs one abstract-cli command and yields its JSON response.
#[async_trait]
pub trait Invoke: Send + Sync {
    async fn invoke(&self, args: Vec<String>, options: &InvokeOptions) -> BridgeResult<Value>;
}

#[async_trait]
impl<T: Invoke + ?Sized> Invoke for Arc<T> {
    async fn invoke(&self, args: Vec<String>, options: &InvokeOptions) -> BridgeResult<Value> {
        (**self).invoke(args, options).await
    }
}

#[derive(Debug, Clone)]
pub struct CommandBridge {
    executable: PathBuf,
    config: BridgeConfig,
}

impl CommandBridge {
    /// Validates the configuration and locates the executable on its search path.
    pub fn new(config: BridgeConfig) -> BridgeResult<Self> {
        config
            .validate()
            .map_err(|message| BridgeError::InvalidConfig { message })?;
        let executable = config.locate_executable()?;
        debug!(executable = %executable.display(), "located abstract-cli");
        Ok(Self { executable, config })
    }

    /// Uses `executable` directly instead of searching for it.
    pub fn with_executable(
        config: BridgeConfig,
        executable: impl Into<PathBuf>,
    ) -> BridgeResult<Self> {
        config
            .validate()
            .map_err(|message| BridgeError::InvalidConfig { message })?;
        Ok(Self {
            executable: executable.into(),
            config,
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Full argument vector: fixed credential and endpoint flags, then `args`.
    pub fn compose_args(&self, args: &[String]) -> Vec<String> {
        let mut argv = Vec::with_capacity(args.len() + 2);
        argv.push(format!("{}{}", TOKEN_FLAG, self.config.user_token));
        argv.push(format!("{}{}", API_URL_FLAG, self.config.api_url));
        argv.extend(args.iter().cloned());
        argv
    }
}

fn redact(argv: &[String]) -> Vec<String> {
    argv.iter()
        .map(|arg| {
            if arg.starts_with(TOKEN_FLAG) {
                format!("{}<redacted>", TOKEN_FLAG)
            } else {
                arg.clone()
            }
        })
        .collect()
}

#[async_trait]
impl Invoke for CommandBridge {
    async fn invoke(&self, args: Vec<String>, options: &InvokeOptions) -> BridgeResult<Value> {
        let argv = self.compose_args(&args);
        debug!(
            program = %self.executable.display(),
            args = ?redact(&argv),
            "spawning abstract-cli"
        );

        let mut child = Command::new(&self.executable)
            .args(&argv)
            .current_dir(&self.config.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BridgeError::Spawn {
                program: self.executable.display().to_string(),
                source,
            })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(BridgeError::Stream(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "child pipes were not captured",
            )));
        };

        let arbiter = Arbiter {
            policy: self.config.empty_output,
            timeout: options.timeout.or(self.config.timeout),
            cancel: options.cancel.as_ref(),
        };
        let outcome = {
            let exit = async { child.wait().await.map(|status| status.code()) };
            arbiter.run(stdout, stderr, exit).await
        };

        // Reap the process on every path; it is still running if the call
        // settled early (decode failure, timeout, cancellation).
        if matches!(child.try_wait(), Ok(None)) {
            debug!("terminating abstract-cli after early settlement");
            if let Err(err) = child.start_kill() {
                warn!("failed to kill abstract-cli: {}", err);
            }
        }
        if let Err(err) = child.wait().await {
            warn!("failed to reap abstract-cli: {}", err);
        }

        let command = args.first().map(String::as_str);
        match &outcome {
            Ok(_) => info!(command, "abstract-cli completed"),
            Err(err) => debug!(command, "abstract-cli failed: {}", err),
        }
        outcome
    }
}

/// One-time transition from pending to a final outcome.
#[derive(Debug)]
enum Settlement {
    Pending,
    Settled(BridgeResult<Value>),
}

impl Settlement {
    fn settle(&mut self, outcome: BridgeResult<Value>) {
        match self {
            Settlement::Pending => *self = Settlement::Settled(outcome),
            Settlement::Settled(_) => match outcome {
                Ok(_) => warn!("ignoring value produced after settlement"),
                Err(err) => warn!("ignoring failure after settlement: {}", err),
            },
        }
    }

    fn is_settled(&self) -> bool {
        matches!(self, Settlement::Settled(_))
    }
}

/// Drives the output streams and exit status of a single invocation.
pub(crate) struct Arbiter<'a> {
    pub(crate) policy: EmptyOutputPolicy,
    pub(crate) timeout: Option<Duration>,
    pub(crate) cancel: Option<&'a CancellationToken>,
}

impl Arbiter<'_> {
    pub(crate) async fn run<O, E, X>(
        self,
        mut stdout: O,
        mut stderr: E,
        exit: X,
    ) -> BridgeResult<Value>
    where
        O: AsyncRead + Unpin,
        E: AsyncRead + Unpin,
        X: Future<Output = std::io::Result<Option<i32>>>,
    {
        let mut decoder = JsonStreamDecoder::new();
        let mut first: Option<Value> = None;
        let mut decoding = true;
        let mut stderr_buffer: Vec<u8> = Vec::new();
        let mut settlement = Settlement::Pending;

        let mut stdout_chunk = vec![0u8; READ_CHUNK];
        let mut stderr_chunk = vec![0u8; READ_CHUNK];
        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut exited = false;

        let timeout = self.timeout;
        let deadline = async {
            match timeout {
                // `sleep` saturates deadlines too far out to represent.
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };
        let cancel = self.cancel;
        let cancelled = async {
            match cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(exit, deadline, cancelled);

        while !settlement.is_settled() {
            tokio::select! {
                read = stdout.read(&mut stdout_chunk), if stdout_open => {
                    let decoded = match read {
                        Ok(0) => {
                            stdout_open = false;
                            if decoding { Some(decoder.finish()) } else { None }
                        }
                        Ok(n) => {
                            trace!(bytes = n, "stdout chunk");
                            if decoding { Some(decoder.feed(&stdout_chunk[..n])) } else { None }
                        }
                        Err(err) => {
                            stdout_open = false;
                            if first.is_none() {
                                settlement.settle(Err(BridgeError::Stream(err)));
                            } else {
                                warn!("stdout failed after a value was decoded: {}", err);
                            }
                            None
                        }
                    };
                    match decoded {
                        Some(Ok(values)) => {
                            for value in values {
                                if first.is_none() {
                                    debug!("decoded response value");
                                    first = Some(value);
                                } else {
                                    trace!("ignoring extra output value");
                                }
                            }
                        }
                        Some(Err(err)) => {
                            decoding = false;
                            if first.is_none() {
                                settlement.settle(Err(BridgeError::Decode(err)));
                            } else {
                                warn!("ignoring malformed output after first value: {}", err);
                            }
                        }
                        None => {}
                    }
                }
                read = stderr.read(&mut stderr_chunk), if stderr_open => match read {
                    Ok(0) => stderr_open = false,
                    Ok(n) => stderr_buffer.extend_from_slice(&stderr_chunk[..n]),
                    Err(err) => {
                        warn!("stderr failed: {}", err);
                        stderr_open = false;
                    }
                },
                status = &mut exit, if !stdout_open && !stderr_open && !exited => {
                    exited = true;
                    match status {
                        Ok(Some(0)) => match first.take() {
                            Some(value) => settlement.settle(Ok(value)),
                            None => match self.policy {
                                EmptyOutputPolicy::Fail => {
                                    settlement.settle(Err(BridgeError::EmptyOutput))
                                }
                                EmptyOutputPolicy::Null => settlement.settle(Ok(Value::Null)),
                                EmptyOutputPolicy::Wait => {
                                    warn!(
                                        "abstract-cli exited without output; \
                                         waiting for deadline or cancellation"
                                    );
                                }
                            },
                        },
                        Ok(code) => {
                            debug!(
                                ?code,
                                stderr = %String::from_utf8_lossy(&stderr_buffer),
                                "abstract-cli exited with failure"
                            );
                            settlement.settle(Err(BridgeError::Process {
                                code,
                                stderr: std::mem::take(&mut stderr_buffer),
                            }));
                        }
                        Err(err) => settlement.settle(Err(BridgeError::Stream(err))),
                    }
                }
                _ = &mut deadline => {
                    let after = timeout.unwrap_or_default();
                    settlement.settle(Err(BridgeError::Timeout { after }));
                }
                _ = &mut cancelled => {
                    settlement.settle(Err(BridgeError::Cancelled));
                }
            }
        }

        match settlement {
            Settlement::Settled(outcome) => outcome,
            Settlement::Pending => unreachable!("loop exits only once settled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    fn arbiter() -> Arbiter<'static> {
        Arbiter {
            policy: EmptyOutputPolicy::Fail,
            timeout: None,
            cancel: None,
        }
    }

    fn exit_with(code: i32) -> impl Future<Output = std::io::Result<Option<i32>>> {
        async move { Ok(Some(code)) }
    }

    fn bridge() -> CommandBridge {
        CommandBridge::with_executable(
            BridgeConfig::new("secret").with_api_url("https://example.test"),
            "/bin/abstract-cli",
        )
        .unwrap()
    }

    #[test]
    fn test_fixed_flags_come_first() {
        let args = vec![
            "commits".to_string(),
            "P".to_string(),
            "B".to_string(),
            "--user-token=override".to_string(),
            "--api-url=https://evil.test".to_string(),
        ];
        let argv = bridge().compose_args(&args);

        assert_eq!(argv[0], "--user-token=secret");
        assert_eq!(argv[1], "--api-url=https://example.test");
        assert_eq!(&argv[2..], &args[..]);
        let first_token = argv.iter().find(|arg| arg.starts_with(TOKEN_FLAG)).unwrap();
        assert_eq!(first_token, "--user-token=secret");
    }

    #[test]
    fn test_redact_hides_token() {
        let argv = bridge().compose_args(&["files".to_string()]);
        let redacted = redact(&argv);
        assert_eq!(redacted[0], "--user-token=<redacted>");
        assert_eq!(redacted[2], "files");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = CommandBridge::with_executable(BridgeConfig::default(), "/bin/abstract-cli");
        assert!(matches!(result, Err(BridgeError::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn test_first_value_on_success() {
        let stdout = Builder::new()
            .read(br#"{"commits":[{"sha":"abc"}]}"#)
            .build();
        let stderr = Builder::new().build();

        let value = arbiter().run(stdout, stderr, exit_with(0)).await.unwrap();
        assert_eq!(value, serde_json::json!({"commits": [{"sha": "abc"}]}));
    }

    #[tokio::test]
    async fn test_chunk_boundaries_do_not_matter() {
        let document: &[u8] = br#"{"commits":[{"sha":"abc"}]}"#;
        let unsplit = arbiter()
            .run(
                Builder::new().read(document).build(),
                Builder::new().build(),
                exit_with(0),
            )
            .await
            .unwrap();

        for split in [1, 7, 13, document.len() - 1] {
            let stdout = Builder::new()
                .read(&document[..split])
                .read(&document[split..])
                .build();
            let split_value = arbiter()
                .run(stdout, Builder::new().build(), exit_with(0))
                .await
                .unwrap();
            assert_eq!(split_value, unsplit, "split at {}", split);
        }
    }

    #[tokio::test]
    async fn test_extra_values_ignored() {
        let stdout = Builder::new().read(b"{\"a\":1}\n{\"b\":2}\n").build();
        let value = arbiter()
            .run(stdout, Builder::new().build(), exit_with(0))
            .await
            .unwrap();
        assert_eq!(value, serde_json::json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_nonzero_exit_after_value_fails_with_stderr() {
        let stdout = Builder::new().read(br#"{"commits":[]}"#).build();
        let stderr = Builder::new().read(b"Error: ").read(b"unauthorized\n").build();

        let err = arbiter().run(stdout, stderr, exit_with(3)).await.unwrap_err();
        match err {
            BridgeError::Process { code, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, b"Error: unauthorized\n".to_vec());
            }
            other => panic!("expected Process error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_decode_error_before_value() {
        let stdout = Builder::new().read(b"{\"commits\" oops").build();
        let err = arbiter()
            .run(stdout, Builder::new().build(), exit_with(0))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Decode(_)));
    }

    #[tokio::test]
    async fn test_decode_error_after_value_is_ignored() {
        let stdout = Builder::new().read(b"{\"ok\":true}\n}garbage").build();
        let value = arbiter()
            .run(stdout, Builder::new().build(), exit_with(0))
            .await
            .unwrap();
        assert_eq!(value, serde_json::json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_truncated_output_is_decode_error() {
        let stdout = Builder::new().read(b"{\"commits\":[").build();
        let err = arbiter()
            .run(stdout, Builder::new().build(), exit_with(0))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Decode(_)));
    }

    #[tokio::test]
    async fn test_empty_output_policies() {
        let err = arbiter()
            .run(Builder::new().build(), Builder::new().build(), exit_with(0))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::EmptyOutput));

        let null = Arbiter {
            policy: EmptyOutputPolicy::Null,
            ..arbiter()
        };
        let value = null
            .run(Builder::new().build(), Builder::new().build(), exit_with(0))
            .await
            .unwrap();
        assert_eq!(value, Value::Null);

        let wait = Arbiter {
            policy: EmptyOutputPolicy::Wait,
            timeout: Some(Duration::from_millis(50)),
            cancel: None,
        };
        let err = wait
            .run(Builder::new().build(), Builder::new().build(), exit_with(0))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_deadline_while_output_pending() {
        let stdout = Builder::new().wait(Duration::from_secs(5)).build();
        let arbiter = Arbiter {
            timeout: Some(Duration::from_millis(20)),
            ..arbiter()
        };
        let err = arbiter
            .run(stdout, Builder::new().build(), exit_with(0))
            .await
            .unwrap_err();
        match err {
            BridgeError::Timeout { after } => assert_eq!(after, Duration::from_millis(20)),
            other => panic!("expected Timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_far_future_timeout_does_not_overflow() {
        let config = BridgeConfig::new("token").with_timeout(Duration::MAX);
        assert!(config.validate().is_ok());

        let arbiter = Arbiter {
            timeout: config.timeout,
            ..arbiter()
        };
        let stdout = Builder::new().read(br#"{"files":[]}"#).build();
        let value = arbiter
            .run(stdout, Builder::new().build(), exit_with(0))
            .await
            .unwrap();
        assert_eq!(value, serde_json::json!({"files": []}));
    }

    #[tokio::test]
    async fn test_cancellation() {
        let token = CancellationToken::new();
        let stdout = Builder::new().wait(Duration::from_secs(5)).build();
        let arbiter = Arbiter {
            policy: EmptyOutputPolicy::Fail,
            timeout: None,
            cancel: Some(&token),
        };

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = arbiter
            .run(stdout, Builder::new().build(), exit_with(0))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Cancelled));
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_settle_once() {
        let mut settlement = Settlement::Pending;
        settlement.settle(Ok(serde_json::json!(1)));
        settlement.settle(Err(BridgeError::EmptyOutput));
        settlement.settle(Ok(serde_json::json!(2)));

        match settlement {
            Settlement::Settled(Ok(value)) => assert_eq!(value, serde_json::json!(1)),
            other => panic!("expected first outcome to stick, got {:?}", other),
        }
    }
}
