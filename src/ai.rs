use std::error::Error;
use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiRequest {
    pub prompt: String,
    pub attachment: Option<Attachment>,
}

impl AiRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Prompt followed by the attachment, as one text document.
    pub fn render(&self) -> String {
        match &self.attachment {
            Some(attachment) => format!(
                "{}\n\n--- attachment: {} ---\n{}",
                self.prompt, attachment.name, attachment.content
            ),
            None => self.prompt.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiReply {
    pub text: String,
}

impl AiReply {
    /// The reply parsed as JSON, tolerating a surrounding Markdown code fence.
    pub fn json(&self) -> Option<Value> {
        let text = self.text.trim();
        let body = text
            .strip_prefix("```json")
            .or_else(|| text.strip_prefix("```"))
            .and_then(|rest| rest.strip_suffix("```"))
            .unwrap_or(text);
        serde_json::from_str(body.trim()).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiError {
    Timeout(Duration),
    Cancelled,
    Unavailable,
    Backend(String),
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiError::Timeout(limit) => {
                write!(f, "assistant did not answer within {}s", limit.as_secs())
            }
            AiError::Cancelled => write!(f, "request cancelled"),
            AiError::Unavailable => write!(
                f,
                "no assistant configured; set [ai].command in the config file"
            ),
            AiError::Backend(message) => write!(f, "assistant failed: {}", message),
        }
    }
}

impl Error for AiError {}

#[async_trait]
pub trait AiAssistant: Send + Sync {
    async fn submit(&self, request: &AiRequest) -> Result<AiReply, AiError>;
}

/// Callbacks fired around a gateway call: `on_loading(true)`, then exactly one
/// of `on_result` or `on_error`, then `on_loading(false)`.
pub trait AiObserver {
    fn on_loading(&self, _loading: bool) {}
    fn on_result(&self, _reply: &AiReply) {}
    fn on_error(&self, _error: &AiError) {}
}

pub struct SilentObserver;

impl AiObserver for SilentObserver {}

pub struct AiGateway {
    assistant: Option<Box<dyn AiAssistant>>,
    timeout: Duration,
}

impl AiGateway {
    pub fn new(assistant: Box<dyn AiAssistant>, timeout: Duration) -> Self {
        Self {
            assistant: Some(assistant),
            timeout,
        }
    }

    /// A gateway whose every call fails with [`AiError::Unavailable`].
    pub fn unavailable(timeout: Duration) -> Self {
        Self {
            assistant: None,
            timeout,
        }
    }

    pub async fn submit(
        &self,
        request: &AiRequest,
        cancel: &CancellationToken,
        observer: &dyn AiObserver,
    ) -> Result<AiReply, AiError> {
        observer.on_loading(true);
        tracing::info!(
            prompt_len = request.prompt.len(),
            timeout_secs = self.timeout.as_secs(),
            attachment = request.attachment.as_ref().map(|a| a.name.as_str()),
            "submitting assistant request"
        );

        let outcome = match self.assistant.as_deref() {
            None => Err(AiError::Unavailable),
            Some(assistant) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(AiError::Cancelled),
                    result = tokio::time::timeout(self.timeout, assistant.submit(request)) => {
                        result.unwrap_or(Err(AiError::Timeout(self.timeout)))
                    }
                }
            }
        };

        match &outcome {
            Ok(reply) => {
                tracing::debug!(reply_len = reply.text.len(), "assistant replied");
                observer.on_result(reply);
            }
            Err(err) => {
                tracing::warn!(error = %err, "assistant request failed");
                observer.on_error(err);
            }
        }
        observer.on_loading(false);
        outcome
    }
}

/// Runs an external program: the rendered request on stdin, the reply on stdout.
///
/// The child is killed if the call is dropped, which is how timeouts and
/// cancellation reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAssistant {
    program: String,
    args: Vec<String>,
}

impl CommandAssistant {
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl AiAssistant for CommandAssistant {
    async fn submit(&self, request: &AiRequest) -> Result<AiReply, AiError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| AiError::Backend(format!("cannot start '{}': {}", self.program, err)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AiError::Backend("child stdin unavailable".to_string()))?;
        let input = request.render();
        let write = async move {
            stdin.write_all(input.as_bytes()).await?;
            stdin.shutdown().await
        };
        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output.map_err(|err| AiError::Backend(err.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AiError::Backend(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        if let Err(err) = written {
            if err.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(AiError::Backend(err.to_string()));
            }
        }
        Ok(AiReply {
            text: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}
