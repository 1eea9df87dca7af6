use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Cannot find abstract-cli in \"{searched}\"")]
    ExecutableNotFound { searched: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot resolve latest revision for {descriptor}: {reason}")]
    Resolution { descriptor: String, reason: String },

    #[error("abstract-cli exited with {}: {}", display_code(.code), String::from_utf8_lossy(.stderr))]
    Process { code: Option<i32>, stderr: Vec<u8> },

    #[error("Malformed output: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Output stream failed: {0}")]
    Stream(#[from] std::io::Error),

    #[error("Response is missing the '{field}' field")]
    MissingField { field: &'static str },

    #[error("abstract-cli exited successfully without producing any output")]
    EmptyOutput,

    #[error("abstract-cli did not finish within {}ms", .after.as_millis())]
    Timeout { after: Duration },

    #[error("Invocation cancelled")]
    Cancelled,
}

impl BridgeError {
    /// Raw standard error captured from a failed process, if this is a process failure.
    pub fn stderr(&self) -> Option<&[u8]> {
        match self {
            BridgeError::Process { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
