//! Line-delimited JSON request loop
//!
//! Each input line is one request:
//!
//! ```json
//! {"id": 1, "op": "encrypt", "text": "hello", "method": "symmetric"}
//! ```
//!
//! Each request gets exactly one response line, written as soon as it
//! completes. Requests run concurrently, so responses may come back out of
//! order; callers match them up by `id`.

use crate::error::{Error, Result};
use crate::service::{EncryptionService, Scheme};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Maximum responses buffered ahead of the writer
const RESPONSE_BUFFER: usize = 64;

/// Maximum requests being processed at once
const MAX_IN_FLIGHT: usize = RESPONSE_BUFFER;

/// Requested operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Encrypt,
    Decrypt,
    PublicKey,
}

/// One request line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Opaque correlation id, echoed back
    #[serde(default)]
    pub id: Option<serde_json::Value>,

    pub op: Operation,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub method: String,
}

/// Response payload, flattened into the response object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Outcome {
    Error { error: String, code: String },
    Encrypted { encrypted: String },
    Decrypted { decrypted: String },
    PublicKey { public_key: String },
}

/// One response line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<serde_json::Value>,

    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Response {
    fn failure(id: Option<serde_json::Value>, code: &str, message: String) -> Self {
        Response {
            id,
            outcome: Outcome::Error {
                error: message,
                code: code.to_string(),
            },
        }
    }

    fn from_error(id: Option<serde_json::Value>, err: &Error) -> Self {
        Self::failure(id, err.code(), err.to_string())
    }

    /// Whether this response reports an error
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error { .. })
    }
}

/// Counters for a finished session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub requests: u64,
    pub failures: u64,
}

/// Handle a single request against the service
pub async fn handle_request(service: &EncryptionService, request: Request) -> Response {
    let Request {
        id,
        op,
        text,
        method,
    } = request;

    let result = match op {
        Operation::Encrypt => service
            .encrypt(&text, &method)
            .await
            .map(|encrypted| Outcome::Encrypted { encrypted }),
        Operation::Decrypt => {
            let text = unquote_envelope(&text, &method);
            service
                .decrypt(&text, &method)
                .await
                .map(|decrypted| Outcome::Decrypted { decrypted })
        }
        Operation::PublicKey => service
            .public_key_pem()
            .map(|public_key| Outcome::PublicKey { public_key }),
    };

    match result {
        Ok(outcome) => Response { id, outcome },
        Err(e) => {
            debug!("{:?} request failed: {}", op, e);
            Response::from_error(id, &e)
        }
    }
}

/// Browser clients send the symmetric envelope JSON-encoded, unwrap that form
fn unquote_envelope(text: &str, method: &str) -> String {
    let is_symmetric = matches!(method.parse::<Scheme>(), Ok(Scheme::Symmetric));
    if is_symmetric && text.trim_start().starts_with('"') {
        if let Ok(inner) = serde_json::from_str::<String>(text) {
            return inner;
        }
    }
    text.to_string()
}

/// Serve requests from `reader` until EOF, writing responses to `writer`
///
/// Stops reading early if the writer fails. In-flight requests always finish
/// before this returns.
pub async fn run<R, W>(service: Arc<EncryptionService>, mut reader: R, mut writer: W) -> Result<SessionStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Response>(RESPONSE_BUFFER);

    let writer_task = tokio::spawn(async move {
        let mut stats = SessionStats::default();
        while let Some(response) = rx.recv().await {
            stats.requests += 1;
            if response.is_error() {
                stats.failures += 1;
            }
            let mut line = serde_json::to_vec(&response)?;
            line.push(b'\n');
            writer.write_all(&line).await?;
            writer.flush().await?;
        }
        Ok::<SessionStats, Error>(stats)
    });

    let permits = Arc::new(Semaphore::new(MAX_IN_FLIGHT));
    let mut tasks = JoinSet::new();
    let mut buf = Vec::new();

    let read_result = loop {
        if tx.is_closed() {
            warn!("Response writer closed, no longer reading requests");
            break Ok(());
        }

        // Reap finished requests so the set only holds in-flight ones
        while let Some(joined) = tasks.try_join_next() {
            log_join_error(joined);
        }

        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break Ok(()),
            Ok(_) => {}
            Err(e) => break Err(e),
        }

        let request: Request = match parse_request(&buf) {
            Some(Ok(request)) => request,
            Some(Err(message)) => {
                warn!("Rejected request line: {}", message);
                let response = Response::failure(None, "invalid_request", message);
                if tx.send(response).await.is_err() {
                    break Ok(());
                }
                continue;
            }
            None => continue,
        };

        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break Ok(());
        };

        let service = Arc::clone(&service);
        let tx = tx.clone();
        tasks.spawn(async move {
            let _permit = permit;
            let response = handle_request(&service, request).await;
            if tx.send(response).await.is_err() {
                debug!("Response dropped, writer closed");
            }
        });
    };

    // Let in-flight requests finish before closing the channel
    while let Some(joined) = tasks.join_next().await {
        log_join_error(joined);
    }
    drop(tx);

    let written = writer_task
        .await
        .map_err(|e| Error::Internal(format!("response writer failed: {}", e)))?;

    read_result?;
    let stats = written?;

    info!(
        "Session finished: {} requests, {} failed",
        stats.requests, stats.failures
    );

    Ok(stats)
}

/// Parse one raw input line; `None` for blank lines
fn parse_request(line: &[u8]) -> Option<std::result::Result<Request, String>> {
    let line = match std::str::from_utf8(line) {
        Ok(line) => line.trim(),
        Err(e) => return Some(Err(format!("request is not valid UTF-8: {}", e))),
    };
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_str(line).map_err(|e| e.to_string()))
}

fn log_join_error(joined: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        warn!("Request task failed: {}", e);
    }
}
