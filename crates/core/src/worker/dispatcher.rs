//! Writes commands to the worker's input stream.

use crate::worker::codec::EventProtocolCodec;
use crate::worker::error::DispatchError;
use dk_protocol::{Command, CommandName};
use serde_json::{Map, Value};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Serializes commands onto a worker input stream.
///
/// Delivery is at-most-once. There is no retry and no reply: whatever the
/// worker does in response shows up later as events.
pub struct CommandDispatcher<W> {
    writer: W,
}

impl<W> CommandDispatcher<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Encode `command` and write it as one line, then flush.
    ///
    /// # Errors
    ///
    /// `DispatchError::Write` if the stream is closed or the write fails.
    pub async fn dispatch(&mut self, command: &Command) -> Result<(), DispatchError> {
        let bytes = EventProtocolCodec::encode(command)?;

        self.writer
            .write_all(&bytes)
            .await
            .map_err(|e| DispatchError::Write(e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| DispatchError::Write(e.to_string()))?;

        trace!(cmd = %command.cmd, "command written");
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Dispatch to an optional worker input stream.
///
/// With no worker this reports `DispatchError::NoWorker` and writes nothing.
pub async fn dispatch<W>(
    worker: Option<&mut CommandDispatcher<W>>,
    name: CommandName,
    args: Map<String, Value>,
) -> Result<(), DispatchError>
where
    W: AsyncWrite + Unpin + Send,
{
    match worker {
        Some(dispatcher) => dispatcher.dispatch(&Command::new(name, args)).await,
        None => Err(DispatchError::NoWorker),
    }
}
