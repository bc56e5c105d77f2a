use std::io;
use std::mem;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tracing::{debug, info};

use crate::protocol::frame::FileFrame;
use crate::protocol::parser::{ParseError, Parser, Stage};
use crate::storage::{FileSink, StorageError};

/// Reasons a connection stops before the peer closes it.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ParseError),
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Totals for a connection that ended cleanly.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSummary {
    pub files_written: usize,
    pub bytes_written: u64,
}

pub struct Connection<R, S> {
    reader: BufReader<R>,
    sink: S,
    parser: Parser,
    state: ConnectionState,
    summary: ConnectionSummary,
}

pub enum ConnectionState {
    Reading,
    Storing(FileFrame),
    Closed,
}

impl<R, S> Connection<R, S>
where
    R: AsyncRead + Unpin,
    S: FileSink,
{
    pub fn new(stream: R, sink: S) -> Self {
        Self {
            reader: BufReader::new(stream),
            sink,
            parser: Parser::new(),
            state: ConnectionState::Reading,
            summary: ConnectionSummary::default(),
        }
    }

    /// Decodes and stores frames until the peer closes the stream.
    ///
    /// Any protocol, transport or storage error ends the connection.
    pub async fn run(&mut self) -> Result<ConnectionSummary, ConnectionError> {
        loop {
            match mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    if let Some(frame) = self.read_frame().await? {
                        self.state = ConnectionState::Storing(frame);
                    }
                }

                ConnectionState::Storing(frame) => {
                    info!(file = %frame.file_name, size = frame.content.len(), "File received");

                    let written = self.sink.store(&frame).await?;
                    info!("Wrote {} bytes", written);

                    self.summary.files_written += 1;
                    self.summary.bytes_written += written;
                    self.state = ConnectionState::Reading; // next frame on the same connection
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(self.summary)
    }

    /// Feeds bytes to the parser until a frame completes.
    ///
    /// Returns `Ok(None)` when the peer closes the stream. Any unfinished
    /// frame is dropped in that case.
    pub async fn read_frame(&mut self) -> Result<Option<FileFrame>, ConnectionError> {
        loop {
            let byte = match self.reader.read_u8().await {
                Ok(byte) => byte,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    debug!(stage = ?self.parser.stage(), "Connection closed by peer");
                    self.parser.reset();
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };

            if self.parser.advance(byte)? == Stage::Finished {
                return Ok(self.parser.take_frame());
            }
        }
    }

    pub fn summary(&self) -> ConnectionSummary {
        self.summary
    }
}
