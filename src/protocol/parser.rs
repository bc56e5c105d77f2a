use std::mem;

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;
use tracing::debug;

use crate::protocol::frame::{
    CMD_FILE_UPLOAD, FILE_CONTENT_SIZE, FILE_NAME_SIZE, FileFrame, HEADER_SIZE, MAGIC,
};

/// Framing errors detected while decoding.
///
/// Every variant leaves the parser reset to [`Stage::WaitHeader`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid header")]
    InvalidHeader,
    #[error("invalid command: {0}")]
    InvalidCommand(u8),
    #[error("invalid file name length")]
    InvalidFileNameLength,
}

/// Observable parser stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    WaitHeader,
    ParsingFileNameSize,
    ParsingFileName,
    ParsingFileContentSize,
    ParsingContent,
    /// Terminal for one frame. The parser must be reset before reuse.
    Finished,
}

/// Internal state. Each variant carries only what is known at that point.
#[derive(Debug)]
enum State {
    WaitHeader,
    FileNameSize,
    FileName { name_len: u16 },
    ContentSize { file_name: String },
    Content { file_name: String, content_len: u32 },
    Finished(FileFrame),
}

impl State {
    fn stage(&self) -> Stage {
        match self {
            State::WaitHeader => Stage::WaitHeader,
            State::FileNameSize => Stage::ParsingFileNameSize,
            State::FileName { .. } => Stage::ParsingFileName,
            State::ContentSize { .. } => Stage::ParsingFileContentSize,
            State::Content { .. } => Stage::ParsingContent,
            State::Finished(_) => Stage::Finished,
        }
    }

    /// Bytes the current field needs, `None` once finished.
    fn required(&self) -> Option<usize> {
        match self {
            State::WaitHeader => Some(HEADER_SIZE),
            State::FileNameSize => Some(FILE_NAME_SIZE),
            State::FileName { name_len } => Some(usize::from(*name_len)),
            State::ContentSize { .. } => Some(FILE_CONTENT_SIZE),
            State::Content { content_len, .. } => Some(*content_len as usize),
            State::Finished(_) => None,
        }
    }
}

/// Incremental decoder for one connection's frames.
///
/// Bytes are fed one at a time through [`Parser::advance`]. A field is
/// finalized by the same call that delivers its last byte, so no byte is
/// ever consumed just to trigger a transition.
#[derive(Debug)]
pub struct Parser {
    state: State,
    scratch: BytesMut,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: State::WaitHeader,
            scratch: BytesMut::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    /// The decoded frame, available only at [`Stage::Finished`].
    pub fn frame(&self) -> Option<&FileFrame> {
        match &self.state {
            State::Finished(frame) => Some(frame),
            _ => None,
        }
    }

    /// Moves the decoded frame out and resets the parser.
    ///
    /// Returns `None` and leaves the parser untouched if no frame is finished.
    pub fn take_frame(&mut self) -> Option<FileFrame> {
        match mem::replace(&mut self.state, State::WaitHeader) {
            State::Finished(frame) => {
                self.scratch.clear();
                Some(frame)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Discards all progress and waits for a new header.
    pub fn reset(&mut self) {
        self.state = State::WaitHeader;
        self.scratch.clear();
    }

    /// Feeds one byte and returns the stage reached.
    ///
    /// At [`Stage::Finished`] the byte is ignored; callers must reset first.
    pub fn advance(&mut self, byte: u8) -> Result<Stage, ParseError> {
        let Some(required) = self.state.required() else {
            return Ok(Stage::Finished);
        };

        if self.scratch.len() < required {
            self.scratch.put_u8(byte);
        }
        if self.scratch.len() < required {
            return Ok(self.state.stage());
        }

        let current = mem::replace(&mut self.state, State::WaitHeader);
        let field = self.scratch.split().freeze();

        match finalize(current, field) {
            Ok(next) => {
                self.state = next;
                Ok(self.state.stage())
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }
}

/// Interprets a completed field and returns the following state.
fn finalize(current: State, field: Bytes) -> Result<State, ParseError> {
    match current {
        State::WaitHeader => {
            if field[..MAGIC.len()] != MAGIC {
                return Err(ParseError::InvalidHeader);
            }
            let command = field[MAGIC.len()];
            if command != CMD_FILE_UPLOAD {
                return Err(ParseError::InvalidCommand(command));
            }
            debug!("Header received");
            Ok(State::FileNameSize)
        }

        State::FileNameSize => {
            let name_len = u16::from_le_bytes([field[0], field[1]]);
            debug!(name_len, "File name length");
            if name_len == 0 {
                return Err(ParseError::InvalidFileNameLength);
            }
            Ok(State::FileName { name_len })
        }

        State::FileName { .. } => {
            let file_name = String::from_utf8_lossy(&field).into_owned();
            debug!(%file_name, "File name");
            Ok(State::ContentSize { file_name })
        }

        State::ContentSize { file_name } => {
            let content_len = u32::from_le_bytes([field[0], field[1], field[2], field[3]]);
            debug!(content_len, "File size");
            if content_len == 0 {
                // Nothing left to read for this frame.
                debug!("Finish");
                return Ok(State::Finished(FileFrame::new(file_name, Bytes::new())));
            }
            Ok(State::Content {
                file_name,
                content_len,
            })
        }

        State::Content { file_name, .. } => {
            debug!("Finish");
            Ok(State::Finished(FileFrame::new(file_name, field)))
        }

        State::Finished(frame) => Ok(State::Finished(frame)),
    }
}
