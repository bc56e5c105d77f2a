//! File transfer protocol implementation.
//!
//! Each TCP connection carries a sequence of frames. Every frame uploads a
//! single file and is laid out as follows (integers are little-endian):
//!
//! ```text
//! ┌────────┬─────────┬──────────┬───────────┬─────────────┬───────────────┐
//! │ magic  │ command │ name len │ name      │ content len │ content       │
//! │ 21 12  │ 01      │ u16 (>0) │ name len  │ u32         │ content len   │
//! └────────┴─────────┴──────────┴───────────┴─────────────┴───────────────┘
//! ```
//!
//! # Architecture
//!
//! - **`frame`**: Wire constants and the decoded [`frame::FileFrame`]
//! - **`parser`**: Byte-at-a-time state machine turning bytes into frames
//! - **`connection`**: Drives the parser from a transport and stores each completed file
//!
//! # Parser State Machine
//!
//! ```text
//!        ┌──────────────────────┐
//!        │      WaitHeader      │ ← magic + command (3 bytes)
//!        └──────────┬───────────┘
//!                   ▼
//!        ┌──────────────────────┐
//!        │ ParsingFileNameSize  │ ← u16, zero is rejected
//!        └──────────┬───────────┘
//!                   ▼
//!        ┌──────────────────────┐
//!        │   ParsingFileName    │
//!        └──────────┬───────────┘
//!                   ▼
//!        ┌──────────────────────┐
//!        │ParsingFileContentSize│ ← u32, zero skips straight to Finished
//!        └──────────┬───────────┘
//!                   ▼
//!        ┌──────────────────────┐
//!        │    ParsingContent    │
//!        └──────────┬───────────┘
//!                   ▼
//!        ┌──────────────────────┐
//!        │       Finished       │ ← take the frame, parser resets
//!        └──────────────────────┘
//! ```
//!
//! Any validation failure resets the parser to `WaitHeader` and the
//! connection is closed without a reply.
//!
//! # Example
//!
//! ```
//! use byfrost::protocol::parser::{Parser, Stage};
//!
//! let bytes = [
//!     0x21, 0x12, 0x01, 0x05, 0x00, b'a', b'.', b't', b'x', b't',
//!     0x04, 0x00, 0x00, 0x00, b'a', b'b', b'c', b'd',
//! ];
//!
//! let mut parser = Parser::new();
//! let mut stage = Stage::WaitHeader;
//! for b in bytes {
//!     stage = parser.advance(b).unwrap();
//! }
//!
//! assert_eq!(stage, Stage::Finished);
//! let frame = parser.take_frame().unwrap();
//! assert_eq!(frame.file_name, "a.txt");
//! assert_eq!(&frame.content[..], b"abcd");
//! ```

pub mod connection;
pub mod frame;
pub mod parser;
