//! Wire constants and the decoded frame record.

use bytes::{BufMut, Bytes, BytesMut};

/// Two-byte magic that opens every frame.
pub const MAGIC: [u8; 2] = [0x21, 0x12];

/// Command byte for a file upload, the only command the server understands.
pub const CMD_FILE_UPLOAD: u8 = 0x01;

/// Magic plus command byte.
pub const HEADER_SIZE: usize = 3;

/// Width of the little-endian filename length field.
pub const FILE_NAME_SIZE: usize = 2;

/// Width of the little-endian content length field.
pub const FILE_CONTENT_SIZE: usize = 4;

/// A fully decoded file transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFrame {
    /// Filename as sent by the peer. Not validated.
    pub file_name: String,
    /// Raw file contents.
    pub content: Bytes,
}

impl FileFrame {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// Serializes the frame into its wire representation.
    ///
    /// Returns `None` when the filename is empty or its length does not fit
    /// in 16 bits, or when the content is longer than `u32::MAX` bytes.
    /// Such frames cannot be expressed on the wire.
    pub fn encode(&self) -> Option<Bytes> {
        let name = self.file_name.as_bytes();
        let name_len = u16::try_from(name.len()).ok().filter(|n| *n > 0)?;
        let content_len = u32::try_from(self.content.len()).ok()?;

        let mut buf = BytesMut::with_capacity(
            HEADER_SIZE + FILE_NAME_SIZE + name.len() + FILE_CONTENT_SIZE + self.content.len(),
        );
        buf.put_slice(&MAGIC);
        buf.put_u8(CMD_FILE_UPLOAD);
        buf.put_u16_le(name_len);
        buf.put_slice(name);
        buf.put_u32_le(content_len);
        buf.put_slice(&self.content);

        Some(buf.freeze())
    }
}
