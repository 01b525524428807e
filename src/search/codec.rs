//! Versioned binary encoding of a built index.
//!
//! Layout (little endian):
//!
//! | bytes | field                              |
//! |-------|------------------------------------|
//! | 4     | magic `DSIX`                       |
//! | 2     | format version                     |
//! | 2     | flags, reserved, must be zero      |
//! | 8     | payload length                     |
//! | 8     | xxh3-64 checksum of the payload    |
//! | n     | postcard-encoded index             |
//!
//! Decoding never trusts the payload: after the checksum the decoded index is
//! re-validated structurally before it is handed out.

use super::index::{IndexParts, InvertedIndex};
use crate::error::SearchError;
use xxhash_rust::xxh3::xxh3_64;

/// Magic bytes: "DSIX" in ASCII.
pub const MAGIC: [u8; 4] = *b"DSIX";

/// Current format version.
pub const VERSION: u16 = 1;

/// Header size: magic + version + flags + length + checksum.
pub const HEADER_SIZE: usize = 4 + 2 + 2 + 8 + 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    version: u16,
    flags: u16,
    payload_len: u64,
    checksum: u64,
}

impl Header {
    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.payload_len.to_le_bytes());
        out.extend_from_slice(&self.checksum.to_le_bytes());
    }

    fn read(bytes: &[u8]) -> Result<Self, SearchError> {
        let Some(header) = bytes.get(..HEADER_SIZE) else {
            return Err(SearchError::corrupt(format!(
                "truncated header: {} bytes, need {}",
                bytes.len(),
                HEADER_SIZE
            )));
        };
        let (magic, rest) = header.split_at(4);
        if magic != MAGIC {
            return Err(SearchError::corrupt(format!(
                "invalid magic: expected DSIX, got {magic:?}"
            )));
        }
        Ok(Self {
            version: u16::from_le_bytes([rest[0], rest[1]]),
            flags: u16::from_le_bytes([rest[2], rest[3]]),
            payload_len: u64::from_le_bytes(le_array(&rest[4..12])),
            checksum: u64::from_le_bytes(le_array(&rest[12..20])),
        })
    }
}

fn le_array(bytes: &[u8]) -> [u8; 8] {
    let mut array = [0u8; 8];
    array.copy_from_slice(bytes);
    array
}

/// Encodes an index into a self-describing blob.
pub fn encode(index: &InvertedIndex) -> Result<Vec<u8>, SearchError> {
    let payload = postcard::to_allocvec(&index.as_parts())
        .map_err(|e| SearchError::corrupt(format!("failed to encode index: {e}")))?;

    let header = Header {
        version: VERSION,
        flags: 0,
        payload_len: payload.len() as u64,
        checksum: xxh3_64(&payload),
    };
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    header.write(&mut out);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decodes and validates a blob produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<InvertedIndex, SearchError> {
    let header = Header::read(bytes)?;
    if header.version != VERSION {
        return Err(SearchError::UnsupportedVersion {
            found: header.version,
            supported: VERSION,
        });
    }
    if header.flags != 0 {
        return Err(SearchError::corrupt(format!(
            "unknown flags {:#06x}",
            header.flags
        )));
    }

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() as u64 != header.payload_len {
        return Err(SearchError::corrupt(format!(
            "payload length mismatch: header says {}, found {}",
            header.payload_len,
            payload.len()
        )));
    }
    let checksum = xxh3_64(payload);
    if checksum != header.checksum {
        return Err(SearchError::corrupt(format!(
            "checksum mismatch: expected {:016x}, computed {:016x}",
            header.checksum, checksum
        )));
    }

    let parts: IndexParts = postcard::from_bytes(payload)
        .map_err(|e| SearchError::corrupt(format!("failed to decode index payload: {e}")))?;
    InvertedIndex::from_parts(parts)
}
