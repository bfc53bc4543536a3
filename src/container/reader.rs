//! Reading RCD files back, for inspection.

use std::io::{Cursor, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{RcdError, ReadError, Result};
use crate::schema::Magic;

use super::{FILE_MAGIC, FILE_VERSION};

/// One block record as stored: magic, version and undecoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub magic: Magic,
    pub version: u32,
    pub payload: Vec<u8>,
}

/// The block records of an RCD file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RcdFile {
    pub blocks: Vec<RawBlock>,
}

impl RcdFile {
    /// Read and parse a file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| RcdError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read RCD file: {}", e),
        })?;
        Ok(Self::parse(&bytes)?)
    }

    /// Parse the bytes of a file; the header must match exactly.
    pub fn parse(bytes: &[u8]) -> std::result::Result<Self, ReadError> {
        let mut cursor = Cursor::new(bytes);

        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic)?;
        if magic != FILE_MAGIC {
            return Err(ReadError::InvalidMagic(magic));
        }
        let version = cursor.read_u32::<LittleEndian>()?;
        if version != FILE_VERSION {
            return Err(ReadError::UnsupportedVersion(version));
        }

        let mut blocks = Vec::new();
        while (cursor.position() as usize) < bytes.len() {
            let mut magic = [0u8; 4];
            cursor.read_exact(&mut magic)?;
            if !magic.iter().all(u8::is_ascii_graphic) {
                return Err(ReadError::Corrupt(format!(
                    "block {} has a non-ASCII magic",
                    blocks.len() + 1
                )));
            }
            let version = cursor.read_u32::<LittleEndian>()?;
            let length = cursor.read_u32::<LittleEndian>()? as usize;

            let start = cursor.position() as usize;
            let payload = bytes.get(start..start + length).ok_or_else(|| {
                ReadError::Corrupt(format!(
                    "block {} claims {} bytes, {} left",
                    blocks.len() + 1,
                    length,
                    bytes.len() - start
                ))
            })?;
            cursor.set_position((start + length) as u64);

            blocks.push(RawBlock {
                magic: Magic::new(magic),
                version,
                payload: payload.to_vec(),
            });
        }
        Ok(Self { blocks })
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_only() {
        let file = RcdFile::parse(b"RCDF\x01\x00\x00\x00").unwrap();
        assert!(file.is_empty());
    }

    #[test]
    fn test_parse_blocks() {
        let mut bytes = b"RCDF\x01\x00\x00\x00".to_vec();
        bytes.extend_from_slice(b"TEST\x01\x00\x00\x00\x02\x00\x00\x00\x07\x00");
        bytes.extend_from_slice(b"NONE\x04\x00\x00\x00\x00\x00\x00\x00");

        let file = RcdFile::parse(&bytes).unwrap();
        assert_eq!(file.len(), 2);
        assert_eq!(file.blocks[0].magic.as_str(), "TEST");
        assert_eq!(file.blocks[0].payload, vec![7, 0]);
        assert_eq!(file.blocks[1].version, 4);
        assert!(file.blocks[1].payload.is_empty());
    }

    #[test]
    fn test_bad_header() {
        assert!(matches!(
            RcdFile::parse(b"RCDX\x01\x00\x00\x00"),
            Err(ReadError::InvalidMagic(_))
        ));
        assert!(matches!(
            RcdFile::parse(b"RCDF\x02\x00\x00\x00"),
            Err(ReadError::UnsupportedVersion(2))
        ));
        assert!(matches!(RcdFile::parse(b"RC"), Err(ReadError::Io(_))));
    }

    #[test]
    fn test_truncated_payload() {
        let mut bytes = b"RCDF\x01\x00\x00\x00".to_vec();
        bytes.extend_from_slice(b"TEST\x01\x00\x00\x00\x09\x00\x00\x00\x07");
        assert!(matches!(
            RcdFile::parse(&bytes),
            Err(ReadError::Corrupt(_))
        ));
    }
}
