//! Block container and RCD file output.
//!
//! An RCD file is an 8 byte header (`RCDF`, version 1) followed by block
//! records. Blocks refer to each other by 1-based position; a container
//! appends each distinct block once and hands out its position.

mod block;
mod reader;
mod text;

use std::io::Write;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{RcdError, Result};
use crate::types::BlockRef;

pub use block::Block;
pub use reader::{RawBlock, RcdFile};
pub use text::{TextBundle, DEFAULT_LANGUAGE, TEXT_MAGIC, TEXT_VERSION};

/// File header magic.
pub const FILE_MAGIC: [u8; 4] = *b"RCDF";
/// File header version.
pub const FILE_VERSION: u32 = 1;

/// Ordered, deduplicated blocks of one output file.
#[derive(Debug, Clone, Default)]
pub struct Container {
    blocks: Vec<Block>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block, reusing an equal block already present.
    ///
    /// `None` stays `None` and takes no slot.
    pub fn add_block(&mut self, block: Option<Block>) -> Option<BlockRef> {
        let block = block?;
        let index = match self.blocks.iter().position(|b| *b == block) {
            Some(index) => index,
            None => {
                self.blocks.push(block);
                self.blocks.len() - 1
            }
        };
        u32::try_from(index + 1).ok().and_then(BlockRef::new)
    }

    /// Get a block by reference.
    pub fn get(&self, reference: BlockRef) -> Option<&Block> {
        self.blocks.get(reference.get() as usize - 1)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Write the header and every block.
    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(&FILE_MAGIC)?;
        out.write_u32::<LittleEndian>(FILE_VERSION)?;
        for block in &self.blocks {
            block.write(out)?;
        }
        Ok(())
    }

    /// Serialize the whole file in memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write(&mut bytes)?;
        Ok(bytes)
    }

    /// Serialize, then write the file in one go. Nothing is written on error.
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| RcdError::Io {
                path: parent.to_path_buf(),
                message: format!("Failed to create output directory: {}", e),
            })?;
        }
        std::fs::write(path, bytes).map_err(|e| RcdError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to write RCD file: {}", e),
        })
    }
}
