//! Inspect command implementation.
//!
//! Reads an RCD file back, lists its blocks and optionally dumps its sprites
//! as PNG previews.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::container::RcdFile;
use crate::error::{RcdError, Result};
use crate::output::{display_path, plural, Printer};
use crate::render::{write_preview, PreviewPalette};
use crate::sprite::{IndexedBitmap, SpriteImage, DEFAULT_TRANSPARENT, SPRITE_MAGIC, SPRITE_VERSION};

/// List the blocks of an RCD file
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// RCD file to read
    pub file: PathBuf,

    /// Print the block list as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Write every sprite as a PNG preview into this directory
    #[arg(long)]
    pub dump: Option<PathBuf>,

    /// Indexed PNG whose palette colours the previews (default: grey ramp)
    #[arg(long)]
    pub palette: Option<PathBuf>,

    /// Integer scale factor for previews
    #[arg(long, default_value = "1")]
    pub scale: u32,

    /// Palette index rendered as transparent
    #[arg(long, default_value_t = DEFAULT_TRANSPARENT)]
    pub transparent: u8,
}

/// One listed block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSummary {
    /// 1-based block number, as used by references.
    pub index: usize,
    pub magic: String,
    pub version: u32,
    pub length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprite: Option<SpriteSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpriteSummary {
    pub width: u32,
    pub height: u32,
    pub x_offset: i32,
    pub y_offset: i32,
}

fn is_sprite(magic: &str, version: u32) -> bool {
    magic == SPRITE_MAGIC.as_str() && version == SPRITE_VERSION
}

/// Summarize the blocks of a file, decoding sprite headers.
pub fn summarize(file: &RcdFile) -> Result<Vec<BlockSummary>> {
    file.blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            let sprite = if is_sprite(block.magic.as_str(), block.version) {
                let image = SpriteImage::from_payload(&block.payload)?;
                Some(SpriteSummary {
                    width: image.width,
                    height: image.height,
                    x_offset: image.x_offset,
                    y_offset: image.y_offset,
                })
            } else {
                None
            };
            Ok(BlockSummary {
                index: i + 1,
                magic: block.magic.to_string(),
                version: block.version,
                length: block.payload.len(),
                sprite,
            })
        })
        .collect()
}

pub fn run(args: InspectArgs, printer: &Printer) -> Result<()> {
    let file = RcdFile::load(&args.file)?;
    let blocks = summarize(&file)?;

    if args.json {
        let stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(stdout, &blocks).map_err(std::io::Error::from)?;
        println!();
    } else {
        printer.info(
            "Reading",
            &format!(
                "{} ({})",
                display_path(&args.file),
                plural(blocks.len(), "block", "blocks")
            ),
        );
        for block in &blocks {
            println!("{}", format_block(block));
        }
    }

    if let Some(dir) = &args.dump {
        let palette = match &args.palette {
            Some(path) => {
                let bitmap = IndexedBitmap::load_png(path)?;
                let colours = bitmap.palette().ok_or_else(|| RcdError::Validation {
                    message: format!("{} has no palette", display_path(path)),
                    help: Some("Pass an indexed (palette) PNG".to_string()),
                })?;
                PreviewPalette::from_colours(colours)
            }
            None => PreviewPalette::grey(),
        };
        let count = dump_sprites(&file, dir, &palette, args.transparent, args.scale)?;
        printer.success(
            "Dumped",
            &format!("{} to {}", plural(count, "sprite", "sprites"), display_path(dir)),
        );
    }

    Ok(())
}

fn format_block(block: &BlockSummary) -> String {
    let mut line = format!(
        "{:>5}  {} v{}  {} bytes",
        block.index, block.magic, block.version, block.length
    );
    if let Some(sprite) = &block.sprite {
        line.push_str(&format!(
            "  {}x{} at ({}, {})",
            sprite.width, sprite.height, sprite.x_offset, sprite.y_offset
        ));
    }
    line
}

/// Write each non-empty sprite of a file as `block-<n>.png`.
fn dump_sprites(
    file: &RcdFile,
    dir: &std::path::Path,
    palette: &PreviewPalette,
    transparent: u8,
    scale: u32,
) -> Result<usize> {
    fs::create_dir_all(dir).map_err(|e| RcdError::Io {
        path: dir.to_path_buf(),
        message: format!("Failed to create dump directory: {}", e),
    })?;

    let mut count = 0;
    for (i, block) in file.blocks.iter().enumerate() {
        if !is_sprite(block.magic.as_str(), block.version) {
            continue;
        }
        let image = SpriteImage::from_payload(&block.payload)?;
        if image.width == 0 || image.height == 0 {
            continue;
        }
        let path = dir.join(format!("block-{}.png", i + 1));
        write_preview(&image, palette, transparent, scale, &path)?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{Container, TextBundle};
    use crate::sprite::{EmptySprite, SpriteRegion};
    use tempfile::tempdir;

    fn sample_file() -> RcdFile {
        let bitmap = IndexedBitmap::from_rows(&[&[0, 0, 0], &[0, 5, 6]]).unwrap();
        let sprite = SpriteImage::encode(
            &bitmap,
            SpriteRegion::new(0, 0, 3, 2).with_offsets(-1, -1),
            true,
            0,
            EmptySprite::Omit,
        )
        .unwrap()
        .unwrap();

        let mut text = TextBundle::new();
        text.add("title", "en_GB", vec!["Shop".to_string()]).unwrap();

        let mut container = Container::new();
        container.add_block(Some(sprite.to_block().unwrap()));
        container.add_block(Some(text.to_block().unwrap()));
        RcdFile::parse(&container.to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn test_summarize() {
        let blocks = summarize(&sample_file()).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].magic, "8PXL");
        assert_eq!(
            blocks[0].sprite,
            Some(SpriteSummary {
                width: 2,
                height: 1,
                x_offset: 0,
                y_offset: 0,
            })
        );
        assert_eq!(blocks[1].index, 2);
        assert_eq!(blocks[1].sprite, None);
    }

    #[test]
    fn test_format_block() {
        let blocks = summarize(&sample_file()).unwrap();
        let line = format_block(&blocks[0]);
        assert!(line.contains("8PXL v2"), "{}", line);
        assert!(line.ends_with("2x1 at (0, 0)"), "{}", line);
    }

    #[test]
    fn test_json_skips_missing_sprite() {
        let blocks = summarize(&sample_file()).unwrap();
        let json = serde_json::to_value(&blocks).unwrap();
        assert_eq!(json[0]["sprite"]["width"], 2);
        assert!(json[1].get("sprite").is_none());
    }

    #[test]
    fn test_dump_sprites() {
        let dir = tempdir().unwrap();
        let count =
            dump_sprites(&sample_file(), dir.path(), &PreviewPalette::grey(), 0, 1).unwrap();
        assert_eq!(count, 1);

        let img = image::open(dir.path().join("block-1.png")).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(0, 0).0, [5, 5, 5, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [6, 6, 6, 255]);
    }
}
