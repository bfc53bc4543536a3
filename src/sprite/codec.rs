//! Run-length scanline codec and the `8PXL` sprite block.
//!
//! Each scanline is a sequence of `(control, count, pixels...)` triples. The
//! low 7 bits of `control` hold the gap since the end of the previous run;
//! the high bit marks the last run of the line. Gaps wider than 127 pixels
//! are bridged by `(127, 0)` steps, runs longer than 255 pixels are split.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::container::Block;
use crate::error::{ReadError, Result, ValueError};
use crate::schema::Magic;
use crate::types::{DataType, ImageLines, NumericType, Value};

use super::{EmptySprite, IndexedBitmap, SpriteRegion};

/// Magic of sprite blocks.
pub const SPRITE_MAGIC: Magic = Magic::new(*b"8PXL");
/// Version of the sprite block layout.
pub const SPRITE_VERSION: u32 = 2;

/// Flag in the control byte marking the last run of a line.
pub const LAST_RUN: u8 = 0x80;
const MAX_GAP: usize = 0x7f;
const MAX_RUN: usize = 0xff;

/// A horizontal run of opaque pixels: start column and palette indices.
pub type Run = (usize, Vec<u8>);

/// Collect the maximal runs of non-transparent pixels of one row.
pub fn scan_line(pixels: &[u8], transparent: u8) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut x = 0;
    while x < pixels.len() {
        if pixels[x] == transparent {
            x += 1;
            continue;
        }
        let start = x;
        while x < pixels.len() && pixels[x] != transparent {
            x += 1;
        }
        runs.push((start, pixels[start..x].to_vec()));
    }
    runs
}

/// Encode the runs of one line. An empty slice encodes to nothing.
pub fn encode_line(runs: &[Run]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut offset = 0;
    for (idx, (start, pixels)) in runs.iter().enumerate() {
        let last = if idx + 1 == runs.len() { LAST_RUN } else { 0 };
        let mut x = *start;
        let mut pixels = pixels.as_slice();

        while x - offset > MAX_GAP {
            out.extend_from_slice(&[MAX_GAP as u8, 0]);
            offset += MAX_GAP;
        }
        while pixels.len() > MAX_RUN {
            out.push((x - offset) as u8);
            out.push(MAX_RUN as u8);
            out.extend_from_slice(&pixels[..MAX_RUN]);
            x += MAX_RUN;
            pixels = &pixels[MAX_RUN..];
            offset = x;
        }
        out.push(last | (x - offset) as u8);
        out.push(pixels.len() as u8);
        out.extend_from_slice(pixels);
        offset = x + pixels.len();
    }
    out
}

/// Decode one line of at most `width` pixels.
///
/// Returns the runs and the number of bytes consumed, up to and including
/// the run flagged as last.
pub fn decode_line(data: &[u8], width: usize) -> std::result::Result<(Vec<Run>, usize), ReadError> {
    let mut runs: Vec<Run> = Vec::new();
    let mut pos = 0;
    let mut x = 0;
    loop {
        let (control, count) = match data.get(pos..pos + 2) {
            Some(&[control, count]) => (control, usize::from(count)),
            _ => return Err(ReadError::Corrupt("truncated sprite line".to_string())),
        };
        pos += 2;
        x += usize::from(control & !LAST_RUN);
        if x + count > width {
            return Err(ReadError::Corrupt(format!(
                "run at x={} of {} pixels exceeds sprite width {}",
                x, count, width
            )));
        }
        let pixels = data
            .get(pos..pos + count)
            .ok_or_else(|| ReadError::Corrupt("truncated sprite run".to_string()))?;
        pos += count;
        if count > 0 {
            // Runs split at 255 pixels join up again.
            match runs.last_mut() {
                Some((start, prev)) if *start + prev.len() == x => prev.extend_from_slice(pixels),
                _ => runs.push((x, pixels.to_vec())),
            }
        }
        x += count;
        if control & LAST_RUN != 0 {
            return Ok((runs, pos));
        }
    }
}

/// An encoded sprite: bounding box, reference-point offsets and scanlines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteImage {
    pub width: u32,
    pub height: u32,
    pub x_offset: i32,
    pub y_offset: i32,
    pub lines: ImageLines,
}

impl SpriteImage {
    /// Encode a region of a bitmap.
    ///
    /// With `crop` the region is first shrunk past transparent edges. A region
    /// without opaque pixels yields `None` in [`EmptySprite::Omit`] mode, and
    /// an uncropped image with no line data in [`EmptySprite::Blank`] mode.
    pub fn encode(
        bitmap: &IndexedBitmap,
        region: SpriteRegion,
        crop: bool,
        transparent: u8,
        empty: EmptySprite,
    ) -> std::result::Result<Option<SpriteImage>, ValueError> {
        region.check_bounds(bitmap)?;
        let cropped = if crop {
            region.crop(bitmap, transparent)
        } else {
            region
        };

        let mut lines = Vec::with_capacity(cropped.height as usize);
        for y in cropped.y..cropped.y + cropped.height {
            let row = &bitmap.row(y)[cropped.x as usize..(cropped.x + cropped.width) as usize];
            let runs = scan_line(row, transparent);
            lines.push(if runs.is_empty() {
                None
            } else {
                Some(encode_line(&runs))
            });
        }

        if lines.iter().all(Option::is_none) {
            return Ok(match empty {
                EmptySprite::Omit => None,
                EmptySprite::Blank => Some(SpriteImage {
                    width: region.width,
                    height: region.height,
                    x_offset: region.x_offset,
                    y_offset: region.y_offset,
                    lines: vec![None; region.height as usize],
                }),
            });
        }

        Ok(Some(SpriteImage {
            width: cropped.width,
            height: cropped.height,
            x_offset: cropped.x_offset,
            y_offset: cropped.y_offset,
            lines,
        }))
    }

    /// Build the `8PXL` block holding this sprite.
    pub fn to_block(&self) -> Result<Block> {
        let mut block = Block::new(
            SPRITE_MAGIC,
            SPRITE_VERSION,
            vec![
                ("width".to_string(), DataType::Numeric(NumericType::Uint16)),
                ("height".to_string(), DataType::Numeric(NumericType::Uint16)),
                ("x_offset".to_string(), DataType::Numeric(NumericType::Int16)),
                ("y_offset".to_string(), DataType::Numeric(NumericType::Int16)),
                ("image_data".to_string(), DataType::ImageData),
            ],
        );
        NumericType::Uint16.check(i64::from(self.width))?;
        NumericType::Uint16.check(i64::from(self.height))?;
        NumericType::Int16.check(i64::from(self.x_offset))?;
        NumericType::Int16.check(i64::from(self.y_offset))?;
        block
            .set("width", Value::Int(i64::from(self.width)))?
            .set("height", Value::Int(i64::from(self.height)))?
            .set("x_offset", Value::Int(i64::from(self.x_offset)))?
            .set("y_offset", Value::Int(i64::from(self.y_offset)))?
            .set("image_data", Value::Image(self.lines.clone()))?;
        Ok(block)
    }

    /// Parse the payload of an `8PXL` version 2 block.
    pub fn from_payload(payload: &[u8]) -> std::result::Result<SpriteImage, ReadError> {
        let mut cursor = Cursor::new(payload);
        let width = u32::from(cursor.read_u16::<LittleEndian>()?);
        let height = u32::from(cursor.read_u16::<LittleEndian>()?);
        let x_offset = i32::from(cursor.read_i16::<LittleEndian>()?);
        let y_offset = i32::from(cursor.read_i16::<LittleEndian>()?);

        let table_start = cursor.position() as usize;
        let mut offsets = Vec::with_capacity(height as usize);
        for _ in 0..height {
            offsets.push(cursor.read_u32::<LittleEndian>()? as usize);
        }

        let mut lines = Vec::with_capacity(height as usize);
        for offset in offsets {
            if offset == 0 {
                lines.push(None);
                continue;
            }
            let start = table_start + offset;
            let data = payload.get(start..).ok_or_else(|| {
                ReadError::Corrupt(format!("line offset {} is past the block end", offset))
            })?;
            let (_, used) = decode_line(data, width as usize)?;
            lines.push(Some(data[..used].to_vec()));
        }

        Ok(SpriteImage {
            width,
            height,
            x_offset,
            y_offset,
            lines,
        })
    }

    /// Decode to a `width * height` index buffer, transparent pixels set to `transparent`.
    pub fn pixels(&self, transparent: u8) -> std::result::Result<Vec<u8>, ReadError> {
        let width = self.width as usize;
        let mut pixels = vec![transparent; width * self.height as usize];
        for (y, line) in self.lines.iter().enumerate() {
            let Some(data) = line else { continue };
            let (runs, _) = decode_line(data, width)?;
            for (x, run) in runs {
                let start = y * width + x;
                pixels[start..start + run.len()].copy_from_slice(&run);
            }
        }
        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scan_line() {
        assert_eq!(
            scan_line(&[0, 1, 2, 0, 0, 3], 0),
            vec![(1, vec![1, 2]), (5, vec![3])]
        );
        assert!(scan_line(&[0, 0, 0], 0).is_empty());
    }

    #[test]
    fn test_encode_simple_line() {
        let runs = vec![(1, vec![1, 2]), (5, vec![3])];
        assert_eq!(encode_line(&runs), vec![1, 2, 1, 2, 0x82, 1, 3]);
    }

    #[test]
    fn test_gap_of_200_is_split() {
        let encoded = encode_line(&[(200, vec![9])]);
        assert_eq!(encoded, vec![127, 0, 0x80 | 73, 1, 9]);

        let (runs, used) = decode_line(&encoded, 201).unwrap();
        assert_eq!(runs, vec![(200, vec![9])]);
        assert_eq!(used, encoded.len());
    }

    #[test]
    fn test_run_of_300_is_split() {
        let pixels: Vec<u8> = (0..300).map(|i| (i % 250 + 1) as u8).collect();
        let encoded = encode_line(&[(0, pixels.clone())]);

        assert_eq!(&encoded[..2], &[0, 255]);
        assert_eq!(&encoded[257..259], &[0x80, 45]);
        assert_eq!(encoded.len(), 2 + 255 + 2 + 45);

        let (runs, _) = decode_line(&encoded, 300).unwrap();
        assert_eq!(runs, vec![(0, pixels)]);
    }

    #[test]
    fn test_decode_errors() {
        // Missing last flag.
        assert!(decode_line(&[0, 1, 5], 4).is_err());
        // Truncated run.
        assert!(decode_line(&[0x80, 3, 5], 4).is_err());
        // Run past the width.
        assert!(decode_line(&[0x82, 3, 5, 5, 5], 4).is_err());
    }

    fn sheet() -> IndexedBitmap {
        IndexedBitmap::from_rows(&[
            &[0, 0, 0, 0, 0, 0],
            &[0, 7, 7, 0, 8, 0],
            &[0, 0, 0, 0, 0, 0],
            &[0, 0, 9, 9, 9, 0],
            &[0, 0, 0, 0, 0, 0],
        ])
        .unwrap()
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let bitmap = sheet();
        let region = SpriteRegion::new(0, 0, 6, 5).with_offsets(-3, -5);
        let image = SpriteImage::encode(&bitmap, region, true, 0, EmptySprite::Omit)
            .unwrap()
            .unwrap();

        assert_eq!((image.width, image.height), (4, 3));
        assert_eq!((image.x_offset, image.y_offset), (-2, -4));
        assert_eq!(image.lines[1], None);

        let pixels = image.pixels(0).unwrap();
        let cropped = region.crop(&bitmap, 0);
        let expected: Vec<u8> = (cropped.y..cropped.y + cropped.height)
            .flat_map(|y| {
                bitmap.row(y)[cropped.x as usize..(cropped.x + cropped.width) as usize].to_vec()
            })
            .collect();
        assert_eq!(pixels, expected);
    }

    #[test]
    fn test_block_payload_round_trip() {
        let bitmap = sheet();
        let image = SpriteImage::encode(
            &bitmap,
            SpriteRegion::new(1, 1, 4, 3),
            true,
            0,
            EmptySprite::Omit,
        )
        .unwrap()
        .unwrap();

        let mut bytes = Vec::new();
        image.to_block().unwrap().write(&mut bytes).unwrap();
        assert_eq!(&bytes[..4], b"8PXL");
        assert_eq!(&bytes[4..8], &[2, 0, 0, 0]);

        let parsed = SpriteImage::from_payload(&bytes[12..]).unwrap();
        assert_eq!(parsed, image);
    }

    #[test]
    fn test_empty_region_modes() {
        let bitmap = sheet();
        let region = SpriteRegion::new(0, 2, 6, 1).with_offsets(1, 2);

        let omitted = SpriteImage::encode(&bitmap, region, true, 0, EmptySprite::Omit).unwrap();
        assert_eq!(omitted, None);

        let blank = SpriteImage::encode(&bitmap, region, true, 0, EmptySprite::Blank)
            .unwrap()
            .unwrap();
        assert_eq!((blank.width, blank.height), (6, 1));
        assert_eq!((blank.x_offset, blank.y_offset), (1, 2));
        assert_eq!(blank.lines, vec![None]);
    }

    #[test]
    fn test_region_outside_bitmap() {
        let result = SpriteImage::encode(
            &sheet(),
            SpriteRegion::new(4, 0, 4, 1),
            true,
            0,
            EmptySprite::Omit,
        );
        assert!(matches!(result, Err(ValueError::RegionOutOfBounds { .. })));
    }
}
