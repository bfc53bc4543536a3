//! Indexed (palette) bitmaps and the per-build bitmap cache.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{RcdError, Result, ValueError};

/// An 8-bit indexed bitmap: one palette index per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedBitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    palette: Option<Vec<[u8; 3]>>,
}

impl IndexedBitmap {
    /// Create a bitmap filled with one index.
    pub fn filled(width: u32, height: u32, index: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![index; width as usize * height as usize],
            palette: None,
        }
    }

    /// Create a bitmap from rows of indices; all rows must have the same length.
    pub fn from_rows(rows: &[&[u8]]) -> std::result::Result<Self, ValueError> {
        let width = rows.first().map_or(0, |r| r.len());
        if rows.iter().any(|r| r.len() != width) {
            return Err(ValueError::Mismatch {
                expected: "rows of equal length".to_string(),
                type_name: "bitmap".to_string(),
            });
        }
        Ok(Self {
            width: width as u32,
            height: rows.len() as u32,
            pixels: rows.concat(),
            palette: None,
        })
    }

    pub fn with_palette(mut self, palette: Vec<[u8; 3]>) -> Self {
        self.palette = Some(palette);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn palette(&self) -> Option<&[[u8; 3]]> {
        self.palette.as_deref()
    }

    /// Palette index at (x, y). Callers stay inside the bitmap.
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, index: u8) {
        let w = self.width as usize;
        self.pixels[y as usize * w + x as usize] = index;
    }

    /// One row of indices.
    pub fn row(&self, y: u32) -> &[u8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.pixels[start..start + w]
    }

    /// Load an indexed PNG file.
    pub fn load_png(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| RcdError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to open bitmap: {}", e),
        })?;
        Self::decode_png(BufReader::new(file)).map_err(|e| match e {
            RcdError::Parse { message, .. } => RcdError::Io {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Decode an indexed PNG; bit depths below 8 are unpacked to one index per pixel.
    pub fn decode_png<R: Read>(reader: R) -> Result<Self> {
        let mut decoder = png::Decoder::new(reader);
        decoder.set_transformations(png::Transformations::IDENTITY);
        let mut reader = decoder.read_info().map_err(png_decode_error)?;

        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).map_err(png_decode_error)?;
        if info.color_type != png::ColorType::Indexed {
            return Err(ValueError::Mismatch {
                expected: "an indexed (palette) PNG".to_string(),
                type_name: format!("{:?} bitmap", info.color_type),
            }
            .into());
        }

        let depth = info.bit_depth as usize;
        let per_byte = 8 / depth;
        let mask = ((1u16 << depth) - 1) as u8;
        let width = info.width as usize;
        let mut pixels = Vec::with_capacity(width * info.height as usize);
        for line in buf.chunks(info.line_size).take(info.height as usize) {
            if depth == 8 {
                pixels.extend_from_slice(&line[..width]);
                continue;
            }
            for x in 0..width {
                let byte = line[x / per_byte];
                let shift = 8 - depth * (x % per_byte + 1);
                pixels.push((byte >> shift) & mask);
            }
        }

        let palette = reader
            .info()
            .palette
            .as_ref()
            .map(|p| p.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect());

        Ok(Self {
            width: info.width,
            height: info.height,
            pixels,
            palette,
        })
    }

    /// Save as an 8-bit indexed PNG. Without a palette a grey ramp is written.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| RcdError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to create bitmap: {}", e),
        })?;
        let mut out = BufWriter::new(file);
        self.encode_png(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Encode as an 8-bit indexed PNG.
    pub fn encode_png<W: Write>(&self, out: W) -> Result<()> {
        let palette: Vec<u8> = match &self.palette {
            Some(p) => p.iter().flatten().copied().collect(),
            None => (0..=255u8).flat_map(|v| [v, v, v]).collect(),
        };

        let mut encoder = png::Encoder::new(out, self.width, self.height);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(palette);
        let mut writer = encoder.write_header().map_err(png_encode_error)?;
        writer
            .write_image_data(&self.pixels)
            .map_err(png_encode_error)?;
        Ok(())
    }
}

fn png_decode_error(e: png::DecodingError) -> RcdError {
    RcdError::Parse {
        message: format!("Failed to decode PNG: {}", e),
        help: None,
    }
}

fn png_encode_error(e: png::EncodingError) -> RcdError {
    RcdError::Parse {
        message: format!("Failed to encode PNG: {}", e),
        help: None,
    }
}

/// Bitmaps decoded so far in one build, by path.
#[derive(Debug, Default)]
pub struct BitmapCache {
    bitmaps: HashMap<PathBuf, Arc<IndexedBitmap>>,
}

impl BitmapCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a bitmap, decoding it on first use.
    pub fn get(&mut self, path: &Path) -> Result<Arc<IndexedBitmap>> {
        if let Some(bitmap) = self.bitmaps.get(path) {
            return Ok(Arc::clone(bitmap));
        }
        let bitmap = Arc::new(IndexedBitmap::load_png(path)?);
        self.bitmaps.insert(path.to_path_buf(), Arc::clone(&bitmap));
        Ok(bitmap)
    }

    /// Insert an already decoded bitmap under a path.
    pub fn insert(&mut self, path: impl Into<PathBuf>, bitmap: IndexedBitmap) {
        self.bitmaps.insert(path.into(), Arc::new(bitmap));
    }

    pub fn len(&self) -> usize {
        self.bitmaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitmaps.is_empty()
    }
}
