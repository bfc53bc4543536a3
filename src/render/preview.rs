//! RGBA previews of encoded sprites.
//!
//! Decodes an `8PXL` sprite back to palette indices and writes it as a PNG,
//! with the transparent index mapped to alpha 0.

use std::path::Path;

use image::{ImageBuffer, Rgba, RgbaImage};

use crate::error::{RcdError, Result};
use crate::sprite::SpriteImage;

/// Colours for palette indices, used when rendering previews.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewPalette {
    colours: Vec<[u8; 3]>,
}

impl PreviewPalette {
    /// A grey ramp: index `i` maps to `(i, i, i)`.
    pub fn grey() -> Self {
        Self {
            colours: (0..=255u8).map(|i| [i, i, i]).collect(),
        }
    }

    /// Use the given colours; indices past the end render as magenta.
    pub fn from_colours(colours: &[[u8; 3]]) -> Self {
        Self {
            colours: colours.to_vec(),
        }
    }

    /// Colour of an index.
    pub fn colour(&self, index: u8) -> [u8; 3] {
        self.colours
            .get(index as usize)
            .copied()
            .unwrap_or([255, 0, 255])
    }
}

impl Default for PreviewPalette {
    fn default() -> Self {
        Self::grey()
    }
}

/// Render a sprite to an RGBA image scaled by an integer factor.
pub fn render_sprite(
    sprite: &SpriteImage,
    palette: &PreviewPalette,
    transparent: u8,
    scale: u32,
) -> Result<RgbaImage> {
    let scale = scale.max(1);
    let pixels = sprite.pixels(transparent)?;

    let mut img: RgbaImage = ImageBuffer::new(sprite.width * scale, sprite.height * scale);
    for (i, &index) in pixels.iter().enumerate() {
        let x = i as u32 % sprite.width;
        let y = i as u32 / sprite.width;
        let rgba = if index == transparent {
            Rgba([0, 0, 0, 0])
        } else {
            let [r, g, b] = palette.colour(index);
            Rgba([r, g, b, 255])
        };

        for sy in 0..scale {
            for sx in 0..scale {
                img.put_pixel(x * scale + sx, y * scale + sy, rgba);
            }
        }
    }
    Ok(img)
}

/// Write a sprite preview PNG.
pub fn write_preview(
    sprite: &SpriteImage,
    palette: &PreviewPalette,
    transparent: u8,
    scale: u32,
    path: &Path,
) -> Result<()> {
    if sprite.width == 0 || sprite.height == 0 {
        return Err(RcdError::Io {
            path: path.to_path_buf(),
            message: "Cannot write a preview of a zero-sized sprite".to_string(),
        });
    }
    let img = render_sprite(sprite, palette, transparent, scale)?;
    img.save(path).map_err(|e| RcdError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write PNG: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::{EmptySprite, IndexedBitmap, SpriteRegion};
    use tempfile::tempdir;

    fn sample() -> SpriteImage {
        let bitmap = IndexedBitmap::from_rows(&[&[0, 3, 0], &[7, 0, 0]]).unwrap();
        SpriteImage::encode(
            &bitmap,
            SpriteRegion::new(0, 0, 3, 2),
            false,
            0,
            EmptySprite::Omit,
        )
        .unwrap()
        .unwrap()
    }

    #[test]
    fn test_palette_lookup() {
        let palette = PreviewPalette::from_colours(&[[0, 0, 0], [10, 20, 30]]);
        assert_eq!(palette.colour(1), [10, 20, 30]);
        assert_eq!(palette.colour(9), [255, 0, 255]);
        assert_eq!(PreviewPalette::grey().colour(42), [42, 42, 42]);
    }

    #[test]
    fn test_render_sprite() {
        let img = render_sprite(&sample(), &PreviewPalette::grey(), 0, 1).unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(img.get_pixel(1, 0).0, [3, 3, 3, 255]);
        assert_eq!(img.get_pixel(0, 1).0, [7, 7, 7, 255]);
    }

    #[test]
    fn test_write_preview_scaled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sprite.png");
        write_preview(&sample(), &PreviewPalette::grey(), 0, 2, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!((img.width(), img.height()), (6, 4));
        assert_eq!(img.get_pixel(3, 1).0, [3, 3, 3, 255]);
        assert_eq!(img.get_pixel(4, 0).0[3], 0);
    }
}
