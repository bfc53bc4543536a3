//! Sprite regions and auto-cropping of transparent edges.

use crate::error::ValueError;

use super::IndexedBitmap;

/// A rectangle of a bitmap, plus the offset of its top-left corner to the
/// sprite's reference point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub x_offset: i32,
    pub y_offset: i32,
}

impl SpriteRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            x_offset: 0,
            y_offset: 0,
        }
    }

    pub fn with_offsets(mut self, x_offset: i32, y_offset: i32) -> Self {
        self.x_offset = x_offset;
        self.y_offset = y_offset;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Fail when the region does not lie inside the bitmap.
    pub fn check_bounds(&self, bitmap: &IndexedBitmap) -> Result<(), ValueError> {
        let right = u64::from(self.x) + u64::from(self.width);
        let bottom = u64::from(self.y) + u64::from(self.height);
        if right > u64::from(bitmap.width()) || bottom > u64::from(bitmap.height()) {
            return Err(ValueError::RegionOutOfBounds {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
                image_width: bitmap.width(),
                image_height: bitmap.height(),
            });
        }
        Ok(())
    }

    /// Shrink the region past fully transparent columns and rows.
    ///
    /// Edges are processed left, top, right, bottom. Removing a left column
    /// or top row moves the reference point with it; the other edges leave
    /// the offsets alone. The region must lie inside the bitmap.
    pub fn crop(&self, bitmap: &IndexedBitmap, transparent: u8) -> SpriteRegion {
        let mut r = *self;

        let column_clear = |r: &SpriteRegion, x: u32| {
            (r.y..r.y + r.height).all(|y| bitmap.get(x, y) == transparent)
        };
        let row_clear = |r: &SpriteRegion, y: u32| {
            (r.x..r.x + r.width).all(|x| bitmap.get(x, y) == transparent)
        };

        while !r.is_empty() && column_clear(&r, r.x) {
            r.x += 1;
            r.width -= 1;
            r.x_offset += 1;
        }
        while !r.is_empty() && row_clear(&r, r.y) {
            r.y += 1;
            r.height -= 1;
            r.y_offset += 1;
        }
        while !r.is_empty() && column_clear(&r, r.x + r.width - 1) {
            r.width -= 1;
        }
        while !r.is_empty() && row_clear(&r, r.y + r.height - 1) {
            r.height -= 1;
        }
        r
    }
}
