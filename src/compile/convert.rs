//! Converting bound [`FieldValue`]s into encodable [`Value`]s.
//!
//! Conversion dispatches on (declared type, bound value). Sprite regions and
//! text bundles become blocks of their own, added to the container being
//! built; the field then holds a reference to them.

use std::sync::Arc;

use crate::container::Container;
use crate::error::{Result, ValueError};
use crate::sprite::{BitmapCache, EmptySprite, IndexedBitmap, SheetGrid, SpriteImage, SpriteRegion};
use crate::types::{BlockRef, DataType, FieldValue, ImageRegion, ListType, NumericType, StructType, Value};
use crate::validation::ValidationResult;

/// An encoded sprite, for the verbose build report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteReport {
    pub sheet: String,
    pub width: u32,
    pub height: u32,
    pub x_offset: i32,
    pub y_offset: i32,
    /// Block holding the sprite; `None` when it was omitted.
    pub reference: Option<BlockRef>,
}

/// Converts values for one output file.
pub struct Converter<'a> {
    pub container: &'a mut Container,
    pub bitmaps: &'a mut BitmapCache,
    pub diagnostics: &'a mut ValidationResult,
    pub sprites: &'a mut Vec<SpriteReport>,
    pub empty_sprites: EmptySprite,
    pub transparent: u8,
}

impl Converter<'_> {
    /// Convert `value` for a field of type `ty`.
    pub fn convert(&mut self, ty: &DataType, value: &FieldValue) -> Result<Value> {
        let converted = match (ty, value) {
            (DataType::Numeric(n), FieldValue::Number(v)) => Value::Int(n.check(*v)?),
            (DataType::Numeric(n), FieldValue::Symbol(text)) => Value::Int(n.parse(text)?),
            (DataType::Enumeration(e), FieldValue::Symbol(symbol)) => {
                Value::Int(e.base.check(e.lookup(symbol)?)?)
            }
            (DataType::BitSet(b), FieldValue::Bits(bits)) => Value::Int(b.pack(bits)?),

            (DataType::BlockReference(_) | DataType::Text, FieldValue::Block(r)) => Value::Ref(*r),
            (DataType::BlockReference(_), FieldValue::Number(n)) => {
                let index = NumericType::Uint32.check(*n)? as u32;
                if index as usize > self.container.len() {
                    return Err(ValueError::DanglingReference {
                        reference: index,
                        blocks: self.container.len(),
                    }
                    .into());
                }
                Value::Ref(BlockRef::new(index))
            }
            (DataType::BlockReference(_), FieldValue::Image(region)) => {
                Value::Ref(self.sprite(region)?)
            }
            (DataType::Text, FieldValue::Text(bundle)) => {
                let block = bundle.to_block()?;
                Value::Ref(self.container.add_block(Some(block)))
            }
            (DataType::ImageData, FieldValue::Image(region)) => {
                let bitmap = self.bitmaps.get(&region.sheet)?;
                let image = SpriteImage::encode(
                    &bitmap,
                    sprite_region(region, &bitmap),
                    region.crop,
                    self.transparent,
                    EmptySprite::Blank,
                )?;
                Value::Image(image.map(|i| i.lines).unwrap_or_default())
            }

            (DataType::List(list), FieldValue::List(items)) => {
                list.count.check(items.len() as i64)?;
                Value::List(
                    items
                        .iter()
                        .map(|item| self.convert(&list.element, item))
                        .collect::<Result<Vec<_>>>()?,
                )
            }
            (DataType::List(list), FieldValue::Grid(grid)) => self.list_grid(list, grid)?,

            (DataType::Structure(st), FieldValue::Struct(items)) => self.structure(st, items)?,
            (DataType::Structure(st), FieldValue::Grid(grid)) => self.struct_grid(st, grid)?,

            (ty, value) => {
                return Err(ValueError::Mismatch {
                    expected: expected_for(ty).to_string(),
                    type_name: format!("{} (got a {})", ty, value.kind()),
                }
                .into())
            }
        };
        Ok(converted)
    }

    /// Encode a sprite region and add its block; `None` for an omitted sprite.
    fn sprite(&mut self, region: &ImageRegion) -> Result<Option<BlockRef>> {
        let bitmap = self.bitmaps.get(&region.sheet)?;
        let image = SpriteImage::encode(
            &bitmap,
            sprite_region(region, &bitmap),
            region.crop,
            self.transparent,
            self.empty_sprites,
        )?;

        let (block, report) = match image {
            Some(image) => (
                Some(image.to_block()?),
                (image.width, image.height, image.x_offset, image.y_offset),
            ),
            None => (None, (0, 0, region.x_offset, region.y_offset)),
        };
        let reference = self.container.add_block(block);
        self.sprites.push(SpriteReport {
            sheet: region.sheet.display().to_string(),
            width: report.0,
            height: report.1,
            x_offset: report.2,
            y_offset: report.3,
            reference,
        });
        Ok(reference)
    }

    fn grid_cells(&mut self, grid: &SheetGrid) -> Result<Vec<(String, ImageRegion)>> {
        let bitmap = self.bitmaps.get(&grid.sheet)?;
        if let Some(warning) = grid.coverage_warning(bitmap.width(), bitmap.height()) {
            self.diagnostics.push(warning);
        }
        Ok(grid.cells(bitmap.width(), bitmap.height())?)
    }

    fn list_grid(&mut self, list: &Arc<ListType>, grid: &SheetGrid) -> Result<Value> {
        if !matches!(list.element, DataType::BlockReference(_)) {
            return Err(ValueError::Grid(format!(
                "a grid fills lists of sprites, not of {}",
                list.element
            ))
            .into());
        }
        let cells = self.grid_cells(grid)?;
        list.count.check(cells.len() as i64)?;
        let mut items = Vec::with_capacity(cells.len());
        for (_, region) in &cells {
            items.push(Value::Ref(self.sprite(region)?));
        }
        Ok(Value::List(items))
    }

    fn struct_grid(&mut self, st: &Arc<StructType>, grid: &SheetGrid) -> Result<Value> {
        if let Some((name, ty)) = st
            .fields
            .iter()
            .find(|(_, ty)| !matches!(ty, DataType::BlockReference(_)))
        {
            return Err(ValueError::Grid(format!(
                "sub-field '{}' of {} is {}, not a sprite",
                name, st.name, ty
            ))
            .into());
        }

        let mut cells = self.grid_cells(grid)?;
        if let Some((name, _)) = cells.iter().find(|(name, _)| st.position(name).is_none()) {
            return Err(ValueError::Grid(format!("{} has no sub-field '{}'", st.name, name)).into());
        }

        let mut items = Vec::with_capacity(st.fields.len());
        for (name, _) in &st.fields {
            let index = cells
                .iter()
                .position(|(cell, _)| cell == name)
                .ok_or_else(|| ValueError::Grid(format!("no cell named '{}'", name)))?;
            let (_, region) = cells.swap_remove(index);
            items.push(Value::Ref(self.sprite(&region)?));
        }
        Ok(Value::Struct(items))
    }

    fn structure(&mut self, st: &Arc<StructType>, items: &[(String, FieldValue)]) -> Result<Value> {
        let mut values = Vec::with_capacity(st.fields.len());
        for (name, ty) in &st.fields {
            let item = items
                .iter()
                .rev()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v)
                .ok_or_else(|| ValueError::Mismatch {
                    expected: format!("a value for sub-field '{}'", name),
                    type_name: st.name.clone(),
                })?;
            values.push(
                self.convert(ty, item)
                    .map_err(|e| e.in_field(&st.name, name))?,
            );
        }
        Ok(Value::Struct(values))
    }
}

/// The pixel rectangle of a region; open sizes extend to the sheet edge.
fn sprite_region(region: &ImageRegion, bitmap: &IndexedBitmap) -> SpriteRegion {
    let width = region
        .width
        .unwrap_or_else(|| bitmap.width().saturating_sub(region.x));
    let height = region
        .height
        .unwrap_or_else(|| bitmap.height().saturating_sub(region.y));
    SpriteRegion::new(region.x, region.y, width, height)
        .with_offsets(region.x_offset, region.y_offset)
}

fn expected_for(ty: &DataType) -> &'static str {
    match ty {
        DataType::Numeric(_) => "an integer",
        DataType::Enumeration(_) => "an enumeration symbol",
        DataType::BlockReference(_) => "a sprite region, block number or null",
        DataType::Text => "a mapping of strings to languages",
        DataType::ImageData => "a sprite region",
        DataType::List(_) => "a list or sprite grid",
        DataType::Structure(_) => "a mapping of sub-fields or sprite grid",
        DataType::BitSet(_) => "a mapping of bitfields to symbols",
        DataType::Raw => "pre-encoded bytes",
    }
}
