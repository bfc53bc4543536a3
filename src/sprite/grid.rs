//! Named grids of equally sized sprite cells.

use std::path::PathBuf;

use crate::error::ValueError;
use crate::types::ImageRegion;
use crate::validation::Diagnostic;

/// Layout name of a cell that produces no sprite.
pub const SKIP_CELL: &str = "_";

/// A sheet cut into a row-major grid of named cells.
///
/// Cell size defaults to the sheet size divided by the column and row count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetGrid {
    pub sheet: PathBuf,
    pub cell_width: Option<u32>,
    pub cell_height: Option<u32>,
    /// Offset applied to every cell before cropping.
    pub x_offset: i32,
    pub y_offset: i32,
    pub layout: Vec<Vec<String>>,
}

impl SheetGrid {
    /// Number of (columns, rows); the layout must be rectangular and non-empty.
    pub fn dimensions(&self) -> Result<(u32, u32), ValueError> {
        let columns = self.layout.first().map_or(0, |row| row.len());
        if columns == 0 {
            return Err(ValueError::Grid("layout has no cells".to_string()));
        }
        if let Some(row) = self.layout.iter().position(|r| r.len() != columns) {
            return Err(ValueError::Grid(format!(
                "row {} has {} cells, expected {}",
                row + 1,
                self.layout[row].len(),
                columns
            )));
        }
        Ok((columns as u32, self.layout.len() as u32))
    }

    /// Size of one cell in a sheet of the given size.
    pub fn cell_size(&self, sheet_width: u32, sheet_height: u32) -> Result<(u32, u32), ValueError> {
        let (columns, rows) = self.dimensions()?;
        let width = self.cell_width.unwrap_or(sheet_width / columns);
        let height = self.cell_height.unwrap_or(sheet_height / rows);
        if width == 0 || height == 0 {
            return Err(ValueError::Grid(format!(
                "{}x{} cells do not fit a {}x{} sheet",
                columns, rows, sheet_width, sheet_height
            )));
        }
        if u64::from(width) * u64::from(columns) > u64::from(sheet_width)
            || u64::from(height) * u64::from(rows) > u64::from(sheet_height)
        {
            return Err(ValueError::Grid(format!(
                "{}x{} cells of {}x{} exceed the {}x{} sheet",
                columns, rows, width, height, sheet_width, sheet_height
            )));
        }
        Ok((width, height))
    }

    /// Cell names in row-major order, skipped cells excluded.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layout
            .iter()
            .flatten()
            .map(String::as_str)
            .filter(|name| *name != SKIP_CELL)
    }

    /// Split the grid into named regions, row-major.
    pub fn cells(
        &self,
        sheet_width: u32,
        sheet_height: u32,
    ) -> Result<Vec<(String, ImageRegion)>, ValueError> {
        let (width, height) = self.cell_size(sheet_width, sheet_height)?;
        let mut cells = Vec::new();
        for (row, names) in self.layout.iter().enumerate() {
            for (column, name) in names.iter().enumerate() {
                if name == SKIP_CELL {
                    continue;
                }
                if cells.iter().any(|(other, _)| other == name) {
                    return Err(ValueError::Grid(format!("cell '{}' is named twice", name)));
                }
                cells.push((
                    name.clone(),
                    ImageRegion {
                        sheet: self.sheet.clone(),
                        x: column as u32 * width,
                        y: row as u32 * height,
                        width: Some(width),
                        height: Some(height),
                        x_offset: self.x_offset,
                        y_offset: self.y_offset,
                        crop: true,
                    },
                ));
            }
        }
        Ok(cells)
    }

    /// Warn when the cells leave part of the sheet unused.
    pub fn coverage_warning(&self, sheet_width: u32, sheet_height: u32) -> Option<Diagnostic> {
        let (columns, rows) = self.dimensions().ok()?;
        let (width, height) = self.cell_size(sheet_width, sheet_height).ok()?;
        let used = (columns * width, rows * height);
        if used == (sheet_width, sheet_height) {
            return None;
        }
        Some(
            Diagnostic::warning(
                "rcdgen::grid::coverage",
                format!(
                    "grid of {} covers {}x{} of the {}x{} sheet",
                    self.sheet.display(),
                    used.0,
                    used.1,
                    sheet_width,
                    sheet_height
                ),
            )
            .with_help("Set cell_width/cell_height or adjust the layout"),
        )
    }
}
