//! Compiling data files into RCD containers.
//!
//! For every block of an output file the compiler resolves the schema fields
//! of the block's version, checks the data bindings against them, binds and
//! converts each value, and appends the block to the file's container.
//! Sprites and texts met on the way are appended first, as blocks of their
//! own.

mod bind;
mod convert;
mod data;

use std::path::{Path, PathBuf};

use crate::container::{Block, Container};
use crate::error::{RcdError, Result};
use crate::output::plural;
use crate::schema::Schema;
use crate::sprite::{BitmapCache, EmptySprite, DEFAULT_TRANSPARENT};
use crate::validation::{check_bindings, ValidationResult};

pub use bind::bind;
pub use convert::{Converter, SpriteReport};
pub use data::{BlockSpec, DataFile, OutputSpec, DATA_SUFFIX};

/// Settings shared by all output files of a build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    /// Directory relative targets are written to.
    pub output_dir: PathBuf,
    /// Mode for empty sprites when a file does not choose one.
    pub empty_sprites: EmptySprite,
    /// Palette index of transparent pixels.
    pub transparent: u8,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            empty_sprites: EmptySprite::default(),
            transparent: DEFAULT_TRANSPARENT,
        }
    }
}

/// A container ready to be written.
#[derive(Debug)]
pub struct CompiledFile {
    pub target: PathBuf,
    pub container: Container,
    pub sprites: Vec<SpriteReport>,
}

impl CompiledFile {
    /// Write the container to its target.
    pub fn write(&self) -> Result<()> {
        self.container.to_file(&self.target)
    }
}

/// Compiles data files against one schema.
pub struct Compiler<'s> {
    schema: &'s Schema,
    options: BuildOptions,
    bitmaps: BitmapCache,
    diagnostics: ValidationResult,
}

impl<'s> Compiler<'s> {
    pub fn new(schema: &'s Schema, options: BuildOptions) -> Self {
        Self {
            schema,
            options,
            bitmaps: BitmapCache::new(),
            diagnostics: ValidationResult::new(),
        }
    }

    /// Diagnostics collected so far.
    pub fn diagnostics(&self) -> &ValidationResult {
        &self.diagnostics
    }

    /// Take the collected diagnostics, leaving none.
    pub fn take_diagnostics(&mut self) -> ValidationResult {
        std::mem::take(&mut self.diagnostics)
    }

    /// Compile every output file of a data file.
    pub fn compile_data(&mut self, data: &DataFile) -> Result<Vec<CompiledFile>> {
        data.outputs
            .iter()
            .map(|output| self.compile_output(output, &data.base_dir))
            .collect()
    }

    /// Compile one output file; sheet paths resolve against `base_dir`.
    pub fn compile_output(&mut self, output: &OutputSpec, base_dir: &Path) -> Result<CompiledFile> {
        let empty_sprites = output.empty_sprites.unwrap_or(self.options.empty_sprites);
        let mut container = Container::new();
        let mut sprites = Vec::new();

        for spec in &output.blocks {
            let block =
                self.compile_block(spec, base_dir, &mut container, &mut sprites, empty_sprites)?;
            container.add_block(Some(block));
        }

        let target = if output.target.is_absolute() {
            output.target.clone()
        } else {
            self.options.output_dir.join(&output.target)
        };
        Ok(CompiledFile {
            target,
            container,
            sprites,
        })
    }

    fn compile_block(
        &mut self,
        spec: &BlockSpec,
        base_dir: &Path,
        container: &mut Container,
        sprites: &mut Vec<SpriteReport>,
        empty_sprites: EmptySprite,
    ) -> Result<Block> {
        let schema = self.schema;
        let fields = schema.resolve(&spec.magic, spec.version)?;

        let checks = check_bindings(spec.magic, spec.version, &fields, &spec.names());
        let failed = checks.error_count();
        self.diagnostics.merge(checks);
        if failed > 0 {
            return Err(RcdError::Validation {
                message: format!(
                    "{} in block '{}' version {}",
                    plural(failed, "field error", "field errors"),
                    spec.magic,
                    spec.version
                ),
                help: Some("Set every field the schema defines for this version".to_string()),
            });
        }

        let mut block = Block::from_fields(spec.magic, spec.version, &fields);
        let mut converter = Converter {
            container,
            bitmaps: &mut self.bitmaps,
            diagnostics: &mut self.diagnostics,
            sprites,
            empty_sprites,
            transparent: self.options.transparent,
        };
        for field in &fields {
            let Some(binding) = spec.binding(&field.name) else {
                continue;
            };
            let value = bind(binding, &field.data_type, base_dir)
                .and_then(|bound| converter.convert(&field.data_type, &bound))
                .map_err(|e| e.in_field(spec.magic.to_string(), &field.name))?;
            block.set(&field.name, value)?;
        }
        Ok(block)
    }
}
