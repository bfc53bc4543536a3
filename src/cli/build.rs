//! Build command implementation.
//!
//! Loads the schema, compiles every data file and writes the RCD files.

use std::path::PathBuf;

use clap::Args;

use crate::compile::{BuildOptions, CompiledFile, Compiler, DataFile, SpriteReport};
use crate::error::{RcdError, Result};
use crate::output::{display_path, plural, Printer};
use crate::schema::{load_schema, Schema};
use crate::validation::{check_schema, print_diagnostics};

use super::ProjectArgs;

/// Compile data files into RCD files
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Output directory (overrides rcdgen.yaml)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

pub fn run(args: BuildArgs, printer: &Printer) -> Result<()> {
    let setup = args.project.setup()?;
    let schema = load_checked_schema(&setup.schema, printer)?;

    if setup.data_files.is_empty() {
        printer.warning("Skipping", "no data files found");
        return Ok(());
    }

    let output_dir = args.output.unwrap_or(setup.output_dir);
    let options = BuildOptions {
        output_dir: output_dir.clone(),
        empty_sprites: setup.manifest.empty_sprites,
        transparent: setup.manifest.transparent,
    };
    let mut compiler = Compiler::new(&schema, options);

    let mut written = 0;
    for path in &setup.data_files {
        printer.status("Compiling", &display_path(path));
        let data = DataFile::load(path)?;
        let result = compiler.compile_data(&data);
        print_diagnostics(printer, &compiler.take_diagnostics());

        for file in result? {
            write_file(&file, printer)?;
            written += 1;
        }
    }

    printer.success(
        "Finished",
        &format!(
            "{} in {}",
            plural(written, "RCD file", "RCD files"),
            display_path(&output_dir)
        ),
    );
    Ok(())
}

/// Load the schema and fail on self-check errors.
pub(crate) fn load_checked_schema(path: &std::path::Path, printer: &Printer) -> Result<Schema> {
    let schema = load_schema(path)?;
    printer.verbose(
        "Loaded",
        &format!(
            "{} from {}",
            plural(schema.len(), "block definition", "block definitions"),
            display_path(path)
        ),
    );

    let checks = check_schema(&schema);
    print_diagnostics(printer, &checks);
    if checks.has_errors() {
        return Err(RcdError::Validation {
            message: format!(
                "schema {} has {}",
                display_path(path),
                plural(checks.error_count(), "conflict", "conflicts")
            ),
            help: None,
        });
    }
    Ok(schema)
}

fn write_file(file: &CompiledFile, printer: &Printer) -> Result<()> {
    for sprite in &file.sprites {
        printer.verbose("Encoded", &describe_sprite(sprite));
    }
    file.write()?;
    printer.status(
        "Writing",
        &format!(
            "{} ({})",
            display_path(&file.target),
            plural(file.container.len(), "block", "blocks")
        ),
    );
    Ok(())
}

fn describe_sprite(sprite: &SpriteReport) -> String {
    match sprite.reference {
        Some(reference) => format!(
            "{} {}x{} at ({}, {}) as block {}",
            sprite.sheet,
            sprite.width,
            sprite.height,
            sprite.x_offset,
            sprite.y_offset,
            reference.get()
        ),
        None => format!("{} (empty, omitted)", sprite.sheet),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockRef;

    #[test]
    fn test_describe_sprite() {
        let mut report = SpriteReport {
            sheet: "shop.png".to_string(),
            width: 64,
            height: 48,
            x_offset: -32,
            y_offset: -40,
            reference: BlockRef::new(3),
        };
        assert_eq!(describe_sprite(&report), "shop.png 64x48 at (-32, -40) as block 3");

        report.reference = None;
        assert_eq!(describe_sprite(&report), "shop.png (empty, omitted)");
    }
}
