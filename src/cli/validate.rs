//! Validate command implementation.
//!
//! Runs the schema self-check and compiles every data file in memory,
//! reporting problems without writing any output.

use clap::Args;

use crate::compile::{BuildOptions, Compiler, DataFile};
use crate::error::{RcdError, Result};
use crate::output::{display_path, plural, Printer};
use crate::validation::{print_diagnostics, summary, ValidationResult};

use super::build::load_checked_schema;
use super::ProjectArgs;

/// Check the schema and data files without writing output
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

pub fn run(args: ValidateArgs, printer: &Printer) -> Result<()> {
    let setup = args.project.setup()?;
    let schema = load_checked_schema(&setup.schema, printer)?;

    let options = BuildOptions {
        output_dir: setup.output_dir,
        empty_sprites: setup.manifest.empty_sprites,
        transparent: setup.manifest.transparent,
    };
    let mut compiler = Compiler::new(&schema, options);
    let mut totals = ValidationResult::new();
    let mut failed = 0;

    for path in &setup.data_files {
        printer.status("Checking", &display_path(path));
        let result = DataFile::load(path).and_then(|data| compiler.compile_data(&data));
        let diagnostics = compiler.take_diagnostics();
        print_diagnostics(printer, &diagnostics);
        totals.merge(diagnostics);

        match result {
            Ok(files) => {
                let blocks: usize = files.iter().map(|f| f.container.len()).sum();
                printer.verbose(
                    "Checked",
                    &format!(
                        "{} into {}",
                        plural(files.len(), "output file", "output files"),
                        plural(blocks, "block", "blocks")
                    ),
                );
            }
            Err(e) => {
                printer.error("Failed", &format!("{}: {}", display_path(path), e));
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(RcdError::Validation {
            message: format!(
                "{} of {} failed",
                failed,
                plural(setup.data_files.len(), "data file", "data files")
            ),
            help: Some(format!("diagnostics {}", summary(&totals))),
        });
    }

    printer.success(
        "Validated",
        &format!(
            "{}, {}",
            plural(setup.data_files.len(), "data file", "data files"),
            summary(&totals)
        ),
    );
    Ok(())
}
