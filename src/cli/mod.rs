pub mod build;
pub mod completions;
pub mod inspect;
pub mod validate;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::discovery::{discover, scan_sources, Manifest};
use crate::error::Result;
use crate::sprite::EmptySprite;

/// rcdgen - compile schema-described game data into RCD files
#[derive(Parser, Debug)]
#[command(name = "rcdgen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Print a line for every encoded sprite
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile data files into RCD files
    Build(build::BuildArgs),

    /// Check the schema and data files without writing output
    Validate(validate::ValidateArgs),

    /// List the blocks of an RCD file
    Inspect(inspect::InspectArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Command line spelling of [`EmptySprite`].
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptySpriteArg {
    /// Store no block; the reference is 0
    Omit,
    /// Store an uncropped block with empty lines
    Blank,
}

impl From<EmptySpriteArg> for EmptySprite {
    fn from(arg: EmptySpriteArg) -> Self {
        match arg {
            EmptySpriteArg::Omit => EmptySprite::Omit,
            EmptySpriteArg::Blank => EmptySprite::Blank,
        }
    }
}

/// Project options shared by `build` and `validate`.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Data files or directories (default: from rcdgen.yaml)
    pub data: Vec<PathBuf>,

    /// Project directory holding rcdgen.yaml
    #[arg(long, short = 'C', default_value = ".")]
    pub project: PathBuf,

    /// Schema file (overrides rcdgen.yaml)
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// What to store for fully transparent sprites
    #[arg(long, value_enum)]
    pub empty_sprites: Option<EmptySpriteArg>,

    /// Palette index of transparent pixels
    #[arg(long)]
    pub transparent: Option<u8>,
}

/// A project with command line overrides applied.
#[derive(Debug)]
pub struct ProjectSetup {
    pub schema: PathBuf,
    pub output_dir: PathBuf,
    pub manifest: Manifest,
    pub data_files: Vec<PathBuf>,
}

impl ProjectArgs {
    /// Discover the project and apply the flags given on the command line.
    pub fn setup(&self) -> Result<ProjectSetup> {
        let project = discover(&self.project)?;

        let schema = self.schema.clone().unwrap_or_else(|| project.schema_path());
        let output_dir = project.output_dir();
        let data_files = if self.data.is_empty() {
            project.data_files
        } else {
            let sources: Vec<String> = self
                .data
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            scan_sources(&sources, Path::new(""), &project.manifest)
        };

        let mut manifest = project.manifest;
        if let Some(mode) = self.empty_sprites {
            manifest.empty_sprites = mode.into();
        }
        if let Some(index) = self.transparent {
            manifest.transparent = index;
        }

        Ok(ProjectSetup {
            schema,
            output_dir,
            manifest,
            data_files,
        })
    }
}
