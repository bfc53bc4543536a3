//! rcdgen - RCD game data compiler
//!
//! A library for compiling schema-described game data and indexed sprite
//! sheets into RCD container files: a typed schema model, a run-length
//! sprite codec and a deduplicating block container.

pub mod cli;
pub mod compile;
pub mod container;
pub mod discovery;
pub mod error;
pub mod output;
pub mod registry;
pub mod render;
pub mod schema;
pub mod sprite;
pub mod types;
pub mod validation;

pub use compile::{BuildOptions, CompiledFile, Compiler, DataFile, SpriteReport};
pub use container::{Block, Container, RcdFile, TextBundle};
pub use discovery::{discover, Manifest, Project};
pub use error::{RcdError, Result};
pub use registry::{RegistryBuilder, TypeRegistry};
pub use schema::{load_schema, parse_schema, BlockDef, Field, Magic, Schema};
pub use sprite::{EmptySprite, IndexedBitmap, SpriteImage, SpriteRegion};
pub use types::{BlockRef, DataType, FieldValue, NumericType, Value};
pub use validation::{Diagnostic, Severity, ValidationResult};
