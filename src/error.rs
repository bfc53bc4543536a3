use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while loading or resolving a schema.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Block '{0}' is not defined in the schema")]
    #[diagnostic(code(rcdgen::schema::unknown_magic))]
    UnknownMagic(String),

    #[error("Version {version} of block '{magic}' is not supported (schema allows {min}..={max})")]
    #[diagnostic(code(rcdgen::schema::version))]
    UnsupportedVersion {
        magic: String,
        version: u32,
        min: u32,
        max: u32,
    },

    #[error("Field '{field}' appears more than once in version {version} of block '{magic}'")]
    #[diagnostic(
        code(rcdgen::schema::duplicate_field),
        help("Give the fields distinct names or non-overlapping version windows")
    )]
    DuplicateField {
        magic: String,
        version: u32,
        field: String,
    },

    #[error("Unknown type '{0}'")]
    #[diagnostic(
        code(rcdgen::schema::unknown_type),
        help("Use a builtin type (int8..uint32, sprite, block, text, image_data) or declare it first")
    )]
    UnknownType(String),

    #[error("Type '{0}' is already registered")]
    #[diagnostic(code(rcdgen::schema::duplicate_type))]
    DuplicateType(String),

    #[error("Block '{0}' is defined more than once")]
    #[diagnostic(code(rcdgen::schema::duplicate_block))]
    DuplicateBlock(String),

    #[error("Invalid magic '{0}': expected exactly 4 ASCII characters")]
    #[diagnostic(code(rcdgen::schema::magic))]
    InvalidMagic(String),

    #[error("Invalid definition of '{name}': {message}")]
    #[diagnostic(code(rcdgen::schema::definition))]
    InvalidDefinition { name: String, message: String },
}

/// Errors raised while converting a bound value for its declared type.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("Cannot parse '{text}' as {type_name}")]
    #[diagnostic(code(rcdgen::value::parse))]
    Parse { text: String, type_name: String },

    #[error("Value {value} is out of range for {type_name} ({min}..={max})")]
    #[diagnostic(code(rcdgen::value::range))]
    OutOfRange {
        value: i64,
        type_name: String,
        min: i64,
        max: i64,
    },

    #[error("Unknown symbol '{symbol}' for enumeration '{enumeration}'")]
    #[diagnostic(code(rcdgen::value::symbol))]
    UnknownSymbol { symbol: String, enumeration: String },

    #[error("Bitfield '{field}' occurs {count} time(s), expected {min}..={max}")]
    #[diagnostic(code(rcdgen::value::occurrence))]
    OccurrenceCount {
        field: String,
        count: usize,
        min: u32,
        max: u32,
    },

    #[error("Bitset '{bitset}' has no bitfield named '{field}'")]
    #[diagnostic(code(rcdgen::value::bitfield))]
    UnknownBitField { bitset: String, field: String },

    #[error("Expected {expected} for a field of type {type_name}")]
    #[diagnostic(code(rcdgen::value::shape))]
    Mismatch { expected: String, type_name: String },

    #[error("Sprite region {x},{y} {width}x{height} lies outside the {image_width}x{image_height} bitmap")]
    #[diagnostic(code(rcdgen::value::region))]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    #[error("Block {reference} does not exist, the file holds {blocks} block(s) so far")]
    #[diagnostic(
        code(rcdgen::value::reference),
        help("A block can only refer to blocks listed before it in the same output file")
    )]
    DanglingReference { reference: u32, blocks: usize },

    #[error("Invalid text: {0}")]
    #[diagnostic(code(rcdgen::value::text))]
    Text(String),

    #[error("Invalid sprite grid: {0}")]
    #[diagnostic(code(rcdgen::value::grid))]
    Grid(String),
}

/// Internal inconsistencies between a block's declared fields and its values.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("Field '{field}' of block '{magic}' has no value")]
    #[diagnostic(code(rcdgen::consistency::missing_value))]
    MissingValue { magic: String, field: String },

    #[error("Block '{magic}' does not declare a field named '{field}'")]
    #[diagnostic(code(rcdgen::consistency::unknown_field))]
    UnknownField { magic: String, field: String },

    #[error("Value does not match its declared type {type_name}")]
    #[diagnostic(code(rcdgen::consistency::shape))]
    ValueShape { type_name: String },

    #[error("Block '{magic}' wrote {written} bytes but declared {declared}")]
    #[diagnostic(code(rcdgen::consistency::length))]
    LengthMismatch {
        magic: String,
        declared: usize,
        written: usize,
    },

    #[error("Block '{magic}' payload of {size} bytes does not fit a 32 bit length")]
    #[diagnostic(code(rcdgen::consistency::too_large))]
    TooLarge { magic: String, size: usize },
}

/// Errors raised while reading an existing RCD file.
#[derive(Error, Diagnostic, Debug)]
pub enum ReadError {
    #[error("Invalid file magic {0:?}")]
    #[diagnostic(code(rcdgen::read::magic))]
    InvalidMagic([u8; 4]),

    #[error("Unsupported file version: {0}")]
    #[diagnostic(code(rcdgen::read::version))]
    UnsupportedVersion(u32),

    #[error("Corrupt data: {0}")]
    #[diagnostic(code(rcdgen::read::corrupt))]
    Corrupt(String),

    #[error("IO error: {0}")]
    #[diagnostic(code(rcdgen::read::io))]
    Io(#[from] std::io::Error),
}

/// Main error type for rcdgen operations
#[derive(Error, Diagnostic, Debug)]
pub enum RcdError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Read(#[from] ReadError),

    #[error("IO error: {0}")]
    #[diagnostic(code(rcdgen::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(rcdgen::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(rcdgen::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Validation error: {message}")]
    #[diagnostic(code(rcdgen::validate))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("In block '{magic}', field '{field}': {source}")]
    #[diagnostic(code(rcdgen::field))]
    Field {
        magic: String,
        field: String,
        #[source]
        source: Box<RcdError>,
    },
}

impl RcdError {
    /// Attach the block and field being converted to an error.
    pub fn in_field(self, magic: impl Into<String>, field: impl Into<String>) -> Self {
        RcdError::Field {
            magic: magic.into(),
            field: field.into(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, RcdError>;
