use std::fmt;

/// Byte position in a rule source string, used by [`WfcError::ParseError`].
pub type SourcePos = usize;

#[derive(Debug)]
pub enum WfcError {
    /// The adjacency rule grammar rejected a string at the given byte position.
    ParseError { position: SourcePos, message: String },
    /// The catalog/topology pairing is inconsistent (duplicate names, wrong edge count, ...).
    ConfigError(String),
    /// A cell's candidate set became empty during propagation.
    ///
    /// Never escapes a public call: the backtracker always consumes it, converting
    /// it into either a successful rollback, `FatalSeed`, or `Unsatisfiable`.
    Contradiction,
    /// A contradiction occurred while committing the initial seed, before any
    /// snapshot existed to roll back to.
    FatalSeed,
    /// The rollback budget (`max_retries`) was exhausted without finding a
    /// consistent assignment.
    Unsatisfiable,
    /// An observer panicked or returned an error from its event callback.
    CallbackFailure(String),
    InvalidTileId(String),
    InvalidDimensions { width: usize, height: usize },
    NoTilesDefined,
    JsonParseError(String),
}

impl fmt::Display for WfcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WfcError::ParseError { position, message } => {
                write!(f, "parse error at position {}: {}", position, message)
            }
            WfcError::ConfigError(msg) => write!(f, "invalid configuration: {}", msg),
            WfcError::Contradiction => write!(f, "contradiction reached, generation failed"),
            WfcError::FatalSeed => write!(f, "initial seed is inconsistent"),
            WfcError::Unsatisfiable => write!(f, "retry budget exhausted, instance appears unsatisfiable"),
            WfcError::CallbackFailure(msg) => write!(f, "event callback failed: {}", msg),
            WfcError::InvalidTileId(id) => write!(f, "invalid tile id: {}", id),
            WfcError::InvalidDimensions { width, height } => {
                write!(f, "invalid dimensions: {}x{}", width, height)
            }
            WfcError::NoTilesDefined => write!(f, "no tiles defined in the catalog"),
            WfcError::JsonParseError(msg) => write!(f, "json parse error: {}", msg),
        }
    }
}

impl std::error::Error for WfcError {}
