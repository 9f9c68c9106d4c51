use std::fmt;

/// Position of a token in ShExC source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Absolute byte offset from the start of the input.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Error raised while tokenizing or parsing ShExC text.
///
/// The parser fails fast: the first error is reported with the position of
/// the offending token and no recovery is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ShexSyntaxError {
    #[error("unterminated string literal at {0}")]
    UnterminatedString(Position),

    #[error("unterminated IRI reference at {0}")]
    UnterminatedIriRef(Position),

    #[error("invalid escape sequence '\\{escape}' at {position}")]
    BadEscape { escape: char, position: Position },

    #[error("unexpected character '{character}' at {position}")]
    InvalidToken { character: char, position: Position },

    #[error("expected {expected}, found {found} at {position}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: Position,
    },

    #[error("invalid cardinality at {position}: {message}")]
    InvalidCardinality { message: String, position: Position },

    #[error("unknown keyword '{keyword}' at {position}")]
    UnknownKeyword { keyword: String, position: Position },

    #[error("unknown prefix '{prefix}:' at {position}")]
    UnknownPrefix { prefix: String, position: Position },

    #[error("duplicate shape id <{id}> at {position}")]
    DuplicateShapeId { id: String, position: Position },

    #[error("unexpected end of input at {0}")]
    UnexpectedEof(Position),
}

/// Structural error raised while building a SHACL model from a triple bag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ShaclGraphError {
    #[error("property shape {shape} has no sh:path")]
    MissingPath { shape: String },

    #[error("unsupported sh:path structure on property shape {shape}")]
    UnsupportedPath { shape: String },

    #[error("malformed RDF list starting at {node}")]
    MalformedList { node: String },

    #[error("unrecognized sh:nodeKind value {value}")]
    UnrecognizedNodeKind { value: String },

    #[error("invalid value for {property}: {value}")]
    InvalidLiteral { property: String, value: String },
}

/// Error raised by [`parse_shacl`](crate::parse_shacl): either the Turtle
/// layer rejected the input or the triple bag did not form a valid shapes
/// graph.
#[derive(Debug, thiserror::Error)]
pub enum ShaclParseError {
    #[error(transparent)]
    Turtle(#[from] oxrdfio::RdfParseError),

    #[error(transparent)]
    Graph(#[from] ShaclGraphError),
}

/// A lossy-conversion notice.
///
/// Converters never fail on a well-formed model; constructs without a
/// counterpart in the target language are dropped and reported here (and via
/// `log::warn!`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// An `sh:pattern` that is not an IRI-prefix pattern (`^<iri>`) has no
    /// ShEx equivalent.
    DroppedPattern { shape: String, pattern: String },
    /// A construct with no counterpart in the target language.
    UnsupportedConstruct { shape: String, construct: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DroppedPattern { shape, pattern } => {
                write!(f, "{}: dropped non-stem pattern {:?}", shape, pattern)
            }
            Warning::UnsupportedConstruct { shape, construct } => {
                write!(f, "{}: {} has no equivalent and was dropped", shape, construct)
            }
        }
    }
}
