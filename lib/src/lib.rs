//! Bidirectional translator between SHACL and ShEx schemas.
//!
//! SHACL shapes arrive as Turtle and leave as Turtle; ShEx schemas arrive
//! and leave as ShExC compact syntax. In between sit two in-memory models
//! and a pair of converters that reconcile the semantic gaps between the
//! two languages (default cardinalities, class targets versus type value
//! sets, IRI-stem patterns, auxiliary shape synthesis for class
//! references).
//!
//! ```no_run
//! let turtle = std::fs::read_to_string("shapes.ttl")?;
//! let schema = shaclex::parse_shacl(&turtle)?;
//! let (shex, warnings) = shaclex::shacl_to_shex(&schema);
//! for warning in &warnings {
//!     eprintln!("warning: {}", warning);
//! }
//! print!("{}", shaclex::emit_shex(&shex));
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```
//!
//! Translation is a pure function of its input: no shared state, no I/O in
//! the library, and every model is immutable once built. Parsers fail fast
//! with positioned errors; converters never fail on well-formed models and
//! report lossy steps through a [`Warning`] side channel; emitters are
//! total.

pub mod canonical;
mod convert;
mod error;
mod named_nodes;
pub mod shacl;
pub mod shex;
pub mod types;

pub use convert::{shacl_to_shex, shex_to_shacl};
pub use error::{Position, ShaclGraphError, ShaclParseError, ShexSyntaxError, Warning};
pub use shacl::{emit_shacl, parse_shacl, shacl_from_graph, shacl_to_graph, ShaclSchema};
pub use shex::{emit_shex, parse_shex, ShexSchema};

/// Translates SHACL Turtle text to ShExC text in one step.
pub fn translate_shacl_to_shex(turtle: &str) -> Result<(String, Vec<Warning>), ShaclParseError> {
    let schema = parse_shacl(turtle)?;
    let (shex, warnings) = shacl_to_shex(&schema);
    Ok((emit_shex(&shex), warnings))
}

/// Translates ShExC text to SHACL Turtle text in one step.
pub fn translate_shex_to_shacl(text: &str) -> Result<(String, Vec<Warning>), ShexSyntaxError> {
    let schema = parse_shex(text)?;
    let (shacl, warnings) = shex_to_shacl(&schema);
    Ok((emit_shacl(&shacl), warnings))
}
