use oxrdf::{NamedNode, NamedNodeRef};
use std::fmt;

use crate::named_nodes::SHACL;

/// A single prefix binding: short name -> namespace IRI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    pub name: String,
    pub iri: String,
}

impl Prefix {
    pub fn new(name: impl Into<String>, iri: impl Into<String>) -> Self {
        Prefix {
            name: name.into(),
            iri: iri.into(),
        }
    }
}

/// An ordered table of prefix bindings.
///
/// Expansion resolves `prefix:local` against the table; compaction picks the
/// binding with the longest matching namespace so the most specific prefix
/// wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixTable {
    entries: Vec<Prefix>,
}

impl PrefixTable {
    pub fn new() -> Self {
        PrefixTable {
            entries: Vec::new(),
        }
    }

    /// The prefix set used for emitted SHACL schemas.
    pub fn shacl_defaults() -> Self {
        let mut table = PrefixTable::new();
        table.insert("sh", "http://www.w3.org/ns/shacl#");
        table.insert("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#");
        table.insert("rdfs", "http://www.w3.org/2000/01/rdf-schema#");
        table.insert("xsd", "http://www.w3.org/2001/XMLSchema#");
        table.insert("schema", "http://schema.org/");
        table.insert("owl", "http://www.w3.org/2002/07/owl#");
        table.insert("yago", "http://yago-knowledge.org/resource/");
        table
    }

    /// The prefix set used for emitted ShEx schemas.
    pub fn shex_defaults() -> Self {
        let mut table = PrefixTable::new();
        table.insert("geo", "http://www.opengis.net/ont/geosparql#");
        table.insert("owl", "http://www.w3.org/2002/07/owl#");
        table.insert("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#");
        table.insert("rdfs", "http://www.w3.org/2000/01/rdf-schema#");
        table.insert("schema", "http://schema.org/");
        table.insert("skos", "http://www.w3.org/2004/02/skos/core#");
        table.insert("wd", "http://www.wikidata.org/entity/");
        table.insert("wdt", "http://www.wikidata.org/prop/direct/");
        table.insert("xsd", "http://www.w3.org/2001/XMLSchema#");
        table.insert("yago", "http://yago-knowledge.org/resource/");
        table
    }

    /// Adds a binding, replacing any existing binding with the same name.
    pub fn insert(&mut self, name: impl Into<String>, iri: impl Into<String>) {
        let name = name.into();
        let iri = iri.into();
        if let Some(existing) = self.entries.iter_mut().find(|p| p.name == name) {
            existing.iri = iri;
        } else {
            self.entries.push(Prefix::new(name, iri));
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|p| p.name == name)
    }

    pub fn contains_iri(&self, iri: &str) -> bool {
        self.entries.iter().any(|p| p.iri == iri)
    }

    /// Resolves `prefix:local` to a full IRI, if the prefix is bound.
    pub fn expand(&self, prefix: &str, local: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|p| p.name == prefix)
            .map(|p| format!("{}{}", p.iri, local))
    }

    /// Compacts a full IRI to `prefix:local` against the longest matching
    /// namespace. Returns `None` when no binding matches.
    pub fn compact(&self, iri: &str) -> Option<String> {
        self.entries
            .iter()
            .filter(|p| iri.starts_with(&p.iri))
            .max_by_key(|p| p.iri.len())
            .map(|p| format!("{}:{}", p.name, &iri[p.iri.len()..]))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prefix> {
        self.entries.iter()
    }

    /// Bindings in lexicographic prefix-name order, for deterministic output.
    pub fn sorted(&self) -> Vec<&Prefix> {
        let mut entries: Vec<&Prefix> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The `sh:nodeKind` value space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Iri,
    BlankNode,
    Literal,
    BlankNodeOrIri,
    BlankNodeOrLiteral,
    IriOrLiteral,
}

impl NodeKind {
    /// Maps a `sh:nodeKind` object IRI to a node kind.
    pub fn from_shacl_term(term: NamedNodeRef<'_>) -> Option<Self> {
        let sh = SHACL::new();
        if term == sh.iri.as_ref() {
            Some(NodeKind::Iri)
        } else if term == sh.blank_node.as_ref() {
            Some(NodeKind::BlankNode)
        } else if term == sh.literal.as_ref() {
            Some(NodeKind::Literal)
        } else if term == sh.blank_node_or_iri.as_ref() {
            Some(NodeKind::BlankNodeOrIri)
        } else if term == sh.blank_node_or_literal.as_ref() {
            Some(NodeKind::BlankNodeOrLiteral)
        } else if term == sh.iri_or_literal.as_ref() {
            Some(NodeKind::IriOrLiteral)
        } else {
            None
        }
    }

    /// The `sh:nodeKind` object IRI for this node kind.
    pub fn to_shacl_term(self) -> NamedNode {
        let sh = SHACL::new();
        match self {
            NodeKind::Iri => sh.iri,
            NodeKind::BlankNode => sh.blank_node,
            NodeKind::Literal => sh.literal,
            NodeKind::BlankNodeOrIri => sh.blank_node_or_iri,
            NodeKind::BlankNodeOrLiteral => sh.blank_node_or_literal,
            NodeKind::IriOrLiteral => sh.iri_or_literal,
        }
    }

    /// The ShExC keyword for this node kind, where one exists.
    ///
    /// `BlankNodeOrLiteral` and `IriOrLiteral` have no compact-syntax
    /// spelling and serialize as the `.` wildcard.
    pub fn shex_keyword(self) -> Option<&'static str> {
        match self {
            NodeKind::Iri => Some("IRI"),
            NodeKind::Literal => Some("LITERAL"),
            NodeKind::BlankNode => Some("BNODE"),
            NodeKind::BlankNodeOrIri => Some("NONLITERAL"),
            NodeKind::BlankNodeOrLiteral | NodeKind::IriOrLiteral => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Iri => "IRI",
            NodeKind::BlankNode => "BlankNode",
            NodeKind::Literal => "Literal",
            NodeKind::BlankNodeOrIri => "BlankNodeOrIRI",
            NodeKind::BlankNodeOrLiteral => "BlankNodeOrLiteral",
            NodeKind::IriOrLiteral => "IRIOrLiteral",
        };
        write!(f, "{}", name)
    }
}

/// A ShEx repetition count.
///
/// The abbreviated forms and the braced range are kept apart so the emitter
/// can reproduce the distinction between `*` and an explicit `{0,*}`; the
/// `min`/`max` accessors expose the plain bounds for semantic comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Exactly one; prints no suffix.
    One,
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
    /// `{min}`, `{min,max}` or `{min,*}`; `max == None` is unbounded.
    Range { min: u64, max: Option<u64> },
}

impl Cardinality {
    pub fn min(&self) -> u64 {
        match self {
            Cardinality::One | Cardinality::OneOrMore => 1,
            Cardinality::Optional | Cardinality::ZeroOrMore => 0,
            Cardinality::Range { min, .. } => *min,
        }
    }

    /// `None` means unbounded.
    pub fn max(&self) -> Option<u64> {
        match self {
            Cardinality::One | Cardinality::Optional => Some(1),
            Cardinality::ZeroOrMore | Cardinality::OneOrMore => None,
            Cardinality::Range { max, .. } => *max,
        }
    }

    /// Builds the ShEx cardinality for a pair of SHACL count constraints.
    ///
    /// SHACL's implicit cardinality is `{0,*}`; the mapping keeps track of
    /// which of the two counts were actually present so that a fully
    /// implicit pair round-trips to the explicit `{0,*}` range rather than
    /// the `*` abbreviation.
    pub fn from_counts(min_count: Option<u64>, max_count: Option<u64>) -> Self {
        match (min_count, max_count) {
            (None, None) => Cardinality::Range { min: 0, max: None },
            (Some(0), None) => Cardinality::ZeroOrMore,
            (Some(1), None) => Cardinality::OneOrMore,
            (Some(min), None) => Cardinality::Range { min, max: None },
            (None | Some(0), Some(1)) => Cardinality::Optional,
            (Some(1), Some(1)) => Cardinality::One,
            (min, Some(max)) => Cardinality::Range {
                min: min.unwrap_or(0),
                max: Some(max),
            },
        }
    }

    /// The inverse of [`Cardinality::from_counts`]: the SHACL count pair
    /// this cardinality stands for. The explicit `{0,*}` range maps back to
    /// a fully implicit pair.
    pub fn to_counts(&self) -> (Option<u64>, Option<u64>) {
        match self {
            Cardinality::One => (Some(1), Some(1)),
            Cardinality::Optional => (Some(0), Some(1)),
            Cardinality::ZeroOrMore => (Some(0), None),
            Cardinality::OneOrMore => (Some(1), None),
            Cardinality::Range { min: 0, max: None } => (None, None),
            Cardinality::Range { min, max } => (Some(*min), *max),
        }
    }

    /// True when the semantics are exactly one occurrence.
    pub fn is_single_required(&self) -> bool {
        self.min() == 1 && self.max() == Some(1)
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::One
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::One => Ok(()),
            Cardinality::Optional => write!(f, "?"),
            Cardinality::ZeroOrMore => write!(f, "*"),
            Cardinality::OneOrMore => write!(f, "+"),
            Cardinality::Range { min, max: None } => write!(f, "{{{},*}}", min),
            Cardinality::Range {
                min,
                max: Some(max),
            } => {
                if min == max {
                    write!(f, "{{{}}}", min)
                } else {
                    write!(f, "{{{},{}}}", min, max)
                }
            }
        }
    }
}

/// A SHACL property path, restricted to single predicates and their
/// inverses. Nested paths (sequences, alternatives, repetitions) are not
/// modeled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Path {
    Direct(NamedNode),
    Inverse(NamedNode),
}

impl Path {
    pub fn predicate(&self) -> &NamedNode {
        match self {
            Path::Direct(p) | Path::Inverse(p) => p,
        }
    }

    pub fn is_inverse(&self) -> bool {
        matches!(self, Path::Inverse(_))
    }
}

/// A member of a value set (`sh:in` / `sh:hasValue` on the SHACL side,
/// `[ ... ]` on the ShEx side).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueSetItem {
    Iri(NamedNode),
    Literal(oxrdf::Literal),
    /// An IRI prefix pattern, written `<stem>~` in ShExC.
    IriStem(String),
}

/// The final path or fragment segment of an IRI.
pub(crate) fn local_name(iri: &str) -> &str {
    let cut = iri.rfind(['/', '#']).map(|i| i + 1).unwrap_or(0);
    &iri[cut..]
}
