//! In-memory model of a SHACL shapes graph.
//!
//! Only the subset of SHACL that has a ShEx counterpart is represented:
//! node shapes with class/node targets, and property shapes carrying the
//! constraint components listed on [`PropertyShape`]. Everything is owned
//! data; shapes reference each other by IRI, never by pointer.

mod reader;
mod writer;

pub use reader::{parse_shacl, shacl_from_graph};
pub use writer::{emit_shacl, shacl_to_graph};

use oxrdf::{NamedNode, NamedOrBlankNode};

use crate::types::{NodeKind, Path, PrefixTable, ValueSetItem};

/// A parsed SHACL schema: a prefix table plus node shapes in discovery
/// order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaclSchema {
    pub prefixes: PrefixTable,
    pub shapes: Vec<NodeShape>,
}

impl ShaclSchema {
    /// Looks a node shape up by its id IRI.
    pub fn shape_by_iri(&self, iri: &NamedNode) -> Option<&NodeShape> {
        self.shapes.iter().find(|s| match &s.id {
            NamedOrBlankNode::NamedNode(n) => n == iri,
            NamedOrBlankNode::BlankNode(_) => false,
        })
    }

    /// True when `iri` is the id of a declared node shape.
    pub fn is_shape_id(&self, iri: &NamedNode) -> bool {
        self.shape_by_iri(iri).is_some()
    }
}

/// A `sh:NodeShape` with its targets and property shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeShape {
    /// Shape id: an IRI, or a blank-node label unique within the schema.
    pub id: NamedOrBlankNode,
    pub target_classes: Vec<NamedNode>,
    pub target_nodes: Vec<NamedNode>,
    pub properties: Vec<PropertyShape>,
    pub closed: bool,
    pub ignored_properties: Vec<NamedNode>,
}

impl NodeShape {
    pub fn new(id: impl Into<NamedOrBlankNode>) -> Self {
        NodeShape {
            id: id.into(),
            target_classes: Vec::new(),
            target_nodes: Vec::new(),
            properties: Vec::new(),
            closed: false,
            ignored_properties: Vec::new(),
        }
    }
}

/// A `sh:property` constraint on a single predicate (or its inverse).
///
/// At most one of the value-constraining fields is populated by the
/// converters; the reader stores whatever the graph provides.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyShape {
    pub path: Path,
    pub datatype: Option<NamedNode>,
    pub class_ref: Option<NamedNode>,
    /// `sh:node` reference to another declared shape.
    pub node_ref: Option<NamedNode>,
    pub node_kind: Option<NodeKind>,
    pub min_count: Option<u64>,
    pub max_count: Option<u64>,
    pub pattern: Option<String>,
    pub has_value: Option<ValueSetItem>,
    pub in_values: Option<Vec<ValueSetItem>>,
    /// Classes from an `sh:or` disjunction of class constraints.
    pub or_classes: Option<Vec<NamedNode>>,
}

impl PropertyShape {
    pub fn new(path: Path) -> Self {
        PropertyShape {
            path,
            datatype: None,
            class_ref: None,
            node_ref: None,
            node_kind: None,
            min_count: None,
            max_count: None,
            pattern: None,
            has_value: None,
            in_values: None,
            or_classes: None,
        }
    }
}
