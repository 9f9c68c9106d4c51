//! In-memory model of a ShEx schema.
//!
//! The shape algebra is deliberately flat: a shape body is either a single
//! triple constraint or a conjunction of them, and a value expression is a
//! node constraint, a shape reference, or a parenthesized disjunction of
//! shape references. This covers the schemas the converters produce and the
//! published YAGO/Wikidata entity schemas they consume.

mod lexer;
mod parser;
mod writer;

pub use parser::parse_shex;
pub use writer::emit_shex;

use oxrdf::NamedNode;

use crate::types::{Cardinality, NodeKind, PrefixTable, ValueSetItem};

/// A parsed ShEx schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShexSchema {
    pub prefixes: PrefixTable,
    pub base: Option<String>,
    /// The `start = @<Shape>` declaration, when present.
    pub start: Option<NamedNode>,
    pub shapes: Vec<Shape>,
}

impl ShexSchema {
    /// Looks a shape up by its id.
    pub fn shape(&self, id: &NamedNode) -> Option<&Shape> {
        self.shapes.iter().find(|s| &s.id == id)
    }
}

/// A named shape declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: NamedNode,
    /// Predicates listed after `EXTRA`.
    pub extra: Vec<NamedNode>,
    pub closed: bool,
    pub expression: Option<TripleExpression>,
}

impl Shape {
    pub fn new(id: NamedNode) -> Self {
        Shape {
            id,
            extra: Vec::new(),
            closed: false,
            expression: None,
        }
    }

    /// The flat list of triple constraints in this shape's body.
    pub fn triple_constraints(&self) -> &[TripleConstraint] {
        match &self.expression {
            None => &[],
            Some(TripleExpression::Constraint(tc)) => std::slice::from_ref(tc),
            Some(TripleExpression::EachOf(tcs)) => tcs,
        }
    }
}

/// A shape body: one constraint, or a `;`-separated conjunction.
#[derive(Debug, Clone, PartialEq)]
pub enum TripleExpression {
    Constraint(TripleConstraint),
    EachOf(Vec<TripleConstraint>),
}

impl TripleExpression {
    /// Wraps a constraint list, collapsing the singleton case.
    pub fn from_constraints(mut constraints: Vec<TripleConstraint>) -> Option<Self> {
        match constraints.len() {
            0 => None,
            1 => Some(TripleExpression::Constraint(constraints.remove(0))),
            _ => Some(TripleExpression::EachOf(constraints)),
        }
    }
}

/// A constraint on one predicate within a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TripleConstraint {
    pub predicate: NamedNode,
    /// True for `^predicate` (the focus node is the object).
    pub inverse: bool,
    /// `None` is the `.` wildcard: any value.
    pub value: Option<ValueExpr>,
    pub cardinality: Cardinality,
}

impl TripleConstraint {
    pub fn new(predicate: NamedNode) -> Self {
        TripleConstraint {
            predicate,
            inverse: false,
            value: None,
            cardinality: Cardinality::One,
        }
    }
}

/// The value side of a triple constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    Node(NodeConstraint),
    /// `@<Shape>`
    Ref(NamedNode),
    /// `(@<A> OR @<B> ...)`
    OneOfRefs(Vec<NamedNode>),
}

/// A constraint on the value node itself: node kind, datatype, or a value
/// set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeConstraint {
    pub node_kind: Option<NodeKind>,
    pub datatype: Option<NamedNode>,
    pub values: Option<Vec<ValueSetItem>>,
}

impl NodeConstraint {
    pub fn datatype(datatype: NamedNode) -> Self {
        NodeConstraint {
            datatype: Some(datatype),
            ..Default::default()
        }
    }

    pub fn node_kind(kind: NodeKind) -> Self {
        NodeConstraint {
            node_kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn values(values: Vec<ValueSetItem>) -> Self {
        NodeConstraint {
            values: Some(values),
            ..Default::default()
        }
    }
}
