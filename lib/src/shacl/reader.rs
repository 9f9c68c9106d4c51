//! Ingest adapter: builds a [`ShaclSchema`] from an RDF triple bag.
//!
//! Turtle parsing itself is delegated to `oxrdfio`; this module only walks
//! the resulting graph, grouping triples per shape subject and pattern
//! matching on the SHACL predicate set.

use std::collections::HashSet;

use oxrdf::vocab::rdf;
use oxrdf::{Graph, NamedOrBlankNode, SubjectRef, Term, TermRef, Triple};
use oxrdfio::{RdfFormat, RdfParser};

use crate::error::{ShaclGraphError, ShaclParseError};
use crate::named_nodes::SHACL;
use crate::types::{NodeKind, Path, PrefixTable, ValueSetItem};

use super::{NodeShape, PropertyShape, ShaclSchema};

/// Parses a Turtle document into a SHACL schema.
///
/// The document's own prefix declarations are layered over the standard
/// SHACL prefix set.
pub fn parse_shacl(turtle: &str) -> Result<ShaclSchema, ShaclParseError> {
    let mut graph = Graph::new();
    let mut reader = RdfParser::from_format(RdfFormat::Turtle).for_reader(turtle.as_bytes());
    for quad in &mut reader {
        let quad = quad?;
        let triple = Triple::new(quad.subject, quad.predicate, quad.object);
        graph.insert(&triple);
    }
    let mut prefixes = PrefixTable::shacl_defaults();
    for (name, iri) in reader.prefixes() {
        prefixes.insert(name, iri);
    }
    Ok(shacl_from_graph(&graph, prefixes)?)
}

/// Builds a SHACL schema from an already-parsed triple bag.
///
/// Shape subjects are every `s` with `(s, rdf:type, sh:NodeShape)` plus
/// every IRI that appears as the object of `sh:node`, in graph encounter
/// order.
pub fn shacl_from_graph(
    graph: &Graph,
    prefixes: PrefixTable,
) -> Result<ShaclSchema, ShaclGraphError> {
    let sh = SHACL::new();

    let mut subjects: Vec<NamedOrBlankNode> = Vec::new();
    let mut seen: HashSet<NamedOrBlankNode> = HashSet::new();
    for triple in graph.iter() {
        if triple.predicate == rdf::TYPE
            && triple.object == TermRef::NamedNode(sh.node_shape.as_ref())
        {
            if let Some(subject) = owned_subject(triple.subject) {
                if seen.insert(subject.clone()) {
                    subjects.push(subject);
                }
            }
        }
    }
    // sh:node may point at shapes that carry no explicit rdf:type.
    for triple in graph.iter() {
        if triple.predicate == sh.node.as_ref() {
            if let TermRef::NamedNode(n) = triple.object {
                let subject = NamedOrBlankNode::from(n.into_owned());
                if seen.insert(subject.clone()) {
                    subjects.push(subject);
                }
            }
        }
    }

    let mut shapes = Vec::with_capacity(subjects.len());
    for subject in subjects {
        shapes.push(read_node_shape(graph, &sh, subject)?);
    }

    Ok(ShaclSchema { prefixes, shapes })
}

fn read_node_shape(
    graph: &Graph,
    sh: &SHACL,
    id: NamedOrBlankNode,
) -> Result<NodeShape, ShaclGraphError> {
    let subject: SubjectRef<'_> = match &id {
        NamedOrBlankNode::NamedNode(n) => n.as_ref().into(),
        NamedOrBlankNode::BlankNode(b) => b.as_ref().into(),
    };
    let mut shape = NodeShape::new(id.clone());

    for object in graph.objects_for_subject_predicate(subject, sh.target_class.as_ref()) {
        if let TermRef::NamedNode(n) = object {
            shape.target_classes.push(n.into_owned());
        }
    }
    for object in graph.objects_for_subject_predicate(subject, sh.target_node.as_ref()) {
        if let TermRef::NamedNode(n) = object {
            shape.target_nodes.push(n.into_owned());
        }
    }

    if let Some(TermRef::Literal(lit)) =
        graph.object_for_subject_predicate(subject, sh.closed.as_ref())
    {
        shape.closed = lit.value() == "true";
    }

    if let Some(head) = graph.object_for_subject_predicate(subject, sh.ignored_properties.as_ref())
    {
        for item in read_list(graph, head)? {
            if let Term::NamedNode(n) = item {
                shape.ignored_properties.push(n);
            }
        }
    }

    for object in graph.objects_for_subject_predicate(subject, sh.property.as_ref()) {
        match object {
            TermRef::NamedNode(n) => {
                shape.properties.push(read_property_shape(graph, sh, n.into())?);
            }
            TermRef::BlankNode(b) => {
                shape.properties.push(read_property_shape(graph, sh, b.into())?);
            }
            _ => {}
        }
    }

    Ok(shape)
}

fn read_property_shape(
    graph: &Graph,
    sh: &SHACL,
    node: SubjectRef<'_>,
) -> Result<PropertyShape, ShaclGraphError> {
    let path = read_path(graph, sh, node)?;
    let mut property = PropertyShape::new(path);

    if let Some(TermRef::NamedNode(n)) =
        graph.object_for_subject_predicate(node, sh.datatype.as_ref())
    {
        property.datatype = Some(n.into_owned());
    }

    read_class_constraint(graph, sh, node, &mut property)?;

    if let Some(TermRef::NamedNode(n)) = graph.object_for_subject_predicate(node, sh.node.as_ref())
    {
        property.node_ref = Some(n.into_owned());
    }

    if let Some(object) = graph.object_for_subject_predicate(node, sh.node_kind.as_ref()) {
        match object {
            TermRef::NamedNode(n) => {
                property.node_kind = Some(NodeKind::from_shacl_term(n).ok_or_else(|| {
                    ShaclGraphError::UnrecognizedNodeKind {
                        value: n.to_string(),
                    }
                })?);
            }
            other => {
                return Err(ShaclGraphError::UnrecognizedNodeKind {
                    value: other.to_string(),
                })
            }
        }
    }

    property.min_count = read_count(graph, node, sh.min_count.as_ref())?;
    property.max_count = read_count(graph, node, sh.max_count.as_ref())?;

    if let Some(TermRef::Literal(lit)) =
        graph.object_for_subject_predicate(node, sh.pattern.as_ref())
    {
        property.pattern = Some(lit.value().to_string());
    }

    if let Some(object) = graph.object_for_subject_predicate(node, sh.has_value.as_ref()) {
        property.has_value = Some(term_to_item(object.into_owned(), "sh:hasValue")?);
    }

    if let Some(head) = graph.object_for_subject_predicate(node, sh.in_list.as_ref()) {
        let mut items = Vec::new();
        for term in read_list(graph, head)? {
            items.push(term_to_item(term, "sh:in")?);
        }
        property.in_values = Some(items);
    }

    Ok(property)
}

fn read_path(graph: &Graph, sh: &SHACL, node: SubjectRef<'_>) -> Result<Path, ShaclGraphError> {
    match graph.object_for_subject_predicate(node, sh.path.as_ref()) {
        Some(TermRef::NamedNode(n)) => Ok(Path::Direct(n.into_owned())),
        Some(TermRef::BlankNode(b)) => {
            match graph.object_for_subject_predicate(b, sh.inverse_path.as_ref()) {
                Some(TermRef::NamedNode(n)) => Ok(Path::Inverse(n.into_owned())),
                _ => Err(ShaclGraphError::UnsupportedPath {
                    shape: node.to_string(),
                }),
            }
        }
        Some(_) => Err(ShaclGraphError::UnsupportedPath {
            shape: node.to_string(),
        }),
        None => Err(ShaclGraphError::MissingPath {
            shape: node.to_string(),
        }),
    }
}

/// Reads `sh:class` and `sh:or`, in either of the two published spellings:
/// `sh:or ( [ sh:class A ] [ sh:class B ] )` on the property shape, or the
/// YAGO form `sh:class [ sh:or ( A B ) ]`.
fn read_class_constraint(
    graph: &Graph,
    sh: &SHACL,
    node: SubjectRef<'_>,
    property: &mut PropertyShape,
) -> Result<(), ShaclGraphError> {
    if let Some(head) = graph.object_for_subject_predicate(node, sh.or_list.as_ref()) {
        let classes = read_or_members(graph, sh, head)?;
        if !classes.is_empty() {
            property.or_classes = Some(classes);
            return Ok(());
        }
    }

    match graph.object_for_subject_predicate(node, sh.class.as_ref()) {
        Some(TermRef::NamedNode(n)) => {
            property.class_ref = Some(n.into_owned());
        }
        Some(TermRef::BlankNode(b)) => {
            if let Some(head) = graph.object_for_subject_predicate(b, sh.or_list.as_ref()) {
                let classes = read_or_members(graph, sh, head)?;
                if !classes.is_empty() {
                    property.or_classes = Some(classes);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn read_or_members(
    graph: &Graph,
    sh: &SHACL,
    head: TermRef<'_>,
) -> Result<Vec<oxrdf::NamedNode>, ShaclGraphError> {
    let mut classes = Vec::new();
    for member in read_list(graph, head)? {
        match member {
            Term::NamedNode(n) => classes.push(n),
            Term::BlankNode(b) => {
                if let Some(TermRef::NamedNode(n)) =
                    graph.object_for_subject_predicate(b.as_ref(), sh.class.as_ref())
                {
                    classes.push(n.into_owned());
                }
            }
            _ => {}
        }
    }
    Ok(classes)
}

fn read_count(
    graph: &Graph,
    node: SubjectRef<'_>,
    predicate: oxrdf::NamedNodeRef<'_>,
) -> Result<Option<u64>, ShaclGraphError> {
    match graph.object_for_subject_predicate(node, predicate) {
        Some(TermRef::Literal(lit)) => {
            let count = lit
                .value()
                .parse::<u64>()
                .map_err(|_| ShaclGraphError::InvalidLiteral {
                    property: predicate.to_string(),
                    value: lit.value().to_string(),
                })?;
            Ok(Some(count))
        }
        Some(other) => Err(ShaclGraphError::InvalidLiteral {
            property: predicate.to_string(),
            value: other.to_string(),
        }),
        None => Ok(None),
    }
}

/// Walks an `rdf:first`/`rdf:rest` chain, guarding against cycles and
/// dangling cells.
fn read_list(graph: &Graph, head: TermRef<'_>) -> Result<Vec<Term>, ShaclGraphError> {
    let mut items = Vec::new();
    let mut current = head.into_owned();
    let mut visited: HashSet<Term> = HashSet::new();

    loop {
        if let Term::NamedNode(n) = &current {
            if n.as_ref() == rdf::NIL {
                return Ok(items);
            }
        }
        if !visited.insert(current.clone()) {
            return Err(ShaclGraphError::MalformedList {
                node: head.to_string(),
            });
        }
        let cell = match &current {
            Term::NamedNode(n) => SubjectRef::from(n.as_ref()),
            Term::BlankNode(b) => SubjectRef::from(b.as_ref()),
            _ => {
                return Err(ShaclGraphError::MalformedList {
                    node: head.to_string(),
                })
            }
        };
        let first = graph
            .object_for_subject_predicate(cell, rdf::FIRST)
            .ok_or_else(|| ShaclGraphError::MalformedList {
                node: head.to_string(),
            })?
            .into_owned();
        let rest = graph
            .object_for_subject_predicate(cell, rdf::REST)
            .ok_or_else(|| ShaclGraphError::MalformedList {
                node: head.to_string(),
            })?
            .into_owned();
        items.push(first);
        current = rest;
    }
}

fn term_to_item(term: Term, property: &str) -> Result<ValueSetItem, ShaclGraphError> {
    match term {
        Term::NamedNode(n) => Ok(ValueSetItem::Iri(n)),
        Term::Literal(lit) => Ok(ValueSetItem::Literal(lit)),
        other => Err(ShaclGraphError::InvalidLiteral {
            property: property.to_string(),
            value: other.to_string(),
        }),
    }
}

fn owned_subject(subject: SubjectRef<'_>) -> Option<NamedOrBlankNode> {
    match subject {
        SubjectRef::NamedNode(n) => Some(n.into_owned().into()),
        SubjectRef::BlankNode(b) => Some(b.into_owned().into()),
        _ => None,
    }
}
