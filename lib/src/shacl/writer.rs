//! Emits a [`ShaclSchema`] as a triple bag and, through `oxrdfio`, as
//! Turtle text.
//!
//! Blank-node labels are allocated from a per-schema counter so the same
//! model always serializes to the same bytes. Triple order within a subject
//! is stable: `rdf:type` first, then targets, then `sh:property` with each
//! property-shape body in definition order.

use oxrdf::vocab::{rdf, xsd};
use oxrdf::{BlankNode, Graph, Literal, NamedNode, Subject, Term, Triple};
use oxrdfio::{RdfFormat, RdfSerializer};

use crate::named_nodes::SHACL;
use crate::types::ValueSetItem;

use super::{PropertyShape, ShaclSchema};

/// Builds the triple bag for a SHACL schema.
pub fn shacl_to_graph(schema: &ShaclSchema) -> Graph {
    let mut graph = Graph::new();
    for triple in schema_triples(schema) {
        graph.insert(&triple);
    }
    graph
}

/// Serializes a SHACL schema to Turtle text.
pub fn emit_shacl(schema: &ShaclSchema) -> String {
    let triples = schema_triples(schema);

    let mut serializer = RdfSerializer::from_format(RdfFormat::Turtle);
    for prefix in schema.prefixes.sorted() {
        if NamedNode::new(prefix.iri.as_str()).is_err() {
            log::warn!("skipping prefix {} with invalid IRI {}", prefix.name, prefix.iri);
            continue;
        }
        serializer = serializer
            .with_prefix(prefix.name.as_str(), prefix.iri.as_str())
            .expect("prefix IRI validated above");
    }

    let mut writer = serializer.for_writer(Vec::new());
    for triple in &triples {
        writer
            .serialize_triple(triple)
            .expect("writing to an in-memory buffer cannot fail");
    }
    let bytes = writer
        .finish()
        .expect("writing to an in-memory buffer cannot fail");
    String::from_utf8(bytes).expect("Turtle output is UTF-8")
}

struct TripleSink {
    triples: Vec<Triple>,
    blank_counter: usize,
}

impl TripleSink {
    fn new() -> Self {
        TripleSink {
            triples: Vec::new(),
            blank_counter: 0,
        }
    }

    fn fresh_blank(&mut self) -> BlankNode {
        let node = BlankNode::new_unchecked(format!("b{}", self.blank_counter));
        self.blank_counter += 1;
        node
    }

    fn push(
        &mut self,
        subject: impl Into<Subject>,
        predicate: impl Into<NamedNode>,
        object: impl Into<Term>,
    ) {
        self.triples.push(Triple::new(subject, predicate, object));
    }

    /// Builds an RDF collection and returns its head term.
    fn push_list(&mut self, items: Vec<Term>) -> Term {
        if items.is_empty() {
            return rdf::NIL.into_owned().into();
        }
        let cells: Vec<BlankNode> = items.iter().map(|_| self.fresh_blank()).collect();
        for (i, (cell, item)) in cells.iter().zip(items).enumerate() {
            self.push(cell.clone(), rdf::FIRST.into_owned(), item);
            let rest: Term = match cells.get(i + 1) {
                Some(next) => next.clone().into(),
                None => rdf::NIL.into_owned().into(),
            };
            self.push(cell.clone(), rdf::REST.into_owned(), rest);
        }
        cells[0].clone().into()
    }
}

fn schema_triples(schema: &ShaclSchema) -> Vec<Triple> {
    let sh = SHACL::new();
    let mut sink = TripleSink::new();

    for shape in &schema.shapes {
        let subject: Subject = match &shape.id {
            oxrdf::NamedOrBlankNode::NamedNode(n) => n.clone().into(),
            oxrdf::NamedOrBlankNode::BlankNode(b) => b.clone().into(),
        };

        sink.push(subject.clone(), rdf::TYPE.into_owned(), sh.node_shape.clone());
        for class in &shape.target_classes {
            sink.push(subject.clone(), sh.target_class.clone(), class.clone());
        }
        for node in &shape.target_nodes {
            sink.push(subject.clone(), sh.target_node.clone(), node.clone());
        }
        if shape.closed {
            sink.push(subject.clone(), sh.closed.clone(), Literal::from(true));
        }
        if !shape.ignored_properties.is_empty() {
            let items: Vec<Term> = shape
                .ignored_properties
                .iter()
                .map(|p| p.clone().into())
                .collect();
            let head = sink.push_list(items);
            sink.push(subject.clone(), sh.ignored_properties.clone(), head);
        }

        for property in &shape.properties {
            let node = sink.fresh_blank();
            sink.push(subject.clone(), sh.property.clone(), node.clone());
            push_property_shape(&mut sink, &sh, &node, property);
        }
    }

    sink.triples
}

fn push_property_shape(
    sink: &mut TripleSink,
    sh: &SHACL,
    node: &BlankNode,
    property: &PropertyShape,
) {
    match &property.path {
        crate::types::Path::Direct(p) => {
            sink.push(node.clone(), sh.path.clone(), p.clone());
        }
        crate::types::Path::Inverse(p) => {
            let path_node = sink.fresh_blank();
            sink.push(node.clone(), sh.path.clone(), path_node.clone());
            sink.push(path_node, sh.inverse_path.clone(), p.clone());
        }
    }

    if let Some(datatype) = &property.datatype {
        sink.push(node.clone(), sh.datatype.clone(), datatype.clone());
    }
    if let Some(class) = &property.class_ref {
        sink.push(node.clone(), sh.class.clone(), class.clone());
    }
    if let Some(classes) = &property.or_classes {
        // sh:or ( [ sh:class A ] [ sh:class B ] ... )
        let mut members = Vec::with_capacity(classes.len());
        for class in classes {
            let member = sink.fresh_blank();
            sink.push(member.clone(), sh.class.clone(), class.clone());
            members.push(member.into());
        }
        let head = sink.push_list(members);
        sink.push(node.clone(), sh.or_list.clone(), head);
    }
    if let Some(kind) = property.node_kind {
        sink.push(node.clone(), sh.node_kind.clone(), kind.to_shacl_term());
    }
    if let Some(min) = property.min_count {
        sink.push(node.clone(), sh.min_count.clone(), count_literal(min));
    }
    if let Some(max) = property.max_count {
        sink.push(node.clone(), sh.max_count.clone(), count_literal(max));
    }
    if let Some(value) = &property.has_value {
        sink.push(node.clone(), sh.has_value.clone(), item_to_term(value));
    }
    if let Some(values) = &property.in_values {
        let items: Vec<Term> = values.iter().map(item_to_term).collect();
        let head = sink.push_list(items);
        sink.push(node.clone(), sh.in_list.clone(), head);
    }
    if let Some(pattern) = &property.pattern {
        sink.push(
            node.clone(),
            sh.pattern.clone(),
            Literal::new_simple_literal(pattern),
        );
    }
    if let Some(target) = &property.node_ref {
        sink.push(node.clone(), sh.node.clone(), target.clone());
    }
}

fn count_literal(count: u64) -> Literal {
    Literal::new_typed_literal(count.to_string(), xsd::INTEGER)
}

fn item_to_term(item: &ValueSetItem) -> Term {
    match item {
        ValueSetItem::Iri(n) => n.clone().into(),
        ValueSetItem::Literal(lit) => lit.clone().into(),
        // Stems have no SHACL value form; the converters rewrite them as
        // sh:pattern before emission, so this only serves pathological input.
        ValueSetItem::IriStem(stem) => NamedNode::new_unchecked(stem.clone()).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shacl::{parse_shacl, NodeShape, PropertyShape};
    use crate::types::{Path, PrefixTable};
    use oxrdf::NamedNode;

    fn sample_schema() -> ShaclSchema {
        let mut shape = NodeShape::new(NamedNode::new_unchecked(
            "http://shaclshapes.org/GenderShape",
        ));
        shape
            .target_classes
            .push(NamedNode::new_unchecked("http://example.org/Gender"));

        let mut label = PropertyShape::new(Path::Direct(NamedNode::new_unchecked(
            "http://www.w3.org/2000/01/rdf-schema#label",
        )));
        label.datatype = Some(NamedNode::new_unchecked(
            "http://www.w3.org/2001/XMLSchema#string",
        ));
        label.min_count = Some(1);
        label.max_count = Some(1);
        shape.properties.push(label);

        let mut parent = PropertyShape::new(Path::Inverse(NamedNode::new_unchecked(
            "http://example.org/hasParent",
        )));
        parent.or_classes = Some(vec![
            NamedNode::new_unchecked("http://example.org/City"),
            NamedNode::new_unchecked("http://example.org/Country"),
        ]);
        shape.properties.push(parent);

        ShaclSchema {
            prefixes: PrefixTable::shacl_defaults(),
            shapes: vec![shape],
        }
    }

    #[test]
    fn emitted_turtle_round_trips_through_the_reader() {
        let schema = sample_schema();
        let turtle = emit_shacl(&schema);
        let reparsed = parse_shacl(&turtle).unwrap();

        assert_eq!(reparsed.shapes.len(), 1);
        let shape = &reparsed.shapes[0];
        assert_eq!(shape.target_classes, schema.shapes[0].target_classes);
        assert_eq!(shape.properties.len(), 2);
        // The reader discovers property shapes through the graph index, so
        // compare by path instead of position.
        for expected in &schema.shapes[0].properties {
            let found = shape
                .properties
                .iter()
                .find(|p| p.path == expected.path)
                .unwrap();
            assert_eq!(found, expected);
        }
    }

    #[test]
    fn emission_is_deterministic() {
        let schema = sample_schema();
        assert_eq!(emit_shacl(&schema), emit_shacl(&schema));
    }

    #[test]
    fn graph_contains_node_shape_type_triple() {
        let graph = shacl_to_graph(&sample_schema());
        let sh = SHACL::new();
        let subject = NamedNode::new_unchecked("http://shaclshapes.org/GenderShape");
        assert!(graph.contains(&Triple::new(
            subject,
            rdf::TYPE.into_owned(),
            sh.node_shape.clone()
        )));
    }
}
