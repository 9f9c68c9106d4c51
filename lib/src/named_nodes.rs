use oxrdf::NamedNode;

/// The SHACL vocabulary terms recognized by the reader and emitted by the
/// writer.
#[derive(Debug)]
pub struct SHACL {
    pub node_shape: NamedNode,
    pub property: NamedNode,
    pub path: NamedNode,
    pub inverse_path: NamedNode,
    pub target_class: NamedNode,
    pub target_node: NamedNode,
    pub datatype: NamedNode,
    pub class: NamedNode,
    pub node: NamedNode,
    pub node_kind: NamedNode,
    pub min_count: NamedNode,
    pub max_count: NamedNode,
    pub has_value: NamedNode,
    pub in_list: NamedNode,
    pub or_list: NamedNode,
    pub pattern: NamedNode,
    pub closed: NamedNode,
    pub ignored_properties: NamedNode,
    // sh:nodeKind values
    pub iri: NamedNode,
    pub blank_node: NamedNode,
    pub literal: NamedNode,
    pub blank_node_or_iri: NamedNode,
    pub blank_node_or_literal: NamedNode,
    pub iri_or_literal: NamedNode,
}

impl SHACL {
    pub fn new() -> Self {
        Self {
            node_shape: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#NodeShape"),
            property: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#property"),
            path: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#path"),
            inverse_path: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#inversePath"),
            target_class: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#targetClass"),
            target_node: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#targetNode"),
            datatype: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#datatype"),
            class: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#class"),
            node: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#node"),
            node_kind: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#nodeKind"),
            min_count: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#minCount"),
            max_count: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#maxCount"),
            has_value: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#hasValue"),
            in_list: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#in"),
            or_list: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#or"),
            pattern: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#pattern"),
            closed: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#closed"),
            ignored_properties: NamedNode::new_unchecked(
                "http://www.w3.org/ns/shacl#ignoredProperties",
            ),
            iri: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#IRI"),
            blank_node: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#BlankNode"),
            literal: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#Literal"),
            blank_node_or_iri: NamedNode::new_unchecked(
                "http://www.w3.org/ns/shacl#BlankNodeOrIRI",
            ),
            blank_node_or_literal: NamedNode::new_unchecked(
                "http://www.w3.org/ns/shacl#BlankNodeOrLiteral",
            ),
            iri_or_literal: NamedNode::new_unchecked("http://www.w3.org/ns/shacl#IRIOrLiteral"),
        }
    }
}

impl Default for SHACL {
    fn default() -> Self {
        Self::new()
    }
}

/// The Wikidata "instance of" property, treated like `rdf:type` when
/// promoting type constraints to `sh:targetClass`.
pub(crate) fn wdt_instance_of() -> NamedNode {
    NamedNode::new_unchecked("http://www.wikidata.org/prop/direct/P31")
}
