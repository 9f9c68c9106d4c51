//! Canonical JSON intermediate form.
//!
//! A language-neutral, deterministic snapshot of a schema: shapes sorted by
//! name, properties by path, every cardinality explicit. Semantically
//! equivalent SHACL and ShEx inputs produce byte-identical canonical JSON,
//! which makes the form useful for diffing schemas across the two
//! languages.

use std::collections::HashSet;

use oxrdf::vocab::{rdf, xsd};
use oxrdf::{NamedNode, NamedOrBlankNode};
use serde::{Deserialize, Serialize};

use crate::convert::{
    capitalize, pattern_to_stem, stem_to_pattern, strip_shape_suffix, Auxiliaries, ShapeNamer,
};
use crate::shacl::{NodeShape, PropertyShape, ShaclSchema};
use crate::shex::{
    NodeConstraint, Shape, ShexSchema, TripleConstraint, TripleExpression, ValueExpr,
};
use crate::types::{local_name, Cardinality, NodeKind, Path, PrefixTable, ValueSetItem};

/// Sentinel for an unbounded maximum cardinality.
pub const UNBOUNDED: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalCardinality {
    pub min: u64,
    /// `-1` means unbounded.
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanonicalValue {
    Iri(String),
    Literal {
        value: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        datatype: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        language: Option<String>,
    },
}

impl CanonicalValue {
    /// The string the deterministic sort of `inValues` keys on.
    fn sort_key(&self) -> String {
        match self {
            CanonicalValue::Iri(iri) => iri.clone(),
            CanonicalValue::Literal { value, .. } => value.clone(),
        }
    }
}

/// One property constraint; exactly one of the constraint fields is
/// populated (or none, for an unconstrained property).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProperty {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub datatype: Option<String>,
    #[serde(rename = "classRef", skip_serializing_if = "Option::is_none", default)]
    pub class_ref: Option<String>,
    #[serde(rename = "classRefOr", skip_serializing_if = "Option::is_none", default)]
    pub class_ref_or: Option<Vec<String>>,
    #[serde(rename = "nodeKind", skip_serializing_if = "Option::is_none", default)]
    pub node_kind: Option<String>,
    #[serde(rename = "hasValue", skip_serializing_if = "Option::is_none", default)]
    pub has_value: Option<CanonicalValue>,
    #[serde(rename = "inValues", skip_serializing_if = "Option::is_none", default)]
    pub in_values: Option<Vec<CanonicalValue>>,
    #[serde(rename = "iriStem", skip_serializing_if = "Option::is_none", default)]
    pub iri_stem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pattern: Option<String>,
    #[serde(rename = "nodeRef", skip_serializing_if = "Option::is_none", default)]
    pub node_ref: Option<String>,
    pub cardinality: CanonicalCardinality,
}

impl CanonicalProperty {
    fn new(path: String, cardinality: CanonicalCardinality) -> Self {
        CanonicalProperty {
            path,
            datatype: None,
            class_ref: None,
            class_ref_or: None,
            node_kind: None,
            has_value: None,
            in_values: None,
            iri_stem: None,
            pattern: None,
            node_ref: None,
            cardinality,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalShape {
    pub name: String,
    #[serde(rename = "targetClass", skip_serializing_if = "Option::is_none", default)]
    pub target_class: Option<String>,
    pub closed: bool,
    pub properties: Vec<CanonicalProperty>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanonicalSchema {
    pub shapes: Vec<CanonicalShape>,
}

impl CanonicalSchema {
    /// Deterministic JSON rendition.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("canonical schema serializes to JSON")
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Applies the deterministic ordering: shapes by name, properties by
    /// path, `classRefOr` and `inValues` sorted.
    fn normalized(mut self) -> Self {
        for shape in &mut self.shapes {
            for property in &mut shape.properties {
                if let Some(classes) = &mut property.class_ref_or {
                    classes.sort();
                }
                if let Some(values) = &mut property.in_values {
                    values.sort_by_key(|v| v.sort_key());
                }
            }
            shape.properties.sort_by(|a, b| a.path.cmp(&b.path));
        }
        self.shapes.sort_by(|a, b| a.name.cmp(&b.name));
        self
    }
}

/// Normalizes a SHACL schema into the canonical form.
pub fn canonical_from_shacl(schema: &ShaclSchema) -> CanonicalSchema {
    let mut namer = ShapeNamer::new();
    let mut shapes = Vec::with_capacity(schema.shapes.len());

    for shape in &schema.shapes {
        let name = namer.principal_name(shape);
        let target_class = shape.target_classes.first().map(|c| c.as_str().to_string());

        let mut properties = Vec::new();
        for property in &shape.properties {
            if property.path.predicate().as_ref() == rdf::TYPE
                && target_class.is_some()
                && property.has_value.is_some()
            {
                continue;
            }
            properties.push(canonical_property_from_shacl(property));
        }

        shapes.push(CanonicalShape {
            name,
            target_class,
            closed: shape.closed,
            properties,
        });
    }

    CanonicalSchema { shapes }.normalized()
}

fn canonical_property_from_shacl(property: &PropertyShape) -> CanonicalProperty {
    let cardinality = CanonicalCardinality {
        min: property.min_count.unwrap_or(0),
        max: property.max_count.map(|m| m as i64).unwrap_or(UNBOUNDED),
    };
    let mut out = CanonicalProperty::new(property.path.predicate().as_str().to_string(), cardinality);

    if let Some(value) = &property.has_value {
        out.has_value = Some(canonical_value(value));
    } else if let Some(values) = &property.in_values {
        out.in_values = Some(values.iter().map(canonical_value).collect());
    } else if let Some(classes) = &property.or_classes {
        out.class_ref_or = Some(classes.iter().map(|c| c.as_str().to_string()).collect());
    } else if let Some(class) = &property.class_ref {
        out.class_ref = Some(class.as_str().to_string());
    } else if let Some(kind) = property.node_kind {
        out.node_kind = Some(kind.to_string());
    } else if let Some(datatype) = &property.datatype {
        out.datatype = Some(datatype.as_str().to_string());
    } else if let Some(pattern) = &property.pattern {
        match pattern_to_stem(pattern) {
            Some(stem) => out.iri_stem = Some(stem),
            None => out.pattern = Some(pattern.clone()),
        }
    } else if let Some(node) = &property.node_ref {
        out.node_ref = Some(node.as_str().to_string());
    }

    out
}

/// Normalizes a ShEx schema into the canonical form. Auxiliary shapes are
/// inlined at their reference sites and the instance-of constraint is
/// absorbed into `targetClass`.
pub fn canonical_from_shex(schema: &ShexSchema) -> CanonicalSchema {
    let main_names = main_shape_names(schema);
    let mut shapes = Vec::new();

    for shape in &schema.shapes {
        if !main_names.contains(shape.id.as_str()) {
            continue;
        }
        let constraints = shape.triple_constraints();
        let target = constraints
            .iter()
            .position(|tc| single_instance_of_class(tc).is_some());
        let target_class =
            target.and_then(|i| single_instance_of_class(&constraints[i]));

        let mut properties = Vec::new();
        for (index, constraint) in constraints.iter().enumerate() {
            if Some(index) == target {
                continue;
            }
            properties.push(canonical_property_from_shex(schema, constraint));
        }

        shapes.push(CanonicalShape {
            name: shape.id.as_str().to_string(),
            target_class,
            closed: shape.closed,
            properties,
        });
    }

    CanonicalSchema { shapes }.normalized()
}

fn canonical_property_from_shex(
    schema: &ShexSchema,
    constraint: &TripleConstraint,
) -> CanonicalProperty {
    let cardinality = CanonicalCardinality {
        min: constraint.cardinality.min(),
        max: constraint
            .cardinality
            .max()
            .map(|m| m as i64)
            .unwrap_or(UNBOUNDED),
    };
    let mut out = CanonicalProperty::new(constraint.predicate.as_str().to_string(), cardinality);

    match &constraint.value {
        None => {}
        Some(ValueExpr::Ref(target)) => match resolve_ref_classes(schema, target) {
            Some(mut classes) if classes.len() == 1 => out.class_ref = classes.pop(),
            Some(mut classes) => {
                classes.sort();
                out.class_ref_or = Some(classes);
            }
            None => out.node_ref = Some(target.as_str().to_string()),
        },
        Some(ValueExpr::OneOfRefs(targets)) => {
            let mut classes = Vec::new();
            for target in targets {
                match resolve_ref_classes(schema, target) {
                    Some(mut resolved) if resolved.len() == 1 => {
                        classes.push(resolved.remove(0))
                    }
                    _ => {
                        classes.clear();
                        break;
                    }
                }
            }
            if classes.is_empty() {
                out.node_ref = targets.first().map(|t| t.as_str().to_string());
            } else {
                classes.sort();
                out.class_ref_or = Some(classes);
            }
        }
        Some(ValueExpr::Node(nc)) => {
            if let Some(datatype) = &nc.datatype {
                out.datatype = Some(datatype.as_str().to_string());
            } else if let Some(kind) = nc.node_kind {
                out.node_kind = Some(kind.to_string());
            } else if let Some(values) = nc.values.as_deref() {
                if let [ValueSetItem::IriStem(stem)] = values {
                    out.iri_stem = Some(stem.clone());
                } else {
                    let concrete: Vec<CanonicalValue> = values
                        .iter()
                        .filter(|v| !matches!(v, ValueSetItem::IriStem(_)))
                        .map(canonical_value)
                        .collect();
                    match concrete.len() {
                        0 => {}
                        1 => out.has_value = concrete.into_iter().next(),
                        _ => out.in_values = Some(concrete),
                    }
                }
            }
        }
    }

    out
}

/// Rebuilds a ShEx schema from the canonical form, minting auxiliary
/// shapes for class references.
pub fn canonical_to_shex(canonical: &CanonicalSchema) -> ShexSchema {
    let mut namer = ShapeNamer::new();
    for shape in &canonical.shapes {
        namer.allocate(&shape.name);
    }

    let mut aux = Auxiliaries::new();
    let mut shapes = Vec::with_capacity(canonical.shapes.len());
    let mut start = None;

    for cshape in &canonical.shapes {
        let mut constraints = Vec::new();

        if let Some(target_class) = &cshape.target_class {
            constraints.push(TripleConstraint {
                predicate: rdf::TYPE.into_owned(),
                inverse: false,
                value: Some(ValueExpr::Node(NodeConstraint::values(vec![
                    ValueSetItem::Iri(NamedNode::new_unchecked(target_class.clone())),
                ]))),
                cardinality: Cardinality::One,
            });
        }

        for cprop in &cshape.properties {
            constraints.push(shex_constraint_from_canonical(cprop, &mut namer, &mut aux));
        }

        let id = NamedNode::new_unchecked(cshape.name.clone());
        if start.is_none() {
            start = Some(id.clone());
        }
        shapes.push(Shape {
            id,
            extra: vec![rdf::TYPE.into_owned()],
            closed: cshape.closed,
            expression: TripleExpression::from_constraints(constraints),
        });
    }

    for (_, aux_shape) in aux.by_name {
        shapes.push(aux_shape);
    }

    ShexSchema {
        prefixes: PrefixTable::shex_defaults(),
        base: None,
        start,
        shapes,
    }
}

fn shex_constraint_from_canonical(
    cprop: &CanonicalProperty,
    namer: &mut ShapeNamer,
    aux: &mut Auxiliaries,
) -> TripleConstraint {
    let predicate = NamedNode::new_unchecked(cprop.path.clone());
    let cardinality = cardinality_from_canonical(&cprop.cardinality);

    let value = if let Some(datatype) = &cprop.datatype {
        Some(ValueExpr::Node(NodeConstraint::datatype(
            NamedNode::new_unchecked(datatype.clone()),
        )))
    } else if let Some(class) = &cprop.class_ref {
        let class = NamedNode::new_unchecked(class.clone());
        let base = local_name(class.as_str()).to_string();
        Some(ValueExpr::Ref(aux.class_set_ref(
            std::slice::from_ref(&class),
            &base,
            namer,
        )))
    } else if let Some(classes) = &cprop.class_ref_or {
        let classes: Vec<NamedNode> = classes
            .iter()
            .map(|c| NamedNode::new_unchecked(c.clone()))
            .collect();
        let base = capitalize(local_name(&cprop.path));
        Some(ValueExpr::Ref(aux.class_set_ref(&classes, &base, namer)))
    } else if let Some(kind) = cprop.node_kind.as_deref().and_then(node_kind_from_str) {
        Some(ValueExpr::Node(NodeConstraint::node_kind(kind)))
    } else if let Some(value) = &cprop.has_value {
        Some(ValueExpr::Node(NodeConstraint::values(vec![model_value(
            value,
        )])))
    } else if let Some(values) = &cprop.in_values {
        Some(ValueExpr::Node(NodeConstraint::values(
            values.iter().map(model_value).collect(),
        )))
    } else if let Some(stem) = &cprop.iri_stem {
        Some(ValueExpr::Node(NodeConstraint::values(vec![
            ValueSetItem::IriStem(stem.clone()),
        ])))
    } else {
        cprop
            .node_ref
            .as_ref()
            .map(|node| ValueExpr::Ref(NamedNode::new_unchecked(node.clone())))
    };

    TripleConstraint {
        predicate,
        inverse: false,
        value,
        cardinality,
    }
}

/// Rebuilds a SHACL schema from the canonical form. The `rdf:type`
/// `sh:hasValue` property stripped during normalization is restored so the
/// output is a faithful shapes graph.
pub fn canonical_to_shacl(canonical: &CanonicalSchema) -> ShaclSchema {
    let mut shapes = Vec::with_capacity(canonical.shapes.len());

    for cshape in &canonical.shapes {
        let id = NamedNode::new_unchecked(format!(
            "http://shaclshapes.org/{}Shape",
            strip_shape_suffix(&cshape.name)
        ));
        let mut shape = NodeShape::new(NamedOrBlankNode::from(id));
        shape.closed = cshape.closed;

        if let Some(target_class) = &cshape.target_class {
            let class = NamedNode::new_unchecked(target_class.clone());
            shape.target_classes.push(class.clone());
            let mut type_property = PropertyShape::new(Path::Direct(rdf::TYPE.into_owned()));
            type_property.has_value = Some(ValueSetItem::Iri(class));
            type_property.min_count = Some(1);
            type_property.max_count = Some(1);
            shape.properties.push(type_property);
        }

        for cprop in &cshape.properties {
            shape.properties.push(shacl_property_from_canonical(cprop));
        }

        shapes.push(shape);
    }

    ShaclSchema {
        prefixes: PrefixTable::shacl_defaults(),
        shapes,
    }
}

fn shacl_property_from_canonical(cprop: &CanonicalProperty) -> PropertyShape {
    let mut property = PropertyShape::new(Path::Direct(NamedNode::new_unchecked(
        cprop.path.clone(),
    )));
    property.min_count = match cprop.cardinality.min {
        0 => None,
        min => Some(min),
    };
    property.max_count = match cprop.cardinality.max {
        UNBOUNDED => None,
        max => Some(max as u64),
    };

    if let Some(datatype) = &cprop.datatype {
        property.datatype = Some(NamedNode::new_unchecked(datatype.clone()));
    } else if let Some(class) = &cprop.class_ref {
        property.class_ref = Some(NamedNode::new_unchecked(class.clone()));
    } else if let Some(classes) = &cprop.class_ref_or {
        property.or_classes = Some(
            classes
                .iter()
                .map(|c| NamedNode::new_unchecked(c.clone()))
                .collect(),
        );
    } else if let Some(kind) = cprop.node_kind.as_deref().and_then(node_kind_from_str) {
        property.node_kind = Some(kind);
    } else if let Some(value) = &cprop.has_value {
        property.has_value = Some(model_value(value));
    } else if let Some(values) = &cprop.in_values {
        property.in_values = Some(values.iter().map(model_value).collect());
    } else if let Some(stem) = &cprop.iri_stem {
        property.pattern = Some(stem_to_pattern(stem));
    } else if let Some(pattern) = &cprop.pattern {
        property.pattern = Some(pattern.clone());
    } else if let Some(node) = &cprop.node_ref {
        property.node_ref = Some(NamedNode::new_unchecked(node.clone()));
    }

    property
}

fn cardinality_from_canonical(cardinality: &CanonicalCardinality) -> Cardinality {
    let max = match cardinality.max {
        UNBOUNDED => None,
        max => Some(max as u64),
    };
    match (cardinality.min, max) {
        (1, Some(1)) => Cardinality::One,
        (0, Some(1)) => Cardinality::Optional,
        (0, None) => Cardinality::ZeroOrMore,
        (1, None) => Cardinality::OneOrMore,
        (min, max) => Cardinality::Range { min, max },
    }
}

fn main_shape_names(schema: &ShexSchema) -> HashSet<String> {
    let mut main = HashSet::new();
    if let Some(start) = &schema.start {
        main.insert(start.as_str().to_string());
    } else {
        for shape in &schema.shapes {
            if shape.triple_constraints().len() > 1 {
                main.insert(shape.id.as_str().to_string());
            }
        }
    }
    if main.is_empty() {
        if let Some(first) = schema.shapes.first() {
            main.insert(first.id.as_str().to_string());
        }
    }
    main
}

fn single_instance_of_class(constraint: &TripleConstraint) -> Option<String> {
    if constraint.inverse || constraint.predicate.as_ref() != rdf::TYPE {
        return None;
    }
    let Some(ValueExpr::Node(nc)) = &constraint.value else {
        return None;
    };
    match nc.values.as_deref() {
        Some([ValueSetItem::Iri(class)]) => Some(class.as_str().to_string()),
        _ => None,
    }
}

/// The class set a shape reference stands for, when the referenced shape is
/// a pure class auxiliary (a single constraint over an all-IRI value set).
fn resolve_ref_classes(schema: &ShexSchema, target: &NamedNode) -> Option<Vec<String>> {
    let ref_shape = schema.shape(target)?;
    let constraints = ref_shape.triple_constraints();
    if constraints.len() != 1 {
        return None;
    }
    let Some(ValueExpr::Node(nc)) = &constraints[0].value else {
        return None;
    };
    let values = nc.values.as_deref()?;
    let mut classes = Vec::with_capacity(values.len());
    for value in values {
        match value {
            ValueSetItem::Iri(class) => classes.push(class.as_str().to_string()),
            _ => return None,
        }
    }
    if classes.is_empty() {
        None
    } else {
        Some(classes)
    }
}

fn node_kind_from_str(name: &str) -> Option<NodeKind> {
    match name {
        "IRI" => Some(NodeKind::Iri),
        "BlankNode" => Some(NodeKind::BlankNode),
        "Literal" => Some(NodeKind::Literal),
        "BlankNodeOrIRI" => Some(NodeKind::BlankNodeOrIri),
        "BlankNodeOrLiteral" => Some(NodeKind::BlankNodeOrLiteral),
        "IRIOrLiteral" => Some(NodeKind::IriOrLiteral),
        _ => None,
    }
}

fn canonical_value(item: &ValueSetItem) -> CanonicalValue {
    match item {
        ValueSetItem::Iri(n) => CanonicalValue::Iri(n.as_str().to_string()),
        ValueSetItem::IriStem(stem) => CanonicalValue::Iri(stem.clone()),
        ValueSetItem::Literal(lit) => {
            let datatype = if lit.language().is_some() || lit.datatype() == xsd::STRING {
                None
            } else {
                Some(lit.datatype().as_str().to_string())
            };
            CanonicalValue::Literal {
                value: lit.value().to_string(),
                datatype,
                language: lit.language().map(|l| l.to_string()),
            }
        }
    }
}

fn model_value(value: &CanonicalValue) -> ValueSetItem {
    match value {
        CanonicalValue::Iri(iri) => ValueSetItem::Iri(NamedNode::new_unchecked(iri.clone())),
        CanonicalValue::Literal {
            value,
            datatype,
            language,
        } => {
            let literal = if let Some(language) = language {
                oxrdf::Literal::new_language_tagged_literal_unchecked(value.clone(), language.clone())
            } else if let Some(datatype) = datatype {
                oxrdf::Literal::new_typed_literal(
                    value.clone(),
                    NamedNode::new_unchecked(datatype.clone()),
                )
            } else {
                oxrdf::Literal::new_simple_literal(value.clone())
            };
            ValueSetItem::Literal(literal)
        }
    }
}
