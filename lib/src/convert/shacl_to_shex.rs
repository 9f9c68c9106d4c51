//! SHACL -> ShEx conversion.
//!
//! Each node shape becomes a ShEx shape plus zero or more auxiliary shapes
//! that express class constraints as shape references. `EXTRA rdf:type` is
//! emitted on every shape: SHACL makes no closed-world assumption about
//! types, so extra `rdf:type` triples must never fail matching.

use std::collections::HashMap;

use oxrdf::vocab::rdf;
use oxrdf::{NamedNode, NamedOrBlankNode};

use crate::error::Warning;
use crate::shacl::{PropertyShape, ShaclSchema};
use crate::shex::{NodeConstraint, Shape, ShexSchema, TripleConstraint, TripleExpression, ValueExpr};
use crate::types::{local_name, Cardinality, PrefixTable, ValueSetItem};

use super::{capitalize, pattern_to_stem, Auxiliaries, ShapeNamer};

/// Converts a SHACL schema into an equivalent ShEx schema.
///
/// Auxiliary shapes are appended after the principal shapes in name order;
/// the first principal shape becomes the `start` shape. Lossy steps are
/// reported in the returned warning list.
pub fn shacl_to_shex(schema: &ShaclSchema) -> (ShexSchema, Vec<Warning>) {
    let mut warnings = Vec::new();
    let mut namer = ShapeNamer::new();

    // Principal shapes claim their names before any auxiliary shape is
    // minted, and class IRIs that are themselves declared shapes resolve to
    // the declared shape instead of an auxiliary one.
    let mut principal_names = Vec::with_capacity(schema.shapes.len());
    let mut name_by_shape_iri: HashMap<String, String> = HashMap::new();
    for shape in &schema.shapes {
        let name = namer.principal_name(shape);
        if let NamedOrBlankNode::NamedNode(n) = &shape.id {
            name_by_shape_iri.insert(n.as_str().to_string(), name.clone());
        }
        principal_names.push(name);
    }

    let mut aux = Auxiliaries::new();
    let mut shapes = Vec::with_capacity(schema.shapes.len());
    let mut start = None;

    for (shape, name) in schema.shapes.iter().zip(principal_names) {
        let mut constraints = Vec::new();

        if !shape.target_classes.is_empty() {
            let values = shape
                .target_classes
                .iter()
                .map(|c| ValueSetItem::Iri(c.clone()))
                .collect();
            let cardinality = if shape.target_classes.len() > 1 {
                Cardinality::OneOrMore
            } else {
                Cardinality::One
            };
            constraints.push(TripleConstraint {
                predicate: rdf::TYPE.into_owned(),
                inverse: false,
                value: Some(ValueExpr::Node(NodeConstraint::values(values))),
                cardinality,
            });
        }
        if !shape.target_nodes.is_empty() {
            push_warning(
                &mut warnings,
                Warning::UnsupportedConstruct {
                    shape: name.clone(),
                    construct: "sh:targetNode".to_string(),
                },
            );
        }
        if !shape.ignored_properties.is_empty() {
            push_warning(
                &mut warnings,
                Warning::UnsupportedConstruct {
                    shape: name.clone(),
                    construct: "sh:ignoredProperties".to_string(),
                },
            );
        }

        for property in &shape.properties {
            // The target class already covers an explicit rdf:type
            // hasValue property.
            if property.path.predicate().as_ref() == rdf::TYPE
                && !shape.target_classes.is_empty()
                && property.has_value.is_some()
            {
                continue;
            }
            constraints.push(convert_property(
                property,
                &name,
                &name_by_shape_iri,
                &mut namer,
                &mut aux,
                &mut warnings,
            ));
        }

        let id = NamedNode::new_unchecked(name);
        if start.is_none() {
            start = Some(id.clone());
        }
        shapes.push(Shape {
            id,
            extra: vec![rdf::TYPE.into_owned()],
            closed: shape.closed,
            expression: TripleExpression::from_constraints(constraints),
        });
    }

    for (_, aux_shape) in aux.by_name {
        shapes.push(aux_shape);
    }

    let prefixes = output_prefixes(schema, &shapes);
    (
        ShexSchema {
            prefixes,
            base: None,
            start,
            shapes,
        },
        warnings,
    )
}

fn convert_property(
    property: &PropertyShape,
    shape_name: &str,
    name_by_shape_iri: &HashMap<String, String>,
    namer: &mut ShapeNamer,
    aux: &mut Auxiliaries,
    warnings: &mut Vec<Warning>,
) -> TripleConstraint {
    let predicate = property.path.predicate().clone();
    let cardinality = Cardinality::from_counts(property.min_count, property.max_count);

    let value = if let Some(item) = &property.has_value {
        Some(ValueExpr::Node(NodeConstraint::values(vec![item.clone()])))
    } else if let Some(items) = &property.in_values {
        Some(ValueExpr::Node(NodeConstraint::values(items.clone())))
    } else if let Some(classes) = &property.or_classes {
        let base = capitalize(local_name(predicate.as_str()));
        Some(ValueExpr::Ref(aux.class_set_ref(classes, &base, namer)))
    } else if let Some(class) = &property.class_ref {
        match name_by_shape_iri.get(class.as_str()) {
            Some(declared) => Some(ValueExpr::Ref(NamedNode::new_unchecked(declared.clone()))),
            None => {
                let base = local_name(class.as_str()).to_string();
                Some(ValueExpr::Ref(aux.class_set_ref(
                    std::slice::from_ref(class),
                    &base,
                    namer,
                )))
            }
        }
    } else if let Some(kind) = property.node_kind {
        Some(ValueExpr::Node(NodeConstraint::node_kind(kind)))
    } else if let Some(datatype) = &property.datatype {
        Some(ValueExpr::Node(NodeConstraint::datatype(datatype.clone())))
    } else if let Some(pattern) = &property.pattern {
        match pattern_to_stem(pattern) {
            Some(stem) => Some(ValueExpr::Node(NodeConstraint::values(vec![
                ValueSetItem::IriStem(stem),
            ]))),
            None => {
                push_warning(
                    warnings,
                    Warning::DroppedPattern {
                        shape: shape_name.to_string(),
                        pattern: pattern.clone(),
                    },
                );
                None
            }
        }
    } else if let Some(node) = &property.node_ref {
        let target = name_by_shape_iri
            .get(node.as_str())
            .map(|declared| NamedNode::new_unchecked(declared.clone()))
            .unwrap_or_else(|| node.clone());
        Some(ValueExpr::Ref(target))
    } else {
        None
    };

    TripleConstraint {
        predicate,
        inverse: property.path.is_inverse(),
        value,
        cardinality,
    }
}

/// Standard ShEx prefixes plus whichever source prefixes are actually used
/// by the converted shapes. `sh:` never survives the trip.
fn output_prefixes(source: &ShaclSchema, shapes: &[Shape]) -> PrefixTable {
    let mut table = PrefixTable::shex_defaults();
    let used = collect_used_iris(shapes);
    for prefix in source.prefixes.iter() {
        if prefix.name.is_empty() || prefix.name == "sh" {
            continue;
        }
        if table.contains(&prefix.name) || table.contains_iri(&prefix.iri) {
            continue;
        }
        if used.iter().any(|iri| iri.starts_with(&prefix.iri)) {
            table.insert(prefix.name.clone(), prefix.iri.clone());
        }
    }
    table
}

fn collect_used_iris(shapes: &[Shape]) -> Vec<String> {
    let mut iris = Vec::new();
    for shape in shapes {
        iris.push(shape.id.as_str().to_string());
        for predicate in &shape.extra {
            iris.push(predicate.as_str().to_string());
        }
        for constraint in shape.triple_constraints() {
            iris.push(constraint.predicate.as_str().to_string());
            match &constraint.value {
                Some(ValueExpr::Ref(target)) => iris.push(target.as_str().to_string()),
                Some(ValueExpr::OneOfRefs(targets)) => {
                    iris.extend(targets.iter().map(|t| t.as_str().to_string()))
                }
                Some(ValueExpr::Node(nc)) => {
                    if let Some(datatype) = &nc.datatype {
                        iris.push(datatype.as_str().to_string());
                    }
                    if let Some(values) = &nc.values {
                        for value in values {
                            if let ValueSetItem::Iri(n) = value {
                                iris.push(n.as_str().to_string());
                            }
                        }
                    }
                }
                None => {}
            }
        }
    }
    iris
}

fn push_warning(warnings: &mut Vec<Warning>, warning: Warning) {
    log::warn!("{}", warning);
    warnings.push(warning);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shacl::parse_shacl;
    use crate::shex::emit_shex;

    fn convert(ttl: &str) -> (ShexSchema, Vec<Warning>) {
        shacl_to_shex(&parse_shacl(ttl).unwrap())
    }

    #[test]
    fn minimal_shape_gets_type_constraint_and_extra() {
        let (shex, warnings) = convert(
            r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
@prefix ex: <http://shaclshapes.org/> .
@prefix yago: <http://yago-knowledge.org/resource/> .

ex:GenderShape a sh:NodeShape ;
    sh:targetClass yago:Gender ;
    sh:property [
        sh:path rdfs:label ;
        sh:datatype xsd:string ;
        sh:minCount 1 ;
        sh:maxCount 1 ;
    ] .
"#,
        );
        assert!(warnings.is_empty());
        assert_eq!(shex.shapes.len(), 1);
        assert_eq!(shex.start.as_ref().map(|s| s.as_str()), Some("Gender"));

        let shape = &shex.shapes[0];
        assert_eq!(shape.id.as_str(), "Gender");
        assert_eq!(shape.extra[0].as_ref(), rdf::TYPE);

        let constraints = shape.triple_constraints();
        assert_eq!(constraints.len(), 2);
        assert_eq!(constraints[0].predicate.as_ref(), rdf::TYPE);
        assert_eq!(constraints[0].cardinality, Cardinality::One);
        // minCount 1 + maxCount 1 is exactly-one: printed with no suffix.
        assert_eq!(constraints[1].cardinality, Cardinality::One);

        let text = emit_shex(&shex);
        assert!(text.contains("<Gender> EXTRA rdf:type {"), "got: {}", text);
        assert!(text.contains("rdf:type [yago:Gender]"), "got: {}", text);
        assert!(text.contains("rdfs:label xsd:string\n"), "got: {}", text);
    }

    #[test]
    fn class_reference_mints_one_auxiliary_shape() {
        let (shex, _) = convert(
            r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix schema: <http://schema.org/> .
@prefix ex: <http://shaclshapes.org/> .

ex:EventShape a sh:NodeShape ;
    sh:targetClass schema:Event ;
    sh:property [ sh:path schema:location ; sh:class schema:Place ] ;
    sh:property [ sh:path schema:homeLocation ; sh:class schema:Place ] .
"#,
        );
        // Two references, one auxiliary definition.
        assert_eq!(shex.shapes.len(), 2);
        let aux = shex.shape(&NamedNode::new_unchecked("Place")).unwrap();
        assert_eq!(aux.extra[0].as_ref(), rdf::TYPE);
        let body = aux.triple_constraints();
        assert_eq!(body.len(), 1);
        assert_eq!(
            body[0].value,
            Some(ValueExpr::Node(NodeConstraint::values(vec![
                ValueSetItem::Iri(NamedNode::new_unchecked("http://schema.org/Place"))
            ])))
        );

        let refs: Vec<_> = shex.shapes[0]
            .triple_constraints()
            .iter()
            .filter_map(|tc| match &tc.value {
                Some(ValueExpr::Ref(r)) => Some(r.as_str().to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(refs, ["Place", "Place"]);
    }

    #[test]
    fn class_reference_to_declared_shape_does_not_mint_auxiliary() {
        let (shex, _) = convert(
            r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix schema: <http://schema.org/> .
@prefix ex: <http://shaclshapes.org/> .

ex:EventShape a sh:NodeShape ;
    sh:targetClass schema:Event ;
    sh:property [ sh:path schema:location ; sh:class ex:PlaceShape ] .

ex:PlaceShape a sh:NodeShape ;
    sh:targetClass schema:Place .
"#,
        );
        assert_eq!(shex.shapes.len(), 2);
        let event = shex.shape(&NamedNode::new_unchecked("Event")).unwrap();
        let location = &event.triple_constraints()[1];
        assert_eq!(
            location.value,
            Some(ValueExpr::Ref(NamedNode::new_unchecked("Place")))
        );
    }

    #[test]
    fn or_classes_become_one_auxiliary_with_multi_value_set() {
        let (shex, _) = convert(
            r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix schema: <http://schema.org/> .
@prefix ex: <http://shaclshapes.org/> .

ex:EventShape a sh:NodeShape ;
    sh:targetClass schema:Event ;
    sh:property [
        sh:path schema:location ;
        sh:or ( [ sh:class schema:City ] [ sh:class schema:Country ] ) ;
    ] .
"#,
        );
        let aux = shex.shape(&NamedNode::new_unchecked("Location")).unwrap();
        let body = aux.triple_constraints();
        let Some(ValueExpr::Node(nc)) = &body[0].value else {
            panic!("expected value set");
        };
        assert_eq!(
            nc.values.as_ref().unwrap(),
            &vec![
                ValueSetItem::Iri(NamedNode::new_unchecked("http://schema.org/City")),
                ValueSetItem::Iri(NamedNode::new_unchecked("http://schema.org/Country")),
            ]
        );
    }

    #[test]
    fn cardinality_table_matches_the_mapping() {
        let (shex, _) = convert(
            r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix ex: <http://shaclshapes.org/> .
@prefix p: <http://example.org/p/> .

ex:CardShape a sh:NodeShape ;
    sh:property [ sh:path p:a ; sh:minCount 0 ; sh:maxCount 3 ] ;
    sh:property [ sh:path p:b ; sh:minCount 0 ] ;
    sh:property [ sh:path p:c ; sh:minCount 1 ] ;
    sh:property [ sh:path p:d ] .
"#,
        );
        let shape = &shex.shapes[0];
        let by_predicate = |iri: &str| {
            shape
                .triple_constraints()
                .iter()
                .find(|tc| tc.predicate.as_str() == iri)
                .unwrap()
                .cardinality
        };
        assert_eq!(
            by_predicate("http://example.org/p/a"),
            Cardinality::Range {
                min: 0,
                max: Some(3)
            }
        );
        assert_eq!(by_predicate("http://example.org/p/b"), Cardinality::ZeroOrMore);
        assert_eq!(by_predicate("http://example.org/p/c"), Cardinality::OneOrMore);
        assert_eq!(
            by_predicate("http://example.org/p/d"),
            Cardinality::Range { min: 0, max: None }
        );
    }

    #[test]
    fn iri_prefix_pattern_becomes_stem_and_others_warn() {
        let (shex, warnings) = convert(
            r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix ex: <http://shaclshapes.org/> .
@prefix p: <http://example.org/p/> .

ex:PersonShape a sh:NodeShape ;
    sh:property [ sh:path p:page ; sh:pattern "^http://example.org/people/" ] ;
    sh:property [ sh:path p:ssn ; sh:pattern "^\\d+$" ] .
"#,
        );
        let shape = &shex.shapes[0];
        let page = shape
            .triple_constraints()
            .iter()
            .find(|tc| tc.predicate.as_str().ends_with("page"))
            .unwrap();
        assert_eq!(
            page.value,
            Some(ValueExpr::Node(NodeConstraint::values(vec![
                ValueSetItem::IriStem("http://example.org/people/".to_string())
            ])))
        );

        let ssn = shape
            .triple_constraints()
            .iter()
            .find(|tc| tc.predicate.as_str().ends_with("ssn"))
            .unwrap();
        assert_eq!(ssn.value, None);
        assert!(warnings
            .iter()
            .any(|w| matches!(w, Warning::DroppedPattern { .. })));
    }

    #[test]
    fn inverse_path_keeps_its_direction() {
        let (shex, _) = convert(
            r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix ex: <http://shaclshapes.org/> .
@prefix p: <http://example.org/p/> .

ex:ParentShape a sh:NodeShape ;
    sh:property [ sh:path [ sh:inversePath p:hasParent ] ; sh:minCount 1 ] .
"#,
        );
        let constraint = &shex.shapes[0].triple_constraints()[0];
        assert!(constraint.inverse);
        let text = emit_shex(&shex);
        assert!(text.contains("^p:hasParent . +"), "got: {}", text);
    }

    #[test]
    fn multiple_target_classes_use_plus_cardinality() {
        let (shex, _) = convert(
            r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix schema: <http://schema.org/> .
@prefix ex: <http://shaclshapes.org/> .

ex:PlaceShape a sh:NodeShape ;
    sh:targetClass schema:City, schema:Country .
"#,
        );
        let constraint = &shex.shapes[0].triple_constraints()[0];
        assert_eq!(constraint.cardinality, Cardinality::OneOrMore);
        let Some(ValueExpr::Node(nc)) = &constraint.value else {
            panic!("expected value set");
        };
        assert_eq!(nc.values.as_ref().unwrap().len(), 2);
    }
}
