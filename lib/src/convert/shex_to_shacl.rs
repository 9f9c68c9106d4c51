//! ShEx -> SHACL conversion.
//!
//! The inverse rewrite. Instance-of triple constraints with pure IRI value
//! sets are promoted to `sh:targetClass`; references to auxiliary class
//! shapes are inlined as `sh:class` (or an `sh:or` of classes); IRI stems
//! become anchored `sh:pattern` regexes. `EXTRA rdf:type` is dropped, which
//! is SHACL's default reading anyway.

use std::collections::HashSet;

use oxrdf::vocab::rdf;
use oxrdf::NamedNode;

use crate::error::Warning;
use crate::named_nodes::wdt_instance_of;
use crate::shacl::{NodeShape, PropertyShape, ShaclSchema};
use crate::shex::{Shape, ShexSchema, TripleConstraint, ValueExpr};
use crate::types::{local_name, Path, PrefixTable, ValueSetItem};

use super::stem_to_pattern;

const SHACL_SHAPES_BASE: &str = "http://shaclshapes.org/";

/// Converts a ShEx schema into an equivalent SHACL schema.
///
/// Auxiliary shapes (everything that is not the start shape or a
/// multi-constraint shape) are not emitted as node shapes of their own;
/// they are inlined at their reference sites.
pub fn shex_to_shacl(schema: &ShexSchema) -> (ShaclSchema, Vec<Warning>) {
    let mut warnings = Vec::new();
    let main_names = identify_main_shapes(schema);

    let mut shapes = Vec::new();
    for shape in &schema.shapes {
        if !main_names.contains(shape.id.as_str()) {
            continue;
        }
        shapes.push(convert_shape(schema, shape, &mut warnings));
    }

    let mut prefixes = PrefixTable::shacl_defaults();
    for prefix in schema.prefixes.iter() {
        if prefix.name.is_empty()
            || prefix.name == "sh"
            || prefixes.contains(&prefix.name)
            || prefixes.contains_iri(&prefix.iri)
        {
            continue;
        }
        prefixes.insert(prefix.name.clone(), prefix.iri.clone());
    }

    (ShaclSchema { prefixes, shapes }, warnings)
}

/// Main shapes are the start shape when one is declared, otherwise every
/// shape with more than one triple constraint, otherwise the first shape.
fn identify_main_shapes(schema: &ShexSchema) -> HashSet<String> {
    let mut main: HashSet<String> = HashSet::new();
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

fn convert_shape(schema: &ShexSchema, shape: &Shape, warnings: &mut Vec<Warning>) -> NodeShape {
    let name = local_name(shape.id.as_str());
    let mut node_shape = NodeShape::new(made_shape_iri(name));
    node_shape.closed = shape.closed;

    let constraints = shape.triple_constraints();
    let promoted = constraints
        .iter()
        .position(|tc| instance_of_classes(tc).is_some());
    if let Some(index) = promoted {
        node_shape.target_classes =
            instance_of_classes(&constraints[index]).unwrap_or_default();
    }

    for (index, constraint) in constraints.iter().enumerate() {
        if Some(index) == promoted {
            continue;
        }
        node_shape
            .properties
            .push(convert_constraint(schema, constraint, name, warnings));
    }

    node_shape
}

/// The class set of an instance-of constraint with a pure IRI value set,
/// or `None` when the constraint is anything else. Both `rdf:type` and the
/// Wikidata instance-of property qualify.
fn instance_of_classes(constraint: &TripleConstraint) -> Option<Vec<NamedNode>> {
    if constraint.inverse {
        return None;
    }
    if constraint.predicate.as_ref() != rdf::TYPE && constraint.predicate != wdt_instance_of() {
        return None;
    }
    let Some(ValueExpr::Node(nc)) = &constraint.value else {
        return None;
    };
    let values = nc.values.as_deref()?;
    if values.is_empty() {
        return None;
    }
    let mut classes = Vec::with_capacity(values.len());
    for value in values {
        match value {
            ValueSetItem::Iri(n) => classes.push(n.clone()),
            _ => return None,
        }
    }
    Some(classes)
}

fn convert_constraint(
    schema: &ShexSchema,
    constraint: &TripleConstraint,
    shape_name: &str,
    warnings: &mut Vec<Warning>,
) -> PropertyShape {
    let path = if constraint.inverse {
        Path::Inverse(constraint.predicate.clone())
    } else {
        Path::Direct(constraint.predicate.clone())
    };
    let mut property = PropertyShape::new(path);
    let (min_count, max_count) = constraint.cardinality.to_counts();
    property.min_count = min_count;
    property.max_count = max_count;

    match &constraint.value {
        None => {}
        Some(ValueExpr::Ref(target)) => {
            resolve_shape_ref(schema, target, &mut property);
        }
        Some(ValueExpr::OneOfRefs(targets)) => {
            let mut classes = Vec::with_capacity(targets.len());
            let mut resolved = true;
            for target in targets {
                match resolve_single_class(schema, target) {
                    Some(class) => classes.push(class),
                    None => {
                        resolved = false;
                        break;
                    }
                }
            }
            if resolved && !classes.is_empty() {
                property.or_classes = Some(classes);
            } else {
                let warning = Warning::UnsupportedConstruct {
                    shape: shape_name.to_string(),
                    construct: "shape disjunction with non-class members".to_string(),
                };
                log::warn!("{}", warning);
                warnings.push(warning);
            }
        }
        Some(ValueExpr::Node(nc)) => {
            if let Some(datatype) = &nc.datatype {
                property.datatype = Some(datatype.clone());
            } else if let Some(kind) = nc.node_kind {
                property.node_kind = Some(kind);
            } else if let Some(values) = &nc.values {
                convert_value_set(values, &mut property, shape_name, warnings);
            }
        }
    }

    property
}

fn convert_value_set(
    values: &[ValueSetItem],
    property: &mut PropertyShape,
    shape_name: &str,
    warnings: &mut Vec<Warning>,
) {
    if let [ValueSetItem::IriStem(stem)] = values {
        property.pattern = Some(stem_to_pattern(stem));
        return;
    }

    let concrete: Vec<ValueSetItem> = values
        .iter()
        .filter(|v| !matches!(v, ValueSetItem::IriStem(_)))
        .cloned()
        .collect();
    if concrete.len() < values.len() {
        let warning = Warning::UnsupportedConstruct {
            shape: shape_name.to_string(),
            construct: "IRI stem in a mixed value set".to_string(),
        };
        log::warn!("{}", warning);
        warnings.push(warning);
    }
    match concrete.len() {
        0 => {}
        1 => property.has_value = concrete.into_iter().next(),
        _ => property.in_values = Some(concrete),
    }
}

/// Resolves `@<R>` per the reference's shape body: a pure class auxiliary
/// inlines as `sh:class` (single) or `sh:or` (multiple); a complex shape
/// contributes its target class when it has one and otherwise becomes an
/// `sh:node` reference; an unresolved name is taken to be the class itself.
fn resolve_shape_ref(schema: &ShexSchema, target: &NamedNode, property: &mut PropertyShape) {
    let Some(ref_shape) = schema.shape(target) else {
        property.class_ref = Some(target.clone());
        return;
    };

    let constraints = ref_shape.triple_constraints();
    if constraints.len() == 1 {
        if let Some(ValueExpr::Node(nc)) = &constraints[0].value {
            if let Some(values) = &nc.values {
                let classes: Vec<NamedNode> = values
                    .iter()
                    .filter_map(|v| match v {
                        ValueSetItem::Iri(n) => Some(n.clone()),
                        _ => None,
                    })
                    .collect();
                if classes.len() == values.len() && !classes.is_empty() {
                    if classes.len() == 1 {
                        property.class_ref = classes.into_iter().next();
                    } else {
                        property.or_classes = Some(classes);
                    }
                    return;
                }
            }
        }
    }

    match constraints.iter().find_map(|tc| {
        instance_of_classes(tc).and_then(|classes| match classes.len() {
            1 => classes.into_iter().next(),
            _ => None,
        })
    }) {
        Some(class) => property.class_ref = Some(class),
        None => {
            property.node_ref = Some(made_shape_iri(local_name(target.as_str())));
        }
    }
}

fn resolve_single_class(schema: &ShexSchema, target: &NamedNode) -> Option<NamedNode> {
    let Some(ref_shape) = schema.shape(target) else {
        return Some(target.clone());
    };
    let constraints = ref_shape.triple_constraints();
    if constraints.len() != 1 {
        return None;
    }
    let Some(ValueExpr::Node(nc)) = &constraints[0].value else {
        return None;
    };
    match nc.values.as_deref() {
        Some([ValueSetItem::Iri(class)]) => Some(class.clone()),
        _ => None,
    }
}

fn made_shape_iri(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("{}{}Shape", SHACL_SHAPES_BASE, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shex::parse_shex;
    use crate::types::NodeKind;

    fn convert(shex: &str) -> (ShaclSchema, Vec<Warning>) {
        shex_to_shacl(&parse_shex(shex).unwrap())
    }

    const GENDER: &str = r#"
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>
PREFIX yago: <http://yago-knowledge.org/resource/>

start = @<Gender>

<Gender> EXTRA rdf:type {
    rdf:type [yago:Gender] ;
    rdfs:label xsd:string *
}
"#;

    #[test]
    fn type_constraint_is_promoted_to_target_class() {
        let (shacl, warnings) = convert(GENDER);
        assert!(warnings.is_empty());
        assert_eq!(shacl.shapes.len(), 1);

        let shape = &shacl.shapes[0];
        assert_eq!(
            shape.id.to_string(),
            "<http://shaclshapes.org/GenderShape>"
        );
        assert_eq!(
            shape.target_classes,
            vec![NamedNode::new_unchecked(
                "http://yago-knowledge.org/resource/Gender"
            )]
        );

        // The promoted rdf:type constraint is not also a property shape.
        assert_eq!(shape.properties.len(), 1);
        let label = &shape.properties[0];
        assert_eq!(
            label.path.predicate().as_str(),
            "http://www.w3.org/2000/01/rdf-schema#label"
        );
        assert_eq!(label.min_count, Some(0));
        assert_eq!(label.max_count, None);
    }

    #[test]
    fn auxiliary_class_shape_is_inlined_as_class() {
        let (shacl, _) = convert(
            r#"
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX schema: <http://schema.org/>

start = @<Event>

<Event> EXTRA rdf:type {
    rdf:type [schema:Event] ;
    schema:location @<Place>
}

<Place> EXTRA rdf:type {
    rdf:type [schema:Place]
}
"#,
        );
        assert_eq!(shacl.shapes.len(), 1);
        let location = &shacl.shapes[0].properties[0];
        assert_eq!(
            location.class_ref,
            Some(NamedNode::new_unchecked("http://schema.org/Place"))
        );
        assert_eq!(location.node_ref, None);
    }

    #[test]
    fn multi_class_auxiliary_becomes_or() {
        let (shacl, _) = convert(
            r#"
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX schema: <http://schema.org/>

start = @<Event>

<Event> EXTRA rdf:type {
    rdf:type [schema:Event] ;
    schema:location @<Location>
}

<Location> EXTRA rdf:type {
    rdf:type [schema:City schema:Country]
}
"#,
        );
        let location = &shacl.shapes[0].properties[0];
        assert_eq!(
            location.or_classes,
            Some(vec![
                NamedNode::new_unchecked("http://schema.org/City"),
                NamedNode::new_unchecked("http://schema.org/Country"),
            ])
        );
    }

    #[test]
    fn complex_reference_becomes_node_ref() {
        let (shacl, _) = convert(
            r#"
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX schema: <http://schema.org/>
PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>

<Person> EXTRA rdf:type {
    rdf:type [schema:Person] ;
    schema:knows @<Friend>
}

<Friend> EXTRA rdf:type {
    schema:name xsd:string ;
    schema:age xsd:integer
}
"#,
        );
        // Both shapes have more than one constraint, so both are main.
        assert_eq!(shacl.shapes.len(), 2);
        let person = shacl
            .shapes
            .iter()
            .find(|s| s.id.to_string().contains("PersonShape"))
            .unwrap();
        let knows = &person.properties[0];
        assert_eq!(
            knows.node_ref,
            Some(NamedNode::new_unchecked(
                "http://shaclshapes.org/FriendShape"
            ))
        );
    }

    #[test]
    fn stem_value_set_becomes_anchored_pattern() {
        let (shacl, _) = convert(
            r#"
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX schema: <http://schema.org/>

<Person> EXTRA rdf:type {
    rdf:type [schema:Person] ;
    schema:page [<http://example.org/people/>~]
}
"#,
        );
        let page = &shacl.shapes[0].properties[0];
        assert_eq!(
            page.pattern.as_deref(),
            Some("^http://example.org/people/")
        );
    }

    #[test]
    fn value_sets_map_to_has_value_and_in() {
        let (shacl, _) = convert(
            r#"
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX schema: <http://schema.org/>
PREFIX wd: <http://www.wikidata.org/entity/>

<Person> EXTRA rdf:type {
    rdf:type [schema:Person] ;
    schema:gender [wd:Q6581097 wd:Q6581072] ;
    schema:status ["active"]
}
"#,
        );
        let shape = &shacl.shapes[0];
        let gender = &shape.properties[0];
        assert_eq!(gender.in_values.as_ref().unwrap().len(), 2);
        let status = &shape.properties[1];
        assert_eq!(
            status.has_value,
            Some(ValueSetItem::Literal(oxrdf::Literal::new_simple_literal(
                "active"
            )))
        );
    }

    #[test]
    fn node_kind_and_inverse_survive() {
        let (shacl, _) = convert(
            r#"
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX ex: <http://example.org/>

<Thing> EXTRA rdf:type {
    rdf:type [ex:Thing] ;
    ex:homepage IRI ;
    ^ex:hasParent . {1,*}
}
"#,
        );
        let shape = &shacl.shapes[0];
        let homepage = &shape.properties[0];
        assert_eq!(homepage.node_kind, Some(NodeKind::Iri));
        let parent = &shape.properties[1];
        assert!(parent.path.is_inverse());
        assert_eq!(parent.min_count, Some(1));
        assert_eq!(parent.max_count, None);
    }

    #[test]
    fn wikidata_instance_of_is_promoted_like_rdf_type() {
        let (shacl, _) = convert(
            r#"
PREFIX wdt: <http://www.wikidata.org/prop/direct/>
PREFIX wd: <http://www.wikidata.org/entity/>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>

<Human> {
    wdt:P31 [wd:Q5] ;
    rdfs:label xsd:string *
}
"#,
        );
        assert_eq!(
            shacl.shapes[0].target_classes,
            vec![NamedNode::new_unchecked("http://www.wikidata.org/entity/Q5")]
        );
    }

    #[test]
    fn unknown_reference_is_taken_as_class() {
        let (shacl, _) = convert(
            r#"
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX schema: <http://schema.org/>

<Event> EXTRA rdf:type {
    rdf:type [schema:Event] ;
    schema:location @<http://schema.org/Place>
}
"#,
        );
        let location = &shacl.shapes[0].properties[0];
        assert_eq!(
            location.class_ref,
            Some(NamedNode::new_unchecked("http://schema.org/Place"))
        );
    }
}
