//! Model-to-model converters between SHACL and ShEx.
//!
//! Conversion never fails on a well-formed model; constructs without a
//! counterpart in the target language are dropped and reported through the
//! returned [`Warning`](crate::Warning) list.

mod shacl_to_shex;
mod shex_to_shacl;

pub use shacl_to_shex::shacl_to_shex;
pub use shex_to_shacl::shex_to_shacl;

use std::collections::{BTreeMap, HashMap, HashSet};

use oxrdf::vocab::rdf;
use oxrdf::{NamedNode, NamedOrBlankNode};

use crate::shacl::NodeShape;
use crate::shex::{NodeConstraint, Shape, TripleConstraint, TripleExpression, ValueExpr};
use crate::types::{local_name, Cardinality, ValueSetItem};

/// Characters that change the meaning of a regular expression beyond a
/// plain prefix match. `.` is deliberately absent: published IRI-prefix
/// patterns leave their dots unescaped, and treating the dot as fatal would
/// reject every URL.
const REGEX_META: &[char] = &[
    '\\', '^', '$', '|', '?', '*', '+', '(', ')', '[', ']', '{', '}',
];

/// Recognizes an `sh:pattern` of the form `^http://...` and returns the
/// IRI prefix it anchors. Anything else has no ShEx counterpart.
pub(crate) fn pattern_to_stem(pattern: &str) -> Option<String> {
    let rest = pattern.strip_prefix('^')?;
    if !(rest.starts_with("http://") || rest.starts_with("https://")) {
        return None;
    }
    if rest.contains(REGEX_META) {
        return None;
    }
    Some(rest.to_string())
}

/// The inverse of [`pattern_to_stem`]: anchors the stem and escapes any
/// regex metacharacter it happens to contain.
pub(crate) fn stem_to_pattern(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len() + 1);
    out.push('^');
    for c in stem.chars() {
        if REGEX_META.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Strips a trailing `Shape` suffix from a shape's local name, so
/// `GenderShape` names the ShEx shape `Gender`.
pub(crate) fn strip_shape_suffix(name: &str) -> &str {
    match name.strip_suffix("Shape") {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => name,
    }
}

pub(crate) fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Deterministic allocator for ShEx shape names.
///
/// Principal shapes are named first (IRI local name with the `Shape`
/// suffix stripped; blank-node shapes fall back to their first target
/// class, then to a counter). Auxiliary names are requested afterwards;
/// collisions get a numeric suffix, starting at 2. Same input, same names.
pub(crate) struct ShapeNamer {
    used: HashSet<String>,
    fallback_counter: usize,
}

impl ShapeNamer {
    pub(crate) fn new() -> Self {
        ShapeNamer {
            used: HashSet::new(),
            fallback_counter: 0,
        }
    }

    pub(crate) fn principal_name(&mut self, shape: &NodeShape) -> String {
        let base = match &shape.id {
            NamedOrBlankNode::NamedNode(n) => {
                strip_shape_suffix(local_name(n.as_str())).to_string()
            }
            NamedOrBlankNode::BlankNode(_) => shape
                .target_classes
                .first()
                .map(|c| local_name(c.as_str()).to_string())
                .unwrap_or_default(),
        };
        if base.is_empty() {
            self.fallback_counter += 1;
            let base = format!("_Shape{}", self.fallback_counter);
            self.allocate(&base)
        } else {
            self.allocate(&base)
        }
    }

    pub(crate) fn allocate(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let mut i = 2;
        loop {
            let candidate = format!("{}{}", base, i);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            i += 1;
        }
    }
}

/// Auxiliary shapes minted for class constraints, keyed both by the
/// canonical class-IRI set (for deduplication) and by name (for ordered
/// emission). Every allocated shape is emitted exactly once however many
/// properties reference it.
pub(crate) struct Auxiliaries {
    pub(crate) by_name: BTreeMap<String, Shape>,
    by_classes: HashMap<Vec<String>, NamedNode>,
}

impl Auxiliaries {
    pub(crate) fn new() -> Self {
        Auxiliaries {
            by_name: BTreeMap::new(),
            by_classes: HashMap::new(),
        }
    }

    pub(crate) fn class_set_ref(
        &mut self,
        classes: &[NamedNode],
        base: &str,
        namer: &mut ShapeNamer,
    ) -> NamedNode {
        let mut key: Vec<String> = classes.iter().map(|c| c.as_str().to_string()).collect();
        key.sort();
        key.dedup();
        if let Some(existing) = self.by_classes.get(&key) {
            return existing.clone();
        }

        let name = namer.allocate(base);
        let id = NamedNode::new_unchecked(name.clone());
        let values = classes
            .iter()
            .map(|c| ValueSetItem::Iri(c.clone()))
            .collect();
        let constraint = TripleConstraint {
            predicate: rdf::TYPE.into_owned(),
            inverse: false,
            value: Some(ValueExpr::Node(NodeConstraint::values(values))),
            cardinality: Cardinality::One,
        };
        self.by_name.insert(
            name,
            Shape {
                id: id.clone(),
                extra: vec![rdf::TYPE.into_owned()],
                closed: false,
                expression: Some(TripleExpression::Constraint(constraint)),
            },
        );
        self.by_classes.insert(key, id.clone());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::NamedNode;

    #[test]
    fn pattern_stem_round_trip() {
        let pattern = "^http://example.org/people/";
        let stem = pattern_to_stem(pattern).unwrap();
        assert_eq!(stem, "http://example.org/people/");
        assert_eq!(stem_to_pattern(&stem), pattern);
    }

    #[test]
    fn general_regexes_are_not_stems() {
        assert_eq!(pattern_to_stem("^\\d{3}-\\d{2}"), None);
        assert_eq!(pattern_to_stem("http://example.org/"), None);
        assert_eq!(pattern_to_stem("^http://example.org/(a|b)"), None);
    }

    #[test]
    fn namer_is_deterministic_and_collision_free() {
        let mut namer = ShapeNamer::new();
        assert_eq!(namer.allocate("Place"), "Place");
        assert_eq!(namer.allocate("Place"), "Place2");
        assert_eq!(namer.allocate("Place"), "Place3");
    }

    #[test]
    fn principal_names_strip_shape_suffix() {
        let mut namer = ShapeNamer::new();
        let shape = NodeShape::new(NamedNode::new_unchecked(
            "http://shaclshapes.org/GenderShape",
        ));
        assert_eq!(namer.principal_name(&shape), "Gender");
    }

    #[test]
    fn blank_shapes_take_their_target_class_name() {
        let mut namer = ShapeNamer::new();
        let mut shape = NodeShape::new(oxrdf::BlankNode::new_unchecked("s1"));
        shape
            .target_classes
            .push(NamedNode::new_unchecked("http://schema.org/Person"));
        assert_eq!(namer.principal_name(&shape), "Person");

        let anonymous = NodeShape::new(oxrdf::BlankNode::new_unchecked("s2"));
        assert_eq!(namer.principal_name(&anonymous), "_Shape1");
    }
}
