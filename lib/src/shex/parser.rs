//! Recursive-descent parser for ShExC.
//!
//! One token of lookahead, no error recovery: the first problem is
//! reported with the position of the offending token. Prefixed names are
//! resolved against the prefix table at parse time.

use oxrdf::NamedNode;

use crate::error::{Position, ShexSyntaxError};
use crate::types::{Cardinality, NodeKind, PrefixTable, ValueSetItem};

use super::lexer::{Keyword, Lexer, Token};
use super::{NodeConstraint, Shape, ShexSchema, TripleConstraint, TripleExpression, ValueExpr};

/// Parses a ShExC document into a [`ShexSchema`].
pub fn parse_shex(input: &str) -> Result<ShexSchema, ShexSyntaxError> {
    Parser::new(input)?.parse_schema()
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    token: Token,
    position: Position,
    prefixes: PrefixTable,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self, ShexSyntaxError> {
        let mut lexer = Lexer::new(input);
        let (token, position) = lexer.next_token()?;
        Ok(Parser {
            lexer,
            token,
            position,
            prefixes: PrefixTable::new(),
        })
    }

    fn bump(&mut self) -> Result<(), ShexSyntaxError> {
        let (token, position) = self.lexer.next_token()?;
        self.token = token;
        self.position = position;
        Ok(())
    }

    fn unexpected(&self, expected: &str) -> ShexSyntaxError {
        if self.token == Token::Eof {
            ShexSyntaxError::UnexpectedEof(self.position)
        } else {
            ShexSyntaxError::UnexpectedToken {
                expected: expected.to_string(),
                found: self.token.to_string(),
                position: self.position,
            }
        }
    }

    fn expect(&mut self, token: Token, expected: &str) -> Result<(), ShexSyntaxError> {
        if self.token == token {
            self.bump()
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn parse_schema(mut self) -> Result<ShexSchema, ShexSyntaxError> {
        let mut schema = ShexSchema::default();
        loop {
            match &self.token {
                Token::Eof => break,
                Token::Keyword(Keyword::Prefix) => {
                    self.bump()?;
                    let name = match &self.token {
                        Token::Pname { prefix, local } if local.is_empty() => prefix.clone(),
                        _ => return Err(self.unexpected("a prefix name")),
                    };
                    self.bump()?;
                    let iri = match &self.token {
                        Token::IriRef(iri) => iri.clone(),
                        _ => return Err(self.unexpected("an IRI reference")),
                    };
                    self.bump()?;
                    self.prefixes.insert(name, iri);
                }
                Token::Keyword(Keyword::Base) => {
                    self.bump()?;
                    match &self.token {
                        Token::IriRef(iri) => {
                            schema.base = Some(iri.clone());
                            self.bump()?;
                        }
                        _ => return Err(self.unexpected("an IRI reference")),
                    }
                }
                Token::Keyword(Keyword::Start) => {
                    self.bump()?;
                    self.expect(Token::Equals, "'='")?;
                    self.expect(Token::At, "'@'")?;
                    schema.start = Some(self.iri("a shape id")?);
                }
                Token::IriRef(_) | Token::Pname { .. } => {
                    let position = self.position;
                    let shape = self.parse_shape()?;
                    if schema.shapes.iter().any(|s| s.id == shape.id) {
                        return Err(ShexSyntaxError::DuplicateShapeId {
                            id: shape.id.as_str().to_string(),
                            position,
                        });
                    }
                    schema.shapes.push(shape);
                }
                Token::Ident(word) => {
                    return Err(ShexSyntaxError::UnknownKeyword {
                        keyword: word.clone(),
                        position: self.position,
                    })
                }
                _ => return Err(self.unexpected("a directive or shape declaration")),
            }
        }
        schema.prefixes = self.prefixes;
        Ok(schema)
    }

    fn parse_shape(&mut self) -> Result<Shape, ShexSyntaxError> {
        let id = self.iri("a shape id")?;
        let mut shape = Shape::new(id);

        loop {
            match &self.token {
                Token::Keyword(Keyword::Extra) => {
                    self.bump()?;
                    let before = shape.extra.len();
                    while matches!(self.token, Token::IriRef(_) | Token::Pname { .. }) {
                        let predicate = self.iri("a predicate")?;
                        shape.extra.push(predicate);
                    }
                    if shape.extra.len() == before {
                        return Err(self.unexpected("a predicate after EXTRA"));
                    }
                }
                Token::Keyword(Keyword::Closed) => {
                    shape.closed = true;
                    self.bump()?;
                }
                _ => break,
            }
        }

        self.expect(Token::LBrace, "'{'")?;
        let mut constraints = Vec::new();
        if self.token != Token::RBrace {
            loop {
                constraints.push(self.parse_triple_constraint()?);
                let mut separated = false;
                while matches!(self.token, Token::Semicolon | Token::Dot) {
                    separated = true;
                    self.bump()?;
                }
                if self.token == Token::RBrace {
                    break;
                }
                if !separated {
                    return Err(self.unexpected("';' or '}'"));
                }
            }
        }
        self.expect(Token::RBrace, "'}'")?;

        shape.expression = TripleExpression::from_constraints(constraints);
        Ok(shape)
    }

    fn parse_triple_constraint(&mut self) -> Result<TripleConstraint, ShexSyntaxError> {
        let inverse = if self.token == Token::Caret {
            self.bump()?;
            true
        } else {
            false
        };
        let predicate = self.iri("a predicate")?;
        let value = self.parse_value_expr()?;
        let cardinality = self.parse_cardinality()?;
        Ok(TripleConstraint {
            predicate,
            inverse,
            value,
            cardinality,
        })
    }

    fn parse_value_expr(&mut self) -> Result<Option<ValueExpr>, ShexSyntaxError> {
        match &self.token {
            // No value expression: the cardinality or the end of the
            // constraint follows directly.
            Token::Semicolon
            | Token::RBrace
            | Token::Question
            | Token::Star
            | Token::Plus
            | Token::LBrace
            | Token::Eof => Ok(None),
            Token::Dot => {
                self.bump()?;
                Ok(None)
            }
            Token::At => {
                self.bump()?;
                Ok(Some(ValueExpr::Ref(self.iri("a shape id")?)))
            }
            Token::LParen => {
                self.bump()?;
                self.expect(Token::At, "'@'")?;
                let mut refs = vec![self.iri("a shape id")?];
                while self.token == Token::Keyword(Keyword::Or) {
                    self.bump()?;
                    self.expect(Token::At, "'@'")?;
                    refs.push(self.iri("a shape id")?);
                }
                if refs.len() < 2 {
                    return Err(self.unexpected("'OR'"));
                }
                self.expect(Token::RParen, "')'")?;
                Ok(Some(ValueExpr::OneOfRefs(refs)))
            }
            Token::LBracket => {
                let values = self.parse_value_set()?;
                Ok(Some(ValueExpr::Node(NodeConstraint::values(values))))
            }
            Token::Keyword(k)
                if matches!(
                    k,
                    Keyword::Iri | Keyword::Literal | Keyword::Bnode | Keyword::Nonliteral
                ) =>
            {
                let kind = match k {
                    Keyword::Iri => NodeKind::Iri,
                    Keyword::Literal => NodeKind::Literal,
                    Keyword::Bnode => NodeKind::BlankNode,
                    _ => NodeKind::BlankNodeOrIri,
                };
                self.bump()?;
                Ok(Some(ValueExpr::Node(NodeConstraint::node_kind(kind))))
            }
            Token::IriRef(_) | Token::Pname { .. } => {
                let datatype = self.iri("a datatype IRI")?;
                Ok(Some(ValueExpr::Node(NodeConstraint::datatype(datatype))))
            }
            Token::Ident(word) => Err(ShexSyntaxError::UnknownKeyword {
                keyword: word.clone(),
                position: self.position,
            }),
            _ => Err(self.unexpected("a value expression")),
        }
    }

    fn parse_value_set(&mut self) -> Result<Vec<ValueSetItem>, ShexSyntaxError> {
        self.expect(Token::LBracket, "'['")?;
        let mut items = Vec::new();
        loop {
            match &self.token {
                Token::RBracket => break,
                Token::IriRef(_) | Token::Pname { .. } => {
                    let iri = self.iri("a value")?;
                    if self.token == Token::Tilde {
                        self.bump()?;
                        items.push(ValueSetItem::IriStem(iri.into_string()));
                    } else {
                        items.push(ValueSetItem::Iri(iri));
                    }
                }
                Token::Str(value) => {
                    let value = value.clone();
                    self.bump()?;
                    items.push(ValueSetItem::Literal(self.parse_literal_tail(value)?));
                }
                _ => return Err(self.unexpected("a value set item")),
            }
        }
        if items.is_empty() {
            return Err(self.unexpected("a value set item"));
        }
        self.bump()?; // ']'
        Ok(items)
    }

    /// Parses the optional `^^datatype` or `@lang` suffix of a literal.
    fn parse_literal_tail(&mut self, value: String) -> Result<oxrdf::Literal, ShexSyntaxError> {
        match &self.token {
            Token::CaretCaret => {
                self.bump()?;
                let datatype = self.iri("a datatype IRI")?;
                Ok(oxrdf::Literal::new_typed_literal(value, datatype))
            }
            Token::At => {
                self.bump()?;
                let tag = match &self.token {
                    Token::Ident(tag) => tag.clone(),
                    _ => return Err(self.unexpected("a language tag")),
                };
                let literal = oxrdf::Literal::new_language_tagged_literal(value, &tag)
                    .map_err(|_| self.unexpected("a language tag"))?;
                self.bump()?;
                Ok(literal)
            }
            _ => Ok(oxrdf::Literal::new_simple_literal(value)),
        }
    }

    fn parse_cardinality(&mut self) -> Result<Cardinality, ShexSyntaxError> {
        match self.token {
            Token::Question => {
                self.bump()?;
                Ok(Cardinality::Optional)
            }
            Token::Star => {
                self.bump()?;
                Ok(Cardinality::ZeroOrMore)
            }
            Token::Plus => {
                self.bump()?;
                Ok(Cardinality::OneOrMore)
            }
            Token::LBrace => {
                let position = self.position;
                self.bump()?;
                let min = match self.token {
                    Token::Integer(n) => {
                        self.bump()?;
                        n
                    }
                    _ => return Err(self.unexpected("a cardinality minimum")),
                };
                let max = if self.token == Token::Comma {
                    self.bump()?;
                    match self.token {
                        Token::Integer(n) => {
                            self.bump()?;
                            Some(n)
                        }
                        Token::Star => {
                            self.bump()?;
                            None
                        }
                        // Lenient: `{m,}` also means an open upper bound.
                        Token::RBrace => None,
                        _ => return Err(self.unexpected("a cardinality maximum")),
                    }
                } else {
                    Some(min)
                };
                self.expect(Token::RBrace, "'}'")?;
                if let Some(max) = max {
                    if min > max {
                        return Err(ShexSyntaxError::InvalidCardinality {
                            message: format!("minimum {} exceeds maximum {}", min, max),
                            position,
                        });
                    }
                }
                Ok(Cardinality::Range { min, max })
            }
            _ => Ok(Cardinality::One),
        }
    }

    /// Consumes an IRI reference or a prefixed name, resolving the latter
    /// against the prefix table.
    fn iri(&mut self, expected: &str) -> Result<NamedNode, ShexSyntaxError> {
        match &self.token {
            Token::IriRef(iri) => {
                let node = NamedNode::new_unchecked(iri.clone());
                self.bump()?;
                Ok(node)
            }
            Token::Pname { prefix, local } => {
                let expanded = self.prefixes.expand(prefix, local).ok_or_else(|| {
                    ShexSyntaxError::UnknownPrefix {
                        prefix: prefix.clone(),
                        position: self.position,
                    }
                })?;
                let node = NamedNode::new_unchecked(expanded);
                self.bump()?;
                Ok(node)
            }
            _ => Err(self.unexpected(expected)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cardinality;

    const GENDER_SHEX: &str = r#"
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
    fn parses_prefixes_start_and_shape() {
        let schema = parse_shex(GENDER_SHEX).unwrap();
        assert_eq!(schema.prefixes.len(), 4);
        assert_eq!(schema.start.as_ref().map(|s| s.as_str()), Some("Gender"));
        assert_eq!(schema.shapes.len(), 1);

        let shape = &schema.shapes[0];
        assert_eq!(shape.id.as_str(), "Gender");
        assert_eq!(shape.extra.len(), 1);
        assert_eq!(
            shape.extra[0].as_str(),
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#type"
        );

        let constraints = shape.triple_constraints();
        assert_eq!(constraints.len(), 2);
        assert_eq!(
            constraints[0].value,
            Some(ValueExpr::Node(NodeConstraint::values(vec![
                ValueSetItem::Iri(NamedNode::new_unchecked(
                    "http://yago-knowledge.org/resource/Gender"
                ))
            ])))
        );
        assert_eq!(constraints[0].cardinality, Cardinality::One);
        assert_eq!(constraints[1].cardinality, Cardinality::ZeroOrMore);
    }

    #[test]
    fn parses_all_cardinality_forms() {
        let schema = parse_shex(
            r#"
PREFIX ex: <http://example.org/>
<S> {
    ex:a ex:T ? ;
    ex:b ex:T * ;
    ex:c ex:T + ;
    ex:d ex:T {2} ;
    ex:e ex:T {1,3} ;
    ex:f ex:T {0,*} ;
    ex:g ex:T
}
"#,
        )
        .unwrap();
        let cards: Vec<Cardinality> = schema.shapes[0]
            .triple_constraints()
            .iter()
            .map(|tc| tc.cardinality)
            .collect();
        assert_eq!(
            cards,
            vec![
                Cardinality::Optional,
                Cardinality::ZeroOrMore,
                Cardinality::OneOrMore,
                Cardinality::Range {
                    min: 2,
                    max: Some(2)
                },
                Cardinality::Range {
                    min: 1,
                    max: Some(3)
                },
                Cardinality::Range { min: 0, max: None },
                Cardinality::One,
            ]
        );
    }

    #[test]
    fn parses_inverse_wildcard_and_shape_refs() {
        let schema = parse_shex(
            r#"
PREFIX ex: <http://example.org/>
<S> {
    ^ex:hasParent @<Person> ;
    ex:anything . ;
    ex:place (@<City> OR @<Country>)
}
"#,
        )
        .unwrap();
        let constraints = schema.shapes[0].triple_constraints();
        assert!(constraints[0].inverse);
        assert_eq!(
            constraints[0].value,
            Some(ValueExpr::Ref(NamedNode::new_unchecked("Person")))
        );
        assert_eq!(constraints[1].value, None);
        assert_eq!(
            constraints[2].value,
            Some(ValueExpr::OneOfRefs(vec![
                NamedNode::new_unchecked("City"),
                NamedNode::new_unchecked("Country"),
            ]))
        );
    }

    #[test]
    fn parses_value_set_literals_and_stems() {
        let schema = parse_shex(
            r#"
PREFIX ex: <http://example.org/>
PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>
<S> {
    ex:status ["active" "5"^^xsd:integer "hello"@en <http://example.org/people/>~]
}
"#,
        )
        .unwrap();
        let constraints = schema.shapes[0].triple_constraints();
        let Some(ValueExpr::Node(nc)) = &constraints[0].value else {
            panic!("expected node constraint");
        };
        let values = nc.values.as_ref().unwrap();
        assert_eq!(values.len(), 4);
        assert_eq!(
            values[0],
            ValueSetItem::Literal(oxrdf::Literal::new_simple_literal("active"))
        );
        assert_eq!(
            values[1],
            ValueSetItem::Literal(oxrdf::Literal::new_typed_literal(
                "5",
                NamedNode::new_unchecked("http://www.w3.org/2001/XMLSchema#integer")
            ))
        );
        assert_eq!(
            values[2],
            ValueSetItem::Literal(
                oxrdf::Literal::new_language_tagged_literal("hello", "en").unwrap()
            )
        );
        assert_eq!(
            values[3],
            ValueSetItem::IriStem("http://example.org/people/".to_string())
        );
    }

    #[test]
    fn parses_node_kinds_and_closed() {
        let schema = parse_shex(
            r#"
PREFIX ex: <http://example.org/>
<S> EXTRA ex:p CLOSED {
    ex:a IRI ;
    ex:b LITERAL ;
    ex:c BNODE ;
    ex:d NONLITERAL ;
}
"#,
        )
        .unwrap();
        let shape = &schema.shapes[0];
        assert!(shape.closed);
        let kinds: Vec<NodeKind> = shape
            .triple_constraints()
            .iter()
            .map(|tc| match &tc.value {
                Some(ValueExpr::Node(nc)) => nc.node_kind.unwrap(),
                other => panic!("expected node kind, got {:?}", other),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Iri,
                NodeKind::Literal,
                NodeKind::BlankNode,
                NodeKind::BlankNodeOrIri,
            ]
        );
    }

    #[test]
    fn unknown_prefix_is_reported_with_position() {
        let err = parse_shex("<S> { nope:p . }").unwrap_err();
        match err {
            ShexSyntaxError::UnknownPrefix { prefix, position } => {
                assert_eq!(prefix, "nope");
                assert_eq!(position.line, 1);
            }
            other => panic!("expected UnknownPrefix, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_shape_id_is_rejected() {
        let err = parse_shex("<S> {} <S> {}").unwrap_err();
        assert!(matches!(err, ShexSyntaxError::DuplicateShapeId { .. }));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let err = parse_shex("PREFIX ex: <http://e/>\n<S> { ex:p ex:T {3,1} }").unwrap_err();
        assert!(matches!(err, ShexSyntaxError::InvalidCardinality { .. }));
    }

    #[test]
    fn trailing_separators_are_tolerated() {
        let schema = parse_shex("PREFIX ex: <http://e/>\n<S> { ex:p ex:T ; }").unwrap();
        assert_eq!(schema.shapes[0].triple_constraints().len(), 1);
    }

    #[test]
    fn empty_shape_body_parses() {
        let schema = parse_shex("<S> {}").unwrap();
        assert!(schema.shapes[0].expression.is_none());
    }

    #[test]
    fn unexpected_token_reports_expectation() {
        let err = parse_shex("<S> { } }").unwrap_err();
        match err {
            ShexSyntaxError::UnexpectedToken { expected, .. } => {
                assert_eq!(expected, "a directive or shape declaration");
            }
            other => panic!("expected UnexpectedToken, got {:?}", other),
        }
    }
}
