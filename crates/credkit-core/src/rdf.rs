//! # RDF Terms, Quads, and N-Quads Serialization
//!
//! The dataset model produced by JSON-LD expansion and consumed by the
//! URDNA2015 canonical labeling pass. Blank node labels are stored without
//! the `_:` prefix; serialization maps them through a caller-supplied
//! labeling function so the same quad can be rendered with document labels,
//! hashing placeholders (`_:a` / `_:z`), or canonical `_:c14nN` labels.

/// `rdf:type`.
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
/// `rdf:first`.
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
/// `rdf:rest`.
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
/// `rdf:nil`.
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
/// `rdf:JSON`, the datatype of `@json` literals.
pub const RDF_JSON: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON";
/// `rdf:langString`.
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
/// `xsd:string`.
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
/// `xsd:boolean`.
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
/// `xsd:integer`.
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
/// `xsd:double`.
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

/// An RDF term in subject, object, or graph-name position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    /// An absolute IRI.
    Iri(String),
    /// A blank node, labelled without the `_:` prefix.
    Blank(String),
    /// A literal. Language-tagged literals carry `rdf:langString` as datatype.
    Literal {
        /// Lexical form.
        value: String,
        /// Datatype IRI.
        datatype: String,
        /// Language tag, if any.
        language: Option<String>,
    },
}

impl Term {
    /// A typed literal.
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    /// A plain `xsd:string` literal.
    pub fn string(value: impl Into<String>) -> Self {
        Self::typed(value, XSD_STRING)
    }

    /// A language-tagged literal.
    pub fn lang_string(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: RDF_LANG_STRING.to_string(),
            language: Some(language.into()),
        }
    }

    /// The blank node label, if this term is a blank node.
    pub fn as_blank(&self) -> Option<&str> {
        match self {
            Term::Blank(label) => Some(label),
            _ => None,
        }
    }

    fn write_nquads(&self, out: &mut String, label: &dyn Fn(&str) -> String) {
        match self {
            Term::Iri(iri) => {
                out.push('<');
                out.push_str(iri);
                out.push('>');
            }
            Term::Blank(b) => out.push_str(&label(b)),
            Term::Literal {
                value,
                datatype,
                language,
            } => {
                out.push('"');
                escape_literal(value, out);
                out.push('"');
                if let Some(lang) = language {
                    out.push('@');
                    out.push_str(lang);
                } else if datatype != XSD_STRING {
                    out.push_str("^^<");
                    out.push_str(datatype);
                    out.push('>');
                }
            }
        }
    }
}

/// One statement of an RDF dataset. `graph == None` is the default graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quad {
    /// Subject (IRI or blank node).
    pub subject: Term,
    /// Predicate IRI.
    pub predicate: String,
    /// Object term.
    pub object: Term,
    /// Graph name, `None` for the default graph.
    pub graph: Option<Term>,
}

impl Quad {
    /// Blank node labels appearing in subject, object, or graph position,
    /// paired with their position marker (`s`, `o`, `g`).
    pub fn blank_components(&self) -> impl Iterator<Item = (&str, &'static str)> {
        [
            (Some(&self.subject), "s"),
            (Some(&self.object), "o"),
            (self.graph.as_ref(), "g"),
        ]
        .into_iter()
        .filter_map(|(term, pos)| term.and_then(Term::as_blank).map(|b| (b, pos)))
    }

    /// Serialize as one N-Quads line (terminated by `\n`) using the given
    /// blank node labeling function.
    pub fn to_nquad_with(&self, label: &dyn Fn(&str) -> String) -> String {
        let mut out = String::new();
        self.subject.write_nquads(&mut out, label);
        out.push_str(" <");
        out.push_str(&self.predicate);
        out.push_str("> ");
        self.object.write_nquads(&mut out, label);
        if let Some(graph) = &self.graph {
            out.push(' ');
            graph.write_nquads(&mut out, label);
        }
        out.push_str(" .\n");
        out
    }

    /// Serialize with the labels as stored.
    pub fn to_nquad(&self) -> String {
        self.to_nquad_with(&|b| format!("_:{b}"))
    }
}

/// Only quote, backslash, tab, newline and carriage return are escaped.
/// Other control characters are written through unchanged.
fn escape_literal(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_literal_omits_datatype() {
        let quad = Quad {
            subject: Term::Iri("urn:ex:s".into()),
            predicate: "urn:ex:p".into(),
            object: Term::string("hello"),
            graph: None,
        };
        assert_eq!(quad.to_nquad(), "<urn:ex:s> <urn:ex:p> \"hello\" .\n");
    }

    #[test]
    fn typed_literal_and_named_graph() {
        let quad = Quad {
            subject: Term::Blank("b0".into()),
            predicate: "urn:ex:p".into(),
            object: Term::typed("true", XSD_BOOLEAN),
            graph: Some(Term::Blank("g".into())),
        };
        assert_eq!(
            quad.to_nquad(),
            "_:b0 <urn:ex:p> \"true\"^^<http://www.w3.org/2001/XMLSchema#boolean> _:g .\n"
        );
    }

    #[test]
    fn language_literal() {
        let quad = Quad {
            subject: Term::Iri("urn:ex:s".into()),
            predicate: "urn:ex:p".into(),
            object: Term::lang_string("bonjour", "fr"),
            graph: None,
        };
        assert_eq!(quad.to_nquad(), "<urn:ex:s> <urn:ex:p> \"bonjour\"@fr .\n");
    }

    #[test]
    fn escapes_quote_backslash_and_line_breaks() {
        let mut out = String::new();
        escape_literal("a\"b\\c\nd\re\tf", &mut out);
        assert_eq!(out, "a\\\"b\\\\c\\nd\\re\\tf");
    }

    #[test]
    fn other_control_characters_pass_through() {
        let quad = Quad {
            subject: Term::Iri("urn:ex:s".into()),
            predicate: "urn:ex:p".into(),
            object: Term::string("a\u{08}b\u{0C}c\u{01}d\u{7F}"),
            graph: None,
        };
        assert_eq!(
            quad.to_nquad(),
            "<urn:ex:s> <urn:ex:p> \"a\u{08}b\u{0C}c\u{01}d\u{7F}\" .\n"
        );
    }

    #[test]
    fn blank_components_reports_positions() {
        let quad = Quad {
            subject: Term::Blank("x".into()),
            predicate: "urn:ex:p".into(),
            object: Term::Blank("y".into()),
            graph: Some(Term::Iri("urn:ex:g".into())),
        };
        let comps: Vec<_> = quad.blank_components().collect();
        assert_eq!(comps, vec![("x", "s"), ("y", "o")]);
    }
}
