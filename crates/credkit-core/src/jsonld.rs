//! # JSON-LD to RDF
//!
//! Converts a compacted JSON-LD document into an RDF dataset. The processor
//! covers the JSON-LD 1.1 features used by credential contexts: remote and
//! inline contexts, `@vocab`, compact IRIs, keyword aliases, type coercion
//! (`@id`, `@vocab`, `@json`, datatypes), default and per-term `@language`,
//! `@set`, `@list`, `@graph`, `@language` and `@index` containers,
//! property-scoped contexts, and non-propagating type-scoped contexts.
//!
//! Literal conversion follows the Python JSON-LD processor: JSON numbers
//! written with a fraction or exponent are `xsd:double` even when integral,
//! and `@direction` is accepted but not represented in RDF.
//!
//! Constructs outside that subset (`@reverse`, `@import`, `@included`,
//! `@nest`, id and type maps) and node identifiers that do not resolve to
//! an absolute IRI fail with [`CanonicalizationError::Invalid`] rather than
//! being dropped. Two documents that differ must never canonicalize to the
//! same bytes.

use std::collections::HashMap;

use serde_json::{Map, Number, Value};

use crate::error::CanonicalizationError;
use crate::loader::DocumentLoader;
use crate::rdf::{
    Quad, Term, RDF_FIRST, RDF_JSON, RDF_NIL, RDF_REST, RDF_TYPE, XSD_BOOLEAN, XSD_DOUBLE,
    XSD_INTEGER,
};

const MAX_CONTEXT_DEPTH: usize = 32;

const KEYWORDS: &[&str] = &[
    "@base",
    "@container",
    "@context",
    "@direction",
    "@graph",
    "@id",
    "@import",
    "@included",
    "@index",
    "@json",
    "@language",
    "@list",
    "@nest",
    "@none",
    "@prefix",
    "@propagate",
    "@protected",
    "@reverse",
    "@set",
    "@type",
    "@value",
    "@version",
    "@vocab",
];

fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

/// Convert a JSON-LD document to RDF quads, resolving remote contexts
/// through `loader`.
pub fn to_rdf(document: &Value, loader: &dyn DocumentLoader) -> Result<Vec<Quad>, CanonicalizationError> {
    let mut converter = Converter {
        loader,
        remote: HashMap::new(),
        blank_ids: HashMap::new(),
        next_blank: 0,
        quads: Vec::new(),
    };
    let root = ActiveContext::default();
    match document {
        Value::Object(node) => {
            converter.node(&root, None, node, None)?;
        }
        Value::Array(items) => {
            for item in items {
                let Value::Object(node) = item else {
                    return Err(CanonicalizationError::invalid("top-level array entries must be objects"));
                };
                converter.node(&root, None, node, None)?;
            }
        }
        _ => return Err(CanonicalizationError::invalid("document must be a JSON object")),
    }
    Ok(converter.quads)
}

// ---------------------------------------------------------------------------
// Active context
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct TermDefinition {
    /// `None` when the term is explicitly mapped to null.
    iri: Option<String>,
    type_mapping: Option<String>,
    /// `Some(None)` when the term resets the default language.
    language: Option<Option<String>>,
    containers: Vec<String>,
    context: Option<Value>,
}

impl TermDefinition {
    fn has_container(&self, container: &str) -> bool {
        self.containers.iter().any(|c| c == container)
    }
}

/// Language of a plain string value of a property defined by `def`.
fn string_language(ctx: &ActiveContext, def: Option<&TermDefinition>) -> Option<String> {
    match def.and_then(|d| d.language.as_ref()) {
        Some(language) => language.clone(),
        None => ctx.language.clone(),
    }
}

#[derive(Debug, Clone, Default)]
struct ActiveContext {
    terms: HashMap<String, TermDefinition>,
    vocab: Option<String>,
    base: Option<String>,
    /// Default language, lowercased.
    language: Option<String>,
    /// Context to revert to when entering a new node object, set by
    /// non-propagating (type-scoped) contexts.
    previous: Option<Box<ActiveContext>>,
}

impl ActiveContext {
    fn expand_iri(&self, value: &str, vocab: bool) -> Option<String> {
        if value.starts_with('@') {
            return is_keyword(value).then(|| value.to_string());
        }
        if vocab {
            if let Some(def) = self.terms.get(value) {
                return def.iri.clone();
            }
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix == "_" || suffix.starts_with("//") {
                return Some(value.to_string());
            }
            if let Some(iri) = self.terms.get(prefix).and_then(|d| d.iri.as_ref()) {
                return Some(format!("{iri}{suffix}"));
            }
            return Some(value.to_string());
        }
        if vocab {
            if let Some(v) = &self.vocab {
                return Some(format!("{v}{value}"));
            }
        }
        match &self.base {
            Some(base) => Some(resolve_relative(base, value)),
            None => Some(value.to_string()),
        }
    }
}

fn resolve_relative(base: &str, value: &str) -> String {
    if value.is_empty() {
        return base.to_string();
    }
    if value.starts_with('#') {
        let stem = base.split('#').next().unwrap_or(base);
        return format!("{stem}{value}");
    }
    match base.rfind('/') {
        Some(pos) => format!("{}{}", &base[..=pos], value),
        None => format!("{base}{value}"),
    }
}

fn is_absolute_iri(s: &str) -> bool {
    match s.split_once(':') {
        Some((scheme, _)) => {
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn as_array(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

struct Converter<'l> {
    loader: &'l dyn DocumentLoader,
    remote: HashMap<String, Value>,
    blank_ids: HashMap<String, String>,
    next_blank: usize,
    quads: Vec<Quad>,
}

impl Converter<'_> {
    // -- context processing ------------------------------------------------

    fn process_context(
        &mut self,
        active: &ActiveContext,
        local: &Value,
        propagate: bool,
        depth: usize,
    ) -> Result<ActiveContext, CanonicalizationError> {
        if depth > MAX_CONTEXT_DEPTH {
            return Err(CanonicalizationError::invalid("context nesting too deep"));
        }
        let propagate = match local {
            Value::Object(m) => m.get("@propagate").and_then(Value::as_bool).unwrap_or(propagate),
            _ => propagate,
        };
        let mut result = active.clone();
        if !propagate && result.previous.is_none() {
            result.previous = Some(Box::new(active.clone()));
        }

        for item in as_array(local) {
            match item {
                Value::Null => {
                    let previous = result.previous.take();
                    result = ActiveContext {
                        previous,
                        ..ActiveContext::default()
                    };
                }
                Value::String(url) => {
                    let context = self.remote_context(url)?;
                    result = self.process_context(&result, &context, true, depth + 1)?;
                }
                Value::Object(map) => {
                    self.apply_context_object(&mut result, map)?;
                }
                other => {
                    return Err(CanonicalizationError::invalid(format!(
                        "invalid @context entry: {other}"
                    )))
                }
            }
        }
        Ok(result)
    }

    fn remote_context(&mut self, url: &str) -> Result<Value, CanonicalizationError> {
        if let Some(ctx) = self.remote.get(url) {
            return Ok(ctx.clone());
        }
        let doc = self.loader.load(url)?;
        let ctx = doc
            .document
            .get("@context")
            .cloned()
            .ok_or_else(|| CanonicalizationError::ContextLoad {
                url: url.to_string(),
                reason: "document has no @context".into(),
            })?;
        self.remote.insert(url.to_string(), ctx.clone());
        Ok(ctx)
    }

    fn apply_context_object(
        &mut self,
        active: &mut ActiveContext,
        local: &Map<String, Value>,
    ) -> Result<(), CanonicalizationError> {
        if local.contains_key("@import") {
            return Err(CanonicalizationError::invalid("@import is not supported"));
        }
        if let Some(base) = local.get("@base") {
            active.base = base.as_str().map(str::to_string);
        }
        if let Some(vocab) = local.get("@vocab") {
            active.vocab = match vocab {
                Value::Null => None,
                Value::String(v) => active.expand_iri(v, true),
                other => {
                    return Err(CanonicalizationError::invalid(format!("invalid @vocab: {other}")))
                }
            };
        }
        if let Some(language) = local.get("@language") {
            active.language = parse_language(language)?;
        }
        if let Some(direction) = local.get("@direction") {
            parse_direction(direction)?;
        }
        let mut defined: HashMap<String, bool> = HashMap::new();
        for term in local.keys() {
            if term.starts_with('@') {
                continue;
            }
            define_term(active, local, term, &mut defined)?;
        }
        Ok(())
    }

    // -- node objects ------------------------------------------------------

    fn node(
        &mut self,
        active: &ActiveContext,
        scoped: Option<&Value>,
        node: &Map<String, Value>,
        graph: Option<&Term>,
    ) -> Result<Term, CanonicalizationError> {
        let mut ctx = match &active.previous {
            Some(previous) => (**previous).clone(),
            None => active.clone(),
        };
        if let Some(scoped) = scoped {
            ctx = self.process_context(&ctx, scoped, true, 0)?;
        }
        if let Some(local) = node.get("@context") {
            ctx = self.process_context(&ctx, local, true, 0)?;
        }

        // Type-scoped contexts apply in lexical order of the type terms and
        // do not propagate into nested nodes.
        let type_ctx = ctx.clone();
        let mut type_terms: Vec<&str> = node
            .iter()
            .filter(|(k, _)| type_ctx.expand_iri(k, true).as_deref() == Some("@type"))
            .flat_map(|(_, v)| as_array(v))
            .filter_map(Value::as_str)
            .collect();
        type_terms.sort_unstable();
        for t in &type_terms {
            if let Some(scoped) = type_ctx.terms.get(*t).and_then(|d| d.context.clone()) {
                ctx = self.process_context(&ctx, &scoped, false, 0)?;
            }
        }

        let mut keys: Vec<(&String, String)> = node
            .keys()
            .filter_map(|k| ctx.expand_iri(k, true).map(|e| (k, e)))
            .collect();
        keys.sort();

        let mut subject: Option<Term> = None;
        for (key, expanded) in &keys {
            if expanded == "@id" {
                let id = node[key.as_str()]
                    .as_str()
                    .ok_or_else(|| CanonicalizationError::invalid("@id must be a string"))?;
                subject = Some(self.iri_term(ctx.expand_iri(id, false), id)?);
            }
        }
        let has_id = subject.is_some();
        let subject = match subject {
            Some(s) => s,
            None => self.fresh_blank(),
        };

        let wrapper_only = !has_id
            && keys
                .iter()
                .all(|(_, e)| e == "@graph" || e == "@context");

        for (key, expanded) in &keys {
            let value = &node[key.as_str()];
            match expanded.as_str() {
                "@context" | "@id" | "@index" => {}
                "@type" => {
                    for t in as_array(value) {
                        let t = t
                            .as_str()
                            .ok_or_else(|| CanonicalizationError::invalid("@type values must be strings"))?;
                        let object = self.iri_term(type_ctx.expand_iri(t, true), t)?;
                        self.emit(&subject, RDF_TYPE, object, graph);
                    }
                }
                "@graph" => {
                    let target = if wrapper_only { graph.cloned() } else { Some(subject.clone()) };
                    for item in as_array(value) {
                        let Value::Object(inner) = item else {
                            return Err(CanonicalizationError::invalid("@graph entries must be objects"));
                        };
                        self.node(&ctx, None, inner, target.as_ref())?;
                    }
                }
                "@reverse" | "@included" | "@nest" => {
                    return Err(CanonicalizationError::invalid(format!("{expanded} is not supported")))
                }
                "@value" | "@list" | "@set" | "@language" | "@direction" => {
                    return Err(CanonicalizationError::invalid(format!(
                        "{expanded} is not valid in a node object"
                    )))
                }
                k if k.starts_with('@') => {}
                predicate => {
                    if !is_absolute_iri(predicate) {
                        continue;
                    }
                    let def = ctx.terms.get(key.as_str()).cloned();
                    self.property(&ctx, &subject, predicate, def.as_ref(), value, graph)?;
                }
            }
        }

        Ok(subject)
    }

    fn property(
        &mut self,
        ctx: &ActiveContext,
        subject: &Term,
        predicate: &str,
        def: Option<&TermDefinition>,
        value: &Value,
        graph: Option<&Term>,
    ) -> Result<(), CanonicalizationError> {
        let scoped = def.and_then(|d| d.context.as_ref());
        let has = |c: &str| def.map_or(false, |d| d.has_container(c));

        if has("@id") || has("@type") {
            return Err(CanonicalizationError::invalid("id and type maps are not supported"));
        }
        if has("@list") {
            let items = as_array(value);
            let head = self.list(ctx, def, scoped, &items, graph)?;
            self.emit(subject, predicate, head, graph);
            return Ok(());
        }
        if has("@language") {
            if let Value::Object(map) = value {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                for (lang, v) in entries {
                    for s in as_array(v) {
                        match s {
                            Value::Null => {}
                            Value::String(s) => {
                                let object = if lang == "@none" {
                                    Term::string(s.clone())
                                } else {
                                    Term::lang_string(s.clone(), lang.to_lowercase())
                                };
                                self.emit(subject, predicate, object, graph);
                            }
                            _ => {
                                return Err(CanonicalizationError::invalid(
                                    "language map values must be strings",
                                ))
                            }
                        }
                    }
                }
                return Ok(());
            }
        }
        if has("@index") {
            if let Value::Object(map) = value {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                for (_, v) in entries {
                    for object in self.objects(ctx, def, scoped, v, graph)? {
                        self.emit(subject, predicate, object, graph);
                    }
                }
                return Ok(());
            }
        }
        if has("@graph") {
            for item in as_array(value) {
                let Value::Object(inner) = item else {
                    return Err(CanonicalizationError::invalid("graph container values must be objects"));
                };
                let name = self.fresh_blank();
                self.node(ctx, scoped, inner, Some(&name))?;
                self.emit(subject, predicate, name, graph);
            }
            return Ok(());
        }

        for object in self.objects(ctx, def, scoped, value, graph)? {
            self.emit(subject, predicate, object, graph);
        }
        Ok(())
    }

    /// Convert a property value into zero or more object terms.
    fn objects(
        &mut self,
        ctx: &ActiveContext,
        def: Option<&TermDefinition>,
        scoped: Option<&Value>,
        value: &Value,
        graph: Option<&Term>,
    ) -> Result<Vec<Term>, CanonicalizationError> {
        let type_mapping = def.and_then(|d| d.type_mapping.as_deref());
        if type_mapping == Some("@json") {
            return Ok(vec![json_literal(value)?]);
        }
        let term = match value {
            Value::Null => return Ok(Vec::new()),
            Value::Array(items) => {
                let mut out = Vec::new();
                for item in items {
                    out.extend(self.objects(ctx, def, scoped, item, graph)?);
                }
                return Ok(out);
            }
            Value::Bool(b) => match type_mapping {
                Some(dt) if !dt.starts_with('@') => Term::typed(b.to_string(), dt),
                _ => Term::typed(b.to_string(), XSD_BOOLEAN),
            },
            Value::Number(n) => match type_mapping {
                Some(dt) if !dt.starts_with('@') => number_literal(n, Some(dt)),
                _ => number_literal(n, None),
            },
            Value::String(s) => match type_mapping {
                Some("@id") => self.iri_term(ctx.expand_iri(s, false), s)?,
                Some("@vocab") => self.iri_term(ctx.expand_iri(s, true), s)?,
                Some(dt) if !dt.starts_with('@') => Term::typed(s.clone(), dt),
                _ => match string_language(ctx, def) {
                    Some(language) => Term::lang_string(s.clone(), language),
                    None => Term::string(s.clone()),
                },
            },
            Value::Object(map) => return self.object_value(ctx, def, scoped, map, graph),
        };
        Ok(vec![term])
    }

    fn object_value(
        &mut self,
        ctx: &ActiveContext,
        def: Option<&TermDefinition>,
        scoped: Option<&Value>,
        map: &Map<String, Value>,
        graph: Option<&Term>,
    ) -> Result<Vec<Term>, CanonicalizationError> {
        let value_ctx = match scoped {
            Some(sc) => self.process_context(ctx, sc, true, 0)?,
            None => ctx.clone(),
        };
        let mut by_keyword: HashMap<String, &Value> = HashMap::new();
        for (k, v) in map {
            if let Some(e) = value_ctx.expand_iri(k, true) {
                if e.starts_with('@') {
                    by_keyword.insert(e, v);
                }
            }
        }

        if let Some(v) = by_keyword.get("@value") {
            let datatype = match by_keyword.get("@type") {
                Some(Value::String(t)) => value_ctx.expand_iri(t, true),
                Some(_) => return Err(CanonicalizationError::invalid("value @type must be a string")),
                None => None,
            };
            if datatype.as_deref() == Some("@json") {
                return Ok(vec![json_literal(v)?]);
            }
            let language = by_keyword.get("@language").and_then(|l| l.as_str());
            let term = match (v, datatype, language) {
                (Value::Null, _, _) => return Ok(Vec::new()),
                (Value::String(s), None, Some(lang)) => Term::lang_string(s.clone(), lang.to_lowercase()),
                (Value::String(s), Some(dt), _) => Term::typed(s.clone(), dt),
                (Value::String(s), None, None) => Term::string(s.clone()),
                (Value::Bool(b), Some(dt), _) => Term::typed(b.to_string(), dt),
                (Value::Bool(b), None, _) => Term::typed(b.to_string(), XSD_BOOLEAN),
                (Value::Number(n), Some(dt), _) => number_literal(n, Some(dt.as_str())),
                (Value::Number(n), None, _) => number_literal(n, None),
                _ => return Err(CanonicalizationError::invalid("@value must be a scalar")),
            };
            return Ok(vec![term]);
        }
        if let Some(list) = by_keyword.get("@list") {
            let items = as_array(list);
            return Ok(vec![self.list(ctx, def, scoped, &items, graph)?]);
        }
        if let Some(set) = by_keyword.get("@set") {
            return self.objects(ctx, def, scoped, set, graph);
        }
        Ok(vec![self.node(ctx, scoped, map, graph)?])
    }

    fn list(
        &mut self,
        ctx: &ActiveContext,
        def: Option<&TermDefinition>,
        scoped: Option<&Value>,
        items: &[&Value],
        graph: Option<&Term>,
    ) -> Result<Term, CanonicalizationError> {
        let mut terms = Vec::new();
        for item in items {
            terms.extend(self.objects(ctx, def, scoped, item, graph)?);
        }
        if terms.is_empty() {
            return Ok(Term::Iri(RDF_NIL.to_string()));
        }
        let nodes: Vec<Term> = (0..terms.len()).map(|_| self.fresh_blank()).collect();
        for (i, term) in terms.into_iter().enumerate() {
            self.emit(&nodes[i], RDF_FIRST, term, graph);
            let rest = nodes
                .get(i + 1)
                .cloned()
                .unwrap_or_else(|| Term::Iri(RDF_NIL.to_string()));
            self.emit(&nodes[i], RDF_REST, rest, graph);
        }
        Ok(nodes[0].clone())
    }

    // -- terms -------------------------------------------------------------

    /// Term for an expanded identifier. `original` is the compact form,
    /// reported when it does not expand to a blank node or absolute IRI.
    fn iri_term(
        &mut self,
        expanded: Option<String>,
        original: &str,
    ) -> Result<Term, CanonicalizationError> {
        match expanded {
            Some(iri) if iri.starts_with("_:") => Ok(self.document_blank(&iri[2..])),
            Some(iri) if is_absolute_iri(&iri) => Ok(Term::Iri(iri)),
            _ => Err(CanonicalizationError::invalid(format!(
                "{original} does not resolve to an absolute IRI"
            ))),
        }
    }

    fn document_blank(&mut self, label: &str) -> Term {
        if let Some(id) = self.blank_ids.get(label) {
            return Term::Blank(id.clone());
        }
        let id = self.fresh_label();
        self.blank_ids.insert(label.to_string(), id.clone());
        Term::Blank(id)
    }

    fn fresh_label(&mut self) -> String {
        let id = format!("b{}", self.next_blank);
        self.next_blank += 1;
        id
    }

    fn fresh_blank(&mut self) -> Term {
        Term::Blank(self.fresh_label())
    }

    fn emit(&mut self, subject: &Term, predicate: &str, object: Term, graph: Option<&Term>) {
        self.quads.push(Quad {
            subject: subject.clone(),
            predicate: predicate.to_string(),
            object,
            graph: graph.cloned(),
        });
    }
}

// ---------------------------------------------------------------------------
// Term definitions
// ---------------------------------------------------------------------------

fn define_term(
    active: &mut ActiveContext,
    local: &Map<String, Value>,
    term: &str,
    defined: &mut HashMap<String, bool>,
) -> Result<(), CanonicalizationError> {
    match defined.get(term) {
        Some(true) => return Ok(()),
        Some(false) => {
            return Err(CanonicalizationError::invalid(format!("cyclic IRI mapping for term {term}")))
        }
        None => {}
    }
    defined.insert(term.to_string(), false);

    let value = local.get(term).cloned().unwrap_or(Value::Null);
    let def = match &value {
        Value::Null => TermDefinition::default(),
        Value::String(s) => TermDefinition {
            iri: Some(expand_for_definition(active, local, s, defined)?),
            ..TermDefinition::default()
        },
        Value::Object(m) => {
            if m.contains_key("@reverse") {
                return Err(CanonicalizationError::invalid(format!(
                    "reverse property {term} is not supported"
                )));
            }
            if m.contains_key("@nest") {
                return Err(CanonicalizationError::invalid(format!("@nest on {term} is not supported")));
            }
            let iri = match m.get("@id") {
                Some(Value::Null) => None,
                Some(Value::String(id)) => Some(expand_for_definition(active, local, id, defined)?),
                Some(other) => {
                    return Err(CanonicalizationError::invalid(format!("invalid @id for {term}: {other}")))
                }
                None if term.contains(':') => Some(expand_for_definition(active, local, term, defined)?),
                None => match &active.vocab {
                    Some(v) => Some(format!("{v}{term}")),
                    None => {
                        return Err(CanonicalizationError::invalid(format!(
                            "term {term} has no IRI mapping"
                        )))
                    }
                },
            };
            let type_mapping = match m.get("@type") {
                None => None,
                Some(Value::String(t)) if is_keyword(t) => Some(t.clone()),
                Some(Value::String(t)) => Some(expand_for_definition(active, local, t, defined)?),
                Some(other) => {
                    return Err(CanonicalizationError::invalid(format!("invalid @type for {term}: {other}")))
                }
            };
            let containers = match m.get("@container") {
                None | Some(Value::Null) => Vec::new(),
                Some(c) => as_array(c)
                    .into_iter()
                    .map(|v| {
                        v.as_str().map(str::to_string).ok_or_else(|| {
                            CanonicalizationError::invalid(format!("invalid @container for {term}"))
                        })
                    })
                    .collect::<Result<_, _>>()?,
            };
            let language = match m.get("@language") {
                Some(l) if type_mapping.is_none() => Some(parse_language(l)?),
                _ => None,
            };
            if let Some(direction) = m.get("@direction") {
                parse_direction(direction)?;
            }
            TermDefinition {
                iri,
                type_mapping,
                language,
                containers,
                context: m.get("@context").cloned(),
            }
        }
        other => {
            return Err(CanonicalizationError::invalid(format!(
                "invalid definition for {term}: {other}"
            )))
        }
    };

    active.terms.insert(term.to_string(), def);
    defined.insert(term.to_string(), true);
    Ok(())
}

fn parse_language(value: &Value) -> Result<Option<String>, CanonicalizationError> {
    match value {
        Value::Null => Ok(None),
        Value::String(l) => Ok(Some(l.to_lowercase())),
        other => Err(CanonicalizationError::invalid(format!("invalid @language: {other}"))),
    }
}

/// Base direction is validated only; it has no RDF representation here.
fn parse_direction(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null => Ok(()),
        Value::String(d) if d == "ltr" || d == "rtl" => Ok(()),
        other => Err(CanonicalizationError::invalid(format!("invalid @direction: {other}"))),
    }
}

/// IRI expansion while a context is being processed: terms referenced from
/// the same local context are defined first.
fn expand_for_definition(
    active: &mut ActiveContext,
    local: &Map<String, Value>,
    value: &str,
    defined: &mut HashMap<String, bool>,
) -> Result<String, CanonicalizationError> {
    if is_keyword(value) {
        return Ok(value.to_string());
    }
    if let Some((prefix, suffix)) = value.split_once(':') {
        if prefix == "_" || suffix.starts_with("//") {
            return Ok(value.to_string());
        }
        if local.contains_key(prefix) && defined.get(prefix) != Some(&true) {
            define_term(active, local, prefix, defined)?;
        }
        if let Some(iri) = active.terms.get(prefix).and_then(|d| d.iri.as_ref()) {
            return Ok(format!("{iri}{suffix}"));
        }
        return Ok(value.to_string());
    }
    if local.contains_key(value) && defined.get(value) != Some(&true) {
        define_term(active, local, value, defined)?;
    }
    if let Some(def) = active.terms.get(value) {
        if let Some(iri) = &def.iri {
            return Ok(iri.clone());
        }
    }
    match &active.vocab {
        Some(v) => Ok(format!("{v}{value}")),
        None => Err(CanonicalizationError::invalid(format!("cannot expand {value} to an IRI"))),
    }
}

// ---------------------------------------------------------------------------
// Literals
// ---------------------------------------------------------------------------

fn json_literal(value: &Value) -> Result<Term, CanonicalizationError> {
    let canonical = serde_jcs::to_string(value)?;
    Ok(Term::typed(canonical, RDF_JSON))
}

/// Literal for a JSON number. Integers keep their digits; numbers parsed
/// as floating point, or coerced to `xsd:double`, use the double form.
fn number_literal(n: &Number, datatype: Option<&str>) -> Term {
    let integer = n
        .as_i64()
        .map(|i| i.to_string())
        .or_else(|| n.as_u64().map(|u| u.to_string()));
    match integer {
        Some(lexical) if datatype != Some(XSD_DOUBLE) => {
            Term::typed(lexical, datatype.unwrap_or(XSD_INTEGER))
        }
        _ => {
            let f = n.as_f64().unwrap_or_default();
            Term::typed(double_lexical(f), datatype.unwrap_or(XSD_DOUBLE))
        }
    }
}

/// Double lexical form: 16 significant digits, trailing zeros trimmed for
/// non-negative exponents (`1.5E0`, `1.0E21`), untouched for negative ones
/// (`1.000000000000000E-07`).
fn double_lexical(f: f64) -> String {
    let formatted = format!("{f:.15E}");
    let Some((mantissa, exp)) = formatted.split_once('E') else {
        return formatted;
    };
    let exp: i32 = exp.parse().unwrap_or_default();
    if exp < 0 {
        return format!("{mantissa}E-{:02}", -exp);
    }
    let trimmed = mantissa.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0E{exp}")
    } else {
        format!("{trimmed}E{exp}")
    }
}
