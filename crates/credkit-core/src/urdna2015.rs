//! # URDNA2015 Dataset Canonicalization
//!
//! Deterministic blank node relabeling for an RDF dataset, producing the
//! canonical N-Quads document used by the `eddsa-rdfc-2022` cryptosuite.
//! Blank nodes are relabeled `_:c14n0`, `_:c14n1`, ... and output lines are
//! sorted in code point order.
//!
//! Blank nodes whose first-degree hash collides with another node's are
//! disambiguated through the N-degree hash, which explores permutations of
//! related blank nodes. A group of more than eight indistinguishable related
//! nodes (over 40320 orderings, each possibly recursing) is rejected with
//! [`CanonicalizationError::PermutationLimit`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::digest::sha256_hex_str;
use crate::error::CanonicalizationError;
use crate::rdf::Quad;

/// Largest group of related blank nodes whose orderings are explored.
const MAX_PERMUTATION_ELEMENTS: usize = 8;

/// Canonicalize a dataset and return the canonical N-Quads document.
pub fn canonicalize(quads: &[Quad]) -> Result<String, CanonicalizationError> {
    let mut dataset: Vec<Quad> = quads.to_vec();
    dataset.sort();
    dataset.dedup();

    let mut state = State::new(&dataset);
    state.label()?;

    let mut lines: Vec<String> = dataset
        .iter()
        .map(|q| q.to_nquad_with(&|b| state.canonical.get(b).unwrap_or_else(|| format!("_:{b}"))))
        .collect();
    lines.sort();
    lines.dedup();
    Ok(lines.concat())
}

// ---------------------------------------------------------------------------
// Identifier issuer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct IdentifierIssuer {
    prefix: &'static str,
    counter: usize,
    issued: HashMap<String, String>,
    order: Vec<String>,
}

impl IdentifierIssuer {
    fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            counter: 0,
            issued: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn issue(&mut self, existing: &str) -> String {
        if let Some(id) = self.issued.get(existing) {
            return id.clone();
        }
        let id = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;
        self.issued.insert(existing.to_string(), id.clone());
        self.order.push(existing.to_string());
        id
    }

    fn get(&self, existing: &str) -> Option<String> {
        self.issued.get(existing).cloned()
    }

    fn has(&self, existing: &str) -> bool {
        self.issued.contains_key(existing)
    }
}

// ---------------------------------------------------------------------------
// Labeling state
// ---------------------------------------------------------------------------

struct State<'a> {
    quads: &'a [Quad],
    blank_to_quads: BTreeMap<String, Vec<usize>>,
    canonical: IdentifierIssuer,
    first_degree: HashMap<String, String>,
}

impl<'a> State<'a> {
    fn new(quads: &'a [Quad]) -> Self {
        let mut blank_to_quads: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, quad) in quads.iter().enumerate() {
            for (blank, _) in quad.blank_components() {
                let entry = blank_to_quads.entry(blank.to_string()).or_default();
                if entry.last() != Some(&i) {
                    entry.push(i);
                }
            }
        }
        Self {
            quads,
            blank_to_quads,
            canonical: IdentifierIssuer::new("_:c14n"),
            first_degree: HashMap::new(),
        }
    }

    fn label(&mut self) -> Result<(), CanonicalizationError> {
        let blanks: Vec<String> = self.blank_to_quads.keys().cloned().collect();
        let mut hash_to_blanks: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for blank in blanks {
            let hash = self.hash_first_degree(&blank);
            hash_to_blanks.entry(hash).or_default().push(blank);
        }

        let mut shared = Vec::new();
        for (_, ids) in hash_to_blanks {
            if ids.len() == 1 {
                self.canonical.issue(&ids[0]);
            } else {
                shared.push(ids);
            }
        }

        for ids in shared {
            let mut results = Vec::new();
            for id in &ids {
                if self.canonical.has(id) {
                    continue;
                }
                let mut temp = IdentifierIssuer::new("_:b");
                temp.issue(id);
                results.push(self.hash_n_degree(id, temp)?);
            }
            results.sort_by(|a, b| a.0.cmp(&b.0));
            for (_, issuer) in results {
                for existing in &issuer.order {
                    self.canonical.issue(existing);
                }
            }
        }
        Ok(())
    }

    fn hash_first_degree(&mut self, id: &str) -> String {
        if let Some(hash) = self.first_degree.get(id) {
            return hash.clone();
        }
        let mut lines: Vec<String> = self
            .blank_to_quads
            .get(id)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| {
                        self.quads[i].to_nquad_with(&|b| {
                            if b == id { "_:a".into() } else { "_:z".into() }
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        lines.sort();
        let hash = sha256_hex_str(&lines.concat());
        self.first_degree.insert(id.to_string(), hash.clone());
        hash
    }

    fn hash_related(
        &mut self,
        related: &str,
        predicate: &str,
        issuer: &IdentifierIssuer,
        position: &str,
    ) -> String {
        let id = match self.canonical.get(related).or_else(|| issuer.get(related)) {
            Some(id) => id,
            None => self.hash_first_degree(related),
        };
        let mut input = position.to_string();
        if position != "g" {
            input.push('<');
            input.push_str(predicate);
            input.push('>');
        }
        input.push_str(&id);
        sha256_hex_str(&input)
    }

    fn hash_n_degree(
        &mut self,
        id: &str,
        mut issuer: IdentifierIssuer,
    ) -> Result<(String, IdentifierIssuer), CanonicalizationError> {
        let mut hash_to_related: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let quads = self.quads;
        let indices = self.blank_to_quads.get(id).cloned().unwrap_or_default();
        for i in indices {
            let quad = &quads[i];
            let related: Vec<(String, &'static str)> = quad
                .blank_components()
                .filter(|(b, _)| *b != id)
                .map(|(b, pos)| (b.to_string(), pos))
                .collect();
            for (blank, position) in related {
                let hash = self.hash_related(&blank, &quad.predicate, &issuer, position);
                hash_to_related.entry(hash).or_default().push(blank);
            }
        }

        let mut data = String::new();
        for (related_hash, blanks) in hash_to_related {
            data.push_str(&related_hash);
            if blanks.len() > MAX_PERMUTATION_ELEMENTS {
                return Err(CanonicalizationError::PermutationLimit {
                    size: blanks.len(),
                    limit: MAX_PERMUTATION_ELEMENTS,
                });
            }

            let mut chosen_path = String::new();
            let mut chosen_issuer: Option<IdentifierIssuer> = None;

            'perm: for perm in permutations(&blanks) {
                let mut issuer_copy = issuer.clone();
                let mut path = String::new();
                let mut recursion = Vec::new();

                for related in &perm {
                    match self.canonical.get(related) {
                        Some(c) => path.push_str(&c),
                        None => {
                            if !issuer_copy.has(related) {
                                recursion.push(related.clone());
                            }
                            path.push_str(&issuer_copy.issue(related));
                        }
                    }
                    if worse(&path, &chosen_path) {
                        continue 'perm;
                    }
                }

                for related in recursion {
                    let (hash, result_issuer) = self.hash_n_degree(&related, issuer_copy.clone())?;
                    path.push_str(&issuer_copy.issue(&related));
                    path.push('<');
                    path.push_str(&hash);
                    path.push('>');
                    issuer_copy = result_issuer;
                    if worse(&path, &chosen_path) {
                        continue 'perm;
                    }
                }

                if chosen_path.is_empty() || path < chosen_path {
                    chosen_path = path;
                    chosen_issuer = Some(issuer_copy);
                }
            }

            data.push_str(&chosen_path);
            if let Some(chosen) = chosen_issuer {
                issuer = chosen;
            }
        }

        Ok((sha256_hex_str(&data), issuer))
    }
}

fn worse(path: &str, chosen: &str) -> bool {
    !chosen.is_empty() && path.len() >= chosen.len() && path > chosen
}

/// All orderings of `items`, deduplicated, in lexicographic order.
fn permutations(items: &[String]) -> Vec<Vec<String>> {
    let mut sorted = items.to_vec();
    sorted.sort();
    let mut out = BTreeSet::new();
    permute(&mut sorted, 0, &mut out);
    out.into_iter().collect()
}

fn permute(items: &mut Vec<String>, k: usize, out: &mut BTreeSet<Vec<String>>) {
    if k == items.len() {
        out.insert(items.clone());
        return;
    }
    for i in k..items.len() {
        items.swap(k, i);
        permute(items, k + 1, out);
        items.swap(k, i);
    }
}
