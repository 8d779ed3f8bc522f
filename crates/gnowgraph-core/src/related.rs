//! Similar-item ranking over published nodetypes.
//!
//! [`RelatedIndex`] keeps one word-count vector per published nodetype and
//! ranks neighbours by cosine similarity. The index is owned by its caller;
//! nothing is shared between instances, and staleness is handled through
//! [`RelatedIndex::invalidate`] and [`RelatedIndex::invalidate_node`].

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::config::BackendsConfig;
use crate::graph::{strip_tags, Graph};
use crate::ontology::Nid;

type WordVector = BTreeMap<String, f64>;

const MIN_WORD_LEN: usize = 3;

#[derive(Debug, Clone)]
pub struct RelatedIndex {
    limit: usize,
    vectors: HashMap<Nid, WordVector>,
    built: bool,
    cache: HashMap<Nid, Vec<Nid>>,
}

impl RelatedIndex {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            vectors: HashMap::new(),
            built: false,
            cache: HashMap::new(),
        }
    }

    pub fn from_config(config: &BackendsConfig) -> Self {
        Self::new(config.related_limit)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Drops every vector and cached ranking.
    pub fn invalidate(&mut self) {
        self.vectors.clear();
        self.cache.clear();
        self.built = false;
    }

    /// Drops the vector of one node. Rankings are recomputed on next use.
    pub fn invalidate_node(&mut self, nid: Nid) {
        self.vectors.remove(&nid);
        self.cache.clear();
    }

    /// Published nodetypes most similar to `nid`, best first. Items with no
    /// word in common are left out.
    pub fn related(&mut self, graph: &Graph, nid: Nid, now: DateTime<Utc>) -> Vec<Nid> {
        self.refresh(graph, now);
        if let Some(hit) = self.cache.get(&nid) {
            return hit.clone();
        }

        let Some(target) = self.vectors.get(&nid) else {
            return Vec::new();
        };
        let mut scored: Vec<(Nid, f64)> = self
            .vectors
            .iter()
            .filter(|(other, _)| **other != nid)
            .map(|(other, vector)| (*other, cosine(target, vector)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let ranked: Vec<Nid> = scored.into_iter().take(self.limit).map(|(n, _)| n).collect();
        self.cache.insert(nid, ranked.clone());
        ranked
    }

    fn refresh(&mut self, graph: &Graph, now: DateTime<Utc>) {
        let published = graph.published_nodetypes(now);
        if !self.built {
            debug!(count = published.len(), "building related index");
            self.built = true;
        }
        self.vectors.retain(|nid, _| published.contains(nid));
        for nid in published {
            if self.vectors.contains_key(&nid) {
                continue;
            }
            if let Some(vector) = vectorize(graph, nid) {
                self.vectors.insert(nid, vector);
                self.cache.clear();
            }
        }
    }
}

impl Default for RelatedIndex {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_RELATED_LIMIT)
    }
}

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("word pattern"));

fn vectorize(graph: &Graph, nid: Nid) -> Option<WordVector> {
    let node = graph.get_node(nid)?;
    let nodetype = node.as_nodetype()?;
    let text = format!(
        "{} {} {} {}",
        node.title,
        nodetype.excerpt,
        strip_tags(&nodetype.content),
        nodetype.tags.join(" ")
    );

    let mut vector = WordVector::new();
    for word in WORD.find_iter(&text) {
        let word = word.as_str().to_lowercase();
        if word.chars().count() >= MIN_WORD_LEN {
            *vector.entry(word).or_insert(0.0) += 1.0;
        }
    }
    Some(vector)
}

fn cosine(a: &WordVector, b: &WordVector) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(word, x)| b.get(word).map(|y| x * y))
        .sum();
    let norm = |v: &WordVector| v.values().map(|x| x * x).sum::<f64>().sqrt();
    let denominator = norm(a) * norm(b);
    if denominator == 0.0 {
        0.0
    } else {
        dot / denominator
    }
}
