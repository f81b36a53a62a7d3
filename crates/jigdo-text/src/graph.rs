use std::collections::HashMap;

use crate::error::TextError;

/// If two mappings score equally, the order servers are tried in should
/// be random, so gazillions of clients with default settings don't all
/// hammer the first server in a list. Node weights are perturbed by a
/// small random value in `[-RANDOM_INIT_RANGE, RANDOM_INIT_RANGE)` at
/// creation time.
pub const RANDOM_INIT_RANGE: f64 = 1.0 / 32.0;

/// Opaque handle to a node in a [`UrlGraph`].
pub type NodeId = usize;

#[derive(Debug, Clone)]
struct Node {
    url: String,
    prepend: Option<NodeId>,
    next: Option<NodeId>,
    weight: f64,
}

/// The directed acyclic graph implied by a `.jigdo` file's `[Parts]` and
/// `[Servers]` entries: for each component md5sum, a set of alternative
/// URL fragments, each of which may have a label prepended that itself
/// expands (transitively) to one or more URL fragments (spec.md §4.6
/// "Substitution graph").
#[derive(Debug, Clone, Default)]
pub struct UrlGraph {
    nodes: Vec<Node>,
    servers: HashMap<String, NodeId>,
    parts: HashMap<[u8; 16], NodeId>,
}

fn random_weight() -> f64 {
    rand::random::<f64>() * (2.0 * RANDOM_INIT_RANGE) - RANDOM_INIT_RANGE
}

/// Find the offset of the `:` that separates a `Label` from the rest of
/// a `Label:some/path` string, or `None` if `url` is a plain path/URL
/// with no label prefix. A leading run of label-safe characters (ASCII
/// alphanumerics, `-`, `_`, `.`) followed by `:` is treated as a label;
/// this also matches absolute URLs like `http://host/`, whose scheme
/// becomes an ordinary (implicitly defined) label.
fn find_label_colon(url: &str) -> Option<usize> {
    let colon = url.find(':')?;
    if colon == 0 {
        return None;
    }
    let prefix = url.as_bytes()[..colon].iter().all(|&b| {
        b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.'
    });
    prefix.then_some(colon)
}

/// Resolve `value` against `base_url` if `value` is not itself absolute
/// (has no `Label:`/scheme prefix) and `base_url` is non-empty.
fn resolve(base_url: &str, value: &str) -> String {
    if value.is_empty() || find_label_colon(value).is_some() || base_url.is_empty() {
        return value.to_string();
    }
    if base_url.ends_with('/') {
        format!("{base_url}{value}")
    } else {
        format!("{base_url}/{value}")
    }
}

impl UrlGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, url: String) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            url,
            prepend: None,
            next: None,
            weight: random_weight(),
        });
        id
    }

    fn find_or_create_server(&mut self, label: &str) -> NodeId {
        if let Some(&id) = self.servers.get(label) {
            return id;
        }
        let id = self.alloc(format!("{label}:"));
        self.servers.insert(label.to_string(), id);
        id
    }

    fn is_dummy(&self, id: NodeId) -> bool {
        self.nodes[id].url.ends_with(':')
    }

    fn append_next(&mut self, head: NodeId, new_id: NodeId) {
        let mut cur = head;
        while let Some(next) = self.nodes[cur].next {
            cur = next;
        }
        self.nodes[cur].next = Some(new_id);
    }

    fn apply_label(&mut self, node_id: NodeId, cycle_guard: NodeId, value: &str) -> Result<(), TextError> {
        match find_label_colon(value) {
            None => {
                self.nodes[node_id].url = value.to_string();
            }
            Some(colon) => {
                let label = &value[..colon];
                let prepend = self.find_or_create_server(label);

                let mut cursor = Some(prepend);
                while let Some(c) = cursor {
                    if c == cycle_guard {
                        self.nodes[node_id].prepend = None;
                        return Err(TextError::RecursiveLabel {
                            label: label.to_string(),
                        });
                    }
                    cursor = self.nodes[c].prepend;
                }

                self.nodes[node_id].prepend = Some(prepend);
                self.nodes[node_id].url = value[colon + 1..].to_string();
            }
        }
        Ok(())
    }

    fn apply_options(&mut self, node_id: NodeId, options: &[String]) {
        for opt in options {
            if let Some(rest) = opt.strip_prefix("--try-first") {
                if rest.is_empty() {
                    self.nodes[node_id].weight += 1.0;
                } else if let Some(v) = rest.strip_prefix('=') {
                    if let Ok(d) = v.parse::<f64>() {
                        self.nodes[node_id].weight += d;
                    }
                }
            } else if let Some(rest) = opt.strip_prefix("--try-last") {
                if rest.is_empty() {
                    self.nodes[node_id].weight -= 1.0;
                } else if let Some(v) = rest.strip_prefix('=') {
                    if let Ok(d) = v.parse::<f64>() {
                        self.nodes[node_id].weight -= d;
                    }
                }
            }
        }
    }

    /// Add a `[Parts]` entry: `words[0]` is the URL (absolute, relative
    /// to `base_url`, or `Label:some/path`), `words[1..]` are options.
    /// Multiple entries for the same `md5` accumulate as alternatives.
    pub fn add_part(&mut self, base_url: &str, md5: [u8; 16], words: &[String]) -> Result<(), TextError> {
        let Some(first) = words.first() else {
            return Err(TextError::EmptyValue {
                label: hex(&md5),
            });
        };
        let value = resolve(base_url, first);
        let node_id = self.alloc(String::new());
        self.apply_label(node_id, node_id, &value)?;
        self.apply_options(node_id, &words[1..]);

        match self.parts.get(&md5).copied() {
            Some(head) => self.append_next(head, node_id),
            None => {
                self.parts.insert(md5, node_id);
            }
        }
        Ok(())
    }

    /// Add a `[Servers]` entry: a line `label=words[0] words[1..]` where
    /// `words[0]` is a URL (absolute, relative to `base_url`, or
    /// `Label:some/path`) and the rest are options.
    pub fn add_server(&mut self, base_url: &str, label: &str, words: &[String]) -> Result<(), TextError> {
        let Some(first) = words.first() else {
            return Err(TextError::EmptyValue {
                label: label.to_string(),
            });
        };
        let value = resolve(base_url, first);

        let (node_id, cycle_guard) = match self.servers.get(label).copied() {
            None => {
                let id = self.alloc(String::new());
                self.servers.insert(label.to_string(), id);
                (id, id)
            }
            Some(head) if self.is_dummy(head) => (head, head),
            Some(head) => {
                let new_id = self.alloc(String::new());
                self.append_next(head, new_id);
                (new_id, head)
            }
        };

        self.apply_label(node_id, cycle_guard, &value)?;
        self.apply_options(node_id, &words[1..]);
        Ok(())
    }

    /// Start enumerating URLs for the component with the given md5sum.
    /// Returns `None` if no `[Parts]` entry exists for it.
    pub fn enumerate(&self, md5: &[u8; 16]) -> Option<UrlEnumerator> {
        self.parts.get(md5).map(|&head| UrlEnumerator::new(head))
    }

    fn walk(
        &self,
        path: &mut Vec<NodeId>,
        mapping: NodeId,
        score: f64,
        path_len: u32,
        serial: &mut u32,
        best_score: &mut f64,
        best_path: &mut Vec<NodeId>,
        best_serial: &mut u32,
        seen: &std::collections::HashSet<u32>,
    ) {
        let node = &self.nodes[mapping];
        let score = score + node.weight;
        let path_len = path_len + 1;

        match node.prepend {
            None => {
                *serial += 1;
                let path_score = score / f64::from(path_len);
                if path_score > *best_score && !seen.contains(serial) {
                    *best_score = path_score;
                    *best_serial = *serial;
                    best_path.clear();
                    best_path.push(mapping);
                    best_path.extend(path.iter().rev());
                }
            }
            Some(prepend_head) => {
                path.push(mapping);
                let mut next = Some(prepend_head);
                while let Some(m) = next {
                    self.walk(path, m, score, path_len, serial, best_score, best_path, best_serial, seen);
                    next = self.nodes[m].next;
                }
                path.pop();
            }
        }
    }
}

fn hex(bytes: &[u8; 16]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Enumerates URLs for one component's md5sum in best-first order,
/// without repeating a URL already returned (spec.md §4.6 "URL
/// enumeration"). Each call to [`UrlEnumerator::next`] re-scans the
/// whole graph reachable from this part, which is cheap for the small
/// graphs typical `.jigdo` files produce.
pub struct UrlEnumerator {
    head: NodeId,
    seen: std::collections::HashSet<u32>,
}

impl UrlEnumerator {
    fn new(head: NodeId) -> Self {
        Self {
            head,
            seen: std::collections::HashSet::new(),
        }
    }

    /// Return the next-best unvisited URL, or `None` once every path has
    /// been returned.
    pub fn next(&mut self, graph: &UrlGraph) -> Option<String> {
        let mut serial = 0u32;
        let mut best_score = f64::NEG_INFINITY;
        let mut best_serial = 0u32;
        let mut best_path = Vec::new();
        let mut path = Vec::new();

        let mut mapping = Some(self.head);
        while let Some(m) = mapping {
            graph.walk(
                &mut path,
                m,
                0.0,
                0,
                &mut serial,
                &mut best_score,
                &mut best_path,
                &mut best_serial,
                &self.seen,
            );
            mapping = graph.nodes[m].next;
        }

        if best_serial == 0 {
            return None;
        }
        self.seen.insert(best_serial);
        Some(best_path.iter().map(|&n| graph.nodes[n].url.as_str()).collect())
    }
}
