//! GML (Graph Modelling Language) reader and writer.
//!
//! Only the subset needed for quantum networks is interpreted: a top-level
//! `graph [...]` block with `directed 1`, `node` blocks carrying `id`,
//! `label` and `type`, and `edge` blocks carrying `source`, `target` and
//! `capacity`. Unknown keys are parsed and ignored.
//!
//! ```text
//! graph [
//!   directed 1
//!   node [ id 0 label "generator" type "generator" ]
//!   node [ id 1 label "repeater_0" type "repeater" ]
//!   edge [ source 0 target 1 capacity 10 ]
//! ]
//! ```

use qflow_core::{
    Client, ClientId, Generator, Node, NodeIndex, NodeKind, QuantumNetwork, Repeater, RepeaterId,
};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum GmlError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("no top-level 'graph' block")]
    MissingGraph,

    #[error("graph is not marked 'directed 1'")]
    Undirected,

    #[error("node at line {line}: {message}")]
    InvalidNode { line: usize, message: String },

    #[error("node at line {line}: client {client} is already declared")]
    DuplicateClient { line: usize, client: usize },

    #[error("edge at line {line}: {message}")]
    InvalidEdge { line: usize, message: String },
}

fn syntax(line: usize, message: impl Into<String>) -> GmlError {
    GmlError::Syntax {
        line,
        message: message.into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Key(String),
    Int(i64),
    Real(f64),
    Str(String),
    Open,
    Close,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Key(k) => format!("key '{k}'"),
            Token::Int(v) => format!("integer {v}"),
            Token::Real(v) => format!("number {v}"),
            Token::Str(s) => format!("string \"{s}\""),
            Token::Open => "'['".to_string(),
            Token::Close => "']'".to_string(),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, GmlError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                while chars.peek().is_some_and(|&c| c != '\n') {
                    chars.next();
                }
            }
            '[' => {
                chars.next();
                tokens.push((Token::Open, line));
            }
            ']' => {
                chars.next();
                tokens.push((Token::Close, line));
            }
            '"' => {
                chars.next();
                let start = line;
                let mut raw = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(ch) => {
                            if ch == '\n' {
                                line += 1;
                            }
                            raw.push(ch);
                        }
                        None => return Err(syntax(start, "unterminated string")),
                    }
                }
                tokens.push((Token::Str(unescape(&raw)), start));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut key = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || c == '_') {
                        break;
                    }
                    key.push(c);
                    chars.next();
                }
                tokens.push((Token::Key(key), line));
            }
            c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                let mut num = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.')) {
                        break;
                    }
                    num.push(c);
                    chars.next();
                }
                tokens.push((parse_number(&num, line)?, line));
            }
            other => return Err(syntax(line, format!("unexpected character '{other}'"))),
        }
    }
    Ok(tokens)
}

fn parse_number(raw: &str, line: usize) -> Result<Token, GmlError> {
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(Token::Int(v));
    }
    raw.parse::<f64>()
        .map(Token::Real)
        .map_err(|_| syntax(line, format!("invalid number '{raw}'")))
}

fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let Some(end) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "quot" => Some('"'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            _ => entity
                .strip_prefix('#')
                .and_then(|code| code.parse::<u32>().ok())
                .and_then(char::from_u32),
        };
        match decoded {
            Some(ch) => out.push(ch),
            None => out.push_str(&tail[..=end]),
        }
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    out
}

fn escape(label: &str) -> String {
    label.replace('&', "&amp;").replace('"', "&quot;")
}

#[derive(Debug, Clone, PartialEq)]
enum GmlValue {
    Int(i64),
    Real(f64),
    Str(String),
    List(Vec<GmlEntry>),
}

#[derive(Debug, Clone, PartialEq)]
struct GmlEntry {
    key: String,
    value: GmlValue,
    line: usize,
}

fn lookup<'a>(entries: &'a [GmlEntry], key: &str) -> Option<&'a GmlValue> {
    entries.iter().find(|e| e.key == key).map(|e| &e.value)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn next(&mut self) -> Option<(Token, usize)> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn last_line(&self) -> usize {
        self.tokens.last().map(|(_, line)| *line).unwrap_or(1)
    }

    fn entries(&mut self, nested: bool) -> Result<Vec<GmlEntry>, GmlError> {
        let mut entries = Vec::new();
        loop {
            let Some((token, line)) = self.next() else {
                if nested {
                    return Err(syntax(self.last_line(), "missing closing ']'"));
                }
                return Ok(entries);
            };
            match token {
                Token::Close if nested => return Ok(entries),
                Token::Key(key) => {
                    let value = self.value(line)?;
                    entries.push(GmlEntry { key, value, line });
                }
                other => {
                    return Err(syntax(
                        line,
                        format!("expected a key, found {}", other.describe()),
                    ))
                }
            }
        }
    }

    fn value(&mut self, key_line: usize) -> Result<GmlValue, GmlError> {
        let Some((token, line)) = self.next() else {
            return Err(syntax(key_line, "key without a value"));
        };
        match token {
            Token::Int(v) => Ok(GmlValue::Int(v)),
            Token::Real(v) => Ok(GmlValue::Real(v)),
            Token::Str(s) => Ok(GmlValue::Str(s)),
            Token::Open => Ok(GmlValue::List(self.entries(true)?)),
            Token::Key(k) if k == "INF" => Ok(GmlValue::Real(f64::INFINITY)),
            Token::Key(k) if k == "NAN" => Ok(GmlValue::Real(f64::NAN)),
            other => Err(syntax(
                line,
                format!("expected a value, found {}", other.describe()),
            )),
        }
    }
}

fn label_suffix(label: &str, prefix: &str) -> Option<usize> {
    label.strip_prefix(prefix)?.parse().ok()
}

fn infer_kind(label: &str) -> Option<NodeKind> {
    if label == qflow_core::GENERATOR_LABEL {
        Some(NodeKind::Generator)
    } else if label.starts_with("repeater_") {
        Some(NodeKind::Repeater)
    } else if label.starts_with("client_") {
        Some(NodeKind::Client)
    } else {
        None
    }
}

/// Parse a GML document into a network.
pub fn parse_gml(text: &str) -> Result<QuantumNetwork, GmlError> {
    let mut parser = Parser {
        tokens: tokenize(text)?,
        pos: 0,
    };
    let top = parser.entries(false)?;
    let graph = top
        .iter()
        .find(|e| e.key == "graph")
        .ok_or(GmlError::MissingGraph)?;
    let GmlValue::List(items) = &graph.value else {
        return Err(syntax(graph.line, "'graph' must be a [ ... ] block"));
    };
    if lookup(items, "directed") != Some(&GmlValue::Int(1)) {
        return Err(GmlError::Undirected);
    }

    let mut network = QuantumNetwork::new();
    let mut ids: HashMap<i64, NodeIndex> = HashMap::new();
    let mut clients: HashSet<usize> = HashSet::new();
    let mut next_repeater = 0;

    for entry in items.iter().filter(|e| e.key == "node") {
        let line = entry.line;
        let invalid = |message: String| GmlError::InvalidNode { line, message };
        let GmlValue::List(attrs) = &entry.value else {
            return Err(invalid("expected a [ ... ] block".into()));
        };
        let id = match lookup(attrs, "id") {
            Some(GmlValue::Int(id)) => *id,
            _ => return Err(invalid("missing integer 'id'".into())),
        };
        if ids.contains_key(&id) {
            return Err(invalid(format!("duplicate id {id}")));
        }
        let label = match lookup(attrs, "label") {
            Some(GmlValue::Str(s)) => s.clone(),
            Some(GmlValue::Int(v)) => v.to_string(),
            _ => id.to_string(),
        };
        let kind = match lookup(attrs, "type") {
            Some(GmlValue::Str(s)) => s.parse::<NodeKind>().map_err(|e| invalid(e.to_string()))?,
            None => infer_kind(&label)
                .ok_or_else(|| invalid(format!("no 'type' and label '{label}' is not recognised")))?,
            Some(_) => return Err(invalid("'type' must be a string".into())),
        };
        let node = match kind {
            NodeKind::Generator => Node::Generator(Generator { name: label }),
            NodeKind::Repeater => {
                let rid = label_suffix(&label, "repeater_").unwrap_or(next_repeater);
                next_repeater = next_repeater.max(rid + 1);
                Node::Repeater(Repeater {
                    id: RepeaterId::new(rid),
                    name: label,
                })
            }
            NodeKind::Client => {
                let cid = label_suffix(&label, "client_").ok_or_else(|| {
                    invalid(format!("client label '{label}' must look like client_<n>"))
                })?;
                if !clients.insert(cid) {
                    return Err(GmlError::DuplicateClient { line, client: cid });
                }
                Node::Client(Client {
                    id: ClientId::new(cid),
                    name: label,
                })
            }
        };
        ids.insert(id, network.add_node(node));
    }

    for entry in items.iter().filter(|e| e.key == "edge") {
        let line = entry.line;
        let invalid = |message: String| GmlError::InvalidEdge { line, message };
        let GmlValue::List(attrs) = &entry.value else {
            return Err(invalid("expected a [ ... ] block".into()));
        };
        let endpoint = |key: &str| -> Result<NodeIndex, GmlError> {
            match lookup(attrs, key) {
                Some(GmlValue::Int(id)) => ids
                    .get(id)
                    .copied()
                    .ok_or_else(|| invalid(format!("{key} {id} is not a declared node"))),
                _ => Err(invalid(format!("missing integer '{key}'"))),
            }
        };
        let source = endpoint("source")?;
        let target = endpoint("target")?;
        let capacity = match lookup(attrs, "capacity") {
            Some(GmlValue::Int(v)) if *v >= 0 => *v as u64,
            Some(GmlValue::Real(v)) if v.is_finite() && *v >= 0.0 && v.fract() == 0.0 => {
                *v as u64
            }
            Some(_) => {
                return Err(invalid(
                    "capacity must be a non-negative integer".to_string(),
                ))
            }
            None => return Err(invalid("missing 'capacity'".to_string())),
        };
        network.add_link(source, target, capacity);
    }

    debug!(
        nodes = network.graph.node_count(),
        links = network.graph.edge_count(),
        "parsed GML network"
    );
    Ok(network)
}

/// Read a GML file from disk.
pub fn read_gml(path: impl AsRef<Path>) -> Result<QuantumNetwork, GmlError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| GmlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_gml(&text)
}

/// Render a network as GML. Node ids are petgraph indices.
pub fn to_gml_string(network: &QuantumNetwork) -> String {
    let mut out = String::from("graph [\n  directed 1\n");
    for idx in network.graph.node_indices() {
        let node = &network.graph[idx];
        out.push_str(&format!(
            "  node [\n    id {}\n    label \"{}\"\n    type \"{}\"\n  ]\n",
            idx.index(),
            escape(node.label()),
            node.kind()
        ));
    }
    for edge in network.graph.raw_edges() {
        out.push_str(&format!(
            "  edge [\n    source {}\n    target {}\n    capacity {}\n  ]\n",
            edge.source().index(),
            edge.target().index(),
            edge.weight.capacity
        ));
    }
    out.push_str("]\n");
    out
}

pub fn write_gml(network: &QuantumNetwork, path: impl AsRef<Path>) -> Result<(), GmlError> {
    let path = path.as_ref();
    fs::write(path, to_gml_string(network)).map_err(|source| GmlError::Io {
        path: path.to_path_buf(),
        source,
    })
}
