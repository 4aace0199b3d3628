//! Graph serialization (Graphviz DOT and JSON)

use super::{Attrs, Edge, Graph, Node};
use crate::error::Result;
use std::fmt::{self, Write};

/// Text renderings of a graph
pub trait GraphExporter {
    /// Graphviz DOT
    fn to_dot(&self) -> String;

    /// Pretty-printed JSON of the node/edge model
    fn to_json(&self) -> Result<String>;
}

impl GraphExporter for Graph {
    fn to_dot(&self) -> String {
        self.to_string()
    }

    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => writeln!(f, "digraph {} {{", dot_id(name))?,
            None => writeln!(f, "digraph {{")?,
        }

        for subgraph in &self.subgraphs {
            writeln!(f, "  subgraph {} {{", dot_id(&subgraph.id))?;
            for (key, value) in &subgraph.attrs {
                writeln!(f, "    {}={};", key, dot_value(value))?;
            }
            for node in &subgraph.nodes {
                write_node(f, "    ", node)?;
            }
            writeln!(f, "  }}")?;
        }

        for node in &self.nodes {
            write_node(f, "  ", node)?;
        }

        for edge in &self.edges {
            write_edge(f, edge)?;
        }

        writeln!(f, "}}")
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, indent: &str, node: &Node) -> fmt::Result {
    writeln!(f, "{}{}{};", indent, dot_id(&node.id), attr_list(&node.attrs))
}

fn write_edge(f: &mut fmt::Formatter<'_>, edge: &Edge) -> fmt::Result {
    writeln!(
        f,
        "  {} -> {}{};",
        dot_id(&edge.from),
        dot_id(&edge.to),
        attr_list(&edge.attrs)
    )
}

/// ` [k=v, ...]`, or nothing for an empty map
fn attr_list(attrs: &Attrs) -> String {
    if attrs.is_empty() {
        return String::new();
    }
    let mut out = String::from(" [");
    for (i, (key, value)) in attrs.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        // Writing to a String cannot fail.
        let _ = write!(out, "{}={}", key, dot_value(value));
    }
    out.push(']');
    out
}

/// DOT keywords, matched case-insensitively; never valid as bare IDs
const KEYWORDS: &[&str] = &["node", "edge", "graph", "digraph", "subgraph", "strict"];

/// Identifiers that are plain DOT IDs are written bare, anything else
/// (keywords included) quoted
fn dot_id(id: &str) -> String {
    let mut chars = id.chars();
    let bare = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if bare && !KEYWORDS.iter().any(|k| id.eq_ignore_ascii_case(k)) {
        id.to_string()
    } else {
        format!("\"{}\"", escape_dot_string(id))
    }
}

/// HTML-like labels (`<...>`) are written verbatim, other values quoted
fn dot_value(value: &str) -> String {
    if value.starts_with('<') && value.ends_with('>') {
        value.to_string()
    } else {
        format!("\"{}\"", escape_dot_string(value))
    }
}

/// Escapes a string for use inside a quoted DOT string
fn escape_dot_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
