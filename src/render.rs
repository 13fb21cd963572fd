//! Flowchart serialization
//!
//! Pure serializer: validates the assembled fragment (unique node ids, no
//! dangling edge endpoints) and writes it out as a `flowchart TB` body, with
//! the document wrapper selected by [`DocType`]. No resolution logic lives
//! here; a validation failure means an upstream builder is defective.

use std::collections::HashSet;
use std::fmt::Write as _;

use askama::Template;

use crate::diagram::{DiagramEdge, DiagramNode, EdgeStyle, Fragment, NodeShape, Subgraph};
use crate::error::GeneratorError;
use crate::DocType;

/// The final text artifact of one render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub text: String,
    /// File extension matching the document type, without the dot
    pub extension: &'static str,
}

#[derive(Template)]
#[template(path = "document.md.j2", escape = "none")]
struct MarkdownDocument<'a> {
    title: &'a str,
    body: &'a str,
}

/// Serialize a fragment into the configured document wrapper
pub fn render(
    fragment: &Fragment,
    doc_type: DocType,
    title: &str,
) -> Result<RenderedDocument, GeneratorError> {
    validate(fragment)?;
    let body = serialize_body(fragment);

    match doc_type {
        DocType::Mermaid => Ok(RenderedDocument {
            text: body,
            extension: "mmd",
        }),
        DocType::Markdown => {
            let document = MarkdownDocument {
                title,
                body: &body,
            };
            let text = document
                .render()
                .map_err(|err| GeneratorError::MalformedFragment(err.to_string()))?;
            Ok(RenderedDocument {
                text,
                extension: "md",
            })
        }
    }
}

/// Check the renderer's input invariants
fn validate(fragment: &Fragment) -> Result<(), GeneratorError> {
    let declared = fragment.declared_ids();

    let mut seen = HashSet::new();
    for id in &declared {
        if !seen.insert(*id) {
            return Err(GeneratorError::MalformedFragment(format!(
                "duplicate node id {id}"
            )));
        }
    }

    for edge in fragment.all_edges() {
        for endpoint in [edge.from.as_str(), edge.to.as_str()] {
            if !seen.contains(endpoint) {
                return Err(GeneratorError::MalformedFragment(format!(
                    "edge references undeclared node {endpoint}"
                )));
            }
        }
    }

    Ok(())
}

fn serialize_body(fragment: &Fragment) -> String {
    let mut out = String::from("flowchart TB\n");
    for node in &fragment.nodes {
        write_node(&mut out, node, 1);
    }
    for edge in &fragment.edges {
        write_edge(&mut out, edge, 1);
    }
    for subgraph in &fragment.subgraphs {
        write_subgraph(&mut out, subgraph, 1);
    }
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("    ");
    }
}

/// Escape a label for use inside a quoted Mermaid string
fn escape_label(label: &str) -> String {
    label.replace('"', "#quot;").replace('\n', "<br>")
}

fn write_node(out: &mut String, node: &DiagramNode, level: usize) {
    let label = escape_label(&node.label);
    let (open, close) = match node.shape {
        NodeShape::Rounded => ("(", ")"),
        NodeShape::Stadium => ("([", "])"),
        NodeShape::DoubleCircle => ("(((", ")))"),
        NodeShape::Rhombus => ("{", "}"),
        NodeShape::Subroutine => ("[[", "]]"),
        NodeShape::Cylinder => ("[(", ")]"),
        NodeShape::Rectangle => ("[", "]"),
    };
    indent(out, level);
    let _ = writeln!(out, "{}{}\"{}\"{}", node.id, open, label, close);
}

fn write_edge(out: &mut String, edge: &DiagramEdge, level: usize) {
    let arrow = match edge.style {
        EdgeStyle::Solid => "-->",
        EdgeStyle::Dotted => "-.->",
        EdgeStyle::LongDotted => "-...->",
    };
    indent(out, level);
    match &edge.label {
        Some(label) => {
            let _ = writeln!(
                out,
                "{} {}|\"{}\"| {}",
                edge.from,
                arrow,
                escape_label(label),
                edge.to
            );
        }
        None => {
            let _ = writeln!(out, "{} {} {}", edge.from, arrow, edge.to);
        }
    }
}

fn write_subgraph(out: &mut String, subgraph: &Subgraph, level: usize) {
    indent(out, level);
    let _ = writeln!(
        out,
        "subgraph {}[\"{}\"]",
        subgraph.id,
        escape_label(&subgraph.title)
    );
    for node in &subgraph.nodes {
        write_node(out, node, level + 1);
    }
    for edge in &subgraph.edges {
        write_edge(out, edge, level + 1);
    }
    for child in &subgraph.children {
        write_subgraph(out, child, level + 1);
    }
    indent(out, level);
    out.push_str("end\n");
}
