//! In-memory diagram graph
//!
//! Builders assemble an explicit node/edge/subgraph graph instead of
//! concatenating flowchart text ad hoc; the renderer serializes the graph
//! exactly once. This keeps id-uniqueness and dedup invariants checkable
//! independently of text formatting.

/// Mermaid node shape, one per diagram role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    /// Rounded rectangle: actions and leaf targets
    Rounded,
    /// Stadium: voice-app identity
    Stadium,
    /// Double circle: terminal disconnect/connect outcomes
    DoubleCircle,
    /// Rhombus: decision points
    Rhombus,
    /// Subroutine: greetings
    Subroutine,
    /// Cylinder: queue settings key/value rows
    Cylinder,
    /// Plain rectangle: re-entrant voice-app targets
    Rectangle,
}

/// One diagram node
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramNode {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
}

impl DiagramNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, shape: NodeShape) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            shape,
        }
    }
}

/// Arrow style of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeStyle {
    /// Primary flow
    Solid,
    /// Alternate resource-account entry point reaching an existing node
    Dotted,
    /// Cross-referenced top-level number reaching a nested target
    LongDotted,
}

/// One directed edge
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramEdge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub style: EdgeStyle,
}

impl DiagramEdge {
    pub fn solid(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: None,
            style: EdgeStyle::Solid,
        }
    }

    pub fn labeled(
        from: impl Into<String>,
        to: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: Some(label.into()),
            style: EdgeStyle::Solid,
        }
    }

    pub fn with_style(mut self, style: EdgeStyle) -> Self {
        self.style = style;
        self
    }
}

/// Named grouping of nodes and edges, possibly nested
///
/// Used for holiday blocks, queue call-distribution groupings, settings and
/// agent rosters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subgraph {
    pub id: String,
    pub title: String,
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
    pub children: Vec<Subgraph>,
}

impl Subgraph {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Append-only collection of diagram elements in traversal order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
    pub subgraphs: Vec<Subgraph>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_node(&mut self, node: DiagramNode) {
        self.nodes.push(node);
    }

    pub fn push_edge(&mut self, edge: DiagramEdge) {
        self.edges.push(edge);
    }

    pub fn push_subgraph(&mut self, subgraph: Subgraph) {
        self.subgraphs.push(subgraph);
    }

    /// Append another fragment, keeping its element order
    pub fn merge(&mut self, other: Fragment) {
        self.nodes.extend(other.nodes);
        self.edges.extend(other.edges);
        self.subgraphs.extend(other.subgraphs);
    }

    /// All node ids declared by this fragment, subgraph contents and
    /// subgraph ids included, in declaration order
    pub fn declared_ids(&self) -> Vec<&str> {
        fn collect<'a>(subgraph: &'a Subgraph, out: &mut Vec<&'a str>) {
            out.push(subgraph.id.as_str());
            for node in &subgraph.nodes {
                out.push(node.id.as_str());
            }
            for child in &subgraph.children {
                collect(child, out);
            }
        }

        let mut out: Vec<&str> = self.nodes.iter().map(|node| node.id.as_str()).collect();
        for subgraph in &self.subgraphs {
            collect(subgraph, &mut out);
        }
        out
    }

    /// All edges declared by this fragment, subgraph contents included
    pub fn all_edges(&self) -> Vec<&DiagramEdge> {
        fn collect<'a>(subgraph: &'a Subgraph, out: &mut Vec<&'a DiagramEdge>) {
            out.extend(subgraph.edges.iter());
            for child in &subgraph.children {
                collect(child, out);
            }
        }

        let mut out: Vec<&DiagramEdge> = self.edges.iter().collect();
        for subgraph in &self.subgraphs {
            collect(subgraph, &mut out);
        }
        out
    }
}
