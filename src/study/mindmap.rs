//! Concept maps — the concept tree payload, the diagram text synthesizer,
//! and the view state that drives rendering.
//!
//! Synthesis emits the indentation-based `mindmap` dialect:
//!
//! ```text
//! mindmap
//!   root((Biology))
//!     Cells
//!       Organelles
//!     Genetics
//! ```
//!
//! Every line below the root is indented by two spaces per nesting level,
//! starting at level 2 for the root's direct children.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{DiagramRenderer, RenderedDiagram};
use crate::error::RenderError;

/// Longest node label kept after sanitization, in characters.
pub const MAX_NAME_CHARS: usize = 50;

/// Label used for nodes without a usable name.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Nesting level of the root's direct children.
const FIRST_CHILD_LEVEL: usize = 2;

static DIAGRAM_SYNTAX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[(){}\[\]"]"#).expect("static regex is valid"));

/// A node of a concept map. Names are optional because the payload is
/// backend-generated and untrusted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConceptTree {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub children: Vec<ConceptTree>,
}

impl ConceptTree {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<ConceptTree>) -> Self {
        self.children = children;
        self
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

/// Make a node name safe to embed in diagram text.
///
/// Strips the dialect's bracket and quote characters, flattens line breaks,
/// trims, and truncates to [`MAX_NAME_CHARS`]. Names that end up empty become
/// [`UNKNOWN_NAME`]. Applying it twice gives the same result as once.
pub fn sanitize_name(name: Option<&str>) -> String {
    let Some(raw) = name else {
        return UNKNOWN_NAME.to_string();
    };
    let stripped = DIAGRAM_SYNTAX.replace_all(raw, "");
    let flattened: String = stripped
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let truncated: String = flattened.trim().chars().take(MAX_NAME_CHARS).collect();
    let cleaned = truncated.trim_end();
    if cleaned.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Synthesized diagram text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagram {
    pub text: String,
    /// Nodes left out because they were nested deeper than the depth limit.
    pub elided_nodes: usize,
}

impl Diagram {
    pub fn is_truncated(&self) -> bool {
        self.elided_nodes > 0
    }
}

/// Turn a concept tree into `mindmap` diagram text.
///
/// Nodes are emitted depth-first in sibling order. Subtrees whose depth
/// (root = 0) exceeds `max_depth` are dropped and counted in
/// [`Diagram::elided_nodes`]. Traversal uses an explicit stack, so
/// arbitrarily deep input cannot exhaust the call stack.
pub fn synthesize(tree: &ConceptTree, max_depth: usize) -> Diagram {
    let mut text = String::from("mindmap\n");
    text.push_str("  root((");
    text.push_str(&sanitize_name(tree.name.as_deref()));
    text.push_str("))\n");

    let mut elided_nodes = 0;
    let mut stack: Vec<(&ConceptTree, usize)> = tree
        .children
        .iter()
        .rev()
        .map(|child| (child, FIRST_CHILD_LEVEL))
        .collect();

    while let Some((node, level)) = stack.pop() {
        let depth = level - 1;
        if depth > max_depth {
            elided_nodes += node.node_count();
            continue;
        }
        text.push_str(&" ".repeat(level * 2));
        text.push_str(&sanitize_name(node.name.as_deref()));
        text.push('\n');
        stack.extend(node.children.iter().rev().map(|child| (child, level + 1)));
    }

    if elided_nodes > 0 {
        warn!(elided_nodes, max_depth, "Concept map truncated at depth limit");
    }

    Diagram { text, elided_nodes }
}

/// Render outcome of the current diagram.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderState {
    NotRendered,
    Rendered(RenderedDiagram),
    Failed(RenderError),
}

/// View state for the concept map tab.
pub struct ConceptMapView {
    renderer: Arc<dyn DiagramRenderer>,
    diagram: Diagram,
    state: RenderState,
}

impl ConceptMapView {
    pub fn new(tree: &ConceptTree, renderer: Arc<dyn DiagramRenderer>, max_depth: usize) -> Self {
        Self {
            renderer,
            diagram: synthesize(tree, max_depth),
            state: RenderState::NotRendered,
        }
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Hand the synthesized text to the renderer. A rejection is recorded and
    /// returned as-is; nothing is re-synthesized.
    pub async fn render(&mut self) -> Result<RenderedDiagram, RenderError> {
        match self.renderer.render(&self.diagram.text).await {
            Ok(rendered) => {
                info!(diagram_id = %rendered.id, "Concept map rendered");
                self.state = RenderState::Rendered(rendered.clone());
                Ok(rendered)
            }
            Err(e) => {
                warn!(error = %e, "Concept map rendering failed");
                self.state = RenderState::Failed(e.clone());
                Err(e)
            }
        }
    }

    /// Manual retry after a render failure.
    pub async fn retry(&mut self) -> Result<RenderedDiagram, RenderError> {
        debug!("Retrying concept map render");
        self.render().await
    }
}

/// Terminal renderer: checks the diagram structure and lays it out as an
/// indented bullet outline.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutlineRenderer;

#[async_trait]
impl DiagramRenderer for OutlineRenderer {
    async fn render(&self, diagram_text: &str) -> Result<RenderedDiagram, RenderError> {
        let body = outline(diagram_text).map_err(|message| RenderError::Rejected { message })?;
        Ok(RenderedDiagram {
            id: Uuid::new_v4(),
            body,
        })
    }
}

fn outline(diagram_text: &str) -> Result<String, String> {
    let mut lines = diagram_text.lines();

    match lines.next() {
        Some("mindmap") => {}
        other => return Err(format!("expected `mindmap` header, got {:?}", other.unwrap_or(""))),
    }

    let root = lines
        .next()
        .and_then(|l| l.strip_prefix("  root(("))
        .and_then(|l| l.strip_suffix("))"))
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| "line 2: expected `  root((name))`".to_string())?;

    let mut body = format!("{root}\n");
    let mut prev_level = 1;

    for (i, line) in lines.enumerate() {
        let line_no = i + 3;
        let name = line.trim_start_matches(' ');
        let indent = line.len() - name.len();
        if name.trim().is_empty() {
            return Err(format!("line {line_no}: empty node"));
        }
        if indent % 2 != 0 {
            return Err(format!("line {line_no}: odd indentation of {indent} spaces"));
        }
        let level = indent / 2;
        if level < FIRST_CHILD_LEVEL || level > prev_level + 1 {
            return Err(format!(
                "line {line_no}: indentation level {level} does not follow level {prev_level}"
            ));
        }
        body.push_str(&"  ".repeat(level - 1));
        body.push_str("• ");
        body.push_str(name);
        body.push('\n');
        prev_level = level;
    }

    Ok(body)
}
