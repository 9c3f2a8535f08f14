//! Derives the state-transition graph of a machine and renders it as Graphviz DOT.
//!
//! [`derive`] is a pure function of the model and the highlighted state, so callers can
//! recompute it on every edit. Layout and painting are left to whatever consumes the DOT
//! text or the serialized [`Graph`].

use crate::model::MachineModel;
use crate::types::State;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Fill color of the highlighted node.
pub const HIGHLIGHT_FILL: &str = "#ffff66";
/// Outline width of the highlighted node.
pub const HIGHLIGHT_PEN_WIDTH: u32 = 3;

/// The base style of a node, decided by accept/reject membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStyle {
    Accept,
    Reject,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: State,
    pub style: NodeStyle,
}

/// A directed edge. The synthetic start edge has an empty `from` and no label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: State,
    pub to: State,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    pub fn is_start(&self) -> bool {
        self.from.is_empty()
    }
}

/// A graph description: nodes in first-seen order, the start edge followed by one edge per
/// transition, and an optional highlighted node drawn on top of its base style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<State>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Builds the transition graph for `model`, highlighting `highlighted` when it is one of the
/// graph's nodes.
pub fn derive(model: &MachineModel, highlighted: Option<&str>) -> Graph {
    let mut edges = vec![Edge {
        from: String::new(),
        to: model.start().to_string(),
        label: None,
    }];
    let mut seen = HashSet::new();
    let mut nodes = Vec::new();

    for transition in model.transitions() {
        edges.push(Edge {
            from: transition.from.clone(),
            to: transition.to.clone(),
            label: Some(transition.label()),
        });

        for state in [&transition.from, &transition.to] {
            if seen.insert(state.as_str()) {
                nodes.push(Node {
                    id: state.clone(),
                    style: style_of(model, state),
                });
            }
        }
    }

    let highlight = highlighted
        .filter(|state| seen.contains(state))
        .map(str::to_string);

    Graph {
        nodes,
        edges,
        highlight,
        error: None,
    }
}

fn style_of(model: &MachineModel, state: &str) -> NodeStyle {
    if model.is_accepting(state) {
        NodeStyle::Accept
    } else if model.is_rejecting(state) {
        NodeStyle::Reject
    } else {
        NodeStyle::Default
    }
}

impl Graph {
    /// A single-node graph shown in place of a definition that failed to load.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            highlight: None,
            error: Some(message.into()),
        }
    }

    /// The load failure this graph stands in for, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Transition edges, without the synthetic start edge.
    pub fn transition_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|edge| !edge.is_start())
    }

    /// Renders the graph as Graphviz DOT source.
    pub fn to_dot(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph G {{")?;

        if let Some(message) = &self.error {
            writeln!(f, "  error [label={}];", quote(message))?;
            return write!(f, "}}");
        }

        writeln!(f, "  rankdir=LR;")?;
        writeln!(f, "  node [style=filled, fillcolor=white];")?;
        writeln!(f, "  \"\" [shape=none, label=\"\"];")?;

        for edge in &self.edges {
            write!(f, "  {} -> {}", quote(&edge.from), quote(&edge.to))?;
            match &edge.label {
                Some(label) => writeln!(f, " [label={}];", quote(label))?,
                None => writeln!(f, ";")?,
            }
        }

        for node in &self.nodes {
            let attributes = match node.style {
                NodeStyle::Accept => "shape=doublecircle",
                NodeStyle::Reject => "shape=circle, color=red",
                NodeStyle::Default => "shape=circle",
            };
            writeln!(f, "  {} [{attributes}];", quote(&node.id))?;
        }

        if let Some(state) = &self.highlight {
            writeln!(
                f,
                "  {} [fillcolor=\"{}\", style=filled, penwidth={}];",
                quote(state),
                HIGHLIGHT_FILL,
                HIGHLIGHT_PEN_WIDTH
            )?;
        }

        write!(f, "}}")
    }
}

/// Quotes a DOT identifier, escaping backslashes and double quotes.
fn quote(id: &str) -> String {
    let mut quoted = String::with_capacity(id.len() + 2);
    quoted.push('"');
    for c in id.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, Transition};

    fn transition(
        from: &str,
        read: &str,
        to: &str,
        write: &str,
        direction: Direction,
    ) -> Transition {
        Transition {
            from: from.into(),
            read: read.into(),
            to: to.into(),
            write: write.into(),
            direction,
        }
    }

    fn accept_on_a() -> MachineModel {
        MachineModel::new(
            "q0",
            ["q_accept".to_string()],
            [],
            vec![transition("q0", "a", "q_accept", "a", Direction::Stay)],
        )
    }

    #[test]
    fn test_single_transition_graph() {
        let graph = derive(&accept_on_a(), None);

        let start_edges: Vec<_> = graph.edges.iter().filter(|e| e.is_start()).collect();
        assert_eq!(start_edges.len(), 1);
        assert_eq!(start_edges[0].to, "q0");
        assert_eq!(start_edges[0].label, None);

        let labelled: Vec<_> = graph.transition_edges().collect();
        assert_eq!(labelled.len(), 1);
        assert_eq!(labelled[0].label.as_deref(), Some("a→a,S"));

        assert_eq!(graph.node("q_accept").unwrap().style, NodeStyle::Accept);
        assert_eq!(graph.node("q0").unwrap().style, NodeStyle::Default);
        assert_eq!(graph.highlight, None);
    }

    #[test]
    fn test_nodes_in_first_seen_order() {
        let model = MachineModel::new(
            "q0",
            ["yes".to_string()],
            ["no".to_string()],
            vec![
                transition("q0", "a", "q1", "a", Direction::Right),
                transition("q1", "b", "no", "b", Direction::Right),
                transition("q1", "_", "yes", "_", Direction::Stay),
                transition("q1", "a", "q0", "a", Direction::Left),
            ],
        );
        let graph = derive(&model, None);

        let ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["q0", "q1", "no", "yes"]);
        assert_eq!(graph.node("no").unwrap().style, NodeStyle::Reject);
        assert_eq!(graph.edges.len(), 5);
    }

    #[test]
    fn test_states_without_transitions_are_not_nodes() {
        let model = MachineModel::new(
            "q0",
            ["unused".to_string()],
            [],
            vec![transition("q0", "a", "q0", "a", Direction::Right)],
        );
        let graph = derive(&model, Some("unused"));

        assert!(graph.node("unused").is_none());
        assert_eq!(graph.highlight, None);
    }

    #[test]
    fn test_accept_style_wins_over_reject() {
        let model = MachineModel::new(
            "q0",
            ["both".to_string()],
            ["both".to_string()],
            vec![transition("q0", "a", "both", "a", Direction::Stay)],
        );
        let graph = derive(&model, None);
        assert_eq!(graph.node("both").unwrap().style, NodeStyle::Accept);
    }

    #[test]
    fn test_highlight_keeps_base_style() {
        let graph = derive(&accept_on_a(), Some("q_accept"));

        assert_eq!(graph.highlight.as_deref(), Some("q_accept"));
        assert_eq!(graph.node("q_accept").unwrap().style, NodeStyle::Accept);

        let dot = graph.to_dot();
        let base = dot.find("\"q_accept\" [shape=doublecircle];").unwrap();
        let overlay = dot
            .find("\"q_accept\" [fillcolor=\"#ffff66\", style=filled, penwidth=3];")
            .unwrap();
        assert!(base < overlay);
    }

    #[test]
    fn test_dot_output() {
        let dot = derive(&accept_on_a(), None).to_dot();
        let expected = r#"digraph G {
  rankdir=LR;
  node [style=filled, fillcolor=white];
  "" [shape=none, label=""];
  "" -> "q0";
  "q0" -> "q_accept" [label="a→a,S"];
  "q0" [shape=circle];
  "q_accept" [shape=doublecircle];
}"#;
        assert_eq!(dot, expected);
    }

    #[test]
    fn test_dot_escapes_identifiers() {
        let model = MachineModel::new(
            "say \"hi\"",
            [],
            [],
            vec![transition("say \"hi\"", "\\", "end", "\\", Direction::Right)],
        );
        let dot = derive(&model, None).to_dot();

        assert!(dot.contains(r#""say \"hi\"" -> "end" [label="\\→\\,R"];"#));
    }

    #[test]
    fn test_error_graph() {
        let dot = Graph::error("invalid definition").to_dot();
        assert_eq!(
            dot,
            "digraph G {\n  error [label=\"invalid definition\"];\n}"
        );
    }

    #[test]
    fn test_json_serialization() {
        let graph = derive(&accept_on_a(), Some("q0"));
        let value = serde_json::to_value(&graph).unwrap();

        assert_eq!(value["highlight"], "q0");
        assert_eq!(value["edges"][0]["from"], "");
        assert!(value["edges"][0].get("label").is_none());
        assert_eq!(value["edges"][1]["label"], "a→a,S");
        assert_eq!(value["nodes"][1]["style"], "accept");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_error_graph_json_keeps_message() {
        let graph = Graph::error("Missing or non-scalar 'start' state");
        assert_eq!(
            graph.error_message(),
            Some("Missing or non-scalar 'start' state")
        );

        let value = serde_json::to_value(&graph).unwrap();
        assert_eq!(value["error"], "Missing or non-scalar 'start' state");
        assert_eq!(value["nodes"], serde_json::json!([]));

        let empty = derive(&MachineModel::new("q0", [], [], vec![]), None);
        assert_ne!(serde_json::to_value(&empty).unwrap(), value);
    }

    #[test]
    fn test_derive_is_deterministic() {
        let model = accept_on_a();
        assert_eq!(derive(&model, Some("q0")), derive(&model, Some("q0")));
    }
}
