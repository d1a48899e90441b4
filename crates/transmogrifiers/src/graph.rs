//! # Conversion graph
//!
//! Directed graph of conversions between tags using petgraph. Every edge
//! carries its conversion function and weighs 1, so the shortest path is the
//! chain with the fewest steps.

use std::collections::HashMap;
use std::rc::Rc;

use itertools::Itertools;
use morphbus_core::{best_match, BoxError, Payload, Tag};
use petgraph::algo::astar;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use serde_json::{Map, Value};

/// Outcome of a single conversion. `Ok(None)` is an empty result.
pub type ConversionResult = std::result::Result<Option<Payload>, BoxError>;

/// A conversion function (transmogrifier) between two tags.
pub type Conversion = Rc<dyn Fn(&Payload) -> ConversionResult>;

/// Wrap a closure as a [`Conversion`].
pub fn conversion<F>(f: F) -> Conversion
where
    F: Fn(&Payload) -> ConversionResult + 'static,
{
    Rc::new(f)
}

/// A vertex remembers when it was first added so prototype ties resolve to
/// the earliest registration.
#[derive(Debug)]
struct Vertex {
    tag: Tag,
    added: u64,
}

/// One edge of a resolved chain.
#[derive(Clone)]
pub(crate) struct Step {
    pub(crate) from: Tag,
    pub(crate) to: Tag,
    pub(crate) conversion: Conversion,
}

/// Conversion graph wrapping petgraph's `StableDiGraph`.
///
/// Stable indices survive edge and vertex removal, so the tag lookup map never
/// needs rebuilding. Vertices exist only while some edge touches them.
pub(crate) struct ConversionGraph {
    graph: StableDiGraph<Vertex, Conversion>,
    vertices: HashMap<Tag, NodeIndex>,
    next_sequence: u64,
}

impl ConversionGraph {
    pub(crate) fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            vertices: HashMap::new(),
            next_sequence: 0,
        }
    }

    pub(crate) fn contains_edge(&self, from: &Tag, to: &Tag) -> bool {
        self.edge_between(from, to).is_some()
    }

    /// Insert or replace the edge `from -> to`, returning the conversion it
    /// replaced.
    pub(crate) fn insert(&mut self, from: Tag, to: Tag, conversion: Conversion) -> Option<Conversion> {
        let source = self.vertex(from);
        let target = self.vertex(to);

        match self.graph.find_edge(source, target) {
            Some(edge) => self
                .graph
                .edge_weight_mut(edge)
                .map(|weight| std::mem::replace(weight, conversion)),
            None => {
                self.graph.add_edge(source, target, conversion);
                None
            }
        }
    }

    /// Remove the edge `from -> to` and any vertex it leaves isolated.
    pub(crate) fn remove(&mut self, from: &Tag, to: &Tag) -> bool {
        let Some((source, target)) = self.endpoints(from, to) else {
            return false;
        };
        let Some(edge) = self.graph.find_edge(source, target) else {
            return false;
        };

        self.graph.remove_edge(edge);
        self.prune(source);
        if target != source {
            self.prune(target);
        }
        true
    }

    pub(crate) fn clear(&mut self) {
        self.graph.clear();
        self.vertices.clear();
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// The source prototype that best matches a structural value.
    ///
    /// Only vertices with outgoing edges are candidates; ties go to the vertex
    /// added first.
    pub(crate) fn source_for(&self, value: &Map<String, Value>) -> Option<Tag> {
        let candidates = self
            .graph
            .node_indices()
            .filter(|&index| {
                self.graph
                    .neighbors_directed(index, Direction::Outgoing)
                    .next()
                    .is_some()
            })
            .filter_map(|index| self.graph.node_weight(index))
            .sorted_by_key(|vertex| vertex.added);

        best_match(
            value,
            candidates.filter_map(|vertex| vertex.tag.as_prototype().map(|p| (vertex, p))),
        )
        .map(|vertex| vertex.tag.clone())
    }

    /// The chain with the fewest steps from `from` to `to`.
    ///
    /// `None` when either tag is not a vertex or `to` is unreachable. A tag
    /// reaches itself with an empty chain.
    pub(crate) fn shortest_path(&self, from: &Tag, to: &Tag) -> Option<Vec<Step>> {
        let (start, goal) = self.endpoints(from, to)?;
        let (_, path) = astar(&self.graph, start, |node| node == goal, |_| 1usize, |_| 0usize)?;

        path.into_iter()
            .tuple_windows()
            .map(|(a, b)| {
                let edge = self.graph.find_edge(a, b)?;
                Some(Step {
                    from: self.graph.node_weight(a)?.tag.clone(),
                    to: self.graph.node_weight(b)?.tag.clone(),
                    conversion: self.graph.edge_weight(edge)?.clone(),
                })
            })
            .collect()
    }

    fn vertex(&mut self, tag: Tag) -> NodeIndex {
        if let Some(&index) = self.vertices.get(&tag) {
            return index;
        }
        let index = self.graph.add_node(Vertex {
            tag: tag.clone(),
            added: self.next_sequence,
        });
        self.next_sequence += 1;
        self.vertices.insert(tag, index);
        index
    }

    fn endpoints(&self, from: &Tag, to: &Tag) -> Option<(NodeIndex, NodeIndex)> {
        Some((*self.vertices.get(from)?, *self.vertices.get(to)?))
    }

    fn edge_between(&self, from: &Tag, to: &Tag) -> Option<petgraph::stable_graph::EdgeIndex> {
        let (source, target) = self.endpoints(from, to)?;
        self.graph.find_edge(source, target)
    }

    fn prune(&mut self, index: NodeIndex) {
        if self.graph.neighbors_undirected(index).next().is_some() {
            return;
        }
        if let Some(vertex) = self.graph.remove_node(index) {
            self.vertices.remove(&vertex.tag);
        }
    }
}
