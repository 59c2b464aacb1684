use std::collections::HashMap;
use std::io::BufRead;

use log::warn;
use thiserror::Error;

use crate::dsa::graph::{LinkId, NodeId, Weight, WeightedGraph};

#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("request names node {name:?} which is not in the topology")]
    UnknownNode { name: String },
    #[error("failed reading topology input: {0}")]
    Io(#[from] std::io::Error),
}

// the fibre plant: interned node names over a weighted graph,
// plus per-link capacity kept flat, indexed by the stable link index
pub struct Topology {
    graph: WeightedGraph,
    names: Vec<String>,
    name_map: HashMap<String, NodeId>,
    capacities: Vec<u64>,
}

impl Topology {
    pub fn new() -> Self {
        Self {
            graph: WeightedGraph::new(),
            names: vec![],
            name_map: HashMap::new(),
            capacities: vec![],
        }
    }

    // line format: source destination capacity weight
    // malformed lines and duplicate undirected pairs are warned about and skipped
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, TopologyError> {
        let mut topology = Self::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let parsed = (|| {
                let src = fields.next()?;
                let dst = fields.next()?;
                let capacity: u64 = fields.next()?.parse().ok()?;
                let weight: Weight = fields.next()?.parse().ok()?;
                Some((src.to_owned(), dst.to_owned(), capacity, weight))
            })();
            let Some((src, dst, capacity, weight)) = parsed else {
                warn!("topology line {}: malformed, skipped: {line:?}", line_no + 1);
                continue;
            };
            if topology.add_link(&src, &dst, capacity, weight).is_none() {
                warn!("topology line {}: repeated edge {src}-{dst}, skipped", line_no + 1);
            }
        }
        Ok(topology)
    }

    fn intern(&mut self, name: &str) -> NodeId {
        if let Some(id) = self.name_map.get(name) {
            return *id;
        }
        let id = self.names.len();
        self.names.push(name.to_owned());
        self.name_map.insert(name.to_owned(), id);
        self.graph.push_node(id);
        id
    }

    // None when the unordered pair already carries a link
    pub fn add_link(&mut self, src: &str, dst: &str, capacity: u64, weight: Weight) -> Option<LinkId> {
        let a = self.intern(src);
        let b = self.intern(dst);
        let id = self.graph.push_link(a, b, weight)?;
        debug_assert_eq!(id, self.capacities.len());
        self.capacities.push(capacity);
        Some(id)
    }

    pub fn node(&self, name: &str) -> Result<NodeId, TopologyError> {
        self.name_map
            .get(name)
            .copied()
            .ok_or_else(|| TopologyError::UnknownNode { name: name.to_owned() })
    }

    pub fn node_name(&self, id: NodeId) -> &str {
        &self.names[id]
    }

    pub fn nodes_len(&self) -> usize {
        self.names.len()
    }

    pub fn links_len(&self) -> usize {
        self.graph.links_len()
    }

    pub(crate) fn graph(&self) -> &WeightedGraph {
        &self.graph
    }

    pub fn link_ends(&self, id: LinkId) -> (NodeId, NodeId) {
        let link = self.graph.link(id);
        (link.a, link.b)
    }

    pub fn link_weight(&self, id: LinkId) -> Weight {
        self.graph.link(id).weight
    }

    pub fn link_capacity(&self, id: LinkId) -> u64 {
        self.capacities[id]
    }

    pub(crate) fn path_weight(&self, links: &[LinkId]) -> Weight {
        self.graph.path_weight_of(links)
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}
