use crate::dsa::graph::{GraphPath, NodeId, WeightedGraph, no_hash_set};

// lazy Yen k-shortest loopless paths
// yields simple paths in non-decreasing weight order, ties by discovery order
// finite: the iterator dries up once every simple path has been produced
pub(crate) struct KShortestPaths<'a> {
    graph: &'a WeightedGraph,
    src: NodeId,
    dst: NodeId,
    found: Vec<GraphPath>,
    // deviation candidates not yet promoted, in discovery order
    candidates: Vec<GraphPath>,
    started: bool,
}

impl<'a> KShortestPaths<'a> {
    pub(crate) fn new(graph: &'a WeightedGraph, src: NodeId, dst: NodeId) -> Self {
        Self {
            graph,
            src,
            dst,
            found: vec![],
            candidates: vec![],
            started: false,
        }
    }

    // deviate from every spur node of the most recent result
    fn push_deviations(&mut self) {
        let last = self.found.last().cloned().expect("deviating before the first path");
        for spur_index in 0..last.nodes.len() - 1 {
            let spur_node = last.nodes[spur_index];
            let root_nodes = &last.nodes[..=spur_index];
            let root_links = &last.links[..spur_index];

            let mut banned_links = no_hash_set();
            for path in self.found.iter() {
                if path.nodes.len() > spur_index && path.nodes[..=spur_index] == *root_nodes {
                    banned_links.insert(path.links[spur_index]);
                }
            }
            // root nodes other than the spur must not be revisited
            let mut banned_nodes = no_hash_set();
            for node in &root_nodes[..spur_index] {
                banned_nodes.insert(*node);
            }

            let Some(spur_path) =
                self.graph
                    .shortest_path(spur_node, self.dst, &banned_nodes, &banned_links)
            else {
                continue;
            };

            let mut nodes = root_nodes.to_vec();
            nodes.extend_from_slice(&spur_path.nodes[1..]);
            let mut links = root_links.to_vec();
            links.extend_from_slice(&spur_path.links);
            let weight = self.graph.path_weight_of(&links);
            let total = GraphPath { nodes, links, weight };

            let seen = self
                .found
                .iter()
                .chain(self.candidates.iter())
                .any(|p| p.links == total.links);
            if !seen {
                self.candidates.push(total);
            }
        }
    }

    fn pop_best_candidate(&mut self) -> Option<GraphPath> {
        let mut best: Option<usize> = None;
        for (i, candidate) in self.candidates.iter().enumerate() {
            match best {
                None => best = Some(i),
                Some(b) if candidate.weight < self.candidates[b].weight => best = Some(i),
                _ => {}
            }
        }
        best.map(|i| self.candidates.remove(i))
    }
}

impl Iterator for KShortestPaths<'_> {
    type Item = GraphPath;

    fn next(&mut self) -> Option<GraphPath> {
        if !self.started {
            self.started = true;
            let first = self
                .graph
                .shortest_path(self.src, self.dst, &no_hash_set(), &no_hash_set())?;
            self.found.push(first.clone());
            return Some(first);
        }
        if self.found.is_empty() {
            return None; // disconnected pair
        }
        self.push_deviations();
        let next = self.pop_best_candidate()?;
        self.found.push(next.clone());
        Some(next)
    }
}
