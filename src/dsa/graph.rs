use std::cmp::Reverse;
use std::collections::BinaryHeap;

type HashMap<K, V> = std::collections::hash_map::HashMap<K, V, nohash::BuildNoHashHasher<usize>>;
type HashSet<K> = std::collections::hash_set::HashSet<K, nohash::BuildNoHashHasher<usize>>;

pub type NodeId = usize;
pub type LinkId = usize;
pub type Weight = u64;

// undirected weighted graph with a dense link table
// links get a stable index at insertion time, never renumbered
pub(crate) struct WeightedGraph {
    // adjacency: node -> (neighbour, link index)
    adjacency: HashMap<NodeId, Vec<(NodeId, LinkId)>>,
    links: Vec<GraphLink>,
}

#[derive(Clone)]
pub(crate) struct GraphLink {
    pub(crate) a: NodeId,
    pub(crate) b: NodeId,
    pub(crate) weight: Weight,
}

// single-pair shortest path, as an ordered node list plus the links walked
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct GraphPath {
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) links: Vec<LinkId>,
    pub(crate) weight: Weight,
}

impl WeightedGraph {
    pub(crate) fn new() -> Self {
        Self {
            adjacency: HashMap::with_hasher(nohash::BuildNoHashHasher::default()),
            links: vec![],
        }
    }

    pub(crate) fn links_len(&self) -> usize {
        self.links.len()
    }

    pub(crate) fn link(&self, id: LinkId) -> &GraphLink {
        &self.links[id]
    }

    pub(crate) fn push_node(&mut self, node: NodeId) {
        self.adjacency.entry(node).or_default();
    }

    // returns None if the unordered pair already has a link
    pub(crate) fn push_link(&mut self, a: NodeId, b: NodeId, weight: Weight) -> Option<LinkId> {
        if self.find_link(a, b).is_some() {
            return None;
        }
        let id = self.links.len();
        self.links.push(GraphLink { a, b, weight });
        self.adjacency.entry(a).or_default().push((b, id));
        self.adjacency.entry(b).or_default().push((a, id));
        Some(id)
    }

    pub(crate) fn path_weight_of(&self, links: &[LinkId]) -> Weight {
        links.iter().map(|id| self.links[*id].weight).sum()
    }

    pub(crate) fn find_link(&self, a: NodeId, b: NodeId) -> Option<LinkId> {
        let neighbours = self.adjacency.get(&a)?;
        neighbours
            .iter()
            .find(|(node, _)| *node == b)
            .map(|(_, link)| *link)
    }

    // dijkstra with exclusion sets, the inner primitive of the k-shortest search
    // banned nodes are never entered, banned links are never walked
    pub(crate) fn shortest_path(
        &self,
        src: NodeId,
        dst: NodeId,
        banned_nodes: &HashSet<NodeId>,
        banned_links: &HashSet<LinkId>,
    ) -> Option<GraphPath> {
        if !self.adjacency.contains_key(&src) || !self.adjacency.contains_key(&dst) {
            return None;
        }
        if banned_nodes.contains(&src) || banned_nodes.contains(&dst) {
            return None;
        }

        let mut dist: HashMap<NodeId, Weight> =
            HashMap::with_hasher(nohash::BuildNoHashHasher::default());
        // node -> (previous node, link taken to get here)
        let mut prev: HashMap<NodeId, (NodeId, LinkId)> =
            HashMap::with_hasher(nohash::BuildNoHashHasher::default());
        let mut heap = BinaryHeap::new();

        dist.insert(src, 0);
        heap.push(Reverse((0, src)));

        while let Some(Reverse((d, node))) = heap.pop() {
            if node == dst {
                break;
            }
            if dist.get(&node).is_some_and(|best| *best < d) {
                continue; // stale heap entry
            }
            let Some(neighbours) = self.adjacency.get(&node) else {
                continue;
            };
            for (next, link) in neighbours {
                if banned_nodes.contains(next) || banned_links.contains(link) {
                    continue;
                }
                let next_dist = d + self.links[*link].weight;
                if dist.get(next).is_none_or(|best| next_dist < *best) {
                    dist.insert(*next, next_dist);
                    prev.insert(*next, (node, *link));
                    heap.push(Reverse((next_dist, *next)));
                }
            }
        }

        let weight = *dist.get(&dst)?;
        let mut nodes = vec![dst];
        let mut links = vec![];
        let mut current = dst;
        while current != src {
            let (before, link) = *prev.get(&current)?;
            nodes.push(before);
            links.push(link);
            current = before;
        }
        nodes.reverse();
        links.reverse();
        Some(GraphPath { nodes, links, weight })
    }
}

pub(crate) fn no_hash_set() -> HashSet<usize> {
    HashSet::with_hasher(nohash::BuildNoHashHasher::default())
}
