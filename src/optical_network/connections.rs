use crate::dsa::graph::{LinkId, NodeId};
use crate::optical_network::spectrum::SlotCount;

type HashMap<K, V> = std::collections::hash_map::HashMap<K, V, nohash::BuildNoHashHasher<u64>>;

// one provisioned lightpath: an immutable link list plus a slot window
// the window moves under expand/reduce, the route never does
#[derive(Clone, Debug)]
pub struct Connection {
    links: Vec<LinkId>,
    slot_begin: usize,
    slot_num: SlotCount,
}

// connections are the same lightpath iff they follow the same links
impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.links == other.links
    }
}

impl Connection {
    pub(crate) fn new(links: Vec<LinkId>, slot_begin: usize, slot_num: SlotCount) -> Self {
        debug_assert!(slot_num > 0);
        Self { links, slot_begin, slot_num }
    }

    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    pub fn slot_begin(&self) -> usize {
        self.slot_begin
    }

    pub fn slot_num(&self) -> SlotCount {
        self.slot_num
    }

    pub(crate) fn slot_end(&self) -> usize {
        self.slot_begin + self.slot_num
    }

    pub(crate) fn grow_high(&mut self, width: SlotCount) {
        self.slot_num += width;
    }

    pub(crate) fn grow_low(&mut self, width: SlotCount) {
        debug_assert!(self.slot_begin >= width);
        self.slot_begin -= width;
        self.slot_num += width;
    }

    pub(crate) fn shrink_low(&mut self, width: SlotCount) {
        debug_assert!(width <= self.slot_num);
        self.slot_begin += width;
        self.slot_num -= width;
    }

    pub(crate) fn shrink_high(&mut self, width: SlotCount) {
        debug_assert!(width <= self.slot_num);
        self.slot_num -= width;
    }
}

// (src, dst) packed into one u64 so the map stays nohash-keyed
fn pair_key(src: NodeId, dst: NodeId) -> u64 {
    debug_assert!(src <= u32::MAX as usize && dst <= u32::MAX as usize);
    ((src as u64) << 32) | dst as u64
}

// all live lightpaths, keyed by ordered (source, destination) pair
// a pair may carry several concurrent connections; vec order is
// registration order, which delete uses as its deterministic tie-break
pub struct ConnectionLedger {
    paths: HashMap<u64, Vec<Connection>>,
}

impl ConnectionLedger {
    pub fn new() -> Self {
        Self {
            paths: HashMap::with_hasher(nohash::BuildNoHashHasher::default()),
        }
    }

    pub fn has_pair(&self, src: NodeId, dst: NodeId) -> bool {
        self.paths
            .get(&pair_key(src, dst))
            .is_some_and(|v| !v.is_empty())
    }

    pub fn pair(&self, src: NodeId, dst: NodeId) -> Option<&[Connection]> {
        let list = self.paths.get(&pair_key(src, dst))?;
        if list.is_empty() { None } else { Some(list) }
    }

    pub(crate) fn pair_mut(&mut self, src: NodeId, dst: NodeId) -> Option<&mut Vec<Connection>> {
        let list = self.paths.get_mut(&pair_key(src, dst))?;
        if list.is_empty() { None } else { Some(list) }
    }

    pub(crate) fn register(&mut self, src: NodeId, dst: NodeId, connection: Connection) {
        self.paths
            .entry(pair_key(src, dst))
            .or_default()
            .push(connection);
    }

    pub(crate) fn unregister(&mut self, src: NodeId, dst: NodeId, index: usize) -> Connection {
        let key = pair_key(src, dst);
        let list = self.paths.get_mut(&key).expect("unregistering an unknown pair");
        let removed = list.remove(index);
        if list.is_empty() {
            self.paths.remove(&key);
        }
        removed
    }

    // total live connection count across all pairs
    pub fn active_count(&self) -> usize {
        self.paths.values().map(|v| v.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.paths.values().flatten()
    }
}

impl Default for ConnectionLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{Connection, ConnectionLedger};

    #[test]
    fn test_equality_is_route_only() {
        let a = Connection::new(vec![0, 1], 0, 4);
        let b = Connection::new(vec![0, 1], 8, 2);
        let c = Connection::new(vec![0, 2], 0, 4);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_window_moves() {
        let mut c = Connection::new(vec![3], 4, 4);
        c.grow_high(2);
        assert_eq!((c.slot_begin(), c.slot_num()), (4, 6));
        c.grow_low(2);
        assert_eq!((c.slot_begin(), c.slot_num()), (2, 8));
        c.shrink_low(3);
        assert_eq!((c.slot_begin(), c.slot_num()), (5, 5));
        c.shrink_high(1);
        assert_eq!((c.slot_begin(), c.slot_num()), (5, 4));
        assert_eq!(c.slot_end(), 9);
    }

    #[test]
    fn test_register_order_is_kept() {
        let mut ledger = ConnectionLedger::new();
        ledger.register(0, 1, Connection::new(vec![0], 0, 4));
        ledger.register(0, 1, Connection::new(vec![1, 2], 4, 4));
        assert_eq!(ledger.active_count(), 2);
        let list = ledger.pair(0, 1).unwrap();
        assert_eq!(list[0].links(), &[0]);
        assert_eq!(list[1].links(), &[1, 2]);

        let removed = ledger.unregister(0, 1, 0);
        assert_eq!(removed.links(), &[0]);
        assert_eq!(ledger.pair(0, 1).unwrap()[0].links(), &[1, 2]);
        ledger.unregister(0, 1, 0);
        assert!(!ledger.has_pair(0, 1));
        assert_eq!(ledger.active_count(), 0);
    }

    #[test]
    fn test_directed_pairs_are_distinct() {
        let mut ledger = ConnectionLedger::new();
        ledger.register(2, 5, Connection::new(vec![7], 0, 1));
        assert!(ledger.has_pair(2, 5));
        assert!(!ledger.has_pair(5, 2));
    }
}
