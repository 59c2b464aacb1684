use clap::ValueEnum;

use crate::dsa::graph::NodeId;
use crate::optical_network::connections::{Connection, ConnectionLedger};
use crate::optical_network::fragmentation::path_fragmentation;
use crate::optical_network::ksp::KShortestPaths;
use crate::optical_network::spectrum::{SlotLedger, width_for};
use crate::optical_network::topology::Topology;

// one demand line: capacity sign picks the operation
#[derive(Clone, Copy, Debug)]
pub struct Request {
    pub src: NodeId,
    pub dst: NodeId,
    pub capacity: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExpandDirection {
    // extend past the window's high boundary
    Up,
    // extend below the window's low boundary
    Down,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReducePriority {
    // cheapest route first, then narrowest window
    PathWeightSlot,
    // shrink where the spectrum is most fragmented
    FragmentationRate,
    SlotBigFirst,
    SlotSmallFirst,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CutEnd {
    Low,
    High,
}

// policy switches threaded into the operations per call
#[derive(Clone, Copy, Debug)]
pub struct RsaConfig {
    pub expand_direction: ExpandDirection,
    pub reduce_priority: ReducePriority,
    pub cut_end: CutEnd,
}

impl Default for RsaConfig {
    fn default() -> Self {
        // the original study's defaults: extend upward, pick by path
        // weight then window size, cut from the high end
        Self {
            expand_direction: ExpandDirection::Up,
            reduce_priority: ReducePriority::PathWeightSlot,
            cut_end: CutEnd::High,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Provisioned,
    // no feasible window anywhere; expected under load, not an error
    Blocked,
    // nothing to act on for this pair, or the release does not fit
    Undefined,
}

// walk candidate routes cheapest first, claim the first route with a
// first-fit window; mutates only on success
pub fn add(
    topology: &Topology,
    slots: &mut SlotLedger,
    connections: &mut ConnectionLedger,
    request: &Request,
) -> Outcome {
    debug_assert!(request.capacity > 0.0);
    let width = width_for(request.capacity);
    if width == 0 {
        return Outcome::Undefined;
    }
    for path in KShortestPaths::new(topology.graph(), request.src, request.dst) {
        let Some(start) = slots.find_window(&path.links, width) else {
            continue;
        };
        slots.occupy(&path.links, start, width);
        connections.register(
            request.src,
            request.dst,
            Connection::new(path.links, start, width),
        );
        return Outcome::Provisioned;
    }
    Outcome::Blocked
}

// grow one existing connection's window in place, adjacent to its boundary
// in the configured direction; Blocked tells the caller to fall back to add
pub fn expand(
    slots: &mut SlotLedger,
    connections: &mut ConnectionLedger,
    request: &Request,
    config: &RsaConfig,
) -> Outcome {
    debug_assert!(request.capacity > 0.0);
    let width = width_for(request.capacity);
    if width == 0 {
        return Outcome::Undefined;
    }
    let Some(list) = connections.pair_mut(request.src, request.dst) else {
        return Outcome::Undefined;
    };
    for connection in list.iter_mut() {
        match config.expand_direction {
            ExpandDirection::Up => {
                let start = connection.slot_end();
                if slots.is_window_free(connection.links(), start, width) {
                    slots.occupy(connection.links(), start, width);
                    connection.grow_high(width);
                    return Outcome::Provisioned;
                }
            }
            ExpandDirection::Down => {
                if connection.slot_begin() >= width {
                    let start = connection.slot_begin() - width;
                    if slots.is_window_free(connection.links(), start, width) {
                        slots.occupy(connection.links(), start, width);
                        connection.grow_low(width);
                        return Outcome::Provisioned;
                    }
                }
            }
        }
    }
    Outcome::Blocked
}

// candidate order under the active selection policy, as ledger indices
fn reduce_order(
    topology: &Topology,
    slots: &SlotLedger,
    list: &[Connection],
    priority: ReducePriority,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..list.len()).collect();
    match priority {
        ReducePriority::PathWeightSlot => {
            order.sort_by_key(|i| (topology.path_weight(list[*i].links()), list[*i].slot_num()));
        }
        ReducePriority::FragmentationRate => {
            // most fragmented route first; stable sort keeps registration
            // order between equals
            order.sort_by(|a, b| {
                let fa = path_fragmentation(slots, list[*a].links());
                let fb = path_fragmentation(slots, list[*b].links());
                fb.partial_cmp(&fa).unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        ReducePriority::SlotBigFirst => {
            order.sort_by_key(|i| std::cmp::Reverse(list[*i].slot_num()));
        }
        ReducePriority::SlotSmallFirst => {
            order.sort_by_key(|i| list[*i].slot_num());
        }
    }
    order
}

// release part of one connection's window from the configured end;
// a release the size of the whole window removes the record
pub fn reduce(
    topology: &Topology,
    slots: &mut SlotLedger,
    connections: &mut ConnectionLedger,
    request: &Request,
    config: &RsaConfig,
) -> Outcome {
    debug_assert!(request.capacity < 0.0);
    let width = width_for(-request.capacity);
    if width == 0 {
        return Outcome::Undefined;
    }
    let Some(list) = connections.pair(request.src, request.dst) else {
        return Outcome::Undefined;
    };
    let target = reduce_order(topology, slots, list, config.reduce_priority)
        .into_iter()
        .find(|i| list[*i].slot_num() >= width);
    // every candidate is narrower than the requested release
    let Some(target) = target else {
        return Outcome::Undefined;
    };

    let connection = &list[target];
    let (cut_start, emptied) = match config.cut_end {
        CutEnd::Low => (connection.slot_begin(), width == connection.slot_num()),
        CutEnd::High => (connection.slot_end() - width, width == connection.slot_num()),
    };
    let links = connection.links().to_vec();
    slots.release(&links, cut_start, width);

    if emptied {
        connections.unregister(request.src, request.dst, target);
        return Outcome::Provisioned;
    }
    let list = connections
        .pair_mut(request.src, request.dst)
        .expect("pair vanished during reduce");
    match config.cut_end {
        CutEnd::Low => list[target].shrink_low(width),
        CutEnd::High => list[target].shrink_high(width),
    }
    Outcome::Provisioned
}

// tear down the pair's first-registered connection in full
pub fn delete(
    slots: &mut SlotLedger,
    connections: &mut ConnectionLedger,
    request: &Request,
) -> Outcome {
    if !connections.has_pair(request.src, request.dst) {
        return Outcome::Undefined;
    }
    let removed = connections.unregister(request.src, request.dst, 0);
    slots.release(removed.links(), removed.slot_begin(), removed.slot_num());
    Outcome::Provisioned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optical_network::spectrum::SlotLedger;
    use crate::optical_network::topology::Topology;

    // capacity 150 maps through the tier table to 4 slots,
    // capacity 100 to 2 slots
    const CAP_4_SLOTS: f64 = 150.0;
    const CAP_2_SLOTS: f64 = 100.0;

    fn single_link() -> (Topology, SlotLedger, ConnectionLedger) {
        let mut topology = Topology::new();
        topology.add_link("A", "B", 1000, 1).unwrap();
        let slots = SlotLedger::new(topology.links_len(), 10);
        (topology, slots, ConnectionLedger::new())
    }

    fn request(topology: &Topology, src: &str, dst: &str, capacity: f64) -> Request {
        Request {
            src: topology.node(src).unwrap(),
            dst: topology.node(dst).unwrap(),
            capacity,
        }
    }

    // rebuild the slot ledger from the connection ledger; equality proves
    // the non-overlap and continuity invariants in one shot (an overlap
    // would trip the mask's occupation assertions)
    fn rebuilt(slots: &SlotLedger, connections: &ConnectionLedger) -> SlotLedger {
        let mut fresh = SlotLedger::new(slots.links_len(), slots.slots_per_link());
        for connection in connections.iter() {
            fresh.occupy(connection.links(), connection.slot_begin(), connection.slot_num());
        }
        fresh
    }

    #[test]
    fn test_fill_block_and_reuse() {
        let (topology, mut slots, mut connections) = single_link();
        let req = request(&topology, "A", "B", CAP_4_SLOTS);

        assert_eq!(add(&topology, &mut slots, &mut connections, &req), Outcome::Provisioned);
        let first = &connections.pair(req.src, req.dst).unwrap()[0];
        assert_eq!((first.slot_begin(), first.slot_num()), (0, 4));

        assert_eq!(add(&topology, &mut slots, &mut connections, &req), Outcome::Provisioned);
        let second = &connections.pair(req.src, req.dst).unwrap()[1];
        assert_eq!((second.slot_begin(), second.slot_num()), (4, 4));

        // two slots left on the only link
        assert_eq!(add(&topology, &mut slots, &mut connections, &req), Outcome::Blocked);

        // delete takes the first-registered connection, freeing [0,4)
        let del = request(&topology, "A", "B", 0.0);
        assert_eq!(delete(&mut slots, &mut connections, &del), Outcome::Provisioned);
        assert_eq!(add(&topology, &mut slots, &mut connections, &req), Outcome::Provisioned);
        let reused = connections.pair(req.src, req.dst).unwrap().last().unwrap();
        assert_eq!((reused.slot_begin(), reused.slot_num()), (0, 4));

        assert!(slots == rebuilt(&slots, &connections));
    }

    #[test]
    fn test_add_delete_roundtrip() {
        let (topology, mut slots, mut connections) = single_link();
        let before = slots.clone();
        let req = request(&topology, "A", "B", CAP_4_SLOTS);
        assert_eq!(add(&topology, &mut slots, &mut connections, &req), Outcome::Provisioned);
        let del = request(&topology, "A", "B", 0.0);
        assert_eq!(delete(&mut slots, &mut connections, &del), Outcome::Provisioned);
        // bit-for-bit back to the pre-add state
        assert!(slots == before);
        assert_eq!(connections.active_count(), 0);
    }

    #[test]
    fn test_expand_in_place() {
        let (topology, mut slots, mut connections) = single_link();
        let req = request(&topology, "A", "B", CAP_4_SLOTS);
        add(&topology, &mut slots, &mut connections, &req);

        let grow = request(&topology, "A", "B", CAP_2_SLOTS);
        let config = RsaConfig::default();
        assert_eq!(expand(&mut slots, &mut connections, &grow, &config), Outcome::Provisioned);

        // still one ledger entry, window grew from [0,4) to [0,6)
        let list = connections.pair(req.src, req.dst).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!((list[0].slot_begin(), list[0].slot_num()), (0, 6));
        assert!(slots == rebuilt(&slots, &connections));
    }

    #[test]
    fn test_expand_blocked_when_boundary_taken() {
        let (topology, mut slots, mut connections) = single_link();
        let req = request(&topology, "A", "B", CAP_4_SLOTS);
        add(&topology, &mut slots, &mut connections, &req); // [0,4)
        add(&topology, &mut slots, &mut connections, &req); // [4,8)

        // first connection's upper boundary abuts the second
        let grow = request(&topology, "A", "B", CAP_2_SLOTS);
        let config = RsaConfig::default();
        // second connection can still grow into [8,10)
        assert_eq!(expand(&mut slots, &mut connections, &grow, &config), Outcome::Provisioned);
        // no room anywhere now
        assert_eq!(expand(&mut slots, &mut connections, &grow, &config), Outcome::Blocked);
    }

    #[test]
    fn test_expand_down() {
        let (topology, mut slots, mut connections) = single_link();
        slots.occupy(&[0], 0, 2); // pin the low end
        let req = request(&topology, "A", "B", CAP_4_SLOTS);
        add(&topology, &mut slots, &mut connections, &req); // lands at [2,6)
        slots.release(&[0], 0, 2);

        let config = RsaConfig {
            expand_direction: ExpandDirection::Down,
            ..RsaConfig::default()
        };
        let grow = request(&topology, "A", "B", CAP_2_SLOTS);
        assert_eq!(expand(&mut slots, &mut connections, &grow, &config), Outcome::Provisioned);
        let list = connections.pair(req.src, req.dst).unwrap();
        assert_eq!((list[0].slot_begin(), list[0].slot_num()), (0, 6));
    }

    #[test]
    fn test_reduce_cut_ends() {
        let (topology, mut slots, mut connections) = single_link();
        let req = request(&topology, "A", "B", CAP_4_SLOTS);
        add(&topology, &mut slots, &mut connections, &req); // [0,4)

        let shrink = request(&topology, "A", "B", -CAP_2_SLOTS);
        let high = RsaConfig::default();
        assert_eq!(reduce(&topology, &mut slots, &mut connections, &shrink, &high), Outcome::Provisioned);
        let list = connections.pair(req.src, req.dst).unwrap();
        assert_eq!((list[0].slot_begin(), list[0].slot_num()), (0, 2));

        let low = RsaConfig { cut_end: CutEnd::Low, ..RsaConfig::default() };
        let shrink_one = request(&topology, "A", "B", -50.0); // 1 slot
        assert_eq!(reduce(&topology, &mut slots, &mut connections, &shrink_one, &low), Outcome::Provisioned);
        let list = connections.pair(req.src, req.dst).unwrap();
        assert_eq!((list[0].slot_begin(), list[0].slot_num()), (1, 1));
        assert!(slots == rebuilt(&slots, &connections));
    }

    #[test]
    fn test_reduce_to_zero_removes_record() {
        let (topology, mut slots, mut connections) = single_link();
        let before = slots.clone();
        let req = request(&topology, "A", "B", CAP_4_SLOTS);
        add(&topology, &mut slots, &mut connections, &req);

        let shrink = request(&topology, "A", "B", -CAP_4_SLOTS);
        let config = RsaConfig::default();
        assert_eq!(reduce(&topology, &mut slots, &mut connections, &shrink, &config), Outcome::Provisioned);
        assert_eq!(connections.active_count(), 0);
        assert!(slots == before);
    }

    #[test]
    fn test_reduce_oversized_is_a_noop() {
        let (topology, mut slots, mut connections) = single_link();
        let req = request(&topology, "A", "B", CAP_4_SLOTS);
        add(&topology, &mut slots, &mut connections, &req);
        let snapshot = slots.clone();

        // 6 slots requested against a 4 slot window
        let shrink = request(&topology, "A", "B", -225.0);
        let config = RsaConfig::default();
        assert_eq!(reduce(&topology, &mut slots, &mut connections, &shrink, &config), Outcome::Undefined);
        assert!(slots == snapshot);
        assert_eq!(connections.active_count(), 1);
    }

    #[test]
    fn test_undefined_on_missing_pair() {
        let (topology, mut slots, mut connections) = single_link();
        let snapshot = slots.clone();
        let del = request(&topology, "A", "B", 0.0);
        let shrink = request(&topology, "A", "B", -CAP_2_SLOTS);
        let config = RsaConfig::default();
        for _ in 0..2 {
            assert_eq!(delete(&mut slots, &mut connections, &del), Outcome::Undefined);
            assert_eq!(reduce(&topology, &mut slots, &mut connections, &shrink, &config), Outcome::Undefined);
            assert!(slots == snapshot);
        }
    }

    #[test]
    fn test_reduce_priorities() {
        // two routes A-B: direct (weight 5) and via C (weight 2), so the
        // second add lands on the longer ledger entry list
        let mut topology = Topology::new();
        topology.add_link("A", "B", 1000, 5).unwrap();
        topology.add_link("A", "C", 1000, 1).unwrap();
        topology.add_link("C", "B", 1000, 1).unwrap();
        let mut slots = SlotLedger::new(topology.links_len(), 10);
        let mut connections = ConnectionLedger::new();

        let wide = request(&topology, "A", "B", CAP_4_SLOTS);
        add(&topology, &mut slots, &mut connections, &wide); // via C, [0,4)
        let narrow = request(&topology, "A", "B", CAP_2_SLOTS);
        add(&topology, &mut slots, &mut connections, &narrow); // via C, [4,6)

        // smallest-window-first shrinks the 2 slot connection away
        let config = RsaConfig {
            reduce_priority: ReducePriority::SlotSmallFirst,
            ..RsaConfig::default()
        };
        let shrink = request(&topology, "A", "B", -CAP_2_SLOTS);
        assert_eq!(reduce(&topology, &mut slots, &mut connections, &shrink, &config), Outcome::Provisioned);
        let list = connections.pair(wide.src, wide.dst).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].slot_num(), 4);
    }

    #[test]
    fn test_reduce_path_weight_picks_cheaper_route() {
        // two routes A-B: direct at weight 5, via C at weight 2
        let mut topology = Topology::new();
        topology.add_link("A", "B", 1000, 5).unwrap();
        topology.add_link("A", "C", 1000, 1).unwrap();
        topology.add_link("C", "B", 1000, 1).unwrap();
        let mut slots = SlotLedger::new(topology.links_len(), 4);
        let mut connections = ConnectionLedger::new();

        let req = request(&topology, "A", "B", CAP_4_SLOTS);
        add(&topology, &mut slots, &mut connections, &req); // via C, fills that route
        add(&topology, &mut slots, &mut connections, &req); // direct fibre

        let config = RsaConfig::default(); // PathWeightSlot
        let shrink = request(&topology, "A", "B", -CAP_2_SLOTS);
        assert_eq!(reduce(&topology, &mut slots, &mut connections, &shrink, &config), Outcome::Provisioned);

        // the weight 2 route shrank, the direct lightpath is untouched
        let list = connections.pair(req.src, req.dst).unwrap();
        assert_eq!(list[0].links().len(), 2);
        assert_eq!(list[0].slot_num(), 2);
        assert_eq!(list[1].links().len(), 1);
        assert_eq!(list[1].slot_num(), 4);
    }

    #[test]
    fn test_reduce_big_first_shrinks_wider_window() {
        let (topology, mut slots, mut connections) = single_link();
        let req = request(&topology, "A", "B", CAP_4_SLOTS);
        add(&topology, &mut slots, &mut connections, &req); // [0,4)
        let small = request(&topology, "A", "B", CAP_2_SLOTS);
        add(&topology, &mut slots, &mut connections, &small); // [4,6)

        let config = RsaConfig {
            reduce_priority: ReducePriority::SlotBigFirst,
            ..RsaConfig::default()
        };
        let shrink = request(&topology, "A", "B", -CAP_2_SLOTS);
        assert_eq!(reduce(&topology, &mut slots, &mut connections, &shrink, &config), Outcome::Provisioned);

        let list = connections.pair(req.src, req.dst).unwrap();
        assert_eq!((list[0].slot_begin(), list[0].slot_num()), (0, 2));
        assert_eq!((list[1].slot_begin(), list[1].slot_num()), (4, 2));
        assert!(slots == rebuilt(&slots, &connections));
    }

    #[test]
    fn test_reduce_fragmentation_picks_fragmented_route() {
        // direct A-B is cheap, the detour via C carries the fragmented fibre
        let mut topology = Topology::new();
        topology.add_link("A", "B", 1000, 1).unwrap();
        topology.add_link("A", "C", 1000, 2).unwrap();
        topology.add_link("C", "B", 1000, 2).unwrap();
        let mut slots = SlotLedger::new(topology.links_len(), 10);
        let mut connections = ConnectionLedger::new();

        let req = request(&topology, "A", "B", CAP_2_SLOTS);
        add(&topology, &mut slots, &mut connections, &req); // direct, [0,2)
        slots.occupy(&[0], 2, 8); // saturate the direct fibre
        add(&topology, &mut slots, &mut connections, &req); // via C, [0,2)
        slots.release(&[0], 2, 8);

        // punch single-slot holes into A-C so the detour scores highest
        slots.occupy(&[1], 4, 1);
        slots.occupy(&[1], 6, 1);
        slots.occupy(&[1], 8, 1);

        let config = RsaConfig {
            reduce_priority: ReducePriority::FragmentationRate,
            ..RsaConfig::default()
        };
        let shrink = request(&topology, "A", "B", -CAP_2_SLOTS);
        assert_eq!(reduce(&topology, &mut slots, &mut connections, &shrink, &config), Outcome::Provisioned);

        // the detour lightpath was released in full, the direct one survives
        let list = connections.pair(req.src, req.dst).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].links().len(), 1);
        assert_eq!(list[0].slot_num(), 2);
    }

    #[test]
    fn test_add_takes_detour_when_short_route_is_full() {
        let mut topology = Topology::new();
        topology.add_link("A", "B", 1000, 1).unwrap();
        topology.add_link("A", "C", 1000, 2).unwrap();
        topology.add_link("C", "B", 1000, 2).unwrap();
        let mut slots = SlotLedger::new(topology.links_len(), 4);
        let mut connections = ConnectionLedger::new();

        // link 0 is the direct fibre, added first
        slots.occupy(&[0], 0, 4);

        let req = request(&topology, "A", "B", CAP_4_SLOTS);
        assert_eq!(add(&topology, &mut slots, &mut connections, &req), Outcome::Provisioned);
        let placed = &connections.pair(req.src, req.dst).unwrap()[0];
        assert_eq!(placed.links().len(), 2);
    }
}
