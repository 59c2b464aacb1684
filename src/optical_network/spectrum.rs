use lazy_static::lazy_static;

use crate::dsa::bitset::SlotMask;
use crate::dsa::graph::LinkId;

// slot grid of the original study: 300 slots of 12.5 GHz per fibre
pub const DEFAULT_SLOTS_PER_LINK: usize = 300;
const C_SLOT_GHZ: f64 = 12.5;

pub(crate) type SlotCount = usize;

// modulation tiers, highest order first
// small demands ride high-order modulation and pack more capacity per slot;
// the order is non-increasing with capacity, which keeps width_for monotone
lazy_static! {
    static ref MODULATION_TIERS: Vec<(f64, u32)> = {
        // (capacity ceiling in Gbps, bits-per-symbol factor)
        let tiers = vec![
            (100.0, 4),
            (200.0, 3),
            (400.0, 2),
            (f64::INFINITY, 1),
        ];
        assert!(tiers.windows(2).all(|w| w[0].0 < w[1].0 && w[0].1 > w[1].1));
        tiers
    };
}

fn modulation_order(capacity: f64) -> u32 {
    for (ceiling, order) in MODULATION_TIERS.iter() {
        if capacity <= *ceiling {
            return *order;
        }
    }
    unreachable!("tier table ends with an unbounded ceiling")
}

// capacity (Gbps) to contiguous slot count; monotone non-decreasing
pub(crate) fn width_for(capacity: f64) -> SlotCount {
    if capacity <= 0.0 {
        return 0;
    }
    let order = modulation_order(capacity);
    let per_slot = order as f64 * C_SLOT_GHZ;
    (capacity / per_slot).ceil() as SlotCount
}

// per-link occupation masks, the only mutable state shared by all operations
// invariant: a bit is set on a link iff some recorded connection through
// that link covers the position
pub struct SlotLedger {
    masks: Vec<SlotMask>,
}

impl SlotLedger {
    pub fn new(links_len: usize, slots_per_link: usize) -> Self {
        Self {
            masks: (0..links_len).map(|_| SlotMask::new(slots_per_link)).collect(),
        }
    }

    pub fn slots_per_link(&self) -> usize {
        self.masks.first().map(|m| m.len()).unwrap_or(0)
    }

    pub fn links_len(&self) -> usize {
        self.masks.len()
    }

    pub(crate) fn mask(&self, link: LinkId) -> &SlotMask {
        &self.masks[link]
    }

    // first-fit: smallest start where [start, start+width) is free on every link
    // continuity (same window everywhere) and contiguity (one run) by construction
    pub(crate) fn find_window(&self, links: &[LinkId], width: SlotCount) -> Option<usize> {
        if width == 0 || links.is_empty() {
            return None;
        }
        let total = self.slots_per_link();
        if width > total {
            return None;
        }
        (0..=total - width)
            .find(|start| links.iter().all(|link| self.masks[*link].is_range_free(*start, width)))
    }

    // free on all links in the window, without claiming it
    pub(crate) fn is_window_free(&self, links: &[LinkId], start: usize, width: SlotCount) -> bool {
        links.iter().all(|link| self.masks[*link].is_range_free(start, width))
    }

    // caller must have checked the window is free; occupying an occupied
    // slot is a programming error and trips the mask's debug assertions
    pub(crate) fn occupy(&mut self, links: &[LinkId], start: usize, width: SlotCount) {
        for link in links {
            self.masks[*link].set_range(start, width);
        }
    }

    pub(crate) fn release(&mut self, links: &[LinkId], start: usize, width: SlotCount) {
        for link in links {
            self.masks[*link].clear_range(start, width);
        }
    }
}

impl PartialEq for SlotLedger {
    fn eq(&self, other: &Self) -> bool {
        self.masks == other.masks
    }
}

impl Clone for SlotLedger {
    fn clone(&self) -> Self {
        Self { masks: self.masks.clone() }
    }
}
