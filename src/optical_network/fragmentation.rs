use crate::dsa::graph::LinkId;
use crate::optical_network::spectrum::SlotLedger;

// free spectrum split into r maximal runs totalling f slots scores
// (r - 1) / f: one unbroken run or a full link scores 0, many small
// runs push the value towards 1
pub fn link_fragmentation(ledger: &SlotLedger, link: LinkId) -> f64 {
    let mask = ledger.mask(link);
    let runs = mask.free_runs().len();
    let free = mask.count_free();
    if free == 0 || runs <= 1 {
        return 0.0;
    }
    (runs - 1) as f64 / free as f64
}

// arithmetic mean across every link of the plant
pub fn mean_fragmentation(ledger: &SlotLedger) -> f64 {
    if ledger.links_len() == 0 {
        return 0.0;
    }
    let sum: f64 = (0..ledger.links_len())
        .map(|link| link_fragmentation(ledger, link))
        .sum();
    sum / ledger.links_len() as f64
}

// mean over one connection's links, the reduce policy's local view
pub(crate) fn path_fragmentation(ledger: &SlotLedger, links: &[LinkId]) -> f64 {
    if links.is_empty() {
        return 0.0;
    }
    let sum: f64 = links
        .iter()
        .map(|link| link_fragmentation(ledger, *link))
        .sum();
    sum / links.len() as f64
}
