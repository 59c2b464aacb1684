// dynamic traffic provisioning over an elastic optical network
// each lightpath needs the same contiguous slot window on every fibre
// it crosses (spectrum continuity and contiguity), so routing and
// spectrum assignment are solved together

pub mod connections;
pub mod fragmentation;
pub(crate) mod ksp;
pub mod ops;
pub mod sim;
pub mod spectrum;
pub mod topology;

pub use crate::dsa::graph::{LinkId, NodeId};
