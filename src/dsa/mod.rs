pub(crate) mod bitset;
pub(crate) mod graph;
