pub(crate) mod dsa;
pub mod optical_network;
