//! The spatial index layer: per-dataset two-layer buckets (§3) and the
//! nine-way plane sweep join kernel that runs over them (§4.2).

pub mod sweep;
pub mod two_layer;

pub use sweep::join;
pub use two_layer::{Partition, TwoLayerIndex};

use crate::geometry::{Mbr, MbrRelation};

/// The "topology MBR filter": classify the relationship between two
/// MBRs before falling through to the APRIL filter or refinement
/// (§4.2 "Topology MBR filter"). A thin, named wrapper over
/// [`Mbr::relation_to`] so call sites read as a named pipeline stage.
pub fn topology_mbr_relation(a: &Mbr, b: &Mbr) -> MbrRelation {
    a.relation_to(b)
}
