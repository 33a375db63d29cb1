//! Static lookup tables mirroring the publisher's encoding: region codes,
//! virus codes and the positional table bindings.

pub mod layout;
pub mod region;
pub mod virus;

pub use layout::{bind_tables, TableBinding, Variant, BINDINGS, LAYOUT_VERSION};
pub use region::{Region, RegionCoverage};
pub use virus::Virus;
