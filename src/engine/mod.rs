// src/engine/mod.rs
//
// The pure computation core: normalization, derived fields, filtering,
// aggregation and the export/import codec. Everything here is
// synchronous, deterministic and side-effect free; the handlers own all
// I/O and pass immutable snapshots in.

pub mod aggregate;
pub mod codec;
pub mod derive;
pub mod filter;
pub mod normalize;
