//! # GBWTGraph: pangenome graphs with a path index
//!
//! This crate builds, serializes, and queries GBZ graphs: bidirected
//! sequence graphs with a path index over the haplotype paths. A GBZ graph
//! is constructed from a GFA file, serialized into a compact self-describing
//! container, and queried for subgraphs around nodes or positions on
//! reference paths.
//!
//! The main entry points are:
//!
//! * [`gfa::gfa_to_gbwt`] and [`gfa::gfa_to_gbz`] for construction.
//! * [`GBZ`] for the graph interface and serialization, using the
//!   Simple-SDS data format through [`simple_sds::serialize`].
//! * [`Subgraph`] and [`SubgraphQuery`] for subgraph queries, with
//!   [`PathIndex`] providing random access to reference path positions.
//! * [`gfa::gbwt_to_gfa`] for writing a graph back as GFA.
//!
//! # References
//!
//! Jouni Sirén and Benedict Paten: **GBZ file format for pangenome graphs**.\
//! Bioinformatics 38(22):5012-5018, 2022.
//! DOI: [10.1093/bioinformatics/btac656](https://doi.org/10.1093/bioinformatics/btac656)

pub mod algorithms;
pub mod formats;
pub mod gbwt;
pub mod gbz;
pub mod gfa;
pub mod graph;
pub mod headers;
pub mod internal;
pub mod metadata;
pub mod path_index;
pub mod shared;
pub mod source;
pub mod subgraph;
pub mod support;
pub mod utils;

//-----------------------------------------------------------------------------

pub use crate::algorithms::{ConstructionJobs, HandleGraph};
pub use crate::gbwt::{GBWT, GBWTBuilder, Pos};
pub use crate::gbz::GBZ;
pub use crate::gfa::{GFAParsingParameters, gfa_to_gbwt, gfa_to_gbz, gbwt_to_gfa};
pub use crate::graph::{Graph, Placement};
pub use crate::metadata::{FullPathName, Metadata, PathName};
pub use crate::path_index::PathIndex;
pub use crate::shared::SharedMemory;
pub use crate::source::SequenceSource;
pub use crate::subgraph::{HaplotypeOutput, Subgraph, SubgraphQuery};
pub use crate::support::Orientation;

//-----------------------------------------------------------------------------

/// Node identifier `0` is reserved for technical purposes and does not exist
/// in any graph.
pub const ENDMARKER: usize = 0;

/// Key of the source tag.
pub const SOURCE_KEY: &str = "source";

/// Value of the source tag.
pub const SOURCE_VALUE: &str = "jltsiren/gbwtgraph";

/// Sample name for reference and generic paths.
///
/// This sample name is used for GFA P-lines. The actual path name is stored
/// as a contig name.
pub const REF_SAMPLE: &str = "_gbwt_ref";

//-----------------------------------------------------------------------------
