//! Queries for extracting a subgraph from a GBZ graph.

use crate::metadata::FullPathName;

use std::fmt::Display;
use std::ops::Range;

//-----------------------------------------------------------------------------

/// Output options for the haplotypes in the subgraph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HaplotypeOutput {
    /// Output all haplotypes as separate paths.
    All,
    /// Output only distinct haplotypes with the number of duplicates stored in the weight field.
    Distinct,
    /// Output only the reference path.
    ReferenceOnly,
}

impl Display for HaplotypeOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HaplotypeOutput::All => write!(f, "all"),
            HaplotypeOutput::Distinct => write!(f, "distinct"),
            HaplotypeOutput::ReferenceOnly => write!(f, "reference only"),
        }
    }
}

//-----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum QueryType {
    // A context around a single node.
    Node(usize),
    // A context around a position (in bp) on a reference path.
    PathOffset(FullPathName, usize),
    // A context around an interval (in bp) of a reference path.
    PathInterval(FullPathName, Range<usize>),
}

//-----------------------------------------------------------------------------

/// Arguments for extracting a subgraph.
///
/// # Examples
///
/// ```
/// use gbwtgraph::{SubgraphQuery, HaplotypeOutput};
/// use gbwtgraph::FullPathName;
///
/// let path_name = FullPathName::generic("chr1");
/// let query = SubgraphQuery::path_offset(&path_name, 123)
///     .with_context(1000)
///     .with_output(HaplotypeOutput::Distinct);
/// assert_eq!(query.context(), 1000);
/// assert_eq!(query.output(), HaplotypeOutput::Distinct);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubgraphQuery {
    query_type: QueryType,

    // Context size around the query position (in bp).
    context: usize,

    // How to output the haplotypes.
    output: HaplotypeOutput,
}

impl SubgraphQuery {
    /// Default value for the context length (in bp).
    pub const DEFAULT_CONTEXT: usize = 100;

    /// Creates a query that retrieves a context around the given node.
    pub fn node(node_id: usize) -> Self {
        SubgraphQuery {
            query_type: QueryType::Node(node_id),
            context: Self::DEFAULT_CONTEXT,
            output: HaplotypeOutput::All,
        }
    }

    /// Creates a query that retrieves a context around a path offset.
    ///
    /// The reference path is specified by a sample name, a contig name, and
    /// optionally a haplotype number.
    pub fn path_offset(path_name: &FullPathName, offset: usize) -> Self {
        SubgraphQuery {
            query_type: QueryType::PathOffset(path_name.clone(), offset),
            context: Self::DEFAULT_CONTEXT,
            output: HaplotypeOutput::All,
        }
    }

    /// Creates a query that retrieves a context around a path interval.
    ///
    /// The reference path is specified by a sample name, a contig name, and
    /// optionally a haplotype number.
    pub fn path_interval(path_name: &FullPathName, interval: Range<usize>) -> Self {
        SubgraphQuery {
            query_type: QueryType::PathInterval(path_name.clone(), interval),
            context: Self::DEFAULT_CONTEXT,
            output: HaplotypeOutput::All,
        }
    }

    /// Returns an updated query with the given context length (in bp).
    pub fn with_context(self, context: usize) -> Self {
        SubgraphQuery { context, ..self }
    }

    /// Returns an updated query with the given haplotype output option.
    pub fn with_output(self, output: HaplotypeOutput) -> Self {
        SubgraphQuery { output, ..self }
    }

    pub(crate) fn query_type(&self) -> &QueryType {
        &self.query_type
    }

    /// Returns the context length (in bp) for the query.
    pub fn context(&self) -> usize {
        self.context
    }

    /// Returns the haplotype output option for the query.
    pub fn output(&self) -> HaplotypeOutput {
        self.output
    }
}

impl Display for SubgraphQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.query_type() {
            QueryType::Node(node_id) => {
                write!(f, "(node {}, context {}, {})", node_id, self.context, self.output)
            }
            QueryType::PathOffset(path_name, offset) => {
                write!(f, "(path {}, offset {}, context {}, {})", path_name, offset, self.context, self.output)
            }
            QueryType::PathInterval(path_name, interval) => {
                write!(f, "(path {}, interval {}..{}, context {}, {})", path_name, interval.start, interval.end, self.context, self.output)
            }
        }
    }
}

//-----------------------------------------------------------------------------
