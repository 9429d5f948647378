//! Command implementations and argument parsing for the vecnav CLI.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::{Span, field, info, instrument};
use vecnav_core::{DistanceMetric, HnswError, HnswIndex, HnswParams, SearchHit};

use super::input::load_vectors;

const DEFAULT_K: usize = 10;
const DEFAULT_MAX_CONNECTIONS: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_SEED: u64 = 100;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "vecnav",
    about = "Build an HNSW index over a vector file and answer k-NN queries."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Index a vector file and search it with the vectors from `--query`.
    Search(SearchCommand),
}

/// Options accepted by the `search` command.
#[derive(Debug, Args, Clone)]
pub struct SearchCommand {
    /// Vector file to index; each row's position becomes its label.
    pub data: PathBuf,

    /// Vector file holding the queries.
    #[arg(long)]
    pub query: PathBuf,

    /// Number of neighbours to return per query.
    #[arg(long, default_value_t = DEFAULT_K)]
    pub k: usize,

    /// Neighbours kept per node on upper layers (`M`).
    #[arg(long = "m", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: usize,

    /// Candidate breadth used while inserting.
    #[arg(long, default_value_t = DEFAULT_EF_CONSTRUCTION)]
    pub ef_construction: usize,

    /// Candidate breadth used while searching; 0 uses `k`.
    #[arg(long, default_value_t = 0)]
    pub ef: usize,

    /// Seed for level sampling.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Distance metric: `l2`, `ip` or `cosine`.
    #[arg(long, default_value = "l2")]
    pub metric: DistanceMetric,

    /// Maximum number of vectors; defaults to the number of data rows.
    #[arg(long)]
    pub capacity: Option<usize>,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed while loading vectors.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// A row could not be parsed as a vector.
    #[error("{path}:{line}: {message}")]
    Parse {
        /// File containing the bad row.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },
    /// A vector file held no vectors.
    #[error("`{path}` contains no vectors")]
    EmptyInput {
        /// Offending file.
        path: PathBuf,
    },
    /// Index construction or search failed.
    #[error(transparent)]
    Core(#[from] HnswError),
}

/// Neighbours found for one query row.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Zero-based position of the query among the query rows.
    pub query: usize,
    /// Hits ordered nearest first.
    pub hits: Vec<SearchHit>,
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone)]
pub struct SearchSummary {
    /// Name derived from the data file.
    pub data_source: String,
    /// Number of vectors indexed.
    pub indexed: usize,
    /// Dimension of the indexed vectors.
    pub dimension: usize,
    /// Metric used for every distance.
    pub metric: DistanceMetric,
    /// Per-query results in query order.
    pub results: Vec<QueryResult>,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when loading, indexing or searching fails.
///
/// # Examples
/// ```
/// # use std::{error::Error, ffi::OsStr};
/// # use vecnav_cli::cli::{Cli, run_cli};
/// # use clap::Parser;
/// # use tempfile::TempDir;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let dir = TempDir::new()?;
/// let data = dir.path().join("data.txt");
/// let query = dir.path().join("query.txt");
/// std::fs::write(&data, "0 0\n1 0\n5 5\n")?;
/// std::fs::write(&query, "0.9 0.1\n")?;
/// let cli = Cli::try_parse_from([
///     OsStr::new("vecnav"),
///     OsStr::new("search"),
///     data.as_os_str(),
///     OsStr::new("--query"),
///     query.as_os_str(),
///     OsStr::new("--k"),
///     OsStr::new("1"),
/// ])?;
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.results[0].hits[0].label, 1);
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<SearchSummary, CliError> {
    match cli.command {
        Command::Search(search) => {
            Span::current().record("command", field::display("search"));
            run_search(&search)
        }
    }
}

#[instrument(
    name = "cli.search",
    err,
    skip(command),
    fields(data = field::Empty, metric = field::Empty, k = command.k),
)]
pub(super) fn run_search(command: &SearchCommand) -> Result<SearchSummary, CliError> {
    let span = Span::current();
    span.record("data", field::display(command.data.display()));
    span.record("metric", field::display(command.metric));

    let vectors = load_vectors(&command.data)?;
    let queries = load_vectors(&command.query)?;
    let index = build_index(command, &vectors)?;

    let results = queries
        .iter()
        .enumerate()
        .map(|(query, vector)| -> Result<QueryResult, CliError> {
            Ok(QueryResult {
                query,
                hits: index.search(vector, command.k)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let summary = SearchSummary {
        data_source: derive_data_source_name(&command.data),
        indexed: index.len(),
        dimension: index.dimension(),
        metric: index.metric(),
        results,
    };
    info!(
        data_source = summary.data_source.as_str(),
        indexed = summary.indexed,
        queries = summary.results.len(),
        "search completed"
    );
    Ok(summary)
}

pub(super) fn build_index(
    command: &SearchCommand,
    vectors: &[Vec<f32>],
) -> Result<HnswIndex, CliError> {
    let dimension = vectors.first().map_or(0, Vec::len);
    let params = HnswParams::new(dimension, command.max_connections, command.ef_construction)?
        .with_ef(command.ef)
        .with_metric(command.metric)
        .with_rng_seed(command.seed);
    let index = HnswIndex::with_capacity(params, command.capacity.unwrap_or(vectors.len()))?;
    for (label, vector) in (0_u64..).zip(vectors) {
        index.insert(vector, label)?;
    }
    info!(indexed = index.len(), dimension, "index built");
    Ok(index)
}

pub(super) fn derive_data_source_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|value| value.to_str())
        .map_or_else(|| "data_source".to_owned(), ToOwned::to_owned)
}

/// Renders `summary` to `writer` in a tab-separated text format.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use vecnav_cli::cli::{QueryResult, SearchSummary, render_summary};
/// # use vecnav_core::{DistanceMetric, SearchHit};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = SearchSummary {
///     data_source: "demo".into(),
///     indexed: 2,
///     dimension: 3,
///     metric: DistanceMetric::L2,
///     results: vec![QueryResult {
///         query: 0,
///         hits: vec![SearchHit { id: 1, label: 1, distance: 0.5 }],
///     }],
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// let text = String::from_utf8(buffer)?;
/// assert!(text.ends_with("query 0\n\t1\t0.5\n"));
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &SearchSummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "data source: {}", summary.data_source)?;
    writeln!(
        writer,
        "indexed: {} (dimension {}, metric {})",
        summary.indexed, summary.dimension, summary.metric
    )?;
    for result in &summary.results {
        writeln!(writer, "query {}", result.query)?;
        for hit in &result.hits {
            writeln!(writer, "\t{}\t{}", hit.label, hit.distance)?;
        }
    }
    Ok(())
}
