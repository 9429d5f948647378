//! Command-line interface orchestration for vecnav.
//!
//! The `search` command loads a vector file, builds an HNSW index over it,
//! and answers k-NN queries read from a second file.

mod commands;
mod input;

pub use commands::{
    Cli, CliError, Command, QueryResult, SearchCommand, SearchSummary, render_summary, run_cli,
};
pub use input::parse_vector_line;
