//! Unit tests for the HNSW index.

mod build;
