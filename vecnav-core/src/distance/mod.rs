//! Distance primitives for the metrics supported by the index.
//!
//! Metric functions do not validate their inputs. Dimension and finiteness
//! are checked once at the index boundary. All arithmetic stays in `f32`.

mod metric;
mod normalise;
mod types;

pub use self::metric::{DistanceMetric, inner_product_distance, squared_euclidean};
pub use self::normalise::{l2_norm, normalise, validate_components};
pub use self::types::DistanceError;
