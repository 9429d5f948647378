//! Metric selection and the raw distance kernels.

use std::{fmt, str::FromStr};

use super::types::DistanceError;

/// Distance metric used to compare vectors within an index.
///
/// # Examples
/// ```
/// use vecnav_core::DistanceMetric;
///
/// let metric: DistanceMetric = "cosine".parse().expect("known metric");
/// assert_eq!(metric, DistanceMetric::Cosine);
/// assert!(metric.requires_normalisation());
/// assert_eq!(DistanceMetric::L2.distance(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum DistanceMetric {
    /// Squared Euclidean distance.
    #[default]
    L2,
    /// `1 - <a, b>`.
    InnerProduct,
    /// Inner-product distance over vectors normalised on the way in.
    Cosine,
}

impl DistanceMetric {
    /// Computes the distance between `left` and `right`.
    ///
    /// Both slices must share the index dimension; this is checked by the
    /// caller and only asserted in debug builds.
    #[inline]
    #[must_use]
    pub fn distance(self, left: &[f32], right: &[f32]) -> f32 {
        match self {
            Self::L2 => squared_euclidean(left, right),
            Self::InnerProduct | Self::Cosine => inner_product_distance(left, right),
        }
    }

    /// Returns whether vectors must be unit length before use.
    #[must_use]
    pub const fn requires_normalisation(self) -> bool {
        matches!(self, Self::Cosine)
    }

    /// Returns the short name accepted by the `FromStr` implementation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::L2 => "l2",
            Self::InnerProduct => "ip",
            Self::Cosine => "cosine",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = DistanceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "l2" => Ok(Self::L2),
            "ip" => Ok(Self::InnerProduct),
            "cosine" => Ok(Self::Cosine),
            other => Err(DistanceError::UnknownMetric {
                provided: other.to_owned(),
            }),
        }
    }
}

/// Squared Euclidean distance between two equal-length vectors.
///
/// # Examples
/// ```
/// use vecnav_core::squared_euclidean;
///
/// assert_eq!(squared_euclidean(&[1.0, 2.0], &[4.0, 6.0]), 25.0);
/// ```
#[inline]
#[must_use]
pub fn squared_euclidean(left: &[f32], right: &[f32]) -> f32 {
    debug_assert_eq!(left.len(), right.len(), "dimensions are validated upstream");
    left.iter()
        .zip(right)
        .map(|(&l, &r)| {
            let diff = l - r;
            diff * diff
        })
        .sum()
}

/// Inner-product distance, `1 - <left, right>`.
///
/// On unit vectors this is the cosine distance and a vector's distance to
/// itself is zero.
#[inline]
#[must_use]
pub fn inner_product_distance(left: &[f32], right: &[f32]) -> f32 {
    debug_assert_eq!(left.len(), right.len(), "dimensions are validated upstream");
    let dot: f32 = left.iter().zip(right).map(|(&l, &r)| l * r).sum();
    1.0 - dot
}
