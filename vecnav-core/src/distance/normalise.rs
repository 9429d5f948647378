//! Vector validation and unit-length normalisation.

use super::types::{DistanceError, Result};

/// Returns the L2 magnitude of `vector`.
#[inline]
#[must_use]
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|&value| value * value).sum::<f32>().sqrt()
}

/// Ensures every component of `vector` is finite.
///
/// # Errors
/// Returns [`DistanceError::NonFinite`] for the first NaN or infinite
/// component.
pub fn validate_components(vector: &[f32]) -> Result<()> {
    match vector
        .iter()
        .copied()
        .enumerate()
        .find(|(_, value)| !value.is_finite())
    {
        Some((index, value)) => Err(DistanceError::NonFinite { index, value }),
        None => Ok(()),
    }
}

/// Scales `vector` in place to unit L2 norm.
///
/// # Errors
/// Returns [`DistanceError::ZeroMagnitude`] when the magnitude is zero or not
/// finite; `vector` is left untouched in that case.
///
/// # Examples
/// ```
/// use vecnav_core::{l2_norm, normalise};
///
/// let mut vector = [4.0_f32, 5.0, 6.0];
/// normalise(&mut vector).expect("non-zero vector");
/// assert!((l2_norm(&vector) - 1.0).abs() < 1e-6);
/// ```
pub fn normalise(vector: &mut [f32]) -> Result<()> {
    let norm = l2_norm(vector);
    if !norm.is_finite() || norm <= 0.0 {
        return Err(DistanceError::ZeroMagnitude);
    }
    let scale = norm.recip();
    for component in vector.iter_mut() {
        *component *= scale;
    }
    Ok(())
}
