//! Distance functions.

/// Euclidean (L2) distance.
///
/// Callers guarantee equal lengths; extra components of the longer slice are
/// ignored.
#[inline]
pub fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}
