/// Ranks closer together than this are treated as identical.
pub const FLAT_EPSILON: f64 = 1e-9;

/// Min-max rescales one bucket's raw ranks (lower is better) into `[0, 1]`,
/// where 1.0 is the best rank in the bucket. A flat bucket scores 1.0 throughout.
///
/// Only meaningful within a single bucket of a single query.
pub fn normalize_ranks(ranks: &[f64]) -> Vec<f64> {
    let Some(min) = ranks.iter().copied().reduce(f64::min) else { return Vec::new() };
    let max = ranks.iter().copied().fold(min, f64::max);
    let spread = max - min;
    if spread < FLAT_EPSILON {
        return vec![1.0; ranks.len()];
    }
    ranks.iter().map(|r| 1.0 - (r - min) / spread).collect()
}
