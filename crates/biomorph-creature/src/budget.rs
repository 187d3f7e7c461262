//! Budget allocation helpers
//!
//! Two primitives used by the phenotype deriver: proportional group
//! normalization (scale competing scores down so they sum to at most 1)
//! and largest-remainder apportionment of a discrete pool.

/// Scale every entry down proportionally if the group sum exceeds 1.
///
/// Entries are never scaled up; a group already summing below 1 is left
/// untouched.
pub fn normalize_group(entries: &mut [f32]) {
    for entry in entries.iter_mut() {
        *entry = entry.max(0.0);
    }
    let total: f32 = entries.iter().sum();
    if total > 1.0 {
        for entry in entries.iter_mut() {
            *entry /= total;
        }
    }
}

/// Apportion `pool` discrete units across `shares` via largest-remainder
/// rounding. The returned counts always sum to exactly `pool`.
///
/// All-zero shares send the whole pool to the first category so the
/// conservation contract holds even for degenerate inputs.
pub fn apportion(shares: &[f32], pool: u32) -> Vec<u32> {
    if shares.is_empty() {
        return Vec::new();
    }

    let total: f32 = shares.iter().map(|s| s.max(0.0)).sum();
    if total <= 0.0 {
        let mut counts = vec![0; shares.len()];
        counts[0] = pool;
        return counts;
    }

    let quotas: Vec<f32> = shares
        .iter()
        .map(|s| s.max(0.0) / total * pool as f32)
        .collect();
    let mut counts: Vec<u32> = quotas.iter().map(|q| q.floor() as u32).collect();
    let assigned: u32 = counts.iter().sum();

    // Hand the leftover units to the largest fractional remainders
    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = quotas[a] - quotas[a].floor();
        let rb = quotas[b] - quotas[b].floor();
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });
    for i in 0..(pool - assigned) as usize {
        counts[order[i % order.len()]] += 1;
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_leaves_small_groups_alone() {
        let mut group = [0.2, 0.3, 0.1];
        normalize_group(&mut group);
        assert_eq!(group, [0.2, 0.3, 0.1]);
    }

    #[test]
    fn test_normalize_scales_down_proportionally() {
        let mut group = [1.0, 1.0, 2.0];
        normalize_group(&mut group);
        let total: f32 = group.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!((group[2] - 0.5).abs() < 1e-6, "ratios preserved");
    }

    #[test]
    fn test_normalize_clamps_negative_entries() {
        let mut group = [-0.5, 0.4];
        normalize_group(&mut group);
        assert_eq!(group[0], 0.0);
    }

    #[test]
    fn test_apportion_conserves_pool() {
        for pool in 0..=12 {
            let counts = apportion(&[0.31, 0.27, 0.22, 0.2], pool);
            assert_eq!(counts.iter().sum::<u32>(), pool, "pool {pool} lost units");
        }
    }

    #[test]
    fn test_apportion_favors_larger_shares() {
        let counts = apportion(&[0.7, 0.2, 0.1], 6);
        assert!(counts[0] >= counts[1]);
        assert!(counts[1] >= counts[2]);
    }

    #[test]
    fn test_apportion_all_zero_shares_goes_to_first() {
        let counts = apportion(&[0.0, 0.0, 0.0], 4);
        assert_eq!(counts, vec![4, 0, 0]);
    }

    #[test]
    fn test_apportion_empty() {
        assert!(apportion(&[], 3).is_empty());
    }
}
