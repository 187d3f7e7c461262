//! Weighted-argmax classification shared by every categorical pick
//!
//! Body plan, locomotion, limb type and skin type all follow the same
//! pattern: score every variant from genome traits, multiply by a
//! biome-supplied weight, pick the maximum. Ties break toward the
//! first-declared variant so classification stays stable across runs.

/// Pick the variant with the highest `score * weight`.
///
/// `variants` pairs each candidate with its raw score; `weight_of` supplies
/// the biome multiplier (1.0 when the biome has no opinion). The first
/// variant wins ties because later candidates only replace the leader on a
/// strictly greater product.
pub fn weighted_argmax<T: Copy>(
    variants: &[(T, f32)],
    mut weight_of: impl FnMut(T) -> f32,
) -> Option<T> {
    let mut best: Option<(T, f32)> = None;
    for &(variant, score) in variants {
        let weighted = score * weight_of(variant);
        match best {
            Some((_, leader)) if weighted <= leader => {}
            _ => best = Some((variant, weighted)),
        }
    }
    best.map(|(variant, _)| variant)
}
