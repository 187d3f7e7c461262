//! Organism assembly
//!
//! `assemble` turns a [`Phenotype`] into a hierarchical [`RenderNode`] tree.
//! Dispatches on body plan to a structural builder, then applies locomotion
//! addons, biome-surface addons, face cues and a final re-centering pass.
//! The only pseudo-randomness is a generator seeded from a hash of the
//! phenotype itself, so identical phenotypes always assemble identically.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};

use biomorph_world::BiomeId;

use crate::phenotype::{BodyPlan, EyePlacement, LimbType, Locomotion, Phenotype, SkinType};

/// Fixed hash keys so the phenotype seed is stable across processes
const SEED_KEY_A: u64 = 0x9e37_79b9_7f4a_7c15;
const SEED_KEY_B: u64 = 0x2545_f491_4f6c_dd1d;
const SEED_KEY_C: u64 = 0x6a09_e667_f3bc_c909;
const SEED_KEY_D: u64 = 0xbb67_ae85_84ca_a73b;

/// Drawable primitive category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Circle,
    Oval,
    Rect,
    Triangle,
    Path,
}

/// Hint for the renderer's per-node animation channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationTag {
    Gait,
    Breath,
    Sway,
    Flap,
    Pulse,
}

/// One node of the organism's visual skeleton. Transforms are relative to
/// the parent; children are exclusively owned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub shape: ShapeKind,
    pub position: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
    pub color: [u8; 4],
    pub opacity: f32,
    pub z_index: i32,
    pub animation: Option<AnimationTag>,
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    fn new(shape: ShapeKind, position: Vec2, scale: Vec2, color: [u8; 4]) -> Self {
        Self {
            shape,
            position,
            rotation: 0.0,
            scale,
            color,
            opacity: 1.0,
            z_index: 0,
            animation: None,
            children: Vec::new(),
        }
    }

    fn rotated(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    fn layered(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    fn animated(mut self, tag: AnimationTag) -> Self {
        self.animation = Some(tag);
        self
    }

    fn faded(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Total node count, root included
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(RenderNode::count).sum::<usize>()
    }

    /// Axis-aligned bounds of the whole tree in root space, accumulated
    /// over relative translations
    pub fn bounding_box(&self) -> (Vec2, Vec2) {
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        accumulate_bounds(self, Vec2::ZERO, &mut min, &mut max);
        (min, max)
    }
}

fn accumulate_bounds(node: &RenderNode, offset: Vec2, min: &mut Vec2, max: &mut Vec2) {
    let center = offset + node.position;
    let half = node.scale * 0.5;
    *min = min.min(center - half);
    *max = max.max(center + half);
    for child in &node.children {
        accumulate_bounds(child, center, min, max);
    }
}

/// Hash a stable serialization of the phenotype into a generator seed.
///
/// Serialization failure falls back to a fixed placeholder so assembly
/// still yields a valid (if generic) scatter instead of failing.
fn phenotype_seed(phenotype: &Phenotype) -> u64 {
    let bytes = bincode_next::serde::encode_to_vec(phenotype, bincode_next::config::standard())
        .unwrap_or_else(|err| {
            log::warn!("phenotype serialization failed, using fallback seed: {err}");
            b"phenotype-fallback".to_vec()
        });
    ahash::RandomState::with_seeds(SEED_KEY_A, SEED_KEY_B, SEED_KEY_C, SEED_KEY_D)
        .hash_one(bytes.as_slice())
}

/// Build the full render tree for a phenotype.
///
/// Deterministic: identical phenotypes produce identical trees, scatter
/// positions included. The returned root is re-centered so the tree's
/// bounding box sits on the origin.
pub fn assemble(phenotype: &Phenotype) -> RenderNode {
    let mut rng = Xoshiro256StarStar::seed_from_u64(phenotype_seed(phenotype));

    let mut root = match phenotype.body_plan {
        BodyPlan::OvoidGeneralist => build_ovoid(phenotype),
        BodyPlan::SegmentedCrawler => build_crawler(phenotype),
        BodyPlan::ArthropodWalker => build_walker(phenotype),
        BodyPlan::Cephalopod => build_cephalopod(phenotype),
        BodyPlan::SessileReef => build_reef(phenotype, &mut rng),
    };

    attach_locomotion_addons(&mut root, phenotype);
    attach_surface_addons(&mut root, phenotype, &mut rng);
    attach_face(&mut root, phenotype);
    recenter(&mut root);
    root
}

fn body_color(phenotype: &Phenotype) -> [u8; 4] {
    let base = match phenotype.skin_type {
        SkinType::Smooth => [110, 170, 150],
        SkinType::Armored => [140, 120, 90],
        SkinType::Furred => [150, 110, 70],
        SkinType::Mucous => [100, 160, 90],
    };
    // Camouflage desaturates toward the midtone
    let camo = phenotype.surface.camouflage;
    let mix = |c: u8| (c as f32 * (1.0 - camo * 0.5) + 128.0 * camo * 0.5) as u8;
    [mix(base[0]), mix(base[1]), mix(base[2]), 255]
}

fn limb_color(phenotype: &Phenotype) -> [u8; 4] {
    let [r, g, b, _] = body_color(phenotype);
    [
        (r as f32 * 0.8) as u8,
        (g as f32 * 0.8) as u8,
        (b as f32 * 0.8) as u8,
        255,
    ]
}

fn build_ovoid(phenotype: &Phenotype) -> RenderNode {
    let scale = phenotype.axial_scale;
    let color = body_color(phenotype);
    let mut core = RenderNode::new(
        ShapeKind::Oval,
        Vec2::ZERO,
        Vec2::new(scale.x, scale.y),
        color,
    )
    .animated(AnimationTag::Breath);

    if phenotype.locomotion == Locomotion::Slither || phenotype.locomotion == Locomotion::Crawl {
        core.children.push(
            RenderNode::new(
                ShapeKind::Triangle,
                Vec2::new(-scale.x * 0.6, 0.0),
                Vec2::new(scale.x * 0.4, scale.y * 0.35),
                limb_color(phenotype),
            )
            .layered(-1)
            .animated(AnimationTag::Sway),
        );
    }

    let pairs = phenotype.total_pairs();
    if pairs > 0 {
        attach_radial_limbs(&mut core, phenotype, pairs, scale.x * 0.5);
    } else {
        // Feelers stand in for proper limbs on a limbless ovoid
        for i in 0..phenotype.whisker_count.min(4) {
            let angle = std::f32::consts::PI * (0.25 + 0.17 * i as f32);
            core.children.push(feeler(phenotype, angle, scale.y * 0.5));
        }
    }
    core
}

fn build_crawler(phenotype: &Phenotype) -> RenderNode {
    let scale = phenotype.axial_scale;
    let color = body_color(phenotype);
    let segments = phenotype.segment_count.max(3);

    // Cap the chain so total length stays bounded no matter the count
    let max_length = scale.x * 1.6;
    let step = (max_length / segments as f32).min(scale.x * 0.35);

    let mut core = RenderNode::new(
        ShapeKind::Circle,
        Vec2::ZERO,
        Vec2::splat(scale.y),
        color,
    )
    .animated(AnimationTag::Breath);

    let mut parent = &mut core;
    for i in 1..segments {
        let taper = 1.0 - i as f32 / segments as f32 * 0.6;
        let mut segment = RenderNode::new(
            ShapeKind::Circle,
            Vec2::new(-step, 0.0),
            Vec2::splat(scale.y * taper),
            color,
        )
        .animated(AnimationTag::Gait);

        if phenotype.leg_pairs > 0 && i as u32 <= phenotype.leg_pairs {
            for side in [-1.0f32, 1.0] {
                segment.children.push(leg(phenotype, side, scale.y * taper));
            }
        } else if phenotype.locomotion == Locomotion::Crawl {
            // Cilia fringe under legless segments
            segment.children.push(
                RenderNode::new(
                    ShapeKind::Rect,
                    Vec2::new(0.0, -scale.y * taper * 0.55),
                    Vec2::new(scale.y * taper * 0.8, scale.y * 0.12),
                    limb_color(phenotype),
                )
                .layered(-1)
                .animated(AnimationTag::Sway),
            );
        }

        parent.children.push(segment);
        let last = parent.children.len() - 1;
        parent = &mut parent.children[last];
    }
    core
}

fn build_walker(phenotype: &Phenotype) -> RenderNode {
    let scale = phenotype.axial_scale;
    let color = body_color(phenotype);

    // Canonical head -> thorax -> abdomen silhouette; thorax is the root so
    // legs and wings anchor to it
    let mut thorax = RenderNode::new(
        ShapeKind::Oval,
        Vec2::ZERO,
        Vec2::new(scale.x * 0.45, scale.y),
        color,
    )
    .animated(AnimationTag::Breath);

    let mut head = RenderNode::new(
        ShapeKind::Circle,
        Vec2::new(scale.x * 0.4, scale.y * 0.05),
        Vec2::splat(scale.y * 0.6),
        color,
    )
    .layered(1);
    for i in 0..phenotype.antenna_count {
        let angle = 0.5 + 0.35 * i as f32;
        head.children.push(feeler(phenotype, angle, scale.y * 0.45));
    }
    thorax.children.push(head);

    let mut abdomen = RenderNode::new(
        ShapeKind::Oval,
        Vec2::new(-scale.x * 0.42, 0.0),
        Vec2::new(scale.x * 0.5, scale.y * 0.85),
        color,
    );
    // Extra abdominal segments taper off behind
    let extra = phenotype.segment_count.saturating_sub(4);
    let mut parent = &mut abdomen;
    for i in 0..extra {
        let taper = 1.0 - (i + 1) as f32 / (extra + 1) as f32 * 0.7;
        parent.children.push(RenderNode::new(
            ShapeKind::Circle,
            Vec2::new(-scale.x * 0.3, 0.0),
            Vec2::splat(scale.y * 0.7 * taper),
            color,
        ));
        let last = parent.children.len() - 1;
        parent = &mut parent.children[last];
    }
    parent.children.push(
        RenderNode::new(
            ShapeKind::Triangle,
            Vec2::new(-scale.x * 0.25, 0.0),
            Vec2::new(scale.x * 0.3, scale.y * 0.3),
            limb_color(phenotype),
        )
        .animated(AnimationTag::Sway),
    );
    thorax.children.push(abdomen);

    for pair in 0..phenotype.leg_pairs {
        let along = if phenotype.leg_pairs > 1 {
            pair as f32 / (phenotype.leg_pairs - 1) as f32 - 0.5
        } else {
            0.0
        };
        for side in [-1.0f32, 1.0] {
            let mut node = leg(phenotype, side, scale.y);
            node.position.x = along * scale.x * 0.35;
            thorax.children.push(node);
        }
    }

    thorax
}

fn build_cephalopod(phenotype: &Phenotype) -> RenderNode {
    let scale = phenotype.axial_scale;
    let color = body_color(phenotype);
    let mut head = RenderNode::new(
        ShapeKind::Oval,
        Vec2::ZERO,
        Vec2::new(scale.x, scale.y),
        color,
    )
    .animated(AnimationTag::Breath);

    // Tentacles fan over a front-biased arc
    let tentacles = (phenotype.tentacle_pairs.max(1) * 2) as usize;
    let arc = std::f32::consts::PI * 1.2;
    for i in 0..tentacles {
        let t = if tentacles > 1 {
            i as f32 / (tentacles - 1) as f32 - 0.5
        } else {
            0.0
        };
        let angle = t * arc;
        let length = scale.y * (0.8 + phenotype.softness_hint * 0.5);
        head.children.push(
            RenderNode::new(
                ShapeKind::Path,
                Vec2::new(angle.cos() * scale.x * 0.45, angle.sin() * scale.y * 0.45),
                Vec2::new(length, scale.y * 0.12),
                limb_color(phenotype),
            )
            .rotated(angle)
            .layered(-1)
            .animated(AnimationTag::Sway),
        );
    }
    head
}

fn build_reef<R: Rng>(phenotype: &Phenotype, rng: &mut R) -> RenderNode {
    let scale = phenotype.axial_scale;
    let color = body_color(phenotype);
    let mut core = RenderNode::new(
        ShapeKind::Oval,
        Vec2::ZERO,
        Vec2::new(scale.x, scale.y),
        color,
    )
    .animated(AnimationTag::Pulse);

    // Seeded scatter: same phenotype, same polyps
    let polyps = 6 + (phenotype.surface.ornamentation * 10.0) as u32;
    for _ in 0..polyps {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let radius = rng.gen_range(0.35..0.65) * scale.x;
        let size = rng.gen_range(0.08..0.18) * scale.y;
        core.children.push(
            RenderNode::new(
                ShapeKind::Circle,
                Vec2::new(angle.cos() * radius, angle.sin() * radius * 0.8),
                Vec2::splat(size),
                limb_color(phenotype),
            )
            .layered(1)
            .animated(AnimationTag::Pulse)
            .faded(0.9),
        );
    }
    core
}

fn leg(phenotype: &Phenotype, side: f32, body_height: f32) -> RenderNode {
    let length = body_height * (0.5 + phenotype.softness_hint * 0.2);
    RenderNode::new(
        ShapeKind::Rect,
        Vec2::new(0.0, side * body_height * 0.45),
        Vec2::new(body_height * 0.12, length),
        limb_color(phenotype),
    )
    .rotated(side * 0.4)
    .layered(-1)
    .animated(AnimationTag::Gait)
}

fn feeler(phenotype: &Phenotype, angle: f32, length: f32) -> RenderNode {
    RenderNode::new(
        ShapeKind::Path,
        Vec2::new(angle.cos() * length * 0.8, angle.sin() * length * 0.8),
        Vec2::new(length, length * 0.08),
        limb_color(phenotype),
    )
    .rotated(angle)
    .layered(1)
    .animated(AnimationTag::Sway)
}

fn attach_radial_limbs(core: &mut RenderNode, phenotype: &Phenotype, pairs: u32, radius: f32) {
    let limbs = (pairs * 2) as usize;
    for i in 0..limbs {
        let angle = std::f32::consts::TAU * i as f32 / limbs as f32;
        let shape = match phenotype.limb_type {
            LimbType::Fin => ShapeKind::Triangle,
            LimbType::Tentacle => ShapeKind::Path,
            _ => ShapeKind::Rect,
        };
        core.children.push(
            RenderNode::new(
                shape,
                Vec2::new(angle.cos() * radius, angle.sin() * radius),
                Vec2::new(radius * 0.5, radius * 0.15),
                limb_color(phenotype),
            )
            .rotated(angle)
            .layered(-1)
            .animated(AnimationTag::Gait),
        );
    }
}

fn attach_locomotion_addons(root: &mut RenderNode, phenotype: &Phenotype) {
    let scale = phenotype.axial_scale;
    match phenotype.locomotion {
        Locomotion::Fly | Locomotion::Glide => {
            for pair in 0..phenotype.wing_pairs.max(1) {
                let offset = pair as f32 * scale.x * 0.12;
                for side in [-1.0f32, 1.0] {
                    root.children.push(
                        RenderNode::new(
                            ShapeKind::Oval,
                            Vec2::new(-offset, side * scale.y * 0.55),
                            Vec2::new(scale.x * 0.7, scale.y * 0.3),
                            limb_color(phenotype),
                        )
                        .rotated(side * 0.5)
                        .layered(2)
                        .animated(AnimationTag::Flap)
                        .faded(0.75),
                    );
                }
            }
        }
        Locomotion::Swim => {
            for side in [-1.0f32, 1.0] {
                root.children.push(
                    RenderNode::new(
                        ShapeKind::Triangle,
                        Vec2::new(scale.x * 0.1, side * scale.y * 0.5),
                        Vec2::new(scale.x * 0.35, scale.y * 0.25),
                        limb_color(phenotype),
                    )
                    .rotated(side * 0.6)
                    .layered(-1)
                    .animated(AnimationTag::Sway),
                );
            }
            // Tail fluke
            root.children.push(
                RenderNode::new(
                    ShapeKind::Triangle,
                    Vec2::new(-scale.x * 0.6, 0.0),
                    Vec2::new(scale.x * 0.3, scale.y * 0.5),
                    limb_color(phenotype),
                )
                .layered(-1)
                .animated(AnimationTag::Sway),
            );
        }
        _ => {}
    }
}

fn attach_surface_addons<R: Rng>(root: &mut RenderNode, phenotype: &Phenotype, rng: &mut R) {
    let scale = phenotype.axial_scale;

    if phenotype.biome == BiomeId::Tundra && phenotype.surface.fur > 0.25 {
        // Insulation ruff around the core
        root.children.push(
            RenderNode::new(
                ShapeKind::Oval,
                Vec2::ZERO,
                Vec2::new(scale.x * 1.1, scale.y * 1.1),
                [220, 215, 200, 255],
            )
            .layered(-2)
            .faded(0.4),
        );
    }

    if phenotype.biome == BiomeId::Desert && phenotype.surface.armor > 0.25 {
        let plates = 3 + (phenotype.surface.armor * 4.0) as u32;
        for i in 0..plates {
            let along = i as f32 / plates as f32 - 0.5;
            root.children.push(
                RenderNode::new(
                    ShapeKind::Rect,
                    Vec2::new(along * scale.x * 0.8, scale.y * 0.3),
                    Vec2::new(scale.x * 0.2, scale.y * 0.18),
                    [90, 80, 60, 255],
                )
                .layered(1),
            );
        }
    }

    if phenotype.surface.ornamentation > 0.3 {
        let ornaments = 2 + (phenotype.surface.ornamentation * 4.0) as u32;
        for _ in 0..ornaments {
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            root.children.push(
                RenderNode::new(
                    ShapeKind::Triangle,
                    Vec2::new(angle.cos() * scale.x * 0.45, angle.sin() * scale.y * 0.45),
                    Vec2::new(scale.y * 0.2, scale.y * 0.25),
                    [200, 140, 170, 255],
                )
                .rotated(angle)
                .layered(2)
                .faded(0.85),
            );
        }
    }
}

fn attach_face(root: &mut RenderNode, phenotype: &Phenotype) {
    let scale = phenotype.axial_scale;
    // Anchor at the front of the core; the walker builder keeps its head as
    // the first child at positive x, others use the core itself
    let anchor = Vec2::new(scale.x * 0.3, scale.y * 0.1);

    for i in 0..phenotype.eye_count {
        let pair = (i / 2) as f32;
        let side = if i % 2 == 0 { 1.0 } else { -1.0 };
        let eye_offset = match phenotype.eye_placement {
            EyePlacement::Forward => Vec2::new(scale.x * 0.08 * pair, side * scale.y * 0.12),
            EyePlacement::Lateral => Vec2::new(-scale.x * 0.1 * pair, side * scale.y * 0.3),
            EyePlacement::Stalk => Vec2::new(scale.x * 0.05 * pair, side * scale.y * 0.45),
        };
        let size = scale.y * phenotype.eye_size.max(0.03);
        let mut eye = RenderNode::new(
            ShapeKind::Circle,
            anchor + eye_offset,
            Vec2::splat(size),
            [240, 240, 240, 255],
        )
        .layered(3);
        eye.children.push(
            RenderNode::new(
                ShapeKind::Circle,
                Vec2::new(size * 0.15, 0.0),
                Vec2::splat(size * 0.5),
                [20, 20, 25, 255],
            )
            .layered(4),
        );
        root.children.push(eye);
    }

    if phenotype.eye_count > 0 {
        root.children.push(
            RenderNode::new(
                ShapeKind::Path,
                anchor + Vec2::new(scale.x * 0.05, -scale.y * 0.18),
                Vec2::new(scale.x * 0.15, scale.y * 0.04),
                [60, 40, 45, 255],
            )
            .layered(3),
        );
    }
}

/// Shift the root so the tree's bounding box is centered on the origin
fn recenter(root: &mut RenderNode) {
    let (min, max) = root.bounding_box();
    let center = (min + max) * 0.5;
    root.position -= center;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phenotype::derive;
    use biomorph_genome::{Genome, TraitKey};
    use biomorph_world::{BiomeRegistry, Environment};

    fn phenotype_for(biome: BiomeId, edits: &[(TraitKey, f32)]) -> Phenotype {
        let mut genome = Genome::genesis();
        for &(key, value) in edits {
            genome = genome.with_trait(key, value);
        }
        derive(&genome, &Environment::genesis(biome), &BiomeRegistry::default())
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let phenotype = phenotype_for(BiomeId::Reef, &[(TraitKey::LocomotionMode, 0.05)]);
        assert_eq!(assemble(&phenotype), assemble(&phenotype));
    }

    #[test]
    fn test_reef_scatter_is_reproducible() {
        let phenotype = phenotype_for(BiomeId::Reef, &[]);
        assert_eq!(phenotype.body_plan, BodyPlan::SessileReef);

        let a = assemble(&phenotype);
        let b = assemble(&phenotype);
        let scatter_a: Vec<Vec2> = a.children.iter().map(|c| c.position).collect();
        let scatter_b: Vec<Vec2> = b.children.iter().map(|c| c.position).collect();
        assert_eq!(scatter_a, scatter_b);
        assert!(a.count() > 6, "reef should scatter polyps, got {}", a.count());
    }

    #[test]
    fn test_tree_is_centered() {
        for biome in [BiomeId::Temperate, BiomeId::Ocean, BiomeId::Desert] {
            let phenotype = phenotype_for(
                biome,
                &[
                    (TraitKey::LocomotionMode, 0.6),
                    (TraitKey::Segmentation, 0.7),
                    (TraitKey::LimbCount, 0.5),
                ],
            );
            let tree = assemble(&phenotype);
            let (min, max) = tree.bounding_box();
            assert!(
                (min.x + max.x).abs() < 1e-3 && (min.y + max.y).abs() < 1e-3,
                "{biome}: bounding box not centered: {min:?} {max:?}"
            );
        }
    }

    #[test]
    fn test_walker_carries_leg_nodes() {
        let phenotype = phenotype_for(
            BiomeId::Grassland,
            &[
                (TraitKey::LocomotionMode, 0.6),
                (TraitKey::Segmentation, 0.8),
                (TraitKey::Rigidity, 0.8),
            ],
        );
        assert_eq!(phenotype.body_plan, BodyPlan::ArthropodWalker);

        let tree = assemble(&phenotype);
        let legs = tree
            .children
            .iter()
            .filter(|c| c.animation == Some(AnimationTag::Gait))
            .count();
        assert!(legs >= 6, "walker should carry >= 3 leg pairs, found {legs} leg nodes");
    }

    #[test]
    fn test_seed_differs_between_phenotypes() {
        let reef = phenotype_for(BiomeId::Reef, &[]);
        let walker = phenotype_for(
            BiomeId::Grassland,
            &[(TraitKey::LocomotionMode, 0.6), (TraitKey::Rigidity, 0.8)],
        );
        assert_ne!(phenotype_seed(&reef), phenotype_seed(&walker));
    }

    #[test]
    fn test_every_tree_has_a_core() {
        for biome in BiomeId::ALL {
            let phenotype = phenotype_for(biome, &[]);
            let tree = assemble(&phenotype);
            assert!(tree.count() >= 1);
            assert!(tree.opacity > 0.0);
        }
    }
}
