//! Phenotype derivation
//!
//! `derive` maps (genome, environment) into a fully-resolved [`Phenotype`]
//! through a fixed pipeline: categorical classification (body plan,
//! locomotion, limb type, skin type), appendage budgeting, a walker
//! consistency downgrade, archetype forcing, sensory/surface budget groups,
//! eye/antenna/whisker derivation and axial scaling. The whole pipeline is
//! RNG-free; all variation comes from the inputs.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use biomorph_genome::{Genome, TraitKey};
use biomorph_world::{BiomeId, BiomeRegistry, Environment};

use crate::budget::{apportion, normalize_group};
use crate::classify::weighted_argmax;

/// Maximum limb pairs the budget allocator distributes
const PAIR_POOL_MAX: u32 = 6;
/// Minimum leg pairs a forced walker keeps
const WALKER_MIN_LEG_PAIRS: u32 = 3;

/// Overall structural layout of the organism
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyPlan {
    OvoidGeneralist,
    SegmentedCrawler,
    ArthropodWalker,
    Cephalopod,
    SessileReef,
}

impl BodyPlan {
    pub const ALL: [BodyPlan; 5] = [
        BodyPlan::OvoidGeneralist,
        BodyPlan::SegmentedCrawler,
        BodyPlan::ArthropodWalker,
        BodyPlan::Cephalopod,
        BodyPlan::SessileReef,
    ];

    /// Stable key, also used by biome weight tables
    pub fn name(&self) -> &'static str {
        match self {
            BodyPlan::OvoidGeneralist => "ovoid_generalist",
            BodyPlan::SegmentedCrawler => "segmented_crawler",
            BodyPlan::ArthropodWalker => "arthropod_walker",
            BodyPlan::Cephalopod => "cephalopod",
            BodyPlan::SessileReef => "sessile_reef",
        }
    }
}

impl std::fmt::Display for BodyPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Primary mode of movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locomotion {
    Sessile,
    Crawl,
    Slither,
    Walk,
    Swim,
    Glide,
    Fly,
}

impl Locomotion {
    pub const ALL: [Locomotion; 7] = [
        Locomotion::Sessile,
        Locomotion::Crawl,
        Locomotion::Slither,
        Locomotion::Walk,
        Locomotion::Swim,
        Locomotion::Glide,
        Locomotion::Fly,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Locomotion::Sessile => "sessile",
            Locomotion::Crawl => "crawl",
            Locomotion::Slither => "slither",
            Locomotion::Walk => "walk",
            Locomotion::Swim => "swim",
            Locomotion::Glide => "glide",
            Locomotion::Fly => "fly",
        }
    }

    pub fn is_airborne(&self) -> bool {
        matches!(self, Locomotion::Glide | Locomotion::Fly)
    }
}

impl std::fmt::Display for Locomotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Dominant appendage kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimbType {
    None,
    Leg,
    Fin,
    Wing,
    Tentacle,
}

impl LimbType {
    pub fn name(&self) -> &'static str {
        match self {
            LimbType::None => "none",
            LimbType::Leg => "leg",
            LimbType::Fin => "fin",
            LimbType::Wing => "wing",
            LimbType::Tentacle => "tentacle",
        }
    }
}

/// Dominant integument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkinType {
    Smooth,
    Armored,
    Furred,
    Mucous,
}

impl SkinType {
    pub fn name(&self) -> &'static str {
        match self {
            SkinType::Smooth => "smooth",
            SkinType::Armored => "armored",
            SkinType::Furred => "furred",
            SkinType::Mucous => "mucous",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EyePlacement {
    Forward,
    Lateral,
    Stalk,
}

/// Jointly-normalized sensory investment; the group sums to at most 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensoryBudget {
    pub vision: f32,
    pub chemo: f32,
    pub mechano: f32,
    pub thermo: f32,
    pub electro: f32,
}

impl SensoryBudget {
    pub fn sum(&self) -> f32 {
        self.vision + self.chemo + self.mechano + self.thermo + self.electro
    }
}

/// Jointly-normalized surface investment; the group sums to at most 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceBudget {
    pub armor: f32,
    pub fur: f32,
    pub slime: f32,
    pub camouflage: f32,
    pub ornamentation: f32,
}

impl SurfaceBudget {
    pub fn sum(&self) -> f32 {
        self.armor + self.fur + self.slime + self.camouflage + self.ornamentation
    }
}

/// Fully-resolved morphological description, recomputed from scratch each
/// cycle and consumed by the assembler and the renderer boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phenotype {
    pub body_plan: BodyPlan,
    pub locomotion: Locomotion,
    pub limb_type: LimbType,
    pub skin_type: SkinType,
    pub leg_pairs: u32,
    pub fin_pairs: u32,
    pub wing_pairs: u32,
    pub tentacle_pairs: u32,
    pub segment_count: u32,
    pub eye_count: u32,
    pub eye_size: f32,
    pub eye_placement: EyePlacement,
    pub antenna_count: u32,
    pub whisker_count: u32,
    pub sensory: SensoryBudget,
    pub surface: SurfaceBudget,
    /// Length / height / depth scale factors for the core body
    pub axial_scale: Vec3,
    /// Biome the phenotype was derived under; lets the assembler apply
    /// biome-surface addons without re-threading the environment
    pub biome: BiomeId,
    /// Continuous carriers for animation parameters
    pub metabolic_hint: f32,
    pub softness_hint: f32,
    pub humidity_hint: f32,
}

impl Phenotype {
    pub fn total_pairs(&self) -> u32 {
        self.leg_pairs + self.fin_pairs + self.wing_pairs + self.tentacle_pairs
    }

    /// Per-frame uniforms for the renderer boundary
    pub fn animation_params(&self) -> AnimationParams {
        let gait_base = match self.locomotion {
            Locomotion::Sessile => 0.0,
            Locomotion::Crawl => 0.5,
            Locomotion::Slither => 0.7,
            Locomotion::Walk => 1.0,
            Locomotion::Swim => 0.8,
            Locomotion::Glide => 0.6,
            Locomotion::Fly => 1.4,
        };
        AnimationParams {
            gait_rate: gait_base * (0.6 + self.metabolic_hint * 0.8),
            breath_rate: 0.25 + self.metabolic_hint * 0.9,
            breath_amplitude: 0.02 + self.softness_hint * 0.06,
            wetness: (self.surface.slime + self.humidity_hint * 0.3).clamp(0.0, 1.0),
            roughness: (self.surface.armor * 0.7 + self.surface.fur * 0.35).clamp(0.0, 1.0),
        }
    }
}

/// Per-frame uniforms consumed by the renderer boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationParams {
    pub gait_rate: f32,
    pub breath_rate: f32,
    pub breath_amplitude: f32,
    pub wetness: f32,
    pub roughness: f32,
}

/// Derive the phenotype for a genome under the current environment.
///
/// Deterministic: calling twice with identical inputs yields identical
/// phenotypes, including every budget and scale value.
pub fn derive(genome: &Genome, environment: &Environment, registry: &BiomeRegistry) -> Phenotype {
    let profile = registry.get(environment.biome);
    let aquatic = environment.biome.is_aquatic();

    let symmetry = genome.get(TraitKey::Symmetry);
    let segmentation = genome.get(TraitKey::Segmentation);
    let rigidity = genome.get(TraitKey::Rigidity);
    let locomotion_mode = genome.get(TraitKey::LocomotionMode);
    let limb_count = genome.get(TraitKey::LimbCount);
    let limb_length = genome.get(TraitKey::LimbLength);
    let body_size = genome.get(TraitKey::BodySize);
    let water_retention = genome.get(TraitKey::WaterRetention);
    let digestive = genome.get(TraitKey::DigestiveEfficiency);
    let chemical = genome.get(TraitKey::ChemicalSensitivity);

    // Stage 1: body plan
    let plan_scores = [
        (
            BodyPlan::OvoidGeneralist,
            0.55 + body_size * 0.35 + digestive * 0.25,
        ),
        (
            BodyPlan::SegmentedCrawler,
            segmentation * 1.0 + locomotion_mode * 0.45 + (1.0 - rigidity) * 0.25,
        ),
        (
            BodyPlan::ArthropodWalker,
            segmentation * 0.6
                + rigidity * 0.7
                + locomotion_mode * 0.55
                + limb_count * 0.45
                + symmetry * 0.35,
        ),
        (
            BodyPlan::Cephalopod,
            limb_length * 0.7 + (1.0 - rigidity) * 0.45 + chemical * 0.4 + locomotion_mode * 0.3,
        ),
        (
            BodyPlan::SessileReef,
            (1.0 - locomotion_mode) * 1.1 + water_retention * 0.25 + (1.0 - limb_count) * 0.3,
        ),
    ];
    let mut body_plan = weighted_argmax(&plan_scores, |plan| profile.plan_weight(plan.name()))
        .unwrap_or(BodyPlan::OvoidGeneralist);

    // Stage 2: locomotion, seeded by the chosen plan
    let plan_bonus = |wanted: BodyPlan, bonus: f32| if body_plan == wanted { bonus } else { 0.0 };
    let locomotion_scores = [
        (
            Locomotion::Sessile,
            (1.0 - locomotion_mode) * 0.9 + plan_bonus(BodyPlan::SessileReef, 0.8),
        ),
        (
            Locomotion::Crawl,
            segmentation * 0.5
                + (1.0 - rigidity) * 0.3
                + plan_bonus(BodyPlan::SegmentedCrawler, 0.4),
        ),
        (
            Locomotion::Slither,
            segmentation * 0.45 + (1.0 - limb_count) * 0.35 + (1.0 - rigidity) * 0.2,
        ),
        (
            Locomotion::Walk,
            locomotion_mode * 0.8
                + limb_count * 0.4
                + rigidity * 0.3
                + plan_bonus(BodyPlan::ArthropodWalker, 0.5),
        ),
        (
            Locomotion::Swim,
            water_retention * 0.5 + locomotion_mode * 0.3 + plan_bonus(BodyPlan::Cephalopod, 0.35),
        ),
        (
            Locomotion::Glide,
            locomotion_mode * 0.35 + limb_length * 0.35 + (1.0 - body_size) * 0.25,
        ),
        (
            Locomotion::Fly,
            locomotion_mode * 0.4 + limb_length * 0.3 + (1.0 - body_size) * 0.25,
        ),
    ];
    let mut locomotion = weighted_argmax(&locomotion_scores, |l| {
        profile.locomotion_weight(l.name())
    })
    .unwrap_or(Locomotion::Crawl);

    // Stage 3: limb type, seeded by plan and locomotion
    let loco_bonus = |wanted: Locomotion, bonus: f32| if locomotion == wanted { bonus } else { 0.0 };
    let limb_scores = [
        (
            LimbType::None,
            (1.0 - limb_count) * 0.55
                + (1.0 - locomotion_mode) * 0.25
                + loco_bonus(Locomotion::Sessile, 0.5),
        ),
        (
            LimbType::Leg,
            limb_count * 0.7
                + rigidity * 0.4
                + loco_bonus(Locomotion::Walk, 0.6)
                + plan_bonus(BodyPlan::ArthropodWalker, 0.3),
        ),
        (
            LimbType::Fin,
            water_retention * 0.45 + locomotion_mode * 0.2 + loco_bonus(Locomotion::Swim, 0.7),
        ),
        (
            LimbType::Wing,
            limb_length * 0.4
                + (1.0 - body_size) * 0.25
                + if locomotion.is_airborne() { 0.8 } else { 0.0 },
        ),
        (
            LimbType::Tentacle,
            limb_length * 0.5 + (1.0 - rigidity) * 0.4 + plan_bonus(BodyPlan::Cephalopod, 0.6),
        ),
    ];
    let mut limb_type = weighted_argmax(&limb_scores, |_| 1.0).unwrap_or(LimbType::None);

    // Stage 4: skin type from integument traits and weather
    let thermoregulation = genome.get(TraitKey::Thermoregulation);
    let arid = environment.temperature > 0.4 && environment.humidity < 0.35;
    let skin_scores = [
        (SkinType::Smooth, 0.45 + (1.0 - rigidity) * 0.25),
        (
            SkinType::Armored,
            rigidity * 0.75 + body_size * 0.25 + if arid { 0.2 } else { 0.0 },
        ),
        (
            SkinType::Furred,
            thermoregulation * 0.7 + (-environment.temperature).max(0.0) * 0.5,
        ),
        (
            SkinType::Mucous,
            water_retention * 0.5
                + environment.humidity * 0.35
                + if aquatic { 0.3 } else { 0.0 },
        ),
    ];
    let skin_type = weighted_argmax(&skin_scores, |_| 1.0).unwrap_or(SkinType::Smooth);

    // Stage 5: appendage budgeting. Shares for categories the locomotion
    // cannot use are zeroed before apportionment so the pair total is
    // conserved exactly.
    let pool = ((limb_count * 0.55 + locomotion_mode * 0.25 + segmentation * 0.2)
        * PAIR_POOL_MAX as f32)
        .round()
        .clamp(0.0, PAIR_POOL_MAX as f32) as u32;

    let type_boost = |wanted: LimbType| if limb_type == wanted { 0.75 } else { 0.0 };
    let mut shares = [
        limb_count * 0.5
            + rigidity * 0.35
            + loco_bonus(Locomotion::Walk, 0.3)
            + loco_bonus(Locomotion::Crawl, 0.3)
            + type_boost(LimbType::Leg),
        water_retention * 0.4 + loco_bonus(Locomotion::Swim, 0.5) + type_boost(LimbType::Fin),
        limb_length * 0.35
            + if locomotion.is_airborne() { 0.6 } else { 0.0 }
            + type_boost(LimbType::Wing),
        limb_length * 0.5
            + (1.0 - rigidity) * 0.3
            + plan_bonus(BodyPlan::Cephalopod, 0.4)
            + type_boost(LimbType::Tentacle),
    ];
    if !locomotion.is_airborne() {
        shares[2] = 0.0;
    }
    if locomotion != Locomotion::Swim && !aquatic {
        shares[1] = 0.0;
    }
    let counts = apportion(&shares, pool);
    let (mut leg_pairs, mut fin_pairs, mut wing_pairs, mut tentacle_pairs) =
        (counts[0], counts[1], counts[2], counts[3]);

    // Stage 6: walker consistency downgrade
    if body_plan == BodyPlan::ArthropodWalker && leg_pairs < WALKER_MIN_LEG_PAIRS {
        body_plan = if segmentation > 0.45 {
            BodyPlan::SegmentedCrawler
        } else {
            BodyPlan::OvoidGeneralist
        };
        log::debug!("walker downgraded to {body_plan}: only {leg_pairs} leg pairs budgeted");
    }

    // Stage 7: archetype forcing. Runs last so recognizable silhouettes win
    // over both soft scoring and the downgrade pass.
    match locomotion {
        Locomotion::Walk => {
            body_plan = BodyPlan::ArthropodWalker;
            limb_type = LimbType::Leg;
            leg_pairs = leg_pairs.max(WALKER_MIN_LEG_PAIRS);
            fin_pairs = 0;
            wing_pairs = 0;
            tentacle_pairs = 0;
        }
        Locomotion::Swim => {
            if body_plan == BodyPlan::Cephalopod {
                limb_type = LimbType::Tentacle;
                tentacle_pairs = tentacle_pairs.max(3);
                leg_pairs = 0;
            } else {
                limb_type = LimbType::Fin;
                fin_pairs = fin_pairs.max(2);
            }
            wing_pairs = 0;
        }
        Locomotion::Glide | Locomotion::Fly => {
            limb_type = LimbType::Wing;
            wing_pairs = wing_pairs.max(1);
            tentacle_pairs = 0;
        }
        Locomotion::Sessile => {
            body_plan = BodyPlan::SessileReef;
            leg_pairs = 0;
            fin_pairs = 0;
            wing_pairs = 0;
            limb_type = if tentacle_pairs > 0 {
                LimbType::Tentacle
            } else {
                LimbType::None
            };
        }
        Locomotion::Crawl | Locomotion::Slither => {}
    }
    // Sessile reef classified through scoring keeps limbs consistent too
    if body_plan == BodyPlan::SessileReef && locomotion != Locomotion::Sessile {
        locomotion = Locomotion::Sessile;
        leg_pairs = 0;
        fin_pairs = 0;
        wing_pairs = 0;
    }

    // Stage 8: sensory and surface budget groups
    let light = genome.get(TraitKey::LightSensitivity);
    let proximity = genome.get(TraitKey::ProximityAwareness);
    let mut sensory_raw = [
        light * 0.65 + environment.sunlight * 0.2,
        chemical * 0.6 + if aquatic { 0.2 } else { 0.0 },
        proximity * 0.55 + environment.wind * 0.15,
        thermoregulation * 0.35 + environment.temperature.abs() * 0.25,
        if aquatic {
            water_retention * 0.3 + chemical * 0.15
        } else {
            0.04
        },
    ];
    normalize_group(&mut sensory_raw);
    let sensory = SensoryBudget {
        vision: sensory_raw[0],
        chemo: sensory_raw[1],
        mechano: sensory_raw[2],
        thermo: sensory_raw[3],
        electro: sensory_raw[4],
    };

    let aggression = genome.get(TraitKey::Aggression);
    let sociality = genome.get(TraitKey::Sociality);
    let reproduction = genome.get(TraitKey::ReproductionStrategy);
    let mut surface_raw = [
        rigidity * 0.7 + if environment.biome == BiomeId::Desert { 0.15 } else { 0.0 },
        thermoregulation * 0.55
            + (-environment.temperature).max(0.0) * 0.4
            + if environment.biome == BiomeId::Tundra { 0.15 } else { 0.0 },
        water_retention * 0.45
            + environment.humidity * 0.3
            + if environment.biome == BiomeId::Swamp { 0.2 } else { 0.0 },
        (1.0 - aggression) * 0.25 + proximity * 0.25,
        sociality * 0.45 + reproduction * 0.3,
    ];
    normalize_group(&mut surface_raw);
    let surface = SurfaceBudget {
        armor: surface_raw[0],
        fur: surface_raw[1],
        slime: surface_raw[2],
        camouflage: surface_raw[3],
        ornamentation: surface_raw[4],
    };

    // Stage 9: eyes, antennae, whiskers
    let eye_count = if sensory.vision < 0.08 {
        0
    } else if sensory.vision < 0.35 {
        2
    } else if sensory.vision < 0.55 {
        4
    } else {
        6
    };
    let eye_size = 0.04 + sensory.vision * 0.18;
    let eye_placement = if locomotion == Locomotion::Sessile {
        EyePlacement::Stalk
    } else if body_plan == BodyPlan::Cephalopod {
        EyePlacement::Forward
    } else if aquatic {
        // Underwater the wide lateral field wins regardless of vision
        EyePlacement::Lateral
    } else if sensory.vision > 0.45
        && matches!(locomotion, Locomotion::Walk | Locomotion::Glide | Locomotion::Fly)
    {
        EyePlacement::Forward
    } else {
        EyePlacement::Lateral
    };
    let antenna_count = ((sensory.chemo * 5.0).round() as u32).min(4);
    let whisker_count = ((sensory.mechano * 6.0).round() as u32).min(6);

    // Stage 10: axial scale
    let base = 0.4 + body_size.powf(1.2) * 1.2;
    let (mx, my, mz) = match body_plan {
        BodyPlan::OvoidGeneralist => (1.0, 0.9, 0.9),
        BodyPlan::SegmentedCrawler => (1.7, 0.55, 0.55),
        BodyPlan::ArthropodWalker => (1.35, 0.7, 0.75),
        BodyPlan::Cephalopod => (0.9, 1.1, 0.95),
        BodyPlan::SessileReef => (1.0, 1.15, 1.0),
    };
    let streamline = (water_retention * 0.4
        + locomotion_mode * 0.3
        + if locomotion == Locomotion::Swim { 0.3 } else { 0.0 })
    .clamp(0.0, 1.0);
    let aspect_x = 1.0 + streamline * 0.6;
    let aspect_y = 1.0 - streamline * 0.3;
    let axial_scale = Vec3::new(
        base * mx * aspect_x * profile.scale_bias,
        base * my * aspect_y * profile.scale_bias,
        base * mz * profile.scale_bias,
    );

    let segment_count = 2 + (segmentation * 6.0).round() as u32;

    Phenotype {
        body_plan,
        locomotion,
        limb_type,
        skin_type,
        leg_pairs,
        fin_pairs,
        wing_pairs,
        tentacle_pairs,
        segment_count,
        eye_count,
        eye_size,
        eye_placement,
        antenna_count,
        whisker_count,
        sensory,
        surface,
        axial_scale,
        biome: environment.biome,
        metabolic_hint: genome.get(TraitKey::MetabolicRate),
        softness_hint: 1.0 - rigidity,
        humidity_hint: environment.humidity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biomorph_world::Environment;

    fn setup(biome: BiomeId) -> (Environment, BiomeRegistry) {
        (Environment::genesis(biome), BiomeRegistry::default())
    }

    #[test]
    fn test_derive_is_deterministic() {
        let (env, registry) = setup(BiomeId::Rainforest);
        let genome = Genome::genesis()
            .with_trait(TraitKey::LocomotionMode, 0.7)
            .with_trait(TraitKey::LimbCount, 0.6);

        let a = derive(&genome, &env, &registry);
        let b = derive(&genome, &env, &registry);
        assert_eq!(a, b);
    }

    #[test]
    fn test_genesis_genome_snaps_to_sessile_reef() {
        let (env, registry) = setup(BiomeId::Temperate);
        let genome = Genome::genesis().with_trait(TraitKey::LocomotionMode, 0.1);

        let phenotype = derive(&genome, &env, &registry);
        assert_eq!(phenotype.body_plan, BodyPlan::SessileReef);
        assert_eq!(phenotype.locomotion, Locomotion::Sessile);
        assert_eq!(phenotype.leg_pairs, 0);
    }

    #[test]
    fn test_mobile_segmented_genome_becomes_walker() {
        let (env, registry) = setup(BiomeId::Temperate);
        let genome = Genome::genesis()
            .with_trait(TraitKey::LocomotionMode, 0.6)
            .with_trait(TraitKey::Segmentation, 0.8)
            .with_trait(TraitKey::Rigidity, 0.8);

        let phenotype = derive(&genome, &env, &registry);
        assert_eq!(phenotype.body_plan, BodyPlan::ArthropodWalker);
        assert!(phenotype.leg_pairs >= 3, "walker with {} leg pairs", phenotype.leg_pairs);
        assert_eq!(phenotype.limb_type, LimbType::Leg);
        assert_eq!(phenotype.fin_pairs + phenotype.wing_pairs + phenotype.tentacle_pairs, 0);
    }

    #[test]
    fn test_budget_groups_stay_normalized() {
        let (env, registry) = setup(BiomeId::Reef);

        // Push every contributing trait high so the raw sums exceed 1
        let mut genome = Genome::genesis();
        for key in TraitKey::ALL {
            genome = genome.with_trait(key, 0.95);
        }

        let phenotype = derive(&genome, &env, &registry);
        assert!(phenotype.sensory.sum() <= 1.0 + 1e-4);
        assert!(phenotype.surface.sum() <= 1.0 + 1e-4);
    }

    #[test]
    fn test_pair_budget_bounded() {
        let (env, registry) = setup(BiomeId::Grassland);
        for limbs in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let genome = Genome::genesis()
                .with_trait(TraitKey::LimbCount, limbs)
                .with_trait(TraitKey::LocomotionMode, 0.5);
            let phenotype = derive(&genome, &env, &registry);
            // Forcing may raise the chosen category but never past its floor
            assert!(phenotype.total_pairs() <= PAIR_POOL_MAX + WALKER_MIN_LEG_PAIRS);
        }
    }

    #[test]
    fn test_aquatic_biome_prefers_swimmers() {
        let (env, registry) = setup(BiomeId::Ocean);
        let genome = Genome::genesis()
            .with_trait(TraitKey::LocomotionMode, 0.6)
            .with_trait(TraitKey::WaterRetention, 0.9);

        let phenotype = derive(&genome, &env, &registry);
        assert_eq!(phenotype.locomotion, Locomotion::Swim);
        assert!(phenotype.fin_pairs >= 2 || phenotype.tentacle_pairs >= 3);
    }

    #[test]
    fn test_streamlining_elongates_swimmers() {
        let (ocean, registry) = setup(BiomeId::Ocean);
        let swimmer = Genome::genesis()
            .with_trait(TraitKey::LocomotionMode, 0.6)
            .with_trait(TraitKey::WaterRetention, 0.9)
            .with_trait(TraitKey::BodySize, 0.5);

        let phenotype = derive(&swimmer, &ocean, &registry);
        assert!(
            phenotype.axial_scale.x > phenotype.axial_scale.y,
            "swimmer should be longer than tall: {:?}",
            phenotype.axial_scale
        );
    }

    #[test]
    fn test_eye_placement_tracks_aquatic_biome() {
        let registry = BiomeRegistry::default();
        // Sharp-eyed walker; classifies as a walker on land and at sea, so
        // any placement difference comes from the aquatic flag alone
        let genome = Genome::genesis()
            .with_trait(TraitKey::LocomotionMode, 0.7)
            .with_trait(TraitKey::LimbCount, 0.8)
            .with_trait(TraitKey::Rigidity, 0.8)
            .with_trait(TraitKey::Segmentation, 0.7)
            .with_trait(TraitKey::LightSensitivity, 1.0);

        let land = derive(&genome, &Environment::genesis(BiomeId::Grassland), &registry);
        let sea = derive(&genome, &Environment::genesis(BiomeId::Ocean), &registry);

        assert_eq!(land.locomotion, Locomotion::Walk);
        assert_eq!(sea.locomotion, Locomotion::Walk);
        assert_eq!(land.eye_placement, EyePlacement::Forward);
        assert_eq!(sea.eye_placement, EyePlacement::Lateral);
    }

    #[test]
    fn test_rigid_desert_genome_armors_up() {
        let (desert, registry) = setup(BiomeId::Desert);
        let genome = Genome::genesis()
            .with_trait(TraitKey::Rigidity, 0.9)
            .with_trait(TraitKey::BodySize, 0.6);

        let phenotype = derive(&genome, &desert, &registry);
        assert_eq!(phenotype.skin_type, SkinType::Armored);
    }

    #[test]
    fn test_water_retaining_ocean_genome_goes_mucous() {
        let (ocean, registry) = setup(BiomeId::Ocean);
        let genome = Genome::genesis().with_trait(TraitKey::WaterRetention, 0.9);

        let phenotype = derive(&genome, &ocean, &registry);
        assert_eq!(phenotype.skin_type, SkinType::Mucous);
    }

    #[test]
    fn test_cold_biome_grows_fur() {
        let (tundra, registry) = setup(BiomeId::Tundra);
        let genome = Genome::genesis().with_trait(TraitKey::Thermoregulation, 0.9);

        let phenotype = derive(&genome, &tundra, &registry);
        assert!(phenotype.surface.fur > phenotype.surface.slime);
    }

    #[test]
    fn test_animation_params_bounded() {
        let (env, registry) = setup(BiomeId::Swamp);
        let genome = Genome::genesis().with_trait(TraitKey::MetabolicRate, 1.0);

        let params = derive(&genome, &env, &registry).animation_params();
        assert!(params.gait_rate >= 0.0);
        assert!((0.0..=1.0).contains(&params.wetness));
        assert!((0.0..=1.0).contains(&params.roughness));
        assert!(params.breath_rate > 0.0);
    }
}
