//! Genome representation
//!
//! A genome is a fixed mapping of named trait keys to normalized values.
//! Every value stays in [0, 1] after any operation; mutation always returns
//! a new genome rather than editing in place.

use serde::{Deserialize, Serialize};

/// Number of heritable traits in a genome
pub const TRAIT_COUNT: usize = 20;

/// Named heritable traits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraitKey {
    // Structural
    Symmetry,
    Segmentation,
    Rigidity,
    LocomotionMode,
    LimbCount,
    LimbLength,
    BodySize,
    // Physiological
    MetabolicRate,
    Thermoregulation,
    WaterRetention,
    RespirationType,
    FeedingStrategy,
    DigestiveEfficiency,
    // Sensory / behavioral
    LightSensitivity,
    ChemicalSensitivity,
    ProximityAwareness,
    Aggression,
    Sociality,
    ReproductionStrategy,
    // Meta
    MutationRate,
}

impl TraitKey {
    /// All traits in declaration order
    pub const ALL: [TraitKey; TRAIT_COUNT] = [
        TraitKey::Symmetry,
        TraitKey::Segmentation,
        TraitKey::Rigidity,
        TraitKey::LocomotionMode,
        TraitKey::LimbCount,
        TraitKey::LimbLength,
        TraitKey::BodySize,
        TraitKey::MetabolicRate,
        TraitKey::Thermoregulation,
        TraitKey::WaterRetention,
        TraitKey::RespirationType,
        TraitKey::FeedingStrategy,
        TraitKey::DigestiveEfficiency,
        TraitKey::LightSensitivity,
        TraitKey::ChemicalSensitivity,
        TraitKey::ProximityAwareness,
        TraitKey::Aggression,
        TraitKey::Sociality,
        TraitKey::ReproductionStrategy,
        TraitKey::MutationRate,
    ];

    /// Traits subject to the complexity ratchet: structure is easier to
    /// gain than to lose
    pub const STRUCTURAL: [TraitKey; 4] = [
        TraitKey::BodySize,
        TraitKey::Segmentation,
        TraitKey::LimbCount,
        TraitKey::LimbLength,
    ];

    /// Index into the genome's value vector
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|k| k == self).unwrap_or(0)
    }

    /// Human-readable trait name
    pub fn name(&self) -> &'static str {
        match self {
            TraitKey::Symmetry => "symmetry",
            TraitKey::Segmentation => "segmentation",
            TraitKey::Rigidity => "rigidity",
            TraitKey::LocomotionMode => "locomotion_mode",
            TraitKey::LimbCount => "limb_count",
            TraitKey::LimbLength => "limb_length",
            TraitKey::BodySize => "body_size",
            TraitKey::MetabolicRate => "metabolic_rate",
            TraitKey::Thermoregulation => "thermoregulation",
            TraitKey::WaterRetention => "water_retention",
            TraitKey::RespirationType => "respiration_type",
            TraitKey::FeedingStrategy => "feeding_strategy",
            TraitKey::DigestiveEfficiency => "digestive_efficiency",
            TraitKey::LightSensitivity => "light_sensitivity",
            TraitKey::ChemicalSensitivity => "chemical_sensitivity",
            TraitKey::ProximityAwareness => "proximity_awareness",
            TraitKey::Aggression => "aggression",
            TraitKey::Sociality => "sociality",
            TraitKey::ReproductionStrategy => "reproduction_strategy",
            TraitKey::MutationRate => "mutation_rate",
        }
    }
}

impl std::fmt::Display for TraitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Normalized heritable trait vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    values: [f32; TRAIT_COUNT],
}

impl Genome {
    /// Genesis genome: a minimal single-cell organism.
    ///
    /// Structural traits start near zero so complexity has to be earned
    /// through the mutation ratchet.
    pub fn genesis() -> Self {
        let mut genome = Self {
            values: [0.0; TRAIT_COUNT],
        };
        let seeds = [
            (TraitKey::Symmetry, 0.5),
            (TraitKey::Segmentation, 0.1),
            (TraitKey::Rigidity, 0.2),
            (TraitKey::LocomotionMode, 0.1),
            (TraitKey::LimbCount, 0.05),
            (TraitKey::LimbLength, 0.1),
            (TraitKey::BodySize, 0.08),
            (TraitKey::MetabolicRate, 0.3),
            (TraitKey::Thermoregulation, 0.3),
            (TraitKey::WaterRetention, 0.4),
            (TraitKey::RespirationType, 0.2),
            (TraitKey::FeedingStrategy, 0.2),
            (TraitKey::DigestiveEfficiency, 0.3),
            (TraitKey::LightSensitivity, 0.2),
            (TraitKey::ChemicalSensitivity, 0.3),
            (TraitKey::ProximityAwareness, 0.2),
            (TraitKey::Aggression, 0.1),
            (TraitKey::Sociality, 0.1),
            (TraitKey::ReproductionStrategy, 0.5),
            (TraitKey::MutationRate, 0.3),
        ];
        for (key, value) in seeds {
            genome.values[key.index()] = value;
        }
        genome
    }

    /// Get a trait value
    pub fn get(&self, key: TraitKey) -> f32 {
        self.values[key.index()]
    }

    /// Return a copy with one trait replaced (clamped to [0, 1])
    pub fn with_trait(&self, key: TraitKey, value: f32) -> Self {
        let mut next = self.clone();
        next.values[key.index()] = value.clamp(0.0, 1.0);
        next
    }

    /// Set a trait value, clamped to [0, 1]
    pub(crate) fn set(&mut self, key: TraitKey, value: f32) {
        self.values[key.index()] = value.clamp(0.0, 1.0);
    }

    /// Iterate over (key, value) pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (TraitKey, f32)> + '_ {
        TraitKey::ALL
            .iter()
            .map(move |&key| (key, self.values[key.index()]))
    }

    /// Check the clamp invariant (all values in [0, 1])
    pub fn is_normalized(&self) -> bool {
        self.values.iter().all(|v| (0.0..=1.0).contains(v))
    }
}

impl Default for Genome {
    fn default() -> Self {
        Self::genesis()
    }
}
