//! Biome profiles and registry
//!
//! One canonical profile schema for every biome, validated once at load.
//! Missing optional data defaults to neutral values so lookups never fail;
//! unknown biomes fall back to Temperate.

use ahash::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use biomorph_genome::TraitKey;

/// Categorical environmental contexts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiomeId {
    Temperate,
    Grassland,
    Desert,
    Tundra,
    Rainforest,
    Swamp,
    Ocean,
    Reef,
}

impl BiomeId {
    /// All biomes in declaration order
    pub const ALL: [BiomeId; 8] = [
        BiomeId::Temperate,
        BiomeId::Grassland,
        BiomeId::Desert,
        BiomeId::Tundra,
        BiomeId::Rainforest,
        BiomeId::Swamp,
        BiomeId::Ocean,
        BiomeId::Reef,
    ];

    /// Human-readable biome name
    pub fn name(&self) -> &'static str {
        match self {
            BiomeId::Temperate => "Temperate",
            BiomeId::Grassland => "Grassland",
            BiomeId::Desert => "Desert",
            BiomeId::Tundra => "Tundra",
            BiomeId::Rainforest => "Rainforest",
            BiomeId::Swamp => "Swamp",
            BiomeId::Ocean => "Ocean",
            BiomeId::Reef => "Reef",
        }
    }

    /// Whether organisms here live underwater
    pub fn is_aquatic(&self) -> bool {
        matches!(self, BiomeId::Ocean | BiomeId::Reef)
    }
}

impl std::fmt::Display for BiomeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for BiomeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "temperate" => Ok(BiomeId::Temperate),
            "grassland" => Ok(BiomeId::Grassland),
            "desert" => Ok(BiomeId::Desert),
            "tundra" => Ok(BiomeId::Tundra),
            "rainforest" | "jungle" => Ok(BiomeId::Rainforest),
            "swamp" => Ok(BiomeId::Swamp),
            "ocean" => Ok(BiomeId::Ocean),
            "reef" => Ok(BiomeId::Reef),
            _ => Err(format!(
                "unknown biome: {s}. Valid: temperate, grassland, desert, tundra, rainforest, swamp, ocean, reef"
            )),
        }
    }
}

/// A trait the biome selects for
#[derive(Debug, Clone)]
pub struct TraitTarget {
    pub key: TraitKey,
    /// Preferred value in [0, 1]
    pub target: f32,
    /// Deviation that counts as one full unit of mismatch
    pub tolerance: f32,
    /// Penalty weight
    pub strength: f32,
}

/// Weather preference the biome blends into the environment
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentBias {
    pub temperature: f32,
    pub humidity: f32,
    pub wind: f32,
    pub sunlight: f32,
}

impl Default for EnvironmentBias {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            humidity: 0.5,
            wind: 0.35,
            sunlight: 0.6,
        }
    }
}

/// One requirement of a categorical gate
#[derive(Debug, Clone, Copy)]
pub struct GateRequirement {
    pub key: TraitKey,
    pub min: Option<f32>,
    pub max: Option<f32>,
}

impl GateRequirement {
    pub fn above(key: TraitKey, min: f32) -> Self {
        Self {
            key,
            min: Some(min),
            max: None,
        }
    }

    pub fn below(key: TraitKey, max: f32) -> Self {
        Self {
            key,
            min: None,
            max: Some(max),
        }
    }
}

/// Named categorical bonus scoped to one biome
#[derive(Debug, Clone)]
pub struct Gate {
    pub name: &'static str,
    pub biome: BiomeId,
    pub requirements: Vec<GateRequirement>,
    pub bonus: f32,
}

/// Canonical biome profile
#[derive(Debug, Clone)]
pub struct BiomeProfile {
    pub id: BiomeId,
    /// Per-trait selection targets
    pub trait_targets: Vec<TraitTarget>,
    /// Directional mutation nudges, each in [-1, 1]
    pub trait_bias: Vec<(TraitKey, f32)>,
    pub env_bias: EnvironmentBias,
    /// Baseline foraging success in [0, 1]
    pub food_availability: f32,
    /// Overall body-size multiplier for organisms here
    pub scale_bias: f32,
    /// Multipliers applied to body-plan classification scores, keyed by
    /// plan name; missing entries default to 1.0
    pub plan_weights: HashMap<&'static str, f32>,
    /// Multipliers applied to locomotion classification scores
    pub locomotion_weights: HashMap<&'static str, f32>,
    /// Drift destinations; empty means any biome is reachable
    pub neighbors: Vec<BiomeId>,
}

impl BiomeProfile {
    /// Neutral profile: no selection pressure, default weather
    fn neutral(id: BiomeId) -> Self {
        Self {
            id,
            trait_targets: Vec::new(),
            trait_bias: Vec::new(),
            env_bias: EnvironmentBias::default(),
            food_availability: 0.55,
            scale_bias: 1.0,
            plan_weights: HashMap::default(),
            locomotion_weights: HashMap::default(),
            neighbors: Vec::new(),
        }
    }

    /// Body-plan score multiplier (1.0 when unspecified)
    pub fn plan_weight(&self, plan: &str) -> f32 {
        self.plan_weights.get(plan).copied().unwrap_or(1.0)
    }

    /// Locomotion score multiplier (1.0 when unspecified)
    pub fn locomotion_weight(&self, locomotion: &str) -> f32 {
        self.locomotion_weights.get(locomotion).copied().unwrap_or(1.0)
    }

    fn temperate() -> Self {
        Self {
            trait_targets: vec![
                TraitTarget {
                    key: TraitKey::Thermoregulation,
                    target: 0.5,
                    tolerance: 0.45,
                    strength: 0.25,
                },
                TraitTarget {
                    key: TraitKey::DigestiveEfficiency,
                    target: 0.55,
                    tolerance: 0.5,
                    strength: 0.2,
                },
            ],
            trait_bias: vec![(TraitKey::DigestiveEfficiency, 0.2)],
            food_availability: 0.55,
            neighbors: vec![BiomeId::Grassland, BiomeId::Rainforest, BiomeId::Swamp],
            ..Self::neutral(BiomeId::Temperate)
        }
    }

    fn grassland() -> Self {
        Self {
            trait_targets: vec![
                TraitTarget {
                    key: TraitKey::LocomotionMode,
                    target: 0.6,
                    tolerance: 0.45,
                    strength: 0.3,
                },
                TraitTarget {
                    key: TraitKey::DigestiveEfficiency,
                    target: 0.65,
                    tolerance: 0.4,
                    strength: 0.3,
                },
            ],
            trait_bias: vec![
                (TraitKey::LocomotionMode, 0.3),
                (TraitKey::LimbCount, 0.2),
            ],
            env_bias: EnvironmentBias {
                temperature: 0.2,
                humidity: 0.4,
                wind: 0.5,
                sunlight: 0.75,
            },
            food_availability: 0.6,
            plan_weights: [("arthropod_walker", 1.15), ("sessile_reef", 0.7)]
                .into_iter()
                .collect(),
            locomotion_weights: [("walk", 1.2), ("swim", 0.6)].into_iter().collect(),
            neighbors: vec![BiomeId::Temperate, BiomeId::Desert],
            ..Self::neutral(BiomeId::Grassland)
        }
    }

    fn desert() -> Self {
        Self {
            trait_targets: vec![
                TraitTarget {
                    key: TraitKey::WaterRetention,
                    target: 0.8,
                    tolerance: 0.3,
                    strength: 0.6,
                },
                TraitTarget {
                    key: TraitKey::Thermoregulation,
                    target: 0.7,
                    tolerance: 0.35,
                    strength: 0.5,
                },
                TraitTarget {
                    key: TraitKey::MetabolicRate,
                    target: 0.3,
                    tolerance: 0.4,
                    strength: 0.3,
                },
            ],
            trait_bias: vec![
                (TraitKey::WaterRetention, 0.4),
                (TraitKey::Rigidity, 0.25),
            ],
            env_bias: EnvironmentBias {
                temperature: 0.75,
                humidity: 0.1,
                wind: 0.45,
                sunlight: 0.95,
            },
            food_availability: 0.3,
            scale_bias: 0.85,
            plan_weights: [("arthropod_walker", 1.25), ("cephalopod", 0.5)]
                .into_iter()
                .collect(),
            locomotion_weights: [("walk", 1.15), ("swim", 0.3)].into_iter().collect(),
            neighbors: vec![BiomeId::Grassland],
            ..Self::neutral(BiomeId::Desert)
        }
    }

    fn tundra() -> Self {
        Self {
            trait_targets: vec![
                TraitTarget {
                    key: TraitKey::Thermoregulation,
                    target: 0.8,
                    tolerance: 0.3,
                    strength: 0.6,
                },
                TraitTarget {
                    key: TraitKey::MetabolicRate,
                    target: 0.6,
                    tolerance: 0.4,
                    strength: 0.3,
                },
                TraitTarget {
                    key: TraitKey::BodySize,
                    target: 0.6,
                    tolerance: 0.5,
                    strength: 0.25,
                },
            ],
            trait_bias: vec![
                (TraitKey::Thermoregulation, 0.4),
                (TraitKey::BodySize, 0.2),
            ],
            env_bias: EnvironmentBias {
                temperature: -0.8,
                humidity: 0.35,
                wind: 0.6,
                sunlight: 0.4,
            },
            food_availability: 0.35,
            scale_bias: 1.15,
            plan_weights: [("sessile_reef", 0.6)].into_iter().collect(),
            locomotion_weights: [("fly", 0.7), ("swim", 0.5)].into_iter().collect(),
            neighbors: vec![BiomeId::Temperate, BiomeId::Ocean],
            ..Self::neutral(BiomeId::Tundra)
        }
    }

    fn rainforest() -> Self {
        Self {
            trait_targets: vec![
                TraitTarget {
                    key: TraitKey::LimbLength,
                    target: 0.6,
                    tolerance: 0.45,
                    strength: 0.35,
                },
                TraitTarget {
                    key: TraitKey::ProximityAwareness,
                    target: 0.6,
                    tolerance: 0.45,
                    strength: 0.3,
                },
            ],
            trait_bias: vec![
                (TraitKey::LimbLength, 0.3),
                (TraitKey::ChemicalSensitivity, 0.2),
            ],
            env_bias: EnvironmentBias {
                temperature: 0.45,
                humidity: 0.9,
                wind: 0.2,
                sunlight: 0.5,
            },
            food_availability: 0.75,
            plan_weights: [("cephalopod", 1.1)].into_iter().collect(),
            locomotion_weights: [("glide", 1.25), ("fly", 1.15)].into_iter().collect(),
            neighbors: vec![BiomeId::Temperate, BiomeId::Swamp],
            ..Self::neutral(BiomeId::Rainforest)
        }
    }

    fn swamp() -> Self {
        Self {
            trait_targets: vec![
                TraitTarget {
                    key: TraitKey::WaterRetention,
                    target: 0.7,
                    tolerance: 0.4,
                    strength: 0.4,
                },
                TraitTarget {
                    key: TraitKey::RespirationType,
                    target: 0.4,
                    tolerance: 0.5,
                    strength: 0.25,
                },
            ],
            trait_bias: vec![(TraitKey::WaterRetention, 0.3)],
            env_bias: EnvironmentBias {
                temperature: 0.3,
                humidity: 0.85,
                wind: 0.15,
                sunlight: 0.45,
            },
            food_availability: 0.6,
            plan_weights: [("segmented_crawler", 1.2)].into_iter().collect(),
            locomotion_weights: [("slither", 1.25), ("crawl", 1.15)]
                .into_iter()
                .collect(),
            neighbors: vec![BiomeId::Temperate, BiomeId::Rainforest, BiomeId::Ocean],
            ..Self::neutral(BiomeId::Swamp)
        }
    }

    fn ocean() -> Self {
        Self {
            trait_targets: vec![
                TraitTarget {
                    key: TraitKey::WaterRetention,
                    target: 0.9,
                    tolerance: 0.35,
                    strength: 0.5,
                },
                TraitTarget {
                    key: TraitKey::Rigidity,
                    target: 0.3,
                    tolerance: 0.45,
                    strength: 0.3,
                },
            ],
            trait_bias: vec![
                (TraitKey::WaterRetention, 0.4),
                (TraitKey::LimbLength, 0.2),
            ],
            env_bias: EnvironmentBias {
                temperature: -0.1,
                humidity: 1.0,
                wind: 0.55,
                sunlight: 0.5,
            },
            food_availability: 0.65,
            scale_bias: 1.2,
            plan_weights: [("cephalopod", 1.35), ("arthropod_walker", 0.7)]
                .into_iter()
                .collect(),
            locomotion_weights: [("swim", 1.5), ("walk", 0.5), ("fly", 0.4)]
                .into_iter()
                .collect(),
            neighbors: vec![BiomeId::Reef, BiomeId::Tundra, BiomeId::Swamp],
            ..Self::neutral(BiomeId::Ocean)
        }
    }

    fn reef() -> Self {
        Self {
            trait_targets: vec![
                TraitTarget {
                    key: TraitKey::WaterRetention,
                    target: 0.85,
                    tolerance: 0.35,
                    strength: 0.45,
                },
                TraitTarget {
                    key: TraitKey::LightSensitivity,
                    target: 0.5,
                    tolerance: 0.5,
                    strength: 0.2,
                },
            ],
            trait_bias: vec![
                (TraitKey::WaterRetention, 0.3),
                (TraitKey::ReproductionStrategy, 0.2),
            ],
            env_bias: EnvironmentBias {
                temperature: 0.25,
                humidity: 1.0,
                wind: 0.3,
                sunlight: 0.7,
            },
            food_availability: 0.7,
            scale_bias: 0.9,
            plan_weights: [("sessile_reef", 1.35), ("cephalopod", 1.25)]
                .into_iter()
                .collect(),
            locomotion_weights: [("swim", 1.35), ("sessile", 1.3), ("walk", 0.5)]
                .into_iter()
                .collect(),
            neighbors: vec![BiomeId::Ocean],
            ..Self::neutral(BiomeId::Reef)
        }
    }
}

/// Validation failure for the biome tables
#[derive(Debug, Error)]
pub enum BiomeSchemaError {
    #[error("biome {biome}: trait {key} has non-positive tolerance {tolerance}")]
    BadTolerance {
        biome: BiomeId,
        key: TraitKey,
        tolerance: f32,
    },
    #[error("biome {biome}: trait {key} has negative strength {strength}")]
    BadStrength {
        biome: BiomeId,
        key: TraitKey,
        strength: f32,
    },
    #[error("biome {biome}: trait bias for {key} outside [-1, 1]: {bias}")]
    BadBias {
        biome: BiomeId,
        key: TraitKey,
        bias: f32,
    },
    #[error("biome {biome}: food availability outside [0, 1]: {food}")]
    BadFood { biome: BiomeId, food: f32 },
    #[error("gate {gate}: bonus must be non-negative, got {bonus}")]
    BadGateBonus { gate: &'static str, bonus: f32 },
}

/// Registry of all biome profiles and gates
pub struct BiomeRegistry {
    profiles: HashMap<BiomeId, BiomeProfile>,
    gates: Vec<Gate>,
}

impl BiomeRegistry {
    /// Build and validate the built-in tables
    pub fn new() -> Result<Self, BiomeSchemaError> {
        let mut profiles = HashMap::default();
        for profile in [
            BiomeProfile::temperate(),
            BiomeProfile::grassland(),
            BiomeProfile::desert(),
            BiomeProfile::tundra(),
            BiomeProfile::rainforest(),
            BiomeProfile::swamp(),
            BiomeProfile::ocean(),
            BiomeProfile::reef(),
        ] {
            profiles.insert(profile.id, profile);
        }

        let registry = Self {
            profiles,
            gates: builtin_gates(),
        };
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> Result<(), BiomeSchemaError> {
        for profile in self.profiles.values() {
            for target in &profile.trait_targets {
                if target.tolerance <= 0.0 {
                    return Err(BiomeSchemaError::BadTolerance {
                        biome: profile.id,
                        key: target.key,
                        tolerance: target.tolerance,
                    });
                }
                if target.strength < 0.0 {
                    return Err(BiomeSchemaError::BadStrength {
                        biome: profile.id,
                        key: target.key,
                        strength: target.strength,
                    });
                }
            }
            for &(key, bias) in &profile.trait_bias {
                if !(-1.0..=1.0).contains(&bias) {
                    return Err(BiomeSchemaError::BadBias {
                        biome: profile.id,
                        key,
                        bias,
                    });
                }
            }
            if !(0.0..=1.0).contains(&profile.food_availability) {
                return Err(BiomeSchemaError::BadFood {
                    biome: profile.id,
                    food: profile.food_availability,
                });
            }
        }
        for gate in &self.gates {
            if gate.bonus < 0.0 {
                return Err(BiomeSchemaError::BadGateBonus {
                    gate: gate.name,
                    bonus: gate.bonus,
                });
            }
        }
        Ok(())
    }

    /// Profile lookup; unknown biomes fall back to Temperate
    pub fn get(&self, id: BiomeId) -> &BiomeProfile {
        self.profiles
            .get(&id)
            .or_else(|| self.profiles.get(&BiomeId::Temperate))
            .expect("temperate profile always present")
    }

    /// Gates scoped to one biome
    pub fn gates_for(&self, id: BiomeId) -> impl Iterator<Item = &Gate> {
        self.gates.iter().filter(move |g| g.biome == id)
    }

    /// Foraging baseline, looked up by substring match on the biome name
    /// and resolved to the matched profile's `food_availability` so the
    /// value has exactly one source of truth. Falls back to 0.55 for names
    /// no table row matches.
    pub fn food_baseline(&self, id: BiomeId) -> f32 {
        const TABLE: [(&str, BiomeId); 8] = [
            ("desert", BiomeId::Desert),
            ("tundra", BiomeId::Tundra),
            ("grass", BiomeId::Grassland),
            ("rainforest", BiomeId::Rainforest),
            ("swamp", BiomeId::Swamp),
            ("reef", BiomeId::Reef),
            ("ocean", BiomeId::Ocean),
            ("temperate", BiomeId::Temperate),
        ];
        let name = id.name().to_lowercase();
        TABLE
            .iter()
            .find(|(needle, _)| name.contains(needle))
            .map(|&(_, biome)| self.get(biome).food_availability)
            .unwrap_or(0.55)
    }
}

impl Default for BiomeRegistry {
    fn default() -> Self {
        Self::new().expect("built-in biome tables are valid")
    }
}

fn builtin_gates() -> Vec<Gate> {
    vec![
        Gate {
            name: "Desert-Plated",
            biome: BiomeId::Desert,
            requirements: vec![
                GateRequirement::above(TraitKey::Rigidity, 0.6),
                GateRequirement::above(TraitKey::BodySize, 0.4),
            ],
            bonus: 0.25,
        },
        Gate {
            name: "Tundra-Insulated",
            biome: BiomeId::Tundra,
            requirements: vec![
                GateRequirement::above(TraitKey::Thermoregulation, 0.65),
                GateRequirement::above(TraitKey::MetabolicRate, 0.4),
            ],
            bonus: 0.25,
        },
        Gate {
            name: "Reef-Anchored",
            biome: BiomeId::Reef,
            requirements: vec![
                GateRequirement::below(TraitKey::LocomotionMode, 0.25),
                GateRequirement::above(TraitKey::WaterRetention, 0.5),
            ],
            bonus: 0.2,
        },
        Gate {
            name: "Ocean-Streamlined",
            biome: BiomeId::Ocean,
            requirements: vec![
                GateRequirement::above(TraitKey::WaterRetention, 0.6),
                GateRequirement::below(TraitKey::Rigidity, 0.5),
            ],
            bonus: 0.2,
        },
        Gate {
            name: "Rainforest-Canopy",
            biome: BiomeId::Rainforest,
            requirements: vec![
                GateRequirement::above(TraitKey::LimbLength, 0.55),
                GateRequirement::above(TraitKey::ProximityAwareness, 0.5),
            ],
            bonus: 0.2,
        },
        Gate {
            name: "Swamp-Mucous",
            biome: BiomeId::Swamp,
            requirements: vec![
                GateRequirement::above(TraitKey::WaterRetention, 0.55),
                GateRequirement::below(TraitKey::RespirationType, 0.5),
            ],
            bonus: 0.15,
        },
        Gate {
            name: "Grassland-Grazer",
            biome: BiomeId::Grassland,
            requirements: vec![
                GateRequirement::below(TraitKey::FeedingStrategy, 0.4),
                GateRequirement::above(TraitKey::DigestiveEfficiency, 0.5),
            ],
            bonus: 0.2,
        },
        Gate {
            name: "Temperate-Generalist",
            biome: BiomeId::Temperate,
            requirements: vec![
                GateRequirement::above(TraitKey::DigestiveEfficiency, 0.5),
                GateRequirement::above(TraitKey::Thermoregulation, 0.4),
            ],
            bonus: 0.15,
        },
    ]
}
