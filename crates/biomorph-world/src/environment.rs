//! Continuous environment state and the per-tick stepper
//!
//! The environment is replaced, never mutated: each step derives a fresh
//! state from the previous one. The clock is injected through
//! [`StepOptions`] so stepping stays reproducible under a seeded RNG.

use ahash::HashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::biome::{BiomeId, BiomeRegistry};

/// Seconds per full seasonal cycle
const SEASON_PERIOD: f64 = 600.0;
/// Seconds per full circadian cycle
const CIRCADIAN_PERIOD: f64 = 40.0;
/// Exponential smoothing decay for the history
const HISTORY_DECAY: f32 = 0.92;
/// Blend weight for a biome's weather bias
const BIOME_BLEND: f32 = 0.45;

/// Exponentially-smoothed environmental history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentHistory {
    /// Biome-occupancy mixture; always sums to 1
    pub biome_mix: HashMap<BiomeId, f32>,
    pub avg_temperature: f32,
    pub avg_volatility: f32,
    pub avg_travel: f32,
    pub avg_interaction: f32,
}

impl EnvironmentHistory {
    fn seeded(biome: BiomeId) -> Self {
        let mut biome_mix = HashMap::default();
        biome_mix.insert(biome, 1.0);
        Self {
            biome_mix,
            avg_temperature: 0.0,
            avg_volatility: 0.2,
            avg_travel: 0.2,
            avg_interaction: 0.2,
        }
    }

    /// Smooth in one observation and renormalize the mixture
    fn absorb(&mut self, env_biome: BiomeId, temperature: f32, volatility: f32, travel: f32, interaction: f32) {
        for weight in self.biome_mix.values_mut() {
            *weight *= HISTORY_DECAY;
        }
        *self.biome_mix.entry(env_biome).or_insert(0.0) += 1.0 - HISTORY_DECAY;

        let total: f32 = self.biome_mix.values().sum();
        if total > 0.0 {
            for weight in self.biome_mix.values_mut() {
                *weight /= total;
            }
        }

        let blend = |avg: f32, sample: f32| avg * HISTORY_DECAY + sample * (1.0 - HISTORY_DECAY);
        self.avg_temperature = blend(self.avg_temperature, temperature);
        self.avg_volatility = blend(self.avg_volatility, volatility);
        self.avg_travel = blend(self.avg_travel, travel);
        self.avg_interaction = blend(self.avg_interaction, interaction);
    }
}

/// Continuous environment state for one tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    /// [-1, 1]
    pub temperature: f32,
    pub humidity: f32,
    pub wind: f32,
    pub sunlight: f32,
    /// Cyclic [0, 1]
    pub season: f32,
    /// Cyclic [0, 1]
    pub circadian_phase: f32,
    pub travel_rate: f32,
    pub proximity_density: f32,
    pub volatility: f32,
    pub biome: BiomeId,
    pub history: EnvironmentHistory,
}

impl Environment {
    /// Fresh environment pinned at the given biome
    pub fn genesis(biome: BiomeId) -> Self {
        Self {
            temperature: 0.1,
            humidity: 0.5,
            wind: 0.35,
            sunlight: 0.6,
            season: 0.0,
            circadian_phase: 0.0,
            travel_rate: 0.2,
            proximity_density: 0.2,
            volatility: 0.2,
            biome,
            history: EnvironmentHistory::seeded(biome),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::genesis(BiomeId::Temperate)
    }
}

/// Caller-supplied stepping inputs
#[derive(Debug, Clone, Default)]
pub struct StepOptions {
    /// Simulation clock in seconds; drives season and circadian phase
    pub clock_seconds: f64,
    /// Pin the environment to one biome (drift probability forced to zero)
    pub locked_biome: Option<BiomeId>,
}

/// Advance the environment one tick.
///
/// `prev = None` starts from [`Environment::genesis`] in the locked biome
/// (Temperate when unlocked).
pub fn step<R: Rng>(
    prev: Option<&Environment>,
    registry: &BiomeRegistry,
    opts: &StepOptions,
    rng: &mut R,
) -> Environment {
    let base;
    let prev = match prev {
        Some(env) => env,
        None => {
            base = Environment::genesis(opts.locked_biome.unwrap_or(BiomeId::Temperate));
            &base
        }
    };

    // Two independent periodic signals of the injected clock
    let season = phase(opts.clock_seconds, SEASON_PERIOD);
    let circadian_phase = phase(opts.clock_seconds, CIRCADIAN_PERIOD);

    let volatility = (prev.volatility + rng.gen_range(-0.06..0.06)).clamp(0.02, 1.0);
    let travel_rate = (prev.travel_rate + rng.gen_range(-0.05..0.05)).clamp(0.0, 1.0);
    let proximity_density = (prev.proximity_density + rng.gen_range(-0.05..0.05)).clamp(0.0, 1.0);

    // Season maps onto a yearly temperature swing, circadian adds a small
    // day/night wobble, volatility adds weather noise
    let seasonal_wave = (season * std::f32::consts::TAU).sin();
    let mut temperature = lerp(-0.65, 0.75, seasonal_wave * 0.5 + 0.5)
        + (circadian_phase * std::f32::consts::TAU).sin() * 0.08
        + rng.gen_range(-0.3..0.3) * volatility;

    let mut humidity = (0.5 + rng.gen_range(-0.35..0.35) * volatility).clamp(0.0, 1.0);
    let mut wind = (0.35 + rng.gen_range(-0.4..0.4) * volatility).clamp(0.0, 1.0);

    // Day/night light curve, damped by cloud cover (high humidity)
    let daylight = ((circadian_phase * std::f32::consts::TAU).sin() * 0.5 + 0.5).clamp(0.0, 1.0);
    let mut sunlight = daylight * (1.0 - humidity * 0.55);

    let biome = next_biome(prev, registry, opts, travel_rate, volatility, rng);

    // Biomes nudge weather toward their bias, they never overwrite it
    let bias = registry.get(biome).env_bias;
    temperature = lerp(temperature, bias.temperature, BIOME_BLEND).clamp(-1.0, 1.0);
    humidity = lerp(humidity, bias.humidity, BIOME_BLEND).clamp(0.0, 1.0);
    wind = lerp(wind, bias.wind, BIOME_BLEND).clamp(0.0, 1.0);
    sunlight = lerp(sunlight, bias.sunlight, BIOME_BLEND).clamp(0.0, 1.0);

    let mut history = prev.history.clone();
    history.absorb(biome, temperature, volatility, travel_rate, proximity_density);

    Environment {
        temperature,
        humidity,
        wind,
        sunlight,
        season,
        circadian_phase,
        travel_rate,
        proximity_density,
        volatility,
        biome,
        history,
    }
}

fn next_biome<R: Rng>(
    prev: &Environment,
    registry: &BiomeRegistry,
    opts: &StepOptions,
    travel_rate: f32,
    volatility: f32,
    rng: &mut R,
) -> BiomeId {
    if let Some(locked) = opts.locked_biome {
        return locked;
    }

    let drift = 0.02 + travel_rate * 0.1 + volatility * 0.05;
    if rng.gen::<f32>() >= drift {
        return prev.biome;
    }

    let neighbors = &registry.get(prev.biome).neighbors;
    let target = if neighbors.is_empty() {
        BiomeId::ALL[rng.gen_range(0..BiomeId::ALL.len())]
    } else {
        neighbors[rng.gen_range(0..neighbors.len())]
    };
    if target != prev.biome {
        log::debug!("biome drift: {} -> {}", prev.biome, target);
    }
    target
}

fn phase(clock_seconds: f64, period: f64) -> f32 {
    (clock_seconds.rem_euclid(period) / period) as f32
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    fn registry() -> BiomeRegistry {
        BiomeRegistry::default()
    }

    #[test]
    fn test_step_ranges() {
        let registry = registry();
        let mut rng = Xoshiro256StarStar::seed_from_u64(5);
        let mut env: Option<Environment> = None;

        for tick in 0..500 {
            let opts = StepOptions {
                clock_seconds: tick as f64,
                locked_biome: None,
            };
            let next = step(env.as_ref(), &registry, &opts, &mut rng);
            assert!((-1.0..=1.0).contains(&next.temperature));
            assert!((0.0..=1.0).contains(&next.humidity));
            assert!((0.0..=1.0).contains(&next.wind));
            assert!((0.0..=1.0).contains(&next.sunlight));
            assert!((0.0..=1.0).contains(&next.season));
            assert!((0.0..=1.0).contains(&next.circadian_phase));
            env = Some(next);
        }
    }

    #[test]
    fn test_history_mixture_sums_to_one() {
        let registry = registry();
        let mut rng = Xoshiro256StarStar::seed_from_u64(13);
        let mut env: Option<Environment> = None;

        for tick in 0..1000 {
            let opts = StepOptions {
                clock_seconds: tick as f64 * 0.5,
                locked_biome: None,
            };
            let next = step(env.as_ref(), &registry, &opts, &mut rng);
            let total: f32 = next.history.biome_mix.values().sum();
            assert!(
                (total - 1.0).abs() < 1e-4,
                "mixture sum {} at tick {}",
                total,
                tick
            );
            env = Some(next);
        }
    }

    #[test]
    fn test_locked_biome_never_drifts() {
        let registry = registry();
        let mut rng = Xoshiro256StarStar::seed_from_u64(17);
        let mut env: Option<Environment> = None;

        for tick in 0..2000 {
            let opts = StepOptions {
                clock_seconds: tick as f64,
                locked_biome: Some(BiomeId::Desert),
            };
            let next = step(env.as_ref(), &registry, &opts, &mut rng);
            assert_eq!(next.biome, BiomeId::Desert);
            env = Some(next);
        }
    }

    #[test]
    fn test_unlocked_biome_eventually_drifts() {
        let registry = registry();
        let mut rng = Xoshiro256StarStar::seed_from_u64(23);
        let mut env = Environment::genesis(BiomeId::Temperate);
        let mut seen_other = false;

        for tick in 0..5000 {
            let opts = StepOptions {
                clock_seconds: tick as f64,
                locked_biome: None,
            };
            env = step(Some(&env), &registry, &opts, &mut rng);
            if env.biome != BiomeId::Temperate {
                seen_other = true;
                break;
            }
        }
        assert!(seen_other, "expected at least one biome transition");
    }

    #[test]
    fn test_biome_bias_pulls_weather() {
        let registry = registry();
        let mut rng = Xoshiro256StarStar::seed_from_u64(31);
        let mut env: Option<Environment> = None;

        // Pin to desert and average: temperature should sit clearly warm
        let mut temp_sum = 0.0;
        let n = 2000;
        for tick in 0..n {
            let opts = StepOptions {
                clock_seconds: tick as f64,
                locked_biome: Some(BiomeId::Desert),
            };
            let next = step(env.as_ref(), &registry, &opts, &mut rng);
            temp_sum += next.temperature;
            env = Some(next);
        }
        assert!(temp_sum / n as f32 > 0.2, "desert should trend warm");
    }
}
