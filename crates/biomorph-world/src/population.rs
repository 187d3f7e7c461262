//! Population-mode simulation (secondary)
//!
//! Holds an array of organisms with independent genomes, ages and lineages.
//! Reproduction, death and extinction prevention operate per-organism. The
//! primary single-organism visualizer path does not use this module.

use rand::Rng;

use biomorph_genome::{mutate, Genome, MutationConfig};

use crate::biome::{BiomeId, BiomeRegistry};
use crate::cycle::{CycleOptions, Session};
use crate::environment::{step, Environment, StepOptions};
use crate::fitness::score;

/// Energy reserve required to reproduce
const REPRODUCTION_THRESHOLD: f32 = 1.5;
/// Energy cost of reproducing
const REPRODUCTION_COST: f32 = 0.8;
/// Population never exceeds this
const POPULATION_CAP: usize = 64;

/// One organism in the population
#[derive(Debug, Clone)]
pub struct Organism {
    pub id: u64,
    pub genome: Genome,
    pub age: u64,
    /// Root ancestor id; children inherit it
    pub lineage: u64,
    /// Accumulated energy reserve
    pub energy: f32,
}

/// Per-cycle summary of the population
#[derive(Debug, Clone)]
pub struct PopulationSummary {
    pub cycle: u64,
    pub population: usize,
    pub births: u64,
    pub deaths: u64,
    pub mean_fitness: f32,
    pub oldest_age: u64,
    pub lineage_count: usize,
    pub biome: BiomeId,
}

/// Population simulation holding shared environment state
pub struct PopulationSim {
    registry: BiomeRegistry,
    environment: Environment,
    organisms: Vec<Organism>,
    sessions: Vec<Session>,
    mutation_config: MutationConfig,
    cycle: u64,
    births: u64,
    deaths: u64,
    next_id: u64,
    locked_biome: Option<BiomeId>,
    /// Best genome seen so far, for extinction recovery
    champion: Genome,
}

impl PopulationSim {
    pub fn new(size: usize, locked_biome: Option<BiomeId>) -> Self {
        let size = size.clamp(1, POPULATION_CAP);
        let environment = Environment::genesis(locked_biome.unwrap_or(BiomeId::Temperate));
        let organisms = (0..size as u64)
            .map(|id| Organism {
                id,
                genome: Genome::genesis(),
                age: 0,
                lineage: id,
                energy: 0.5,
            })
            .collect::<Vec<_>>();
        let sessions = organisms.iter().map(|_| Session::new()).collect();

        Self {
            registry: BiomeRegistry::default(),
            environment,
            next_id: size as u64,
            organisms,
            sessions,
            mutation_config: MutationConfig::default(),
            cycle: 0,
            births: 0,
            deaths: 0,
            locked_biome,
            champion: Genome::genesis(),
        }
    }

    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    /// Advance the whole population one cycle
    pub fn run_cycle<R: Rng>(&mut self, rng: &mut R) {
        let opts = StepOptions {
            clock_seconds: self.cycle as f64,
            locked_biome: self.locked_biome,
        };
        self.environment = step(Some(&self.environment), &self.registry, &opts, rng);

        let cycle_opts = CycleOptions {
            disable_death: false,
        };

        let organisms = std::mem::take(&mut self.organisms);
        let sessions = std::mem::take(&mut self.sessions);
        let mut survivors = Vec::with_capacity(organisms.len());
        let mut surviving_sessions = Vec::with_capacity(sessions.len());
        let mut offspring = Vec::new();

        for (mut organism, mut session) in organisms.into_iter().zip(sessions) {
            let outcome = session.run_cycle(
                &organism.genome,
                &self.environment,
                &self.registry,
                &cycle_opts,
                rng,
            );

            if !outcome.survived {
                self.deaths += 1;
                log::debug!(
                    "organism {} (lineage {}) died at age {}: {:?}",
                    organism.id,
                    organism.lineage,
                    organism.age,
                    outcome.cause_of_death
                );
                continue;
            }

            organism.age += 1;
            organism.energy = (organism.energy + outcome.energy_delta).clamp(0.0, 3.0);
            if let Some(next) = outcome.mutated {
                organism.genome = next;
            }

            let report = score(&organism.genome, &self.environment, &self.registry);
            if report.fitness
                > score(&self.champion, &self.environment, &self.registry).fitness
            {
                self.champion = organism.genome.clone();
            }

            if organism.energy > REPRODUCTION_THRESHOLD
                && survivors.len() + offspring.len() + 1 < POPULATION_CAP
            {
                organism.energy -= REPRODUCTION_COST;
                let child_genome = mutate(
                    &organism.genome,
                    &self.mutation_config,
                    0.2,
                    &self.registry.get(self.environment.biome).trait_bias,
                    rng,
                );
                offspring.push(Organism {
                    id: self.next_id,
                    genome: child_genome,
                    age: 0,
                    lineage: organism.lineage,
                    energy: 0.4,
                });
                self.next_id += 1;
                self.births += 1;
            }

            survivors.push(organism);
            surviving_sessions.push(session);
        }

        for child in offspring {
            survivors.push(child);
            surviving_sessions.push(Session::new());
        }

        // Extinction prevention: restock from the champion lineage
        if survivors.is_empty() {
            log::info!("population extinct at cycle {}, restocking champion", self.cycle);
            let genome = mutate(&self.champion, &self.mutation_config, 0.3, &[], rng);
            survivors.push(Organism {
                id: self.next_id,
                genome,
                age: 0,
                lineage: self.next_id,
                energy: 0.5,
            });
            surviving_sessions.push(Session::new());
            self.next_id += 1;
        }

        self.organisms = survivors;
        self.sessions = surviving_sessions;
        self.cycle += 1;
    }

    /// Snapshot summary of the current population
    pub fn summary(&self) -> PopulationSummary {
        let mut lineages: Vec<u64> = self.organisms.iter().map(|o| o.lineage).collect();
        lineages.sort_unstable();
        lineages.dedup();

        let mean_fitness = if self.organisms.is_empty() {
            0.0
        } else {
            self.organisms
                .iter()
                .map(|o| score(&o.genome, &self.environment, &self.registry).fitness)
                .sum::<f32>()
                / self.organisms.len() as f32
        };

        PopulationSummary {
            cycle: self.cycle,
            population: self.organisms.len(),
            births: self.births,
            deaths: self.deaths,
            mean_fitness,
            oldest_age: self.organisms.iter().map(|o| o.age).max().unwrap_or(0),
            lineage_count: lineages.len(),
            biome: self.environment.biome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    #[test]
    fn test_population_never_goes_extinct() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(8);
        let mut sim = PopulationSim::new(8, Some(BiomeId::Desert));

        for _ in 0..2000 {
            sim.run_cycle(&mut rng);
            assert!(!sim.organisms().is_empty(), "extinction floor violated");
        }
    }

    #[test]
    fn test_population_respects_cap() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(9);
        let mut sim = PopulationSim::new(16, Some(BiomeId::Rainforest));

        for _ in 0..2000 {
            sim.run_cycle(&mut rng);
            assert!(sim.organisms().len() <= POPULATION_CAP);
        }
    }

    #[test]
    fn test_summary_counts_lineages() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(10);
        let mut sim = PopulationSim::new(4, Some(BiomeId::Temperate));

        for _ in 0..50 {
            sim.run_cycle(&mut rng);
        }
        let summary = sim.summary();
        assert_eq!(summary.cycle, 50);
        assert!(summary.population >= 1);
        assert!(summary.lineage_count >= 1);
        assert!((0.0..=2.0).contains(&summary.mean_fitness));
    }

    #[test]
    fn test_clamped_size() {
        let sim = PopulationSim::new(10_000, None);
        assert!(sim.organisms().len() <= POPULATION_CAP);
    }
}
