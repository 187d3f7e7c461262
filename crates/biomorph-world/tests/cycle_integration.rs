//! Long-run integration tests for the evolutionary cycle

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

use biomorph_genome::Genome;
use biomorph_world::cycle::BatchOptions;
use biomorph_world::{BiomeId, BiomeRegistry, CycleOptions, Environment, Session, StepOptions};

#[test]
fn never_die_mode_survives_twenty_thousand_cycles() {
    let registry = BiomeRegistry::default();
    let mut rng = Xoshiro256StarStar::seed_from_u64(2024);
    let mut session = Session::new();

    let mut genome = Genome::genesis();
    let mut environment = Environment::genesis(BiomeId::Temperate);
    let opts = CycleOptions { disable_death: true };

    let mut causes_reported = 0u32;
    for tick in 0..20_000u64 {
        let step_opts = StepOptions {
            clock_seconds: tick as f64,
            locked_biome: None,
        };
        environment =
            biomorph_world::environment::step(Some(&environment), &registry, &step_opts, &mut rng);

        let outcome = session.run_cycle(&genome, &environment, &registry, &opts, &mut rng);
        assert!(
            outcome.survived,
            "disable_death run returned survived=false at cycle {tick}"
        );
        if outcome.cause_of_death.is_some() {
            causes_reported += 1;
        }
        if let Some(next) = outcome.mutated {
            assert!(next.is_normalized());
            genome = next;
        }
    }

    assert_eq!(session.cycle_count, 20_000);
    // Causes may be reported even though the organism is never removed
    let _ = causes_reported;
}

#[test]
fn batch_jump_matches_requested_cycle_count() {
    let registry = BiomeRegistry::default();
    let mut rng = Xoshiro256StarStar::seed_from_u64(77);
    let mut session = Session::new();

    let opts = BatchOptions {
        cycles: 5000,
        chunk_size: 500,
        ..BatchOptions::default()
    };

    let mut chunks = 0;
    let outcome = session.run_batch(
        Genome::genesis(),
        Environment::genesis(BiomeId::Temperate),
        &registry,
        &opts,
        &mut rng,
        |_| chunks += 1,
    );

    assert_eq!(outcome.cycles_run, 5000);
    assert_eq!(chunks, 10);
    assert_eq!(outcome.deaths, 0, "default batch mode never kills");
    assert!(outcome.genome.is_normalized());

    let mix_sum: f32 = outcome.environment.history.biome_mix.values().sum();
    assert!((mix_sum - 1.0).abs() < 1e-3);
}
