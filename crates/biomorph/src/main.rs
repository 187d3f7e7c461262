use clap::Parser;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

use biomorph_creature::{assemble, derive};
use biomorph_genome::Genome;
use biomorph_world::cycle::BatchOptions;
use biomorph_world::{score, BiomeId, BiomeRegistry, Environment, PopulationSim, Session};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of evolutionary cycles to run
    #[arg(long, default_value_t = 5000)]
    cycles: u64,

    /// RNG seed for a reproducible run
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Lock the environment to one biome (e.g. desert, reef)
    #[arg(long)]
    biome: Option<BiomeId>,

    /// Run population mode with this many organisms instead of the
    /// single-organism visualizer loop
    #[arg(long)]
    population: Option<usize>,

    /// Let starvation and environmental stress actually kill the organism
    #[arg(long)]
    allow_death: bool,

    /// Cycles per batch chunk
    #[arg(long, default_value_t = 512)]
    chunk_size: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    log::info!("Starting Biomorph: {} cycles, seed {}", args.cycles, args.seed);
    let mut rng = Xoshiro256StarStar::seed_from_u64(args.seed);

    if let Some(size) = args.population {
        run_population(&args, size, &mut rng);
        return Ok(());
    }

    let registry = BiomeRegistry::new()?;
    let mut session = Session::new();
    let opts = BatchOptions {
        cycles: args.cycles,
        chunk_size: args.chunk_size.max(1),
        locked_biome: args.biome,
        disable_death: !args.allow_death,
        ..BatchOptions::default()
    };

    let start_biome = args.biome.unwrap_or(BiomeId::Temperate);
    let outcome = session.run_batch(
        Genome::genesis(),
        Environment::genesis(start_biome),
        &registry,
        &opts,
        &mut rng,
        |done| log::debug!("advanced {done}/{} cycles", args.cycles),
    );

    let report = score(&outcome.genome, &outcome.environment, &registry);
    let phenotype = derive(&outcome.genome, &outcome.environment, &registry);
    let tree = assemble(&phenotype);
    let (min, max) = tree.bounding_box();

    println!("=== Biomorph run complete ===");
    println!("cycles:     {}", outcome.cycles_run);
    println!("deaths:     {}", outcome.deaths);
    println!("biome:      {}", outcome.environment.biome);
    println!(
        "fitness:    {:.3} (penalty {:.3}, bonus {:.3}, tags {:?})",
        report.fitness, report.penalty_total, report.bonus_total, report.tags
    );
    println!(
        "phenotype:  {} / {} / {} limbs / {} skin",
        phenotype.body_plan,
        phenotype.locomotion,
        phenotype.limb_type.name(),
        phenotype.skin_type.name()
    );
    println!(
        "appendages: {} leg, {} fin, {} wing, {} tentacle pairs; {} eyes",
        phenotype.leg_pairs,
        phenotype.fin_pairs,
        phenotype.wing_pairs,
        phenotype.tentacle_pairs,
        phenotype.eye_count
    );
    println!(
        "render:     {} nodes, bounds [{:.2},{:.2}] x [{:.2},{:.2}]",
        tree.count(),
        min.x,
        max.x,
        min.y,
        max.y
    );
    Ok(())
}

fn run_population(args: &Args, size: usize, rng: &mut Xoshiro256StarStar) {
    let mut sim = PopulationSim::new(size, args.biome);
    for _ in 0..args.cycles {
        sim.run_cycle(rng);
    }
    let summary = sim.summary();

    println!("=== Population run complete ===");
    println!("cycles:       {}", summary.cycle);
    println!("population:   {}", summary.population);
    println!("births:       {}", summary.births);
    println!("deaths:       {}", summary.deaths);
    println!("mean fitness: {:.3}", summary.mean_fitness);
    println!("oldest age:   {}", summary.oldest_age);
    println!("lineages:     {}", summary.lineage_count);
    println!("biome:        {}", summary.biome);
}
