use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use vnf_anneal::anneal::{AnnealConfig, AnnealRunner, Progress, SearchObserver};
use vnf_anneal::{initial_solution, parse, random, Solution};

#[derive(Parser)]
#[command(
    name = "vnf-anneal",
    about = "Energy-aware VNF placement and routing by simulated annealing",
    version
)]
struct Cli {
    /// Instance file
    #[arg(default_value = "instanca.txt")]
    instance: PathBuf,

    /// Where to write the best solution
    #[arg(short, long, default_value = "res.txt")]
    output: PathBuf,

    /// TOML file with annealing parameters; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    initial_temperature: Option<f64>,

    #[arg(long)]
    alpha: Option<f64>,

    #[arg(long)]
    min_temperature: Option<f64>,

    #[arg(long)]
    max_iterations: Option<usize>,

    /// Taboo list capacity
    #[arg(long)]
    taboo: Option<usize>,

    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// Write the best solution to the output file every N iterations
    #[arg(long)]
    checkpoint_every: Option<usize>,

    /// Stop after the initial placement and routing
    #[arg(long)]
    initial_only: bool,

    /// Assess neighbors in parallel (needs the `parallel` feature)
    #[arg(long)]
    parallel: bool,
}

impl Cli {
    fn anneal_config(&self) -> anyhow::Result<AnnealConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                toml::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => AnnealConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(t) = self.initial_temperature {
            config.initial_temperature = t;
        }
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(t) = self.min_temperature {
            config.min_temperature = t;
        }
        if let Some(n) = self.max_iterations {
            config.max_iterations = n;
        }
        if let Some(n) = self.taboo {
            config.taboo_capacity = n;
        }
        if let Some(ms) = self.time_limit_ms {
            config.time_limit_ms = Some(ms);
        }
        config.parallel |= self.parallel;
        config.validate()?;
        Ok(config)
    }
}

/// Periodically overwrites the output file with the best solution so far.
struct Checkpoint<'a> {
    path: &'a Path,
    every: usize,
}

impl SearchObserver for Checkpoint<'_> {
    fn on_iteration(&mut self, progress: &Progress<'_>) {
        if self.every == 0 || !progress.iteration.is_multiple_of(self.every) {
            return;
        }
        match write_solution(self.path, progress.best) {
            Ok(()) => info!(
                iteration = progress.iteration,
                fitness = progress.best.fitness(),
                "checkpoint written"
            ),
            Err(e) => warn!(error = %e, "checkpoint failed"),
        }
    }
}

fn write_solution(path: &Path, solution: &Solution) -> anyhow::Result<()> {
    std::fs::write(path, solution.to_string())
        .with_context(|| format!("writing {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vnf_anneal=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.anneal_config()?;

    let text = std::fs::read_to_string(&cli.instance)
        .with_context(|| format!("reading instance {}", cli.instance.display()))?;
    let problem = parse(&text)?;
    info!(
        servers = problem.num_servers(),
        components = problem.num_components(),
        nodes = problem.num_nodes(),
        links = problem.num_links(),
        chains = problem.service_chains().len(),
        "instance loaded"
    );

    let initial = initial_solution(&problem, &config)?;
    let best = if cli.initial_only {
        initial
    } else {
        let mut rng = random::rng_from(config.seed);
        let mut checkpoint = Checkpoint {
            path: &cli.output,
            every: cli.checkpoint_every.unwrap_or(0),
        };
        let result = AnnealRunner::run_observed(
            &problem,
            initial,
            &config,
            &mut rng,
            None,
            &mut checkpoint,
        )?;
        info!(
            iterations = result.iterations,
            accepted = result.accepted_moves,
            resets = result.resets,
            "search done"
        );
        result.best
    };

    let validity = best.check_validity(&problem);
    for line in validity.diagnostics() {
        warn!("{line}");
    }
    if let Some(parts) = best.fitness_breakdown(&problem) {
        info!(
            servers = parts.servers,
            nodes = parts.nodes,
            links = parts.links,
            "power breakdown"
        );
    }
    println!("{}", best.fitness());

    write_solution(&cli.output, &best)?;
    info!(path = %cli.output.display(), valid = validity.is_valid(), "result written");
    Ok(())
}
