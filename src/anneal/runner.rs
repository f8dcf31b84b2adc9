//! Annealing loop.

use super::config::AnnealConfig;
use super::neighbors::neighbors;
use super::taboo::TabooList;
use crate::error::Error;
use crate::problem::Problem;
use crate::random::shuffle;
use crate::routing::Router;
use crate::solution::{is_better, Solution};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of an annealing run.
#[derive(Debug, Clone)]
pub struct AnnealResult {
    /// The best solution found, routed and evaluated.
    pub best: Solution,

    /// Fitness of the best solution.
    pub best_fitness: f64,

    /// Outer iterations completed.
    pub iterations: usize,

    /// Neighbors accepted, including improvements.
    pub accepted_moves: usize,

    /// Accepted neighbors that beat the current solution.
    pub improving_moves: usize,

    /// Times the search restarted from the initial solution because every
    /// neighbor was dead.
    pub resets: usize,

    /// Temperature when the run stopped.
    pub final_temperature: f64,

    /// Whether the run was cancelled or hit its time limit.
    pub cancelled: bool,

    /// Best fitness after each outer iteration, starting with the initial one.
    pub fitness_history: Vec<f64>,
}

/// Snapshot passed to a [`SearchObserver`] after each outer iteration.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub iteration: usize,
    pub temperature: f64,
    pub current: &'a Solution,
    pub best: &'a Solution,
}

/// Hook called between outer iterations, e.g. to write checkpoints.
pub trait SearchObserver {
    fn on_iteration(&mut self, progress: &Progress<'_>);
}

impl SearchObserver for () {
    fn on_iteration(&mut self, _progress: &Progress<'_>) {}
}

/// What happened to one neighbor.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Assessment {
    /// Its moved component is taboo.
    Taboo,
    /// Routing raised a non-capacity error.
    Fatal,
    /// Some pair could not be routed.
    Dead,
    /// Routed, but violates capacity or latency.
    Invalid,
    Scored(f64),
}

/// How a scan over the neighborhood ended.
enum Scan {
    Accepted(Solution, f64),
    Exhausted { attempted: usize, dead: usize },
}

impl Scan {
    /// Every neighbor that got as far as routing failed to route.
    fn is_stuck(&self) -> bool {
        matches!(self, Scan::Exhausted { attempted, dead } if *attempted > 0 && dead == attempted)
    }
}

/// Simulated annealing over single-component moves, with a taboo list of
/// recently moved components.
///
/// Each outer iteration generates the full neighborhood of the current
/// solution, shuffles it, and scans it until one neighbor is accepted. A
/// neighbor is routed, checked for validity, and scored; it is accepted
/// with probability 1 when it beats the current fitness and
/// `exp(-|f - f_prev| / T)` otherwise, where `f_prev` is the current
/// fitness at the start of the iteration.
///
/// When every routed neighbor is dead, the search restarts once from the
/// initial solution with the temperature raised to `T0 / alpha^resets`.
pub struct AnnealRunner;

impl AnnealRunner {
    /// Runs the search from `initial`, which should be routed and valid.
    pub fn run<R: Rng>(
        problem: &Problem,
        initial: Solution,
        config: &AnnealConfig,
        rng: &mut R,
    ) -> Result<AnnealResult, Error> {
        Self::run_observed(problem, initial, config, rng, None, &mut ())
    }

    /// Runs with an optional cancellation token, checked between iterations.
    pub fn run_with_cancel<R: Rng>(
        problem: &Problem,
        initial: Solution,
        config: &AnnealConfig,
        rng: &mut R,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<AnnealResult, Error> {
        Self::run_observed(problem, initial, config, rng, cancel, &mut ())
    }

    /// Runs with a cancellation token and a progress observer.
    pub fn run_observed<R: Rng, O: SearchObserver>(
        problem: &Problem,
        initial: Solution,
        config: &AnnealConfig,
        rng: &mut R,
        cancel: Option<Arc<AtomicBool>>,
        observer: &mut O,
    ) -> Result<AnnealResult, Error> {
        config.validate()?;
        if config.parallel && !cfg!(feature = "parallel") {
            warn!("parallel requested but the `parallel` feature is disabled; running sequentially");
        }

        let router = config.router();
        let deadline = config
            .time_limit_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));

        let mut origin = initial;
        if origin.fitness().is_nan() {
            origin.evaluate(problem);
        }
        let mut current = origin.clone();
        let mut best = origin.clone();
        let mut best_fitness = origin.fitness();

        let mut taboo = TabooList::new(config.taboo_capacity);
        let mut temperature = config.initial_temperature;
        let mut iterations = 0usize;
        let mut accepted_moves = 0usize;
        let mut improving_moves = 0usize;
        let mut resets = 0usize;
        let mut cancelled = false;
        let mut fitness_history = vec![best_fitness];

        info!(
            initial_fitness = best_fitness,
            temperature,
            max_iterations = config.max_iterations,
            "annealing started"
        );

        while iterations < config.max_iterations && temperature >= config.min_temperature {
            if cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                cancelled = true;
                break;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                info!(iterations, "time limit reached");
                cancelled = true;
                break;
            }

            let previous_fitness = current.fitness();
            let mut reset_done = false;
            loop {
                let mut candidates = neighbors(problem, &current);
                shuffle(&mut candidates, rng);
                let outcome = scan(
                    problem,
                    &router,
                    config.parallel,
                    candidates,
                    &taboo,
                    current.fitness(),
                    previous_fitness,
                    temperature,
                    rng,
                );

                match outcome {
                    Scan::Accepted(candidate, fitness) => {
                        accepted_moves += 1;
                        if is_better(fitness, current.fitness()) {
                            improving_moves += 1;
                        }
                        if let Some(component) = candidate.last_moved() {
                            taboo.push(component);
                        }
                        current = candidate;
                        if is_better(fitness, best_fitness) {
                            best = current.clone();
                            best_fitness = fitness;
                            debug!(iteration = iterations, fitness, "new best");
                        }
                    }
                    stuck if stuck.is_stuck() && !reset_done => {
                        reset_done = true;
                        resets += 1;
                        current = origin.clone();
                        temperature = config.initial_temperature
                            / config.alpha.powi(resets.min(i32::MAX as usize) as i32);
                        info!(resets, temperature, "every neighbor dead, restarting from initial solution");
                        continue;
                    }
                    Scan::Exhausted { attempted, dead } => {
                        debug!(iteration = iterations, attempted, dead, "no neighbor accepted");
                    }
                }
                break;
            }

            temperature *= config.alpha;
            iterations += 1;
            fitness_history.push(best_fitness);
            observer.on_iteration(&Progress {
                iteration: iterations,
                temperature,
                current: &current,
                best: &best,
            });
        }

        info!(
            best_fitness,
            iterations, accepted_moves, improving_moves, resets, cancelled, "annealing finished"
        );

        Ok(AnnealResult {
            best,
            best_fitness,
            iterations,
            accepted_moves,
            improving_moves,
            resets,
            final_temperature: temperature,
            cancelled,
            fitness_history,
        })
    }
}

/// Scans shuffled neighbors in order, accepting the first that passes the
/// random draw.
#[allow(clippy::too_many_arguments)]
fn scan<R: Rng>(
    problem: &Problem,
    router: &Router,
    parallel: bool,
    mut candidates: Vec<Solution>,
    taboo: &TabooList,
    current_fitness: f64,
    previous_fitness: f64,
    temperature: f64,
    rng: &mut R,
) -> Scan {
    let assessed = assess_upfront(problem, router, parallel, &mut candidates, taboo);

    let mut attempted = 0usize;
    let mut dead = 0usize;
    for (index, mut candidate) in candidates.into_iter().enumerate() {
        let assessment = match &assessed {
            Some(all) => all[index],
            None => assess(problem, router, taboo, &mut candidate),
        };
        let fitness = match assessment {
            Assessment::Taboo | Assessment::Fatal => continue,
            Assessment::Dead => {
                attempted += 1;
                dead += 1;
                continue;
            }
            Assessment::Invalid => {
                attempted += 1;
                continue;
            }
            Assessment::Scored(f) => {
                attempted += 1;
                f
            }
        };

        let p = acceptance_probability(fitness, current_fitness, previous_fitness, temperature);
        candidate.set_probability(p);
        if rng.random_range(0.0..1.0) < p {
            return Scan::Accepted(candidate, fitness);
        }
    }
    Scan::Exhausted { attempted, dead }
}

/// Routes and scores every candidate at once when running in parallel.
/// The scan order and random draws are unchanged, so results match the
/// sequential run for the same seed.
#[cfg(feature = "parallel")]
fn assess_upfront(
    problem: &Problem,
    router: &Router,
    parallel: bool,
    candidates: &mut [Solution],
    taboo: &TabooList,
) -> Option<Vec<Assessment>> {
    use rayon::prelude::*;

    parallel.then(|| {
        candidates
            .par_iter_mut()
            .map(|candidate| assess(problem, router, taboo, candidate))
            .collect()
    })
}

#[cfg(not(feature = "parallel"))]
fn assess_upfront(
    _problem: &Problem,
    _router: &Router,
    _parallel: bool,
    _candidates: &mut [Solution],
    _taboo: &TabooList,
) -> Option<Vec<Assessment>> {
    None
}

fn assess(
    problem: &Problem,
    router: &Router,
    taboo: &TabooList,
    candidate: &mut Solution,
) -> Assessment {
    if candidate.last_moved().is_some_and(|c| taboo.contains(c)) {
        return Assessment::Taboo;
    }
    match router.route(problem, candidate) {
        Err(e) => {
            debug!(error = %e, "neighbor skipped");
            Assessment::Fatal
        }
        Ok(outcome) if !outcome.is_complete() => Assessment::Dead,
        Ok(_) if !candidate.is_valid(problem) => Assessment::Invalid,
        Ok(_) => Assessment::Scored(candidate.evaluate(problem)),
    }
}

/// 1 for an improvement, otherwise the Metropolis term against the
/// fitness at the start of the iteration.
fn acceptance_probability(
    candidate: f64,
    current: f64,
    previous: f64,
    temperature: f64,
) -> f64 {
    if is_better(candidate, current) {
        return 1.0;
    }
    let delta = (candidate - previous).abs();
    if delta.is_nan() || temperature <= 0.0 {
        return 0.0;
    }
    (-delta / temperature).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::InitialPlacer;
    use crate::problem::{fixtures, parse, ProblemBuilder};
    use crate::random::create_rng;

    /// One node, a cheap and an expensive server, one component.
    /// Fitness is 15 on server 1 and 75 on server 2.
    fn two_server_problem() -> Problem {
        ProblemBuilder::new()
            .with_node(0.0)
            .with_server(fixtures::server(10.0, 20.0, 10.0, 10.0, 1))
            .with_server(fixtures::server(50.0, 100.0, 10.0, 10.0, 1))
            .with_component(5.0, 5.0)
            .with_chain(10.0, vec![1])
            .build()
            .unwrap()
    }

    fn on_server(problem: &Problem, server: usize) -> Solution {
        let mut sol = Solution::new(problem);
        sol.place(problem, 1, server, false).unwrap();
        Router::new().route(problem, &mut sol).unwrap();
        sol.evaluate(problem);
        sol
    }

    /// Both components fit together on node 1, but the link to node 2 is
    /// too thin for their demand, so every move is dead.
    fn split_is_dead_problem() -> Problem {
        ProblemBuilder::new()
            .with_node(1.0)
            .with_node(1.0)
            .with_server(fixtures::server(10.0, 20.0, 8.0, 8.0, 1))
            .with_server(fixtures::server(10.0, 20.0, 8.0, 8.0, 2))
            .with_component(4.0, 4.0)
            .with_component(4.0, 4.0)
            .with_symmetric_link(1, 2, fixtures::link(5.0, 1.0, 1.0))
            .with_demand(1, 2, 10.0)
            .with_chain(10.0, vec![1, 2])
            .build()
            .unwrap()
    }

    fn data_problem() -> Problem {
        parse(include_str!("../../data/three_nodes.txt")).unwrap()
    }

    fn routed_initial(problem: &Problem) -> Solution {
        let mut sol = InitialPlacer::place_all(problem).unwrap();
        assert!(Router::new().route(problem, &mut sol).unwrap().is_complete());
        sol.evaluate(problem);
        sol
    }

    #[test]
    fn test_accepts_improvement() {
        let problem = two_server_problem();
        let initial = on_server(&problem, 2);
        assert!((initial.fitness() - 75.0).abs() < 1e-9);

        let config = AnnealConfig::default().with_max_iterations(1);
        let result = AnnealRunner::run(&problem, initial, &config, &mut create_rng(3)).unwrap();
        assert_eq!(result.accepted_moves, 1);
        assert_eq!(result.improving_moves, 1);
        assert!((result.best_fitness - 15.0).abs() < 1e-9);
        assert_eq!(result.best.server_of(1), Some(1));
        assert_eq!(result.best.probability(), 1.0);
    }

    #[test]
    fn test_cold_run_rejects_worse_and_stops() {
        let problem = two_server_problem();
        let initial = on_server(&problem, 1);
        let config = AnnealConfig::default()
            .with_initial_temperature(1e-6)
            .with_min_temperature(1e-12)
            .with_alpha(0.5)
            .with_max_iterations(3);
        let result = AnnealRunner::run(&problem, initial, &config, &mut create_rng(1)).unwrap();
        assert_eq!(result.iterations, 3);
        assert_eq!(result.accepted_moves, 0);
        assert_eq!(result.resets, 0);
        assert!((result.best_fitness - 15.0).abs() < 1e-9);
        assert!((result.final_temperature - 1e-6 * 0.125).abs() < 1e-15);
        assert_eq!(result.fitness_history.len(), 4);
    }

    #[test]
    fn test_taboo_blocks_moving_back() {
        let problem = two_server_problem();
        let initial = on_server(&problem, 2);
        // Hot enough that moving back would almost surely be accepted.
        let config = AnnealConfig::default()
            .with_initial_temperature(1e6)
            .with_alpha(0.99)
            .with_max_iterations(10)
            .with_taboo_capacity(1);
        let result = AnnealRunner::run(&problem, initial, &config, &mut create_rng(5)).unwrap();
        assert_eq!(result.accepted_moves, 1);
        assert_eq!(result.iterations, 10);
        assert_eq!(result.best.server_of(1), Some(1));
    }

    #[test]
    fn test_all_dead_resets_once_per_iteration() {
        let problem = split_is_dead_problem();
        let initial = routed_initial(&problem);
        assert_eq!(initial.placement(), &[Some(1), Some(1)]);

        let config = AnnealConfig::default()
            .with_initial_temperature(10.0)
            .with_alpha(0.5)
            .with_max_iterations(3);
        let result = AnnealRunner::run(&problem, initial.clone(), &config, &mut create_rng(2))
            .unwrap();
        assert_eq!(result.iterations, 3);
        assert_eq!(result.resets, 3);
        assert_eq!(result.accepted_moves, 0);
        assert_eq!(result.best.placement(), initial.placement());
        // T = T0 / alpha^3, then one cooling step
        assert!((result.final_temperature - 10.0 / 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_cancelled_before_start() {
        let problem = data_problem();
        let initial = routed_initial(&problem);
        let cancel = Arc::new(AtomicBool::new(true));
        let result = AnnealRunner::run_with_cancel(
            &problem,
            initial,
            &AnnealConfig::default(),
            &mut create_rng(0),
            Some(cancel),
        )
        .unwrap();
        assert!(result.cancelled);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let problem = two_server_problem();
        let initial = on_server(&problem, 1);
        let config = AnnealConfig::default().with_alpha(2.0);
        let err = AnnealRunner::run(&problem, initial, &config, &mut create_rng(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_best_is_valid_and_history_non_increasing() {
        let problem = data_problem();
        let initial = routed_initial(&problem);
        let initial_fitness = initial.fitness();
        let config = AnnealConfig::default().with_max_iterations(50);
        let result = AnnealRunner::run(&problem, initial, &config, &mut create_rng(11)).unwrap();

        assert!(result.best.is_valid(&problem));
        assert!(result.best_fitness <= initial_fitness);
        assert!((result.best.fitness() - result.best_fitness).abs() < 1e-9);
        for w in result.fitness_history.windows(2) {
            assert!(w[1] <= w[0]);
        }
    }

    #[test]
    fn test_same_seed_same_result() {
        let problem = data_problem();
        let config = AnnealConfig::default().with_max_iterations(30);
        let a = AnnealRunner::run(
            &problem,
            routed_initial(&problem),
            &config,
            &mut create_rng(42),
        )
        .unwrap();
        let b = AnnealRunner::run(
            &problem,
            routed_initial(&problem),
            &config,
            &mut create_rng(42),
        )
        .unwrap();
        assert_eq!(a.best.placement(), b.best.placement());
        assert_eq!(a.best_fitness, b.best_fitness);
        assert_eq!(a.accepted_moves, b.accepted_moves);
    }

    #[test]
    fn test_observer_sees_every_iteration() {
        struct Count(usize);
        impl SearchObserver for Count {
            fn on_iteration(&mut self, progress: &Progress<'_>) {
                self.0 += 1;
                assert_eq!(progress.iteration, self.0);
            }
        }

        let problem = two_server_problem();
        let initial = on_server(&problem, 1);
        let config = AnnealConfig::default().with_max_iterations(7);
        let mut count = Count(0);
        let result = AnnealRunner::run_observed(
            &problem,
            initial,
            &config,
            &mut create_rng(9),
            None,
            &mut count,
        )
        .unwrap();
        assert_eq!(count.0, result.iterations);
        assert_eq!(count.0, 7);
    }

    #[test]
    fn test_acceptance_probability() {
        assert_eq!(acceptance_probability(1.0, 2.0, 2.0, 10.0), 1.0);
        assert_eq!(acceptance_probability(1.0, f64::NAN, f64::NAN, 10.0), 1.0);
        let p = acceptance_probability(12.0, 10.0, 10.0, 2.0);
        assert!((p - (-1.0f64).exp()).abs() < 1e-12);
        assert_eq!(acceptance_probability(f64::NAN, 10.0, 10.0, 2.0), 0.0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let problem = data_problem();
        let config = AnnealConfig::default().with_max_iterations(20);
        let seq = AnnealRunner::run(
            &problem,
            routed_initial(&problem),
            &config,
            &mut create_rng(8),
        )
        .unwrap();
        let par = AnnealRunner::run(
            &problem,
            routed_initial(&problem),
            &config.clone().with_parallel(true),
            &mut create_rng(8),
        )
        .unwrap();
        assert_eq!(seq.best.placement(), par.best.placement());
        assert_eq!(seq.best_fitness, par.best_fitness);
    }
}
