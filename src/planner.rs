//! Randomized constructive planner.
//!
//! Each (professor, class) pair is cut into blocks of two consecutive hours
//! plus at most one single hour. The blocks of all pairs are shuffled and
//! placed one by one at random free slots; a block that cannot be placed
//! within [`PLACEMENT_ATTEMPTS`] draws fails the whole construction and the
//! caller starts again from an empty plan.

use crate::audit::quota_mismatches;
use crate::data::{ClassId, Day, HalfDayAvailability, Hour, Plan, PlanResult, PlannerConfig, ProfessorId};
use itertools::Itertools;
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::time::{Duration, Instant};

/// Random draws per block before the construction gives up.
pub const PLACEMENT_ATTEMPTS: usize = 300;

// score weights
const WEIGHT_GAP: f64 = 1.0;
const WEIGHT_SEGMENT: f64 = 0.01;
const WEIGHT_LUNCH_CROSS: f64 = 0.0001;

/// One unit of work: one or two consecutive hours of `professor` with `class` on the same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub professor: ProfessorId,
    pub class: ClassId,
    pub size: usize,
}

/// A block that found no free slot; the partial plan is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructionFailure {
    pub block: Block,
}

impl fmt::Display for ConstructionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not place a {}-hour block for professor {} / class {}",
            self.block.size,
            self.block.professor + 1,
            self.block.class + 1
        )
    }
}

/// Splits every pair's weekly hours into 2-hour blocks and an optional 1-hour block.
pub fn blocks_for(config: &PlannerConfig) -> Vec<Block> {
    let mut blocks = Vec::new();
    for (professor, class) in (0..config.num_professors).cartesian_product(0..config.num_classes) {
        let total = config.required_hours(professor, class);
        let block = |size| Block { professor, class, size };
        blocks.extend(std::iter::repeat_n(block(2), total / 2));
        if total % 2 == 1 {
            blocks.push(block(1));
        }
    }
    blocks
}

/// Compactness penalty of a plan, lower is better.
///
/// For every professor and day with at least two worked hours: 1.0 per idle
/// hour between the first and last lesson, 0.01 per extra contiguous segment
/// and 0.0001 per consecutive pair of lessons separated by lunch.
pub fn compactness_score(config: &PlannerConfig, plan: &Plan) -> f64 {
    let (days, daily_hours, _) = plan.shape();
    let mut score = 0.0;

    for professor in 0..config.num_professors {
        for day in 0..days {
            let worked: Vec<Hour> = (0..daily_hours)
                .filter(|&h| plan.teaches_at(day, h, professor))
                .collect();
            let (Some(&first), Some(&last)) = (worked.first(), worked.last()) else {
                continue;
            };
            if worked.len() <= 1 {
                continue;
            }

            let gaps = (last - first + 1) - worked.len();
            let breaks = worked.iter().tuple_windows().filter(|&(a, b)| *b > a + 1).count();
            let lunch_crossings = worked
                .iter()
                .tuple_windows()
                .filter(|&(a, b)| *a < config.last_morning_hour && config.last_morning_hour <= *b)
                .count();

            score += WEIGHT_GAP * gaps as f64
                + WEIGHT_SEGMENT * breaks as f64
                + WEIGHT_LUNCH_CROSS * lunch_crossings as f64;
        }
    }
    score
}

/// Builds plans by random block placement. Owns its random source, so two
/// planners never share state.
pub struct RandomPlanner<'a, R = StdRng> {
    config: &'a PlannerConfig,
    availability: HalfDayAvailability,
    rng: R,
}

impl<'a> RandomPlanner<'a, StdRng> {
    /// Seeds from `config.seed` when present, otherwise from the OS.
    pub fn new(config: &'a PlannerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(config, rng)
    }
}

impl<'a, R: Rng> RandomPlanner<'a, R> {
    pub fn with_rng(config: &'a PlannerConfig, rng: R) -> Self {
        Self {
            config,
            availability: config.half_day_availability(),
            rng,
        }
    }

    /// One full construction attempt from an empty plan.
    pub fn build_plan(&mut self) -> Result<Plan, ConstructionFailure> {
        let config = self.config;
        let mut plan = Plan::new(config.days, config.daily_hours, config.num_classes);

        let mut blocks = blocks_for(config);
        blocks.shuffle(&mut self.rng);

        for block in blocks {
            let placed = match block.size {
                1 => self.place_single(&mut plan, block),
                _ => self.place_double(&mut plan, block),
            };
            if !placed {
                return Err(ConstructionFailure { block });
            }
        }
        Ok(plan)
    }

    fn place_single(&mut self, plan: &mut Plan, block: Block) -> bool {
        let config = self.config;
        if config.days == 0 || config.daily_hours == 0 {
            return false;
        }
        let Block { professor, class, .. } = block;

        for _ in 0..PLACEMENT_ATTEMPTS {
            let day = self.rng.random_range(0..config.days);
            let hour = self.rng.random_range(0..config.daily_hours);

            if config.is_wednesday_afternoon(day, hour)
                || !self.availability.is_available(professor, day, hour)
                || plan.get(day, hour, class) != 0
                || plan.teaches_at(day, hour, professor)
                || plan.hours_for(day, professor, class).len() >= 2
            {
                continue;
            }

            plan.assign(day, hour, class, professor);
            return true;
        }
        false
    }

    fn place_double(&mut self, plan: &mut Plan, block: Block) -> bool {
        let config = self.config;
        if config.days == 0 || config.daily_hours < 2 {
            return false;
        }
        let Block { professor, class, .. } = block;

        for _ in 0..PLACEMENT_ATTEMPTS {
            let day = self.rng.random_range(0..config.days);
            let first = self.rng.random_range(0..config.daily_hours - 1);
            let hours = [first, first + 1];

            if config.lunch_boundary() == Some(first + 1) {
                continue;
            }
            let current: &Plan = plan;
            if hours.iter().any(|&h| !self.slot_open(current, professor, class, day, h)) {
                continue;
            }
            // never add to a day the pair already uses
            if !plan.hours_for(day, professor, class).is_empty() {
                continue;
            }

            for h in hours {
                plan.assign(day, h, class, professor);
            }
            return true;
        }
        false
    }

    fn slot_open(&self, plan: &Plan, professor: ProfessorId, class: ClassId, day: Day, hour: Hour) -> bool {
        !self.config.is_wednesday_afternoon(day, hour)
            && self.availability.is_available(professor, day, hour)
            && plan.get(day, hour, class) == 0
            && !plan.teaches_at(day, hour, professor)
    }

    /// Builds a plan and keeps it only if every pair got exactly its hours.
    fn attempt(&mut self) -> Option<Plan> {
        match self.build_plan() {
            Ok(plan) => {
                let mismatches = quota_mismatches(self.config, &plan);
                if mismatches.is_empty() {
                    Some(plan)
                } else {
                    warn!("Discarding constructed plan: {}", mismatches[0]);
                    None
                }
            }
            Err(failure) => {
                trace!("Construction failed: {}", failure);
                None
            }
        }
    }

    /// Up to `max_global_tries` constructions, keeping at most `num_variants`
    /// plans, best first.
    pub fn generate_plans(&mut self, num_variants: usize, max_global_tries: usize) -> PlanResult {
        let mut scored = Vec::new();
        let mut tries = 0;

        while scored.len() < num_variants && tries < max_global_tries {
            tries += 1;
            if let Some(plan) = self.attempt() {
                let score = compactness_score(self.config, &plan);
                debug!("Plan {} found on try {} with score {:.4}", scored.len() + 1, tries, score);
                scored.push((plan, score));
            }
        }

        info!("Random planner kept {} plan(s) out of {} tries.", scored.len(), tries);
        PlanResult::ranked(scored)
    }

    /// Keeps constructing until `time_limit` has elapsed or a plan scores at
    /// most `target_score`, and returns the best plan seen. The clock is only
    /// checked between constructions.
    pub fn generate_until(&mut self, target_score: f64, time_limit: Duration) -> PlanResult {
        let start = Instant::now();
        let mut best: Option<(Plan, f64)> = None;
        let mut attempts = 0usize;

        while start.elapsed() < time_limit {
            attempts += 1;
            let Some(plan) = self.attempt() else {
                continue;
            };
            let score = compactness_score(self.config, &plan);
            if best.as_ref().is_none_or(|(_, best_score)| score < *best_score) {
                debug!("New best score {:.4} (attempt {})", score, attempts);
                best = Some((plan, score));
                if score <= target_score {
                    break;
                }
            }
        }

        info!(
            "Random planner stopped after {} attempts in {:.2?}",
            attempts,
            start.elapsed()
        );
        match best {
            Some((plan, score)) => PlanResult::single(plan, score),
            None => PlanResult::empty(),
        }
    }
}
