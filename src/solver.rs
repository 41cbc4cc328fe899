use crate::audit::audit_plan;
use crate::data::{Plan, PlanResult, PlannerConfig, WEDNESDAY};
use crate::validation::MAX_PAIR_HOURS_PER_DAY;
use good_lp::{
    Constraint, Expression, ProblemVariables, Solution, SolverModel, Variable, constraint,
    default_solver, variable,
};
use itertools::iproduct;
use log::{debug, info, warn};
use std::time::{Duration, Instant};

// objective weights
const WEIGHT_SEGMENT: f64 = 10.0;
const WEIGHT_LAST_HOUR: f64 = 1.0;

/// Fixed HiGHS seed used when the configuration carries none.
const DEFAULT_SOLVER_SEED: i32 = 1234;

/// Grid sizes and flat indexing for the decision variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dims {
    pub days: usize,
    pub hours: usize,
    pub classes: usize,
    pub professors: usize,
}

impl Dims {
    fn of(config: &PlannerConfig) -> Self {
        Self {
            days: config.days,
            hours: config.daily_hours,
            classes: config.num_classes,
            professors: config.num_professors,
        }
    }

    /// Index of x[d,h,c,p].
    fn x(&self, d: usize, h: usize, c: usize, p: usize) -> usize {
        ((d * self.hours + h) * self.classes + c) * self.professors + p
    }

    /// Index of z[d,h,p] and s[d,h,p].
    fn slot(&self, d: usize, h: usize, p: usize) -> usize {
        (d * self.hours + h) * self.professors + p
    }
}

/// The whole integer program for one configuration, built up front and
/// handed to the solver in one piece.
///
/// * `x[d,h,c,p]` = 1 if professor p teaches class c at day d, hour h
/// * `z[d,h,p]` = 1 if professor p teaches anything at (d,h)
/// * `s[d,h,p]` = 1 if a work segment of professor p starts at (d,h)
pub struct TimetableModel {
    variables: ProblemVariables,
    dims: Dims,
    x: Vec<Variable>,
    z: Vec<Variable>,
    s: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Expression,
}

impl TimetableModel {
    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn num_variables(&self) -> usize {
        self.x.len() + self.z.len() + self.s.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}

pub fn build_model(config: &PlannerConfig) -> TimetableModel {
    let dims = Dims::of(config);
    info!(
        "Setting up ILP model with {} professors, {} classes, {} days and {} hours per day...",
        dims.professors, dims.classes, dims.days, dims.hours
    );

    let mut variables = ProblemVariables::new();
    let x = variables.add_vector(
        variable().binary(),
        dims.days * dims.hours * dims.classes * dims.professors,
    );
    let z = variables.add_vector(variable().binary(), dims.days * dims.hours * dims.professors);
    let s = variables.add_vector(variable().binary(), dims.days * dims.hours * dims.professors);

    let mut constraints = Vec::new();
    constraints.extend(quota_constraints(config, &dims, &x));
    constraints.extend(class_exclusivity_constraints(&dims, &x));
    constraints.extend(professor_exclusivity_constraints(&dims, &x));
    constraints.extend(availability_constraints(config, &dims, &x));
    constraints.extend(wednesday_constraints(config, &dims, &x));
    constraints.extend(daily_cap_constraints(&dims, &x));
    constraints.extend(adjacency_constraints(&dims, &x));
    constraints.extend(lunch_constraints(config, &dims, &x));
    constraints.extend(segment_constraints(&dims, &x, &z, &s));
    debug!(
        "Model has {} variables and {} constraints.",
        x.len() + z.len() + s.len(),
        constraints.len()
    );

    let objective = objective(&dims, &x, &s);

    TimetableModel {
        variables,
        dims,
        x,
        z,
        s,
        constraints,
        objective,
    }
}

/// Every pair gets exactly its weekly hours.
fn quota_constraints(config: &PlannerConfig, dims: &Dims, x: &[Variable]) -> Vec<Constraint> {
    iproduct!(0..dims.professors, 0..dims.classes)
        .map(|(p, c)| {
            let taught: Expression = iproduct!(0..dims.days, 0..dims.hours)
                .map(|(d, h)| x[dims.x(d, h, c, p)])
                .sum();
            let required = config.hours(p, c) as f64;
            constraint!(taught == required)
        })
        .collect()
}

/// At most one professor per class and slot.
fn class_exclusivity_constraints(dims: &Dims, x: &[Variable]) -> Vec<Constraint> {
    iproduct!(0..dims.days, 0..dims.hours, 0..dims.classes)
        .map(|(d, h, c)| {
            let teachers: Expression = (0..dims.professors).map(|p| x[dims.x(d, h, c, p)]).sum();
            constraint!(teachers <= 1)
        })
        .collect()
}

/// At most one class per professor and slot.
fn professor_exclusivity_constraints(dims: &Dims, x: &[Variable]) -> Vec<Constraint> {
    iproduct!(0..dims.days, 0..dims.hours, 0..dims.professors)
        .map(|(d, h, p)| {
            let lessons: Expression = (0..dims.classes).map(|c| x[dims.x(d, h, c, p)]).sum();
            constraint!(lessons <= 1)
        })
        .collect()
}

fn availability_constraints(config: &PlannerConfig, dims: &Dims, x: &[Variable]) -> Vec<Constraint> {
    let availability = config.half_day_availability();
    iproduct!(0..dims.professors, 0..dims.days, 0..dims.hours)
        .filter(|&(p, d, h)| !availability.is_available(p, d, h))
        .flat_map(|(p, d, h)| (0..dims.classes).map(move |c| (d, h, c, p)))
        .map(|(d, h, c, p)| {
            let lesson = x[dims.x(d, h, c, p)];
            constraint!(lesson == 0)
        })
        .collect()
}

fn wednesday_constraints(config: &PlannerConfig, dims: &Dims, x: &[Variable]) -> Vec<Constraint> {
    if !config.wednesday_afternoon_free || dims.days <= WEDNESDAY {
        return Vec::new();
    }
    iproduct!(config.last_morning_hour..dims.hours, 0..dims.classes, 0..dims.professors)
        .map(|(h, c, p)| {
            let lesson = x[dims.x(WEDNESDAY, h, c, p)];
            constraint!(lesson == 0)
        })
        .collect()
}

/// At most two hours per pair and day.
fn daily_cap_constraints(dims: &Dims, x: &[Variable]) -> Vec<Constraint> {
    let cap = MAX_PAIR_HOURS_PER_DAY as f64;
    iproduct!(0..dims.days, 0..dims.professors, 0..dims.classes)
        .map(|(d, p, c)| {
            let daily: Expression = (0..dims.hours).map(|h| x[dims.x(d, h, c, p)]).sum();
            constraint!(daily <= cap)
        })
        .collect()
}

/// Two hours of the same pair on one day must be adjacent.
fn adjacency_constraints(dims: &Dims, x: &[Variable]) -> Vec<Constraint> {
    iproduct!(0..dims.days, 0..dims.professors, 0..dims.classes, 0..dims.hours)
        .flat_map(|(d, p, c, h1)| ((h1 + 2)..dims.hours).map(move |h2| (d, p, c, h1, h2)))
        .map(|(d, p, c, h1, h2)| {
            let both = x[dims.x(d, h1, c, p)] + x[dims.x(d, h2, c, p)];
            constraint!(both <= 1)
        })
        .collect()
}

/// No pair may hold both the last morning hour and the first afternoon hour.
fn lunch_constraints(config: &PlannerConfig, dims: &Dims, x: &[Variable]) -> Vec<Constraint> {
    let Some(boundary) = config.lunch_boundary() else {
        return Vec::new();
    };
    iproduct!(0..dims.days, 0..dims.classes, 0..dims.professors)
        .map(|(d, c, p)| {
            let across = x[dims.x(d, boundary - 1, c, p)] + x[dims.x(d, boundary, c, p)];
            constraint!(across <= 1)
        })
        .collect()
}

/// Links z to x and s to z:
/// z[d,h,p] = sum_c x[d,h,c,p],
/// s[d,0,p] = z[d,0,p],
/// z[d,h,p] - z[d,h-1,p] <= s[d,h,p] <= z[d,h,p] for h > 0.
fn segment_constraints(dims: &Dims, x: &[Variable], z: &[Variable], s: &[Variable]) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    for (d, p) in iproduct!(0..dims.days, 0..dims.professors) {
        for h in 0..dims.hours {
            let works = z[dims.slot(d, h, p)];
            let start = s[dims.slot(d, h, p)];

            let lessons: Expression = (0..dims.classes).map(|c| x[dims.x(d, h, c, p)]).sum();
            constraints.push(constraint!(lessons == works));

            if h == 0 {
                constraints.push(constraint!(start == works));
            } else {
                let rise = works - z[dims.slot(d, h - 1, p)];
                constraints.push(constraint!(rise <= start));
                constraints.push(constraint!(start <= works));
            }
        }
    }
    constraints
}

/// 10 per work segment plus 1 per lesson in the last hour of the day.
fn objective(dims: &Dims, x: &[Variable], s: &[Variable]) -> Expression {
    let segments: Expression = s.iter().copied().sum();
    let Some(last_hour) = dims.hours.checked_sub(1) else {
        return segments;
    };
    let last_hour_lessons: Expression = iproduct!(0..dims.days, 0..dims.classes, 0..dims.professors)
        .map(|(d, c, p)| x[dims.x(d, last_hour, c, p)])
        .sum();
    WEIGHT_SEGMENT * segments + WEIGHT_LAST_HOUR * last_hour_lessons
}

/// Reads the plan back out of a solution: each cell gets the first professor
/// whose x is set.
fn decode<S: Solution>(dims: &Dims, x: &[Variable], solution: &S) -> Plan {
    let mut plan = Plan::new(dims.days, dims.hours, dims.classes);
    for (d, h, c) in iproduct!(0..dims.days, 0..dims.hours, 0..dims.classes) {
        if let Some(p) = (0..dims.professors).find(|&p| solution.value(x[dims.x(d, h, c, p)]) > 0.5) {
            plan.assign(d, h, c, p);
        }
    }
    plan
}

/// Exact planner: solves the integer program with HiGHS.
pub struct MipPlanner<'a> {
    config: &'a PlannerConfig,
    time_limit: Duration,
}

impl<'a> MipPlanner<'a> {
    pub fn new(config: &'a PlannerConfig, time_limit: Duration) -> Self {
        Self { config, time_limit }
    }

    /// Returns a single optimal (or best-within-time-limit) plan with its
    /// objective value, or an empty result when no feasible plan was found.
    pub fn solve(&self) -> PlanResult {
        let start_time = Instant::now();
        let model = build_model(self.config);
        let TimetableModel {
            variables,
            dims,
            x,
            constraints,
            objective,
            ..
        } = model;

        if x.is_empty() {
            let plan = Plan::new(dims.days, dims.hours, dims.classes);
            return self.accept(plan, 0.0);
        }

        let seed = self
            .config
            .seed
            .map_or(DEFAULT_SOLVER_SEED, |s| (s % i32::MAX as u64) as i32);

        let mut problem = variables
            .minimise(objective.clone())
            .using(default_solver)
            .set_option("threads", 1) // single thread for reproducibility
            .set_option("random_seed", seed)
            .set_option("time_limit", self.time_limit.as_secs_f64())
            .set_option("log_to_console", "false");
        for constraint in constraints {
            problem.add_constraint(constraint);
        }

        info!("Starting ILP solver with a {:.0?} time limit...", self.time_limit);
        let solution = match problem.solve() {
            Ok(s) => s,
            Err(e) => {
                info!("No solution found: {}", e);
                return PlanResult::empty();
            }
        };
        info!("Solver finished in {:.2?}", start_time.elapsed());

        let plan = decode(&dims, &x, &solution);
        let score = solution.eval(objective);
        self.accept(plan, score)
    }

    // a time-limited run without an incumbent still reports values; only keep
    // plans that pass every hard constraint
    fn accept(&self, plan: Plan, score: f64) -> PlanResult {
        let violations = audit_plan(self.config, &plan);
        if let Some(first) = violations.first() {
            warn!(
                "Solver returned no usable incumbent ({} violations, first: {})",
                violations.len(),
                first
            );
            return PlanResult::empty();
        }
        PlanResult::single(plan, score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Availability;

    fn sample_config() -> PlannerConfig {
        let mut config = PlannerConfig::new(5, 6, vec![vec![4, 3], vec![2, 3], vec![3, 2]]);
        config.last_morning_hour = 3;
        config.wednesday_afternoon_free = true;
        config
    }

    fn solve(config: &PlannerConfig) -> PlanResult {
        MipPlanner::new(config, Duration::from_secs(30)).solve()
    }

    #[test]
    fn test_constraint_families() {
        let config = sample_config();
        let dims = Dims::of(&config);
        let mut variables = ProblemVariables::new();
        let x = variables.add_vector(variable().binary(), 5 * 6 * 2 * 3);

        assert_eq!(quota_constraints(&config, &dims, &x).len(), 6);
        assert_eq!(class_exclusivity_constraints(&dims, &x).len(), 60);
        assert_eq!(professor_exclusivity_constraints(&dims, &x).len(), 90);
        assert!(availability_constraints(&config, &dims, &x).is_empty());
        // hours 3..6 on day 2, 2 classes, 3 professors
        assert_eq!(wednesday_constraints(&config, &dims, &x).len(), 18);
        assert_eq!(daily_cap_constraints(&dims, &x).len(), 30);
        // 10 non-adjacent hour pairs in a 6-hour day
        assert_eq!(adjacency_constraints(&dims, &x).len(), 15 * 2 * 10);
        assert_eq!(lunch_constraints(&config, &dims, &x).len(), 30);
    }

    #[test]
    fn test_model_size() {
        let config = sample_config();
        let model = build_model(&config);
        assert_eq!(model.dims().professors, 3);
        assert_eq!(model.num_variables(), 180 + 90 + 90);
        // z links: 90, s links: 15 * (1 + 2 * 5)
        let expected = 6 + 60 + 90 + 18 + 30 + 300 + 30 + 90 + 165;
        assert_eq!(model.num_constraints(), expected);
    }

    #[test]
    fn test_partial_availability_constraints() {
        let mut config = sample_config();
        config.availability = Some(Availability::HalfDaily(vec![
            vec![vec![true, false], vec![true, true], vec![true, true], vec![true, true], vec![true, true]],
            vec![vec![true, true]; 5],
            vec![vec![true, true]; 5],
        ]));
        let dims = Dims::of(&config);
        let mut variables = ProblemVariables::new();
        let x = variables.add_vector(variable().binary(), 5 * 6 * 2 * 3);
        // professor 0, day 0, afternoon hours 3..6, both classes
        assert_eq!(availability_constraints(&config, &dims, &x).len(), 6);
    }

    #[test]
    fn test_lunch_constraint_skipped_without_afternoon() {
        let mut config = sample_config();
        config.last_morning_hour = 6;
        config.wednesday_afternoon_free = false;
        let dims = Dims::of(&config);
        let mut variables = ProblemVariables::new();
        let x = variables.add_vector(variable().binary(), 5 * 6 * 2 * 3);
        assert!(lunch_constraints(&config, &dims, &x).is_empty());
        assert!(wednesday_constraints(&config, &dims, &x).is_empty());
    }

    #[test]
    fn test_accept_rejects_plan_breaking_hard_constraints() {
        let mut config = PlannerConfig::new(1, 4, vec![vec![1, 1]]);
        config.last_morning_hour = 2;
        let planner = MipPlanner::new(&config, Duration::from_secs(1));

        // quotas are met but the professor is in both classes at once
        let mut clashing = Plan::new(1, 4, 2);
        clashing.assign(0, 0, 0, 0);
        clashing.assign(0, 0, 1, 0);
        assert!(planner.accept(clashing, 0.0).is_empty());

        let mut fine = Plan::new(1, 4, 2);
        fine.assign(0, 0, 0, 0);
        fine.assign(0, 1, 1, 0);
        assert_eq!(planner.accept(fine, 10.0).scores, vec![10.0]);
    }

    #[test]
    fn test_sample_scenario() {
        let config = sample_config();
        let result = solve(&config);
        assert_eq!(result.len(), 1);
        let (plan, score) = result.best().unwrap();

        for h in 3..6 {
            for c in 0..2 {
                assert_eq!(plan.get(2, h, c), 0);
            }
        }
        assert_eq!(plan.professor_load(0), 7);
        assert_eq!(plan.professor_load(1), 5);
        assert_eq!(plan.professor_load(2), 5);
        assert!(audit_plan(&config, plan).is_empty());
        assert!(score > 0.0);
    }

    #[test]
    fn test_all_zero_hours() {
        let config = PlannerConfig::new(5, 6, vec![vec![0, 0], vec![0, 0]]);
        let result = solve(&config);
        assert_eq!(result.len(), 1);
        assert!(result.plans[0].is_blank());
        assert!(result.scores[0].abs() < 1e-9);
    }

    #[test]
    fn test_infeasible_returns_empty() {
        let mut config = sample_config();
        config.availability = Some(Availability::Daily(vec![
            vec![false; 5],
            vec![true; 5],
            vec![true; 5],
        ]));
        let result = solve(&config);
        assert!(result.is_empty());
        assert!(result.scores.is_empty());
    }

    #[test]
    fn test_availability_respected() {
        let mut config = PlannerConfig::new(3, 4, vec![vec![2, 1]]);
        config.last_morning_hour = 2;
        config.availability = Some(Availability::HalfDaily(vec![vec![
            vec![false, false],
            vec![true, false],
            vec![false, true],
        ]]));
        let result = solve(&config);
        let (plan, _) = result.best().unwrap();
        assert!(audit_plan(&config, plan).is_empty());
        assert_eq!(plan.count_for(0, 0), 2);
        assert_eq!(plan.count_for(0, 1), 1);
    }
}
