use crate::data::{PlanResult, PlannerConfig};
use crate::planner::RandomPlanner;
use crate::solver::MipPlanner;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which planner to run, selectable by name. Names are read through
/// [`FromStr`] on the wire as well, so they are case-insensitive everywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", rename_all = "lowercase")]
pub enum Method {
    Heuristic,
    #[default]
    Exact,
}

impl TryFrom<String> for Method {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" | "random" => Ok(Method::Heuristic),
            "exact" | "mip" => Ok(Method::Exact),
            other => Err(format!("unknown planning method '{}'", other)),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Heuristic => write!(f, "heuristic"),
            Method::Exact => write!(f, "exact"),
        }
    }
}

/// Budgets and targets for both planners.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions {
    /// The heuristic stops as soon as a plan scores at most this.
    pub target_score: f64,
    pub heuristic_time_limit: Duration,
    pub exact_time_limit: Duration,
    /// Batch mode: plans to keep and constructions to try.
    pub variants: usize,
    pub max_global_tries: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            target_score: 0.1,
            heuristic_time_limit: Duration::from_secs(10),
            exact_time_limit: Duration::from_secs(60),
            variants: 3,
            max_global_tries: 50,
        }
    }
}

impl SolveOptions {
    /// Overrides the time limit used by `method`.
    pub fn with_time_limit(mut self, method: Method, limit: Duration) -> Self {
        match method {
            Method::Heuristic => self.heuristic_time_limit = limit,
            Method::Exact => self.exact_time_limit = limit,
        }
        self
    }
}

/// A planner that turns a configuration into ranked candidate plans.
pub trait Strategy {
    fn solve(&self, config: &PlannerConfig) -> PlanResult;
}

/// Randomized construction until a deadline or a good enough score.
pub struct HeuristicStrategy {
    pub target_score: f64,
    pub time_limit: Duration,
}

impl Strategy for HeuristicStrategy {
    fn solve(&self, config: &PlannerConfig) -> PlanResult {
        RandomPlanner::new(config).generate_until(self.target_score, self.time_limit)
    }
}

/// Randomized construction of a fixed number of variants.
pub struct BatchHeuristicStrategy {
    pub variants: usize,
    pub max_global_tries: usize,
}

impl Strategy for BatchHeuristicStrategy {
    fn solve(&self, config: &PlannerConfig) -> PlanResult {
        RandomPlanner::new(config).generate_plans(self.variants, self.max_global_tries)
    }
}

/// Integer program solved with HiGHS.
pub struct ExactStrategy {
    pub time_limit: Duration,
}

impl Strategy for ExactStrategy {
    fn solve(&self, config: &PlannerConfig) -> PlanResult {
        MipPlanner::new(config, self.time_limit).solve()
    }
}

impl Method {
    pub fn strategy(self, options: &SolveOptions) -> Box<dyn Strategy> {
        match self {
            Method::Heuristic => Box::new(HeuristicStrategy {
                target_score: options.target_score,
                time_limit: options.heuristic_time_limit,
            }),
            Method::Exact => Box::new(ExactStrategy {
                time_limit: options.exact_time_limit,
            }),
        }
    }
}

/// Runs the planner named by `method`.
pub fn solve(config: &PlannerConfig, method: Method, options: &SolveOptions) -> PlanResult {
    info!("Planning with the {} method", method);
    let result = method.strategy(options).solve(config);
    info!("{} method returned {} plan(s)", method, result.len());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::audit_plan;

    fn sample_config() -> PlannerConfig {
        let mut config = PlannerConfig::new(5, 6, vec![vec![4, 3], vec![2, 3], vec![3, 2]]);
        config.last_morning_hour = 3;
        config.wednesday_afternoon_free = true;
        config.seed = Some(2024);
        config
    }

    #[test]
    fn test_method_names() {
        assert_eq!("random".parse::<Method>().unwrap(), Method::Heuristic);
        assert_eq!("Heuristic".parse::<Method>().unwrap(), Method::Heuristic);
        assert_eq!("mip".parse::<Method>().unwrap(), Method::Exact);
        assert!("greedy".parse::<Method>().is_err());

        let parsed: Method = serde_json::from_str("\"random\"").unwrap();
        assert_eq!(parsed, Method::Heuristic);
        let parsed: Method = serde_json::from_str("\"MIP\"").unwrap();
        assert_eq!(parsed, Method::Exact);
        let parsed: Method = serde_json::from_str("\"Random\"").unwrap();
        assert_eq!(parsed, Method::Heuristic);
        assert!(serde_json::from_str::<Method>("\"greedy\"").is_err());
        assert_eq!(serde_json::to_string(&Method::Exact).unwrap(), "\"exact\"");
        assert_eq!(Method::default(), Method::Exact);
    }

    #[test]
    fn test_time_limit_override() {
        let options = SolveOptions::default().with_time_limit(Method::Heuristic, Duration::from_secs(2));
        assert_eq!(options.heuristic_time_limit, Duration::from_secs(2));
        assert_eq!(options.exact_time_limit, Duration::from_secs(60));
    }

    #[test]
    fn test_both_methods_give_valid_plans() {
        let config = sample_config();
        let options = SolveOptions {
            heuristic_time_limit: Duration::from_millis(300),
            exact_time_limit: Duration::from_secs(30),
            ..SolveOptions::default()
        };
        for method in [Method::Heuristic, Method::Exact] {
            let result = solve(&config, method, &options);
            assert_eq!(result.len(), 1, "{} found no plan", method);
            assert!(audit_plan(&config, &result.plans[0]).is_empty());
        }
    }

    #[test]
    fn test_batch_strategy_sorted() {
        let config = sample_config();
        let batch = BatchHeuristicStrategy {
            variants: 4,
            max_global_tries: 40,
        };
        let result = batch.solve(&config);
        assert!(!result.is_empty());
        assert!(result.scores.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_degenerate_config_agrees() {
        let config = PlannerConfig::new(5, 6, vec![vec![0, 0], vec![0, 0], vec![0, 0]]);
        let options = SolveOptions::default();
        for method in [Method::Heuristic, Method::Exact] {
            let result = solve(&config, method, &options);
            assert_eq!(result.len(), 1);
            assert!(result.plans[0].is_blank());
            assert!(result.scores[0].abs() < 1e-9);
        }
    }
}
