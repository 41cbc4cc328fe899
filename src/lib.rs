//! Weekly timetable planning for schools.
//!
//! A [`PlannerConfig`] describes the week (days, hours per day), how many
//! hours each professor teaches each class, and when professors are
//! available. Two planners turn it into a [`Plan`]:
//!
//! * [`planner::RandomPlanner`] places 1- and 2-hour blocks at random and
//!   keeps the most compact result.
//! * [`solver::MipPlanner`] solves the equivalent integer program with HiGHS.
//!
//! Run [`validate_config`] first; both planners assume a valid configuration
//! and report infeasibility as an empty [`PlanResult`].

pub mod audit;
pub mod data;
pub mod planner;
pub mod request;
pub mod solver;
pub mod strategy;
pub mod validation;

pub use data::{Availability, Plan, PlanResult, PlannerConfig};
pub use request::{InputShapeError, PlannerRequest, build_config};
pub use strategy::{Method, SolveOptions, Strategy, solve};
pub use validation::validate_config;
