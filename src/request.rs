//! Raw request input and its conversion into a [`PlannerConfig`].

use crate::data::{Availability, Plan, PlannerConfig};
use crate::strategy::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Availability exactly as it arrives on the wire. Anything that is not a
/// rank-2 or rank-3 boolean grid lands in `Malformed`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawAvailability {
    HalfDaily(Vec<Vec<Vec<bool>>>),
    Daily(Vec<Vec<bool>>),
    Malformed(serde_json::Value),
}

/// A scheduling request as received from a client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlannerRequest {
    pub days: usize,
    pub daily_hours: usize,
    #[serde(default)]
    pub num_professors: Option<usize>,
    #[serde(default)]
    pub num_classes: Option<usize>,
    #[serde(default)]
    pub class_names: Option<Vec<String>>,
    #[serde(default)]
    pub professor_names: Option<Vec<String>>,
    #[serde(default)]
    pub hour_names: Option<Vec<String>>,
    /// `hours_matrix[p][c]`
    pub hours_matrix: Vec<Vec<i64>>,
    #[serde(default)]
    pub availability: Option<RawAvailability>,
    #[serde(default)]
    pub wednesday_afternoon_free: bool,
    #[serde(default = "default_last_morning_hour")]
    pub last_morning_hour: usize,
    #[serde(default)]
    pub method: Method,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub time_limit_secs: Option<f64>,
    /// A previously generated plan to check instead of solving again.
    #[serde(default)]
    pub plan: Option<Plan>,
}

fn default_last_morning_hour() -> usize {
    3
}

/// Input whose dimensions disagree with the declared counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputShapeError {
    HoursMatrix {
        expected: (usize, usize),
        found: (usize, usize),
    },
    Availability {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    AvailabilityRank,
    Plan {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },
}

impl fmt::Display for InputShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputShapeError::HoursMatrix { expected, found } => write!(
                f,
                "wrong hours_matrix shape: expected {:?}, found {:?}",
                expected, found
            ),
            InputShapeError::Availability { expected, found } => write!(
                f,
                "wrong availability shape: expected {:?}, found {:?}",
                expected, found
            ),
            InputShapeError::AvailabilityRank => {
                write!(f, "availability must be a 2D or 3D grid of booleans")
            }
            InputShapeError::Plan { expected, found } => write!(
                f,
                "wrong plan shape: expected {:?}, found {:?}",
                expected, found
            ),
        }
    }
}

impl std::error::Error for InputShapeError {}

impl PlannerRequest {
    /// Professor count: explicit, else from the names, else from the matrix rows.
    pub fn professor_count(&self) -> usize {
        self.num_professors
            .or(self.professor_names.as_ref().map(Vec::len))
            .unwrap_or(self.hours_matrix.len())
    }

    /// Class count: explicit, else from the names, else from the first matrix row.
    pub fn class_count(&self) -> usize {
        self.num_classes
            .or(self.class_names.as_ref().map(Vec::len))
            .unwrap_or_else(|| self.hours_matrix.first().map_or(0, Vec::len))
    }
}

/// Turns a request into a configuration, rejecting any matrix whose shape
/// disagrees with the professor/class counts.
pub fn build_config(req: &PlannerRequest) -> Result<PlannerConfig, InputShapeError> {
    let n = req.professor_count();
    let m = req.class_count();

    let rows = req.hours_matrix.len();
    if let Some(bad) = req.hours_matrix.iter().find(|row| row.len() != m) {
        return Err(InputShapeError::HoursMatrix {
            expected: (n, m),
            found: (rows, bad.len()),
        });
    }
    if rows != n {
        return Err(InputShapeError::HoursMatrix {
            expected: (n, m),
            found: (rows, m),
        });
    }

    let availability = req
        .availability
        .as_ref()
        .map(|raw| checked_availability(raw, n, req.days))
        .transpose()?;

    Ok(PlannerConfig {
        days: req.days,
        daily_hours: req.daily_hours,
        num_professors: n,
        num_classes: m,
        hours_matrix: req.hours_matrix.clone(),
        availability,
        last_morning_hour: req.last_morning_hour,
        wednesday_afternoon_free: req.wednesday_afternoon_free,
        class_names: req.class_names.clone(),
        professor_names: req.professor_names.clone(),
        hour_names: req.hour_names.clone(),
        seed: req.seed,
    })
}

fn checked_availability(
    raw: &RawAvailability,
    professors: usize,
    days: usize,
) -> Result<Availability, InputShapeError> {
    match raw {
        RawAvailability::Daily(grid) => {
            if let Some(found) = mismatch(grid.len(), grid.iter().map(Vec::len), professors, days) {
                return Err(InputShapeError::Availability {
                    expected: vec![professors, days],
                    found,
                });
            }
            Ok(Availability::Daily(grid.clone()))
        }
        RawAvailability::HalfDaily(grid) => {
            if let Some(found) = mismatch(grid.len(), grid.iter().map(Vec::len), professors, days) {
                return Err(InputShapeError::Availability {
                    expected: vec![professors, days, 2],
                    found: vec![found[0], found[1], 2],
                });
            }
            if let Some(halves) = grid.iter().flatten().find(|h| h.len() != 2) {
                return Err(InputShapeError::Availability {
                    expected: vec![professors, days, 2],
                    found: vec![professors, days, halves.len()],
                });
            }
            Ok(Availability::HalfDaily(grid.clone()))
        }
        RawAvailability::Malformed(_) => Err(InputShapeError::AvailabilityRank),
    }
}

// first (rows, cols) that disagrees with the expected shape
fn mismatch(
    rows: usize,
    mut cols: impl Iterator<Item = usize>,
    expected_rows: usize,
    expected_cols: usize,
) -> Option<Vec<usize>> {
    if rows != expected_rows {
        return Some(vec![rows, expected_cols]);
    }
    cols.find(|&len| len != expected_cols)
        .map(|len| vec![rows, len])
}

/// Checks that a reused plan fits the configuration's grid.
pub fn checked_plan(config: &PlannerConfig, plan: &Plan) -> Result<(), InputShapeError> {
    let expected = (config.days, config.daily_hours, config.num_classes);
    if plan.shape() != expected {
        return Err(InputShapeError::Plan {
            expected,
            found: plan.shape(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> PlannerRequest {
        serde_json::from_value(value).unwrap()
    }

    fn sample() -> serde_json::Value {
        json!({
            "days": 5,
            "daily_hours": 6,
            "class_names": ["1A", "1B"],
            "professor_names": ["Prof A", "Prof B", "Prof C"],
            "hours_matrix": [[4, 3], [2, 3], [3, 2]],
            "wednesday_afternoon_free": true
        })
    }

    #[test]
    fn test_build_config_defaults() {
        let config = build_config(&request(sample())).unwrap();
        assert_eq!(config.num_professors, 3);
        assert_eq!(config.num_classes, 2);
        assert_eq!(config.last_morning_hour, 3);
        assert!(config.availability.is_none());
        assert!(config.wednesday_afternoon_free);
    }

    #[test]
    fn test_counts_from_matrix_without_names() {
        let req = request(json!({
            "days": 5,
            "daily_hours": 6,
            "hours_matrix": [[1, 2, 3], [0, 0, 1]]
        }));
        let config = build_config(&req).unwrap();
        assert_eq!((config.num_professors, config.num_classes), (2, 3));
    }

    #[test]
    fn test_extra_row_rejected() {
        let mut value = sample();
        value["hours_matrix"] = json!([[4, 3], [2, 3], [3, 2], [1, 1]]);
        let err = build_config(&request(value)).unwrap_err();
        assert_eq!(
            err,
            InputShapeError::HoursMatrix {
                expected: (3, 2),
                found: (4, 2)
            }
        );
    }

    #[test]
    fn test_short_row_rejected() {
        let mut value = sample();
        value["hours_matrix"] = json!([[4, 3], [2], [3, 2]]);
        let err = build_config(&request(value)).unwrap_err();
        assert!(err.to_string().contains("hours_matrix"));
    }

    #[test]
    fn test_daily_availability_kept_and_checked() {
        let mut value = sample();
        let open = vec![true; 5];
        value["availability"] = json!([open, open, [false, true, true, true, true]]);
        let config = build_config(&request(value.clone())).unwrap();
        assert!(matches!(config.availability, Some(Availability::Daily(_))));
        assert!(!config.half_day_availability().is_available(2, 0, 4));

        value["availability"] = json!(vec![vec![true; 4]; 3]);
        let err = build_config(&request(value)).unwrap_err();
        assert_eq!(
            err,
            InputShapeError::Availability {
                expected: vec![3, 5],
                found: vec![3, 4]
            }
        );
    }

    #[test]
    fn test_half_day_availability_shape() {
        let mut value = sample();
        let mornings = vec![[true, false]; 5];
        let full = vec![[true, true]; 5];
        value["availability"] = json!([mornings, full, full]);
        let config = build_config(&request(value.clone())).unwrap();
        assert!(!config.half_day_availability().is_available(0, 1, 3));

        value["availability"] = json!(vec![vec![[true, true, true]; 5]; 3]);
        assert!(build_config(&request(value)).is_err());
    }

    #[test]
    fn test_bad_availability_rank() {
        let mut value = sample();
        value["availability"] = json!([true, false, true]);
        let err = build_config(&request(value)).unwrap_err();
        assert_eq!(err, InputShapeError::AvailabilityRank);
    }

    #[test]
    fn test_plan_shape_check() {
        let config = build_config(&request(sample())).unwrap();
        assert!(checked_plan(&config, &Plan::new(5, 6, 2)).is_ok());
        assert!(checked_plan(&config, &Plan::new(5, 5, 2)).is_err());
    }
}
