use crate::data::{ClassId, Plan, PlannerConfig, ProfessorId};
use itertools::Itertools;
use std::fmt;

/// A (professor, class) pair whose assigned hours differ from the hours matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaMismatch {
    pub professor: ProfessorId,
    pub class: ClassId,
    pub expected: i64,
    pub found: usize,
}

impl fmt::Display for QuotaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Professor {} / class {}: expected {} hours, found {}.",
            self.professor + 1,
            self.class + 1,
            self.expected,
            self.found
        )
    }
}

/// Compares per-pair totals in `plan` with the hours matrix.
pub fn quota_mismatches(config: &PlannerConfig, plan: &Plan) -> Vec<QuotaMismatch> {
    (0..config.num_professors)
        .cartesian_product(0..config.num_classes)
        .filter_map(|(p, c)| {
            let found = plan.count_for(p, c);
            let expected = config.hours(p, c);
            (found as i64 != expected).then_some(QuotaMismatch {
                professor: p,
                class: c,
                expected,
                found,
            })
        })
        .collect()
}

/// Checks a finished plan against every hard constraint and returns one
/// message per violation found. A plan of the wrong shape yields a single
/// message and no further checks.
pub fn audit_plan(config: &PlannerConfig, plan: &Plan) -> Vec<String> {
    let expected = (config.days, config.daily_hours, config.num_classes);
    if plan.shape() != expected {
        return vec![format!(
            "Plan shape {:?} does not match {:?}.",
            plan.shape(),
            expected
        )];
    }

    let mut violations = Vec::new();
    let availability = config.half_day_availability();

    for d in 0..config.days {
        for h in 0..config.daily_hours {
            for c in 0..config.num_classes {
                let Some(p) = plan.professor_at(d, h, c) else {
                    continue;
                };
                if p >= config.num_professors {
                    violations.push(format!(
                        "Day {} hour {} class {}: unknown professor {}.",
                        d,
                        h,
                        c + 1,
                        p + 1
                    ));
                    continue;
                }
                if !availability.is_available(p, d, h) {
                    violations.push(format!(
                        "Professor {} is unavailable on day {} hour {}.",
                        p + 1,
                        d,
                        h
                    ));
                }
                if config.is_wednesday_afternoon(d, h) {
                    violations.push(format!(
                        "Lesson on the free Wednesday afternoon (hour {}, class {}).",
                        h,
                        c + 1
                    ));
                }
            }
            for p in 0..config.num_professors {
                let tag = p as u32 + 1;
                let classes = (0..config.num_classes)
                    .filter(|&c| plan.get(d, h, c) == tag)
                    .count();
                if classes > 1 {
                    violations.push(format!(
                        "Professor {} teaches {} classes at once on day {} hour {}.",
                        p + 1,
                        classes,
                        d,
                        h
                    ));
                }
            }
        }
    }

    for d in 0..config.days {
        for (p, c) in (0..config.num_professors).cartesian_product(0..config.num_classes) {
            let hours = plan.hours_for(d, p, c);
            match hours.as_slice() {
                [] | [_] => {}
                &[first, second] => {
                    if second != first + 1 {
                        violations.push(format!(
                            "Professor {} / class {} on day {}: hours {} and {} are not adjacent.",
                            p + 1,
                            c + 1,
                            d,
                            first,
                            second
                        ));
                    } else if config.lunch_boundary() == Some(second) {
                        violations.push(format!(
                            "Professor {} / class {} on day {}: block straddles lunch.",
                            p + 1,
                            c + 1,
                            d
                        ));
                    }
                }
                _ => violations.push(format!(
                    "Professor {} / class {} on day {}: {} hours, at most 2 allowed.",
                    p + 1,
                    c + 1,
                    d,
                    hours.len()
                )),
            }
        }
    }

    violations.extend(quota_mismatches(config, plan).iter().map(ToString::to_string));
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PlannerConfig {
        let mut config = PlannerConfig::new(3, 4, vec![vec![2, 0], vec![0, 1]]);
        config.last_morning_hour = 2;
        config.wednesday_afternoon_free = true;
        config
    }

    #[test]
    fn test_clean_plan() {
        let config = config();
        let mut plan = Plan::new(3, 4, 2);
        plan.assign(0, 0, 0, 0);
        plan.assign(0, 1, 0, 0);
        plan.assign(2, 1, 1, 1);
        assert!(audit_plan(&config, &plan).is_empty());
    }

    #[test]
    fn test_quota_mismatch_reported() {
        let config = config();
        let plan = Plan::new(3, 4, 2);
        let mismatches = quota_mismatches(&config, &plan);
        assert_eq!(mismatches.len(), 2);
        assert_eq!(mismatches[0].expected, 2);
        assert_eq!(mismatches[0].found, 0);
    }

    #[test]
    fn test_split_and_straddling_blocks() {
        let config = config();
        let mut plan = Plan::new(3, 4, 2);
        plan.assign(0, 0, 0, 0);
        plan.assign(0, 2, 0, 0);
        plan.assign(1, 1, 1, 1);
        let violations = audit_plan(&config, &plan);
        assert!(violations.iter().any(|v| v.contains("not adjacent")));

        let mut plan = Plan::new(3, 4, 2);
        plan.assign(0, 1, 0, 0);
        plan.assign(0, 2, 0, 0);
        plan.assign(1, 1, 1, 1);
        let violations = audit_plan(&config, &plan);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("straddles lunch"));
    }

    #[test]
    fn test_wednesday_and_double_booking() {
        let mut config = config();
        config.hours_matrix = vec![vec![1, 1], vec![0, 0]];
        let mut plan = Plan::new(3, 4, 2);
        plan.assign(2, 3, 0, 0);
        plan.assign(2, 3, 1, 0);
        let violations = audit_plan(&config, &plan);
        assert!(violations.iter().any(|v| v.contains("Wednesday")));
        assert!(violations.iter().any(|v| v.contains("2 classes at once")));
    }

    #[test]
    fn test_wrong_shape() {
        let config = config();
        let plan = Plan::new(2, 4, 2);
        let violations = audit_plan(&config, &plan);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("shape"));
    }
}
