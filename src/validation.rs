//! Pre-flight checks on a [`PlannerConfig`].
//!
//! Every check runs independently and contributes its own message, so a
//! single call reports all problems at once. An empty list means the
//! configuration can be handed to either planner.

use crate::data::{Availability, PlannerConfig};

pub const MAX_DAYS: usize = 7;

/// Hours in a day; also keeps the plan grid and the model bounded.
pub const MAX_DAILY_HOURS: usize = 24;

/// Upper bound on hours a (professor, class) pair can get in one day.
pub const MAX_PAIR_HOURS_PER_DAY: usize = 2;

pub fn validate_config(config: &PlannerConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if config.days < 1 || config.days > MAX_DAYS {
        errors.push(format!(
            "Number of days must be between 1 and {} (got {}).",
            MAX_DAYS, config.days
        ));
    }
    if config.daily_hours < 1 || config.daily_hours > MAX_DAILY_HOURS {
        errors.push(format!(
            "Daily hours must be between 1 and {} (got {}).",
            MAX_DAILY_HOURS, config.daily_hours
        ));
    }
    if config.last_morning_hour < 1 || config.last_morning_hour > config.daily_hours {
        errors.push(format!(
            "last_morning_hour must be between 1 and the daily hours ({}), got {}.",
            config.daily_hours, config.last_morning_hour
        ));
    }

    if config.wednesday_afternoon_free {
        if config.days < 3 {
            errors.push(
                "Free Wednesday afternoon requested but the week has fewer than 3 days."
                    .to_string(),
            );
        }
        if config.last_morning_hour >= config.daily_hours {
            errors.push(
                "Free Wednesday afternoon requested but the day has no afternoon hours."
                    .to_string(),
            );
        }
    }

    check_names(&mut errors, config.class_names.as_deref(), config.num_classes, "class");
    check_names(
        &mut errors,
        config.professor_names.as_deref(),
        config.num_professors,
        "professor",
    );
    check_names(&mut errors, config.hour_names.as_deref(), config.daily_hours, "hour");

    let shape_ok = config.hours_matrix.len() == config.num_professors
        && config
            .hours_matrix
            .iter()
            .all(|row| row.len() == config.num_classes);
    if !shape_ok {
        errors.push(format!(
            "hours_matrix shape does not match ({}, {}).",
            config.num_professors, config.num_classes
        ));
    }
    if config.hours_matrix.iter().flatten().any(|&h| h < 0) {
        errors.push("hours_matrix contains negative values.".to_string());
    }

    if let Some(availability) = &config.availability {
        if !availability_shape_ok(availability, config.num_professors, config.days) {
            let expected = match availability {
                Availability::Daily(_) => format!("({}, {})", config.num_professors, config.days),
                Availability::HalfDaily(_) => {
                    format!("({}, {}, 2)", config.num_professors, config.days)
                }
            };
            errors.push(format!(
                "availability shape does not match {} for a rank-{} grid.",
                expected,
                availability.rank()
            ));
        }
    }

    // a pair can get at most two hours on each day
    let pair_cap = as_hours(MAX_PAIR_HOURS_PER_DAY.saturating_mul(config.days));
    for (p, row) in config.hours_matrix.iter().enumerate() {
        for (c, &hours) in row.iter().enumerate() {
            if hours > pair_cap {
                errors.push(format!(
                    "Too many hours for professor {} / class {}: {} > {} (2 per day).",
                    p + 1,
                    c + 1,
                    hours,
                    pair_cap
                ));
            }
        }
    }

    let max_slots = as_hours(config.days.saturating_mul(config.daily_hours));
    for (p, row) in config.hours_matrix.iter().enumerate() {
        let Some(total) = checked_total(row.iter()) else {
            errors.push(format!("Total hours for professor {} overflow.", p + 1));
            continue;
        };
        if total > max_slots {
            errors.push(format!(
                "Total hours for professor {} ({}) exceed the available slots ({}).",
                p + 1,
                total,
                max_slots
            ));
        }
    }
    let widest = config.hours_matrix.iter().map(Vec::len).max().unwrap_or(0);
    for c in 0..widest {
        let Some(total) = checked_total(config.hours_matrix.iter().filter_map(|row| row.get(c)))
        else {
            errors.push(format!("Total hours for class {} overflow.", c + 1));
            continue;
        };
        if total > max_slots {
            errors.push(format!(
                "Total hours for class {} ({}) exceed the available slots ({}).",
                c + 1,
                total,
                max_slots
            ));
        }
    }

    errors
}

// slot counts beyond i64 are clamped; no hours entry can exceed them anyway
fn as_hours(slots: usize) -> i64 {
    i64::try_from(slots).unwrap_or(i64::MAX)
}

// None when the sum does not fit in i64
fn checked_total<'a>(mut hours: impl Iterator<Item = &'a i64>) -> Option<i64> {
    hours.try_fold(0i64, |total, &h| total.checked_add(h))
}

fn check_names(errors: &mut Vec<String>, names: Option<&[String]>, expected: usize, what: &str) {
    let Some(names) = names else {
        return;
    };
    if names.len() != expected {
        errors.push(format!(
            "Got {} {} names for {} {}s.",
            names.len(),
            what,
            expected,
            what
        ));
    }
    if names.iter().any(|n| n.trim().is_empty()) {
        errors.push(format!("Some {} names are empty.", what));
    }
}

fn availability_shape_ok(availability: &Availability, professors: usize, days: usize) -> bool {
    match availability {
        Availability::Daily(grid) => {
            grid.len() == professors && grid.iter().all(|row| row.len() == days)
        }
        Availability::HalfDaily(grid) => {
            grid.len() == professors
                && grid
                    .iter()
                    .all(|row| row.len() == days && row.iter().all(|halves| halves.len() == 2))
        }
    }
}
