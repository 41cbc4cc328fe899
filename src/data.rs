use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for clarity
pub type ProfessorId = usize;
pub type ClassId = usize;
pub type Day = usize;
pub type Hour = usize;

/// Index of the day whose afternoon can be kept free (0-based, so Wednesday
/// in a Monday-first week).
pub const WEDNESDAY: Day = 2;

/// Half-day slot index inside an availability grid.
pub const MORNING: usize = 0;
pub const AFTERNOON: usize = 1;

/// Professor availability as supplied by the caller.
///
/// `Daily` is indexed `[professor][day]`, `HalfDaily` is indexed
/// `[professor][day][half]` with half 0 = morning and 1 = afternoon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Availability {
    HalfDaily(Vec<Vec<Vec<bool>>>),
    Daily(Vec<Vec<bool>>),
}

impl Availability {
    pub fn rank(&self) -> usize {
        match self {
            Availability::Daily(_) => 2,
            Availability::HalfDaily(_) => 3,
        }
    }
}

/// Everything needed to build a weekly timetable. Built once per request and
/// only ever handed out by shared reference afterwards.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerConfig {
    pub days: usize,
    pub daily_hours: usize,
    pub num_professors: usize,
    pub num_classes: usize,
    /// `hours_matrix[p][c]` = weekly hours professor `p` teaches class `c`.
    pub hours_matrix: Vec<Vec<i64>>,
    /// `None` means every professor is always available.
    pub availability: Option<Availability>,
    /// First hour index that counts as afternoon.
    pub last_morning_hour: usize,
    pub wednesday_afternoon_free: bool,
    pub class_names: Option<Vec<String>>,
    pub professor_names: Option<Vec<String>>,
    pub hour_names: Option<Vec<String>>,
    pub seed: Option<u64>,
}

impl PlannerConfig {
    /// Minimal configuration with full availability and no names.
    pub fn new(days: usize, daily_hours: usize, hours_matrix: Vec<Vec<i64>>) -> Self {
        let num_professors = hours_matrix.len();
        let num_classes = hours_matrix.first().map_or(0, Vec::len);
        Self {
            days,
            daily_hours,
            num_professors,
            num_classes,
            hours_matrix,
            availability: None,
            last_morning_hour: daily_hours / 2,
            wednesday_afternoon_free: false,
            class_names: None,
            professor_names: None,
            hour_names: None,
            seed: None,
        }
    }

    /// Raw entry of the hours matrix; out-of-shape cells read as 0.
    pub fn hours(&self, professor: ProfessorId, class: ClassId) -> i64 {
        self.hours_matrix
            .get(professor)
            .and_then(|row| row.get(class))
            .copied()
            .unwrap_or(0)
    }

    /// Weekly hours to place for a pair, with negative entries clamped to 0.
    pub fn required_hours(&self, professor: ProfessorId, class: ClassId) -> usize {
        self.hours(professor, class).max(0) as usize
    }

    pub fn is_afternoon(&self, hour: Hour) -> bool {
        hour >= self.last_morning_hour
    }

    /// True for slots that must stay empty because of the free Wednesday afternoon.
    pub fn is_wednesday_afternoon(&self, day: Day, hour: Hour) -> bool {
        self.wednesday_afternoon_free && day == WEDNESDAY && self.is_afternoon(hour)
    }

    /// The first afternoon hour, when the day actually has both a morning and an afternoon.
    pub fn lunch_boundary(&self) -> Option<Hour> {
        let boundary = self.last_morning_hour;
        (boundary > 0 && boundary < self.daily_hours).then_some(boundary)
    }

    /// Availability expanded to one flag per (professor, day, half-day).
    pub fn half_day_availability(&self) -> HalfDayAvailability {
        let mut slots = vec![[true, true]; self.num_professors * self.days];
        if let Some(availability) = &self.availability {
            for p in 0..self.num_professors {
                for d in 0..self.days {
                    slots[p * self.days + d] = match availability {
                        Availability::Daily(grid) => {
                            let open = grid.get(p).and_then(|row| row.get(d)).copied().unwrap_or(false);
                            [open, open]
                        }
                        Availability::HalfDaily(grid) => {
                            let halves = grid.get(p).and_then(|row| row.get(d));
                            let half = |s: usize| halves.and_then(|h| h.get(s)).copied().unwrap_or(false);
                            [half(MORNING), half(AFTERNOON)]
                        }
                    };
                }
            }
        }
        HalfDayAvailability {
            days: self.days,
            last_morning_hour: self.last_morning_hour,
            slots,
        }
    }

    pub fn class_label(&self, class: ClassId) -> String {
        label(self.class_names.as_deref(), self.num_classes, class, "Class")
    }

    pub fn professor_label(&self, professor: ProfessorId) -> String {
        label(self.professor_names.as_deref(), self.num_professors, professor, "Prof")
    }

    pub fn hour_label(&self, hour: Hour) -> String {
        label(self.hour_names.as_deref(), self.daily_hours, hour, "Hour")
    }
}

// supplied names are only trusted when the list has the right length
fn label(names: Option<&[String]>, expected: usize, index: usize, prefix: &str) -> String {
    match names {
        Some(names) if names.len() == expected => names[index].clone(),
        _ => format!("{} {}", prefix, index + 1),
    }
}

/// Availability grid of shape (professors, days, 2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalfDayAvailability {
    days: usize,
    last_morning_hour: usize,
    slots: Vec<[bool; 2]>,
}

impl HalfDayAvailability {
    pub fn is_available(&self, professor: ProfessorId, day: Day, hour: Hour) -> bool {
        let half = if hour < self.last_morning_hour { MORNING } else { AFTERNOON };
        self.slots
            .get(professor * self.days + day)
            .is_some_and(|halves| halves[half])
    }
}

/// A weekly timetable: `plan[day][hour][class]` holds `professor + 1`, or 0
/// when the class has no lesson in that slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Vec<u32>>>", into = "Vec<Vec<Vec<u32>>>")]
pub struct Plan {
    days: usize,
    daily_hours: usize,
    num_classes: usize,
    cells: Vec<u32>,
}

impl Plan {
    pub fn new(days: usize, daily_hours: usize, num_classes: usize) -> Self {
        Self {
            days,
            daily_hours,
            num_classes,
            cells: vec![0; days * daily_hours * num_classes],
        }
    }

    /// (days, daily hours, classes)
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.days, self.daily_hours, self.num_classes)
    }

    fn index(&self, day: Day, hour: Hour, class: ClassId) -> usize {
        debug_assert!(day < self.days && hour < self.daily_hours && class < self.num_classes);
        (day * self.daily_hours + hour) * self.num_classes + class
    }

    pub fn get(&self, day: Day, hour: Hour, class: ClassId) -> u32 {
        self.cells[self.index(day, hour, class)]
    }

    pub fn set(&mut self, day: Day, hour: Hour, class: ClassId, value: u32) {
        let i = self.index(day, hour, class);
        self.cells[i] = value;
    }

    pub fn assign(&mut self, day: Day, hour: Hour, class: ClassId, professor: ProfessorId) {
        self.set(day, hour, class, professor as u32 + 1);
    }

    /// Who teaches `class` at (day, hour).
    pub fn professor_at(&self, day: Day, hour: Hour, class: ClassId) -> Option<ProfessorId> {
        match self.get(day, hour, class) {
            0 => None,
            v => Some(v as usize - 1),
        }
    }

    /// Which class `professor` teaches at (day, hour). First match wins.
    pub fn class_of(&self, day: Day, hour: Hour, professor: ProfessorId) -> Option<ClassId> {
        let tag = professor as u32 + 1;
        (0..self.num_classes).find(|&c| self.get(day, hour, c) == tag)
    }

    pub fn teaches_at(&self, day: Day, hour: Hour, professor: ProfessorId) -> bool {
        self.class_of(day, hour, professor).is_some()
    }

    /// Number of cells of `class` taught by `professor` over the whole week.
    pub fn count_for(&self, professor: ProfessorId, class: ClassId) -> usize {
        let tag = professor as u32 + 1;
        (0..self.days)
            .flat_map(|d| (0..self.daily_hours).map(move |h| (d, h)))
            .filter(|&(d, h)| self.get(d, h, class) == tag)
            .count()
    }

    /// Hours of `day` in which `professor` teaches `class`, ascending.
    pub fn hours_for(&self, day: Day, professor: ProfessorId, class: ClassId) -> Vec<Hour> {
        let tag = professor as u32 + 1;
        (0..self.daily_hours)
            .filter(|&h| self.get(day, h, class) == tag)
            .collect()
    }

    /// Total weekly hours assigned to `professor` across all classes.
    pub fn professor_load(&self, professor: ProfessorId) -> usize {
        let tag = professor as u32 + 1;
        self.cells.iter().filter(|&&v| v == tag).count()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&v| v == 0)
    }

    pub fn to_nested(&self) -> Vec<Vec<Vec<u32>>> {
        (0..self.days)
            .map(|d| {
                (0..self.daily_hours)
                    .map(|h| (0..self.num_classes).map(|c| self.get(d, h, c)).collect())
                    .collect()
            })
            .collect()
    }
}

impl From<Plan> for Vec<Vec<Vec<u32>>> {
    fn from(plan: Plan) -> Self {
        plan.to_nested()
    }
}

impl TryFrom<Vec<Vec<Vec<u32>>>> for Plan {
    type Error = String;

    fn try_from(nested: Vec<Vec<Vec<u32>>>) -> Result<Self, Self::Error> {
        let days = nested.len();
        let daily_hours = nested.first().map_or(0, Vec::len);
        let num_classes = nested
            .first()
            .and_then(|day| day.first())
            .map_or(0, Vec::len);

        let mut plan = Plan::new(days, daily_hours, num_classes);
        for (d, day) in nested.iter().enumerate() {
            if day.len() != daily_hours {
                return Err(format!(
                    "plan day {} has {} hours, expected {}",
                    d,
                    day.len(),
                    daily_hours
                ));
            }
            for (h, row) in day.iter().enumerate() {
                if row.len() != num_classes {
                    return Err(format!(
                        "plan day {} hour {} has {} classes, expected {}",
                        d,
                        h,
                        row.len(),
                        num_classes
                    ));
                }
                for (c, &value) in row.iter().enumerate() {
                    plan.set(d, h, c, value);
                }
            }
        }
        Ok(plan)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in 0..self.days {
            writeln!(f, "day {}", d)?;
            for h in 0..self.daily_hours {
                let row = (0..self.num_classes)
                    .map(|c| self.get(d, h, c).to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(f, "  {:>2}: {}", h, row)?;
            }
        }
        Ok(())
    }
}

/// Candidate plans with their scores, best (lowest score) first.
/// Both vectors are empty when no feasible plan was found.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    pub plans: Vec<Plan>,
    pub scores: Vec<f64>,
}

impl PlanResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(plan: Plan, score: f64) -> Self {
        Self {
            plans: vec![plan],
            scores: vec![score],
        }
    }

    /// Sorts candidates ascending by score. Ties keep their input order.
    pub fn ranked(mut scored: Vec<(Plan, f64)>) -> Self {
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        let (plans, scores) = scored.into_iter().unzip();
        Self { plans, scores }
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn best(&self) -> Option<(&Plan, f64)> {
        self.plans.first().zip(self.scores.first().copied())
    }
}
