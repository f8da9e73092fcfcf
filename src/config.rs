use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::error::{Result, ScheduleError};

pub const SLOTS_PER_HOUR: usize = 2;
/// Hours covered by one slot.
pub const HOURS_PER_SLOT: f64 = 1.0 / SLOTS_PER_HOUR as f64;
/// Wall-clock hour of slot 0.
pub const DAY_START_HOUR: usize = 9;

/// Upper bound on the cells of any single grid or table a run allocates.
pub const MAX_GRID_CELLS: usize = 1 << 20;

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

fn cell_count(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Parameters of a single generation run.
///
/// Every field has a default matching the reference configuration, so a
/// request may override just the counts it cares about.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfig {
    pub days: usize,
    pub slots_per_day: usize,
    pub rooms: usize,
    pub faculties: usize,
    pub courses: usize,
    pub groups: usize,
    /// Seeds the run's random stream. `None` draws from the OS.
    pub seed: Option<u64>,
    /// Attempt budget for a single (course, group) work item.
    pub max_attempts_per_item: u32,
    /// Probability that a generated faculty cell starts out free.
    pub faculty_availability: f64,
    /// Probability that a generated group cell starts out free.
    pub group_availability: f64,
    /// Probability that a generated faculty may teach a given course.
    pub eligibility_probability: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            days: 5,
            slots_per_day: 12,
            rooms: 4,
            faculties: 4,
            courses: 6,
            groups: 3,
            seed: None,
            max_attempts_per_item: 50,
            faculty_availability: 0.9,
            group_availability: 0.95,
            eligibility_probability: 0.8,
        }
    }
}

impl RunConfig {
    pub fn new(
        days: usize,
        slots_per_day: usize,
        rooms: usize,
        faculties: usize,
        courses: usize,
        groups: usize,
    ) -> Self {
        Self {
            days,
            slots_per_day,
            rooms,
            faculties,
            courses,
            groups,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts_per_item = attempts;
        self
    }

    /// Rejects configurations no run could be built from.
    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("days", self.days),
            ("slotsPerDay", self.slots_per_day),
            ("rooms", self.rooms),
            ("faculties", self.faculties),
            ("courses", self.courses),
            ("groups", self.groups),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(ScheduleError::config(format!(
                    "{name} must be greater than zero"
                )));
            }
        }
        let grids = [
            ("room grid", [self.days, self.slots_per_day, self.rooms]),
            ("faculty availability", [self.faculties, self.days, self.slots_per_day]),
            ("group availability", [self.groups, self.days, self.slots_per_day]),
        ];
        let tables = [
            ("eligibility table", [self.faculties, self.courses]),
            ("demand table", [self.courses, self.groups]),
        ];
        let sizes = grids
            .iter()
            .map(|(name, dims)| (*name, cell_count(dims)))
            .chain(tables.iter().map(|(name, dims)| (*name, cell_count(dims))));
        for (name, size) in sizes {
            if !size.is_some_and(|cells| cells <= MAX_GRID_CELLS) {
                return Err(ScheduleError::config(format!(
                    "{name} exceeds {MAX_GRID_CELLS} cells"
                )));
            }
        }
        if self.max_attempts_per_item == 0 {
            return Err(ScheduleError::config(
                "maxAttemptsPerItem must be greater than zero",
            ));
        }
        let probabilities = [
            ("facultyAvailability", self.faculty_availability),
            ("groupAvailability", self.group_availability),
            ("eligibilityProbability", self.eligibility_probability),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(ScheduleError::config(format!(
                    "{name} must lie in [0, 1], got {p}"
                )));
            }
        }
        Ok(())
    }
}

/// Settings for the HTTP front end.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl ServerConfig {
    /// Reads `TIMETABLE_ADDR`, falling back to the local default.
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var("TIMETABLE_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        let addr = raw
            .parse()
            .map_err(|e| ScheduleError::config(format!("TIMETABLE_ADDR '{raw}': {e}")))?;
        Ok(Self { addr })
    }
}
