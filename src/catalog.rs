//! Static capability tables for a run: rooms, course requirements,
//! faculty eligibility and weekly demand.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::data::{CourseId, CourseRequirement, FacultyId, GroupId, Room, RoomId};
use crate::error::{Result, ScheduleError};

/// Reference rooms. Larger runs repeat the last row.
const BASE_ROOMS: [Room; 4] = [
    Room::new(60, false, true, true),
    Room::new(40, false, true, false),
    Room::new(30, true, true, true),
    Room::new(25, true, false, false),
];

/// Reference courses. Larger runs repeat the last row.
const BASE_COURSES: [CourseRequirement; 6] = [
    CourseRequirement::new(2, false, true, 50),
    CourseRequirement::new(3, false, true, 40),
    CourseRequirement::new(2, true, true, 25),
    CourseRequirement::new(4, true, true, 30),
    CourseRequirement::new(2, false, false, 35),
    CourseRequirement::new(3, false, true, 45),
];

/// Generated weekly hours fall in `[MIN_DEMAND_HOURS, MAX_DEMAND_HOURS)`.
const MIN_DEMAND_HOURS: u32 = 2;
const MAX_DEMAND_HOURS: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityTables {
    pub rooms: Vec<Room>,
    pub courses: Vec<CourseRequirement>,
    /// Courses each faculty may teach, indexed by faculty.
    pub eligibility: Vec<Vec<CourseId>>,
    /// Weekly hours, indexed `[course][group]`.
    pub demand: Vec<Vec<u32>>,
}

fn tiled<T: Copy>(base: &[T], n: usize) -> Vec<T> {
    let last = base[base.len() - 1];
    (0..n).map(|i| base.get(i).copied().unwrap_or(last)).collect()
}

impl CapabilityTables {
    /// Builds the reference tables for `config`, drawing eligibility and
    /// demand from `rng`.
    pub fn reference<R: Rng + ?Sized>(config: &RunConfig, rng: &mut R) -> Self {
        let rooms = tiled(&BASE_ROOMS, config.rooms);
        let courses = tiled(&BASE_COURSES, config.courses);

        let mut can_teach: Vec<Vec<bool>> = (0..config.faculties)
            .map(|_| {
                (0..config.courses)
                    .map(|_| rng.random_bool(config.eligibility_probability))
                    .collect()
            })
            .collect();
        for course in 0..config.courses {
            if !can_teach.iter().any(|row| row[course]) {
                let faculty = rng.random_range(0..config.faculties);
                debug!("Course {course} had no eligible faculty, assigning faculty {faculty}");
                can_teach[faculty][course] = true;
            }
        }
        let eligibility = can_teach
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .enumerate()
                    .filter_map(|(course, ok)| ok.then_some(course))
                    .collect()
            })
            .collect();

        let demand = (0..config.courses)
            .map(|_| {
                (0..config.groups)
                    .map(|_| rng.random_range(MIN_DEMAND_HOURS..MAX_DEMAND_HOURS))
                    .collect()
            })
            .collect();

        Self {
            rooms,
            courses,
            eligibility,
            demand,
        }
    }

    /// Checks the tables against the run's counts and invariants.
    pub fn validate(&self, config: &RunConfig) -> Result<()> {
        let check_len = |name: &str, actual: usize, expected: usize| {
            if actual == expected {
                Ok(())
            } else {
                Err(ScheduleError::config(format!(
                    "expected {expected} {name}, got {actual}"
                )))
            }
        };
        check_len("rooms", self.rooms.len(), config.rooms)?;
        check_len("courses", self.courses.len(), config.courses)?;
        check_len("eligibility rows", self.eligibility.len(), config.faculties)?;
        check_len("demand rows", self.demand.len(), config.courses)?;

        for (course, row) in self.demand.iter().enumerate() {
            if row.len() != config.groups {
                return Err(ScheduleError::config(format!(
                    "demand for course {course} must list {} groups, got {}",
                    config.groups,
                    row.len()
                )));
            }
        }
        for (course, req) in self.courses.iter().enumerate() {
            if req.duration_slots == 0 || req.duration_slots > config.slots_per_day {
                return Err(ScheduleError::config(format!(
                    "course {course} lasts {} slots, must be within 1..={}",
                    req.duration_slots, config.slots_per_day
                )));
            }
        }
        for (faculty, courses) in self.eligibility.iter().enumerate() {
            if let Some(bad) = courses.iter().find(|&&c| c >= config.courses) {
                return Err(ScheduleError::config(format!(
                    "faculty {faculty} lists unknown course {bad}"
                )));
            }
        }
        for course in 0..config.courses {
            if !self.eligibility.iter().any(|row| row.contains(&course)) {
                return Err(ScheduleError::config(format!(
                    "course {course} has no eligible faculty"
                )));
            }
        }
        Ok(())
    }

    pub fn room(&self, id: RoomId) -> Result<&Room> {
        self.rooms.get(id).ok_or_else(|| ScheduleError::unknown("room", id))
    }

    pub fn course(&self, id: CourseId) -> Result<&CourseRequirement> {
        self.courses
            .get(id)
            .ok_or_else(|| ScheduleError::unknown("course", id))
    }

    pub fn demand(&self, course: CourseId, group: GroupId) -> Result<u32> {
        let row = self
            .demand
            .get(course)
            .ok_or_else(|| ScheduleError::unknown("course", course))?;
        row.get(group)
            .copied()
            .ok_or_else(|| ScheduleError::unknown("group", group))
    }

    /// Faculty allowed to teach `course`, ascending.
    pub fn eligible_faculty(&self, course: CourseId) -> Result<Vec<FacultyId>> {
        self.course(course)?;
        Ok(self
            .eligibility
            .iter()
            .enumerate()
            .filter(|(_, courses)| courses.contains(&course))
            .map(|(faculty, _)| faculty)
            .collect())
    }
}
