use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::CapabilityTables;
use crate::config::RunConfig;

// Type aliases for clarity; all are dense indices starting at 0.
pub type RoomId = usize;
pub type CourseId = usize;
pub type FacultyId = usize;
pub type GroupId = usize;
pub type Day = usize;
pub type Slot = usize;

/// A physical room and its fixed features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub capacity: u32,
    pub is_lab: bool,
    pub has_projector: bool,
    pub has_ac: bool,
}

impl Room {
    pub const fn new(capacity: u32, is_lab: bool, has_projector: bool, has_ac: bool) -> Self {
        Self {
            capacity,
            is_lab,
            has_projector,
            has_ac,
        }
    }
}

/// What a course needs from a room, and how long each session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequirement {
    pub duration_slots: usize,
    pub needs_lab: bool,
    pub needs_projector: bool,
    pub min_capacity: u32,
}

impl CourseRequirement {
    pub const fn new(
        duration_slots: usize,
        needs_lab: bool,
        needs_projector: bool,
        min_capacity: u32,
    ) -> Self {
        Self {
            duration_slots,
            needs_lab,
            needs_projector,
            min_capacity,
        }
    }
}

/// One committed booking. Never changed once appended to the run's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledSession {
    pub faculty: FacultyId,
    pub group: GroupId,
    pub course: CourseId,
    pub day: Day,
    pub start_slot: Slot,
    pub duration_slots: usize,
    pub room: RoomId,
}

impl ScheduledSession {
    /// One past the last slot the session holds.
    pub fn end_slot(&self) -> Slot {
        self.start_slot + self.duration_slots
    }

    pub fn overlaps(&self, other: &ScheduledSession) -> bool {
        self.day == other.day
            && self.start_slot < other.end_slot()
            && other.start_slot < self.end_slot()
    }
}

/// A work item that finished with fewer sessions than it needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmetDemand {
    pub course: CourseId,
    pub group: GroupId,
    pub sessions_needed: u32,
    pub sessions_scheduled: u32,
    pub unmet: u32,
}

impl fmt::Display for UnmetDemand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "course {} / group {}: scheduled {} of {} sessions ({} unmet)",
            self.course, self.group, self.sessions_scheduled, self.sessions_needed, self.unmet
        )
    }
}

/// Canonical tabular projection of a session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableRow {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    pub course: String,
    pub group: String,
    pub faculty: String,
    pub room: String,
}

/// One line of a batch's static timetable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterRow {
    pub day: String,
    pub start: String,
    pub end: String,
    pub code: String,
    pub course_name: String,
    pub room: String,
    pub faculty: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyWorkload {
    pub faculty: FacultyId,
    pub name: String,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomUtilisation {
    pub room: String,
    pub occupied: usize,
    pub total: usize,
    pub percent: f64,
}

/// Grid-level figures for a finished run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStats {
    pub total_cells: usize,
    pub occupied_cells: usize,
    pub utilisation_percent: f64,
    pub rooms: Vec<RoomUtilisation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyRow {
    pub time: String,
    pub cells: Vec<String>,
}

/// One day of the occupancy grid, rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyView {
    pub day: String,
    pub rooms: Vec<String>,
    pub rows: Vec<OccupancyRow>,
}

/// Input of a generation request. Anything left out is generated.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateRequest {
    pub config: RunConfig,
    pub tables: Option<CapabilityTables>,
    /// `[faculty][day][slot]`, `true` = free.
    pub faculty_availability: Option<Vec<Vec<Vec<bool>>>>,
    /// `[group][day][slot]`, `true` = free.
    pub group_availability: Option<Vec<Vec<Vec<bool>>>>,
    pub occupancy_day: Option<Day>,
}

/// Output of a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub sessions: Vec<ScheduledSession>,
    pub rows: Vec<TimetableRow>,
    pub workload: Vec<FacultyWorkload>,
    pub under_scheduled: Vec<UnmetDemand>,
    pub stats: ScheduleStats,
    pub occupancy: Option<OccupancyView>,
}
