//! Fixed per-batch course timetables for display and export.
//!
//! This is plain lookup over static data; it never consults the engine.

use itertools::Itertools;

use crate::data::RosterRow;
use crate::error::{Result, ScheduleError};
use crate::timetable::write_csv;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterCourse {
    pub code: &'static str,
    pub name: &'static str,
    pub room: &'static str,
    pub faculty: &'static str,
}

/// One weekly meeting. `code` may carry a suffix such as `LAB` or `TUT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterEntry {
    pub day: &'static str,
    pub start: &'static str,
    pub end: &'static str,
    pub code: &'static str,
    pub batch: &'static str,
}

const fn course(
    code: &'static str,
    name: &'static str,
    room: &'static str,
    faculty: &'static str,
) -> RosterCourse {
    RosterCourse {
        code,
        name,
        room,
        faculty,
    }
}

const fn entry(
    day: &'static str,
    start: &'static str,
    end: &'static str,
    code: &'static str,
    batch: &'static str,
) -> RosterEntry {
    RosterEntry {
        day,
        start,
        end,
        code,
        batch,
    }
}

const COURSES: &[RosterCourse] = &[
    course("E1", "Ethics & Environment", "C205", "Dr. Aswath Babu H"),
    course("D1", "Design Analysis of Algorithm", "C205", "Dr. Pramod Yelmewad"),
    course("B1", "Software Design Tools & Techniques", "C205", "Dr. Vivekraj"),
    course("C1", "Computer Networks", "C002", "Dr. Prabhu Prasad"),
    course("C2", "Differential Equations", "C004", "Dr. Anand P. Barangi"),
    course("D2", "Elective", "Various", "Various"),
    course("CS152", "Data Science with Python", "L201", "Dr. Abdul Wahid"),
    course("CS251", "2D Computer Graphics", "L102", "Dr. Vivekraj"),
    course("CS261", "Operating System", "C101", "Dr. Suvadip Hazra"),
    course("CS263", "Design and Analysis of Algorithms", "C205", "Dr. Pramod Yelmewad"),
    course("CS264", "Computer Networks", "C002", "Dr. Prabhu Prasad"),
    course("CS304", "Artificial Intelligence", "C103", "Dr. Krishnendu Ghosh"),
    course("CS307", "Machine Learning", "C104", "Dr. Utkarsh Mahadeo Khaire"),
];

const BATCHES: &[(&str, &[&str])] = &[
    ("Batch A", &["E1", "D1", "B1", "C1", "C2", "D2"]),
    ("Batch B", &["CS152", "CS261", "CS263", "CS264", "C2"]),
    ("Batch C", &["CS251", "CS304", "CS307", "C1", "E1"]),
];

const ENTRIES: &[RosterEntry] = &[
    entry("MON", "09:00", "10:00", "B1", "Batch A"),
    entry("MON", "10:45", "12:15", "E1", "Batch A"),
    entry("MON", "12:15", "13:15", "D1 TUT", "Batch A"),
    entry("MON", "14:00", "15:30", "D1 LAB", "Batch A"),
    entry("MON", "17:30", "18:30", "D2", "Batch A"),
    entry("TUE", "09:00", "10:00", "B1", "Batch A"),
    entry("TUE", "10:00", "11:00", "CS152", "Batch B"),
    entry("TUE", "11:00", "12:00", "E1 TUT", "Batch A"),
    entry("TUE", "14:00", "15:30", "C2", "Batch A"),
    entry("TUE", "14:00", "15:30", "B1 LAB", "Batch B"),
    entry("TUE", "15:30", "17:00", "D2", "Batch A"),
    entry("WED", "09:00", "10:00", "C1", "Batch A"),
    entry("WED", "10:00", "11:00", "D1", "Batch A"),
    entry("WED", "10:30", "11:30", "CS251", "Batch C"),
    entry("WED", "11:00", "12:00", "D1", "Batch B"),
    entry("WED", "14:00", "15:30", "C2", "Batch A"),
    entry("WED", "15:30", "17:00", "D2", "Batch C"),
    entry("THU", "09:00", "10:00", "D1", "Batch A"),
    entry("THU", "10:00", "11:00", "C1", "Batch A"),
    entry("THU", "11:00", "12:15", "B1 TUT", "Batch A"),
    entry("THU", "14:00", "15:30", "D2", "Batch B"),
    entry("THU", "15:30", "17:00", "C2", "Batch C"),
    entry("FRI", "09:00", "10:00", "E1", "Batch A"),
    entry("FRI", "10:00", "11:00", "B1", "Batch A"),
    entry("FRI", "11:00", "12:00", "C1 TUT", "Batch A"),
    entry("FRI", "14:00", "15:30", "CS304", "Batch C"),
    entry("FRI", "17:30", "18:30", "C2 TUT", "Batch A"),
];

const WEEK: [&str; 7] = ["MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"];

pub const CSV_HEADER: [&str; 7] = ["Day", "Start", "End", "Code", "Course", "Room", "Faculty"];

fn weekday_rank(day: &str) -> usize {
    WEEK.iter().position(|d| *d == day).unwrap_or(WEEK.len())
}

/// Read-only view over a fixed course catalogue and weekly entries.
#[derive(Debug, Clone, Copy)]
pub struct StudentRoster {
    courses: &'static [RosterCourse],
    batches: &'static [(&'static str, &'static [&'static str])],
    entries: &'static [RosterEntry],
}

impl Default for StudentRoster {
    fn default() -> Self {
        Self {
            courses: COURSES,
            batches: BATCHES,
            entries: ENTRIES,
        }
    }
}

impl StudentRoster {
    pub fn batches(&self) -> Vec<&'static str> {
        self.batches.iter().map(|(name, _)| *name).collect()
    }

    pub fn course(&self, code: &str) -> Result<&RosterCourse> {
        self.courses
            .iter()
            .find(|c| c.code == code)
            .ok_or_else(|| ScheduleError::unknown("course code", code))
    }

    /// Entries of `batch` for courses it takes, by weekday then start time.
    pub fn timetable_for(&self, batch: &str) -> Result<Vec<RosterRow>> {
        let (_, taken) = self
            .batches
            .iter()
            .find(|(name, _)| *name == batch)
            .ok_or_else(|| ScheduleError::unknown("batch", batch))?;

        self.entries
            .iter()
            .filter(|e| e.batch == batch)
            .filter_map(|e| {
                let code = e.code.split_whitespace().next()?;
                taken.contains(&code).then_some((e, code))
            })
            .sorted_by_key(|(e, _)| (weekday_rank(e.day), e.start))
            .map(|(e, code)| -> Result<RosterRow> {
                let course = self.course(code)?;
                Ok(RosterRow {
                    day: e.day.to_string(),
                    start: e.start.to_string(),
                    end: e.end.to_string(),
                    code: e.code.to_string(),
                    course_name: course.name.to_string(),
                    room: course.room.to_string(),
                    faculty: course.faculty.to_string(),
                })
            })
            .collect()
    }

    pub fn to_csv(&self, batch: &str) -> Result<String> {
        let rows = self.timetable_for(batch)?;
        write_csv(
            &CSV_HEADER,
            rows.iter().map(|r| {
                [
                    r.day.as_str(),
                    r.start.as_str(),
                    r.end.as_str(),
                    r.code.as_str(),
                    r.course_name.as_str(),
                    r.room.as_str(),
                    r.faculty.as_str(),
                ]
            }),
        )
    }
}
