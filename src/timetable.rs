//! Read-only projections of a finished run: clock times, display names,
//! the canonical table, CSV, occupancy views and utilisation figures.

use itertools::Itertools;

use crate::config::DAY_START_HOUR;
use crate::data::{
    Day, FacultyWorkload, GenerateResponse, OccupancyRow, OccupancyView, RoomUtilisation,
    ScheduleStats, Slot, TimetableRow,
};
use crate::error::{Result, ScheduleError};
use crate::grid::Cell;
use crate::solver::Timetable;

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub const CSV_HEADER: [&str; 7] = [
    "day",
    "start_time",
    "end_time",
    "course",
    "group",
    "faculty",
    "room",
];

/// Clock time of a slot boundary: slot 0 is 09:00, two slots per hour.
pub fn slot_time(slot: Slot) -> String {
    let minute = if slot % 2 == 0 { "00" } else { "30" };
    format!("{:02}:{minute}", DAY_START_HOUR + slot / 2)
}

pub fn day_name(day: Day) -> String {
    DAY_NAMES
        .get(day)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("Day {}", day + 1))
}

/// `prefix` plus a letter from A, or a number once letters run out.
fn lettered(prefix: &str, index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => format!("{prefix}{}", char::from(b'A' + i)),
        _ => format!("{prefix}{}", index + 1),
    }
}

pub fn room_name(room: usize) -> String {
    lettered("Room ", room)
}

pub fn faculty_name(faculty: usize) -> String {
    lettered("Dr. ", faculty)
}

pub fn group_name(group: usize) -> String {
    lettered("Batch ", group)
}

pub fn course_name(course: usize) -> String {
    format!("Course {}", course + 1)
}

fn export_error(err: impl std::fmt::Display) -> ScheduleError {
    ScheduleError::export(err.to_string())
}

/// Renders a header and records as CSV text.
pub fn write_csv<I, R, F>(header: &[&str], records: I) -> Result<String>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header).map_err(export_error)?;
    for record in records {
        writer.write_record(record).map_err(export_error)?;
    }
    let bytes = writer.into_inner().map_err(export_error)?;
    String::from_utf8(bytes).map_err(export_error)
}

pub fn rows_to_csv(rows: &[TimetableRow]) -> Result<String> {
    write_csv(
        &CSV_HEADER,
        rows.iter().map(|r| {
            [
                r.day.as_str(),
                r.start_time.as_str(),
                r.end_time.as_str(),
                r.course.as_str(),
                r.group.as_str(),
                r.faculty.as_str(),
                r.room.as_str(),
            ]
        }),
    )
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl Timetable {
    /// The canonical table, ordered by day then start slot.
    pub fn rows(&self) -> Vec<TimetableRow> {
        self.sessions()
            .iter()
            .sorted_by_key(|s| (s.day, s.start_slot))
            .map(|s| TimetableRow {
                day: day_name(s.day),
                start_time: slot_time(s.start_slot),
                end_time: slot_time(s.end_slot()),
                course: course_name(s.course),
                group: group_name(s.group),
                faculty: faculty_name(s.faculty),
                room: room_name(s.room),
            })
            .collect()
    }

    pub fn to_csv(&self) -> Result<String> {
        rows_to_csv(&self.rows())
    }

    pub fn workload_report(&self) -> Vec<FacultyWorkload> {
        self.workload()
            .into_iter()
            .enumerate()
            .map(|(faculty, hours)| FacultyWorkload {
                faculty,
                name: faculty_name(faculty),
                hours,
            })
            .collect()
    }

    pub fn stats(&self) -> ScheduleStats {
        let grid = self.grid();
        let per_room = grid.days() * grid.slots();
        let rooms = (0..grid.rooms())
            .map(|room| {
                let occupied = grid.occupied_in_room(room);
                RoomUtilisation {
                    room: room_name(room),
                    occupied,
                    total: per_room,
                    percent: percent(occupied, per_room),
                }
            })
            .collect();
        ScheduleStats {
            total_cells: grid.total_cells(),
            occupied_cells: grid.occupied(),
            utilisation_percent: percent(grid.occupied(), grid.total_cells()),
            rooms,
        }
    }

    /// One day of the grid as clock time by room, naming each occupant.
    pub fn occupancy_view(&self, day: Day) -> Result<OccupancyView> {
        let slice = self.occupancy_for_day(day)?;
        let rows = slice
            .iter()
            .enumerate()
            .map(|(slot, cells)| OccupancyRow {
                time: slot_time(slot),
                cells: cells
                    .iter()
                    .map(|cell| match cell {
                        Cell::Free => "FREE".to_string(),
                        Cell::Occupied(faculty) => faculty_name(*faculty),
                    })
                    .collect(),
            })
            .collect();
        Ok(OccupancyView {
            day: day_name(day),
            rooms: (0..self.grid().rooms()).map(room_name).collect(),
            rows,
        })
    }

    pub fn to_response(&self, occupancy_day: Option<Day>) -> Result<GenerateResponse> {
        let occupancy = occupancy_day
            .map(|day| self.occupancy_view(day))
            .transpose()?;
        Ok(GenerateResponse {
            sessions: self.sessions().to_vec(),
            rows: self.rows(),
            workload: self.workload_report(),
            under_scheduled: self.under_scheduled().to_vec(),
            stats: self.stats(),
            occupancy,
        })
    }
}
