//! Dense availability state for one generation run.
//!
//! Both containers are flat arenas addressed by a computed index, sized once
//! from the run's counts and never reallocated.

use rand::Rng;
use std::ops::Range;

use crate::data::{Day, FacultyId, RoomId, Slot};
use crate::error::{Result, ScheduleError};

/// State of one (day, slot, room) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Free,
    Occupied(FacultyId),
}

impl Cell {
    pub fn is_free(self) -> bool {
        matches!(self, Cell::Free)
    }
}

/// Who holds each (day, slot, room) cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    days: usize,
    slots: usize,
    rooms: usize,
    cells: Vec<Cell>,
}

impl OccupancyGrid {
    pub fn new(days: usize, slots: usize, rooms: usize) -> Self {
        Self {
            days,
            slots,
            rooms,
            cells: vec![Cell::Free; days * slots * rooms],
        }
    }

    #[inline]
    fn index(&self, day: Day, slot: Slot, room: RoomId) -> usize {
        debug_assert!(day < self.days && slot < self.slots && room < self.rooms);
        (day * self.slots + slot) * self.rooms + room
    }

    pub fn days(&self) -> usize {
        self.days
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn rooms(&self) -> usize {
        self.rooms
    }

    #[inline]
    pub fn cell(&self, day: Day, slot: Slot, room: RoomId) -> Cell {
        self.cells[self.index(day, slot, room)]
    }

    /// Whether every cell of `block` in `room` is free.
    pub fn block_is_free(&self, day: Day, mut block: Range<Slot>, room: RoomId) -> bool {
        block.all(|slot| self.cell(day, slot, room).is_free())
    }

    /// Whether `faculty` holds any room other than `room` during `block`.
    pub fn faculty_elsewhere(
        &self,
        faculty: FacultyId,
        day: Day,
        block: Range<Slot>,
        room: RoomId,
    ) -> bool {
        (0..self.rooms).filter(|&other| other != room).any(|other| {
            block
                .clone()
                .any(|slot| self.cell(day, slot, other) == Cell::Occupied(faculty))
        })
    }

    pub fn occupy(&mut self, day: Day, block: Range<Slot>, room: RoomId, faculty: FacultyId) {
        for slot in block {
            let idx = self.index(day, slot, room);
            self.cells[idx] = Cell::Occupied(faculty);
        }
    }

    /// The slot-by-room slice of one day.
    pub fn day(&self, day: Day) -> Result<Vec<Vec<Cell>>> {
        if day >= self.days {
            return Err(ScheduleError::unknown("day", day));
        }
        let start = day * self.slots * self.rooms;
        Ok(self.cells[start..start + self.slots * self.rooms]
            .chunks(self.rooms)
            .map(<[Cell]>::to_vec)
            .collect())
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_free()).count()
    }

    pub fn occupied_in_room(&self, room: RoomId) -> usize {
        (0..self.days)
            .flat_map(|day| (0..self.slots).map(move |slot| (day, slot)))
            .filter(|&(day, slot)| !self.cell(day, slot, room).is_free())
            .count()
    }
}

/// Free/busy flags indexed (entity, day, slot); `true` means free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityMatrix {
    entities: usize,
    days: usize,
    slots: usize,
    free: Vec<bool>,
}

impl AvailabilityMatrix {
    pub fn all_free(entities: usize, days: usize, slots: usize) -> Self {
        Self {
            entities,
            days,
            slots,
            free: vec![true; entities * days * slots],
        }
    }

    /// Each cell is independently free with probability `p_free`.
    pub fn random<R: Rng + ?Sized>(
        entities: usize,
        days: usize,
        slots: usize,
        p_free: f64,
        rng: &mut R,
    ) -> Self {
        let free = (0..entities * days * slots)
            .map(|_| rng.random_bool(p_free))
            .collect();
        Self {
            entities,
            days,
            slots,
            free,
        }
    }

    /// Builds a matrix from `[entity][day][slot]` nesting, checking its shape.
    pub fn from_nested(
        kind: &str,
        nested: &[Vec<Vec<bool>>],
        entities: usize,
        days: usize,
        slots: usize,
    ) -> Result<Self> {
        let shape_err = || {
            ScheduleError::config(format!(
                "{kind} availability must be shaped {entities}x{days}x{slots}"
            ))
        };
        if nested.len() != entities {
            return Err(shape_err());
        }
        let mut free = Vec::with_capacity(entities * days * slots);
        for per_entity in nested {
            if per_entity.len() != days {
                return Err(shape_err());
            }
            for per_day in per_entity {
                if per_day.len() != slots {
                    return Err(shape_err());
                }
                free.extend_from_slice(per_day);
            }
        }
        Ok(Self {
            entities,
            days,
            slots,
            free,
        })
    }

    #[inline]
    fn index(&self, entity: usize, day: Day, slot: Slot) -> usize {
        debug_assert!(entity < self.entities && day < self.days && slot < self.slots);
        (entity * self.days + day) * self.slots + slot
    }

    /// `(entities, days, slots)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.entities, self.days, self.slots)
    }

    #[inline]
    pub fn is_free(&self, entity: usize, day: Day, slot: Slot) -> bool {
        self.free[self.index(entity, day, slot)]
    }

    pub fn block_is_free(&self, entity: usize, day: Day, mut block: Range<Slot>) -> bool {
        block.all(|slot| self.is_free(entity, day, slot))
    }

    /// Marks `block` busy. Cells never return to free within a run.
    pub fn reserve(&mut self, entity: usize, day: Day, block: Range<Slot>) {
        for slot in block {
            let idx = self.index(entity, day, slot);
            self.free[idx] = false;
        }
    }
}
