//! Greedy timetable engine.
//!
//! Assigns (course, group) teaching demand to concrete (day, start slot,
//! room, faculty) bookings under room suitability, availability and
//! no-double-booking constraints. Each call to [`solver::generate`] owns its
//! grids and random stream, so runs never observe one another.

pub mod catalog;
pub mod config;
pub mod data;
pub mod error;
pub mod grid;
pub mod roster;
pub mod server;
pub mod solver;
pub mod timetable;
