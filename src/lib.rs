//! Gantt timeline for kanban boards.
//!
//! The [`engine`] turns a board snapshot into a scrollable timeline: a bounded
//! window of days, bar geometry, drag scheduling, dependency arrows and
//! keyboard batch moves. Stores are reached through the traits in
//! [`backend`]; [`io`] provides file-backed implementations.

pub mod app;
pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod model;
pub mod ui;
