//! PAR Viewer Service Library
//!
//! Headless front end over the radar crates: scan discovery, volume
//! inspection, slicing, point queries and timed playback.

pub mod commands;
pub mod config;
pub mod session;
