//! Exam seating sidecar: loads a student roster, splits the admitted students
//! across classrooms and renders seating charts and signature sheets as PDF.

pub mod allocate;
pub mod bundle;
pub mod config;
pub mod error;
pub mod ipc;
pub mod layout;
pub mod plan;
pub mod render;
pub mod roster;
pub mod session;
