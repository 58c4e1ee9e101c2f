//! Workgrid Core — domain models, access-control primitives, and
//! repository trait definitions shared across the workspace.

pub mod access;
pub mod error;
pub mod models;
pub mod repository;
