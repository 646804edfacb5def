//! Unified course.activity.v1 schema
//!
//! This module defines the input schema for course-platform activity logs
//! (step events and quiz submissions) and the adapters that read them from
//! CSV, NDJSON, or JSON-array exports.

mod record;
mod adapter;

pub use record::*;
pub use adapter::*;
