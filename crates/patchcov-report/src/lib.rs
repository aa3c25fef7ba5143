//! Coverage correlation and reporting.
//!
//! Marks added lines as covered from a parsed profile, renders the uncovered
//! ones as text or markdown, summarises them as JSON, and talks to GitHub.

pub mod correlate;
pub mod github;
pub mod render;
pub mod summary;
