//! catalog-harvest - label catalog scraper
//!
//! Scans label listing pages for albums released in a date window, verifies each one
//! on its detail page (release date, total length, genre) and writes a deduplicated
//! result table with side reports.

pub mod application;
pub mod domain;
pub mod infrastructure;
