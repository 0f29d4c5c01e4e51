//! DepScanner core - analysis and visualization engines
//!
//! This crate provides the client-side core of the DepScanner dependency
//! scanner: CVSS v3.1 base-score calculation, stable table
//! sort/filter/pagination, and force-directed dependency-graph layout,
//! plus thin clients for the scanner backend and OSV.dev.

pub mod api;
pub mod config;
pub mod cvss;
pub mod graph;
pub mod reports;
pub mod table;
