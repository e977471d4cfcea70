//! Leaderboards, statistics and team rollups for coding-practice counters
//! collected across a department → section → team hierarchy.

pub mod db;
pub mod export;
pub mod hierarchy;
pub mod logging;
pub mod models;
pub mod progress;
pub mod report;
pub mod rollup;
pub mod source;

#[cfg(test)]
mod fixtures;
