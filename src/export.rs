use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::hierarchy::Hierarchy;
use crate::models::ComparisonRow;
use crate::source::SnapshotFile;

/// Flat CSV shape of a comparison row.
#[derive(Debug, Serialize)]
pub struct ComparisonCsvRow<'a> {
    pub group: String,
    pub dept_id: &'a str,
    pub section_id: Option<&'a str>,
    pub team_id: Option<&'a str>,
    pub members: usize,
    pub total_solved: u64,
    pub leetcode_total: u64,
    pub skillrack_total: u64,
    pub codechef_total: u64,
    pub hackerrank_total: u64,
    pub avg_per_member: u64,
    pub top_performer: &'a str,
    pub top_performer_score: u64,
    pub team_lead_name: Option<&'a str>,
    pub team_lead_score: Option<u64>,
}

impl<'a> ComparisonCsvRow<'a> {
    pub fn new(row: &'a ComparisonRow, hierarchy: &Hierarchy) -> Self {
        Self {
            group: hierarchy.label(&row.key),
            dept_id: &row.key.dept_id,
            section_id: row.key.section_id.as_deref(),
            team_id: row.key.team_id.as_deref(),
            members: row.members,
            total_solved: row.total_solved,
            leetcode_total: row.leetcode_total,
            skillrack_total: row.skillrack_total,
            codechef_total: row.codechef_total,
            hackerrank_total: row.hackerrank_total,
            avg_per_member: row.avg_per_member,
            top_performer: &row.top_performer,
            top_performer_score: row.top_performer_score,
            team_lead_name: row.team_lead_name.as_deref(),
            team_lead_score: row.team_lead_score,
        }
    }
}

pub fn csv_string<T: Serialize>(rows: &[T]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer.into_inner().context("failed to flush csv")?;
    String::from_utf8(bytes).context("csv output is not utf-8")
}

pub fn json_string<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("failed to encode json")
}

pub fn write_snapshot(path: &Path, snapshot: &SnapshotFile) -> anyhow::Result<()> {
    let body = json_string(snapshot)?;
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), records = snapshot.records.len(), "snapshot written");
    Ok(())
}
