use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// One member's counters for one calendar day.
///
/// `total_solved` and `total_daily_increase` are derived; call
/// [`DailyRecord::recompute_totals`] (or run the record through
/// [`crate::rollup::normalize`]) after touching any platform counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    #[serde(default)]
    pub id: String,
    pub date: String,
    #[serde(default)]
    pub member_id: String,
    #[serde(default)]
    pub member_name: String,
    #[serde(default)]
    pub email: String,
    pub team_id: String,
    pub section_id: String,
    pub dept_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub leetcode_total: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub leetcode_daily_increase: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skillrack_total: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skillrack_daily_increase: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub codechef_total: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub codechef_daily_increase: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hackerrank_total: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hackerrank_daily_increase: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub github_repos: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub github_daily_increase: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_solved: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_daily_increase: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_team_lead: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_team_lead: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_batch: Option<String>,
}

/// Reads an explicit `null` the same way as an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl DailyRecord {
    /// Calendar day of the record. `None` when the date cannot be parsed;
    /// `None` orders before every real date.
    pub fn day(&self) -> Option<NaiveDate> {
        let raw = self.date.trim();
        if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(day);
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|stamp| stamp.date_naive())
    }

    pub fn recompute_totals(&mut self) {
        self.total_solved = Platform::ALL.iter().map(|p| u64::from(p.total(self))).sum();
        self.total_daily_increase = Platform::ALL
            .iter()
            .map(|p| u64::from(p.daily_increase(self)))
            .sum();
    }

    /// Key used to tell members apart. Falls back to email, then display
    /// name, when the source left the id blank.
    pub fn identity(&self) -> &str {
        [&self.member_id, &self.email, &self.member_name]
            .into_iter()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .unwrap_or("")
    }

    pub fn team_key(&self) -> GroupKey {
        GroupKey {
            dept_id: self.dept_id.clone(),
            section_id: Some(self.section_id.clone()),
            team_id: Some(self.team_id.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    LeetCode,
    SkillRack,
    CodeChef,
    HackerRank,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::LeetCode,
        Platform::SkillRack,
        Platform::CodeChef,
        Platform::HackerRank,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Platform::LeetCode => "LeetCode",
            Platform::SkillRack => "SkillRack",
            Platform::CodeChef => "CodeChef",
            Platform::HackerRank => "HackerRank",
        }
    }

    pub fn total(self, record: &DailyRecord) -> u32 {
        match self {
            Platform::LeetCode => record.leetcode_total,
            Platform::SkillRack => record.skillrack_total,
            Platform::CodeChef => record.codechef_total,
            Platform::HackerRank => record.hackerrank_total,
        }
    }

    pub fn daily_increase(self, record: &DailyRecord) -> u32 {
        match self {
            Platform::LeetCode => record.leetcode_daily_increase,
            Platform::SkillRack => record.skillrack_daily_increase,
            Platform::CodeChef => record.codechef_daily_increase,
            Platform::HackerRank => record.hackerrank_daily_increase,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub total_members: usize,
    pub total_problems: u64,
    pub avg_per_member: u64,
    pub top_performer: String,
    pub top_performer_score: u64,
    pub team_lead_name: Option<String>,
    pub team_lead_score: Option<u64>,
}

impl Default for TeamStats {
    fn default() -> Self {
        Self {
            total_members: 0,
            total_problems: 0,
            avg_per_member: 0,
            top_performer: "N/A".to_string(),
            top_performer_score: 0,
            team_lead_name: None,
            team_lead_score: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub member_id: String,
    pub member_name: String,
    pub team_id: String,
    pub section_id: String,
    pub dept_id: String,
    pub total_solved: u64,
    pub leetcode_total: u32,
    pub skillrack_total: u32,
    pub codechef_total: u32,
    pub hackerrank_total: u32,
    pub is_team_lead: bool,
    pub assigned_team_lead: Option<String>,
    pub assigned_batch: Option<String>,
}

/// Rollup level of a comparison row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    Department,
    Section,
    #[default]
    Team,
}

/// Placement of a rollup row. Coarser levels leave the finer ids empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupKey {
    pub dept_id: String,
    pub section_id: Option<String>,
    pub team_id: Option<String>,
}

impl GroupKey {
    pub fn at_level(record: &DailyRecord, level: Level) -> Self {
        let mut key = record.team_key();
        match level {
            Level::Department => {
                key.section_id = None;
                key.team_id = None;
            }
            Level::Section => key.team_id = None,
            Level::Team => {}
        }
        key
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dept_id)?;
        if let Some(section) = &self.section_id {
            write!(f, "/{section}")?;
        }
        if let Some(team) = &self.team_id {
            write!(f, "/{team}")?;
        }
        Ok(())
    }
}

/// One row of a team (or section/department) comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    #[serde(flatten)]
    pub key: GroupKey,
    pub members: usize,
    pub total_solved: u64,
    pub leetcode_total: u64,
    pub skillrack_total: u64,
    pub codechef_total: u64,
    pub hackerrank_total: u64,
    pub avg_per_member: u64,
    pub top_performer: String,
    pub top_performer_score: u64,
    pub team_lead_name: Option<String>,
    pub team_lead_score: Option<u64>,
}

pub type TeamComparisonRow = ComparisonRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformTotal {
    pub platform: Platform,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    pub date: String,
    pub total_solved: u64,
    pub leetcode_total: u32,
    pub skillrack_total: u32,
    pub codechef_total: u32,
    pub hackerrank_total: u32,
    pub daily_increase: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProgress {
    pub member_id: String,
    pub member_name: String,
    pub team_id: String,
    pub section_id: String,
    pub dept_id: String,
    pub history: Vec<ProgressPoint>,
    pub total_growth: u64,
    pub avg_daily_increase: f64,
}
