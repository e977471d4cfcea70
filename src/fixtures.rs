//! Record builders shared by the unit tests.

use crate::models::DailyRecord;

pub(crate) fn record(member: &str, date: &str) -> DailyRecord {
    DailyRecord {
        id: format!("{member}-{date}"),
        date: date.to_string(),
        member_id: member.to_string(),
        member_name: member.to_string(),
        email: String::new(),
        team_id: "t".to_string(),
        section_id: "s".to_string(),
        dept_id: "d".to_string(),
        leetcode_total: 0,
        leetcode_daily_increase: 0,
        skillrack_total: 0,
        skillrack_daily_increase: 0,
        codechef_total: 0,
        codechef_daily_increase: 0,
        hackerrank_total: 0,
        hackerrank_daily_increase: 0,
        github_repos: 0,
        github_daily_increase: 0,
        total_solved: 0,
        total_daily_increase: 0,
        is_team_lead: false,
        assigned_team_lead: None,
        assigned_batch: None,
    }
}

/// A normalized record whose whole score sits on LeetCode.
pub(crate) fn scored(member: &str, date: &str, leetcode: u32) -> DailyRecord {
    let mut rec = record(member, date);
    rec.leetcode_total = leetcode;
    rec.recompute_totals();
    rec
}

pub(crate) fn lead(member: &str, date: &str, leetcode: u32) -> DailyRecord {
    let mut rec = scored(member, date, leetcode);
    rec.is_team_lead = true;
    rec
}

pub(crate) fn in_team(mut rec: DailyRecord, dept: &str, section: &str, team: &str) -> DailyRecord {
    rec.dept_id = dept.to_string();
    rec.section_id = section.to_string();
    rec.team_id = team.to_string();
    rec
}
