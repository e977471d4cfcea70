use std::collections::HashMap;

use crate::models::{
    ComparisonRow, DailyRecord, GroupKey, LeaderboardEntry, Level, Platform, PlatformTotal,
    TeamComparisonRow, TeamStats,
};

/// Recomputes the derived totals of every record and orders the set by day,
/// most recent first. Records whose date cannot be parsed go last.
pub fn normalize(mut records: Vec<DailyRecord>) -> Vec<DailyRecord> {
    let mut undated = 0usize;
    for record in records.iter_mut() {
        record.recompute_totals();
        if record.day().is_none() {
            undated += 1;
        }
    }

    if undated > 0 {
        tracing::debug!(undated, "records with unparsable dates sorted last");
    }

    records.sort_by(|a, b| b.day().cmp(&a.day()));
    records
}

/// Collapses the history of every member into the most recent record.
///
/// On equal days the record seen first is kept. The result puts team leads
/// first, then orders by `total_solved` descending; anything still tied keeps
/// the order in which members were first seen.
pub fn latest_by_member(records: &[DailyRecord]) -> Vec<DailyRecord> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut latest: Vec<&DailyRecord> = Vec::new();

    for record in records {
        match slots.get(record.identity()) {
            Some(&slot) => {
                if let Some(current) = latest.get_mut(slot) {
                    if record.day() > current.day() {
                        *current = record;
                    }
                }
            }
            None => {
                slots.insert(record.identity(), latest.len());
                latest.push(record);
            }
        }
    }

    let mut snapshots: Vec<DailyRecord> = latest.into_iter().cloned().collect();
    snapshots.sort_by(|a, b| {
        b.is_team_lead
            .cmp(&a.is_team_lead)
            .then_with(|| b.total_solved.cmp(&a.total_solved))
    });
    snapshots
}

/// Summary statistics over a snapshot set (one record per member).
pub fn team_stats(snapshots: &[DailyRecord]) -> TeamStats {
    let Some(top) = snapshots
        .iter()
        .reduce(|best, record| if record.total_solved > best.total_solved { record } else { best })
    else {
        return TeamStats::default();
    };

    let total_problems: u64 = snapshots.iter().map(|record| record.total_solved).sum();
    let lead = snapshots.iter().find(|record| record.is_team_lead);

    TeamStats {
        total_members: snapshots.len(),
        total_problems,
        avg_per_member: rounded_average(total_problems, snapshots.len()),
        top_performer: top.member_name.clone(),
        top_performer_score: top.total_solved,
        team_lead_name: lead.map(|record| record.member_name.clone()),
        team_lead_score: lead.map(|record| record.total_solved),
    }
}

/// Ranks snapshots in the order the reducer produced them, so team leads
/// stay on top of their cohort whatever their score.
pub fn leaderboard(snapshots: &[DailyRecord]) -> Vec<LeaderboardEntry> {
    snapshots
        .iter()
        .enumerate()
        .map(|(index, record)| LeaderboardEntry {
            rank: index + 1,
            member_id: record.member_id.clone(),
            member_name: record.member_name.clone(),
            team_id: record.team_id.clone(),
            section_id: record.section_id.clone(),
            dept_id: record.dept_id.clone(),
            total_solved: record.total_solved,
            leetcode_total: record.leetcode_total,
            skillrack_total: record.skillrack_total,
            codechef_total: record.codechef_total,
            hackerrank_total: record.hackerrank_total,
            is_team_lead: record.is_team_lead,
            assigned_team_lead: record.assigned_team_lead.clone(),
            assigned_batch: record.assigned_batch.clone(),
        })
        .collect()
}

pub fn team_comparison(records: &[DailyRecord]) -> Vec<TeamComparisonRow> {
    compare_groups(records, Level::Team)
}

/// Groups normalized records by their placement at `level`, reduces each
/// group to member snapshots and emits one row per group, highest
/// `total_solved` first.
pub fn compare_groups(records: &[DailyRecord], level: Level) -> Vec<ComparisonRow> {
    let mut slots: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<(GroupKey, Vec<DailyRecord>)> = Vec::new();

    for record in records {
        let key = GroupKey::at_level(record, level);
        match slots.get(&key) {
            Some(&slot) => {
                if let Some((_, members)) = groups.get_mut(slot) {
                    members.push(record.clone());
                }
            }
            None => {
                slots.insert(key.clone(), groups.len());
                groups.push((key, vec![record.clone()]));
            }
        }
    }

    let mut rows: Vec<ComparisonRow> = groups
        .into_iter()
        .map(|(key, members)| {
            let snapshots = latest_by_member(&members);
            let stats = team_stats(&snapshots);
            let platform_sum = |platform: Platform| -> u64 {
                snapshots.iter().map(|r| u64::from(platform.total(r))).sum()
            };

            ComparisonRow {
                key,
                members: stats.total_members,
                total_solved: stats.total_problems,
                leetcode_total: platform_sum(Platform::LeetCode),
                skillrack_total: platform_sum(Platform::SkillRack),
                codechef_total: platform_sum(Platform::CodeChef),
                hackerrank_total: platform_sum(Platform::HackerRank),
                avg_per_member: stats.avg_per_member,
                top_performer: stats.top_performer,
                top_performer_score: stats.top_performer_score,
                team_lead_name: stats.team_lead_name,
                team_lead_score: stats.team_lead_score,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.total_solved.cmp(&a.total_solved));
    rows
}

/// Per-platform sums over a snapshot set, in [`Platform::ALL`] order.
pub fn platform_distribution(snapshots: &[DailyRecord]) -> Vec<PlatformTotal> {
    Platform::ALL
        .iter()
        .map(|&platform| PlatformTotal {
            platform,
            total: snapshots.iter().map(|r| u64::from(platform.total(r))).sum(),
        })
        .collect()
}

/// The platform with the most solved problems. First one wins a tie.
pub fn leading_platform(distribution: &[PlatformTotal]) -> Option<Platform> {
    distribution
        .iter()
        .reduce(|best, entry| if entry.total > best.total { entry } else { best })
        .map(|entry| entry.platform)
}

pub fn active_members(snapshots: &[DailyRecord]) -> usize {
    snapshots.iter().filter(|r| r.total_solved > 0).count()
}

/// Keeps the records tagged with `batch` (case-insensitive).
pub fn filter_batch(records: Vec<DailyRecord>, batch: &str) -> Vec<DailyRecord> {
    let wanted = batch.trim();
    records
        .into_iter()
        .filter(|record| {
            record
                .assigned_batch
                .as_deref()
                .is_some_and(|label| label.trim().eq_ignore_ascii_case(wanted))
        })
        .collect()
}

/// Integer average rounded to the nearest whole number, halves up.
pub fn rounded_average(total: u64, count: usize) -> u64 {
    if count == 0 {
        return 0;
    }
    let count = count as u64;
    (total * 2 + count) / (count * 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{in_team, lead, record, scored};

    #[test]
    fn normalize_recomputes_totals_and_orders_by_day() {
        let mut stale = record("a", "2024-01-01");
        stale.leetcode_total = 10;
        stale.codechef_total = 5;
        stale.skillrack_daily_increase = 3;
        stale.total_solved = 999;
        let newer = scored("b", "2024-01-03", 1);
        let broken = scored("c", "not-a-date", 1);

        let normalized = normalize(vec![stale, broken, newer]);
        let order: Vec<&str> = normalized.iter().map(|r| r.member_id.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert_eq!(normalized[1].total_solved, 15);
        assert_eq!(normalized[1].total_daily_increase, 3);
    }

    #[test]
    fn normalize_keeps_duplicates() {
        let normalized = normalize(vec![
            scored("a", "2024-01-01", 1),
            scored("a", "2024-01-01", 2),
        ]);
        assert_eq!(normalized.len(), 2);
    }

    #[test]
    fn latest_snapshot_takes_most_recent_day() {
        let records = normalize(vec![
            scored("a", "2024-01-01", 10),
            scored("a", "2024-01-02", 15),
        ]);
        let latest = latest_by_member(&records);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].date, "2024-01-02");
        assert_eq!(latest[0].leetcode_total, 15);
    }

    #[test]
    fn date_ties_keep_first_seen() {
        let records = vec![scored("a", "2024-01-02", 7), scored("a", "2024-01-02", 9)];
        let latest = latest_by_member(&records);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].leetcode_total, 7);
    }

    #[test]
    fn dated_record_beats_unparsable_one() {
        let records = vec![scored("a", "bad", 9), scored("a", "2024-01-01", 1)];

        let latest = latest_by_member(&records);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].date, "2024-01-01");
        assert_eq!(latest[0].leetcode_total, 1);

        let latest = latest_by_member(&normalize(records));
        assert_eq!(latest[0].date, "2024-01-01");
    }

    #[test]
    fn leads_sort_before_higher_scores() {
        let records = vec![
            scored("b", "2024-01-01", 500),
            lead("a", "2024-01-01", 100),
            scored("c", "2024-01-01", 300),
        ];
        let latest = latest_by_member(&records);
        let order: Vec<&str> = latest.iter().map(|r| r.member_id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_stats_are_zero() {
        let stats = team_stats(&[]);
        assert_eq!(stats.total_members, 0);
        assert_eq!(stats.total_problems, 0);
        assert_eq!(stats.avg_per_member, 0);
        assert_eq!(stats.top_performer, "N/A");
        assert_eq!(stats.top_performer_score, 0);
        assert_eq!(stats.team_lead_name, None);
    }

    #[test]
    fn stats_pick_highest_score_not_first_lead() {
        let snapshots = latest_by_member(&[
            lead("lead", "2024-01-01", 100),
            scored("ace", "2024-01-01", 500),
            scored("mid", "2024-01-01", 201),
        ]);
        let stats = team_stats(&snapshots);
        assert_eq!(stats.total_members, 3);
        assert_eq!(stats.total_problems, 801);
        assert_eq!(stats.avg_per_member, 267);
        assert_eq!(stats.top_performer, "ace");
        assert_eq!(stats.top_performer_score, 500);
        assert_eq!(stats.team_lead_name.as_deref(), Some("lead"));
        assert_eq!(stats.team_lead_score, Some(100));
    }

    #[test]
    fn average_rounds_to_nearest() {
        assert_eq!(rounded_average(10, 4), 3);
        assert_eq!(rounded_average(9, 4), 2);
        assert_eq!(rounded_average(11, 4), 3);
        assert_eq!(rounded_average(5, 0), 0);
    }

    #[test]
    fn leaderboard_ranks_lead_first() {
        let snapshots = latest_by_member(&[
            lead("a", "2024-01-01", 100),
            scored("b", "2024-01-01", 500),
        ]);
        let board = leaderboard(&snapshots);
        assert_eq!(board[0].member_id, "a");
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].member_id, "b");
        assert_eq!(board[1].rank, 2);
    }

    #[test]
    fn equal_scores_get_distinct_ranks() {
        let snapshots = latest_by_member(&[
            scored("a", "2024-01-01", 50),
            scored("b", "2024-01-01", 50),
        ]);
        let ranks: Vec<usize> = leaderboard(&snapshots).iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2]);
    }

    #[test]
    fn comparison_orders_teams_by_total() {
        let records = normalize(vec![
            in_team(scored("a", "2024-01-01", 300), "d", "s", "alpha"),
            in_team(scored("b", "2024-01-01", 100), "d", "s", "beta"),
            in_team(scored("c", "2024-01-01", 120), "d", "s", "gamma"),
            in_team(scored("e", "2024-01-01", 80), "d", "s", "gamma"),
        ]);
        let rows = team_comparison(&records);
        let totals: Vec<u64> = rows.iter().map(|r| r.total_solved).collect();
        assert_eq!(totals, vec![300, 200, 100]);
        assert_eq!(rows[1].key.team_id.as_deref(), Some("gamma"));
        assert_eq!(rows[1].members, 2);
        assert_eq!(rows[1].avg_per_member, 100);
        assert_eq!(rows[1].leetcode_total, 200);
        assert_eq!(rows[1].top_performer, "c");
    }

    #[test]
    fn comparison_uses_latest_day_per_member() {
        let records = normalize(vec![
            in_team(scored("a", "2024-01-01", 10), "d", "s", "alpha"),
            in_team(scored("a", "2024-01-05", 40), "d", "s", "alpha"),
        ]);
        let rows = team_comparison(&records);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].members, 1);
        assert_eq!(rows[0].total_solved, 40);
    }

    #[test]
    fn section_rollup_merges_teams() {
        let records = normalize(vec![
            in_team(scored("a", "2024-01-01", 10), "cse", "a", "t1"),
            in_team(scored("b", "2024-01-01", 20), "cse", "a", "t2"),
            in_team(scored("c", "2024-01-01", 5), "cse", "b", "t3"),
        ]);
        let rows = compare_groups(&records, Level::Section);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key.to_string(), "cse/a");
        assert_eq!(rows[0].total_solved, 30);
        assert_eq!(rows[0].key.team_id, None);

        let departments = compare_groups(&records, Level::Department);
        assert_eq!(departments.len(), 1);
        assert_eq!(departments[0].members, 3);
    }

    #[test]
    fn comparison_of_nothing_is_empty() {
        assert!(team_comparison(&[]).is_empty());
    }

    #[test]
    fn platform_distribution_sums_snapshots() {
        let mut first = scored("a", "2024-01-01", 10);
        first.hackerrank_total = 30;
        first.recompute_totals();
        let second = scored("b", "2024-01-01", 5);
        let distribution = platform_distribution(&[first, second]);
        assert_eq!(distribution.len(), 4);
        assert_eq!(distribution[0].total, 15);
        assert_eq!(distribution[3].total, 30);
        assert_eq!(leading_platform(&distribution), Some(Platform::HackerRank));
        assert_eq!(leading_platform(&[]), None);
    }

    #[test]
    fn counts_active_members() {
        let snapshots = vec![scored("a", "2024-01-01", 0), scored("b", "2024-01-01", 3)];
        assert_eq!(active_members(&snapshots), 1);
    }

    #[test]
    fn batch_filter_ignores_case() {
        let mut tagged = scored("a", "2024-01-01", 1);
        tagged.assigned_batch = Some("Batch 2026".to_string());
        let untagged = scored("b", "2024-01-01", 1);
        let kept = filter_batch(vec![tagged, untagged], "batch 2026");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].member_id, "a");
    }
}
