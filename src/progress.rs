use std::collections::BTreeSet;

use crate::models::{DailyRecord, MemberProgress, ProgressPoint};

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("'{name}' matches {count} members; look them up by member id")]
    AmbiguousName { name: String, count: usize },
}

/// History of one member, oldest day first.
///
/// `member` is matched against the member identity first. A display name is
/// accepted only when it belongs to exactly one member. Returns `Ok(None)`
/// when nothing matches.
pub fn member_progress(
    records: &[DailyRecord],
    member: &str,
) -> Result<Option<MemberProgress>, ProgressError> {
    let identity = match resolve_identity(records, member)? {
        Some(identity) => identity,
        None => return Ok(None),
    };

    let mut history: Vec<&DailyRecord> = records
        .iter()
        .filter(|record| record.identity() == identity)
        .collect();
    history.sort_by(|a, b| a.day().cmp(&b.day()));

    let (Some(oldest), Some(newest)) = (history.first(), history.last()) else {
        return Ok(None);
    };

    let total_increase: u64 = history.iter().map(|r| r.total_daily_increase).sum();
    let avg_daily_increase = total_increase as f64 / history.len() as f64;

    Ok(Some(MemberProgress {
        member_id: newest.member_id.clone(),
        member_name: newest.member_name.clone(),
        team_id: newest.team_id.clone(),
        section_id: newest.section_id.clone(),
        dept_id: newest.dept_id.clone(),
        total_growth: newest.total_solved.saturating_sub(oldest.total_solved),
        avg_daily_increase,
        history: history
            .iter()
            .map(|record| ProgressPoint {
                date: record.date.clone(),
                total_solved: record.total_solved,
                leetcode_total: record.leetcode_total,
                skillrack_total: record.skillrack_total,
                codechef_total: record.codechef_total,
                hackerrank_total: record.hackerrank_total,
                daily_increase: record.total_daily_increase,
            })
            .collect(),
    }))
}

fn resolve_identity<'a>(
    records: &'a [DailyRecord],
    member: &str,
) -> Result<Option<&'a str>, ProgressError> {
    if let Some(record) = records.iter().find(|record| record.identity() == member) {
        return Ok(Some(record.identity()));
    }

    let named: BTreeSet<&str> = records
        .iter()
        .filter(|record| record.member_name == member)
        .map(DailyRecord::identity)
        .collect();
    match named.len() {
        0 => Ok(None),
        1 => Ok(named.into_iter().next()),
        count => Err(ProgressError::AmbiguousName {
            name: member.to_string(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::scored;
    use crate::rollup::normalize;

    #[test]
    fn history_runs_oldest_to_newest() {
        let mut day_two = scored("a", "2024-01-02", 14);
        day_two.leetcode_daily_increase = 4;
        let mut day_three = scored("a", "2024-01-03", 20);
        day_three.leetcode_daily_increase = 6;
        let records = normalize(vec![
            day_three,
            scored("b", "2024-01-02", 99),
            scored("a", "2024-01-01", 10),
            day_two,
        ]);

        let progress = member_progress(&records, "a").unwrap().unwrap();
        let dates: Vec<&str> = progress.history.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(progress.total_growth, 10);
        assert!((progress.avg_daily_increase - 10.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn matches_by_display_name() {
        let mut rec = scored("m-7", "2024-01-01", 3);
        rec.member_name = "Kiara Patel".to_string();
        let progress = member_progress(&[rec], "Kiara Patel").unwrap().unwrap();
        assert_eq!(progress.member_id, "m-7");
        assert_eq!(progress.total_growth, 0);
    }

    #[test]
    fn unknown_member_has_no_progress() {
        let progress = member_progress(&[scored("a", "2024-01-01", 1)], "zed").unwrap();
        assert!(progress.is_none());
    }

    #[test]
    fn shared_display_name_is_ambiguous() {
        let mut first = scored("m-1", "2024-01-01", 10);
        first.member_name = "Sam".to_string();
        let mut second = scored("m-2", "2024-01-02", 500);
        second.member_name = "Sam".to_string();
        let records = normalize(vec![first, second]);

        let err = member_progress(&records, "Sam").unwrap_err();
        assert!(matches!(err, ProgressError::AmbiguousName { count: 2, .. }));

        let progress = member_progress(&records, "m-1").unwrap().unwrap();
        assert_eq!(progress.history.len(), 1);
        assert_eq!(progress.total_growth, 0);
    }

    #[test]
    fn id_match_wins_over_another_members_name() {
        let mut named = scored("m-9", "2024-01-01", 4);
        named.member_name = "m-1".to_string();
        let records = vec![scored("m-1", "2024-01-01", 8), named];

        let progress = member_progress(&records, "m-1").unwrap().unwrap();
        assert_eq!(progress.member_id, "m-1");
        assert_eq!(progress.history.len(), 1);
    }
}
