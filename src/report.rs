use std::fmt::Write;

use crate::hierarchy::Hierarchy;
use crate::models::DailyRecord;
use crate::rollup;

const LEADERBOARD_ROWS: usize = 10;
const TEAM_ROWS: usize = 10;
const MOVER_ROWS: usize = 5;

/// Markdown summary of a normalized record set.
pub fn build_report(scope: &str, hierarchy: &Hierarchy, records: &[DailyRecord]) -> String {
    let snapshots = rollup::latest_by_member(records);
    let stats = rollup::team_stats(&snapshots);
    let distribution = rollup::platform_distribution(&snapshots);
    let board = rollup::leaderboard(&snapshots);
    let teams = rollup::team_comparison(records);
    let latest_day = records.iter().filter_map(|r| r.day()).max();

    let mut output = String::new();

    let _ = writeln!(output, "# Coding Practice Report");
    match latest_day {
        Some(day) => {
            let _ = writeln!(output, "Generated for {} (latest data {})", scope, day);
        }
        None => {
            let _ = writeln!(output, "Generated for {}", scope);
        }
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");

    if snapshots.is_empty() {
        let _ = writeln!(output, "No members recorded for this scope.");
        return output;
    }

    let _ = writeln!(output, "- Members: {}", stats.total_members);
    let _ = writeln!(
        output,
        "- Active members: {}",
        rollup::active_members(&snapshots)
    );
    let _ = writeln!(output, "- Problems solved: {}", stats.total_problems);
    let _ = writeln!(output, "- Average per member: {}", stats.avg_per_member);
    let _ = writeln!(
        output,
        "- Top performer: {} ({})",
        stats.top_performer, stats.top_performer_score
    );
    if let (Some(name), Some(score)) = (&stats.team_lead_name, stats.team_lead_score) {
        let _ = writeln!(output, "- Team lead: {} ({})", name, score);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Platform Mix");
    for entry in distribution.iter() {
        let _ = writeln!(output, "- {}: {}", entry.platform, entry.total);
    }
    if let Some(platform) = rollup::leading_platform(&distribution) {
        let _ = writeln!(output, "Most used platform: {}", platform);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Leaderboard");
    let _ = writeln!(output, "| Rank | Member | Team | Solved |");
    let _ = writeln!(output, "| ---: | --- | --- | ---: |");
    for entry in board.iter().take(LEADERBOARD_ROWS) {
        let marker = if entry.is_team_lead { " (lead)" } else { "" };
        let _ = writeln!(
            output,
            "| {} | {}{} | {} | {} |",
            entry.rank, entry.member_name, marker, entry.team_id, entry.total_solved
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Team Comparison");
    let _ = writeln!(output, "| Team | Members | Solved | Average | Top performer |");
    let _ = writeln!(output, "| --- | ---: | ---: | ---: | --- |");
    for row in teams.iter().take(TEAM_ROWS) {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} ({}) |",
            hierarchy.label(&row.key),
            row.members,
            row.total_solved,
            row.avg_per_member,
            row.top_performer,
            row.top_performer_score
        );
    }

    let mut movers: Vec<&DailyRecord> = snapshots
        .iter()
        .filter(|r| r.total_daily_increase > 0)
        .collect();
    movers.sort_by(|a, b| b.total_daily_increase.cmp(&a.total_daily_increase));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Latest Daily Movers");
    if movers.is_empty() {
        let _ = writeln!(output, "Nobody solved new problems on their latest day.");
    } else {
        for record in movers.iter().take(MOVER_ROWS) {
            let _ = writeln!(
                output,
                "- {} +{} on {}",
                record.member_name, record.total_daily_increase, record.date
            );
        }
    }

    output
}
