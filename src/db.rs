use std::collections::BTreeMap;

use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::hierarchy::{Department, Hierarchy, Scope, Section, Team};
use crate::models::DailyRecord;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

struct SeedMember {
    id: &'static str,
    team: (&'static str, &'static str, &'static str),
    name: &'static str,
    email: &'static str,
    is_team_lead: bool,
    assigned_team_lead: Option<&'static str>,
    batch: &'static str,
    start: [i32; 4],
    daily: [i32; 4],
}

const SEED_DAYS: i64 = 7;

/// Loads a small demo organization with a week of history ending today.
pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO practice_rollup.departments (id, name)
        VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
        "#,
    )
    .bind("cse")
    .bind("Computer Science")
    .execute(pool)
    .await?;

    for (section_id, name) in [("a", "Section A"), ("b", "Section B")] {
        sqlx::query(
            r#"
            INSERT INTO practice_rollup.sections (dept_id, id, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (dept_id, id) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind("cse")
        .bind(section_id)
        .bind(name)
        .execute(pool)
        .await?;
    }

    let teams = vec![
        ("a", "alpha", "Team Alpha", "Graph and DP drills", "Avery Lee"),
        ("a", "beta", "Team Beta", "Contest practice", "Jules Moreno"),
        ("b", "gamma", "Team Gamma", "Interview preparation", "Kiara Patel"),
    ];

    for (section_id, team_id, name, description, lead) in teams {
        sqlx::query(
            r#"
            INSERT INTO practice_rollup.teams
            (dept_id, section_id, id, name, description, team_lead_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (dept_id, section_id, id) DO UPDATE
            SET name = EXCLUDED.name,
                description = EXCLUDED.description,
                team_lead_name = EXCLUDED.team_lead_name
            "#,
        )
        .bind("cse")
        .bind(section_id)
        .bind(team_id)
        .bind(name)
        .bind(description)
        .bind(lead)
        .execute(pool)
        .await?;
    }

    let members = vec![
        SeedMember {
            id: "cse-a-001",
            team: ("cse", "a", "alpha"),
            name: "Avery Lee",
            email: "avery.lee@example.edu",
            is_team_lead: true,
            assigned_team_lead: None,
            batch: "2026",
            start: [180, 420, 35, 60],
            daily: [2, 5, 0, 1],
        },
        SeedMember {
            id: "cse-a-002",
            team: ("cse", "a", "alpha"),
            name: "Noor Haddad",
            email: "noor.haddad@example.edu",
            is_team_lead: false,
            assigned_team_lead: Some("Avery Lee"),
            batch: "2026",
            start: [310, 600, 80, 45],
            daily: [4, 6, 1, 0],
        },
        SeedMember {
            id: "cse-a-003",
            team: ("cse", "a", "beta"),
            name: "Jules Moreno",
            email: "jules.moreno@example.edu",
            is_team_lead: true,
            assigned_team_lead: None,
            batch: "2025",
            start: [95, 210, 12, 30],
            daily: [1, 3, 0, 0],
        },
        SeedMember {
            id: "cse-b-001",
            team: ("cse", "b", "gamma"),
            name: "Kiara Patel",
            email: "kiara.patel@example.edu",
            is_team_lead: true,
            assigned_team_lead: None,
            batch: "2026",
            start: [260, 380, 50, 70],
            daily: [3, 2, 1, 1],
        },
        SeedMember {
            id: "cse-b-002",
            team: ("cse", "b", "gamma"),
            name: "Mateo Silva",
            email: "mateo.silva@example.edu",
            is_team_lead: false,
            assigned_team_lead: Some("Kiara Patel"),
            batch: "2025",
            start: [40, 150, 5, 20],
            daily: [1, 4, 0, 1],
        },
    ];

    let today = Utc::now().date_naive();

    for member in &members {
        let (dept_id, section_id, team_id) = member.team;
        sqlx::query(
            r#"
            INSERT INTO practice_rollup.members
            (id, dept_id, section_id, team_id, full_name, email,
             is_team_lead, assigned_team_lead, assigned_batch)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                email = EXCLUDED.email,
                is_team_lead = EXCLUDED.is_team_lead,
                assigned_team_lead = EXCLUDED.assigned_team_lead,
                assigned_batch = EXCLUDED.assigned_batch
            "#,
        )
        .bind(member.id)
        .bind(dept_id)
        .bind(section_id)
        .bind(team_id)
        .bind(member.name)
        .bind(member.email)
        .bind(member.is_team_lead)
        .bind(member.assigned_team_lead)
        .bind(member.batch)
        .execute(pool)
        .await?;

        for offset in 0..SEED_DAYS {
            let day = today - Duration::days(SEED_DAYS - 1 - offset);
            let elapsed = offset as i32;
            let total = |slot: usize| member.start[slot] + member.daily[slot] * elapsed;
            let increase = |slot: usize| if offset == 0 { 0 } else { member.daily[slot] };

            sqlx::query(
                r#"
                INSERT INTO practice_rollup.daily_totals
                (id, member_id, day,
                 leetcode_total, leetcode_daily_increase,
                 skillrack_total, skillrack_daily_increase,
                 codechef_total, codechef_daily_increase,
                 hackerrank_total, hackerrank_daily_increase,
                 github_repos, github_daily_increase)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                ON CONFLICT (member_id, day) DO UPDATE
                SET leetcode_total = EXCLUDED.leetcode_total,
                    leetcode_daily_increase = EXCLUDED.leetcode_daily_increase,
                    skillrack_total = EXCLUDED.skillrack_total,
                    skillrack_daily_increase = EXCLUDED.skillrack_daily_increase,
                    codechef_total = EXCLUDED.codechef_total,
                    codechef_daily_increase = EXCLUDED.codechef_daily_increase,
                    hackerrank_total = EXCLUDED.hackerrank_total,
                    hackerrank_daily_increase = EXCLUDED.hackerrank_daily_increase
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(member.id)
            .bind(day)
            .bind(total(0))
            .bind(increase(0))
            .bind(total(1))
            .bind(increase(1))
            .bind(total(2))
            .bind(increase(2))
            .bind(total(3))
            .bind(increase(3))
            .bind(4)
            .bind(0)
            .execute(pool)
            .await?;
        }
    }

    tracing::info!(members = members.len(), days = SEED_DAYS, "seeded demo organization");
    Ok(())
}

pub async fn load_hierarchy(pool: &PgPool) -> anyhow::Result<Hierarchy> {
    let mut hierarchy = Hierarchy::default();

    let departments = sqlx::query("SELECT id, name FROM practice_rollup.departments ORDER BY id")
        .fetch_all(pool)
        .await
        .context("failed to load departments")?;

    for row in departments {
        let id: String = row.get("id");
        hierarchy.departments.insert(
            id.clone(),
            Department {
                id,
                name: row.get("name"),
                sections: BTreeMap::new(),
            },
        );
    }

    let sections = sqlx::query(
        "SELECT dept_id, id, name FROM practice_rollup.sections ORDER BY dept_id, id",
    )
    .fetch_all(pool)
    .await
    .context("failed to load sections")?;

    for row in sections {
        let section = Section {
            id: row.get("id"),
            name: row.get("name"),
            dept_id: row.get("dept_id"),
            teams: BTreeMap::new(),
        };
        match hierarchy.departments.get_mut(&section.dept_id) {
            Some(dept) => {
                dept.sections.insert(section.id.clone(), section);
            }
            None => tracing::warn!(section = %section.id, dept = %section.dept_id, "section without department"),
        }
    }

    let teams = sqlx::query(
        "SELECT dept_id, section_id, id, name, description, team_lead_name \
         FROM practice_rollup.teams ORDER BY dept_id, section_id, id",
    )
    .fetch_all(pool)
    .await
    .context("failed to load teams")?;

    for row in teams {
        let team = Team {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            section_id: row.get("section_id"),
            dept_id: row.get("dept_id"),
            team_lead_name: row.get("team_lead_name"),
        };
        match hierarchy
            .departments
            .get_mut(&team.dept_id)
            .and_then(|dept| dept.sections.get_mut(&team.section_id))
        {
            Some(section) => {
                section.teams.insert(team.id.clone(), team);
            }
            None => tracing::warn!(team = %team.id, section = %team.section_id, "team without section"),
        }
    }

    Ok(hierarchy)
}

pub async fn fetch_records(pool: &PgPool, scope: &Scope) -> anyhow::Result<Vec<DailyRecord>> {
    let mut query = String::from(
        "SELECT d.id, d.day, m.id AS member_id, m.full_name, m.email, \
         m.team_id, m.section_id, m.dept_id, m.is_team_lead, \
         m.assigned_team_lead, m.assigned_batch, \
         d.leetcode_total, d.leetcode_daily_increase, \
         d.skillrack_total, d.skillrack_daily_increase, \
         d.codechef_total, d.codechef_daily_increase, \
         d.hackerrank_total, d.hackerrank_daily_increase, \
         d.github_repos, d.github_daily_increase \
         FROM practice_rollup.daily_totals d \
         JOIN practice_rollup.members m ON m.id = d.member_id",
    );

    let filters: Vec<&str> = match scope {
        Scope::All => Vec::new(),
        Scope::Department { dept } => vec![dept.as_str()],
        Scope::Section { dept, section } => vec![dept.as_str(), section.as_str()],
        Scope::Team {
            dept,
            section,
            team,
        } => vec![dept.as_str(), section.as_str(), team.as_str()],
    };

    let columns = ["m.dept_id", "m.section_id", "m.team_id"];
    for (index, column) in columns.iter().take(filters.len()).enumerate() {
        let keyword = if index == 0 { "WHERE" } else { "AND" };
        query.push_str(&format!(" {keyword} {column} = ${}", index + 1));
    }
    query.push_str(" ORDER BY d.day DESC");

    let mut rows = sqlx::query(&query);
    for value in filters {
        rows = rows.bind(value);
    }

    let fetched = rows
        .fetch_all(pool)
        .await
        .with_context(|| format!("failed to load daily totals for {scope}"))?;

    fetched.iter().map(record_from_row).collect()
}

fn record_from_row(row: &PgRow) -> anyhow::Result<DailyRecord> {
    let id: Uuid = row.try_get("id")?;
    let day: NaiveDate = row.try_get("day")?;

    let mut record = DailyRecord {
        id: id.to_string(),
        date: day.to_string(),
        member_id: row.try_get("member_id")?,
        member_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        team_id: row.try_get("team_id")?,
        section_id: row.try_get("section_id")?,
        dept_id: row.try_get("dept_id")?,
        leetcode_total: counter(row, "leetcode_total")?,
        leetcode_daily_increase: counter(row, "leetcode_daily_increase")?,
        skillrack_total: counter(row, "skillrack_total")?,
        skillrack_daily_increase: counter(row, "skillrack_daily_increase")?,
        codechef_total: counter(row, "codechef_total")?,
        codechef_daily_increase: counter(row, "codechef_daily_increase")?,
        hackerrank_total: counter(row, "hackerrank_total")?,
        hackerrank_daily_increase: counter(row, "hackerrank_daily_increase")?,
        github_repos: counter(row, "github_repos")?,
        github_daily_increase: counter(row, "github_daily_increase")?,
        total_solved: 0,
        total_daily_increase: 0,
        is_team_lead: row.try_get("is_team_lead")?,
        assigned_team_lead: row.try_get("assigned_team_lead")?,
        assigned_batch: row.try_get("assigned_batch")?,
    };
    record.recompute_totals();
    Ok(record)
}

/// Missing counters read as zero; negative ones are clamped.
fn counter(row: &PgRow, column: &str) -> anyhow::Result<u32> {
    let value: Option<i32> = row.try_get(column)?;
    Ok(value.unwrap_or(0).max(0) as u32)
}
