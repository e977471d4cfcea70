use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;

use practice_rollup::export::{self, ComparisonCsvRow};
use practice_rollup::hierarchy::{Hierarchy, Scope};
use practice_rollup::logging::{self, LogFormat};
use practice_rollup::models::{DailyRecord, Level};
use practice_rollup::source::{DataSource, SnapshotFile};
use practice_rollup::{db, progress, report, rollup};

#[derive(Parser)]
#[command(name = "practice-rollup")]
#[command(about = "Coding practice leaderboards and team rollups", long_about = None)]
struct Cli {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,
    /// Read hierarchy and records from an exported JSON snapshot instead of Postgres
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,
    #[arg(
        long,
        env = "PRACTICE_ROLLUP_MAX_CONNECTIONS",
        default_value_t = 5,
        global = true
    )]
    max_connections: u32,
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a demo organization with a week of history
    Seed,
    /// Print the department / section / team tree
    Hierarchy,
    /// Summary statistics and platform mix for a scope
    Stats {
        /// all, dept, dept/section or dept/section/team
        #[arg(long, default_value = "all")]
        scope: Scope,
        #[arg(long)]
        batch: Option<String>,
    },
    /// Rank members, team leads first
    Leaderboard {
        #[arg(long, default_value = "all")]
        scope: Scope,
        #[arg(long)]
        batch: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Compare teams, sections or departments by problems solved
    Teams {
        #[arg(long, default_value = "all")]
        scope: Scope,
        #[arg(long, value_enum, default_value_t = LevelArg::Team)]
        level: LevelArg,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Day-by-day history of one member
    Member {
        /// Member id or display name
        member: String,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "all")]
        scope: Scope,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Write hierarchy and records to a JSON snapshot
    Export {
        #[arg(long, default_value = "all")]
        scope: Scope,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LevelArg {
    Team,
    Section,
    Department,
}

impl From<LevelArg> for Level {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Team => Level::Team,
            LevelArg::Section => Level::Section,
            LevelArg::Department => Level::Department,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format)?;

    let source = connect(&cli).await?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(postgres(&source)?).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(postgres(&source)?).await?;
            println!("Seed data inserted.");
        }
        Commands::Hierarchy => {
            let hierarchy = source.load_hierarchy().await?;
            print_hierarchy(&hierarchy);
        }
        Commands::Stats { scope, batch } => {
            let (_, records) = load_scoped(&source, &scope, batch.as_deref()).await?;
            let snapshots = rollup::latest_by_member(&records);
            let stats = rollup::team_stats(&snapshots);
            let distribution = rollup::platform_distribution(&snapshots);

            println!("Statistics for {scope}:");
            println!("- Members: {}", stats.total_members);
            println!("- Active members: {}", rollup::active_members(&snapshots));
            println!("- Problems solved: {}", stats.total_problems);
            println!("- Average per member: {}", stats.avg_per_member);
            println!(
                "- Top performer: {} ({})",
                stats.top_performer, stats.top_performer_score
            );
            if let (Some(name), Some(score)) = (&stats.team_lead_name, stats.team_lead_score) {
                println!("- Team lead: {name} ({score})");
            }
            for entry in distribution.iter() {
                println!("- {}: {}", entry.platform, entry.total);
            }
        }
        Commands::Leaderboard {
            scope,
            batch,
            limit,
            format,
        } => {
            let (_, records) = load_scoped(&source, &scope, batch.as_deref()).await?;
            let mut board = rollup::leaderboard(&rollup::latest_by_member(&records));
            if let Some(limit) = limit {
                board.truncate(limit);
            }

            match format {
                OutputFormat::Csv => print!("{}", export::csv_string(&board)?),
                OutputFormat::Json => println!("{}", export::json_string(&board)?),
                OutputFormat::Text => {
                    if board.is_empty() {
                        println!("No members found for {scope}.");
                        return Ok(());
                    }
                    println!("Leaderboard for {scope}:");
                    for entry in board.iter() {
                        let marker = if entry.is_team_lead { " [lead]" } else { "" };
                        println!(
                            "{:>3}. {}{} ({}/{}/{}) {} solved",
                            entry.rank,
                            entry.member_name,
                            marker,
                            entry.dept_id,
                            entry.section_id,
                            entry.team_id,
                            entry.total_solved
                        );
                    }
                }
            }
        }
        Commands::Teams {
            scope,
            level,
            format,
        } => {
            let (hierarchy, records) = load_scoped(&source, &scope, None).await?;
            let rows = rollup::compare_groups(&records, level.into());

            match format {
                OutputFormat::Csv => {
                    let flat: Vec<ComparisonCsvRow> = rows
                        .iter()
                        .map(|row| ComparisonCsvRow::new(row, &hierarchy))
                        .collect();
                    print!("{}", export::csv_string(&flat)?);
                }
                OutputFormat::Json => println!("{}", export::json_string(&rows)?),
                OutputFormat::Text => {
                    if rows.is_empty() {
                        println!("No teams with data for {scope}.");
                        return Ok(());
                    }
                    for row in rows.iter() {
                        println!(
                            "- {}: {} solved by {} members (avg {}), top {} ({})",
                            hierarchy.label(&row.key),
                            row.total_solved,
                            row.members,
                            row.avg_per_member,
                            row.top_performer,
                            row.top_performer_score
                        );
                    }
                }
            }
        }
        Commands::Member { member } => {
            let records = rollup::normalize(source.load_all_departments_data().await?);
            let Some(summary) = progress::member_progress(&records, &member)? else {
                println!("No data available for member {member}.");
                return Ok(());
            };

            println!(
                "{} ({}/{}/{})",
                summary.member_name, summary.dept_id, summary.section_id, summary.team_id
            );
            println!(
                "Growth {} over {} days, {:.1} per day on average",
                summary.total_growth,
                summary.history.len(),
                summary.avg_daily_increase
            );
            for point in summary.history.iter() {
                println!(
                    "- {}: {} solved (+{})",
                    point.date, point.total_solved, point.daily_increase
                );
            }
        }
        Commands::Report { scope, out } => {
            let (hierarchy, records) = load_scoped(&source, &scope, None).await?;
            let report = report::build_report(&scope.to_string(), &hierarchy, &records);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { scope, out } => {
            let hierarchy = source.load_hierarchy().await?;
            let records = source.load_records(&scope).await?;
            let count = records.len();
            export::write_snapshot(&out, &SnapshotFile { hierarchy, records })?;
            println!("Exported {count} records to {}.", out.display());
        }
    }

    Ok(())
}

async fn connect(cli: &Cli) -> anyhow::Result<DataSource> {
    if let Some(path) = &cli.snapshot {
        tracing::info!(path = %path.display(), "reading snapshot");
        return Ok(DataSource::Snapshot(SnapshotFile::from_path(path)?));
    }

    let database_url = cli
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set, or pass --snapshot")?;

    let pool = PgPoolOptions::new()
        .max_connections(cli.max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")?;

    tracing::info!(max_connections = cli.max_connections, "connected to Postgres");
    Ok(DataSource::Postgres(pool))
}

fn postgres(source: &DataSource) -> anyhow::Result<&sqlx::PgPool> {
    match source {
        DataSource::Postgres(pool) => Ok(pool),
        DataSource::Snapshot(_) => anyhow::bail!("this command needs a database, not a snapshot"),
    }
}

/// Hierarchy plus the normalized records of `scope`, optionally restricted
/// to one batch.
async fn load_scoped(
    source: &DataSource,
    scope: &Scope,
    batch: Option<&str>,
) -> anyhow::Result<(Hierarchy, Vec<DailyRecord>)> {
    let hierarchy = source.load_hierarchy().await?;
    if !hierarchy.departments.is_empty() {
        hierarchy.resolve(scope)?;
    }

    let mut records = match scope {
        Scope::All => source.load_all_departments_data().await?,
        Scope::Department { dept } => source.load_department_data(dept).await?,
        Scope::Section { dept, section } => source.load_section_data(dept, section).await?,
        Scope::Team {
            dept,
            section,
            team,
        } => source.load_team_data(dept, section, team).await?,
    };
    if let Some(batch) = batch {
        records = rollup::filter_batch(records, batch);
        tracing::debug!(batch, count = records.len(), "filtered by batch");
    }

    Ok((hierarchy, rollup::normalize(records)))
}

fn print_hierarchy(hierarchy: &Hierarchy) {
    if hierarchy.departments.is_empty() {
        println!("No departments found.");
        return;
    }

    println!(
        "{} departments, {} teams",
        hierarchy.departments.len(),
        hierarchy.team_count()
    );
    for dept in hierarchy.departments.values() {
        println!("{} ({})", dept.name, dept.id);
        for section in dept.sections.values() {
            println!("  {} ({}/{})", section.name, dept.id, section.id);
            for team in section.teams.values() {
                match &team.team_lead_name {
                    Some(lead) => println!(
                        "    {} ({}/{}/{}) led by {}",
                        team.name, dept.id, section.id, team.id, lead
                    ),
                    None => println!("    {} ({}/{}/{})", team.name, dept.id, section.id, team.id),
                }
            }
        }
    }
}
