use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db;
use crate::hierarchy::{Hierarchy, Scope};
use crate::models::DailyRecord;

/// Hierarchy and daily records exported to a single JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub hierarchy: Hierarchy,
    #[serde(default)]
    pub records: Vec<DailyRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read snapshot '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot '{path}' is not valid JSON")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SnapshotFile {
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path).map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SourceError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn records_in(&self, scope: &Scope) -> Vec<DailyRecord> {
        self.records
            .iter()
            .filter(|record| scope.contains(record))
            .cloned()
            .collect()
    }
}

/// Where hierarchy and daily records come from. Built once at startup and
/// handed to every command.
#[derive(Debug)]
pub enum DataSource {
    Postgres(PgPool),
    Snapshot(SnapshotFile),
}

impl DataSource {
    pub async fn load_hierarchy(&self) -> anyhow::Result<Hierarchy> {
        match self {
            DataSource::Postgres(pool) => db::load_hierarchy(pool).await,
            DataSource::Snapshot(file) => Ok(file.hierarchy.clone()),
        }
    }

    /// Raw, unnormalized records for `scope`.
    pub async fn load_records(&self, scope: &Scope) -> anyhow::Result<Vec<DailyRecord>> {
        let records = match self {
            DataSource::Postgres(pool) => db::fetch_records(pool, scope).await?,
            DataSource::Snapshot(file) => file.records_in(scope),
        };
        tracing::debug!(%scope, count = records.len(), "loaded daily records");
        Ok(records)
    }

    pub async fn load_team_data(
        &self,
        dept: &str,
        section: &str,
        team: &str,
    ) -> anyhow::Result<Vec<DailyRecord>> {
        self.load_records(&Scope::Team {
            dept: dept.to_string(),
            section: section.to_string(),
            team: team.to_string(),
        })
        .await
    }

    pub async fn load_section_data(
        &self,
        dept: &str,
        section: &str,
    ) -> anyhow::Result<Vec<DailyRecord>> {
        self.load_records(&Scope::Section {
            dept: dept.to_string(),
            section: section.to_string(),
        })
        .await
    }

    pub async fn load_department_data(&self, dept: &str) -> anyhow::Result<Vec<DailyRecord>> {
        self.load_records(&Scope::Department {
            dept: dept.to_string(),
        })
        .await
    }

    pub async fn load_all_departments_data(&self) -> anyhow::Result<Vec<DailyRecord>> {
        self.load_records(&Scope::All).await
    }
}
