use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{DailyRecord, GroupKey};

/// Department → section → team tree used for navigation and display names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    #[serde(default)]
    pub departments: BTreeMap<String, Department>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sections: BTreeMap<String, Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub name: String,
    pub dept_id: String,
    #[serde(default)]
    pub teams: BTreeMap<String, Team>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub section_id: String,
    pub dept_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_lead_name: Option<String>,
}

impl Hierarchy {
    pub fn department(&self, dept: &str) -> Option<&Department> {
        self.departments.get(dept)
    }

    pub fn section(&self, dept: &str, section: &str) -> Option<&Section> {
        self.department(dept)?.sections.get(section)
    }

    pub fn team(&self, dept: &str, section: &str, team: &str) -> Option<&Team> {
        self.section(dept, section)?.teams.get(team)
    }

    pub fn team_count(&self) -> usize {
        self.departments
            .values()
            .flat_map(|dept| dept.sections.values())
            .map(|section| section.teams.len())
            .sum()
    }

    /// Checks that every id named by `scope` exists in the tree.
    pub fn resolve(&self, scope: &Scope) -> Result<(), ScopeError> {
        match scope {
            Scope::All => Ok(()),
            Scope::Department { dept } => self
                .department(dept)
                .map(|_| ())
                .ok_or_else(|| ScopeError::Unknown(scope.to_string())),
            Scope::Section { dept, section } => self
                .section(dept, section)
                .map(|_| ())
                .ok_or_else(|| ScopeError::Unknown(scope.to_string())),
            Scope::Team {
                dept,
                section,
                team,
            } => self
                .team(dept, section, team)
                .map(|_| ())
                .ok_or_else(|| ScopeError::Unknown(scope.to_string())),
        }
    }

    /// Human-readable label for a rollup row, falling back to raw ids for
    /// nodes the tree does not know about.
    pub fn label(&self, key: &GroupKey) -> String {
        let dept = self
            .department(&key.dept_id)
            .map_or(key.dept_id.as_str(), |d| d.name.as_str());

        let Some(section_id) = key.section_id.as_deref() else {
            return dept.to_string();
        };
        let section = self
            .section(&key.dept_id, section_id)
            .map_or(section_id, |s| s.name.as_str());

        let Some(team_id) = key.team_id.as_deref() else {
            return format!("{dept} / {section}");
        };
        let team = self
            .team(&key.dept_id, section_id, team_id)
            .map_or(team_id, |t| t.name.as_str());

        format!("{dept} / {section} / {team}")
    }
}

/// Slice of the organization a query covers. Each variant contains the
/// records of every narrower scope beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    All,
    Department {
        dept: String,
    },
    Section {
        dept: String,
        section: String,
    },
    Team {
        dept: String,
        section: String,
        team: String,
    },
}

impl Scope {
    pub fn contains(&self, record: &DailyRecord) -> bool {
        match self {
            Scope::All => true,
            Scope::Department { dept } => record.dept_id == *dept,
            Scope::Section { dept, section } => {
                record.dept_id == *dept && record.section_id == *section
            }
            Scope::Team {
                dept,
                section,
                team,
            } => {
                record.dept_id == *dept
                    && record.section_id == *section
                    && record.team_id == *team
            }
        }
    }
}

impl FromStr for Scope {
    type Err = ScopeError;

    /// Accepts `all` (or an empty string), `dept`, `dept/section` and
    /// `dept/section/team`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim().trim_matches('/');
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(Scope::All);
        }

        let parts: Vec<&str> = trimmed.split('/').map(str::trim).collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(ScopeError::EmptySegment(raw.to_string()));
        }

        match parts.as_slice() {
            [dept] => Ok(Scope::Department {
                dept: dept.to_string(),
            }),
            [dept, section] => Ok(Scope::Section {
                dept: dept.to_string(),
                section: section.to_string(),
            }),
            [dept, section, team] => Ok(Scope::Team {
                dept: dept.to_string(),
                section: section.to_string(),
                team: team.to_string(),
            }),
            _ => Err(ScopeError::TooDeep(raw.to_string())),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => f.write_str("all departments"),
            Scope::Department { dept } => f.write_str(dept),
            Scope::Section { dept, section } => write!(f, "{dept}/{section}"),
            Scope::Team {
                dept,
                section,
                team,
            } => write!(f, "{dept}/{section}/{team}"),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("scope '{0}' has an empty path segment")]
    EmptySegment(String),
    #[error("scope '{0}' is deeper than dept/section/team")]
    TooDeep(String),
    #[error("scope '{0}' does not exist in the hierarchy")]
    Unknown(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{in_team, record};

    fn sample() -> Hierarchy {
        let team = Team {
            id: "alpha".to_string(),
            name: "Team Alpha".to_string(),
            description: String::new(),
            section_id: "a".to_string(),
            dept_id: "cse".to_string(),
            team_lead_name: None,
        };
        let section = Section {
            id: "a".to_string(),
            name: "Section A".to_string(),
            dept_id: "cse".to_string(),
            teams: BTreeMap::from([("alpha".to_string(), team)]),
        };
        let dept = Department {
            id: "cse".to_string(),
            name: "Computer Science".to_string(),
            sections: BTreeMap::from([("a".to_string(), section)]),
        };
        Hierarchy {
            departments: BTreeMap::from([("cse".to_string(), dept)]),
        }
    }

    #[test]
    fn parses_scope_paths() {
        assert_eq!("".parse::<Scope>().unwrap(), Scope::All);
        assert_eq!("ALL".parse::<Scope>().unwrap(), Scope::All);
        assert_eq!(
            "cse/a".parse::<Scope>().unwrap(),
            Scope::Section {
                dept: "cse".to_string(),
                section: "a".to_string()
            }
        );
        assert!(matches!(
            "cse//alpha".parse::<Scope>(),
            Err(ScopeError::EmptySegment(_))
        ));
        assert!(matches!(
            "cse/a/alpha/x".parse::<Scope>(),
            Err(ScopeError::TooDeep(_))
        ));
    }

    #[test]
    fn wider_scopes_contain_narrower_records() {
        let rec = in_team(record("m", "2024-01-01"), "cse", "a", "alpha");
        let other = in_team(record("n", "2024-01-01"), "cse", "b", "beta");
        let team: Scope = "cse/a/alpha".parse().unwrap();
        let section: Scope = "cse/a".parse().unwrap();
        let dept: Scope = "cse".parse().unwrap();

        assert!(team.contains(&rec) && section.contains(&rec) && dept.contains(&rec));
        assert!(!team.contains(&other) && !section.contains(&other));
        assert!(dept.contains(&other));
        assert!(Scope::All.contains(&other));
    }

    #[test]
    fn resolves_known_nodes_only() {
        let tree = sample();
        assert!(tree.resolve(&"cse/a/alpha".parse().unwrap()).is_ok());
        assert_eq!(
            tree.resolve(&"cse/b".parse().unwrap()),
            Err(ScopeError::Unknown("cse/b".to_string()))
        );
        assert_eq!(tree.team_count(), 1);
    }

    #[test]
    fn labels_fall_back_to_ids() {
        let tree = sample();
        let known = GroupKey {
            dept_id: "cse".to_string(),
            section_id: Some("a".to_string()),
            team_id: Some("alpha".to_string()),
        };
        assert_eq!(tree.label(&known), "Computer Science / Section A / Team Alpha");

        let unknown = GroupKey {
            dept_id: "ece".to_string(),
            section_id: Some("z".to_string()),
            team_id: None,
        };
        assert_eq!(tree.label(&unknown), "ece / z");
    }
}
