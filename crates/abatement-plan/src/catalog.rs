use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column holding the project name in the projects file
pub const NAME_COLUMN: &str = "Project Name";
/// Column holding the unit cost in the projects file
pub const COST_COLUMN: &str = "Costs";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing column '{column}' in {file} file")]
    MissingColumn { column: String, file: &'static str },
    #[error("Invalid number '{value}' in column '{column}' on line {line}")]
    InvalidNumber {
        value: String,
        column: String,
        line: u64,
    },
    #[error("Duplicate project: {0}")]
    DuplicateProject(String),
    #[error("Duplicate pollutant: {0}")]
    DuplicatePollutant(String),
    #[error("Unknown project: {0}")]
    UnknownProject(String),
    #[error("Projects file lists no projects")]
    NoProjects,
    #[error("Targets file lists no pollutants")]
    NoTargets,
    #[error("Please select at least one project")]
    EmptySelection,
}

/// A candidate mitigation project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub name: String,
    /// Cost of one unit of the project
    pub cost: f64,
    /// Reduction per unit, in catalog pollutant order
    pub reductions: Vec<f64>,
}

/// Required reduction for one pollutant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(rename = "Pollutant")]
    pub pollutant: String,
    #[serde(rename = "Target")]
    pub value: f64,
}

/// Projects and pollutant targets loaded from the two CSV files
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    projects: Vec<Project>,
    targets: Vec<Target>,
}

impl Catalog {
    /// Load both files from disk
    pub fn load(projects: impl AsRef<Path>, targets: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let projects_file = open(projects.as_ref())?;
        let targets_file = open(targets.as_ref())?;
        Self::from_readers(projects_file, targets_file)
    }

    /// Parse a projects matrix and a targets table
    ///
    /// Pollutants are ordered as in the targets table; each is looked up by
    /// name among the projects file columns.
    pub fn from_readers(projects: impl Read, targets: impl Read) -> Result<Self, CatalogError> {
        let targets = read_targets(targets)?;
        let pollutants: Vec<&str> = targets.iter().map(|t| t.pollutant.as_str()).collect();
        let projects = read_projects(projects, &pollutants)?;

        info!(
            "loaded {} projects and {} pollutant targets",
            projects.len(),
            targets.len()
        );
        Ok(Self { projects, targets })
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    pub fn project_names(&self) -> Vec<String> {
        self.projects.iter().map(|p| p.name.clone()).collect()
    }

    pub fn pollutant_names(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.pollutant.clone()).collect()
    }
}

fn open(path: &Path) -> Result<File, CatalogError> {
    File::open(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn read_targets(reader: impl Read) -> Result<Vec<Target>, CatalogError> {
    let mut csv = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut targets: Vec<Target> = Vec::new();
    let mut seen = HashSet::new();

    for record in csv.deserialize() {
        let target: Target = record?;
        if !seen.insert(target.pollutant.clone()) {
            return Err(CatalogError::DuplicatePollutant(target.pollutant));
        }
        targets.push(target);
    }

    if targets.is_empty() {
        return Err(CatalogError::NoTargets);
    }
    Ok(targets)
}

fn read_projects(reader: impl Read, pollutants: &[&str]) -> Result<Vec<Project>, CatalogError> {
    let mut csv = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = csv.headers()?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| CatalogError::MissingColumn {
                column: name.to_string(),
                file: "projects",
            })
    };
    let name_col = column(NAME_COLUMN)?;
    let cost_col = column(COST_COLUMN)?;
    let pollutant_cols = pollutants
        .iter()
        .map(|p| column(*p))
        .collect::<Result<Vec<_>, _>>()?;

    let mut projects: Vec<Project> = Vec::new();
    let mut seen = HashSet::new();

    for record in csv.records() {
        let record = record?;
        let name = record.get(name_col).unwrap_or_default().to_string();
        if !seen.insert(name.clone()) {
            return Err(CatalogError::DuplicateProject(name));
        }

        let cost = parse_number(&record, &headers, cost_col)?;
        let reductions = pollutant_cols
            .iter()
            .map(|&col| parse_number(&record, &headers, col))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("project {}: cost {}", name, cost);
        projects.push(Project {
            name,
            cost,
            reductions,
        });
    }

    if projects.is_empty() {
        return Err(CatalogError::NoProjects);
    }
    Ok(projects)
}

fn parse_number(record: &StringRecord, headers: &StringRecord, col: usize) -> Result<f64, CatalogError> {
    let value = record.get(col).unwrap_or_default();
    value.parse::<f64>().map_err(|_| CatalogError::InvalidNumber {
        value: value.to_string(),
        column: headers.get(col).unwrap_or_default().to_string(),
        line: record.position().map_or(0, |p| p.line()),
    })
}
