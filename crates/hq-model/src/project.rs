//! Project definitions.
//!
//! A project definition is a TOML file describing the organization, the
//! configured metric sources and the subjects to measure: the project
//! itself, its products, environments and teams.
//!
//! ```toml
//! organization = "Organization"
//! name = "Project"
//! history_file = "history.json"
//!
//! [sources.sonar]
//! kind = "sonar"
//! url = "https://sonar.example.org/"
//!
//! [metric_sources]
//! sonar = ["sonar"]
//!
//! [[products]]
//! name = "Backend"
//! short_name = "BE"
//! kind = "component"
//! metric_source_ids = { sonar = "nl.example:backend" }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{ModelError, Result};
use crate::requirement::{Requirement, SubjectKind};
use crate::source::{SourceConfig, SourceRole};
use crate::target::TechnicalDebtTarget;
use crate::value::MetricValue;

/// Section identifiers that subjects may not use as short name.
pub const RESERVED_SHORT_NAMES: [&str; 3] = ["MM", "PC", "PD"];

/// One id or a list of ids for a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceIds {
    One(String),
    Many(Vec<String>),
}

impl SourceIds {
    fn into_vec(self) -> Vec<String> {
        match self {
            SourceIds::One(id) => vec![id],
            SourceIds::Many(ids) => ids,
        }
    }
}

/// Accepted technical debt for a metric, as configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebtDefinition {
    /// Accepted value, or the initial value of a changing target.
    pub value: f64,
    /// Value to reach at `end`.
    #[serde(default)]
    pub end_value: Option<f64>,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub explanation: String,
}

impl DebtDefinition {
    /// Converts the definition into a fixed or changing debt target.
    ///
    /// # Errors
    ///
    /// Returns an error for a changing target whose end lies before its start.
    pub fn to_target(&self) -> Result<TechnicalDebtTarget> {
        match (self.end_value, self.start, self.end) {
            (Some(end_value), Some(start), Some(end)) => TechnicalDebtTarget::dynamic(
                self.value,
                start.and_time(chrono::NaiveTime::MIN),
                end_value,
                end.and_time(chrono::NaiveTime::MIN),
                self.explanation.clone(),
            ),
            _ => Ok(TechnicalDebtTarget::fixed(
                self.value,
                self.explanation.clone(),
            )),
        }
    }
}

/// Per-metric overrides for a subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricOptions {
    #[serde(default)]
    pub target: Option<MetricValue>,
    #[serde(default)]
    pub low_target: Option<MetricValue>,
    #[serde(default)]
    pub debt: Option<DebtDefinition>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Branches left out of the unmerged branches count.
    #[serde(default)]
    pub branches_to_ignore: Vec<String>,
    /// Branches whose name matches are left out of the unmerged branches count.
    #[serde(default)]
    pub branches_to_ignore_re: Option<String>,
    /// When not empty, the only branches counted.
    #[serde(default)]
    pub branches_to_include: Vec<String>,
}

/// A subject as written in the project definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectDefinition {
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    /// Product kind; ignored for environments and teams.
    #[serde(default)]
    pub kind: Option<SubjectKind>,
    #[serde(default)]
    pub is_main: Option<bool>,
    #[serde(default)]
    pub metric_source_ids: BTreeMap<String, SourceIds>,
    /// Requirements added on top of the defaults.
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub removed_requirements: Vec<Requirement>,
    #[serde(default)]
    pub metric_options: BTreeMap<String, MetricOptions>,
}

/// A dashboard column header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardColumn {
    pub header: String,
    #[serde(default = "one")]
    pub colspan: u32,
}

/// A dashboard cell: a section id or a free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardCell {
    pub cell: String,
    #[serde(default = "white")]
    pub color: String,
    #[serde(default = "one")]
    pub colspan: u32,
    #[serde(default = "one")]
    pub rowspan: u32,
}

/// Layout of the dashboard table on top of the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    #[serde(default)]
    pub columns: Vec<DashboardColumn>,
    #[serde(default)]
    pub rows: Vec<Vec<DashboardCell>>,
}

fn one() -> u32 {
    1
}

fn white() -> String {
    "white".to_string()
}

/// The raw project definition file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDefinition {
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub history_file: Option<PathBuf>,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
    /// Role key to source ids, e.g. `sonar = ["sonar"]`.
    #[serde(default)]
    pub metric_sources: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub metric_source_ids: BTreeMap<String, SourceIds>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub metric_options: BTreeMap<String, MetricOptions>,
    #[serde(default)]
    pub products: Vec<SubjectDefinition>,
    #[serde(default)]
    pub environments: Vec<SubjectDefinition>,
    #[serde(default)]
    pub teams: Vec<SubjectDefinition>,
    #[serde(default)]
    pub dashboard: Dashboard,
}

/// Something metrics are measured for.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub kind: SubjectKind,
    pub name: String,
    pub short_name: String,
    pub is_main: bool,
    pub metric_source_ids: BTreeMap<String, Vec<String>>,
    pub added_requirements: Vec<Requirement>,
    pub removed_requirements: Vec<Requirement>,
    pub metric_options: BTreeMap<String, MetricOptions>,
}

impl Subject {
    pub fn new(kind: SubjectKind, name: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            short_name: short_name.into(),
            is_main: true,
            metric_source_ids: BTreeMap::new(),
            added_requirements: Vec::new(),
            removed_requirements: Vec::new(),
            metric_options: BTreeMap::new(),
        }
    }

    /// Requirements in effect: defaults minus removed, plus added.
    pub fn requirements(&self) -> Vec<Requirement> {
        let mut requirements: Vec<Requirement> = self
            .kind
            .default_requirements()
            .iter()
            .copied()
            .filter(|requirement| !self.removed_requirements.contains(requirement))
            .collect();
        for requirement in &self.added_requirements {
            if !requirements.contains(requirement) {
                requirements.push(*requirement);
            }
        }
        requirements
    }

    pub fn has_requirement(&self, requirement: Requirement) -> bool {
        self.requirements().contains(&requirement)
    }

    /// Ids configured for the source instance `source_id`, without empty ids.
    pub fn source_ids(&self, source_id: &str) -> Vec<&str> {
        self.metric_source_ids
            .get(source_id)
            .map(|ids| {
                ids.iter()
                    .map(String::as_str)
                    .filter(|id| !id.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn metric_options(&self, class_name: &str) -> Option<&MetricOptions> {
        self.metric_options.get(class_name)
    }

    fn from_definition(kind: SubjectKind, definition: SubjectDefinition) -> Self {
        let short_name = definition
            .short_name
            .unwrap_or_else(|| default_short_name(&definition.name));
        Self {
            kind,
            name: definition.name,
            short_name,
            is_main: definition.is_main.unwrap_or(true),
            metric_source_ids: definition
                .metric_source_ids
                .into_iter()
                .map(|(source, ids)| (source, ids.into_vec()))
                .collect(),
            added_requirements: definition.requirements,
            removed_requirements: definition.removed_requirements,
            metric_options: definition.metric_options,
        }
    }
}

/// First two alphanumeric characters of the name, upper-cased.
fn default_short_name(name: &str) -> String {
    name.chars()
        .filter(|ch| ch.is_alphanumeric())
        .take(2)
        .collect::<String>()
        .to_uppercase()
}

/// A validated project.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub organization: String,
    pub name: String,
    pub history_file: Option<PathBuf>,
    /// The project as a subject of project-wide metrics.
    pub subject: Subject,
    pub sources: BTreeMap<String, SourceConfig>,
    pub metric_sources: BTreeMap<SourceRole, Vec<String>>,
    pub products: Vec<Subject>,
    pub environments: Vec<Subject>,
    pub teams: Vec<Subject>,
    pub dashboard: Dashboard,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            organization: String::new(),
            name: String::new(),
            history_file: None,
            subject: Subject::new(SubjectKind::Project, "", ""),
            sources: BTreeMap::new(),
            metric_sources: BTreeMap::new(),
            products: Vec::new(),
            environments: Vec::new(),
            teams: Vec::new(),
            dashboard: Dashboard::default(),
        }
    }
}

impl Project {
    /// Loads a project definition.
    ///
    /// A missing file yields the default, empty project so that a report
    /// can still be generated; the problem is logged.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or is not a valid
    /// project definition.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                error!(
                    path = %path.display(),
                    "Project definition not found, using the default project"
                );
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ModelError::Io {
                    operation: "read",
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let definition: ProjectDefinition =
            toml::from_str(&text).map_err(|source| ModelError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let project = Self::from_definition(definition, base_dir)?;
        debug!(
            path = %path.display(),
            products = project.products.len(),
            sources = project.sources.len(),
            "Loaded project definition"
        );
        Ok(project)
    }

    /// Validates a definition. Relative history paths resolve against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown roles, unknown or unsuitable sources and
    /// duplicate or reserved short names.
    pub fn from_definition(definition: ProjectDefinition, base_dir: &Path) -> Result<Self> {
        for (id, source) in &definition.sources {
            if source.kind.is_none() {
                return Err(ModelError::Validation(format!(
                    "source '{id}' has no kind"
                )));
            }
        }
        let mut metric_sources = BTreeMap::new();
        for (key, ids) in definition.metric_sources {
            let role: SourceRole = key.parse().map_err(ModelError::Validation)?;
            for id in &ids {
                let kind = definition
                    .sources
                    .get(id)
                    .and_then(|source| source.kind)
                    .ok_or_else(|| {
                        ModelError::Validation(format!(
                            "metric source '{key}' refers to unknown source '{id}'"
                        ))
                    })?;
                if !role.accepts(kind) {
                    return Err(ModelError::Validation(format!(
                        "source '{id}' ({kind}) cannot be used as {role}"
                    )));
                }
            }
            metric_sources.insert(role, ids);
        }

        let subject = Subject::from_definition(
            SubjectKind::Project,
            SubjectDefinition {
                name: definition.name.clone(),
                short_name: Some(String::new()),
                kind: None,
                is_main: Some(true),
                metric_source_ids: definition.metric_source_ids,
                requirements: definition.requirements,
                removed_requirements: Vec::new(),
                metric_options: definition.metric_options,
            },
        );
        let mut products = Vec::with_capacity(definition.products.len());
        for product in definition.products {
            let kind = product.kind.unwrap_or(SubjectKind::Component);
            if !matches!(kind, SubjectKind::Application | SubjectKind::Component) {
                return Err(ModelError::Validation(format!(
                    "product '{}' must be an application or a component",
                    product.name
                )));
            }
            products.push(Subject::from_definition(kind, product));
        }
        let environments: Vec<Subject> = definition
            .environments
            .into_iter()
            .map(|environment| Subject::from_definition(SubjectKind::Environment, environment))
            .collect();
        let teams: Vec<Subject> = definition
            .teams
            .into_iter()
            .map(|team| Subject::from_definition(SubjectKind::Team, team))
            .collect();

        let mut seen = BTreeSet::new();
        for subject in products.iter().chain(&environments).chain(&teams) {
            if RESERVED_SHORT_NAMES.contains(&subject.short_name.as_str()) {
                return Err(ModelError::Validation(format!(
                    "short name '{}' of '{}' is reserved",
                    subject.short_name, subject.name
                )));
            }
            if !seen.insert(subject.short_name.clone()) {
                return Err(ModelError::Validation(format!(
                    "short name '{}' is used more than once",
                    subject.short_name
                )));
            }
        }

        Ok(Self {
            organization: definition.organization,
            name: definition.name,
            history_file: definition
                .history_file
                .map(|path| if path.is_absolute() { path } else { base_dir.join(path) }),
            subject,
            sources: definition
                .sources
                .into_iter()
                .map(|(id, mut source)| {
                    source.checkout_dir = source
                        .checkout_dir
                        .map(|path| if path.is_absolute() { path } else { base_dir.join(path) });
                    (id, source)
                })
                .collect(),
            metric_sources,
            products,
            environments,
            teams,
            dashboard: definition.dashboard,
        })
    }

    /// Source ids configured for a role, in configuration order.
    pub fn sources_for(&self, role: SourceRole) -> &[String] {
        self.metric_sources
            .get(&role)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn main_products(&self) -> impl Iterator<Item = &Subject> {
        self.products.iter().filter(|product| product.is_main)
    }

    /// All subjects: the project, products, environments and teams.
    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        std::iter::once(&self.subject)
            .chain(&self.products)
            .chain(&self.environments)
            .chain(&self.teams)
    }
}
