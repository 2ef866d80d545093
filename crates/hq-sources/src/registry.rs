//! Source instances of a project, built from its configuration.
//!
//! Every configured source gets its own opener with the credentials of that
//! source. All openers share one [`TimeoutTracker`], so a host that times
//! out is skipped by every adapter for the rest of the run.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use hq_model::{Project, SourceConfig, SourceKind, SourceRole};
use tracing::{debug, error};

use crate::checkmarx::{self, Checkmarx};
use crate::error::Result;
use crate::git::{CommandRun, Git, GitCommand};
use crate::gitlab::GitLabCi;
use crate::happiness::Happiness;
use crate::jacoco::JacocoReport;
use crate::jenkins::Jenkins;
use crate::jenkins_test_report::JenkinsTestReport;
use crate::jira::Jira;
use crate::junit::JunitTestReport;
use crate::lcov::LcovReport;
use crate::opener::{Credentials, TimeoutTracker, UrlOpener, UrlRead};
use crate::owasp::OwaspDependencyReport;
use crate::robot_framework::RobotFrameworkReport;
use crate::sonar::Sonar;
use crate::source::{CiServer, CoverageReport, MetricSource, TestReport};
use crate::testng::TestNgReport;
use crate::trello::Trello;
use crate::zap::ZapScanReport;

/// Where Git sources clone to when the configuration names no directory.
pub const DEFAULT_CHECKOUT_DIR: &str = "repos";

/// A configured source instance.
pub enum Source {
    Sonar(Sonar),
    Jenkins(Jenkins),
    JenkinsTestReport(JenkinsTestReport),
    Junit(JunitTestReport),
    GitLab(GitLabCi),
    Jira(Jira),
    Trello(Trello),
    Owasp(OwaspDependencyReport),
    Zap(ZapScanReport),
    Checkmarx(Checkmarx),
    Happiness(Happiness),
    Jacoco(JacocoReport),
    Lcov(LcovReport),
    Git(Git),
    RobotFramework(RobotFrameworkReport),
    TestNg(TestNgReport),
}

impl Source {
    pub fn as_metric_source(&self) -> &dyn MetricSource {
        match self {
            Source::Sonar(source) => source,
            Source::Jenkins(source) => source,
            Source::JenkinsTestReport(source) => source,
            Source::Junit(source) => source,
            Source::GitLab(source) => source,
            Source::Jira(source) => source,
            Source::Trello(source) => source,
            Source::Owasp(source) => source,
            Source::Zap(source) => source,
            Source::Checkmarx(source) => source,
            Source::Happiness(source) => source,
            Source::Jacoco(source) => source,
            Source::Lcov(source) => source,
            Source::Git(source) => source,
            Source::RobotFramework(source) => source,
            Source::TestNg(source) => source,
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.as_metric_source().kind()
    }

    pub fn as_test_report(&self) -> Option<&dyn TestReport> {
        match self {
            Source::Sonar(source) => Some(source),
            Source::JenkinsTestReport(source) => Some(source),
            Source::Junit(source) => Some(source),
            Source::RobotFramework(source) => Some(source),
            Source::TestNg(source) => Some(source),
            _ => None,
        }
    }

    pub fn as_coverage_report(&self) -> Option<&dyn CoverageReport> {
        match self {
            Source::Jacoco(source) => Some(source),
            Source::Lcov(source) => Some(source),
            _ => None,
        }
    }

    pub fn as_git(&self) -> Option<&Git> {
        match self {
            Source::Git(source) => Some(source),
            _ => None,
        }
    }

    pub fn as_ci_server(&self) -> Option<&dyn CiServer> {
        match self {
            Source::Jenkins(source) => Some(source),
            Source::GitLab(source) => Some(source),
            _ => None,
        }
    }

    pub fn as_sonar(&self) -> Option<&Sonar> {
        match self {
            Source::Sonar(source) => Some(source),
            _ => None,
        }
    }

    pub fn as_jira(&self) -> Option<&Jira> {
        match self {
            Source::Jira(source) => Some(source),
            _ => None,
        }
    }

    pub fn as_trello(&self) -> Option<&Trello> {
        match self {
            Source::Trello(source) => Some(source),
            _ => None,
        }
    }

    pub fn as_owasp(&self) -> Option<&OwaspDependencyReport> {
        match self {
            Source::Owasp(source) => Some(source),
            _ => None,
        }
    }

    pub fn as_zap(&self) -> Option<&ZapScanReport> {
        match self {
            Source::Zap(source) => Some(source),
            _ => None,
        }
    }

    pub fn as_checkmarx(&self) -> Option<&Checkmarx> {
        match self {
            Source::Checkmarx(source) => Some(source),
            _ => None,
        }
    }

    pub fn as_happiness(&self) -> Option<&Happiness> {
        match self {
            Source::Happiness(source) => Some(source),
            _ => None,
        }
    }
}

/// Source instances by configured id.
#[derive(Default)]
pub struct SourceRegistry {
    sources: BTreeMap<String, Source>,
    roles: BTreeMap<SourceRole, Vec<String>>,
}

impl SourceRegistry {
    /// Builds HTTP backed sources for every configured source.
    ///
    /// A source that cannot be set up, for example because Checkmarx
    /// refuses the credentials, is logged and left out so that its metrics
    /// report missing values.
    pub fn from_project(project: &Project) -> Self {
        let timeouts = Arc::new(TimeoutTracker::new());
        let mut registry = Self {
            sources: BTreeMap::new(),
            roles: project.metric_sources.clone(),
        };
        for (id, config) in &project.sources {
            match http_source(config, &timeouts) {
                Ok(Some(source)) => {
                    debug!(source = %id, kind = %source.kind(), "Configured metric source");
                    registry.sources.insert(id.clone(), source);
                }
                Ok(None) => {}
                Err(err) => error!(source = %id, reason = %err, "Couldn't set up metric source"),
            }
        }
        registry
    }

    /// Builds sources that all read through `opener`.
    pub fn with_opener(project: &Project, opener: Arc<dyn UrlRead>) -> Self {
        Self::with_runners(project, opener, Arc::new(GitCommand))
    }

    /// Builds sources that read through `opener` and run `git` through `commands`.
    pub fn with_runners(
        project: &Project,
        opener: Arc<dyn UrlRead>,
        commands: Arc<dyn CommandRun>,
    ) -> Self {
        let mut registry = Self {
            sources: BTreeMap::new(),
            roles: project.metric_sources.clone(),
        };
        for (id, config) in &project.sources {
            match build_source(config, Arc::clone(&opener), &commands) {
                Ok(Some(source)) => {
                    registry.sources.insert(id.clone(), source);
                }
                Ok(None) => {}
                Err(err) => error!(source = %id, reason = %err, "Couldn't set up metric source"),
            }
        }
        registry
    }

    pub fn get(&self, id: &str) -> Option<&Source> {
        self.sources.get(id)
    }

    /// Sources configured for a role, with their ids, in configuration order.
    pub fn for_role(&self, role: SourceRole) -> Vec<(&str, &Source)> {
        self.roles
            .get(&role)
            .into_iter()
            .flatten()
            .filter_map(|id| {
                self.sources
                    .get(id)
                    .filter(|source| role.accepts(source.kind()))
                    .map(|source| (id.as_str(), source))
            })
            .collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

fn credentials(config: &SourceConfig) -> Credentials {
    let kind = config.kind;
    if kind == Some(SourceKind::GitlabCi) {
        return config
            .resolved_token()
            .map_or(Credentials::None, Credentials::PrivateToken);
    }
    match (&config.username, config.resolved_password(), config.resolved_token()) {
        (Some(username), Some(password), _) => Credentials::Basic {
            username: username.clone(),
            password,
        },
        (_, _, Some(token)) if kind != Some(SourceKind::Trello) => Credentials::Bearer(token),
        _ => Credentials::None,
    }
}

fn http_source(config: &SourceConfig, timeouts: &Arc<TimeoutTracker>) -> Result<Option<Source>> {
    if config.kind == Some(SourceKind::Checkmarx) {
        let login = UrlOpener::new(Credentials::None, Arc::clone(timeouts))?;
        let token = checkmarx::fetch_token(
            &login,
            &config.url,
            config.username.as_deref().unwrap_or_default(),
            &config.resolved_password().unwrap_or_default(),
        )?;
        let opener = UrlOpener::new(Credentials::Bearer(token), Arc::clone(timeouts))?;
        return Ok(Some(Source::Checkmarx(Checkmarx::new(&config.url, Arc::new(opener)))));
    }
    let opener = UrlOpener::new(credentials(config), Arc::clone(timeouts))?;
    let commands: Arc<dyn CommandRun> = Arc::new(GitCommand);
    build_source(config, Arc::new(opener), &commands)
}

fn git(config: &SourceConfig, commands: &Arc<dyn CommandRun>) -> Git {
    let checkout_dir = config
        .checkout_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CHECKOUT_DIR));
    let git = Git::new(&config.url, config.branch.clone(), checkout_dir, Arc::clone(commands));
    match (&config.username, config.resolved_password()) {
        (Some(username), Some(password)) => git.with_credentials(username.clone(), password),
        _ => git,
    }
}

fn build_source(
    config: &SourceConfig,
    opener: Arc<dyn UrlRead>,
    commands: &Arc<dyn CommandRun>,
) -> Result<Option<Source>> {
    let Some(kind) = config.kind else {
        return Ok(None);
    };
    let url = config.url.as_str();
    Ok(Some(match kind {
        SourceKind::Sonar => Source::Sonar(Sonar::new(url, opener)),
        SourceKind::Jenkins => Source::Jenkins(Jenkins::new(url, config.job_re.clone(), opener)),
        SourceKind::JenkinsTestReport => {
            Source::JenkinsTestReport(JenkinsTestReport::new(url, opener))
        }
        SourceKind::Junit => Source::Junit(JunitTestReport::new(url, opener)),
        SourceKind::GitlabCi => {
            Source::GitLab(GitLabCi::new(url, config.job_re.as_deref(), opener)?)
        }
        SourceKind::Jira => Source::Jira(Jira::new(url, config.field_name.clone(), opener)),
        SourceKind::Trello => Source::Trello(Trello::new(
            url,
            config.appkey.clone().unwrap_or_default(),
            config.resolved_token().unwrap_or_default(),
            config.lists_to_ignore.clone(),
            opener,
        )),
        SourceKind::OwaspDependencyXml => Source::Owasp(OwaspDependencyReport::new(url, opener)),
        SourceKind::ZapScanReport => Source::Zap(ZapScanReport::new(
            url,
            config.false_positives.clone(),
            opener,
        )),
        SourceKind::Checkmarx => Source::Checkmarx(Checkmarx::new(url, opener)),
        SourceKind::Happiness => Source::Happiness(Happiness::new(url, opener)),
        SourceKind::Jacoco => Source::Jacoco(JacocoReport::new(url, opener)),
        SourceKind::Lcov => Source::Lcov(LcovReport::new(url, opener)),
        SourceKind::Git => Source::Git(git(config, commands)),
        SourceKind::RobotFramework => {
            Source::RobotFramework(RobotFrameworkReport::new(url, opener))
        }
        SourceKind::Testng => Source::TestNg(TestNgReport::new(url, opener)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(kind: SourceKind) -> SourceConfig {
        SourceConfig {
            kind: Some(kind),
            url: "http://server/".to_string(),
            ..SourceConfig::default()
        }
    }

    #[test]
    fn gitlab_uses_private_token() {
        let gitlab = SourceConfig {
            token: Some("secret".to_string()),
            ..config(SourceKind::GitlabCi)
        };
        assert_eq!(
            credentials(&gitlab),
            Credentials::PrivateToken("secret".to_string())
        );
    }

    #[test]
    fn username_and_password_use_basic_auth() {
        let jenkins = SourceConfig {
            username: Some("jenkins".to_string()),
            password: Some("pass".to_string()),
            token: Some("ignored".to_string()),
            ..config(SourceKind::Jenkins)
        };
        assert_eq!(
            credentials(&jenkins),
            Credentials::Basic {
                username: "jenkins".to_string(),
                password: "pass".to_string()
            }
        );
    }

    #[test]
    fn trello_token_stays_in_the_query() {
        let trello = SourceConfig {
            token: Some("token".to_string()),
            ..config(SourceKind::Trello)
        };
        assert_eq!(credentials(&trello), Credentials::None);
        let sonar = SourceConfig {
            token: Some("token".to_string()),
            ..config(SourceKind::Sonar)
        };
        assert_eq!(credentials(&sonar), Credentials::Bearer("token".to_string()));
    }
}
