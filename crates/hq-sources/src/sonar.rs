//! SonarQube adapter.
//!
//! The server version decides which url layout is used: 7.0 and later use
//! `componentKeys` and the `project/issues` UI, older servers use
//! `componentRoots` and the `issues/search#` UI. Product keys may carry a
//! branch as `key:branch` when the branch plugin is installed and no
//! component with the full key exists.

use std::sync::{Arc, OnceLock};

use chrono::NaiveDateTime;
use hq_model::SourceKind;
use hq_model::format::version_parts;
use hq_model::parse::parse_iso_datetime;
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Result, SourceError};
use crate::opener::{UrlRead, read_json};
use crate::source::{MetricSource, TestCounts, TestReport};

/// Rules whose issues mark suppressed violations.
pub const SUPPRESSION_RULES: [&str; 7] = [
    "squid:NoSonar",
    "csharpsquid:S1309",
    "squid:S1309",
    "squid:S1310",
    "squid:S1315",
    "Pylint:I0011",
    "Pylint:I0020",
];

const COMPLEX_METHOD_RULES: &[&str] = &[
    "checkstyle:com.puppycrawl.tools.checkstyle.checks.metrics.CyclomaticComplexityCheck",
    "pmd:CyclomaticComplexity",
    "squid:MethodCyclomaticComplexity",
    "csharpsquid:S1541",
    "csharpsquid:FunctionComplexity",
    "javascript:FunctionComplexity",
    "Web:ComplexityCheck",
    "python:FunctionComplexity",
    "vbnet:S1541",
    "tslint:cyclomatic-complexity",
];

const LONG_METHOD_RULES: &[&str] = &[
    "squid:S138",
    "checkstyle:com.puppycrawl.tools.checkstyle.checks.metrics.JavaNCSSCheck",
    "Pylint:R0915",
    "Web:LongJavaScriptCheck",
];

const MANY_PARAMETER_RULES: &[&str] = &[
    "checkstyle:com.puppycrawl.tools.checkstyle.checks.metrics.ParameterNumberCheck",
    "pmd:ExcessiveParameterList",
    "csharpsquid:S107",
    "squid:S00107",
    "javascript:ExcessiveParameterList",
    "python:S107",
];

const COMMENTED_CODE_RULES: &[&str] = &[
    "csharpsquid:S125",
    "csharpsquid:CommentedCode",
    "squid:CommentedOutCodeLine",
    "javascript:CommentedCode",
    "python:S125",
    "Web:AvoidCommentedOutCodeCheck",
];

/// Issue types with their display labels.
pub const VIOLATION_TYPES: [(&str, &str); 3] = [
    ("BUG", "Bugs"),
    ("VULNERABILITY", "Vulnerabilities"),
    ("CODE_SMELL", "Code Smell"),
];

/// Issue severities, most severe first.
pub const SEVERITIES: [&str; 5] = ["Blocker", "Critical", "Major", "Minor", "Info"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Api {
    Legacy,
    Modern,
}

/// A product key split into the Sonar component and optional branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentKey {
    pub component: String,
    pub branch: Option<String>,
}

/// Count and estimated fixing time of a set of issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSummary {
    pub url: String,
    pub count: i64,
    pub effort: String,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(rename = "pageSize", default)]
    page_size: i64,
    total: i64,
}

#[derive(Debug, Deserialize)]
struct Issue {
    effort: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IssueSearch {
    total: Option<i64>,
    paging: Option<Paging>,
    #[serde(default)]
    issues: Vec<Issue>,
}

impl IssueSearch {
    fn count(&self) -> Result<i64> {
        self.total
            .or_else(|| self.paging.as_ref().map(|paging| paging.total))
            .ok_or_else(|| SourceError::Parse("issue search without total".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct Measure {
    metric: String,
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MeasuredComponent {
    #[serde(default)]
    measures: Vec<Measure>,
}

#[derive(Debug, Deserialize)]
struct Measures {
    component: MeasuredComponent,
}

#[derive(Debug, Deserialize)]
struct ShownComponent {
    #[serde(rename = "analysisDate")]
    analysis_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ComponentShow {
    component: Option<ShownComponent>,
}

#[derive(Debug, Deserialize)]
struct ComponentSearch {
    paging: Paging,
}

#[derive(Debug, Deserialize)]
struct Event {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Analysis {
    #[serde(default)]
    events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct Analyses {
    #[serde(default)]
    analyses: Vec<Analysis>,
}

#[derive(Debug, Deserialize)]
struct Plugin {
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Plugins {
    Wrapped { plugins: Vec<Plugin> },
    Bare(Vec<Plugin>),
}

/// Facade over a SonarQube server.
pub struct Sonar {
    url: String,
    opener: Arc<dyn UrlRead>,
    version: OnceLock<Option<String>>,
    branch_plugin: OnceLock<bool>,
}

impl Sonar {
    pub fn new(url: &str, opener: Arc<dyn UrlRead>) -> Self {
        let url = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{url}/")
        };
        Self {
            url,
            opener,
            version: OnceLock::new(),
            branch_plugin: OnceLock::new(),
        }
    }

    /// Server version as reported by `api/server/version`.
    pub fn version_number(&self) -> Option<&str> {
        self.version
            .get_or_init(|| self.fetch_version())
            .as_deref()
    }

    fn fetch_version(&self) -> Option<String> {
        let url = format!("{}api/server/version", self.url);
        match self.opener.url_read(&url) {
            Ok(body) => {
                let version = body.trim().to_string();
                info!(%version, "SonarQube server version retrieved");
                let parts = version_parts(&version);
                if parts < vec![5, 4] {
                    warn!(%version, "SonarQube versions lower than 5.4 are not supported");
                } else if parts >= vec![9, 0] {
                    warn!(%version, "SonarQube versions from 9.0 on are not supported");
                }
                Some(version)
            }
            Err(err) => {
                warn!(reason = %err, "Error retrieving SonarQube server version");
                None
            }
        }
    }

    fn api(&self) -> Api {
        match self.version_number() {
            Some(version) if version_parts(version) >= vec![7, 0] => Api::Modern,
            _ => Api::Legacy,
        }
    }

    fn issue_scope(&self) -> &'static str {
        match self.api() {
            Api::Modern => "componentKeys",
            Api::Legacy => "componentRoots",
        }
    }

    /// Whether the server has the branch plugin installed.
    pub fn is_branch_plugin_installed(&self) -> bool {
        *self.branch_plugin.get_or_init(|| {
            let url = match self.api() {
                Api::Modern => format!("{}api/plugins/installed", self.url),
                Api::Legacy => format!("{}api/updatecenter/installed_plugins?format=json", self.url),
            };
            let plugins = match read_json::<Plugins>(self.opener.as_ref(), &url) {
                Ok(Plugins::Wrapped { plugins } | Plugins::Bare(plugins)) => plugins,
                Err(err) => {
                    warn!(%url, reason = %err, "Assuming the branch plugin is not installed");
                    return false;
                }
            };
            let installed = plugins.iter().any(|plugin| plugin.key == "branch");
            if !installed {
                info!("Branch plugin not installed");
            }
            installed
        })
    }

    fn is_component_absent(&self, key: &str) -> bool {
        let url = format!("{}api/components/show?component={key}", self.url);
        !matches!(
            read_json::<ComponentShow>(self.opener.as_ref(), &url),
            Ok(ComponentShow { component: Some(_) })
        )
    }

    /// Splits `key` into component and branch when the key names a branch.
    pub fn component_key(&self, key: &str) -> ComponentKey {
        let whole = ComponentKey {
            component: key.to_string(),
            branch: None,
        };
        let Some((component, branch)) = key.rsplit_once(':') else {
            return whole;
        };
        let supports_branches = match self.api() {
            Api::Modern => true,
            Api::Legacy => self
                .version_number()
                .is_some_and(|version| version_parts(version) >= vec![6, 7]),
        };
        if supports_branches && self.is_branch_plugin_installed() && self.is_component_absent(key) {
            ComponentKey {
                component: component.to_string(),
                branch: (!branch.is_empty()).then(|| branch.to_string()),
            }
        } else {
            whole
        }
    }

    fn with_branch(url: String, branch: Option<&str>) -> String {
        match branch {
            Some(branch) => format!("{url}&branch={}", urlencoding::encode(branch)),
            None => url,
        }
    }

    /// Whether Sonar has an analysis of the component.
    pub fn has_project(&self, key: &ComponentKey) -> bool {
        if self.version_number().is_none() {
            return false;
        }
        let url = Self::with_branch(
            format!(
                "{}api/components/search?qualifiers=BRC,TRK&q={}",
                self.url, key.component
            ),
            key.branch.as_deref(),
        );
        match read_json::<ComponentSearch>(self.opener.as_ref(), &url) {
            Ok(search) if search.paging.total > 0 => true,
            Ok(_) => {
                warn!(component = %key.component, "Sonar has no analysis");
                false
            }
            Err(err) => {
                warn!(component = %key.component, reason = %err, "Sonar has no analysis");
                false
            }
        }
    }

    fn require_project(&self, key: &ComponentKey) -> Result<()> {
        if self.has_project(key) {
            Ok(())
        } else {
            Err(SourceError::Parse(format!(
                "Sonar has no analysis of {}",
                key.component
            )))
        }
    }

    /// Value of a measure of the product.
    pub fn measure(&self, product: &str, metric: &str) -> Result<f64> {
        let key = self.component_key(product);
        self.require_project(&key)?;
        let url = Self::with_branch(
            format!(
                "{}api/measures/component?component={}&metricKeys={metric}",
                self.url, key.component
            ),
            key.branch.as_deref(),
        );
        let measures: Measures = read_json(self.opener.as_ref(), &url)?;
        measures
            .component
            .measures
            .iter()
            .find(|measure| measure.metric == metric)
            .and_then(|measure| measure.value.as_deref())
            .and_then(|value| value.parse::<f64>().ok())
            .ok_or_else(|| {
                warn!(%product, %metric, %url, "Can't get measure value");
                SourceError::Parse(format!("{metric} not found for {product}"))
            })
    }

    fn count_measure(&self, product: &str, metric: &str) -> Result<i64> {
        self.measure(product, metric).map(|value| value as i64)
    }

    /// Non-comment lines of code.
    pub fn ncloc(&self, product: &str) -> Result<i64> {
        self.count_measure(product, "ncloc")
    }

    pub fn lines(&self, product: &str) -> Result<i64> {
        self.count_measure(product, "lines")
    }

    pub fn blocker_violations(&self, product: &str) -> Result<i64> {
        self.count_measure(product, "blocker_violations")
    }

    pub fn critical_violations(&self, product: &str) -> Result<i64> {
        self.count_measure(product, "critical_violations")
    }

    pub fn major_violations(&self, product: &str) -> Result<i64> {
        self.count_measure(product, "major_violations")
    }

    pub fn unittest_line_coverage(&self, product: &str) -> Result<f64> {
        self.measure(product, "line_coverage")
    }

    pub fn unittest_branch_coverage(&self, product: &str) -> Result<f64> {
        self.measure(product, "branch_coverage")
    }

    pub fn unittests(&self, product: &str) -> Result<i64> {
        self.count_measure(product, "tests")
    }

    /// Failed plus errored unit tests.
    pub fn failing_unittests(&self, product: &str) -> Result<i64> {
        Ok(self.count_measure(product, "test_failures")? + self.count_measure(product, "test_errors")?)
    }

    pub fn methods(&self, product: &str) -> Result<i64> {
        self.count_measure(product, "functions")
    }

    fn issues_api(&self, component: &str) -> String {
        format!(
            "{}api/issues/search?{}={component}&resolved=false",
            self.url,
            self.issue_scope()
        )
    }

    fn rule_violations(&self, product: &str, rules: &[&str]) -> Result<i64> {
        let key = self.component_key(product);
        self.require_project(&key)?;
        let url = Self::with_branch(
            format!("{}&rules={}", self.issues_api(&key.component), rules.join(",")),
            key.branch.as_deref(),
        );
        read_json::<IssueSearch>(self.opener.as_ref(), &url)?.count()
    }

    /// Methods over the cyclomatic complexity threshold.
    pub fn complex_methods(&self, product: &str) -> Result<i64> {
        self.rule_violations(product, COMPLEX_METHOD_RULES)
    }

    pub fn long_methods(&self, product: &str) -> Result<i64> {
        self.rule_violations(product, LONG_METHOD_RULES)
    }

    pub fn many_parameters_methods(&self, product: &str) -> Result<i64> {
        self.rule_violations(product, MANY_PARAMETER_RULES)
    }

    pub fn commented_loc(&self, product: &str) -> Result<i64> {
        self.rule_violations(product, COMMENTED_CODE_RULES)
    }

    pub fn suppressions(&self, product: &str) -> Result<i64> {
        self.rule_violations(product, &SUPPRESSION_RULES)
    }

    /// Number of open issues of a type such as `BUG`.
    pub fn issues_of_type(&self, product: &str, issue_type: &str) -> Result<i64> {
        let key = self.component_key(product);
        self.require_project(&key)?;
        let url = Self::with_branch(
            format!("{}&types={issue_type}", self.issues_api(&key.component)),
            key.branch.as_deref(),
        );
        read_json::<IssueSearch>(self.opener.as_ref(), &url)?.count()
    }

    pub fn maintainability_bugs(&self, product: &str) -> Result<i64> {
        self.issues_of_type(product, "BUG")
    }

    pub fn vulnerabilities(&self, product: &str) -> Result<i64> {
        self.issues_of_type(product, "VULNERABILITY")
    }

    pub fn code_smells(&self, product: &str) -> Result<i64> {
        self.issues_of_type(product, "CODE_SMELL")
    }

    /// Issues of a type and severity with their total effort.
    pub fn violations_type_severity(
        &self,
        product: &str,
        issue_type: &str,
        severity: &str,
    ) -> Result<IssueSummary> {
        let key = self.component_key(product);
        let filter = format!(
            "&types={}&severities={}",
            issue_type.to_uppercase(),
            severity.to_uppercase()
        );
        let url = Self::with_branch(
            format!(
                "{}project/issues?id={}&resolved=false{filter}",
                self.url, key.component
            ),
            key.branch.as_deref(),
        );
        self.require_project(&key)?;
        let api_url = format!("{}{filter}", self.issues_api(&key.component));
        let count = read_json::<IssueSearch>(
            self.opener.as_ref(),
            &Self::with_branch(api_url.clone(), key.branch.as_deref()),
        )?
        .count()?;
        let effort = match self.total_effort_minutes(&api_url, key.branch.as_deref()) {
            Ok(minutes) => format_effort(minutes),
            Err(_) => "-".to_string(),
        };
        Ok(IssueSummary { url, count, effort })
    }

    fn total_effort_minutes(&self, api_url: &str, branch: Option<&str>) -> Result<i64> {
        let mut minutes = 0;
        let mut page_index = 1;
        loop {
            let url = Self::with_branch(
                format!("{api_url}&pageSize=-1&pageIndex={page_index}"),
                branch,
            );
            let page: IssueSearch = read_json(self.opener.as_ref(), &url)?;
            minutes += page
                .issues
                .iter()
                .filter_map(|issue| issue.effort.as_deref())
                .map(effort_minutes)
                .sum::<i64>();
            let Some(paging) = page.paging else { break };
            if paging.page_size <= 0 || page_index * paging.page_size >= paging.total {
                break;
            }
            page_index += 1;
        }
        Ok(minutes)
    }

    fn resolution_count(&self, product: &str, resolution: &str) -> Result<i64> {
        let key = self.component_key(product);
        let url = Self::with_branch(
            format!(
                "{}api/issues/search?resolutions={resolution}&{}={}",
                self.url,
                self.issue_scope(),
                key.component
            ),
            key.branch.as_deref(),
        );
        read_json::<IssueSearch>(self.opener.as_ref(), &url)?.count()
    }

    fn resolution_url(&self, product: &str, resolution: &str) -> String {
        let key = self.component_key(product);
        let url = match self.api() {
            Api::Modern => format!(
                "{}project/issues?id={}&resolutions={resolution}",
                self.url, key.component
            ),
            Api::Legacy => format!(
                "{}issues/search#resolutions={resolution}|componentRoots={}",
                self.url, key.component
            ),
        };
        Self::with_branch(url, key.branch.as_deref())
    }

    pub fn false_positives(&self, product: &str) -> Result<i64> {
        self.resolution_count(product, "FALSE-POSITIVE")
    }

    pub fn false_positives_url(&self, product: &str) -> String {
        self.resolution_url(product, "FALSE-POSITIVE")
    }

    pub fn wont_fix(&self, product: &str) -> Result<i64> {
        self.resolution_count(product, "WONTFIX")
    }

    pub fn wont_fix_url(&self, product: &str) -> String {
        self.resolution_url(product, "WONTFIX")
    }

    pub fn dashboard_url(&self, product: &str) -> String {
        let key = self.component_key(product);
        Self::with_branch(
            format!("{}dashboard?id={}", self.url, key.component),
            key.branch.as_deref(),
        )
    }

    /// UI url listing the open issues of the product.
    pub fn violations_url(&self, product: &str) -> String {
        let key = self.component_key(product);
        let url = match self.api() {
            Api::Modern => format!("{}project/issues?id={}&resolved=false", self.url, key.component),
            Api::Legacy => format!(
                "{}issues/search#resolved=false|componentRoots={}",
                self.url, key.component
            ),
        };
        Self::with_branch(url, key.branch.as_deref())
    }

    /// UI url listing the open issues of one type.
    pub fn violations_type_url(&self, product: &str, issue_type: &str) -> String {
        let key = self.component_key(product);
        Self::with_branch(
            format!(
                "{}project/issues?id={}&resolved=false&types={issue_type}",
                self.url, key.component
            ),
            key.branch.as_deref(),
        )
    }

    pub fn suppressions_url(&self, product: &str) -> String {
        let key = self.component_key(product);
        let rules = SUPPRESSION_RULES.join(",");
        let url = match self.api() {
            Api::Modern => format!("{}project/issues?id={}&rules={rules}", self.url, key.component),
            Api::Legacy => format!(
                "{}issues/search#rules={rules}|componentRoots={}",
                self.url, key.component
            ),
        };
        Self::with_branch(url, key.branch.as_deref())
    }

    /// Date and time of the last analysis, zone ignored.
    pub fn analysis_datetime(&self, product: &str) -> Result<NaiveDateTime> {
        let key = self.component_key(product);
        let url = Self::with_branch(
            format!("{}api/components/show?component={}", self.url, key.component),
            key.branch.as_deref(),
        );
        let show: ComponentShow = read_json(self.opener.as_ref(), &url)?;
        show.component
            .and_then(|component| component.analysis_date)
            .as_deref()
            .and_then(parse_iso_datetime)
            .ok_or_else(|| {
                warn!(%product, %url, "Couldn't get date of last analysis");
                SourceError::Parse(format!("no analysis date for {product}"))
            })
    }

    /// Version of the product from its last version event, "?" when unknown.
    pub fn product_version(&self, product: &str) -> String {
        let key = self.component_key(product);
        let url = Self::with_branch(
            format!(
                "{}api/project_analyses/search?project={}&format=json&ps=1&category=VERSION",
                self.url, key.component
            ),
            key.branch.as_deref(),
        );
        let version = read_json::<Analyses>(self.opener.as_ref(), &url)
            .ok()
            .and_then(|analyses| analyses.analyses.into_iter().next())
            .and_then(|analysis| analysis.events.into_iter().next())
            .map(|event| event.name);
        version.unwrap_or_else(|| {
            warn!(%product, %url, "Couldn't get version number");
            "?".to_string()
        })
    }
}

impl MetricSource for Sonar {
    fn kind(&self) -> SourceKind {
        SourceKind::Sonar
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn metric_source_urls(&self, ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| self.dashboard_url(id)).collect()
    }
}

impl TestReport for Sonar {
    fn test_counts(&self, id: &str) -> Result<TestCounts> {
        let failed = self.failing_unittests(id)?;
        let skipped = self.count_measure(id, "skipped_tests").unwrap_or(0);
        Ok(TestCounts {
            passed: self.unittests(id)? - failed,
            failed,
            skipped,
        })
    }

    fn report_datetime(&self, id: &str) -> Result<NaiveDateTime> {
        self.analysis_datetime(id)
    }
}

/// Minutes in an effort string such as "1d 2h 30min".
pub fn effort_minutes(effort: &str) -> i64 {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(?P<days>\d+)d)? *(?:(?P<hours>\d+)h)? *(?:(?P<minutes>\d+)min)?$").ok()
    });
    let Some(captures) = pattern.as_ref().and_then(|pattern| pattern.captures(effort)) else {
        warn!(%effort, "Invalid format of field effort");
        return 0;
    };
    [("days", 24 * 60), ("hours", 60), ("minutes", 1)]
        .into_iter()
        .filter_map(|(group, factor)| {
            captures
                .name(group)
                .and_then(|value| value.as_str().parse::<i64>().ok())
                .map(|value| value * factor)
        })
        .sum()
}

/// Formats minutes as "2h 05min" or " 5min".
pub fn format_effort(total_minutes: i64) -> String {
    let (hours, minutes) = (total_minutes / 60, total_minutes % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}min")
    } else {
        format!("{minutes:2}min")
    }
}
