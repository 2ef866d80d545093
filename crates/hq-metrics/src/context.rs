use chrono::NaiveDateTime;
use hq_history::CompactHistory;
use hq_model::Project;
use hq_sources::SourceRegistry;

/// Everything a metric needs besides its subject.
#[derive(Clone, Copy)]
pub struct MetricContext<'a> {
    pub project: &'a Project,
    pub sources: &'a SourceRegistry,
    pub history: Option<&'a CompactHistory>,
    /// Moment of the report run; ages are measured against it.
    pub now: NaiveDateTime,
}

impl<'a> MetricContext<'a> {
    pub fn new(project: &'a Project, sources: &'a SourceRegistry, now: NaiveDateTime) -> Self {
        Self {
            project,
            sources,
            history: None,
            now,
        }
    }

    pub fn with_history(mut self, history: &'a CompactHistory) -> Self {
        self.history = Some(history);
        self
    }
}
