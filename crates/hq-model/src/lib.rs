pub mod error;
pub mod format;
pub mod parse;
pub mod project;
pub mod requirement;
pub mod source;
pub mod status;
pub mod target;
pub mod value;

pub use error::{ModelError, Result};
pub use project::{
    Dashboard, DashboardCell, DashboardColumn, DebtDefinition, MetricOptions, Project,
    ProjectDefinition, RESERVED_SHORT_NAMES, Subject, SubjectDefinition,
};
pub use requirement::{Requirement, SubjectKind};
pub use source::{SourceConfig, SourceKind, SourceRole};
pub use status::Status;
pub use target::TechnicalDebtTarget;
pub use value::{MetricValue, render_value};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_subjects_include_project_first() {
        let mut project = Project::default();
        project
            .products
            .push(Subject::new(SubjectKind::Component, "Backend", "BE"));
        project
            .teams
            .push(Subject::new(SubjectKind::Team, "Alpha", "AL"));
        let kinds: Vec<SubjectKind> = project.subjects().map(|subject| subject.kind).collect();
        assert_eq!(
            kinds,
            vec![SubjectKind::Project, SubjectKind::Component, SubjectKind::Team]
        );
    }
}
