// Filter state domain model
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ALL_PROJECTS: &str = "All";
pub const DEFAULT_MONTH: &str = "May";
pub const DEFAULT_SECTION: &str = "dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeFrame {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

/// Active project filter. Serialized as the bare project name, `"All"` for no filter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectSelection {
    #[default]
    All,
    Named(String),
}

impl ProjectSelection {
    pub fn name(&self) -> Option<&str> {
        match self {
            ProjectSelection::All => None,
            ProjectSelection::Named(name) => Some(name),
        }
    }

    pub fn matches(&self, project_name: &str) -> bool {
        match self {
            ProjectSelection::All => true,
            ProjectSelection::Named(name) => name == project_name,
        }
    }
}

impl From<String> for ProjectSelection {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == ALL_PROJECTS {
            ProjectSelection::All
        } else {
            ProjectSelection::Named(trimmed.to_string())
        }
    }
}

impl From<&str> for ProjectSelection {
    fn from(value: &str) -> Self {
        ProjectSelection::from(value.to_string())
    }
}

impl From<ProjectSelection> for String {
    fn from(value: ProjectSelection) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ProjectSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectSelection::All => f.write_str(ALL_PROJECTS),
            ProjectSelection::Named(name) => f.write_str(name),
        }
    }
}

/// The part of the filter state that decides what gets fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFilters {
    pub time_frame: TimeFrame,
    pub secondary_time_frame: String,
    pub project: ProjectSelection,
    pub agent: Option<String>,
}

impl DashboardFilters {
    pub fn new(time_frame: TimeFrame, secondary_time_frame: impl Into<String>) -> Self {
        Self {
            time_frame,
            secondary_time_frame: secondary_time_frame.into(),
            project: ProjectSelection::All,
            agent: None,
        }
    }
}

impl Default for DashboardFilters {
    fn default() -> Self {
        Self::new(TimeFrame::default(), DEFAULT_MONTH)
    }
}

/// A user intent coming from the view layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterIntent {
    #[serde(rename_all = "camelCase")]
    SetTimeFrame { time_frame: TimeFrame },
    #[serde(rename_all = "camelCase")]
    SetSecondaryTimeFrame { secondary_time_frame: String },
    SetProject { project: ProjectSelection },
    SetAgent { agent: Option<String> },
    ResetMonth,
    Reset,
    ToggleSidebar,
    SetActiveSection { section: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub filters: DashboardFilters,
    pub sidebar_collapsed: bool,
    pub active_section: String,
    #[serde(skip)]
    defaults: DashboardFilters,
}

impl FilterState {
    pub fn new(defaults: DashboardFilters) -> Self {
        Self {
            filters: defaults.clone(),
            sidebar_collapsed: false,
            active_section: DEFAULT_SECTION.to_string(),
            defaults,
        }
    }

    pub fn filters(&self) -> &DashboardFilters {
        &self.filters
    }

    pub fn set_time_frame(&mut self, time_frame: TimeFrame) {
        self.filters.time_frame = time_frame;
    }

    pub fn set_secondary_time_frame(&mut self, label: impl Into<String>) {
        self.filters.secondary_time_frame = label.into();
    }

    /// Agents belong to exactly one project, so switching project always drops the agent.
    pub fn set_project(&mut self, project: ProjectSelection) {
        self.filters = DashboardFilters {
            project,
            agent: None,
            ..self.filters.clone()
        };
    }

    pub fn set_agent(&mut self, agent: Option<String>) {
        self.filters.agent = agent.filter(|a| !a.is_empty());
    }

    pub fn reset_month(&mut self) {
        self.filters.secondary_time_frame = self.defaults.secondary_time_frame.clone();
    }

    pub fn reset(&mut self) {
        self.filters = self.defaults.clone();
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_collapsed = !self.sidebar_collapsed;
    }

    pub fn set_active_section(&mut self, section: impl Into<String>) {
        self.active_section = section.into();
    }

    /// Applies an intent and reports whether the fetch-relevant filters changed.
    pub fn apply(&mut self, intent: FilterIntent) -> bool {
        let before = self.filters.clone();
        match intent {
            FilterIntent::SetTimeFrame { time_frame } => self.set_time_frame(time_frame),
            FilterIntent::SetSecondaryTimeFrame {
                secondary_time_frame,
            } => self.set_secondary_time_frame(secondary_time_frame),
            FilterIntent::SetProject { project } => self.set_project(project),
            FilterIntent::SetAgent { agent } => self.set_agent(agent),
            FilterIntent::ResetMonth => self.reset_month(),
            FilterIntent::Reset => self.reset(),
            FilterIntent::ToggleSidebar => self.toggle_sidebar(),
            FilterIntent::SetActiveSection { section } => self.set_active_section(section),
        }
        before != self.filters
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(DashboardFilters::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_agent(project: &str, agent: &str) -> FilterState {
        let mut state = FilterState::default();
        state.set_project(project.into());
        state.set_agent(Some(agent.to_string()));
        state
    }

    #[test]
    fn test_set_project_clears_agent() {
        for (from, to) in [("DTSS", "Siri"), ("Siri", "All"), ("All", "AngerBox")] {
            let mut state = with_agent(from, "agent-1");
            state.set_project(to.into());
            assert_eq!(state.filters.agent, None);
            assert_eq!(state.filters.project, ProjectSelection::from(to));
        }
    }

    #[test]
    fn test_set_project_same_project_still_clears_agent() {
        let mut state = with_agent("DTSS", "agent-1");
        state.set_project("DTSS".into());
        assert_eq!(state.filters.agent, None);
    }

    #[test]
    fn test_reset_month_keeps_other_filters() {
        let mut state = with_agent("DTSS", "agent-1");
        state.set_secondary_time_frame("Jan");
        state.set_time_frame(TimeFrame::Weekly);
        state.reset_month();

        assert_eq!(state.filters.secondary_time_frame, DEFAULT_MONTH);
        assert_eq!(state.filters.time_frame, TimeFrame::Weekly);
        assert_eq!(state.filters.agent.as_deref(), Some("agent-1"));
    }

    #[test]
    fn test_apply_reports_fetch_relevant_changes() {
        let mut state = FilterState::default();
        assert!(!state.apply(FilterIntent::ToggleSidebar));
        assert!(state.sidebar_collapsed);
        assert!(!state.apply(FilterIntent::SetActiveSection {
            section: "data-entry".to_string()
        }));
        assert!(state.apply(FilterIntent::SetSecondaryTimeFrame {
            secondary_time_frame: "Jun".to_string()
        }));
        assert!(!state.apply(FilterIntent::SetSecondaryTimeFrame {
            secondary_time_frame: "Jun".to_string()
        }));
        assert!(state.apply(FilterIntent::Reset));
        assert_eq!(state.filters, DashboardFilters::default());
    }

    #[test]
    fn test_intent_deserialization() {
        let intent: FilterIntent =
            serde_json::from_str(r#"{"type":"setProject","project":"All"}"#).unwrap();
        assert_eq!(
            intent,
            FilterIntent::SetProject {
                project: ProjectSelection::All
            }
        );

        let intent: FilterIntent = serde_json::from_str(
            r#"{"type":"setSecondaryTimeFrame","secondaryTimeFrame":"Week 2"}"#,
        )
        .unwrap();
        assert_eq!(
            intent,
            FilterIntent::SetSecondaryTimeFrame {
                secondary_time_frame: "Week 2".to_string()
            }
        );
    }

    #[test]
    fn test_project_selection_matches() {
        assert!(ProjectSelection::All.matches("Siri"));
        assert!(ProjectSelection::from("Siri").matches("Siri"));
        assert!(!ProjectSelection::from("Siri").matches("DTSS"));
        assert_eq!(ProjectSelection::from(" All "), ProjectSelection::All);
    }
}
