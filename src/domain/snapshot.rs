// Dashboard snapshot domain models
use super::filters::ProjectSelection;
use super::performance::AgentPerformance;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpi {
    pub current: f64,
    pub previous: f64,
    pub percent_change: f64,
}

impl Kpi {
    pub fn new(current: f64, previous: f64, percent_change: f64) -> Self {
        Self {
            current,
            previous,
            percent_change,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSet {
    pub total_dials: Kpi,
    pub total_connected: Kpi,
    pub total_talk_time: Kpi,
    pub scheduled_meetings: Kpi,
    pub successful_meetings: Kpi,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPerformer {
    pub id: String,
    pub name: String,
    pub project: String,
    pub success_rate: f64,
    pub meetings: u64,
    pub dials: u64,
    pub rank: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceChart {
    pub labels: Vec<String>,
    pub scheduled: Vec<u64>,
    pub successful: Vec<u64>,
}

impl PerformanceChart {
    /// Builds the weekly series from `(week_number, scheduled, successful)` rows.
    pub fn from_weeks(mut weeks: Vec<(i32, u64, u64)>) -> Self {
        weeks.sort_by_key(|(week, _, _)| *week);
        let mut chart = Self::default();
        for (week, scheduled, successful) in weeks {
            chart.labels.push(format!("Week {}", week));
            chart.scheduled.push(scheduled);
            chart.successful.push(successful);
        }
        chart
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPerformanceRow {
    pub id: String,
    pub name: String,
    pub dials: u64,
    pub connected: u64,
    pub talk_time_minutes: f64,
    pub scheduled_meetings: u64,
    pub successful_meetings: u64,
    /// Computed by the backend view; never derived here.
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelStage {
    pub stage: String,
    pub value: u64,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub kpis: KpiSet,
    pub top_performers: Vec<TopPerformer>,
    pub performance_chart: PerformanceChart,
    pub project_performance: Vec<ProjectPerformanceRow>,
    pub conversion_funnel: Vec<FunnelStage>,
    pub agent_performance: Option<AgentPerformance>,
}

impl DashboardSnapshot {
    /// Narrows the snapshot to one project. Only row membership changes.
    /// A project with no performance row leaves the snapshot unfiltered.
    pub fn project_view(&self, project: &ProjectSelection) -> DashboardSnapshot {
        let known = self
            .project_performance
            .iter()
            .any(|row| project.matches(&row.name));
        if matches!(project, ProjectSelection::All) || !known {
            return self.clone();
        }

        DashboardSnapshot {
            project_performance: self
                .project_performance
                .iter()
                .filter(|row| project.matches(&row.name))
                .cloned()
                .collect(),
            top_performers: self
                .top_performers
                .iter()
                .filter(|performer| project.matches(&performer.project))
                .cloned()
                .collect(),
            ..self.clone()
        }
    }
}
