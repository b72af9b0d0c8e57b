// View models rendered by the dashboard front end
use crate::application::dashboard_store::DashboardState;
use crate::application::data_entry::DataEntryForm;
use crate::domain::directory::Agent;
use crate::domain::filters::DashboardFilters;
use crate::domain::formatters::{format_count, format_minutes, format_percent_change, format_rate};
use crate::domain::performance::AgentPerformance;
use crate::domain::project_table::{sort_rows, SortState, SuccessBand};
use crate::domain::snapshot::{DashboardSnapshot, Kpi, KpiSet, ProjectPerformanceRow};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiCard {
    pub key: &'static str,
    pub title: &'static str,
    pub current: f64,
    pub previous: f64,
    pub percent_change: f64,
    pub display: String,
    pub change_display: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTableRow {
    #[serde(flatten)]
    pub row: ProjectPerformanceRow,
    pub talk_time_display: String,
    pub success_rate_display: String,
    pub band: SuccessBand,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPanel {
    pub agent: Agent,
    pub initial: Option<char>,
    pub performance: AgentPerformance,
    pub talk_time_display: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub filters: DashboardFilters,
    pub sidebar_collapsed: bool,
    pub active_section: String,
    pub loading: bool,
    pub data_available: bool,
    pub notices: Vec<String>,
    pub kpi_cards: Vec<KpiCard>,
    pub snapshot: DashboardSnapshot,
    pub sort: SortState,
    pub project_table: Vec<ProjectTableRow>,
    pub agent_panel: Option<AgentPanel>,
}

fn card(key: &'static str, title: &'static str, kpi: &Kpi, display: String) -> KpiCard {
    KpiCard {
        key,
        title,
        current: kpi.current,
        previous: kpi.previous,
        percent_change: kpi.percent_change,
        display,
        change_display: format_percent_change(kpi.percent_change),
    }
}

fn count_display(kpi: &Kpi) -> String {
    format_count(kpi.current.max(0.0).round() as u64)
}

pub fn kpi_cards(kpis: &KpiSet) -> Vec<KpiCard> {
    vec![
        card("totalDials", "Total Dials", &kpis.total_dials, count_display(&kpis.total_dials)),
        card(
            "totalConnected",
            "Total Connected",
            &kpis.total_connected,
            count_display(&kpis.total_connected),
        ),
        // The KPI view reports talk time in hours.
        card(
            "totalTalkTime",
            "Total Talk Time",
            &kpis.total_talk_time,
            format_minutes(kpis.total_talk_time.current * 60.0),
        ),
        card(
            "scheduledMeetings",
            "Scheduled Meetings",
            &kpis.scheduled_meetings,
            count_display(&kpis.scheduled_meetings),
        ),
        card(
            "successfulMeetings",
            "Successful Meetings",
            &kpis.successful_meetings,
            count_display(&kpis.successful_meetings),
        ),
    ]
}

pub fn project_table(rows: &[ProjectPerformanceRow], sort: SortState) -> Vec<ProjectTableRow> {
    sort_rows(rows, sort)
        .into_iter()
        .map(|row| ProjectTableRow {
            talk_time_display: format_minutes(row.talk_time_minutes),
            success_rate_display: format_rate(row.success_rate),
            band: SuccessBand::of(row.success_rate),
            row,
        })
        .collect()
}

impl DashboardView {
    pub fn build(state: &DashboardState, sort: SortState) -> Self {
        let snapshot = state.project_view();

        let agent_panel = state.selected_agent().map(|agent| {
            let performance = snapshot.agent_performance.clone().unwrap_or_default();
            AgentPanel {
                agent: agent.clone(),
                initial: agent.initial(),
                talk_time_display: format_minutes(performance.talk_time_minutes),
                performance,
            }
        });

        Self {
            filters: state.filters().clone(),
            sidebar_collapsed: state.filter_state.sidebar_collapsed,
            active_section: state.filter_state.active_section.clone(),
            loading: state.loading,
            data_available: state.data_available,
            notices: state.notices.clone(),
            kpi_cards: kpi_cards(&snapshot.kpis),
            project_table: project_table(&snapshot.project_performance, sort),
            sort,
            agent_panel,
            snapshot,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFormView {
    #[serde(flatten)]
    pub form: DataEntryForm,
    pub title: String,
    pub submit_label: &'static str,
}

impl From<DataEntryForm> for EntryFormView {
    fn from(form: DataEntryForm) -> Self {
        let (verb, submit_label) = match form.record_id {
            Some(_) => ("Edit", "Update"),
            None => ("Add", "Submit"),
        };
        Self {
            title: format!("{} Performance Data", verb),
            submit_label,
            form,
        }
    }
}
