// Gateway trait for the hosted performance data store
use crate::domain::directory::{Agent, Project};
use crate::domain::performance::{AgentDailyRecord, DailyPerformanceRow, EntryValues};
use crate::domain::snapshot::{FunnelStage, KpiSet, PerformanceChart, ProjectPerformanceRow, TopPerformer};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Arguments of the `upsert_daily_performance` procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertDailyPerformance {
    pub agent_id: String,
    pub project_id: String,
    pub date: NaiveDate,
    pub values: EntryValues,
}

#[async_trait]
pub trait DataGateway: Send + Sync {
    async fn list_projects(&self) -> anyhow::Result<Vec<Project>>;

    async fn find_project_by_name(&self, name: &str) -> anyhow::Result<Option<Project>>;

    /// All agents, each resolved to its project's name
    async fn list_agents(&self) -> anyhow::Result<Vec<Agent>>;

    async fn list_agents_for_project(&self, project_id: &str) -> anyhow::Result<Vec<Agent>>;

    /// Number of `daily_performance` rows recorded for a month label
    async fn count_daily_rows(&self, month: &str) -> anyhow::Result<u64>;

    async fn fetch_kpis(&self) -> anyhow::Result<KpiSet>;

    async fn fetch_performance_chart(&self) -> anyhow::Result<PerformanceChart>;

    async fn fetch_project_performance(&self) -> anyhow::Result<Vec<ProjectPerformanceRow>>;

    async fn fetch_conversion_funnel(&self) -> anyhow::Result<Vec<FunnelStage>>;

    async fn fetch_top_performers(&self) -> anyhow::Result<Vec<TopPerformer>>;

    async fn fetch_agent_daily_rows(
        &self,
        agent_id: &str,
        month: &str,
    ) -> anyhow::Result<Vec<DailyPerformanceRow>>;

    async fn find_daily_record(
        &self,
        agent_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<AgentDailyRecord>>;

    /// Inserts or overwrites the (agent, date) record and returns its id
    async fn upsert_daily_performance(&self, args: UpsertDailyPerformance) -> anyhow::Result<String>;
}
