// Dashboard store - Filter state and the refresh cycle behind the snapshot
use crate::application::data_gateway::DataGateway;
use crate::domain::directory::Agent;
use crate::domain::filters::{DashboardFilters, FilterIntent, FilterState};
use crate::domain::performance::{aggregate_agent, AgentPerformance};
use crate::domain::snapshot::{
    DashboardSnapshot, FunnelStage, KpiSet, PerformanceChart, ProjectPerformanceRow, TopPerformer,
};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// One independently fetched part of the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Slot {
    Kpis,
    PerformanceChart,
    ProjectPerformance,
    ConversionFunnel,
    TopPerformers,
    AgentPerformance,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Slot::Kpis => "KPIs",
            Slot::PerformanceChart => "performance chart",
            Slot::ProjectPerformance => "project performance",
            Slot::ConversionFunnel => "conversion funnel",
            Slot::TopPerformers => "top performers",
            Slot::AgentPerformance => "agent performance",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RefreshOutcome {
    /// The batch was published; failed slots kept their previous values.
    #[serde(rename_all = "camelCase")]
    Applied { failed_slots: Vec<Slot> },
    /// The period has no rows; the snapshot was left as it was.
    Unavailable,
    /// A newer batch was dispatched while this one was in flight.
    Superseded,
    /// The intent did not touch fetch-relevant filters.
    Unchanged,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntentError {
    #[error("Agent {agent} is not part of {project}")]
    AgentOutOfScope { agent: String, project: String },
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub filter_state: FilterState,
    pub snapshot: Arc<DashboardSnapshot>,
    pub loading: bool,
    pub data_available: bool,
    pub notices: Vec<String>,
    pub agents: Vec<Agent>,
    pub generation: u64,
}

impl DashboardState {
    pub fn filters(&self) -> &DashboardFilters {
        self.filter_state.filters()
    }

    /// The snapshot narrowed to the active project.
    pub fn project_view(&self) -> DashboardSnapshot {
        self.snapshot.project_view(&self.filters().project)
    }

    pub fn agents_in_scope(&self) -> Vec<Agent> {
        self.agents
            .iter()
            .filter(|a| self.filters().project.matches(&a.project_name))
            .cloned()
            .collect()
    }

    /// Agents are only selectable inside the active project, once the directory has loaded.
    fn admit(&self, intent: &FilterIntent) -> Result<(), IntentError> {
        let FilterIntent::SetAgent { agent: Some(id) } = intent else {
            return Ok(());
        };
        let project = &self.filters().project;
        if id.is_empty()
            || self.agents.is_empty()
            || self
                .agents
                .iter()
                .any(|a| &a.id == id && project.matches(&a.project_name))
        {
            return Ok(());
        }
        Err(IntentError::AgentOutOfScope {
            agent: id.clone(),
            project: project.to_string(),
        })
    }

    pub fn selected_agent(&self) -> Option<&Agent> {
        let id = self.filters().agent.as_deref()?;
        self.agents.iter().find(|a| a.id == id)
    }
}

/// Single writer of the dashboard state. Readers subscribe to the watch channel.
pub struct DashboardStore {
    gateway: Arc<dyn DataGateway>,
    generation: AtomicU64,
    state: watch::Sender<DashboardState>,
}

struct FetchedBatch {
    kpis: Option<KpiSet>,
    performance_chart: Option<PerformanceChart>,
    project_performance: Option<Vec<ProjectPerformanceRow>>,
    conversion_funnel: Option<Vec<FunnelStage>>,
    top_performers: Option<Vec<TopPerformer>>,
    // Outer None: the agent fetch failed. Inner None: no agent or no rows.
    agent_performance: Option<Option<AgentPerformance>>,
    failed: Vec<Slot>,
}

impl DashboardStore {
    pub fn new(gateway: Arc<dyn DataGateway>, defaults: DashboardFilters) -> Self {
        let (state, _) = watch::channel(DashboardState {
            filter_state: FilterState::new(defaults),
            snapshot: Arc::new(DashboardSnapshot::default()),
            loading: true,
            data_available: true,
            notices: Vec::new(),
            agents: Vec::new(),
            generation: 0,
        });

        Self {
            gateway,
            generation: AtomicU64::new(0),
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Applies a user intent and, when the fetch-relevant filters changed, runs the refresh.
    /// The intent is checked against the state it is applied to, under the same lock.
    pub async fn dispatch(&self, intent: FilterIntent) -> Result<RefreshOutcome, IntentError> {
        let mut admitted = Ok(());
        let mut pending = None;
        self.state.send_if_modified(|state| {
            if let Err(e) = state.admit(&intent) {
                admitted = Err(e);
                return false;
            }
            if state.filter_state.apply(intent) {
                pending = Some(self.begin_cycle(state));
            }
            true
        });
        admitted?;

        Ok(match pending {
            Some((generation, filters)) => self.run_cycle(generation, filters).await,
            None => RefreshOutcome::Unchanged,
        })
    }

    /// Re-runs the refresh for the current filters.
    pub async fn refresh(&self) -> RefreshOutcome {
        let mut cycle = (0, DashboardFilters::default());
        self.state.send_modify(|state| cycle = self.begin_cycle(state));

        let (generation, filters) = cycle;
        self.run_cycle(generation, filters).await
    }

    pub async fn load_agents(&self) {
        match self.gateway.list_agents().await {
            Ok(agents) => {
                tracing::info!("Loaded {} agents", agents.len());
                self.state.send_modify(|state| state.agents = agents);
            }
            Err(e) => tracing::warn!("Error fetching agents: {:#}", e),
        }
    }

    // Runs under the watch lock so generations are handed out in filter order.
    fn begin_cycle(&self, state: &mut DashboardState) -> (u64, DashboardFilters) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        state.generation = generation;
        state.loading = true;
        (generation, state.filters().clone())
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn run_cycle(&self, generation: u64, filters: DashboardFilters) -> RefreshOutcome {
        let month = filters.secondary_time_frame.as_str();

        let available = match self.gateway.count_daily_rows(month).await {
            Ok(count) => {
                tracing::debug!("Period {} has {} rows", month, count);
                count > 0
            }
            Err(e) => {
                tracing::warn!("Error checking data availability for {}: {:#}", month, e);
                false
            }
        };

        if !available {
            let applied = self.state.send_if_modified(|state| {
                if state.generation != generation {
                    return false;
                }
                state.data_available = false;
                state.loading = false;
                state.notices = vec![format!("No data available for {}", month)];
                true
            });
            return if applied {
                RefreshOutcome::Unavailable
            } else {
                RefreshOutcome::Superseded
            };
        }

        if !self.is_current(generation) {
            tracing::debug!("Refresh {} superseded before fetching", generation);
            return RefreshOutcome::Superseded;
        }

        let batch = self.fetch_batch(&filters).await;
        let failed = batch.failed.clone();

        let applied = self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            let previous = state.snapshot.as_ref();
            let snapshot = DashboardSnapshot {
                kpis: batch.kpis.unwrap_or_else(|| previous.kpis.clone()),
                performance_chart: batch
                    .performance_chart
                    .unwrap_or_else(|| previous.performance_chart.clone()),
                project_performance: batch
                    .project_performance
                    .unwrap_or_else(|| previous.project_performance.clone()),
                conversion_funnel: batch
                    .conversion_funnel
                    .unwrap_or_else(|| previous.conversion_funnel.clone()),
                top_performers: batch
                    .top_performers
                    .unwrap_or_else(|| previous.top_performers.clone()),
                agent_performance: batch
                    .agent_performance
                    .unwrap_or_else(|| previous.agent_performance.clone()),
            };
            state.snapshot = Arc::new(snapshot);
            state.data_available = true;
            state.loading = false;
            state.notices = batch
                .failed
                .iter()
                .map(|slot| format!("Failed to refresh {}", slot))
                .collect();
            true
        });

        if applied {
            tracing::info!(
                "Applied refresh {} for {} ({} failed slots)",
                generation,
                month,
                failed.len()
            );
            RefreshOutcome::Applied {
                failed_slots: failed,
            }
        } else {
            tracing::debug!("Discarding stale refresh {}", generation);
            RefreshOutcome::Superseded
        }
    }

    async fn fetch_batch(&self, filters: &DashboardFilters) -> FetchedBatch {
        let month = filters.secondary_time_frame.as_str();
        let agent = async {
            match filters.agent.as_deref() {
                Some(agent_id) => self
                    .gateway
                    .fetch_agent_daily_rows(agent_id, month)
                    .await
                    .map(|rows| aggregate_agent(&rows)),
                None => Ok(None),
            }
        };

        let (kpis, chart, projects, funnel, performers, agent) = futures::join!(
            self.gateway.fetch_kpis(),
            self.gateway.fetch_performance_chart(),
            self.gateway.fetch_project_performance(),
            self.gateway.fetch_conversion_funnel(),
            self.gateway.fetch_top_performers(),
            agent,
        );

        let mut failed = Vec::new();
        FetchedBatch {
            kpis: settle(kpis, Slot::Kpis, &mut failed),
            performance_chart: settle(chart, Slot::PerformanceChart, &mut failed),
            project_performance: settle(projects, Slot::ProjectPerformance, &mut failed),
            conversion_funnel: settle(funnel, Slot::ConversionFunnel, &mut failed),
            top_performers: settle(performers, Slot::TopPerformers, &mut failed),
            agent_performance: settle(agent, Slot::AgentPerformance, &mut failed),
            failed,
        }
    }
}

fn settle<T>(result: anyhow::Result<T>, slot: Slot, failed: &mut Vec<Slot>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Error fetching {}: {:#}", slot, e);
            failed.push(slot);
            None
        }
    }
}
