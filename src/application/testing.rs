// In-memory gateway used by unit tests
use crate::application::data_gateway::{DataGateway, UpsertDailyPerformance};
use crate::domain::directory::{Agent, Project};
use crate::domain::performance::{AgentDailyRecord, DailyPerformanceRow};
use crate::domain::snapshot::{
    FunnelStage, Kpi, KpiSet, PerformanceChart, ProjectPerformanceRow, TopPerformer,
};
use anyhow::bail;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fail {
    Probe,
    Directory,
    Kpis,
    Chart,
    Projects,
    Funnel,
    TopPerformers,
    AgentRows,
    Lookup,
    Upsert,
}

#[derive(Default)]
pub struct InMemoryGateway {
    pub projects: Mutex<Vec<Project>>,
    pub agents: Mutex<Vec<Agent>>,
    pub month_rows: Mutex<HashMap<String, u64>>,
    pub kpis: Mutex<KpiSet>,
    pub chart: Mutex<PerformanceChart>,
    pub project_rows: Mutex<Vec<ProjectPerformanceRow>>,
    pub funnel: Mutex<Vec<FunnelStage>>,
    pub performers: Mutex<Vec<TopPerformer>>,
    pub agent_rows: Mutex<HashMap<(String, String), Vec<DailyPerformanceRow>>>,
    pub records: Mutex<HashMap<(String, NaiveDate), AgentDailyRecord>>,
    failing: Mutex<HashSet<Fail>>,
    probe_gates: Mutex<HashMap<String, Arc<Notify>>>,
    kpi_gate: Mutex<Option<Arc<Notify>>>,
    pub probe_calls: AtomicUsize,
    pub kpi_calls: AtomicUsize,
    next_id: AtomicUsize,
}

impl InMemoryGateway {
    /// Two projects, three agents, data for "May" only.
    pub fn seeded() -> Self {
        let gateway = Self::default();
        *gateway.projects.lock().unwrap() = vec![project("p-a", "A"), project("p-b", "B")];
        *gateway.agents.lock().unwrap() = vec![
            agent("ag-1", "Ana", "p-a", "A"),
            agent("ag-2", "Ben", "p-b", "B"),
            agent("ag-3", "Cam", "p-b", "B"),
        ];
        gateway.month_rows.lock().unwrap().insert("May".to_string(), 42);
        gateway.set_kpis(1000.0);
        *gateway.chart.lock().unwrap() = PerformanceChart::from_weeks(vec![(1, 4, 2), (2, 6, 3)]);
        *gateway.project_rows.lock().unwrap() = vec![
            project_row("p-a", "A", 33.3),
            project_row("p-b", "B", 66.7),
        ];
        *gateway.funnel.lock().unwrap() = vec![
            FunnelStage {
                stage: "Dials".to_string(),
                value: 1000,
                color: "#1D4ED8".to_string(),
            },
            FunnelStage {
                stage: "Successful".to_string(),
                value: 12,
                color: "#10B981".to_string(),
            },
        ];
        *gateway.performers.lock().unwrap() = vec![
            performer("ag-2", "Ben", "B", 1),
            performer("ag-1", "Ana", "A", 2),
        ];
        gateway
    }

    pub fn set_kpis(&self, dials: f64) {
        *self.kpis.lock().unwrap() = KpiSet {
            total_dials: Kpi::new(dials, 0.0, 4.2),
            total_connected: Kpi::new(dials / 2.0, 0.0, -1.5),
            ..KpiSet::default()
        };
    }

    pub fn fail(&self, what: Fail) {
        self.failing.lock().unwrap().insert(what);
    }

    pub fn recover(&self, what: Fail) {
        self.failing.lock().unwrap().remove(&what);
    }

    /// Holds probes for `month` until the returned handle is notified.
    pub fn gate_probe(&self, month: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.probe_gates
            .lock()
            .unwrap()
            .insert(month.to_string(), notify.clone());
        notify
    }

    /// Holds the next KPI fetch until the returned handle is notified.
    pub fn gate_kpis(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.kpi_gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn add_agent_rows(&self, agent_id: &str, month: &str, rows: Vec<DailyPerformanceRow>) {
        self.agent_rows
            .lock()
            .unwrap()
            .insert((agent_id.to_string(), month.to_string()), rows);
    }

    fn check(&self, what: Fail) -> anyhow::Result<()> {
        if self.failing.lock().unwrap().contains(&what) {
            bail!("injected {:?} failure", what);
        }
        Ok(())
    }
}

pub fn project(id: &str, name: &str) -> Project {
    Project {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn agent(id: &str, name: &str, project_id: &str, project_name: &str) -> Agent {
    Agent {
        id: id.to_string(),
        name: name.to_string(),
        project_id: project_id.to_string(),
        project_name: project_name.to_string(),
    }
}

pub fn project_row(id: &str, name: &str, success_rate: f64) -> ProjectPerformanceRow {
    ProjectPerformanceRow {
        id: id.to_string(),
        name: name.to_string(),
        dials: 500,
        connected: 200,
        talk_time_minutes: 640.0,
        scheduled_meetings: 30,
        successful_meetings: 10,
        success_rate,
    }
}

pub fn performer(id: &str, name: &str, project: &str, rank: usize) -> TopPerformer {
    TopPerformer {
        id: id.to_string(),
        name: name.to_string(),
        project: project.to_string(),
        success_rate: 50.0,
        meetings: 6,
        dials: 300,
        rank,
    }
}

#[async_trait]
impl DataGateway for InMemoryGateway {
    async fn list_projects(&self) -> anyhow::Result<Vec<Project>> {
        self.check(Fail::Directory)?;
        Ok(self.projects.lock().unwrap().clone())
    }

    async fn find_project_by_name(&self, name: &str) -> anyhow::Result<Option<Project>> {
        self.check(Fail::Directory)?;
        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn list_agents(&self) -> anyhow::Result<Vec<Agent>> {
        self.check(Fail::Directory)?;
        Ok(self.agents.lock().unwrap().clone())
    }

    async fn list_agents_for_project(&self, project_id: &str) -> anyhow::Result<Vec<Agent>> {
        self.check(Fail::Directory)?;
        Ok(self
            .agents
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn count_daily_rows(&self, month: &str) -> anyhow::Result<u64> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.probe_gates.lock().unwrap().remove(month);
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check(Fail::Probe)?;
        Ok(self
            .month_rows
            .lock()
            .unwrap()
            .get(month)
            .copied()
            .unwrap_or(0))
    }

    async fn fetch_kpis(&self) -> anyhow::Result<KpiSet> {
        self.kpi_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.kpi_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check(Fail::Kpis)?;
        Ok(self.kpis.lock().unwrap().clone())
    }

    async fn fetch_performance_chart(&self) -> anyhow::Result<PerformanceChart> {
        self.check(Fail::Chart)?;
        Ok(self.chart.lock().unwrap().clone())
    }

    async fn fetch_project_performance(&self) -> anyhow::Result<Vec<ProjectPerformanceRow>> {
        self.check(Fail::Projects)?;
        Ok(self.project_rows.lock().unwrap().clone())
    }

    async fn fetch_conversion_funnel(&self) -> anyhow::Result<Vec<FunnelStage>> {
        self.check(Fail::Funnel)?;
        Ok(self.funnel.lock().unwrap().clone())
    }

    async fn fetch_top_performers(&self) -> anyhow::Result<Vec<TopPerformer>> {
        self.check(Fail::TopPerformers)?;
        Ok(self.performers.lock().unwrap().clone())
    }

    async fn fetch_agent_daily_rows(
        &self,
        agent_id: &str,
        month: &str,
    ) -> anyhow::Result<Vec<DailyPerformanceRow>> {
        self.check(Fail::AgentRows)?;
        Ok(self
            .agent_rows
            .lock()
            .unwrap()
            .get(&(agent_id.to_string(), month.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn find_daily_record(
        &self,
        agent_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<AgentDailyRecord>> {
        self.check(Fail::Lookup)?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(agent_id.to_string(), date))
            .cloned())
    }

    async fn upsert_daily_performance(&self, args: UpsertDailyPerformance) -> anyhow::Result<String> {
        self.check(Fail::Upsert)?;
        let mut records = self.records.lock().unwrap();
        let key = (args.agent_id.clone(), args.date);
        let record_id = match records.get(&key) {
            Some(existing) => existing.record_id.clone(),
            None => format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
        };
        records.insert(
            key,
            AgentDailyRecord {
                record_id: record_id.clone(),
                agent_id: args.agent_id,
                date: args.date,
                values: args.values,
            },
        );
        Ok(record_id)
    }
}
