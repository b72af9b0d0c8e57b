// PostgREST gateway implementation for the hosted performance database
use crate::application::data_gateway::{DataGateway, UpsertDailyPerformance};
use crate::domain::directory::{Agent, Project};
use crate::domain::performance::{AgentDailyRecord, DailyPerformanceRow, EntryValues};
use crate::domain::snapshot::{
    FunnelStage, Kpi, KpiSet, PerformanceChart, ProjectPerformanceRow, TopPerformer,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::CONTENT_RANGE;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const UPSERT_PROCEDURE: &str = "upsert_daily_performance";
const FALLBACK_STAGE_COLOR: &str = "#94A3B8";

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Request to {resource} failed: {source}")]
    Transport {
        resource: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{resource} returned status {status}: {body}")]
    Status {
        resource: String,
        status: StatusCode,
        body: String,
    },

    #[error("Failed to decode {resource}: {source}")]
    Decode {
        resource: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{0} returned no rows")]
    Empty(String),

    #[error("Missing or malformed Content-Range header: {0:?}")]
    ContentRange(Option<String>),
}

#[derive(Debug, Clone)]
pub struct PostgrestGateway {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ProjectRow {
    project_id: String,
    project_name: String,
}

#[derive(Debug, Deserialize)]
struct ProjectNameRow {
    project_name: String,
}

#[derive(Debug, Deserialize)]
struct AgentRow {
    agent_id: String,
    agent_name: String,
    project_id: String,
    #[serde(default)]
    projects: Option<ProjectNameRow>,
}

#[derive(Debug, Deserialize)]
struct KpiRow {
    total_dials: Option<f64>,
    total_connected: Option<f64>,
    total_talk_time_hours: Option<f64>,
    meetings_scheduled: Option<f64>,
    meetings_successful: Option<f64>,
    dials_percent_change: Option<f64>,
    connected_percent_change: Option<f64>,
    talk_time_percent_change: Option<f64>,
    scheduled_percent_change: Option<f64>,
    successful_percent_change: Option<f64>,
    // Not part of the stock view; picked up when a deployment exposes them.
    #[serde(default)]
    previous_total_dials: Option<f64>,
    #[serde(default)]
    previous_total_connected: Option<f64>,
    #[serde(default)]
    previous_total_talk_time_hours: Option<f64>,
    #[serde(default)]
    previous_meetings_scheduled: Option<f64>,
    #[serde(default)]
    previous_meetings_successful: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartRow {
    week_number: Option<i32>,
    scheduled_meetings: Option<f64>,
    successful_meetings: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ProjectPerformanceDbRow {
    project_id: Option<String>,
    project_name: Option<String>,
    total_dials: Option<f64>,
    total_connects: Option<f64>,
    total_talk_time_minutes: Option<f64>,
    meetings_scheduled: Option<f64>,
    meetings_successful: Option<f64>,
    success_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FunnelRow {
    stage: Option<String>,
    value: Option<f64>,
    color: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TopPerformerRow {
    agent_id: Option<String>,
    agent_name: Option<String>,
    project_name: Option<String>,
    success_rate: Option<f64>,
    successful_meetings: Option<f64>,
    total_dials: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DailyRow {
    #[serde(default)]
    record_id: Option<String>,
    #[serde(default)]
    agent_id: Option<String>,
    date: NaiveDate,
    total_dials: Option<f64>,
    total_connects: Option<f64>,
    #[serde(default)]
    total_talktime: Option<String>,
    meetings_scheduled: Option<f64>,
    meetings_successful: Option<f64>,
}

#[derive(Debug, Serialize)]
struct UpsertArgs<'a> {
    p_agent_id: &'a str,
    p_date: String,
    p_total_dials: u32,
    p_total_connects: u32,
    p_meetings_scheduled: u32,
    p_meetings_successful: u32,
    p_project_id: &'a str,
}

/// Nullable numeric column to a count; nulls and negatives are zero.
fn count(value: Option<f64>) -> u64 {
    value.unwrap_or(0.0).max(0.0).round() as u64
}

fn entry_count(value: Option<f64>) -> u32 {
    count(value).min(u32::MAX as u64) as u32
}

/// Total from a `Content-Range` value such as `0-24/310` or `*/0`.
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

impl PostgrestGateway {
    pub fn new(base_url: String, api_key: String, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn build_url(&self, resource: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}/rest/v1/{}", self.base_url, resource);
        for (i, (key, value)) in params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn send(&self, resource: &str, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                resource: resource.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                resource: resource.to_string(),
                status,
                body,
            });
        }

        Ok(response)
    }

    async fn get_rows<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let url = self.build_url(resource, params);
        tracing::debug!("Querying {}", url);

        let response = self
            .send(resource, self.client.get(&url).header("Accept", "application/json"))
            .await?;

        let rows = response
            .json::<Vec<T>>()
            .await
            .map_err(|source| GatewayError::Decode {
                resource: resource.to_string(),
                source,
            })?;

        Ok(rows)
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

fn select(columns: &str) -> (&'static str, String) {
    ("select", columns.to_string())
}

const AGENT_COLUMNS: &str = "agent_id,agent_name,project_id,projects(project_name)";

impl From<AgentRow> for Agent {
    fn from(row: AgentRow) -> Self {
        Agent {
            id: row.agent_id,
            name: row.agent_name,
            project_id: row.project_id,
            project_name: row.projects.map(|p| p.project_name).unwrap_or_default(),
        }
    }
}

impl From<DailyRow> for DailyPerformanceRow {
    fn from(row: DailyRow) -> Self {
        DailyPerformanceRow {
            date: row.date,
            total_dials: count(row.total_dials),
            total_connects: count(row.total_connects),
            total_talktime: row.total_talktime,
            meetings_scheduled: count(row.meetings_scheduled),
            meetings_successful: count(row.meetings_successful),
        }
    }
}

#[async_trait]
impl DataGateway for PostgrestGateway {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let rows: Vec<ProjectRow> = self
            .get_rows(
                "projects",
                &[select("project_id,project_name"), ("order", "project_name".to_string())],
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| Project {
                id: r.project_id,
                name: r.project_name,
            })
            .collect())
    }

    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        let rows: Vec<ProjectRow> = self
            .get_rows(
                "projects",
                &[
                    select("project_id,project_name"),
                    ("project_name", eq(name)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        Ok(rows.into_iter().next().map(|r| Project {
            id: r.project_id,
            name: r.project_name,
        }))
    }

    async fn list_agents(&self) -> Result<Vec<Agent>> {
        let rows: Vec<AgentRow> = self.get_rows("agents", &[select(AGENT_COLUMNS)]).await?;
        Ok(rows.into_iter().map(Agent::from).collect())
    }

    async fn list_agents_for_project(&self, project_id: &str) -> Result<Vec<Agent>> {
        let rows: Vec<AgentRow> = self
            .get_rows(
                "agents",
                &[select(AGENT_COLUMNS), ("project_id", eq(project_id))],
            )
            .await?;
        Ok(rows.into_iter().map(Agent::from).collect())
    }

    async fn count_daily_rows(&self, month: &str) -> Result<u64> {
        let resource = "daily_performance";
        let url = self.build_url(resource, &[select("record_id"), ("month", eq(month))]);
        tracing::debug!("Counting {}", url);

        let response = self
            .send(
                resource,
                self.client
                    .head(&url)
                    .header("Prefer", "count=exact")
                    .header("Range-Unit", "items")
                    .header("Range", "0-0"),
            )
            .await?;

        let header = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let total = header
            .as_deref()
            .and_then(parse_content_range_total)
            .ok_or_else(|| GatewayError::ContentRange(header.clone()))?;

        Ok(total)
    }

    async fn fetch_kpis(&self) -> Result<KpiSet> {
        let rows: Vec<KpiRow> = self.get_rows("dashboard_kpis", &[select("*")]).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Empty("dashboard_kpis".to_string()))?;

        let kpi = |current: Option<f64>, previous: Option<f64>, change: Option<f64>| {
            Kpi::new(
                current.unwrap_or(0.0),
                previous.unwrap_or(0.0),
                change.unwrap_or(0.0),
            )
        };

        Ok(KpiSet {
            total_dials: kpi(row.total_dials, row.previous_total_dials, row.dials_percent_change),
            total_connected: kpi(
                row.total_connected,
                row.previous_total_connected,
                row.connected_percent_change,
            ),
            total_talk_time: kpi(
                row.total_talk_time_hours,
                row.previous_total_talk_time_hours,
                row.talk_time_percent_change,
            ),
            scheduled_meetings: kpi(
                row.meetings_scheduled,
                row.previous_meetings_scheduled,
                row.scheduled_percent_change,
            ),
            successful_meetings: kpi(
                row.meetings_successful,
                row.previous_meetings_successful,
                row.successful_percent_change,
            ),
        })
    }

    async fn fetch_performance_chart(&self) -> Result<PerformanceChart> {
        let rows: Vec<ChartRow> = self
            .get_rows(
                "weekly_performance_chart",
                &[select("*"), ("order", "week_number".to_string())],
            )
            .await?;

        let weeks = rows
            .into_iter()
            .filter_map(|r| {
                let week = r.week_number?;
                Some((week, count(r.scheduled_meetings), count(r.successful_meetings)))
            })
            .collect();

        Ok(PerformanceChart::from_weeks(weeks))
    }

    async fn fetch_project_performance(&self) -> Result<Vec<ProjectPerformanceRow>> {
        let rows: Vec<ProjectPerformanceDbRow> =
            self.get_rows("project_performance", &[select("*")]).await?;

        Ok(rows
            .into_iter()
            .map(|r| ProjectPerformanceRow {
                id: r.project_id.unwrap_or_default(),
                name: r.project_name.unwrap_or_default(),
                dials: count(r.total_dials),
                connected: count(r.total_connects),
                talk_time_minutes: r.total_talk_time_minutes.unwrap_or(0.0),
                scheduled_meetings: count(r.meetings_scheduled),
                successful_meetings: count(r.meetings_successful),
                success_rate: r.success_rate.unwrap_or(0.0),
            })
            .collect())
    }

    async fn fetch_conversion_funnel(&self) -> Result<Vec<FunnelStage>> {
        let rows: Vec<FunnelRow> = self.get_rows("conversion_funnel", &[select("*")]).await?;

        Ok(rows
            .into_iter()
            .map(|r| FunnelStage {
                stage: r.stage.unwrap_or_default(),
                value: count(r.value),
                color: r.color.unwrap_or_else(|| FALLBACK_STAGE_COLOR.to_string()),
            })
            .collect())
    }

    async fn fetch_top_performers(&self) -> Result<Vec<TopPerformer>> {
        let rows: Vec<TopPerformerRow> = self.get_rows("top_performers", &[select("*")]).await?;

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, r)| TopPerformer {
                id: r.agent_id.unwrap_or_default(),
                name: r.agent_name.unwrap_or_default(),
                project: r.project_name.unwrap_or_default(),
                success_rate: r.success_rate.unwrap_or(0.0),
                meetings: count(r.successful_meetings),
                dials: count(r.total_dials),
                rank: i + 1,
            })
            .collect())
    }

    async fn fetch_agent_daily_rows(
        &self,
        agent_id: &str,
        month: &str,
    ) -> Result<Vec<DailyPerformanceRow>> {
        let rows: Vec<DailyRow> = self
            .get_rows(
                "daily_performance",
                &[
                    select("date,total_dials,total_connects,total_talktime,meetings_scheduled,meetings_successful"),
                    ("agent_id", eq(agent_id)),
                    ("month", eq(month)),
                    ("order", "date".to_string()),
                ],
            )
            .await?;

        Ok(rows.into_iter().map(DailyPerformanceRow::from).collect())
    }

    async fn find_daily_record(
        &self,
        agent_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AgentDailyRecord>> {
        let rows: Vec<DailyRow> = self
            .get_rows(
                "daily_performance",
                &[
                    select("*"),
                    ("agent_id", eq(agent_id)),
                    ("date", eq(&date.format("%Y-%m-%d").to_string())),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let record_id = row
            .record_id
            .ok_or_else(|| anyhow::anyhow!("daily_performance row without record_id"))?;

        Ok(Some(AgentDailyRecord {
            record_id,
            agent_id: row.agent_id.unwrap_or_else(|| agent_id.to_string()),
            date: row.date,
            values: EntryValues {
                total_dials: entry_count(row.total_dials),
                total_connected: entry_count(row.total_connects),
                meetings_scheduled: entry_count(row.meetings_scheduled),
                meetings_successful: entry_count(row.meetings_successful),
            },
        }))
    }

    async fn upsert_daily_performance(&self, args: UpsertDailyPerformance) -> Result<String> {
        let resource = format!("rpc/{}", UPSERT_PROCEDURE);
        let url = self.build_url(&resource, &[]);
        let body = UpsertArgs {
            p_agent_id: &args.agent_id,
            p_date: args.date.format("%Y-%m-%d").to_string(),
            p_total_dials: args.values.total_dials,
            p_total_connects: args.values.total_connected,
            p_meetings_scheduled: args.values.meetings_scheduled,
            p_meetings_successful: args.values.meetings_successful,
            p_project_id: &args.project_id,
        };

        let response = self.send(&resource, self.client.post(&url).json(&body)).await?;
        let record_id = response
            .json::<String>()
            .await
            .map_err(|source| GatewayError::Decode { resource, source })?;

        Ok(record_id)
    }
}
