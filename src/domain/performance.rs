// Agent daily performance domain models and aggregation
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One `daily_performance` row as used for rolling up an agent's period.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPerformanceRow {
    pub date: NaiveDate,
    pub total_dials: u64,
    pub total_connects: u64,
    pub total_talktime: Option<String>,
    pub meetings_scheduled: u64,
    pub meetings_successful: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDailyStat {
    pub date: String,
    pub dials: u64,
    pub connects: u64,
    pub meetings: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPerformance {
    pub total_dials: u64,
    pub total_connected: u64,
    pub talk_time_minutes: f64,
    pub scheduled_meetings: u64,
    pub successful_meetings: u64,
    pub daily_stats: Vec<AgentDailyStat>,
}

/// The editable counters of an agent's day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryValues {
    pub total_dials: u32,
    pub total_connected: u32,
    pub meetings_scheduled: u32,
    pub meetings_successful: u32,
}

/// A stored (agent, date) record. At most one exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDailyRecord {
    pub record_id: String,
    pub agent_id: String,
    pub date: NaiveDate,
    pub values: EntryValues,
}

/// Parses an `HH:MM:SS` duration into minutes.
///
/// Anything that does not split into exactly three parts is rejected; a part that is
/// not an integer counts as zero.
pub fn parse_talk_time(raw: &str) -> Option<f64> {
    let parts: Vec<&str> = raw.trim().split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let field = |s: &str| s.trim().parse::<i64>().unwrap_or(0) as f64;
    Some(field(parts[0]) * 60.0 + field(parts[1]) + field(parts[2]) / 60.0)
}

/// Rolls up an agent's daily rows. Returns `None` when there is nothing to aggregate.
pub fn aggregate_agent(rows: &[DailyPerformanceRow]) -> Option<AgentPerformance> {
    if rows.is_empty() {
        return None;
    }

    let mut ordered: Vec<&DailyPerformanceRow> = rows.iter().collect();
    ordered.sort_by_key(|row| row.date);

    let mut perf = AgentPerformance::default();
    for row in ordered {
        perf.total_dials += row.total_dials;
        perf.total_connected += row.total_connects;
        perf.scheduled_meetings += row.meetings_scheduled;
        perf.successful_meetings += row.meetings_successful;

        if let Some(raw) = row.total_talktime.as_deref() {
            match parse_talk_time(raw) {
                Some(minutes) => perf.talk_time_minutes += minutes,
                None => tracing::debug!("Skipping malformed talk time {:?} on {}", raw, row.date),
            }
        }

        perf.daily_stats.push(AgentDailyStat {
            date: row.date.format("%b %-d").to_string(),
            dials: row.total_dials,
            connects: row.total_connects,
            meetings: row.meetings_scheduled + row.meetings_successful,
        });
    }

    Some(perf)
}
