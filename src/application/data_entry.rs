// Data entry - Per agent/day form backed by the upsert procedure
use crate::application::data_gateway::{DataGateway, UpsertDailyPerformance};
use crate::domain::directory::Agent;
use crate::domain::filters::ProjectSelection;
use crate::domain::performance::EntryValues;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EntryError {
    #[error("Unknown project: {0}")]
    UnknownProject(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Gateway error: {0:#}")]
    Gateway(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FormPhase {
    /// No stored record for the selected day
    Idle,
    /// Pre-populated from a stored record
    Loaded,
    Editing,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryField {
    TotalDials,
    TotalConnected,
    MeetingsScheduled,
    MeetingsSuccessful,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataEntryForm {
    pub agent: Agent,
    pub date: NaiveDate,
    pub values: EntryValues,
    pub record_id: Option<String>,
    pub phase: FormPhase,
}

/// Numeric input semantics: the leading integer counts (`"12.5"` is 12),
/// no leading digits is zero, negatives clamp to zero.
fn parse_count(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits = &rest[..rest.bytes().take_while(u8::is_ascii_digit).count()];
    if negative || digits.is_empty() {
        return 0;
    }
    // All digits, so only overflow can fail.
    digits
        .parse::<u64>()
        .map(|v| v.min(u32::MAX as u64) as u32)
        .unwrap_or(u32::MAX)
}

impl DataEntryForm {
    pub fn new(agent: Agent, date: NaiveDate) -> Self {
        Self {
            agent,
            date,
            values: EntryValues::default(),
            record_id: None,
            phase: FormPhase::Idle,
        }
    }

    /// Switches to `date`, loading the stored record if one exists.
    pub async fn select_date(
        &mut self,
        gateway: &dyn DataGateway,
        date: NaiveDate,
    ) -> Result<(), EntryError> {
        let existing = gateway.find_daily_record(&self.agent.id, date).await?;
        self.date = date;

        match existing {
            Some(record) => {
                tracing::debug!("Loaded record {} for {} on {}", record.record_id, self.agent.id, date);
                self.values = record.values;
                self.record_id = Some(record.record_id);
                self.phase = FormPhase::Loaded;
            }
            None => {
                self.values = EntryValues::default();
                self.record_id = None;
                self.phase = FormPhase::Idle;
            }
        }
        Ok(())
    }

    pub fn set_field(&mut self, field: EntryField, raw: &str) {
        let value = parse_count(raw);
        match field {
            EntryField::TotalDials => self.values.total_dials = value,
            EntryField::TotalConnected => self.values.total_connected = value,
            EntryField::MeetingsScheduled => self.values.meetings_scheduled = value,
            EntryField::MeetingsSuccessful => self.values.meetings_successful = value,
        }
        self.phase = FormPhase::Editing;
    }

    pub fn set_values(&mut self, values: EntryValues) {
        self.values = values;
        self.phase = FormPhase::Editing;
    }

    /// Upserts the (agent, date) record. On failure the form stays editable for a retry.
    pub async fn submit(&mut self, gateway: &dyn DataGateway) -> Result<String, EntryError> {
        self.phase = FormPhase::Submitting;

        let args = UpsertDailyPerformance {
            agent_id: self.agent.id.clone(),
            project_id: self.agent.project_id.clone(),
            date: self.date,
            values: self.values,
        };

        match gateway.upsert_daily_performance(args).await {
            Ok(record_id) => {
                tracing::info!(
                    "Saved performance data for {} on {} ({})",
                    self.agent.name,
                    self.date,
                    record_id
                );
                self.record_id = Some(record_id.clone());
                self.phase = FormPhase::Idle;
                Ok(record_id)
            }
            Err(e) => {
                tracing::warn!("Error saving agent data for {}: {:#}", self.agent.id, e);
                self.phase = FormPhase::Editing;
                Err(EntryError::Gateway(e))
            }
        }
    }
}

#[derive(Clone)]
pub struct DataEntryService {
    gateway: Arc<dyn DataGateway>,
}

impl DataEntryService {
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &dyn DataGateway {
        self.gateway.as_ref()
    }

    /// Agents eligible for data entry; entry is only offered for a single project.
    pub async fn agents_for_project(
        &self,
        project: &ProjectSelection,
    ) -> Result<Vec<Agent>, EntryError> {
        let Some(name) = project.name() else {
            return Ok(Vec::new());
        };

        let project = self
            .gateway
            .find_project_by_name(name)
            .await?
            .ok_or_else(|| EntryError::UnknownProject(name.to_string()))?;

        Ok(self.gateway.list_agents_for_project(&project.id).await?)
    }

    /// Opens the form for an agent and loads whatever is stored for `date`.
    pub async fn open_form(&self, agent_id: &str, date: NaiveDate) -> Result<DataEntryForm, EntryError> {
        let agent = self
            .gateway
            .list_agents()
            .await?
            .into_iter()
            .find(|a| a.id == agent_id)
            .ok_or_else(|| EntryError::UnknownAgent(agent_id.to_string()))?;

        let mut form = DataEntryForm::new(agent, date);
        form.select_date(self.gateway(), date).await?;
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{Fail, InMemoryGateway};

    fn may(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
    }

    fn values(dials: u32, connected: u32, scheduled: u32, successful: u32) -> EntryValues {
        EntryValues {
            total_dials: dials,
            total_connected: connected,
            meetings_scheduled: scheduled,
            meetings_successful: successful,
        }
    }

    #[tokio::test]
    async fn test_submit_twice_overwrites_record() {
        let gateway = Arc::new(InMemoryGateway::seeded());
        let service = DataEntryService::new(gateway.clone());

        let mut form = service.open_form("ag-2", may(5)).await.unwrap();
        assert_eq!(form.phase, FormPhase::Idle);
        form.set_values(values(10, 4, 1, 0));
        let first = form.submit(service.gateway()).await.unwrap();

        let mut again = service.open_form("ag-2", may(5)).await.unwrap();
        again.set_values(values(25, 9, 3, 2));
        let second = again.submit(service.gateway()).await.unwrap();

        assert_eq!(first, second);
        let records = gateway.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[&("ag-2".to_string(), may(5))].values, values(25, 9, 3, 2));
    }

    #[tokio::test]
    async fn test_select_date_loads_or_resets() {
        let gateway = Arc::new(InMemoryGateway::seeded());
        let service = DataEntryService::new(gateway.clone());

        let mut form = service.open_form("ag-1", may(1)).await.unwrap();
        form.set_field(EntryField::TotalDials, "42");
        let record_id = form.submit(service.gateway()).await.unwrap();

        form.select_date(service.gateway(), may(2)).await.unwrap();
        assert_eq!(form.phase, FormPhase::Idle);
        assert_eq!(form.values, EntryValues::default());
        assert_eq!(form.record_id, None);

        form.select_date(service.gateway(), may(1)).await.unwrap();
        assert_eq!(form.phase, FormPhase::Loaded);
        assert_eq!(form.values.total_dials, 42);
        assert_eq!(form.record_id, Some(record_id));
    }

    #[tokio::test]
    async fn test_failed_submit_stays_editable() {
        let gateway = Arc::new(InMemoryGateway::seeded());
        let service = DataEntryService::new(gateway.clone());
        let mut form = service.open_form("ag-1", may(3)).await.unwrap();
        form.set_field(EntryField::MeetingsScheduled, "2");

        gateway.fail(Fail::Upsert);
        let err = form.submit(service.gateway()).await.unwrap_err();
        assert!(matches!(err, EntryError::Gateway(_)));
        assert_eq!(form.phase, FormPhase::Editing);
        assert_eq!(form.values.meetings_scheduled, 2);

        gateway.recover(Fail::Upsert);
        assert!(form.submit(service.gateway()).await.is_ok());
        assert_eq!(form.phase, FormPhase::Idle);
    }

    #[tokio::test]
    async fn test_failed_lookup_leaves_form_unchanged() {
        let gateway = Arc::new(InMemoryGateway::seeded());
        let service = DataEntryService::new(gateway.clone());
        let mut form = service.open_form("ag-1", may(3)).await.unwrap();
        form.set_field(EntryField::TotalConnected, "7");

        gateway.fail(Fail::Lookup);
        assert!(form.select_date(service.gateway(), may(4)).await.is_err());
        assert_eq!(form.date, may(3));
        assert_eq!(form.values.total_connected, 7);
    }

    #[test]
    fn test_set_field_input_semantics() {
        let agent = crate::application::testing::agent("ag-1", "Ana", "p-a", "A");
        let mut form = DataEntryForm::new(agent, may(1));
        form.set_field(EntryField::TotalDials, "abc");
        assert_eq!(form.values.total_dials, 0);
        form.set_field(EntryField::TotalDials, "-5");
        assert_eq!(form.values.total_dials, 0);
        form.set_field(EntryField::TotalDials, " 12 ");
        assert_eq!(form.values.total_dials, 12);
        form.set_field(EntryField::TotalDials, "12.5");
        assert_eq!(form.values.total_dials, 12);
        form.set_field(EntryField::TotalDials, "12abc");
        assert_eq!(form.values.total_dials, 12);
        form.set_field(EntryField::TotalDials, "+7");
        assert_eq!(form.values.total_dials, 7);
        form.set_field(EntryField::TotalDials, "-3.9");
        assert_eq!(form.values.total_dials, 0);
        form.set_field(EntryField::TotalDials, "99999999999");
        assert_eq!(form.values.total_dials, u32::MAX);
        assert_eq!(form.phase, FormPhase::Editing);
    }

    #[tokio::test]
    async fn test_agents_for_project() {
        let gateway = Arc::new(InMemoryGateway::seeded());
        let service = DataEntryService::new(gateway);

        assert!(service.agents_for_project(&ProjectSelection::All).await.unwrap().is_empty());

        let agents = service.agents_for_project(&"B".into()).await.unwrap();
        assert_eq!(agents.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(), vec!["ag-2", "ag-3"]);

        let err = service.agents_for_project(&"Nope".into()).await.unwrap_err();
        assert!(matches!(err, EntryError::UnknownProject(_)));
    }
}
