// Sortable project performance table
use super::snapshot::ProjectPerformanceRow;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Dials,
    Connected,
    TalkTime,
    ScheduledMeetings,
    SuccessfulMeetings,
    #[default]
    SuccessRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortState {
    /// Re-selecting the active column flips direction; a new column starts descending.
    pub fn select(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = SortDirection::Desc;
        }
    }
}

fn key(row: &ProjectPerformanceRow, field: SortField) -> f64 {
    match field {
        SortField::Dials => row.dials as f64,
        SortField::Connected => row.connected as f64,
        SortField::TalkTime => row.talk_time_minutes,
        SortField::ScheduledMeetings => row.scheduled_meetings as f64,
        SortField::SuccessfulMeetings => row.successful_meetings as f64,
        SortField::SuccessRate => row.success_rate,
    }
}

pub fn sort_rows(rows: &[ProjectPerformanceRow], sort: SortState) -> Vec<ProjectPerformanceRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        let ord = key(a, sort.field)
            .partial_cmp(&key(b, sort.field))
            .unwrap_or(Ordering::Equal);
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    sorted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuccessBand {
    High,
    Medium,
    Low,
}

impl SuccessBand {
    pub fn of(rate: f64) -> Self {
        if rate >= 70.0 {
            SuccessBand::High
        } else if rate >= 50.0 {
            SuccessBand::Medium
        } else {
            SuccessBand::Low
        }
    }
}
