use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::Booking;

/// Lifecycle milestones in the order their timestamp fields are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineStage {
    Applied,
    Accepted,
    Started,
    Completed,
    Reviewed,
}

impl TimelineStage {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Applied,
            Self::Accepted,
            Self::Started,
            Self::Completed,
            Self::Reviewed,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Accepted => "accepted",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Reviewed => "reviewed",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Applied => "Worker applied to the job",
            Self::Accepted => "Client accepted the application",
            Self::Started => "Worker started the job",
            Self::Completed => "Worker marked the work complete",
            Self::Reviewed => "Client approved the completed work",
        }
    }
}

/// One reached milestone in the derived timeline view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub stage: TimelineStage,
    pub stage_label: &'static str,
    pub timestamp: DateTime<Utc>,
    pub description: &'static str,
}

/// Estimated-versus-actual verdict for a finished execution window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Efficiency {
    Efficient,
    OnTime,
    Overtime,
}

impl Efficiency {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Efficient => "efficient",
            Self::OnTime => "on-time",
            Self::Overtime => "overtime",
        }
    }

    /// Bucket a variance: at or under estimate is efficient, up to an hour
    /// over is on-time, anything past that is overtime.
    pub fn from_variance(variance_hours: f64) -> Self {
        if variance_hours <= 0.0 {
            Self::Efficient
        } else if variance_hours <= 1.0 {
            Self::OnTime
        } else {
            Self::Overtime
        }
    }
}

/// Work duration figures derived from the booking's recorded windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkDuration {
    pub estimated_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variance_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<Efficiency>,
}

fn round_tenths(hours: f64) -> f64 {
    (hours * 10.0).round() / 10.0
}

impl Booking {
    /// Project the reached milestones, oldest first. Derived on every call
    /// from the timestamp fields; nothing is stored.
    pub fn timeline(&self) -> Vec<TimelineEntry> {
        TimelineStage::ordered()
            .into_iter()
            .filter_map(|stage| {
                self.stage_timestamp(stage).map(|timestamp| TimelineEntry {
                    stage,
                    stage_label: stage.label(),
                    timestamp,
                    description: stage.description(),
                })
            })
            .collect()
    }

    fn stage_timestamp(&self, stage: TimelineStage) -> Option<DateTime<Utc>> {
        match stage {
            TimelineStage::Applied => self.applied_at,
            TimelineStage::Accepted => self.accepted_at,
            TimelineStage::Started => self.started_at,
            TimelineStage::Completed => self.completed_at,
            TimelineStage::Reviewed => self.reviewed_at,
        }
    }

    /// Compare the actual execution window against the estimate. Actual
    /// figures only appear once both window ends are recorded; hours are
    /// rounded to one decimal.
    pub fn work_duration(&self) -> WorkDuration {
        let estimated_hours = f64::from(self.estimated_hours);

        let actual = match (self.actual_start, self.actual_end) {
            (Some(start), Some(end)) => {
                Some(round_tenths((end - start).num_seconds() as f64 / 3600.0))
            }
            _ => None,
        };

        match actual {
            Some(actual_hours) => {
                let variance_hours = round_tenths(actual_hours - estimated_hours);
                WorkDuration {
                    estimated_hours,
                    actual_hours: Some(actual_hours),
                    variance_hours: Some(variance_hours),
                    efficiency: Some(Efficiency::from_variance(variance_hours)),
                }
            }
            None => WorkDuration {
                estimated_hours,
                actual_hours: None,
                variance_hours: None,
                efficiency: None,
            },
        }
    }
}
