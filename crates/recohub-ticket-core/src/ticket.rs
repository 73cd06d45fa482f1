use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Days between ticket creation and the first snooze deadline.
pub const SNOOZE_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
/// Abstract unit of work tracked by a ticket backend.
///
/// The record is owned by the caller. Backends fill in `IssueKey`, `Subject`,
/// `RecommenderID` and the dates during creation and never delete it.
pub struct Ticket {
    pub issue_key: String,
    pub target_contact: String,
    pub creation_date: DateTime<Utc>,
    pub last_update_date: DateTime<Utc>,
    pub last_ping_date: DateTime<Utc>,
    pub snooze_date: DateTime<Utc>,
    pub subject: String,
    pub assignee: Vec<String>,
    #[serde(rename = "RecommenderID")]
    pub recommender_id: String,
}

impl Ticket {
    pub fn new(target_contact: impl Into<String>, assignee: Vec<String>) -> Self {
        Self {
            target_contact: target_contact.into(),
            assignee,
            ..Self::default()
        }
    }

    /// Ticket carrying only an issue key, as returned by existence lookups.
    pub fn with_issue_key(issue_key: impl Into<String>) -> Self {
        Self {
            issue_key: issue_key.into(),
            ..Self::default()
        }
    }

    /// Stamps creation, update and ping dates with `now` and pushes the snooze
    /// date [`SNOOZE_DAYS`] into the future.
    pub fn stamp_created(&mut self, now: DateTime<Utc>) {
        self.creation_date = now;
        self.last_update_date = now;
        self.last_ping_date = now;
        self.snooze_date = now + Duration::days(SNOOZE_DAYS);
    }

    pub fn has_issue_key(&self) -> bool {
        !self.issue_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// One row of the recommendation export that a ticket is created from.
pub struct RecommendationQueryResult {
    /// Slash-delimited hierarchical resource path, e.g. `projects/p/buckets/b`.
    #[serde(rename = "TargetResource")]
    pub target_resource: String,
    #[serde(rename = "Recommender_subtype")]
    pub recommender_subtype: String,
    #[serde(rename = "Recommender_name")]
    pub recommender_name: String,
    #[serde(rename = "Project_name")]
    pub project_name: String,
    #[serde(rename = "Impact_cost_unit")]
    pub impact_cost_unit: i64,
    #[serde(rename = "Impact_currency_code")]
    pub impact_currency_code: String,
    #[serde(rename = "Description")]
    pub description: String,
}
