use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

/// Operator reference as it appears inside a stored job: either a bare id
/// or an embedded operator object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OperatorRef {
    Id(String),
    Embedded(EmbeddedOperator),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedOperator {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl OperatorRef {
    pub fn id(&self) -> Option<&str> {
        let raw = match self {
            OperatorRef::Id(id) => Some(id.as_str()),
            OperatorRef::Embedded(embedded) => embedded.id.as_deref(),
        };

        raw.map(str::trim).filter(|id| !id.is_empty())
    }
}

/// A job document as the job store hands it out.
///
/// Who is assigned may be recorded in any of `operator` (single embedded
/// object), `operators` (current multi-operator list) or `operator_id`
/// (legacy flat field). Readers must union all three.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    #[serde(default)]
    pub id: String,
    pub property_id: String,
    #[serde(default)]
    pub property_name: String,
    #[serde(default)]
    pub property_address: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scheduled_time: Option<String>,
    #[serde(default)]
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub operator: Option<OperatorRef>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub operators: Vec<OperatorRef>,
    #[serde(default)]
    pub operator_id: Option<String>,
}

// Older documents carry `"operators": null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<OperatorRef>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<OperatorRef>>::deserialize(deserializer)?.unwrap_or_default())
}

impl JobRecord {
    pub fn is_completed(&self) -> bool {
        self.completed || self.status == JobStatus::Completed
    }

    /// Local start time: the `scheduledTime` string ("9:00", "14:30") when it
    /// parses, otherwise the time part of `scheduledDate` in `offset`.
    pub fn start_time(&self, offset: &FixedOffset) -> Option<NaiveTime> {
        self.scheduled_time
            .as_deref()
            .and_then(|raw| NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok())
            .or_else(|| self.scheduled_date.map(|at| at.with_timezone(offset).time()))
    }

    /// The job as a scoring target, dated in `offset`. `None` when it has no
    /// scheduled date.
    pub fn to_cleaning_job(&self, offset: &FixedOffset) -> Option<CleaningJob> {
        let scheduled_date = self.scheduled_date?.with_timezone(offset).date_naive();

        Some(CleaningJob {
            id: self.id.clone(),
            property_id: self.property_id.clone(),
            property_name: self.property_name.clone(),
            property_address: self.property_address.clone(),
            location: self.location,
            scheduled_date,
            scheduled_time: self.scheduled_time.clone(),
            estimated_duration_min: self.estimated_duration,
        })
    }
}

/// The job being staffed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleaningJob {
    pub id: String,
    pub property_id: String,
    pub property_name: String,
    pub property_address: String,
    pub location: Option<GeoPoint>,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: Option<String>,
    pub estimated_duration_min: Option<u32>,
}

/// A job already on an operator's schedule for the day being scored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExistingAssignment {
    pub job_id: String,
    pub property_id: String,
    pub property_name: String,
    pub property_address: String,
    pub location: Option<GeoPoint>,
    pub scheduled_time: Option<String>,
    pub estimated_duration_min: Option<u32>,
}

impl From<&JobRecord> for ExistingAssignment {
    fn from(record: &JobRecord) -> Self {
        Self {
            job_id: record.id.clone(),
            property_id: record.property_id.clone(),
            property_name: record.property_name.clone(),
            property_address: record.property_address.clone(),
            location: record.location,
            scheduled_time: record.scheduled_time.clone(),
            estimated_duration_min: record.estimated_duration,
        }
    }
}
