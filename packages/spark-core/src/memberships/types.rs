//! Membership resource types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A person's membership in a room.
///
/// Every field is present on a membership returned by the service; responses
/// missing one are rejected before they reach the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    /// Unique id assigned by the service.
    pub id: String,
    /// Room the person belongs to.
    pub room_id: String,
    /// The member.
    pub person_id: String,
    /// The member's email address.
    pub person_email: String,
    /// Whether the member moderates the room.
    pub is_moderator: bool,
    /// Whether the member is a room monitor. Set by the service.
    pub is_monitor: bool,
    /// When the membership was created.
    pub created: DateTime<Utc>,
}

/// Membership as it arrives on the wire, before required fields are checked.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MembershipPayload {
    id: Option<String>,
    room_id: Option<String>,
    person_id: Option<String>,
    person_email: Option<String>,
    is_moderator: Option<bool>,
    is_monitor: Option<bool>,
    created: Option<DateTime<Utc>>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| Error::InvalidResponse(format!("membership is missing `{field}`")))
}

fn required_text(value: Option<String>, field: &str) -> Result<String> {
    required(value.filter(|v| !v.trim().is_empty()), field)
}

impl TryFrom<MembershipPayload> for Membership {
    type Error = Error;

    fn try_from(payload: MembershipPayload) -> Result<Self> {
        Ok(Self {
            id: required_text(payload.id, "id")?,
            room_id: required_text(payload.room_id, "roomId")?,
            person_id: required_text(payload.person_id, "personId")?,
            person_email: required_text(payload.person_email, "personEmail")?,
            is_moderator: required(payload.is_moderator, "isModerator")?,
            is_monitor: required(payload.is_monitor, "isMonitor")?,
            created: required(payload.created, "created")?,
        })
    }
}

/// List response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct MembershipPage {
    pub(crate) items: Vec<MembershipPayload>,
}

/// Who a new membership is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PersonSelector {
    /// An existing person, by id.
    #[serde(rename = "personId")]
    ById(String),
    /// A person by email address. Addresses without an account are accepted
    /// by the service.
    #[serde(rename = "personEmail")]
    ByEmail(String),
}

impl PersonSelector {
    fn validate(&self) -> Result<()> {
        match self {
            PersonSelector::ById(id) => non_empty(id, "personId"),
            PersonSelector::ByEmail(email) => non_empty(email, "personEmail"),
        }
    }
}

pub(crate) fn non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{name} must not be empty")));
    }
    Ok(())
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMembership {
    room_id: String,
    #[serde(flatten)]
    person: PersonSelector,
    is_moderator: bool,
}

impl CreateMembership {
    /// Add `selector` to `room_id` as a regular (non-moderator) member.
    pub fn new(room_id: impl Into<String>, person: PersonSelector) -> Self {
        Self {
            room_id: room_id.into(),
            person,
            is_moderator: false,
        }
    }

    /// Add a person by id.
    pub fn by_person_id(room_id: impl Into<String>, person_id: impl Into<String>) -> Self {
        Self::new(room_id, PersonSelector::ById(person_id.into()))
    }

    /// Add a person by email address.
    pub fn by_person_email(room_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self::new(room_id, PersonSelector::ByEmail(email.into()))
    }

    /// Set the moderator flag.
    pub fn moderator(mut self, is_moderator: bool) -> Self {
        self.is_moderator = is_moderator;
        self
    }

    /// Target room.
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Target person.
    pub fn person(&self) -> &PersonSelector {
        &self.person
    }

    /// Requested moderator flag.
    pub fn is_moderator(&self) -> bool {
        self.is_moderator
    }

    pub(crate) fn validate(&self) -> Result<()> {
        non_empty(&self.room_id, "roomId")?;
        self.person.validate()
    }
}

/// Body of an update request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateMembership {
    pub(crate) is_moderator: bool,
}

/// Filters for listing memberships. All optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListMemberships {
    /// Only memberships of this room.
    pub room_id: Option<String>,
    /// Only memberships of this person.
    pub person_id: Option<String>,
    /// Only memberships of the person with this email.
    pub person_email: Option<String>,
    /// Upper bound on the number of memberships returned.
    pub max: Option<u32>,
}

impl ListMemberships {
    /// No filters: every membership visible to the caller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by room.
    pub fn room_id(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    /// Filter by person id.
    pub fn person_id(mut self, person_id: impl Into<String>) -> Self {
        self.person_id = Some(person_id.into());
        self
    }

    /// Filter by person email.
    pub fn person_email(mut self, email: impl Into<String>) -> Self {
        self.person_email = Some(email.into());
        self
    }

    /// Bound the number of results.
    pub fn max(mut self, max: u32) -> Self {
        self.max = Some(max);
        self
    }

    /// Query string pairs, in a stable order.
    pub(crate) fn query_pairs(&self) -> Result<Vec<(&'static str, String)>> {
        let mut pairs = Vec::with_capacity(4);

        for (name, value) in [
            ("roomId", &self.room_id),
            ("personId", &self.person_id),
            ("personEmail", &self.person_email),
        ] {
            if let Some(value) = value {
                non_empty(value, name)?;
                pairs.push((name, value.clone()));
            }
        }

        if let Some(max) = self.max {
            if max == 0 {
                return Err(Error::InvalidArgument(
                    "max must be greater than zero".to_string(),
                ));
            }
            pairs.push(("max", max.to_string()));
        }

        Ok(pairs)
    }
}
