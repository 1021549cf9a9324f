//! Mock service state.
//!
//! People, rooms and memberships live in concurrent maps (DashMap). The
//! (room, person) index guarantees at most one active membership per pair
//! even under concurrent creates.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::ids::{self, ResourceKind};

/// Default port for the standalone server.
pub const DEFAULT_PORT: u16 = 8089;

/// Default bearer token the mock accepts.
pub const DEFAULT_ACCESS_TOKEN: &str = "test-token";

/// Mock service configuration.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Port to listen on; 0 picks a free one.
    pub port: u16,
    /// Bearer token every request must carry.
    pub access_token: String,
    /// Email of the person the token belongs to.
    pub self_email: String,
    /// Display name of the person the token belongs to.
    pub self_display_name: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            access_token: DEFAULT_ACCESS_TOKEN.to_string(),
            self_email: "self@example.com".to_string(),
            self_display_name: "Test Self".to_string(),
        }
    }
}

/// A person known to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Person id (`ciscospark://us/PEOPLE/...`, base64).
    pub id: String,
    /// Email addresses; the first is primary.
    pub emails: Vec<String>,
    /// Name shown in clients.
    pub display_name: String,
    /// When the person was registered or provisioned.
    pub created: DateTime<Utc>,
    /// Provisioned from an email address nobody had signed up with.
    #[serde(skip)]
    pub pending: bool,
}

impl Person {
    /// Primary email address.
    pub fn email(&self) -> &str {
        self.emails.first().map(String::as_str).unwrap_or_default()
    }
}

/// A room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Room id.
    pub id: String,
    /// Room title.
    pub title: String,
    /// Person who created the room.
    pub creator_id: String,
    /// When the room was created.
    pub created: DateTime<Utc>,
}

/// A membership as stored and served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRecord {
    /// Membership id.
    pub id: String,
    /// Room the person belongs to.
    pub room_id: String,
    /// The member.
    pub person_id: String,
    /// Member's primary email.
    pub person_email: String,
    /// Member's display name.
    pub person_display_name: String,
    /// Whether the member moderates the room.
    pub is_moderator: bool,
    /// Always false; the mock has no monitors.
    pub is_monitor: bool,
    /// When the membership was created.
    pub created: DateTime<Utc>,
    /// Creation order, for newest-first listing.
    #[serde(skip)]
    pub seq: u64,
}

/// Who a create request targets.
#[derive(Debug, Clone)]
pub enum PersonRef {
    /// An existing person, by id.
    Id(String),
    /// A person by email; unknown addresses get a pending person.
    Email(String),
}

/// Filters for listing memberships.
#[derive(Debug, Clone, Default)]
pub struct MembershipFilter {
    /// Only memberships of this room.
    pub room_id: Option<String>,
    /// Only memberships of this person.
    pub person_id: Option<String>,
    /// Only memberships of this email (case-insensitive).
    pub person_email: Option<String>,
    /// Upper bound on results; zero is rejected.
    pub max: Option<usize>,
}

/// Why a store operation was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Malformed input (maps to 400).
    Invalid(String),
    /// Unknown resource (maps to 404).
    NotFound(String),
    /// Conflicting state (maps to 409).
    Conflict(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Invalid(msg) => write!(f, "invalid: {msg}"),
            StoreError::NotFound(msg) => write!(f, "not found: {msg}"),
            StoreError::Conflict(msg) => write!(f, "conflict: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for io::Error {
    fn from(err: StoreError) -> Self {
        io::Error::new(io::ErrorKind::InvalidInput, err)
    }
}

/// A canned failure returned instead of handling the next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedFault {
    /// HTTP status to answer with.
    pub status: u16,
    /// Error message placed in the body.
    pub message: String,
    /// `Retry-After` seconds, if any.
    pub retry_after: Option<u64>,
}

/// Shared mock service state.
#[derive(Clone)]
pub struct MockState {
    /// Server configuration.
    pub config: MockConfig,
    /// Id of the person the access token belongs to.
    pub self_id: String,
    people: Arc<DashMap<String, Person>>,
    /// Lower-cased email → person id.
    people_by_email: Arc<DashMap<String, String>>,
    rooms: Arc<DashMap<String, Room>>,
    memberships: Arc<DashMap<String, MembershipRecord>>,
    /// (room id, person id) → membership id.
    membership_index: Arc<DashMap<(String, String), String>>,
    faults: Arc<Mutex<VecDeque<InjectedFault>>>,
    seq: Arc<AtomicU64>,
}

impl MockState {
    /// Create an empty service whose only person is the token owner.
    ///
    /// Fails if `config.self_email` is not a valid address.
    pub fn new(config: MockConfig) -> Result<Self, StoreError> {
        let mut state = Self {
            self_id: String::new(),
            people: Arc::new(DashMap::new()),
            people_by_email: Arc::new(DashMap::new()),
            rooms: Arc::new(DashMap::new()),
            memberships: Arc::new(DashMap::new()),
            membership_index: Arc::new(DashMap::new()),
            faults: Arc::new(Mutex::new(VecDeque::new())),
            seq: Arc::new(AtomicU64::new(0)),
            config,
        };

        let me = state
            .create_person(
                &state.config.self_email.clone(),
                Some(&state.config.self_display_name.clone()),
            )?;
        state.self_id = me.id;
        Ok(state)
    }

    // ── People ────────────────────────────────────────────────────────────

    /// Register a person.
    pub fn create_person(
        &self,
        email: &str,
        display_name: Option<&str>,
    ) -> Result<Person, StoreError> {
        validate_email(email)?;
        let key = email.to_ascii_lowercase();

        match self.people_by_email.entry(key) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "A person with email {email} already exists"
            ))),
            Entry::Vacant(slot) => {
                let person = Person {
                    id: ids::mint(ResourceKind::People),
                    emails: vec![email.to_string()],
                    display_name: display_name
                        .map(str::to_string)
                        .unwrap_or_else(|| local_part(email).to_string()),
                    created: Utc::now(),
                    pending: false,
                };
                self.people.insert(person.id.clone(), person.clone());
                slot.insert(person.id.clone());
                tracing::debug!(person_id = person.id.as_str(), "Person created");
                Ok(person)
            }
        }
    }

    /// Look up a person by id.
    pub fn person(&self, person_id: &str) -> Option<Person> {
        self.people.get(person_id).map(|p| p.value().clone())
    }

    /// The person the access token belongs to.
    pub fn me(&self) -> Person {
        self.person(&self.self_id)
            .expect("self person is created in MockState::new")
    }

    /// Find a person by email, provisioning a pending one if nobody has it.
    fn person_for_email(&self, email: &str) -> Result<Person, StoreError> {
        validate_email(email)?;
        let key = email.to_ascii_lowercase();

        let person_id = match self.people_by_email.entry(key) {
            Entry::Occupied(slot) => slot.get().clone(),
            Entry::Vacant(slot) => {
                let person = Person {
                    id: ids::mint(ResourceKind::People),
                    emails: vec![email.to_string()],
                    display_name: local_part(email).to_string(),
                    created: Utc::now(),
                    pending: true,
                };
                tracing::debug!(person_id = person.id.as_str(), "Pending person provisioned");
                let id = person.id.clone();
                self.people.insert(id.clone(), person);
                slot.insert(id.clone());
                id
            }
        };

        self.person(&person_id)
            .ok_or_else(|| StoreError::NotFound("Person not found".to_string()))
    }

    fn person_for_id(&self, person_id: &str) -> Result<Person, StoreError> {
        if !ids::is_well_formed(person_id, ResourceKind::People) {
            return Err(StoreError::Invalid(format!("Invalid personId: {person_id}")));
        }
        self.person(person_id)
            .ok_or_else(|| StoreError::NotFound("Person not found".to_string()))
    }

    // ── Rooms ─────────────────────────────────────────────────────────────

    /// Create a room. The token owner joins it as a moderator.
    pub fn create_room(&self, title: &str) -> Result<Room, StoreError> {
        if title.trim().is_empty() {
            return Err(StoreError::Invalid("title is required".to_string()));
        }

        let room = Room {
            id: ids::mint(ResourceKind::Room),
            title: title.to_string(),
            creator_id: self.self_id.clone(),
            created: Utc::now(),
        };
        self.rooms.insert(room.id.clone(), room.clone());
        tracing::debug!(room_id = room.id.as_str(), "Room created");

        self.create_membership(&room.id, PersonRef::Id(self.self_id.clone()), true)?;
        Ok(room)
    }

    /// Look up a room by id.
    pub fn room(&self, room_id: &str) -> Option<Room> {
        self.rooms.get(room_id).map(|r| r.value().clone())
    }

    fn room_for_id(&self, room_id: &str) -> Result<Room, StoreError> {
        if !ids::is_well_formed(room_id, ResourceKind::Room) {
            return Err(StoreError::Invalid(format!("Invalid roomId: {room_id}")));
        }
        self.room(room_id)
            .ok_or_else(|| StoreError::NotFound("Room not found".to_string()))
    }

    // ── Memberships ───────────────────────────────────────────────────────

    /// Add a person to a room.
    pub fn create_membership(
        &self,
        room_id: &str,
        person: PersonRef,
        is_moderator: bool,
    ) -> Result<MembershipRecord, StoreError> {
        let room = self.room_for_id(room_id)?;
        let person = match person {
            PersonRef::Id(id) => self.person_for_id(&id)?,
            PersonRef::Email(email) => self.person_for_email(&email)?,
        };

        match self
            .membership_index
            .entry((room.id.clone(), person.id.clone()))
        {
            Entry::Occupied(_) => Err(StoreError::Conflict(
                "The person is already a member of the room".to_string(),
            )),
            Entry::Vacant(slot) => {
                let record = MembershipRecord {
                    id: ids::mint(ResourceKind::Membership),
                    room_id: room.id,
                    person_id: person.id.clone(),
                    person_email: person.email().to_string(),
                    person_display_name: person.display_name.clone(),
                    is_moderator,
                    is_monitor: false,
                    created: Utc::now(),
                    seq: self.seq.fetch_add(1, Ordering::SeqCst),
                };
                slot.insert(record.id.clone());
                self.memberships.insert(record.id.clone(), record.clone());
                tracing::info!(
                    membership_id = record.id.as_str(),
                    room_id = record.room_id.as_str(),
                    person_id = record.person_id.as_str(),
                    "Membership created"
                );
                Ok(record)
            }
        }
    }

    /// Look up a membership.
    pub fn membership(&self, membership_id: &str) -> Result<MembershipRecord, StoreError> {
        self.memberships
            .get(membership_id)
            .map(|m| m.value().clone())
            .ok_or_else(|| StoreError::NotFound("Membership not found".to_string()))
    }

    /// Set a membership's moderator flag.
    pub fn update_membership(
        &self,
        membership_id: &str,
        is_moderator: bool,
    ) -> Result<MembershipRecord, StoreError> {
        let mut record = self
            .memberships
            .get_mut(membership_id)
            .ok_or_else(|| StoreError::NotFound("Membership not found".to_string()))?;
        record.is_moderator = is_moderator;
        Ok(record.clone())
    }

    /// Remove a membership.
    pub fn delete_membership(&self, membership_id: &str) -> Result<(), StoreError> {
        let (_, record) = self
            .memberships
            .remove(membership_id)
            .ok_or_else(|| StoreError::NotFound("Membership not found".to_string()))?;
        self.membership_index
            .remove(&(record.room_id.clone(), record.person_id.clone()));
        tracing::info!(membership_id, "Membership deleted");
        Ok(())
    }

    /// Memberships visible to the token owner, newest first.
    ///
    /// Visible means: in a room the token owner belongs to.
    pub fn list_memberships(
        &self,
        filter: &MembershipFilter,
    ) -> Result<Vec<MembershipRecord>, StoreError> {
        if filter.max == Some(0) {
            return Err(StoreError::Invalid("max must be greater than zero".to_string()));
        }

        let email = filter.person_email.as_ref().map(|e| e.to_ascii_lowercase());
        // Snapshot first so no memberships shard lock is held while the
        // index is consulted.
        let snapshot: Vec<MembershipRecord> =
            self.memberships.iter().map(|m| m.value().clone()).collect();

        let mut records: Vec<MembershipRecord> = snapshot
            .into_iter()
            .filter(|m| self.is_member(&m.room_id, &self.self_id))
            .filter(|m| filter.room_id.as_ref().map_or(true, |r| &m.room_id == r))
            .filter(|m| filter.person_id.as_ref().map_or(true, |p| &m.person_id == p))
            .filter(|m| {
                email
                    .as_ref()
                    .map_or(true, |e| &m.person_email.to_ascii_lowercase() == e)
            })
            .collect();

        records.sort_by(|a, b| b.seq.cmp(&a.seq));
        if let Some(max) = filter.max {
            records.truncate(max);
        }
        Ok(records)
    }

    /// Whether `person_id` belongs to `room_id`.
    pub fn is_member(&self, room_id: &str, person_id: &str) -> bool {
        self.membership_index
            .contains_key(&(room_id.to_string(), person_id.to_string()))
    }

    /// Number of stored memberships.
    pub fn membership_count(&self) -> usize {
        self.memberships.len()
    }

    // ── Fault Injection ───────────────────────────────────────────────────

    /// Fail the next request with `status` instead of handling it.
    pub async fn inject_fault(&self, status: u16, message: &str, retry_after: Option<u64>) {
        self.faults.lock().await.push_back(InjectedFault {
            status,
            message: message.to_string(),
            retry_after,
        });
    }

    /// Take the next injected fault, if any.
    pub async fn take_fault(&self) -> Option<InjectedFault> {
        self.faults.lock().await.pop_front()
    }
}

fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

fn validate_email(email: &str) -> Result<(), StoreError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StoreError::Invalid(format!("Invalid email address: {email}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> MockState {
        MockState::new(MockConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_self_email_is_rejected() {
        let result = MockState::new(MockConfig {
            self_email: "not-an-email".into(),
            ..MockConfig::default()
        });
        assert!(matches!(result, Err(StoreError::Invalid(_))));

        let err: io::Error = StoreError::Invalid("bad".into()).into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_self_person_exists() {
        let state = state();
        assert_eq!(state.me().email(), "self@example.com");
        assert!(!state.me().pending);
    }

    #[test]
    fn test_create_room_adds_self_as_moderator() {
        let state = state();
        let room = state.create_room("Design review").unwrap();
        assert!(state.is_member(&room.id, &state.self_id));

        let listed = state
            .list_memberships(&MembershipFilter {
                room_id: Some(room.id.clone()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].is_moderator);
    }

    #[test]
    fn test_membership_by_unknown_email_provisions_pending_person() {
        let state = state();
        let room = state.create_room("r").unwrap();
        let record = state
            .create_membership(&room.id, PersonRef::Email("a@a.com".into()), false)
            .unwrap();
        let person = state.person(&record.person_id).unwrap();
        assert!(person.pending);
        assert_eq!(record.person_email, "a@a.com");
    }

    #[test]
    fn test_invalid_and_unknown_ids() {
        let state = state();
        let room = state.create_room("r").unwrap();

        let err = state
            .create_membership("abc", PersonRef::Id(state.self_id.clone()), false)
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));

        let unknown_room = ids::mint(ResourceKind::Room);
        let err = state
            .create_membership(&unknown_room, PersonRef::Id(state.self_id.clone()), false)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let err = state
            .create_membership(&room.id, PersonRef::Id("abc".into()), false)
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[test]
    fn test_duplicate_membership_conflicts_until_deleted() {
        let state = state();
        let room = state.create_room("r").unwrap();
        let other = state.create_person("other@example.com", None).unwrap();

        let first = state
            .create_membership(&room.id, PersonRef::Id(other.id.clone()), false)
            .unwrap();
        let err = state
            .create_membership(&room.id, PersonRef::Email("OTHER@example.com".into()), false)
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        state.delete_membership(&first.id).unwrap();
        assert!(state
            .create_membership(&room.id, PersonRef::Id(other.id), true)
            .is_ok());
    }

    #[test]
    fn test_list_is_newest_first_and_bounded() {
        let state = state();
        let room = state.create_room("r").unwrap();
        for i in 0..3 {
            let person = state
                .create_person(&format!("p{i}@example.com"), None)
                .unwrap();
            state
                .create_membership(&room.id, PersonRef::Id(person.id), false)
                .unwrap();
        }

        let listed = state
            .list_memberships(&MembershipFilter {
                max: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].person_email, "p2@example.com");
        assert_eq!(listed[1].person_email, "p1@example.com");

        assert!(matches!(
            state.list_memberships(&MembershipFilter {
                max: Some(0),
                ..Default::default()
            }),
            Err(StoreError::Invalid(_))
        ));
    }

    #[test]
    fn test_rooms_without_self_are_invisible() {
        let state = state();
        let room = state.create_room("r").unwrap();
        let self_membership = state
            .list_memberships(&MembershipFilter {
                room_id: Some(room.id.clone()),
                ..Default::default()
            })
            .unwrap()
            .remove(0);
        let other = state.create_person("o@example.com", None).unwrap();
        state
            .create_membership(&room.id, PersonRef::Id(other.id), false)
            .unwrap();

        state.delete_membership(&self_membership.id).unwrap();
        assert!(state
            .list_memberships(&MembershipFilter::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_update_and_delete_unknown_membership() {
        let state = state();
        assert!(matches!(
            state.update_membership("abc", true),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            state.delete_membership("abc"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_faults_are_taken_in_order() {
        let state = state();
        state.inject_fault(429, "slow down", Some(3)).await;
        state.inject_fault(500, "boom", None).await;

        assert_eq!(state.take_fault().await.unwrap().status, 429);
        assert_eq!(state.take_fault().await.unwrap().status, 500);
        assert!(state.take_fault().await.is_none());
    }
}
