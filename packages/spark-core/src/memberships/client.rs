//! Memberships REST client.

use super::types::{
    non_empty, CreateMembership, ListMemberships, Membership, MembershipPage, MembershipPayload,
    UpdateMembership,
};
use crate::error::Result;
use crate::transport::HttpTransport;

const MEMBERSHIPS_PATH: &str = "/memberships";

/// Create, list, get, update and delete room memberships.
///
/// Each call is one request to the service. Nothing is cached and nothing
/// is retried; a failed call returns the service's error.
#[derive(Debug, Clone)]
pub struct MembershipClient {
    transport: HttpTransport,
}

impl MembershipClient {
    /// Client sending requests through `transport`.
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Add a person to a room.
    ///
    /// Fails if the room or the person id does not exist. An email address
    /// with no account behind it is accepted by the service.
    pub async fn create(&self, request: CreateMembership) -> Result<Membership> {
        request.validate()?;

        let payload: MembershipPayload = self.transport.post(MEMBERSHIPS_PATH, &request).await?;
        let membership = Membership::try_from(payload)?;

        tracing::info!(
            membership_id = membership.id.as_str(),
            room_id = membership.room_id.as_str(),
            is_moderator = membership.is_moderator,
            "Membership created"
        );
        Ok(membership)
    }

    /// Add a person, by id, to a room.
    pub async fn create_by_person_id(
        &self,
        room_id: &str,
        person_id: &str,
        is_moderator: bool,
    ) -> Result<Membership> {
        self.create(CreateMembership::by_person_id(room_id, person_id).moderator(is_moderator))
            .await
    }

    /// Add a person, by email, to a room.
    pub async fn create_by_person_email(
        &self,
        room_id: &str,
        person_email: &str,
        is_moderator: bool,
    ) -> Result<Membership> {
        self.create(CreateMembership::by_person_email(room_id, person_email).moderator(is_moderator))
            .await
    }

    /// List memberships matching `query`, in the order the service returns.
    pub async fn list(&self, query: &ListMemberships) -> Result<Vec<Membership>> {
        let pairs = query.query_pairs()?;

        let page: MembershipPage = self.transport.get(MEMBERSHIPS_PATH, &pairs).await?;
        let memberships = page
            .items
            .into_iter()
            .map(Membership::try_from)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(count = memberships.len(), "Memberships listed");
        Ok(memberships)
    }

    /// Fetch one membership.
    pub async fn get(&self, membership_id: &str) -> Result<Membership> {
        let path = membership_path(membership_id)?;
        let payload: MembershipPayload = self.transport.get(&path, &[]).await?;
        Membership::try_from(payload)
    }

    /// Set a membership's moderator flag, the only mutable field.
    pub async fn update(&self, membership_id: &str, is_moderator: bool) -> Result<Membership> {
        let path = membership_path(membership_id)?;
        let payload: MembershipPayload = self
            .transport
            .put(&path, &UpdateMembership { is_moderator })
            .await?;
        let membership = Membership::try_from(payload)?;

        tracing::info!(
            membership_id = membership.id.as_str(),
            is_moderator = membership.is_moderator,
            "Membership updated"
        );
        Ok(membership)
    }

    /// Remove a membership. Later calls with the same id fail.
    pub async fn delete(&self, membership_id: &str) -> Result<()> {
        let path = membership_path(membership_id)?;
        self.transport.delete(&path).await?;

        tracing::info!(membership_id, "Membership deleted");
        Ok(())
    }
}

/// Path of a single membership. Blank ids would address the collection.
fn membership_path(membership_id: &str) -> Result<String> {
    non_empty(membership_id, "membershipId")?;
    Ok(format!(
        "{}/{}",
        MEMBERSHIPS_PATH,
        urlencoding::encode(membership_id)
    ))
}
