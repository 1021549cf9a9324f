//! Resource id minting.
//!
//! Ids look like the real service's: URL-safe base64 of
//! `ciscospark://us/<KIND>/<uuid>`. Decoding tells a well-formed id of the
//! wrong kind (or garbage like `abc`) apart from one that is merely unknown.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use uuid::Uuid;

const URI_PREFIX: &str = "ciscospark://us/";

/// Kinds of resource the mock hands out ids for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// A person
    People,
    /// A room
    Room,
    /// A room membership
    Membership,
}

impl ResourceKind {
    fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::People => "PEOPLE",
            ResourceKind::Room => "ROOM",
            ResourceKind::Membership => "MEMBERSHIP",
        }
    }
}

/// Mint a fresh id of the given kind.
pub fn mint(kind: ResourceKind) -> String {
    let uri = format!("{}{}/{}", URI_PREFIX, kind.as_str(), Uuid::new_v4());
    URL_SAFE_NO_PAD.encode(uri)
}

/// Whether `id` is a well-formed id of `kind`.
pub fn is_well_formed(id: &str, kind: ResourceKind) -> bool {
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(id) else {
        return false;
    };
    let Ok(uri) = String::from_utf8(bytes) else {
        return false;
    };
    uri.strip_prefix(URI_PREFIX)
        .and_then(|rest| rest.strip_prefix(kind.as_str()))
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|uuid| Uuid::parse_str(uuid).is_ok())
}
