//! # Memberships
//!
//! A membership links a person to a room and carries the person's moderator
//! flag in that room.
//!
//! ## Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       MEMBERSHIP LIFECYCLE                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  create(room, ById | ByEmail)  ──►  Membership { isModerator, ... }    │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  get / list                    ──►  unchanged                          │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  update(id, isModerator)       ──►  same id, new flag                  │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  delete(id)                    ──►  get/update/delete(id) now fail     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod client;
mod types;

pub use client::MembershipClient;
pub use types::{CreateMembership, ListMemberships, Membership, PersonSelector};
