//! # Spark Testing
//!
//! In-process mock of the Spark REST service, covering the membership
//! resource plus the people/room fixtures its tests need.
//!
//! ```ignore
//! let server = spark_testing::MockServer::start().await?;
//! let room = server.state().create_room("Test Room")?;
//! // point a client at server.base_url() with server.access_token()
//! ```

pub mod api;
pub mod ids;
pub mod server;
pub mod state;

pub use server::{router, MockServer};
pub use state::{
    InjectedFault, MembershipFilter, MembershipRecord, MockConfig, MockState, Person, PersonRef,
    Room, StoreError, DEFAULT_ACCESS_TOKEN, DEFAULT_PORT,
};
