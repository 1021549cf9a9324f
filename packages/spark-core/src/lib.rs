//! # Spark Core
//!
//! Client SDK core for the Spark collaboration service.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SPARK CORE MODULES                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────────────────────┐    ┌──────────────────────────────┐  │
//! │  │         Memberships          │    │           Logging            │  │
//! │  │                              │    │                              │  │
//! │  │ - create (by id / by email)  │    │ - MediaEngineLogger trait    │  │
//! │  │ - list / get                 │    │ - LogBridge (pinned level)   │  │
//! │  │ - update (moderator flag)    │    │ - TracingSink / Buffered     │  │
//! │  │ - delete                     │    │                              │  │
//! │  └──────────────┬───────────────┘    └──────────────────────────────┘  │
//! │                 │                                                       │
//! │  ┌──────────────┴───────────────┐    ┌──────────────────────────────┐  │
//! │  │          Transport           │    │        Config / Error        │  │
//! │  │                              │    │                              │  │
//! │  │ - reqwest, bearer token      │    │ - SdkConfig::from_env        │  │
//! │  │ - status → typed Error       │    │ - Error codes                │  │
//! │  └──────────────────────────────┘    └──────────────────────────────┘  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`config`] - SDK configuration
//! - [`transport`] - Authenticated JSON-over-HTTPS transport
//! - [`memberships`] - Room membership client
//! - [`logging`] - Media engine log bridge
//!
//! ## Example
//!
//! ```ignore
//! use spark_core::{Spark, SdkConfig};
//!
//! let spark = Spark::new(SdkConfig::with_access_token(token))?;
//! let membership = spark
//!     .memberships()
//!     .create_by_person_email(&room_id, "someone@example.com", false)
//!     .await?;
//! spark.memberships().delete(&membership.id).await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod config;
pub mod error;
pub mod logging;
pub mod memberships;
pub mod transport;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::SdkConfig;
pub use error::{Error, Result, ServiceFailure};
pub use logging::{LogBridge, LogLevel, LogRecord, LogSink, MediaEngineLogger, TracingSink};
pub use memberships::{
    CreateMembership, ListMemberships, Membership, MembershipClient, PersonSelector,
};

// ============================================================================
// SDK INSTANCE
// ============================================================================

use once_cell::sync::OnceCell;
use std::sync::Arc;

use transport::HttpTransport;

/// Process-wide instance installed by [`Spark::initialize`].
static INSTANCE: OnceCell<Arc<Spark>> = OnceCell::new();

/// Entry point of the SDK: one configured transport plus the resource
/// clients built on it.
#[derive(Debug, Clone)]
pub struct Spark {
    config: SdkConfig,
    memberships: MembershipClient,
}

impl Spark {
    /// Build an independent instance.
    pub fn new(config: SdkConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;

        tracing::debug!(
            base_url = transport.base_url(),
            media_engine_log_level = %config.media_engine_log_level,
            "Spark client created"
        );

        Ok(Self {
            memberships: MembershipClient::new(transport),
            config,
        })
    }

    /// Install the process-wide instance.
    ///
    /// Call once at startup; a second call fails with
    /// [`Error::AlreadyInitialized`].
    pub fn initialize(config: SdkConfig) -> Result<Arc<Spark>> {
        tracing::info!("Initializing Spark Core v{}", env!("CARGO_PKG_VERSION"));

        let spark = Arc::new(Self::new(config)?);
        INSTANCE
            .set(spark.clone())
            .map_err(|_| Error::AlreadyInitialized)?;

        tracing::info!("Spark Core initialized successfully");
        Ok(spark)
    }

    /// The process-wide instance.
    pub fn instance() -> Result<Arc<Spark>> {
        INSTANCE.get().cloned().ok_or(Error::NotInitialized)
    }

    /// Check if the process-wide instance is installed
    pub fn is_initialized() -> bool {
        INSTANCE.get().is_some()
    }

    /// Configuration this instance was built with.
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Room membership operations.
    pub fn memberships(&self) -> &MembershipClient {
        &self.memberships
    }

    /// Logger to hand to the media engine. Engine output lands in `tracing`
    /// at the configured `media_engine_log_level`.
    pub fn media_engine_logger(&self) -> LogBridge<TracingSink> {
        LogBridge::new(TracingSink, self.config.media_engine_log_level)
    }
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of Spark Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_new_requires_token() {
        assert!(matches!(
            Spark::new(SdkConfig::default()),
            Err(Error::MissingAccessToken)
        ));
    }

    #[test]
    fn test_media_engine_logger_uses_configured_level() {
        let config = SdkConfig::with_access_token("t").media_engine_log_level(LogLevel::Debug);
        let spark = Spark::new(config).unwrap();
        assert_eq!(spark.media_engine_logger().level(), LogLevel::Debug);
        assert_eq!(spark.config().media_engine_log_level, LogLevel::Debug);
    }

    // The only test in this crate that touches the process-wide instance.
    #[test]
    fn test_global_lifecycle() {
        assert!(matches!(Spark::instance(), Err(Error::NotInitialized)));
        assert!(!Spark::is_initialized());

        Spark::initialize(SdkConfig::with_access_token("t")).unwrap();
        assert!(Spark::is_initialized());
        assert!(Spark::instance().is_ok());

        assert!(matches!(
            Spark::initialize(SdkConfig::with_access_token("t")),
            Err(Error::AlreadyInitialized)
        ));
    }
}
