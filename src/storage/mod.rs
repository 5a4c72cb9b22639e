//! Document persistence for itineraries and users
//!
//! Two backends share one contract: MongoDB when a connection string is configured,
//! and an in-process store otherwise. Both hand out 24-hex ObjectId strings.

pub mod memory;
pub mod mongo;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::StorageConfig;
use crate::models::{Itinerary, ItineraryRecord, NewUser, UserRecord};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Username or email already exists")]
    Conflict,

    #[error("Storage error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ItineraryStore: Send + Sync {
    /// Persist an itinerary and return it with its new id
    async fn insert_itinerary(&self, user_id: &str, itinerary: Itinerary) -> Result<ItineraryRecord, StoreError>;

    /// Itineraries owned by `user_id`, newest first, without ids
    async fn itineraries_for_user(&self, user_id: &str) -> Result<Vec<ItineraryRecord>, StoreError>;

    /// One itinerary including its id. Unknown or malformed ids yield `None`.
    async fn find_itinerary(&self, id: &str) -> Result<Option<ItineraryRecord>, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Register a user. Username and email must both be unused.
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    /// One user without the id. Unknown or malformed ids yield `None`.
    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;
}

/// Both collections behind one handle
#[async_trait]
pub trait DocumentStore: ItineraryStore + UserStore {
    /// Backend name for logs
    fn backend(&self) -> &'static str;

    /// Whether the backend is reachable
    async fn ping(&self) -> bool;
}

/// MongoDB when a URI is configured, the in-memory store otherwise
pub async fn open(config: &StorageConfig) -> Result<Arc<dyn DocumentStore>> {
    match &config.mongodb_uri {
        Some(uri) => {
            let store = MongoStore::connect(uri, &config.database).await?;
            info!("Using MongoDB database '{}'", config.database);
            Ok(Arc::new(store))
        }
        None => {
            info!("No MongoDB URI configured, keeping documents in memory");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
