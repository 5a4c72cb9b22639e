use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{DocumentStore, ItineraryStore, StoreError, UserStore};
use crate::models::{Itinerary, ItineraryRecord, NewUser, UserRecord};

/// Process-local store with the same semantics as the MongoDB backend
#[derive(Default)]
pub struct MemoryStore {
    itineraries: RwLock<Vec<ItineraryRecord>>,
    users: RwLock<Vec<UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn new_id() -> String {
    ObjectId::new().to_hex()
}

#[async_trait]
impl ItineraryStore for MemoryStore {
    async fn insert_itinerary(&self, user_id: &str, itinerary: Itinerary) -> Result<ItineraryRecord, StoreError> {
        let record = ItineraryRecord {
            id: Some(new_id()),
            user_id: user_id.to_string(),
            itinerary,
        };
        self.itineraries.write().await.push(record.clone());
        Ok(record)
    }

    async fn itineraries_for_user(&self, user_id: &str) -> Result<Vec<ItineraryRecord>, StoreError> {
        let itineraries = self.itineraries.read().await;
        let mut owned: Vec<ItineraryRecord> = itineraries
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .map(ItineraryRecord::without_id)
            .collect();
        // latest insert first on equal timestamps
        owned.reverse();
        owned.sort_by(|a, b| b.itinerary.created_at.cmp(&a.itinerary.created_at));
        Ok(owned)
    }

    async fn find_itinerary(&self, id: &str) -> Result<Option<ItineraryRecord>, StoreError> {
        let itineraries = self.itineraries.read().await;
        Ok(itineraries
            .iter()
            .find(|record| record.id.as_deref() == Some(id))
            .cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        // the write lock covers both the check and the insert
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|existing| existing.username == user.username || existing.email == user.email)
        {
            return Err(StoreError::Conflict);
        }

        let record = UserRecord {
            id: Some(new_id()),
            username: user.username,
            email: user.email,
            preferences: user.preferences,
            created_at: Utc::now(),
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|record| record.id.as_deref() == Some(id))
            .cloned()
            .map(UserRecord::without_id))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> bool {
        true
    }
}
