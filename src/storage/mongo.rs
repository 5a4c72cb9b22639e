use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{DocumentStore, ItineraryStore, StoreError, UserStore};
use crate::models::{Itinerary, ItineraryRecord, NewUser, UserRecord};

const ITINERARIES: &str = "itineraries";
const USERS: &str = "users";
const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Serialize, Deserialize)]
struct ItineraryDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    user_id: String,
    #[serde(flatten)]
    itinerary: Itinerary,
}

impl From<ItineraryDocument> for ItineraryRecord {
    fn from(doc: ItineraryDocument) -> Self {
        ItineraryRecord {
            id: doc.id.map(|id| id.to_hex()),
            user_id: doc.user_id,
            itinerary: doc.itinerary,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    username: String,
    email: String,
    #[serde(default)]
    preferences: serde_json::Map<String, serde_json::Value>,
    #[serde(with = "crate::models::iso_timestamp")]
    created_at: chrono::DateTime<Utc>,
}

impl From<UserDocument> for UserRecord {
    fn from(doc: UserDocument) -> Self {
        UserRecord {
            id: doc.id.map(|id| id.to_hex()),
            username: doc.username,
            email: doc.email,
            preferences: doc.preferences,
            created_at: doc.created_at,
        }
    }
}

/// MongoDB-backed store
pub struct MongoStore {
    database: Database,
    itineraries: Collection<ItineraryDocument>,
    users: Collection<UserDocument>,
}

impl MongoStore {
    /// Connect, verify the server answers, and ensure the unique user indexes exist
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .with_context(|| "Failed to create MongoDB client")?;
        let database = client.database(database);

        database
            .run_command(doc! { "ping": 1 })
            .await
            .with_context(|| "MongoDB did not answer ping")?;

        let store = Self {
            itineraries: database.collection(ITINERARIES),
            users: database.collection(USERS),
            database,
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<()> {
        for field in ["username", "email"] {
            let index = IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.users
                .create_index(index)
                .await
                .with_context(|| format!("Failed to create unique index on users.{field}"))?;
        }

        let index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .build();
        self.itineraries
            .create_index(index)
            .await
            .with_context(|| "Failed to create itinerary index")?;

        Ok(())
    }
}

fn backend_error(err: mongodb::error::Error) -> StoreError {
    warn!("MongoDB operation failed: {}", err);
    StoreError::Backend(err.to_string())
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

/// Ids that are not ObjectIds cannot match anything
fn parse_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

#[async_trait]
impl ItineraryStore for MongoStore {
    async fn insert_itinerary(&self, user_id: &str, itinerary: Itinerary) -> Result<ItineraryRecord, StoreError> {
        let mut document = ItineraryDocument {
            id: None,
            user_id: user_id.to_string(),
            itinerary,
        };
        let result = self
            .itineraries
            .insert_one(&document)
            .await
            .map_err(backend_error)?;
        document.id = result.inserted_id.as_object_id();
        debug!("Inserted itinerary {:?}", document.id);
        Ok(document.into())
    }

    async fn itineraries_for_user(&self, user_id: &str) -> Result<Vec<ItineraryRecord>, StoreError> {
        let cursor = self
            .itineraries
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": -1 })
            .projection(doc! { "_id": 0 })
            .await
            .map_err(backend_error)?;
        let documents: Vec<ItineraryDocument> = cursor.try_collect().await.map_err(backend_error)?;
        Ok(documents.into_iter().map(ItineraryRecord::from).collect())
    }

    async fn find_itinerary(&self, id: &str) -> Result<Option<ItineraryRecord>, StoreError> {
        let Some(object_id) = parse_id(id) else {
            return Ok(None);
        };
        let document = self
            .itineraries
            .find_one(doc! { "_id": object_id })
            .await
            .map_err(backend_error)?;
        Ok(document.map(ItineraryRecord::from))
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let existing = self
            .users
            .find_one(doc! { "$or": [{ "username": user.username.as_str() }, { "email": user.email.as_str() }] })
            .await
            .map_err(backend_error)?;
        if existing.is_some() {
            return Err(StoreError::Conflict);
        }

        let mut document = UserDocument {
            id: None,
            username: user.username,
            email: user.email,
            preferences: user.preferences,
            created_at: Utc::now(),
        };
        let result = self.users.insert_one(&document).await.map_err(|e| {
            // a concurrent insert can still trip the unique index
            if is_duplicate_key(&e) {
                StoreError::Conflict
            } else {
                backend_error(e)
            }
        })?;
        document.id = result.inserted_id.as_object_id();
        Ok(document.into())
    }

    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let Some(object_id) = parse_id(id) else {
            return Ok(None);
        };
        let document = self
            .users
            .find_one(doc! { "_id": object_id })
            .projection(doc! { "_id": 0 })
            .await
            .map_err(backend_error)?;
        Ok(document.map(UserRecord::from))
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> bool {
        self.database.run_command(doc! { "ping": 1 }).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlaceSummary, WeatherInfo};
    use mongodb::bson;

    #[test]
    fn test_parse_id() {
        assert!(parse_id("65f0c0ffee0000000000abcd").is_some());
        assert!(parse_id("nope").is_none());
        assert!(parse_id("").is_none());
    }

    #[test]
    fn test_itinerary_document_bson_shape() {
        let document = ItineraryDocument {
            id: None,
            user_id: "anonymous".to_string(),
            itinerary: Itinerary {
                destination: "Rome".to_string(),
                main_attraction: PlaceSummary::new("R1", "Colosseum"),
                duration: 2,
                budget: 400,
                daily_budget: 200,
                travel_style: "balanced".to_string(),
                preferences: vec!["history".to_string()],
                nearby_attractions: Vec::new(),
                ai_generated_plan: "Plan".to_string(),
                created_at: Utc::now(),
                weather_info: WeatherInfo::Unavailable {
                    error: "Coordinates unavailable".to_string(),
                },
            },
        };

        let raw = bson::to_document(&document).unwrap();
        assert!(!raw.contains_key("_id"));
        assert_eq!(raw.get_str("user_id").unwrap(), "anonymous");
        assert_eq!(raw.get_str("destination").unwrap(), "Rome");
        assert!(raw.get_str("created_at").is_ok());

        let back: ItineraryDocument = bson::from_document(raw).unwrap();
        let record: ItineraryRecord = back.into();
        assert!(record.id.is_none());
        assert_eq!(record.itinerary.main_attraction.name, "Colosseum");
    }

    #[test]
    fn test_user_document_id_to_hex() {
        let id = ObjectId::new();
        let record: UserRecord = UserDocument {
            id: Some(id),
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            preferences: serde_json::Map::new(),
            created_at: Utc::now(),
        }
        .into();
        assert_eq!(record.id, Some(id.to_hex()));
    }
}
