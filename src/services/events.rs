//! Domain event publication
//!
//! Publishing is fire-and-forget: the envelope is handed to a spawned task and
//! the request carries on whatever the bus does.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::EventsConfig,
    error::{AppError, AppResult},
    models::user::Role,
};

/// Events emitted after successful mutations
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    UserCreated { email_id: String },
    UserLoggedIn { email_id: String },
    PasswordReset { email_id: String },
    UserRoleUpdated { email_id: String, role: Role },
    BookAdded { book_name: String, author: String },
    BookDeleted { book_name: String },
    BookBorrowed { book_name: String, user: String },
    BookReturned { book_name: String, user: String },
    CollectionCreated { collection_name: String },
    CollectionDeleted { collection_name: String },
    ResourceAdded { resource_name: String, link: String, collection_name: String },
    ResourceDeleted { resource_name: String, collection_name: String },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::UserCreated { .. } => "UserCreated",
            DomainEvent::UserLoggedIn { .. } => "UserLoggedIn",
            DomainEvent::PasswordReset { .. } => "PasswordReset",
            DomainEvent::UserRoleUpdated { .. } => "UserRoleUpdated",
            DomainEvent::BookAdded { .. } => "BookAdded",
            DomainEvent::BookDeleted { .. } => "BookDeleted",
            DomainEvent::BookBorrowed { .. } => "BookBorrowed",
            DomainEvent::BookReturned { .. } => "BookReturned",
            DomainEvent::CollectionCreated { .. } => "CollectionCreated",
            DomainEvent::CollectionDeleted { .. } => "CollectionDeleted",
            DomainEvent::ResourceAdded { .. } => "ResourceAdded",
            DomainEvent::ResourceDeleted { .. } => "ResourceDeleted",
        }
    }
}

/// Wire format of a published event
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub source: String,
    pub detail_type: &'static str,
    pub detail: DomainEvent,
    pub time: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn new(source: &str, event: DomainEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.to_string(),
            detail_type: event.name(),
            detail: event,
            time: Utc::now(),
        }
    }
}

/// Sink for domain events. Implementations must not block or fail the caller.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

/// Publishes envelopes on a Redis pub/sub channel
#[derive(Clone)]
pub struct RedisEventPublisher {
    connection: MultiplexedConnection,
    channel: String,
    source: String,
}

impl RedisEventPublisher {
    pub async fn new(config: &EventsConfig) -> AppResult<Self> {
        let client = Client::open(config.redis_url.as_str())
            .map_err(|e| AppError::ServiceUnavailable(format!("Failed to create Redis client: {}", e)))?;

        let mut connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut connection)
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("Redis connection test failed: {}", e)))?;

        Ok(Self {
            connection,
            channel: config.channel.clone(),
            source: config.source.clone(),
        })
    }
}

impl EventPublisher for RedisEventPublisher {
    fn publish(&self, event: DomainEvent) {
        let envelope = EventEnvelope::new(&self.source, event);
        let payload = match serde_json::to_string(&envelope) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Failed to serialize {} event: {}", envelope.detail_type, e);
                return;
            }
        };

        let mut connection = self.connection.clone();
        let channel = self.channel.clone();
        let detail_type = envelope.detail_type;

        tokio::spawn(async move {
            match connection.publish::<_, _, i64>(&channel, payload).await {
                Ok(receivers) => {
                    tracing::debug!(event = detail_type, receivers, "Published event");
                }
                Err(e) => {
                    tracing::warn!(event = detail_type, "Failed to publish event: {}", e);
                }
            }
        });
    }
}

/// Logs events instead of sending them anywhere
#[derive(Debug, Clone)]
pub struct LogEventPublisher {
    source: String,
}

impl LogEventPublisher {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl EventPublisher for LogEventPublisher {
    fn publish(&self, event: DomainEvent) {
        let envelope = EventEnvelope::new(&self.source, event);
        tracing::debug!(
            event = envelope.detail_type,
            detail = ?envelope.detail,
            "Event bus disabled, dropping event"
        );
    }
}

/// Build the publisher described by the configuration.
///
/// An unreachable bus is not fatal: events are then only logged.
pub async fn connect(config: &EventsConfig) -> Arc<dyn EventPublisher> {
    if !config.enabled {
        tracing::info!("Event publishing disabled");
        return Arc::new(LogEventPublisher::new(config.source.clone()));
    }

    match RedisEventPublisher::new(config).await {
        Ok(publisher) => {
            tracing::info!("Publishing events to Redis channel '{}'", config.channel);
            Arc::new(publisher)
        }
        Err(e) => {
            tracing::warn!("Event bus unavailable, events will only be logged: {}", e);
            Arc::new(LogEventPublisher::new(config.source.clone()))
        }
    }
}

/// Keeps published events in memory for assertions
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingPublisher {
    events: std::sync::Mutex<Vec<DomainEvent>>,
}

#[cfg(test)]
impl RecordingPublisher {
    pub(crate) fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}
