use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Client as RedisClient};
use tokio::sync::RwLock;

use crate::cache::keys::{revoked_ticket_key, session_key};
use crate::cache::models::session::SessionRecord;
use crate::clock::SharedClock;
use crate::error::StoreError;

/// Session record store.
///
/// Redis in deployment; the in-memory backend mirrors the same TTL semantics
/// for local runs and tests. Every successful `load` pushes the store-level
/// expiry forward, so an untouched record disappears after `ttl` on its own.
#[derive(Clone)]
pub enum SessionStore {
    Redis {
        client: Arc<RedisClient>,
        clock: SharedClock,
        ttl: Duration,
    },
    Memory(MemorySessionStore),
}

#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, (SessionRecord, DateTime<Utc>)>>>,
    revoked: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
    clock: SharedClock,
    ttl: Duration,
}

impl SessionStore {
    pub fn redis(client: Arc<RedisClient>, clock: SharedClock, ttl: Duration) -> Self {
        SessionStore::Redis { client, clock, ttl }
    }

    pub fn memory(clock: SharedClock, ttl: Duration) -> Self {
        SessionStore::Memory(MemorySessionStore {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            revoked: Arc::new(RwLock::new(HashMap::new())),
            clock,
            ttl,
        })
    }

    /// Loads the record for a session id and refreshes its store TTL.
    pub async fn load(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        match self {
            SessionStore::Redis { client, ttl, .. } => {
                let mut conn = client.get_multiplexed_async_connection().await?;
                let key = session_key(session_id);
                let fields: HashMap<String, String> = conn.hgetall(&key).await?;
                if fields.is_empty() {
                    return Ok(None);
                }
                let _: () = conn.expire(&key, ttl.as_secs() as i64).await?;
                Ok(Some(SessionRecord::from_fields(fields)))
            }
            SessionStore::Memory(store) => {
                let now = store.clock.now();
                let mut sessions = store.sessions.write().await;
                let expired = match sessions.get(session_id) {
                    Some((_, expires_at)) => *expires_at <= now,
                    None => return Ok(None),
                };
                if expired {
                    sessions.remove(session_id);
                    return Ok(None);
                }
                Ok(sessions.get_mut(session_id).map(|(record, expires_at)| {
                    *expires_at = now + chrono_ttl(store.ttl);
                    record.clone()
                }))
            }
        }
    }

    /// Replaces whatever the session held with `record`.
    pub async fn save(&self, session_id: &str, record: &SessionRecord) -> Result<(), StoreError> {
        match self {
            SessionStore::Redis { client, ttl, .. } => {
                let mut conn = client.get_multiplexed_async_connection().await?;
                let key = session_key(session_id);
                let fields = record.to_fields();
                let mut pipe = redis::pipe();
                pipe.atomic().del(&key).ignore();
                if !fields.is_empty() {
                    pipe.hset_multiple(&key, &fields).ignore();
                    pipe.expire(&key, ttl.as_secs() as i64).ignore();
                }
                let _: () = pipe.query_async(&mut conn).await?;
                Ok(())
            }
            SessionStore::Memory(store) => {
                let now = store.clock.now();
                let expires_at = now + chrono_ttl(store.ttl);
                let mut sessions = store.sessions.write().await;
                sessions.retain(|_, (_, until)| *until > now);
                if record.is_empty() {
                    sessions.remove(session_id);
                } else {
                    sessions.insert(session_id.to_string(), (record.clone(), expires_at));
                }
                Ok(())
            }
        }
    }

    /// Removes the session record. Clearing a missing session is a no-op.
    pub async fn clear(&self, session_id: &str) -> Result<(), StoreError> {
        match self {
            SessionStore::Redis { client, .. } => {
                let mut conn = client.get_multiplexed_async_connection().await?;
                let _: () = conn.del(session_key(session_id)).await?;
                Ok(())
            }
            SessionStore::Memory(store) => {
                store.sessions.write().await.remove(session_id);
                Ok(())
            }
        }
    }

    /// Marks a ticket id revoked until the ticket would have expired anyway.
    pub async fn revoke_ticket(
        &self,
        ticket_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        match self {
            SessionStore::Redis { client, clock, .. } => {
                let Some(ttl) = revocation_ttl(expires_at, clock.now()) else {
                    return Ok(());
                };
                let mut conn = client.get_multiplexed_async_connection().await?;
                let _: () = conn.set_ex(revoked_ticket_key(ticket_id), 1, ttl).await?;
                Ok(())
            }
            SessionStore::Memory(store) => {
                let now = store.clock.now();
                let mut revoked = store.revoked.write().await;
                revoked.retain(|_, until| *until > now);
                if revocation_ttl(expires_at, now).is_some() {
                    revoked.insert(ticket_id.to_string(), expires_at);
                }
                Ok(())
            }
        }
    }

    pub async fn is_ticket_revoked(&self, ticket_id: &str) -> Result<bool, StoreError> {
        match self {
            SessionStore::Redis { client, .. } => {
                let mut conn = client.get_multiplexed_async_connection().await?;
                let revoked: bool = conn.exists(revoked_ticket_key(ticket_id)).await?;
                Ok(revoked)
            }
            SessionStore::Memory(store) => {
                let now = store.clock.now();
                let revoked = store.revoked.read().await;
                Ok(revoked.get(ticket_id).is_some_and(|until| *until > now))
            }
        }
    }
}

/// Whole seconds a revocation must outlive, or `None` once the ticket has
/// lapsed on its own.
fn revocation_ttl(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<u64> {
    let secs = expires_at.timestamp() - now.timestamp();
    u64::try_from(secs).ok().filter(|s| *s > 0)
}

fn chrono_ttl(ttl: Duration) -> chrono::Duration {
    chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX)
}
