//! Session Management
//!
//! Registry of live voice sessions. Each session wraps a
//! [`SessionLifecycle`] that owns the conversation state; the registry
//! tracks activity so abandoned sessions (browser crash, dropped
//! network) are finalized by the cleanup sweep instead of leaking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::{watch, Mutex};

use sauti_agent::SessionLifecycle;

use crate::ServerError;

/// One live voice session
pub struct LiveSession {
    /// Session ID
    pub id: String,
    /// Conversation state, locked across finalization
    pub lifecycle: Mutex<SessionLifecycle>,
    /// Creation time
    pub created_at: Instant,
    /// Last activity
    pub last_activity: RwLock<Instant>,
}

impl fmt::Debug for LiveSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSession")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl LiveSession {
    pub fn new(id: impl Into<String>, lifecycle: SessionLifecycle) -> Self {
        Self {
            id: id.into(),
            lifecycle: Mutex::new(lifecycle),
            created_at: Instant::now(),
            last_activity: RwLock::new(Instant::now()),
        }
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    /// Check if the session has gone idle past the timeout
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }
}

/// Finalize a session that went idle without a disconnect event.
///
/// Sessions that never delivered a `connected` event have nothing to
/// finalize; the lifecycle rejects the transition and we drop them.
pub async fn finalize_abandoned(session: Arc<LiveSession>) {
    let mut lifecycle = session.lifecycle.lock().await;
    match lifecycle.on_disconnected().await {
        Ok(Some(grievance_id)) => {
            tracing::info!(
                session_id = %session.id,
                grievance_id = %grievance_id,
                "Finalized abandoned session"
            );
        },
        Ok(None) => {
            tracing::info!(session_id = %session.id, "Abandoned session closed with no record");
        },
        Err(e) => {
            tracing::debug!(session_id = %session.id, "Session not finalizable: {}", e);
        },
    }
}

/// Session manager
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<LiveSession>>>,
    max_sessions: usize,
    idle_timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(max_sessions: usize, idle_timeout: Duration, cleanup_interval: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            idle_timeout,
            cleanup_interval,
        }
    }

    /// Start a background task that finalizes idle sessions.
    ///
    /// Returns a shutdown sender that can be used to stop the task. The
    /// task runs every `cleanup_interval` and finalizes sessions idle
    /// longer than `idle_timeout`.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let stale = manager.take_expired();
                        if !stale.is_empty() {
                            tracing::info!(
                                "Session cleanup: finalizing {} idle sessions ({} remaining)",
                                stale.len(),
                                manager.count()
                            );
                            for session in stale {
                                finalize_abandoned(session).await;
                            }
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session sweep task stopping");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    /// Register a new session
    pub fn create(&self, lifecycle: SessionLifecycle) -> Result<Arc<LiveSession>, ServerError> {
        let (session, evicted) = {
            let mut sessions = self.sessions.write();

            // At capacity, evict idle sessions before rejecting
            let mut evicted = Vec::new();
            if sessions.len() >= self.max_sessions {
                evicted = self.take_expired_internal(&mut sessions);

                if sessions.len() >= self.max_sessions {
                    return Err(ServerError::Session("Max sessions reached".to_string()));
                }
            }

            let id = uuid::Uuid::new_v4().to_string();
            let session = Arc::new(LiveSession::new(&id, lifecycle));
            sessions.insert(id.clone(), session.clone());

            tracing::info!(session_id = %id, "Created session");
            (session, evicted)
        };

        for stale in evicted {
            tokio::spawn(finalize_abandoned(stale));
        }

        Ok(session)
    }

    /// Get a session by ID
    pub fn get(&self, id: &str) -> Option<Arc<LiveSession>> {
        let sessions = self.sessions.read();
        sessions.get(id).cloned()
    }

    /// Remove a session from the registry
    pub fn remove(&self, id: &str) {
        let mut sessions = self.sessions.write();
        if sessions.remove(id).is_some() {
            tracing::info!("Removed session: {}", id);
        }
    }

    /// Get live session count
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Remove idle sessions from the registry and hand them back for
    /// finalization
    pub fn take_expired(&self) -> Vec<Arc<LiveSession>> {
        let mut sessions = self.sessions.write();
        self.take_expired_internal(&mut sessions)
    }

    fn take_expired_internal(
        &self,
        sessions: &mut HashMap<String, Arc<LiveSession>>,
    ) -> Vec<Arc<LiveSession>> {
        let timeout = self.idle_timeout;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired(timeout))
            .map(|(id, _)| id.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|id| {
                let session = sessions.remove(&id);
                if session.is_some() {
                    tracing::info!("Expired session: {}", id);
                }
                session
            })
            .collect()
    }

    /// Ids of every live session
    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }
}
