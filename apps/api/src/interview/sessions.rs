use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::InterviewSettings;
use crate::interview::backend::InterviewBackend;
use crate::interview::controller::InterviewController;
use crate::interview::models::Phase;

/// In-memory registry of live interviews, one controller per session.
/// Nothing survives a restart. Sessions idle for longer than `ttl` are
/// evicted by `prune_idle`.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn InterviewBackend>,
    settings: InterviewSettings,
    ttl: Duration,
    sessions: Arc<RwLock<HashMap<Uuid, Arc<InterviewController>>>>,
}

impl SessionStore {
    pub fn new(
        backend: Arc<dyn InterviewBackend>,
        settings: InterviewSettings,
        ttl: Duration,
    ) -> Self {
        Self {
            backend,
            settings,
            ttl,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers a fresh, idle controller.
    pub async fn create(&self) -> Arc<InterviewController> {
        let controller = Arc::new(InterviewController::new(
            self.backend.clone(),
            self.settings.clone(),
        ));
        let mut sessions = self.sessions.write().await;
        sessions.insert(controller.id(), controller.clone());
        info!(
            "Interview session {} created ({} live)",
            controller.id(),
            sessions.len()
        );
        controller
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<InterviewController>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Drops the session. A request still in flight finishes against the
    /// detached controller and is never observed.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!("Interview session {} removed", id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Evicts every session that has not changed for at least `ttl`.
    /// Sessions with a request in flight are kept regardless.
    pub async fn prune_idle(&self) -> usize {
        let controllers: Vec<Arc<InterviewController>> =
            self.sessions.read().await.values().cloned().collect();

        let mut expired = Vec::new();
        for controller in controllers {
            if controller.phase().await != Phase::AwaitingResponse
                && controller.idle_for().await >= self.ttl
            {
                expired.push(controller.id());
            }
        }
        if expired.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        let evicted = expired
            .iter()
            .filter(|id| sessions.remove(*id).is_some())
            .count();
        info!(
            "Evicted {} idle interview session(s) ({} live)",
            evicted,
            sessions.len()
        );
        evicted
    }

    /// Runs `prune_idle` every `every` until the returned handle is aborted.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = store.prune_idle().await;
                debug!("Session sweep done, {} evicted", evicted);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::interview::models::{InterviewStep, StepRequest};
    use crate::llm_client::LlmError;

    struct NeverCalled;

    #[async_trait]
    impl InterviewBackend for NeverCalled {
        async fn next_step(&self, _request: &StepRequest) -> Result<InterviewStep, LlmError> {
            Err(LlmError::EmptyContent)
        }
    }

    const TTL: Duration = Duration::from_secs(600);

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(NeverCalled), InterviewSettings::default(), TTL)
    }

    #[tokio::test]
    async fn test_create_get_remove() {
        let store = store();
        let controller = store.create().await;
        let id = controller.id();

        let found = store.get(id).await.expect("session registered");
        assert_eq!(found.id(), id);
        assert_eq!(found.phase().await, Phase::Idle);
        assert_eq!(store.len().await, 1);

        assert!(store.remove(id).await);
        assert!(!store.remove(id).await);
        assert!(store.get(id).await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = store();
        let a = store.create().await;
        let b = store.create().await;
        assert_ne!(a.id(), b.id());

        a.start().await.unwrap();
        assert_eq!(a.phase().await, Phase::Error);
        assert_eq!(b.phase().await, Phase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prune_evicts_sessions_idle_past_ttl() {
        let store = store();
        let stale = store.create().await;
        tokio::time::advance(TTL - Duration::from_secs(60)).await;
        let fresh = store.create().await;

        assert_eq!(store.prune_idle().await, 0);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(store.prune_idle().await, 1);
        assert!(store.get(stale.id()).await.is_none());
        assert!(store.get(fresh.id()).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_keeps_session_alive() {
        let store = store();
        let controller = store.create().await;

        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        controller.reset().await;
        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(store.prune_idle().await, 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_abandoned_sessions() {
        let store = store();
        let abandoned = store.create().await;
        let sweeper = store.spawn_sweeper(Duration::from_secs(60));

        tokio::time::sleep(TTL + Duration::from_secs(61)).await;

        assert!(store.get(abandoned.id()).await.is_none());
        assert_eq!(store.len().await, 0);
        sweeper.abort();
    }
}
