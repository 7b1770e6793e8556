use reqwest::{header, Client};
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError, Weak,
    },
    time::Duration,
};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectivityState {
    Online,
    Offline,
}

impl ConnectivityState {
    #[must_use]
    pub fn from_online(online: bool) -> Self {
        if online {
            Self::Online
        } else {
            Self::Offline
        }
    }

    #[must_use]
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => f.write_str("online"),
            Self::Offline => f.write_str("offline"),
        }
    }
}

/// Decides whether the remote backend is reachable.
#[async_trait::async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// The host's own view of the network link. The periodic check is
    /// skipped while this reports `false`.
    fn host_online(&self) -> bool {
        true
    }

    async fn is_reachable(&self) -> bool;
}

/// Sends a `HEAD` request to a well-known URL. Any completed response counts
/// as reachable regardless of its status.
#[derive(Clone)]
pub struct HttpReachabilityProbe {
    url: String,
    timeout: Duration,
    client: Client,
}

impl HttpReachabilityProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl ReachabilityProbe for HttpReachabilityProbe {
    async fn is_reachable(&self) -> bool {
        let result = self
            .client
            .head(&self.url)
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::PRAGMA, "no-cache")
            .timeout(self.timeout)
            .send()
            .await;

        match result {
            Ok(_) => true,
            Err(error) => {
                tracing::debug!(url = %self.url, %error, "reachability probe failed");
                false
            }
        }
    }
}

type Listener = Arc<dyn Fn(ConnectivityState) + Send + Sync>;
type Listeners = Mutex<Vec<(u64, Listener)>>;

/// Two-state connectivity machine driven by network signals and probing.
pub struct ConnectivityMonitor {
    state: Mutex<ConnectivityState>,
    listeners: Arc<Listeners>,
    next_listener_id: AtomicU64,
    probe: Arc<dyn ReachabilityProbe>,
}

impl ConnectivityMonitor {
    pub fn new(initial: ConnectivityState, probe: Arc<dyn ReachabilityProbe>) -> Self {
        Self {
            state: Mutex::new(initial),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener_id: AtomicU64::new(0),
            probe,
        }
    }

    pub fn current_state(&self) -> ConnectivityState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_online(&self) -> bool {
        self.current_state().is_online()
    }

    /// Register a listener invoked on every transition, in registration order.
    /// The listener stays registered until the returned subscription is dropped.
    pub fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(ConnectivityState) + Send + Sync + 'static,
    {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Apply a new state. Returns whether it was a transition.
    pub fn set_state(&self, next: ConnectivityState) -> bool {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state == next {
                return false;
            }
            *state = next;
        }

        tracing::info!(state = %next, "connectivity changed");

        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(next);
        }
        true
    }

    /// The host reported that the network link went down.
    pub fn network_offline(&self) {
        self.set_state(ConnectivityState::Offline);
    }

    /// The host reported that the network link came back. Reachability is
    /// confirmed with the probe before going online.
    pub async fn network_online(&self) -> ConnectivityState {
        self.refresh().await
    }

    /// Run the probe and apply its verdict.
    pub async fn refresh(&self) -> ConnectivityState {
        let reachable = self.probe.is_reachable().await;
        let state = ConnectivityState::from_online(reachable);
        self.set_state(state);
        state
    }

    /// One periodic check. Returns `None` when skipped because the host
    /// reports itself offline.
    pub async fn tick(&self) -> Option<ConnectivityState> {
        if !self.probe.host_online() {
            return None;
        }
        Some(self.refresh().await)
    }

    /// Re-check connectivity every `interval` until the handle is dropped.
    /// The first check happens one interval from now.
    pub fn spawn_periodic_probe(self: &Arc<Self>, interval: Duration) -> ProbeHandle {
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(monitor) = weak.upgrade() else {
                    break;
                };
                monitor.tick().await;
            }
        });
        ProbeHandle { handle }
    }
}

/// Aborts the periodic probe task when dropped.
pub struct ProbeHandle {
    handle: JoinHandle<()>,
}

impl Drop for ProbeHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Keeps a connectivity listener registered. Dropping it unregisters the
/// listener and releases everything the listener captured.
#[must_use = "the listener is removed as soon as the subscription is dropped"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}
