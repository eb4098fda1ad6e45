use std::sync::RwLock;

/// Application context lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Refreshing,
    Ready,
    Failed,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Created => "created",
            LifecycleState::Refreshing => "refreshing",
            LifecycleState::Ready => "ready",
            LifecycleState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks the lifecycle state of a context
#[derive(Debug)]
pub struct LifecycleManager {
    state: RwLock<LifecycleState>,
}

impl LifecycleManager {
    /// Create a new lifecycle manager in the `Created` state
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LifecycleState::Created),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
            .read()
            .map(|state| *state)
            .unwrap_or(LifecycleState::Failed)
    }

    pub fn transition(&self, next: LifecycleState) {
        if let Ok(mut state) = self.state.write() {
            tracing::debug!("Context lifecycle {} -> {}", *state, next);
            *state = next;
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == LifecycleState::Ready
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}
