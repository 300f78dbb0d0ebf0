use std::sync::RwLock;

use super::ActorId;

/// Source of the currently signed-in actor.
///
/// Every remote operation is scoped to this actor; `None` short-circuits
/// with a "not signed in" outcome.
pub trait AuthProvider: Send + Sync {
    fn current_actor(&self) -> Option<ActorId>;
}

/// Auth provider holding a fixed, swappable actor.
#[derive(Debug, Default)]
pub struct StaticAuth {
    actor: RwLock<Option<ActorId>>,
}

impl StaticAuth {
    pub fn signed_in(actor: ActorId) -> Self {
        Self {
            actor: RwLock::new(Some(actor)),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, actor: ActorId) {
        if let Ok(mut guard) = self.actor.write() {
            *guard = Some(actor);
        }
    }

    pub fn sign_out(&self) {
        if let Ok(mut guard) = self.actor.write() {
            *guard = None;
        }
    }
}

impl AuthProvider for StaticAuth {
    fn current_actor(&self) -> Option<ActorId> {
        self.actor.read().ok().and_then(|guard| guard.clone())
    }
}
