use std::sync::RwLock;
use tracing::debug;

use crate::models::UserId;

/// Source of truth for who is watching and whether remote calls may be attempted.
///
/// Injected into the synchronizer at construction; the synchronizer never reads
/// credentials from anywhere else.
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    /// The signed-in user, or `None` for a guest
    fn current_subject_key(&self) -> Option<UserId>;

    /// Bearer token for the remote progress API. A signed-in user without a
    /// token is served from local storage only.
    fn bearer_token(&self) -> Option<String>;
}

#[derive(Debug, Clone)]
struct Session {
    user_id: UserId,
    token: String,
}

/// In-process identity holder updated by the host's login flow
#[derive(Debug, Default)]
pub struct SessionIdentity {
    session: RwLock<Option<Session>>,
}

impl SessionIdentity {
    pub fn guest() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: impl Into<UserId>, token: impl Into<String>) -> Self {
        let identity = Self::default();
        identity.sign_in(user_id, token);
        identity
    }

    pub fn sign_in(&self, user_id: impl Into<UserId>, token: impl Into<String>) {
        let session = Session {
            user_id: user_id.into(),
            token: token.into(),
        };
        debug!("Session established for user {}", session.user_id);
        if let Ok(mut guard) = self.session.write() {
            *guard = Some(session);
        }
    }

    /// Swap the bearer token after a refresh, keeping the same user
    pub fn refresh_token(&self, token: impl Into<String>) {
        if let Ok(mut guard) = self.session.write()
            && let Some(session) = guard.as_mut()
        {
            session.token = token.into();
        }
    }

    pub fn sign_out(&self) {
        if let Ok(mut guard) = self.session.write() {
            *guard = None;
        }
    }

    fn snapshot(&self) -> Option<Session> {
        self.session.read().ok().and_then(|guard| guard.clone())
    }
}

impl IdentityProvider for SessionIdentity {
    fn current_subject_key(&self) -> Option<UserId> {
        self.snapshot().map(|s| s.user_id)
    }

    fn bearer_token(&self) -> Option<String> {
        self.snapshot()
            .map(|s| s.token)
            .filter(|token| !token.trim().is_empty())
    }
}
