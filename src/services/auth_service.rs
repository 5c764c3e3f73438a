use std::collections::VecDeque;
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{ServiceError, ServiceResult};

/// Name of the cookie carrying the admin session token
pub const SESSION_COOKIE: &str = "admin_auth";

/// Open sessions kept at once. Logging in past this closes the oldest.
pub const MAX_SESSIONS: usize = 32;

/// Single shared-password admin login with opaque session tokens.
///
/// Sessions live in memory and do not expire; a restart logs everyone out.
pub struct AuthService {
    admin_password: String,
    /// Oldest first
    sessions: RwLock<VecDeque<String>>,
}

impl AuthService {
    pub fn new(admin_password: String) -> Self {
        Self {
            admin_password,
            sessions: RwLock::new(VecDeque::new()),
        }
    }

    /// Check the password and open a session
    #[instrument(skip_all)]
    pub async fn login(&self, password: &str) -> ServiceResult<String> {
        if self.admin_password.is_empty() || password != self.admin_password {
            crate::warn_with_trace!("Rejected admin login");
            return Err(ServiceError::Unauthorized);
        }

        let token = Uuid::new_v4().simple().to_string();
        let mut sessions = self.sessions.write().await;
        while sessions.len() >= MAX_SESSIONS {
            sessions.pop_front();
            crate::info_with_trace!("Oldest admin session evicted");
        }
        sessions.push_back(token.clone());
        crate::info_with_trace!(active = sessions.len(), "Admin session opened");
        Ok(token)
    }

    #[instrument(skip_all)]
    pub async fn logout(&self, token: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(index) = sessions.iter().position(|open| open == token) {
            sessions.remove(index);
            crate::info_with_trace!("Admin session closed");
        }
    }

    pub async fn is_valid(&self, token: &str) -> bool {
        self.sessions.read().await.iter().any(|open| open == token)
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_login_and_logout() {
        let auth = AuthService::new("pathare@123".to_string());

        let token = auth.login("pathare@123").await.unwrap();
        assert!(auth.is_valid(&token).await);
        assert_eq!(auth.active_sessions().await, 1);

        auth.logout(&token).await;
        assert!(!auth.is_valid(&token).await);
        assert_eq!(auth.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let auth = AuthService::new("secret".to_string());
        assert!(matches!(
            auth.login("Secret").await,
            Err(ServiceError::Unauthorized)
        ));
        assert_eq!(auth.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_empty_password_never_matches() {
        let auth = AuthService::new(String::new());
        assert!(auth.login("").await.is_err());
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let auth = AuthService::new("secret".to_string());
        let first = auth.login("secret").await.unwrap();
        let second = auth.login("secret").await.unwrap();
        assert_ne!(first, second);

        auth.logout(&first).await;
        assert!(auth.is_valid(&second).await);
        assert!(!auth.is_valid("forged").await);
    }

    #[tokio::test]
    async fn test_login_past_limit_evicts_oldest_session() {
        let auth = AuthService::new("secret".to_string());
        let mut tokens = Vec::new();
        for _ in 0..=MAX_SESSIONS {
            tokens.push(auth.login("secret").await.unwrap());
        }

        assert_eq!(auth.active_sessions().await, MAX_SESSIONS);
        assert!(!auth.is_valid(&tokens[0]).await);
        assert!(auth.is_valid(&tokens[1]).await);
        assert!(auth.is_valid(&tokens[MAX_SESSIONS]).await);
    }
}
