// ── Console authentication ──
//
// Users are provisioned from configuration (and, when enabled, by self
// registration). A successful login issues an opaque bearer token that
// stays valid for the configured session TTL. Expired sessions are
// rejected and evicted on first use.

use chrono::{TimeDelta, Utc};
use dashmap::DashMap;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::UserSeed;
use crate::error::CoreError;
use crate::model::{AccessToken, Role, Session, User, UserInfo};

pub struct AuthService {
    users: DashMap<String, User>,
    sessions: DashMap<String, Session>,
    ttl: TimeDelta,
    allow_registration: bool,
}

impl AuthService {
    pub fn new(seeds: Vec<UserSeed>, ttl: TimeDelta, allow_registration: bool) -> Self {
        let users = DashMap::new();
        let now = Utc::now();
        for seed in seeds {
            users.insert(
                seed.username.clone(),
                User {
                    username: seed.username,
                    password: seed.password,
                    role: seed.role,
                    created_at: now,
                },
            );
        }
        Self {
            users,
            sessions: DashMap::new(),
            ttl,
            allow_registration,
        }
    }

    pub fn registration_enabled(&self) -> bool {
        self.allow_registration
    }

    pub fn login(&self, username: &str, password: &SecretString) -> Result<AccessToken, CoreError> {
        let role = self
            .users
            .get(username)
            .filter(|u| u.password.expose_secret() == password.expose_secret())
            .map(|u| u.role)
            .ok_or_else(|| CoreError::Authentication {
                message: "invalid credentials".into(),
            })?;

        let token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + self.ttl;
        self.sessions.insert(
            token.clone(),
            Session {
                username: username.to_owned(),
                role,
                expires_at,
            },
        );
        info!(username, "session opened");

        Ok(AccessToken {
            access_token: token,
            token_type: "bearer".into(),
            expires_at: Some(expires_at),
        })
    }

    /// Resolve a bearer token to its session.
    pub fn authenticate(&self, token: &str) -> Result<Session, CoreError> {
        let session = self
            .sessions
            .get(token)
            .map(|s| s.clone())
            .ok_or_else(|| CoreError::Authentication {
                message: "could not validate credentials".into(),
            })?;

        if session.expires_at <= Utc::now() {
            self.sessions.remove(token);
            debug!(username = %session.username, "expired session evicted");
            return Err(CoreError::Authentication {
                message: "session expired".into(),
            });
        }
        Ok(session)
    }

    pub fn logout(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at > now);
        before - self.sessions.len()
    }

    pub fn register(&self, username: &str, password: SecretString) -> Result<UserInfo, CoreError> {
        if !self.allow_registration {
            return Err(CoreError::PermissionDenied {
                message: "registration is disabled".into(),
            });
        }
        let username = username.trim();
        if username.is_empty() {
            return Err(CoreError::validation("username must not be empty"));
        }
        if password.expose_secret().is_empty() {
            return Err(CoreError::validation("password must not be empty"));
        }

        let entry = self.users.entry(username.to_owned());
        if matches!(entry, dashmap::mapref::entry::Entry::Occupied(_)) {
            return Err(CoreError::conflict("Username already taken"));
        }
        let user = User {
            username: username.to_owned(),
            password,
            role: Role::Admin,
            created_at: Utc::now(),
        };
        let info = UserInfo::from(&user);
        entry.or_insert(user);
        info!(username, "user registered");
        Ok(info)
    }

    pub fn user_info(&self, username: &str) -> Result<UserInfo, CoreError> {
        self.users
            .get(username)
            .map(|u| UserInfo::from(u.value()))
            .ok_or_else(|| CoreError::not_found("User", username))
    }
}
