/**
 * Session State Machine
 *
 * Owns the client-side identity: resolved once at startup from the server
 * session cookie (consuming an OAuth callback code when one is present),
 * then mutated only through the explicit transitions below. Every other
 * component reads the session through the watch-based subscription surface;
 * nothing else may write it.
 */

use crate::client::ApiClient;
use crate::shared::error::ApiError;
use crate::shared::types::ApiUser;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use url::Url;

/// A resolved account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub email: String,
}

/// Who the server says we are
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// No session
    Anonymous,
    /// Server-created anonymous account, upgradeable to a permanent one
    Guest(Account),
    /// Registered account awaiting email verification
    Unverified(Account),
    /// Fully verified account
    Verified(Account),
}

impl Identity {
    fn from_user(user: ApiUser) -> Self {
        let account = Account {
            id: user.id,
            email: user.email,
        };
        if user.is_guest {
            Identity::Guest(account)
        } else if user.is_verified {
            Identity::Verified(account)
        } else {
            Identity::Unverified(account)
        }
    }

    /// The account behind this identity, if any
    pub fn account(&self) -> Option<&Account> {
        match self {
            Identity::Anonymous => None,
            Identity::Guest(a) | Identity::Unverified(a) | Identity::Verified(a) => Some(a),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Identity::Anonymous)
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest(_))
    }
}

/// Observable session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Identity,
    /// True only while the initial probe is outstanding; implies `Anonymous`
    pub loading: bool,
}

impl SessionState {
    fn resolving() -> Self {
        Self {
            identity: Identity::Anonymous,
            loading: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_authenticated()
    }

    pub fn is_guest(&self) -> bool {
        self.identity.is_guest()
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Single writer of the session state.
///
/// Transitions are methods; rapid double-submits of the same transition are
/// not locked out here and should be prevented by disabling the triggering
/// control while a call is in flight.
pub struct SessionManager {
    client: Arc<ApiClient>,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Create the manager and wire forced logout to the client's 401 hook.
    pub fn new(client: Arc<ApiClient>) -> Arc<Self> {
        let (state, _) = watch::channel(SessionState::resolving());
        let manager = Arc::new(Self { client, state });
        let weak = Arc::downgrade(&manager);
        manager.client.set_on_unauthorized(move || {
            if let Some(manager) = weak.upgrade() {
                manager.forced_logout();
            }
        });
        manager
    }

    /// Read-only subscription to session changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_guest(&self) -> bool {
        self.state.borrow().is_guest()
    }

    /// Resolve the session once at startup.
    ///
    /// If `startup_url` carries an OAuth `code` parameter, the code is
    /// stripped and exchanged with the server before the identity probe, and
    /// the cleaned URL is returned so the shell can rewrite its history
    /// (a refresh must not resubmit the code). Any probe failure resolves to
    /// `Anonymous`; `loading` drops to false exactly once either way.
    pub async fn resolve(&self, startup_url: Option<&str>) -> Option<String> {
        let mut cleaned = None;
        if let Some(raw) = startup_url {
            if let Some((code, stripped)) = extract_oauth_code(raw) {
                cleaned = Some(stripped);
                let encoded: String =
                    url::form_urlencoded::byte_serialize(code.as_bytes()).collect();
                let path = format!("/auth/google/exchange?code={}", encoded);
                if let Err(e) = self.client.post_empty::<Value>(&path).await {
                    // Exchange failure just leaves us unauthenticated.
                    tracing::warn!("OAuth code exchange failed: {}", e);
                }
            }
        }
        match self.client.get::<ApiUser>("/auth/me").await {
            Ok(user) => self.apply_user(Some(user)),
            Err(e) => {
                tracing::debug!("session probe failed: {}", e);
                self.apply_user(None);
            }
        }
        cleaned
    }

    /// Log in with email and password, then re-probe the identity.
    ///
    /// Errors propagate to the caller; the session is unchanged on failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let form = [("username", email), ("password", password)];
        self.client
            .post_form::<Value, _>("/auth/login", &form)
            .await?;
        self.reprobe().await
    }

    /// Re-probe the identity after a transition that the server applied.
    ///
    /// On success the new identity is adopted; any error propagates to the
    /// caller and the session is left unchanged.
    async fn reprobe(&self) -> Result<(), ApiError> {
        let user = self.client.get::<ApiUser>("/auth/me").await?;
        self.apply_user(Some(user));
        Ok(())
    }

    /// Create an unverified account.
    ///
    /// Never changes the session: the new account must verify its email
    /// before it can log in.
    pub async fn register(&self, email: &str, password: &str) -> Result<(), ApiError> {
        self.client
            .post::<Value, _>("/auth/register", &Credentials { email, password })
            .await?;
        Ok(())
    }

    /// Create a guest account server-side and adopt it.
    pub async fn login_as_guest(&self) -> Result<(), ApiError> {
        self.client.post_empty::<Value>("/auth/guest").await?;
        self.reprobe().await
    }

    /// Convert a guest session into a permanent account.
    ///
    /// The server's response body carries the updated account, so no extra
    /// probe round-trip is needed.
    pub async fn upgrade_account(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let user: ApiUser = self
            .client
            .post("/auth/upgrade", &Credentials { email, password })
            .await?;
        self.apply_user(Some(user));
        Ok(())
    }

    /// Change the email/password pair of an unverified account.
    pub async fn change_email(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let user: ApiUser = self
            .client
            .post("/auth/change-email", &Credentials { email, password })
            .await?;
        self.apply_user(Some(user));
        Ok(())
    }

    /// Request a password-reset email. Stateless: the session is untouched.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        #[derive(Serialize)]
        struct Body<'a> {
            email: &'a str,
        }
        self.client
            .post::<Value, _>("/auth/forgot-password", &Body { email })
            .await?;
        Ok(())
    }

    /// Set a new password from a reset token.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ApiError> {
        #[derive(Serialize)]
        struct Body<'a> {
            token: &'a str,
            password: &'a str,
        }
        self.client
            .post::<Value, _>(
                "/auth/reset-password",
                &Body {
                    token,
                    password: new_password,
                },
            )
            .await?;
        Ok(())
    }

    /// Confirm an email address from a verification token.
    ///
    /// The token travels in the request body, never in a URL.
    pub async fn verify_email(&self, token: &str) -> Result<(), ApiError> {
        #[derive(Serialize)]
        struct Body<'a> {
            token: &'a str,
        }
        self.client
            .post::<Value, _>("/auth/verify-email", &Body { token })
            .await?;
        Ok(())
    }

    /// Drop the session: local state resets immediately, the server-side
    /// invalidation is fire-and-forget and its failure is swallowed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn logout(&self) {
        self.reset_local();
        self.invalidate_server_session();
    }

    /// Forced logout, wired to the transport layer's 401 hook.
    ///
    /// Idempotent: any number of concurrent 401s collapse to a single state
    /// transition and a single server call.
    fn forced_logout(&self) {
        if self.reset_local() {
            tracing::warn!("session invalidated by server, dropping local identity");
            self.invalidate_server_session();
        }
    }

    fn invalidate_server_session(&self) {
        let client = Arc::clone(&self.client);
        tokio::spawn(async move {
            if let Err(e) = client.post_empty::<Value>("/auth/logout").await {
                // Local state is already reset; nothing to recover.
                tracing::debug!("server logout failed: {}", e);
            }
        });
    }

    /// Returns true when the state actually changed.
    fn reset_local(&self) -> bool {
        self.state.send_if_modified(|state| {
            let changed = state.loading || state.identity.is_authenticated();
            state.identity = Identity::Anonymous;
            state.loading = false;
            changed
        })
    }

    fn apply_user(&self, user: Option<ApiUser>) {
        self.state.send_modify(|state| {
            state.identity = match user {
                Some(user) => Identity::from_user(user),
                None => Identity::Anonymous,
            };
            state.loading = false;
        });
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

/// Extract an OAuth `code` query parameter, returning the code and the URL
/// with the parameter removed.
fn extract_oauth_code(raw: &str) -> Option<(String, String)> {
    let mut url = Url::parse(raw).ok()?;
    let code = url
        .query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())?;
    let remaining: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "code")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if remaining.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(remaining);
    }
    Some((code, url.to_string()))
}
