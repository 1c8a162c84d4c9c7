//! Identity session adapter
//!
//! Wraps an external identity provider behind the [`IdentityProvider`]
//! trait: email/password sign-in and sign-up, anonymous sign-in, sign-out,
//! and an auth-state change notification stream.
//!
//! The display name is deterministically turned into a synthetic account
//! identifier by appending a fixed domain suffix. This is an implementation
//! convenience carried over for provider compatibility, not a security
//! boundary. Credential validation happens locally before any remote call.

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::constants;

/// The authentication state visible to the rest of the client
///
/// Owned exclusively by the identity adapter; read-only everywhere else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque identifier from the provider, absent when signed out
    pub user_id: Option<String>,
    /// Chosen display name; absent for anonymous sessions
    pub display_name: Option<String>,
    /// Whether a user is currently signed in
    pub authenticated: bool,
}

impl Session {
    /// Creates a signed-in session; `display_name` is `None` for
    /// anonymous users
    pub fn signed_in(user_id: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            display_name,
            authenticated: true,
        }
    }

    /// Creates the signed-out session
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Whether this session may post scores to the leaderboard
    ///
    /// Anonymous sessions never post: there is no stable name to rank.
    pub fn can_post_scores(&self) -> bool {
        self.authenticated && self.display_name.is_some()
    }

    /// Label to show for the current user
    pub fn display_label(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or(constants::auth::ANONYMOUS_DISPLAY_NAME)
    }
}

fn validate_username(value: &str) -> garde::Result {
    if value.trim().is_empty() {
        Err(garde::Error::new("Please enter a username."))
    } else {
        Ok(())
    }
}

fn validate_password(value: &str) -> garde::Result {
    if value.trim().len() < constants::auth::MIN_PASSWORD_LENGTH {
        Err(garde::Error::new(format!(
            "Password must be at least {} characters.",
            constants::auth::MIN_PASSWORD_LENGTH
        )))
    } else {
        Ok(())
    }
}

/// Credentials entered in the auth form, validated before any remote call
#[derive(Debug, Clone, Validate)]
pub struct Credentials {
    /// Display name, doubling as the account name
    #[garde(custom(|v, _| validate_username(v)))]
    pub username: String,
    /// Plain password, handed to the provider only after validation
    #[garde(custom(|v, _| validate_password(v)))]
    pub password: String,
}

impl Credentials {
    /// The synthetic account identifier handed to the provider
    pub fn synthetic_email(&self) -> String {
        format!(
            "{}{}",
            self.username.trim(),
            constants::auth::EMAIL_SUFFIX
        )
    }
}

/// Error reported by the underlying identity provider, surfaced verbatim
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ProviderError(pub String);

/// Errors surfaced by the identity adapter
#[derive(Debug, Error)]
pub enum AuthError {
    /// Local validation rejected the credentials before any remote call
    #[error("{0}")]
    Validation(String),
    /// The provider rejected the operation
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

fn first_error(report: &garde::Report) -> String {
    report
        .iter()
        .next()
        .map_or_else(|| "Invalid credentials.".to_string(), |(_, error)| error.to_string())
}

/// The external identity provider surface
///
/// Implementations bind to a real provider (or a test double). The adapter
/// only relies on these four operations plus the session values they return.
pub trait IdentityProvider {
    /// Creates an account and sets the profile display name
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, ProviderError>;

    /// Signs into an existing account
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ProviderError>;

    /// Signs in without an account
    async fn sign_in_anonymously(&self) -> Result<Session, ProviderError>;

    /// Ends the current session
    async fn sign_out(&self) -> Result<(), ProviderError>;
}

/// Adapter owning the current [`Session`] and notifying observers of
/// auth-state transitions
pub struct IdentitySession<P> {
    provider: P,
    state: watch::Sender<Session>,
}

impl<P: IdentityProvider> IdentitySession<P> {
    /// Creates an adapter in the signed-out state
    pub fn new(provider: P) -> Self {
        let (state, _) = watch::channel(Session::signed_out());
        Self { provider, state }
    }

    /// Subscribes to auth-state transitions
    ///
    /// The receiver observes every [`Session`] change, starting from the
    /// current value.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Returns a snapshot of the current session
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Validates credentials, creates the account, and signs in
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<(), AuthError> {
        credentials
            .validate()
            .map_err(|report| AuthError::Validation(first_error(&report)))?;

        let session = self
            .provider
            .sign_up(
                &credentials.synthetic_email(),
                credentials.password.trim(),
                credentials.username.trim(),
            )
            .await?;
        self.state.send_replace(session);
        Ok(())
    }

    /// Validates credentials and signs into an existing account
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<(), AuthError> {
        credentials
            .validate()
            .map_err(|report| AuthError::Validation(first_error(&report)))?;

        let session = self
            .provider
            .sign_in(&credentials.synthetic_email(), credentials.password.trim())
            .await?;
        self.state.send_replace(session);
        Ok(())
    }

    /// Signs in anonymously; the resulting session cannot post scores
    pub async fn sign_in_anonymously(&self) -> Result<(), AuthError> {
        let session = self.provider.sign_in_anonymously().await?;
        self.state.send_replace(session);
        Ok(())
    }

    /// Signs out and notifies observers
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.provider.sign_out().await?;
        self.state.send_replace(Session::signed_out());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockProvider {
        calls: Mutex<Vec<String>>,
        fail_with: Option<String>,
    }

    impl MockProvider {
        fn failing(message: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_with: Some(message.to_string()),
            }
        }

        fn record(&self, call: String) -> Result<(), ProviderError> {
            self.calls.lock().unwrap().push(call);
            match &self.fail_with {
                Some(message) => Err(ProviderError(message.clone())),
                None => Ok(()),
            }
        }
    }

    impl IdentityProvider for MockProvider {
        async fn sign_up(
            &self,
            email: &str,
            _password: &str,
            display_name: &str,
        ) -> Result<Session, ProviderError> {
            self.record(format!("sign_up {email}"))?;
            Ok(Session::signed_in("uid-new", Some(display_name.to_string())))
        }

        async fn sign_in(&self, email: &str, _password: &str) -> Result<Session, ProviderError> {
            self.record(format!("sign_in {email}"))?;
            Ok(Session::signed_in("uid-1", Some("alice".to_string())))
        }

        async fn sign_in_anonymously(&self) -> Result<Session, ProviderError> {
            self.record("anonymous".to_string())?;
            Ok(Session::signed_in("uid-anon", None))
        }

        async fn sign_out(&self) -> Result<(), ProviderError> {
            self.record("sign_out".to_string())
        }
    }

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_username_rejected_locally() {
        let identity = IdentitySession::new(MockProvider::default());
        let error = identity
            .sign_in(&credentials("  ", "longenough"))
            .await
            .unwrap_err();

        assert!(matches!(error, AuthError::Validation(ref m) if m == "Please enter a username."));
        // No remote call was made
        assert!(identity.provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_short_password_rejected_locally() {
        let identity = IdentitySession::new(MockProvider::default());
        let error = identity
            .sign_up(&credentials("alice", "short"))
            .await
            .unwrap_err();

        assert!(
            matches!(error, AuthError::Validation(ref m) if m == "Password must be at least 6 characters.")
        );
        assert!(identity.provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_synthetic_email_uses_fixed_suffix() {
        let identity = IdentitySession::new(MockProvider::default());
        identity
            .sign_in(&credentials(" alice ", "longenough"))
            .await
            .unwrap();

        let calls = identity.provider.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), ["sign_in alice@edubox.com"]);
    }

    #[tokio::test]
    async fn test_sign_in_notifies_subscribers() {
        let identity = IdentitySession::new(MockProvider::default());
        let receiver = identity.subscribe();
        assert!(!receiver.borrow().authenticated);

        identity
            .sign_in(&credentials("alice", "longenough"))
            .await
            .unwrap();

        let session = receiver.borrow().clone();
        assert!(session.authenticated);
        assert_eq!(session.display_name.as_deref(), Some("alice"));
        assert!(session.can_post_scores());
    }

    #[tokio::test]
    async fn test_anonymous_session_cannot_post_scores() {
        let identity = IdentitySession::new(MockProvider::default());
        identity.sign_in_anonymously().await.unwrap();

        let session = identity.session();
        assert!(session.authenticated);
        assert!(!session.can_post_scores());
        assert_eq!(session.display_label(), "Anonymous User");
    }

    #[tokio::test]
    async fn test_sign_out_resets_session() {
        let identity = IdentitySession::new(MockProvider::default());
        identity
            .sign_in(&credentials("alice", "longenough"))
            .await
            .unwrap();
        identity.sign_out().await.unwrap();

        assert_eq!(identity.session(), Session::signed_out());
    }

    #[tokio::test]
    async fn test_provider_error_surfaced_verbatim() {
        let identity = IdentitySession::new(MockProvider::failing("user not found"));
        let error = identity
            .sign_in(&credentials("alice", "longenough"))
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "user not found");
        // A failed sign-in leaves the session signed out
        assert!(!identity.session().authenticated);
    }
}
