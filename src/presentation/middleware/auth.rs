use axum::{
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::{fmt, future::Future, marker::PhantomData, pin::Pin, sync::Arc};
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use super::{error::GuardError, GuardFuture};

/// Answers whether the caller behind a request is authenticated.
///
/// This is the only question the auth guard asks. Closures of the shape
/// `Fn(&Request) -> bool` are providers too.
pub trait AuthProvider: Send + Sync + 'static {
    fn is_authenticated(&self, request: &Request) -> bool;
}

impl<F> AuthProvider for F
where
    F: Fn(&Request) -> bool + Send + Sync + 'static,
{
    fn is_authenticated(&self, request: &Request) -> bool {
        self(request)
    }
}

/// A caller identity placed in request extensions by an upstream layer
pub trait Caller: Clone + Send + Sync + 'static {
    fn is_authenticated(&self) -> bool;
}

/// Identity exposed as a plain flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthFlag(pub bool);

impl Caller for AuthFlag {
    fn is_authenticated(&self) -> bool {
        self.0
    }
}

/// Identity exposed as a zero-argument query
#[derive(Clone)]
pub struct AuthQuery(Arc<dyn Fn() -> bool + Send + Sync>);

impl AuthQuery {
    pub fn new(query: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(query))
    }
}

impl Caller for AuthQuery {
    fn is_authenticated(&self) -> bool {
        (self.0)()
    }
}

impl fmt::Debug for AuthQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthQuery(..)")
    }
}

/// Provider that reads a [`Caller`] of type `U` from request extensions
pub struct ExtensionAuth<U> {
    _caller: PhantomData<fn() -> U>,
}

impl<U> ExtensionAuth<U> {
    pub fn new() -> Self {
        Self { _caller: PhantomData }
    }
}

impl<U> Default for ExtensionAuth<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: Caller> AuthProvider for ExtensionAuth<U> {
    fn is_authenticated(&self, request: &Request) -> bool {
        request.extensions().get::<U>().is_some_and(Caller::is_authenticated)
    }
}

/// JWT claims carried by bearer tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user or client ID)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aud: Vec<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued at
    pub nbf: usize, // Not before
    pub jti: String, // JWT ID
}

impl Claims {
    pub fn new(subject: String, audience: Vec<String>, scopes: Vec<String>, ttl_seconds: u64) -> Self {
        let now = chrono::Utc::now().timestamp().max(0) as usize;

        Self {
            sub: subject,
            aud: audience,
            scopes,
            exp: now + ttl_seconds as usize,
            iat: now,
            nbf: now,
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// Authenticated caller, inserted into request extensions by [`authenticate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub subject: String,
    pub scopes: Vec<String>,
    pub token_id: String,
}

impl UserContext {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

impl Caller for UserContext {
    fn is_authenticated(&self) -> bool {
        true
    }
}

impl From<Claims> for UserContext {
    fn from(claims: Claims) -> Self {
        Self { subject: claims.sub, scopes: claims.scopes, token_id: claims.jti }
    }
}

impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = GuardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<UserContext>().cloned().ok_or(GuardError::Unauthenticated)
    }
}

/// JWT service for token operations
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    /// Create new JWT service with secret
    pub fn new(secret: &str) -> Self {
        Self::new_with_validation(secret, None)
    }

    /// Create new JWT service with secret and optional audience validation
    pub fn new_with_validation(secret: &str, required_audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        if let Some(aud) = required_audience {
            validation.validate_aud = true;
            validation.set_audience(&[aud]);
        } else {
            validation.validate_aud = false;
        }

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }

    pub fn encode_claims(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::default(), claims, &self.encoding_key).map_err(|e| {
            error!("Failed to encode JWT: {}", e);
            JwtError::EncodingError(e.to_string())
        })
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| {
                debug!("Failed to decode JWT: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                    jsonwebtoken::errors::ErrorKind::ImmatureSignature => JwtError::NotYetValid,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                    jsonwebtoken::errors::ErrorKind::InvalidAudience => JwtError::InvalidAudience,
                    _ => JwtError::InvalidToken,
                }
            })
    }

    /// Issue a signed token for `subject`
    pub fn issue_token(
        &self,
        subject: &str,
        audience: Vec<String>,
        scopes: Vec<String>,
        ttl_seconds: u64,
    ) -> Result<String, JwtError> {
        self.encode_claims(&Claims::new(subject.to_string(), audience, scopes, ttl_seconds))
    }

    /// Decode the bearer token carried by `Authorization`, if any
    pub fn authenticate_header(&self, value: Option<&str>) -> Result<Claims, JwtError> {
        let header = value.ok_or(JwtError::MissingHeader)?;
        let token = header.strip_prefix("Bearer ").ok_or(JwtError::InvalidHeaderFormat)?;
        if token.is_empty() {
            return Err(JwtError::InvalidHeaderFormat);
        }
        self.decode_token(token)
    }
}

/// JWT-related errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum JwtError {
    #[error("Token has expired")]
    Expired,

    #[error("Token is not valid yet")]
    NotYetValid,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token audience not accepted")]
    InvalidAudience,

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Missing authorization header")]
    MissingHeader,

    #[error("Invalid authorization header format")]
    InvalidHeaderFormat,

    #[error("Token encoding error: {0}")]
    EncodingError(String),
}

/// Provider backed by HS256 bearer tokens in the `Authorization` header
#[derive(Clone)]
pub struct BearerAuth {
    jwt: JwtService,
}

impl BearerAuth {
    pub fn new(jwt: JwtService) -> Self {
        Self { jwt }
    }
}

impl AuthProvider for BearerAuth {
    fn is_authenticated(&self, request: &Request) -> bool {
        let header = request.headers().get(AUTHORIZATION).and_then(|h| h.to_str().ok());
        match self.jwt.authenticate_header(header) {
            Ok(claims) => {
                debug!(subject = %claims.sub, "Bearer token accepted");
                true
            }
            Err(e) => {
                debug!("Bearer token rejected: {}", e);
                false
            }
        }
    }
}

/// Reject unauthenticated callers with an empty 401.
///
/// Authenticated requests reach the handler unchanged.
pub fn require_auth<P: AuthProvider>(provider: P) -> impl Fn(Request, Next) -> GuardFuture + Clone {
    let provider = Arc::new(provider);
    move |request: Request, next: Next| {
        let provider = Arc::clone(&provider);
        Box::pin(async move {
            if !provider.is_authenticated(&request) {
                return Err(GuardError::Unauthenticated);
            }

            Ok(next.run(request).await)
        })
    }
}

/// Resolve the caller from a bearer token and expose it as [`UserContext`].
///
/// Never rejects: requests without a valid token simply carry no identity,
/// leaving the decision to [`require_auth`].
pub fn authenticate(
    jwt: JwtService,
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Clone {
    let jwt = Arc::new(jwt);
    move |mut request: Request, next: Next| {
        let jwt = Arc::clone(&jwt);
        Box::pin(async move {
            let header = request.headers().get(AUTHORIZATION).and_then(|h| h.to_str().ok());
            match jwt.authenticate_header(header) {
                Ok(claims) => {
                    let user_context = UserContext::from(claims);
                    debug!(subject = %user_context.subject, "Authenticated caller");
                    request.extensions_mut().insert(user_context);
                }
                Err(JwtError::MissingHeader) => {}
                Err(e) => debug!("Ignoring unusable bearer token: {}", e),
            }

            next.run(request).await
        })
    }
}
