//! JWT token generation and validation.

use chrono::{Duration, Utc};
use entities::{Role, User};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AuthError, AuthResult, DEFAULT_ACCESS_TOKEN_MINUTES, DEFAULT_JWT_ISSUER,
    DEFAULT_REFRESH_TOKEN_HOURS,
};

/// Kind of token. Only access tokens authenticate API requests; refresh
/// tokens are only accepted by the refresh endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// JWT claims for event manager tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    /// Username at issuance.
    pub username: String,
    /// Role at issuance.
    pub role: Role,
    /// Access or refresh.
    pub token_type: TokenType,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
    /// Issuer.
    pub iss: String,
    /// JWT ID.
    pub jti: String,
}

impl Claims {
    /// Creates new claims for a user. Fails when `lifetime` pushes the
    /// expiry out of the representable range.
    pub fn new(
        user: &User,
        token_type: TokenType,
        lifetime: Duration,
        issuer: &str,
    ) -> AuthResult<Self> {
        let now = Utc::now();
        let exp = now.checked_add_signed(lifetime).ok_or_else(|| {
            AuthError::Configuration(format!("token lifetime {lifetime} is out of range"))
        })?;

        Ok(Self {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            token_type,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: issuer.to_string(),
            jti: Uuid::new_v4().to_string(),
        })
    }

    /// Returns the user ID.
    pub fn user_id(&self) -> AuthResult<Uuid> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }

    /// Returns true if the token is expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Access and refresh token issued together at login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token lifetime in minutes.
    pub access_token_minutes: u64,
    /// Refresh token lifetime in hours.
    pub refresh_token_hours: u64,
    /// Token issuer.
    pub issuer: String,
}

impl JwtConfig {
    /// Creates a new JWT configuration.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_token_minutes: DEFAULT_ACCESS_TOKEN_MINUTES,
            refresh_token_hours: DEFAULT_REFRESH_TOKEN_HOURS,
            issuer: DEFAULT_JWT_ISSUER.to_string(),
        }
    }

    /// Sets the access token lifetime in minutes.
    pub fn with_access_token_minutes(mut self, minutes: u64) -> Self {
        self.access_token_minutes = minutes;
        self
    }

    /// Sets the refresh token lifetime in hours.
    pub fn with_refresh_token_hours(mut self, hours: u64) -> Self {
        self.refresh_token_hours = hours;
        self
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.config.issuer)
            .field("access_token_minutes", &self.config.access_token_minutes)
            .field("refresh_token_hours", &self.config.refresh_token_hours)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    /// Creates a new JWT manager.
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    fn lifetime(&self, token_type: TokenType) -> AuthResult<Duration> {
        let lifetime = match token_type {
            TokenType::Access => i64::try_from(self.config.access_token_minutes)
                .ok()
                .and_then(Duration::try_minutes),
            TokenType::Refresh => i64::try_from(self.config.refresh_token_hours)
                .ok()
                .and_then(Duration::try_hours),
        };
        lifetime.ok_or_else(|| {
            AuthError::Configuration(format!("{} token lifetime is out of range", token_type.as_str()))
        })
    }

    fn generate(&self, user: &User, token_type: TokenType) -> AuthResult<String> {
        let claims = Claims::new(user, token_type, self.lifetime(token_type)?, &self.config.issuer)?;

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::JwtEncoding(e.to_string()))
    }

    /// Generates an access token for a user.
    pub fn generate_access_token(&self, user: &User) -> AuthResult<String> {
        self.generate(user, TokenType::Access)
    }

    /// Generates an access token and a refresh token for a user.
    pub fn generate_token_pair(&self, user: &User) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access: self.generate(user, TokenType::Access)?,
            refresh: self.generate(user, TokenType::Refresh)?,
        })
    }

    /// Validates and decodes a token of any type.
    pub fn validate_token(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        Ok(token_data.claims)
    }

    fn validate_typed(&self, token: &str, expected: TokenType) -> AuthResult<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != expected {
            return Err(AuthError::WrongTokenType {
                expected: expected.as_str(),
            });
        }
        Ok(claims)
    }

    /// Validates a token and requires it to be an access token.
    pub fn validate_access_token(&self, token: &str) -> AuthResult<Claims> {
        self.validate_typed(token, TokenType::Access)
    }

    /// Validates a token and requires it to be a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> AuthResult<Claims> {
        self.validate_typed(token, TokenType::Refresh)
    }

    /// Returns the access token lifetime in seconds.
    pub fn access_expiration_seconds(&self) -> u64 {
        self.config.access_token_minutes.saturating_mul(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-must-be-long-enough-for-security";

    fn manager() -> JwtManager {
        JwtManager::new(JwtConfig::new(SECRET))
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let manager = manager();
        let user = User::new("alice", "hash").with_role(Role::Manager);

        let token = manager.generate_access_token(&user).unwrap();
        let claims = manager.validate_access_token(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::Manager);
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_token_pair_types_are_not_interchangeable() {
        let manager = manager();
        let user = User::new("bob", "hash");

        let pair = manager.generate_token_pair(&user).unwrap();

        assert!(manager.validate_refresh_token(&pair.refresh).is_ok());
        assert!(matches!(
            manager.validate_access_token(&pair.refresh),
            Err(AuthError::WrongTokenType { expected: "access" })
        ));
        assert!(matches!(
            manager.validate_refresh_token(&pair.access),
            Err(AuthError::WrongTokenType { expected: "refresh" })
        ));
    }

    #[test]
    fn test_invalid_token() {
        let result = manager().validate_token("invalid-token");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let manager1 = JwtManager::new(JwtConfig::new("secret-one-must-be-long-enough"));
        let manager2 = JwtManager::new(JwtConfig::new("secret-two-must-be-long-enough"));

        let token = manager1
            .generate_access_token(&User::new("carol", "hash"))
            .unwrap();

        assert!(manager2.validate_token(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let issuer_a = JwtManager::new(JwtConfig::new(SECRET).with_issuer("a"));
        let issuer_b = JwtManager::new(JwtConfig::new(SECRET).with_issuer("b"));

        let token = issuer_a
            .generate_access_token(&User::new("dave", "hash"))
            .unwrap();

        assert!(issuer_b.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let user = User::new("erin", "hash");
        let claims = Claims::new(
            &user,
            TokenType::Access,
            Duration::hours(-2),
            DEFAULT_JWT_ISSUER,
        )
        .unwrap();
        assert!(claims.is_expired());

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            manager().validate_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_access_expiration_seconds() {
        let manager = JwtManager::new(JwtConfig::new(SECRET).with_access_token_minutes(15));
        assert_eq!(manager.access_expiration_seconds(), 900);
    }

    #[test]
    fn test_out_of_range_lifetime_is_a_configuration_error() {
        let user = User::new("frank", "hash");

        let manager =
            JwtManager::new(JwtConfig::new(SECRET).with_access_token_minutes(100_000_000_000_000));
        assert!(matches!(
            manager.generate_access_token(&user),
            Err(AuthError::Configuration(_))
        ));

        let manager = JwtManager::new(JwtConfig::new(SECRET).with_refresh_token_hours(u64::MAX));
        assert!(matches!(
            manager.generate_token_pair(&user),
            Err(AuthError::Configuration(_))
        ));
        assert_eq!(
            JwtManager::new(JwtConfig::new(SECRET).with_access_token_minutes(u64::MAX))
                .access_expiration_seconds(),
            u64::MAX
        );
    }

    #[test]
    fn test_longest_accepted_lifetimes_still_issue_tokens() {
        let manager = JwtManager::new(
            JwtConfig::new(SECRET)
                .with_access_token_minutes(crate::MAX_ACCESS_TOKEN_MINUTES)
                .with_refresh_token_hours(crate::MAX_REFRESH_TOKEN_HOURS),
        );
        let pair = manager.generate_token_pair(&User::new("grace", "hash")).unwrap();

        assert!(manager.validate_access_token(&pair.access).is_ok());
        assert!(manager.validate_refresh_token(&pair.refresh).is_ok());
    }
}
