use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

/// The three static secrets needed to mint access tokens.
///
/// Immutable after startup. The API key doubles as the `x-api-key` header
/// on every call; the integrator token and account email are only sent
/// to the token endpoint.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Integrator API key issued by the vendor.
    pub api_key: SecretString,
    /// Integrator token generated in the Skyport home app.
    pub integrator_token: SecretString,
    /// Email address of the home app account owning the thermostat.
    pub email: SecretString,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        integrator_token: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            integrator_token: SecretString::from(integrator_token.into()),
            email: SecretString::from(email.into()),
        }
    }
}

/// A bearer token as returned by the token endpoint.
///
/// Debug output is redacted; use [`AccessToken::expose`] only when
/// building the `Authorization` header.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Result of a successful mint call.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: AccessToken,
    /// Server-declared lifetime, counted from the moment of the response.
    pub expires_in: Duration,
}
