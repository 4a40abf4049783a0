//! Credential handling using the secrecy crate
//!
//! The database connection string and the map server password are held in
//! [`SecretString`] values. Memory is zeroed when they are dropped, `Debug`
//! output is redacted and reading the value requires `expose_secret()`.
//!
//! # Example
//!
//! ```rust
//! use cadastre_ingest::config::{secret_string, SecretString};
//! use secrecy::ExposeSecret;
//!
//! let password: SecretString = secret_string("geoserver".to_string());
//! assert_eq!(password.expose_secret(), "geoserver");
//!
//! // Debug output is redacted
//! assert!(!format!("{password:?}").contains("geoserver"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String newtype satisfying the traits `Secret` needs
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    /// Check if the secret value is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if the secret value starts with a prefix
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    /// Parse the secret value into another type without copying it out
    pub fn parse<F: std::str::FromStr>(&self) -> Result<F, F::Err> {
        self.0.parse()
    }

    /// URL with its credentials replaced by `***`, safe to log
    ///
    /// `postgresql://user:pw@db:5432/cadastre` becomes
    /// `postgresql://***@db:5432/cadastre`.
    pub fn redacted_url(&self) -> String {
        let (scheme, rest) = match self.0.split_once("://") {
            Some((scheme, rest)) => (scheme, rest),
            None => return "***".to_string(),
        };
        match rest.rsplit_once('@') {
            Some((_, host)) => format!("{scheme}://***@{host}"),
            None => format!("{scheme}://{rest}"),
        }
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Secret string zeroized on drop and redacted in `Debug`
pub type SecretString = Secret<SecretValue>;

/// Wrap a plain string in a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("sensitive-data".to_string());
        let debug_output = format!("{secret:?}");
        assert!(!debug_output.contains("sensitive-data"));
    }

    #[test]
    fn test_redacted_url() {
        let secret = secret_string("postgresql://cadastre:pw@db:5432/cadastre".to_string());
        assert_eq!(
            secret.expose_secret().redacted_url(),
            "postgresql://***@db:5432/cadastre"
        );

        let no_credentials = secret_string("postgresql://db/cadastre".to_string());
        assert_eq!(
            no_credentials.expose_secret().redacted_url(),
            "postgresql://db/cadastre"
        );

        let garbage = secret_string("not a url".to_string());
        assert_eq!(garbage.expose_secret().redacted_url(), "***");
    }

    #[test]
    fn test_secret_serde() {
        #[derive(Serialize, Deserialize)]
        struct TestConfig {
            password: SecretString,
        }

        let config: TestConfig = toml::from_str("password = \"test123\"").unwrap();
        assert_eq!(config.password.expose_secret(), "test123");

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("test123"));
    }
}
