//! API token handling built on the secrecy crate
//!
//! The Toggl token is wrapped in [`SecretString`] as soon as the TOML is
//! parsed. Its memory is zeroed on drop and `Debug` prints a redaction marker,
//! so a stray `{:?}` on the config never leaks it into the JSON log file.
//!
//! # Example
//!
//! ```rust
//! use toggl_ledger::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let token = secret_string("0123456789abcdef".to_string());
//! assert_eq!(token.expose_secret(), "0123456789abcdef");
//! assert!(!format!("{token:?}").contains("0123456789abcdef"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String newtype satisfying the bounds `Secret` needs for clone/debug/serde
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
    /// True for an empty token
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
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

/// A zeroize-on-drop string whose `Debug` output is redacted
pub type SecretString = Secret<SecretValue>;

/// Wraps a plain string as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}
