//! Cookie session settings read from the environment.
//!
//! | Variable                      | Debug default | Release                  |
//! |-------------------------------|---------------|--------------------------|
//! | `CRM_SESSION_KEY_FILE`        | ephemeral key | file of at least 64 bytes |
//! | `CRM_SESSION_COOKIE_SECURE`   | `true`        | required                 |
//! | `CRM_SESSION_SAMESITE`        | `Lax`         | required                 |
//! | `CRM_SESSION_ALLOW_EPHEMERAL` | `false`       | required, must be false  |
//! | `CRM_SESSION_TTL_HOURS`       | 12            | optional, 1..=720        |
//!
//! Debug builds warn and fall back on missing or malformed values; release
//! builds refuse to start.

pub mod fingerprint;

use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite, time::Duration as CookieDuration};
use mockable::Env;
use tracing::warn;
use zeroize::Zeroizing;

pub use fingerprint::key_fingerprint;

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/crm_session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
pub(crate) const KEY_FILE_ENV: &str = "CRM_SESSION_KEY_FILE";
pub(crate) const COOKIE_SECURE_ENV: &str = "CRM_SESSION_COOKIE_SECURE";
pub(crate) const SAMESITE_ENV: &str = "CRM_SESSION_SAMESITE";
pub(crate) const ALLOW_EPHEMERAL_ENV: &str = "CRM_SESSION_ALLOW_EPHEMERAL";
pub(crate) const TTL_HOURS_ENV: &str = "CRM_SESSION_TTL_HOURS";
const DEFAULT_TTL_HOURS: i64 = 12;
const MAX_TTL_HOURS: i64 = 720;
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";
const TTL_EXPECTED: &str = "whole hours between 1 and 720";

/// Whether configuration problems are tolerated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Missing settings fall back to development defaults.
    Debug,
    /// Missing settings are errors.
    Release,
}

impl BuildMode {
    /// Mode matching how the binary was compiled.
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn lenient(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Validated session cookie settings.
#[derive(Clone)]
pub struct SessionSettings {
    /// Key signing and encrypting the cookie.
    pub key: Key,
    /// Whether the cookie carries the `Secure` flag.
    pub cookie_secure: bool,
    /// Cookie `SameSite` policy.
    pub same_site: SameSite,
    /// Lifetime of a login before the cookie expires.
    pub ttl: CookieDuration,
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("key", &key_fingerprint(&self.key))
            .field("cookie_secure", &self.cookie_secure)
            .field("same_site", &self.same_site)
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    /// Required variable is unset.
    #[error("missing required environment variable: {name}")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },
    /// Variable holds an unparsable value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Rejected value.
        value: String,
        /// Accepted values.
        expected: &'static str,
    },
    /// Key file could not be read.
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        /// Path of the key file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Key file holds too few bytes.
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        /// Path of the key file.
        path: PathBuf,
        /// Bytes read.
        length: usize,
        /// Bytes required.
        min_len: usize,
    },
    /// `SameSite=None` without a secure cookie.
    #[error("CRM_SESSION_SAMESITE=None requires CRM_SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    /// Ephemeral key requested in a release build.
    #[error("CRM_SESSION_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Read and validate every session setting.
///
/// # Errors
///
/// In release mode, any missing or malformed variable, an unreadable or short
/// key file, or an unsafe combination of toggles.
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let reader = EnvReader { env, mode };
    let cookie_secure = reader.flag(COOKIE_SECURE_ENV, true)?;
    let same_site = reader.same_site(cookie_secure)?;
    let allow_ephemeral = reader.flag(ALLOW_EPHEMERAL_ENV, false)?;
    if allow_ephemeral && !mode.lenient() {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let ttl = reader.ttl()?;
    let key = reader.key(allow_ephemeral)?;
    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
        ttl,
    })
}

struct EnvReader<'a, E> {
    env: &'a E,
    mode: BuildMode,
}

impl<E: Env> EnvReader<'_, E> {
    /// Fall back to `fallback` in debug builds, fail with `error` otherwise.
    fn tolerate<T>(
        &self,
        fallback: T,
        error: SessionConfigError,
    ) -> Result<T, SessionConfigError> {
        if self.mode.lenient() {
            warn!(%error, "session configuration fallback in use");
            Ok(fallback)
        } else {
            Err(error)
        }
    }

    fn required(&self, name: &'static str) -> Option<String> {
        self.env
            .string(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn flag(&self, name: &'static str, fallback: bool) -> Result<bool, SessionConfigError> {
        let Some(value) = self.required(name) else {
            return self.tolerate(fallback, SessionConfigError::MissingEnv { name });
        };
        match parse_bool(&value) {
            Some(flag) => Ok(flag),
            None => self.tolerate(
                fallback,
                SessionConfigError::InvalidEnv {
                    name,
                    value,
                    expected: BOOL_EXPECTED,
                },
            ),
        }
    }

    fn same_site(&self, cookie_secure: bool) -> Result<SameSite, SessionConfigError> {
        let fallback = if self.mode.lenient() {
            SameSite::Lax
        } else {
            SameSite::Strict
        };
        let Some(value) = self.required(SAMESITE_ENV) else {
            return self.tolerate(fallback, SessionConfigError::MissingEnv { name: SAMESITE_ENV });
        };
        match value.to_ascii_lowercase().as_str() {
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            "none" if cookie_secure => Ok(SameSite::None),
            "none" => self.tolerate(SameSite::None, SessionConfigError::InsecureSameSiteNone),
            _ => self.tolerate(
                fallback,
                SessionConfigError::InvalidEnv {
                    name: SAMESITE_ENV,
                    value,
                    expected: SAMESITE_EXPECTED,
                },
            ),
        }
    }

    fn ttl(&self) -> Result<CookieDuration, SessionConfigError> {
        let fallback = CookieDuration::hours(DEFAULT_TTL_HOURS);
        let Some(value) = self.required(TTL_HOURS_ENV) else {
            return Ok(fallback);
        };
        match value.parse::<i64>() {
            Ok(hours) if (1..=MAX_TTL_HOURS).contains(&hours) => Ok(CookieDuration::hours(hours)),
            _ => self.tolerate(
                fallback,
                SessionConfigError::InvalidEnv {
                    name: TTL_HOURS_ENV,
                    value,
                    expected: TTL_EXPECTED,
                },
            ),
        }
    }

    fn key(&self, allow_ephemeral: bool) -> Result<Key, SessionConfigError> {
        let path = PathBuf::from(
            self.required(KEY_FILE_ENV)
                .unwrap_or_else(|| SESSION_KEY_DEFAULT_PATH.to_owned()),
        );
        match std::fs::read(&path) {
            Ok(bytes) => {
                let bytes = Zeroizing::new(bytes);
                if bytes.len() < SESSION_KEY_MIN_LEN {
                    let error = SessionConfigError::KeyTooShort {
                        path,
                        length: bytes.len(),
                        min_len: SESSION_KEY_MIN_LEN,
                    };
                    return self.tolerate(Key::generate(), error);
                }
                Ok(Key::derive_from(&bytes))
            }
            Err(source) if self.mode.lenient() || allow_ephemeral => {
                warn!(
                    path = %path.display(),
                    error = %source,
                    "using temporary session key; logins will not survive a restart"
                );
                Ok(Key::generate())
            }
            Err(source) => Err(SessionConfigError::KeyRead { path, source }),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
