//! Customer records and contact preferences.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Channel, CustomerId, PageRequest};

/// Maximum customer name length.
pub const CUSTOMER_NAME_MAX: usize = 120;
/// Maximum free-text note length.
pub const CUSTOMER_NOTES_MAX: usize = 2000;

/// Validation failures for customer input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustomerValidationError {
    /// Name is empty or too long.
    #[error("name must be 1-{max} characters")]
    InvalidName {
        /// Longest accepted name.
        max: usize,
    },
    /// Email lacks an `@` or a dotted domain.
    #[error("email address is not valid")]
    InvalidEmail,
    /// Phone number is not `+` and 8-15 digits.
    #[error("phone number must be '+' followed by 8-15 digits")]
    InvalidPhone,
    /// Time zone is not an IANA name.
    #[error("unknown time zone '{value}'")]
    InvalidTimeZone {
        /// Rejected input.
        value: String,
    },
    /// Notes exceed the limit.
    #[error("notes must be at most {max} characters")]
    NotesTooLong {
        /// Longest accepted notes.
        max: usize,
    },
}

impl CustomerValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidName { .. } => "name",
            Self::InvalidEmail => "email",
            Self::InvalidPhone => "phone",
            Self::InvalidTimeZone { .. } => "timeZone",
            Self::NotesTooLong { .. } => "notes",
        }
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn phone_regex() -> &'static Regex {
    PHONE_RE.get_or_init(|| {
        Regex::new(r"^\+[0-9]{8,15}$")
            .unwrap_or_else(|error| panic!("phone regex failed to compile: {error}"))
    })
}

fn normalize_name(raw: &str) -> Result<String, CustomerValidationError> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > CUSTOMER_NAME_MAX {
        return Err(CustomerValidationError::InvalidName {
            max: CUSTOMER_NAME_MAX,
        });
    }
    Ok(name.to_owned())
}

fn normalize_email(raw: Option<String>) -> Result<Option<String>, CustomerValidationError> {
    match raw.map(|value| value.trim().to_lowercase()) {
        Some(value) if value.is_empty() => Ok(None),
        Some(value) if email_regex().is_match(&value) => Ok(Some(value)),
        Some(_) => Err(CustomerValidationError::InvalidEmail),
        None => Ok(None),
    }
}

fn normalize_phone(raw: Option<String>) -> Result<Option<String>, CustomerValidationError> {
    match raw.map(|value| value.chars().filter(|c| !matches!(c, ' ' | '-' | '(' | ')')).collect::<String>()) {
        Some(value) if value.is_empty() => Ok(None),
        Some(value) if phone_regex().is_match(&value) => Ok(Some(value)),
        Some(_) => Err(CustomerValidationError::InvalidPhone),
        None => Ok(None),
    }
}

fn parse_time_zone(raw: Option<String>) -> Result<Option<Tz>, CustomerValidationError> {
    match raw.map(|value| value.trim().to_owned()) {
        Some(value) if value.is_empty() => Ok(None),
        Some(value) => value
            .parse::<Tz>()
            .map(Some)
            .map_err(|_| CustomerValidationError::InvalidTimeZone { value }),
        None => Ok(None),
    }
}

fn check_notes(notes: Option<String>) -> Result<Option<String>, CustomerValidationError> {
    match notes {
        Some(value) if value.chars().count() > CUSTOMER_NOTES_MAX => {
            Err(CustomerValidationError::NotesTooLong {
                max: CUSTOMER_NOTES_MAX,
            })
        }
        other => Ok(other),
    }
}

/// Customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Customer identifier.
    pub id: CustomerId,
    /// Full name.
    pub name: String,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone in `+` international form.
    pub phone: Option<String>,
    /// Service address.
    pub address: Option<String>,
    /// Zone quiet hours are evaluated in; the configured default applies when unset.
    pub time_zone: Option<Tz>,
    /// Consent to email.
    pub email_opt_in: bool,
    /// Consent to SMS.
    pub sms_opt_in: bool,
    /// Internal staff notes.
    pub notes: Option<String>,
    /// Soft-deleted; hidden from lists and skipped by messaging.
    pub archived: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// Raw input for a new customer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerDraft {
    /// Full name.
    pub name: String,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Service address.
    pub address: Option<String>,
    /// IANA time zone name.
    pub time_zone: Option<String>,
    /// Consent to email.
    pub email_opt_in: bool,
    /// Consent to SMS.
    pub sms_opt_in: bool,
    /// Internal staff notes.
    pub notes: Option<String>,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerUpdate {
    /// New name.
    pub name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New phone.
    pub phone: Option<String>,
    /// New address.
    pub address: Option<String>,
    /// New IANA time zone name.
    pub time_zone: Option<String>,
    /// New email consent.
    pub email_opt_in: Option<bool>,
    /// New SMS consent.
    pub sms_opt_in: Option<bool>,
    /// New notes.
    pub notes: Option<String>,
}

impl CustomerUpdate {
    /// Whether the update only touches fields a customer may edit themselves.
    pub fn is_contact_preferences_only(&self) -> bool {
        self.name.is_none() && self.notes.is_none()
    }
}

impl Customer {
    /// Validate a draft into a new customer.
    pub fn create(
        id: CustomerId,
        draft: CustomerDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, CustomerValidationError> {
        Ok(Self {
            id,
            name: normalize_name(&draft.name)?,
            email: normalize_email(draft.email)?,
            phone: normalize_phone(draft.phone)?,
            address: draft.address.map(|a| a.trim().to_owned()).filter(|a| !a.is_empty()),
            time_zone: parse_time_zone(draft.time_zone)?,
            email_opt_in: draft.email_opt_in,
            sms_opt_in: draft.sms_opt_in,
            notes: check_notes(draft.notes)?,
            archived: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update, validating each supplied field.
    pub fn apply(
        &mut self,
        update: CustomerUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), CustomerValidationError> {
        let mut next = self.clone();
        if let Some(name) = update.name {
            next.name = normalize_name(&name)?;
        }
        if update.email.is_some() {
            next.email = normalize_email(update.email)?;
        }
        if update.phone.is_some() {
            next.phone = normalize_phone(update.phone)?;
        }
        if let Some(address) = update.address {
            let trimmed = address.trim();
            next.address = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        }
        if update.time_zone.is_some() {
            next.time_zone = parse_time_zone(update.time_zone)?;
        }
        if let Some(flag) = update.email_opt_in {
            next.email_opt_in = flag;
        }
        if let Some(flag) = update.sms_opt_in {
            next.sms_opt_in = flag;
        }
        if update.notes.is_some() {
            next.notes = check_notes(update.notes)?;
        }
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// Delivery address for `channel` when the customer has opted in.
    pub fn reachable_address(&self, channel: Channel) -> Option<&str> {
        if self.archived {
            return None;
        }
        match channel {
            Channel::Email if self.email_opt_in => self.email.as_deref(),
            Channel::Sms if self.sms_opt_in => self.phone.as_deref(),
            _ => None,
        }
    }

    /// Email when reachable, then SMS. Falls back to email so an
    /// unreachable customer still gets a skipped entry in the message log.
    pub fn preferred_channel(&self) -> Channel {
        if self.reachable_address(Channel::Email).is_none()
            && self.reachable_address(Channel::Sms).is_some()
        {
            Channel::Sms
        } else {
            Channel::Email
        }
    }
}

/// List filter for customers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    /// Case-insensitive match against name or email.
    pub search: Option<String>,
    /// Include archived customers.
    pub include_archived: bool,
    /// Page window.
    pub page: PageRequest,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn draft() -> CustomerDraft {
        CustomerDraft {
            name: "  Ada Cleaner ".into(),
            email: Some("Ada@Example.COM".into()),
            phone: Some("+1 (555) 010-9999".into()),
            time_zone: Some("America/Denver".into()),
            email_opt_in: true,
            ..CustomerDraft::default()
        }
    }

    #[rstest]
    fn create_normalises_contact_fields() {
        let customer = Customer::create(CustomerId::random(), draft(), Utc::now()).expect("valid");
        assert_eq!(customer.name, "Ada Cleaner");
        assert_eq!(customer.email.as_deref(), Some("ada@example.com"));
        assert_eq!(customer.phone.as_deref(), Some("+15550109999"));
        assert_eq!(customer.time_zone, Some(chrono_tz::America::Denver));
    }

    #[rstest]
    #[case(CustomerDraft { name: " ".into(), ..draft() }, "name")]
    #[case(CustomerDraft { email: Some("no-at-sign".into()), ..draft() }, "email")]
    #[case(CustomerDraft { phone: Some("12345".into()), ..draft() }, "phone")]
    #[case(CustomerDraft { time_zone: Some("Nowhere/City".into()), ..draft() }, "timeZone")]
    fn create_rejects_bad_fields(#[case] input: CustomerDraft, #[case] field: &str) {
        let err = Customer::create(CustomerId::random(), input, Utc::now()).expect_err("invalid");
        assert_eq!(err.field(), field);
    }

    #[rstest]
    fn apply_is_all_or_nothing() {
        let mut customer =
            Customer::create(CustomerId::random(), draft(), Utc::now()).expect("valid");
        let before = customer.clone();
        let update = CustomerUpdate {
            sms_opt_in: Some(true),
            email: Some("broken".into()),
            ..CustomerUpdate::default()
        };
        assert!(customer.apply(update, Utc::now()).is_err());
        assert_eq!(customer, before);
    }

    #[rstest]
    fn reachable_address_respects_opt_in_and_archive() {
        let mut customer =
            Customer::create(CustomerId::random(), draft(), Utc::now()).expect("valid");
        assert_eq!(customer.reachable_address(Channel::Email), Some("ada@example.com"));
        assert_eq!(customer.reachable_address(Channel::Sms), None);
        customer.archived = true;
        assert_eq!(customer.reachable_address(Channel::Email), None);
    }

    #[rstest]
    fn preference_only_updates_are_detected() {
        let prefs = CustomerUpdate {
            sms_opt_in: Some(false),
            ..CustomerUpdate::default()
        };
        assert!(prefs.is_contact_preferences_only());
        let rename = CustomerUpdate {
            name: Some("New".into()),
            ..CustomerUpdate::default()
        };
        assert!(!rename.is_contact_preferences_only());
    }
}
