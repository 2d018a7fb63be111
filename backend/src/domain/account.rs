//! Login accounts, roles and the authenticated principal.
//!
//! Staff and admins manage every record; customer accounts are bound to a
//! single customer and may only touch rows owned by that customer.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::text_enum::text_enum;
use super::{CustomerId, Error, UserId};

/// Minimum accepted password length.
pub const PASSWORD_MIN_LEN: usize = 8;
/// Username length bounds.
pub const USERNAME_MIN: usize = 3;
/// Username length bounds.
pub const USERNAME_MAX: usize = 64;
/// Maximum display name length.
pub const ACCOUNT_DISPLAY_NAME_MAX: usize = 80;

text_enum! {
    /// Role granted to an account.
    pub enum Role {
        /// Full access including account management.
        Admin => "admin",
        /// Office or field staff.
        Staff => "staff",
        /// Portal user bound to one customer record.
        Customer => "customer",
    }
}

impl Role {
    /// Admins and staff may operate on any customer.
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Staff)
    }
}

/// Validation errors for login input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Blank username.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Empty password.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Username/password pair supplied at login.
///
/// # Examples
/// ```
/// use crm_backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" Dana ", "pw").expect("valid");
/// assert_eq!(creds.username(), "dana");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw inputs; usernames are case-insensitive.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            username: normalized.to_lowercase(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised, lowercase username.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password as supplied.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validation errors raised while creating an account.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountValidationError {
    /// Username has the wrong length or characters.
    #[error("username must be {min}-{max} characters of a-z, 0-9, '.', '_' or '-'")]
    InvalidUsername {
        /// Shortest accepted username.
        min: usize,
        /// Longest accepted username.
        max: usize,
    },
    /// Display name is empty or too long.
    #[error("display name must be 1-{max} characters")]
    InvalidDisplayName {
        /// Longest accepted display name.
        max: usize,
    },
    /// Password below the minimum length.
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Shortest accepted password.
        min: usize,
    },
    /// A customer account without a customer id.
    #[error("customer accounts must reference a customer")]
    MissingCustomer,
    /// A staff or admin account with a customer id.
    #[error("staff accounts must not reference a customer")]
    UnexpectedCustomer,
}

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        Regex::new("^[a-z0-9._-]+$")
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

/// Persisted account without secret material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account identifier.
    pub id: UserId,
    /// Lowercase login name.
    pub username: String,
    /// Name shown in the UI.
    pub display_name: String,
    /// Access level.
    pub role: Role,
    /// Linked customer record; set only for customer accounts.
    pub customer_id: Option<CustomerId>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Principal derived from this account.
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            role: self.role,
            customer_id: self.customer_id,
        }
    }
}

/// Account row paired with its password hash, used only during login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    /// The account itself.
    pub account: Account,
    /// Argon2 PHC string.
    pub password_hash: String,
}

/// Validated request to create an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    username: String,
    display_name: String,
    role: Role,
    customer_id: Option<CustomerId>,
    password: Zeroizing<String>,
}

impl NewAccount {
    /// Validate raw account fields.
    pub fn try_new(
        username: &str,
        display_name: &str,
        role: Role,
        customer_id: Option<CustomerId>,
        password: &str,
    ) -> Result<Self, AccountValidationError> {
        let username = username.trim().to_lowercase();
        let length = username.chars().count();
        if !(USERNAME_MIN..=USERNAME_MAX).contains(&length) || !username_regex().is_match(&username)
        {
            return Err(AccountValidationError::InvalidUsername {
                min: USERNAME_MIN,
                max: USERNAME_MAX,
            });
        }
        let display_name = display_name.trim();
        if display_name.is_empty() || display_name.chars().count() > ACCOUNT_DISPLAY_NAME_MAX {
            return Err(AccountValidationError::InvalidDisplayName {
                max: ACCOUNT_DISPLAY_NAME_MAX,
            });
        }
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(AccountValidationError::PasswordTooShort {
                min: PASSWORD_MIN_LEN,
            });
        }
        match (role, customer_id) {
            (Role::Customer, None) => return Err(AccountValidationError::MissingCustomer),
            (Role::Admin | Role::Staff, Some(_)) => {
                return Err(AccountValidationError::UnexpectedCustomer);
            }
            _ => {}
        }
        Ok(Self {
            username,
            display_name: display_name.to_owned(),
            role,
            customer_id,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Trimmed display name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Requested role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Linked customer, for customer accounts.
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    /// Plaintext password, hashed before storage.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Authenticated caller identity carried in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Signed-in account.
    pub user_id: UserId,
    /// Access level.
    pub role: Role,
    /// Customer the caller may act for, when the role is customer.
    pub customer_id: Option<CustomerId>,
}

impl Principal {
    /// Reject anyone who is not staff or admin.
    pub fn require_staff(&self) -> Result<(), Error> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(Error::forbidden("staff access required"))
        }
    }

    /// Reject anyone who is not an admin.
    pub fn require_admin(&self) -> Result<(), Error> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(Error::forbidden("admin access required"))
        }
    }

    /// Staff may access any customer; customers only their own record.
    pub fn require_customer_access(&self, customer_id: CustomerId) -> Result<(), Error> {
        if self.role.is_staff() || self.customer_id == Some(customer_id) {
            Ok(())
        } else {
            Err(Error::forbidden("access to this customer is not permitted"))
        }
    }

    /// Narrow a list filter so customers only see their own rows.
    ///
    /// Staff keep whatever filter they asked for; customers are pinned to
    /// their own id and rejected if they asked for someone else.
    pub fn scope_customer(&self, requested: Option<CustomerId>) -> Result<Option<CustomerId>, Error> {
        if self.role.is_staff() {
            return Ok(requested);
        }
        let own = self
            .customer_id
            .ok_or_else(|| Error::forbidden("account is not linked to a customer"))?;
        match requested {
            Some(id) if id != own => {
                Err(Error::forbidden("access to this customer is not permitted"))
            }
            _ => Ok(Some(own)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    fn customer_principal(id: CustomerId) -> Principal {
        Principal {
            user_id: UserId::random(),
            role: Role::Customer,
            customer_id: Some(id),
        }
    }

    fn staff_principal() -> Principal {
        Principal {
            user_id: UserId::random(),
            role: Role::Staff,
            customer_id: None,
        }
    }

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyUsername)]
    #[case("   ", "pw", LoginValidationError::EmptyUsername)]
    #[case("user", "", LoginValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(username, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("ab", "Name", Role::Staff, None, "longenough")]
    #[case("has space", "Name", Role::Staff, None, "longenough")]
    #[case("valid", "", Role::Staff, None, "longenough")]
    #[case("valid", "Name", Role::Staff, None, "short")]
    fn invalid_account_fields_are_rejected(
        #[case] username: &str,
        #[case] display_name: &str,
        #[case] role: Role,
        #[case] customer: Option<CustomerId>,
        #[case] password: &str,
    ) {
        assert!(NewAccount::try_new(username, display_name, role, customer, password).is_err());
    }

    #[rstest]
    fn customer_accounts_need_a_customer() {
        let err = NewAccount::try_new("pat", "Pat", Role::Customer, None, "longenough")
            .expect_err("missing customer");
        assert_eq!(err, AccountValidationError::MissingCustomer);
    }

    #[rstest]
    fn staff_accounts_reject_a_customer() {
        let err = NewAccount::try_new(
            "sam",
            "Sam",
            Role::Staff,
            Some(CustomerId::random()),
            "longenough",
        )
        .expect_err("unexpected customer");
        assert_eq!(err, AccountValidationError::UnexpectedCustomer);
    }

    #[rstest]
    fn usernames_are_normalised() {
        let account = NewAccount::try_new(" Office.Lead ", "Lead", Role::Admin, None, "longenough")
            .expect("valid account");
        assert_eq!(account.username(), "office.lead");
    }

    #[rstest]
    fn customers_only_reach_their_own_records() {
        let own = CustomerId::random();
        let principal = customer_principal(own);
        assert!(principal.require_customer_access(own).is_ok());
        let err = principal
            .require_customer_access(CustomerId::random())
            .expect_err("foreign customer");
        assert_eq!(err.code(), ErrorCode::Forbidden);
        assert_eq!(
            principal.require_staff().expect_err("not staff").code(),
            ErrorCode::Forbidden
        );
    }

    #[rstest]
    fn scope_pins_customers_to_their_own_id() {
        let own = CustomerId::random();
        let principal = customer_principal(own);
        assert_eq!(principal.scope_customer(None).expect("scoped"), Some(own));
        assert!(principal.scope_customer(Some(CustomerId::random())).is_err());
    }

    #[rstest]
    fn scope_leaves_staff_filters_alone() {
        let principal = staff_principal();
        assert_eq!(principal.scope_customer(None).expect("unscoped"), None);
        assert!(principal.require_admin().is_err());
    }
}
