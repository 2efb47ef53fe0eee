//! User data model.
//!
//! Users are keyed externally by the pair (college id, email) and internally
//! by a UUID. Accounts are created on first login and never deleted.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Validation errors returned when building user values from raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    EmptyName,
    EmptyCollegeId,
    EmptyEmail,
    UnknownRole { value: String },
}

impl UserValidationError {
    /// Request field that carried the invalid value.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyId | Self::InvalidId => "id",
            Self::EmptyName => "name",
            Self::EmptyCollegeId => "collegeId",
            Self::EmptyEmail => "email",
            Self::UnknownRole { .. } => "role",
        }
    }
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::EmptyCollegeId => write!(f, "college id must not be empty"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::UnknownRole { value } => write!(f, "unknown role: {value}"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(id)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random [`UserId`].
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Student,
    Admin,
}

impl Role {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "admin" => Ok(Self::Admin),
            other => Err(UserValidationError::UnknownRole {
                value: other.to_owned(),
            }),
        }
    }
}

fn require_non_empty(
    value: impl Into<String>,
    err: UserValidationError,
) -> Result<String, UserValidationError> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(err);
    }
    Ok(if trimmed.len() == value.len() {
        value
    } else {
        trimmed.to_owned()
    })
}

/// Validated login payload: display name plus the external account key.
///
/// ## Invariants
/// - Every field is non-empty after trimming; stored values are trimmed.
///
/// # Examples
/// ```
/// use mess_feedback::domain::LoginDetails;
///
/// let details = LoginDetails::try_from_parts(" Ada ", "CS001", "ada@example.edu")
///     .expect("valid details");
/// assert_eq!(details.name(), "Ada");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginDetails {
    name: String,
    college_id: String,
    email: String,
}

impl LoginDetails {
    /// Validate raw login fields.
    pub fn try_from_parts(
        name: impl Into<String>,
        college_id: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, UserValidationError> {
        Ok(Self {
            name: require_non_empty(name, UserValidationError::EmptyName)?,
            college_id: require_non_empty(college_id, UserValidationError::EmptyCollegeId)?,
            email: require_non_empty(email, UserValidationError::EmptyEmail)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn college_id(&self) -> &str {
        &self.college_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// Application user.
///
/// ## Invariants
/// - `(college_id, email)` identifies at most one user.
/// - `name` is non-empty once trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: UserId,
    #[schema(example = "Ada Lovelace")]
    name: String,
    #[schema(example = "CS2024001")]
    college_id: String,
    #[schema(example = "ada@example.edu")]
    email: String,
    role: Role,
}

impl User {
    /// Assemble a user from already-validated parts.
    #[must_use]
    pub fn new(id: UserId, details: LoginDetails, role: Role) -> Self {
        let LoginDetails {
            name,
            college_id,
            email,
        } = details;
        Self {
            id,
            name,
            college_id,
            email,
            role,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn college_id(&self) -> &str {
        &self.college_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }
}
