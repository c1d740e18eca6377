//! Authentication types: JWT claims and the acting role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role carried in the token.
///
/// Officer roles are kept as string codes here; the workflow crate maps them
/// onto its own officer-role enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// Registering professional who owns applications.
    Applicant,
    /// Junior Engineer.
    JuniorEngineer,
    /// Assistant Engineer.
    AssistantEngineer,
    /// Executive Engineer.
    ExecutiveEngineer,
    /// City Engineer.
    CityEngineer,
    /// Clerk.
    Clerk,
}

impl ActorRole {
    /// Returns the wire code for this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Applicant => "applicant",
            Self::JuniorEngineer => "junior_engineer",
            Self::AssistantEngineer => "assistant_engineer",
            Self::ExecutiveEngineer => "executive_engineer",
            Self::CityEngineer => "city_engineer",
            Self::Clerk => "clerk",
        }
    }

    /// Parses a wire code.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "applicant" => Some(Self::Applicant),
            "junior_engineer" => Some(Self::JuniorEngineer),
            "assistant_engineer" => Some(Self::AssistantEngineer),
            "executive_engineer" => Some(Self::ExecutiveEngineer),
            "city_engineer" => Some(Self::CityEngineer),
            "clerk" => Some(Self::Clerk),
            _ => None,
        }
    }

    /// Returns true for every role except `Applicant`.
    #[must_use]
    pub const fn is_officer(&self) -> bool {
        !matches!(self, Self::Applicant)
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user or officer ID).
    pub sub: Uuid,
    /// Role of the bearer.
    pub role: ActorRole,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Creates new claims.
    #[must_use]
    pub fn new(user_id: Uuid, role: ActorRole, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: user_id,
            role,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Checks if the token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}
