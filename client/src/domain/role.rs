//! Session roles and the role token obfuscation layer.
//!
//! The login response carries the user's role as an opaque token so the
//! plaintext role never sits verbatim in storage. The token is
//! `"<salt>.<payload>"` where `payload` is the base64 encoding of the role
//! string with its characters reversed. This is not a security boundary: the
//! backend enforces authorization independently, and the decoded role only
//! decides which affordances the client shows.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::FavoriteKind;

const SEGMENT_DELIMITER: char = '.';

/// Recover a plaintext role string from its token.
///
/// Falls back to returning `token` unchanged when it has no payload segment
/// or the payload does not decode, so legacy plaintext values keep working.
///
/// # Examples
/// ```
/// use marketplace_client::domain::{decode_role_token, encode_role_token};
///
/// let token = encode_role_token("EMPLOYER", "a1b2");
/// assert_eq!(decode_role_token(&token), "EMPLOYER");
/// assert_eq!(decode_role_token("BUYER"), "BUYER");
/// ```
pub fn decode_role_token(token: &str) -> String {
    try_decode_role_token(token).unwrap_or_else(|| token.to_owned())
}

fn try_decode_role_token(token: &str) -> Option<String> {
    let payload = token
        .split(SEGMENT_DELIMITER)
        .nth(1)
        .filter(|segment| !segment.is_empty())?;
    let bytes = STANDARD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()?;
    let reversed = String::from_utf8(bytes).ok()?;
    Some(reversed.chars().rev().collect())
}

/// Produce a token that [`decode_role_token`] maps back to `role`.
///
/// `salt` must not contain the `.` delimiter.
pub fn encode_role_token(role: &str, salt: &str) -> String {
    let reversed: String = role.chars().rev().collect();
    format!("{salt}{SEGMENT_DELIMITER}{}", STANDARD.encode(reversed))
}

/// Permission tier of the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionRole {
    /// Platform moderator.
    Admin,
    /// Moderator who also manages other admins.
    SuperAdmin,
    /// Job seeker.
    Employee,
    /// Publishes job postings.
    Employer,
    /// Looks for houses to buy or rent.
    Buyer,
    /// Publishes house listings.
    Seller,
}

/// A UI action gated on the session role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Affordance {
    /// Access to the moderation dashboard.
    AdminDashboard,
    /// Create, edit, or delete listings of a kind.
    ManageListings(FavoriteKind),
    /// Save listings of a kind as favorites.
    Favorite(FavoriteKind),
}

impl SessionRole {
    /// Wire form, as it appears once decoded.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::Employee => "EMPLOYEE",
            Self::Employer => "EMPLOYER",
            Self::Buyer => "BUYER",
            Self::Seller => "SELLER",
        }
    }

    /// Decode a role token and parse the result.
    ///
    /// # Examples
    /// ```
    /// use marketplace_client::domain::{SessionRole, encode_role_token};
    ///
    /// let token = encode_role_token("SUPER_ADMIN", "x9");
    /// assert_eq!(SessionRole::from_token(&token), Ok(SessionRole::SuperAdmin));
    /// ```
    pub fn from_token(token: &str) -> Result<Self, ParseSessionRoleError> {
        decode_role_token(token).parse()
    }

    /// Whether this role is one of the moderation tiers.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }

    /// Whether this role may use `affordance`.
    ///
    /// Moderators manage every listing but keep no favorites. Sellers and
    /// employers manage their own kind. Every non-moderator may favorite.
    pub fn permits(self, affordance: Affordance) -> bool {
        match (self, affordance) {
            (Self::Admin | Self::SuperAdmin, Affordance::AdminDashboard) => true,
            (Self::Admin | Self::SuperAdmin, Affordance::ManageListings(_)) => true,
            (Self::Admin | Self::SuperAdmin, Affordance::Favorite(_)) => false,
            (Self::Seller, Affordance::ManageListings(kind)) => kind == FavoriteKind::House,
            (Self::Employer, Affordance::ManageListings(kind)) => kind == FavoriteKind::Job,
            (Self::Employee | Self::Buyer, Affordance::ManageListings(_)) => false,
            (
                Self::Employee | Self::Employer | Self::Buyer | Self::Seller,
                Affordance::AdminDashboard,
            ) => false,
            (
                Self::Employee | Self::Employer | Self::Buyer | Self::Seller,
                Affordance::Favorite(_),
            ) => true,
        }
    }
}

impl fmt::Display for SessionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a decoded role string names no known role.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown session role: {input}")]
pub struct ParseSessionRoleError {
    /// The unrecognised input value.
    pub input: String,
}

impl std::str::FromStr for SessionRole {
    type Err = ParseSessionRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "ADMIN" => Ok(Self::Admin),
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            "EMPLOYEE" => Ok(Self::Employee),
            "EMPLOYER" => Ok(Self::Employer),
            "BUYER" => Ok(Self::Buyer),
            "SELLER" => Ok(Self::Seller),
            _ => Err(ParseSessionRoleError {
                input: s.to_owned(),
            }),
        }
    }
}
