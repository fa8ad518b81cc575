use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Claim name carrying the role tag inside the token payload.
pub const ROLE_CLAIM_TYPE: &str = "LoginCharacter";

pub const POLICY_LOGIN_USER: &str = "LoginUser";
pub const POLICY_GUEST_USER: &str = "GuestUser";

/// Role tag embedded in issued tokens.
///
/// The set is closed at the API boundary; the wire representation stays a
/// plain string so tokens remain readable by other JWT consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleClaim {
    #[serde(rename = "I_am_zhaokuo")]
    LoginUser,
    #[serde(rename = "I_am_guest")]
    GuestUser,
}

impl RoleClaim {
    pub const ALL: [RoleClaim; 2] = [RoleClaim::LoginUser, RoleClaim::GuestUser];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleClaim::LoginUser => "I_am_zhaokuo",
            RoleClaim::GuestUser => "I_am_guest",
        }
    }
}

impl fmt::Display for RoleClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRoleClaim(pub String);

impl fmt::Display for UnknownRoleClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role claim '{}'", self.0)
    }
}

impl std::error::Error for UnknownRoleClaim {}

impl FromStr for RoleClaim {
    type Err = UnknownRoleClaim;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleClaim::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRoleClaim(s.to_string()))
    }
}
