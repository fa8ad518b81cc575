pub mod claims;
pub mod config;
pub mod error;
pub mod extractors;
pub mod guards;
pub mod issuer;
pub mod roles;
pub mod validator;

pub use claims::Claims;
pub use config::{
    JtiGenerator, SigningKey, TokenPolicy, TokenPolicyBuilder, UuidJtiGenerator,
    DEFAULT_VALID_FOR_SECONDS, MAX_VALID_FOR_SECONDS,
};
pub use error::{AuthError, AuthResult};
pub use extractors::{parse_bearer, AuthContext};
pub use guards::{authorize, AuthorizationGate, AuthorizationPolicy, Decision, GuardError};
pub use issuer::{IssuedToken, TokenIssuer};
pub use roles::{RoleClaim, POLICY_GUEST_USER, POLICY_LOGIN_USER, ROLE_CLAIM_TYPE};
pub use validator::TokenValidator;
