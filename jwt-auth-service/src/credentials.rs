use async_trait::async_trait;
use common_auth::RoleClaim;

/// Username/password pair; lives only for the duration of a login call.
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Maps credentials to the role claim they earn. `None` means no match and
/// is reported to callers as a generic authentication failure.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, credential: &Credential) -> Option<RoleClaim>;
}

struct Account {
    username: &'static str,
    password: &'static str,
    role: RoleClaim,
}

const DEMO_ACCOUNTS: &[Account] = &[
    Account {
        username: "zhaokuo",
        password: "zhaokuo12345",
        role: RoleClaim::LoginUser,
    },
    Account {
        username: "guest",
        password: "guest",
        role: RoleClaim::GuestUser,
    },
];

/// Fixed two-account table used by the demo.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticCredentialVerifier;

#[async_trait]
impl CredentialVerifier for StaticCredentialVerifier {
    async fn verify(&self, credential: &Credential) -> Option<RoleClaim> {
        DEMO_ACCOUNTS
            .iter()
            .find(|account| {
                account.username == credential.username && account.password == credential.password
            })
            .map(|account| account.role)
    }
}
