/// One row of the `users` table. The password is kept verbatim.
#[derive(Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserCredential {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Durable username -> password mapping with a uniqueness constraint on the username.
///
/// Credential outcomes are booleans. `Err` is reserved for storage faults.
pub trait CredentialRepository {
    /// Ensure the backing table exists. Safe to call on every start.
    fn initialize(&self) -> impl Future<Output = anyhow::Result<()>>;

    /// Insert a new credential. `Ok(false)` when the username is already taken.
    fn create(&self, username: &str, password: &str) -> impl Future<Output = anyhow::Result<bool>>;

    /// `Ok(true)` iff a row matches both fields exactly. Unknown users and wrong
    /// passwords are indistinguishable.
    fn verify(&self, username: &str, password: &str) -> impl Future<Output = anyhow::Result<bool>>;
}
