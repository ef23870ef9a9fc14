use std::collections::HashMap;

/// Roles a principal can hold. Only `CardOwner` grants access to the
/// cash card endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    CardOwner,
    NonOwner,
}

/// The authenticated caller: identity plus granted roles. Resolved fresh on
/// every request, never persisted.
#[derive(Debug, Clone)]
pub struct Principal {
    pub username: String,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Pluggable credential lookup plus one-way password verification.
///
/// Returns the principal only when the username exists and the password
/// matches its stored hash; unknown user and wrong password are
/// indistinguishable to the caller.
pub trait CredentialStore: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> Option<Principal>;
}

struct UserEntry {
    password_hash: String,
    roles: Vec<Role>,
}

/// In-memory credential directory. Passwords are bcrypt-hashed at insert
/// time; plaintext is never retained.
#[derive(Default)]
pub struct InMemoryUsers {
    users: HashMap<String, UserEntry>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        username: &str,
        password: &str,
        roles: Vec<Role>,
        cost: u32,
    ) -> Result<(), bcrypt::BcryptError> {
        let password_hash = bcrypt::hash(password, cost)?;
        self.users.insert(username.to_string(), UserEntry { password_hash, roles });
        Ok(())
    }

    /// The fixed test user set: two card owners and one authenticated user
    /// who never gets resource access.
    pub fn fixture(cost: u32) -> Result<Self, bcrypt::BcryptError> {
        let mut users = Self::new();
        users.add("sarah1", "abc123", vec![Role::CardOwner], cost)?;
        users.add("hank-owns-no-cards", "qrs456", vec![Role::NonOwner], cost)?;
        users.add("kumar2", "xyz789", vec![Role::CardOwner], cost)?;
        Ok(users)
    }
}

impl CredentialStore for InMemoryUsers {
    fn authenticate(&self, username: &str, password: &str) -> Option<Principal> {
        let entry = self.users.get(username)?;

        match bcrypt::verify(password, &entry.password_hash) {
            Ok(true) => Some(Principal {
                username: username.to_string(),
                roles: entry.roles.clone(),
            }),
            Ok(false) => None,
            Err(e) => {
                tracing::error!("password verification failed for '{}': {}", username, e);
                None
            }
        }
    }
}
