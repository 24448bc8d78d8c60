//! Connection descriptors used as the matching key for resource reuse

use std::fmt;

/// Identifies the target a pooled resource was opened against.
///
/// Two specs are equivalent when url, user and password all compare equal.
/// The pool stores its own clone per resource, so mutating or dropping the
/// caller's copy after `acquire` has no effect on matching.
///
/// # Examples
///
/// ```
/// use esox_connpool::ConnectionSpec;
///
/// let a = ConnectionSpec::new("jdbc:pg://db1", "app", "secret");
/// let b = ConnectionSpec::new("jdbc:pg://db1", "app", "secret");
/// let c = ConnectionSpec::new("jdbc:pg://db2", "app", "secret");
///
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConnectionSpec {
    url: String,
    user: String,
    password: String,
}

impl ConnectionSpec {
    /// Create a new connection spec
    pub fn new(
        url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            user: user.into(),
            password: password.into(),
        }
    }

    /// The target identifier (connection URL or endpoint)
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The principal to authenticate as
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The credential secret
    pub fn password(&self) -> &str {
        &self.password
    }
}

// The password must never end up in logs or panic messages.
impl fmt::Debug for ConnectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSpec")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalence_requires_all_three_fields() {
        let base = ConnectionSpec::new("db://host", "user", "pw");
        assert_eq!(base, ConnectionSpec::new("db://host", "user", "pw"));
        assert_ne!(base, ConnectionSpec::new("db://other", "user", "pw"));
        assert_ne!(base, ConnectionSpec::new("db://host", "admin", "pw"));
        assert_ne!(base, ConnectionSpec::new("db://host", "user", "pw2"));
    }

    #[test]
    fn debug_redacts_password() {
        let spec = ConnectionSpec::new("db://host", "user", "hunter2");
        let rendered = format!("{:?}", spec);
        assert!(rendered.contains("db://host"));
        assert!(!rendered.contains("hunter2"));
    }
}
