use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zeroize::Zeroizing;

/// The credential pair issued by the subscription service for registry pulls.
#[derive(Debug, Clone)]
pub struct RegistryCredentials {
    pub login: String,
    pub password: Zeroizing<String>,
}

impl RegistryCredentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Encoded secret material in the container-engine store representation:
    /// base64 of `login:password`.
    pub fn auth_token(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.login, self.password.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_token_encoding() {
        let creds = RegistryCredentials::new("REG_user", "s3cret");
        assert_eq!(creds.auth_token(), STANDARD.encode("REG_user:s3cret"));
    }

    #[test]
    fn test_auth_token_stable() {
        let creds = RegistryCredentials::new("a", "b");
        assert_eq!(creds.auth_token(), creds.auth_token());
    }
}
