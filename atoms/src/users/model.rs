use serde::{Deserialize, Serialize};

/// Authenticated user as reported by the identity provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Stable subject id; reports store it as `owner_id`
    pub user_id: String,
    pub email: String,
}

impl Principal {
    /// Short label for headers: the part of the email before `@`.
    pub fn display_name(&self) -> &str {
        match self.email.split('@').next() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "User",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back() {
        let p = Principal { user_id: "1".into(), email: "ana@example.com".into() };
        assert_eq!(p.display_name(), "ana");
        let p = Principal { user_id: "2".into(), email: "".into() };
        assert_eq!(p.display_name(), "User");
    }
}
