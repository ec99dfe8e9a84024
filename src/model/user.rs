// User document stored in the object store under `user:<id>`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
    /// Ids of the groups the user belongs to.
    #[serde(default)]
    pub groups: Vec<String>,
}

impl User {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        User {
            id: id.into(),
            display_name: display_name.into(),
            groups: Vec::new(),
        }
    }

    /// Record group membership. Idempotent.
    pub fn join(&mut self, group_id: &str) {
        if !self.groups.iter().any(|g| g == group_id) {
            self.groups.push(group_id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_is_idempotent() {
        let mut u = User::new("u1", "Alice");
        u.join("g1");
        u.join("g1");
        u.join("g2");
        assert_eq!(u.groups, vec!["g1", "g2"]);
    }
}
