//! Hierarchical document addresses in the remote store.

use crate::core::{AppError, AppResult};
use std::fmt;

pub const MASTER_COLLECTION: &str = "master_lists";
pub const USERS_COLLECTION: &str = "users";
pub const PROJECTS_COLLECTION: &str = "projects";
pub const LISTS_SUBCOLLECTION: &str = "lists";

/// Ordered segment tuple identifying a document location, e.g.
/// `users/u1/lists/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Builds a path from raw segments, rejecting empty or malformed ones.
    pub fn new<I, S>(segments: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(AppError::validation(
                "Key path must have at least one segment",
                "KeyPath::new",
                None,
            ));
        }
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(Self { segments })
    }

    /// Master/template location for a list kind.
    pub fn master_list(list_type: &str) -> AppResult<Self> {
        Self::new([MASTER_COLLECTION, list_type])
    }

    /// Per-user location for a list kind.
    pub fn user_list(user_id: &str, list_type: &str) -> AppResult<Self> {
        Self::new([USERS_COLLECTION, user_id, LISTS_SUBCOLLECTION, list_type])
    }

    /// Per-project location for a list kind.
    pub fn project_list(project_id: &str, list_type: &str) -> AppResult<Self> {
        Self::new([PROJECTS_COLLECTION, project_id, LISTS_SUBCOLLECTION, list_type])
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Canonical `a/b/c` form, also used as the storage key by in-memory
    /// bindings.
    pub fn joined(&self) -> String {
        self.segments.join("/")
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

fn validate_segment(segment: &str) -> AppResult<()> {
    if segment.is_empty() {
        return Err(AppError::validation(
            "Key path segment must not be empty",
            "KeyPath::new",
            None,
        ));
    }
    if segment.contains('/') || segment.chars().any(char::is_whitespace) {
        return Err(AppError::validation(
            format!("Key path segment '{}' contains '/' or whitespace", segment),
            "KeyPath::new",
            None,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_scope_paths() {
        assert_eq!(
            KeyPath::master_list("tasks").unwrap().joined(),
            "master_lists/tasks"
        );
        assert_eq!(
            KeyPath::user_list("u1", "kit").unwrap().joined(),
            "users/u1/lists/kit"
        );
        assert_eq!(
            KeyPath::project_list("p9", "shots").unwrap().joined(),
            "projects/p9/lists/shots"
        );
    }

    #[test]
    fn rejects_malformed_segments() {
        assert!(KeyPath::new(Vec::<String>::new()).is_err());
        assert!(KeyPath::new(["users", ""]).is_err());
        assert!(KeyPath::new(["users", "a/b"]).is_err());
        assert!(KeyPath::new(["users", "a b"]).is_err());
    }

    #[test]
    fn display_matches_joined() {
        let path = KeyPath::new(["users", "u1"]).unwrap();
        assert_eq!(path.to_string(), path.joined());
    }
}
