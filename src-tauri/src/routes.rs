use serde::{Deserialize, Serialize};

use crate::models::User;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    Landing,
    Auth,
    Workspace,
    NotFound,
}

impl Route {
    /// Maps a path to the page that should render. `/workspace` falls back
    /// to the sign-in page when nobody is signed in.
    pub fn resolve(path: &str, current_user: Option<&User>) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        match path {
            "/" => Self::Landing,
            "/auth" => Self::Auth,
            "/workspace" if current_user.is_some() => Self::Workspace,
            "/workspace" => Self::Auth,
            _ => Self::NotFound,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::Auth => "/auth",
            Self::Workspace => "/workspace",
            Self::NotFound => "/not-found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            name: "Ada".into(),
        }
    }

    #[test]
    fn workspace_is_guarded() {
        assert_eq!(Route::resolve("/workspace", None), Route::Auth);
        assert_eq!(Route::resolve("/workspace", Some(&user())), Route::Workspace);
        assert_eq!(Route::resolve("/workspace/?tab=history", Some(&user())), Route::Workspace);
    }

    #[test]
    fn public_and_unknown_paths() {
        assert_eq!(Route::resolve("/", None), Route::Landing);
        assert_eq!(Route::resolve("", None), Route::Landing);
        assert_eq!(Route::resolve("/auth", None), Route::Auth);
        assert_eq!(Route::resolve("/not-found", None), Route::NotFound);
        assert_eq!(Route::resolve("/admin", Some(&user())), Route::NotFound);
        assert_eq!(Route::NotFound.path(), "/not-found");
    }
}
