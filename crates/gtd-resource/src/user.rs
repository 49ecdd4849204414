//! Account registration and credential lookup.
//!
//! Passwords are stored as Argon2id PHC strings; the plaintext never reaches
//! the store.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use gtd_core::dto::UserDto;
use gtd_core::{Role, User};
use gtd_graph::Repository;

use crate::error::{ResourceError, Result};
use crate::validation::{Validate, Violation};

/// Role attached to every registered account.
pub const DEFAULT_ROLE: &str = "user";

pub struct UserService<U, R> {
    users: U,
    roles: R,
}

impl<U: Repository<User>, R: Repository<Role>> UserService<U, R> {
    pub fn new(users: U, roles: R) -> Self {
        Self { users, roles }
    }

    /// Validate, reject duplicates, hash the password, and persist the account.
    pub async fn register(&self, dto: UserDto) -> Result<User> {
        let mut violations = dto.violations();

        if let Some(name) = non_blank(&dto.user_name) {
            if self.find_by_user_name(name).await?.is_some() {
                violations.push(Violation::new(
                    "userName",
                    "User with given user name already exists.",
                ));
            }
        }
        if let Some(email) = non_blank(&dto.email) {
            if self.find_by_email(email).await?.is_some() {
                violations.push(Violation::new(
                    "email",
                    "User with given email already exists.",
                ));
            }
        }
        if !violations.is_empty() {
            return Err(ResourceError::ValidationFailed(violations));
        }

        let password = dto.password.as_deref().unwrap_or_default();
        let role = self.default_role().await?;
        let user = User {
            id: None,
            user_name: dto.user_name,
            password: Some(hash_password(password)?),
            email: dto.email,
            roles: vec![role],
        };

        let saved = self.users.save(user).await?;
        tracing::info!(user_name = ?saved.user_name, "User registered");
        Ok(saved)
    }

    pub async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>> {
        Ok(self.users.find_by_property("userName", user_name).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.find_by_property("email", email).await?)
    }

    pub async fn find_by_user_name_or_email(&self, value: &str) -> Result<Option<User>> {
        match self.find_by_user_name(value).await? {
            Some(user) => Ok(Some(user)),
            None => self.find_by_email(value).await,
        }
    }

    /// The account matching `login` (user name or email) if `password` is correct.
    pub async fn verify_password(&self, login: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.find_by_user_name_or_email(login).await? else {
            return Ok(None);
        };
        let Some(hash) = user.password.as_deref() else {
            return Ok(None);
        };

        if verify_hash(password, hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    async fn default_role(&self) -> Result<Role> {
        match self.roles.find_by_property("name", DEFAULT_ROLE).await? {
            Some(role) => Ok(role),
            None => Ok(self.roles.save(Role::named(DEFAULT_ROLE)).await?),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ResourceError::PasswordHash(format!("Failed to hash password: {e}")))
}

fn verify_hash(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ResourceError::PasswordHash(format!("Invalid password hash format: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtd_graph::{GraphRepository, MemoryStore};

    type Users =
        UserService<GraphRepository<User, MemoryStore>, GraphRepository<Role, MemoryStore>>;

    fn service() -> Users {
        let store = MemoryStore::new();
        UserService::new(GraphRepository::new(store.clone()), GraphRepository::new(store))
    }

    fn dto(name: &str, email: &str) -> UserDto {
        UserDto::new(name, "Password123!", "Password123!", email)
    }

    #[tokio::test]
    async fn register_hashes_password_and_attaches_role() {
        let users = service();
        let user = users
            .register(dto("testuser", "testuser123@email.com"))
            .await
            .unwrap();

        let hash = user.password.as_deref().unwrap();
        assert!(hash.starts_with("$argon2"));
        assert_ne!(hash, "Password123!");
        assert_eq!(user.roles.len(), 1);
        assert_eq!(user.roles[0].name.as_deref(), Some(DEFAULT_ROLE));
    }

    #[tokio::test]
    async fn second_registration_reuses_role() {
        let users = service();
        let a = users.register(dto("a", "a@email.com")).await.unwrap();
        let b = users.register(dto("b", "b@email.com")).await.unwrap();
        assert_eq!(a.roles[0].id, b.roles[0].id);
    }

    #[tokio::test]
    async fn duplicates_are_rejected() {
        let users = service();
        users.register(dto("testuser", "t@email.com")).await.unwrap();

        let err = users
            .register(dto("testuser", "t@email.com"))
            .await
            .unwrap_err();
        assert_eq!(
            err.messages(),
            vec![
                "User with given user name already exists.",
                "User with given email already exists."
            ]
        );
    }

    #[tokio::test]
    async fn invalid_form_is_rejected_before_lookup() {
        let users = service();
        let err = users
            .register(UserDto::new("x", "a", "b", "x@email.com"))
            .await
            .unwrap_err();
        assert_eq!(err.messages(), vec!["Passwords don't match."]);
    }

    #[tokio::test]
    async fn lookup_by_name_or_email() {
        let users = service();
        let saved = users.register(dto("testuser", "t@email.com")).await.unwrap();

        let by_name = users.find_by_user_name_or_email("testuser").await.unwrap();
        let by_email = users.find_by_user_name_or_email("t@email.com").await.unwrap();
        assert_eq!(by_name.unwrap().id, saved.id);
        assert_eq!(by_email.unwrap().id, saved.id);
        assert!(users.find_by_user_name_or_email("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn verify_password_checks_hash() {
        let users = service();
        users.register(dto("testuser", "t@email.com")).await.unwrap();

        assert!(users
            .verify_password("testuser", "Password123!")
            .await
            .unwrap()
            .is_some());
        assert!(users
            .verify_password("t@email.com", "wrong")
            .await
            .unwrap()
            .is_none());
    }
}
