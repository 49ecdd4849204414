//! Options for one seeding run.

use std::path::PathBuf;

use gtd_core::config::SeedSettings;
use gtd_core::dto::UserDto;

/// Resolved seeding options: `[seed]` settings plus CLI overrides.
#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub enabled: bool,

    /// JSON array of GTD rows.
    pub data_file: PathBuf,

    /// Seed even when the store already holds Targets.
    pub force: bool,

    pub user_name: String,
    pub user_password: String,
    pub user_email: String,
}

impl SeedOptions {
    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = path.into();
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Registration form for the first-boot account.
    pub fn account(&self) -> UserDto {
        UserDto::new(
            &self.user_name,
            &self.user_password,
            &self.user_password,
            &self.user_email,
        )
    }
}

impl From<&SeedSettings> for SeedOptions {
    fn from(settings: &SeedSettings) -> Self {
        Self {
            enabled: settings.enabled,
            data_file: PathBuf::from(&settings.data_file),
            force: false,
            user_name: settings.user_name.clone(),
            user_password: settings.user_password.clone(),
            user_email: settings.user_email.clone(),
        }
    }
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self::from(&SeedSettings::default())
    }
}
