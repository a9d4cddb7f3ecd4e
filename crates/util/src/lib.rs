pub mod config;

use std::{env, path::PathBuf};

pub use config::{AppConfig, ConfigError, Environment};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://reserve.db";
pub const DEFAULT_EXPORT_DIR: &str = ".";

/// Loads environment variables from `.env` when available.
///
/// Missing files are ignored so the function is safe in production builds
/// where dotenv files are not deployed.
pub fn load_env_file() {
    let _ = dotenvy::dotenv();
}

/// Returns the SQLite connection string for the customer register.
///
/// The value is resolved from the `DATABASE_URL` environment variable and
/// falls back to [`DEFAULT_DATABASE_URL`] when the variable is not set.
pub fn database_url() -> String {
    env::var("DATABASE_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Returns the directory CSV exports are written to unless overridden per command.
pub fn export_dir() -> PathBuf {
    env::var_os("RESERVE_EXPORT_DIR")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_DIR))
}


#[cfg(test)]
mod tests {
    use super::test_support::ENV_GUARD;
    use super::*;

    #[test]
    fn returns_default_database_url_when_env_missing() {
        let _lock = ENV_GUARD.lock().expect("env guard poisoned");
        env::remove_var("DATABASE_URL");
        assert_eq!(database_url(), DEFAULT_DATABASE_URL);
    }

    #[test]
    fn blank_database_url_falls_back_to_default() {
        let _lock = ENV_GUARD.lock().expect("env guard poisoned");
        env::set_var("DATABASE_URL", "  ");
        assert_eq!(database_url(), DEFAULT_DATABASE_URL);
        env::remove_var("DATABASE_URL");
    }

    #[test]
    fn reads_custom_export_dir_from_env() {
        let _lock = ENV_GUARD.lock().expect("env guard poisoned");
        env::set_var("RESERVE_EXPORT_DIR", "/tmp/exports");
        assert_eq!(export_dir(), PathBuf::from("/tmp/exports"));
        env::remove_var("RESERVE_EXPORT_DIR");
        assert_eq!(export_dir(), PathBuf::from(DEFAULT_EXPORT_DIR));
    }
}
