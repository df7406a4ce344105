use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::models::AuthStrategy;
use crate::session::MAX_SESSION_DURATION_HOURS;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GatehouseSettings {
    pub application: ApplicationSettings,
    pub paths: PathSettings,
    pub auth: AuthSettings,
    pub session: SessionSettings,
    pub cookies: CookieSettings,
    pub supabase: SupabaseSettings,
    pub validation: ValidationSettings,
    pub http: HttpSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Public origin of the dashboard, used when printing callback URLs
    pub base_url: String,
    pub cors_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Where a PKCE callback lands when no `next` is given
    pub home: String,
    /// Where the implicit flow and the guest guard land by default
    pub dashboard_overview: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// The single strategy this deployment runs with
    pub strategy: AuthStrategy,
    /// Where a request for another strategy's route is sent. `None` answers 404.
    pub strategy_mismatch_redirect: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub session_duration_hours: u64,
    pub session_secret: String,
    /// Cookie holding the PKCE code verifier written by the browser client at sign-in
    pub code_verifier_cookie: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SupabaseSettings {
    pub url: String,

    // Direct value (can be overridden by environment variable)
    pub anon_key: Option<String>,
    // Environment variable name for override
    pub anon_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Base URL of the registration API exposing `/register/validate-email/{email}`
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HttpSettings {
    /// Outbound request timeout. Unset keeps the HTTP client's own default.
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            cors_origins: "http://localhost:3000,http://localhost:8080".to_string(),
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            home: "/".to_string(),
            dashboard_overview: "/dashboard".to_string(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            strategy: AuthStrategy::Supabase,
            strategy_mismatch_redirect: None,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_duration_hours: 24,
            session_secret: String::new(), // Will be generated if empty
            code_verifier_cookie: "sb-auth-token-code-verifier".to_string(),
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true, // Default to secure cookies
        }
    }
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:4000/api".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl GatehouseSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Logger initialization fails
    /// - Settings file cannot be read or parsed
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::initialize_environment()?;

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Ok(settings)
    }

    /// Load `.env` and initialize the logger
    ///
    /// # Errors
    ///
    /// Returns an error if logger initialization fails
    fn initialize_environment() -> Result<(), Box<dyn std::error::Error>> {
        Self::load_env_file();
        env_logger::try_init()?;
        Ok(())
    }

    /// Load base settings from TOML file(s) or use defaults
    ///
    /// Priority, highest first:
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `GATEHOUSE_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_file(&default_config_path)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var("GATEHOUSE_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_file(&secrets_path)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ GATEHOUSE_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid settings TOML
    pub fn from_file(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let toml_content = fs::read_to_string(path)?;
        Ok(basic_toml::from_str(&toml_content)?)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_auth_env_overrides(&mut settings.auth);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_cookie_env_overrides(&mut settings.cookies);
        Self::apply_supabase_env_overrides(&mut settings.supabase);
        Self::apply_validation_env_overrides(&mut settings.validation);
        Self::apply_http_env_overrides(&mut settings.http);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(base_url) = std::env::var("BASE_URL") {
            app_settings.base_url = base_url;
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
    }

    /// Apply environment overrides for the strategy selection
    pub fn apply_auth_env_overrides(auth_settings: &mut AuthSettings) {
        if let Ok(strategy_str) = std::env::var("AUTH_STRATEGY") {
            match strategy_str.parse::<AuthStrategy>() {
                Ok(strategy) => auth_settings.strategy = strategy,
                Err(e) => log::warn!("Ignoring AUTH_STRATEGY override: {e}"),
            }
        }
        if let Ok(redirect) = std::env::var("STRATEGY_MISMATCH_REDIRECT") {
            auth_settings.strategy_mismatch_redirect = Some(redirect).filter(|r| !r.is_empty());
        }
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Ok(value_str) = std::env::var("SESSION_DURATION_HOURS") {
            match value_str.parse::<u64>() {
                Ok(value) if (1..=MAX_SESSION_DURATION_HOURS).contains(&value) => {
                    session_settings.session_duration_hours = value;
                }
                _ => log::warn!(
                    "Ignoring SESSION_DURATION_HOURS={value_str}, expected 1 to {MAX_SESSION_DURATION_HOURS}"
                ),
            }
        }

        Self::handle_session_secret_override(session_settings);
    }

    /// Take `SESSION_SECRET` from the environment, or generate one when nothing is configured
    fn handle_session_secret_override(session_settings: &mut SessionSettings) {
        let env_secret_set = std::env::var("SESSION_SECRET").is_ok_and(|secret| {
            if secret.is_empty() {
                false
            } else {
                session_settings.session_secret = secret;
                true
            }
        });

        if !env_secret_set && session_settings.session_secret.is_empty() {
            session_settings.session_secret = Self::generate_random_session_secret();
            Self::warn_about_generated_secret();
        }
    }

    /// 32 bytes of OS randomness, base64 encoded
    fn generate_random_session_secret() -> String {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        general_purpose::STANDARD.encode(secret)
    }

    fn warn_about_generated_secret() {
        eprintln!("⚠️  WARNING: Using auto-generated session secret");
        eprintln!("🔒 For production use, set the SESSION_SECRET environment variable");
        eprintln!("   or configure session_secret in Settings.toml");
        eprintln!("💡 Sessions will not survive a restart unless the secret is configured");
    }

    fn apply_cookie_env_overrides(cookie_settings: &mut CookieSettings) {
        if let Ok(cookie_secure_str) = std::env::var("COOKIE_SECURE") {
            if let Ok(cookie_secure) = cookie_secure_str.parse::<bool>() {
                cookie_settings.secure = cookie_secure;
            }
        }
    }

    fn apply_supabase_env_overrides(supabase_settings: &mut SupabaseSettings) {
        if let Ok(url) = std::env::var("SUPABASE_URL") {
            supabase_settings.url = url;
        }
        if let Ok(anon_key) = std::env::var("SUPABASE_ANON_KEY") {
            supabase_settings.anon_key = Some(anon_key);
        }
    }

    fn apply_validation_env_overrides(validation_settings: &mut ValidationSettings) {
        if let Ok(api_base) = std::env::var("API_BASE_URL") {
            validation_settings.api_base = api_base;
        }
    }

    fn apply_http_env_overrides(http_settings: &mut HttpSettings) {
        if let Ok(timeout_str) = std::env::var("HTTP_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout_str.parse::<u64>() {
                http_settings.timeout_seconds = Some(timeout).filter(|t| *t > 0);
            }
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// The outbound request timeout, if one is configured
    #[must_use]
    pub fn http_timeout(&self) -> Option<std::time::Duration> {
        self.http.timeout_seconds.map(std::time::Duration::from_secs)
    }
}

impl SupabaseSettings {
    /// Get the anon key, checking the environment variable first, then the direct value
    #[must_use]
    pub fn get_anon_key(&self) -> Option<String> {
        if let Some(env_var) = &self.anon_key_env {
            if let Ok(value) = std::env::var(env_var) {
                return Some(value);
            }
        }
        self.anon_key.clone()
    }
}
