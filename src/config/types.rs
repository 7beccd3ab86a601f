//! Settings types
//!
//! Everything has a default matching the conventional two-tier project
//! layout, so the settings file is entirely optional.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Project settings loaded from `apptask.yml`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Project name shown in help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Frontend application directory (assets live at `<dir>/web/assets`)
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: String,

    /// Backend application directory
    #[serde(default = "default_backend_dir")]
    pub backend_dir: String,

    /// Documentation sources
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,

    /// Generated documentation output directory
    #[serde(default = "default_docs_output_dir")]
    pub docs_output_dir: String,

    /// Test suites, each with a test-runner config under `test_config_root`
    #[serde(default = "default_suites")]
    pub suites: Vec<String>,

    /// Application console tool argv prefix (migrations, cache, user ops)
    #[serde(default = "default_console")]
    pub console: Vec<String>,

    /// Dependency installer argv prefix
    #[serde(default = "default_package_manager")]
    pub package_manager: Vec<String>,

    /// Ephemeral web server argv, launched detached for test runs
    #[serde(default = "default_server")]
    pub server: Vec<String>,

    /// Test runner argv prefix
    #[serde(default = "default_test_runner")]
    pub test_runner: Vec<String>,

    /// Directory holding per-suite test-runner configs
    #[serde(default = "default_test_config_root")]
    pub test_config_root: String,

    /// Virtual-host helper program, resolved on PATH
    #[serde(default = "default_vhost_helper")]
    pub vhost_helper: String,

    /// Username of the application admin account
    #[serde(default = "default_admin_username")]
    pub admin_username: String,

    /// Optional timeout applied to every blocking shell step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_timeout_secs: Option<u64>,
}

/// Environment variable holding the default admin e-mail
pub const ADMIN_EMAIL_ENV: &str = "APP_ADMIN_EMAIL";

/// Environment variable holding the default admin password
pub const ADMIN_PASSWORD_ENV: &str = "APP_ADMIN_PASSWORD";

impl Settings {
    /// Published-asset directory for an application area
    pub fn assets_dir(&self, area: &str) -> String {
        format!("{}/web/assets", self.area_dir(area))
    }

    /// Web root for an application area, handed to the vhost helper
    pub fn web_dir(&self, area: &str) -> String {
        format!("{}/web", self.area_dir(area))
    }

    fn area_dir(&self, area: &str) -> &str {
        if area == "backend" {
            &self.backend_dir
        } else {
            &self.frontend_dir
        }
    }

    /// Per-suite test-runner config path
    pub fn suite_config(&self, suite: &str) -> String {
        format!("{}/{}", self.test_config_root, suite)
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            name: None,
            frontend_dir: default_frontend_dir(),
            backend_dir: default_backend_dir(),
            docs_dir: default_docs_dir(),
            docs_output_dir: default_docs_output_dir(),
            suites: default_suites(),
            console: default_console(),
            package_manager: default_package_manager(),
            server: default_server(),
            test_runner: default_test_runner(),
            test_config_root: default_test_config_root(),
            vhost_helper: default_vhost_helper(),
            admin_username: default_admin_username(),
            step_timeout_secs: None,
        }
    }
}

fn default_frontend_dir() -> String {
    "frontend".to_string()
}

fn default_backend_dir() -> String {
    "backend".to_string()
}

fn default_docs_dir() -> String {
    "docs".to_string()
}

fn default_docs_output_dir() -> String {
    "docs-html".to_string()
}

fn default_suites() -> Vec<String> {
    ["backend", "frontend", "common", "console"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_console() -> Vec<String> {
    vec!["./yii".to_string()]
}

fn default_package_manager() -> Vec<String> {
    vec!["composer".to_string()]
}

fn default_server() -> Vec<String> {
    vec![
        "php".to_string(),
        "-S".to_string(),
        "localhost:8042".to_string(),
    ]
}

fn default_test_runner() -> Vec<String> {
    vec!["codecept".to_string()]
}

fn default_test_config_root() -> String {
    "tests/codeception".to_string()
}

fn default_vhost_helper() -> String {
    "virtualhost.sh".to_string()
}

fn default_admin_username() -> String {
    "admin".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.frontend_dir, "frontend");
        assert_eq!(settings.suites.len(), 4);
        assert_eq!(settings.admin_username, "admin");
        assert!(settings.step_timeout().is_none());
    }

    #[test]
    fn test_area_paths() {
        let settings = Settings::default();
        assert_eq!(settings.assets_dir("frontend"), "frontend/web/assets");
        assert_eq!(settings.assets_dir("backend"), "backend/web/assets");
        assert_eq!(settings.web_dir("backend"), "backend/web");
    }

    #[test]
    fn test_deserialize_partial_settings() {
        let yaml = r#"
name: my-app
suites:
  - api
console:
  - php
  - yii
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.name, Some("my-app".to_string()));
        assert_eq!(settings.suites, vec!["api"]);
        assert_eq!(settings.console, vec!["php", "yii"]);
        // Unspecified fields keep their defaults
        assert_eq!(settings.backend_dir, "backend");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let yaml = "unknown_key: 1\n";
        assert!(serde_yaml::from_str::<Settings>(yaml).is_err());
    }
}
