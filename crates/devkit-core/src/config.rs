use crate::error::{DevkitError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// RuntimeConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Argv prefix for the compose CLI, e.g. `["docker", "compose"]`.
    #[serde(default = "default_compose")]
    pub compose: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compose_file: Option<String>,
    /// Host executables that must be on PATH before `setup` does anything.
    #[serde(default = "default_prerequisites")]
    pub prerequisites: Vec<String>,
}

fn default_compose() -> Vec<String> {
    vec!["docker".to_string(), "compose".to_string()]
}

fn default_prerequisites() -> Vec<String> {
    vec!["git".to_string(), "docker".to_string()]
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            compose: default_compose(),
            compose_file: None,
            prerequisites: default_prerequisites(),
        }
    }
}

// ---------------------------------------------------------------------------
// EnvFileConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvFileConfig {
    #[serde(default = "default_env_path")]
    pub path: String,
    #[serde(default = "default_env_template")]
    pub template: String,
    /// Variable holding the application secret key.
    #[serde(default = "default_key_var")]
    pub key_var: String,
}

fn default_env_path() -> String {
    "backend/.env".to_string()
}

fn default_env_template() -> String {
    "backend/.env.example".to_string()
}

fn default_key_var() -> String {
    "APP_KEY".to_string()
}

impl Default for EnvFileConfig {
    fn default() -> Self {
        Self {
            path: default_env_path(),
            template: default_env_template(),
            key_var: default_key_var(),
        }
    }
}

// ---------------------------------------------------------------------------
// RoleConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Compose service name backing this role.
    pub service: String,
    #[serde(default = "default_shell")]
    pub shell: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test: Vec<String>,
    /// Installed dependency directory, relative to the root. Wiped by `clean` and `ci`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_dir: Option<String>,
}

fn default_shell() -> String {
    "sh".to_string()
}

fn default_roles() -> BTreeMap<String, RoleConfig> {
    let mut roles = BTreeMap::new();
    roles.insert(
        "backend".to_string(),
        RoleConfig {
            service: "backend".to_string(),
            shell: "bash".to_string(),
            user: Some("www-data".to_string()),
            test: argv(&["php", "artisan", "test"]),
            dependency_dir: Some("backend/vendor".to_string()),
        },
    );
    roles.insert(
        "frontend".to_string(),
        RoleConfig {
            service: "frontend".to_string(),
            shell: "sh".to_string(),
            user: None,
            test: argv(&["npm", "test"]),
            dependency_dir: Some("frontend/node_modules".to_string()),
        },
    );
    roles.insert(
        "tools".to_string(),
        RoleConfig {
            service: "tools".to_string(),
            shell: "sh".to_string(),
            user: None,
            test: Vec::new(),
            dependency_dir: Some("node_modules".to_string()),
        },
    );
    roles
}

// ---------------------------------------------------------------------------
// DatabaseConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_service")]
    pub service: String,
    #[serde(default = "default_username_env")]
    pub username_env: String,
    #[serde(default = "default_db_name")]
    pub default_username: String,
    #[serde(default = "default_database_env")]
    pub database_env: String,
    #[serde(default = "default_db_name")]
    pub default_database: String,
}

fn default_db_service() -> String {
    "db".to_string()
}

fn default_username_env() -> String {
    "DB_USERNAME".to_string()
}

fn default_database_env() -> String {
    "DB_DATABASE".to_string()
}

fn default_db_name() -> String {
    "laravel".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            service: default_db_service(),
            username_env: default_username_env(),
            default_username: default_db_name(),
            database_env: default_database_env(),
            default_database: default_db_name(),
        }
    }
}

impl DatabaseConfig {
    /// Username for the readiness check: environment first, then the default.
    pub fn username(&self) -> String {
        std::env::var(&self.username_env)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.default_username.clone())
    }

    pub fn database(&self) -> String {
        std::env::var(&self.database_env)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.default_database.clone())
    }
}

// ---------------------------------------------------------------------------
// ProbeConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Absent means retry until the operator interrupts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

fn default_interval_ms() -> u64 {
    2000
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: None,
        }
    }
}

impl ProbeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

// ---------------------------------------------------------------------------
// BootstrapConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipConfig {
    #[serde(default = "default_root_user")]
    pub user: String,
    #[serde(default = "default_chown")]
    pub command: Vec<String>,
}

fn default_root_user() -> String {
    "root".to_string()
}

fn default_chown() -> Vec<String> {
    argv(&[
        "chown",
        "-R",
        "www-data:www-data",
        "storage",
        "bootstrap/cache",
    ])
}

impl Default for OwnershipConfig {
    fn default() -> Self {
        Self {
            user: default_root_user(),
            command: default_chown(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default = "default_backend_role")]
    pub backend_role: String,
    #[serde(default = "default_frontend_role")]
    pub frontend_role: String,
    #[serde(default = "default_backend_install")]
    pub backend_install: Vec<String>,
    #[serde(default = "default_frontend_install")]
    pub frontend_install: Vec<String>,
    #[serde(default)]
    pub ownership: OwnershipConfig,
    #[serde(default = "default_key_generate")]
    pub key_generate: Vec<String>,
    #[serde(default = "default_migrate")]
    pub migrate: Vec<String>,
}

fn default_backend_role() -> String {
    "backend".to_string()
}

fn default_frontend_role() -> String {
    "frontend".to_string()
}

fn default_backend_install() -> Vec<String> {
    argv(&["composer", "install", "--no-interaction", "--prefer-dist"])
}

fn default_frontend_install() -> Vec<String> {
    argv(&["npm", "install"])
}

fn default_key_generate() -> Vec<String> {
    argv(&["php", "artisan", "key:generate", "--force"])
}

fn default_migrate() -> Vec<String> {
    argv(&["php", "artisan", "migrate", "--force"])
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            backend_role: default_backend_role(),
            frontend_role: default_frontend_role(),
            backend_install: default_backend_install(),
            frontend_install: default_frontend_install(),
            ownership: OwnershipConfig::default(),
            key_generate: default_key_generate(),
            migrate: default_migrate(),
        }
    }
}

// ---------------------------------------------------------------------------
// CiConfig / HookTestConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CiCheck {
    pub name: String,
    pub role: String,
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CiConfig {
    /// Wipe the dependency directory of every role that has a check before running them.
    #[serde(default = "default_true")]
    pub wipe: bool,
    #[serde(default = "default_ci_checks")]
    pub checks: Vec<CiCheck>,
}

fn default_true() -> bool {
    true
}

fn default_ci_checks() -> Vec<CiCheck> {
    let check = |name: &str, role: &str, command: &[&str]| CiCheck {
        name: name.to_string(),
        role: role.to_string(),
        command: argv(command),
    };
    vec![
        check("tools-install", "tools", &["npm", "ci"]),
        check(
            "composer-install",
            "backend",
            &["composer", "install", "--no-interaction"],
        ),
        check("pint", "backend", &["./vendor/bin/pint", "--test"]),
        check(
            "phpstan",
            "backend",
            &["./vendor/bin/phpstan", "analyse", "--no-progress"],
        ),
        check("npm-ci", "frontend", &["npm", "ci"]),
        check("eslint", "frontend", &["npm", "run", "lint"]),
        check("prettier", "frontend", &["npx", "prettier", "--check", "."]),
    ]
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            wipe: true,
            checks: default_ci_checks(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookTestConfig {
    /// File the hook test temporarily breaks, relative to the root.
    #[serde(default = "default_hook_file")]
    pub file: String,
    /// Badly formatted snippet appended to `file`.
    #[serde(default = "default_hook_inject")]
    pub inject: String,
    #[serde(default = "default_hook_command")]
    pub hook: Vec<String>,
}

fn default_hook_file() -> String {
    "frontend/src/app/page.tsx".to_string()
}

fn default_hook_inject() -> String {
    "\nconst   devkitHookProbe   =   {a:1,b:2}\n".to_string()
}

fn default_hook_command() -> Vec<String> {
    argv(&["sh", ".husky/pre-commit"])
}

impl Default for HookTestConfig {
    fn default() -> Self {
        Self {
            file: default_hook_file(),
            inject: default_hook_inject(),
            hook: default_hook_command(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "devkit".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub env_file: EnvFileConfig,
    #[serde(default = "default_directories")]
    pub directories: Vec<String>,
    #[serde(default = "default_roles")]
    pub roles: BTreeMap<String, RoleConfig>,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub ci: CiConfig,
    #[serde(default)]
    pub hook_test: HookTestConfig,
}

fn default_version() -> u32 {
    1
}

fn default_directories() -> Vec<String> {
    [
        "backend/storage/app/public",
        "backend/storage/framework/cache/data",
        "backend/storage/framework/sessions",
        "backend/storage/framework/testing",
        "backend/storage/framework/views",
        "backend/storage/logs",
        "backend/bootstrap/cache",
        "frontend/node_modules",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            project: ProjectConfig::default(),
            runtime: RuntimeConfig::default(),
            env_file: EnvFileConfig::default(),
            directories: default_directories(),
            roles: default_roles(),
            database: DatabaseConfig::default(),
            probe: ProbeConfig::default(),
            bootstrap: BootstrapConfig::default(),
            ci: CiConfig::default(),
            hook_test: HookTestConfig::default(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load `.devkit/config.yaml`, falling back to the built-in defaults when absent.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        if !paths::config_path(root).exists() {
            return Ok(Self::default());
        }
        Self::load(root)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn role(&self, name: &str) -> Result<&RoleConfig> {
        self.roles
            .get(name)
            .ok_or_else(|| DevkitError::UnknownRole(name.to_string()))
    }

    /// Fail with `InvalidConfig` if validation produced any error-level finding.
    pub fn ensure_valid(&self) -> Result<()> {
        let errors: Vec<String> = self
            .validate()
            .into_iter()
            .filter(|w| w.level == WarnLevel::Error)
            .map(|w| w.message)
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(DevkitError::InvalidConfig(errors.join("; ")))
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let error = |message: String| ConfigWarning {
            level: WarnLevel::Error,
            message,
        };

        if self.runtime.compose.is_empty() {
            warnings.push(error("runtime.compose must not be empty".to_string()));
        }

        for (name, role) in &self.roles {
            if paths::validate_role(name).is_err() {
                warnings.push(error(format!("invalid role name '{name}'")));
            }
            if role.service.trim().is_empty() {
                warnings.push(error(format!("role '{name}' has an empty service")));
            }
        }

        for role in [&self.bootstrap.backend_role, &self.bootstrap.frontend_role] {
            if !self.roles.contains_key(role) {
                warnings.push(error(format!("bootstrap references unknown role '{role}'")));
            }
        }

        let commands = [
            ("bootstrap.backend_install", &self.bootstrap.backend_install),
            ("bootstrap.frontend_install", &self.bootstrap.frontend_install),
            ("bootstrap.ownership.command", &self.bootstrap.ownership.command),
            ("bootstrap.key_generate", &self.bootstrap.key_generate),
            ("bootstrap.migrate", &self.bootstrap.migrate),
        ];
        for (field, command) in commands {
            if command.is_empty() {
                warnings.push(error(format!("{field} must not be empty")));
            }
        }

        for check in &self.ci.checks {
            if !self.roles.contains_key(&check.role) {
                warnings.push(error(format!(
                    "ci check '{}' references unknown role '{}'",
                    check.name, check.role
                )));
            }
            if check.command.is_empty() {
                warnings.push(error(format!("ci check '{}' has an empty command", check.name)));
            }
        }

        if self.hook_test.hook.is_empty() {
            warnings.push(error("hook_test.hook must not be empty".to_string()));
        }

        match self.probe.max_attempts {
            Some(0) => warnings.push(error("probe.max_attempts must be at least 1".to_string())),
            None if self.probe.interval_ms == 0 => warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "probe.interval_ms is 0 with no max_attempts: the readiness probe will spin"
                    .to_string(),
            }),
            _ => {}
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
