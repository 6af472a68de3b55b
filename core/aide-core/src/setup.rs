//! Installation and setup checks for aide.
//!
//! This module handles:
//! - Scaffolding the assistant directory tree
//! - Registering the session-lifecycle hook in the host's settings
//! - Writing the environment file and the guarded shell-profile block
//! - Checking dependencies and overall install health
//!
//! ## Design
//!
//! The installer reads the host's `settings.json` but only adds our hook
//! entry, never removing or changing other settings (unknown keys ride
//! through serde `flatten` maps untouched). Writes are atomic (temp +
//! rename) to avoid corrupting settings. Corrupt JSON is refused, not
//! clobbered.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::error::{AideError, Result};
use crate::storage::{write_atomic, StorageConfig};

const HOOK_COMMAND: &str = "$HOME/.local/bin/aide-hook handle";

/// Hook registrations: (event_name, needs_matcher).
/// SessionEnd stays synchronous so state cleanup completes before the
/// host's shutdown finishes.
const AIDE_HOOK_EVENTS: [(&str, bool); 1] = [("SessionEnd", false)];

/// Marker guarding the shell-profile block against duplicate appends.
const PROFILE_MARKER: &str = "# aide configuration";

/// Directories scaffolded under the assistant root.
const SCAFFOLD_DIRS: [&str; 10] = [
    "MEMORY/STATE",
    "MEMORY/WORK",
    "skills/CORE/workflows",
    "history/sessions",
    "history/learnings",
    "history/research",
    "history/decisions",
    "hooks",
    "tools",
    "logs",
];

/// Answers normally gathered by a wizard; supplied via CLI flags here.
#[derive(Debug, Clone)]
pub struct WizardAnswers {
    pub assistant_name: String,
    pub timezone: String,
}

#[derive(Debug, Clone)]
pub struct DependencyStatus {
    pub name: String,
    pub required: bool,
    pub found: bool,
    pub path: Option<String>,
    pub install_hint: Option<String>,
}

#[derive(Debug, Clone)]
pub enum HookStatus {
    NotInstalled,
    Installed,
    PolicyBlocked { reason: String },
}

#[derive(Debug, Clone)]
pub struct SetupStatus {
    pub dependencies: Vec<DependencyStatus>,
    pub hooks: HookStatus,
    pub storage_ready: bool,
    pub all_ready: bool,
    pub blocking_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InstallResult {
    pub success: bool,
    pub message: String,
}

pub struct Installer {
    storage: StorageConfig,
}

impl Installer {
    pub fn new(storage: StorageConfig) -> Self {
        Self { storage }
    }

    /// Creates the assistant directory tree. Idempotent.
    pub fn scaffold(&self) -> Result<()> {
        for dir in SCAFFOLD_DIRS {
            let path = self.storage.root().join(dir);
            fs::create_dir_all(&path).map_err(|e| AideError::Io {
                context: format!("create {}", path.display()),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Registers the aide hook entries in the host's settings file,
    /// preserving everything else in it.
    pub fn register_hooks(&self) -> Result<InstallResult> {
        if let Some(reason) = self.check_policy_blocks() {
            return Ok(InstallResult {
                success: false,
                message: format!("Cannot install hooks: {reason}"),
            });
        }

        let settings_path = self.storage.settings_file();
        let mut settings = self.load_settings(&settings_path)?;

        let hooks = settings.hooks.get_or_insert_with(HashMap::new);

        for (event, needs_matcher) in AIDE_HOOK_EVENTS {
            let event_hooks = hooks.entry(event.to_string()).or_default();

            // Normalize any existing aide entries, then check whether one
            // already covers this event.
            let mut already_registered = false;
            for hook_config in event_hooks.iter_mut() {
                if normalize_aide_hook_config(hook_config, needs_matcher) {
                    already_registered = true;
                }
            }

            if !already_registered {
                event_hooks.push(HookConfig {
                    matcher: needs_matcher.then(|| "*".to_string()),
                    hooks: Some(vec![InnerHook {
                        hook_type: Some("command".to_string()),
                        command: Some(HOOK_COMMAND.to_string()),
                        other: HashMap::new(),
                    }]),
                    other: HashMap::new(),
                });
            }
        }

        self.save_settings(&settings_path, &settings)?;

        Ok(InstallResult {
            success: true,
            message: "Hooks configured successfully".to_string(),
        })
    }

    /// Writes the `.env` file and mirrors its values into the settings
    /// `env` map so the host sees them without shell sourcing.
    pub fn write_env(&self, answers: &WizardAnswers) -> Result<()> {
        let env_path = self.storage.env_file();
        let content = format!(
            "# aide environment configuration\nAIDE_NAME={}\nAIDE_TIME_ZONE={}\n",
            answers.assistant_name, answers.timezone
        );
        write_atomic(&env_path, &content).map_err(|e| AideError::Io {
            context: format!("write {}", env_path.display()),
            source: e,
        })?;

        let settings_path = self.storage.settings_file();
        let mut settings = self.load_settings(&settings_path)?;
        let env = settings.env.get_or_insert_with(HashMap::new);
        env.insert(
            "AIDE_NAME".to_string(),
            serde_json::Value::String(answers.assistant_name.clone()),
        );
        env.insert(
            "AIDE_TIME_ZONE".to_string(),
            serde_json::Value::String(answers.timezone.clone()),
        );
        self.save_settings(&settings_path, &settings)
    }

    /// Appends the export block to a shell profile unless the marker is
    /// already present. Returns whether anything was appended.
    pub fn append_profile_exports(
        &self,
        profile: &Path,
        answers: &WizardAnswers,
    ) -> Result<bool> {
        let existing = match fs::read_to_string(profile) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(AideError::Io {
                    context: format!("read {}", profile.display()),
                    source: e,
                })
            }
        };

        if existing.contains(PROFILE_MARKER) {
            return Ok(false);
        }

        let block = format!(
            "\n{PROFILE_MARKER}\nexport AIDE_NAME=\"{}\"\nexport AIDE_TIME_ZONE=\"{}\"\n",
            answers.assistant_name, answers.timezone
        );
        write_atomic(profile, &format!("{existing}{block}")).map_err(|e| AideError::Io {
            context: format!("write {}", profile.display()),
            source: e,
        })?;
        Ok(true)
    }

    /// Returns the default shell profile for the current user, honoring
    /// `$SHELL` the way the original installer did.
    pub fn default_shell_profile() -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/zsh".to_string());
        let name = if shell.contains("zsh") {
            ".zshrc"
        } else {
            ".bashrc"
        };
        Some(home.join(name))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Status Checks
    // ─────────────────────────────────────────────────────────────────────

    pub fn check_status(&self) -> SetupStatus {
        let dependencies = vec![self.check_hook_binary(), check_claude()];
        let hooks = self.check_hooks_status();
        let storage_ready = self.check_storage();

        let missing_required = dependencies.iter().find(|d| d.required && !d.found);
        let hooks_ok = matches!(hooks, HookStatus::Installed);
        let all_ready = missing_required.is_none() && hooks_ok && storage_ready;

        let blocking_reason = if let Some(dep) = missing_required {
            Some(format!("{} is required but not installed", dep.name))
        } else if let HookStatus::PolicyBlocked { ref reason } = hooks {
            Some(reason.clone())
        } else if !hooks_ok {
            Some("Hooks not installed".to_string())
        } else if !storage_ready {
            Some("Storage directory not accessible".to_string())
        } else {
            None
        };

        SetupStatus {
            dependencies,
            hooks,
            storage_ready,
            all_ready,
            blocking_reason,
        }
    }

    fn check_hook_binary(&self) -> DependencyStatus {
        let path = which("aide-hook").or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".local/bin/aide-hook"))
                .filter(|p| p.exists())
                .map(|p| p.to_string_lossy().to_string())
        });

        DependencyStatus {
            name: "aide-hook".to_string(),
            required: true,
            found: path.is_some(),
            path,
            install_hint: Some("cargo install --path core/aide-hook".to_string()),
        }
    }

    fn check_storage(&self) -> bool {
        let root = self.storage.root();
        if !root.exists() && fs::create_dir_all(root).is_err() {
            return false;
        }
        root.exists() && root.is_dir()
    }

    fn check_hooks_status(&self) -> HookStatus {
        if let Some(reason) = self.check_policy_blocks() {
            return HookStatus::PolicyBlocked { reason };
        }
        if self.hooks_registered_in_settings() {
            HookStatus::Installed
        } else {
            HookStatus::NotInstalled
        }
    }

    fn check_policy_blocks(&self) -> Option<String> {
        let paths = [
            self.storage.settings_file(),
            self.storage.local_settings_file(),
        ];
        for path in &paths {
            if let Ok(content) = fs::read_to_string(path) {
                if let Ok(settings) = serde_json::from_str::<serde_json::Value>(&content) {
                    if settings.get("disableAllHooks") == Some(&serde_json::Value::Bool(true)) {
                        return Some("Hooks disabled by disableAllHooks setting".to_string());
                    }
                }
            }
        }
        None
    }

    fn hooks_registered_in_settings(&self) -> bool {
        let settings = match self.load_settings(&self.storage.settings_file()) {
            Ok(s) => s,
            Err(_) => return false,
        };
        let hooks = match settings.hooks {
            Some(h) => h,
            None => return false,
        };

        AIDE_HOOK_EVENTS.iter().all(|(event, _)| {
            hooks
                .get(*event)
                .map(|configs| {
                    configs.iter().any(|c| {
                        c.hooks
                            .as_ref()
                            .map(|inner| {
                                inner.iter().any(|h| is_aide_hook_command(h.command.as_deref()))
                            })
                            .unwrap_or(false)
                    })
                })
                .unwrap_or(false)
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Settings File I/O
    // ─────────────────────────────────────────────────────────────────────

    fn load_settings(&self, path: &Path) -> Result<SettingsFile> {
        if !path.exists() {
            return Ok(SettingsFile::default());
        }
        let content = fs::read_to_string(path).map_err(|e| AideError::Io {
            context: format!("read {}", path.display()),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| AideError::SettingsMalformed {
            path: path.to_path_buf(),
            details: format!(
                "{e}. Fix the JSON syntax or delete the file to start fresh."
            ),
        })
    }

    fn save_settings(&self, path: &Path, settings: &SettingsFile) -> Result<()> {
        let content = serde_json::to_string_pretty(settings).map_err(|e| AideError::Json {
            context: "serialize settings".to_string(),
            source: e,
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| AideError::Io {
                context: format!("create {}", parent.display()),
                source: e,
            })?;
        }
        write_atomic(path, &content).map_err(|e| AideError::Io {
            context: format!("write {}", path.display()),
            source: e,
        })
    }
}

fn which(binary: &str) -> Option<String> {
    let output = Command::new("which").arg(binary).output().ok()?;
    if output.status.success() {
        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !path.is_empty() {
            return Some(path);
        }
    }
    None
}

fn check_claude() -> DependencyStatus {
    // GUI launches don't inherit shell PATH, so check common locations too
    let path = which("claude").or_else(|| {
        ["/opt/homebrew/bin/claude", "/usr/local/bin/claude"]
            .iter()
            .find(|p| Path::new(p).is_file())
            .map(|p| p.to_string())
    });
    DependencyStatus {
        name: "claude".to_string(),
        required: true,
        found: path.is_some(),
        path,
        install_hint: Some("Install from claude.ai/download".to_string()),
    }
}

/// Check if a command is the aide hook binary.
fn is_aide_hook_command(cmd: Option<&str>) -> bool {
    cmd.map(|c| c.contains("aide-hook")).unwrap_or(false)
}

/// Rewrites an existing aide entry to the canonical command. Returns true
/// when the config contained one.
fn normalize_aide_hook_config(hook_config: &mut HookConfig, needs_matcher: bool) -> bool {
    let mut has_aide_hook = false;

    if let Some(inner_hooks) = hook_config.hooks.as_mut() {
        for hook in inner_hooks.iter_mut() {
            if is_aide_hook_command(hook.command.as_deref()) {
                hook.command = Some(HOOK_COMMAND.to_string());
                if hook.hook_type.is_none() {
                    hook.hook_type = Some("command".to_string());
                }
                has_aide_hook = true;
            }
        }
    }

    if has_aide_hook && needs_matcher && hook_config.matcher.is_none() {
        hook_config.matcher = Some("*".to_string());
    }

    has_aide_hook
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    hooks: Option<HashMap<String, Vec<HookConfig>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    env: Option<HashMap<String, serde_json::Value>>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HookConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    matcher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hooks: Option<Vec<InnerHook>>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct InnerHook {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    hook_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}
