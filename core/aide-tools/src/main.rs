//! aide-tools: operator CLI for installing aide and validating packs.

use std::path::PathBuf;
use std::process::ExitCode;

use aide_core::setup::{HookStatus, Installer, WizardAnswers};
use aide_core::storage::StorageConfig;
use aide_core::validation::{self, PackReport};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aide-tools")]
#[command(about = "Installer and pack validator for aide")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install aide into the assistant directory (idempotent)
    Install {
        /// Assistant display name written to the environment file
        #[arg(long, default_value = "Aide")]
        name: String,
        /// IANA timezone written to the environment file
        #[arg(long, default_value = "UTC")]
        timezone: String,
        /// Skip the guarded shell-profile export block
        #[arg(long)]
        skip_shell_profile: bool,
    },
    /// Validate pack completeness (required files, workflow references)
    Validate {
        /// Validate a single pack instead of every pack
        pack: Option<String>,
        /// Directory containing the packs
        #[arg(long, default_value = "Packs")]
        packs_dir: PathBuf,
    },
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Install {
            name,
            timezone,
            skip_shell_profile,
        } => run_install(&name, &timezone, skip_shell_profile),
        Commands::Validate { pack, packs_dir } => run_validate(pack.as_deref(), &packs_dir),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_install(name: &str, timezone: &str, skip_shell_profile: bool) -> ExitCode {
    let Some(storage) = StorageConfig::discover() else {
        eprintln!("error: cannot determine home directory");
        return ExitCode::FAILURE;
    };

    let answers = WizardAnswers {
        assistant_name: name.to_string(),
        timezone: timezone.to_string(),
    };
    let installer = Installer::new(storage.clone());

    println!("Installing aide into {}", storage.root().display());

    if let Err(e) = installer.scaffold() {
        eprintln!("error: scaffolding failed: {e}");
        return ExitCode::FAILURE;
    }
    println!("  created directory tree");

    match installer.register_hooks() {
        Ok(result) if result.success => println!("  {}", result.message),
        Ok(result) => {
            eprintln!("error: {}", result.message);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("error: hook registration failed: {e}");
            return ExitCode::FAILURE;
        }
    }

    if let Err(e) = installer.write_env(&answers) {
        eprintln!("error: environment configuration failed: {e}");
        return ExitCode::FAILURE;
    }
    println!("  wrote {}", storage.env_file().display());

    if !skip_shell_profile {
        match Installer::default_shell_profile() {
            Some(profile) => match installer.append_profile_exports(&profile, &answers) {
                Ok(true) => println!("  added exports to {}", profile.display()),
                Ok(false) => println!("  exports already present in {}", profile.display()),
                Err(e) => {
                    // Shell-profile edits are a convenience, not a blocker.
                    tracing::warn!(error = %e, "Failed to update shell profile");
                }
            },
            None => tracing::warn!("No home directory; skipping shell profile"),
        }
    }

    print_status(&installer);
    ExitCode::SUCCESS
}

fn print_status(installer: &Installer) {
    let status = installer.check_status();
    println!("\nSetup status:");
    for dep in &status.dependencies {
        let mark = if dep.found { "ok" } else { "missing" };
        match (&dep.path, dep.found) {
            (Some(path), true) => println!("  {}: {mark} ({path})", dep.name),
            _ => {
                let hint = dep.install_hint.as_deref().unwrap_or("");
                println!("  {}: {mark}  {hint}", dep.name);
            }
        }
    }
    match &status.hooks {
        HookStatus::Installed => println!("  hooks: registered"),
        HookStatus::NotInstalled => println!("  hooks: not registered"),
        HookStatus::PolicyBlocked { reason } => println!("  hooks: blocked ({reason})"),
    }
    match &status.blocking_reason {
        None => println!("  ready"),
        Some(reason) => println!("  not ready: {reason}"),
    }
}

fn run_validate(pack: Option<&str>, packs_dir: &std::path::Path) -> ExitCode {
    let reports = match pack {
        Some(name) => vec![validation::validate_pack(packs_dir, name)],
        None => match validation::validate_all(packs_dir) {
            Ok(reports) => reports,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        },
    };

    let has_errors = print_reports(&reports);
    if has_errors {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Renders the per-pack results and the summary line.
/// Returns whether any pack had errors.
fn print_reports(reports: &[PackReport]) -> bool {
    let mut has_errors = false;

    for report in reports {
        let verdict = if report.is_valid() { "ok" } else { "FAILED" };
        println!("{} ({}): {verdict}", report.pack, report.kind);
        for error in &report.errors {
            has_errors = true;
            println!("  error: {error}");
        }
        for warning in &report.warnings {
            println!("  warning: {warning}");
        }
    }

    let valid = reports.iter().filter(|r| r.is_valid()).count();
    println!("\nSummary: {valid}/{} packs valid", reports.len());
    has_errors
}
