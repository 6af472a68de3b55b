//! Pack completeness validation.
//!
//! Packs are directories of assistant content distributed alongside the
//! tools. Skill packs must ship a `SKILL.md` whose workflow references all
//! resolve to real files; system packs are infrastructure and carry no
//! skill document. Validation is advisory where it can be (missing
//! recommended files warn) and blocking where a reference would break at
//! use time (missing workflows error).

use std::path::{Path, PathBuf};

use fs_err as fs;
use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::error::{AideError, Result};

/// Matches `Workflows/<Name>.md` references inside a SKILL.md.
static WORKFLOW_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Workflows/([A-Za-z0-9_-]+\.md)").expect("valid workflow pattern"));

/// Infrastructure packs that are complete without a SKILL.md.
const SYSTEM_PACKS: [&str; 3] = ["aide-hook-system", "aide-history-system", "icons"];

/// Files every pack should ship. Missing ones warn rather than fail.
const RECOMMENDED_FILES: [&str; 3] = ["README.md", "INSTALL.md", "VERIFY.md"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackKind {
    Skill,
    System,
}

impl std::fmt::Display for PackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackKind::Skill => f.write_str("skill"),
            PackKind::System => f.write_str("system"),
        }
    }
}

/// Validation result for one pack.
#[derive(Debug, Clone)]
pub struct PackReport {
    pub pack: String,
    pub kind: PackKind,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl PackReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates every pack under `packs_dir` (dotted directories skipped),
/// in name order.
pub fn validate_all(packs_dir: &Path) -> Result<Vec<PackReport>> {
    if !packs_dir.is_dir() {
        return Err(AideError::PacksDirNotFound(packs_dir.to_path_buf()));
    }

    let mut names = Vec::new();
    let entries = fs::read_dir(packs_dir).map_err(|e| AideError::Io {
        context: format!("read {}", packs_dir.display()),
        source: e,
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| AideError::Io {
            context: format!("read {}", packs_dir.display()),
            source: e,
        })?;
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.path().is_dir() && !name.starts_with('.') {
            names.push(name);
        }
    }
    names.sort();

    Ok(names
        .iter()
        .map(|name| validate_pack(packs_dir, name))
        .collect())
}

/// Validates a single pack by name.
pub fn validate_pack(packs_dir: &Path, name: &str) -> PackReport {
    let kind = if SYSTEM_PACKS.contains(&name) {
        PackKind::System
    } else {
        PackKind::Skill
    };
    let mut report = PackReport {
        pack: name.to_string(),
        kind,
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    let pack_dir = packs_dir.join(name);
    if !pack_dir.is_dir() {
        report
            .errors
            .push(format!("Pack directory not found: {}", pack_dir.display()));
        return report;
    }

    for file in RECOMMENDED_FILES {
        if !pack_dir.join(file).exists() {
            report
                .warnings
                .push(format!("Missing recommended file: {file}"));
        }
    }

    // System packs are infrastructure; no skill document to check.
    if report.kind == PackKind::System {
        return report;
    }

    let skill_md = match find_skill_md(&pack_dir) {
        Some(path) => path,
        None => {
            report.errors.push("Skill pack missing SKILL.md".to_string());
            return report;
        }
    };

    let content = match fs::read_to_string(&skill_md) {
        Ok(c) => c,
        Err(e) => {
            report
                .errors
                .push(format!("Unreadable SKILL.md: {e}"));
            return report;
        }
    };

    let refs = extract_workflow_refs(&content);
    if refs.is_empty() {
        report
            .warnings
            .push("No workflow references found in SKILL.md".to_string());
        return report;
    }

    // References resolve relative to the directory holding SKILL.md.
    let workflows_dir = skill_md
        .parent()
        .map(|p| p.join("Workflows"))
        .unwrap_or_else(|| pack_dir.join("Workflows"));
    for reference in refs {
        if !workflows_dir.join(&reference).exists() {
            report.errors.push(format!(
                "Missing workflow: Workflows/{reference} (referenced in SKILL.md)"
            ));
        }
    }

    report
}

/// Locates a pack's SKILL.md: at the pack root, or nested under
/// `src/skills/*/SKILL.md` (first match in directory order).
fn find_skill_md(pack_dir: &Path) -> Option<PathBuf> {
    let root_skill = pack_dir.join("SKILL.md");
    if root_skill.exists() {
        return Some(root_skill);
    }

    let skills_dir = pack_dir.join("src").join("skills");
    if !skills_dir.is_dir() {
        return None;
    }
    WalkDir::new(&skills_dir)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .find(|p| p.file_name().is_some_and(|n| n == "SKILL.md"))
}

/// Extracts workflow references, deduplicated in first-seen order.
pub fn extract_workflow_refs(skill_md: &str) -> Vec<String> {
    let mut refs = Vec::new();
    for capture in WORKFLOW_REF.captures_iter(skill_md) {
        let name = capture[1].to_string();
        if !refs.contains(&name) {
            refs.push(name);
        }
    }
    refs
}
