//! Locating and parsing system-instruction files.
//!
//! Definitions live in `.tutor/prompts/<id>.yml` under the workspace.

use crate::defaults::default_definition;
use crate::types::PromptDefinition;
use std::path::{Path, PathBuf};
use tutor_core::{AppError, AppResult};

/// Directory, relative to the workspace, holding prompt files.
pub const PROMPTS_DIR: &str = ".tutor/prompts";

const PROMPT_EXTENSION: &str = "yml";

fn prompt_path(workspace: &Path, id: &str) -> PathBuf {
    workspace
        .join(PROMPTS_DIR)
        .join(format!("{}.{}", id, PROMPT_EXTENSION))
}

/// Read and validate the definition stored under `id`.
///
/// # Example
/// ```no_run
/// use tutor_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let definition = load_prompt(Path::new("."), "assistant.terse")?;
/// println!("{} v{}", definition.title, definition.api_version);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace: &Path, id: &str) -> AppResult<PromptDefinition> {
    let path = prompt_path(workspace, id);
    tracing::debug!("Reading system instructions '{}' from {:?}", id, path);

    let yaml = match std::fs::read_to_string(&path) {
        Ok(yaml) => yaml,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::Prompt(format!(
                "No prompt named '{}' (expected {:?})",
                id, path
            )))
        }
        Err(e) => return Err(AppError::Prompt(format!("Cannot read {:?}: {}", path, e))),
    };

    let definition: PromptDefinition = serde_yaml::from_str(&yaml)
        .map_err(|e| AppError::Prompt(format!("Malformed prompt {:?}: {}", path, e)))?;
    validate_prompt(&definition)?;

    tracing::info!("Using system instructions '{}' ({})", definition.id, definition.title);
    Ok(definition)
}

/// The configured definition, or the built-in one when no ID is configured.
///
/// A configured ID that cannot be loaded is an error; only an absent ID
/// falls back.
pub fn load_or_default(workspace: &Path, id: Option<&str>) -> AppResult<PromptDefinition> {
    match id {
        Some(id) => load_prompt(workspace, id),
        None => {
            tracing::debug!("No prompt configured, using built-in instructions");
            Ok(default_definition())
        }
    }
}

/// IDs of every prompt file in the workspace, sorted.
pub fn list_prompts(workspace: &Path) -> AppResult<Vec<String>> {
    let dir = workspace.join(PROMPTS_DIR);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut ids: Vec<String> = walkdir::WalkDir::new(&dir)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry.path().extension().and_then(|ext| ext.to_str()) == Some(PROMPT_EXTENSION)
        })
        .filter_map(|entry| {
            entry
                .path()
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
        })
        .collect();

    ids.sort();
    Ok(ids)
}

pub(crate) fn validate_prompt(definition: &PromptDefinition) -> AppResult<()> {
    let missing = [
        ("id", definition.id.as_str()),
        ("title", definition.title.as_str()),
        ("template", definition.template.as_str()),
    ]
    .into_iter()
    .find(|(_, value)| value.trim().is_empty());

    if let Some((field, _)) = missing {
        return Err(AppError::Prompt(format!("Prompt {} must not be empty", field)));
    }

    // apiVersion is "major.minor"
    let well_formed = definition
        .api_version
        .split_once('.')
        .is_some_and(|(major, minor)| {
            !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
        });
    if !well_formed {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' has apiVersion '{}', expected 'major.minor'",
            definition.id, definition.api_version
        )));
    }

    Ok(())
}
