use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use sdlc_toolbox_core::Environment;

pub const TEMPLATES_DIR_VAR: &str = "SDLC_TEMPLATES_DIR";
/// Looked up beside the executable before falling back to the bundled set.
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";

/// Template id to file name. Nothing outside this table can be read.
pub const TEMPLATE_FILES: &[(&str, &str)] = &[
    ("decision-log", "decision-log.md"),
    ("incident-report-postmortem", "incident-report-postmortem.md"),
    ("user-story", "user-story.md"),
];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template type '{0}' not supported")]
    Unsupported(String),
    #[error("Template file '{0}' not found")]
    NotFound(String),
    #[error("Error reading template: {0}")]
    Io(#[from] io::Error),
}

/// File name to content, compiled in from `crates/mcp/templates/`.
const BUNDLED_TEMPLATES: &[(&str, &str)] = &[
    ("decision-log.md", include_str!("../../templates/decision-log.md")),
    (
        "incident-report-postmortem.md",
        include_str!("../../templates/incident-report-postmortem.md"),
    ),
    ("user-story.md", include_str!("../../templates/user-story.md")),
];

pub fn template_file(template_id: &str) -> Option<&'static str> {
    TEMPLATE_FILES
        .iter()
        .find(|(id, _)| *id == template_id)
        .map(|(_, file)| *file)
}

/// Reads templates from a directory, or from the bundled copies when no
/// directory is configured.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    dir: Option<PathBuf>,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn bundled() -> Self {
        Self::default()
    }

    /// `override_dir` first, then `SDLC_TEMPLATES_DIR`, then `templates/`
    /// beside the executable, then the bundled set. Never the working
    /// directory.
    pub fn from_env(env: &Environment, override_dir: Option<&Path>) -> Self {
        let dir = override_dir
            .map(Path::to_path_buf)
            .or_else(|| env.optional(TEMPLATES_DIR_VAR).map(PathBuf::from))
            .or_else(beside_executable);
        Self { dir }
    }

    /// `None` when serving the bundled templates.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn location(&self) -> String {
        match &self.dir {
            Some(dir) => dir.display().to_string(),
            None => "bundled templates".to_string(),
        }
    }

    /// The template's content exactly as stored.
    pub fn read(&self, template_id: &str) -> Result<String, TemplateError> {
        let file = template_file(template_id)
            .ok_or_else(|| TemplateError::Unsupported(template_id.to_string()))?;

        let Some(dir) = &self.dir else {
            return BUNDLED_TEMPLATES
                .iter()
                .find(|(name, _)| *name == file)
                .map(|(_, content)| content.to_string())
                .ok_or_else(|| TemplateError::NotFound(file.to_string()));
        };

        std::fs::read_to_string(dir.join(file)).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => TemplateError::NotFound(file.to_string()),
            _ => TemplateError::Io(err),
        })
    }
}

fn beside_executable() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let dir = exe.parent()?.join(DEFAULT_TEMPLATES_DIR);
    dir.is_dir().then_some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(files: &[(&str, &str)]) -> (TempDir, TemplateStore) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        let store = TemplateStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn reads_content_verbatim() {
        let content = "# User story\r\n\nAs a <role>, I want…\n\n  trailing  \n";
        let (_dir, store) = store_with(&[("user-story.md", content)]);
        assert_eq!(store.read("user-story").unwrap(), content);
    }

    #[test]
    fn unknown_id_gives_same_message_every_time() {
        let (_dir, store) = store_with(&[]);
        let first = store.read("release-notes").unwrap_err().to_string();
        let second = store.read("release-notes").unwrap_err().to_string();
        assert_eq!(first, "Template type 'release-notes' not supported");
        assert_eq!(first, second);
    }

    #[test]
    fn missing_file_names_the_file() {
        let (_dir, store) = store_with(&[]);
        let err = store.read("decision-log").unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(_)));
        assert_eq!(err.to_string(), "Template file 'decision-log.md' not found");
    }

    #[test]
    fn path_traversal_is_not_a_template() {
        let (_dir, store) = store_with(&[]);
        assert!(matches!(
            store.read("../secrets"),
            Err(TemplateError::Unsupported(_))
        ));
        assert!(matches!(
            TemplateStore::bundled().read("../secrets"),
            Err(TemplateError::Unsupported(_))
        ));
    }

    #[test]
    fn bundled_set_matches_shipped_files() {
        let shipped = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"));
        let store = TemplateStore::bundled();
        for (id, file) in TEMPLATE_FILES {
            let expected = std::fs::read_to_string(shipped.join(file)).unwrap();
            assert_eq!(store.read(id).unwrap(), expected);
        }
    }

    #[test]
    fn directory_resolution_order() {
        let env = Environment::from_pairs([(TEMPLATES_DIR_VAR, "/srv/templates")]);
        assert_eq!(
            TemplateStore::from_env(&env, None).dir(),
            Some(Path::new("/srv/templates"))
        );
        assert_eq!(
            TemplateStore::from_env(&env, Some(Path::new("local"))).dir(),
            Some(Path::new("local"))
        );
        // The test binary has no templates/ beside it.
        let fallback = TemplateStore::from_env(&Environment::default(), None);
        assert_eq!(fallback.dir(), None);
        assert_eq!(fallback.location(), "bundled templates");
    }
}
