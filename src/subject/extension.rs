//! Extensions installed inside a host instance.

use crate::error::Result;
use crate::metadata::{EXTENSION_MANIFEST, SubjectMetadata, extension_metadata, read_extension_manifest};
use crate::state::SubjectInfo;
use crate::subject::{BuildTask, SubjectContext, invalid_target};
use std::path::{Path, PathBuf};

/// Directory of an instance that holds its extensions
pub const EXTENSIONS_DIR: &str = "extensions";

/// `{instance}/extensions/{name}`
#[derive(Debug, Clone)]
pub struct ExtensionSubject {
    instance: PathBuf,
    name: Option<String>,
    translations: bool,
}

impl ExtensionSubject {
    /// Extension `name` inside `instance`; `None` asks the operator
    pub fn new(instance: PathBuf, name: Option<String>, translations: bool) -> Self {
        Self {
            instance,
            name,
            translations,
        }
    }

    fn extensions_dir(&self) -> PathBuf {
        self.instance.join(EXTENSIONS_DIR)
    }

    pub(super) async fn select_target(&self, ctx: SubjectContext<'_>) -> Result<SubjectInfo> {
        let extensions = self.extensions_dir();
        if !extensions.is_dir() {
            return Err(invalid_target(format!(
                "{} is not an instance: no {EXTENSIONS_DIR}/ directory found",
                self.instance.display()
            )));
        }

        let name = match &self.name {
            Some(name) => name.clone(),
            None if ctx.interactive => {
                let units = list_extensions(&extensions)?;
                if units.is_empty() {
                    return Err(invalid_target(format!(
                        "No extension with an {EXTENSION_MANIFEST} found in {}",
                        extensions.display()
                    )));
                }
                let choice = ctx.tools.prompter.select("Which extension?", &units).await?;
                units[choice].clone()
            }
            None => {
                return Err(invalid_target(
                    "--name is required for non-interactive extension releases",
                ));
            }
        };

        let path = extensions.join(&name);
        if !path.join(EXTENSION_MANIFEST).is_file() {
            return Err(invalid_target(format!(
                "{} is not an extension: {EXTENSION_MANIFEST} is missing",
                path.display()
            )));
        }

        Ok(SubjectInfo { name, path })
    }

    pub(super) async fn metadata(&self, ctx: SubjectContext<'_>) -> Result<SubjectMetadata> {
        let root = ctx.root()?;
        let manifest = read_extension_manifest(root)?;
        let fallback = if manifest.repository.is_none() {
            Some(ctx.tools.git.get_repository_identifier(root).await?)
        } else {
            None
        };
        extension_metadata(&manifest, root, fallback)
    }

    pub(super) fn build_tasks(&self) -> Vec<BuildTask> {
        let mut tasks = vec![BuildTask::BundleAssets];
        if self.translations {
            tasks.push(BuildTask::Translations);
        }
        tasks
    }
}

/// Sorted names of the directories under `extensions` that carry a manifest
fn list_extensions(extensions: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(extensions)? {
        let entry = entry?;
        if entry.path().join(EXTENSION_MANIFEST).is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_only_manifested_units() {
        let tmp = tempfile::tempdir().unwrap();
        let ext = tmp.path().join(EXTENSIONS_DIR);
        for name in ["zeta", "alpha"] {
            std::fs::create_dir_all(ext.join(name)).unwrap();
            std::fs::write(ext.join(name).join(EXTENSION_MANIFEST), "{}").unwrap();
        }
        std::fs::create_dir_all(ext.join("scratch")).unwrap();

        assert_eq!(list_extensions(&ext).unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_translations_are_opt_in() {
        let without = ExtensionSubject::new(PathBuf::from("/i"), None, false);
        assert_eq!(without.build_tasks(), vec![BuildTask::BundleAssets]);
        let with = ExtensionSubject::new(PathBuf::from("/i"), None, true);
        assert_eq!(
            with.build_tasks(),
            vec![BuildTask::BundleAssets, BuildTask::Translations]
        );
    }
}
