use crate::{Error, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Application directories following XDG spec
#[derive(Debug, Clone)]
pub struct Directories {
    /// Config directory (~/.config/flint)
    pub config: PathBuf,

    /// Data directory (~/.local/share/flint)
    pub data: PathBuf,

    /// Cache directory (~/.cache/flint)
    pub cache: PathBuf,

    /// User plugins directory (~/.config/flint/plugins)
    pub user_plugins: PathBuf,

    /// Config file path
    pub config_file: PathBuf,

    /// Trigger metadata file path
    pub triggers_file: PathBuf,
}

impl Directories {
    /// Resolve the standard XDG paths.
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self> {
        let project = ProjectDirs::from("", "", "flint")
            .ok_or_else(|| Error::Config("cannot determine home directory".to_string()))?;

        let config = project.config_dir().to_path_buf();

        Ok(Self {
            user_plugins: config.join("plugins"),
            config_file: config.join("config.json"),
            triggers_file: config.join("triggers.json"),
            data: project.data_dir().to_path_buf(),
            cache: project.cache_dir().to_path_buf(),
            config,
        })
    }

    #[must_use]
    pub fn with_base(base: PathBuf) -> Self {
        Self {
            user_plugins: base.join("plugins"),
            config_file: base.join("config.json"),
            triggers_file: base.join("triggers.json"),
            config: base.clone(),
            data: base.clone(),
            cache: base,
        }
    }

    /// Ensure all directories exist.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be created.
    pub fn ensure_exists(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config)?;
        std::fs::create_dir_all(&self.data)?;
        std::fs::create_dir_all(&self.cache)?;
        std::fs::create_dir_all(&self.user_plugins)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_sets_all_paths() {
        let base = PathBuf::from("/tmp/test-flint");
        let dirs = Directories::with_base(base.clone());

        assert_eq!(dirs.config, base);
        assert_eq!(dirs.data, base);
        assert_eq!(dirs.cache, base);
        assert_eq!(dirs.user_plugins, base.join("plugins"));
        assert_eq!(dirs.config_file, base.join("config.json"));
        assert_eq!(dirs.triggers_file, base.join("triggers.json"));
    }

    #[test]
    fn test_ensure_exists_creates_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let base = temp_dir.path().join("flint-test-subdir");
        let dirs = Directories::with_base(base);

        assert!(!dirs.user_plugins.exists());

        dirs.ensure_exists().unwrap();
        dirs.ensure_exists().unwrap();

        assert!(dirs.config.exists());
        assert!(dirs.user_plugins.exists());
    }

    #[test]
    fn test_new_uses_project_name() {
        let Ok(dirs) = Directories::new() else {
            return;
        };
        assert!(dirs.config.to_string_lossy().contains("flint"));
        assert!(dirs.config_file.to_string_lossy().ends_with("config.json"));
        assert!(dirs.triggers_file.to_string_lossy().ends_with("triggers.json"));
    }
}
