//! File access scoped to one plugin directory

use std::path::{Component, Path, PathBuf};

use super::PluginError;

/// Filesystem view rooted at a plugin's directory
///
/// Relative paths only; anything that would leave the root is refused.
#[derive(Debug, Clone)]
pub struct PluginFs {
    root: PathBuf,
}

impl PluginFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path inside the plugin directory
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, PluginError> {
        if relative.is_empty() || escapes_root(relative) {
            return Err(PluginError::PathEscape(relative.to_string()));
        }
        Ok(self.root.join(relative))
    }

    pub async fn exists(&self, relative: &str) -> bool {
        match self.resolve(relative) {
            Ok(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn read_to_string(&self, relative: &str) -> Result<String, PluginError> {
        Ok(tokio::fs::read_to_string(self.resolve(relative)?).await?)
    }

    /// Write a file, creating parent directories as needed
    pub async fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> Result<(), PluginError> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
        Ok(())
    }

    /// Names of the entries in a directory, sorted
    pub async fn list(&self, relative: &str) -> Result<Vec<String>, PluginError> {
        let dir = if relative.is_empty() || relative == "." {
            self.root.clone()
        } else {
            self.resolve(relative)?
        };

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

/// True if a relative path is absolute or climbs out through `..`
fn escapes_root(relative: &str) -> bool {
    let path = Path::new(relative);
    if path.is_absolute() {
        return true;
    }
    path.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_escapes_root() {
        assert!(escapes_root("../secret"));
        assert!(escapes_root("data/../../secret"));
        assert!(escapes_root("/etc/passwd"));
        assert!(!escapes_root("data/state.json"));
        assert!(!escapes_root("./api/socket.toml"));
    }

    #[tokio::test]
    async fn test_write_read_list() {
        let temp = TempDir::new().unwrap();
        let fs = PluginFs::new(temp.path());

        fs.write("data/state.json", "{}").await.unwrap();
        assert!(fs.exists("data/state.json").await);
        assert_eq!(fs.read_to_string("data/state.json").await.unwrap(), "{}");
        assert_eq!(fs.list("").await.unwrap(), vec!["data"]);
        assert_eq!(fs.list("data").await.unwrap(), vec!["state.json"]);
    }

    #[tokio::test]
    async fn test_escape_refused() {
        let temp = TempDir::new().unwrap();
        let fs = PluginFs::new(temp.path().join("plugin"));

        let err = fs.read_to_string("../outside.txt").await.unwrap_err();
        assert!(matches!(err, PluginError::PathEscape(_)));
        assert!(!fs.exists("../outside.txt").await);
        assert!(fs.write("/tmp/x", "y").await.is_err());
    }
}
