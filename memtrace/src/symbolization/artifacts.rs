//! Module name to debug artifact mapping
//!
//! The trace only names modules; the debug files live in the build tree of
//! whatever produced the traced system. By default the kernel maps to
//! `<build-dir>/kernel/kernel.debug` and every other module to
//! `<build-dir>/modules/<name>.ko`. A JSON object of `"module": "path"`
//! entries overrides individual modules.

use log::info;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::module_ranges::KERNEL_MODULE;
use crate::domain::ModuleMapError;

/// Where to find the debug artifact for each module
#[derive(Debug, Clone)]
pub struct ArtifactMap {
    build_dir: PathBuf,
    overrides: HashMap<String, PathBuf>,
}

impl ArtifactMap {
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        Self { build_dir: build_dir.into(), overrides: HashMap::new() }
    }

    /// Map `module` to `path`; relative paths are taken from the build directory
    pub fn insert(&mut self, module: impl Into<String>, path: impl AsRef<Path>) {
        let path = self.build_dir.join(path);
        self.overrides.insert(module.into(), path);
    }

    /// Merge entries from a JSON module map file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a JSON object of strings
    pub fn load_overrides(&mut self, path: &Path) -> Result<usize, ModuleMapError> {
        let content = fs::read_to_string(path)
            .map_err(|source| ModuleMapError::Read { path: path.to_path_buf(), source })?;
        let entries: HashMap<String, PathBuf> = serde_json::from_str(&content)
            .map_err(|source| ModuleMapError::Parse { path: path.to_path_buf(), source })?;

        let count = entries.len();
        for (module, artifact) in entries {
            self.insert(module, artifact);
        }
        info!("Loaded {count} module mappings from {}", path.display());
        Ok(count)
    }

    /// Debug artifact path for a module; the file need not exist
    #[must_use]
    pub fn path_for(&self, module: &str) -> PathBuf {
        if let Some(path) = self.overrides.get(module) {
            return path.clone();
        }

        if module == KERNEL_MODULE {
            self.build_dir.join("kernel").join("kernel.debug")
        } else {
            self.build_dir.join("modules").join(format!("{module}.ko"))
        }
    }
}

impl Default for ArtifactMap {
    fn default() -> Self {
        Self::new("build")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_paths() {
        let map = ArtifactMap::new("/src/build");
        assert_eq!(map.path_for("kernel"), PathBuf::from("/src/build/kernel/kernel.debug"));
        assert_eq!(map.path_for("vfs"), PathBuf::from("/src/build/modules/vfs.ko"));
    }

    #[test]
    fn test_relative_override_joins_build_dir() {
        let mut map = ArtifactMap::new("/src/build");
        map.insert("e1000", "drivers/e1000.o.debug");
        map.insert("posix", "/opt/debug/posix.o.debug");

        assert_eq!(map.path_for("e1000"), PathBuf::from("/src/build/drivers/e1000.o.debug"));
        assert_eq!(map.path_for("posix"), PathBuf::from("/opt/debug/posix.o.debug"));
    }

    #[test]
    fn test_load_overrides_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"kernel": "kernel/kernel", "ata": "drivers/ata.o.debug"}}"#).unwrap();

        let mut map = ArtifactMap::new("build");
        assert_eq!(map.load_overrides(file.path()).unwrap(), 2);
        assert_eq!(map.path_for("kernel"), PathBuf::from("build/kernel/kernel"));
        assert_eq!(map.path_for("ata"), PathBuf::from("build/drivers/ata.o.debug"));
        assert_eq!(map.path_for("usb"), PathBuf::from("build/modules/usb.ko"));
    }

    #[test]
    fn test_load_overrides_rejects_non_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();

        let err = ArtifactMap::default().load_overrides(file.path()).unwrap_err();
        assert!(matches!(err, ModuleMapError::Parse { .. }));
    }

    #[test]
    fn test_load_overrides_missing_file() {
        let err =
            ArtifactMap::default().load_overrides(Path::new("/nonexistent/map.json")).unwrap_err();
        assert!(matches!(err, ModuleMapError::Read { .. }));
    }
}
