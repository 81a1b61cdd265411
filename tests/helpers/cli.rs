use anyhow::Result;
use assert_cmd::Command;
use snapdiff::snapshot::Snapshot;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Temporary project directory plus a preconfigured `snapdiff` command.
pub struct CliTestHelper {
    pub temp_dir: TempDir,
    pub project_root: PathBuf,
}

impl CliTestHelper {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let project_root = temp_dir.path().to_path_buf();
        Self {
            temp_dir,
            project_root,
        }
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("snapdiff").unwrap();
        cmd.current_dir(&self.project_root)
            .env_remove("DATABASE_URL")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn write_snapshot(&self, name: &str, snapshot: &Snapshot) -> Result<PathBuf> {
        let path = self.project_root.join(name);
        fs::write(&path, snapshot.to_json_pretty()?)?;
        Ok(path)
    }

    pub fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.project_root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read(&self, name: &str) -> Result<String> {
        Ok(fs::read_to_string(self.project_root.join(name))?)
    }
}

impl Default for CliTestHelper {
    fn default() -> Self {
        Self::new()
    }
}
