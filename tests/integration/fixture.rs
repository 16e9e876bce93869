//! Isolated on-disk workspace plus a handle on the compiled binary.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub struct TestFixture {
    pub name: String,
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|err| panic!("stdout is not JSON ({err}): {}", self.stdout))
    }
}

impl TestFixture {
    pub fn new(name: &str) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let root = temp_dir.path().to_path_buf();
        println!("[FIXTURE] {name}: {}", root.display());
        Self {
            name: name.to_string(),
            temp_dir,
            root,
        }
    }

    /// Write a file relative to the fixture root, creating parents.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, content).expect("write fixture file");
        path
    }

    /// Create an agent directory containing an agent definition.
    pub fn agent(&self, relative: &str) -> PathBuf {
        self.write(&format!("{relative}/agent.yaml"), "name: fixture\n");
        self.root.join(relative)
    }

    pub fn dir(&self, relative: &str) -> PathBuf {
        let path = self.root.join(relative);
        std::fs::create_dir_all(&path).expect("create dir");
        path
    }

    /// Run the binary from the fixture root with a clean config environment.
    pub fn run(&self, args: &[&str]) -> CommandOutput {
        self.run_with_env(args, &[])
    }

    pub fn run_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> CommandOutput {
        let mut cmd = Command::cargo_bin("powerforge").expect("binary built");
        cmd.current_dir(&self.root)
            .env("XDG_CONFIG_HOME", self.root.join(".config"))
            .env("HOME", &self.root)
            .env_remove("POWERFORGE_CONFIG")
            .env_remove("POWERFORGE_ROBOT")
            .env_remove("POWERFORGE_CONFLICT_POLICY")
            .env_remove("POWERFORGE_SUGGESTION_THRESHOLD")
            .env_remove("POWERFORGE_REDACT_AUDIT")
            .env_remove("POWERFORGE_LINT_STRICT")
            .env_remove("POWERFORGE_LINT_DISABLED")
            .env_remove("POWERFORGE_BATCH_THREADS")
            .env_remove("POWERFORGE_ROBOT_FORMAT")
            .env_remove("RUST_LOG")
            .args(args);
        for (key, value) in env {
            cmd.env(key, value);
        }
        let output = cmd.output().expect("run powerforge");
        CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }
}

impl Drop for TestFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] cleaning up {}", self.name);
    }
}
