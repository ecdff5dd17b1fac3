//! Running external tools (cmake, git).

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result};

/// A command line for an external tool, run with captured output.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<OsString>,
    env: Vec<(String, OsString)>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        args.into_iter().fold(self, |cmd, arg| cmd.arg(arg))
    }

    pub fn env(mut self, key: &str, value: impl AsRef<OsStr>) -> Self {
        self.env.push((key.to_string(), value.as_ref().to_os_string()));
        self
    }

    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Run to completion with stdin closed and both output streams captured.
    /// A non-zero exit is not an error here; callers inspect the status.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        cmd.output()
            .with_context(|| format!("failed to run `{}`", self.display_command()))
    }

    /// The command line as it would be typed, for logs and errors.
    pub fn display_command(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The most useful text from a failed run: stderr, or stdout when stderr is
/// empty. CMake reports configure errors on stdout.
pub fn failure_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout)
    } else {
        stderr
    };
    detail.trim_end().to_string()
}

/// Look up a tool on the PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Locate cmake. `$CMAKE` wins when it names something runnable.
pub fn find_cmake() -> Option<PathBuf> {
    std::env::var_os("CMAKE")
        .and_then(|cmake| which::which(cmake).ok())
        .or_else(|| find_executable("cmake"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_exec_with_env_and_cwd() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = ProcessBuilder::new("sh")
            .args(["-c", "echo $QUAY_TEST_VALUE; pwd"])
            .env("QUAY_TEST_VALUE", "hello")
            .cwd(tmp.path())
            .exec()
            .unwrap();

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.starts_with("hello\n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_detail_falls_back_to_stdout() {
        let output = ProcessBuilder::new("sh")
            .args(["-c", "echo 'CMake Error: no compiler'; exit 1"])
            .exec()
            .unwrap();
        assert!(!output.status.success());
        assert_eq!(failure_detail(&output), "CMake Error: no compiler");

        let output = ProcessBuilder::new("sh")
            .args(["-c", "echo noise; echo 'fatal: corrupt patch' >&2; exit 1"])
            .exec()
            .unwrap();
        assert_eq!(failure_detail(&output), "fatal: corrupt patch");
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("cmake").args(["--build", "build", "--parallel"]);
        assert_eq!(pb.display_command(), "cmake --build build --parallel");
    }

    #[test]
    fn test_missing_program() {
        let err = ProcessBuilder::new("quay-no-such-program").exec().unwrap_err();
        assert!(err.to_string().contains("quay-no-such-program"));
    }
}
