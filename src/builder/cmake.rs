//! CMake adapter.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::builder::definitions::Definitions;
use crate::builder::{BuildHandle, BuildTool};
use crate::util::fs::ensure_dir;
use crate::util::process::{failure_detail, find_cmake, ProcessBuilder};

/// Drives `cmake` for configure, build, and install.
#[derive(Debug, Clone)]
pub struct CMakeTool {
    cmake: PathBuf,
    generator: Option<String>,
    jobs: Option<usize>,
}

impl CMakeTool {
    pub fn new() -> Result<Self> {
        let Some(cmake) = find_cmake() else {
            bail!(
                "CMake not found\n\
                 \n\
                 CMake is required to build recipes.\n\
                 Install CMake and ensure it's in your PATH."
            );
        };

        Ok(CMakeTool {
            cmake,
            generator: None,
            jobs: None,
        })
    }

    /// Use a specific generator (`-G`).
    pub fn generator(mut self, generator: Option<String>) -> Self {
        self.generator = generator;
        self
    }

    /// Limit build parallelism.
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    fn configure_command(
        &self,
        source_dir: &Path,
        build_dir: &Path,
        definitions: &Definitions,
    ) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.cmake)
            .arg("-S")
            .arg(source_dir)
            .arg("-B")
            .arg(build_dir);

        if let Some(generator) = &self.generator {
            cmd = cmd.arg("-G").arg(generator);
        }

        cmd.args(definitions.to_cmake_args())
    }

    fn build_command(&self, handle: &BuildHandle) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.cmake)
            .arg("--build")
            .arg(&handle.build_dir)
            .arg("--parallel");

        if let Some(jobs) = self.jobs {
            cmd = cmd.arg(jobs.to_string());
        }
        if let Some(config) = &handle.config {
            cmd = cmd.arg("--config").arg(config);
        }
        cmd
    }

    fn install_command(&self, handle: &BuildHandle, destination: &Path) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.cmake)
            .arg("--install")
            .arg(&handle.build_dir)
            .arg("--prefix")
            .arg(destination);

        if let Some(config) = &handle.config {
            cmd = cmd.arg("--config").arg(config);
        }
        cmd
    }

    fn run(&self, cmd: ProcessBuilder, what: &str) -> Result<()> {
        tracing::debug!("running `{}`", cmd.display_command());

        let output = cmd.exec()?;
        if !output.status.success() {
            bail!("CMake {} failed:\n{}", what, failure_detail(&output));
        }
        Ok(())
    }
}

impl BuildTool for CMakeTool {
    fn name(&self) -> &str {
        "cmake"
    }

    fn configure(
        &self,
        source_dir: &Path,
        build_dir: &Path,
        definitions: &Definitions,
    ) -> Result<BuildHandle> {
        tracing::info!("Configuring CMake project in {}", build_dir.display());
        ensure_dir(build_dir)?;

        self.run(
            self.configure_command(source_dir, build_dir, definitions),
            "configuration",
        )?;

        Ok(BuildHandle {
            source_dir: source_dir.to_path_buf(),
            build_dir: build_dir.to_path_buf(),
            config: definitions
                .get("CMAKE_BUILD_TYPE")
                .map(|value| value.to_cmake()),
        })
    }

    fn build(&self, handle: &BuildHandle) -> Result<()> {
        tracing::info!("Building CMake project");
        self.run(self.build_command(handle), "build")
    }

    fn install(&self, handle: &BuildHandle, destination: &Path) -> Result<()> {
        tracing::info!("Installing into {}", destination.display());
        ensure_dir(destination)?;
        self.run(self.install_command(handle, destination), "install")
    }
}

/// Check if a directory contains a CMake project.
pub fn is_cmake_project(dir: &Path) -> bool {
    dir.join("CMakeLists.txt").is_file()
}
