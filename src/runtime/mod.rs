//! Runtime abstraction for system operations.
//!
//! This module provides a trait-based abstraction over everything the
//! detector and the package backends touch on the host, enabling dependency
//! injection and testability.
//!
//! # Structure
//!
//! - `path` - Path utility functions (common_prefix, reroot, is_path_under)
//! - `env` - Environment variables and well-known directories
//! - `fs` - Read-only file system operations
//! - `process` - Blocking subprocess execution

mod env;
mod fs;
pub mod path;
mod process;

use anyhow::Result;
use std::env as std_env;
use std::path::{Path, PathBuf};

pub use path::{common_prefix, is_path_under, reroot};
pub use process::CommandOutput;

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    // File System
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn is_symlink(&self, path: &Path) -> bool;
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Read the first line of a file, without the trailing newline.
    fn read_first_line(&self, path: &Path) -> Result<String>;

    // Directories
    fn config_dir(&self) -> Option<PathBuf>;

    // Processes
    /// Run a program to completion and capture its output.
    ///
    /// A non-zero exit status is not an error; callers inspect
    /// [`CommandOutput::success`]. An error means the program could not be
    /// started at all.
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.is_symlink_impl(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.read_dir_impl(path)
    }

    fn read_first_line(&self, path: &Path) -> Result<String> {
        self.read_first_line_impl(path)
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.config_dir_impl()
    }

    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        self.run_impl(program, args)
    }
}

/// Convenience for building argument lists from string literals.
pub(crate) fn args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}
