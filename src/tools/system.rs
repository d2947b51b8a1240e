//! Process-backed implementation of [`Tools`].

use anyhow::{Context, Result};
use log::debug;
use std::cmp::Ordering;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::RepoError;

use super::Tools;
use super::output::{parse_package_list, parse_query_output, parse_vercmp_output};

const VERCMP: &str = "vercmp";
const PACMAN: &str = "pacman";
const GPG: &str = "gpg";
const REPO_ADD: &str = "repo-add";
const RSYNC: &str = "rsync";
const MAKEPKG: &str = "makepkg";

/// Runs the pacman/gpg/rsync tool chain found on `PATH`.
pub struct SystemTools;

impl SystemTools {
    /// Run `program` to completion and return its stdout.
    ///
    /// stdout is only captured when `capture` is set, so tools like `rsync -v`
    /// and `repo-add` keep reporting progress on the terminal.
    #[tracing::instrument(level = "debug", skip(self, args))]
    fn run(
        &self,
        program: &str,
        args: Vec<OsString>,
        dir: Option<&Path>,
        capture: bool,
    ) -> Result<String> {
        let executable =
            which::which(program).map_err(|_| RepoError::ToolNotFound(program.to_string()))?;
        debug!("Running {} {:?}", executable.display(), args);

        let mut expression = duct::cmd(executable, args).stderr_capture().unchecked();
        if capture {
            expression = expression.stdout_capture();
        }
        if let Some(dir) = dir {
            expression = expression.dir(dir);
        }

        let output = expression
            .run()
            .with_context(|| format!("Failed to run {}", program))?;

        if !output.status.success() {
            return Err(RepoError::Subprocess {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn sign_args(path: &Path, signature: &Path) -> Vec<OsString> {
    vec![
        "--output".into(),
        signature.into(),
        "--detach-sign".into(),
        path.into(),
    ]
}

fn repo_add_args(database: &str, package: &str, sign: bool) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![database.into(), package.into()];
    if sign {
        args.push("--sign".into());
    }
    args
}

fn rsync_args(source: &str, target: &str, delete: bool) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-auv".into()];
    if delete {
        args.push("--delete".into());
    }
    args.push(source.into());
    args.push(target.into());
    args
}

impl Tools for SystemTools {
    fn vercmp(&self, version: &str, other: &str) -> Result<Ordering> {
        let output = self.run(VERCMP, vec![version.into(), other.into()], None, true)?;
        parse_vercmp_output(&output)
    }

    fn query_package(&self, path: &Path) -> Result<(String, String)> {
        let output = self.run(PACMAN, vec!["-Qp".into(), path.into()], None, true)?;
        parse_query_output(&output)
    }

    fn sign(&self, path: &Path, signature: &Path) -> Result<()> {
        self.run(GPG, sign_args(path, signature), None, false)?;
        Ok(())
    }

    fn repo_add(&self, basedir: &Path, database: &str, package: &str, sign: bool) -> Result<()> {
        self.run(
            REPO_ADD,
            repo_add_args(database, package, sign),
            Some(basedir),
            false,
        )?;
        Ok(())
    }

    fn rsync(&self, basedir: &Path, source: &str, target: &str, delete: bool) -> Result<()> {
        self.run(RSYNC, rsync_args(source, target, delete), Some(basedir), false)?;
        Ok(())
    }

    fn package_list(&self, pkgdir: &Path) -> Result<Vec<PathBuf>> {
        let output = self.run(MAKEPKG, vec!["--packagelist".into()], Some(pkgdir), true)?;
        Ok(parse_package_list(&output))
    }
}
