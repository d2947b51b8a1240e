//! Parsers for the output of `vercmp`, `pacman -Qp` and `makepkg --packagelist`.

use anyhow::Result;
use std::cmp::Ordering;
use std::path::PathBuf;

use crate::error::RepoError;

/// `vercmp` prints a negative number, zero or a positive number.
pub fn parse_vercmp_output(output: &str) -> Result<Ordering> {
    let value: i64 = output
        .trim()
        .parse()
        .map_err(|_| RepoError::UnexpectedOutput {
            program: "vercmp".into(),
            output: output.to_string(),
        })?;
    Ok(value.cmp(&0))
}

/// `pacman -Qp <file>` prints a single `name version` line.
pub fn parse_query_output(output: &str) -> Result<(String, String)> {
    let unexpected = || RepoError::UnexpectedOutput {
        program: "pacman".into(),
        output: output.to_string(),
    };

    let line = output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(unexpected)?;

    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(pkgbase), Some(version), None) => Ok((pkgbase.to_string(), version.to_string())),
        _ => Err(unexpected().into()),
    }
}

/// One path per line; the trailing newline must not turn into an empty path.
pub fn parse_package_list(output: &str) -> Vec<PathBuf> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}
