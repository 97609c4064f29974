// SPDX-License-Identifier: MIT OR Apache-2.0
//! Program lookup on `PATH`.

use std::path::{Path, PathBuf};

/// Locate `program` like the shell's `which`.
///
/// A name with path components is checked as a path; a bare name is
/// searched in each `PATH` directory, trying Windows executable
/// extensions on Windows.
pub fn which(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path).find_map(|dir| resolve_in_dir(&dir, program))
}

/// Returns `true` if [`which`] resolves `program`.
pub fn program_exists(program: &str) -> bool {
    which(program).is_some()
}

fn resolve_in_dir(dir: &Path, program: &str) -> Option<PathBuf> {
    let direct = dir.join(program);
    if direct.is_file() {
        return Some(direct);
    }
    if !cfg!(windows) {
        return None;
    }
    [".exe", ".cmd", ".bat", ".com"]
        .into_iter()
        .map(|ext| dir.join(format!("{program}{ext}")))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_not_found() {
        assert!(!program_exists("no-such-program-cliwrap"));
    }

    #[test]
    fn explicit_paths_are_checked_directly() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("tool");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();
        assert_eq!(which(tool.to_str().unwrap()), Some(tool.clone()));
        assert!(which(dir.path().join("absent").to_str().unwrap()).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn finds_sh_on_path() {
        assert!(which("sh").is_some());
    }
}
