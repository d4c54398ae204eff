//! Confinement checks for destructive filesystem operations.

use std::path::{Component, Path, PathBuf};

/// Lexically resolves `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn has_named_component(path: &Path) -> bool {
    path.components().any(|c| matches!(c, Component::Normal(_)))
}

fn strictly_below(root: &Path, candidate: &Path) -> bool {
    candidate != root && candidate.starts_with(root)
}

/// Returns true if `candidate` lies strictly below `root`.
///
/// Fails closed: a root without any named component (`/`, empty), a path
/// that still climbs out with `..` after normalization, the root itself, or
/// an existing path whose canonical form resolves outside the canonical root
/// are all rejected.
pub fn is_confined(root: &Path, candidate: &Path) -> bool {
    let root = normalize(root);
    let candidate = normalize(candidate);

    if !has_named_component(&root) {
        return false;
    }
    if candidate
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return false;
    }
    if !strictly_below(&root, &candidate) {
        return false;
    }

    if candidate.symlink_metadata().is_ok() {
        let canonical_root = match root.canonicalize() {
            Ok(path) => path,
            Err(_) => return false,
        };
        return match candidate.canonicalize() {
            Ok(path) => strictly_below(&canonical_root, &path),
            Err(_) => false,
        };
    }

    true
}
