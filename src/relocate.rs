//! Locating a subfolder inside a downloaded repository tree and moving it.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// Find the directory holding `subfolder` under `root`.
///
/// The direct join `root/subfolder` wins.  Otherwise the tree is searched for
/// a directory whose name equals the last component of `subfolder`; among
/// several matches the shallowest is taken, ties broken by path order.
pub fn find_subfolder(root: &Path, subfolder: &str) -> Option<PathBuf> {
    let direct = root.join(subfolder);
    if direct.is_dir() {
        return Some(direct);
    }

    let name = Path::new(subfolder).file_name()?;
    let mut matches: Vec<(usize, PathBuf)> = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir() && e.file_name() == name)
        .map(|e| (e.depth(), e.into_path()))
        .collect();

    matches.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    if matches.len() > 1 {
        warn!(
            subfolder,
            candidates = matches.len(),
            chosen = %matches[0].1.display(),
            "several directories match; using the shallowest"
        );
    }
    matches.into_iter().next().map(|(_, path)| path)
}

/// Move `src` to `dst`.
///
/// Tries a rename first; when that fails (typically across filesystems) the
/// tree is copied and the source removed.  `dst` must be absent or an empty
/// directory.  A failed copy leaves `dst` as it was found.
pub fn move_dir(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(error = %e, "rename failed, copying instead");
            copy_or_discard(src, dst)?;
            fs::remove_dir_all(src)
        }
    }
}

/// [`copy_tree`], undoing a partial copy on failure.
fn copy_or_discard(src: &Path, dst: &Path) -> io::Result<()> {
    let existed = dst.exists();
    copy_tree(src, dst).inspect_err(|_| {
        if let Err(e) = discard(dst, existed) {
            warn!(dst = %dst.display(), error = %e, "cannot remove partial copy");
        }
    })
}

/// Recursively copy `src` into `dst`, following symlinks.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Undo a partial write into `dir`: remove it when this run created it,
/// otherwise empty it and keep the directory itself (it may be a mount point).
pub fn discard(dir: &Path, existed: bool) -> io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    if existed {
        clear_dir(dir)
    } else {
        fs::remove_dir_all(dir)
    }
}

/// Remove every entry inside `dir`.
pub fn clear_dir(dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() && !path.is_symlink() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Copy one file into place, creating parent directories.
pub fn place_file(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst).map(|_| ())
}

/// `true` when `dir` exists and has at least one entry.
pub fn is_non_empty_dir(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_find_direct_join() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("F5TTS_v1_Base_v2")).unwrap();
        assert_eq!(
            find_subfolder(tmp.path(), "F5TTS_v1_Base_v2"),
            Some(tmp.path().join("F5TTS_v1_Base_v2"))
        );
    }

    #[test]
    fn test_find_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("ckpts").join("F5TTS_v1_Base_v2");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_subfolder(tmp.path(), "F5TTS_v1_Base_v2"), Some(nested));
    }

    #[test]
    fn test_find_prefers_shallowest_then_path_order() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("a/b/c/target")).unwrap();
        fs::create_dir_all(tmp.path().join("z/target")).unwrap();
        fs::create_dir_all(tmp.path().join("y/target")).unwrap();
        assert_eq!(
            find_subfolder(tmp.path(), "target"),
            Some(tmp.path().join("y/target"))
        );
    }

    #[test]
    fn test_find_ignores_files_with_same_name() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("other/target"));
        assert_eq!(find_subfolder(tmp.path(), "target"), None);
    }

    #[test]
    fn test_move_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        touch(&src.join("inner/file.bin"));
        let dst = tmp.path().join("out/dst");
        move_dir(&src, &dst).unwrap();
        assert!(!src.exists());
        assert!(dst.join("inner/file.bin").is_file());
    }

    #[test]
    fn test_copy_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        touch(&src.join("a.txt"));
        touch(&src.join("d/b.txt"));
        let dst = tmp.path().join("dst");
        copy_tree(&src, &dst).unwrap();
        assert!(dst.join("a.txt").is_file());
        assert!(dst.join("d/b.txt").is_file());
        assert!(src.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_copy_leaves_no_partial_destination() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        touch(&src.join("a.bin"));
        std::os::unix::fs::symlink(tmp.path().join("gone"), src.join("b.bin")).unwrap();

        let dst = tmp.path().join("dst");
        assert!(copy_or_discard(&src, &dst).is_err());
        assert!(!dst.exists());
        assert!(src.join("a.bin").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_copy_into_existing_dir_empties_it() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        touch(&src.join("a.bin"));
        std::os::unix::fs::symlink(tmp.path().join("gone"), src.join("b.bin")).unwrap();

        let dst = tmp.path().join("mounted");
        fs::create_dir(&dst).unwrap();
        assert!(copy_or_discard(&src, &dst).is_err());
        assert!(dst.is_dir());
        assert!(!is_non_empty_dir(&dst));
    }

    #[test]
    fn test_discard() {
        let tmp = tempfile::tempdir().unwrap();
        let created = tmp.path().join("created");
        touch(&created.join("x/partial.bin"));
        discard(&created, false).unwrap();
        assert!(!created.exists());

        let kept = tmp.path().join("kept");
        touch(&kept.join("x/partial.bin"));
        touch(&kept.join("partial.bin"));
        discard(&kept, true).unwrap();
        assert!(kept.is_dir());
        assert!(!is_non_empty_dir(&kept));

        discard(&tmp.path().join("missing"), false).unwrap();
    }

    #[test]
    fn test_is_non_empty_dir() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!is_non_empty_dir(&tmp.path().join("missing")));
        assert!(!is_non_empty_dir(tmp.path()));
        touch(&tmp.path().join("f"));
        assert!(is_non_empty_dir(tmp.path()));
    }
}
