use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes through a sibling temp file, then renames it over `path`. The
/// rename replaces the previous save in one step, so readers see either the
/// old contents or the new ones and a failed write leaves the old save alone.
pub(crate) fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let staged = staging_path(path);
    if let Err(error) = fs::write(&staged, text.as_bytes()) {
        let _ = fs::remove_file(&staged);
        return Err(error);
    }
    if let Err(error) = fs::rename(&staged, path) {
        // The target was never touched; only the staged copy is discarded.
        let _ = fs::remove_file(&staged);
        return Err(error);
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("save.json");
    let staged_name = format!(".{file_name}.partial");
    match path.parent() {
        Some(parent) => parent.join(staged_name),
        None => PathBuf::from(staged_name),
    }
}
