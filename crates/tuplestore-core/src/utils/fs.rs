use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Find files recursively in a directory that match a predicate
///
/// A missing directory yields no files rather than an error. Symlinked
/// directories are not descended into, so link cycles cannot recurse
/// forever; symlinks to files are reported like files.
pub fn find_files<P, F>(path: P, predicate: &F) -> io::Result<Vec<PathBuf>>
where
    P: AsRef<Path>,
    F: Fn(&Path) -> bool + ?Sized,
{
    let mut result = Vec::new();

    if !path.as_ref().exists() {
        return Ok(result);
    }

    if path.as_ref().is_file() {
        if predicate(path.as_ref()) {
            result.push(path.as_ref().to_path_buf());
        }
        return Ok(result);
    }

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let entry_path = entry.path();
        // Unlike Path::is_dir, this does not follow symlinks
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            let mut sub_results = find_files(&entry_path, predicate)?;
            result.append(&mut sub_results);
        } else if file_type.is_file() || (file_type.is_symlink() && entry_path.is_file()) {
            if predicate(&entry_path) {
                result.push(entry_path);
            }
        }
    }

    Ok(result)
}

/// Render `path` relative to `base` with `/` separators.
///
/// Returns `None` if `path` is not under `base`, or if a component is not
/// valid UTF-8 or is not a plain name.
pub fn relative_slash_path(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let mut names = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => names.push(name.to_str()?),
            _ => return None,
        }
    }
    if names.is_empty() {
        return None;
    }
    Some(names.join("/"))
}

/// Create a directory and all of its parents
pub fn create_dir_all<P: AsRef<Path>>(path: P) -> io::Result<()> {
    fs::create_dir_all(path)
}
