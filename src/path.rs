//! Remote path composition.
//!
//! Remote SFTP paths always use `/`, whatever the local or remote OS is.

pub const SEPARATOR: char = '/';

/// Joins a directory and a bare name with a single separator.
#[must_use]
pub fn join(directory: &str, name: &str) -> String {
    if directory.is_empty() {
        name.to_owned()
    } else if directory.ends_with(SEPARATOR) {
        format!("{directory}{name}")
    } else {
        format!("{directory}{SEPARATOR}{name}")
    }
}

/// Returns the last component of `path`, ignoring trailing separators.
#[must_use]
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEPARATOR);
    match trimmed.rfind(SEPARATOR) {
        Some(index) => &trimmed[index + 1..],
        None => trimmed,
    }
}

/// Returns `path` without its last component.
///
/// `"/home/a.txt"` gives `"/home"`, `"/a"` gives `"/"` and a bare name gives `""`.
#[must_use]
pub fn parent(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEPARATOR);
    match trimmed.rfind(SEPARATOR) {
        Some(0) => "/",
        Some(index) => &trimmed[..index],
        None if path.starts_with(SEPARATOR) => "/",
        None => "",
    }
}

/// Whether `name` can be appended to a directory as exactly one component.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(SEPARATOR)
}
