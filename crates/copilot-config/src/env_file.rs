//! azd-style settings store discovery.
//!
//! The Azure Developer CLI keeps per-environment values in
//! `.azure/<environment>/.env`. Lookup walks upward from a start directory to
//! the first ancestor holding a `.azure` directory, then scans each immediate
//! subdirectory's `.env` file in name order.
//!
//! Every I/O error on this path is treated as "not found".

use std::path::{Path, PathBuf};

/// Marker directory searched for while walking up the tree.
pub const MARKER_DIR: &str = ".azure";

/// Settings file name inside each environment directory.
pub const SETTINGS_FILE: &str = ".env";

/// Walk upward from `start` and return the first `.azure` directory found.
pub fn find_marker_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(MARKER_DIR))
        .find(|candidate| candidate.is_dir())
}

/// List the settings files below a marker directory, sorted by environment name.
pub fn settings_files(marker: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(marker) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(path = %marker.display(), error = %e, "Cannot list settings directory");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .map(|dir| dir.join(SETTINGS_FILE))
        .filter(|file| file.is_file())
        .collect();
    files.sort();
    files
}

/// Read `key` from a single settings file.
///
/// Returns the first matching line's value even when it is empty; callers
/// decide whether an empty value counts. Invalid UTF-8 is replaced rather
/// than rejected.
pub fn read_value(path: &Path, key: &str) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => find_value(&String::from_utf8_lossy(&bytes), key),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Cannot read settings file");
            None
        }
    }
}

/// Scan `KEY=value` lines for `key` (case-insensitive).
pub fn find_value(contents: &str, key: &str) -> Option<String> {
    contents
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .filter_map(|line| line.split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
        .map(|(_, v)| unquote(v.trim()).to_string())
}

/// Strip one pair of matching surrounding quotes. A lone quote is kept as is.
fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Look `key` up in the settings store reachable from `start`.
///
/// Returns the first non-empty value along with the file it came from.
pub fn lookup(start: &Path, key: &str) -> Option<(String, PathBuf)> {
    let marker = find_marker_dir(start)?;
    settings_files(&marker).into_iter().find_map(|file| {
        read_value(&file, key)
            .filter(|v| !v.is_empty())
            .map(|v| (v, file))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_env(root: &Path, env_name: &str, contents: &str) -> PathBuf {
        let dir = root.join(MARKER_DIR).join(env_name);
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join(SETTINGS_FILE);
        fs::write(&file, contents).unwrap();
        file
    }

    #[test]
    fn test_find_value_basic() {
        let contents = "A=1\nB=two\n";
        assert_eq!(find_value(contents, "B").as_deref(), Some("two"));
        assert_eq!(find_value(contents, "C"), None);
    }

    #[test]
    fn test_find_value_case_insensitive_key() {
        let contents = "power_platform_username=alice@contoso.com";
        assert_eq!(
            find_value(contents, "POWER_PLATFORM_USERNAME").as_deref(),
            Some("alice@contoso.com")
        );
    }

    #[test]
    fn test_find_value_strips_matching_quotes() {
        let contents = "A=\"quoted\"\nB='single'\nC=\"mismatched'\nD=\"\n";
        assert_eq!(find_value(contents, "A").as_deref(), Some("quoted"));
        assert_eq!(find_value(contents, "B").as_deref(), Some("single"));
        assert_eq!(find_value(contents, "C").as_deref(), Some("\"mismatched'"));
        assert_eq!(find_value(contents, "D").as_deref(), Some("\""));
    }

    #[test]
    fn test_find_value_skips_comments_and_blanks() {
        let contents = "# A=commented\n\n   \n  # A=indented comment\nA=real\n";
        assert_eq!(find_value(contents, "A").as_deref(), Some("real"));
    }

    #[test]
    fn test_find_value_splits_on_first_equals() {
        let contents = "TOKEN = abc=def== \n";
        assert_eq!(find_value(contents, "TOKEN").as_deref(), Some("abc=def=="));
    }

    #[test]
    fn test_find_value_keeps_dollar_signs() {
        let contents = "POWER_PLATFORM_PASSWORD=\"p$ss${word}\"";
        assert_eq!(
            find_value(contents, "POWER_PLATFORM_PASSWORD").as_deref(),
            Some("p$ss${word}")
        );
    }

    #[test]
    fn test_lookup_walks_up_from_nested_dir() {
        let root = TempDir::new().unwrap();
        write_env(root.path(), "dev", "AZURE_TENANT_ID=tenant-from-file\n");
        let nested = root.path().join("tests").join("Copilot").join("bin");
        fs::create_dir_all(&nested).unwrap();

        let (value, file) = lookup(&nested, "AZURE_TENANT_ID").unwrap();
        assert_eq!(value, "tenant-from-file");
        assert!(file.ends_with(".azure/dev/.env"));
    }

    #[test]
    fn test_lookup_without_marker_is_none() {
        let root = TempDir::new().unwrap();
        assert!(lookup(root.path(), "DEFINITELY_NOT_A_REAL_KEY_9f2c").is_none());
    }

    #[test]
    fn test_lookup_skips_empty_values_across_environments() {
        let root = TempDir::new().unwrap();
        write_env(root.path(), "a-env", "KEY=\n");
        write_env(root.path(), "b-env", "KEY=from-b\n");

        let (value, file) = lookup(root.path(), "KEY").unwrap();
        assert_eq!(value, "from-b");
        assert!(file.to_string_lossy().contains("b-env"));
    }

    #[test]
    fn test_lookup_is_ordered_by_environment_name() {
        let root = TempDir::new().unwrap();
        write_env(root.path(), "zeta", "KEY=z\n");
        write_env(root.path(), "alpha", "KEY=a\n");

        let (value, _) = lookup(root.path(), "KEY").unwrap();
        assert_eq!(value, "a");
    }

    #[test]
    fn test_settings_files_ignores_loose_files() {
        let root = TempDir::new().unwrap();
        let marker = root.path().join(MARKER_DIR);
        fs::create_dir_all(&marker).unwrap();
        fs::write(marker.join("config.json"), "{}").unwrap();
        fs::create_dir_all(marker.join("empty-env")).unwrap();
        write_env(root.path(), "dev", "A=1\n");

        let files = settings_files(&marker);
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_read_value_tolerates_invalid_utf8() {
        let root = TempDir::new().unwrap();
        let file = write_env(root.path(), "dev", "");
        fs::write(&file, b"# caf\xe9 settings\nAZURE_TENANT_ID=contoso\n").unwrap();

        assert_eq!(read_value(&file, "AZURE_TENANT_ID").as_deref(), Some("contoso"));
        let (value, _) = lookup(root.path(), "AZURE_TENANT_ID").unwrap();
        assert_eq!(value, "contoso");
    }

    #[test]
    fn test_read_value_missing_file_is_none() {
        let root = TempDir::new().unwrap();
        assert!(read_value(&root.path().join("missing.env"), "A").is_none());
    }
}
