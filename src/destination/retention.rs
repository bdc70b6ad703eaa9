//! Backup set management for rotated log files
//!
//! Size rotation keeps numbered backups (`app.log.1` is the newest). Time
//! rotation keeps backups suffixed with the start of the period they cover
//! (`app.log.2026-01-21`). Both are bounded by a backup count.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};

use super::policy::RotateWhen;

/// `<base>.<index>`
pub fn size_backup_path(base: &Path, index: usize) -> PathBuf {
    with_suffix(base, &index.to_string())
}

/// `<base>.<period start formatted for the interval>`
pub fn time_backup_path(base: &Path, period_start: DateTime<Local>, when: RotateWhen) -> PathBuf {
    let suffix = period_start.format(when.suffix_format()).to_string();
    with_suffix(base, &suffix)
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Shift numbered backups up by one and move `base` into slot 1
///
/// The backup in slot `backup_count` is overwritten. Any error aborts the
/// shift and leaves `base` in place.
pub fn shift_size_backups(base: &Path, backup_count: usize) -> io::Result<()> {
    for index in (1..backup_count).rev() {
        let source = size_backup_path(base, index);
        let dest = size_backup_path(base, index + 1);
        if source.exists() {
            if dest.exists() {
                fs::remove_file(&dest)?;
            }
            fs::rename(&source, &dest)?;
        }
    }

    let first = size_backup_path(base, 1);
    if first.exists() {
        fs::remove_file(&first)?;
    }
    if base.exists() {
        fs::rename(base, &first)?;
    }
    Ok(())
}

/// Delete numbered backups with an index above `backup_count`
///
/// Returns the number of files deleted.
pub fn prune_size_backups(base: &Path, backup_count: usize) -> io::Result<usize> {
    let mut deleted_count = 0;
    for (index, path) in size_backups(base)? {
        if index > backup_count {
            fs::remove_file(&path)?;
            deleted_count += 1;
        }
    }
    Ok(deleted_count)
}

/// All numbered backups of `base`, ordered newest (index 1) first
pub fn size_backups(base: &Path) -> io::Result<Vec<(usize, PathBuf)>> {
    let mut backups: Vec<(usize, PathBuf)> = sibling_suffixes(base)?
        .into_iter()
        .filter_map(|(suffix, path)| {
            if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            suffix.parse::<usize>().ok().map(|index| (index, path))
        })
        .filter(|(index, _)| *index > 0)
        .collect();
    backups.sort_by_key(|(index, _)| *index);
    Ok(backups)
}

/// Delete the oldest time-suffixed backups so that at most `backup_count` remain
///
/// Returns the number of files deleted.
pub fn prune_time_backups(base: &Path, when: RotateWhen, backup_count: usize) -> io::Result<usize> {
    let backups = time_backups(base, when)?;
    if backups.len() <= backup_count {
        return Ok(0);
    }

    let excess = backups.len() - backup_count;
    let mut deleted_count = 0;
    for path in backups.into_iter().take(excess) {
        fs::remove_file(&path)?;
        deleted_count += 1;
    }
    Ok(deleted_count)
}

/// All time-suffixed backups of `base` for `when`, ordered oldest first
pub fn time_backups(base: &Path, when: RotateWhen) -> io::Result<Vec<PathBuf>> {
    let shape = suffix_shape(when);
    let mut backups: Vec<(String, PathBuf)> = sibling_suffixes(base)?
        .into_iter()
        .filter(|(suffix, _)| matches_shape(suffix, &shape))
        .collect();
    // zero-padded suffixes sort chronologically
    backups.sort();
    Ok(backups.into_iter().map(|(_, path)| path).collect())
}

/// Files next to `base` named `<base file name>.<suffix>`, with their suffix
fn sibling_suffixes(base: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let Some(file_name) = base.file_name().and_then(|n| n.to_str()) else {
        return Ok(Vec::new());
    };
    let dir = match base.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let prefix = format!("{}.", file_name);
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(suffix) = name.strip_prefix(&prefix) {
            found.push((suffix.to_string(), dir.join(name)));
        }
    }
    Ok(found)
}

/// A rendering of the suffix format used as a digit/separator template
fn suffix_shape(when: RotateWhen) -> String {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.format(when.suffix_format()).to_string())
        .unwrap_or_default()
}

fn matches_shape(suffix: &str, shape: &str) -> bool {
    suffix.len() == shape.len()
        && suffix.bytes().zip(shape.bytes()).all(|(s, t)| {
            if t.is_ascii_digit() {
                s.is_ascii_digit()
            } else {
                s == t
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(path: &Path, content: &str) {
        File::create(path)
            .unwrap()
            .write_all(content.as_bytes())
            .unwrap();
    }

    #[test]
    fn test_size_backup_path() {
        let base = PathBuf::from("/var/log/app.log");
        assert_eq!(size_backup_path(&base, 3), PathBuf::from("/var/log/app.log.3"));
    }

    #[test]
    fn test_time_backup_path_per_interval() {
        let base = PathBuf::from("logs/app.log");
        let start = Local.with_ymd_and_hms(2026, 1, 21, 14, 30, 45).unwrap();
        assert_eq!(
            time_backup_path(&base, start, RotateWhen::Second),
            PathBuf::from("logs/app.log.2026-01-21_14-30-45")
        );
        assert_eq!(
            time_backup_path(&base, start, RotateWhen::Hour),
            PathBuf::from("logs/app.log.2026-01-21_14")
        );
        assert_eq!(
            time_backup_path(&base, start, RotateWhen::Midnight),
            PathBuf::from("logs/app.log.2026-01-21")
        );
    }

    #[test]
    fn test_shift_size_backups() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("app.log");
        touch(&base, "current");
        touch(&size_backup_path(&base, 1), "one");
        touch(&size_backup_path(&base, 2), "two");

        shift_size_backups(&base, 3).unwrap();

        assert!(!base.exists());
        let read = |i| fs::read_to_string(size_backup_path(&base, i)).unwrap();
        assert_eq!(read(1), "current");
        assert_eq!(read(2), "one");
        assert_eq!(read(3), "two");
    }

    #[test]
    fn test_shift_drops_oldest_at_capacity() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("app.log");
        touch(&base, "current");
        touch(&size_backup_path(&base, 1), "one");
        touch(&size_backup_path(&base, 2), "two");

        shift_size_backups(&base, 2).unwrap();

        assert_eq!(fs::read_to_string(size_backup_path(&base, 1)).unwrap(), "current");
        assert_eq!(fs::read_to_string(size_backup_path(&base, 2)).unwrap(), "one");
        assert!(!size_backup_path(&base, 3).exists());
    }

    #[test]
    fn test_prune_size_backups_removes_leftovers() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("app.log");
        for i in 1..=5 {
            touch(&size_backup_path(&base, i), "x");
        }
        touch(&temp_dir.path().join("app.log.bak"), "not a backup");

        let deleted = prune_size_backups(&base, 2).unwrap();

        assert_eq!(deleted, 3);
        let remaining: Vec<usize> = size_backups(&base).unwrap().into_iter().map(|(i, _)| i).collect();
        assert_eq!(remaining, vec![1, 2]);
        assert!(temp_dir.path().join("app.log.bak").exists());
    }

    #[test]
    fn test_prune_time_backups_keeps_newest() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("app.log");
        for day in ["2026-01-18", "2026-01-19", "2026-01-20", "2026-01-21"] {
            touch(&temp_dir.path().join(format!("app.log.{}", day)), day);
        }
        // wrong shape for a daily suffix
        touch(&temp_dir.path().join("app.log.2026-01-17_10"), "hourly");

        let deleted = prune_time_backups(&base, RotateWhen::Day, 2).unwrap();

        assert_eq!(deleted, 2);
        let names: Vec<String> = time_backups(&base, RotateWhen::Day)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["app.log.2026-01-20", "app.log.2026-01-21"]);
        assert!(temp_dir.path().join("app.log.2026-01-17_10").exists());
    }

    #[test]
    fn test_prune_nonexistent_dir() {
        let base = Path::new("/nonexistent/path/for/testing/app.log");
        assert_eq!(prune_time_backups(base, RotateWhen::Day, 1).unwrap(), 0);
        assert_eq!(prune_size_backups(base, 1).unwrap(), 0);
    }

    #[test]
    fn test_matches_shape() {
        let shape = suffix_shape(RotateWhen::Minute);
        assert_eq!(shape, "2000-01-01_00-00");
        assert!(matches_shape("2026-12-31_23-59", &shape));
        assert!(!matches_shape("2026-12-31_23", &shape));
        assert!(!matches_shape("2026-12-31T23-59", &shape));
    }
}
