//! Log file retention management
//!
//! Prunes the rotated files of one component, by age or by count. The active
//! file and files belonging to other components are never touched.

use logrig_core::{NamingTemplate, RetentionRule};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Apply `retention` to the rotated files of `component` in `dir`
///
/// Returns the files deleted.
pub fn clean_rotated(
    dir: &Path,
    component: &str,
    naming: &NamingTemplate,
    retention: RetentionRule,
) -> io::Result<Vec<PathBuf>> {
    clean_rotated_at(dir, component, naming, retention, SystemTime::now())
}

/// [`clean_rotated`] against a fixed notion of "now"
pub fn clean_rotated_at(
    dir: &Path,
    component: &str,
    naming: &NamingTemplate,
    retention: RetentionRule,
    now: SystemTime,
) -> io::Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let pattern = naming
        .rotated_pattern(component)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    let active = naming.active_file(component);

    let mut rotated = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if file_name == active || !pattern.is_match(&file_name) {
            continue;
        }
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        rotated.push((modified, entry.path()));
    }

    // newest first; names break ties so the order is stable
    rotated.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

    let doomed: Vec<PathBuf> = match retention {
        RetentionRule::MaxCount(keep) => rotated.into_iter().skip(keep).map(|(_, p)| p).collect(),
        RetentionRule::MaxAge { seconds } => {
            let cutoff = now
                .checked_sub(std::time::Duration::from_secs(seconds))
                .unwrap_or(SystemTime::UNIX_EPOCH);
            rotated
                .into_iter()
                .filter(|(modified, _)| *modified < cutoff)
                .map(|(_, p)| p)
                .collect()
        }
    };

    let mut deleted = Vec::with_capacity(doomed.len());
    for path in doomed {
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed expired log file: {}", path.display());
                deleted.push(path);
            }
            // raced with another cleaner
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn naming() -> NamingTemplate {
        NamingTemplate::new("[{name}]daily_latest.temp.log", "[{name}]{YYYYMMDD}.log")
    }

    fn touch(dir: &Path, name: &str, age: Duration) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
        path
    }

    #[test]
    fn test_cleanup_nonexistent_dir() {
        let deleted = clean_rotated(
            Path::new("/nonexistent/path/for/testing"),
            "svc",
            &naming(),
            RetentionRule::MaxCount(1),
        )
        .unwrap();
        assert!(deleted.is_empty());
    }

    #[test]
    fn test_cleanup_by_count_keeps_newest() {
        let dir = TempDir::new().unwrap();
        let day = Duration::from_secs(86_400);
        let oldest = touch(dir.path(), "[svc]20250110.log", day * 3);
        let middle = touch(dir.path(), "[svc]20250111.log.gz", day * 2);
        let newest = touch(dir.path(), "[svc]20250112.log", day);

        let deleted = clean_rotated(dir.path(), "svc", &naming(), RetentionRule::MaxCount(2)).unwrap();
        assert_eq!(deleted, vec![oldest.clone()]);
        assert!(!oldest.exists());
        assert!(middle.exists());
        assert!(newest.exists());
    }

    #[test]
    fn test_cleanup_by_age() {
        let dir = TempDir::new().unwrap();
        let day = Duration::from_secs(86_400);
        let old = touch(dir.path(), "[svc]20241201.log", day * 40);
        let recent = touch(dir.path(), "[svc]20250112.log", day);

        let retention = RetentionRule::MaxAge {
            seconds: 30 * 86_400,
        };
        let deleted = clean_rotated(dir.path(), "svc", &naming(), retention).unwrap();
        assert_eq!(deleted, vec![old]);
        assert!(recent.exists());
    }

    #[test]
    fn test_cleanup_ignores_active_and_foreign_files() {
        let dir = TempDir::new().unwrap();
        let ancient = Duration::from_secs(86_400 * 365);
        let active = touch(dir.path(), "[svc]daily_latest.temp.log", ancient);
        let other = touch(dir.path(), "[db]20200101.log", ancient);
        let notes = touch(dir.path(), "[svc]notes.txt", ancient);

        let deleted = clean_rotated(dir.path(), "svc", &naming(), RetentionRule::MaxCount(1)).unwrap();
        assert!(deleted.is_empty());
        assert!(active.exists());
        assert!(other.exists());
        assert!(notes.exists());
    }

    #[test]
    fn test_cleanup_spares_component_sharing_a_prefix() {
        let dir = TempDir::new().unwrap();
        let simple = NamingTemplate::new("{name}.log", "{name}.{timestamp}.log");
        let day = Duration::from_secs(86_400);
        let active = touch(dir.path(), "svc.log", day * 10);
        let neighbour_active = touch(dir.path(), "svc.api.log", day * 10);
        let neighbour_rotated = touch(dir.path(), "svc.api.20250101-000000.log", day * 9);
        let old = touch(dir.path(), "svc.20250101-000000.log", day * 3);
        let newer = touch(dir.path(), "svc.20250102-000000.1.log.gz", day * 2);
        let newest = touch(dir.path(), "svc.20250103-000000.log", day);

        let deleted = clean_rotated(dir.path(), "svc", &simple, RetentionRule::MaxCount(1)).unwrap();
        assert_eq!(deleted.len(), 2);
        assert!(deleted.contains(&old));
        assert!(deleted.contains(&newer));
        assert!(newest.exists());
        assert!(active.exists());
        assert!(neighbour_active.exists());
        assert!(neighbour_rotated.exists());
    }
}
