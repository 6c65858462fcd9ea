use chrono::{Datelike, Timelike};
use std::fs;
use std::path::{Path, PathBuf};

const ARCHIVE_DIR_SUFFIX: &str = "-log";
const STEM_DELIMITERS: [char; 7] = ['.', '-', '+', '_', '@', '(', ')'];

/// Cuts `s` at the earliest delimiter found past the first character.
///
/// Only the first occurrence of each delimiter is considered, so a name whose
/// first `.` sits at position 0 keeps any later dots.
pub fn clean_name(s: &str) -> &str {
    let mut l = s.len();
    for d in STEM_DELIMITERS {
        if let Some(i) = s.find(d) {
            if i > 0 && i < l {
                l = i;
            }
        }
    }
    &s[..l]
}

/// Splits a file name into stem and extension; the extension keeps its dot.
pub fn split_ext(base: &str) -> (&str, &str) {
    match base.rfind('.') {
        Some(i) => base.split_at(i),
        None => (base, ""),
    }
}

/// Directory holding the rotated copies of `path`.
pub fn archive_dir(path: &Path) -> PathBuf {
    let base = file_name(path);
    let (name, _) = split_ext(&base);
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    dir.join(format!("{}{}", clean_name(name), ARCHIVE_DIR_SUFFIX))
}

/// Full archive path for `path` rotated at `t`: `<dir>/<stem>.YYYYMMDD-HHMM-SS<ext>`.
///
/// A non-zero `seq` is inserted before the extension (`<stem>.YYYYMMDD-HHMM-SS.<seq><ext>`)
/// to tell apart rotations within the same second.
pub fn archive_path<T>(path: &Path, t: &T, seq: u32) -> PathBuf
where
    T: Datelike + Timelike,
{
    let base = file_name(path);
    let (name, ext) = split_ext(&base);
    let seq = if seq == 0 {
        String::new()
    } else {
        format!(".{}", seq)
    };
    archive_dir(path).join(format!(
        "{}.{:04}{:02}{:02}-{:02}{:02}-{:02}{}{}",
        name,
        t.year(),
        t.month(),
        t.day(),
        t.hour(),
        t.minute(),
        t.second(),
        seq,
        ext
    ))
}

/// First archive path for `t` that does not exist yet.
pub fn free_archive_path<T>(path: &Path, t: &T) -> PathBuf
where
    T: Datelike + Timelike,
{
    let mut seq = 0;
    loop {
        let archive = archive_path(path, t, seq);
        if fs::symlink_metadata(&archive).is_err() {
            return archive;
        }
        seq += 1;
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|v| v.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("app"), "app");
        assert_eq!(clean_name("app.access"), "app");
        assert_eq!(clean_name("my-app_v2"), "my");
        assert_eq!(clean_name("svc+x@host(1)"), "svc");
        assert_eq!(clean_name("a_b-c"), "a");
        assert_eq!(clean_name(".hidden"), ".hidden");
        assert_eq!(clean_name("-x_y"), "-x");
        assert_eq!(clean_name(""), "");
    }

    #[test]
    fn test_split_ext() {
        assert_eq!(split_ext("app.log"), ("app", ".log"));
        assert_eq!(split_ext("app.access.log"), ("app.access", ".log"));
        assert_eq!(split_ext("app"), ("app", ""));
        assert_eq!(split_ext(".bashrc"), ("", ".bashrc"));
    }

    #[test]
    fn test_archive_path() {
        let t = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(9, 3, 7)
            .unwrap();
        assert_eq!(
            archive_dir(Path::new("/var/log/my-app.access.log")),
            PathBuf::from("/var/log/my-log")
        );
        assert_eq!(
            archive_path(Path::new("/var/log/my-app.access.log"), &t, 0),
            PathBuf::from("/var/log/my-log/my-app.access.20240105-0903-07.log")
        );
        assert_eq!(
            archive_path(Path::new("app.log"), &t, 0),
            PathBuf::from("app-log/app.20240105-0903-07.log")
        );
        assert_eq!(
            archive_path(Path::new("logs/server"), &t, 0),
            PathBuf::from("logs/server-log/server.20240105-0903-07")
        );
        assert_eq!(
            archive_path(Path::new("app.log"), &t, 2),
            PathBuf::from("app-log/app.20240105-0903-07.2.log")
        );
    }

    #[test]
    fn test_free_archive_path() {
        let t = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(9, 3, 7)
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::create_dir(dir.path().join("app-log")).unwrap();
        assert_eq!(free_archive_path(&path, &t), archive_path(&path, &t, 0));
        fs::write(archive_path(&path, &t, 0), "a").unwrap();
        fs::write(archive_path(&path, &t, 1), "b").unwrap();
        assert_eq!(free_archive_path(&path, &t), archive_path(&path, &t, 2));
    }
}
