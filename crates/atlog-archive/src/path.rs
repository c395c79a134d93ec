//! Entry-name sanitization for on-disk output.
//!
//! - Separators: `\` and `/` are both treated as `/`.
//! - Drive prefixes (`C:`), empty, `.` and `..` components are dropped, so
//!   output never leaves the target directory.
//! - Characters that are not portable in file names become `_`.

use std::collections::HashSet;

/// Sanitize a raw entry name into a relative `/`-separated path.
///
/// Returns `None` when nothing usable remains.
#[must_use]
pub fn sanitize_entry_name(raw: &str) -> Option<String> {
    let normalized = raw.replace('\\', "/");
    let mut parts = Vec::new();
    for (i, part) in normalized.split('/').enumerate() {
        let part = if i == 0 { strip_drive(part) } else { part };
        if matches!(part, "" | "." | "..") {
            continue;
        }
        parts.push(portable(part));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn strip_drive(part: &str) -> &str {
    let bytes = part.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        &part[2..]
    } else {
        part
    }
}

fn portable(part: &str) -> String {
    part.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Claim `path` in `used`, appending `_1`, `_2`, ... to the stem on collision.
pub fn unique_path(path: &str, used: &mut HashSet<String>) -> String {
    if used.insert(path.to_string()) {
        return path.to_string();
    }
    let (dir, name) = path.rsplit_once('/').map_or(("", path), |(d, n)| (d, n));
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    let mut n = 1usize;
    loop {
        let candidate_name = ext.map_or_else(
            || format!("{stem}_{n}"),
            |ext| format!("{stem}_{n}.{ext}"),
        );
        let candidate = if dir.is_empty() {
            candidate_name
        } else {
            format!("{dir}/{candidate_name}")
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Directory a nested archive expands into: `<stem>@<index>` beside the
/// entry, relative to its container's output directory.
#[must_use]
pub fn nested_dir(entry_path: &str, index: usize) -> String {
    let (parent, name) = entry_path
        .rsplit_once('/')
        .map_or(("", entry_path), |(d, n)| (d, n));
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    if parent.is_empty() {
        format!("{stem}@{index}")
    } else {
        format!("{parent}/{stem}@{index}")
    }
}

/// Every path of `entries` plus each of their ancestor directories.
pub fn occupied_paths<'a>(entries: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
    let mut occupied = HashSet::new();
    for path in entries {
        let mut end = path.len();
        occupied.insert(path.to_string());
        while let Some(slash) = path[..end].rfind('/') {
            if !occupied.insert(path[..slash].to_string()) {
                break;
            }
            end = slash;
        }
    }
    occupied
}

/// Claim directory `dir` in `used`, appending `_1`, `_2`, ... to its last
/// component while it is already claimed or present in `occupied`.
pub fn unique_dir(dir: &str, used: &mut HashSet<String>, occupied: &HashSet<String>) -> String {
    let mut candidate = dir.to_string();
    let mut n = 1usize;
    while occupied.contains(&candidate) || !used.insert(candidate.clone()) {
        candidate = format!("{dir}_{n}");
        n += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("logs/app.log", Some("logs/app.log"))]
    #[case("logs\\win\\app.log", Some("logs/win/app.log"))]
    #[case("../../etc/passwd", Some("etc/passwd"))]
    #[case("/abs/./file.txt", Some("abs/file.txt"))]
    #[case("C:\\Windows\\evil.dll", Some("Windows/evil.dll"))]
    #[case("a/../../b", Some("a/b"))]
    #[case("what?.txt", Some("what_.txt"))]
    #[case("..", None)]
    #[case("./", None)]
    #[case("", None)]
    fn sanitizes_entry_names(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(sanitize_entry_name(raw).as_deref(), expected);
    }

    #[test]
    fn duplicates_get_numbered_suffixes() {
        let mut used = HashSet::new();
        assert_eq!(unique_path("logs/a.txt", &mut used), "logs/a.txt");
        assert_eq!(unique_path("logs/a.txt", &mut used), "logs/a_1.txt");
        assert_eq!(unique_path("logs/a.txt", &mut used), "logs/a_2.txt");
        assert_eq!(unique_path("README", &mut used), "README");
        assert_eq!(unique_path("README", &mut used), "README_1");
    }

    #[test]
    fn nested_dir_sits_beside_entry() {
        assert_eq!(nested_dir("logs/inner.zip", 3), "logs/inner@3");
        assert_eq!(nested_dir("inner.zip", 0), "inner@0");
    }

    #[test]
    fn occupied_paths_include_ancestors() {
        let occupied = occupied_paths(["logs/inner@1/diag.trc", "logs/a.txt", "b.txt"]);
        let mut sorted: Vec<_> = occupied.into_iter().collect();
        sorted.sort();
        assert_eq!(
            sorted,
            vec!["b.txt", "logs", "logs/a.txt", "logs/inner@1", "logs/inner@1/diag.trc"]
        );
    }

    #[test]
    fn nested_dir_avoids_occupied_and_claimed_names() {
        let occupied = occupied_paths(["logs/inner@1/diag.trc"]);
        let mut used = HashSet::new();
        assert_eq!(unique_dir("logs/inner@1", &mut used, &occupied), "logs/inner@1_1");
        assert_eq!(unique_dir("logs/inner@1", &mut used, &occupied), "logs/inner@1_2");
        assert_eq!(unique_dir("logs/other@2", &mut used, &occupied), "logs/other@2");
    }
}
