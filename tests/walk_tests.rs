//! End-to-end walks over real directory trees

use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use yfind::{
    drain, FilterConfig, FilterOptions, FilterPipeline, MatchLine, ResultItem, ScanSummary,
    WalkOptions, Walker,
};

fn write(root: &Path, rel: &str, body: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, body).unwrap();
    path
}

fn walk(root: &Path, options: FilterOptions, threads: usize) -> (Vec<ResultItem>, ScanSummary) {
    let config = FilterConfig::new(&options).unwrap();
    let walker = Walker::new(
        FilterPipeline::new(&config),
        WalkOptions {
            num_threads: threads,
            channel_capacity: 10,
        },
    );
    let mut results: Vec<ResultItem> = Vec::new();
    let summary = drain(walker.walk(root).unwrap(), &mut results).unwrap();
    (results, summary)
}

fn paths(results: &[ResultItem]) -> BTreeSet<PathBuf> {
    results.iter().map(|r| r.file_name.clone()).collect()
}

/// A small tree with nested directories and a mix of extensions
fn sample_tree() -> (TempDir, BTreeMap<PathBuf, u64>) {
    let dir = TempDir::new().unwrap();
    let files = [
        ("a.txt", "hello\n"),
        ("b.go", "package main\nfunc main() {}\n"),
        ("x/foo/y.txt", "foo\nbar\nfoobar\n"),
        ("x/foo/z.b.go", "func z() {}\n"),
        ("x/bar/a.go.txt", "nothing here\n"),
        ("deep/1/2/3/4/5/leaf.md", "# leaf\nfoo at the bottom\n"),
        ("empty.dat", ""),
    ];
    let mut expected = BTreeMap::new();
    for (rel, body) in files {
        let path = write(dir.path(), rel, body);
        expected.insert(path, body.len() as u64);
    }
    fs::create_dir_all(dir.path().join("x/empty_dir")).unwrap();
    (dir, expected)
}

#[test]
fn all_filters_disabled_yields_every_regular_file() {
    let (dir, expected) = sample_tree();
    let (results, summary) = walk(dir.path(), FilterOptions::default(), 4);

    let got: BTreeMap<PathBuf, u64> = results
        .iter()
        .map(|r| (r.file_name.clone(), r.file_size))
        .collect();
    assert_eq!(got, expected);
    assert_eq!(results.len(), expected.len());
    assert!(results.iter().all(|r| r.lines.is_empty()));

    assert_eq!(summary.files_visited, expected.len() as u64);
    assert_eq!(summary.files_matched, expected.len() as u64);
    // root, x, x/foo, x/bar, x/empty_dir, deep + 5 nested levels
    assert_eq!(summary.dirs_visited, 11);
    assert!(summary.is_success());
}

#[test]
fn every_file_is_reported_at_most_once() {
    let dir = TempDir::new().unwrap();
    for d in 0..8 {
        for f in 0..30 {
            write(dir.path(), &format!("d{}/f{}.txt", d, f), "needle\n");
        }
    }

    for content in ["", "needle"] {
        let (results, _) = walk(
            dir.path(),
            FilterOptions {
                content: content.to_string(),
                ..Default::default()
            },
            3,
        );
        assert_eq!(results.len(), 240);
        assert_eq!(paths(&results).len(), 240);
    }
}

#[test]
fn repeated_walks_produce_identical_sets() {
    let (dir, _) = sample_tree();
    let options = FilterOptions {
        content: "foo".to_string(),
        ..Default::default()
    };

    let (first, _) = walk(dir.path(), options.clone(), 4);
    let (second, _) = walk(dir.path(), options, 1);

    let key = |items: &[ResultItem]| -> BTreeSet<(PathBuf, u64, Vec<(u64, String)>)> {
        items
            .iter()
            .map(|r| {
                let lines = r.lines.iter().map(|l| (l.line_number, l.content.clone())).collect();
                (r.file_name.clone(), r.file_size, lines)
            })
            .collect()
    };
    assert_eq!(key(&first), key(&second));
}

#[test]
fn per_file_fan_out_does_not_change_the_result_set() {
    let dir = TempDir::new().unwrap();
    for i in 0..60 {
        write(dir.path(), &format!("s{}/file{}.log", i % 7, i), "x marks the spot\n");
    }

    let (inline, _) = walk(dir.path(), FilterOptions::default(), 4);
    let (fanned, summary) = walk(
        dir.path(),
        FilterOptions {
            content: "x".to_string(),
            ..Default::default()
        },
        4,
    );

    assert_eq!(paths(&inline), paths(&fanned));
    assert_eq!(summary.lines_matched, 60);
}

#[test]
fn content_filter_records_matching_lines_in_order() {
    let (dir, _) = sample_tree();
    let (results, _) = walk(
        dir.path(),
        FilterOptions {
            content: "foo".to_string(),
            extensions: "txt".to_string(),
            ..Default::default()
        },
        2,
    );

    assert_eq!(results.len(), 1);
    let item = &results[0];
    assert_eq!(item.file_name, dir.path().join("x/foo/y.txt"));
    assert_eq!(item.file_size, "foo\nbar\nfoobar\n".len() as u64);
    assert_eq!(
        item.lines,
        vec![MatchLine::hit(1, "foo"), MatchLine::hit(3, "foobar")]
    );
}

#[test]
fn extension_filter_uses_suffix_after_last_dot() {
    let (dir, _) = sample_tree();
    let (results, _) = walk(
        dir.path(),
        FilterOptions {
            extensions: "go".to_string(),
            ..Default::default()
        },
        2,
    );

    let expected: BTreeSet<PathBuf> = [dir.path().join("b.go"), dir.path().join("x/foo/z.b.go")]
        .into_iter()
        .collect();
    assert_eq!(paths(&results), expected);
}

#[test]
fn name_filter_matches_parent_directories() {
    let (dir, _) = sample_tree();
    let (results, _) = walk(
        dir.path(),
        FilterOptions {
            name: "foo/".to_string(),
            ..Default::default()
        },
        2,
    );

    let expected: BTreeSet<PathBuf> = [
        dir.path().join("x/foo/y.txt"),
        dir.path().join("x/foo/z.b.go"),
    ]
    .into_iter()
    .collect();
    assert_eq!(paths(&results), expected);
}

#[test]
fn size_bounds_are_inclusive() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "under.bin", &"a".repeat(1023));
    write(dir.path(), "exact.bin", &"a".repeat(1024));
    write(dir.path(), "upper.bin", &"a".repeat(2048));
    write(dir.path(), "over.bin", &"a".repeat(2049));

    let (results, _) = walk(
        dir.path(),
        FilterOptions {
            size_greater: "1k".to_string(),
            size_less: "2K".to_string(),
            ..Default::default()
        },
        2,
    );

    let expected: BTreeSet<PathBuf> = [dir.path().join("exact.bin"), dir.path().join("upper.bin")]
        .into_iter()
        .collect();
    assert_eq!(paths(&results), expected);
}

#[test]
fn trailing_separator_on_root_is_normalized() {
    let (dir, expected) = sample_tree();
    let mut root = dir.path().as_os_str().to_owned();
    root.push("/");

    let (results, _) = walk(Path::new(&root), FilterOptions::default(), 2);
    let expected: BTreeSet<PathBuf> = expected.into_keys().collect();
    assert_eq!(paths(&results), expected);
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    use std::os::unix::fs::{symlink, PermissionsExt};

    fn lock(path: &Path) {
        fs::set_permissions(path, fs::Permissions::from_mode(0o000)).unwrap();
    }

    fn unlock(path: &Path, mode: u32) {
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn unreadable_directory_is_skipped() {
        let (dir, expected) = sample_tree();
        let locked = dir.path().join("locked");
        write(dir.path(), "locked/secret.txt", "foo\n");
        lock(&locked);

        if fs::read_dir(&locked).is_ok() {
            // Privileged users bypass the mode bits; the walker unit tests
            // cover this path with a directory that vanished instead
            eprintln!("skipped: permissions are not enforced for this user");
            unlock(&locked, 0o755);
            return;
        }

        let (results, summary) = walk(dir.path(), FilterOptions::default(), 4);
        unlock(&locked, 0o755);

        let expected: BTreeSet<PathBuf> = expected.into_keys().collect();
        assert_eq!(paths(&results), expected);
        assert_eq!(summary.dir_errors, 1);
    }

    #[test]
    fn unreadable_file_is_a_non_match() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "ok.txt", "foo\n");
        let secret = write(dir.path(), "sub/secret.txt", "foo\n");
        write(dir.path(), "sub/other.txt", "foo\n");
        lock(&secret);

        if fs::File::open(&secret).is_ok() {
            eprintln!("skipped: permissions are not enforced for this user");
            unlock(&secret, 0o644);
            return;
        }

        let (results, summary) = walk(
            dir.path(),
            FilterOptions {
                content: "foo".to_string(),
                ..Default::default()
            },
            4,
        );
        unlock(&secret, 0o644);

        let expected: BTreeSet<PathBuf> = [
            dir.path().join("ok.txt"),
            dir.path().join("sub/other.txt"),
        ]
        .into_iter()
        .collect();
        assert_eq!(paths(&results), expected);
        assert_eq!(summary.file_errors, 1);
        assert_eq!(summary.files_visited, 3);
    }

    #[test]
    fn non_utf8_names_are_reported() {
        let dir = TempDir::new().unwrap();
        let ok = write(dir.path(), "ok.txt", "foo\n");
        let bad = dir.path().join(OsStr::from_bytes(b"bad\xff.txt"));
        fs::write(&bad, "foo\n").unwrap();

        let (results, summary) = walk(dir.path(), FilterOptions::default(), 2);
        let expected: BTreeSet<PathBuf> = [ok, bad.clone()].into_iter().collect();
        assert_eq!(paths(&results), expected);
        assert!(summary.is_success());

        let (results, _) = walk(
            dir.path(),
            FilterOptions {
                extensions: "txt".to_string(),
                name: "/bad".to_string(),
                content: "foo".to_string(),
                ..Default::default()
            },
            2,
        );
        let expected: BTreeSet<PathBuf> = [bad].into_iter().collect();
        assert_eq!(paths(&results), expected);
    }

    #[test]
    fn symlinks_are_not_followed() {
        let dir = TempDir::new().unwrap();
        let target = write(dir.path(), "real/file.txt", "data");
        symlink(&target, dir.path().join("link.txt")).unwrap();
        symlink(dir.path().join("real"), dir.path().join("real_link")).unwrap();
        // A cycle back to the root must not be traversed
        symlink(dir.path(), dir.path().join("real/loop")).unwrap();

        let (results, _) = walk(dir.path(), FilterOptions::default(), 2);
        let expected: BTreeSet<PathBuf> = [target].into_iter().collect();
        assert_eq!(paths(&results), expected);
    }
}

fn arb_tree() -> impl Strategy<Value = BTreeSet<String>> {
    let segment = "[a-c]{1,2}";
    prop::collection::btree_set(
        prop::collection::vec(segment, 1..4).prop_map(|parts| {
            parts
                .iter()
                .enumerate()
                .map(|(i, p)| if i + 1 == parts.len() { format!("{}.f", p) } else { p.clone() })
                .collect::<Vec<_>>()
                .join("/")
        }),
        0..20,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn walk_reports_exactly_the_files_in_the_tree(files in arb_tree(), threads in 1usize..4) {
        let dir = TempDir::new().unwrap();
        let mut expected = BTreeSet::new();
        for rel in &files {
            expected.insert(write(dir.path(), rel, rel));
        }

        let (results, summary) = walk(dir.path(), FilterOptions::default(), threads);
        prop_assert_eq!(results.len(), expected.len());
        prop_assert_eq!(paths(&results), expected);
        prop_assert!(summary.is_success());
    }
}
