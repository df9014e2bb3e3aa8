use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use fotografiska_core::fingerprint::fingerprint_bytes;
use fotografiska_core::{process, Action, Error, PlacementReport, ProcessOptions, SidecarNaming};
use tempfile::{tempdir, TempDir};

struct Trees {
    _dir: TempDir,
    src: PathBuf,
    dst: PathBuf,
}

fn trees() -> Trees {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    fs::create_dir_all(src.join("nested")).unwrap();
    fs::create_dir_all(&dst).unwrap();
    Trees { _dir: dir, src, dst }
}

fn write(path: &Path, bytes: &[u8]) {
    File::create(path).unwrap().write_all(bytes).unwrap();
    // 2001-06-15T12:00:00Z
    filetime::set_file_mtime(path, FileTime::from_unix_time(992_606_400, 0)).unwrap();
}

fn options(trees: &Trees, dry_run: bool) -> ProcessOptions {
    ProcessOptions {
        source_dir: trees.src.clone(),
        destination_dir: trees.dst.clone(),
        dry_run,
        recursive: true,
        sidecar_naming: SidecarNaming::Bare,
    }
}

fn run(options: &ProcessOptions) -> (fotografiska_core::ProcessResult, Vec<PlacementReport>) {
    let mut reports = Vec::new();
    let result = process(options, &mut |r: &PlacementReport| reports.push(r.clone())).unwrap();
    (result, reports)
}

fn bytes_under(dir: &Path) -> u64 {
    files_under(dir)
        .iter()
        .map(|p| fs::metadata(p).unwrap().len())
        .sum()
}

fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<_> = walkdir(dir);
    files.sort();
    files
}

fn walkdir(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            out.extend(walkdir(&path));
        } else {
            out.push(path);
        }
    }
    out
}

#[test]
fn second_run_is_a_no_op() {
    let t = trees();
    write(&t.src.join("clip.mov"), b"first clip");
    write(&t.src.join("nested/other.mp4"), b"second clip");
    write(&t.src.join("nested/clip.mov.xmp"), b"<x:xmpmeta/>");

    let (first, reports) = run(&options(&t, false));
    assert_eq!(first.total, 3);
    assert_eq!(first.written, 3);
    assert_eq!(
        reports.iter().map(|r| (r.index, r.total)).collect::<Vec<_>>(),
        vec![(1, 3), (2, 3), (3, 3)]
    );
    let placed = files_under(&t.dst);
    assert_eq!(placed.len(), 3);

    let (second, reports) = run(&options(&t, false));
    assert_eq!(second.skipped, 3);
    assert_eq!(second.bytes_written, 0);
    assert!(reports.iter().all(|r| r.exists && !r.invalid && r.action == Action::Skip));
    assert_eq!(files_under(&t.dst), placed);
}

#[test]
fn sidecar_gets_no_fingerprint() {
    let t = trees();
    write(&t.src.join("foo.jpg.xmp"), b"<x:xmpmeta/>");

    let (_, reports) = run(&options(&t, false));
    assert!(!reports[0].is_media);
    assert_eq!(reports[0].destination.file_name().unwrap(), "foo.jpg.xmp");
}

#[test]
fn corrupt_destination_is_rewritten() {
    let t = trees();
    write(&t.src.join("clip.mov"), b"first clip");
    let (_, reports) = run(&options(&t, false));
    let dest = reports[0].destination.clone();
    assert!(dest
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .contains(&fingerprint_bytes(b"first clip").to_string()));

    fs::write(&dest, b"first cl1p").unwrap();
    let (result, reports) = run(&options(&t, false));
    assert_eq!(result.repaired, 1);
    assert!(reports[0].invalid);
    assert_eq!(fs::read(&dest).unwrap(), b"first clip");

    let (_, reports) = run(&options(&t, false));
    assert!(!reports[0].invalid);
}

#[test]
fn dry_run_leaves_destination_untouched() {
    let t = trees();
    write(&t.src.join("clip.mov"), b"first clip");
    write(&t.src.join("nested/other.mp4"), b"second clip");

    let (result, reports) = run(&options(&t, true));
    assert!(result.dry_run);
    assert_eq!(result.written, 2);
    assert_eq!(result.bytes_written, 0);
    assert!(reports.iter().all(|r| r.dry_run && r.bytes_written == 0));
    assert!(files_under(&t.dst).is_empty());
    assert!(fs::read_dir(&t.dst).unwrap().next().is_none());
}

#[test]
fn dry_run_never_adds_bytes() {
    let t = trees();
    write(&t.src.join("clip.mov"), b"first clip");
    write(&t.src.join("nested/other.mp4"), b"second clip");
    run(&options(&t, false));
    write(&t.src.join("new.mov"), b"third clip");

    let placed = files_under(&t.dst);
    let before = bytes_under(&t.dst);
    let (result, _) = run(&options(&t, true));
    assert_eq!(result.written, 1);
    assert_eq!(result.skipped, 2);
    assert_eq!(bytes_under(&t.dst), before);
    assert_eq!(files_under(&t.dst), placed);
}

#[test]
fn flat_run_skips_nested_files() {
    let t = trees();
    write(&t.src.join("clip.mov"), b"first clip");
    write(&t.src.join("nested/other.mp4"), b"second clip");

    let mut opts = options(&t, false);
    opts.recursive = false;
    let (result, reports) = run(&opts);
    assert_eq!(result.total, 1);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].source_name, "clip.mov");
    assert_eq!(files_under(&t.dst).len(), 1);
}

#[test]
fn previously_organized_files_keep_their_name() {
    let t = trees();
    let legacy = "2021.01.29_17.17.31_60132e3223bcaafe_IMG_E8373.MOV";
    write(&t.src.join(legacy), b"old run");

    let (_, reports) = run(&options(&t, false));
    let expected = t.dst.join("2021/01").join(format!(
        "2021.01.29_17.17.31-{}-IMG_E8373.MOV",
        fingerprint_bytes(b"old run")
    ));
    assert_eq!(reports[0].destination, expected);
    assert!(expected.exists());
}

#[test]
fn missing_destination_is_fatal() {
    let t = trees();
    let mut opts = options(&t, false);
    opts.destination_dir = t.dst.join("missing");

    let err = process(&opts, &mut |_: &PlacementReport| {}).unwrap_err();
    assert!(matches!(err, Error::MissingDirectory(_)));
}

#[test]
fn file_as_destination_is_fatal() {
    let t = trees();
    let file = t.dst.join("file.txt");
    fs::write(&file, b"x").unwrap();
    let mut opts = options(&t, false);
    opts.destination_dir = file;

    let err = process(&opts, &mut |_: &PlacementReport| {}).unwrap_err();
    assert!(matches!(err, Error::NotADirectory(_)));
}
