use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use ndimport_import::{CollisionKind, ErrorKind, ImportError, ImportPipeline, ImportRequest, PrunePatterns};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

struct Fixture {
    root: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let root = tempfile::Builder::new().prefix("nd-import-it-").tempdir().unwrap();
        std::fs::create_dir(root.path().join("library")).unwrap();
        std::fs::create_dir(root.path().join("tmp")).unwrap();
        Self { root }
    }

    fn library(&self) -> PathBuf {
        self.root.path().join("library")
    }

    fn tmp(&self) -> PathBuf {
        self.root.path().join("tmp")
    }

    fn archive(&self, files: &[(&str, &[u8])]) -> PathBuf {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in files {
            let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        let bytes = writer.finish().unwrap().into_inner();
        let path = self.root.path().join("download.zip");
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn pipeline(&self, patterns: &[&str]) -> ImportPipeline {
        ImportPipeline::new(self.library())
            .patterns(PrunePatterns::new(patterns).unwrap())
            .tmp_dir(Some(self.tmp()))
    }

    fn tmp_is_empty(&self) -> bool {
        std::fs::read_dir(self.tmp()).unwrap().next().is_none()
    }
}

fn snapshot(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    list_tree(root)
        .into_iter()
        .map(|path| {
            let content = path.is_file().then(|| std::fs::read(&path).unwrap());
            (path.strip_prefix(root).unwrap().to_path_buf(), content)
        })
        .collect()
}

fn list_tree(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if !root.exists() {
        return out;
    }
    for entry in std::fs::read_dir(root).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            out.extend(list_tree(&path));
        }
        out.push(path);
    }
    out
}

#[test]
fn round_trip_extract_prune_merge() {
    let fx = Fixture::new();
    let archive = fx.archive(&[
        ("a.mp3", b"audio"),
        ("notes.txt", b"notes"),
        ("Samples/kick.wav", b"kick"),
    ]);

    let report = fx
        .pipeline(&["*.txt", "Samples/**"])
        .run(&ImportRequest::new("Artist", &archive).downloaded_bytes(4096))
        .unwrap();

    let destination = fx.library().join("Artist");
    assert_eq!(report.destination, destination);
    assert_eq!(report.stats.extracted_entries, 3);
    assert_eq!(report.stats.pruned, 2);
    assert_eq!(report.stats.moved_files, 1);
    assert_eq!(report.stats.download_bytes, Some(4096));

    let expected: BTreeMap<PathBuf, Option<Vec<u8>>> =
        [(PathBuf::from("a.mp3"), Some(b"audio".to_vec()))].into_iter().collect();
    assert_eq!(snapshot(&destination), expected);
    assert!(fx.tmp_is_empty());
}

#[test]
fn prune_everything_leaves_destination_untouched() {
    let fx = Fixture::new();
    let archive = fx.archive(&[("cover.jpg", b"jpeg")]);

    let err = fx
        .pipeline(&["**"])
        .run(&ImportRequest::new("Artist", &archive))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PruneWouldRemoveEverything);
    assert!(!fx.library().join("Artist").exists());
    assert!(fx.tmp_is_empty());
}

#[test]
fn collision_aborts_without_writing() {
    let fx = Fixture::new();
    let album = fx.library().join("Artist/Album");
    std::fs::create_dir_all(&album).unwrap();
    std::fs::write(album.join("song.mp3"), b"original").unwrap();
    let before = snapshot(&fx.library());

    let archive = fx.archive(&[("Album/a-first.mp3", b"new"), ("Album/song.mp3", b"replacement")]);
    let err = fx.pipeline(&[]).run(&ImportRequest::new("Artist", &archive)).unwrap_err();

    match &err {
        ImportError::Collision { path, kind } => {
            assert_eq!(path, &album.join("song.mp3"));
            assert_eq!(*kind, CollisionKind::FileExists);
        }
        other => panic!("expected collision, got {other}"),
    }
    assert_eq!(err.kind(), ErrorKind::Collision);
    assert_eq!(snapshot(&fx.library()), before);
    assert!(fx.tmp_is_empty());
}

#[test]
fn dry_run_reports_counts_without_writing() {
    let fx = Fixture::new();
    let archive = fx.archive(&[
        ("Album/01.mp3", b"one"),
        ("Album/02.mp3", b"two"),
        ("readme.txt", b"read me"),
    ]);

    let report = fx
        .pipeline(&["*.txt"])
        .dry_run(true)
        .run(&ImportRequest::new("Artist", &archive))
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.stats.pruned, 1);
    assert_eq!(report.stats.moved_files, 2);
    assert!(!fx.library().join("Artist").exists());
    assert!(fx.tmp_is_empty());
}

#[test]
fn merge_into_existing_artist() {
    let fx = Fixture::new();
    let existing = fx.library().join("Some Artist/Old Album");
    std::fs::create_dir_all(&existing).unwrap();
    std::fs::write(existing.join("01.flac"), b"old").unwrap();

    let archive = fx.archive(&[("New Album/01.flac", b"new")]);
    let report = fx
        .pipeline(&[])
        .run(&ImportRequest::new("  Some Artist ", &archive))
        .unwrap();

    assert_eq!(report.stats.moved_files, 1);
    let artist = fx.library().join("Some Artist");
    assert_eq!(std::fs::read(artist.join("Old Album/01.flac")).unwrap(), b"old");
    assert_eq!(std::fs::read(artist.join("New Album/01.flac")).unwrap(), b"new");
}

#[test]
fn keep_temp_leaves_staging() {
    let fx = Fixture::new();
    let archive = fx.archive(&[("a.mp3", b"audio")]);

    fx.pipeline(&[])
        .keep_temp(true)
        .run(&ImportRequest::new("Artist", &archive))
        .unwrap();

    let kept: Vec<_> = std::fs::read_dir(fx.tmp()).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(kept.len(), 1);
    assert!(kept[0].join("a.mp3").is_file());
}

#[test]
fn corrupt_archive_is_archive_error() {
    let fx = Fixture::new();
    let archive = fx.root.path().join("broken.zip");
    std::fs::write(&archive, b"<html>not a zip</html>").unwrap();

    let err = fx.pipeline(&[]).run(&ImportRequest::new("Artist", &archive)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Archive);
    assert!(fx.tmp_is_empty());
}

#[test]
fn unsafe_entry_aborts_and_cleans_staging() {
    let fx = Fixture::new();
    let archive = fx.archive(&[("a.mp3", b"audio"), ("../../escape.mp3", b"evil")]);

    let err = fx.pipeline(&[]).run(&ImportRequest::new("Artist", &archive)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsafePath);
    assert!(fx.tmp_is_empty());
    assert!(!fx.library().join("Artist").exists());
    assert!(!fx.root.path().join("escape.mp3").exists());
}

#[test]
fn label_is_sanitized_into_single_segment() {
    let fx = Fixture::new();
    let archive = fx.archive(&[("a.mp3", b"audio")]);

    let report = fx.pipeline(&[]).run(&ImportRequest::new("AC/DC", &archive)).unwrap();
    assert_eq!(report.destination, fx.library().join("AC_DC"));
    assert!(fx.library().join("AC_DC/a.mp3").is_file());

    let err = fx.pipeline(&[]).run(&ImportRequest::new("..", &archive)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}
