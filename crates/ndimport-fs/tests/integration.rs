use ndimport_fs::{DIR_MODE, StagingArea, copy_file, permissions};
use tempfile::tempdir;

#[test]
fn test_staging_copy_out_then_cleanup() {
    let dir = tempdir().unwrap();
    let library = dir.path().join("library");
    permissions::create_dir_all(&library, DIR_MODE).unwrap();

    let staged_path = {
        let staging = StagingArea::create(Some(dir.path()), "nd-import-extract-").unwrap();
        let album = staging.path().join("Album");
        permissions::create_dir_all(&album, DIR_MODE).unwrap();
        std::fs::write(album.join("01.flac"), b"fLaC").unwrap();

        permissions::create_dir_all(&library.join("Album"), DIR_MODE).unwrap();
        copy_file(&album.join("01.flac"), &library.join("Album/01.flac"), 0o644).unwrap();
        staging.path().to_path_buf()
    };

    assert!(!staged_path.exists());
    assert_eq!(std::fs::read(library.join("Album/01.flac")).unwrap(), b"fLaC");
}

#[test]
fn test_staging_cleanup_after_panic_unwind() {
    let dir = tempdir().unwrap();
    let base = dir.path().to_path_buf();

    let result = std::panic::catch_unwind(move || {
        let staging = StagingArea::create(Some(&base), "stage-").unwrap();
        std::fs::write(staging.path().join("partial.bin"), b"half").unwrap();
        panic!("extraction blew up");
    });

    assert!(result.is_err());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
