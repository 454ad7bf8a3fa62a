//! Commit file sync: normalization, persistence and store-first reads.

use devscan_lib::error::AppError;
use devscan_lib::models::{CommitFile, FileContent, FileStatus};
use devscan_lib::services::commit_sync::{DetailsSource, SyncMode, SyncOptions, sync_commit_files};
use secrecy::SecretString;
use uuid::Uuid;

use super::fake_source::{FakeSource, changed_file, detail};
use super::memory_store::{MemoryStore, fixed_date};

fn options() -> SyncOptions {
    SyncOptions {
        file_concurrency: 4,
        patch_preview_chars: 1000,
        service_token: None,
    }
}

/// Store with one repository (owner token on file) and commit `sha`.
fn seeded_store(sha: &str) -> MemoryStore {
    let store = MemoryStore::new();
    let repo = store.seed_repo(Uuid::new_v4(), "42", "octo/app", Some("owner-token"));
    store.seed_commit(&repo, sha, "Fix security");
    store
}

/// Backslash path with an empty diff and no raw URL.
#[actix_rt::test]
async fn test_binary_file_gets_placeholder_patch() {
    let store = seeded_store("abc123");
    let mut source = FakeSource::new();
    source.details.insert(
        "abc123".to_string(),
        detail(
            "abc123",
            "Fix security",
            fixed_date(),
            vec![changed_file("src\\a.js", FileStatus::Modified, 3, 1, Some(""))],
        ),
    );

    let details = sync_commit_files(&source, &store, &options(), "abc123", SyncMode::StoreFirst)
        .await
        .unwrap();

    assert_eq!(details.source, DetailsSource::Upstream);
    assert_eq!(details.files.len(), 1);
    let file = &details.files[0];
    assert_eq!(file.path, "src/a.js");
    assert_eq!(
        file.content.patch,
        "// Modified file with no text diff - possibly binary: src/a.js"
    );
    assert_eq!(details.info.total_changes, 4);

    let stored = store.files("abc123");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].path, "src/a.js");
    assert_eq!(stored[0].content.patch, file.content.patch);
}

#[actix_rt::test]
async fn test_every_file_has_nonempty_patch() {
    let store = seeded_store("def456");
    let mut source = FakeSource::new();

    let mut from_raw = changed_file("docs/readme.md", FileStatus::Added, 2, 0, None);
    from_raw.raw_url = Some("https://raw.example/readme.md".to_string());
    let mut raw_denied = changed_file("assets/logo.png", FileStatus::Added, 0, 0, None);
    raw_denied.raw_url = Some("https://raw.example/logo.png".to_string());

    source
        .blobs
        .insert("https://raw.example/readme.md".to_string(), b"# Hello\n".to_vec());
    source.details.insert(
        "def456".to_string(),
        detail(
            "def456",
            "Add docs",
            fixed_date(),
            vec![
                changed_file("src/lib.rs", FileStatus::Modified, 1, 1, Some("-a\n+b")),
                from_raw,
                raw_denied,
                changed_file("old.txt", FileStatus::Removed, 0, 5, None),
            ],
        ),
    );

    let details = sync_commit_files(&source, &store, &options(), "def456", SyncMode::StoreFirst)
        .await
        .unwrap();

    assert_eq!(details.files.len(), 4);
    assert!(details.files.iter().all(|f| !f.content.patch.trim().is_empty()));

    let patch_of = |path: &str| {
        details
            .files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.content.patch.clone())
            .unwrap()
    };
    assert_eq!(patch_of("src/lib.rs"), "-a\n+b");
    assert_eq!(
        patch_of("docs/readme.md"),
        "// File: docs/readme.md\n// Status: added\n\n# Hello\n"
    );
    assert_eq!(
        patch_of("assets/logo.png"),
        "// Binary or inaccessible file: assets/logo.png"
    );
    assert_eq!(patch_of("old.txt"), "// DELETED FILE: old.txt");
}

#[actix_rt::test]
async fn test_raw_content_fallbacks_for_binary_and_blank_files() {
    let store = seeded_store("bee222");
    let mut source = FakeSource::new();

    let mut binary = changed_file("assets/icon.ico", FileStatus::Added, 0, 0, None);
    binary.raw_url = Some("https://raw.example/icon.ico".to_string());
    let mut blank = changed_file("docs/empty.md", FileStatus::Added, 0, 0, None);
    blank.raw_url = Some("https://raw.example/empty.md".to_string());

    source
        .blobs
        .insert("https://raw.example/icon.ico".to_string(), vec![0xff, 0xfe]);
    source
        .blobs
        .insert("https://raw.example/empty.md".to_string(), b"   ".to_vec());
    source.details.insert(
        "bee222".to_string(),
        detail("bee222", "Add assets", fixed_date(), vec![binary, blank]),
    );

    let details = sync_commit_files(&source, &store, &options(), "bee222", SyncMode::StoreFirst)
        .await
        .unwrap();

    let patch_of = |path: &str| {
        details
            .files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.content.patch.clone())
            .unwrap()
    };
    assert_eq!(
        patch_of("assets/icon.ico"),
        "// Binary or inaccessible file: assets/icon.ico"
    );
    assert_eq!(patch_of("docs/empty.md"), "// NEW FILE: docs/empty.md");
    assert_eq!(store.files("bee222").len(), 2);
}

#[actix_rt::test]
async fn test_files_are_path_ordered_and_total_is_summed() {
    let store = seeded_store("aaa111");
    let mut source = FakeSource::new();
    source.details.insert(
        "aaa111".to_string(),
        detail(
            "aaa111",
            "Refactor",
            fixed_date(),
            vec![
                changed_file("z.rs", FileStatus::Modified, 10, 2, Some("+z")),
                changed_file("a.rs", FileStatus::Modified, 1, 0, Some("+a")),
                changed_file("m/n.rs", FileStatus::Added, 7, 0, Some("+n")),
            ],
        ),
    );

    let details = sync_commit_files(&source, &store, &options(), "aaa111", SyncMode::StoreFirst)
        .await
        .unwrap();

    let paths: Vec<&str> = details.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["a.rs", "m/n.rs", "z.rs"]);

    let sum: u64 = details.files.iter().map(|f| u64::from(f.content.changes)).sum();
    assert_eq!(details.info.total_changes, sum);
    assert_eq!(details.info.total_changes, 20);
    assert_eq!(details.info.message, "Refactor");
    assert_eq!(details.info.author, "octocat");
}

#[actix_rt::test]
async fn test_store_first_skips_github_when_rows_exist() {
    let store = seeded_store("bbb222");
    store.seed_file(CommitFile {
        id: None,
        sha: "bbb222".to_string(),
        path: "src/main.rs".to_string(),
        content: FileContent {
            status: FileStatus::Modified,
            additions: 2,
            deletions: 1,
            changes: 3,
            patch: "+x".to_string(),
            raw_url: None,
            filename: "src/main.rs".to_string(),
        },
    });
    let source = FakeSource::new();

    let details = sync_commit_files(&source, &store, &options(), "bbb222", SyncMode::StoreFirst)
        .await
        .unwrap();

    assert_eq!(details.source, DetailsSource::Store);
    assert_eq!(details.files.len(), 1);
    assert_eq!(details.info.total_changes, 3);
    assert_eq!(details.info.message, "Fix security");
    assert_eq!(source.detail_calls(), 0);
}

#[actix_rt::test]
async fn test_refresh_backfills_missing_files_only() {
    let store = seeded_store("ccc333");
    store.seed_file(CommitFile {
        id: None,
        sha: "ccc333".to_string(),
        path: "a.rs".to_string(),
        content: FileContent {
            status: FileStatus::Modified,
            additions: 1,
            deletions: 0,
            changes: 1,
            patch: "+stored".to_string(),
            raw_url: None,
            filename: "a.rs".to_string(),
        },
    });

    let mut source = FakeSource::new();
    source.details.insert(
        "ccc333".to_string(),
        detail(
            "ccc333",
            "Two files",
            fixed_date(),
            vec![
                changed_file("a.rs", FileStatus::Modified, 1, 0, Some("+upstream")),
                changed_file("b.rs", FileStatus::Added, 4, 0, Some("+b")),
            ],
        ),
    );

    let details = sync_commit_files(&source, &store, &options(), "ccc333", SyncMode::Refresh)
        .await
        .unwrap();

    assert_eq!(source.detail_calls(), 1);
    assert_eq!(details.source, DetailsSource::Upstream);
    assert_eq!(details.files.len(), 2);
    assert_eq!(details.files[0].content.patch, "+stored");

    let stored = store.files("ccc333");
    assert_eq!(stored.len(), 2);
    assert_eq!(store.write_counts(), (1, 0));
}

#[actix_rt::test]
async fn test_resync_is_idempotent() {
    let store = seeded_store("ddd444");
    let mut source = FakeSource::new();
    source.details.insert(
        "ddd444".to_string(),
        detail(
            "ddd444",
            "Change",
            fixed_date(),
            vec![
                changed_file("a.rs", FileStatus::Modified, 1, 1, Some("-a\n+a")),
                changed_file("b.rs", FileStatus::Modified, 2, 0, Some("+b")),
            ],
        ),
    );

    let first = sync_commit_files(&source, &store, &options(), "ddd444", SyncMode::Refresh)
        .await
        .unwrap();
    let second = sync_commit_files(&source, &store, &options(), "ddd444", SyncMode::Refresh)
        .await
        .unwrap();

    assert_eq!(store.files("ddd444").len(), 2);
    let ids = |files: &[CommitFile]| files.iter().map(|f| f.id).collect::<Vec<_>>();
    assert_eq!(ids(&first.files), ids(&second.files));
    assert_eq!(first.info.total_changes, second.info.total_changes);
}

#[actix_rt::test]
async fn test_concurrent_syncs_leave_one_row_per_path() {
    let store = seeded_store("eee555");
    let mut source = FakeSource::new();
    source.details.insert(
        "eee555".to_string(),
        detail(
            "eee555",
            "Race",
            fixed_date(),
            vec![
                changed_file("a.rs", FileStatus::Modified, 1, 0, Some("+a")),
                changed_file("b.rs", FileStatus::Modified, 1, 0, Some("+b")),
                changed_file("c.rs", FileStatus::Modified, 1, 0, Some("+c")),
            ],
        ),
    );

    let opts = options();
    let (left, right) = tokio::join!(
        sync_commit_files(&source, &store, &opts, "eee555", SyncMode::Refresh),
        sync_commit_files(&source, &store, &opts, "eee555", SyncMode::Refresh),
    );
    let left = left.unwrap();
    let right = right.unwrap();

    assert_eq!(store.files("eee555").len(), 3);
    assert_eq!(left.files.len(), 3);
    assert_eq!(right.files.len(), 3);
    assert!(left.files.iter().chain(&right.files).all(|f| f.id.is_some()));
}

#[actix_rt::test]
async fn test_duplicate_upstream_paths_are_collapsed() {
    let store = seeded_store("fff666");
    let mut source = FakeSource::new();
    source.details.insert(
        "fff666".to_string(),
        detail(
            "fff666",
            "Mixed separators",
            fixed_date(),
            vec![
                changed_file("src\\x.rs", FileStatus::Modified, 1, 0, Some("+1")),
                changed_file("src/x.rs", FileStatus::Modified, 1, 0, Some("+2")),
            ],
        ),
    );

    let details = sync_commit_files(&source, &store, &options(), "fff666", SyncMode::Refresh)
        .await
        .unwrap();

    assert_eq!(details.files.len(), 1);
    assert_eq!(store.files("fff666").len(), 1);
}

#[actix_rt::test]
async fn test_commit_without_changes_returns_empty() {
    let store = seeded_store("ggg777");
    let mut source = FakeSource::new();
    source.details.insert(
        "ggg777".to_string(),
        detail("ggg777", "Empty", fixed_date(), Vec::new()),
    );

    let details = sync_commit_files(&source, &store, &options(), "ggg777", SyncMode::StoreFirst)
        .await
        .unwrap();

    assert!(details.files.is_empty());
    assert_eq!(details.info.total_changes, 0);
    assert!(store.files("ggg777").is_empty());
}

#[actix_rt::test]
async fn test_unknown_commit_is_not_found() {
    let store = seeded_store("hhh888");
    let source = FakeSource::new();

    let err = sync_commit_files(&source, &store, &options(), "nope", SyncMode::StoreFirst)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(source.detail_calls(), 0);
}

#[actix_rt::test]
async fn test_missing_credential_is_reported() {
    let store = MemoryStore::new();
    let repo = store.seed_repo(Uuid::new_v4(), "7", "octo/private", None);
    store.seed_commit(&repo, "iii999", "Secret");
    let source = FakeSource::new();

    let err = sync_commit_files(&source, &store, &options(), "iii999", SyncMode::StoreFirst)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::CredentialMissing));
    assert_eq!(source.detail_calls(), 0);
}

#[actix_rt::test]
async fn test_service_token_backs_missing_owner_token() {
    let store = MemoryStore::new();
    let repo = store.seed_repo(Uuid::new_v4(), "8", "octo/public", None);
    store.seed_commit(&repo, "jjj000", "Public");
    let mut source = FakeSource::new();
    source.details.insert(
        "jjj000".to_string(),
        detail(
            "jjj000",
            "Public",
            fixed_date(),
            vec![changed_file("a.rs", FileStatus::Added, 1, 0, Some("+a"))],
        ),
    );

    let opts = SyncOptions {
        service_token: Some(SecretString::from("service-token")),
        ..options()
    };
    sync_commit_files(&source, &store, &opts, "jjj000", SyncMode::StoreFirst)
        .await
        .unwrap();

    assert_eq!(source.tokens_seen(), vec!["service-token".to_string()]);
}
