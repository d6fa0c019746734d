//! Unit tests for the in-memory tree.

use camino::{Utf8Path, Utf8PathBuf};
use courier_protocol::{EntryKind, ErrorCode};
use rstest::{fixture, rstest};

use super::*;

fn path(raw: &str) -> Utf8PathBuf {
    normalise(raw)
}

#[fixture]
fn tree() -> Tree {
    let mut tree = Tree::new();
    tree.mkdir(&path("/docs"), None).expect("mkdir docs");
    tree.write(&path("/docs/readme.txt"), b"hello".to_vec(), None)
        .expect("write readme");
    tree
}

#[rstest]
#[case("/a/b", "/a/b")]
#[case("a/./b/", "/a/b")]
#[case("/a/../../b", "/b")]
#[case("", "/")]
fn normalise_produces_absolute_paths(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(normalise(raw), Utf8Path::new(expected));
}

#[rstest]
fn stat_describes_files(tree: Tree) {
    let entry = tree.stat(&path("/docs/readme.txt")).expect("stat");
    assert_eq!(entry.name(), "readme.txt");
    assert_eq!(entry.kind(), EntryKind::File);
    assert_eq!(entry.size(), 5);
    assert_eq!(entry.permissions(), Some(0o644));
    assert_eq!(entry.owner(), Some(DEFAULT_OWNER));
}

#[rstest]
fn root_is_a_directory() {
    let entry = Tree::new().stat(Utf8Path::new("/")).expect("stat root");
    assert_eq!(entry.kind(), EntryKind::Directory);
    assert_eq!(entry.name(), "/");
}

#[rstest]
fn list_returns_direct_children_only(mut tree: Tree) {
    tree.mkdir(&path("/docs/nested"), None).expect("mkdir");
    tree.write(&path("/docs/nested/deep.txt"), Vec::new(), None)
        .expect("write");

    let names: Vec<String> = tree
        .list(&path("/docs"))
        .expect("list")
        .iter()
        .map(|entry| entry.name().to_owned())
        .collect();

    assert_eq!(names, vec!["nested".to_owned(), "readme.txt".to_owned()]);
}

#[rstest]
fn list_of_a_file_fails(tree: Tree) {
    let error = tree.list(&path("/docs/readme.txt")).expect_err("not a dir");
    assert_eq!(error.code(), ErrorCode::IS_FILE);
}

#[rstest]
fn write_requires_an_existing_parent() {
    let mut tree = Tree::new();
    let error = tree
        .write(&path("/missing/file"), Vec::new(), None)
        .expect_err("parent missing");
    assert_eq!(error, TreeError::NotFound(path("/missing")));
}

#[rstest]
fn write_over_a_directory_fails(mut tree: Tree) {
    let error = tree
        .write(&path("/docs"), Vec::new(), None)
        .expect_err("directory in the way");
    assert_eq!(error.code(), ErrorCode::IS_DIRECTORY);
}

#[rstest]
fn write_keeps_existing_permissions(mut tree: Tree) {
    tree.chmod(&path("/docs/readme.txt"), 0o600).expect("chmod");
    tree.write(&path("/docs/readme.txt"), b"bye".to_vec(), None)
        .expect("rewrite");
    let entry = tree.stat(&path("/docs/readme.txt")).expect("stat");
    assert_eq!(entry.permissions(), Some(0o600));
    assert_eq!(tree.read(&path("/docs/readme.txt")).expect("read"), b"bye");
}

#[rstest]
fn write_beyond_capacity_is_refused() {
    let mut tree = Tree::new();
    let too_big = vec![0_u8; usize::try_from(CAPACITY).expect("fits") + 1];
    let error = tree
        .write(&path("/big"), too_big, None)
        .expect_err("over capacity");
    assert_eq!(error.code(), ErrorCode::DISK_FULL);
}

#[rstest]
fn mkdir_reports_existing_entries(mut tree: Tree) {
    let directory = tree.mkdir(&path("/docs"), None).expect_err("exists");
    let file = tree
        .mkdir(&path("/docs/readme.txt"), None)
        .expect_err("file exists");
    assert_eq!(directory.code(), ErrorCode::DIR_ALREADY_EXIST);
    assert_eq!(file.code(), ErrorCode::FILE_ALREADY_EXIST);
}

#[rstest]
fn rename_moves_whole_subtrees(mut tree: Tree) {
    tree.rename(&path("/docs"), &path("/archive"), false)
        .expect("rename");
    assert!(!tree.exists(&path("/docs")));
    assert_eq!(
        tree.read(&path("/archive/readme.txt")).expect("moved"),
        b"hello"
    );
}

#[rstest]
fn rename_respects_overwrite(mut tree: Tree) {
    tree.write(&path("/other.txt"), b"x".to_vec(), None)
        .expect("write");
    let refused = tree
        .rename(&path("/other.txt"), &path("/docs/readme.txt"), false)
        .expect_err("exists");
    assert_eq!(refused.code(), ErrorCode::FILE_ALREADY_EXIST);

    tree.rename(&path("/other.txt"), &path("/docs/readme.txt"), true)
        .expect("overwrite");
    assert_eq!(tree.read(&path("/docs/readme.txt")).expect("read"), b"x");
}

#[rstest]
fn rename_into_itself_is_refused(mut tree: Tree) {
    let error = tree
        .rename(&path("/docs"), &path("/docs/inner"), false)
        .expect_err("into itself");
    assert_eq!(error.code(), ErrorCode::CANNOT_RENAME);
}

#[rstest]
fn rename_over_a_directory_replaces_its_subtree(mut tree: Tree) {
    tree.mkdir(&path("/drafts"), None).expect("mkdir drafts");
    tree.write(&path("/drafts/plan.txt"), b"plan".to_vec(), None)
        .expect("write plan");

    tree.rename(&path("/drafts"), &path("/docs"), true)
        .expect("overwrite directory");

    assert!(!tree.exists(&path("/drafts")));
    assert!(!tree.exists(&path("/docs/readme.txt")));
    assert_eq!(tree.read(&path("/docs/plan.txt")).expect("moved"), b"plan");
}

#[rstest]
#[case(false)]
#[case(true)]
fn rename_onto_an_ancestor_is_refused(mut tree: Tree, #[case] overwrite: bool) {
    let error = tree
        .rename(&path("/docs/readme.txt"), &path("/docs"), overwrite)
        .expect_err("ancestor");
    assert_eq!(error.code(), ErrorCode::DIR_ALREADY_EXIST);
    assert_eq!(tree.read(&path("/docs/readme.txt")).expect("kept"), b"hello");
}

#[rstest]
fn symlinks_resolve_relative_targets(mut tree: Tree) {
    tree.symlink("readme.txt", &path("/docs/link"), false)
        .expect("symlink");
    assert_eq!(tree.read(&path("/docs/link")).expect("follow"), b"hello");
    let entry = tree.stat(&path("/docs/link")).expect("stat");
    assert_eq!(entry.link_dest(), Some("readme.txt"));
}

#[rstest]
fn symlink_loops_are_detected(mut tree: Tree) {
    tree.symlink("/b", &path("/a"), false).expect("a");
    tree.symlink("/a", &path("/b"), false).expect("b");
    let error = tree.read(&path("/a")).expect_err("loop");
    assert_eq!(error, TreeError::LinkLoop(path("/a")));
}

#[rstest]
fn set_link_target_requires_a_link(mut tree: Tree) {
    let error = tree
        .set_link_target(&path("/docs/readme.txt"), "/x")
        .expect_err("not a link");
    assert_eq!(error.code(), ErrorCode::DOES_NOT_EXIST);
}

#[rstest]
fn copy_duplicates_contents(mut tree: Tree) {
    tree.copy(
        &path("/docs/readme.txt"),
        &path("/copy.txt"),
        Some(0o600),
        false,
    )
    .expect("copy");
    assert_eq!(tree.read(&path("/copy.txt")).expect("read"), b"hello");
    assert_eq!(
        tree.stat(&path("/copy.txt")).expect("stat").permissions(),
        Some(0o600)
    );
}

#[rstest]
fn delete_checks_kind_and_emptiness(mut tree: Tree) {
    let wrong_kind = tree.delete(&path("/docs"), true).expect_err("is dir");
    let not_empty = tree.delete(&path("/docs"), false).expect_err("not empty");
    assert_eq!(wrong_kind.code(), ErrorCode::IS_DIRECTORY);
    assert_eq!(not_empty.code(), ErrorCode::CANNOT_RMDIR);

    tree.delete(&path("/docs/readme.txt"), true).expect("rm");
    tree.delete(&path("/docs"), false).expect("rmdir");
    assert!(!tree.exists(&path("/docs")));
}

#[rstest]
fn root_cannot_be_deleted() {
    let mut tree = Tree::new();
    assert_eq!(tree.delete(Utf8Path::new("/"), false), Err(TreeError::Root));
}

#[rstest]
fn attribute_changes_show_in_stat(mut tree: Tree) {
    let file = path("/docs/readme.txt");
    tree.chown(&file, "alice", "staff").expect("chown");
    tree.set_modified(&file, 1_700_000_000).expect("touch");
    let entry = tree.stat(&file).expect("stat");
    assert_eq!(entry.owner(), Some("alice"));
    assert_eq!(entry.group(), Some("staff"));
    assert_eq!(entry.modified(), Some(1_700_000_000));
}

#[rstest]
fn space_accounts_for_file_contents(tree: Tree) {
    assert_eq!(tree.space(), (CAPACITY, CAPACITY - 5));
}

#[rstest]
fn usage_sums_a_subtree(mut tree: Tree) {
    tree.write(&path("/docs/more.txt"), b"abc".to_vec(), None)
        .expect("write");
    tree.write(&path("/outside.txt"), b"zz".to_vec(), None)
        .expect("write");
    assert_eq!(tree.usage(&path("/docs")).expect("usage"), 8);
}

#[rstest]
fn tree_errors_become_worker_failures() {
    let failure = WorkerFailure::from(TreeError::NotFound(path("/gone")));
    assert_eq!(failure.code(), ErrorCode::DOES_NOT_EXIST);
    assert_eq!(failure.message(), "/gone does not exist");
}
