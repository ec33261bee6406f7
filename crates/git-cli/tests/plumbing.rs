mod common;

use std::fs;

use common::*;

const HELLO_BLOB: &str = "95d09f2b10159347eece71399a7e2e907ea3df4f";
const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

#[test]
fn init_creates_layout() {
    let dir = tempfile::tempdir().unwrap();
    let out = ok(dir.path(), &["init"]);
    assert!(out.starts_with("Initialized empty Git repository in "), "{out}");

    let git_dir = dir.path().join(".git");
    assert!(git_dir.join("objects").is_dir());
    assert!(git_dir.join("refs/heads").is_dir());
    assert_eq!(
        fs::read_to_string(git_dir.join("HEAD")).unwrap(),
        "ref: refs/heads/main\n"
    );

    let again = ok(dir.path(), &["init"]);
    assert!(again.starts_with("Reinitialized existing"), "{again}");
}

#[test]
fn init_with_initial_branch() {
    let dir = tempfile::tempdir().unwrap();
    ok(dir.path(), &["init", "-q", "-b", "trunk", "repo"]);
    assert_eq!(
        fs::read_to_string(dir.path().join("repo/.git/HEAD")).unwrap(),
        "ref: refs/heads/trunk\n"
    );
}

#[test]
fn hash_object_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("hello.txt"), "hello world").unwrap();
    let out = ok(dir.path(), &["hash-object", "hello.txt"]);
    assert_eq!(out.trim(), HELLO_BLOB);
}

#[test]
fn hash_object_write_then_cat_file() {
    let dir = setup_empty_repo();
    fs::write(dir.path().join("hello.txt"), "hello world").unwrap();
    let out = ok(dir.path(), &["hash-object", "-w", "hello.txt"]);
    assert_eq!(out.trim(), HELLO_BLOB);
    assert!(dir
        .path()
        .join(".git/objects/95/d09f2b10159347eece71399a7e2e907ea3df4f")
        .is_file());

    assert_eq!(ok(dir.path(), &["cat-file", "-p", HELLO_BLOB]), "hello world");
    assert_eq!(ok(dir.path(), &["cat-file", "-t", HELLO_BLOB]), "blob\n");
    assert_eq!(ok(dir.path(), &["cat-file", "-s", HELLO_BLOB]), "11\n");
    assert_eq!(ok(dir.path(), &["cat-file", "blob", HELLO_BLOB]), "hello world");
}

#[test]
fn hash_object_from_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let result = minigit_with_stdin(dir.path(), &["hash-object", "--stdin"], b"hello world");
    assert_eq!(result.exit_code, 0, "{}", result.stderr);
    assert_eq!(result.stdout.trim(), HELLO_BLOB);
}

#[test]
fn write_tree_and_ls_tree() {
    let dir = setup_empty_repo();
    fs::write(dir.path().join("b.txt"), "b").unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/lib.rs"), "").unwrap();

    let tree = ok(dir.path(), &["write-tree"]).trim().to_string();
    assert_eq!(tree.len(), 40);

    let names = ok(dir.path(), &["ls-tree", "--name-only", &tree]);
    assert_eq!(names, "a.txt\nb.txt\nsrc\n");

    let listing = ok(dir.path(), &["ls-tree", &tree]);
    let src_line = listing.lines().nth(2).unwrap();
    assert!(src_line.starts_with("040000 tree "), "{src_line}");
    assert!(src_line.ends_with("\tsrc"), "{src_line}");

    let recursive = ok(dir.path(), &["ls-tree", "-r", "--name-only", &tree]);
    assert_eq!(recursive, "a.txt\nb.txt\nsrc/lib.rs\n");

    let pretty = ok(dir.path(), &["cat-file", "-p", &tree]);
    assert_eq!(pretty, listing);
}

#[test]
fn write_tree_of_empty_work_tree() {
    let dir = setup_empty_repo();
    assert_eq!(ok(dir.path(), &["write-tree"]).trim(), EMPTY_TREE);
}

#[test]
fn commit_tree_with_parent() {
    let dir = setup_empty_repo();
    let tree = ok(dir.path(), &["write-tree"]).trim().to_string();

    let first = ok(dir.path(), &["commit-tree", &tree, "-m", "initial"])
        .trim()
        .to_string();
    let body = ok(dir.path(), &["cat-file", "-p", &first]);
    assert_eq!(
        body,
        format!(
            "tree {EMPTY_TREE}\n\
             author Test Author <test@example.com> 1234567890 +0000\n\
             committer Test Committer <test@example.com> 1234567890 +0000\n\
             \n\
             initial\n"
        )
    );

    let second = ok(dir.path(), &["commit-tree", &tree, "-p", &first, "-m", "next"])
        .trim()
        .to_string();
    let body = ok(dir.path(), &["cat-file", "-p", &second]);
    assert!(body.contains(&format!("\nparent {first}\n")), "{body}");

    // ls-tree accepts a commit and lists its root tree.
    assert_eq!(ok(dir.path(), &["ls-tree", &second]), "");
}

#[test]
fn missing_object_is_fatal() {
    let dir = setup_empty_repo();
    let result = minigit(dir.path(), &["cat-file", "-p", &"ab".repeat(20)]);
    assert_eq!(result.exit_code, 128);
    assert!(result.stderr.starts_with("fatal: "), "{}", result.stderr);
}

#[test]
fn invalid_object_name() {
    let dir = setup_empty_repo();
    let result = minigit(dir.path(), &["cat-file", "-t", "xyz"]);
    assert_eq!(result.exit_code, 128);
    assert!(result.stderr.contains("not a valid object name"), "{}", result.stderr);
}

#[test]
fn outside_a_repository() {
    let dir = tempfile::tempdir().unwrap();
    let result = minigit(dir.path(), &["write-tree"]);
    assert_eq!(result.exit_code, 128);
    assert!(result.stderr.contains("not a minigit repository"), "{}", result.stderr);
}

#[test]
fn clone_rejects_unsupported_scheme() {
    let dir = tempfile::tempdir().unwrap();
    let result = minigit(dir.path(), &["clone", "-q", "ssh://example.com/demo.git"]);
    assert_eq!(result.exit_code, 128);
    assert!(result.stderr.starts_with("fatal: "), "{}", result.stderr);
}
