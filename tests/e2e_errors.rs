//! Error paths: exit codes and structured error output.

mod common;

use common::cli::{TrellisWorkspace, run_trellis};
use predicates::prelude::*;

#[test]
fn e2e_commands_fail_outside_workspace() {
    let workspace = TrellisWorkspace::new();
    let run = run_trellis(&workspace, ["list"], "list_uninit");
    assert_eq!(run.code(), Some(2));
    assert!(run.stderr.contains("NOT_INITIALIZED"), "{}", run.stderr);
}

#[test]
fn e2e_init_twice_needs_force() {
    let workspace = TrellisWorkspace::initialized();
    let again = run_trellis(&workspace, ["init"], "init_again");
    assert_eq!(again.code(), Some(2));
    assert!(again.stderr.contains("ALREADY_INITIALIZED"), "{}", again.stderr);

    let forced = run_trellis(&workspace, ["init", "--force"], "init_force");
    assert!(forced.status.success(), "{}", forced.stderr);
}

#[test]
fn e2e_missing_entity_is_not_found() {
    let workspace = TrellisWorkspace::initialized();
    let run = run_trellis(&workspace, ["show", "TSK-9"], "show_missing");
    assert_eq!(run.code(), Some(3));
    assert!(run.stderr.contains("NOT_FOUND"), "{}", run.stderr);

    let bad_id = run_trellis(&workspace, ["show", "TSK-x"], "show_bad_id");
    assert_eq!(bad_id.code(), Some(3));
    assert!(bad_id.stderr.contains("INVALID_ID"), "{}", bad_id.stderr);
}

#[test]
fn e2e_wrong_parent_kind() {
    let workspace = TrellisWorkspace::initialized();
    run_trellis(&workspace, ["create", "idea", "i"], "idea");
    let run = run_trellis(
        &workspace,
        ["create", "task", "t", "--epic", "IDEA-1"],
        "task_under_idea",
    );
    assert_eq!(run.code(), Some(3));
    assert!(run.stderr.contains("INVALID_PARENT"), "{}", run.stderr);
}

#[test]
fn e2e_unknown_dependency_and_dependents() {
    let workspace = TrellisWorkspace::initialized();
    let unknown = run_trellis(
        &workspace,
        ["create", "task", "t", "--depends-on", "TSK-40"],
        "unknown_dep",
    );
    assert_eq!(unknown.code(), Some(5));
    assert!(unknown.stderr.contains("UNKNOWN_DEPENDENCY"), "{}", unknown.stderr);

    run_trellis(&workspace, ["create", "task", "base"], "base");
    run_trellis(&workspace, ["create", "task", "top", "--depends-on", "1"], "top");
    let delete = run_trellis(&workspace, ["delete", "TSK-1"], "delete_base");
    assert_eq!(delete.code(), Some(5));
    assert!(delete.stderr.contains("HAS_DEPENDENTS"), "{}", delete.stderr);

    let show = run_trellis(&workspace, ["show", "TSK-1", "--json"], "still_there");
    assert_eq!(show.json()["dependents"][0], "TSK-2");
}

#[test]
fn e2e_validation_failures() {
    let workspace = TrellisWorkspace::initialized();
    let bad_priority = run_trellis(
        &workspace,
        ["create", "idea", "x", "--priority", "urgent"],
        "bad_priority",
    );
    assert_eq!(bad_priority.code(), Some(4));
    assert!(bad_priority.stderr.contains("VALIDATION_FAILED"), "{}", bad_priority.stderr);

    run_trellis(&workspace, ["create", "idea", "x"], "idea");
    let empty_update = run_trellis(&workspace, ["update", "IDEA-1"], "empty_update");
    assert_eq!(empty_update.code(), Some(4));

    let empty_note = run_trellis(&workspace, ["note", "IDEA-1", "  "], "empty_note");
    assert_eq!(empty_note.code(), Some(4));
}

#[test]
fn e2e_unknown_subcommand_is_a_usage_error() {
    let workspace = TrellisWorkspace::new();
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("trellis"))
        .current_dir(&workspace.root)
        .env("HOME", &workspace.root)
        .arg("frobnicate")
        .assert()
        .failure()
        .code(2)
        .stderr(predicates::str::contains("unrecognized subcommand"));
}

#[test]
fn e2e_structured_error_has_hint() {
    let workspace = TrellisWorkspace::new();
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("trellis"))
        .current_dir(&workspace.root)
        .env("HOME", &workspace.root)
        .env_remove("TRELLIS_DIR")
        .env("RUST_LOG", "off")
        .args(["next"])
        .assert()
        .failure()
        .stderr(
            predicates::str::contains("NOT_INITIALIZED")
                .and(predicates::str::contains("Run: trellis init")),
        );
}
