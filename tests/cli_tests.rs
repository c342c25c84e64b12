//! Integration tests for CLI execution using `assert_cmd`.
//!
//! These tests run the compiled binary against manifests in temporary trees
//! and check the files it writes and what it prints.

use anyhow::{Context, Result, ensure};
use assert_cmd::Command;
use predicates::prelude::*;
use test_support::{ProjectTree, manifest_yaml};

const TWO_LIBRARIES: &str = concat!(
    "projects:\n",
    "  b:\n",
    "    root: b\n",
    "    depends: [a]\n",
    "    output: { name: libb.a, type: static }\n",
    "  a:\n",
    "    root: a\n",
    "    output: { name: liba.a, type: static }\n",
);

fn two_libraries(prefix: &str) -> ProjectTree {
    let tree = ProjectTree::new();
    tree.write(&format!("{prefix}Mkplanfile"), &manifest_yaml(TWO_LIBRARIES))
        .write(&format!("{prefix}a/include/a.h"), "int a(void);\n")
        .write(&format!("{prefix}a/src/a.c"), "#include \"a.h\"\n")
        .write(&format!("{prefix}b/src/b.c"), "#include \"a.h\"\n");
    tree
}

fn mkplan() -> Result<Command> {
    Command::cargo_bin("mkplan").context("locate mkplan binary")
}

#[test]
fn generate_writes_every_script() -> Result<()> {
    let tree = two_libraries("");
    mkplan()?.current_dir(tree.root()).assert().success();

    ensure!(tree.exists("a/target/Makefile"), "a/target/Makefile missing");
    ensure!(tree.exists("b/target/Makefile"), "b/target/Makefile missing");
    let aggregate = tree.read("target/Projects.mk");
    ensure!(
        aggregate.contains("all-all : a b\n"),
        "aggregate should build a before b, got:\n{aggregate}"
    );
    let b = tree.read("b/target/Makefile");
    let header = tree.path("a/target/include/a.h");
    ensure!(
        b.contains(&format!("target/obj/b.o : src/b.c {header}\n")),
        "b.o should depend on the exported header, got:\n{b}"
    );
    Ok(())
}

#[test]
fn order_lists_projects_one_per_line() -> Result<()> {
    let tree = two_libraries("");
    mkplan()?
        .current_dir(tree.root())
        .arg("order")
        .assert()
        .success()
        .stdout("a\nb\n");
    ensure!(!tree.exists("a/target/Makefile"), "order should not write scripts");
    Ok(())
}

#[test]
fn plan_streams_json_to_stdout() -> Result<()> {
    let tree = two_libraries("");
    let output = mkplan()?
        .current_dir(tree.root())
        .args(["plan", "-"])
        .output()
        .context("run mkplan plan -")?;
    ensure!(output.status.success(), "plan - should succeed");
    let plan: serde_json::Value =
        serde_json::from_slice(&output.stdout).context("plan output should be JSON")?;
    ensure!(
        plan["order"] == serde_json::json!(["a", "b"]),
        "unexpected order in {plan}"
    );
    ensure!(!tree.exists("-"), "plan - should not create a file named '-'");
    Ok(())
}

#[test]
fn plan_writes_file_relative_to_directory() -> Result<()> {
    let tree = two_libraries("work/");
    mkplan()?
        .current_dir(tree.root())
        .args(["-C", "work", "plan", "plan.json"])
        .assert()
        .success();
    ensure!(tree.exists("work/plan.json"), "plan.json should land in work/");
    Ok(())
}

#[test]
fn directory_option_selects_manifest() -> Result<()> {
    let tree = two_libraries("work/");
    mkplan()?
        .current_dir(tree.root())
        .args(["-C", "work", "generate"])
        .assert()
        .success();
    ensure!(
        tree.exists("work/target/Projects.mk"),
        "aggregate should be written under work/target"
    );
    Ok(())
}

#[test]
fn cycle_fails_without_writing() -> Result<()> {
    let tree = ProjectTree::new();
    let body = concat!(
        "projects:\n",
        "  a:\n",
        "    root: a\n",
        "    depends: [b]\n",
        "    output: { name: liba.a, type: static }\n",
        "  b:\n",
        "    root: b\n",
        "    depends: [a]\n",
        "    output: { name: libb.a, type: static }\n",
    );
    tree.write("Mkplanfile", &manifest_yaml(body))
        .write("a/src/a.c", "")
        .write("b/src/b.c", "");
    mkplan()?
        .current_dir(tree.root())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Dependency cycle"));
    ensure!(!tree.exists("a/target/Makefile"), "no script should be written");
    ensure!(!tree.exists("target/Projects.mk"), "no aggregate should be written");
    Ok(())
}

#[test]
fn missing_manifest_is_reported() -> Result<()> {
    let tree = ProjectTree::new();
    mkplan()?
        .current_dir(tree.root())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Mkplanfile not found"));
    Ok(())
}

#[test]
fn invalid_manifest_is_reported() -> Result<()> {
    let tree = ProjectTree::new();
    tree.write(
        "Mkplanfile",
        &manifest_yaml("projects:\n  a:\n    root: a\n"),
    );
    mkplan()?
        .current_dir(tree.root())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must declare an output"));
    Ok(())
}
