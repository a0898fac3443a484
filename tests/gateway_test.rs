//! The subprocess gateway driven against a stand-in `sparql` frontend script.
#![cfg(unix)]

use md_tracker::{
    config::TrackerCliConfig,
    db::TrackerCli,
    query::{Relation, RelationStore, SparqlStore},
    TrackerError,
};
use std::{
    collections::BTreeSet,
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

/// Writes an executable that appends its arguments to `calls.log` and answers every read query
/// with the contents of `rows.txt`.
fn fake_frontend(dir: &Path) -> (PathBuf, PathBuf) {
    let log = dir.join("calls.log");
    let rows = dir.join("rows.txt");
    fs::write(
        &rows,
        "Results:\n  file://%2Fv%2Fa.md, file://%2Fv%2Fb%20c.md\n  file://%2Fv%2Fb%20c.md, file://%2Fv%2Fa.md\n",
    )
    .unwrap();
    let script = dir.join("fake-tracker");
    let body = format!(
        r#"#!/bin/sh
for arg in "$@"; do echo "$arg" >> '{log}'; done
echo '==' >> '{log}'
if [ "$3" = "--update" ]; then exit 0; fi
cat '{rows}'
"#,
        log = log.display(),
        rows = rows.display()
    );
    fs::write(&script, body).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    (script, log)
}

fn store_for(bin: &Path) -> SparqlStore<TrackerCli> {
    SparqlStore::new(TrackerCli::new(TrackerCliConfig {
        bin: bin.display().to_string(),
        ..TrackerCliConfig::default()
    }))
}

#[test_log::test]
fn reads_and_writes_go_through_the_frontend() {
    let tmp = TempDir::new().unwrap();
    let (script, log) = fake_frontend(tmp.path());
    let store = store_for(&script);

    let relations = store.query_relations(None).unwrap();
    let expected: BTreeSet<Relation> = [
        Relation::new("/v/a.md", "/v/b c.md"),
        Relation::new("/v/b c.md", "/v/a.md"),
    ]
    .into();
    assert_eq!(relations, expected);

    fs::remove_file(&log).unwrap();
    store
        .add_link(Path::new("/v/a.md"), Path::new("/v/b c.md"))
        .unwrap();
    let calls = fs::read_to_string(&log).unwrap();
    let invocations: Vec<&str> = calls.split("==\n").filter(|c| !c.is_empty()).collect();
    assert_eq!(invocations.len(), 4);
    for call in &invocations {
        assert!(call.starts_with(
            "sparql\n--dbus-service=org.freedesktop.Tracker3.Miner.Files\n--update\n--query\n"
        ));
    }
    assert!(invocations[0].contains("<file://%2Fv%2Fa.md> a nie:InformationElement"));
    assert!(invocations[3].contains("<file://%2Fv%2Fb%20c.md> nie:relatedTo <file://%2Fv%2Fa.md>"));
}

#[test]
fn failing_frontend_is_index_unavailable() {
    let store = store_for(Path::new("/nonexistent/tracker3"));
    assert!(matches!(
        store.query_relations(None),
        Err(TrackerError::IndexUnavailable(_))
    ));
    assert!(matches!(
        store.delete_relation(Path::new("/v/a.md"), Path::new("/v/b.md")),
        Err(TrackerError::IndexUnavailable(_))
    ));
}
