//! Tests for building, binding and exporting classifications.

use insta::assert_snapshot;

use px_classification::{
    Classification, ClassificationRow, ClassificationStore, artifact_names, export_classification,
    render_aggregation, render_control,
};
use px_model::{Document, Placement, PxError};

fn age_rows() -> Vec<ClassificationRow> {
    vec![
        ClassificationRow::new("0", "0 years")
            .group("5-year groups", "0-4")
            .group("Adults", "0-17"),
        ClassificationRow::new("4", "4 years")
            .group("5-year groups", "0-4")
            .group("Adults", "0-17"),
        ClassificationRow::new("5", "5 years")
            .group("5-year groups", "5-9")
            .group("Adults", "0-17"),
        ClassificationRow::new("18", "18 years")
            .group("5-year groups", "15-19")
            .group("Adults", "18+"),
    ]
}

fn ages() -> Classification {
    Classification::build("alder", "Age", "ages", age_rows()).unwrap()
}

#[test]
fn build_keeps_aggregation_column_order() {
    let classification = ages();
    assert_eq!(classification.aggregations(), &["5-year groups", "Adults"]);
    assert_eq!(classification.value_codes(), vec!["0", "4", "5", "18"]);
    let grouping = classification.grouping("Adults").unwrap();
    assert_eq!(grouping.get("18").map(String::as_str), Some("18+"));
    assert!(classification.grouping("nope").is_none());
}

#[test]
fn duplicate_codes_are_rejected() {
    let mut rows = age_rows();
    rows.push(ClassificationRow::new("4", "again").group("5-year groups", "0-4"));
    let err = Classification::build("alder", "Age", "ages", rows).unwrap_err();
    assert!(matches!(err, PxError::DuplicateCode { code, .. } if code == "4"));
}

#[test]
fn incomplete_aggregation_names_missing_codes() {
    let mut rows = age_rows();
    rows.push(ClassificationRow::new("19", "19 years").group("5-year groups", "15-19"));
    rows.push(
        ClassificationRow::new("20", "20 years")
            .group("5-year groups", "20-24")
            .group("Adults", "  "),
    );
    let err = Classification::build("alder", "Age", "ages", rows).unwrap_err();
    match err {
        PxError::IncompleteAggregation { aggregation, codes } => {
            assert_eq!(aggregation, "Adults");
            assert_eq!(codes, vec!["19", "20"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rejected_classification_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let rows = vec![
        ClassificationRow::new("1", "one").group("g", "a"),
        ClassificationRow::new("1", "one").group("g", "a"),
    ];
    assert!(Classification::build("bad", "Bad", "bad", rows).is_err());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn names_with_path_separators_are_rejected() {
    assert!(Classification::build("a/b", "x", "d", vec![]).is_err());
}

#[test]
fn eager_binding_requires_known_domain() {
    let mut doc = Document::new("no").unwrap();
    doc.add_variable(
        "age",
        Placement::Stub,
        vec!["Total".into(), "0".into(), "4".into(), "5".into(), "18".into()],
    )
    .unwrap();

    let mut store = ClassificationStore::new();
    let err = store.bind_variable(&mut doc, "age", "ages").unwrap_err();
    assert!(matches!(err, PxError::UnknownDomain { .. }));
    assert_eq!(doc.variable("age").unwrap().domain(), None);

    store.insert(ages());
    store.bind_variable(&mut doc, "age", "ages").unwrap();
    assert_eq!(doc.variable("age").unwrap().domain(), Some("ages"));
    doc.check_bindings(&store).unwrap();
}

#[test]
fn eager_binding_checks_code_coverage() {
    let mut doc = Document::new("no").unwrap();
    doc.add_variable("age", Placement::Stub, vec!["0".into(), "4".into()])
        .unwrap();
    let mut store = ClassificationStore::new();
    store.insert(ages());
    let err = store.bind_variable(&mut doc, "age", "ages").unwrap_err();
    assert!(matches!(err, PxError::InvalidBinding { missing, .. } if missing == vec!["5", "18"]));
}

#[test]
fn lazy_binding_survives_removal_but_fails_resolution() {
    let mut doc = Document::new("no").unwrap();
    doc.add_variable("age", Placement::Stub, vec!["0".into(), "4".into(), "5".into(), "18".into()])
        .unwrap();
    doc.bind_domain("age", "ages").unwrap();

    let mut store = ClassificationStore::new();
    store.insert(ages());
    doc.check_bindings(&store).unwrap();

    store.remove("ages");
    assert_eq!(doc.variable("age").unwrap().domain(), Some("ages"));
    assert!(matches!(
        doc.check_bindings(&store),
        Err(PxError::UnresolvedDomain { .. })
    ));
}

#[test]
fn control_artifact_lists_aggregations_in_order() {
    assert_snapshot!(render_control(&ages()), @r"
    [Descriptions]
    ID=alder
    Prestext=Age
    [Domain]
    1=ages
    [Aggreg]
    1=alder_5-year-groups.agg
    2=alder_adults.agg
    [Valuecode]
    1=0
    2=4
    3=5
    4=18
    [Valuetext]
    1=0 years
    2=4 years
    3=5 years
    4=18 years
    ");
}

#[test]
fn aggregation_artifact_lists_groups() {
    assert_snapshot!(render_aggregation(&ages(), "5-year groups"), @r"
    [Aggreg]
    Name=5-year groups
    Valueset=alder
    [Aggtext]
    1=0-4
    2=5-9
    3=15-19
    [0-4]
    1=0
    2=4
    [5-9]
    1=5
    [15-19]
    1=18
    ");
}

#[test]
fn colliding_slugs_get_column_index() {
    let rows = vec![
        ClassificationRow::new("1", "one")
            .group("Age group", "a")
            .group("age-group", "b"),
    ];
    let classification = Classification::build("x", "X", "d", rows).unwrap();
    let (control, files) = artifact_names(&classification);
    assert_eq!(control, "x.vs");
    assert_eq!(files, vec!["x_age-group_1.agg", "x_age-group_2.agg"]);
}

#[test]
fn export_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let classification = ages();

    let first = export_classification(&classification, dir.path()).unwrap();
    let control_bytes = std::fs::read(&first.control).unwrap();
    let agg_bytes: Vec<Vec<u8>> = first
        .aggregations
        .iter()
        .map(|path| std::fs::read(path).unwrap())
        .collect();

    let second = export_classification(&classification, dir.path()).unwrap();
    assert_eq!(first, second);
    assert_eq!(std::fs::read(&second.control).unwrap(), control_bytes);
    for (path, bytes) in second.aggregations.iter().zip(agg_bytes) {
        assert_eq!(std::fs::read(path).unwrap(), bytes);
    }

    assert!(first.control.ends_with("alder.vs"));
    assert_eq!(first.aggregations.len(), 2);
    assert!(first.aggregations[1].ends_with("alder_adults.agg"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
}

#[test]
fn reexport_removes_dropped_aggregations() {
    let dir = tempfile::tempdir().unwrap();
    let first = export_classification(&ages(), dir.path()).unwrap();
    std::fs::write(dir.path().join("alder_notes.agg"), "kept").unwrap();

    let rows = vec![
        ClassificationRow::new("0", "0 years").group("Adults", "0-17"),
        ClassificationRow::new("18", "18 years").group("Adults", "18+"),
    ];
    let narrowed = Classification::build("alder", "Age", "ages", rows).unwrap();
    let second = export_classification(&narrowed, dir.path()).unwrap();

    assert_eq!(second.aggregations.len(), 1);
    assert!(second.aggregations[0].exists());
    assert!(!first.aggregations[0].exists());
    assert!(dir.path().join("alder_notes.agg").exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
}
