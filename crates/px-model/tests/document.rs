//! Tests for metadata setters, variables, bindings and cube addressing.

use std::collections::BTreeMap;

use px_model::{
    CubeShape, Document, DomainResolver, FieldValue, Keyword, NoDomains, Placement, PxError,
    TextInput,
};

fn codes(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn bilingual() -> Document {
    let mut doc = Document::new("no").unwrap();
    doc.set_field(Keyword::Title, "Folkemengde").unwrap();
    doc.set_languages(&codes(&["no", "en"]), "no").unwrap();
    doc
}

struct Domains(BTreeMap<String, Vec<String>>);

impl DomainResolver for Domains {
    fn value_codes(&self, domain: &str) -> Option<Vec<String>> {
        self.0.get(domain).cloned()
    }
}

#[test]
fn omitted_language_keeps_previous_value() {
    let mut doc = bilingual();
    doc.set_field(Keyword::Title, TextInput::localized([("en", "Population")]))
        .unwrap();
    doc.set_field(Keyword::Title, TextInput::localized([("no", "Befolkning")]))
        .unwrap();

    assert_eq!(doc.field_text(Keyword::Title, "no"), Some("Befolkning"));
    assert_eq!(doc.field_text(Keyword::Title, "en"), Some("Population"));
}

#[test]
fn first_value_seeds_languages_left_out() {
    let mut doc = bilingual();
    doc.set_field(Keyword::Units, TextInput::localized([("en", "persons")]))
        .unwrap();
    assert_eq!(doc.field_text(Keyword::Units, "no"), Some("persons"));
    assert_eq!(doc.field_text(Keyword::Units, "en"), Some("persons"));
}

#[test]
fn unknown_language_is_rejected_atomically() {
    let mut doc = bilingual();
    let before = doc.clone();
    let err = doc
        .set_field(
            Keyword::Title,
            TextInput::localized([("en", "Population"), ("sv", "Befolkning")]),
        )
        .unwrap_err();
    assert!(matches!(err, PxError::UnknownLanguage { language } if language == "sv"));
    assert_eq!(doc, before);
}

#[test]
fn plain_field_rejects_per_language_input() {
    let mut doc = bilingual();
    let err = doc
        .set_field(Keyword::Matrix, TextInput::localized([("no", "X")]))
        .unwrap_err();
    assert!(matches!(err, PxError::FieldScope { .. }));
    assert!(doc.field(Keyword::Matrix).is_none());
}

#[test]
fn integer_fields_must_parse() {
    let mut doc = bilingual();
    assert!(doc.set_field(Keyword::Decimals, "two").is_err());
    doc.set_field(Keyword::Decimals, "2").unwrap();
    assert_eq!(
        doc.field(Keyword::Decimals),
        Some(&FieldValue::Plain("2".to_string()))
    );
}

#[test]
fn quotes_are_rejected() {
    let mut doc = bilingual();
    let err = doc.set_field(Keyword::Title, "say \"hi\"").unwrap_err();
    assert!(matches!(err, PxError::InvalidText { .. }));
}

#[test]
fn stubs_stay_ahead_of_headings() {
    let mut doc = bilingual();
    doc.add_variable("year", Placement::Heading, codes(&["2023", "2024"]))
        .unwrap();
    doc.add_variable("region", Placement::Stub, codes(&["0301"]))
        .unwrap();
    doc.add_variable("sex", Placement::Stub, codes(&["1", "2"]))
        .unwrap();

    let order: Vec<&str> = doc.variables().iter().map(|v| v.code()).collect();
    assert_eq!(order, vec!["region", "sex", "year"]);
}

#[test]
fn duplicate_variables_and_codes_fail() {
    let mut doc = bilingual();
    doc.add_variable("sex", Placement::Stub, codes(&["1", "2"]))
        .unwrap();
    assert!(matches!(
        doc.add_variable("sex", Placement::Stub, codes(&["1"])),
        Err(PxError::DuplicateVariable { .. })
    ));
    assert!(matches!(
        doc.add_variable("age", Placement::Stub, codes(&["1", "1"])),
        Err(PxError::DuplicateCode { .. })
    ));
}

#[test]
fn variables_freeze_once_data_is_attached() {
    let mut doc = bilingual();
    doc.add_variable("sex", Placement::Stub, codes(&["1", "2"]))
        .unwrap();
    doc.init_data();
    assert!(matches!(
        doc.add_variable("age", Placement::Stub, codes(&["1"])),
        Err(PxError::DataAttached)
    ));
}

#[test]
fn cells_follow_declaration_order() {
    let mut doc = bilingual();
    doc.add_variable("region", Placement::Stub, codes(&["A", "B"]))
        .unwrap();
    doc.add_variable("year", Placement::Heading, codes(&["2023", "2024", "2025"]))
        .unwrap();

    assert_eq!(doc.cell_index(&["A", "2023"]).unwrap(), 0);
    assert_eq!(doc.cell_index(&["A", "2025"]).unwrap(), 2);
    assert_eq!(doc.cell_index(&["B", "2024"]).unwrap(), 4);
    assert_eq!(doc.cell_codes(5), Some(vec!["B", "2025"]));

    doc.set_cell(&["B", "2024"], Some(7.0)).unwrap();
    assert_eq!(doc.cell(&["B", "2024"]).unwrap(), Some(7.0));
    assert_eq!(doc.cell(&["A", "2024"]).unwrap(), None);
    assert!(matches!(
        doc.set_cell(&["C", "2024"], Some(1.0)),
        Err(PxError::UnknownValueCode { .. })
    ));
    assert!(matches!(
        doc.set_cell(&["A", "2024"], Some(f64::NAN)),
        Err(PxError::NonFiniteValue { .. })
    ));
}

#[test]
fn set_data_checks_length() {
    let mut doc = bilingual();
    doc.add_variable("region", Placement::Stub, codes(&["A", "B"]))
        .unwrap();
    assert!(doc.set_data(vec![Some(1.0)]).is_err());
    doc.set_data(vec![Some(1.0), None]).unwrap();
    assert_eq!(doc.data(), Some(&[Some(1.0), None][..]));
}

#[test]
fn bindings_resolve_lazily() {
    let mut doc = bilingual();
    doc.add_variable("age", Placement::Stub, codes(&["0", "1", "2", "Total"]))
        .unwrap();
    doc.bind_domain("age", "ages").unwrap();

    let err = doc.check_bindings(&NoDomains).unwrap_err();
    assert!(matches!(err, PxError::UnresolvedDomain { ref domain, .. } if domain == "ages"));

    let mut known = BTreeMap::new();
    known.insert("ages".to_string(), codes(&["0", "1", "2"]));
    doc.check_bindings(&Domains(known.clone())).unwrap();

    known.insert("ages".to_string(), codes(&["0", "1", "2", "3"]));
    let err = doc.check_bindings(&Domains(known)).unwrap_err();
    assert!(matches!(err, PxError::InvalidBinding { missing, .. } if missing == vec!["3"]));
}

#[test]
fn binding_unknown_variable_fails() {
    let mut doc = bilingual();
    assert!(matches!(
        doc.bind_domain("nope", "ages"),
        Err(PxError::UnknownVariable { .. })
    ));
}

#[test]
fn elimination_must_be_a_value_code() {
    let mut doc = bilingual();
    doc.add_variable("age", Placement::Stub, codes(&["Total", "0"]))
        .unwrap();
    assert!(doc.set_elimination("age", Some("X")).is_err());
    doc.set_elimination("age", Some("Total")).unwrap();
    assert_eq!(doc.variable("age").unwrap().elimination(), Some("Total"));
}

#[test]
fn cube_shape_round_trips_indices() {
    let shape = CubeShape::new(vec![2, 3, 4]);
    assert_eq!(shape.cell_count(), 24);
    for index in 0..24 {
        let coordinate = shape.coordinate_of(index).unwrap();
        assert_eq!(shape.index_of(&coordinate), Some(index));
    }
    assert_eq!(shape.index_of(&[2, 0, 0]), None);
    assert_eq!(shape.row_width(1), 4);
    assert_eq!(shape.row_width(0), 1);
    assert_eq!(CubeShape::new(vec![]).cell_count(), 0);
}

#[test]
fn oversized_cube_is_detected() {
    let shape = CubeShape::new(vec![usize::MAX / 2, 3]);
    assert_eq!(shape.checked_cell_count(), None);
    assert_eq!(shape.cell_count(), usize::MAX);
    assert_eq!(shape.row_width(2), usize::MAX);
    assert_eq!(CubeShape::new(vec![usize::MAX, 1]).checked_cell_count(), Some(usize::MAX));
}

#[test]
fn keyword_names_parse_back() {
    for keyword in Keyword::ALL {
        assert_eq!(keyword.name().parse::<Keyword>().unwrap(), keyword);
    }
    let parsed: Keyword = serde_json::from_str("\"SUBJECT-AREA\"").unwrap();
    assert_eq!(parsed, Keyword::SubjectArea);
    let parsed: Keyword = serde_json::from_str("\"SHOWDECIMALS\"").unwrap();
    assert_eq!(parsed, Keyword::ShowDecimals);
}
