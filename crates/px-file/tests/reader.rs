//! Parsing tests.

use px_file::{parse, read_px, write_px};
use px_model::{Keyword, NoDomains, Placement, PxError, TranslationTarget};

const MINIMAL: &str = r#"CHARSET="ANSI";
LANGUAGE="en";
LANGUAGES="en","sv";
DECIMALS=0;
MATRIX="POP";
SUBJECT-CODE="BE";
SUBJECT-AREA="Population";
SUBJECT-AREA[sv]="Befolkning";
CONTENTS="Population";
TITLE="Population by "
  "region and year";
TITLE[sv]="Folkmängd";
UNITS="persons";
UNITS[en]="people";
X-VENDOR-NOTE="ignored";
STUB="region";
STUB[sv]="region";
HEADING="year";
HEADING[sv]="år";
VALUES("region")="North","South";
VALUES[sv]("region")="Norr","Söder";
VALUES("year")="2023","2024";
CODES("region")="N","S";
VARIABLECODE("region")="reg";
ELIMINATION("region")=YES;
DATA=
1 2
3 "-";
"#;

#[test]
fn parses_hand_written_file() {
    let doc = parse(MINIMAL.as_bytes()).unwrap();

    assert_eq!(doc.primary_language(), "en");
    assert_eq!(doc.languages().codes(), &["en", "sv"]);
    assert_eq!(doc.field_text(Keyword::Charset, "en"), Some("ANSI"));
    assert_eq!(
        doc.field_text(Keyword::Title, "en"),
        Some("Population by region and year")
    );
    assert_eq!(doc.field_text(Keyword::Title, "sv"), Some("Folkmängd"));
    // Suffix equal to the primary language addresses the primary text.
    assert_eq!(doc.field_text(Keyword::Units, "en"), Some("people"));
    // Languages without their own record are seeded from the primary text.
    assert_eq!(doc.field_text(Keyword::Contents, "sv"), Some("Population"));

    let region = doc.variable("reg").unwrap();
    assert_eq!(region.placement(), Placement::Stub);
    assert_eq!(region.value_codes(), &["N", "S"]);
    assert_eq!(region.value_text("S").unwrap().get("sv"), Some("Söder"));
    assert_eq!(region.elimination(), None);

    let year = doc.variable("year").unwrap();
    assert_eq!(year.placement(), Placement::Heading);
    assert_eq!(year.label().get("sv"), Some("år"));
    assert_eq!(year.value_text("2024").unwrap().get("sv"), Some("2024"));

    assert_eq!(doc.cell(&["S", "2023"]).unwrap(), Some(3.0));
    assert_eq!(doc.cell(&["S", "2024"]).unwrap(), None);
}

#[test]
fn fallback_texts_are_pending_translations() {
    let doc = parse(MINIMAL.as_bytes()).unwrap();
    let pending: Vec<(TranslationTarget, &str)> = doc
        .pending_translations()
        .iter()
        .map(|entry| (entry.target.clone(), entry.language.as_str()))
        .collect();

    assert!(pending.contains(&(TranslationTarget::Field(Keyword::Contents), "sv")));
    assert!(pending.contains(&(
        TranslationTarget::ValueText {
            variable: "year".to_string(),
            code: "2024".to_string(),
        },
        "sv"
    )));
    assert!(!pending.contains(&(TranslationTarget::Field(Keyword::Title), "sv")));
    assert!(!pending.contains(&(
        TranslationTarget::VariableLabel {
            variable: "year".to_string(),
        },
        "sv"
    )));
    assert!(pending.iter().all(|(_, language)| *language == "sv"));
}

#[test]
fn variable_notes_do_not_replace_table_note() {
    let text = MINIMAL.replace(
        "DATA=",
        "NOTE=\"table note\";\nNOTE(\"region\")=\"variable note\";\nNOTE[sv](\"region\")=\"variabelnot\";\nDATA=",
    );
    let doc = parse(text.as_bytes()).unwrap();
    assert_eq!(doc.field_text(Keyword::Note, "en"), Some("table note"));
    assert_eq!(doc.field_text(Keyword::Note, "sv"), Some("table note"));
}

#[test]
fn missing_language_is_malformed() {
    let text = MINIMAL.replace("LANGUAGE=\"en\";\n", "");
    assert!(matches!(
        parse(text.as_bytes()),
        Err(PxError::MalformedHeader { .. })
    ));
}

#[test]
fn missing_mandatory_field_is_malformed() {
    let text = MINIMAL.replace("MATRIX=\"POP\";\n", "");
    let err = parse(text.as_bytes()).unwrap_err();
    assert!(matches!(err, PxError::MalformedHeader { message } if message.contains("MATRIX")));
}

#[test]
fn missing_values_is_malformed() {
    let text = MINIMAL.replace("VALUES(\"year\")=\"2023\",\"2024\";\n", "");
    assert!(matches!(
        parse(text.as_bytes()),
        Err(PxError::MalformedHeader { .. })
    ));
}

#[test]
fn undeclared_language_suffix_is_a_mismatch() {
    let text = MINIMAL.replace("TITLE[sv]", "TITLE[de]");
    let err = parse(text.as_bytes()).unwrap_err();
    assert!(matches!(
        err,
        PxError::LanguageMismatch { keyword, language } if keyword == "TITLE" && language == "de"
    ));
}

#[test]
fn suffix_on_plain_keyword_is_malformed() {
    let text = MINIMAL.replace("MATRIX=", "MATRIX[sv]=");
    assert!(matches!(
        parse(text.as_bytes()),
        Err(PxError::MalformedHeader { .. })
    ));
}

#[test]
fn short_data_block_is_malformed_data() {
    let text = MINIMAL.replace("3 \"-\";", "3;");
    assert!(matches!(
        parse(text.as_bytes()),
        Err(PxError::MalformedData { .. })
    ));
}

#[test]
fn bad_data_token_is_malformed_data() {
    let text = MINIMAL.replace("1 2", "1 two");
    assert!(matches!(
        parse(text.as_bytes()),
        Err(PxError::MalformedData { .. })
    ));
}

#[test]
fn codes_and_values_must_match_in_length() {
    let text = MINIMAL.replace("CODES(\"region\")=\"N\",\"S\";", "CODES(\"region\")=\"N\";");
    assert!(matches!(
        parse(text.as_bytes()),
        Err(PxError::MalformedHeader { .. })
    ));
}

#[test]
fn unterminated_record_is_malformed() {
    let text = MINIMAL.replace("DATA=\n1 2\n3 \"-\";\n", "DATA=\n1 2\n3 4\n");
    assert!(matches!(
        parse(text.as_bytes()),
        Err(PxError::MalformedHeader { .. })
    ));
}

#[test]
fn non_utf8_input_is_rejected() {
    assert!(parse(&[0x4c, 0xff, 0xfe]).is_err());
}

#[test]
fn read_px_reads_written_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.px");
    let doc = parse(MINIMAL.as_bytes()).unwrap();
    write_px(&path, &doc, &NoDomains).unwrap();
    assert_eq!(read_px(&path).unwrap(), doc);

    let missing = dir.path().join("absent.px");
    assert!(matches!(read_px(&missing), Err(PxError::Io { .. })));
}
