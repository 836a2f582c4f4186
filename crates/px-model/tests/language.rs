//! Tests for language set transitions and seeding of new languages.

use proptest::prelude::*;

use px_model::{
    Document, Keyword, LanguageSet, Placement, PxError, TextInput, TranslationTarget,
};

fn langs(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| (*c).to_string()).collect()
}

fn sample_document() -> Document {
    let mut doc = Document::new("no").unwrap();
    doc.set_field(Keyword::Title, "Folkemengde").unwrap();
    doc.set_field(Keyword::Matrix, "FOLK01").unwrap();
    doc.add_variable("alder", Placement::Stub, langs(&["0-14", "15+"]))
        .unwrap();
    doc.set_value_text("alder", "15+", "15 år og over").unwrap();
    doc
}

#[test]
fn adding_language_seeds_every_localized_text() {
    let mut doc = sample_document();
    let pending = doc.set_languages(&langs(&["no", "en"]), "no").unwrap();

    assert_eq!(doc.languages().codes(), &langs(&["no", "en"])[..]);
    assert_eq!(doc.field_text(Keyword::Title, "en"), Some("Folkemengde"));
    let alder = doc.variable("alder").unwrap();
    assert_eq!(alder.label().get("en"), Some("alder"));
    assert_eq!(alder.value_text("15+").unwrap().get("en"), Some("15 år og over"));

    // title + variable label + two value texts
    assert_eq!(pending.len(), 4);
    assert!(pending.iter().all(|entry| entry.language == "en"));
    assert_eq!(doc.pending_translations().len(), 4);
}

#[test]
fn plain_fields_are_not_seeded() {
    let mut doc = sample_document();
    let pending = doc.set_languages(&langs(&["no", "en"]), "no").unwrap();
    assert!(
        !pending
            .iter()
            .any(|entry| entry.target == TranslationTarget::Field(Keyword::Matrix))
    );
}

#[test]
fn removing_language_is_rejected_without_mutation() {
    let mut doc = sample_document();
    doc.set_languages(&langs(&["no", "en"]), "no").unwrap();
    let before = doc.clone();

    let err = doc.set_languages(&langs(&["en"]), "en").unwrap_err();
    assert!(matches!(err, PxError::InvalidLanguageTransition { .. }));
    assert_eq!(doc, before);
    assert_eq!(doc.languages(), before.languages());
}

#[test]
fn primary_must_be_listed() {
    let mut doc = sample_document();
    let err = doc.set_languages(&langs(&["no", "en"]), "sv").unwrap_err();
    assert!(matches!(err, PxError::InvalidLanguageTransition { .. }));
}

#[test]
fn empty_and_duplicate_lists_are_rejected() {
    let mut doc = sample_document();
    assert!(doc.set_languages(&[], "no").is_err());
    assert!(doc.set_languages(&langs(&["no", "no"]), "no").is_err());
}

#[test]
fn primary_can_move_to_another_active_language() {
    let mut doc = sample_document();
    doc.set_languages(&langs(&["no", "en"]), "no").unwrap();
    let pending = doc.set_languages(&langs(&["no", "en"]), "en").unwrap();
    assert!(pending.is_empty());
    assert_eq!(doc.primary_language(), "en");
}

#[test]
fn translating_clears_pending_entries() {
    let mut doc = sample_document();
    doc.set_languages(&langs(&["no", "en"]), "no").unwrap();
    doc.set_field(Keyword::Title, TextInput::localized([("en", "Population")]))
        .unwrap();
    doc.set_variable_label("alder", TextInput::localized([("en", "age")]))
        .unwrap();

    let remaining: Vec<_> = doc
        .pending_translations()
        .iter()
        .map(|entry| entry.target.clone())
        .collect();
    assert_eq!(remaining.len(), 2);
    assert!(
        remaining
            .iter()
            .all(|target| matches!(target, TranslationTarget::ValueText { .. }))
    );
}

#[test]
fn language_tags_are_validated() {
    assert!(LanguageSet::new("").is_err());
    assert!(LanguageSet::new("n o").is_err());
    assert!(LanguageSet::new("nb-NO").is_ok());
}

#[test]
fn secondary_languages_exclude_primary() {
    let set = LanguageSet::from_codes(&langs(&["no", "en", "se"]), "en").unwrap();
    let secondary: Vec<&str> = set.secondary().collect();
    assert_eq!(secondary, vec!["no", "se"]);
}

proptest! {
    #[test]
    fn extension_never_shrinks_or_leaves_gaps(extra in proptest::collection::btree_set("[a-z]{2}", 0..4)) {
        let mut doc = sample_document();
        let mut codes = vec!["no".to_string()];
        codes.extend(extra.into_iter().filter(|c| c != "no"));

        let before = doc.languages().len();
        doc.set_languages(&codes, "no").unwrap();
        prop_assert!(doc.languages().len() >= before);

        for code in &codes {
            prop_assert!(doc.field_text(Keyword::Title, code).is_some());
            let alder = doc.variable("alder").unwrap();
            prop_assert!(alder.label().get(code).is_some());
            for value in alder.value_codes() {
                let text = alder.value_text(value).unwrap().get(code);
                prop_assert!(text.is_some_and(|t| !t.is_empty()));
            }
        }
    }
}

#[test]
fn seeded_secondary_text_is_pending() {
    let mut doc = Document::new("no").unwrap();
    doc.set_languages(&langs(&["no", "en"]), "no").unwrap();
    doc.set_field(Keyword::Title, TextInput::localized([("no", "Tittel")]))
        .unwrap();

    assert_eq!(doc.field_text(Keyword::Title, "en"), Some("Tittel"));
    let pending: Vec<_> = doc.pending_translations().iter().collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].target, TranslationTarget::Field(Keyword::Title));
    assert_eq!(pending[0].language, "en");

    doc.set_field(Keyword::Title, TextInput::localized([("en", "Title")]))
        .unwrap();
    assert!(doc.pending_translations().is_empty());
}

#[test]
fn new_variable_in_bilingual_document_is_pending() {
    let mut doc = Document::new("no").unwrap();
    doc.set_languages(&langs(&["no", "en"]), "no").unwrap();
    doc.add_variable("kjonn", Placement::Stub, langs(&["1", "2"]))
        .unwrap();
    // label + two value texts, English only
    assert_eq!(doc.pending_translations().len(), 3);

    doc.set_variable_label("kjonn", TextInput::localized([("no", "kjønn"), ("en", "sex")]))
        .unwrap();
    doc.set_value_text("kjonn", "1", "1").unwrap();
    let remaining: Vec<_> = doc
        .pending_translations()
        .iter()
        .map(|entry| entry.target.clone())
        .collect();
    assert_eq!(
        remaining,
        vec![TranslationTarget::ValueText {
            variable: "kjonn".to_string(),
            code: "2".to_string(),
        }]
    );
}

#[test]
fn marking_untranslated_checks_target_and_language() {
    let mut doc = sample_document();
    doc.set_languages(&langs(&["no", "en"]), "no").unwrap();
    doc.set_field(Keyword::Title, TextInput::localized([("en", "Population")]))
        .unwrap();

    doc.mark_untranslated(TranslationTarget::Field(Keyword::Title), "en")
        .unwrap();
    assert!(doc.pending_translations().iter().any(|entry| {
        entry.target == TranslationTarget::Field(Keyword::Title) && entry.language == "en"
    }));
    assert!(matches!(
        doc.mark_untranslated(TranslationTarget::Field(Keyword::Title), "no"),
        Err(PxError::UnknownLanguage { .. })
    ));
    assert!(matches!(
        doc.mark_untranslated(
            TranslationTarget::VariableLabel {
                variable: "kjonn".to_string()
            },
            "en"
        ),
        Err(PxError::UnknownVariable { .. })
    ));
}
