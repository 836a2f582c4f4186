//! Property tests: parsing a serialized document gives the document back.

use std::collections::BTreeMap;

use proptest::prelude::*;

use px_file::{parse, serialize};
use px_model::{Document, DomainResolver, Keyword, Placement, TextInput};

const LANGUAGES: [&str; 3] = ["no", "en", "se"];

/// Domain name to value codes, standing in for a classification store.
#[derive(Debug, Clone, Default)]
struct Domains(BTreeMap<String, Vec<String>>);

impl DomainResolver for Domains {
    fn value_codes(&self, domain: &str) -> Option<Vec<String>> {
        self.0.get(domain).cloned()
    }
}

#[derive(Debug, Clone)]
struct Plan {
    languages: usize,
    primary: usize,
    /// Value count, heading placement and domain binding per variable.
    variables: Vec<(usize, bool, bool)>,
    title: String,
    note: String,
    pool: Vec<String>,
    eliminate: bool,
    cells: Vec<Option<f64>>,
}

fn build(plan: Plan) -> (Document, Domains) {
    let codes: Vec<String> = LANGUAGES[..plan.languages]
        .iter()
        .map(|code| code.to_string())
        .collect();
    let primary = codes[plan.primary % codes.len()].clone();
    let mut doc = Document::new(&primary).unwrap();
    doc.set_languages(&codes, &primary).unwrap();
    let mut domains = Domains::default();

    doc.set_field(Keyword::Decimals, "1").unwrap();
    doc.set_field(Keyword::Matrix, "M01").unwrap();
    doc.set_field(Keyword::SubjectCode, "SC").unwrap();
    doc.set_field(Keyword::SubjectArea, plan.pool[0].as_str()).unwrap();
    doc.set_field(Keyword::Contents, plan.pool[1].as_str()).unwrap();
    doc.set_field(Keyword::Units, plan.pool[2].as_str()).unwrap();
    doc.set_field(
        Keyword::Title,
        TextInput::localized(codes.iter().map(|lang| (lang.clone(), format!("{} {lang}", plan.title)))),
    )
    .unwrap();
    if !plan.note.is_empty() {
        doc.set_field(Keyword::Note, plan.note.as_str()).unwrap();
    }

    for (idx, (size, heading, bound)) in plan.variables.iter().enumerate() {
        let code = format!("var{idx}");
        let placement = if *heading {
            Placement::Heading
        } else {
            Placement::Stub
        };
        let values: Vec<String> = (0..*size).map(|j| format!("c{j}")).collect();
        doc.add_variable(&code, placement, values.clone()).unwrap();
        doc.set_variable_label(
            &code,
            TextInput::localized(codes.iter().map(|lang| (lang.clone(), format!("Variable {idx} {lang}")))),
        )
        .unwrap();
        for (j, value) in values.iter().enumerate() {
            let text = &plan.pool[(idx * 4 + j) % plan.pool.len()];
            doc.set_value_text(
                &code,
                value,
                TextInput::localized(codes.iter().map(|lang| (lang.clone(), format!("{j}:{text} {lang}")))),
            )
            .unwrap();
        }
        if plan.eliminate {
            doc.set_elimination(&code, Some("c0")).unwrap();
        }
        if *bound {
            let domain = format!("dom{idx}");
            domains.0.insert(domain.clone(), values);
            doc.bind_domain(&code, &domain).unwrap();
        }
    }
    doc.set_data(plan.cells).unwrap();
    (doc, domains)
}

fn document() -> impl Strategy<Value = (Document, Domains)> {
    (
        1usize..=3,
        0usize..3,
        prop::collection::vec((1usize..=4, any::<bool>(), any::<bool>()), 1..=3),
        "[A-Za-z0-9 ,;=()]{0,30}",
        "[a-z ]{0,450}",
        prop::collection::vec("[A-Za-z0-9 ]{0,12}", 12),
        any::<bool>(),
    )
        .prop_flat_map(|(languages, primary, variables, title, note, pool, eliminate)| {
            let cells = variables.iter().map(|(size, _, _)| *size).product::<usize>();
            (
                Just(Plan {
                    languages,
                    primary,
                    variables,
                    title,
                    note,
                    pool,
                    eliminate,
                    cells: Vec::new(),
                }),
                prop::collection::vec(prop::option::of(-1.0e9f64..1.0e9), cells),
            )
        })
        .prop_map(|(plan, cells)| build(Plan { cells, ..plan }))
}

proptest! {
    #[test]
    fn parse_inverts_serialize((doc, domains) in document()) {
        let bytes = serialize(&doc, &domains).unwrap();
        let parsed = parse(&bytes).unwrap();
        prop_assert_eq!(&parsed, &doc);
        prop_assert_eq!(parsed.languages().codes(), doc.languages().codes());
        prop_assert_eq!(parsed.primary_language(), doc.primary_language());
        prop_assert_eq!(serialize(&parsed, &domains).unwrap(), bytes);
    }

    #[test]
    fn bound_domains_are_written_per_language((doc, domains) in document()) {
        let text = String::from_utf8(serialize(&doc, &domains).unwrap()).unwrap();
        let domain_records = text.lines().filter(|line| line.starts_with("DOMAIN")).count();
        let bound = doc.variables().iter().filter(|v| v.domain().is_some()).count();
        prop_assert_eq!(domain_records, bound * doc.languages().len());
        let primary_line = format!("LANGUAGE=\"{}\";", doc.primary_language());
        prop_assert!(text.lines().any(|line| line == primary_line));
    }

    #[test]
    fn data_lines_follow_stub_combinations((doc, domains) in document()) {
        let text = String::from_utf8(serialize(&doc, &domains).unwrap()).unwrap();
        let stub_cells: usize = doc.stub().map(|v| v.value_codes().len()).product();
        let data_block = text.split("DATA=\n").nth(1).unwrap();
        let longest = data_block.lines().map(str::len).max().unwrap_or(0);
        prop_assert!(longest <= px_file::MAX_LINE);
        if doc.heading().map(|v| v.value_codes().len()).product::<usize>() <= 10 {
            prop_assert_eq!(data_block.lines().count(), stub_cells);
        }
    }
}
