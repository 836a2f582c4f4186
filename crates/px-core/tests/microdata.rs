use std::collections::BTreeMap;

use polars::prelude::*;
use proptest::prelude::*;

use px_core::{MicrodataOptions, add_totals, frequency_table, from_microdata, from_table};
use px_file::{parse, serialize};
use px_ingest::{numeric_values, string_values};
use px_model::{Keyword, NoDomains, Placement};

fn microdata() -> DataFrame {
    df!(
        "region" => ["0301", "0301", "4601", "0301", "301"],
        "sex" => ["1", "2", "2", "2", "1"],
    )
    .unwrap()
}

#[test]
fn frequency_table_counts_combinations() {
    let table = frequency_table(&microdata(), &["region", "sex"], "count").unwrap();
    assert_eq!(table.height(), 4);
    assert_eq!(
        string_values(&table, "region").unwrap(),
        vec!["0301", "0301", "301", "4601"]
    );
    assert_eq!(
        numeric_values(&table, "count").unwrap(),
        vec![Some(1.0), Some(2.0), Some(1.0), Some(1.0)]
    );
}

#[test]
fn from_microdata_builds_cube_with_grand_total() {
    let options = MicrodataOptions::new("no")
        .with_heading(["sex"])
        .with_totals(["region", "sex"]);
    let doc = from_microdata(&microdata(), &["region", "sex"], &options).unwrap();

    let region = doc.variable("region").unwrap();
    assert_eq!(region.placement(), Placement::Stub);
    assert_eq!(region.value_codes()[0], "Total");
    assert_eq!(region.elimination(), Some("Total"));
    assert_eq!(doc.variable("sex").unwrap().value_codes(), &["Total", "1", "2"]);

    assert_eq!(doc.cell(&["Total", "Total"]).unwrap(), Some(5.0));
    assert_eq!(doc.cell(&["0301", "2"]).unwrap(), Some(2.0));
    assert_eq!(doc.cell(&["Total", "2"]).unwrap(), Some(3.0));
    assert_eq!(doc.cell(&["0301", "Total"]).unwrap(), Some(3.0));
    assert_eq!(doc.cell(&["4601", "1"]).unwrap(), None);
}

#[test]
fn codes_sort_numerically_when_all_numeric() {
    let df = df!("age" => ["10", "9", "100", "9"]).unwrap();
    let doc = from_microdata(&df, &["age"], &MicrodataOptions::default()).unwrap();
    assert_eq!(doc.variable("age").unwrap().value_codes(), &["9", "10", "100"]);
    assert_eq!(doc.cell(&["9"]).unwrap(), Some(2.0));
}

#[test]
fn aggregated_table_keeps_its_values() {
    let df = df!(
        "region" => ["0301", "4601", "0301", "4601"],
        "year" => ["2024", "2024", "2023", "2023"],
        "persons" => ["717710", "291940", "709037", ""],
    )
    .unwrap();
    let options = MicrodataOptions::new("no")
        .with_heading(["year"])
        .with_totals(["region"]);
    let doc = from_table(&df, &["region", "year"], "persons", &options).unwrap();

    assert_eq!(doc.variable("year").unwrap().value_codes(), &["2023", "2024"]);
    assert_eq!(doc.cell(&["Total", "2024"]).unwrap(), Some(1_009_650.0));
    assert_eq!(doc.cell(&["Total", "2023"]).unwrap(), Some(709_037.0));
    assert_eq!(doc.cell(&["4601", "2023"]).unwrap(), None);
}

#[test]
fn total_code_already_in_data_is_rejected() {
    let df = df!("region" => ["Total", "0301"]).unwrap();
    let options = MicrodataOptions::new("en").with_totals(["region"]);
    assert!(from_microdata(&df, &["region"], &options).is_err());
}

#[test]
fn microdata_document_serializes() {
    let options = MicrodataOptions::new("en").with_totals(["region"]);
    let mut doc = from_microdata(&microdata(), &["region", "sex"], &options).unwrap();
    for (keyword, text) in [
        (Keyword::Decimals, "0"),
        (Keyword::Matrix, "POP"),
        (Keyword::SubjectCode, "BE"),
        (Keyword::SubjectArea, "Population"),
        (Keyword::Contents, "Persons"),
        (Keyword::Title, "Persons by region and sex"),
        (Keyword::Units, "persons"),
    ] {
        doc.set_field(keyword, text).unwrap();
    }
    let bytes = serialize(&doc, &NoDomains).unwrap();
    let text = String::from_utf8(bytes.clone()).unwrap();
    assert!(text.contains("ELIMINATION(\"region\")=\"Total\";"));
    assert_eq!(parse(&bytes).unwrap(), doc);
}

fn cells() -> impl Strategy<Value = BTreeMap<(u8, u8), u32>> {
    prop::collection::btree_map((0u8..4, 0u8..3), 0u32..1000, 1..12)
}

proptest! {
    #[test]
    fn total_equals_sum_over_other_codes(cells in cells()) {
        let a: Vec<String> = cells.keys().map(|(a, _)| a.to_string()).collect();
        let b: Vec<String> = cells.keys().map(|(_, b)| b.to_string()).collect();
        let values: Vec<f64> = cells.values().map(|v| f64::from(*v)).collect();
        let df = df!("a" => a, "b" => b, "value" => values).unwrap();

        let totals = add_totals(&df, &["a", "b"], "value", "a", "Total").unwrap();
        prop_assert_eq!(totals.height(), df.height() + cells.keys().map(|(_, b)| *b).collect::<std::collections::BTreeSet<_>>().len());

        let a_out = string_values(&totals, "a").unwrap();
        let b_out = string_values(&totals, "b").unwrap();
        let v_out = numeric_values(&totals, "value").unwrap();
        for idx in 0..totals.height() {
            if a_out[idx] != "Total" {
                continue;
            }
            let expected: f64 = cells
                .iter()
                .filter(|((_, b), _)| b.to_string() == b_out[idx])
                .map(|(_, v)| f64::from(*v))
                .sum();
            prop_assert_eq!(v_out[idx], Some(expected));
        }
    }
}
