//! Small DataFrame helpers shared by the aggregation modules.

use std::cmp::Ordering;

use polars::prelude::*;

use crate::error::Result;

/// Build a frame of string key columns plus one float measure column.
pub(crate) fn keyed_frame(
    keys: &[&str],
    rows: &[(Vec<String>, Option<f64>)],
    value_column: &str,
) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(keys.len() + 1);
    for (idx, key) in keys.iter().enumerate() {
        let values: Vec<String> = rows.iter().map(|(codes, _)| codes[idx].clone()).collect();
        columns.push(Series::new((*key).into(), values).into());
    }
    let values: Vec<Option<f64>> = rows.iter().map(|(_, value)| *value).collect();
    columns.push(Series::new(value_column.into(), values).into());
    Ok(DataFrame::new(columns)?)
}

/// Sum of the present values; `None` when nothing is present.
pub(crate) fn add_optional(total: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (total, value) {
        (Some(a), Some(b)) => Some(a + b),
        (None, value) => value,
        (total, None) => total,
    }
}

/// Sort codes numerically when every code is a number, else as text.
pub fn sort_codes(codes: &mut [String]) {
    let numeric: Option<Vec<f64>> = codes
        .iter()
        .map(|code| code.trim().parse::<f64>().ok())
        .collect();
    if numeric.is_some() {
        codes.sort_by(|a, b| {
            let a_num = a.trim().parse::<f64>().unwrap_or(f64::NAN);
            let b_num = b.trim().parse::<f64>().unwrap_or(f64::NAN);
            a_num.partial_cmp(&b_num).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b))
        });
    } else {
        codes.sort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_codes_sort_by_value() {
        let mut codes: Vec<String> = ["10", "9", "100", "01"].map(String::from).to_vec();
        sort_codes(&mut codes);
        assert_eq!(codes, vec!["01", "9", "10", "100"]);
    }

    #[test]
    fn mixed_codes_sort_as_text() {
        let mut codes: Vec<String> = ["10", "9", "x"].map(String::from).to_vec();
        sort_codes(&mut codes);
        assert_eq!(codes, vec!["10", "9", "x"]);
    }
}
