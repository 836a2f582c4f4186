//! Splitting PX text into keyword records and value items.

use px_model::{PxError, Result};

/// One `KEYWORD[lang]("arg",...)=value;` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Record {
    pub keyword: String,
    pub language: Option<String>,
    pub args: Vec<String>,
    /// Raw text between `=` and `;`.
    pub value: String,
    /// 1-based line of the record start.
    pub line: usize,
}

/// A value list item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Item {
    /// Quoted text; adjacent quoted chunks are already concatenated.
    Quoted(String),
    /// Unquoted token such as a number or `YES`.
    Bare(String),
}

impl Item {
    pub fn text(&self) -> &str {
        match self {
            Item::Quoted(text) | Item::Bare(text) => text,
        }
    }
}

/// Split a whole file into records.
pub(crate) fn split_records(text: &str) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut pos = 0usize;
    let mut line = 1usize;

    loop {
        while pos < chars.len() && chars[pos].is_whitespace() {
            if chars[pos] == '\n' {
                line += 1;
            }
            pos += 1;
        }
        if pos >= chars.len() {
            break;
        }
        let start_line = line;

        let header_start = pos;
        let mut in_quotes = false;
        while pos < chars.len() && (in_quotes || chars[pos] != '=') {
            match chars[pos] {
                '"' => in_quotes = !in_quotes,
                '\n' => line += 1,
                _ => {}
            }
            pos += 1;
        }
        if pos >= chars.len() {
            return Err(PxError::malformed_header(format!(
                "line {start_line}: record without '='"
            )));
        }
        let header: String = chars[header_start..pos].iter().collect();
        pos += 1;

        let value_start = pos;
        in_quotes = false;
        while pos < chars.len() && (in_quotes || chars[pos] != ';') {
            match chars[pos] {
                '"' => in_quotes = !in_quotes,
                '\n' => line += 1,
                _ => {}
            }
            pos += 1;
        }
        let (keyword, language, args) = parse_header(header.trim(), start_line)?;
        if pos >= chars.len() {
            return Err(PxError::malformed_header(format!(
                "line {start_line}: record {keyword} is not terminated by ';'"
            )));
        }
        let value: String = chars[value_start..pos].iter().collect();
        pos += 1;

        records.push(Record {
            keyword,
            language,
            args,
            value,
            line: start_line,
        });
    }
    Ok(records)
}

fn parse_header(header: &str, line: usize) -> Result<(String, Option<String>, Vec<String>)> {
    let keyword_end = header.find(['[', '(']).unwrap_or(header.len());
    let keyword = header[..keyword_end].trim().to_string();
    if keyword.is_empty() {
        return Err(PxError::malformed_header(format!("line {line}: empty keyword")));
    }
    let mut rest = header[keyword_end..].trim_start();

    let mut language = None;
    if let Some(after) = rest.strip_prefix('[') {
        let close = after.find(']').ok_or_else(|| {
            PxError::malformed_header(format!("line {line}: unclosed language suffix on {keyword}"))
        })?;
        language = Some(after[..close].trim().to_string());
        rest = after[close + 1..].trim_start();
    }

    let mut args = Vec::new();
    if let Some(after) = rest.strip_prefix('(') {
        let inner = after.strip_suffix(')').ok_or_else(|| {
            PxError::malformed_header(format!("line {line}: unclosed argument list on {keyword}"))
        })?;
        for item in parse_items(inner)? {
            match item {
                Item::Quoted(text) => args.push(text),
                Item::Bare(text) => {
                    return Err(PxError::malformed_header(format!(
                        "line {line}: unquoted argument '{text}' on {keyword}"
                    )));
                }
            }
        }
    } else if !rest.is_empty() {
        return Err(PxError::malformed_header(format!(
            "line {line}: unexpected '{rest}' after {keyword}"
        )));
    }
    Ok((keyword, language, args))
}

/// Parse a comma separated value list.
pub(crate) fn parse_items(raw: &str) -> Result<Vec<Item>> {
    let chars: Vec<char> = raw.chars().collect();
    let mut items = Vec::new();
    let mut pos = 0usize;

    loop {
        skip_whitespace(&chars, &mut pos);
        if pos >= chars.len() {
            break;
        }
        if chars[pos] == '"' {
            let mut text = String::new();
            while pos < chars.len() && chars[pos] == '"' {
                pos += 1;
                let start = pos;
                while pos < chars.len() && chars[pos] != '"' {
                    pos += 1;
                }
                if pos >= chars.len() {
                    return Err(PxError::malformed_header("unterminated quoted string"));
                }
                text.extend(&chars[start..pos]);
                pos += 1;
                skip_whitespace(&chars, &mut pos);
            }
            items.push(Item::Quoted(text));
        } else {
            let start = pos;
            while pos < chars.len() && chars[pos] != ',' {
                pos += 1;
            }
            let token: String = chars[start..pos].iter().collect();
            let token = token.trim();
            if token.contains(char::is_whitespace) {
                return Err(PxError::malformed_header(format!("unexpected token '{token}'")));
            }
            items.push(Item::Bare(token.to_string()));
        }

        skip_whitespace(&chars, &mut pos);
        if pos >= chars.len() {
            break;
        }
        if chars[pos] != ',' {
            return Err(PxError::malformed_header(format!(
                "expected ',' in value list, found '{}'",
                chars[pos]
            )));
        }
        pos += 1;
    }
    Ok(items)
}

/// Split the DATA block into cell tokens.
pub(crate) fn data_tokens(raw: &str) -> Vec<Item> {
    raw.split(|ch: char| ch.is_whitespace() || ch == ',')
        .filter(|token| !token.is_empty())
        .map(|token| match token.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
            Some(symbol) => Item::Quoted(symbol.to_string()),
            None => Item::Bare(token.to_string()),
        })
        .collect()
}

fn skip_whitespace(chars: &[char], pos: &mut usize) {
    while *pos < chars.len() && chars[*pos].is_whitespace() {
        *pos += 1;
    }
}
