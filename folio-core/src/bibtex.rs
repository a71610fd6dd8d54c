//! BibTeX parsing into publication records.
//!
//! The parser is tolerant by construction: it scans for `@type{` markers,
//! balance-matches the entry body, and either produces a complete
//! [`PublicationRecord`] or drops the entry and records why in
//! [`BibtexParse::skipped`]. A broken entry never stops the scan.
//!
//! ```
//! use folio_core::bibtex::parse_bibtex;
//!
//! let records = parse_bibtex("@article{k1, author={A and B}, year={2020}, title={T}}");
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].id, "k1");
//! assert_eq!(records[0].year, Some(2020));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Field names that mark an entry's BibTeX source as hidden.
const HIDDEN_BIB_FIELDS: &[&str] = &["hidden_bib", "hiddenbib", "hide_bibtex"];

/// Entry types that carry no publication.
const NON_PUBLICATION_TYPES: &[&str] = &["comment", "string", "preamble"];

/// Entry type of a publication, from the `@type` token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PublicationType {
    Article,
    Book,
    Booklet,
    InBook,
    InCollection,
    InProceedings,
    Manual,
    MastersThesis,
    Misc,
    PhdThesis,
    Proceedings,
    TechReport,
    Unpublished,
    Other(String),
}

impl PublicationType {
    /// Resolve an entry type token (case-insensitive).
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "article" => PublicationType::Article,
            "book" => PublicationType::Book,
            "booklet" => PublicationType::Booklet,
            "inbook" => PublicationType::InBook,
            "incollection" => PublicationType::InCollection,
            // `@conference` is the classic alias of `@inproceedings`
            "inproceedings" | "conference" => PublicationType::InProceedings,
            "manual" => PublicationType::Manual,
            "mastersthesis" => PublicationType::MastersThesis,
            "misc" => PublicationType::Misc,
            "phdthesis" => PublicationType::PhdThesis,
            "proceedings" => PublicationType::Proceedings,
            "techreport" => PublicationType::TechReport,
            "unpublished" => PublicationType::Unpublished,
            other => PublicationType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PublicationType::Article => "article",
            PublicationType::Book => "book",
            PublicationType::Booklet => "booklet",
            PublicationType::InBook => "inbook",
            PublicationType::InCollection => "incollection",
            PublicationType::InProceedings => "inproceedings",
            PublicationType::Manual => "manual",
            PublicationType::MastersThesis => "mastersthesis",
            PublicationType::Misc => "misc",
            PublicationType::PhdThesis => "phdthesis",
            PublicationType::Proceedings => "proceedings",
            PublicationType::TechReport => "techreport",
            PublicationType::Unpublished => "unpublished",
            PublicationType::Other(name) => name,
        }
    }

    /// Human readable label for filter menus and badges.
    pub fn label(&self) -> String {
        match self {
            PublicationType::Article => "Journal article".to_string(),
            PublicationType::Book => "Book".to_string(),
            PublicationType::Booklet => "Booklet".to_string(),
            PublicationType::InBook => "Book chapter".to_string(),
            PublicationType::InCollection => "In collection".to_string(),
            PublicationType::InProceedings => "Conference paper".to_string(),
            PublicationType::Manual => "Manual".to_string(),
            PublicationType::MastersThesis => "Master's thesis".to_string(),
            PublicationType::Misc => "Other".to_string(),
            PublicationType::PhdThesis => "PhD thesis".to_string(),
            PublicationType::Proceedings => "Proceedings".to_string(),
            PublicationType::TechReport => "Technical report".to_string(),
            PublicationType::Unpublished => "Unpublished".to_string(),
            PublicationType::Other(name) => {
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

impl fmt::Display for PublicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for PublicationType {
    fn from(value: String) -> Self {
        PublicationType::from_name(&value)
    }
}

impl From<PublicationType> for String {
    fn from(value: PublicationType) -> Self {
        value.as_str().to_string()
    }
}

/// A single author, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
}

/// Structured form of one BibTeX entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRecord {
    /// Citation key
    pub id: String,

    #[serde(rename = "type")]
    pub kind: PublicationType,

    pub title: Option<String>,
    pub authors: Vec<Author>,
    pub journal: Option<String>,
    pub conference: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,

    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,

    pub hidden_bib: bool,

    /// Verbatim entry text, from `@` through the closing brace
    pub bibtex: String,

    /// Every field of the entry, keyed by lowercase name
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl PublicationRecord {
    /// Look up any field by (case-insensitive) name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    /// Journal, falling back to the conference.
    pub fn venue(&self) -> Option<&str> {
        self.journal.as_deref().or(self.conference.as_deref())
    }

    /// Copy for published JSON: `bibtex` is emptied when the entry asks for
    /// its BibTeX to stay hidden.
    pub fn published(&self) -> PublicationRecord {
        let mut record = self.clone();
        if record.hidden_bib {
            record.bibtex.clear();
        }
        record
    }
}

/// Why an entry was dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BibtexError {
    #[error("entry is missing its closing brace")]
    Unterminated,

    #[error("entry has no citation key")]
    MissingKey,

    #[error("malformed field assignment: {0}")]
    MalformedField(String),

    #[error("duplicate citation key `{0}`")]
    DuplicateKey(String),
}

/// An entry the parser dropped, with enough context to report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    /// 1-based line of the entry's `@`
    pub line: usize,
    pub entry_type: String,
    pub key: Option<String>,
    pub error: BibtexError,
}

/// Records plus the entries that did not make it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibtexParse {
    pub records: Vec<PublicationRecord>,
    pub skipped: Vec<SkippedEntry>,
}

/// Parse BibTeX text into records, silently dropping malformed entries.
pub fn parse_bibtex(input: &str) -> Vec<PublicationRecord> {
    parse_bibtex_report(input).records
}

/// Parse BibTeX text into records and a report of skipped entries.
pub fn parse_bibtex_report(input: &str) -> BibtexParse {
    let mut scanner = Scanner::new(input);
    let mut result = BibtexParse::default();
    let mut seen: HashSet<String> = HashSet::new();

    while let Some(item) = scanner.next_item() {
        match item {
            ScanItem::Entry(raw) => {
                if NON_PUBLICATION_TYPES.contains(&raw.entry_type.as_str()) {
                    continue;
                }
                match build_record(&raw) {
                    Ok(record) => {
                        if seen.insert(record.id.clone()) {
                            result.records.push(record);
                        } else {
                            let key = record.id.clone();
                            result.skipped.push(SkippedEntry {
                                line: raw.line,
                                entry_type: raw.entry_type.clone(),
                                key: Some(key.clone()),
                                error: BibtexError::DuplicateKey(key),
                            });
                        }
                    }
                    Err(error) => result.skipped.push(SkippedEntry {
                        line: raw.line,
                        entry_type: raw.entry_type.clone(),
                        key: raw.key_hint(),
                        error,
                    }),
                }
            }
            ScanItem::Unterminated {
                line,
                entry_type,
                key,
            } => {
                if NON_PUBLICATION_TYPES.contains(&entry_type.as_str()) {
                    continue;
                }
                result.skipped.push(SkippedEntry {
                    line,
                    entry_type,
                    key,
                    error: BibtexError::Unterminated,
                });
            }
        }
    }

    result
}

/// A balance-matched entry span.
struct RawEntry<'a> {
    line: usize,
    entry_type: String,
    /// Text between the outer braces
    body: &'a str,
    /// Text from `@` through the closing brace
    source: &'a str,
}

impl RawEntry<'_> {
    fn key_hint(&self) -> Option<String> {
        split_top_level(self.body)
            .first()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && !k.contains('='))
    }
}

enum ScanItem<'a> {
    Entry(RawEntry<'a>),
    Unterminated {
        line: usize,
        entry_type: String,
        key: Option<String>,
    },
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    /// Line number of `line_pos`, advanced incrementally
    line: usize,
    line_pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            line_pos: 0,
        }
    }

    /// 1-based line of `idx`. Entry starts only move forward, so each call
    /// counts newlines from the previous one.
    fn line_at(&mut self, idx: usize) -> usize {
        if idx < self.line_pos {
            self.line = 1;
            self.line_pos = 0;
        }
        self.line += self.src.as_bytes()[self.line_pos..idx]
            .iter()
            .filter(|b| **b == b'\n')
            .count();
        self.line_pos = idx;
        self.line
    }

    fn next_item(&mut self) -> Option<ScanItem<'a>> {
        let bytes = self.src.as_bytes();

        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'%' if self.at_line_start(self.pos) => {
                    // Comment line outside of any entry
                    while self.pos < bytes.len() && bytes[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                b'@' => {
                    if let Some(item) = self.read_entry(self.pos) {
                        return Some(item);
                    }
                }
                _ => self.pos += 1,
            }
        }

        None
    }

    /// Try to read an entry starting at the `@` at `start`.
    ///
    /// Always advances `self.pos`. Returns `None` when the `@` does not open
    /// an entry at all (e.g. an email address in free text).
    fn read_entry(&mut self, start: usize) -> Option<ScanItem<'a>> {
        let bytes = self.src.as_bytes();
        let mut i = skip_whitespace(bytes, start + 1);

        let type_start = i;
        while i < bytes.len()
            && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'-')
        {
            i += 1;
        }
        if i == type_start {
            self.pos = start + 1;
            return None;
        }
        let entry_type = self.src[type_start..i].to_ascii_lowercase();

        let open = skip_whitespace(bytes, i);
        if open >= bytes.len() || bytes[open] != b'{' {
            self.pos = open.max(start + 1);
            return None;
        }

        let line = self.line_at(start);
        match self.find_close(open) {
            Ok(close) => {
                self.pos = close + 1;
                Some(ScanItem::Entry(RawEntry {
                    line,
                    entry_type,
                    body: &self.src[open + 1..close],
                    source: &self.src[start..=close],
                }))
            }
            Err(resume) => {
                let body_end = resume.min(bytes.len());
                let key = split_top_level(&self.src[open + 1..body_end])
                    .first()
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty() && !k.contains('='));
                // Rescan right after the opening brace so entries swallowed
                // by the unbalanced span are still found.
                self.pos = if resume < bytes.len() {
                    resume
                } else {
                    open + 1
                };
                Some(ScanItem::Unterminated {
                    line,
                    entry_type,
                    key,
                })
            }
        }
    }

    /// Index of the brace matching the one at `open`.
    ///
    /// `Err(pos)` when the entry never closes; `pos` is either the `@` of the
    /// next entry (found at the entry's top level, outside a quoted value, at
    /// the start of a line) or the end of input.
    fn find_close(&self, open: usize) -> Result<usize, usize> {
        let bytes = self.src.as_bytes();
        let mut depth = 0usize;
        let mut in_quotes = false;
        let mut j = open;

        while j < bytes.len() {
            match bytes[j] {
                b'\\' => {
                    j += 2;
                    continue;
                }
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(j);
                    }
                }
                b'"' if depth == 1 => in_quotes = !in_quotes,
                b'@' if depth == 1 && !in_quotes && self.at_line_start(j) => return Err(j),
                _ => {}
            }
            j += 1;
        }

        Err(bytes.len())
    }

    fn at_line_start(&self, idx: usize) -> bool {
        self.src.as_bytes()[..idx]
            .iter()
            .rev()
            .take_while(|b| **b != b'\n')
            .all(|b| b.is_ascii_whitespace())
    }
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Split on commas that sit outside braces and quotes.
fn split_top_level(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'"' if depth == 0 => in_quotes = !in_quotes,
            b',' if depth == 0 && !in_quotes => {
                parts.push(&body[last..i]);
                last = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&body[last..]);

    parts
}

fn build_record(raw: &RawEntry<'_>) -> Result<PublicationRecord, BibtexError> {
    let parts = split_top_level(raw.body);
    let key = parts.first().map(|k| k.trim()).unwrap_or_default();
    if key.is_empty() || key.contains('=') {
        return Err(BibtexError::MissingKey);
    }

    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    for part in &parts[1..] {
        let assignment = part.trim();
        if assignment.is_empty() {
            // Trailing comma
            continue;
        }

        let Some((name, value)) = assignment.split_once('=') else {
            return Err(BibtexError::MalformedField(snippet(assignment)));
        };
        let name = name.trim();
        if name.is_empty() || !name.chars().all(is_field_name_char) {
            return Err(BibtexError::MalformedField(snippet(assignment)));
        }

        let value = collapse_whitespace(strip_delimiters(value.trim()));
        fields.insert(name.to_ascii_lowercase(), value);
    }

    let optional = |name: &str| {
        fields
            .get(name)
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    };

    let authors = fields
        .get("author")
        .map(|a| split_authors(a))
        .unwrap_or_default();
    let year = fields.get("year").and_then(|y| y.trim().parse::<i32>().ok());
    let hidden_bib = HIDDEN_BIB_FIELDS
        .iter()
        .filter_map(|name| fields.get(*name))
        .any(|v| is_truthy(v));

    Ok(PublicationRecord {
        id: key.to_string(),
        kind: PublicationType::from_name(&raw.entry_type),
        title: optional("title"),
        authors,
        journal: optional("journal"),
        conference: optional("conference").or_else(|| optional("booktitle")),
        year,
        description: optional("description"),
        abstract_text: optional("abstract"),
        hidden_bib,
        bibtex: raw.source.to_string(),
        fields,
    })
}

fn is_field_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')
}

/// Remove one layer of `{...}` or `"..."` around a value.
fn strip_delimiters(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() < 2 {
        return value;
    }

    let last = bytes.len() - 1;
    if bytes[0] == b'{' && bytes[last] == b'}' && matching_brace(bytes) == Some(last) {
        return &value[1..last];
    }
    if bytes[0] == b'"' && closing_quote(bytes) == Some(last) {
        return &value[1..last];
    }

    value
}

/// Index of the quote closing the one at position 0. Quotes inside braces
/// do not count.
fn closing_quote(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'"' if depth == 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Index of the brace closing the one at position 0.
fn matching_brace(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split an author list on the bare token `and`.
///
/// `and` inside braces (`{Barnes and Noble}`) does not split.
fn split_authors(value: &str) -> Vec<Author> {
    let mut authors = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut depth = 0i32;

    for token in value.split_whitespace() {
        if token == "and" && depth == 0 {
            push_author(&mut authors, &current);
            current.clear();
            continue;
        }
        for c in token.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth = (depth - 1).max(0),
                _ => {}
            }
        }
        current.push(token);
    }
    push_author(&mut authors, &current);

    authors
}

fn push_author(authors: &mut Vec<Author>, tokens: &[&str]) {
    let name = tokens.join(" ");
    let name = name.trim();
    if !name.is_empty() {
        authors.push(Author {
            name: name.to_string(),
        });
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "1"
    )
}

fn snippet(text: &str) -> String {
    const MAX: usize = 40;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(MAX).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(record: &PublicationRecord) -> Vec<&str> {
        record.authors.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_single_well_formed_entry() {
        let records =
            parse_bibtex("@article{k1, author={A and B}, year={2020}, title={T}}");

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, "k1");
        assert_eq!(record.kind, PublicationType::Article);
        assert_eq!(names(record), vec!["A", "B"]);
        assert_eq!(record.year, Some(2020));
        assert_eq!(record.title.as_deref(), Some("T"));
        assert!(!record.hidden_bib);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_bibtex("").is_empty());
        assert!(parse_bibtex("   \n\n").is_empty());
        assert!(parse_bibtex("% only a comment\nplain text\n").is_empty());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = r#"
@inproceedings{smith2021,
  author = {John Smith and Jane Doe},
  title = {On Things},
  booktitle = {Proceedings of Things},
  year = 2021,
}

@book{doe2019, title = "A Book", year = {2019}}
"#;
        assert_eq!(parse_bibtex(text), parse_bibtex(text));
    }

    #[test]
    fn test_bibtex_field_rescans_to_same_entry() {
        let text = "@misc{note1,\n  title = {A Note},\n  year = {2018}\n}\n@Article{art,title={B}}";
        for record in parse_bibtex(text) {
            let again = parse_bibtex(&record.bibtex);
            assert_eq!(again.len(), 1);
            assert_eq!(again[0].id, record.id);
            assert_eq!(again[0].kind, record.kind);
        }
    }

    #[test]
    fn test_bibtex_is_verbatim() {
        let entry = "@article{k1,\n    Title = { Spaced   Out },\n    year={2020},\n}";
        let text = format!("% header\n\n{}\n\ntrailing text", entry);

        let records = parse_bibtex(&text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].bibtex, entry);
        assert_eq!(records[0].title.as_deref(), Some("Spaced Out"));
    }

    #[test]
    fn test_unterminated_entry_after_good_one() {
        let text = "@article{good, title={Good}, year={2020}}\n\n@article{bad, title={Bad}, year={2021}\n";
        let parsed = parse_bibtex_report(text);

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].id, "good");
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].error, BibtexError::Unterminated);
        assert_eq!(parsed.skipped[0].key.as_deref(), Some("bad"));
        assert_eq!(parsed.skipped[0].line, 3);
    }

    #[test]
    fn test_unterminated_entry_before_good_one() {
        let text = "@article{bad, title={Bad}, year={2021}\n\n@article{good, title={Good}, year={2020}}\n";
        let records = parse_bibtex(text);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "good");
    }

    #[test]
    fn test_unterminated_entry_on_same_line() {
        let text = "@article{bad, title={Bad} @article{good, title={Good}}";
        let records = parse_bibtex(text);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "good");
    }

    #[test]
    fn test_field_names_are_case_insensitive() {
        let text = "@ARTICLE{k, AUTHOR = {X and Y}, Title = {Upper}, YeAr = {1999}, Journal = {J}}";
        let records = parse_bibtex(text);

        assert_eq!(records[0].kind, PublicationType::Article);
        assert_eq!(names(&records[0]), vec!["X", "Y"]);
        assert_eq!(records[0].title.as_deref(), Some("Upper"));
        assert_eq!(records[0].year, Some(1999));
        assert_eq!(records[0].journal.as_deref(), Some("J"));
    }

    #[test]
    fn test_value_delimiters_and_trailing_comma() {
        let text = r#"@book{b1,
  title = "Quoted, with comma",
  publisher = {Braced, with comma},
  year = 2001,
}@misc{m1,title={Adjacent}}"#;
        let records = parse_bibtex(text);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title.as_deref(), Some("Quoted, with comma"));
        assert_eq!(records[0].field("publisher"), Some("Braced, with comma"));
        assert_eq!(records[0].year, Some(2001));
        assert_eq!(records[1].title.as_deref(), Some("Adjacent"));
    }

    #[test]
    fn test_multiline_and_nested_braces() {
        let text = r#"@article{deep,
  title = {The {GPU} Era:
           a {{Retrospective}}},
  abstract = {First line
    second line.}
}"#;
        let records = parse_bibtex(text);

        assert_eq!(
            records[0].title.as_deref(),
            Some("The {GPU} Era: a {{Retrospective}}")
        );
        assert_eq!(
            records[0].abstract_text.as_deref(),
            Some("First line second line.")
        );
    }

    #[test]
    fn test_only_one_layer_of_braces_is_stripped() {
        let text = "@misc{a, title = {{Double}}, note = {one} # {two}}";
        let records = parse_bibtex(text);

        assert_eq!(records[0].title.as_deref(), Some("{Double}"));
        assert_eq!(records[0].field("note"), Some("{one} # {two}"));
    }

    #[test]
    fn test_author_splitting() {
        let text = "@misc{a, author = {  Ada Lovelace and {Barnes and Noble}   and Charles Babbage  }}";
        let records = parse_bibtex(text);

        assert_eq!(
            names(&records[0]),
            vec!["Ada Lovelace", "{Barnes and Noble}", "Charles Babbage"]
        );
    }

    #[test]
    fn test_author_conjunction_is_case_sensitive() {
        let records = parse_bibtex("@misc{a, author = {Tom AND Jerry and Spike}}");
        assert_eq!(names(&records[0]), vec!["Tom AND Jerry", "Spike"]);
    }

    #[test]
    fn test_empty_author_field() {
        let records = parse_bibtex("@misc{a, author = {}, title = {No authors}}");
        assert_eq!(records.len(), 1);
        assert!(records[0].authors.is_empty());

        let records = parse_bibtex("@misc{b, title = {No author field}}");
        assert!(records[0].authors.is_empty());
    }

    #[test]
    fn test_non_numeric_year_is_absent() {
        let records = parse_bibtex("@misc{a, year = {in press}}\n@misc{b, year = { 2019 }}");
        assert_eq!(records[0].year, None);
        assert_eq!(records[1].year, Some(2019));
    }

    #[test]
    fn test_hidden_bib_marker() {
        let text = r#"
@misc{a, hidden_bib = {true}}
@misc{b, HIDE_BIBTEX = "yes"}
@misc{c, hiddenbib = {false}}
@misc{d, title = {plain}}
"#;
        let flags: Vec<bool> = parse_bibtex(text).iter().map(|r| r.hidden_bib).collect();
        assert_eq!(flags, vec![true, true, false, false]);
    }

    #[test]
    fn test_custom_and_unknown_fields() {
        let text = r#"@inproceedings{p,
  booktitle = {Conf 2020},
  description = {Short blurb},
  doi = {10.1000/xyz},
  Custom-Field = {kept}
}"#;
        let record = &parse_bibtex(text)[0];

        assert_eq!(record.kind, PublicationType::InProceedings);
        assert_eq!(record.conference.as_deref(), Some("Conf 2020"));
        assert_eq!(record.description.as_deref(), Some("Short blurb"));
        assert_eq!(record.field("DOI"), Some("10.1000/xyz"));
        assert_eq!(record.field("custom-field"), Some("kept"));
        assert_eq!(record.venue(), Some("Conf 2020"));
    }

    #[test]
    fn test_unknown_entry_type_is_kept() {
        let records = parse_bibtex("@software{tool, title = {Tool}}");
        assert_eq!(records[0].kind, PublicationType::Other("software".into()));
        assert_eq!(records[0].kind.label(), "Software");
    }

    #[test]
    fn test_non_publication_blocks_are_ignored() {
        let text = r#"
@comment{this is {not} an entry}
@string{jair = "Journal of AI Research"}
@preamble{"\newcommand{\noop}[1]{}"}
% contact: someone@example.org
@article{real, title = {Real}}
"#;
        let parsed = parse_bibtex_report(text);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].id, "real");
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn test_duplicate_keys_keep_first() {
        let text = "@misc{dup, title={First}}\n@misc{dup, title={Second}}";
        let parsed = parse_bibtex_report(text);

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].title.as_deref(), Some("First"));
        assert_eq!(
            parsed.skipped[0].error,
            BibtexError::DuplicateKey("dup".into())
        );
        assert_eq!(parsed.skipped[0].line, 2);
    }

    #[test]
    fn test_malformed_entries_are_dropped_whole() {
        let text = r#"
@article{, title = {No key}}
@article{nofield, title {missing equals}}
@article{ok, title = {Fine}}
"#;
        let parsed = parse_bibtex_report(text);

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].id, "ok");
        assert_eq!(parsed.skipped.len(), 2);
        assert_eq!(parsed.skipped[0].error, BibtexError::MissingKey);
        assert!(matches!(
            parsed.skipped[1].error,
            BibtexError::MalformedField(_)
        ));
        assert_eq!(parsed.skipped[1].key.as_deref(), Some("nofield"));
    }

    #[test]
    fn test_escaped_braces_do_not_unbalance() {
        let records = parse_bibtex(r"@misc{esc, title = {Left \{ brace}}");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title.as_deref(), Some(r"Left \{ brace"));
    }

    #[test]
    fn test_line_start_at_sign_inside_quoted_value() {
        let parsed = parse_bibtex_report(
            "@misc{ok,\n  title = {Talk},\n  note = \"Slides at\n@ the workshop site\"\n}\n",
        );
        assert!(parsed.skipped.is_empty());
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(
            parsed.records[0].field("note"),
            Some("Slides at @ the workshop site")
        );

        let parsed = parse_bibtex_report(
            "@article{ok,\n  title = {Survey},\n  abstract = \"We compare\n@misc{x} style markers\"\n}\n",
        );
        let ids: Vec<&str> = parsed.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ok"]);
        assert!(parsed.skipped.is_empty());
        assert_eq!(
            parsed.records[0].abstract_text.as_deref(),
            Some("We compare @misc{x} style markers")
        );
    }

    #[test]
    fn test_line_numbers_across_many_entries() {
        let mut input = String::new();
        for i in 0..200 {
            input.push_str(&format!("@misc{{k{}, title={{T}}}}\n\n", i));
        }
        input.push_str("@misc{k7, title={Again}}\n");
        input.push_str("@misc{open, title={Never closed}\n");

        let parsed = parse_bibtex_report(&input);
        assert_eq!(parsed.records.len(), 200);
        assert_eq!(parsed.skipped.len(), 2);
        assert_eq!(parsed.skipped[0].line, 401);
        assert_eq!(parsed.skipped[0].error, BibtexError::DuplicateKey("k7".into()));
        assert_eq!(parsed.skipped[1].line, 402);
        assert_eq!(parsed.skipped[1].error, BibtexError::Unterminated);
    }

    #[test]
    fn test_published_copy_drops_hidden_bibtex() {
        let records = parse_bibtex(
            "@misc{shown, title={A}}\n@misc{hidden, title={B}, hidden_bib={yes}}",
        );
        assert_eq!(records[0].published().bibtex, records[0].bibtex);
        let hidden = records[1].published();
        assert!(hidden.bibtex.is_empty());
        assert_eq!(hidden.title.as_deref(), Some("B"));
        assert!(!records[1].bibtex.is_empty());
    }

    #[test]
    fn test_concatenated_quotes_are_not_stripped() {
        let records = parse_bibtex(r#"@misc{c, title = "a" # "b", note = "x {"} y"}"#);
        assert_eq!(records[0].title.as_deref(), Some(r#""a" # "b""#));
        assert_eq!(records[0].field("note"), Some(r#"x {"} y"#));
    }

    #[test]
    fn test_publication_type_serializes_as_string() {
        let record = &parse_bibtex("@phdthesis{t, title={Thesis}}")[0];
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["type"], "phdthesis");
        assert_eq!(json["abstract"], serde_json::Value::Null);
    }
}
