use log::debug;
use regex::Regex;
use snafu::ResultExt;

use crate::errors::{CustomResult, PatternSnafu};

/// a row of the timing table reduced to the two fields the pipeline needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    pub kart_id: String,
    pub lap_time: String,
}

impl CandidateRow {
    pub fn new(kart_id: impl Into<String>, lap_time: impl Into<String>) -> CandidateRow {
        CandidateRow {
            kart_id: kart_id.into(),
            lap_time: lap_time.into(),
        }
    }
}

/// turns the raw text of a timing page into candidate rows.
/// rows that can not be tokenized are left out, an empty result is valid.
pub trait RowExtractor: Send + Sync {
    fn extract(&self, page: &str) -> Vec<CandidateRow>;
}

/// extractor for apex style live timing pages.
///
/// the lap table is the table with class `live-lap-table`, else the one with id
/// `lapsTable`, else the first table on the page. every row with at least two
/// cells is joined into one line and searched for a lap time and a kart number.
pub struct ApexTableExtractor {
    table: Regex,
    row: Regex,
    cell: Regex,
    tag: Regex,
    lap_time: Regex,
    kart_number: Regex,
}

impl ApexTableExtractor {
    pub fn new() -> CustomResult<ApexTableExtractor> {
        Ok(ApexTableExtractor {
            table: Regex::new(r"(?is)<table\b([^>]*)>(.*?)</table>").context(PatternSnafu)?,
            row: Regex::new(r"(?is)<tr\b[^>]*>(.*?)(?:</tr>|$)").context(PatternSnafu)?,
            cell: Regex::new(r"(?is)<td\b[^>]*>(.*?)</td>").context(PatternSnafu)?,
            tag: Regex::new(r"(?s)<[^>]*>").context(PatternSnafu)?,
            lap_time: Regex::new(r"(\d{1,2}:\d{2}\.\d{2})|(\d+\.\d{2})").context(PatternSnafu)?,
            kart_number: Regex::new(r"\b\d{1,3}\b").context(PatternSnafu)?,
        })
    }

    /// inner html of the lap table
    fn find_table<'a>(&self, page: &'a str) -> Option<&'a str> {
        let tables: Vec<(&str, &str)> = self
            .table
            .captures_iter(page)
            .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
            .collect();

        let has_class = |attrs: &str| {
            attr_value(attrs, "class")
                .map(|classes| classes.split_whitespace().any(|c| c == "live-lap-table"))
                .unwrap_or(false)
        };
        let has_id = |attrs: &str| attr_value(attrs, "id").map(|id| id == "lapsTable").unwrap_or(false);

        tables
            .iter()
            .find(|&&(attrs, _)| has_class(attrs))
            .or_else(|| tables.iter().find(|&&(attrs, _)| has_id(attrs)))
            .or_else(|| tables.first())
            .map(|&(_, inner)| inner)
    }

    fn cell_text(&self, cell: &str) -> String {
        let text = self.tag.replace_all(cell, " ");
        let text = text
            .replace("&nbsp;", " ")
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">");

        text.split_whitespace().collect::<Vec<&str>>().join(" ")
    }
}

impl RowExtractor for ApexTableExtractor {
    fn extract(&self, page: &str) -> Vec<CandidateRow> {
        let table = match self.find_table(page) {
            Some(table) => table,
            None => {
                debug!(target: "timing_table:extract", "no lap table on the page");
                return Vec::new();
            }
        };

        let mut rows = Vec::new();
        for row in self.row.captures_iter(table) {
            let inner = match row.get(1) {
                Some(inner) => inner.as_str(),
                None => continue,
            };

            let cols: Vec<String> = self
                .cell
                .captures_iter(inner)
                .filter_map(|cell| cell.get(1))
                .map(|cell| self.cell_text(cell.as_str()))
                .collect();
            if cols.len() < 2 {
                continue;
            }

            let text = cols.join(" | ");
            let lap_time = self.lap_time.find(&text).map(|m| m.as_str());
            let number = self.kart_number.find(&text).map(|m| m.as_str());
            match (number, lap_time) {
                (Some(number), Some(lap_time)) => rows.push(CandidateRow::new(number, lap_time)),
                _ => debug!(target: "timing_table:extract", "no kart or lap time in row: {}", text),
            }
        }

        rows
    }
}

/// value of a quoted attribute in the attribute part of an opening tag
fn attr_value<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    let lower = attrs.to_ascii_lowercase();
    let mut from = 0;
    while let Some(pos) = lower[from..].find(name) {
        let start = from + pos;
        from = start + name.len();

        let preceded_ok = start == 0 || lower.as_bytes()[start - 1].is_ascii_whitespace();
        let rest = attrs[from..].trim_start();
        if !preceded_ok || !rest.starts_with('=') {
            continue;
        }

        let value = rest[1..].trim_start();
        let quote = value.chars().next()?;
        if quote == '"' || quote == '\'' {
            let end = value[1..].find(quote)?;
            return Some(&value[1..1 + end]);
        }
        let end = value.find(char::is_whitespace).unwrap_or(value.len());
        return Some(&value[..end]);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{ApexTableExtractor, CandidateRow, RowExtractor};

    #[test]
    fn extracts_rows_from_the_lap_table() {
        let page = r#"
            <html><body>
            <table id="menu"><tr><td>1</td><td>home 10.00</td></tr></table>
            <table class="grid live-lap-table">
              <tr><th>Kart</th><th>Lap</th></tr>
              <tr><td>12</td><td><span>1:02.50</span></td></tr>
              <tr><td>7</td><td>45.30</td></tr>
              <tr><td>only one cell 33.33</td></tr>
              <tr><td>Pit</td><td>--</td></tr>
            </table>
            </body></html>"#;

        let rows = ApexTableExtractor::new().unwrap().extract(page);
        assert_eq!(
            rows,
            vec![CandidateRow::new("12", "1:02.50"), CandidateRow::new("7", "45.30")]
        );
    }

    #[test]
    fn falls_back_to_laps_table_then_first_table() {
        let extractor = ApexTableExtractor::new().unwrap();

        let by_id = r#"<table><tr><td>1</td><td>50.00</td></tr></table>
            <TABLE ID='lapsTable'><TR><TD>2</TD><TD>51.00</TD></TR></TABLE>"#;
        assert_eq!(extractor.extract(by_id), vec![CandidateRow::new("2", "51.00")]);

        let first = r#"<table><tr><td>3</td><td>52.00</td></tr></table>"#;
        assert_eq!(extractor.extract(first), vec![CandidateRow::new("3", "52.00")]);
    }

    #[test]
    fn page_without_table_yields_nothing() {
        let extractor = ApexTableExtractor::new().unwrap();
        assert!(extractor.extract("<html><p>race not started</p></html>").is_empty());
        assert!(extractor.extract("").is_empty());
    }
}
