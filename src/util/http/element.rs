use scraper::{ElementRef, Html, Selector};

/// Collects the text of every `td` cell of a table row, trimmed.
///
/// # Arguments
///
/// * `row` - A reference to a `tr` element.
///
/// # Returns
///
/// * `Vec<String>` - The cell texts in document order; empty if the row has no `td`.
pub fn row_cells(row: &ElementRef) -> Vec<String> {
    match Selector::parse("td") {
        Ok(td) => row
            .select(&td)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Walks the rows of a table body and returns the second cell of every row whose
/// first cell reads `label`.
///
/// A missing label, an empty row or a matching row without a second cell is not an
/// error, the result is simply empty for that row.
///
/// # Example
///
/// ```
/// let html = r#"<table><tbody><tr><td>Previous Close</td><td>150.00</td></tr></tbody></table>"#;
/// let document = Html::parse_document(html);
/// let tbody = document.select(&Selector::parse("tbody").unwrap()).next().unwrap();
///
/// assert_eq!(labeled_row_values(&tbody, "Previous Close"), vec!["150.00"]);
/// ```
pub fn labeled_row_values(table_body: &ElementRef, label: &str) -> Vec<String> {
    let tr = match Selector::parse("tr") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    table_body
        .select(&tr)
        .filter_map(|row| {
            let mut cells = row_cells(&row).into_iter();
            match cells.next() {
                Some(first) if first == label => cells.next(),
                _ => None,
            }
        })
        .collect()
}

/// Same as [`labeled_row_values`] across every `tbody` of a document.
#[allow(dead_code)]
pub fn find_labeled_values(document: &Html, label: &str) -> Vec<String> {
    match Selector::parse("tbody") {
        Ok(tbody) => document
            .select(&tbody)
            .flat_map(|body| labeled_row_values(&body, label))
            .collect(),
        Err(_) => Vec::new(),
    }
}
