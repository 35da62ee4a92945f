use super::collapse_whitespace;
use scraper::{ElementRef, Html, Selector};

/// Markers some sites leave behind when a value is truncated for display
const ELLIPSIS_MARKERS: &[&str] = &["[...]", "[…]"];

/// Rebuilds specification markup as a canonical two-column table
///
/// Every table row becomes `(parameter, value)`: the first cell is the
/// parameter and remaining cells are joined into the value. Cell text is
/// whitespace-collapsed and stripped of truncation markers. `footer` rows
/// are appended after the extracted rows.
///
/// Markup without table rows is returned as collapsed plain text with no
/// footer, and empty input stays empty.
///
/// # Examples
///
/// ```
/// use catalog_harvest::parser::normalize_spec;
///
/// let html = "<table><tr><th>Voltage</th><td> 24  V </td></tr></table>";
/// assert_eq!(
///     normalize_spec(html, &[]),
///     "<table><tr><td>Voltage</td><td>24 V</td></tr></table>"
/// );
/// ```
pub fn normalize_spec(markup: &str, footer: &[(String, String)]) -> String {
    if markup.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(markup);
    let rows = spec_rows(&fragment);

    if rows.is_empty() {
        let text: String = fragment.root_element().text().collect();
        return clean_cell(&text);
    }

    let mut out = String::from("<table>");
    for (param, value) in rows.iter().chain(footer.iter()) {
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            html_escape::encode_text(param),
            html_escape::encode_text(value)
        ));
    }
    out.push_str("</table>");
    out
}

fn spec_rows(fragment: &Html) -> Vec<(String, String)> {
    let (Ok(row_selector), Ok(cell_selector)) = (Selector::parse("tr"), Selector::parse("th, td"))
    else {
        return Vec::new();
    };

    fragment
        .select(&row_selector)
        .filter_map(|row| {
            let cells: Vec<String> = row
                .select(&cell_selector)
                .map(|cell| cell_text(&cell))
                .collect();

            let (param, rest) = cells.split_first()?;
            let value = rest
                .iter()
                .filter(|v| !v.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join(" ");

            if param.is_empty() && value.is_empty() {
                None
            } else {
                Some((param.clone(), value))
            }
        })
        .collect()
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    clean_cell(&cell.text().collect::<String>())
}

fn clean_cell(text: &str) -> String {
    let mut cleaned = text.to_string();
    for marker in ELLIPSIS_MARKERS {
        cleaned = cleaned.replace(marker, " ");
    }
    collapse_whitespace(&cleaned)
}
