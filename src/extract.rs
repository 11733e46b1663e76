//! Heuristic table discovery and row extraction for disclosure filings.
//!
//! Filings have no stable schema: section headings vary in level, tables are
//! sometimes wrapped, sometimes not, and column headers are named
//! inconsistently. Location is therefore a fixed-order chain of independent
//! strategies, each a pure lookup over the parsed tree, tried until one hits.

use crate::normalize::clean_text;
use crate::types::RawRecord;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Header substrings that mark a table as transaction-shaped. Used only by the
/// last-resort scan, which is safe only for the transactions section.
const TELLTALE_HEADERS: [&str; 3] = ["incurred", "type", "amount"];

/// A located table bound to a named filing section.
pub struct SectionTable<'a> {
    pub section: &'static str,
    pub table: ElementRef<'a>,
}

/// Finds the table for a section heading, trying each strategy in order:
///
/// 1. next table in document order after the heading
/// 2. first table under the heading's structural parent
/// 3. table inside the nearest following `div.table-responsive` wrapper
/// 4. (transactions only) first table anywhere with a telltale header cell
///
/// No heading, or no table by any strategy, means the filing omits the
/// section; callers treat that as an empty section, not an error.
pub fn locate<'a>(
    document: &'a Html,
    section: &'static str,
    label: &str,
    header_scan: bool,
) -> Option<SectionTable<'a>> {
    let heading = find_heading(document, label)?;

    let table = next_table_after(document, heading)
        .or_else(|| table_under_parent(heading))
        .or_else(|| table_in_following_wrapper(document, heading))
        .or_else(|| {
            if header_scan {
                table_by_telltale_headers(document)
            } else {
                None
            }
        });

    match table {
        Some(table) => Some(SectionTable { section, table }),
        None => {
            debug!("Heading found for section '{}' but no table", section);
            None
        }
    }
}

/// Converts a located table into raw records keyed by discovered headers.
///
/// Headers come only from a row explicitly tagged `<tr class="header">`; with
/// no tagged header row there are no keys and every row drops out. The first
/// row is always skipped as presentation, data rows need at least two cells,
/// and a cell is admitted only under a non-empty header with a cleaned value
/// that is non-empty and not the literal "n/a".
pub fn extract(table: ElementRef<'_>) -> Vec<RawRecord> {
    let tr_selector = Selector::parse("tr").unwrap();
    let th_selector = Selector::parse("th").unwrap();
    let td_selector = Selector::parse("td").unwrap();

    let headers: Vec<String> = table
        .select(&Selector::parse("tr.header").unwrap())
        .next()
        .map(|header_row| {
            header_row
                .select(&th_selector)
                .map(|th| clean_text(&th.text().collect::<String>()))
                .collect()
        })
        .unwrap_or_default();

    let mut records = Vec::new();
    for row in table.select(&tr_selector).skip(1) {
        let cells: Vec<ElementRef> = row.select(&td_selector).collect();
        if cells.len() < 2 {
            continue;
        }

        let mut record = RawRecord::new();
        for (i, cell) in cells.iter().enumerate() {
            let Some(header) = headers.get(i) else {
                break;
            };
            if header.is_empty() {
                continue;
            }
            let value = clean_text(&cell.text().collect::<String>());
            if !value.is_empty() && value != "n/a" {
                record.insert(header_key(header), value);
            }
        }

        if !record.is_empty() {
            records.push(record);
        }
    }

    records
}

/// Normalizes header text into a record key: lowercased, spaces to
/// underscores, `#` to "number", `/` to underscore.
fn header_key(header: &str) -> String {
    header
        .to_lowercase()
        .replace(' ', "_")
        .replace('#', "number")
        .replace('/', "_")
}

/// First heading (h1-h4) whose text contains the section label.
fn find_heading<'a>(document: &'a Html, label: &str) -> Option<ElementRef<'a>> {
    let heading_selector = Selector::parse("h1, h2, h3, h4").unwrap();
    document
        .select(&heading_selector)
        .find(|h| h.text().collect::<String>().contains(label))
}

/// First `<table>` strictly after `from` in document order.
fn next_table_after<'a>(document: &'a Html, from: ElementRef<'a>) -> Option<ElementRef<'a>> {
    elements_after(document, from).find(|el| el.value().name() == "table")
}

/// First table descendant of the heading's parent element.
fn table_under_parent(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let parent = heading.parent().and_then(ElementRef::wrap)?;
    let table_selector = Selector::parse("table").unwrap();
    parent.select(&table_selector).next()
}

/// Table inside the nearest `div.table-responsive` after the heading.
fn table_in_following_wrapper<'a>(
    document: &'a Html,
    heading: ElementRef<'a>,
) -> Option<ElementRef<'a>> {
    let wrapper = elements_after(document, heading).find(|el| {
        el.value().name() == "div"
            && el
                .value()
                .classes()
                .any(|class| class == "table-responsive")
    })?;
    let table_selector = Selector::parse("table").unwrap();
    wrapper.select(&table_selector).next()
}

/// First table in the document whose header row mentions a telltale substring.
fn table_by_telltale_headers(document: &Html) -> Option<ElementRef<'_>> {
    let table_selector = Selector::parse("table").unwrap();
    let th_selector = Selector::parse("th").unwrap();

    document.select(&table_selector).find(|table| {
        table.select(&th_selector).any(|th| {
            let text = th.text().collect::<String>().trim().to_lowercase();
            TELLTALE_HEADERS.iter().any(|t| text.contains(t))
        })
    })
}

/// All elements strictly after `from` in document order.
fn elements_after<'a>(
    document: &'a Html,
    from: ElementRef<'a>,
) -> impl Iterator<Item = ElementRef<'a>> {
    let from_id = from.id();
    let mut seen = false;
    document
        .root_element()
        .descendants()
        .filter_map(move |node| {
            if node.id() == from_id {
                seen = true;
                return None;
            }
            if !seen {
                return None;
            }
            ElementRef::wrap(node)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSACTIONS_LABEL: &str = "Part 4b. Transactions";

    fn transactions_table() -> &'static str {
        r#"
        <html><body>
        <h3>Part 4b. Transactions</h3>
        <table>
            <tr class="header">
                <th>#</th><th>Transaction Date</th><th>Ticker</th>
                <th>Asset Name</th><th>Transaction Type</th><th>Amount</th>
            </tr>
            <tr>
                <td>1</td><td>01/15/2023</td><td>ABC</td>
                <td>Example  Corp</td><td>Purchase</td><td>$1,001 - $15,000</td>
            </tr>
            <tr>
                <td>2</td><td>02/20/2023</td><td>n/a</td>
                <td>Other Corp</td><td>Sale (Full)</td><td>$15,001 - $50,000</td>
            </tr>
        </table>
        </body></html>
        "#
    }

    fn locate_table(html: &Html, header_scan: bool) -> Option<SectionTable<'_>> {
        locate(html, "transactions", TRANSACTIONS_LABEL, header_scan)
    }

    #[test]
    fn test_locate_next_table_after_heading() {
        let html = Html::parse_document(transactions_table());
        assert!(locate_table(&html, false).is_some());
    }

    #[test]
    fn test_locate_table_under_heading_parent() {
        let html = Html::parse_document(
            r#"
            <div>
                <table><tr class="header"><th>Amount</th><th>Type</th></tr></table>
                <h4>Part 4b. Transactions</h4>
            </div>
            "#,
        );
        // The table precedes the heading, so forward scan misses and the
        // parent lookup picks it up.
        assert!(locate_table(&html, false).is_some());
    }

    #[test]
    fn test_locate_table_in_responsive_wrapper() {
        let html = Html::parse_document(
            r#"
            <h3>Part 4b. Transactions</h3>
            <p>intervening text</p>
            <div class="table-responsive">
                <table><tr class="header"><th>Amount</th></tr></table>
            </div>
            "#,
        );
        assert!(locate_table(&html, false).is_some());
    }

    #[test]
    fn test_locate_heading_without_any_table() {
        let html = Html::parse_document("<h4>Part 4b. Transactions</h4>");
        assert!(locate_table(&html, true).is_none());
    }

    #[test]
    fn test_locate_by_telltale_headers_gated() {
        // Table is before the heading and outside its parent, so every
        // heading-relative strategy misses; only the telltale header scan,
        // which is enabled for transactions alone, can find it.
        let html = Html::parse_document(
            r#"
            <div><table><tr><th>Date Incurred</th><th>Amount</th></tr></table></div>
            <div><h4>Part 4b. Transactions</h4></div>
            "#,
        );
        assert!(locate_table(&html, false).is_none());
        assert!(locate_table(&html, true).is_some());
    }

    #[test]
    fn test_locate_missing_section() {
        let html = Html::parse_document("<html><body><p>nothing here</p></body></html>");
        assert!(locate_table(&html, true).is_none());
    }

    #[test]
    fn test_extract_discovers_headers_and_skips_na() {
        let html = Html::parse_document(transactions_table());
        let section = locate_table(&html, false).unwrap();
        let records = extract(section.table);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["transaction_date"], "01/15/2023");
        assert_eq!(records[0]["ticker"], "ABC");
        assert_eq!(records[0]["asset_name"], "Example Corp");
        assert_eq!(records[0]["transaction_type"], "Purchase");
        assert_eq!(records[0]["amount"], "$1,001 - $15,000");
        // "#" header becomes "number"
        assert_eq!(records[0]["number"], "1");
        // "n/a" cells are never admitted
        assert!(!records[1].contains_key("ticker"));
    }

    #[test]
    fn test_extract_keys_are_subset_of_headers() {
        let html = Html::parse_document(transactions_table());
        let section = locate_table(&html, false).unwrap();
        let allowed = [
            "number",
            "transaction_date",
            "ticker",
            "asset_name",
            "transaction_type",
            "amount",
        ];
        for record in extract(section.table) {
            for key in record.keys() {
                assert!(allowed.contains(&key.as_str()), "unexpected key {key}");
            }
        }
    }

    #[test]
    fn test_extract_without_tagged_header_row_yields_nothing() {
        let html = Html::parse_document(
            r#"
            <h3>Part 4b. Transactions</h3>
            <table>
                <tr><th>Date</th><th>Amount</th></tr>
                <tr><td>01/15/2023</td><td>$100</td></tr>
            </table>
            "#,
        );
        let section = locate_table(&html, false).unwrap();
        assert!(extract(section.table).is_empty());
    }

    #[test]
    fn test_extract_drops_short_and_empty_rows() {
        let html = Html::parse_document(
            r#"
            <h3>Part 4b. Transactions</h3>
            <table>
                <tr class="header"><th>Date</th><th>Amount</th></tr>
                <tr><td>lonely cell</td></tr>
                <tr><td>n/a</td><td>  </td></tr>
                <tr><td>01/15/2023</td><td>$100</td></tr>
            </table>
            "#,
        );
        let section = locate_table(&html, false).unwrap();
        let records = extract(section.table);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["date"], "01/15/2023");
    }
}
