//! Orchestrates table extraction across the known filing sections.

use crate::constants::{self, TRANSACTIONS_SECTION};
use crate::extract;
use crate::types::{FilingRecord, RawRecord};
use scraper::Html;
use tracing::{debug, info};

/// Extracts one section: locate the table, convert its rows. An absent
/// section yields an empty list, never an error; filings routinely omit
/// optional sections.
fn parse_section(document: &Html, section: &'static str, label: &str) -> Vec<RawRecord> {
    // The telltale-header fallback is only safe for transactions; other
    // sections share too many header names to scan blind.
    let header_scan = section == constants::SECTION_TRANSACTIONS;

    match extract::locate(document, section, label, header_scan) {
        Some(found) => {
            let records = extract::extract(found.table);
            debug!("Extracted {} records from section '{}'", records.len(), section);
            records
        }
        None => {
            debug!("No table found for section '{}'", section);
            Vec::new()
        }
    }
}

/// Parses a full annual filing: every known section, each located and
/// extracted independently against the shared document.
pub fn parse(html: &str) -> FilingRecord {
    let document = Html::parse_document(html);
    let mut filing = FilingRecord::default();

    for (section, label) in constants::known_sections() {
        let records = parse_section(&document, section, label);
        match section {
            constants::SECTION_INCOME => filing.income = records,
            constants::SECTION_ASSETS => filing.assets = records,
            constants::SECTION_TRANSACTIONS => filing.transactions = records,
            constants::SECTION_GIFTS => filing.gifts = records,
            constants::SECTION_LIABILITIES => filing.liabilities = records,
            constants::SECTION_POSITIONS => filing.positions = records,
            constants::SECTION_AGREEMENTS => filing.agreements = records,
            _ => unreachable!("unknown section key"),
        }
    }

    info!(
        "Parsed filing: {} transactions, {} assets, {} income entries",
        filing.transactions.len(),
        filing.assets.len(),
        filing.income.len()
    );
    filing
}

/// Reduced pipeline used by ingestion: transactions section only.
pub fn parse_transactions(html: &str) -> Vec<RawRecord> {
    let document = Html::parse_document(html);
    parse_section(&document, constants::SECTION_TRANSACTIONS, TRANSACTIONS_SECTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILING: &str = r#"
    <html><body>
    <h3>Part 3. Assets</h3>
    <table>
        <tr class="header"><th>Asset</th><th>Value</th></tr>
        <tr><td>Rental Property</td><td>$500,001 - $1,000,000</td></tr>
    </table>
    <h3>Part 4b. Transactions</h3>
    <table>
        <tr class="header">
            <th>Transaction Date</th><th>Ticker</th><th>Asset Name</th>
            <th>Type</th><th>Amount</th>
        </tr>
        <tr>
            <td>01/15/2023</td><td>ABC</td><td>Example Corp</td>
            <td>Purchase</td><td>$1,001 - $15,000</td>
        </tr>
    </table>
    </body></html>
    "#;

    #[test]
    fn test_parse_fills_present_sections_only() {
        let filing = parse(FILING);
        assert_eq!(filing.assets.len(), 1);
        assert_eq!(filing.transactions.len(), 1);
        assert!(filing.income.is_empty());
        assert!(filing.gifts.is_empty());
        assert!(filing.liabilities.is_empty());
        assert!(filing.positions.is_empty());
        assert!(filing.agreements.is_empty());
        assert_eq!(filing.assets[0]["asset"], "Rental Property");
    }

    #[test]
    fn test_parse_transactions_reduced_pipeline() {
        let records = parse_transactions(FILING);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["transaction_date"], "01/15/2023");
        assert_eq!(records[0]["type"], "Purchase");
    }

    #[test]
    fn test_parse_empty_document() {
        let filing = parse("<html><body></body></html>");
        assert!(filing.transactions.is_empty());
    }
}
