/// Filing section labels and store constants shared across the codebase.

// Section headings as they appear in annual disclosure filings. Filings are
// inconsistent about heading levels and wrappers, so these are matched by
// substring rather than exact text.
pub const INCOME_SECTION: &str = "Part 2. Earned and Non-Investment Income";
pub const ASSETS_SECTION: &str = "Part 3. Assets";
pub const TRANSACTIONS_SECTION: &str = "Part 4b. Transactions";
pub const GIFTS_SECTION: &str = "Part 5. Gifts";
pub const LIABILITIES_SECTION: &str = "Part 7. Liabilities";
pub const POSITIONS_SECTION: &str = "Part 8. Positions";
pub const AGREEMENTS_SECTION: &str = "Part 9. Agreements";

// Short section keys used in FilingRecord and logs.
pub const SECTION_INCOME: &str = "income";
pub const SECTION_ASSETS: &str = "assets";
pub const SECTION_TRANSACTIONS: &str = "transactions";
pub const SECTION_GIFTS: &str = "gifts";
pub const SECTION_LIABILITIES: &str = "liabilities";
pub const SECTION_POSITIONS: &str = "positions";
pub const SECTION_AGREEMENTS: &str = "agreements";

/// (section key, heading label) pairs in filing order.
pub fn known_sections() -> Vec<(&'static str, &'static str)> {
    vec![
        (SECTION_INCOME, INCOME_SECTION),
        (SECTION_ASSETS, ASSETS_SECTION),
        (SECTION_TRANSACTIONS, TRANSACTIONS_SECTION),
        (SECTION_GIFTS, GIFTS_SECTION),
        (SECTION_LIABILITIES, LIABILITIES_SECTION),
        (SECTION_POSITIONS, POSITIONS_SECTION),
        (SECTION_AGREEMENTS, AGREEMENTS_SECTION),
    ]
}

/// Store table holding canonical transactions.
pub const TRANSACTIONS_TABLE: &str = "senator_transactions";
