//! A1-notation helpers.

/// Column letters for a 1-based column index (1 → `A`, 27 → `AA`).
pub fn column_letters(col: usize) -> String {
    debug_assert!(col >= 1, "columns are 1-based");
    let mut n = col;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Quote a tab name for use in a range. Embedded quotes are doubled.
pub fn quote_tab(tab: &str) -> String {
    format!("'{}'", tab.replace('\'', "''"))
}

/// Range covering a whole tab.
pub fn tab_range(tab: &str) -> String {
    quote_tab(tab)
}

/// Range of a single 1-based cell.
pub fn cell_range(tab: &str, row: usize, col: usize) -> String {
    format!("{}!{}{}", quote_tab(tab), column_letters(col), row)
}
