//! Companies offered by the research form

/// First entry of the company picker; selects nothing
pub const PLACEHOLDER: &str = "Select a company";

/// Display name and ticker of every company that can be researched
pub const COMPANIES: &[(&str, &str)] = &[
    ("Apple Inc.", "AAPL"),
    ("Microsoft Corp.", "MSFT"),
    ("Google LLC", "GOOGL"),
    ("Amazon.com Inc.", "AMZN"),
    ("Tesla Inc.", "TSLA"),
    ("Meta Platforms Inc.", "META"),
    ("NVIDIA Corporation", "NVDA"),
    ("Berkshire Hathaway Inc.", "BRK.B"),
    ("Johnson & Johnson", "JNJ"),
    ("Visa Inc.", "V"),
    ("Procter & Gamble Co.", "PG"),
    ("Walmart Inc.", "WMT"),
    ("UnitedHealth Group Incorporated", "UNH"),
    ("Mastercard Incorporated", "MA"),
    ("The Home Depot, Inc.", "HD"),
    ("Pfizer Inc.", "PFE"),
    ("Cisco Systems, Inc.", "CSCO"),
    ("IBM Corporation", "IBM"),
    ("Intel Corporation", "INTC"),
    ("Adobe Inc.", "ADBE"),
    ("Oracle Corporation", "ORCL"),
    ("Salesforce.com Inc.", "CRM"),
    ("PayPal Holdings Inc.", "PYPL"),
    ("Bank of America Corp", "BAC"),
    ("Walt Disney Company", "DIS"),
    ("Netflix Inc.", "NFLX"),
    ("CVS Health Corporation", "CVS"),
    ("AbbVie Inc.", "ABBV"),
    ("Texas Instruments Incorporated", "TXN"),
    ("Qualcomm Incorporated", "QCOM"),
    ("General Electric Company", "GE"),
    ("Wells Fargo & Co", "WFC"),
    ("Verizon Communications Inc.", "VZ"),
    ("Shopify Inc.", "SHOP"),
    ("Uber Technologies Inc.", "UBER"),
    ("Spotify Technology S.A.", "SPOT"),
    ("Snap Inc.", "SNAP"),
    ("Square Inc.", "SQ"),
    ("Zoom Video Communications Inc.", "ZM"),
    ("Slack Technologies Inc.", "WORK"),
    ("Twitter Inc.", "TWTR"),
];

/// Ticker for a display name: exact match first, then case-insensitive
///
/// The placeholder has no ticker.
///
/// ```
/// use stock_research::companies::ticker_for;
///
/// assert_eq!(ticker_for("Apple Inc."), Some("AAPL"));
/// assert_eq!(ticker_for("apple inc."), Some("AAPL"));
/// assert_eq!(ticker_for("Select a company"), None);
/// ```
pub fn ticker_for(name: &str) -> Option<&'static str> {
    by_name(name).map(|(_, ticker)| *ticker)
}

/// Display name for a ticker, case-insensitive
pub fn name_for(ticker: &str) -> Option<&'static str> {
    by_ticker(ticker).map(|(name, _)| *name)
}

/// Resolve user input that is either a display name or a ticker
///
/// Returns the canonical `(name, ticker)` pair.
pub fn resolve(input: &str) -> Option<(&'static str, &'static str)> {
    by_name(input).or_else(|| by_ticker(input)).copied()
}

fn by_name(name: &str) -> Option<&'static (&'static str, &'static str)> {
    let name = name.trim();
    COMPANIES
        .iter()
        .find(|(n, _)| *n == name)
        .or_else(|| COMPANIES.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)))
}

fn by_ticker(ticker: &str) -> Option<&'static (&'static str, &'static str)> {
    let ticker = ticker.trim();
    COMPANIES.iter().find(|(_, t)| t.eq_ignore_ascii_case(ticker))
}

/// Picker entries: the placeholder followed by every company name
pub fn choices() -> impl Iterator<Item = &'static str> {
    std::iter::once(PLACEHOLDER).chain(COMPANIES.iter().map(|(name, _)| *name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_is_complete() {
        assert_eq!(COMPANIES.len(), 41);
        assert_eq!(COMPANIES[0], ("Apple Inc.", "AAPL"));
        assert_eq!(COMPANIES[40], ("Twitter Inc.", "TWTR"));

        let tickers: HashSet<_> = COMPANIES.iter().map(|(_, t)| *t).collect();
        assert_eq!(tickers.len(), COMPANIES.len());
    }

    #[test]
    fn test_ticker_for() {
        assert_eq!(ticker_for("Berkshire Hathaway Inc."), Some("BRK.B"));
        assert_eq!(ticker_for("  the home depot, inc. "), Some("HD"));
        assert_eq!(ticker_for(PLACEHOLDER), None);
        assert_eq!(ticker_for(""), None);
        assert_eq!(ticker_for("Acme Corp"), None);
    }

    #[test]
    fn test_resolve_name_or_ticker() {
        assert_eq!(resolve("Visa Inc."), Some(("Visa Inc.", "V")));
        assert_eq!(resolve("nvda"), Some(("NVIDIA Corporation", "NVDA")));
        assert_eq!(resolve("brk.b"), Some(("Berkshire Hathaway Inc.", "BRK.B")));
        assert_eq!(resolve(PLACEHOLDER), None);
        assert_eq!(name_for("XYZ"), None);
    }

    #[test]
    fn test_choices_start_with_placeholder() {
        let choices: Vec<_> = choices().collect();
        assert_eq!(choices.len(), 42);
        assert_eq!(choices[0], PLACEHOLDER);
        assert_eq!(choices[1], "Apple Inc.");
    }
}
