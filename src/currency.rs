//! Static currency directory
//!
//! The fixed list of currencies the converter offers, as human-readable name
//! and ISO code pairs. The list is sorted by name, which is also the order it
//! is presented in.

/// A selectable currency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    /// Human-readable name
    pub name: &'static str,
    /// Three-letter ISO 4217 code
    pub code: &'static str,
}

/// Every currency the converter offers, sorted by name
pub static CURRENCIES: [Currency; 33] = [
    Currency { name: "Australian Dollar", code: "AUD" },
    Currency { name: "Brazilian Real", code: "BRL" },
    Currency { name: "British Pound", code: "GBP" },
    Currency { name: "Bulgarian Lev", code: "BGN" },
    Currency { name: "Canadian Dollar", code: "CAD" },
    Currency { name: "Chinese Yuan", code: "CNY" },
    Currency { name: "Croatian Kuna", code: "HRK" },
    Currency { name: "Czech Koruna", code: "CZK" },
    Currency { name: "Danish Krone", code: "DKK" },
    Currency { name: "Euro", code: "EUR" },
    Currency { name: "Hong Kong Dollar", code: "HKD" },
    Currency { name: "Hungarian Forint", code: "HUF" },
    Currency { name: "Icelandic Krona", code: "ISK" },
    Currency { name: "Indian Rupee", code: "INR" },
    Currency { name: "Indonesian Rupiah", code: "IDR" },
    Currency { name: "Israeli New Shekel", code: "ILS" },
    Currency { name: "Japanese Yen", code: "JPY" },
    Currency { name: "Malaysian Ringgit", code: "MYR" },
    Currency { name: "Mexican Peso", code: "MXN" },
    Currency { name: "New Zealand Dollar", code: "NZD" },
    Currency { name: "Norwegian Kroner", code: "NOK" },
    Currency { name: "Philippine Peso", code: "PHP" },
    Currency { name: "Polish Zloty", code: "PLN" },
    Currency { name: "Romanian New Lei", code: "RON" },
    Currency { name: "Russian Rouble", code: "RUB" },
    Currency { name: "Singapore Dollar", code: "SGD" },
    Currency { name: "South African Rand", code: "ZAR" },
    Currency { name: "South Korean Won", code: "KRW" },
    Currency { name: "Swedish Krona", code: "SEK" },
    Currency { name: "Swiss Franc", code: "CHF" },
    Currency { name: "Thai Baht", code: "THB" },
    Currency { name: "Turkish New Lira", code: "TRY" },
    Currency { name: "United States Dollar", code: "USD" },
];

/// Read-only view over a currency table
///
/// Built once at startup and handed by reference to whatever needs to
/// translate between names and codes.
#[derive(Debug, Clone, Copy)]
pub struct CurrencyDirectory {
    entries: &'static [Currency],
}

impl Default for CurrencyDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl CurrencyDirectory {
    /// Directory over the built-in table
    pub fn new() -> Self {
        Self {
            entries: &CURRENCIES,
        }
    }

    /// All entries, sorted by name
    pub fn all(&self) -> &'static [Currency] {
        self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact code lookup
    pub fn by_code(&self, code: &str) -> Option<&'static Currency> {
        self.entries.iter().find(|c| c.code == code)
    }

    /// Lenient lookup for user input: a name or a code, ignoring case and
    /// surrounding whitespace
    pub fn find(&self, query: &str) -> Option<&'static Currency> {
        let query = query.trim();
        self.entries
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(query) || c.code.eq_ignore_ascii_case(query))
    }
}
