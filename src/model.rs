//! Status codes from the PEP index and the table of statuses each code accepts.
//!
//! The index page abbreviates a PEP's status to one letter; the PEP page spells it
//! out. [StatusCode::accepted] is the single source of truth for which spelled-out
//! statuses are consistent with which letter.

use reqwest::Url;
use std::fmt;

/// Abbreviated status marker taken from an index row.
///
/// Closed over the eight codes the index uses, plus `Unknown` for anything else,
/// so an unrecognised marker has to be handled explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// `A`
    Active,
    /// `D`
    Deferred,
    /// `F`
    Final,
    /// `P`
    Provisional,
    /// `R`
    Rejected,
    /// `S`
    Superseded,
    /// `W`
    Withdrawn,
    /// Empty marker: the row carries only the type glyph.
    Draft,
    /// Any marker not listed above. Holds the marker as found.
    Unknown(String),
}

/// The eight known codes in table declaration order.
pub const KNOWN_CODES: [StatusCode; 8] = [
    StatusCode::Active,
    StatusCode::Deferred,
    StatusCode::Final,
    StatusCode::Provisional,
    StatusCode::Rejected,
    StatusCode::Superseded,
    StatusCode::Withdrawn,
    StatusCode::Draft,
];

impl StatusCode {
    /// Map a marker string (`"A"`, `"F"`, `""`, ...) to a code.
    pub fn from_marker(marker: &str) -> Self {
        match marker {
            "A" => StatusCode::Active,
            "D" => StatusCode::Deferred,
            "F" => StatusCode::Final,
            "P" => StatusCode::Provisional,
            "R" => StatusCode::Rejected,
            "S" => StatusCode::Superseded,
            "W" => StatusCode::Withdrawn,
            "" => StatusCode::Draft,
            other => StatusCode::Unknown(other.to_string()),
        }
    }

    /// Derive the code from an index row's first cell text.
    ///
    /// The first character is the PEP type glyph and is dropped; a cell of one
    /// character or less yields the empty marker. Surrounding whitespace is ignored.
    pub fn from_cell_text(text: &str) -> Self {
        let text = text.trim();
        let mut chars = text.chars();
        match chars.next() {
            Some(_) => Self::from_marker(chars.as_str()),
            None => Self::from_marker(""),
        }
    }

    /// The marker string as it appears on the index page.
    pub fn marker(&self) -> &str {
        match self {
            StatusCode::Active => "A",
            StatusCode::Deferred => "D",
            StatusCode::Final => "F",
            StatusCode::Provisional => "P",
            StatusCode::Rejected => "R",
            StatusCode::Superseded => "S",
            StatusCode::Withdrawn => "W",
            StatusCode::Draft => "",
            StatusCode::Unknown(m) => m,
        }
    }

    /// Full statuses a PEP page may declare for this code. Empty for `Unknown`.
    pub fn accepted(&self) -> &'static [&'static str] {
        match self {
            StatusCode::Active => &["Active", "Accepted"],
            StatusCode::Deferred => &["Deferred"],
            StatusCode::Final => &["Final"],
            StatusCode::Provisional => &["Provisional"],
            StatusCode::Rejected => &["Rejected"],
            StatusCode::Superseded => &["Superseded"],
            StatusCode::Withdrawn => &["Withdrawn"],
            StatusCode::Draft => &["Draft", "Active"],
            StatusCode::Unknown(_) => &[],
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, StatusCode::Unknown(_))
    }

    pub fn accepts(&self, status: &str) -> bool {
        self.accepted().iter().any(|s| *s == status)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.marker())
    }
}

/// Every distinct accepted status, in the order it first appears in the table.
pub fn known_statuses() -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::new();
    for code in &KNOWN_CODES {
        for &status in code.accepted() {
            if !out.contains(&status) {
                out.push(status);
            }
        }
    }
    out
}

/// One row of the PEP index: its abbreviated status and the resolved PEP page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub code: StatusCode,
    pub url: Url,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_cell_text_drops_type_glyph() {
        assert_eq!(StatusCode::from_cell_text("SF"), StatusCode::Final);
        assert_eq!(StatusCode::from_cell_text("IA"), StatusCode::Active);
        assert_eq!(StatusCode::from_cell_text("PW"), StatusCode::Withdrawn);
    }

    #[test]
    fn from_cell_text_short_cell_is_draft() {
        assert_eq!(StatusCode::from_cell_text("S"), StatusCode::Draft);
        assert_eq!(StatusCode::from_cell_text(""), StatusCode::Draft);
        assert_eq!(StatusCode::from_cell_text("  I \n"), StatusCode::Draft);
    }

    #[test]
    fn from_cell_text_keeps_unexpected_marker() {
        assert_eq!(
            StatusCode::from_cell_text("SX"),
            StatusCode::Unknown("X".to_string())
        );
        assert_eq!(
            StatusCode::from_cell_text("SAF"),
            StatusCode::Unknown("AF".to_string())
        );
    }

    #[test]
    fn from_cell_text_handles_multibyte_glyph() {
        assert_eq!(StatusCode::from_cell_text("★R"), StatusCode::Rejected);
    }

    #[test]
    fn table_has_eight_codes_with_one_or_two_statuses() {
        assert_eq!(KNOWN_CODES.len(), 8);
        for code in &KNOWN_CODES {
            let n = code.accepted().len();
            assert!((1..=2).contains(&n), "{} accepts {} statuses", code, n);
            assert_eq!(&StatusCode::from_marker(code.marker()), code);
        }
    }

    #[test]
    fn active_is_accepted_under_a_and_empty_marker() {
        assert!(StatusCode::Active.accepts("Active"));
        assert!(StatusCode::Active.accepts("Accepted"));
        assert!(StatusCode::Draft.accepts("Active"));
        assert!(StatusCode::Draft.accepts("Draft"));
        assert!(!StatusCode::Active.accepts("Final"));
    }

    #[test]
    fn unknown_code_accepts_nothing() {
        let code = StatusCode::Unknown("Z".to_string());
        assert!(!code.is_known());
        assert!(code.accepted().is_empty());
        assert!(!code.accepts("Active"));
    }

    #[test]
    fn known_statuses_are_distinct_in_declaration_order() {
        assert_eq!(
            known_statuses(),
            vec![
                "Active",
                "Accepted",
                "Deferred",
                "Final",
                "Provisional",
                "Rejected",
                "Superseded",
                "Withdrawn",
                "Draft",
            ]
        );
    }
}
