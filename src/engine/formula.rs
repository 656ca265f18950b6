use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static CELL_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z]+)(\d+)").expect("cell ref pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub text: String,
    pub adjusted: bool,
}

/// Best-effort textual shift of cell references in a formula being written at
/// `target_row`. References to rows at or below the pre-insertion extent are
/// stable and stay untouched; rows beyond it are treated as relative to the
/// insertion batch and shift by `target_row - pre_insertion_max_row - 1`.
///
/// Column letters and token order are preserved. Tokens whose shift would
/// land before row 1, or whose row fails to parse, pass through unchanged.
pub fn shift_row_references(
    formula: &str,
    target_row: u32,
    pre_insertion_max_row: u32,
) -> RewriteOutcome {
    let delta = target_row as i64 - pre_insertion_max_row as i64 - 1;
    let mut adjusted = false;

    let text = CELL_REF_RE
        .replace_all(formula, |caps: &Captures<'_>| {
            let letters = &caps[1];
            let original = &caps[0];
            let Ok(row) = caps[2].parse::<i64>() else {
                return original.to_string();
            };
            if row <= pre_insertion_max_row as i64 {
                return original.to_string();
            }
            let shifted = row + delta;
            if shifted < 1 {
                tracing::warn!(
                    reference = original,
                    target_row,
                    "reference shift would land before row 1, leaving unchanged"
                );
                return original.to_string();
            }
            if shifted != row {
                adjusted = true;
            }
            format!("{letters}{shifted}")
        })
        .into_owned();

    RewriteOutcome { text, adjusted }
}
