use crate::model::{CellValue, RowData, ValidationReport, ValidationRules, ValueType};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});

/// Apply per-column rules to each candidate row. Rows with any error are
/// dropped whole; error messages carry the 1-based index into the input
/// batch, not a sheet row.
pub fn validate_rows(rows: &[RowData], rules: &ValidationRules) -> (Vec<RowData>, ValidationReport) {
    let mut committed = Vec::with_capacity(rows.len());
    let mut report = ValidationReport::default();

    for (idx, row) in rows.iter().enumerate() {
        let row_number = idx + 1;
        let mut errors = Vec::new();

        for (column, rule) in rules {
            // Rules only fire for columns present in the incoming mapping.
            let Some(value) = row.get(column) else {
                continue;
            };
            check_column(row_number, column, value, rule, &mut errors);
        }

        if errors.is_empty() {
            report.passed += 1;
            committed.push(row.clone());
        } else {
            report.failed += 1;
            report.errors.extend(errors);
        }
    }

    (committed, report)
}

fn check_column(
    row_number: usize,
    column: &str,
    value: &CellValue,
    rule: &crate::model::ColumnRule,
    errors: &mut Vec<String>,
) {
    if value.is_blank() {
        if rule.required {
            errors.push(format!("row {row_number}: column '{column}' is required"));
        }
        // Blank optional values skip the remaining checks.
        return;
    }

    match rule.value_type {
        // A parse failure still falls through to the pattern check below.
        ValueType::Number => match value.as_number() {
            None => {
                errors.push(format!(
                    "row {row_number}: column '{column}' is not a valid number: {value}"
                ));
            }
            Some(number) => {
                if let Some(min) = rule.min_value
                    && number < min
                {
                    errors.push(format!(
                        "row {row_number}: column '{column}' is below the minimum {min}"
                    ));
                }
                if let Some(max) = rule.max_value
                    && number > max
                {
                    errors.push(format!(
                        "row {row_number}: column '{column}' is above the maximum {max}"
                    ));
                }
            }
        },
        ValueType::Email => {
            if !EMAIL_RE.is_match(&value.display_string()) {
                errors.push(format!(
                    "row {row_number}: column '{column}' is not a valid email address: {value}"
                ));
            }
        }
        ValueType::String => {
            let text = value.display_string();
            if let Some(min) = rule.min_length
                && text.chars().count() < min
            {
                errors.push(format!(
                    "row {row_number}: column '{column}' is shorter than {min} characters"
                ));
            }
            if let Some(max) = rule.max_length
                && text.chars().count() > max
            {
                errors.push(format!(
                    "row {row_number}: column '{column}' is longer than {max} characters"
                ));
            }
        }
    }

    if let Some(pattern) = rule.pattern.as_deref() {
        // Anchored at the start: the pattern must match from the first
        // character, though it need not consume the whole value.
        match Regex::new(&format!("^(?:{pattern})")) {
            Ok(re) => {
                if !re.is_match(&value.display_string()) {
                    errors.push(format!(
                        "row {row_number}: column '{column}' does not match pattern '{pattern}'"
                    ));
                }
            }
            Err(e) => {
                // A broken user-supplied regex fails the field, not the call.
                errors.push(format!(
                    "row {row_number}: column '{column}' has an invalid pattern '{pattern}': {e}"
                ));
            }
        }
    }
}
