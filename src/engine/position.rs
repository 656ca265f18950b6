use crate::errors::OpError;

/// Symbolic insert position, resolved against the sheet's current extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    End,
    Beginning,
    AfterRow(u32),
}

impl InsertPosition {
    pub fn parse(position: &str) -> Result<Self, OpError> {
        let invalid = || OpError::InvalidPosition {
            position: position.to_string(),
        };
        match position.trim().to_ascii_lowercase().as_str() {
            "end" => Ok(Self::End),
            "beginning" => Ok(Self::Beginning),
            other => {
                let suffix = other.strip_prefix("after_row_").ok_or_else(invalid)?;
                let row: u32 = suffix.parse().map_err(|_| invalid())?;
                if row == 0 {
                    return Err(invalid());
                }
                Ok(Self::AfterRow(row))
            }
        }
    }

    /// Concrete 1-indexed row where the first new row lands. Row 1 is the
    /// header, so `beginning` resolves to row 2.
    pub fn resolve(self, max_row: u32) -> u32 {
        match self {
            Self::End => max_row + 1,
            Self::Beginning => 2,
            Self::AfterRow(n) => n + 1,
        }
    }

    /// Non-end positions require a gap to be opened before any write, so
    /// rows below the target keep their content.
    pub fn needs_gap(self, max_row: u32) -> bool {
        self.resolve(max_row) <= max_row
    }
}
