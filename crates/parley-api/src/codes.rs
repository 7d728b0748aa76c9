//! Client-side table logic for the admin code browser: valid-only
//! filtering, column sorting, and display status classification.

use chrono::{DateTime, Utc};

use crate::types::InvitationCode;

/// A sortable column of the admin codes table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    Code,
    CreatedAt,
    ExpiresAt,
    MaxCalls,
    CallCount,
    IsValid,
}

/// Current sort order of the codes table. Not persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub ascending: bool,
}

impl Default for SortState {
    /// Newest codes first, matching the server's own listing order.
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            ascending: false,
        }
    }
}

impl SortState {
    /// Clicking the active column flips direction; clicking another column
    /// switches to it, ascending.
    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.ascending = !self.ascending;
        } else {
            self.field = field;
            self.ascending = true;
        }
    }
}

/// Retain only currently usable codes when the valid-only toggle is on.
/// Pure; re-applied on every render.
pub fn filter_valid(codes: &[InvitationCode], valid_only: bool) -> Vec<InvitationCode> {
    codes
        .iter()
        .filter(|c| !valid_only || c.is_valid)
        .cloned()
        .collect()
}

/// Sort codes in place by the given field and direction.
///
/// Uses a stable sort, so ties keep their relative order from the input.
pub fn sort_codes(codes: &mut [InvitationCode], sort: SortState) {
    codes.sort_by(|a, b| {
        let ordering = match sort.field {
            SortField::Code => a.code.cmp(&b.code),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::ExpiresAt => a.expires_at.cmp(&b.expires_at),
            SortField::MaxCalls => a.max_calls.cmp(&b.max_calls),
            SortField::CallCount => a.call_count.cmp(&b.call_count),
            SortField::IsValid => a.is_valid.cmp(&b.is_valid),
        };
        if sort.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

/// Display status of a code. Derived per render, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeStatus {
    Valid,
    Expired,
    Depleted,
}

impl CodeStatus {
    /// Classify a code against the given `now`.
    ///
    /// The caller must use one `now` for a whole render pass so that rows
    /// are classified consistently.
    pub fn classify(code: &InvitationCode, now: DateTime<Utc>) -> Self {
        if code.is_valid {
            CodeStatus::Valid
        } else if now >= code.expires_at {
            CodeStatus::Expired
        } else {
            CodeStatus::Depleted
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CodeStatus::Valid => "Valid",
            CodeStatus::Expired => "Expired",
            CodeStatus::Depleted => "Depleted",
        }
    }
}
