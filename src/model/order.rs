use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use sync_framework::Cell;

use super::Flag;

/// Position of an order in the fetched range, counted before malformed rows are
/// dropped. A skipped row never shifts the address of the rows after it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct RowId(pub u32);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row_{}", self.0)
    }
}

impl FromStr for RowId {
    type Err = String;

    /// Accepts `7` as well as `row_7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("row_").unwrap_or(s);
        digits
            .parse::<u32>()
            .map(RowId)
            .map_err(|_| format!("Invalid row: '{}'", s))
    }
}

/// Outcome of the staff's membership check (`LOOKUP_MEMBER`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MemberStatus {
    /// The cell is still empty.
    #[default]
    Unchecked,
    Verified,
    NotVerified,
}

impl MemberStatus {
    pub fn label(self) -> &'static str {
        match self {
            MemberStatus::Unchecked => "check membership",
            MemberStatus::Verified => "verified member",
            MemberStatus::NotVerified => "not verified",
        }
    }
}

/// One print request, already normalized and with the requester's name redacted.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub row: RowId,
    pub timestamp: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub file_link: String,
    pub layer_height: String,
    pub rigidity: String,
    pub colour_material: String,
    pub comment: String,
    pub says_is_member: bool,
    pub accepts_paying: String,
    pub printer: String,
    pub member_lookup: MemberStatus,
    pub weight: String,
    pub time: String,
    pub price: String,
    pub approved: bool,
    pub printed: bool,
    pub picked_up: bool,
    pub paid: bool,
    /// Fraction in `0.0..=1.0`.
    pub completion: f64,
    /// Raw reference cell; usually an integer.
    pub reference: Cell,
    pub repro_comments: String,
}

impl Order {
    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::Approved => self.approved,
            Flag::Printed => self.printed,
            Flag::PickedUp => self.picked_up,
            Flag::Paid => self.paid,
        }
    }

    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        match flag {
            Flag::Approved => self.approved = value,
            Flag::Printed => self.printed = value,
            Flag::PickedUp => self.picked_up = value,
            Flag::Paid => self.paid = value,
        }
    }

    /// The `Q..T` cells of this order, in column order.
    pub fn flag_cells(&self) -> Vec<Cell> {
        Flag::ALL
            .iter()
            .map(|flag| Cell::Bool(self.flag(*flag)))
            .collect()
    }

    /// Completed orders are hidden from the desk.
    pub fn is_complete(&self) -> bool {
        self.completion >= 1.0
    }

    /// `#0007` for numeric references, `#<raw>` otherwise.
    pub fn ref_label(&self) -> String {
        match self.reference.as_integer() {
            Some(n) => format!("#{:0>4}", n),
            None => format!("#{}", self.reference),
        }
    }
}
