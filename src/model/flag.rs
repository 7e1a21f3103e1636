use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::RowId;
use crate::schema::Column;

/// One of the four status checkboxes of an order.
///
/// Each flag owns one sheet column; the four columns are adjacent (`Q..T`) so a
/// block of orders can be written back in one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flag {
    Approved,
    Printed,
    PickedUp,
    Paid,
}

impl Flag {
    pub const ALL: [Flag; 4] = [Flag::Approved, Flag::Printed, Flag::PickedUp, Flag::Paid];
    pub const FIRST: Flag = Flag::Approved;
    pub const LAST: Flag = Flag::Paid;

    pub fn column(self) -> Column {
        match self {
            Flag::Approved => Column::Approved,
            Flag::Printed => Column::Printed,
            Flag::PickedUp => Column::PickedUp,
            Flag::Paid => Column::Paid,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Flag::Approved => "approved",
            Flag::Printed => "printed",
            Flag::PickedUp => "picked-up",
            Flag::Paid => "paid",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Flag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "approved" => Ok(Flag::Approved),
            "printed" => Ok(Flag::Printed),
            "picked-up" | "picked_up" | "pickedup" => Ok(Flag::PickedUp),
            "paid" => Ok(Flag::Paid),
            other => Err(format!(
                "Unknown flag '{}' (expected approved, printed, picked-up or paid)",
                other
            )),
        }
    }
}

/// An operator toggling one flag of one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagEdit {
    pub row: RowId,
    pub flag: Flag,
    pub value: bool,
}

impl FlagEdit {
    pub fn new(row: RowId, flag: Flag, value: bool) -> Self {
        Self { row, flag, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_columns_are_adjacent() {
        let indices: Vec<usize> = Flag::ALL.iter().map(|f| f.column().index()).collect();
        assert_eq!(indices, vec![16, 17, 18, 19]);
        assert_eq!(Flag::FIRST.column().letter(), "Q");
        assert_eq!(Flag::LAST.column().letter(), "T");
    }

    #[test]
    fn test_flag_from_str() {
        assert_eq!("approved".parse::<Flag>(), Ok(Flag::Approved));
        assert_eq!("PICKED_UP".parse::<Flag>(), Ok(Flag::PickedUp));
        assert_eq!("picked-up".parse::<Flag>(), Ok(Flag::PickedUp));
        assert!("shipped".parse::<Flag>().is_err());
    }
}
