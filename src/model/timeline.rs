use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One day column of the timeline.
///
/// `is_today` and `is_weekend` are fixed when the cell is created; cells are
/// compared by calendar day only.
#[derive(Debug, Clone, Copy, Eq)]
pub struct DateCell {
    pub date: NaiveDate,
    pub is_today: bool,
    pub is_weekend: bool,
}

impl DateCell {
    pub fn new(date: NaiveDate, today: NaiveDate) -> Self {
        Self {
            date,
            is_today: date == today,
            is_weekend: date.weekday().num_days_from_monday() >= 5,
        }
    }
}

impl PartialEq for DateCell {
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date
    }
}

/// Controls how wide a single day column is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewMode {
    #[default]
    Days,
    Weeks,
    Months,
}

impl ViewMode {
    /// Pixels per day column.
    pub fn column_width(self) -> f32 {
        match self {
            ViewMode::Days => 40.0,
            ViewMode::Weeks => 16.0,
            ViewMode::Months => 6.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Days => "Days",
            ViewMode::Weeks => "Weeks",
            ViewMode::Months => "Months",
        }
    }

    pub const ALL: [ViewMode; 3] = [ViewMode::Days, ViewMode::Weeks, ViewMode::Months];
}
