use std::collections::HashMap;

use chrono::NaiveDate;

use super::window::DateWindow;

/// Calendar day → column lookup for the current [`DateWindow`].
///
/// Keys are local calendar days, never instants, so a task due "today" maps
/// to today's column in every time zone. Rebuilt whole whenever the window
/// changes.
#[derive(Debug, Clone, Default)]
pub struct DateIndex {
    columns: HashMap<NaiveDate, usize>,
    first: Option<NaiveDate>,
    last: Option<NaiveDate>,
}

impl DateIndex {
    pub fn build(window: &DateWindow) -> Self {
        let columns = window
            .cells()
            .iter()
            .enumerate()
            .map(|(i, cell)| (cell.date, i))
            .collect();
        Self {
            columns,
            first: window.first_date(),
            last: window.last_date(),
        }
    }

    /// Column of `date`, or `None` when it is not currently in view.
    pub fn get(&self, date: NaiveDate) -> Option<usize> {
        self.columns.get(&date).copied()
    }

    /// Lookup by a `YYYY-MM-DD` key, as stored by scroll persistence.
    pub fn get_key(&self, key: &str) -> Option<usize> {
        NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|date| self.get(date))
    }

    /// Pull `date` onto the nearest day in view.
    pub fn clamp(&self, date: NaiveDate) -> Option<NaiveDate> {
        Some(date.clamp(self.first?, self.last?))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// The `YYYY-MM-DD` key of a local calendar day.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::window::Edge;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn every_cell_maps_to_its_position() {
        let today = day(6, 10);
        let mut window = DateWindow::centered(today, today);
        window.extend(Edge::Start, today, 40.0);
        let index = DateIndex::build(&window);
        assert_eq!(index.len(), window.len());
        for (i, cell) in window.cells().iter().enumerate() {
            assert_eq!(index.get(cell.date), Some(i));
            assert_eq!(index.get_key(&date_key(cell.date)), Some(i));
        }
    }

    #[test]
    fn dates_outside_the_window_are_absent() {
        let today = day(6, 10);
        let mut window = DateWindow::centered(today, today);
        let before = window.first_date().unwrap();
        for _ in 0..4 {
            window.extend(Edge::End, today, 40.0);
        }
        let index = DateIndex::build(&window);
        // The original first day was trimmed away; a stale index must not survive.
        assert_eq!(index.get(before), None);
        assert_eq!(index.get(day(1, 1) - chrono::Duration::days(3650)), None);
        assert_eq!(index.get_key("not-a-date"), None);
    }

    #[test]
    fn clamp_pulls_dates_onto_the_window_edges() {
        let today = day(6, 10);
        let window = DateWindow::centered(today, today);
        let index = DateIndex::build(&window);
        let (first, last) = (window.first_date().unwrap(), window.last_date().unwrap());
        assert_eq!(index.clamp(today), Some(today));
        assert_eq!(index.clamp(last + chrono::Duration::days(20)), Some(last));
        assert_eq!(index.clamp(first - chrono::Duration::days(1)), Some(first));
        assert_eq!(DateIndex::default().clamp(today), None);
    }

    #[test]
    fn keys_are_zero_padded_calendar_days() {
        assert_eq!(date_key(day(3, 5)), "2024-03-05");
    }
}
