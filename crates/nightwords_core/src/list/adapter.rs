//! Incremental list adapter over a host list view.
//!
//! # Responsibility
//! - Keep the currently displayed sequence.
//! - Translate each diff op into exactly one host row primitive.
//!
//! # Invariants
//! - Ops reach the host in diff order; rows the diff does not name are
//!   never touched, so scroll position and row animations survive.
//! - After `submit_list` returns `Ok`, the host shows the submitted list.

use crate::diff::{diff, DiffCounts, DiffError, DiffOp, Diffable};
use crate::list::model::{build_display_items, DisplayItem, NightFormatter};
use crate::model::sleep_night::{NightId, SleepNight};
use chrono::{Local, TimeZone};
use log::debug;
use std::fmt::Display;

/// Row-level primitives provided by the rendering host.
pub trait ListHost<T> {
    fn insert_row(&mut self, index: usize, item: &T);
    fn remove_row(&mut self, index: usize);
    fn move_row(&mut self, from: usize, to: usize);
    fn rebind_row(&mut self, index: usize, item: &T);
}

/// Generic diffing adapter.
pub struct ListAdapter<T, H> {
    items: Vec<T>,
    host: H,
}

impl<T, H> ListAdapter<T, H>
where
    T: Diffable + Clone,
    H: ListHost<T>,
{
    pub fn new(host: H) -> Self {
        Self {
            items: Vec::new(),
            host,
        }
    }

    /// Diffs `items` against the current list and patches the host.
    ///
    /// On error the host and the current list are left untouched.
    pub fn submit_list(&mut self, items: Vec<T>) -> Result<DiffCounts, DiffError> {
        let result = diff(&self.items, &items)?;
        for op in &result {
            match *op {
                DiffOp::Remove { at } => self.host.remove_row(at),
                DiffOp::Move { from, to } => self.host.move_row(from, to),
                DiffOp::Insert { index } => self.host.insert_row(index, &items[index]),
                DiffOp::Update { index } => self.host.rebind_row(index, &items[index]),
            }
        }
        self.items = items;

        let counts = result.counts();
        debug!(
            "event=list_submit module=list status=ok rows={} inserted={} removed={} moved={} updated={}",
            self.items.len(),
            counts.inserted,
            counts.removed,
            counts.moved,
            counts.updated
        );
        Ok(counts)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

/// Sleep list adapter: nights in, header-prefixed rows out.
pub struct SleepNightAdapter<H, Tz: TimeZone> {
    list: ListAdapter<DisplayItem, H>,
    formatter: NightFormatter<Tz>,
}

impl<H, Tz> SleepNightAdapter<H, Tz>
where
    H: ListHost<DisplayItem>,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn new(host: H, formatter: NightFormatter<Tz>) -> Self {
        Self {
            list: ListAdapter::new(host),
            formatter,
        }
    }

    /// Rebuilds the display sequence from `nights` and patches the host.
    pub fn submit_nights(&mut self, nights: &[SleepNight]) -> Result<DiffCounts, DiffError> {
        let items = build_display_items(nights, &self.formatter);
        self.list.submit_list(items)
    }

    /// Night id behind a tapped row; `None` for the header or out of range.
    pub fn night_id_at(&self, position: usize) -> Option<NightId> {
        self.list
            .items()
            .get(position)
            .and_then(DisplayItem::night_id)
    }

    pub fn items(&self) -> &[DisplayItem] {
        self.list.items()
    }

    pub fn item_count(&self) -> usize {
        self.list.item_count()
    }

    pub fn host(&self) -> &H {
        self.list.host()
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.list.host_mut()
    }
}

/// Sleep list adapter formatting in the device time zone.
pub type LocalSleepNightAdapter<H> = SleepNightAdapter<H, Local>;

/// In-memory host: a row buffer with per-primitive counters.
#[derive(Debug, Clone)]
pub struct RowBuffer<T> {
    rows: Vec<T>,
    pub inserts: usize,
    pub removes: usize,
    pub moves: usize,
    pub rebinds: usize,
}

impl<T> RowBuffer<T> {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            inserts: 0,
            removes: 0,
            moves: 0,
            rebinds: 0,
        }
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn reset_counters(&mut self) {
        self.inserts = 0;
        self.removes = 0;
        self.moves = 0;
        self.rebinds = 0;
    }

    /// Total primitives dispatched since the last reset.
    pub fn touched(&self) -> usize {
        self.inserts + self.removes + self.moves + self.rebinds
    }
}

impl<T> Default for RowBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ListHost<T> for RowBuffer<T> {
    fn insert_row(&mut self, index: usize, item: &T) {
        self.rows.insert(index, item.clone());
        self.inserts += 1;
    }

    fn remove_row(&mut self, index: usize) {
        self.rows.remove(index);
        self.removes += 1;
    }

    fn move_row(&mut self, from: usize, to: usize) {
        let row = self.rows.remove(from);
        self.rows.insert(to, row);
        self.moves += 1;
    }

    fn rebind_row(&mut self, index: usize, item: &T) {
        self.rows[index] = item.clone();
        self.rebinds += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{RowBuffer, SleepNightAdapter};
    use crate::list::model::{DisplayItem, NightFormatter};
    use crate::model::sleep_night::SleepNight;
    use chrono::Utc;

    fn night(id: i64, start: i64, end: i64, quality: i32) -> SleepNight {
        SleepNight {
            night_id: id,
            start_time_milli: start,
            end_time_milli: end,
            sleep_quality: quality,
        }
    }

    fn adapter() -> SleepNightAdapter<RowBuffer<DisplayItem>, Utc> {
        SleepNightAdapter::new(RowBuffer::new(), NightFormatter::new(Utc))
    }

    #[test]
    fn first_submit_inserts_header_and_rows() {
        let mut adapter = adapter();
        let counts = adapter
            .submit_nights(&[night(2, 0, 0, -1), night(1, 0, 5_000, 3)])
            .unwrap();

        assert_eq!(counts.inserted, 3);
        assert_eq!(adapter.host().rows(), adapter.items());
        assert_eq!(adapter.host().rows()[0], DisplayItem::Header);
    }

    #[test]
    fn rating_one_night_rebinds_only_that_row() {
        let mut adapter = adapter();
        adapter
            .submit_nights(&[night(2, 0, 10_000, -1), night(1, 0, 5_000, 3)])
            .unwrap();
        adapter.host_mut().reset_counters();

        adapter
            .submit_nights(&[night(2, 0, 10_000, 4), night(1, 0, 5_000, 3)])
            .unwrap();

        assert_eq!(adapter.host().rebinds, 1);
        assert_eq!(adapter.host().touched(), 1);
        assert_eq!(adapter.host().rows(), adapter.items());
    }

    #[test]
    fn new_night_inserts_below_header() {
        let mut adapter = adapter();
        adapter.submit_nights(&[night(1, 0, 5_000, 3)]).unwrap();
        adapter.host_mut().reset_counters();

        adapter
            .submit_nights(&[night(2, 9_000, 9_000, -1), night(1, 0, 5_000, 3)])
            .unwrap();

        assert_eq!(adapter.host().inserts, 1);
        assert_eq!(adapter.host().touched(), 1);
        assert_eq!(adapter.night_id_at(1), Some(2));
        assert_eq!(adapter.night_id_at(0), None);
        assert_eq!(adapter.night_id_at(7), None);
    }

    #[test]
    fn clearing_removes_header_too() {
        let mut adapter = adapter();
        adapter.submit_nights(&[night(1, 0, 5_000, 3)]).unwrap();

        let counts = adapter.submit_nights(&[]).unwrap();
        assert_eq!(counts.removed, 2);
        assert!(adapter.host().rows().is_empty());
    }
}
