//! Named FIFO lists
//!
//! A model keeps its queues, server-occupancy markers and bookkeeping markers
//! in named lists. Records are appended at the tail and removed from the head
//! only. Each list can carry a [`TimeWeighted`] accumulator that integrates its
//! size over time for queue-length and utilization averages.
//!
//! Capacity is a property of the list, but the list never rejects a record on
//! its own: the handler asks [`ListRegistry::would_overflow`] first and takes
//! its blocking branch instead of appending.

use std::collections::{HashMap, VecDeque};

use metrics::gauge;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::SimError;
use crate::stats::{TimeWeighted, TimeWeightedSummary};
use crate::types::Label;
use crate::SimTime;

/// Number of generic numeric attributes carried by every record.
pub const RECORD_ATTRIBUTES: usize = 3;

/// An entry in a named list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Time the record was filed; delays are measured from here.
    pub filed_at: SimTime,
    pub attributes: [f64; RECORD_ATTRIBUTES],
}

impl Record {
    pub fn new(filed_at: SimTime) -> Self {
        Self {
            filed_at,
            attributes: [0.0; RECORD_ATTRIBUTES],
        }
    }

    pub fn with_attributes(filed_at: SimTime, attributes: [f64; RECORD_ATTRIBUTES]) -> Self {
        Self {
            filed_at,
            attributes,
        }
    }

    /// Time elapsed between filing and `now`.
    pub fn age(&self, now: SimTime) -> f64 {
        now.since(self.filed_at)
    }
}

/// What a list stands for in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListRole {
    /// Customers waiting for a server.
    Queue,
    /// Single-capacity server occupancy flag: zero or one record.
    Server,
    /// Bookkeeping marker (stage or system arrival stamps).
    Marker,
}

/// Capacity policy of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Capacity {
    #[default]
    Unbounded,
    Bounded(usize),
}

impl From<Option<usize>> for Capacity {
    fn from(value: Option<usize>) -> Self {
        value.map_or(Capacity::Unbounded, Capacity::Bounded)
    }
}

/// Registration parameters of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSpec {
    pub role: ListRole,
    pub capacity: Capacity,
    pub time_weighted: bool,
}

impl ListSpec {
    pub fn queue() -> Self {
        Self {
            role: ListRole::Queue,
            capacity: Capacity::Unbounded,
            time_weighted: true,
        }
    }

    pub fn bounded_queue(capacity: usize) -> Self {
        Self {
            capacity: Capacity::Bounded(capacity),
            ..Self::queue()
        }
    }

    pub fn server() -> Self {
        Self {
            role: ListRole::Server,
            capacity: Capacity::Bounded(1),
            time_weighted: true,
        }
    }

    pub fn marker() -> Self {
        Self {
            role: ListRole::Marker,
            capacity: Capacity::Unbounded,
            time_weighted: true,
        }
    }

    pub fn with_capacity(mut self, capacity: impl Into<Capacity>) -> Self {
        self.capacity = capacity.into();
        self
    }

    /// Do not integrate this list's size over time.
    pub fn untracked(mut self) -> Self {
        self.time_weighted = false;
        self
    }
}

/// One named list with its records and optional area accumulator.
#[derive(Debug)]
pub struct NamedList<L> {
    id: L,
    spec: ListSpec,
    records: VecDeque<Record>,
    area: Option<TimeWeighted>,
}

impl<L: Label> NamedList<L> {
    fn new(id: L, spec: ListSpec, start: SimTime) -> Self {
        Self {
            id,
            spec,
            records: VecDeque::new(),
            area: spec.time_weighted.then(|| TimeWeighted::new(start)),
        }
    }

    pub fn id(&self) -> L {
        self.id
    }

    pub fn spec(&self) -> &ListSpec {
        &self.spec
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn front(&self) -> Option<&Record> {
        self.records.front()
    }

    pub fn would_overflow(&self) -> bool {
        match self.spec.capacity {
            Capacity::Bounded(capacity) => self.records.len() >= capacity,
            Capacity::Unbounded => false,
        }
    }

    /// Time-weighted summary up to `end_time`, if the list is tracked.
    pub fn summary(&self, end_time: SimTime) -> Option<TimeWeightedSummary> {
        self.area.as_ref().map(|area| area.summary(end_time))
    }

    /// Rejects a change at `now` before the last recorded one.
    fn check_time(&self, now: SimTime) -> Result<(), SimError> {
        match &self.area {
            Some(area) if !area.accepts(now) => Err(SimError::NonMonotonicTime {
                list: self.id.to_string(),
                last: area.last_change(),
                now,
            }),
            _ => Ok(()),
        }
    }

    fn size_changed(&mut self, now: SimTime) -> Result<(), SimError> {
        let size = self.records.len() as f64;
        if let Some(area) = self.area.as_mut() {
            if !area.update(now, size) {
                return Err(SimError::NonMonotonicTime {
                    list: self.id.to_string(),
                    last: area.last_change(),
                    now,
                });
            }
        }
        gauge!("qnet_list_size", "list" => self.id.to_string()).set(size);
        Ok(())
    }
}

/// The set of named lists of one simulation.
///
/// Iteration follows registration order so reports are stable across runs.
#[derive(Debug)]
pub struct ListRegistry<L> {
    lists: Vec<NamedList<L>>,
    index: HashMap<L, usize>,
}

impl<L> Default for ListRegistry<L> {
    fn default() -> Self {
        Self {
            lists: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<L: Label> ListRegistry<L> {
    /// Register `id`; its area accumulator starts integrating at `start`.
    pub fn register(&mut self, id: L, spec: ListSpec, start: SimTime) -> Result<(), SimError> {
        if self.index.contains_key(&id) {
            return Err(SimError::DuplicateList {
                list: id.to_string(),
            });
        }
        self.index.insert(id, self.lists.len());
        self.lists.push(NamedList::new(id, spec, start));
        Ok(())
    }

    pub fn get(&self, id: L) -> Result<&NamedList<L>, SimError> {
        self.index
            .get(&id)
            .map(|&idx| &self.lists[idx])
            .ok_or_else(|| SimError::UnknownList {
                list: id.to_string(),
            })
    }

    fn get_mut(&mut self, id: L) -> Result<&mut NamedList<L>, SimError> {
        match self.index.get(&id) {
            Some(&idx) => Ok(&mut self.lists[idx]),
            None => Err(SimError::UnknownList {
                list: id.to_string(),
            }),
        }
    }

    /// Current number of records in `id`.
    pub fn size(&self, id: L) -> Result<usize, SimError> {
        self.get(id).map(NamedList::len)
    }

    /// Whether appending one more record to `id` would exceed its capacity.
    pub fn would_overflow(&self, id: L) -> Result<bool, SimError> {
        self.get(id).map(NamedList::would_overflow)
    }

    pub fn peek_front(&self, id: L) -> Result<Option<&Record>, SimError> {
        self.get(id).map(NamedList::front)
    }

    /// Append `record` at the tail of `id` as of `now`.
    ///
    /// A server list holds at most one record; filing a second one is a model bug.
    pub fn append(&mut self, id: L, record: Record, now: SimTime) -> Result<(), SimError> {
        let list = self.get_mut(id)?;
        if list.spec.role == ListRole::Server && !list.records.is_empty() {
            return Err(SimError::ServerAlreadyBusy {
                list: id.to_string(),
                time: now,
            });
        }
        list.check_time(now)?;
        list.records.push_back(record);
        trace!(list = %id, size = list.records.len(), time = %now, "Record filed");
        list.size_changed(now)
    }

    /// Remove and return the head record of `id` as of `now`.
    pub fn remove_front(&mut self, id: L, now: SimTime) -> Result<Record, SimError> {
        let list = self.get_mut(id)?;
        if list.records.is_empty() {
            return Err(SimError::ListUnderflow {
                list: id.to_string(),
                time: now,
            });
        }
        list.check_time(now)?;
        let record = list.records.pop_front().ok_or_else(|| SimError::ListUnderflow {
            list: id.to_string(),
            time: now,
        })?;
        trace!(list = %id, size = list.records.len(), time = %now, "Record removed");
        list.size_changed(now)?;
        Ok(record)
    }

    /// All lists in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &NamedList<L>> {
        self.lists.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum List {
        Queue,
        Server,
        Missing,
    }

    impl std::fmt::Display for List {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    fn t(value: f64) -> SimTime {
        SimTime::new(value).unwrap()
    }

    fn registry() -> ListRegistry<List> {
        let mut lists = ListRegistry::default();
        lists
            .register(List::Queue, ListSpec::bounded_queue(2), SimTime::zero())
            .unwrap();
        lists
            .register(List::Server, ListSpec::server(), SimTime::zero())
            .unwrap();
        lists
    }

    #[test]
    fn test_fifo_order_and_size() {
        let mut lists = ListRegistry::default();
        lists.register(List::Queue, ListSpec::queue(), SimTime::zero()).unwrap();

        for i in 0..10 {
            lists
                .append(List::Queue, Record::new(t(i as f64)), t(i as f64))
                .unwrap();
        }
        for removed in 0..=10 {
            assert_eq!(lists.size(List::Queue).unwrap(), 10 - removed);
            if removed < 10 {
                let record = lists.remove_front(List::Queue, t(10.0)).unwrap();
                assert_eq!(record.filed_at, t(removed as f64));
            }
        }
    }

    #[test]
    fn test_remove_from_empty_list_is_underflow() {
        let mut lists = registry();
        let err = lists.remove_front(List::Queue, t(3.0)).unwrap_err();
        match err {
            SimError::ListUnderflow { list, time } => {
                assert_eq!(list, "Queue");
                assert_eq!(time, t(3.0));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_and_duplicate_lists() {
        let mut lists = registry();
        assert!(matches!(
            lists.size(List::Missing),
            Err(SimError::UnknownList { .. })
        ));
        assert!(matches!(
            lists.register(List::Queue, ListSpec::queue(), SimTime::zero()),
            Err(SimError::DuplicateList { .. })
        ));
    }

    #[test]
    fn test_would_overflow_does_not_enforce() {
        let mut lists = registry();
        assert!(!lists.would_overflow(List::Queue).unwrap());
        lists.append(List::Queue, Record::new(t(0.0)), t(0.0)).unwrap();
        lists.append(List::Queue, Record::new(t(0.0)), t(0.0)).unwrap();
        assert!(lists.would_overflow(List::Queue).unwrap());
    }

    #[test]
    fn test_server_holds_one_record() {
        let mut lists = registry();
        lists.append(List::Server, Record::new(t(1.0)), t(1.0)).unwrap();
        assert!(matches!(
            lists.append(List::Server, Record::new(t(1.0)), t(1.0)),
            Err(SimError::ServerAlreadyBusy { .. })
        ));
        lists.remove_front(List::Server, t(2.0)).unwrap();
        lists.append(List::Server, Record::new(t(2.0)), t(2.0)).unwrap();
    }

    #[test]
    fn test_attached_area_tracks_size() {
        let mut lists = registry();
        lists.append(List::Server, Record::new(t(2.0)), t(2.0)).unwrap();
        let summary = lists.get(List::Server).unwrap().summary(t(5.0)).unwrap();
        assert!((summary.time_average - 0.6).abs() < 1e-12);
        assert_eq!(summary.max, 1.0);
    }

    #[test]
    fn test_untracked_list_has_no_summary() {
        let mut lists: ListRegistry<List> = ListRegistry::default();
        lists
            .register(List::Queue, ListSpec::queue().untracked(), SimTime::zero())
            .unwrap();
        assert!(lists.get(List::Queue).unwrap().summary(t(1.0)).is_none());
    }

    #[test]
    fn test_backwards_update_is_rejected() {
        let mut lists = registry();
        lists.append(List::Queue, Record::new(t(4.0)), t(4.0)).unwrap();
        assert!(matches!(
            lists.remove_front(List::Queue, t(3.0)),
            Err(SimError::NonMonotonicTime { .. })
        ));
        assert!(matches!(
            lists.append(List::Queue, Record::new(t(3.0)), t(3.0)),
            Err(SimError::NonMonotonicTime { .. })
        ));

        // the rejected calls leave records and area untouched
        assert_eq!(lists.size(List::Queue).unwrap(), 1);
        let summary = lists.get(List::Queue).unwrap().summary(t(8.0)).unwrap();
        assert!((summary.time_average - 0.5).abs() < 1e-12);
        assert_eq!(summary.max, 1.0);
        assert_eq!(lists.remove_front(List::Queue, t(8.0)).unwrap().filed_at, t(4.0));
    }
}
