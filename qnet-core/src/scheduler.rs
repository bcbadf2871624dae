use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use tracing::trace;

use crate::error::EventError;
use crate::types::EventId;
use crate::SimTime;

/// Number of generic numeric attributes carried by every event.
pub const EVENT_ATTRIBUTES: usize = 4;

/// A pending occurrence in the calendar.
///
/// Owned by the [`Scheduler`] from the moment it is scheduled until it is popped,
/// at which point it is handed to the driver by value.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<E> {
    pub id: EventId,
    pub time: SimTime,
    pub kind: E,
    pub attributes: [f64; EVENT_ATTRIBUTES],
}

/// Heap wrapper ordering events by time, then by scheduling order.
#[derive(Debug)]
struct CalendarEntry<E>(Event<E>);

impl<E> PartialEq for CalendarEntry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.0.time == other.0.time && self.0.id == other.0.id
    }
}

impl<E> Eq for CalendarEntry<E> {}

impl<E> PartialOrd for CalendarEntry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for CalendarEntry<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse the ordering for min-heap behavior in BinaryHeap
        other
            .0
            .time
            .cmp(&self.0.time)
            .then_with(|| other.0.id.cmp(&self.0.id))
    }
}

/// Scheduler is the future-event list: it keeps the current time and the
/// upcoming events.
///
/// Events come out in non-decreasing time order; events scheduled for the same
/// instant come out in the order they were scheduled. Popping an event is the
/// only way the clock moves forward (apart from [`Scheduler::advance_to`], used
/// by the driver to close a run at its horizon).
///
/// See the [crate-level documentation](index.html) for more information.
pub struct Scheduler<E> {
    next_event_id: u64,
    events: BinaryHeap<CalendarEntry<E>>,
    clock: SimTime,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self {
            next_event_id: 0,
            events: BinaryHeap::default(),
            clock: SimTime::zero(),
        }
    }
}

impl<E: fmt::Debug> Scheduler<E> {
    /// Schedules `kind` to occur at the absolute time `time`.
    pub fn schedule(&mut self, time: SimTime, kind: E) -> Result<EventId, EventError> {
        self.schedule_with(time, kind, [0.0; EVENT_ATTRIBUTES])
    }

    /// Schedules `kind` with explicit attributes at the absolute time `time`.
    ///
    /// Fails with [`EventError::ScheduleInPast`] if `time` is before the current clock.
    pub fn schedule_with(
        &mut self,
        time: SimTime,
        kind: E,
        attributes: [f64; EVENT_ATTRIBUTES],
    ) -> Result<EventId, EventError> {
        if time < self.clock {
            return Err(EventError::ScheduleInPast {
                requested: time,
                now: self.clock,
            });
        }
        self.next_event_id += 1;
        let id = EventId(self.next_event_id);
        trace!(event_id = %id, time = %time, kind = ?kind, "Event scheduled");
        self.events.push(CalendarEntry(Event {
            id,
            time,
            kind,
            attributes,
        }));
        Ok(id)
    }

    /// Schedules `kind` to occur `delay` time units from now.
    pub fn schedule_in(&mut self, delay: f64, kind: E) -> Result<EventId, EventError> {
        let time = self.clock.checked_add(delay)?;
        self.schedule(time, kind)
    }

    /// Returns the current simulation time.
    #[must_use]
    pub fn time(&self) -> SimTime {
        self.clock
    }

    /// Returns the time of the next scheduled event, or `None` if none are left.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.events.peek().map(|entry| entry.0.time)
    }

    /// Removes and returns the next scheduled event or `None` if none are left.
    ///
    /// The clock is set to the popped event's time.
    pub fn pop(&mut self) -> Option<Event<E>> {
        self.events.pop().map(|CalendarEntry(event)| {
            self.clock = event.time;
            event
        })
    }

    /// Like [`Scheduler::pop`], but an empty calendar is an error.
    pub fn next_event(&mut self) -> Result<Event<E>, EventError> {
        self.pop().ok_or(EventError::EmptyQueue)
    }

    /// Moves the clock forward to `time` without dispatching anything.
    ///
    /// Events still pending before `time` would be skipped, so this is refused.
    pub fn advance_to(&mut self, time: SimTime) -> Result<(), EventError> {
        if time < self.clock {
            return Err(EventError::ScheduleInPast {
                requested: time,
                now: self.clock,
            });
        }
        if let Some(next) = self.peek_time() {
            if next < time {
                return Err(EventError::ScheduleInPast {
                    requested: next,
                    now: time,
                });
            }
        }
        self.clock = time;
        Ok(())
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        A,
        B,
    }

    fn t(value: f64) -> SimTime {
        SimTime::new(value).unwrap()
    }

    #[test]
    fn test_scheduler() {
        let mut scheduler = Scheduler::default();
        assert_eq!(scheduler.time(), SimTime::zero());
        assert!(scheduler.is_empty());

        scheduler.schedule(t(1.0), Kind::A).unwrap();
        scheduler.schedule(t(0.0), Kind::B).unwrap();
        scheduler.schedule(t(2.0), Kind::B).unwrap();
        assert_eq!(scheduler.len(), 3);
        assert_eq!(scheduler.peek_time(), Some(t(0.0)));

        let event = scheduler.pop().unwrap();
        assert_eq!(event.kind, Kind::B);
        assert_eq!(event.time, t(0.0));
        assert_eq!(scheduler.time(), t(0.0));

        let event = scheduler.pop().unwrap();
        assert_eq!(event.kind, Kind::A);
        assert_eq!(scheduler.time(), t(1.0));

        let event = scheduler.pop().unwrap();
        assert_eq!(event.kind, Kind::B);
        assert_eq!(scheduler.time(), t(2.0));

        assert!(scheduler.pop().is_none());
        assert!(matches!(scheduler.next_event(), Err(EventError::EmptyQueue)));
    }

    #[test]
    fn test_ties_follow_scheduling_order() {
        let mut scheduler = Scheduler::default();
        for i in 0..50 {
            scheduler
                .schedule_with(t(3.0), Kind::A, [i as f64, 0.0, 0.0, 0.0])
                .unwrap();
        }
        scheduler.schedule(t(1.0), Kind::B).unwrap();

        assert_eq!(scheduler.pop().unwrap().kind, Kind::B);
        for i in 0..50 {
            let event = scheduler.pop().unwrap();
            assert_eq!(event.attributes[0], i as f64);
        }
    }

    #[test]
    fn test_schedule_in_past_is_rejected() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(t(5.0), Kind::A).unwrap();
        scheduler.pop().unwrap();

        let err = scheduler.schedule(t(4.0), Kind::B).unwrap_err();
        assert!(matches!(err, EventError::ScheduleInPast { .. }));
        assert!(scheduler.schedule_in(-0.5, Kind::B).is_err());

        // Same instant is allowed.
        scheduler.schedule(t(5.0), Kind::B).unwrap();
    }

    #[test]
    fn test_schedule_in_is_relative() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(t(2.0), Kind::A).unwrap();
        scheduler.pop().unwrap();
        scheduler.schedule_in(1.5, Kind::B).unwrap();
        assert_eq!(scheduler.peek_time(), Some(t(3.5)));
    }

    #[test]
    fn test_advance_to() {
        let mut scheduler: Scheduler<Kind> = Scheduler::default();
        scheduler.advance_to(t(4.0)).unwrap();
        assert_eq!(scheduler.time(), t(4.0));
        assert!(scheduler.advance_to(t(3.0)).is_err());

        scheduler.schedule(t(6.0), Kind::A).unwrap();
        assert!(scheduler.advance_to(t(7.0)).is_err());
        scheduler.advance_to(t(6.0)).unwrap();
    }
}
