//! A priority queue that stores arbitrary data sorted by day
//!
//! Defines a `Queue<T>` that stores items of type T, called 'plans', sorted by
//! simulation day. Adding and retrieving a plan are both *O*(log(*n*)).
//!
//! This queue is used by `Context` to store future work where some callback
//! closure `FnOnce(&mut Context)` will be executed on a given day, such as the
//! resolution of an individual's infection.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A priority queue that stores arbitrary data sorted by day
///
/// Items of type `T` are stored in order by `u32` day. Plans are numbered in
/// insertion order; if two plans are scheduled for the same day then the plan
/// added first is placed earlier.
pub struct Queue<T> {
    queue: BinaryHeap<Entry<T>>,
    plan_counter: u64,
}

impl<T> Queue<T> {
    /// Create a new empty `Queue<T>`
    #[must_use]
    pub fn new() -> Queue<T> {
        Queue {
            queue: BinaryHeap::new(),
            plan_counter: 0,
        }
    }

    /// Add a plan to the queue on the specified day
    pub fn add_plan(&mut self, day: u32, data: T) {
        let id = self.plan_counter;
        self.queue.push(Entry { day, id, data });
        self.plan_counter += 1;
    }

    /// Returns the day of the earliest plan without removing it
    #[must_use]
    pub fn next_day(&self) -> Option<u32> {
        self.queue.peek().map(|entry| entry.day)
    }

    /// Retrieve the earliest plan in the queue
    ///
    /// Returns the next plan if it exists or else `None` if the queue is empty
    pub fn get_next_plan(&mut self) -> Option<Plan<T>> {
        self.queue.pop().map(|entry| Plan {
            day: entry.day,
            data: entry.data,
        })
    }

    /// Number of plans remaining in the queue
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A plan's payload with the day and insertion number that order it
struct Entry<T> {
    day: u32,
    id: u64,
    data: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.day == other.day && self.id == other.id
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// `BinaryHeap` is a max-heap, so both orderings are reversed.
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.day
            .cmp(&other.day)
            .then_with(|| self.id.cmp(&other.id))
            .reverse()
    }
}

/// A plan that holds data of type `T` intended to be used on the specified day
pub struct Plan<T> {
    pub day: u32,
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::Queue;

    #[test]
    fn empty_queue() {
        let mut plan_queue = Queue::<()>::new();
        assert!(plan_queue.get_next_plan().is_none());
        assert!(plan_queue.next_day().is_none());
        assert!(plan_queue.is_empty());
    }

    #[test]
    fn add_plans() {
        let mut plan_queue = Queue::new();
        plan_queue.add_plan(1, 1);
        plan_queue.add_plan(3, 3);
        plan_queue.add_plan(2, 2);
        assert_eq!(plan_queue.len(), 3);

        let next_plan = plan_queue.get_next_plan().unwrap();
        assert_eq!(next_plan.day, 1);
        assert_eq!(next_plan.data, 1);

        let next_plan = plan_queue.get_next_plan().unwrap();
        assert_eq!(next_plan.day, 2);
        assert_eq!(next_plan.data, 2);

        let next_plan = plan_queue.get_next_plan().unwrap();
        assert_eq!(next_plan.day, 3);
        assert_eq!(next_plan.data, 3);

        assert!(plan_queue.get_next_plan().is_none());
    }

    #[test]
    fn add_plans_on_same_day() {
        let mut plan_queue = Queue::new();
        plan_queue.add_plan(1, 1);
        plan_queue.add_plan(1, 2);

        let next_plan = plan_queue.get_next_plan().unwrap();
        assert_eq!(next_plan.day, 1);
        assert_eq!(next_plan.data, 1);

        let next_plan = plan_queue.get_next_plan().unwrap();
        assert_eq!(next_plan.day, 1);
        assert_eq!(next_plan.data, 2);

        assert!(plan_queue.get_next_plan().is_none());
    }

    #[test]
    fn next_day_peeks() {
        let mut plan_queue = Queue::new();
        plan_queue.add_plan(5, 5);
        plan_queue.add_plan(2, 2);
        assert_eq!(plan_queue.next_day(), Some(2));
        assert_eq!(plan_queue.len(), 2);
        assert_eq!(plan_queue.get_next_plan().unwrap().data, 2);
        assert_eq!(plan_queue.next_day(), Some(5));
    }

    #[test]
    fn add_and_get_plans() {
        let mut plan_queue = Queue::new();
        plan_queue.add_plan(1, 1);
        plan_queue.add_plan(4, 2);

        let next_plan = plan_queue.get_next_plan().unwrap();
        assert_eq!(next_plan.day, 1);
        assert_eq!(next_plan.data, 1);

        plan_queue.add_plan(2, 3);

        let next_plan = plan_queue.get_next_plan().unwrap();
        assert_eq!(next_plan.day, 2);
        assert_eq!(next_plan.data, 3);

        let next_plan = plan_queue.get_next_plan().unwrap();
        assert_eq!(next_plan.day, 4);
        assert_eq!(next_plan.data, 2);

        assert!(plan_queue.get_next_plan().is_none());
    }
}
