//! A priority queue that stores arbitrary data sorted by time
//!
//! Defines a `Queue<T, P>` that stores items of type `T` sorted by `f64`
//! time and an orderable priority `P`. The items are called 'plans'. The
//! queue supports adding plans, checking whether a plan is still pending and
//! retrieving the earliest plan. Both adding and retrieving are *O*(log(*n*)).
//!
//! `Context` uses this queue to hold fixed-time events (monitor samples, the
//! time bound of a run, the next Gillespie event) as callback closures
//! `FnOnce(&mut Context)`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::{HashMap, HashMapExt};

/// A priority queue that stores arbitrary data sorted by time
///
/// Items of type `T` are stored in order by `f64` time and called `Plan<T>`.
/// When plans are created they are sequentially assigned a `PlanId`. If two
/// plans are scheduled for the same time then the plan with the lowest
/// priority is placed earlier. If two plans have the same time and priority
/// then the plan that was scheduled first is placed earlier.
///
/// The time, plan id, and priority are stored in a binary heap of `Entry<P>`
/// objects. The payload is stored in a hash map by plan id.
pub struct Queue<T, P: Eq + PartialEq + Ord> {
    queue: BinaryHeap<Entry<P>>,
    data_map: HashMap<u64, T>,
    plan_counter: u64,
}

impl<T, P: Eq + PartialEq + Ord> Queue<T, P> {
    /// Create a new empty `Queue<T, P>`
    #[must_use]
    pub fn new() -> Queue<T, P> {
        Queue {
            queue: BinaryHeap::new(),
            data_map: HashMap::new(),
            plan_counter: 0,
        }
    }

    /// Add a plan to the queue at the specified time
    ///
    /// Returns a `PlanId` for the newly-added plan
    pub fn add_plan(&mut self, time: f64, data: T, priority: P) -> PlanId {
        let id = self.plan_counter;
        self.queue.push(Entry { time, id, priority });
        self.data_map.insert(id, data);
        self.plan_counter += 1;
        PlanId { id }
    }

    /// Returns true if the plan is still waiting to be executed
    #[must_use]
    pub fn is_pending(&self, id: &PlanId) -> bool {
        self.data_map.contains_key(&id.id)
    }

    /// Retrieve the earliest plan in the queue
    ///
    /// Returns the next plan if it exists or else `None` if the queue is empty
    pub fn get_next_plan(&mut self) -> Option<Plan<T>> {
        let entry = self.queue.pop()?;
        let data = self.data_map.remove(&entry.id)?;
        Some(Plan {
            time: entry.time,
            data,
        })
    }

    /// Number of plans that have been added and not yet retrieved
    #[must_use]
    pub fn remaining_plan_count(&self) -> usize {
        self.data_map.len()
    }
}

impl<T, P: Eq + PartialEq + Ord> Default for Queue<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

/// A time, id, and priority object used to order plans in the `Queue<T, P>`
#[derive(PartialEq, Debug)]
struct Entry<P: Eq + PartialEq + Ord> {
    time: f64,
    id: u64,
    priority: P,
}

impl<P: Eq + PartialEq + Ord> Eq for Entry<P> {}

impl<P: Eq + PartialEq + Ord> PartialOrd for Entry<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Entry objects are ordered in increasing order by time, priority, and then
/// plan id. `BinaryHeap` is a max-heap, so every comparison is reversed.
impl<P: Eq + PartialEq + Ord> Ord for Entry<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Times are validated as finite before they reach the queue
        let time_ordering = self.time.total_cmp(&other.time).reverse();
        match time_ordering {
            Ordering::Equal => match self.priority.cmp(&other.priority).reverse() {
                Ordering::Equal => self.id.cmp(&other.id).reverse(),
                priority_ordering => priority_ordering,
            },
            _ => time_ordering,
        }
    }
}

/// A unique identifier for a plan added to a `Queue<T, P>`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PlanId {
    id: u64,
}

/// A plan that holds data of type `T` intended to be used at the specified time
pub struct Plan<T> {
    pub time: f64,
    pub data: T,
}
