//! A manager for the state of a discrete-event simulation
//!
//! Defines a `Context` that is intended to provide the foundational mechanism
//! for storing and manipulating the state of a given simulation.
use std::any::{Any, TypeId};
use std::collections::VecDeque;
use std::fmt::{Display, Formatter};

use log::trace;

use crate::plan::{PlanId, Queue};
use crate::{HashMap, HashMapExt};

/// The common callback used by multiple `Context` methods for future events
type Callback = dyn FnOnce(&mut Context);

/// A trait for objects that can provide data containers to be held by `Context`
pub trait DataPlugin: Any {
    type DataContainer;

    fn create_data_container() -> Self::DataContainer;
}

/// Defines a new type for storing data in Context.
#[macro_export]
macro_rules! define_data_plugin {
    ($data_plugin:ident, $data_container:ty, $default: expr) => {
        #[derive(Copy, Clone)]
        struct $data_plugin;

        impl $crate::context::DataPlugin for $data_plugin {
            type DataContainer = $data_container;

            fn create_data_container() -> Self::DataContainer {
                $default
            }
        }
    };
}
pub use define_data_plugin;

/// The order in which plans scheduled for the same time are executed.
///
/// Model events run in `Normal`. Observers that must see the state after all
/// model events of an instant run in `Last`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExecutionPhase {
    First,
    Normal,
    Last,
}

impl Display for ExecutionPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

struct PlanData {
    callback: Box<Callback>,
    periodic: bool,
}

/// A manager for the state of a discrete-event simulation
///
/// Provides core simulation services including
/// * Maintaining a notion of time
/// * Scheduling events to occur at some point in the future and executing them
///   at that time
/// * Holding data that can be accessed by simulation modules
///
/// Simulations are constructed out of a series of interacting modules that
/// take turns manipulating the Context through a mutable reference. Modules
/// store data in the simulation using the `DataPlugin` trait that allows them
/// to retrieve data by type.
///
/// The future event list of the simulation is a queue of `Callback` objects -
/// called `plans` - that will assume control of the Context at a future point
/// in time and execute the logic in the associated `FnOnce(&mut Context)`
/// closure. Modules can add plans to this queue through the `Context`.
///
/// The simulation also has a separate callback mechanism. Callbacks
/// fire before the next timed event (even if it is scheduled for the
/// current time). This allows modules to schedule actions for immediate
/// execution but outside of the current iteration of the event loop.
pub struct Context {
    plan_queue: Queue<PlanData, ExecutionPhase>,
    callback_queue: VecDeque<Box<Callback>>,
    data_plugins: HashMap<TypeId, Box<dyn Any>>,
    current_time: f64,
    periodic_plan_count: usize,
    shutdown_requested: bool,
}

impl Context {
    /// Create a new empty `Context`
    #[must_use]
    pub fn new() -> Context {
        Context {
            plan_queue: Queue::new(),
            callback_queue: VecDeque::new(),
            data_plugins: HashMap::new(),
            current_time: 0.0,
            periodic_plan_count: 0,
            shutdown_requested: false,
        }
    }

    /// Add a plan to the future event list at the specified time in the normal
    /// phase
    ///
    /// Returns a `PlanId` for the newly-added plan that can be used to check
    /// whether it is still pending.
    ///
    /// # Panics
    ///
    /// Panics if time is in the past, infinite, or NaN.
    pub fn add_plan(&mut self, time: f64, callback: impl FnOnce(&mut Context) + 'static) -> PlanId {
        self.add_plan_with_phase(time, callback, ExecutionPhase::Normal)
    }

    /// Add a plan to the future event list at the specified time and with the
    /// specified phase (first, normal, or last among plans at the
    /// specified time)
    ///
    /// # Panics
    ///
    /// Panics if time is in the past, infinite, or NaN.
    pub fn add_plan_with_phase(
        &mut self,
        time: f64,
        callback: impl FnOnce(&mut Context) + 'static,
        phase: ExecutionPhase,
    ) -> PlanId {
        self.add_plan_internal(time, Box::new(callback), phase, false)
    }

    fn add_plan_internal(
        &mut self,
        time: f64,
        callback: Box<Callback>,
        phase: ExecutionPhase,
        periodic: bool,
    ) -> PlanId {
        assert!(
            !time.is_nan() && !time.is_infinite() && time >= self.current_time,
            "Time is invalid"
        );
        trace!("adding plan at {time} ({phase})");
        if periodic {
            self.periodic_plan_count += 1;
        }
        self.plan_queue
            .add_plan(time, PlanData { callback, periodic }, phase)
    }

    /// Add a plan that repeats every `period` time units starting now, in the
    /// given phase.
    ///
    /// The plan keeps repeating for as long as at least one non-periodic plan
    /// is waiting in the queue. Occurrence `k` fires at `start + k * period`,
    /// so no rounding error accumulates over long runs.
    ///
    /// # Panics
    ///
    /// Panics if the period is not a positive finite number.
    pub fn add_periodic_plan_with_phase(
        &mut self,
        period: f64,
        callback: impl Fn(&mut Context) + 'static,
        phase: ExecutionPhase,
    ) {
        assert!(
            period > 0.0 && period.is_finite(),
            "Period must be a positive finite number"
        );
        let start = self.current_time;
        self.schedule_periodic(start, 0, period, std::rc::Rc::new(callback), phase);
    }

    fn schedule_periodic(
        &mut self,
        start: f64,
        occurrence: u64,
        period: f64,
        callback: std::rc::Rc<dyn Fn(&mut Context)>,
        phase: ExecutionPhase,
    ) {
        #[allow(clippy::cast_precision_loss)]
        let time = start + occurrence as f64 * period;
        self.add_plan_internal(
            time,
            Box::new(move |context: &mut Context| {
                callback(context);
                if context.has_non_periodic_plans() {
                    context.schedule_periodic(start, occurrence + 1, period, callback, phase);
                }
            }),
            phase,
            true,
        );
    }

    /// Returns true if the plan has not fired yet
    #[must_use]
    pub fn is_plan_pending(&self, plan_id: &PlanId) -> bool {
        self.plan_queue.is_pending(plan_id)
    }

    /// Number of plans, periodic or not, waiting in the queue
    #[must_use]
    pub fn remaining_plan_count(&self) -> usize {
        self.plan_queue.remaining_plan_count()
    }

    fn has_non_periodic_plans(&self) -> bool {
        self.plan_queue.remaining_plan_count() > self.periodic_plan_count
    }

    /// Add a `Callback` to the queue to be executed before the next plan
    pub fn queue_callback(&mut self, callback: impl FnOnce(&mut Context) + 'static) {
        trace!("queuing callback");
        self.callback_queue.push_back(Box::new(callback));
    }

    /// Retrieve a mutable reference to the data container associated with a
    /// `DataPlugin`
    ///
    /// If the data container has not been already added to the `Context` then
    /// this function will use the `DataPlugin::create_data_container` method
    /// to construct a new data container and store it in the `Context`.
    ///
    /// Returns a mutable reference to the data container
    #[must_use]
    #[allow(clippy::missing_panics_doc)]
    pub fn get_data_mut<T: DataPlugin>(&mut self, _plugin: T) -> &mut T::DataContainer {
        self.data_plugins
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::create_data_container()))
            .downcast_mut::<T::DataContainer>()
            .unwrap() // Will never panic as data container has the matching type
    }

    /// Retrieve a reference to the data container associated with a
    /// `DataPlugin`
    ///
    /// Returns a reference to the data container if it exists or else `None`
    #[must_use]
    pub fn get_data<T: DataPlugin>(&self, _plugin: T) -> Option<&T::DataContainer> {
        self.data_plugins
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T::DataContainer>())
    }

    /// Get the current time in the simulation
    ///
    /// Returns the current time
    #[must_use]
    pub fn get_current_time(&self) -> f64 {
        self.current_time
    }

    /// Request that the simulation stop after the currently executing plan or
    /// callback. Any plans still in the queue are left unexecuted.
    pub fn shutdown(&mut self) {
        trace!("shutdown requested at {}", self.current_time);
        self.shutdown_requested = true;
    }

    /// Returns true if `shutdown` has been called
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    /// Execute the simulation until there are no more plans to process or
    /// `shutdown` is called
    pub fn execute(&mut self) {
        trace!("entering event loop");
        loop {
            if self.shutdown_requested {
                break;
            }

            // If there is a callback, run it.
            if let Some(callback) = self.callback_queue.pop_front() {
                trace!("calling callback");
                callback(self);
                continue;
            }

            // There aren't any callbacks, so look at the first plan.
            if let Some(plan) = self.plan_queue.get_next_plan() {
                trace!("calling plan at {:.6}", plan.time);
                self.current_time = plan.time;
                if plan.data.periodic {
                    self.periodic_plan_count -= 1;
                }
                (plan.data.callback)(self);
            } else {
                trace!("No callbacks or plans; exiting event loop");
                // OK, there aren't any plans, so we're done.
                break;
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    define_data_plugin!(ComponentA, Vec<u32>, vec![]);

    fn add_plan(context: &mut Context, time: f64, value: u32) -> PlanId {
        context.add_plan(time, move |context| {
            context.get_data_mut(ComponentA).push(value);
        })
    }

    fn add_plan_with_phase(
        context: &mut Context,
        time: f64,
        value: u32,
        phase: ExecutionPhase,
    ) -> PlanId {
        context.add_plan_with_phase(
            time,
            move |context| {
                context.get_data_mut(ComponentA).push(value);
            },
            phase,
        )
    }

    fn recorded(context: &Context) -> Vec<u32> {
        context.get_data(ComponentA).cloned().unwrap_or_default()
    }

    #[test]
    #[should_panic(expected = "Time is invalid")]
    fn negative_plan_time() {
        let mut context = Context::new();
        add_plan(&mut context, -1.0, 0);
    }

    #[test]
    #[should_panic(expected = "Time is invalid")]
    fn infinite_plan_time() {
        let mut context = Context::new();
        add_plan(&mut context, f64::INFINITY, 0);
    }

    #[test]
    #[should_panic(expected = "Time is invalid")]
    fn nan_plan_time() {
        let mut context = Context::new();
        add_plan(&mut context, f64::NAN, 0);
    }

    #[test]
    fn empty_context() {
        let mut context = Context::new();
        context.execute();
        assert_eq!(context.get_current_time(), 0.0);
        assert!(context.get_data(ComponentA).is_none());
    }

    #[test]
    fn timed_plan_only() {
        let mut context = Context::new();
        add_plan(&mut context, 1.0, 1);
        context.execute();
        assert_eq!(context.get_current_time(), 1.0);
        assert_eq!(recorded(&context), vec![1]);
    }

    #[test]
    fn callback_before_timed_plan() {
        let mut context = Context::new();
        context.queue_callback(|context| {
            context.get_data_mut(ComponentA).push(1);
        });
        add_plan(&mut context, 1.0, 2);
        context.execute();
        assert_eq!(context.get_current_time(), 1.0);
        assert_eq!(recorded(&context), vec![1, 2]);
    }

    #[test]
    fn timed_plan_adds_callback_and_timed_plan() {
        let mut context = Context::new();
        context.add_plan(1.0, |context| {
            context.get_data_mut(ComponentA).push(1);
            // We add the plan first, but the callback will fire first.
            add_plan(context, 2.0, 3);
            context.queue_callback(|context| {
                context.get_data_mut(ComponentA).push(2);
            });
        });
        context.execute();
        assert_eq!(context.get_current_time(), 2.0);
        assert_eq!(recorded(&context), vec![1, 2, 3]);
    }

    #[test]
    fn executed_plan_is_not_pending() {
        let mut context = Context::new();
        let later = add_plan(&mut context, 2.0, 2);
        context.add_plan(1.0, move |context| {
            assert!(context.is_plan_pending(&later));
            assert_eq!(context.remaining_plan_count(), 1);
        });
        context.execute();
        assert!(!context.is_plan_pending(&later));
        assert_eq!(context.remaining_plan_count(), 0);
        assert_eq!(recorded(&context), vec![2]);
    }

    #[test]
    fn plans_at_same_time_follow_phase() {
        let mut context = Context::new();
        add_plan_with_phase(&mut context, 1.0, 1, ExecutionPhase::Last);
        add_plan_with_phase(&mut context, 1.0, 2, ExecutionPhase::Normal);
        add_plan_with_phase(&mut context, 1.0, 3, ExecutionPhase::First);
        add_plan_with_phase(&mut context, 1.0, 4, ExecutionPhase::Normal);
        context.execute();
        assert_eq!(recorded(&context), vec![3, 2, 4, 1]);
    }

    #[test]
    fn shutdown_leaves_later_plans() {
        let mut context = Context::new();
        add_plan(&mut context, 1.0, 1);
        context.add_plan(2.0, Context::shutdown);
        add_plan(&mut context, 3.0, 3);
        context.execute();
        assert!(context.is_shutdown_requested());
        assert_eq!(context.get_current_time(), 2.0);
        assert_eq!(recorded(&context), vec![1]);
    }

    #[test]
    fn periodic_plan_runs_while_other_plans_remain() {
        let mut context = Context::new();
        context.add_periodic_plan_with_phase(
            1.0,
            |context| {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let t = context.get_current_time() as u32;
                context.get_data_mut(ComponentA).push(t);
            },
            ExecutionPhase::Last,
        );
        add_plan(&mut context, 3.0, 100);
        context.execute();
        // The plan at 3.0 runs in the normal phase before the periodic sample at 3.0
        assert_eq!(recorded(&context), vec![0, 1, 2, 100, 3]);
        assert_eq!(context.remaining_plan_count(), 0);
    }

    #[test]
    fn periodic_plan_alone_runs_once() {
        let mut context = Context::new();
        context.add_periodic_plan_with_phase(
            0.5,
            |context| context.get_data_mut(ComponentA).push(7),
            ExecutionPhase::Normal,
        );
        context.execute();
        assert_eq!(recorded(&context), vec![7]);
        assert_eq!(context.get_current_time(), 0.0);
    }

    #[test]
    #[should_panic(expected = "Period must be a positive finite number")]
    fn zero_period() {
        let mut context = Context::new();
        context.add_periodic_plan_with_phase(0.0, |_| {}, ExecutionPhase::Normal);
    }
}
