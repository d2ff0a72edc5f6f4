//! The `Context` owns every piece of simulation state and the plan queue.
//!
//! Modules keep their state in data containers registered through
//! [`define_data_plugin!`] and expose behavior through extension traits
//! implemented on `Context`. Time is measured in whole days; plans are
//! callbacks that run when the clock reaches their day.
use std::any::{Any, TypeId};
use std::collections::VecDeque;
use std::rc::Rc;

use log::trace;

use crate::plan::Queue;
use crate::{HashMap, HashMapExt};

/// A trait for objects that can provide data containers to be held by `Context`
pub trait DataPlugin: Any {
    type DataContainer;

    fn create_data_container() -> Self::DataContainer;
}

/// Defines a new type for storing data in Context.
#[macro_export]
macro_rules! define_data_plugin {
    ($plugin:ident, $data_container:ty, $default: expr) => {
        struct $plugin;

        impl $crate::context::DataPlugin for $plugin {
            type DataContainer = $data_container;

            fn create_data_container() -> Self::DataContainer {
                $default
            }
        }
    };
}
pub use define_data_plugin;

type Callback = dyn FnOnce(&mut Context);
type EventHandler<E> = dyn Fn(&mut Context, E);

pub struct Context {
    plan_queue: Queue<Box<Callback>>,
    callback_queue: VecDeque<Box<Callback>>,
    event_handlers: HashMap<TypeId, Box<dyn Any>>,
    data_plugins: HashMap<TypeId, Box<dyn Any>>,
    current_day: u32,
}

impl Context {
    #[must_use]
    pub fn new() -> Context {
        Context {
            plan_queue: Queue::new(),
            callback_queue: VecDeque::new(),
            event_handlers: HashMap::new(),
            data_plugins: HashMap::new(),
            current_day: 0,
        }
    }

    /// Add a plan to run when the clock reaches `day`.
    ///
    /// # Panics
    ///
    /// Panics if `day` is already in the past.
    pub fn add_plan(&mut self, day: u32, callback: impl FnOnce(&mut Context) + 'static) {
        assert!(day >= self.current_day, "Invalid day value");
        trace!("adding plan at {day}");
        self.plan_queue.add_plan(day, Box::new(callback));
    }

    /// Register to handle emission of events of type `E`. Handlers run as
    /// callbacks, after the code that emitted the event has returned.
    pub fn subscribe_to_event<E: Copy + 'static>(
        &mut self,
        handler: impl Fn(&mut Context, E) + 'static,
    ) {
        let handler_vec = self
            .event_handlers
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::<Vec<Rc<EventHandler<E>>>>::default());
        if let Some(handler_vec) = handler_vec.downcast_mut::<Vec<Rc<EventHandler<E>>>>() {
            handler_vec.push(Rc::new(handler));
        }
    }

    /// Emit an event of type `E` to be handled by every subscriber, in
    /// subscription order.
    pub fn emit_event<E: Copy + 'static>(&mut self, event: E) {
        let Context {
            event_handlers,
            callback_queue,
            ..
        } = self;
        let Some(handlers) = event_handlers
            .get(&TypeId::of::<E>())
            .and_then(|handlers| handlers.downcast_ref::<Vec<Rc<EventHandler<E>>>>())
        else {
            return;
        };
        for handler in handlers {
            let handler = Rc::clone(handler);
            callback_queue.push_back(Box::new(move |context: &mut Context| handler(context, event)));
        }
    }

    /// Number of plans that have not yet run.
    #[must_use]
    pub fn remaining_plan_count(&self) -> usize {
        self.plan_queue.len()
    }

    fn add_plugin<T: DataPlugin>(&mut self) {
        self.data_plugins
            .insert(TypeId::of::<T>(), Box::new(T::create_data_container()));
    }

    /// Returns the data container for plugin `T`, creating it on first use.
    #[allow(clippy::missing_panics_doc)]
    pub fn get_data_container_mut<T: DataPlugin>(&mut self, _plugin: T) -> &mut T::DataContainer {
        let type_id = TypeId::of::<T>();
        if !self.data_plugins.contains_key(&type_id) {
            self.add_plugin::<T>();
        }
        self.data_plugins
            .get_mut(&type_id)
            .and_then(|container| container.downcast_mut::<T::DataContainer>())
            .expect("data plugin container has the wrong type")
    }

    /// Returns the data container for plugin `T` if it has been created.
    #[must_use]
    pub fn get_data_container<T: DataPlugin>(&self, _plugin: T) -> Option<&T::DataContainer> {
        self.data_plugins
            .get(&TypeId::of::<T>())
            .and_then(|container| container.downcast_ref::<T::DataContainer>())
    }

    #[must_use]
    pub fn get_current_day(&self) -> u32 {
        self.current_day
    }

    /// Runs queued callbacks and every plan due on or before `day`, in order,
    /// then leaves the clock on `day`.
    ///
    /// # Panics
    ///
    /// Panics if `day` is earlier than the current day.
    pub fn execute_through(&mut self, day: u32) {
        assert!(day >= self.current_day, "Invalid day value");
        loop {
            // If there is a callback, run it.
            if let Some(callback) = self.callback_queue.pop_front() {
                callback(self);
                continue;
            }

            // There aren't any callbacks, so look at the first plan.
            match self.plan_queue.next_day() {
                Some(next_day) if next_day <= day => {
                    if let Some(plan) = self.plan_queue.get_next_plan() {
                        self.current_day = plan.day;
                        (plan.data)(self);
                    }
                }
                _ => break,
            }
        }
        self.current_day = day;
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
