// ============================================================================
// spark-map-state - Signal Primitive
// A writable reactive cell; the substrate of the snapshot store
// ============================================================================

use std::rc::Rc;

use crate::core::types::{AnySource, EqualsFn, SourceInner};
use crate::reactivity::batching::untrack;
use crate::reactivity::tracking::{notify_write, track_read};

/// A reactive signal holding a value of type T.
///
/// Cloning a `Signal` clones the handle; both clones see the same cell.
///
/// # Example
///
/// ```
/// use spark_map_state::signal;
///
/// let count = signal(0);
/// assert_eq!(count.get(), 0);
///
/// count.set(5);
/// assert_eq!(count.get(), 5);
/// ```
pub struct Signal<T> {
    inner: Rc<SourceInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Signal<T> {
    pub fn new(value: T) -> Self
    where
        T: PartialEq + 'static,
    {
        Self {
            inner: Rc::new(SourceInner::new(value)),
        }
    }

    pub fn new_with_equals(value: T, equals: EqualsFn<T>) -> Self
    where
        T: 'static,
    {
        Self {
            inner: Rc::new(SourceInner::new_with_equals(value, equals)),
        }
    }

    /// Get the current value (cloning), registering a dependency when
    /// called inside an effect.
    pub fn get(&self) -> T
    where
        T: Clone + 'static,
    {
        track_read(self.inner.clone() as Rc<dyn AnySource>);
        self.inner.get()
    }

    /// Get the current value without registering a dependency.
    pub fn peek(&self) -> T
    where
        T: Clone + 'static,
    {
        untrack(|| self.inner.get())
    }

    /// Access the current value by reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R
    where
        T: 'static,
    {
        track_read(self.inner.clone() as Rc<dyn AnySource>);
        self.inner.with(f)
    }

    /// Set the value. Returns true if it changed according to the signal's
    /// equality; unchanged writes notify nobody.
    pub fn set(&self, value: T) -> bool
    where
        T: 'static,
    {
        let changed = self.inner.set(value);
        if changed {
            notify_write(self.inner.clone() as Rc<dyn AnySource>);
        }
        changed
    }

    /// Mutate the value in place.
    pub fn update(&self, f: impl FnOnce(&mut T))
    where
        T: 'static,
    {
        let had_reactions = self.inner.update(f);
        if had_reactions {
            notify_write(self.inner.clone() as Rc<dyn AnySource>);
        }
    }

    pub fn inner(&self) -> &Rc<SourceInner<T>> {
        &self.inner
    }

    /// Get the inner source as a type-erased AnySource.
    pub fn as_any_source(&self) -> Rc<dyn AnySource>
    where
        T: 'static,
    {
        self.inner.clone()
    }
}

impl<T: std::fmt::Debug + 'static> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner
            .with(|value| f.debug_struct("Signal").field("value", value).finish())
    }
}

/// Create a new reactive signal.
pub fn signal<T>(value: T) -> Signal<T>
where
    T: PartialEq + 'static,
{
    Signal::new(value)
}

/// Create a signal with a custom equality function.
///
/// # Example
///
/// ```
/// use spark_map_state::signal_with_equals;
///
/// let always_notify = signal_with_equals(0, |_, _| false);
/// assert!(always_notify.set(0));
/// ```
pub fn signal_with_equals<T>(value: T, equals: EqualsFn<T>) -> Signal<T>
where
    T: 'static,
{
    Signal::new_with_equals(value, equals)
}
