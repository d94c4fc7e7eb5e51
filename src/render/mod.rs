// ============================================================================
// spark-map-state - Render Boundary
// Mount a render function, re-run it when what it read changes
// ============================================================================
//
// A root is a synchronous effect around a render function. Whatever the
// render reads through tracked getters (a container snapshot, a signal)
// becomes a dependency, so each publish re-renders the root once. Hook state
// lives in the root and is dropped on unmount.
// ============================================================================

mod hooks;

pub use hooks::Hooks;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::core::constants::*;
use crate::primitives::effect::{create_effect, destroy_effect, EffectInner};
use crate::primitives::signal::Signal;
use crate::reactivity::batching::{batch, tick};

struct RootInner<R> {
    hooks: RefCell<Hooks>,
    output: RefCell<Option<R>>,
    renders: Cell<u64>,
    force: Signal<u64>,
}

/// A mounted render function.
///
/// Dropping the root unmounts it.
pub struct RenderRoot<R> {
    inner: Rc<RootInner<R>>,
    effect: RefCell<Option<Rc<EffectInner>>>,
}

/// Mount `render` and run it once before returning.
///
/// # Example
///
/// ```
/// use spark_map_state::{act, render_root};
///
/// let root = render_root(|hooks| {
///     let state = hooks.use_map::<u32, &str>(|| Some(vec![(1, "default")].into()));
///     state.parts()
/// });
///
/// let (_, actions) = root.current();
/// act(|| actions.set(1, "changed"));
///
/// assert_eq!(root.current().0.get(&1), Some(&"changed"));
/// assert_eq!(root.render_count(), 2);
/// ```
pub fn render_root<R, F>(mut render: F) -> RenderRoot<R>
where
    R: 'static,
    F: FnMut(&mut Hooks) -> R + 'static,
{
    let inner = Rc::new(RootInner {
        hooks: RefCell::new(Hooks::new()),
        output: RefCell::new(None),
        renders: Cell::new(0),
        force: Signal::new(0),
    });

    let effect = create_effect(
        EFFECT,
        Box::new({
            let inner = inner.clone();
            move || {
                inner.force.get();

                let output = {
                    let mut hooks = inner.hooks.borrow_mut();
                    hooks.begin();
                    let output = render(&mut hooks);
                    hooks.finish();
                    output
                };
                *inner.output.borrow_mut() = Some(output);

                let renders = inner.renders.get() + 1;
                inner.renders.set(renders);
                tracing::trace!(renders, "root rendered");
                None
            }
        }),
        true,
    );

    tracing::debug!(slots = inner.hooks.borrow().len(), "root mounted");
    RenderRoot {
        inner,
        effect: RefCell::new(Some(effect)),
    }
}

impl<R> RenderRoot<R> {
    /// Output of the latest render.
    pub fn current(&self) -> R
    where
        R: Clone,
    {
        self.with_current(R::clone)
    }

    /// Borrow the output of the latest render.
    pub fn with_current<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        match self.inner.output.borrow().as_ref() {
            Some(output) => f(output),
            None => panic!("render root has no output; the first render did not complete"),
        }
    }

    /// Number of completed renders, including the mount.
    pub fn render_count(&self) -> u64 {
        self.inner.renders.get()
    }

    /// Render again even though nothing it read changed.
    pub fn rerender(&self) {
        if self.is_mounted() {
            self.inner.force.update(|n| *n += 1);
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.effect.borrow().is_some()
    }

    /// Stop rendering and drop hook state. The last output stays readable.
    pub fn unmount(&self) {
        let effect = self.effect.borrow_mut().take();
        if let Some(effect) = effect {
            destroy_effect(effect);
            self.inner.hooks.borrow_mut().clear();
            tracing::debug!(renders = self.inner.renders.get(), "root unmounted");
        }
    }
}

impl<R> Drop for RenderRoot<R> {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl<R> std::fmt::Debug for RenderRoot<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderRoot")
            .field("mounted", &self.is_mounted())
            .field("renders", &self.render_count())
            .finish()
    }
}

/// Run `f` as one unit of interaction: its publishes are batched, and every
/// root they affect has re-rendered by the time `act` returns.
pub fn act<T>(f: impl FnOnce() -> T) -> T {
    let result = batch(f);
    tick();
    result
}
