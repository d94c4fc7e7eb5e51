use spark_map_state::{
    act, batch, effect, render_root, MapStateOptions, PublishPolicy, Snapshot,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[test]
fn each_publish_renders_once() {
    let root = render_root(|hooks| {
        let state = hooks.use_map::<&str, u32>(|| None);
        (state.snapshot().len(), state.actions().clone())
    });
    let (_, actions) = root.current();

    actions.set("a", 1);
    actions.set("b", 2);
    assert_eq!(root.render_count(), 3);
    assert_eq!(root.current().0, 2);
}

#[test]
fn act_batches_into_one_render() {
    let root = render_root(|hooks| hooks.use_map::<u32, u32>(|| None).parts());
    let (_, actions) = root.current();

    act(|| {
        for i in 0..5 {
            actions.set(i, i * i);
        }
        actions.delete(&0);
    });

    assert_eq!(root.render_count(), 2);
    assert_eq!(root.current().0.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
}

#[test]
fn two_roots_share_one_container() {
    let shared = spark_map_state::create_container::<u32, &str>(None);

    let left = render_root({
        let shared = shared.clone();
        move |_| shared.snapshot()
    });
    let right = render_root({
        let shared = shared.clone();
        move |_| shared.snapshot()
    });

    act(|| shared.actions().set(1, "one"));

    assert!(Snapshot::ptr_eq(&left.current(), &right.current()));
    assert_eq!(left.render_count(), 2);
    assert_eq!(right.render_count(), 2);
}

#[test]
fn init_runs_on_first_render_only() {
    let inits = Rc::new(Cell::new(0));
    let root = render_root({
        let inits = inits.clone();
        move |hooks| {
            let state = hooks.use_map::<u32, &str>(|| {
                inits.set(inits.get() + 1);
                Some(vec![(1, "seed")].into())
            });
            state.parts()
        }
    });

    let (_, actions) = root.current();
    act(|| actions.set(2, "more"));
    root.rerender();

    assert_eq!(inits.get(), 1);
    assert_eq!(root.current().0.len(), 2);
}

#[test]
fn init_reading_a_signal_does_not_subscribe() {
    let seed = spark_map_state::signal(vec![(1u32, 1u32)]);
    let root = render_root({
        let seed = seed.clone();
        move |hooks| {
            let seed = seed.clone();
            hooks.use_map::<u32, u32>(move || Some(seed.get().into())).parts()
        }
    });

    seed.set(vec![(2, 2)]);

    assert_eq!(root.render_count(), 1);
    assert_eq!(root.current().0.to_vec(), vec![(1, 1)]);
}

#[test]
fn use_signal_alongside_use_map() {
    let root = render_root(|hooks| {
        let filter = hooks.use_signal(|| 0u32);
        let state = hooks.use_map::<u32, &str>(|| Some(vec![(1, "a"), (2, "b"), (3, "c")].into()));
        let min = filter.get();
        let visible: Vec<u32> = state.snapshot().keys().copied().filter(|k| *k > min).collect();
        (visible, filter, state)
    });

    let (_, filter, state) = root.current();
    act(|| filter.set(1));
    assert_eq!(root.current().0, vec![2, 3]);

    act(|| state.actions().delete(&3));
    assert_eq!(root.current().0, vec![2]);
    assert_eq!(root.render_count(), 3);
}

#[test]
fn skip_noop_policy_avoids_render() {
    let root = render_root(|hooks| {
        hooks
            .use_map_with_options::<u32, u32>(
                || None,
                || MapStateOptions::new().label("todo").publish_policy(PublishPolicy::SkipNoop),
            )
            .parts()
    });
    let (_, actions) = root.current();

    act(|| actions.delete(&9));
    act(|| actions.clear());
    assert_eq!(root.render_count(), 1);

    act(|| actions.set(9, 9));
    assert_eq!(root.render_count(), 2);
}

#[test]
fn unmount_drops_owned_containers() {
    let root = render_root(|hooks| hooks.use_map::<u32, u32>(|| None).parts());
    let (_, actions) = root.current();

    root.unmount();
    root.unmount();

    // The action set outlives the root and still works on its own store
    actions.set(1, 1);
    assert_eq!(root.render_count(), 1);
    assert!(!root.is_mounted());
}

#[test]
fn dropping_root_stops_rendering() {
    let renders = Rc::new(Cell::new(0));
    let state = spark_map_state::create_container::<u32, u32>(None);

    {
        let _root = render_root({
            let (state, renders) = (state.clone(), renders.clone());
            move |_| {
                let _ = state.snapshot();
                renders.set(renders.get() + 1);
            }
        });
        state.actions().set(1, 1);
    }

    state.actions().set(2, 2);
    assert_eq!(renders.get(), 2);
}

#[test]
fn effect_and_root_observe_the_same_publishes() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let root = render_root(|hooks| hooks.use_map::<u32, u32>(|| None));
    let state = root.current();

    let _dispose = effect({
        let (state, log) = (state.clone(), log.clone());
        move || log.borrow_mut().push(state.snapshot().len())
    });

    batch(|| {
        state.actions().set(1, 1);
        state.actions().set(2, 2);
    });

    assert_eq!(*log.borrow(), vec![0, 2]);
}

#[test]
#[should_panic(expected = "Maximum update depth exceeded")]
fn setting_state_on_every_render_is_detected() {
    let root = render_root(|hooks| {
        let state = hooks.use_map::<u32, u32>(|| None);
        let len = state.snapshot().len() as u32;
        if len > 0 {
            state.actions().set(len, len);
        }
        state
    });

    root.current().actions().set(0, 0);
}
