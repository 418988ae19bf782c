use std::{cell::RefCell, rc::Rc};

use assert_call::{call, CallRecorder};

use crate::{core::Runtime, effect, effect_with, spawn_action, Signal, State, TaskKind};

#[test]
#[should_panic(expected = "Only one `Runtime` can exist in the same thread at the same time.")]
fn second_runtime_panics() {
    let _rt0 = Runtime::new();
    let _rt1 = Runtime::new();
}

#[test]
fn runtime_can_be_recreated_after_drop() {
    let rt = Runtime::new();
    drop(rt);
    let mut rt = Runtime::new();
    let s = State::new(1);
    assert_eq!(s.get(&mut rt.sc()), 1);
}

#[test]
#[should_panic(expected = "`Runtime` is not created.")]
fn spawn_action_without_runtime_panics() {
    spawn_action(|_| {});
}

#[test]
fn spawn_action_runs_on_update() {
    let mut rt = Runtime::new();
    let s = State::new(1);
    let s0 = s.clone();
    spawn_action(move |ac| s0.set(2, ac));
    assert_eq!(s.get(&mut rt.sc()), 1);
    assert!(rt.run_actions());
    assert_eq!(s.get(&mut rt.sc()), 2);
    assert!(!rt.run_actions());
}

#[test]
fn action_spawned_from_effect() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let source = State::new(1);
    let target = State::new(0);

    let source0 = source.clone();
    let target0 = target.clone();
    let _e0 = effect(move |sc| {
        let value = source0.get(sc) * 10;
        let target = target0.clone();
        spawn_action(move |ac| target.set(value, ac));
    });
    let target1 = target.clone();
    let _e1 = effect(move |sc| call!("{}", target1.get(sc)));

    rt.update();
    cr.verify(["0", "10"]);

    source.set(2, rt.ac());
    rt.update();
    cr.verify("20");
}

#[test]
fn run_tasks_by_kind() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let render = TaskKind::new(1, "render");
    let layout = TaskKind::new(2, "layout");

    let s = State::new(1);
    let s0 = s.clone();
    let _e0 = effect_with(move |sc| call!("layout {}", s0.get(sc)), layout);
    let s1 = s.clone();
    let _e1 = effect_with(move |sc| call!("render {}", s1.get(sc)), render);

    assert!(rt.run_tasks(Some(render)));
    cr.verify("render 1");
    assert!(!rt.run_tasks(Some(render)));

    s.set(2, rt.ac());
    rt.run_tasks(None);
    cr.verify(["render 2", "layout 2"]);
}

#[test]
fn task_kind_eq_ignores_name() {
    assert_eq!(TaskKind::new(1, "a"), TaskKind::new(1, "b"));
    assert_ne!(TaskKind::new(1, "a"), TaskKind::new(2, "a"));
    assert_eq!(TaskKind::new(3, "render").to_string(), "3: render");
}

#[test]
fn untrack_does_not_add_dependency() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let tracked = State::new(1);
    let untracked = State::new(10);

    let tracked0 = tracked.clone();
    let untracked0 = untracked.clone();
    let _e = effect(move |sc| {
        let a = tracked0.get(sc);
        let b = sc.untrack(|sc| untracked0.get(sc));
        call!("{} {}", a, b);
    });
    rt.update();
    cr.verify("1 10");

    untracked.set(20, rt.ac());
    rt.update();
    cr.verify(());

    tracked.set(2, rt.ac());
    rt.update();
    cr.verify("2 20");
}

#[test]
fn dependency_switch_detaches_old_source() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let flag = State::new(true);
    let a = State::new("a");
    let b = State::new("b");

    let (flag0, a0, b0) = (flag.clone(), a.clone(), b.clone());
    let _e = effect(move |sc| {
        let value = if flag0.get(sc) { a0.get(sc) } else { b0.get(sc) };
        call!("{}", value);
    });
    rt.update();
    cr.verify("a");
    assert_eq!(a.dependent_count(), 1);
    assert_eq!(b.dependent_count(), 0);

    flag.set(false, rt.ac());
    rt.update();
    cr.verify("b");
    assert_eq!(a.dependent_count(), 0);
    assert_eq!(b.dependent_count(), 1);

    a.set("a2", rt.ac());
    rt.update();
    cr.verify(());
}

#[test]
fn signal_chain_propagates() {
    let mut rt = Runtime::new();
    let s = State::new(2);
    let s0 = s.clone();
    let double = Signal::new(move |sc| s0.get(sc) * 2);
    let double0 = double.clone();
    let quad = Signal::new(move |sc| double0.get(sc) * 2);

    assert_eq!(quad.get(&mut rt.sc()), 8);
    s.set(3, rt.ac());
    assert_eq!(quad.get(&mut rt.sc()), 12);
}

#[test]
fn dropped_effect_is_detached_on_next_read() {
    let mut rt = Runtime::new();
    let s = State::new(1);
    let s0 = s.clone();
    let e = effect(move |sc| {
        s0.get(sc);
    });
    rt.update();
    assert_eq!(s.dependent_count(), 1);

    drop(e);
    assert_eq!(s.get(&mut rt.sc()), 1);
    assert_eq!(s.dependent_count(), 0);
}

#[test]
fn reading_twice_adds_one_dependency() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let s = State::new(1);
    let s0 = s.clone();
    let _e = effect(move |sc| call!("{}", s0.get(sc) + s0.get(sc)));
    rt.update();
    cr.verify("2");
    assert_eq!(s.dependent_count(), 1);

    s.set(2, rt.ac());
    rt.update();
    cr.verify("4");
    assert_eq!(s.dependent_count(), 1);
}

#[test]
#[should_panic(expected = "detect cyclic dependency")]
fn cyclic_signal_panics() {
    let mut rt = Runtime::new();
    let cell: Rc<RefCell<Option<Signal<i32>>>> = Rc::new(RefCell::new(None));
    let cell0 = cell.clone();
    let s = Signal::new(move |sc| match &*cell0.borrow() {
        Some(s) => s.get(sc) + 1,
        None => 0,
    });
    *cell.borrow_mut() = Some(s.clone());
    s.get(&mut rt.sc());
}
