use assert_call::{call, CallRecorder};
use serde::{Deserialize, Serialize};

use crate::{core::Runtime, effect, Store, TaskKind};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Pair {
    a: i32,
    b: i32,
}

#[test]
fn select() {
    let mut rt = Runtime::new();
    let store = Store::new(Pair { a: 1, b: 2 });
    let a = store.select(|p| p.a);
    assert_eq!(a.get(&mut rt.sc()), 1);

    store.update(rt.ac(), |p| p.a = 10);
    assert_eq!(a.get(&mut rt.sc()), 10);
}

#[test]
fn subscribe_runs_with_initial_value() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let store = Store::new(Pair { a: 1, b: 2 });
    let _s = store.subscribe(|p| p.a, |a| call!("a = {}", a));
    cr.verify(());
    rt.update();
    cr.verify("a = 1");
}

#[test]
fn subscribe_ignores_unrelated_changes() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let store = Store::new(Pair { a: 1, b: 2 });
    let _a = store.subscribe(|p| p.a, |a| call!("a = {}", a));
    let _b = store.subscribe(|p| p.b, |b| call!("b = {}", b));
    rt.update();
    cr.verify(["a = 1", "b = 2"]);

    store.update(rt.ac(), |p| p.b = 3);
    rt.update();
    cr.verify("b = 3");

    store.update(rt.ac(), |p| p.a = 5);
    rt.update();
    cr.verify("a = 5");
}

#[test]
fn subscribe_ignores_change_and_revert() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let store = Store::new(Pair { a: 1, b: 2 });
    let _s = store.subscribe(|p| p.a + p.b, |sum| call!("sum = {}", sum));
    rt.update();
    cr.verify("sum = 3");

    store.update(rt.ac(), |p| {
        p.a = 2;
        p.b = 1;
    });
    rt.update();
    cr.verify(());
}

#[test]
fn subscribe_stops_after_drop() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let store = Store::new(Pair::default());
    let s = store.subscribe(|p| p.a, |a| call!("a = {}", a));
    rt.update();
    cr.verify("a = 0");

    drop(s);
    store.update(rt.ac(), |p| p.a = 1);
    rt.update();
    cr.verify(());
}

#[test]
fn subscribe_with_kind() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let kind = TaskKind::new(3, "render");
    let store = Store::new(Pair::default());
    let _s = store.subscribe_with(|p| p.a, |a| call!("a = {}", a), kind);

    rt.run_tasks(Some(TaskKind::default()));
    cr.verify(());
    rt.run_tasks(Some(kind));
    cr.verify("a = 0");
}

#[test]
fn update_always_notifies_readers() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let store = Store::new(Pair::default());
    let s = store.clone();
    let _e = effect(move |sc| call!("{}", s.read(sc, |p| p.a)));
    rt.update();
    cr.verify("0");

    store.update(rt.ac(), |p| p.a = 0);
    rt.update();
    cr.verify("0");
}

#[test]
fn update_dedup_notifies_only_on_change() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let store = Store::new(Pair::default());
    let s = store.clone();
    let _e = effect(move |sc| call!("{}", s.read(sc, |p| p.a)));
    rt.update();
    cr.verify("0");

    store.update_dedup(rt.ac(), |p| p.a = 0);
    rt.update();
    cr.verify(());

    store.update_dedup(rt.ac(), |p| p.a = 7);
    rt.update();
    cr.verify("7");
}

#[test]
fn update_returns_closure_result() {
    let mut rt = Runtime::new();
    let store = Store::new(Pair { a: 1, b: 2 });
    let old = store.update(rt.ac(), |p| std::mem::replace(&mut p.a, 4));
    assert_eq!(old, 1);
    assert_eq!(store.borrow(&mut rt.sc()).a, 4);
}

#[test]
fn replace() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let store = Store::new(Pair::default());
    let _s = store.subscribe(|p| p.clone(), |p| call!("{:?}", p));
    rt.update();
    cr.verify("Pair { a: 0, b: 0 }");

    store.replace(Pair { a: 1, b: 1 }, rt.ac());
    rt.update();
    cr.verify("Pair { a: 1, b: 1 }");
}

#[test]
fn snapshot_is_untracked() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let store = Store::new(Pair::default());
    let s = store.clone();
    let _e = effect(move |sc| call!("{}", s.snapshot(sc).a));
    rt.update();
    cr.verify("0");

    store.update(rt.ac(), |p| p.a = 1);
    rt.update();
    cr.verify(());
    assert_eq!(store.dependent_count(), 0);
}

#[test]
fn dependent_count() {
    let mut rt = Runtime::new();
    let store = Store::new(Pair::default());
    let a = store.subscribe(|p| p.a, |_| {});
    let b = store.subscribe(|p| p.b, |_| {});
    assert_eq!(store.dependent_count(), 0);

    rt.update();
    assert_eq!(store.dependent_count(), 2);

    drop(a);
    rt.update();
    assert_eq!(store.dependent_count(), 1);

    drop(b);
    rt.update();
    assert_eq!(store.dependent_count(), 0);
}

#[test]
fn serde_is_transparent() {
    let store = Store::new(Pair { a: 1, b: 2 });
    let json = serde_json::to_string(&store).unwrap();
    assert_eq!(json, r#"{"a":1,"b":2}"#);

    let store: Store<Pair> = serde_json::from_str(r#"{"a":3,"b":4}"#).unwrap();
    assert_eq!(format!("{store:?}"), "Pair { a: 3, b: 4 }");
}
