// Copyright 2024 Jeremy Wall (Jeremy@marzhilsltudios.com)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use futures::executor::block_on;
use sycamore::reactive::{create_effect, create_ref, create_scope_immediate};

use super::{CallLog, FakeSaved};
use crate::error::Error;
use crate::saved::SavedRecipesStore;

fn store() -> (SavedRecipesStore, Rc<FakeSaved>, CallLog) {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let api = FakeSaved::new(log.clone());
    (SavedRecipesStore::new(api.clone()), api, log)
}

#[test]
fn test_toggle_then_load_reflects_server_state() {
    let (store, _api, _log) = store();
    store.bind_user(Some("U1".to_owned()));

    block_on(store.toggle(42, true)).expect("save succeeds");
    block_on(store.load("U1")).expect("load succeeds");
    assert!(store.contains(42));

    block_on(store.toggle(42, false)).expect("unsave succeeds");
    block_on(store.load("U1")).expect("load succeeds");
    assert!(!store.contains(42));
}

#[test]
fn test_toggle_reloads_instead_of_patching() {
    let (store, api, log) = store();
    store.bind_user(Some("U1".to_owned()));
    // Something else saved 7 on the server since we last looked.
    api.seed("U1", &[7]);

    block_on(store.toggle(42, true)).expect("save succeeds");
    assert_eq!(store.ids(), BTreeSet::from([7, 42]));
    assert_eq!(
        *log.borrow(),
        vec!["set_saved U1 42 true".to_owned(), "get_saved U1".to_owned()]
    );
}

#[test]
fn test_toggle_without_user_is_a_noop() {
    let (store, _api, log) = store();
    block_on(store.toggle(42, true)).expect("no user is not an error");
    assert!(log.borrow().is_empty());
    assert!(store.ids().is_empty());
}

#[test]
fn test_toggle_failure_leaves_set_unchanged() {
    let (store, api, log) = store();
    store.bind_user(Some("U1".to_owned()));
    api.seed("U1", &[1, 2]);
    block_on(store.load("U1")).expect("load succeeds");

    api.fail_set.set(true);
    let result = block_on(store.toggle(2, false));
    assert_eq!(result, Err(Error::Status(500)));
    assert_eq!(store.ids(), BTreeSet::from([1, 2]));
    // No reload after a failed mutation.
    assert_eq!(log.borrow().last().map(String::as_str), Some("set_saved U1 2 false"));
}

#[test]
fn test_load_failure_keeps_known_set() {
    let (store, api, _log) = store();
    store.bind_user(Some("U1".to_owned()));
    api.seed("U1", &[5]);
    block_on(store.load("U1")).expect("load succeeds");

    api.fail_get.set(true);
    assert!(matches!(block_on(store.load("U1")), Err(Error::Network(_))));
    assert_eq!(store.ids(), BTreeSet::from([5]));
}

#[test]
fn test_load_for_another_user_is_discarded() {
    let (store, api, _log) = store();
    store.bind_user(Some("U1".to_owned()));
    api.seed("U2", &[9]);
    block_on(store.load("U2")).expect("load succeeds");
    assert!(store.ids().is_empty());
}

#[test]
fn test_reset_clears_and_unbinds() {
    let (store, api, log) = store();
    store.bind_user(Some("U1".to_owned()));
    api.seed("U1", &[3]);
    block_on(store.load("U1")).expect("load succeeds");

    store.reset();
    assert!(store.ids().is_empty());
    assert_eq!(store.user_id(), None);
    let before = log.borrow().len();
    block_on(store.toggle(3, false)).expect("no user is not an error");
    assert_eq!(log.borrow().len(), before);
}

#[test]
fn test_effects_see_loads_and_resets() {
    create_scope_immediate(|cx| {
        let (store, api, _log) = store();
        let store = create_ref(cx, store);
        let seen = create_ref(cx, RefCell::new(Vec::new()));
        create_effect(cx, move || seen.borrow_mut().push(store.contains(42)));

        store.bind_user(Some("U1".to_owned()));
        api.seed("U1", &[42]);
        block_on(store.load("U1")).expect("load succeeds");
        store.reset();
        // Already empty, nothing to announce.
        store.reset();

        assert_eq!(*seen.borrow(), vec![false, true, false]);
    });
}
