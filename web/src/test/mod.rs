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
//! Fakes for the dashboard's collaborators and a harness wiring them up.
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::task::LocalSpawn;
use sycamore::reactive::Scope;

use client_api::{RecipeDetail, RecipeId, SaveRecipeRequest};

use crate::config::DashboardConfig;
use crate::controller::{Collaborators, DashboardController};
use crate::error::Error;
use crate::session::{AuthProvider, Session, SessionCallback, SessionStore, SessionUser, Subscription};
use crate::store::{Navigator, RecipeStore, SavedRecipeStore, UserStore};

mod error;
mod saved;

pub type CallLog = Rc<RefCell<Vec<String>>>;

pub fn session_for(user_id: &str) -> Session {
    Session {
        access_token: format!("token-{}", user_id),
        refresh_token: None,
        user: SessionUser {
            id: user_id.to_owned(),
            email: None,
            display_name: None,
        },
        expires_at: Utc::now() + Duration::hours(1),
    }
}

pub fn spawner_for(pool: &LocalPool) -> Rc<dyn LocalSpawn> {
    Rc::new(pool.spawner())
}

type PendingRecipe = (RecipeId, oneshot::Sender<Result<RecipeDetail, Error>>);

#[derive(Default)]
pub struct FakeRecipes {
    /// When set every fetch waits until the test resolves it.
    pub gated: Cell<bool>,
    pub recipes: RefCell<BTreeMap<RecipeId, RecipeDetail>>,
    pending: RefCell<Vec<PendingRecipe>>,
    pub calls: RefCell<Vec<RecipeId>>,
}

impl FakeRecipes {
    pub fn with_recipes(recipes: Vec<RecipeDetail>) -> Rc<Self> {
        let fake = Self::default();
        for r in recipes {
            fake.recipes.borrow_mut().insert(r.id, r);
        }
        Rc::new(fake)
    }

    pub fn gated() -> Rc<Self> {
        let fake = Self::default();
        fake.gated.set(true);
        Rc::new(fake)
    }

    /// Complete the oldest outstanding fetch for `id`.
    pub fn resolve(&self, id: RecipeId, result: Result<RecipeDetail, Error>) {
        let mut pending = self.pending.borrow_mut();
        let idx = pending
            .iter()
            .position(|(pending_id, _)| *pending_id == id)
            .expect("There should be a pending fetch for this id");
        let (_, tx) = pending.remove(idx);
        tx.send(result).expect("The fetch should still be waiting");
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }
}

#[async_trait(?Send)]
impl RecipeStore for FakeRecipes {
    async fn get_recipe(&self, id: RecipeId) -> Result<RecipeDetail, Error> {
        self.calls.borrow_mut().push(id);
        if self.gated.get() {
            let (tx, rx) = oneshot::channel();
            self.pending.borrow_mut().push((id, tx));
            return rx
                .await
                .unwrap_or_else(|_| Err(Error::Network("dropped".to_owned())));
        }
        self.recipes
            .borrow()
            .get(&id)
            .cloned()
            .ok_or(Error::Status(404))
    }
}

#[derive(Default)]
pub struct FakeSaved {
    pub saved: RefCell<BTreeMap<String, BTreeSet<RecipeId>>>,
    pub fail_get: Cell<bool>,
    pub fail_set: Cell<bool>,
    pub log: CallLog,
}

impl FakeSaved {
    pub fn new(log: CallLog) -> Rc<Self> {
        Rc::new(Self {
            log,
            ..Default::default()
        })
    }

    pub fn seed(&self, user_id: &str, ids: &[RecipeId]) {
        self.saved
            .borrow_mut()
            .insert(user_id.to_owned(), ids.iter().cloned().collect());
    }
}

#[async_trait(?Send)]
impl SavedRecipeStore for FakeSaved {
    async fn get_saved_recipes(&self, user_id: &str) -> Result<BTreeSet<RecipeId>, Error> {
        self.log.borrow_mut().push(format!("get_saved {}", user_id));
        if self.fail_get.get() {
            return Err(Error::Network("saved recipes unavailable".to_owned()));
        }
        Ok(self
            .saved
            .borrow()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_saved(&self, request: &SaveRecipeRequest) -> Result<(), Error> {
        self.log.borrow_mut().push(format!(
            "set_saved {} {} {}",
            request.user_id, request.recipe_id, request.save
        ));
        if self.fail_set.get() {
            return Err(Error::Status(500));
        }
        let mut saved = self.saved.borrow_mut();
        let ids = saved.entry(request.user_id.clone()).or_default();
        if request.save {
            ids.insert(request.recipe_id);
        } else {
            ids.remove(&request.recipe_id);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeUsers {
    pub fail: Cell<bool>,
    /// When set every call waits until the test releases it.
    pub gated: Cell<bool>,
    waiting: RefCell<Vec<oneshot::Sender<()>>>,
    pub log: CallLog,
}

impl FakeUsers {
    /// Let every waiting call continue.
    pub fn release(&self) {
        for tx in self.waiting.borrow_mut().drain(..) {
            let _ = tx.send(());
        }
    }
}

#[async_trait(?Send)]
impl UserStore for FakeUsers {
    async fn ensure_user_exists(&self, session: &Session) -> Result<String, Error> {
        self.log
            .borrow_mut()
            .push(format!("ensure {}", session.user.id));
        if self.gated.get() {
            let (tx, rx) = oneshot::channel();
            self.waiting.borrow_mut().push(tx);
            let _ = rx.await;
        }
        if self.fail.get() {
            return Err(Error::Status(503));
        }
        Ok(format!("{} display", session.user.id))
    }
}

#[derive(Default)]
pub struct FakeNavigator {
    pub redirects: RefCell<Vec<String>>,
    pub fragment: RefCell<Option<String>>,
    pub rewrites: RefCell<Vec<String>>,
}

impl Navigator for FakeNavigator {
    fn redirect_replace(&self, path: &str) {
        self.redirects.borrow_mut().push(path.to_owned());
    }

    fn fragment(&self) -> Option<String> {
        self.fragment.borrow().clone()
    }

    fn rewrite_address(&self, path: &str) {
        self.rewrites.borrow_mut().push(path.to_owned());
        *self.fragment.borrow_mut() = None;
    }
}

type InitialSession = oneshot::Receiver<Result<Option<Session>, Error>>;

#[derive(Default)]
pub struct FakeAuth {
    initial: RefCell<Option<InitialSession>>,
    callbacks: Rc<RefCell<Vec<(u64, SessionCallback)>>>,
    next_id: Cell<u64>,
    pub subscribe_calls: Cell<usize>,
    pub lookups: Cell<usize>,
}

impl FakeAuth {
    /// A provider whose initial lookup completes when the returned sender fires.
    pub fn new() -> (Rc<Self>, oneshot::Sender<Result<Option<Session>, Error>>) {
        let (tx, rx) = oneshot::channel();
        let auth = Self::default();
        *auth.initial.borrow_mut() = Some(rx);
        (Rc::new(auth), tx)
    }

    pub fn subscriber_count(&self) -> usize {
        self.callbacks.borrow().len()
    }

    /// Push a session change to every subscriber.
    pub fn emit(&self, session: Option<Session>) {
        let callbacks: Vec<SessionCallback> =
            self.callbacks.borrow().iter().map(|(_, cb)| cb.clone()).collect();
        for cb in callbacks {
            cb(session.clone());
        }
    }
}

#[async_trait(?Send)]
impl AuthProvider for FakeAuth {
    async fn get_current_session(&self) -> Result<Option<Session>, Error> {
        self.lookups.set(self.lookups.get() + 1);
        let rx = self.initial.borrow_mut().take();
        match rx {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(Error::AuthResolution("lookup dropped".to_owned()))),
            None => Ok(None),
        }
    }

    fn subscribe(&self, on_change: SessionCallback) -> Subscription {
        self.subscribe_calls.set(self.subscribe_calls.get() + 1);
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.callbacks.borrow_mut().push((id, on_change));
        let callbacks = self.callbacks.clone();
        Subscription::new(move || {
            callbacks.borrow_mut().retain(|(cb_id, _)| *cb_id != id);
        })
    }
}

pub struct Harness<'a> {
    pub pool: LocalPool,
    pub auth: Rc<FakeAuth>,
    resolve_initial: Option<oneshot::Sender<Result<Option<Session>, Error>>>,
    pub session: Rc<SessionStore>,
    pub recipes: Rc<FakeRecipes>,
    pub saved: Rc<FakeSaved>,
    pub users: Rc<FakeUsers>,
    pub navigator: Rc<FakeNavigator>,
    pub log: CallLog,
    pub controller: &'a DashboardController<'a>,
}

impl<'a> Harness<'a> {
    pub fn new(cx: Scope<'a>) -> Self {
        Self::with_recipes(
            cx,
            FakeRecipes::with_recipes(vec![
                RecipeDetail::new(42, "Soup"),
                RecipeDetail::new(43, "Salad"),
            ]),
        )
    }

    pub fn with_recipes(cx: Scope<'a>, recipes: Rc<FakeRecipes>) -> Self {
        let pool = LocalPool::new();
        let spawner = spawner_for(&pool);
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        let (auth, resolve_initial) = FakeAuth::new();
        let saved = FakeSaved::new(log.clone());
        let users = Rc::new(FakeUsers {
            log: log.clone(),
            ..Default::default()
        });
        let navigator = Rc::new(FakeNavigator::default());
        let session = SessionStore::new();
        session
            .start(auth.clone(), spawner.as_ref())
            .expect("session store starts");
        let controller = DashboardController::new(
            cx,
            Rc::new(DashboardConfig::default()),
            session.clone(),
            Collaborators {
                recipes: recipes.clone(),
                saved: saved.clone(),
                users: users.clone(),
                navigator: navigator.clone(),
            },
            spawner,
        );
        controller.attach();
        Self {
            pool,
            auth,
            resolve_initial: Some(resolve_initial),
            session,
            recipes,
            saved,
            users,
            navigator,
            log,
            controller,
        }
    }

    pub fn run(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Complete the initial session lookup and let everything settle.
    pub fn resolve_session(&mut self, result: Result<Option<Session>, Error>) {
        self.resolve_initial
            .take()
            .expect("initial session can only be resolved once")
            .send(result)
            .expect("lookup should be waiting");
        self.run();
    }

    pub fn sign_in(cx: Scope<'a>, user_id: &str) -> Self {
        let mut harness = Self::new(cx);
        harness.resolve_session(Ok(Some(session_for(user_id))));
        harness
    }

    pub fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}
