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
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use futures::task::{LocalSpawn, LocalSpawnExt};
use sycamore::reactive::{
    create_effect, create_rc_signal, create_ref, create_selector, create_signal, untrack, RcSignal,
    Scope, Signal,
};
use tracing::{debug, error, info, instrument};

use client_api::{RecipeDetail, RecipeId, UserIdentity};

use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::saved::SavedRecipesStore;
use crate::session::{Session, SessionStore};
use crate::store::{Navigator, RecipeStore, SavedRecipeStore, UserStore};
use crate::view_state::{ActiveView, Message, Screen, ViewStateMachine};

/// Where the dashboard stands with respect to authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// The session is still being resolved.
    Verifying,
    /// Nobody is signed in and we have sent them to the login page.
    Redirected,
    Ready,
}

/// The backend and browser collaborators the dashboard talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub recipes: Rc<dyn RecipeStore>,
    pub saved: Rc<dyn SavedRecipeStore>,
    pub users: Rc<dyn UserStore>,
    pub navigator: Rc<dyn Navigator>,
}

/// Per user setup that outlives any single render.
#[derive(Clone)]
struct UserBootstrap {
    users: Rc<dyn UserStore>,
    saved: Rc<SavedRecipesStore>,
    // User id the current bootstrap belongs to.
    current: Rc<RefCell<Option<String>>>,
    identity: RcSignal<Option<UserIdentity>>,
    failure: RcSignal<Option<DashboardError>>,
}

impl UserBootstrap {
    fn is_current(&self, user_id: &str) -> bool {
        self.current.borrow().as_deref() == Some(user_id)
    }

    #[instrument(skip_all, fields(user_id = %session.user.id))]
    async fn run(self, session: Session) {
        let user_id = session.user.id.clone();
        info!("Bootstrapping dashboard");
        let display_name = match self.users.ensure_user_exists(&session).await {
            Ok(name) => name,
            Err(err) => {
                error!(?err, "Unable to ensure user exists");
                self.failed(&user_id, DashboardError::Bootstrap(err));
                return;
            }
        };
        if !self.is_current(&user_id) {
            debug!("Session changed during bootstrap, discarding");
            return;
        }
        self.identity.set(Some(UserIdentity {
            user_id: user_id.clone(),
            display_name,
        }));
        self.saved.bind_user(Some(user_id.clone()));
        if let Err(err) = self.saved.load(&user_id).await {
            error!(?err, "Unable to load saved recipes");
            self.failed(&user_id, DashboardError::Bootstrap(err));
        }
    }

    fn failed(&self, user_id: &str, failure: DashboardError) {
        if self.is_current(user_id) {
            self.failure.set(Some(failure));
        }
    }
}

pub struct DashboardController<'ctx> {
    cx: Scope<'ctx>,
    config: Rc<DashboardConfig>,
    session: Rc<SessionStore>,
    navigator: Rc<dyn Navigator>,
    view: ViewStateMachine<'ctx>,
    spawner: Rc<dyn LocalSpawn>,
    bootstrap: UserBootstrap,
    gate: RcSignal<Gate>,
    redirected: Cell<bool>,
    address_cleaned: Cell<bool>,
    // Set once the gate effect exists.
    following: Cell<bool>,
    attached: Cell<bool>,
}

impl<'ctx> DashboardController<'ctx> {
    pub fn new(
        cx: Scope<'ctx>,
        config: Rc<DashboardConfig>,
        session: Rc<SessionStore>,
        collaborators: Collaborators,
        spawner: Rc<dyn LocalSpawn>,
    ) -> &'ctx Self {
        let view = ViewStateMachine::new(cx, collaborators.recipes, spawner.clone());
        create_ref(
            cx,
            Self {
                cx,
                config,
                session,
                navigator: collaborators.navigator,
                view,
                spawner,
                bootstrap: UserBootstrap {
                    users: collaborators.users,
                    saved: Rc::new(SavedRecipesStore::new(collaborators.saved)),
                    current: Rc::new(RefCell::new(None)),
                    identity: create_rc_signal(None),
                    failure: create_rc_signal(None),
                },
                gate: create_rc_signal(Gate::Verifying),
                redirected: Cell::new(false),
                address_cleaned: Cell::new(false),
                following: Cell::new(false),
                attached: Cell::new(false),
            },
        )
    }

    /// Start following the session store. Calling this again is a no-op.
    pub fn attach(&'ctx self) {
        if self.attached.replace(true) {
            return;
        }
        if self.following.replace(true) {
            untrack(|| self.evaluate_gate());
            return;
        }
        create_effect(self.cx, move || {
            let loading = self.session.loading();
            let session = self.session.session();
            if !self.attached.get() {
                return;
            }
            debug!(loading, authenticated = session.is_some(), "Session state changed");
            untrack(|| self.evaluate_gate());
        });
    }

    /// Stop reacting to session changes.
    pub fn detach(&self) {
        self.attached.set(false);
    }

    /// Apply the auth gate to the current session state.
    ///
    /// Safe to call repeatedly. Redirects and bootstraps happen at most
    /// once per signed out period and per signed in user respectively.
    #[instrument(skip(self))]
    pub fn evaluate_gate(&self) {
        if self.session.loading() {
            self.set_gate(Gate::Verifying);
            return;
        }
        match self.session.session() {
            None => self.gate_signed_out(),
            Some(session) => self.gate_signed_in(session),
        }
    }

    fn set_gate(&self, gate: Gate) {
        if *self.gate.get_untracked() != gate {
            self.gate.set(gate);
        }
    }

    fn gate_signed_out(&self) {
        let tear_down = self.bootstrap.current.borrow_mut().take().is_some();
        if tear_down {
            info!("Session ended, clearing dashboard state");
            self.bootstrap.identity.set(None);
            self.reset_user_state();
        }
        self.dismiss_failure();
        self.set_gate(Gate::Redirected);
        if !self.redirected.replace(true) {
            info!(path = %self.config.login_path, "No session, redirecting to login");
            self.navigator.redirect_replace(&self.config.login_path);
        }
    }

    fn gate_signed_in(&self, session: Session) {
        self.redirected.set(false);
        let (bootstrap, switched_user) = {
            let mut current = self.bootstrap.current.borrow_mut();
            let user_id = session.user.id.as_str();
            let bootstrap = current.as_deref() != Some(user_id);
            let switched_user = bootstrap && current.is_some();
            if bootstrap {
                *current = Some(user_id.to_owned());
            }
            (bootstrap, switched_user)
        };
        if !self.address_cleaned.replace(true) {
            self.clean_address_bar();
        }
        if switched_user {
            info!("Signed in user changed, clearing dashboard state");
            self.reset_user_state();
        }
        if bootstrap {
            self.bootstrap.identity.set(None);
            self.dismiss_failure();
        }
        self.set_gate(Gate::Ready);
        if bootstrap {
            if let Err(err) = self.spawner.spawn_local(self.bootstrap.clone().run(session)) {
                error!(?err, "Unable to start bootstrap");
                self.bootstrap
                    .failure
                    .set(Some(DashboardError::Bootstrap(err.into())));
            }
        }
    }

    fn clean_address_bar(&self) {
        if let Some(fragment) = self.navigator.fragment() {
            if self.config.has_oauth_artifacts(&fragment) {
                debug!("Removing OAuth artifacts from the address bar");
                self.navigator.rewrite_address(&self.config.dashboard_path);
            }
        }
    }

    fn reset_user_state(&self) {
        self.bootstrap.saved.reset();
        self.view.apply(Message::NewRecipe);
    }

    pub fn gate(&self) -> Gate {
        *self.gate.get()
    }

    pub fn identity(&self) -> Option<UserIdentity> {
        self.bootstrap.identity.get().as_ref().clone()
    }

    /// The most recent inline failure, falling back to a failed recipe fetch.
    pub fn failure(&self) -> Option<DashboardError> {
        self.bootstrap
            .failure
            .get()
            .as_ref()
            .clone()
            .or_else(|| self.view.recipe_error().map(DashboardError::Fetch))
    }

    pub fn dismiss_failure(&self) {
        if self.bootstrap.failure.get_untracked().is_some() {
            self.bootstrap.failure.set(None);
        }
    }

    pub fn active_view(&self) -> ActiveView {
        self.view.active()
    }

    pub fn screen(&self) -> Screen {
        self.view.screen()
    }

    pub fn selected(&self) -> Option<RecipeId> {
        self.view.selected()
    }

    /// Text for the recipe picker. It follows the selection and otherwise
    /// keeps whatever was typed into it.
    pub fn picker_text<'a>(&'ctx self, cx: Scope<'a>) -> &'a Signal<String>
    where
        'ctx: 'a,
    {
        let selected = create_selector(cx, move || self.selected());
        let text = create_signal(cx, String::new());
        create_effect(cx, move || {
            text.set(selected.get().map(|id| id.to_string()).unwrap_or_default());
        });
        text
    }

    /// The loaded recipe once it has settled, for the task bar.
    pub fn current_recipe(&self) -> Option<RecipeDetail> {
        if self.view.recipe_loading() {
            None
        } else {
            self.view.loaded_recipe()
        }
    }

    pub fn saved_recipes(&self) -> BTreeSet<RecipeId> {
        self.bootstrap.saved.ids()
    }

    pub fn is_saved(&self, id: RecipeId) -> bool {
        self.bootstrap.saved.contains(id)
    }

    pub fn select(&self, id: Option<RecipeId>) {
        self.view.apply(Message::Select(id));
    }

    pub fn new_recipe(&self) {
        self.view.apply(Message::NewRecipe);
    }

    pub fn request_edit(&self) {
        self.view.apply(Message::RequestEdit);
    }

    pub fn save_success(&self) {
        self.view.apply(Message::SaveSuccess);
    }

    pub fn change_screen(&self, view: ActiveView) {
        self.view.apply(Message::ChangeScreen(view));
    }

    /// Retry a failed fetch of the selected recipe.
    pub fn retry_recipe(&self) -> bool {
        self.view.refetch()
    }

    #[instrument(skip(self))]
    pub async fn toggle_save(&self, recipe_id: RecipeId, save: bool) -> Result<(), DashboardError> {
        if let Err(err) = self.bootstrap.saved.toggle(recipe_id, save).await {
            let failure = DashboardError::Toggle(err);
            self.bootstrap.failure.set(Some(failure.clone()));
            return Err(failure);
        }
        Ok(())
    }
}
