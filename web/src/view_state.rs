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
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use futures::future::FutureExt;
use futures::task::LocalSpawn;
use serde::{Deserialize, Serialize};
use sycamore::reactive::{ReadSignal, Scope, Signal};
use sycamore_state::{Handler, MessageMapper};
use tracing::{debug, instrument};

use client_api::{RecipeDetail, RecipeId};

use crate::error::Error;
use crate::resource::SelectionKeyedResource;
use crate::store::RecipeStore;

/// The screen shown in the dashboard's main region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveView {
    Add,
    View,
    Edit,
    Delete,
    Search,
}

impl ActiveView {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveView::Add => "add",
            ActiveView::View => "view",
            ActiveView::Edit => "edit",
            ActiveView::Delete => "delete",
            ActiveView::Search => "search",
        }
    }
}

impl fmt::Display for ActiveView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActiveView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(ActiveView::Add),
            "view" => Ok(ActiveView::View),
            "edit" => Ok(ActiveView::Edit),
            "delete" => Ok(ActiveView::Delete),
            "search" => Ok(ActiveView::Search),
            other => Err(format!("Unknown view {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Select(Option<RecipeId>),
    NewRecipe,
    RequestEdit,
    SaveSuccess,
    ChangeScreen(ActiveView),
}

/// What the main region should render right now.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Add,
    Delete,
    Search,
    /// View or edit was requested with nothing selected.
    SelectPrompt(ActiveView),
    Loading(ActiveView),
    Failed { view: ActiveView, error: Error },
    Viewing(RecipeDetail),
    Editing(RecipeDetail),
}

/// The active screen and the selection it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub active: ActiveView,
    pub selected: Option<RecipeId>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            active: ActiveView::Add,
            selected: None,
        }
    }
}

pub type RecipeResource = SelectionKeyedResource<RecipeId, RecipeDetail>;

enum Fetch {
    Keep,
    Key(Option<RecipeId>),
    Again,
}

/// Applies dashboard messages to the view state and keeps the recipe
/// resource keyed by the selection.
pub struct Transitions(Rc<RecipeResource>);

impl MessageMapper<Message, ViewState> for Transitions {
    #[instrument(skip_all, fields(?msg))]
    fn map<'ctx>(&self, _cx: Scope<'ctx>, msg: Message, original: &'ctx Signal<ViewState>) {
        let mut state = *original.get_untracked();
        let fetch = match msg {
            Message::Select(id) => {
                state.selected = id;
                if id.is_some() {
                    state.active = ActiveView::View;
                }
                Fetch::Key(id)
            }
            Message::NewRecipe => {
                state.selected = None;
                state.active = ActiveView::Add;
                Fetch::Key(None)
            }
            Message::RequestEdit => {
                if state.selected.is_none() {
                    debug!("Edit requested without a selection");
                    return;
                }
                state.active = ActiveView::Edit;
                Fetch::Keep
            }
            Message::SaveSuccess => {
                state.active = ActiveView::View;
                Fetch::Again
            }
            Message::ChangeScreen(view) => {
                state.active = view;
                Fetch::Keep
            }
        };
        // The old recipe is cleared before the new selection becomes visible.
        match fetch {
            Fetch::Key(id) => self.0.set_key(id),
            Fetch::Again => {
                self.0.refetch();
            }
            Fetch::Keep => (),
        }
        original.set(state);
    }
}

pub type ViewHandler<'ctx> = &'ctx Handler<'ctx, Transitions, ViewState, Message>;

/// Owns the active screen, the selection, and the recipe loaded for it.
pub struct ViewStateMachine<'ctx> {
    cx: Scope<'ctx>,
    handler: ViewHandler<'ctx>,
    state: &'ctx ReadSignal<ViewState>,
    recipe: Rc<RecipeResource>,
}

impl<'ctx> ViewStateMachine<'ctx> {
    pub fn new(
        cx: Scope<'ctx>,
        store: Rc<dyn RecipeStore>,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Self {
        let recipe = Rc::new(SelectionKeyedResource::new(
            Rc::new(move |id: RecipeId| {
                let store = store.clone();
                async move { store.get_recipe(id).await }.boxed_local()
            }),
            spawner,
        ));
        let handler = Handler::new(cx, ViewState::default(), Transitions(recipe.clone()));
        let state = handler.get_selector(cx, |state| *state.get());
        Self {
            cx,
            handler,
            state,
            recipe,
        }
    }

    pub fn apply(&self, msg: Message) {
        self.handler.dispatch(self.cx, msg);
    }

    pub fn active(&self) -> ActiveView {
        self.state.get().active
    }

    pub fn selected(&self) -> Option<RecipeId> {
        self.state.get().selected
    }

    pub fn loaded_recipe(&self) -> Option<RecipeDetail> {
        self.recipe.value()
    }

    pub fn recipe_loading(&self) -> bool {
        self.recipe.loading()
    }

    pub fn recipe_error(&self) -> Option<Error> {
        self.recipe.error()
    }

    /// Fetch the selected recipe again. Backs the retry affordance.
    pub fn refetch(&self) -> bool {
        self.recipe.refetch()
    }

    pub fn screen(&self) -> Screen {
        let ViewState { active, selected } = *self.state.get();
        match active {
            ActiveView::Add => Screen::Add,
            ActiveView::Delete => Screen::Delete,
            ActiveView::Search => Screen::Search,
            ActiveView::View | ActiveView::Edit => {
                if selected.is_none() {
                    return Screen::SelectPrompt(active);
                }
                if self.recipe.loading() {
                    return Screen::Loading(active);
                }
                match (self.recipe.value(), self.recipe.error()) {
                    (_, Some(error)) => Screen::Failed {
                        view: active,
                        error,
                    },
                    (Some(recipe), None) if active == ActiveView::View => Screen::Viewing(recipe),
                    (Some(recipe), None) => Screen::Editing(recipe),
                    (None, None) => Screen::Loading(active),
                }
            }
        }
    }
}
