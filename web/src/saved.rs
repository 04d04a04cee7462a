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

use sycamore::reactive::{create_rc_signal, RcSignal};
use tracing::{debug, error, instrument};

use client_api::{RecipeId, SaveRecipeRequest};

use crate::error::Error;
use crate::store::SavedRecipeStore;

/// Client side cache of the signed in user's bookmarked recipes.
///
/// The backend is the source of truth. Every successful toggle reloads the
/// whole set instead of patching it locally.
pub struct SavedRecipesStore {
    api: Rc<dyn SavedRecipeStore>,
    user_id: RefCell<Option<String>>,
    saved: RcSignal<BTreeSet<RecipeId>>,
    // Bumped on reset so loads started before it are discarded.
    epoch: Cell<u64>,
}

impl SavedRecipesStore {
    pub fn new(api: Rc<dyn SavedRecipeStore>) -> Self {
        Self {
            api,
            user_id: RefCell::new(None),
            saved: create_rc_signal(BTreeSet::new()),
            epoch: Cell::new(0),
        }
    }

    pub fn bind_user(&self, user_id: Option<String>) {
        *self.user_id.borrow_mut() = user_id;
    }

    pub fn user_id(&self) -> Option<String> {
        self.user_id.borrow().clone()
    }

    pub fn ids(&self) -> BTreeSet<RecipeId> {
        self.saved.get().as_ref().clone()
    }

    pub fn contains(&self, id: RecipeId) -> bool {
        self.saved.get().contains(&id)
    }

    /// Forget the bound user and everything we know about their bookmarks.
    pub fn reset(&self) {
        self.bind_user(None);
        self.epoch.set(self.epoch.get() + 1);
        if !self.saved.get_untracked().is_empty() {
            self.saved.set(BTreeSet::new());
        }
    }

    /// Replace the set with the backend's current set for `user_id`.
    ///
    /// On failure the previously known set is kept.
    #[instrument(skip(self))]
    pub async fn load(&self, user_id: &str) -> Result<(), Error> {
        let epoch = self.epoch.get();
        let ids = self.api.get_saved_recipes(user_id).await?;
        if epoch != self.epoch.get() {
            debug!("Saved recipes were reset while loading, discarding");
            return Ok(());
        }
        {
            let bound = self.user_id.borrow();
            if bound.as_deref().map_or(false, |bound| bound != user_id) {
                debug!(?bound, "Saved recipes belong to a different user, discarding");
                return Ok(());
            }
        }
        debug!(count = ids.len(), "Loaded saved recipes");
        self.saved.set(ids);
        Ok(())
    }

    /// Save or unsave a recipe for the bound user and reload the set.
    ///
    /// Does nothing if no user is bound.
    #[instrument(skip(self))]
    pub async fn toggle(&self, recipe_id: RecipeId, save: bool) -> Result<(), Error> {
        let user_id = match self.user_id() {
            Some(user_id) => user_id,
            None => {
                debug!("No user bound, ignoring toggle");
                return Ok(());
            }
        };
        let request = SaveRecipeRequest {
            user_id: user_id.clone(),
            recipe_id,
            save,
        };
        if let Err(err) = self.api.set_saved(&request).await {
            error!(?err, "Unable to update saved recipe");
            return Err(err);
        }
        self.load(&user_id).await
    }
}
