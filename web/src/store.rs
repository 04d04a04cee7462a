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
use std::collections::BTreeSet;

use async_trait::async_trait;

use client_api::{RecipeDetail, RecipeId, SaveRecipeRequest};

use crate::error::Error;
use crate::session::Session;

#[async_trait(?Send)]
/// Read access to full recipe details.
pub trait RecipeStore {
    async fn get_recipe(&self, id: RecipeId) -> Result<RecipeDetail, Error>;
}

#[async_trait(?Send)]
/// The backend's record of which recipes a user has bookmarked.
pub trait SavedRecipeStore {
    /// Fetch the saved recipe ids for a user. An absent or unparseable body
    /// yields an empty set.
    async fn get_saved_recipes(&self, user_id: &str) -> Result<BTreeSet<RecipeId>, Error>;
    async fn set_saved(&self, request: &SaveRecipeRequest) -> Result<(), Error>;
}

#[async_trait(?Send)]
pub trait UserStore {
    /// Idempotently create the backing user record and return its display name.
    async fn ensure_user_exists(&self, session: &Session) -> Result<String, Error>;
}

/// The address bar and history of the page hosting the dashboard.
pub trait Navigator {
    /// Navigate to `path`, replacing the current history entry.
    fn redirect_replace(&self, path: &str);
    /// The current url fragment, including the leading `#`.
    fn fragment(&self) -> Option<String>;
    /// Rewrite the address bar to `path` without navigating.
    fn rewrite_address(&self, path: &str);
}
