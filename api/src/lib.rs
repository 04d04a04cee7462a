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
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Backend identifier of a recipe.
pub type RecipeId = i64;

/// Full recipe payload as returned by `GET /recipes/{id}`.
///
/// Only the fields the dashboard sequences on are typed. Everything else the
/// backend sends is carried along untouched for the screens to render.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecipeDetail {
    pub id: RecipeId,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl RecipeDetail {
    pub fn new<S: Into<String>>(id: RecipeId, title: S) -> Self {
        Self {
            id,
            title: title.into(),
            fields: BTreeMap::new(),
        }
    }
}

/// Body of `POST /saved-recipes`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SaveRecipeRequest {
    pub user_id: String,
    pub recipe_id: RecipeId,
    pub save: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EnsureUserResponse {
    pub username: String,
}

/// The identity the dashboard works under once a session is authenticated.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserIdentity {
    pub user_id: String,
    pub display_name: String,
}

pub fn recipe_path(root: &str, id: RecipeId) -> String {
    format!("{}/recipes/{}", root, id)
}

pub fn saved_recipes_path(root: &str) -> String {
    format!("{}/saved-recipes", root)
}

pub fn ensure_user_path(root: &str) -> String {
    format!("{}/users/ensure", root)
}

/// Interpret a saved-recipes response body.
///
/// A missing, null, or otherwise unparseable body means the user has no saved
/// recipes. It is never an error for the page.
pub fn saved_ids_from_body(body: &str) -> BTreeSet<RecipeId> {
    match serde_json::from_str::<Option<Vec<RecipeId>>>(body) {
        Ok(Some(ids)) => ids.into_iter().collect(),
        Ok(None) | Err(_) => BTreeSet::new(),
    }
}
