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
use gloo_net::http::Request;
use tracing::{debug, error, instrument};

use client_api::*;

use crate::{
    error::Error,
    js_lib,
    session::Session,
    store::{RecipeStore, SavedRecipeStore, UserStore},
};

/// The recipe backend spoken to over http.
#[derive(Clone, Debug)]
pub struct HttpStore {
    root: String,
}

impl HttpStore {
    pub fn new(root: String) -> Self {
        Self { root }
    }
}

#[async_trait(?Send)]
impl RecipeStore for HttpStore {
    #[instrument(skip(self))]
    async fn get_recipe(&self, id: RecipeId) -> Result<RecipeDetail, Error> {
        let path = recipe_path(&self.root, id);
        let resp = Request::get(&path).send().await?;
        if resp.status() != 200 {
            error!(path, status = resp.status(), "Error fetching recipe");
            return Err(Error::Status(resp.status()));
        }
        debug!("We got a valid response back!");
        Ok(resp.json::<RecipeDetail>().await?)
    }
}

#[async_trait(?Send)]
impl SavedRecipeStore for HttpStore {
    #[instrument(skip(self))]
    async fn get_saved_recipes(&self, user_id: &str) -> Result<BTreeSet<RecipeId>, Error> {
        let path = format!(
            "{}?user_id={}",
            saved_recipes_path(&self.root),
            js_lib::encode_uri_component(user_id)
        );
        let resp = Request::get(&path).send().await?;
        if resp.status() != 200 {
            error!(path, status = resp.status(), "Error fetching saved recipes");
            return Err(Error::Status(resp.status()));
        }
        // An unreadable body just means nothing is saved.
        let body = resp.text().await.unwrap_or_default();
        Ok(saved_ids_from_body(&body))
    }

    #[instrument(skip(self))]
    async fn set_saved(&self, request: &SaveRecipeRequest) -> Result<(), Error> {
        let path = saved_recipes_path(&self.root);
        let resp = Request::post(&path)
            .header("content-type", "application/json")
            .json(request)?
            .send()
            .await?;
        if !resp.ok() {
            error!(path, status = resp.status(), "Error updating saved recipe");
            return Err(Error::Status(resp.status()));
        }
        debug!("We got a valid response back!");
        Ok(())
    }
}

#[async_trait(?Send)]
impl UserStore for HttpStore {
    // NOTE(jwall): We do **not** want to record the token in our logs.
    #[instrument(skip_all, fields(user_id = %session.user.id))]
    async fn ensure_user_exists(&self, session: &Session) -> Result<String, Error> {
        let path = ensure_user_path(&self.root);
        let resp = Request::post(&path)
            .header(
                "Authorization",
                format!("Bearer {}", session.access_token).as_str(),
            )
            .send()
            .await?;
        if !resp.ok() {
            error!(path, status = resp.status(), "Unable to ensure user exists");
            return Err(Error::Status(resp.status()));
        }
        Ok(resp.json::<EnsureUserResponse>().await?.username)
    }
}
