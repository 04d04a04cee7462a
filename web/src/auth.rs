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
//! Session provider backed by the browser's local storage.
//!
//! A successful OAuth sign in lands on the dashboard with the tokens in the
//! url fragment. We persist them and serve the session from storage after
//! that. Other tabs signing in or out show up as `storage` events.
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{from_str, to_string};
use tracing::{debug, error, info, warn};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::StorageEvent;

use crate::{
    error::Error,
    js_lib,
    session::{session_from_fragment, AuthProvider, Session, SessionCallback, Subscription},
};

#[derive(Serialize, Deserialize)]
struct StoredSession {
    access_token: String,
    refresh_token: Option<String>,
}

pub struct BrowserAuthProvider {
    storage_key: String,
    // Same tab changes. The storage event only fires in other tabs.
    subscribers: Rc<RefCell<BTreeMap<u64, SessionCallback>>>,
    next_id: Cell<u64>,
}

impl BrowserAuthProvider {
    pub fn new<S: Into<String>>(storage_key: S) -> Self {
        Self {
            storage_key: storage_key.into(),
            subscribers: Rc::new(RefCell::new(BTreeMap::new())),
            next_id: Cell::new(0),
        }
    }

    fn read_stored(storage_key: &str) -> Result<Option<Session>, Error> {
        let storage = js_lib::get_storage()?;
        let stored = match storage.get_item(storage_key)? {
            Some(stored) => stored,
            None => return Ok(None),
        };
        let stored: StoredSession = from_str(&stored)?;
        let session = Session::from_access_token(stored.access_token, stored.refresh_token)?;
        if session.is_expired(Utc::now()) {
            debug!("Stored session has expired");
            return Ok(None);
        }
        Ok(Some(session))
    }

    fn persist(&self, session: &Session) -> Result<(), Error> {
        let stored = StoredSession {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
        };
        js_lib::get_storage()?.set_item(&self.storage_key, &to_string(&stored)?)?;
        Ok(())
    }

    /// Forget the stored session and tell our subscribers.
    pub fn sign_out(&self) -> Result<(), Error> {
        info!("Signing out");
        js_lib::get_storage()?.remove_item(&self.storage_key)?;
        let subscribers: Vec<SessionCallback> =
            self.subscribers.borrow().values().cloned().collect();
        for on_change in subscribers {
            on_change(None);
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl AuthProvider for BrowserAuthProvider {
    async fn get_current_session(&self) -> Result<Option<Session>, Error> {
        let hash = js_lib::location_hash()?;
        if let Some(session) = session_from_fragment(&hash) {
            let session = session.map_err(|e| Error::AuthResolution(format!("{}", e)))?;
            info!(user_id = %session.user.id, "Signed in from OAuth redirect");
            self.persist(&session)?;
            return Ok(Some(session));
        }
        Self::read_stored(&self.storage_key).map_err(|e| Error::AuthResolution(format!("{}", e)))
    }

    fn subscribe(&self, on_change: SessionCallback) -> Subscription {
        let local_id = self.next_id.get();
        self.next_id.set(local_id + 1);
        self.subscribers
            .borrow_mut()
            .insert(local_id, on_change.clone());

        let storage_key = self.storage_key.clone();
        let closure = Closure::wrap(Box::new(move |ev: StorageEvent| {
            if ev.key().as_deref() != Some(storage_key.as_str()) {
                return;
            }
            let session = match Self::read_stored(&storage_key) {
                Ok(session) => session,
                Err(err) => {
                    warn!(?err, "Unreadable session in storage, treating as signed out");
                    None
                }
            };
            on_change(session);
        }) as Box<dyn FnMut(StorageEvent)>);
        let registered = web_sys::window()
            .ok_or_else(|| Error::Browser("No window present".to_owned()))
            .and_then(|w| {
                w.add_event_listener_with_callback("storage", closure.as_ref().unchecked_ref())
                    .map_err(Error::from)
            });
        if let Err(err) = &registered {
            error!(?err, "Unable to listen for storage events");
        }

        let subscribers = self.subscribers.clone();
        Subscription::new(move || {
            subscribers.borrow_mut().remove(&local_id);
            if registered.is_ok() {
                if let Some(w) = web_sys::window() {
                    let _ = w.remove_event_listener_with_callback(
                        "storage",
                        closure.as_ref().unchecked_ref(),
                    );
                }
            }
            drop(closure);
        })
    }
}
