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
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use futures::task::{LocalSpawn, LocalSpawnExt};
use serde::Deserialize;
use sycamore::reactive::{create_rc_signal, RcSignal};
use tracing::{debug, info, instrument, warn};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Proof that a user is signed in.
#[derive(Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: SessionUser,
    pub expires_at: DateTime<Utc>,
}

// NOTE(jwall): Tokens must never end up in our logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize, Default)]
struct UserMetadata {
    full_name: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<UserMetadata>,
}

impl Session {
    /// Build a session from a JWT access token.
    ///
    /// The signature is not checked here. The backend is the one that trusts
    /// or rejects the token, we only need the identity and expiry claims.
    pub fn from_access_token<S: Into<String>>(
        access_token: S,
        refresh_token: Option<String>,
    ) -> Result<Self, Error> {
        let access_token = access_token.into();
        let payload = access_token
            .split('.')
            .nth(1)
            .ok_or_else(|| Error::MalformedData("access token is not a JWT".to_owned()))?;
        let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        let claims: Claims = serde_json::from_slice(&decoded)?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| Error::MalformedData(format!("invalid exp claim {}", claims.exp)))?;
        let metadata = claims.user_metadata.unwrap_or_default();
        Ok(Self {
            access_token,
            refresh_token,
            user: SessionUser {
                id: claims.sub,
                email: claims.email,
                display_name: metadata.full_name.or(metadata.name),
            },
            expires_at,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Split a url fragment (`#a=b&c=d`) into its parameters.
pub fn fragment_params(fragment: &str) -> BTreeMap<String, String> {
    fragment
        .trim_start_matches('#')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
}

/// The session carried by an OAuth redirect fragment, if there is one.
pub fn session_from_fragment(fragment: &str) -> Option<Result<Session, Error>> {
    let mut params = fragment_params(fragment);
    let access_token = params.remove("access_token")?;
    Some(Session::from_access_token(
        access_token,
        params.remove("refresh_token"),
    ))
}

/// Unsubscribes from the auth provider when dropped.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new<F: FnOnce() + 'static>(unsubscribe: F) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

pub type SessionCallback = Rc<dyn Fn(Option<Session>)>;

#[async_trait(?Send)]
/// Source of truth for who is signed in.
pub trait AuthProvider {
    /// One-shot lookup of the current session.
    async fn get_current_session(&self) -> Result<Option<Session>, Error>;
    /// Long lived notification of sign in, token refresh, and sign out.
    fn subscribe(&self, on_change: SessionCallback) -> Subscription;
}

/// Holds the current session for the lifetime of the application.
///
/// Observers see the session change before `loading` clears, so anything
/// that waits on `loading` always reads a settled session.
pub struct SessionStore {
    session: RcSignal<Option<Session>>,
    loading: RcSignal<bool>,
    // Set once the provider has pushed a change to us.
    notified: Cell<bool>,
    subscription: RefCell<Option<Subscription>>,
    started: Cell<bool>,
}

impl SessionStore {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            session: create_rc_signal(None),
            loading: create_rc_signal(true),
            notified: Cell::new(false),
            subscription: RefCell::new(None),
            started: Cell::new(false),
        })
    }

    /// Subscribe to the provider and resolve the initial session.
    ///
    /// Only the first call has any effect. The subscription lives until
    /// `shutdown` is called or the store is dropped.
    #[instrument(skip_all)]
    pub fn start(
        self: &Rc<Self>,
        provider: Rc<dyn AuthProvider>,
        spawner: &dyn LocalSpawn,
    ) -> Result<(), Error> {
        if self.started.replace(true) {
            warn!("Session store already started");
            return Ok(());
        }
        info!("Starting session store");
        let weak = Rc::downgrade(self);
        let subscription = provider.subscribe(Rc::new(move |session| {
            if let Some(store) = weak.upgrade() {
                store.on_provider_change(session);
            }
        }));
        *self.subscription.borrow_mut() = Some(subscription);

        let weak: Weak<Self> = Rc::downgrade(self);
        spawner.spawn_local(async move {
            let resolved = match provider.get_current_session().await {
                Ok(session) => session,
                Err(err) => {
                    // Fail closed. An unknown session is treated as no session.
                    warn!(?err, "Session resolution failed, treating as signed out");
                    None
                }
            };
            if let Some(store) = weak.upgrade() {
                store.on_initial_session(resolved);
            }
        })?;
        Ok(())
    }

    /// Drop the provider subscription.
    pub fn shutdown(&self) {
        if self.subscription.borrow_mut().take().is_some() {
            info!("Session store shut down");
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.borrow().is_some()
    }

    /// The current session. Tracked when read inside a reactive scope.
    pub fn session(&self) -> Option<Session> {
        self.session.get().as_ref().clone()
    }

    /// True until the first session lookup or provider push settles.
    pub fn loading(&self) -> bool {
        *self.loading.get()
    }

    fn settle(&self, session: Option<Session>) {
        self.session.set(session);
        if *self.loading.get_untracked() {
            self.loading.set(false);
        }
    }

    fn on_initial_session(&self, session: Option<Session>) {
        if self.notified.get() {
            debug!("Provider already pushed a newer session, ignoring initial lookup");
            return;
        }
        debug!(authenticated = session.is_some(), "Initial session resolved");
        self.settle(session);
    }

    fn on_provider_change(&self, session: Option<Session>) {
        debug!(authenticated = session.is_some(), "Session changed");
        self.notified.set(true);
        self.settle(session);
    }
}
