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
//! An asynchronously fetched value keyed by the current selection.
//!
//! Every key change starts a new fetch and opens a new epoch. A fetch only
//! applies its result if the epoch it was started in is still current when it
//! completes. Superseded fetches are left to finish and their results are
//! dropped on arrival.
use std::cell::Cell;
use std::fmt::Debug;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::task::{LocalSpawn, LocalSpawnExt};
use sycamore::reactive::{create_rc_signal, RcSignal};
use tracing::{debug, error};

use crate::error::Error;

pub type Fetcher<K, V> = Rc<dyn Fn(K) -> LocalBoxFuture<'static, Result<V, Error>>>;

pub struct SelectionKeyedResource<K, V> {
    fetcher: Fetcher<K, V>,
    spawner: Rc<dyn LocalSpawn>,
    key: RcSignal<Option<K>>,
    value: RcSignal<Option<V>>,
    loading: RcSignal<bool>,
    error: RcSignal<Option<Error>>,
    epoch: Rc<Cell<u64>>,
    // In flight fetches started in the current epoch.
    pending: Rc<Cell<usize>>,
}

impl<K, V> SelectionKeyedResource<K, V>
where
    K: Clone + PartialEq + Debug + 'static,
    V: Clone + 'static,
{
    pub fn new(fetcher: Fetcher<K, V>, spawner: Rc<dyn LocalSpawn>) -> Self {
        Self {
            fetcher,
            spawner,
            key: create_rc_signal(None),
            value: create_rc_signal(None),
            loading: create_rc_signal(false),
            error: create_rc_signal(None),
            epoch: Rc::new(Cell::new(0)),
            pending: Rc::new(Cell::new(0)),
        }
    }

    pub fn key(&self) -> Option<K> {
        self.key.get().as_ref().clone()
    }

    pub fn value(&self) -> Option<V> {
        self.value.get().as_ref().clone()
    }

    pub fn loading(&self) -> bool {
        *self.loading.get()
    }

    pub fn error(&self) -> Option<Error> {
        self.error.get().as_ref().clone()
    }

    /// Switch to a new key.
    ///
    /// The current value and error are cleared right away. With no key the
    /// resource settles to empty without fetching anything.
    pub fn set_key(&self, key: Option<K>) {
        let epoch = self.epoch.get() + 1;
        self.epoch.set(epoch);
        self.pending.set(0);
        debug!(?key, epoch, "Resource key changed");
        self.value.set(None);
        self.error.set(None);
        match key.clone() {
            Some(key) => self.start(key, epoch),
            None => self.loading.set(false),
        }
        self.key.set(key);
    }

    /// Run the fetch again for the current key.
    ///
    /// The previous value stays visible until the new one arrives. Returns
    /// false if there is no key to fetch for.
    pub fn refetch(&self) -> bool {
        let key = match self.key.get_untracked().as_ref().clone() {
            Some(key) => key,
            None => return false,
        };
        let epoch = self.epoch.get();
        debug!(?key, epoch, "Refetching resource");
        self.start(key, epoch);
        true
    }

    fn start(&self, key: K, epoch: u64) {
        self.pending.set(self.pending.get() + 1);
        if !*self.loading.get_untracked() {
            self.loading.set(true);
        }
        let fetch = (self.fetcher)(key.clone());
        let value = self.value.clone();
        let failure = self.error.clone();
        let loading = self.loading.clone();
        let current = self.epoch.clone();
        let pending = self.pending.clone();
        let task = async move {
            let result = fetch.await;
            if current.get() != epoch {
                debug!(?key, epoch, current = current.get(), "Discarding stale result");
                return;
            }
            pending.set(pending.get().saturating_sub(1));
            match result {
                Ok(v) => {
                    failure.set(None);
                    value.set(Some(v));
                }
                Err(err) => {
                    error!(?key, ?err, "Fetch failed");
                    failure.set(Some(err));
                }
            }
            if pending.get() == 0 {
                loading.set(false);
            }
        };
        if let Err(err) = self.spawner.spawn_local(task) {
            error!(?err, "Unable to spawn fetch");
            self.pending.set(self.pending.get().saturating_sub(1));
            self.error.set(Some(err.into()));
            if self.pending.get() == 0 {
                self.loading.set(false);
            }
        }
    }
}
