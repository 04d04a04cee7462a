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
use std::rc::Rc;

use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};
use sycamore::prelude::*;
use tracing::{error, info, instrument, warn};
use tracing_subscriber::{filter::LevelFilter, fmt::format::Pretty, prelude::*};
use tracing_web::{performance_layer, MakeWebConsoleWriter};

use crate::{
    api::HttpStore,
    auth::BrowserAuthProvider,
    components::Dashboard,
    config::{DashboardConfig, CONFIG_META_NAME},
    controller::{Collaborators, DashboardController},
    js_lib,
    session::SessionStore,
    store::Navigator,
};

pub fn configure_tracing() {
    let level = if cfg!(feature = "debug_logs") {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(MakeWebConsoleWriter::new());
    let perf_layer = performance_layer().with_details_from_fields(Pretty::default());
    tracing_subscriber::registry()
        .with(level)
        .with(fmt_layer)
        .with(perf_layer)
        .init();
}

/// Runs futures on the browser's microtask queue.
struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}

struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn redirect_replace(&self, path: &str) {
        if let Err(err) = js_lib::replace_location(path) {
            error!(?err, path, "Unable to redirect");
        }
    }

    fn fragment(&self) -> Option<String> {
        js_lib::location_hash().ok().filter(|h| !h.is_empty())
    }

    fn rewrite_address(&self, path: &str) {
        if let Err(err) = js_lib::replace_history_url(path) {
            error!(?err, path, "Unable to rewrite the address bar");
        }
    }
}

fn load_config() -> DashboardConfig {
    match js_lib::meta_content(CONFIG_META_NAME) {
        Some(content) => match DashboardConfig::from_json(&content) {
            Ok(config) => config,
            Err(err) => {
                error!(?err, "Invalid dashboard configuration, using defaults");
                DashboardConfig::default()
            }
        },
        None => DashboardConfig::default(),
    }
}

#[instrument]
#[component]
pub fn UI<G: Html>(cx: Scope) -> View<G> {
    let config = Rc::new(load_config());
    info!(?config, "Starting UI");
    let spawner: Rc<dyn LocalSpawn> = Rc::new(BrowserSpawner);
    let store = Rc::new(HttpStore::new(config.api_root.clone()));
    let auth = Rc::new(BrowserAuthProvider::new(config.auth_storage_key.clone()));

    let session = SessionStore::new();
    if let Err(err) = session.start(auth.clone(), spawner.as_ref()) {
        error!(?err, "Unable to start session store");
    }
    let controller = DashboardController::new(
        cx,
        config,
        session.clone(),
        Collaborators {
            recipes: store.clone(),
            saved: store.clone(),
            users: store,
            navigator: Rc::new(BrowserNavigator),
        },
        spawner,
    );
    controller.attach();
    provide_context(cx, auth);

    on_cleanup(cx, move || {
        warn!("Tearing down UI");
        controller.detach();
        session.shutdown();
    });

    view! { cx,
        div(class="app") {
            Dashboard(controller=controller)
        }
    }
}
