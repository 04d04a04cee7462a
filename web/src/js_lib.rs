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
use wasm_bindgen::JsValue;
use web_sys::{window, Storage, Window};

use crate::error::Error;

fn get_window() -> Result<Window, Error> {
    window().ok_or_else(|| Error::Browser("No window present".to_owned()))
}

/// Navigate away, replacing the current history entry.
pub fn replace_location(path: &str) -> Result<(), Error> {
    Ok(get_window()?.location().replace(path)?)
}

/// Rewrite the url in the address bar without navigating.
pub fn replace_history_url(path: &str) -> Result<(), Error> {
    Ok(get_window()?
        .history()?
        .replace_state_with_url(&JsValue::NULL, "", Some(path))?)
}

pub fn location_hash() -> Result<String, Error> {
    Ok(get_window()?.location().hash()?)
}

pub fn get_storage() -> Result<Storage, Error> {
    get_window()?
        .local_storage()?
        .ok_or_else(|| Error::Browser("No storage available".to_owned()))
}

pub fn meta_content(name: &str) -> Option<String> {
    get_window()
        .ok()?
        .document()?
        .query_selector(&format!("meta[name=\"{}\"]", name))
        .ok()??
        .get_attribute("content")
}

pub fn encode_uri_component(value: &str) -> String {
    js_sys::encode_uri_component(value).into()
}
