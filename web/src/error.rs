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

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The auth provider could not tell us who is signed in.
    AuthResolution(String),
    Network(String),
    Status(u16),
    MalformedData(String),
    Browser(String),
    Spawn(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AuthResolution(msg) => write!(f, "Unable to resolve session: {}", msg),
            Error::Network(msg) => write!(f, "Network error: {}", msg),
            Error::Status(code) => write!(f, "Status: {}", code),
            Error::MalformedData(msg) => write!(f, "Malformed data: {}", msg),
            Error::Browser(msg) => write!(f, "Browser error: {}", msg),
            Error::Spawn(msg) => write!(f, "Unable to schedule task: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(item: serde_json::Error) -> Self {
        Error::MalformedData(format!("{}", item))
    }
}

impl From<base64::DecodeError> for Error {
    fn from(item: base64::DecodeError) -> Self {
        Error::MalformedData(format!("{}", item))
    }
}

impl From<futures::task::SpawnError> for Error {
    fn from(item: futures::task::SpawnError) -> Self {
        Error::Spawn(format!("{}", item))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<gloo_net::Error> for Error {
    fn from(item: gloo_net::Error) -> Self {
        match item {
            gloo_net::Error::SerdeError(err) => Error::MalformedData(format!("{}", err)),
            err => Error::Network(format!("{}", err)),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for Error {
    fn from(item: wasm_bindgen::JsValue) -> Self {
        Error::Browser(format!("{:?}", item))
    }
}

/// A failure the dashboard surfaces inline. None of these end the session.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardError {
    /// ensure-user or the initial saved recipes load failed.
    Bootstrap(Error),
    /// The selected recipe could not be fetched.
    Fetch(Error),
    /// A save or unsave request failed. The saved set is unchanged.
    Toggle(Error),
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardError::Bootstrap(e) => write!(f, "Unable to load your account: {}", e),
            DashboardError::Fetch(e) => write!(f, "Unable to load recipe: {}", e),
            DashboardError::Toggle(e) => write!(f, "Unable to update saved recipes: {}", e),
        }
    }
}

impl std::error::Error for DashboardError {}
