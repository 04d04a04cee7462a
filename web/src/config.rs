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
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Name of the `<meta>` tag whose `content` may override the defaults.
pub const CONFIG_META_NAME: &str = "recipe-dashboard-config";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api_root: String,
    pub login_path: String,
    pub dashboard_path: String,
    /// Marker in the url fragment left behind by an OAuth redirect.
    pub oauth_fragment_marker: String,
    /// Local storage key the browser auth provider persists the session under.
    pub auth_storage_key: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_root: "/api".to_owned(),
            login_path: "/login".to_owned(),
            dashboard_path: "/dashboard".to_owned(),
            oauth_fragment_marker: "access_token".to_owned(),
            auth_storage_key: "recipe-dashboard-auth-token".to_owned(),
        }
    }
}

impl DashboardConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Unable to parse dashboard configuration")?;
        if !config.login_path.starts_with('/') {
            anyhow::bail!("login_path must be absolute: {}", config.login_path);
        }
        if !config.dashboard_path.starts_with('/') {
            anyhow::bail!("dashboard_path must be absolute: {}", config.dashboard_path);
        }
        Ok(Self {
            api_root: config.api_root.trim_end_matches('/').to_owned(),
            ..config
        })
    }

    /// Returns true if the given url fragment still carries OAuth redirect artifacts.
    pub fn has_oauth_artifacts(&self, fragment: &str) -> bool {
        !self.oauth_fragment_marker.is_empty() && fragment.contains(&self.oauth_fragment_marker)
    }
}
