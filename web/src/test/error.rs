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
use crate::error::{DashboardError, Error};

#[test]
fn test_dashboard_error_messages() {
    assert_eq!(
        DashboardError::Bootstrap(Error::Status(503)).to_string(),
        "Unable to load your account: Status: 503"
    );
    assert_eq!(
        DashboardError::Fetch(Error::Network("offline".to_owned())).to_string(),
        "Unable to load recipe: Network error: offline"
    );
    assert_eq!(
        DashboardError::Toggle(Error::Status(500)).to_string(),
        "Unable to update saved recipes: Status: 500"
    );
}

#[test]
fn test_decoding_failures_are_malformed_data() {
    let err: Error = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, Error::MalformedData(_)));
}
