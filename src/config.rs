use serde::Deserialize;

use crate::error::Error;

/// Settings shared by every [`ActionHandler`](crate::controller::ActionHandler)
/// built from it.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Content type used for payloads that do not declare one.
    pub default_content_type: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            default_content_type: mime::TEXT_HTML.to_string(),
        }
    }
}

impl DispatchConfig {
    pub fn from_yaml(source: &str) -> crate::Result<DispatchConfig> {
        serde_yaml::from_str(source).map_err(Error::other)
    }
}
