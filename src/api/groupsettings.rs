//! Group settings (JSON): `/groups/v1/groups/{email}`.

use serde_json::{Map, Value};

use crate::error::GamResult;
use crate::http::Transport;

use super::segment;

/// Settings keyed by their camelCase API names.
pub type SettingsMap = Map<String, Value>;

pub struct GroupSettings<'a> {
    transport: &'a Transport,
    base: &'a str,
}

impl<'a> GroupSettings<'a> {
    pub fn new(transport: &'a Transport, base: &'a str) -> Self {
        Self { transport, base }
    }

    fn url(&self, group_email: &str) -> String {
        format!("{}/groups/v1/groups/{}?alt=json", self.base, segment(group_email))
    }

    pub async fn retrieve(&self, group_email: &str) -> GamResult<SettingsMap> {
        self.transport.get_json(&self.url(group_email)).await
    }

    /// Changes only the keys present in `changes`; returns the full settings.
    pub async fn update(&self, group_email: &str, changes: &SettingsMap) -> GamResult<SettingsMap> {
        self.transport.patch_json(&self.url(group_email), changes).await
    }
}
