//! Domain shared contacts profiles: directory visibility and photos.

use regex::Regex;

use crate::error::{GamError, GamResult};
use crate::http::Transport;
use crate::xml;

use super::segment;

/// A user's profile entry, with the raw XML kept for write-back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// `gContact:status indexed`, whether the profile is in the shared directory
    pub indexed: Option<String>,
    pub edit_link: Option<String>,
    pub etag: Option<String>,
    pub photo_link: Option<String>,
    /// Present only when a photo has been uploaded.
    pub photo_etag: Option<String>,
    raw: String,
}

impl Profile {
    pub fn parse(raw: String) -> GamResult<Self> {
        let entry = xml::parse(&raw)?.into_entry()?;
        let photo = entry.link("photo");
        Ok(Self {
            indexed: entry.attr_of("status", "indexed").map(str::to_string),
            edit_link: entry.link_href("edit"),
            etag: entry.etag().map(str::to_string),
            photo_link: photo.and_then(|l| l.attr("href")).map(str::to_string),
            photo_etag: photo.and_then(|l| l.attr("etag")).map(str::to_string),
            raw,
        })
    }

    pub fn has_photo(&self) -> bool {
        self.photo_etag.is_some()
    }

    /// The entry with its `indexed` flag replaced.
    fn with_indexed(&self, indexed: bool) -> GamResult<String> {
        let pattern = Regex::new(r#"(<(?:\w+:)?status\b[^>]*\bindexed=)(["'])(?:true|false)(["'])"#)
            .map_err(|e| GamError::Xml(e.to_string()))?;
        if !pattern.is_match(&self.raw) {
            return Err(GamError::Xml("profile has no status element".to_string()));
        }
        let value = xml::bool_str(indexed);
        Ok(pattern
            .replace(&self.raw, |caps: &regex::Captures<'_>| {
                format!("{}{}{}{}", &caps[1], &caps[2], value, &caps[3])
            })
            .into_owned())
    }
}

pub struct Profiles<'a> {
    transport: &'a Transport,
    base: &'a str,
}

impl<'a> Profiles<'a> {
    pub fn new(transport: &'a Transport, base: &'a str) -> Self {
        Self { transport, base }
    }

    fn url(&self, domain: &str, user: &str) -> String {
        format!(
            "{}/m8/feeds/profiles/domain/{}/full/{}?v=3.0",
            self.base,
            domain,
            segment(user)
        )
    }

    pub async fn profile(&self, domain: &str, user: &str) -> GamResult<Profile> {
        Profile::parse(self.transport.get_text(&self.url(domain, user)).await?)
    }

    /// Shows or hides the user in the domain's shared contacts directory.
    pub async fn set_indexed(&self, domain: &str, user: &str, indexed: bool) -> GamResult<()> {
        let profile = self.profile(domain, user).await?;
        let url = profile
            .edit_link
            .clone()
            .unwrap_or_else(|| self.url(domain, user));
        let body = profile.with_indexed(indexed)?;
        let etag = profile.etag.as_deref().unwrap_or("*");
        self.transport.put_xml_if_match(&url, body, etag).await?;
        Ok(())
    }

    fn photo_url(profile: &Profile) -> GamResult<&str> {
        profile
            .photo_link
            .as_deref()
            .ok_or_else(|| GamError::Xml("profile has no photo link".to_string()))
    }

    pub async fn photo(&self, profile: &Profile) -> GamResult<Vec<u8>> {
        self.transport.get_bytes(Self::photo_url(profile)?).await
    }

    pub async fn update_photo(&self, profile: &Profile, jpeg: Vec<u8>) -> GamResult<()> {
        self.transport
            .put_bytes(Self::photo_url(profile)?, "image/jpeg", jpeg, Some("*"))
            .await
    }

    pub async fn delete_photo(&self, profile: &Profile) -> GamResult<()> {
        self.transport
            .delete_if_match(Self::photo_url(profile)?, "*")
            .await
    }
}
