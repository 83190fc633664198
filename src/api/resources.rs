//! Calendar resources: `/a/feeds/calendar/resource/2.0/{domain}`.

use crate::error::GamResult;
use crate::http::Transport;
use crate::xml::{property_entry, Properties};

use super::{all_property_pages, segment};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resource {
    pub id: String,
    pub common_name: String,
    pub email: String,
    pub description: String,
    pub kind: String,
}

impl Resource {
    fn from_properties(props: &Properties) -> Self {
        Self {
            id: props.value("resourceId").to_string(),
            common_name: props.value("resourceCommonName").to_string(),
            email: props.value("resourceEmail").to_string(),
            description: props.value("resourceDescription").to_string(),
            kind: props.value("resourceType").to_string(),
        }
    }
}

/// Fields written on create or update; `None` is left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFields {
    pub common_name: Option<String>,
    pub description: Option<String>,
    pub kind: Option<String>,
}

pub struct Resources<'a> {
    transport: &'a Transport,
    base: &'a str,
    domain: &'a str,
}

impl<'a> Resources<'a> {
    pub fn new(transport: &'a Transport, base: &'a str, domain: &'a str) -> Self {
        Self {
            transport,
            base,
            domain,
        }
    }

    fn resources_url(&self) -> String {
        format!("{}/a/feeds/calendar/resource/2.0/{}/", self.base, self.domain)
    }

    fn resource_url(&self, id: &str) -> String {
        format!("{}{}", self.resources_url(), segment(id))
    }

    fn body(id: &str, fields: &ResourceFields) -> String {
        property_entry([
            ("resourceId", Some(id)),
            ("resourceCommonName", fields.common_name.as_deref()),
            ("resourceDescription", fields.description.as_deref()),
            ("resourceType", fields.kind.as_deref()),
        ])
    }

    pub async fn create_resource(&self, id: &str, fields: &ResourceFields) -> GamResult<()> {
        self.transport
            .post_xml(&self.resources_url(), Self::body(id, fields))
            .await?;
        Ok(())
    }

    pub async fn retrieve_resource(&self, id: &str) -> GamResult<Resource> {
        let entry = self
            .transport
            .get_xml(&self.resource_url(id))
            .await?
            .into_entry()?;
        Ok(Resource::from_properties(&entry.properties()))
    }

    pub async fn update_resource(&self, id: &str, fields: &ResourceFields) -> GamResult<()> {
        self.transport
            .put_xml(&self.resource_url(id), Self::body(id, fields))
            .await?;
        Ok(())
    }

    pub async fn delete_resource(&self, id: &str) -> GamResult<()> {
        self.transport.delete(&self.resource_url(id)).await
    }

    pub async fn all_resources(&self) -> GamResult<Vec<Resource>> {
        let props = all_property_pages(self.transport, &self.resources_url()).await?;
        Ok(props.iter().map(Resource::from_properties).collect())
    }
}
