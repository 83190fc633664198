//! Admin audit events (JSON): `/apps/reporting/audit/v1/{customerId}/{applicationId}`.

use crate::error::GamResult;
use crate::http::Transport;

use super::segment;

/// Application id of the control panel in the audit API.
pub const ADMIN_APPLICATION_ID: &str = "207535951991";

/// Optional filters of an audit query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditQuery {
    pub actor_email: Option<String>,
    pub event_name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl AuditQuery {
    fn query_string(&self) -> String {
        let params: Vec<String> = [
            ("actorEmail", &self.actor_email),
            ("eventName", &self.event_name),
            ("startTime", &self.start_time),
            ("endTime", &self.end_time),
        ]
        .iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| format!("{}={}", name, segment(v))))
        .collect();
        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }
}

pub struct AdminAudit<'a> {
    transport: &'a Transport,
    base: &'a str,
}

impl<'a> AdminAudit<'a> {
    pub fn new(transport: &'a Transport, base: &'a str) -> Self {
        Self { transport, base }
    }

    /// The raw JSON document of matching events.
    pub async fn retrieve_audit(&self, customer_id: &str, query: &AuditQuery) -> GamResult<String> {
        let url = format!(
            "{}/apps/reporting/audit/v1/{}/{}{}",
            self.base,
            segment(customer_id),
            ADMIN_APPLICATION_ID,
            query.query_string()
        );
        self.transport.get_text(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_form_one_query_string() {
        assert_eq!(AuditQuery::default().query_string(), "");
        let query = AuditQuery {
            actor_email: Some("admin@example.com".into()),
            event_name: Some("CHANGE_PASSWORD".into()),
            ..AuditQuery::default()
        };
        assert_eq!(
            query.query_string(),
            "?actorEmail=admin@example.com&eventName=CHANGE_PASSWORD"
        );
    }
}
