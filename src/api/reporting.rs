//! Daily domain reports: one POST of a `<rest>` request document, CSV back.

use chrono::{Duration, NaiveDate, Utc};

use crate::error::GamResult;
use crate::http::Transport;
use crate::xml::Node;

pub const REPORT_NAMES: [&str; 7] = [
    "accounts",
    "activity",
    "disk_space",
    "email_clients",
    "quota_limit_accounts",
    "summary",
    "suspended_account",
];

const REST_NS: &str = "google:accounts:rest:protocol";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Reports are complete only for days that have ended in UTC.
pub fn yesterday() -> NaiveDate {
    (Utc::now() - Duration::days(1)).date_naive()
}

fn request_xml(domain: &str, report: &str, date: &str, page: u32) -> String {
    Node::new("rest")
        .attr("xmlns", REST_NS)
        .attr("xmlns:xsi", XSI_NS)
        .child(Node::new("type").text("Report"))
        .child(Node::new("domain").text(domain))
        .child(Node::new("date").text(date))
        .child(Node::new("page").text(page.to_string()))
        .child(Node::new("reportType").text("daily"))
        .child(Node::new("reportName").text(report))
        .document()
}

pub struct Reporting<'a> {
    transport: &'a Transport,
    base: &'a str,
    domain: &'a str,
}

impl<'a> Reporting<'a> {
    pub fn new(transport: &'a Transport, base: &'a str, domain: &'a str) -> Self {
        Self {
            transport,
            base,
            domain,
        }
    }

    /// The CSV text of `report` for `date` (`YYYY-MM-DD`), yesterday when `None`.
    pub async fn retrieve_report(&self, report: &str, date: Option<&str>) -> GamResult<String> {
        let date = match date {
            Some(d) => d.to_string(),
            None => yesterday().format("%Y-%m-%d").to_string(),
        };
        let url = format!("{}/hosted/services/v1.0/reports/ReportingData", self.base);
        self.transport
            .post_text(&url, "application/xml", request_xml(self.domain, report, &date, 1))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_names_domain_report_and_day() {
        let body = request_xml("example.com", "accounts", "2026-10-15", 1);
        assert!(body.contains(r#"<rest xmlns="google:accounts:rest:protocol""#));
        assert!(body.contains("<domain>example.com</domain>"));
        assert!(body.contains("<date>2026-10-15</date>"));
        assert!(body.contains("<reportType>daily</reportType><reportName>accounts</reportName>"));
    }

    #[test]
    fn yesterday_is_before_today() {
        assert!(yesterday() < Utc::now().date_naive());
    }
}
