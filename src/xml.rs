//! Atom/GData XML processing
//!
//! Responses are decoded with a quick-xml event loop into a flat, loosely
//! typed model: a [`Document`] holds the feed-level elements and one
//! [`Entry`] per `<entry>`, each entry holding every descendant element in
//! document order. The API clients pick the elements they care about by
//! local name, which keeps the parser independent of namespace prefixes
//! (`apps:`, `gCal:`, `gAcl:`, `gd:`, or none).
//!
//! Requests are built with [`Node`], a small tree that renders escaped XML.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::trace;

use crate::error::{ApiError, GamError, GamResult};
use crate::sanitize::{xml_attribute, xml_text};

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub const APPS_NS: &str = "http://schemas.google.com/apps/2006";
pub const GD_NS: &str = "http://schemas.google.com/g/2005";
pub const GCAL_NS: &str = "http://schemas.google.com/gCal/2005";
pub const GACL_NS: &str = "http://schemas.google.com/acl/2007";
pub const KIND_SCHEME: &str = "http://schemas.google.com/g/2005#kind";

/// One element with its attributes and direct text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written in the document, e.g. `apps:login`
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
}

impl Element {
    pub fn local_name(&self) -> &str {
        local(&self.name)
    }

    /// Attribute by qualified or local name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key || local(k) == key)
            .map(|(_, v)| v.as_str())
    }
}

fn local(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// Ordered name/value pairs from `<apps:property name=".." value=".."/>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(Vec<(String, String)>);

impl Properties {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value or the empty string.
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    pub fn is_true(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Properties::default();
        for (k, v) in iter {
            props.insert(k, v);
        }
        props
    }
}

/// An `<entry>` (or the feed itself) flattened to its descendants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    /// Attributes of the `<entry>` element, e.g. `gd:etag`
    pub attrs: Vec<(String, String)>,
    pub elements: Vec<Element>,
}

impl Entry {
    pub fn first(&self, local_name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.local_name() == local_name)
    }

    pub fn all<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements
            .iter()
            .filter(move |e| e.local_name() == local_name)
    }

    pub fn text(&self, local_name: &str) -> Option<&str> {
        self.first(local_name).map(|e| e.text.as_str())
    }

    /// Attribute `attr` of the first element named `local_name`.
    pub fn attr_of(&self, local_name: &str, attr: &str) -> Option<&str> {
        self.first(local_name).and_then(|e| e.attr(attr))
    }

    /// `<link>` whose `rel` equals or ends with `rel`.
    pub fn link(&self, rel: &str) -> Option<&Element> {
        self.all("link").find(|l| {
            l.attr("rel")
                .is_some_and(|r| r == rel || r.ends_with(&format!("#{}", rel)))
        })
    }

    pub fn link_href(&self, rel: &str) -> Option<String> {
        self.link(rel).and_then(|l| l.attr("href")).map(str::to_string)
    }

    pub fn properties(&self) -> Properties {
        self.all("property")
            .filter_map(|p| Some((p.attr("name")?, p.attr("value").unwrap_or(""))))
            .collect()
    }

    pub fn etag(&self) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| local(k) == "etag")
            .map(|(_, v)| v.as_str())
    }
}

/// A parsed response: feed-level elements plus entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub feed: Entry,
    pub entries: Vec<Entry>,
}

impl Document {
    /// The `rel="next"` link of a paged feed.
    pub fn next_link(&self) -> Option<String> {
        self.feed.link_href("next")
    }

    pub fn title(&self) -> &str {
        self.feed.text("title").unwrap_or("")
    }

    /// The single entry of an entry document.
    pub fn into_entry(self) -> GamResult<Entry> {
        self.entries
            .into_iter()
            .next()
            .ok_or_else(|| GamError::Xml("response contains no entry".to_string()))
    }
}

fn element_from(start: &BytesStart<'_>) -> GamResult<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| GamError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.push((key, value));
    }
    Ok(Element {
        name,
        attrs,
        text: String::new(),
    })
}

/// Parses an Atom feed or entry.
///
/// # Examples
///
/// ```
/// let doc = gam::xml::parse(r#"<entry xmlns:apps="http://schemas.google.com/apps/2006">
///   <apps:property name="groupId" value="sales@example.com"/>
/// </entry>"#).unwrap();
/// let entry = doc.into_entry().unwrap();
/// assert_eq!(entry.properties().get("groupId"), Some("sales@example.com"));
/// ```
pub fn parse(xml: &str) -> GamResult<Document> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut doc = Document::default();
    let mut current: Option<Entry> = None;
    // Index into the active container for each open element; None for <entry>.
    let mut stack: Vec<Option<usize>> = Vec::new();
    let mut entry_depth: Option<usize> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| {
                GamError::Xml(format!("at position {}: {}", reader.buffer_position(), e))
            })?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let element = element_from(e)?;
                if element.local_name() == "entry" && current.is_none() {
                    let entry = Entry {
                        attrs: element.attrs,
                        elements: Vec::new(),
                    };
                    if is_empty {
                        doc.entries.push(entry);
                    } else {
                        current = Some(entry);
                        entry_depth = Some(stack.len());
                        stack.push(None);
                    }
                } else {
                    let container = match current.as_mut() {
                        Some(entry) => entry,
                        None => &mut doc.feed,
                    };
                    container.elements.push(element);
                    if !is_empty {
                        stack.push(Some(container.elements.len() - 1));
                    }
                }
            }
            Event::Text(ref t) => {
                let text = t.unescape()?;
                append_text(&mut doc, &mut current, &stack, &text);
            }
            Event::CData(ref c) => {
                let text = String::from_utf8_lossy(c).into_owned();
                append_text(&mut doc, &mut current, &stack, &text);
            }
            Event::End(_) => {
                stack.pop();
                if entry_depth == Some(stack.len()) {
                    if let Some(entry) = current.take() {
                        doc.entries.push(entry);
                    }
                    entry_depth = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    trace!("parsed document with {} entries", doc.entries.len());
    Ok(doc)
}

fn append_text(doc: &mut Document, current: &mut Option<Entry>, stack: &[Option<usize>], text: &str) {
    if let Some(Some(idx)) = stack.last() {
        let container = match current.as_mut() {
            Some(entry) => entry,
            None => &mut doc.feed,
        };
        if let Some(element) = container.elements.get_mut(*idx) {
            element.text.push_str(text);
        }
    }
}

/// Decodes `<AppsForYourDomainErrors>` bodies.
pub fn parse_error_body(body: &str) -> Option<ApiError> {
    if !body.contains("AppsForYourDomainErrors") {
        return None;
    }
    let doc = parse(body).ok()?;
    let error = doc.feed.first("error")?;
    Some(ApiError {
        status: 0,
        reason: error.attr("reason").unwrap_or_default().to_string(),
        invalid_input: error.attr("invalidInput").unwrap_or_default().to_string(),
        error_code: error.attr("errorCode").unwrap_or_default().to_string(),
        body: String::new(),
    })
}

/// Request body builder.
///
/// # Examples
///
/// ```
/// use gam::xml::Node;
///
/// let xml = Node::new("apps:property").attr("name", "label").attr("value", "A&B").render();
/// assert_eq!(xml, r#"<apps:property name="label" value="A&amp;B"/>"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    /// Renders with an XML declaration.
    pub fn document(&self) -> String {
        format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", self.render())
    }

    fn render_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&xml_attribute(v));
            out.push('"');
        }
        if self.text.is_none() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&xml_text(text));
        }
        for child in &self.children {
            child.render_into(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// `<atom:entry>` with the apps namespace declared.
pub fn apps_entry() -> Node {
    Node::new("atom:entry")
        .attr("xmlns:atom", ATOM_NS)
        .attr("xmlns:apps", APPS_NS)
}

/// A property entry document. Properties with `None` values are omitted.
pub fn property_entry<'a, I>(props: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    apps_entry()
        .children(props.into_iter().filter_map(|(name, value)| {
            value.map(|v| Node::new("apps:property").attr("name", name).attr("value", v))
        }))
        .document()
}

pub fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_FEED: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<feed xmlns='http://www.w3.org/2005/Atom' xmlns:apps='http://schemas.google.com/apps/2006'>
  <title type='text'>Users</title>
  <link rel='next' type='application/atom+xml' href='https://apps-apis.google.com/a/feeds/example.com/user/2.0?startUsername=mike'/>
  <entry>
    <id>https://apps-apis.google.com/a/feeds/example.com/user/2.0/jsmith</id>
    <apps:login userName='jsmith' suspended='false' admin='true'/>
    <apps:name familyName='Smith' givenName='John'/>
  </entry>
  <entry>
    <id>https://apps-apis.google.com/a/feeds/example.com/user/2.0/ajones</id>
    <apps:login userName='ajones' suspended='true' admin='false'/>
  </entry>
</feed>"#;

    #[test]
    fn feed_entries_and_next_link() {
        let doc = parse(USER_FEED).unwrap();
        assert_eq!(doc.title(), "Users");
        assert_eq!(doc.entries.len(), 2);
        assert_eq!(
            doc.next_link().as_deref(),
            Some("https://apps-apis.google.com/a/feeds/example.com/user/2.0?startUsername=mike")
        );
        let first = &doc.entries[0];
        assert_eq!(first.attr_of("login", "userName"), Some("jsmith"));
        assert_eq!(first.attr_of("name", "givenName"), Some("John"));
        assert!(first.text("id").unwrap().ends_with("/jsmith"));
        assert!(doc.entries[1].first("name").is_none());
    }

    #[test]
    fn nested_text_stays_with_its_element() {
        let doc = parse(
            "<entry><gd:name><gd:fullName>Ann Lee</gd:fullName></gd:name><title>t</title></entry>",
        )
        .unwrap();
        let entry = doc.into_entry().unwrap();
        assert_eq!(entry.text("fullName"), Some("Ann Lee"));
        assert_eq!(entry.text("name"), Some(""));
        assert_eq!(entry.text("title"), Some("t"));
    }

    #[test]
    fn property_entry_escapes_and_skips_missing() {
        let xml = property_entry([
            ("label", Some("R&D <2024>")),
            ("unused", None),
        ]);
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"<apps:property name="label" value="R&amp;D &lt;2024&gt;"/>"#));
        assert!(!xml.contains("unused"));

        let entry = parse(&xml).unwrap().into_entry().unwrap();
        assert_eq!(entry.properties().get("label"), Some("R&D <2024>"));
    }

    #[test]
    fn error_body_is_recognised() {
        let err = parse_error_body(
            r#"<AppsForYourDomainErrors><error errorCode="1303" invalidInput="orgUnitUsersToMove" reason="EntityDoesNotExist"/></AppsForYourDomainErrors>"#,
        )
        .unwrap();
        assert_eq!(err.reason, "EntityDoesNotExist");
        assert_eq!(err.invalid_input, "orgUnitUsersToMove");
        assert!(parse_error_body("<html>oops</html>").is_none());
    }

    #[test]
    fn entry_etag_and_links() {
        let doc = parse(
            r#"<entry xmlns:gd="http://schemas.google.com/g/2005" gd:etag='"abc"'>
<link rel="http://schemas.google.com/contacts/2008/rel#photo" href="https://x/photo" gd:etag='"p1"'/>
<link rel="edit" href="https://x/edit"/></entry>"#,
        )
        .unwrap();
        let entry = doc.into_entry().unwrap();
        assert_eq!(entry.etag(), Some("\"abc\""));
        assert_eq!(entry.link("photo").and_then(|l| l.attr("etag")), Some("\"p1\""));
        assert_eq!(entry.link_href("edit").as_deref(), Some("https://x/edit"));
    }
}
