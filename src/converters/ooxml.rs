//! Shared helpers for the Office Open XML containers (docx, pptx).
//!
//! OOXML documents are ZIP archives of XML parts. The converters only need
//! text, so rather than building a DOM they walk a flat stream of tags
//! ([`tags`]) and pick out the handful of elements that carry content.

use crate::error::ConverterError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Cursor, Read};
use zip::ZipArchive;

pub(crate) type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

static RE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)([A-Za-z][\w.-]*:[A-Za-z][\w.-]*)(\s[^>]*?)?(/?)>").unwrap());

static RE_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#x[0-9A-Fa-f]+|#[0-9]+|amp|lt|gt|quot|apos);").unwrap());

static RE_RELATIONSHIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<Relationship\b[^>]*>").unwrap());

pub(crate) fn open_archive(bytes: &[u8]) -> Result<Archive<'_>, ConverterError> {
    Ok(ZipArchive::new(Cursor::new(bytes))?)
}

/// Read a required part as UTF-8 text.
pub(crate) fn read_part(archive: &mut Archive<'_>, name: &str) -> Result<String, ConverterError> {
    read_optional_part(archive, name)?.ok_or_else(|| ConverterError::MissingPart(name.to_string()))
}

/// Read a part if the archive has it.
pub(crate) fn read_optional_part(
    archive: &mut Archive<'_>,
    name: &str,
) -> Result<Option<String>, ConverterError> {
    let mut file = match archive.by_name(name) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut buf = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut buf)?;
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// One namespaced tag in an XML part.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tag<'a> {
    /// Qualified name, e.g. `w:p`.
    pub name: &'a str,
    /// Raw attribute text (may be empty).
    pub attrs: &'a str,
    pub closing: bool,
    pub self_closing: bool,
    /// Byte range of the whole tag in the source.
    pub start: usize,
    pub end: usize,
}

impl<'a> Tag<'a> {
    pub fn opens(&self, name: &str) -> bool {
        !self.closing && self.name == name
    }

    pub fn closes(&self, name: &str) -> bool {
        self.closing && self.name == name
    }

    /// Value of attribute `name` (qualified, e.g. `w:val`), unescaped.
    pub fn attr(&self, name: &str) -> Option<String> {
        attr(self.attrs, name)
    }
}

/// Iterate the namespaced tags of an XML part in document order.
///
/// Un-prefixed tags (`<Relationship>`) and processing instructions are
/// skipped; the OOXML content parts are fully prefixed.
pub(crate) fn tags(xml: &str) -> impl Iterator<Item = Tag<'_>> {
    RE_TAG.captures_iter(xml).map(|c| {
        let whole = c.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
        Tag {
            name: c.get(2).map(|m| m.as_str()).unwrap_or(""),
            attrs: c.get(3).map(|m| m.as_str()).unwrap_or(""),
            closing: !c[1].is_empty(),
            self_closing: !c[4].is_empty(),
            start: whole.0,
            end: whole.1,
        }
    })
}

/// Extract attribute `name` from raw attribute text.
pub(crate) fn attr(attrs: &str, name: &str) -> Option<String> {
    let needle = format!("{name}=");
    let mut search = attrs;
    loop {
        let at = search.find(&needle)?;
        let preceded_ok = at == 0
            || search[..at]
                .chars()
                .next_back()
                .is_some_and(char::is_whitespace);
        let rest = &search[at + needle.len()..];
        if preceded_ok {
            let quote = rest.chars().next()?;
            if quote != '"' && quote != '\'' {
                return None;
            }
            let body = &rest[1..];
            let close = body.find(quote)?;
            return Some(unescape_xml(&body[..close]));
        }
        search = rest;
    }
}

/// Replace the predefined XML entities and numeric character references.
pub(crate) fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    RE_ENTITY
        .replace_all(s, |c: &regex::Captures<'_>| {
            let ent = &c[1];
            match ent {
                "amp" => "&".to_string(),
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                _ => {
                    let code = if let Some(hex) = ent.strip_prefix("#x") {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        ent[1..].parse::<u32>().ok()
                    };
                    code.and_then(char::from_u32)
                        .map(String::from)
                        .unwrap_or_else(|| c[0].to_string())
                }
            }
        })
        .into_owned()
}

/// A relationship from a `_rels/*.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub kind: String,
    pub target: String,
}

pub(crate) fn relationships(rels_xml: &str) -> Vec<Relationship> {
    RE_RELATIONSHIP
        .find_iter(rels_xml)
        .filter_map(|m| {
            let tag = m.as_str();
            Some(Relationship {
                kind: attr(tag, "Type")?,
                target: attr(tag, "Target")?,
            })
        })
        .collect()
}

/// Resolve a relationship target against the directory of the source part.
///
/// `resolve_target("ppt/slides", "../notesSlides/notesSlide1.xml")`
/// → `ppt/notesSlides/notesSlide1.xml`.
pub(crate) fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_entities() {
        assert_eq!(unescape_xml("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(unescape_xml("&#65;&#x42;&quot;&apos;"), "AB\"'");
        assert_eq!(unescape_xml("&bogus;"), "&bogus;");
        assert_eq!(unescape_xml("plain"), "plain");
    }

    #[test]
    fn tag_stream() {
        let xml = r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t xml:space="preserve">Hi</w:t></w:r></w:p>"#;
        let names: Vec<(&str, bool, bool)> = tags(xml)
            .map(|t| (t.name, t.closing, t.self_closing))
            .collect();
        assert_eq!(names[0], ("w:p", false, false));
        assert_eq!(names[2], ("w:pStyle", false, true));
        let style = tags(xml).find(|t| t.opens("w:pStyle")).unwrap();
        assert_eq!(style.attr("w:val").as_deref(), Some("Heading1"));
        assert!(tags(xml).any(|t| t.closes("w:t")));
    }

    #[test]
    fn attr_requires_whole_name() {
        assert_eq!(attr(r#" xw:val="no" w:val="yes""#, "w:val").as_deref(), Some("yes"));
        assert_eq!(attr(r#" w:val='single'"#, "w:val").as_deref(), Some("single"));
        assert_eq!(attr(r#" w:other="x""#, "w:val"), None);
    }

    #[test]
    fn parse_relationships() {
        let rels = r#"<?xml version="1.0"?><Relationships xmlns="x"><Relationship Id="rId1" Type="http://schemas/notesSlide" Target="../notesSlides/notesSlide3.xml"/></Relationships>"#;
        let r = relationships(rels);
        assert_eq!(r.len(), 1);
        assert!(r[0].kind.ends_with("/notesSlide"));
        assert_eq!(
            resolve_target("ppt/slides", &r[0].target),
            "ppt/notesSlides/notesSlide3.xml"
        );
        assert_eq!(resolve_target("ppt/slides", "/ppt/x.xml"), "ppt/x.xml");
    }
}
