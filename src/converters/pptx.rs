//! PowerPoint (`.pptx`) → Markdown.
//!
//! Each `ppt/slides/slideN.xml` becomes a `## Slide N` section, ordered by N.
//! Paragraphs (`<a:p>`) become one line each with the title placeholder's
//! text first. Speaker notes are found through the slide's relationships
//! part and appended as a block quote.

use super::ooxml::{self, Archive};
use crate::error::ConverterError;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_SLIDE_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

static RE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<p:sp\b.*?</p:sp>").unwrap());

static RE_PLACEHOLDER_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<p:ph\b[^>]*\btype="([^"]+)""#).unwrap());

const NOTES_REL_SUFFIX: &str = "/notesSlide";

pub fn pptx_to_markdown(bytes: &[u8]) -> Result<String, ConverterError> {
    let mut archive = ooxml::open_archive(bytes)?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let n = RE_SLIDE_PART.captures(name)?.get(1)?.as_str().parse().ok()?;
            Some((n, name.to_string()))
        })
        .collect();
    if slides.is_empty() {
        return Err(ConverterError::MissingPart("ppt/slides/slide1.xml".into()));
    }
    slides.sort_by_key(|(n, _)| *n);

    let mut sections = Vec::with_capacity(slides.len());
    for (n, part) in &slides {
        let xml = ooxml::read_part(&mut archive, part)?;
        let mut section = format!("## Slide {n}");
        let lines = slide_lines(&xml);
        if !lines.is_empty() {
            section.push_str("\n\n");
            section.push_str(&lines.join("\n"));
        }
        let notes = slide_notes(&mut archive, *n)?;
        if !notes.is_empty() {
            section.push_str("\n\n");
            let quoted: Vec<String> = notes.iter().map(|l| format!("> {l}")).collect();
            section.push_str(&quoted.join("\n>\n"));
        }
        sections.push(section);
    }
    Ok(sections.join("\n\n"))
}

/// Paragraph lines of a slide, title placeholder first.
fn slide_lines(xml: &str) -> Vec<String> {
    let mut title = Vec::new();
    let mut rest = String::with_capacity(xml.len());
    let mut cursor = 0;
    for shape in RE_SHAPE.find_iter(xml) {
        if matches!(placeholder_type(shape.as_str()), Some("title" | "ctrTitle")) {
            title.extend(paragraphs(shape.as_str()));
            rest.push_str(&xml[cursor..shape.start()]);
            cursor = shape.end();
        }
    }
    rest.push_str(&xml[cursor..]);
    title.extend(paragraphs(&rest));
    title
}

/// Body text of the notes page linked from slide `n`, if any.
///
/// The notes page repeats the slide image, number and header placeholders;
/// only `body` placeholders carry the speaker's text.
fn slide_notes(archive: &mut Archive<'_>, n: u32) -> Result<Vec<String>, ConverterError> {
    let rels_part = format!("ppt/slides/_rels/slide{n}.xml.rels");
    let Some(rels) = ooxml::read_optional_part(archive, &rels_part)? else {
        return Ok(Vec::new());
    };
    let Some(rel) = ooxml::relationships(&rels)
        .into_iter()
        .find(|r| r.kind.ends_with(NOTES_REL_SUFFIX))
    else {
        return Ok(Vec::new());
    };
    let part = ooxml::resolve_target("ppt/slides", &rel.target);
    let Some(xml) = ooxml::read_optional_part(archive, &part)? else {
        return Ok(Vec::new());
    };
    Ok(RE_SHAPE
        .find_iter(&xml)
        .filter(|s| placeholder_type(s.as_str()) == Some("body"))
        .flat_map(|s| paragraphs(s.as_str()))
        .collect())
}

fn placeholder_type(shape: &str) -> Option<&str> {
    RE_PLACEHOLDER_TYPE
        .captures(shape)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Non-empty `<a:p>` paragraphs in document order.
fn paragraphs(xml: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Option<String> = None;
    let mut text_start: Option<usize> = None;

    for tag in ooxml::tags(xml) {
        if let Some(start) = text_start {
            if tag.closes("a:t") {
                if let Some(p) = current.as_mut() {
                    p.push_str(&ooxml::unescape_xml(&xml[start..tag.start]));
                }
                text_start = None;
            }
            continue;
        }
        match tag.name {
            "a:p" if tag.closing => {
                if let Some(p) = current.take() {
                    let line = p.split_whitespace().collect::<Vec<_>>().join(" ");
                    if !line.is_empty() {
                        out.push(line);
                    }
                }
            }
            "a:p" if !tag.self_closing => current = Some(String::new()),
            "a:t" if !tag.closing && !tag.self_closing => text_start = Some(tag.end),
            "a:br" if !tag.closing => {
                if let Some(p) = current.as_mut() {
                    p.push(' ');
                }
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn shape(ph: Option<&str>, paras: &[&str]) -> String {
        let ph = ph
            .map(|t| format!(r#"<p:nvSpPr><p:nvPr><p:ph type="{t}"/></p:nvPr></p:nvSpPr>"#))
            .unwrap_or_default();
        let body: String = paras
            .iter()
            .map(|p| format!("<a:p><a:r><a:t>{p}</a:t></a:r></a:p>"))
            .collect();
        format!("<p:sp>{ph}<p:txBody>{body}</p:txBody></p:sp>")
    }

    fn slide(shapes: &[String]) -> String {
        format!(
            r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
            shapes.concat()
        )
    }

    fn pptx(parts: &[(&str, String)]) -> Vec<u8> {
        let mut w = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            w.start_file(*name, zip::write::FileOptions::default())
                .unwrap();
            w.write_all(body.as_bytes()).unwrap();
        }
        w.finish().unwrap().into_inner()
    }

    #[test]
    fn slides_ordered_numerically_with_title_first() {
        let s1 = slide(&[
            shape(None, &["Body one"]),
            shape(Some("title"), &["First"]),
        ]);
        let s2 = slide(&[shape(Some("ctrTitle"), &["Second"])]);
        let s10 = slide(&[shape(None, &["Tenth &amp; last"])]);
        let bytes = pptx(&[
            ("ppt/presentation.xml", "<p:presentation/>".into()),
            ("ppt/slides/slide10.xml", s10),
            ("ppt/slides/slide2.xml", s2),
            ("ppt/slides/slide1.xml", s1),
        ]);
        let md = pptx_to_markdown(&bytes).unwrap();
        assert_eq!(
            md,
            "## Slide 1\n\nFirst\nBody one\n\n## Slide 2\n\nSecond\n\n## Slide 10\n\nTenth & last"
        );
    }

    #[test]
    fn speaker_notes_appended_as_quote() {
        let rels = r#"<Relationships><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide" Target="../notesSlides/notesSlide7.xml"/></Relationships>"#;
        let notes = slide(&[
            shape(Some("sldImg"), &[]),
            shape(Some("body"), &["Remember the demo"]),
            shape(Some("sldNum"), &["1"]),
        ]);
        let bytes = pptx(&[
            ("ppt/slides/slide1.xml", slide(&[shape(Some("title"), &["Hi"])])),
            ("ppt/slides/_rels/slide1.xml.rels", rels.into()),
            ("ppt/notesSlides/notesSlide7.xml", notes),
        ]);
        let md = pptx_to_markdown(&bytes).unwrap();
        assert_eq!(md, "## Slide 1\n\nHi\n\n> Remember the demo");
    }

    #[test]
    fn no_slides_fails() {
        let bytes = pptx(&[("ppt/presentation.xml", "<p:presentation/>".into())]);
        assert!(matches!(
            pptx_to_markdown(&bytes),
            Err(ConverterError::MissingPart(_))
        ));
    }
}
