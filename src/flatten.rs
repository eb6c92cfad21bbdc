//! Flattening overlay: reduces an arbitrary, legally-structured MIME tree
//! down to "the text part(s)" plus a flat attachment list, following
//! MIME's conventional structural idioms (`multipart/alternative`,
//! `multipart/related`, `multipart/mixed`, `cid:` referencing) rather
//! than requiring the caller to walk the tree itself.
//!
//! This is the general-purpose replacement for ad hoc first-text/first-html
//! tree walks: it applies a five-rule classification covering
//! `multipart/related` primary selection and `cid:` reference resolution.

use crate::mimepart::DecodedBody;
use crate::{MailParsingError, MimePart, PartKind, Result, SharedString};
use std::collections::HashSet;

/// A non-text child of a `multipart/related` body, keyed by whichever of
/// `Content-ID`/`Content-Location` it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedObject<'a> {
    pub content_id: Option<String>,
    pub content_location: Option<String>,
    pub part: MimePart<'a>,
}

/// The primary content of a message, as determined by the flattening
/// rules: either a lone plain-text body, or an HTML body together with
/// whatever plain-text alternative and embedded (`cid:`-referenceable)
/// objects accompany it.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimaryText<'a> {
    Plain(SharedString<'a>),
    Html {
        html: SharedString<'a>,
        plain_alt: Option<SharedString<'a>>,
        embedded: Vec<EmbeddedObject<'a>>,
    },
}

/// The result of flattening a MIME tree: its primary text content (if
/// any was found) plus every leaf that isn't part of that text content.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedMessage<'a> {
    pub text: Option<PrimaryText<'a>>,
    pub attachments: Vec<MimePart<'a>>,
}

fn decode_text<'a>(part: &'a MimePart<'a>) -> Result<SharedString<'a>> {
    match part.body()? {
        DecodedBody::Text(t) => Ok(t),
        DecodedBody::Binary(_) => Err(MailParsingError::BodyParse(
            "expected a text body, found binary data".to_string(),
        )),
    }
}

fn effective_type(part: &MimePart) -> Result<String> {
    Ok(part
        .headers()
        .content_type()?
        .map(|ct| ct.value.to_ascii_lowercase())
        .unwrap_or_else(|| "text/plain".to_string()))
}

/// Rule 5: a leaf part. Disposition `attachment` is always an
/// attachment; `text/*` leaves (no disposition, or `inline`) are text
/// parts; anything else is provisionally an attachment, subject to being
/// reclassified as an embedded object once the enclosing HTML's `cid:`
/// references are known (done as a final pass in `MimePart::flatten`).
fn flatten_leaf<'a>(part: &'a MimePart<'a>) -> Result<(Option<PrimaryText<'a>>, Vec<MimePart<'a>>)> {
    let cd = part.headers().content_disposition()?;
    let is_attachment_disposition = cd
        .as_ref()
        .map(|cd| cd.value.eq_ignore_ascii_case("attachment"))
        .unwrap_or(false);

    if is_attachment_disposition {
        return Ok((None, vec![part.clone()]));
    }

    let ct = part.headers().content_type()?;
    let is_text = ct.as_ref().map(|c| c.is_text()).unwrap_or(true);

    if is_text {
        let is_html = ct
            .as_ref()
            .map(|c| c.value.eq_ignore_ascii_case("text/html"))
            .unwrap_or(false);
        let text = decode_text(part)?;
        if is_html {
            return Ok((
                Some(PrimaryText::Html {
                    html: text,
                    plain_alt: None,
                    embedded: vec![],
                }),
                vec![],
            ));
        }
        return Ok((Some(PrimaryText::Plain(text)), vec![]));
    }

    // Non-text leaf, no explicit `attachment` disposition: provisionally
    // an attachment. `MimePart::flatten`'s final pass promotes it to an
    // embedded object if some HTML part's `cid:` URI references it.
    Ok((None, vec![part.clone()]))
}

/// Rule 1: `multipart/alternative`. HTML is preferred over plain; a
/// plain alternative becomes the HTML part's `plain_alt`; any other
/// alternative (a second plain part, an AMP part, ...) becomes an
/// attachment.
fn flatten_alternative<'a>(
    part: &'a MimePart<'a>,
) -> Result<(Option<PrimaryText<'a>>, Vec<MimePart<'a>>)> {
    let mut html: Option<SharedString<'a>> = None;
    let mut html_embedded: Vec<EmbeddedObject<'a>> = vec![];
    let mut plain: Option<SharedString<'a>> = None;
    let mut attachments = vec![];

    for child in part.child_parts() {
        let value = effective_type(child)?;
        if value == "text/html" && html.is_none() {
            html = Some(decode_text(child)?);
            continue;
        }
        if value == "multipart/related" && html.is_none() {
            let (sub_text, sub_attachments) = flatten_related(child)?;
            match sub_text {
                Some(PrimaryText::Html {
                    html: h,
                    plain_alt,
                    embedded,
                }) => {
                    html = Some(h);
                    html_embedded = embedded;
                    if plain.is_none() {
                        plain = plain_alt;
                    }
                }
                Some(PrimaryText::Plain(p)) => {
                    if plain.is_none() {
                        plain = Some(p);
                    }
                }
                None => {}
            }
            attachments.extend(sub_attachments);
            continue;
        }
        if value == "text/plain" && plain.is_none() {
            plain = Some(decode_text(child)?);
            continue;
        }
        attachments.push(child.clone());
    }

    let text = match html {
        Some(h) => Some(PrimaryText::Html {
            html: h,
            plain_alt: plain,
            embedded: html_embedded,
        }),
        None => plain.map(PrimaryText::Plain),
    };

    Ok((text, attachments))
}

/// Rule 2: `multipart/related`. The primary part is the one referenced
/// by the `start` parameter, or the first child when `start` is absent
/// or doesn't match any child (see DESIGN.md: resolved as "first child").
/// Every other child is an embedded object.
fn flatten_related<'a>(
    part: &'a MimePart<'a>,
) -> Result<(Option<PrimaryText<'a>>, Vec<MimePart<'a>>)> {
    let children = part.child_parts();
    if children.is_empty() {
        return Ok((None, vec![]));
    }

    let start = part
        .headers()
        .content_type()?
        .and_then(|ct| ct.get("start"));

    let primary_idx = match &start {
        Some(want) => {
            let want = want.trim_start_matches('<').trim_end_matches('>');
            children
                .iter()
                .position(|c| {
                    c.headers()
                        .content_id()
                        .ok()
                        .flatten()
                        .map(|cid| cid.0 == want)
                        .unwrap_or(false)
                })
                .unwrap_or(0)
        }
        None => 0,
    };

    let mut embedded = vec![];
    for (idx, child) in children.iter().enumerate() {
        if idx == primary_idx {
            continue;
        }
        embedded.push(EmbeddedObject {
            content_id: child.headers().content_id().ok().flatten().map(|m| m.0),
            content_location: child.headers().content_location().ok().flatten(),
            part: child.clone(),
        });
    }

    let primary = &children[primary_idx];
    let (primary_text, mut attachments) = flatten_part(primary)?;

    let text = match primary_text {
        Some(PrimaryText::Html {
            html,
            plain_alt,
            embedded: mut inner,
        }) => {
            inner.extend(embedded);
            Some(PrimaryText::Html {
                html,
                plain_alt,
                embedded: inner,
            })
        }
        Some(PrimaryText::Plain(p)) => {
            // No markup to reference the related siblings from; keep
            // them visible to the caller as attachments rather than
            // silently dropping them.
            attachments.extend(embedded.into_iter().map(|e| e.part));
            Some(PrimaryText::Plain(p))
        }
        None => {
            attachments.extend(embedded.into_iter().map(|e| e.part));
            None
        }
    };

    Ok((text, attachments))
}

/// Rule 3 (and the catch-all for any `multipart/*` subtype other than
/// `alternative`/`related`): children are processed individually. The
/// first child that yields text becomes the overall text; everything
/// else -- other children's attachments, and any subsequent child that
/// also yielded text -- is flattened into the attachment list.
fn flatten_mixed<'a>(part: &'a MimePart<'a>) -> Result<(Option<PrimaryText<'a>>, Vec<MimePart<'a>>)> {
    let mut text = None;
    let mut attachments = vec![];

    for child in part.child_parts() {
        if child.kind() == PartKind::Encapsulated {
            // Rule 4: message/rfc822 is an attachment by default.
            attachments.push(child.clone());
            continue;
        }

        let (child_text, child_attachments) = flatten_part(child)?;
        match child_text {
            Some(t) if text.is_none() => text = Some(t),
            Some(_) => attachments.push(child.clone()),
            None => {}
        }
        attachments.extend(child_attachments);
    }

    Ok((text, attachments))
}

fn flatten_part<'a>(part: &'a MimePart<'a>) -> Result<(Option<PrimaryText<'a>>, Vec<MimePart<'a>>)> {
    if part.kind() == PartKind::Encapsulated {
        return Ok((None, vec![part.clone()]));
    }

    let value = effective_type(part)?;

    if value == "multipart/alternative" {
        flatten_alternative(part)
    } else if value == "multipart/related" {
        flatten_related(part)
    } else if value.starts_with("multipart/") {
        flatten_mixed(part)
    } else {
        flatten_leaf(part)
    }
}

/// Finds every `cid:ID` reference inside `html`, returning the bare IDs
/// (angle brackets, if any, stripped).
fn scan_cid_references(html: &str) -> HashSet<String> {
    let mut found = HashSet::new();
    let lower = html.to_ascii_lowercase();
    let mut search_from = 0;

    while let Some(pos) = lower[search_from..].find("cid:") {
        let start = search_from + pos + 4;
        let rest = &html[start..];
        let end = rest
            .find(|c: char| c == '"' || c == '\'' || c == ')' || c == '>' || c.is_whitespace())
            .unwrap_or(rest.len());
        let id = rest[..end].trim_start_matches('<').trim_end_matches('>');
        if !id.is_empty() {
            found.insert(id.to_string());
        }
        search_from = start + end.max(1);
    }

    found
}

impl<'a> MimePart<'a> {
    /// Flattens this message into its primary text content plus a flat
    /// attachment list, applying the five classification rules above.
    pub fn flatten(&'a self) -> Result<FlattenedMessage<'a>> {
        let (text, mut attachments) = flatten_part(self)?;

        let text = match text {
            Some(PrimaryText::Html {
                html,
                plain_alt,
                mut embedded,
            }) => {
                let referenced = scan_cid_references(&html);
                if !referenced.is_empty() {
                    attachments.retain(|candidate| {
                        let cid = candidate.headers().content_id().ok().flatten().map(|m| m.0);
                        match cid {
                            Some(cid) if referenced.contains(&cid) => {
                                embedded.push(EmbeddedObject {
                                    content_id: Some(cid),
                                    content_location: candidate
                                        .headers()
                                        .content_location()
                                        .ok()
                                        .flatten(),
                                    part: candidate.clone(),
                                });
                                false
                            }
                            _ => true,
                        }
                    });
                }
                Some(PrimaryText::Html {
                    html,
                    plain_alt,
                    embedded,
                })
            }
            other => other,
        };

        Ok(FlattenedMessage { text, attachments })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mimepart::AttachmentOptions;

    #[test]
    fn flatten_plain_only() {
        let part = MimePart::new_text_plain("hello world");
        let flattened = part.flatten().unwrap();
        match flattened.text {
            Some(PrimaryText::Plain(p)) => k9::assert_equal!(p.as_str(), "hello world"),
            other => panic!("expected Plain, got {other:?}"),
        }
        assert!(flattened.attachments.is_empty());
    }

    #[test]
    fn flatten_alternative_prefers_html() {
        let msg = MimePart::new_multipart(
            "multipart/alternative",
            vec![
                MimePart::new_text_plain("plain version"),
                MimePart::new_html("<b>html version</b>"),
            ],
            Some("b1"),
        );
        let flattened = msg.flatten().unwrap();
        match flattened.text {
            Some(PrimaryText::Html { html, plain_alt, .. }) => {
                k9::assert_equal!(html.as_str(), "<b>html version</b>");
                k9::assert_equal!(plain_alt.unwrap().as_str(), "plain version");
            }
            other => panic!("expected Html, got {other:?}"),
        }
        assert!(flattened.attachments.is_empty());
    }

    #[test]
    fn flatten_mixed_with_attachments() {
        let msg = MimePart::new_multipart(
            "multipart/mixed",
            vec![
                MimePart::new_text_plain("body text"),
                MimePart::new_binary("application/pdf", b"%PDF-1.4", None),
                MimePart::new_binary(
                    "image/png",
                    b"\x89PNG",
                    Some(&AttachmentOptions {
                        file_name: None,
                        inline: true,
                        content_id: None,
                    }),
                ),
            ],
            Some("b2"),
        );
        let flattened = msg.flatten().unwrap();
        assert!(matches!(flattened.text, Some(PrimaryText::Plain(_))));
        k9::assert_equal!(flattened.attachments.len(), 2);
    }

    #[test]
    fn flatten_related_promotes_referenced_inline_to_embedded() {
        let image = MimePart::new_binary(
            "image/png",
            b"\x89PNG",
            Some(&AttachmentOptions {
                file_name: None,
                inline: true,
                content_id: Some("logo".to_string()),
            }),
        );
        let html = MimePart::new_html(r#"<img src="cid:logo">"#);
        let related = MimePart::new_multipart("multipart/related", vec![html, image], Some("b3"));

        let flattened = related.flatten().unwrap();
        match flattened.text {
            Some(PrimaryText::Html { embedded, .. }) => {
                k9::assert_equal!(embedded.len(), 1);
                k9::assert_equal!(embedded[0].content_id.as_deref(), Some("logo"));
            }
            other => panic!("expected Html, got {other:?}"),
        }
        assert!(flattened.attachments.is_empty());
    }

    #[test]
    fn flatten_message_rfc822_is_an_attachment() {
        let encapsulated = MimePart::parse(concat!(
            "Content-Type: message/rfc822\n",
            "\n",
            "Subject: inner\n",
            "\n",
            "inner body"
        ))
        .unwrap();
        let msg = MimePart::new_multipart(
            "multipart/mixed",
            vec![MimePart::new_text_plain("outer body"), encapsulated],
            Some("b4"),
        );
        let flattened = msg.flatten().unwrap();
        k9::assert_equal!(flattened.attachments.len(), 1);
        k9::assert_equal!(flattened.attachments[0].kind(), PartKind::Encapsulated);
    }
}
