//! Attachment helpers: a small set of functions for working with
//! attachments that operate on the raw MIME tree, without requiring the
//! `flatten`/`builder` overlays.

use crate::{Header, MimePart, PartKind};

/// True iff `part` is a leaf and either carries an `attachment`
/// disposition, or its media type isn't `text/*`, `multipart/*`, or
/// `message/*`.
pub fn is_attachment(part: &MimePart) -> bool {
    if part.kind() != PartKind::Leaf {
        return false;
    }

    let is_attachment_disposition = part
        .headers()
        .content_disposition()
        .ok()
        .flatten()
        .map(|cd| cd.value.eq_ignore_ascii_case("attachment"))
        .unwrap_or(false);
    if is_attachment_disposition {
        return true;
    }

    let media_type = part
        .headers()
        .content_type()
        .ok()
        .flatten()
        .map(|ct| ct.value.to_ascii_lowercase())
        .unwrap_or_else(|| "text/plain".to_string());

    !(media_type.starts_with("text/")
        || media_type.starts_with("multipart/")
        || media_type.starts_with("message/"))
}

/// Depth-first collection of every part in `message` for which
/// `is_attachment` holds.
pub fn find_attachments<'a>(message: &'a MimePart<'a>) -> Vec<&'a MimePart<'a>> {
    let mut out = vec![];
    collect_attachments(message, &mut out);
    out
}

fn collect_attachments<'a>(part: &'a MimePart<'a>, out: &mut Vec<&'a MimePart<'a>>) {
    if is_attachment(part) {
        out.push(part);
        return;
    }
    if part.kind() == PartKind::Multipart {
        for child in part.child_parts() {
            collect_attachments(child, out);
        }
    }
}

const MIGRATED_HEADERS: [&str; 3] = [
    "Content-Type",
    "Content-Transfer-Encoding",
    "Content-Disposition",
];

/// Adds `attachment` to `message`. If `message`'s root is already
/// `multipart/mixed`, the attachment is simply appended as a new child.
/// Otherwise the root's current content is wrapped: a new `multipart/mixed`
/// root is created, the original content becomes its first child (keeping
/// its `Content-Type`/`Content-Transfer-Encoding`/`Content-Disposition`),
/// `attachment` becomes its second child, and every other header
/// (addressing headers, `Subject`, ...) stays on the new root.
pub fn add_attachment<'a>(message: MimePart<'a>, attachment: MimePart<'a>) -> MimePart<'a> {
    let already_mixed = message.kind() == PartKind::Multipart
        && message
            .headers()
            .content_type()
            .ok()
            .flatten()
            .map(|ct| ct.value.eq_ignore_ascii_case("multipart/mixed"))
            .unwrap_or(false);

    if already_mixed {
        let mut message = message;
        message.child_parts_mut().push(attachment);
        return message;
    }

    let mut first_child = message;
    let mut root_headers: Vec<Header<'a>> = vec![];
    let mut child_headers: Vec<Header<'a>> = vec![];

    for hdr in first_child.headers_mut().drain(..) {
        let name = hdr.get_name();
        if MIGRATED_HEADERS
            .iter()
            .any(|migrated| name.eq_ignore_ascii_case(migrated))
        {
            child_headers.push(hdr);
        } else {
            root_headers.push(hdr);
        }
    }
    first_child.headers_mut().extend(child_headers);

    let mut root = MimePart::new_multipart("multipart/mixed", vec![first_child, attachment], None);
    for hdr in root_headers {
        root.headers_mut().push(hdr);
    }
    root
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mimepart::AttachmentOptions;

    #[test]
    fn is_attachment_classifies_by_disposition_and_media_type() {
        let plain = MimePart::new_text_plain("hi");
        assert!(!is_attachment(&plain));

        let pdf = MimePart::new_binary("application/pdf", b"%PDF", None);
        assert!(is_attachment(&pdf));

        let inline_image = MimePart::new_binary(
            "image/png",
            b"\x89PNG",
            Some(&AttachmentOptions {
                file_name: None,
                inline: true,
                content_id: Some("logo".to_string()),
            }),
        );
        // Not text/multipart/message, so still an attachment regardless of
        // the inline disposition.
        assert!(is_attachment(&inline_image));
    }

    #[test]
    fn find_attachments_depth_first() {
        let msg = MimePart::new_multipart(
            "multipart/mixed",
            vec![
                MimePart::new_text_plain("body"),
                MimePart::new_binary("application/pdf", b"%PDF", None),
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
            Some("b1"),
        );
        let found = find_attachments(&msg);
        k9::assert_equal!(found.len(), 2);
    }

    #[test]
    fn add_attachment_wraps_flat_text_into_mixed() {
        let msg = MimePart::parse(concat!(
            "Subject: hi\n",
            "From: me@example.com\n",
            "To: you@example.com\n",
            "Content-Type: text/plain; charset=utf-8\n",
            "\n",
            "hello\n"
        ))
        .unwrap();

        let attachment = MimePart::new_binary("application/pdf", b"%PDF", None);
        let combined = add_attachment(msg, attachment);

        let ct = combined.headers().content_type().unwrap().unwrap();
        k9::assert_equal!(ct.value, "multipart/mixed".to_string());
        k9::assert_equal!(combined.child_parts().len(), 2);

        let first = &combined.child_parts()[0];
        let first_ct = first.headers().content_type().unwrap().unwrap();
        k9::assert_equal!(first_ct.value, "text/plain".to_string());

        // Addressing headers stayed on the root, not the first child.
        assert!(combined.headers().from().unwrap().is_some());
        assert!(first.headers().from().unwrap().is_none());
        k9::assert_equal!(
            combined.headers().subject().unwrap(),
            Some("hi".to_string())
        );
    }

    #[test]
    fn add_attachment_appends_to_existing_mixed() {
        let msg = MimePart::new_multipart(
            "multipart/mixed",
            vec![MimePart::new_text_plain("body")],
            Some("b2"),
        );
        let attachment = MimePart::new_binary("application/pdf", b"%PDF", None);
        let combined = add_attachment(msg, attachment);
        k9::assert_equal!(combined.child_parts().len(), 2);
    }
}
