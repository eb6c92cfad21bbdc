use crate::mimepart::AttachmentOptions;
use crate::{HeaderMap, MailParsingError, MessageID, MimePart, Result};

/// Constructs a `MimePart` tree from plain-text/HTML content, embedded
/// (`cid:`-referenceable) objects, and attachments, following the
/// decision table from spec.md §4.7: the presence of a plain alternative
/// (A), embedded objects (R), and attachments (P) together select one of
/// five structural shapes.
#[derive(Default)]
pub struct MessageBuilder<'a> {
    text: Option<String>,
    html: Option<String>,
    // <https://amp.dev/documentation/guides-and-tutorials/email/learn/email-spec/amp-email-structure>
    amp_html: Option<String>,
    headers: HeaderMap<'a>,
    embedded: Vec<MimePart<'a>>,
    attached: Vec<MimePart<'a>>,
    stable_content: bool,
}

impl<'a> MessageBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, boundary strings and the `Date`/`Message-ID` generated
    /// by `build` are fixed rather than derived from the clock/rng, so
    /// that the resulting bytes are reproducible. Intended for tests.
    pub fn set_stable_content(&mut self, v: bool) {
        self.stable_content = v;
    }

    pub fn text_plain(&mut self, text: &str) {
        self.text.replace(text.to_string());
    }

    pub fn text_html(&mut self, html: &str) {
        self.html.replace(html.to_string());
    }

    pub fn text_amp_html(&mut self, html: &str) {
        self.amp_html.replace(html.to_string());
    }

    /// Adds a non-text attachment (the `P` flag). Inline-disposition
    /// parts are routed to `embed` instead of `attach` by the caller;
    /// `attach` always produces an attachment, never an embedded object.
    pub fn attach(&mut self, content_type: &str, data: &[u8], opts: Option<&AttachmentOptions>) {
        self.attached.push(MimePart::new_binary(content_type, data, opts));
    }

    /// Adds an object destined for `multipart/related`, referenceable
    /// from the HTML body via `cid:<content_id>` (the `R` flag). Requires
    /// `text_html` to also be called; `build` errors otherwise.
    pub fn embed(&mut self, content_type: &str, data: &[u8], content_id: &str) {
        self.embedded.push(MimePart::new_binary(
            content_type,
            data,
            Some(&AttachmentOptions {
                file_name: None,
                inline: true,
                content_id: Some(content_id.to_string()),
            }),
        ));
    }

    /// Adds an already-constructed part, routing it to `embedded` or
    /// `attached` based on its own `Content-Disposition`.
    pub fn attach_part(&mut self, part: MimePart<'a>) {
        let is_inline = part
            .headers()
            .content_disposition()
            .ok()
            .and_then(|opt_cd| opt_cd.map(|cd| cd.value.eq_ignore_ascii_case("inline")))
            .unwrap_or(false);
        if is_inline {
            self.embedded.push(part);
        } else {
            self.attached.push(part);
        }
    }

    pub fn build(self) -> Result<MimePart<'a>> {
        let MessageBuilder {
            text,
            html,
            amp_html,
            headers,
            embedded,
            attached,
            stable_content,
        } = self;

        let boundary = move |name: &'static str| if stable_content { Some(name) } else { None };

        let text_part = text.as_deref().map(MimePart::new_text_plain);
        let html_leaf = html.as_deref().map(MimePart::new_html);
        let amp_part = amp_html.as_deref().map(|h| MimePart::new_text("text/x-amp-html", h));

        if html_leaf.is_none() && !embedded.is_empty() {
            return Err(MailParsingError::BuildError(
                "embedded objects were added but no HTML part was specified to reference them",
            ));
        }

        // R: an HTML part with embedded objects becomes multipart/related.
        let html_node = match html_leaf {
            Some(h) if !embedded.is_empty() => {
                let mut parts = Vec::with_capacity(embedded.len() + 1);
                parts.push(h);
                parts.extend(embedded);
                Some(MimePart::new_multipart(
                    "multipart/related",
                    parts,
                    boundary("mr-boundary"),
                ))
            }
            other => other,
        };

        // A: plain and html (or amp) become multipart/alternative.
        //
        // Note that, when there are both HTML and AMP HTML parts, we are
        // careful to NOT place the amp part last, as the AMP docs
        // recommend keeping the regular HTML part last since some
        // clients only render the last alternative part.
        let content_node = match (text_part, html_node, amp_part) {
            (Some(t), Some(h), Some(amp)) => MimePart::new_multipart(
                "multipart/alternative",
                vec![t, amp, h],
                boundary("ma-boundary"),
            ),
            (Some(first), Some(second), None)
            | (None, Some(second), Some(first))
            | (Some(first), None, Some(second)) => MimePart::new_multipart(
                "multipart/alternative",
                vec![first, second],
                boundary("ma-boundary"),
            ),
            (Some(only), None, None) | (None, Some(only), None) => only,
            (None, None, Some(_amp)) => {
                return Err(MailParsingError::BuildError(
                    "the AMP email spec requires at least one non-amp part \
                        to be present in the message",
                ))
            }
            (None, None, None) => {
                return Err(MailParsingError::BuildError(
                    "no text or html part was specified",
                ))
            }
        };

        // P: attachments wrap the whole tree above in multipart/mixed.
        let mut root = if !attached.is_empty() {
            let mut parts = Vec::with_capacity(attached.len() + 1);
            parts.push(content_node);
            parts.extend(attached);
            MimePart::new_multipart("multipart/mixed", parts, boundary("mm-boundary"))
        } else {
            content_node
        };

        root.headers_mut().headers.extend(headers.headers);

        if root.headers().mime_version()?.is_none() {
            root.headers_mut().set_mime_version("1.0");
        }

        if root.headers().date()?.is_none() {
            if stable_content {
                root.headers_mut().set_date(
                    chrono::DateTime::parse_from_rfc2822("Tue, 1 Jul 2003 10:52:37 +0200")
                        .expect("test date to be valid"),
                );
            } else {
                root.headers_mut().set_date(chrono::Utc::now());
            };
        }

        if root.headers().message_id()?.is_none() {
            let id = if stable_content {
                "stable-message-id@mailkit.example".to_string()
            } else {
                format!("{}@mailkit.generated", uuid::Uuid::new_v4())
            };
            root.headers_mut().set_message_id(MessageID(id));
        }

        Ok(root)
    }
}

impl<'a> std::ops::Deref for MessageBuilder<'a> {
    type Target = HeaderMap<'a>;
    fn deref(&self) -> &HeaderMap<'a> {
        &self.headers
    }
}

impl<'a> std::ops::DerefMut for MessageBuilder<'a> {
    fn deref_mut(&mut self) -> &mut HeaderMap<'a> {
        &mut self.headers
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic() {
        let mut b = MessageBuilder::new();
        b.set_stable_content(true);
        b.set_subject("Hello there! 🍉");
        b.text_plain("This is the body! 👻");
        b.text_html("<b>this is html 🚀</b>");
        let msg = b.build().unwrap();
        k9::snapshot!(
            msg.to_message_string(),
            r#"
Content-Type: multipart/alternative;\r
\tboundary="ma-boundary"\r
Subject: =?UTF-8?q?Hello_there!_=F0=9F=8D=89?=\r
Mime-Version: 1.0\r
Date: Tue, 1 Jul 2003 10:52:37 +0200\r
Message-ID: <stable-message-id@mailkit.example>\r
\r
--ma-boundary\r
Content-Type: text/plain;\r
\tcharset="utf-8"\r
Content-Transfer-Encoding: quoted-printable\r
\r
This is the body! =F0=9F=91=BB\r
--ma-boundary\r
Content-Type: text/html;\r
\tcharset="utf-8"\r
Content-Transfer-Encoding: quoted-printable\r
\r
<b>this is html =F0=9F=9A=80</b>\r
--ma-boundary--\r

"#
        );
    }

    #[test]
    fn amp() {
        let mut b = MessageBuilder::new();
        b.set_stable_content(true);
        b.set_subject("Hello there! 🍉");
        b.text_plain("This is the body! 👻");
        b.text_html("<b>this is html 🚀</b>");
        b.text_amp_html(
            &r#"<!doctype html>
<html ⚡4email>
<head>
  <meta charset="utf-8">
  <style amp4email-boilerplate>body{visibility:hidden}</style>
  <script async src="https://cdn.ampproject.org/v0.js"></script>
</head>
<body>
Hello World in AMP!
</body>
</html>
"#
            .replace("\n", "\r\n"),
        );
        let msg = b.build().unwrap();
        k9::snapshot!(
            msg.to_message_string(),
            r#"
Content-Type: multipart/alternative;\r
\tboundary="ma-boundary"\r
Subject: =?UTF-8?q?Hello_there!_=F0=9F=8D=89?=\r
Mime-Version: 1.0\r
Date: Tue, 1 Jul 2003 10:52:37 +0200\r
Message-ID: <stable-message-id@mailkit.example>\r
\r
--ma-boundary\r
Content-Type: text/plain;\r
\tcharset="utf-8"\r
Content-Transfer-Encoding: quoted-printable\r
\r
This is the body! =F0=9F=91=BB\r
--ma-boundary\r
Content-Type: text/x-amp-html;\r
\tcharset="utf-8"\r
Content-Transfer-Encoding: quoted-printable\r
\r
<!doctype html>\r
<html =E2=9A=A14email>\r
<head>\r
  <meta charset=3D"utf-8">\r
  <style amp4email-boilerplate>body{visibility:hidden}</style>\r
  <script async src=3D"https://cdn.ampproject.org/v0.js"></script>\r
</head>\r
<body>\r
Hello World in AMP!\r
</body>\r
</html>\r
--ma-boundary\r
Content-Type: text/html;\r
\tcharset="utf-8"\r
Content-Transfer-Encoding: quoted-printable\r
\r
<b>this is html =F0=9F=9A=80</b>\r
--ma-boundary--\r

"#
        );
    }

    #[test]
    fn utf8_attachment_name() {
        let mut b = MessageBuilder::new();
        b.set_stable_content(true);
        b.set_subject("Hello there! 🍉");
        b.text_plain("This is the body! 👻");
        b.attach(
            "text/plain",
            b"hello",
            Some(&AttachmentOptions {
                content_id: None,
                file_name: Some("日本語の添付.txt".to_string()),
                inline: false,
            }),
        );
        let msg = b.build().unwrap();
        k9::snapshot!(
            msg.to_message_string(),
            r#"
Content-Type: multipart/mixed;\r
\tboundary="mm-boundary"\r
Subject: =?UTF-8?q?Hello_there!_=F0=9F=8D=89?=\r
Mime-Version: 1.0\r
Date: Tue, 1 Jul 2003 10:52:37 +0200\r
Message-ID: <stable-message-id@mailkit.example>\r
\r
--mm-boundary\r
Content-Type: text/plain;\r
\tcharset="utf-8"\r
Content-Transfer-Encoding: quoted-printable\r
\r
This is the body! =F0=9F=91=BB\r
--mm-boundary\r
Content-Disposition: attachment;\r
\tfilename*0*=UTF-8''%E6%97%A5%E6%9C%AC%E8%AA%9E%E3%81%AE%E6%B7%BB%E4%BB%98.;\r
\tfilename*1*=txt\r
Content-Type: text/plain;\r
\tname="=?UTF-8?q?=E6=97=A5=E6=9C=AC=E8=AA=9E=E3=81=AE=E6=B7=BB=E4=BB=98.txt?="\r
Content-Transfer-Encoding: base64\r
\r
aGVsbG8=\r
--mm-boundary--\r

"#
        );
    }

    #[test]
    fn embed_object_produces_related_inside_alternative() {
        let mut b = MessageBuilder::new();
        b.set_stable_content(true);
        b.set_subject("Picture inside");
        b.text_plain("Here is a picture.");
        b.text_html(r#"<img src="cid:logo.png">"#);
        b.embed("image/png", b"\x89PNG", "logo.png");
        let msg = b.build().unwrap();

        let ct = msg.headers().content_type().unwrap().unwrap();
        k9::assert_equal!(ct.value, "multipart/alternative".to_string());
        k9::assert_equal!(msg.child_parts().len(), 2);

        let related = &msg.child_parts()[1];
        let related_ct = related.headers().content_type().unwrap().unwrap();
        k9::assert_equal!(related_ct.value, "multipart/related".to_string());
        k9::assert_equal!(related.child_parts().len(), 2);
        let image_cid = related.child_parts()[1]
            .headers()
            .content_id()
            .unwrap()
            .unwrap();
        k9::assert_equal!(image_cid.0, "logo.png".to_string());
    }

    #[test]
    fn embed_without_html_is_an_error() {
        let mut b = MessageBuilder::new();
        b.text_plain("no html here");
        b.embed("image/png", b"\x89PNG", "logo.png");
        assert!(b.build().is_err());
    }

    #[test]
    fn generated_message_id_is_present() {
        let mut b = MessageBuilder::new();
        b.text_plain("hi");
        let msg = b.build().unwrap();
        assert!(msg.headers().message_id().unwrap().is_some());
    }
}
