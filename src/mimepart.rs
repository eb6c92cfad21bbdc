use crate::header::{HeaderConformance, HeaderParseResult};
use crate::headermap::HeaderMap;
use crate::{Header, MailParsingError, MessageID, MimeParameters, Result, SharedString};
use charset::Charset;
use std::convert::TryInto;
use std::str::FromStr;

/// Define our own because data_encoding::BASE64_MIME, despite its name,
/// is not RFC2045 compliant, and will not ignore spaces
const BASE64_RFC2045: data_encoding::Encoding = data_encoding_macro::new_encoding! {
    symbols: "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/",
    padding: '=',
    ignore: " \r\n\t",
    wrap_width: 76,
    wrap_separator: "\r\n",
};

#[derive(Debug, Clone, PartialEq)]
pub struct MimePart<'a> {
    /// The bytes that comprise this part, from its beginning to its end
    bytes: SharedString<'a>,
    /// The parsed headers from the start of bytes
    headers: HeaderMap<'a>,
    /// The index into bytes of the first non-header byte.
    body_offset: usize,
    body_len: usize,
    header_conformance: HeaderConformance,
    parts: Vec<Self>,
    /// For multipart, the content the precedes the first boundary
    intro: SharedString<'a>,
    /// For multipart, the content the follows the last boundary
    outro: SharedString<'a>,
}

struct Rfc2045Info {
    encoding: ContentTransferEncoding,
    charset: Charset,
    content_type: Option<MimeParameters>,
    is_text: bool,
    is_multipart: bool,
    attachment_options: Option<AttachmentOptions>,
}

impl Rfc2045Info {
    fn new(headers: &HeaderMap, check_mime_version: bool) -> Result<Self> {
        if check_mime_version {
            if let Some(v) = headers.mime_version()? {
                if v != "1.0" {
                    return Err(MailParsingError::UnknownMimeVersion(v));
                }
            }
        }

        let content_transfer_encoding = headers.content_transfer_encoding()?;

        let encoding = match &content_transfer_encoding {
            Some(cte) => ContentTransferEncoding::from_str(&cte.value)?,
            None => ContentTransferEncoding::SevenBit,
        };

        let content_type = headers.content_type()?;
        let charset = if let Some(ct) = &content_type {
            ct.get("charset")
        } else {
            None
        };
        let charset = charset.unwrap_or_else(|| "us-ascii".to_string());

        let charset = Charset::for_label_no_replacement(charset.as_bytes())
            .ok_or_else(|| MailParsingError::BodyParse(format!("unsupported charset {charset}")))?;

        let (is_text, is_multipart) = if let Some(ct) = &content_type {
            (ct.is_text(), ct.is_multipart())
        } else {
            (true, false)
        };

        let content_disposition = headers.content_disposition()?;
        let attachment_options = match content_disposition {
            Some(cd) => {
                let inline = cd.value == "inline";
                let content_id = headers.content_id()?;
                let file_name = cd.get("filename");

                Some(AttachmentOptions {
                    file_name,
                    inline,
                    content_id: content_id.map(|cid| cid.0),
                })
            }
            None => None,
        };

        Ok(Self {
            encoding,
            charset,
            content_type,
            is_text,
            is_multipart,
            attachment_options,
        })
    }
}

impl<'a> MimePart<'a> {
    /// Parse some data into a tree of MimeParts
    pub fn parse<S: TryInto<SharedString<'a>>>(bytes: S) -> Result<Self> {
        let bytes = bytes.try_into().map_err(|_| MailParsingError::NotAscii)?;
        Self::parse_impl(bytes, true)
    }

    fn parse_impl(bytes: SharedString<'a>, check_mime_version: bool) -> Result<Self> {
        let HeaderParseResult {
            headers,
            body_offset,
            overall_conformance: header_conformance,
        } = Header::parse_headers(bytes.clone())?;

        let body_len = bytes.len();

        let mut part = Self {
            bytes,
            headers,
            body_offset,
            body_len,
            header_conformance,
            parts: vec![],
            intro: SharedString::Borrowed(""),
            outro: SharedString::Borrowed(""),
        };

        part.recursive_parse(check_mime_version)?;

        Ok(part)
    }

    /// Returns the boundary parameter for a multipart `Content-Type`, or
    /// `Ok(None)` when `ct` isn't multipart at all. A multipart type with
    /// no `boundary` parameter is `Err(BoundaryMissing)`: recoverable per
    /// spec.md §4.4/§7 -- the caller degrades the part to an opaque leaf
    /// rather than propagating the error.
    fn required_boundary(ct: Option<&MimeParameters>, is_multipart: bool) -> Result<Option<String>> {
        if !is_multipart {
            return Ok(None);
        }
        match ct.and_then(|ct| ct.get("boundary")) {
            Some(b) => Ok(Some(b)),
            None => Err(MailParsingError::BoundaryMissing),
        }
    }

    fn recursive_parse(&mut self, check_mime_version: bool) -> Result<()> {
        let info = Rfc2045Info::new(&self.headers, check_mime_version)?;
        if let Ok(Some(boundary)) =
            Self::required_boundary(info.content_type.as_ref(), info.is_multipart)
        {
            let boundary = format!("\n--{boundary}");
            let raw_body = self
                .bytes
                .slice(self.body_offset.saturating_sub(1)..self.bytes.len());

            let mut iter = memchr::memmem::find_iter(raw_body.as_bytes(), &boundary);
            if let Some(first_boundary_pos) = iter.next() {
                self.intro = raw_body.slice(0..first_boundary_pos);

                // When we create parts, we ignore the original body span in
                // favor of what we're parsing out here now
                self.body_len = 0;

                let mut boundary_end = first_boundary_pos + boundary.len();

                while let Some(part_start) =
                    memchr::memchr(b'\n', &raw_body.as_bytes()[boundary_end..])
                        .map(|p| p + boundary_end + 1)
                {
                    let part_end = iter
                        .next()
                        .map(|p| {
                            // P is the newline; we want to include it in the raw
                            // bytes for this part, so look beyond it
                            p + 1
                        })
                        .unwrap_or(raw_body.len());

                    let child = Self::parse_impl(raw_body.slice(part_start..part_end), false)?;
                    self.parts.push(child);

                    boundary_end = part_end -
                        1 /* newline we adjusted for when assigning part_end */
                        + boundary.len();

                    if boundary_end + 2 > raw_body.len() {
                        break;
                    }
                    if &raw_body.as_bytes()[boundary_end..boundary_end + 2] == b"--" {
                        if let Some(after_boundary) =
                            memchr::memchr(b'\n', &raw_body.as_bytes()[boundary_end..])
                                .map(|p| p + boundary_end + 1)
                        {
                            self.outro = raw_body.slice(after_boundary..raw_body.len());
                        }
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    pub fn header_conformance(&self) -> HeaderConformance {
        self.header_conformance
    }

    /// Classifies this part as a leaf, a multipart container, or an
    /// encapsulated `message/rfc822` part. `message/rfc822` parts carry
    /// their embedded message as an opaque body rather than as child
    /// parts, so they need their own tag distinct from both leaf and
    /// multipart.
    pub fn kind(&self) -> PartKind {
        if let Ok(info) = Rfc2045Info::new(&self.headers, false) {
            if let Some(ct) = &info.content_type {
                if ct.value.eq_ignore_ascii_case("message/rfc822") {
                    return PartKind::Encapsulated;
                }
            }
        }
        if self.parts.is_empty() {
            PartKind::Leaf
        } else {
            PartKind::Multipart
        }
    }

    /// Obtain a reference to the child parts
    pub fn child_parts(&self) -> &[Self] {
        &self.parts
    }

    /// Obtain a mutable reference to the child parts
    pub fn child_parts_mut(&mut self) -> &mut Vec<Self> {
        &mut self.parts
    }

    /// Obtains a reference to the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Obtain a mutable reference to the headers
    pub fn headers_mut<'b>(&'b mut self) -> &'b mut HeaderMap<'a> {
        &mut self.headers
    }

    /// Get the raw, transfer-encoded body
    pub fn raw_body(&self) -> SharedString {
        self.bytes
            .slice(self.body_offset..self.body_len.max(self.body_offset))
    }

    /// Decode transfer decoding and return the body
    pub fn body(&self) -> Result<DecodedBody> {
        let info = Rfc2045Info::new(&self.headers, false)?;

        let bytes = match info.encoding {
            ContentTransferEncoding::Base64 => {
                let data = self.raw_body();
                let bytes = data.as_bytes();
                BASE64_RFC2045.decode(bytes).map_err(|err| {
                    let b = bytes[err.position] as char;
                    let region = &bytes[err.position.saturating_sub(8)..err.position + 8];
                    let region = String::from_utf8_lossy(region);
                    MailParsingError::BodyParse(format!(
                        "base64 decode: {err:#} b={b:?} in {region}"
                    ))
                })?
            }
            ContentTransferEncoding::QuotedPrintable => quoted_printable::decode(
                self.raw_body().as_bytes(),
                quoted_printable::ParseMode::Robust,
            )
            .map_err(|err| {
                MailParsingError::BodyParse(format!("quoted printable decode: {err:#}"))
            })?,
            ContentTransferEncoding::SevenBit
            | ContentTransferEncoding::EightBit
            | ContentTransferEncoding::Binary
                if info.is_text =>
            {
                return Ok(DecodedBody::Text(self.raw_body()));
            }
            ContentTransferEncoding::SevenBit | ContentTransferEncoding::EightBit => {
                let mut bytes = self.raw_body().as_bytes().to_vec();
                bytes.retain(|&b| !b.is_ascii_whitespace());
                return Ok(DecodedBody::Binary(bytes));
            }
            ContentTransferEncoding::Binary => {
                return Ok(DecodedBody::Binary(self.raw_body().as_bytes().to_vec()))
            }
        };

        let (decoded, _malformed) = info.charset.decode_without_bom_handling(&bytes);

        if info.is_text {
            Ok(DecodedBody::Text(decoded.to_string().into()))
        } else {
            Ok(DecodedBody::Binary(decoded.as_bytes().to_vec()))
        }
    }

    /// Re-constitute the message.
    /// Each element will be parsed out, and the parsed form used
    /// to build a new message.
    /// This has the side effect of "fixing" non-conforming elements,
    /// but may come at the cost of "losing" the non-sensical or otherwise
    /// out of spec elements in the rebuilt message
    pub fn rebuild(&self) -> Result<Self> {
        let info = Rfc2045Info::new(&self.headers, false)?;

        let mut children = vec![];
        for part in &self.parts {
            children.push(part.rebuild()?);
        }

        let mut rebuilt = if children.is_empty() {
            let body = self.body()?;
            match body {
                DecodedBody::Text(text) => {
                    let ct = info
                        .content_type
                        .as_ref()
                        .map(|ct| ct.value.as_str())
                        .unwrap_or("text/plain");
                    Self::new_text(ct, text.as_str())
                }
                DecodedBody::Binary(data) => {
                    let ct = info
                        .content_type
                        .as_ref()
                        .map(|ct| ct.value.as_str())
                        .unwrap_or("application/octet-stream");
                    Self::new_binary(ct, &data, info.attachment_options.as_ref())
                }
            }
        } else {
            let ct = info.content_type.ok_or_else(|| {
                MailParsingError::BodyParse(format!(
                    "multipart message has no content-type information!?"
                ))
            })?;
            Self::new_multipart(&ct.value, children, ct.get("boundary").as_deref())
        };

        for hdr in self.headers.iter() {
            // Skip rfc2045 associated headers; we already rebuilt
            // those above
            let name = hdr.get_name();
            if name.eq_ignore_ascii_case("Content-Type")
                || name.eq_ignore_ascii_case("Content-Transfer-Encoding")
                || name.eq_ignore_ascii_case("Content-Disposition")
                || name.eq_ignore_ascii_case("Content-ID")
            {
                continue;
            }

            rebuilt.headers_mut().push(hdr.rebuild()?);
        }

        Ok(rebuilt)
    }

    /// Write the message content to the provided output stream
    pub fn write_message<W: std::io::Write>(&self, out: &mut W) -> Result<()> {
        let line_ending = if self
            .header_conformance
            .contains(HeaderConformance::NON_CANONICAL_LINE_ENDINGS)
        {
            "\n"
        } else {
            "\r\n"
        };

        for hdr in self.headers.iter() {
            hdr.write_header(out)
                .map_err(|_| MailParsingError::WriteMessageIOError)?;
        }
        out.write_all(line_ending.as_bytes())
            .map_err(|_| MailParsingError::WriteMessageIOError)?;

        if self.parts.is_empty() {
            out.write_all(self.raw_body().as_bytes())
                .map_err(|_| MailParsingError::WriteMessageIOError)?;
        } else {
            let info = Rfc2045Info::new(&self.headers, false)?;
            let ct = info.content_type.ok_or_else(|| {
                MailParsingError::WriteMessageWtf(
                    "expected to have Content-Type when there are child parts",
                )
            })?;
            let boundary = ct.get("boundary").ok_or_else(|| {
                MailParsingError::WriteMessageWtf("expected Content-Type to have a boundary")
            })?;
            out.write_all(&self.intro.as_bytes())
                .map_err(|_| MailParsingError::WriteMessageIOError)?;
            for p in &self.parts {
                write!(out, "--{boundary}{line_ending}")
                    .map_err(|_| MailParsingError::WriteMessageIOError)?;
                p.write_message(out)?;
            }
            write!(out, "--{boundary}--{line_ending}")
                .map_err(|_| MailParsingError::WriteMessageIOError)?;
            out.write_all(&self.outro.as_bytes())
                .map_err(|_| MailParsingError::WriteMessageIOError)?;
        }
        Ok(())
    }

    /// Convenience method wrapping write_message that returns
    /// the formatted message as a standalone string
    pub fn to_message_string(&self) -> String {
        let mut out = vec![];
        self.write_message(&mut out).unwrap();
        String::from_utf8_lossy(&out).to_string()
    }

    /// Constructs a new part with textual utf8 content.
    /// quoted-printable transfer encoding will be applied,
    /// unless it is smaller to represent the text in base64
    pub fn new_text(content_type: &str, content: &str) -> Self {
        if let Some(seven_bit) = Self::try_new_7bit_text(content_type, content) {
            return seven_bit;
        }

        // We'll probably use qp, so speculatively do the work
        let qp_encoded = quoted_printable::encode(content);

        let (mut encoded, encoding) =
            if qp_encoded.len() <= BASE64_RFC2045.encode_len(content.len()) {
                (qp_encoded, "quoted-printable")
            } else {
                // Turns out base64 will be smaller; perhaps the content
                // is dominated by non-ASCII text?
                (
                    BASE64_RFC2045.encode(content.as_bytes()).into_bytes(),
                    "base64",
                )
            };
        if !encoded.ends_with(b"\r\n") {
            encoded.extend_from_slice(b"\r\n");
        }
        let mut headers = HeaderMap::default();

        let mut ct = MimeParameters::new(content_type);
        ct.set(
            "charset",
            if content.is_ascii() {
                "us-ascii"
            } else {
                "utf-8"
            },
        );
        headers.set_content_type(ct);

        headers.set_content_transfer_encoding(MimeParameters::new(encoding));

        let body_len = encoded.len();
        let bytes =
            String::from_utf8(encoded).expect("transfer encoder to produce valid ASCII output");

        Self {
            bytes: bytes.into(),
            headers,
            body_offset: 0,
            body_len,
            header_conformance: HeaderConformance::default(),
            parts: vec![],
            intro: "".into(),
            outro: "".into(),
        }
    }

    /// Tries to represent `content` with no transfer-encoding overhead
    /// at all: this is only possible when every byte is plain US-ASCII
    /// and no line exceeds the RFC 5322 length limit.
    fn try_new_7bit_text(content_type: &str, content: &str) -> Option<Self> {
        if !content.is_ascii() || content.contains('\0') {
            return None;
        }
        if content.lines().any(|line| line.len() > 998) {
            return None;
        }

        let mut body = content.replace("\r\n", "\n").replace('\n', "\r\n");
        if !body.ends_with("\r\n") {
            body.push_str("\r\n");
        }

        let mut headers = HeaderMap::default();
        let mut ct = MimeParameters::new(content_type);
        ct.set("charset", "us-ascii");
        headers.set_content_type(ct);
        headers.set_content_transfer_encoding(MimeParameters::new("7bit"));

        let body_len = body.len();
        Some(Self {
            bytes: body.into(),
            headers,
            body_offset: 0,
            body_len,
            header_conformance: HeaderConformance::default(),
            parts: vec![],
            intro: "".into(),
            outro: "".into(),
        })
    }

    pub fn new_text_plain(content: &str) -> Self {
        Self::new_text("text/plain", content)
    }

    pub fn new_html(content: &str) -> Self {
        Self::new_text("text/html", content)
    }

    pub fn new_multipart(content_type: &str, parts: Vec<Self>, boundary: Option<&str>) -> Self {
        let mut headers = HeaderMap::default();

        let mut ct = MimeParameters::new(content_type);
        match boundary {
            Some(b) => {
                ct.set("boundary", b);
            }
            None => {
                ct.set("boundary", &Self::choose_boundary(&parts));
            }
        }
        headers.set_content_type(ct);

        Self {
            bytes: "".into(),
            headers,
            body_offset: 0,
            body_len: 0,
            header_conformance: HeaderConformance::default(),
            parts,
            intro: "".into(),
            outro: "".into(),
        }
    }

    /// Generates a random boundary and verifies, by scanning each
    /// child's rendered bytes, that it does not collide with a line in
    /// any child's own content. Retries with a fresh UUID on the (very
    /// unlikely) event of a collision.
    fn choose_boundary(parts: &[Self]) -> String {
        loop {
            let uuid = uuid::Uuid::new_v4();
            let candidate = data_encoding::BASE64_NOPAD.encode(uuid.as_bytes());
            let needle = format!("--{candidate}");

            let collides = parts.iter().any(|p| {
                p.to_message_string()
                    .lines()
                    .any(|line| line.starts_with(&needle))
            });

            if !collides {
                return candidate;
            }
        }
    }

    pub fn new_binary(
        content_type: &str,
        content: &[u8],
        options: Option<&AttachmentOptions>,
    ) -> Self {
        let mut encoded = BASE64_RFC2045.encode(content);
        if !encoded.ends_with("\r\n") {
            encoded.push_str("\r\n");
        }
        let mut headers = HeaderMap::default();

        headers.set_content_type(MimeParameters::new(content_type));
        headers.set_content_transfer_encoding(MimeParameters::new("base64"));

        if let Some(opts) = options {
            let mut cd = MimeParameters::new(if opts.inline { "inline" } else { "attachment" });
            if let Some(name) = &opts.file_name {
                cd.set("filename", name);
            }
            headers.set_content_disposition(cd);

            if let Some(id) = &opts.content_id {
                headers.set_content_id(MessageID(id.to_string()));
            }
        }

        let body_len = encoded.len();

        Self {
            bytes: encoded.into(),
            headers,
            body_offset: 0,
            body_len,
            header_conformance: HeaderConformance::default(),
            parts: vec![],
            intro: "".into(),
            outro: "".into(),
        }
    }
}

/// Tags the structural role of a `MimePart` without requiring callers
/// to re-derive it from header/child-count inspection each time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    /// No child parts; a single body.
    Leaf,
    /// Has child parts (`multipart/*`).
    Multipart,
    /// `message/rfc822`: a single embedded message carried as an
    /// opaque body rather than as a child part.
    Encapsulated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentOptions {
    pub file_name: Option<String>,
    pub inline: bool,
    pub content_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTransferEncoding {
    SevenBit,
    EightBit,
    Binary,
    QuotedPrintable,
    Base64,
}

impl FromStr for ContentTransferEncoding {
    type Err = MailParsingError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("7bit") {
            Ok(Self::SevenBit)
        } else if s.eq_ignore_ascii_case("8bit") {
            Ok(Self::EightBit)
        } else if s.eq_ignore_ascii_case("binary") {
            Ok(Self::Binary)
        } else if s.eq_ignore_ascii_case("quoted-printable") {
            Ok(Self::QuotedPrintable)
        } else if s.eq_ignore_ascii_case("base64") {
            Ok(Self::Base64)
        } else {
            Err(MailParsingError::InvalidContentTransferEncoding(
                s.to_string(),
            ))
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum DecodedBody<'a> {
    Text(SharedString<'a>),
    Binary(Vec<u8>),
}
