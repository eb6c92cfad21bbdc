use mailkit::*;

// Scenario 1 (spec.md §8): parse a simple, real-world-shaped message and
// check the well-known fields come out right.
#[test]
fn hello_eml_scenario() {
    let hello_eml = concat!(
        "Date: Thu, 24 Aug 2000 12:56:06 +0200\r\n",
        "From: Vincent <vincent@vmime.org>\r\n",
        "To: Jane <jane@example.com>\r\n",
        "Subject: Hello from VMime!\r\n",
        "Mime-Version: 1.0\r\n",
        "Content-Type: text/plain; charset=us-ascii\r\n",
        "\r\n",
        "A simple message to test VMime.\r\n",
    );

    let part = MimePart::parse(hello_eml).unwrap();

    let subject = part.headers().subject().unwrap().unwrap();
    k9::assert_equal!(subject, "Hello from VMime!".to_string());

    let from = part.headers().from().unwrap().unwrap();
    k9::assert_equal!(from.0.len(), 1);
    k9::assert_equal!(from.0[0].name.as_deref(), Some("Vincent"));
    k9::assert_equal!(
        format!("{}@{}", from.0[0].address.local_part, from.0[0].address.domain),
        "vincent@vmime.org".to_string()
    );

    match part.body().unwrap() {
        DecodedBody::Text(body) => {
            k9::assert_equal!(body.as_str(), "A simple message to test VMime.\r\n");
        }
        DecodedBody::Binary(_) => panic!("expected a text body"),
    }
}

// Scenario 2: build a simple message and check it round-trips and gets a
// fresh Date close to "now".
#[test]
fn build_simple_message_round_trips() {
    let before = chrono::Utc::now();

    let mut b = MessageBuilder::new();
    b.set_subject("Message subject");
    b.set_from(Mailbox {
        name: None,
        address: AddrSpec::new("me", "vmime.org"),
    });
    b.set_to(AddressList(vec![Address::Mailbox(Mailbox {
        name: None,
        address: AddrSpec::new("you", "vmime.org"),
    })]));
    b.text_plain("This is the text of your message...");

    let msg = b.build().unwrap();
    let generated = msg.to_message_string();

    let reparsed = MimePart::parse(generated.clone()).unwrap();
    k9::assert_equal!(reparsed.to_message_string(), generated);

    let date = reparsed.headers().date().unwrap().unwrap();
    let after = chrono::Utc::now();
    assert!(date.with_timezone(&chrono::Utc) >= before - chrono::Duration::seconds(1));
    assert!(date.with_timezone(&chrono::Utc) <= after + chrono::Duration::seconds(1));

    assert!(reparsed.headers().message_id().unwrap().is_some());
}

// Scenario 3: an HTML body with an embedded image and a plain alternative
// produces exactly `multipart/alternative { text/plain, multipart/related
// { text/html, image/jpeg } }`, and the HTML references the image by its
// Content-ID.
#[test]
fn build_html_plus_plain_plus_embedded_image_matches_structure() {
    let mut b = MessageBuilder::new();
    b.set_stable_content(true);
    b.set_subject("A picture");
    b.text_plain("See the attached picture.");
    b.text_html(r#"<p>See: <img src="cid:the-image"></p>"#);
    b.embed("image/jpeg", b"\xff\xd8\xff\xe0fake-jpeg-bytes", "the-image");

    let msg = b.build().unwrap();

    let ct = msg.headers().content_type().unwrap().unwrap();
    k9::assert_equal!(ct.value, "multipart/alternative".to_string());
    let children = msg.child_parts();
    k9::assert_equal!(children.len(), 2);

    let plain_ct = children[0].headers().content_type().unwrap().unwrap();
    k9::assert_equal!(plain_ct.value, "text/plain".to_string());

    let related = &children[1];
    let related_ct = related.headers().content_type().unwrap().unwrap();
    k9::assert_equal!(related_ct.value, "multipart/related".to_string());

    let related_children = related.child_parts();
    k9::assert_equal!(related_children.len(), 2);
    let html_ct = related_children[0].headers().content_type().unwrap().unwrap();
    k9::assert_equal!(html_ct.value, "text/html".to_string());
    let image_ct = related_children[1].headers().content_type().unwrap().unwrap();
    k9::assert_equal!(image_ct.value, "image/jpeg".to_string());

    let image_cid = related_children[1]
        .headers()
        .content_id()
        .unwrap()
        .unwrap()
        .0;
    k9::assert_equal!(image_cid, "the-image".to_string());

    let html = match related_children[0].body().unwrap() {
        DecodedBody::Text(t) => t.to_string(),
        DecodedBody::Binary(_) => panic!("expected text body"),
    };
    assert!(html.contains(&format!("cid:{image_cid}")));
}

// Scenario 4: flattening a multipart/mixed with a plain part, a pdf
// attachment, and an unreferenced inline image yields one plain text part
// and two attachments (the image is not referenced by any HTML, so it
// cannot be promoted to an embedded object).
#[test]
fn flatten_mixed_with_unreferenced_inline_image() {
    let msg = MimePart::new_multipart(
        "multipart/mixed",
        vec![
            MimePart::new_text_plain("plain body"),
            MimePart::new_binary("application/pdf", b"%PDF-1.4 ...", None),
            MimePart::new_binary(
                "image/png",
                b"\x89PNG...",
                Some(&mailkit::AttachmentOptions {
                    file_name: None,
                    inline: true,
                    content_id: Some("unreferenced".to_string()),
                }),
            ),
        ],
        Some("scenario4-boundary"),
    );

    let flattened = msg.flatten().unwrap();
    assert!(matches!(flattened.text, Some(PrimaryText::Plain(_))));
    k9::assert_equal!(flattened.attachments.len(), 2);
}

// Scenario 5: adding an attachment to a flat text/plain message promotes
// the root to multipart/mixed, keeping the original body (with its own
// Content-Type) as the first child and the addressing headers on the root.
#[test]
fn add_attachment_to_flat_text_message() {
    let msg = MimePart::parse(concat!(
        "Subject: hi\r\n",
        "From: me@example.com\r\n",
        "Content-Type: text/plain; charset=utf-8\r\n",
        "\r\n",
        "hello\r\n",
    ))
    .unwrap();

    let attachment = MimePart::new_binary("application/pdf", b"%PDF-1.4", None);
    let combined = add_attachment(msg, attachment);

    let ct = combined.headers().content_type().unwrap().unwrap();
    k9::assert_equal!(ct.value, "multipart/mixed".to_string());

    let children = combined.child_parts();
    k9::assert_equal!(children.len(), 2);
    let first_ct = children[0].headers().content_type().unwrap().unwrap();
    k9::assert_equal!(first_ct.value, "text/plain".to_string());

    k9::assert_equal!(
        combined.headers().subject().unwrap(),
        Some("hi".to_string())
    );
    assert!(children[0].headers().subject().unwrap().is_none());
}

// Scenario 6: a multipart/mixed Content-Type with no boundary parameter
// degrades to a single leaf carrying all the original bytes, rather than
// panicking.
#[test]
fn multipart_without_boundary_is_a_single_leaf() {
    let message = concat!(
        "Content-Type: multipart/mixed\r\n",
        "\r\n",
        "this never got split into parts\r\n",
    );
    let part = MimePart::parse(message).unwrap();
    k9::assert_equal!(part.kind(), PartKind::Leaf);
    k9::assert_equal!(part.child_parts().len(), 0);
    assert_eq!(part.raw_body(), "this never got split into parts\r\n");
}

// Boundary behavior: a field value spanning 12 folded continuation lines
// round-trips to the same logical value.
#[test]
fn header_with_twelve_folded_continuation_lines_round_trips() {
    let words: Vec<String> = (0..12).map(|i| format!("word{i}")).collect();
    let folded = words.join("\r\n ");
    let message = format!("Subject: {folded}\r\n\r\nbody\r\n");

    let part = MimePart::parse(message).unwrap();
    let subject = part.headers().subject().unwrap().unwrap();
    let expected = words.join(" ");
    k9::assert_equal!(subject, expected);
}

// Boundary behavior: a header field 1000 bytes long after unfolding parses
// without truncation.
#[test]
fn header_field_1000_bytes_after_unfolding() {
    let value = "a".repeat(1000);
    let message = format!("Subject: {value}\r\n\r\nbody\r\n");
    let part = MimePart::parse(message).unwrap();
    let subject = part.headers().subject().unwrap().unwrap();
    k9::assert_equal!(subject.len(), 1000);
}

// Boundary behavior: an RFC 2231 parameter reassembled from 4 continuation
// segments with a declared charset.
#[test]
fn rfc2231_four_segment_continuation_with_charset() {
    let message = concat!(
        "Content-Type: application/x-stuff;\r\n",
        "\ttitle*0*=us-ascii'en'This%20is%20;\r\n",
        "\ttitle*1*=even%20more%20;\r\n",
        "\ttitle*2*=%2A%2A%2Afun%2A%2A%2A%20;\r\n",
        "\ttitle*3=\"isn't it!\"\r\n",
        "\r\n",
        "\r\n",
    );
    let part = MimePart::parse(message).unwrap();
    let ct = part.headers().content_type().unwrap().unwrap();
    k9::assert_equal!(
        ct.get("title"),
        Some("This is even more ***fun*** isn't it!".to_string())
    );
}

// Nested multipart/alternative inside multipart/related inside
// multipart/mixed, as produced by the builder with HTML + image + a
// non-text attachment (P flag on top of R and A).
#[test]
fn nested_alternative_related_mixed_from_builder() {
    let mut b = MessageBuilder::new();
    b.set_stable_content(true);
    b.set_subject("Nested structure");
    b.text_plain("plain alt");
    b.text_html(r#"<img src="cid:pic">"#);
    b.embed("image/png", b"\x89PNG", "pic");
    b.attach("application/pdf", b"%PDF-1.4", None);

    let msg = b.build().unwrap();

    let ct = msg.headers().content_type().unwrap().unwrap();
    k9::assert_equal!(ct.value, "multipart/mixed".to_string());
    k9::assert_equal!(msg.child_parts().len(), 2);

    let alternative = &msg.child_parts()[0];
    let alt_ct = alternative.headers().content_type().unwrap().unwrap();
    k9::assert_equal!(alt_ct.value, "multipart/alternative".to_string());

    let related = &alternative.child_parts()[1];
    let related_ct = related.headers().content_type().unwrap().unwrap();
    k9::assert_equal!(related_ct.value, "multipart/related".to_string());

    let attachment = &msg.child_parts()[1];
    let attachment_ct = attachment.headers().content_type().unwrap().unwrap();
    k9::assert_equal!(attachment_ct.value, "application/pdf".to_string());
}
