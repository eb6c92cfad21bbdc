//! The process-wide field registry: a table mapping case-insensitive
//! header names to the typed `FieldKind` that governs how their value is
//! parsed and generated. `HeaderMap`/`Header` keep
//! their existing concrete accessor methods (`as_mailbox_list`, ...) for
//! the common case where the caller already knows the field's name and
//! kind; this registry exists for the generic case, where a caller wants
//! to classify an arbitrary header without hard-coding a big match on its
//! name (`Header::field_kind`, `Field::classify`, and `Header::rebuild`'s
//! fallback path all consult it).
//!
//! The table is seeded once, on first use, and is then frozen: further
//! calls to `register` return `MailParsingError::RegistryFrozen`. This
//! matches a "construct at startup, freeze, never modified thereafter"
//! lifecycle, without needing an explicit init call that every binary
//! using this crate would have to remember to make.

use crate::{MailParsingError, Result};
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

/// The closed set of typed field variants the registry recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Mailbox,
    MailboxList,
    AddressList,
    DateTime,
    Text,
    MediaType,
    ContentDisposition,
    MessageId,
    MessageIdList,
    Encoding,
    Raw,
}

struct RegistryState {
    map: HashMap<String, FieldKind>,
    frozen: bool,
}

fn seed() -> HashMap<String, FieldKind> {
    let mut m = HashMap::new();
    m.insert("date".to_string(), FieldKind::DateTime);
    m.insert("from".to_string(), FieldKind::MailboxList);
    m.insert("resent-from".to_string(), FieldKind::MailboxList);
    m.insert("sender".to_string(), FieldKind::Mailbox);
    m.insert("resent-sender".to_string(), FieldKind::Mailbox);
    m.insert("reply-to".to_string(), FieldKind::AddressList);
    m.insert("to".to_string(), FieldKind::AddressList);
    m.insert("cc".to_string(), FieldKind::AddressList);
    m.insert("bcc".to_string(), FieldKind::AddressList);
    m.insert("resent-to".to_string(), FieldKind::AddressList);
    m.insert("resent-cc".to_string(), FieldKind::AddressList);
    m.insert("resent-bcc".to_string(), FieldKind::AddressList);
    m.insert("subject".to_string(), FieldKind::Text);
    m.insert("comments".to_string(), FieldKind::Text);
    m.insert("message-id".to_string(), FieldKind::MessageId);
    m.insert("in-reply-to".to_string(), FieldKind::MessageIdList);
    m.insert("references".to_string(), FieldKind::MessageIdList);
    m.insert("content-type".to_string(), FieldKind::MediaType);
    m.insert(
        "content-transfer-encoding".to_string(),
        FieldKind::Encoding,
    );
    m.insert(
        "content-disposition".to_string(),
        FieldKind::ContentDisposition,
    );
    m.insert("content-id".to_string(), FieldKind::MessageId);
    m.insert("content-location".to_string(), FieldKind::Text);
    m
}

struct Registry(RwLock<RegistryState>);

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        Registry(RwLock::new(RegistryState {
            map: seed(),
            frozen: false,
        }))
    })
}

/// Handle onto the process-wide field registry.
pub struct FieldRegistry;

impl FieldRegistry {
    /// Register (or override) the `FieldKind` for `name`. Must happen
    /// before the first `kind_for` lookup anywhere in the process;
    /// afterwards the registry is frozen and this returns an error
    /// instead of silently doing nothing, so that a host application
    /// relying on a custom registration finds out immediately.
    pub fn register(name: &str, kind: FieldKind) -> Result<()> {
        let reg = registry();
        let mut state = reg.0.write().expect("registry lock poisoned");
        if state.frozen {
            return Err(MailParsingError::RegistryFrozen(name.to_string()));
        }
        state.map.insert(name.to_ascii_lowercase(), kind);
        Ok(())
    }

    /// Look up the `FieldKind` registered for `name` (case-insensitive),
    /// defaulting to `FieldKind::Raw` for unregistered names. The first
    /// call to this function, from anywhere in the process, freezes the
    /// registry against further `register` calls.
    pub fn kind_for(name: &str) -> FieldKind {
        let reg = registry();
        {
            let mut state = reg.0.write().expect("registry lock poisoned");
            state.frozen = true;
        }
        let state = reg.0.read().expect("registry lock poisoned");
        state
            .map
            .get(&name.to_ascii_lowercase())
            .copied()
            .unwrap_or(FieldKind::Raw)
    }
}

/// A classified header value: the typed variant selected by the field
/// registry, with a `Raw` fallback when the named `FieldKind` failed to
/// parse (typed parse failures degrade a field to `Raw` rather than
/// failing the whole message).
#[derive(Debug, Clone)]
pub enum Field {
    Mailbox(crate::Mailbox),
    MailboxList(crate::MailboxList),
    AddressList(crate::AddressList),
    DateTime(chrono::DateTime<chrono::FixedOffset>),
    Text(crate::Text),
    MediaType(crate::MimeParameters),
    ContentDisposition(crate::MimeParameters),
    MessageId(crate::MessageID),
    MessageIdList(Vec<crate::MessageID>),
    Encoding(crate::MimeParameters),
    Raw(String),
}

impl Field {
    /// Classifies `header` according to the field registry, degrading
    /// to `Raw` (carrying the unparsed value) on any typed parse
    /// failure rather than propagating the error.
    pub fn classify(header: &crate::Header) -> Self {
        let raw = || Field::Raw(header.get_raw_value().to_string());

        match FieldRegistry::kind_for(header.get_name()) {
            FieldKind::Mailbox => header.as_mailbox().map(Field::Mailbox).unwrap_or_else(|_| raw()),
            FieldKind::MailboxList => header
                .as_mailbox_list()
                .map(Field::MailboxList)
                .unwrap_or_else(|_| raw()),
            FieldKind::AddressList => header
                .as_address_list()
                .map(Field::AddressList)
                .unwrap_or_else(|_| raw()),
            FieldKind::DateTime => header.as_date().map(Field::DateTime).unwrap_or_else(|_| raw()),
            FieldKind::Text => header.as_text().map(Field::Text).unwrap_or_else(|_| raw()),
            FieldKind::MediaType => header
                .as_content_type()
                .map(Field::MediaType)
                .unwrap_or_else(|_| raw()),
            FieldKind::ContentDisposition => header
                .as_content_disposition()
                .map(Field::ContentDisposition)
                .unwrap_or_else(|_| raw()),
            FieldKind::MessageId => header
                .as_message_id()
                .map(Field::MessageId)
                .unwrap_or_else(|_| raw()),
            FieldKind::MessageIdList => header
                .as_message_id_list()
                .map(Field::MessageIdList)
                .unwrap_or_else(|_| raw()),
            FieldKind::Encoding => header
                .as_content_transfer_encoding()
                .map(Field::Encoding)
                .unwrap_or_else(|_| raw()),
            FieldKind::Raw => raw(),
        }
    }

    /// True if this field degraded to `Raw`, either because it is
    /// unregistered or because its typed parse failed.
    pub fn is_raw(&self) -> bool {
        matches!(self, Field::Raw(_))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Header;

    #[test]
    fn unknown_field_is_raw() {
        k9::assert_equal!(FieldRegistry::kind_for("X-Made-Up-Header"), FieldKind::Raw);
    }

    #[test]
    fn known_fields_classify() {
        let header = Header::with_name_value("Subject", "hello there");
        match Field::classify(&header) {
            Field::Text(text) => k9::assert_equal!(text.to_plain_string(), "hello there".to_string()),
            other => panic!("expected Text, got {other:?}"),
        }

        let header = Header::with_name_value("To", "someone@example.com");
        assert!(matches!(Field::classify(&header), Field::AddressList(_)));

        let header = Header::with_name_value("Content-Type", "text/plain; charset=utf-8");
        assert!(matches!(Field::classify(&header), Field::MediaType(_)));
    }

    #[test]
    fn malformed_typed_field_degrades_to_raw() {
        // A Date header with nonsense content cannot be parsed as a
        // date; it must degrade to Raw rather than panicking or
        // erroring out of classify().
        let header = Header::with_name_value("Date", "not a date at all");
        assert!(Field::classify(&header).is_raw());
    }

    #[test]
    fn register_before_first_lookup_succeeds() {
        // The global registry is process-wide and frozen by the first
        // `kind_for` call from anywhere; registering and then looking up
        // the same name in one test, with a load-bearing assertion on
        // both steps, verifies the "register before first lookup"
        // contract instead of silently no-oping if some other test's
        // lookup already froze the registry first.
        assert!(FieldRegistry::register("x-custom-message-id", FieldKind::MessageId).is_ok());
        k9::assert_equal!(
            FieldRegistry::kind_for("x-custom-message-id"),
            FieldKind::MessageId
        );
    }
}
