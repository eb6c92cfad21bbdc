mod attachments;
mod builder;
mod conformance;
mod encoded_word;
mod error;
mod flatten;
mod header;
mod headermap;
mod mimepart;
mod nom_utils;
mod normalize;
mod registry;
mod rfc5322_parser;
mod strings;
mod text;
mod textwrap;

pub use error::MailParsingError;
pub type Result<T> = std::result::Result<T, MailParsingError>;

pub use attachments::*;
pub use builder::*;
pub use conformance::*;
pub use flatten::*;
pub use header::{Header, HeaderParseResult, MessageConformance};
pub use headermap::*;
pub use mimepart::*;
pub use normalize::*;
pub use registry::*;
pub use rfc5322_parser::*;
pub use strings::SharedString;
pub use text::*;
