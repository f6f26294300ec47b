// ai
//! 🔄 Transforms - where a line of scripture becomes a line of NDJSON 📜🚀
//!
//! 🎬 COLD OPEN - INT. TRANSLATION BOOTH - 2:47 AM
//!
//! On the left screen: a JSON record with ten translations and a reference string
//! that says "Genesis 1:1" like that's a data format. On the right screen: the
//! Elasticsearch bulk API, tapping its foot. In between: this module.
//!
//! ```text
//!   RawVerseRecord          Intermediate            Store wire format
//!  ┌───────────────┐      ┌──────────────┐      ┌──────────────────────┐
//!  │ bcv           │      │  VerseDoc    │      │ {"index":{...}}      │
//!  │ kvj_text      │─────▶│  book        │─────▶│ {...verse doc...}    │
//!  │ asv_text ...  │      │  chapter_no  │      └──────────────────────┘
//!  └───────────────┘      │  verse_no    │
//!   verse::VerseTransformer│  es_id ...   │       elasticsearch::ElasticsearchBulk
//!                         └──────────────┘
//! ```
//!
//! Ingest is stateful (it carries the translation table and the active code), so it's
//! a struct. Egress is stateless, so it's a zero-sized marker behind [`EgressTransform`].
//! 🦆

use crate::common::VerseDoc;
use anyhow::Result;

pub(crate) mod elasticsearch;
pub(crate) mod verse;

pub(crate) use elasticsearch::ElasticsearchBulk;
pub(crate) use verse::VerseTransformer;

/// 📤 EgressTransform - renders a canonical [`VerseDoc`] into one store-specific item.
///
/// # Contract 📜
/// - Input: a borrowed `VerseDoc` and the target index name
/// - Output: the wire representation of ONE document, without a trailing newline.
///   The bulk submitter does the final assembly.
pub(crate) trait EgressTransform {
    fn transform_doc(doc: &VerseDoc, index: &str) -> Result<String>;
}
