// ai
//! 📖 Verse Transform: raw record in, canonical document out.
//!
//! The only parsing in the whole program lives here. One regex, one split, two
//! integer parses. It is a handful of lines and it is still the place where
//! things go wrong, because reference strings are written by humans.
//!
//! ## Knowledge Graph 🧠
//! - Input: [`RawVerseRecord`] (reference string + ten texts)
//! - Output: [`VerseDoc`] for the ONE active translation
//! - Malformed references are a typed [`TransformError`], not a silent `0:0`.
//!   The supervisor decides what to do with them (log, skip, count).

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::common::{RawVerseRecord, TranslationTable, VerseDoc, Version};

/// 🔍 First `digits:digits` in the reference string is the chapter:verse token.
static CHAPTER_VERSE: LazyLock<Regex> = LazyLock::new(|| {
    // 🐛 safe: the pattern is a literal and it compiles, checked by every test in this file
    Regex::new(r"[0-9]+:[0-9]+").expect("chapter:verse pattern is a valid regex")
});

/// 💀 Data errors. Infrastructure errors are `anyhow`; these are the ones we match on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum TransformError {
    /// No `chapter:verse` token, an empty book name, a zero chapter or verse, or numbers
    /// too big to be a chapter.
    #[error("malformed reference '{reference}': expected '<Book> <chapter>:<verse>'")]
    MalformedReference { reference: String },
}

impl TransformError {
    fn malformed(reference: &str) -> Self {
        Self::MalformedReference {
            reference: reference.to_string(),
        }
    }
}

/// 🎯 A parsed "Book Chapter:Verse".
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VerseReference {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
}

/// 🔍 Split `"Song of Solomon 2:4"` into `("Song of Solomon", 2, 4)`.
///
/// The book is everything before the first `digits:digits` token, trimmed.
/// Anything after the token is ignored, so `"Genesis 1:1a"` is Genesis 1:1.
pub(crate) fn parse_reference(bcv: &str) -> Result<VerseReference, TransformError> {
    let the_token = CHAPTER_VERSE
        .find(bcv)
        .ok_or_else(|| TransformError::malformed(bcv))?;

    // -- the regex guarantees exactly one ':' with digits on both sides
    let (chapter_raw, verse_raw) = the_token
        .as_str()
        .split_once(':')
        .ok_or_else(|| TransformError::malformed(bcv))?;
    let chapter = chapter_raw
        .parse::<u32>()
        .map_err(|_| TransformError::malformed(bcv))?;
    let verse = verse_raw
        .parse::<u32>()
        .map_err(|_| TransformError::malformed(bcv))?;

    // -- chapters and verses count from 1. a 0 is a placeholder, not a place.
    if chapter == 0 || verse == 0 {
        return Err(TransformError::malformed(bcv));
    }

    let book = bcv[..the_token.start()].trim();
    if book.is_empty() {
        return Err(TransformError::malformed(bcv));
    }

    Ok(VerseReference {
        book: book.to_string(),
        chapter,
        verse,
    })
}

/// 📥 Builds [`VerseDoc`]s for one translation, using an explicitly provided table.
#[derive(Debug, Clone)]
pub(crate) struct VerseTransformer {
    table: TranslationTable,
    translation: String,
}

impl VerseTransformer {
    /// 🏗️ An unknown code is allowed (the docs get an empty long name) but it gets
    /// a warning, because it's almost certainly a typo in the config.
    pub(crate) fn new(table: TranslationTable, translation: &str) -> Self {
        if !table.contains(translation) {
            warn!(
                "⚠️ Translation code '{}' is not in the translation table. Documents will carry an empty long name and an empty verse.",
                translation
            );
        }
        Self {
            table,
            translation: translation.to_string(),
        }
    }

    pub(crate) fn translation(&self) -> &str {
        &self.translation
    }

    /// 🔄 One record, one doc, for the active translation.
    pub(crate) fn transform(&self, record: &RawVerseRecord) -> Result<VerseDoc, TransformError> {
        self.build_doc(&record.bcv, record.text_for(&self.translation))
    }

    /// 🏗️ Stamp a document from a reference string and a text.
    ///
    /// Load time, UTC time and the id are taken fresh on every call. Two calls with
    /// identical arguments produce two different documents.
    pub(crate) fn build_doc(&self, bcv: &str, text: &str) -> Result<VerseDoc, TransformError> {
        let the_reference = parse_reference(bcv)?;
        let now = Utc::now();

        Ok(VerseDoc {
            // -- None only after the year 2262, at which point this is someone else's problem
            epoch_time_loaded: now.timestamp_nanos_opt().unwrap_or(i64::MAX),
            version: Version {
                short_name: self.translation.clone(),
                long_name: self.table.long_name(&self.translation).to_string(),
            },
            book: the_reference.book,
            chapter_no: the_reference.chapter,
            verse_no: the_reference.verse,
            verse: text.trim().to_string(),
            es_id: Uuid::new_v4(),
            utc_time_loaded: now,
        })
    }
}
