// ai
//! 📦 Common data structures - the load-bearing nouns of versedex.
//!
//! 🎬 COLD OPEN - INT. SCRIPTORIUM - 3:47 AM
//!
//! A monk copies verses by candlelight. Ten translations, one reference string,
//! and a quill that has seen things. Centuries later the monk is replaced by a
//! `serde::Deserialize` derive. The candle is replaced by a laptop fan. The
//! verses are the same. Some things are eternal. Mapping conflicts are also eternal.
//!
//! This module holds:
//! - [`RawVerseRecord`]: one entry of the input array, straight off the disk.
//! - [`VerseDoc`]: the canonical document we hand to the store. One per verse.
//! - [`TranslationTable`]: the fixed short-code to long-name table, passed around
//!   explicitly instead of hiding in a global like a raccoon in the attic.
//!
//! 🦆

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// 🕳️ A `null` column reads as an empty string. The export writes `null` for every
/// translation a row doesn't have, and a missing translation is not a broken file.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// 📖 One record from the input file: a reference string and ten translations of it.
///
/// Every text field is empty when the key is missing or `null`, because the input
/// file was assembled by a script that had opinions about completeness (it had none).
///
/// ⚠️ The KJV key is spelled `kvj_text` in the wild. Yes. `kvj`. We accept the
/// correct spelling too, as an alias, for the day someone fixes the export.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct RawVerseRecord {
    /// 🎯 "Book Chapter:Verse", e.g. "Genesis 1:1". The only field we parse.
    #[serde(deserialize_with = "null_as_empty")]
    pub bcv: String,
    #[serde(rename = "kvj_text", alias = "kjv_text", deserialize_with = "null_as_empty")]
    pub kjv_text: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub asv_text: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub dr_text: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub darb_text: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub engr_text: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub web_text: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub wld_eng_text: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub young_lit_text: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub amer_kjv_text: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub wey_text: String,
}

impl RawVerseRecord {
    /// 🔍 Pick the text column for a translation code.
    ///
    /// Unknown codes get an empty string. The record has no column for them and we
    /// don't invent scripture. That's a different kind of project.
    pub(crate) fn text_for(&self, code: &str) -> &str {
        match code {
            "kjv" => &self.kjv_text,
            "asv" => &self.asv_text,
            "dr" => &self.dr_text,
            "darb" => &self.darb_text,
            "EngRe" => &self.engr_text,
            "web" => &self.web_text,
            "wldEng" => &self.wld_eng_text,
            "Young" => &self.young_lit_text,
            "akj" => &self.amer_kjv_text,
            "wey" => &self.wey_text,
            _ => "",
        }
    }
}

/// 🏷️ One row of the translation table. Short code in, human name out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Translation {
    pub code: &'static str,
    pub long_name: &'static str,
}

/// 📚 The ten translations the input file knows about. Case matters: `EngRe`, not `engre`.
/// Whoever picked these codes was having a creative day. We honor it.
pub(crate) const STANDARD_TRANSLATIONS: [Translation; 10] = [
    Translation { code: "kjv", long_name: "King James Bible" },
    Translation { code: "asv", long_name: "American Standard Version" },
    Translation { code: "dr", long_name: "Douay-Rheims Bible" },
    Translation { code: "darb", long_name: "Darby Bible Translation" },
    Translation { code: "EngRe", long_name: "English Revised Version" },
    Translation { code: "web", long_name: "Webster Bible Translation" },
    Translation { code: "wldEng", long_name: "World English Bible" },
    Translation { code: "Young", long_name: "Young's Literal Translation" },
    Translation { code: "akj", long_name: "American King James Version" },
    Translation { code: "wey", long_name: "Weymouth New Testament" },
];

/// 📚 Short code to long name lookup. A borrowed slice of constants, cheap to copy,
/// handed to the transformer at construction time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TranslationTable {
    entries: &'static [Translation],
}

impl TranslationTable {
    /// 🏗️ The standard ten. The only table anyone has ever needed. So far.
    pub(crate) const fn standard() -> Self {
        Self {
            entries: &STANDARD_TRANSLATIONS,
        }
    }

    /// 🔍 Long name for a code, or `""` when the table has never heard of it.
    pub(crate) fn long_name(&self, code: &str) -> &'static str {
        self.entries
            .iter()
            .find(|translation| translation.code == code)
            .map(|translation| translation.long_name)
            .unwrap_or("")
    }

    pub(crate) fn contains(&self, code: &str) -> bool {
        self.entries.iter().any(|translation| translation.code == code)
    }
}

/// 🏷️ The translation identity stamped on every document. Mapped as `nested`,
/// which is a lot of ceremony for two strings, but the mapping has spoken.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Version {
    pub short_name: String,
    pub long_name: String,
}

/// 📜 The canonical document. One verse, one translation, one fresh UUID.
///
/// Field names on the wire match the index mapping exactly. Rename one and the
/// mapping quietly grows a dynamic field next to it. Ask me how I know.
///
/// ⚠️ `es_id` is random, not derived from content. Re-running the loader on the same
/// file appends a second copy of the Bible. Append-only by accident of design.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct VerseDoc {
    /// ⏱️ Nanoseconds since the epoch when the doc was built.
    #[serde(rename = "epochtime_loaded")]
    pub epoch_time_loaded: i64,
    pub version: Version,
    pub book: String,
    pub chapter_no: u32,
    pub verse_no: u32,
    pub verse: String,
    pub es_id: Uuid,
    #[serde(rename = "utctime_loaded")]
    pub utc_time_loaded: DateTime<Utc>,
}
