// ai
//! 📡 Elasticsearch Bulk Transform - formatting verses for the bulk API's peculiar tastes 🚀
//!
//! Rule 1: Two lines per document. Action metadata, then document source. Always.
//! Rule 2: Newline-delimited. Not comma-separated. Not XML. NEWLINES.
//! Rule 3: The trailing newline on the whole body matters. The bulk submitter owns that one.
//!
//! ## Knowledge Graph 🧠
//! - Implements: `EgressTransform` (`VerseDoc` → bulk item)
//! - Target: `POST /_bulk`
//! - Action line: `{"index":{"_index":"<index>","_id":"<es_id>"}}`
//! - No `_type`. Mapping types died in 7.x and we did not attend the funeral.

use super::EgressTransform;
use crate::common::VerseDoc;
use anyhow::{Context, Result};
use serde_json::json;

/// 📡 ElasticsearchBulk - the format whisperer for the `index` bulk action.
///
/// ```text
/// {"index":{"_index":"bible-v1","_id":"3f1c..."}}
/// {"epochtime_loaded":...,"book":"Genesis",...}
/// ```
///
/// The `_id` is the doc's own `es_id`, so the id in the action line and the id
/// inside the document always agree.
pub(crate) struct ElasticsearchBulk;

impl EgressTransform for ElasticsearchBulk {
    fn transform_doc(doc: &VerseDoc, index: &str) -> Result<String> {
        // 📦 the cover letter: which index, which id
        let the_action_line = json!({
            "index": {
                "_index": index,
                "_id": doc.es_id.to_string(),
            }
        });
        let the_action_serialized = serde_json::to_string(&the_action_line).context(
            "💀 Failed to serialize bulk action metadata. \
             The JSON that describes JSON has failed to become JSON.",
        )?;

        let the_source_serialized = serde_json::to_string(doc).context(format!(
            "💀 Verse document {} refused to become JSON. Scripture is eternal, serialization is not.",
            doc.es_id
        ))?;

        Ok(format!("{}\n{}", the_action_serialized, the_source_serialized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Version;
    use chrono::Utc;
    use uuid::Uuid;

    fn the_doc_with_a_tricky_verse(text: &str) -> VerseDoc {
        VerseDoc {
            epoch_time_loaded: 1,
            version: Version {
                short_name: "kjv".to_string(),
                long_name: "King James Bible".to_string(),
            },
            book: "Psalms".to_string(),
            chapter_no: 23,
            verse_no: 1,
            verse: text.to_string(),
            es_id: Uuid::new_v4(),
            utc_time_loaded: Utc::now(),
        }
    }

    #[test]
    fn the_one_where_the_action_line_knows_where_the_verse_lives() -> Result<()> {
        let the_doc = the_doc_with_a_tricky_verse("The LORD is my shepherd; I shall not want.");
        let the_output = ElasticsearchBulk::transform_doc(&the_doc, "bible-v1")?;
        let the_lines: Vec<&str> = the_output.split('\n').collect();

        assert_eq!(the_lines.len(), 2, "Sacred two-line format. Non-negotiable.");
        let the_action: serde_json::Value = serde_json::from_str(the_lines[0])?;
        assert_eq!(the_action["index"]["_index"], "bible-v1");
        assert_eq!(the_action["index"]["_id"], the_doc.es_id.to_string());
        assert!(the_action["index"].get("_type").is_none(), "no mapping types in 2024+");
        Ok(())
    }

    #[test]
    fn the_one_where_newlines_and_quotes_inside_a_verse_stay_inside_the_verse() -> Result<()> {
        // 🧪 A verse with a newline and quotes must not split the NDJSON line.
        let the_doc = the_doc_with_a_tricky_verse("And God said, \"Let there be light\"\nand there was light.");
        let the_output = ElasticsearchBulk::transform_doc(&the_doc, "bible-v1")?;
        let the_lines: Vec<&str> = the_output.split('\n').collect();

        assert_eq!(the_lines.len(), 2, "escaped newline must not become a real one");
        let the_source: serde_json::Value = serde_json::from_str(the_lines[1])?;
        assert_eq!(the_source["verse"], the_doc.verse);
        Ok(())
    }
}
