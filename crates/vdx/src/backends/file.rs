// ai
//! 📂 Previously, on "Things That Could Go Wrong With A File"...
//!
//! The file was supposed to be one JSON array of verses. Mostly it is. Sometimes
//! it's two arrays glued back to back, because the export script ran twice and
//! nobody noticed. We handle both: the file is read as a SEQUENCE of top-level
//! arrays, one per `next_batch`, until only whitespace remains.
//!
//! 🚰 File → bytes → one `Vec<RawVerseRecord>` per call → transformer
//! 💀 Truncated JSON → fatal, with the byte offset, so you can go look
//! 🦆 (mandatory, no notes)

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::backends::Source;
use crate::common::RawVerseRecord;
use crate::progress::ProgressMetrics;

// -- 📂 FileSourceConfig, co-located with the FileSource that uses it. Ethos pattern. 🎯
#[derive(Debug, Deserialize, Clone)]
pub struct FileSourceConfig {
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

// -- the name the export script has always used. Relative to the working directory.
fn default_file_name() -> String {
    "os-bibles-escape-chr.json".to_string()
}

impl Default for FileSourceConfig {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
        }
    }
}

/// 📂 FileSource - the Record Reader.
///
/// Slurps the whole file on open (a Bible is ~15 MiB, we'll survive), then walks it
/// with serde_json's stream deserializer, one top-level array at a time.
/// `offset` remembers where the last array ended.
pub(crate) struct FileSource {
    bytes: Vec<u8>,
    offset: usize,
    source_config: FileSourceConfig,
    progress: ProgressMetrics,
}

// 🐛 progress excluded: nobody debugging a FileSource wants a wall of counters,
// and the raw bytes are the whole Bible
impl std::fmt::Debug for FileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSource")
            .field("source_config", &self.source_config)
            .field("offset", &self.offset)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl FileSource {
    /// 🚀 Open and read the input file. Missing file, bad permissions: fatal, right here.
    pub(crate) async fn new(source_config: FileSourceConfig) -> Result<Self> {
        let bytes = tokio::fs::read(&source_config.file_name)
            .await
            .context(format!(
                "💀 The door to '{}' would not budge. We checked if it existed (it might not). \
                We checked permissions (they might be wrong). The file remains unopened.",
                source_config.file_name
            ))?;
        debug!(
            "📂 Opened '{}' ({} bytes of scripture, give or take)",
            source_config.file_name,
            bytes.len()
        );

        let progress = ProgressMetrics::new(source_config.file_name.clone(), bytes.len() as u64);

        Ok(Self {
            bytes,
            offset: 0,
            source_config,
            progress,
        })
    }
}

#[async_trait]
impl Source for FileSource {
    /// 📄 Decode the next top-level array. `None` when only whitespace is left.
    async fn next_batch(&mut self) -> Result<Option<Vec<RawVerseRecord>>> {
        let the_rest = &self.bytes[self.offset..];
        let mut the_stream =
            serde_json::Deserializer::from_slice(the_rest).into_iter::<Vec<RawVerseRecord>>();

        match the_stream.next() {
            None => {
                trace!("🏁 '{}' is exhausted", self.source_config.file_name);
                self.progress.finish();
                Ok(None)
            }
            Some(Ok(batch)) => {
                let consumed = the_stream.byte_offset();
                self.offset += consumed;
                trace!(
                    "📖 decoded an array of {} verse records ({} bytes)",
                    batch.len(),
                    consumed
                );
                self.progress.update(consumed as u64, batch.len() as u64);
                Ok(Some(batch))
            }
            Some(Err(err)) => Err(err).context(format!(
                "💀 '{}' stopped being valid verse JSON somewhere after byte {}. \
                Expected a top-level array of objects with a 'bcv' key. Go look.",
                self.source_config.file_name, self.offset
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn the_file_containing(contents: &str) -> tempfile::NamedTempFile {
        let mut the_file = tempfile::NamedTempFile::new()
            .expect("💀 The filesystem said 'new phone who dis'.");
        the_file
            .write_all(contents.as_bytes())
            .expect("💀 Could not write the fixture.");
        the_file
    }

    fn config_for(file: &tempfile::NamedTempFile) -> FileSourceConfig {
        FileSourceConfig {
            file_name: file.path().display().to_string(),
        }
    }

    #[tokio::test]
    async fn the_one_where_one_array_is_one_batch_and_then_silence() -> Result<()> {
        let the_file = the_file_containing(
            r#"[
                {"bcv": "Genesis 1:1", "kvj_text": "In the beginning"},
                {"bcv": "Exodus 20:3", "kvj_text": "Thou shalt have no other gods"}
            ]
            "#,
        );
        let mut the_source = FileSource::new(config_for(&the_file)).await?;

        let the_batch = the_source.next_batch().await?.expect("💀 expected one batch");
        assert_eq!(the_batch.len(), 2);
        assert_eq!(the_batch[0].bcv, "Genesis 1:1");
        assert_eq!(the_batch[1].kjv_text, "Thou shalt have no other gods");

        assert!(the_source.next_batch().await?.is_none(), "trailing whitespace is EOF");
        assert!(the_source.next_batch().await?.is_none(), "EOF stays EOF");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_export_ran_twice_and_we_read_both() -> Result<()> {
        let the_file = the_file_containing(
            r#"[{"bcv": "Genesis 1:1"}][{"bcv": "Genesis 1:2"}, {"bcv": "Genesis 1:3"}]"#,
        );
        let mut the_source = FileSource::new(config_for(&the_file)).await?;

        assert_eq!(the_source.next_batch().await?.map(|b| b.len()), Some(1));
        assert_eq!(the_source.next_batch().await?.map(|b| b.len()), Some(2));
        assert!(the_source.next_batch().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_missing_translations_come_as_null() -> Result<()> {
        let the_file = the_file_containing(
            r#"[{"bcv":"Genesis 1:1","kvj_text":"In the beginning","wey_text":null},
               {"bcv":"Genesis 1:2","kvj_text":null,"asv_text":"And the earth was waste"}]"#,
        );
        let mut the_source = FileSource::new(config_for(&the_file)).await?;

        let the_batch = the_source
            .next_batch()
            .await?
            .expect("💀 nulls must not end the read");
        assert_eq!(the_batch.len(), 2);
        assert_eq!(the_batch[0].kjv_text, "In the beginning");
        assert_eq!(the_batch[0].wey_text, "");
        assert_eq!(the_batch[1].kjv_text, "");
        assert_eq!(the_batch[1].asv_text, "And the earth was waste");
        assert!(the_source.next_batch().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_an_empty_file_is_an_empty_bible() -> Result<()> {
        let the_file = the_file_containing("   \n");
        let mut the_source = FileSource::new(config_for(&the_file)).await?;
        assert!(the_source.next_batch().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_truncated_json_is_fatal() -> Result<()> {
        let the_file = the_file_containing(r#"[{"bcv": "Genesis 1:1"}] [{"bcv": "Gene"#);
        let mut the_source = FileSource::new(config_for(&the_file)).await?;

        assert!(the_source.next_batch().await?.is_some(), "the first array is fine");
        let the_error = the_source
            .next_batch()
            .await
            .expect_err("💀 a truncated second array must be an error");
        assert!(format!("{:#}", the_error).contains("stopped being valid verse JSON"));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_an_object_is_not_an_array() -> Result<()> {
        let the_file = the_file_containing(r#"{"bcv": "Genesis 1:1"}"#);
        let mut the_source = FileSource::new(config_for(&the_file)).await?;
        assert!(the_source.next_batch().await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_file_does_not_exist() {
        let the_result = FileSource::new(FileSourceConfig {
            file_name: "/definitely/not/here/bible.json".to_string(),
        })
        .await;
        let the_error = the_result.expect_err("💀 missing file must be an error");
        assert!(the_error.to_string().contains("/definitely/not/here/bible.json"));
    }
}
