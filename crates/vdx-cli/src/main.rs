//! 🚀 vdx-cli - the front door. Loads config, sets up logging, runs the load,
//! prints a summary. The real work happens in the `vdx` crate. Like a manager. 🦆

use anyhow::{Context, Result};
use comfy_table::{Cell, CellAlignment, Table, presets::UTF8_FULL};
use tracing::error;
use tracing_subscriber::EnvFilter;
use vdx::RunSummary;

/// 📊 The end-of-run receipt.
fn summary_table(summary: &RunSummary) -> Table {
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["📖 vdx", ""]);
    let rows = [
        ("Records read", summary.records_read.to_string()),
        ("Documents indexed", summary.documents_indexed.to_string()),
        ("Records skipped", summary.records_skipped.to_string()),
        ("Bulk requests", summary.bulk_requests.to_string()),
        ("Index deleted", yes_no(summary.index_deleted).to_string()),
        ("Index created", yes_no(summary.index_created).to_string()),
    ];
    for (label, value) in rows {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// 🕵️ Does anything in the chain smell like the cluster isn't there?
fn looks_like_connection_trouble(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        let cause_str = cause.to_string();
        cause_str.contains("error sending request")
            || cause_str.contains("connection refused")
            || cause_str.contains("Connection refused")
            || cause_str.contains("tcp connect error")
            || cause_str.contains("dns error")
    })
}

/// 🔧 Steps:
/// 1. Init tracing (`RUST_LOG=info` to see the milestones)
/// 2. Config path from argv, default `vdx.toml`, skipped if it isn't there
/// 3. Load config, run, print the receipt
/// 4. On error: log the whole chain and exit 1
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let path_arg = args.get(1).map(String::as_str).unwrap_or("vdx.toml");

    // 🔒 No file is fine (env vars and defaults carry the day). An unreadable path is not.
    let config_file = std::path::Path::new(path_arg);
    let config_file_if_present = match config_file.try_exists().context(format!(
        "💀 Couldn't tell whether the configuration file exists. If it's a relative path, \
         check the working directory, or use an absolute path. Was checking here: '{}'",
        config_file.display()
    ))? {
        true => Some(config_file),
        false => None,
    };

    let app_config = vdx::app_config::load_config(config_file_if_present).context(
        "💀 In vdx-cli, main, we couldn't load the configuration. Check the TOML file and any VDX_* variables.",
    )?;

    match vdx::run(app_config).await {
        Ok(summary) => {
            println!("{}", summary_table(&summary));
            Ok(())
        }
        Err(err) => {
            error!("💀 error: {}", err);
            // -- 🧅 peel the onion of sadness, one layer at a time
            for cause in err.chain().skip(1) {
                error!("⚠️  cause: {}", cause);
            }
            if looks_like_connection_trouble(&err) {
                error!(
                    "🔧 hint: looks like Elasticsearch isn't reachable. Check the url in \
                    [store_config.Elasticsearch], and that the cluster is actually running. \
                    If you're using Docker, `docker ps` shows what's up. ☕"
                );
            }
            std::process::exit(1);
        }
    }
}
