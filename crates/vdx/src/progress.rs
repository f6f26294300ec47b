// AI
//! 📊 progress.rs - "Are we there yet?" - every loader, every time, forever.
//!
//! 🚀 Tracks how much of the input file has been decoded: bytes, records, rates.
//! Rendered as an indicatif bar with a comfy-table underneath, so the terminal has
//! something to look at while 31,102 verses get parsed.
//!
//! ⚠️ Watching this progress bar will not make it go faster. Science says no.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use indicatif::{ProgressBar, ProgressStyle};

// -- 📏 one mebibyte. not a megabyte. I will die on this hill.
const MIB: u64 = 1024 * 1024;

// -- rates are averaged over this much recent history so one slow array doesn't spike the display
const RATE_WINDOW: Duration = Duration::from_secs(5);

/// 📦 Bytes scaled to the size of the whole input, so the units don't flicker.
fn format_bytes(bytes: u64, total_size: u64) -> String {
    if total_size >= 512 * MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if total_size >= MIB {
        format!("{:.2} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{} bytes", bytes)
    }
}

/// 🔢 "31102" → "31,102". You're welcome, eyes.
pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// ⏱️ MM:SS, or HH:MM:SS if loading a Bible somehow took an hour.
pub(crate) fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// 📡 A snapshot of throughput. A speedometer for verses.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Rates {
    records_per_sec: f64,
    mib_per_sec: f64,
    percent_per_sec: f64,
}

/// 📊 Progress over one input: bytes decoded, records decoded, and how fast.
///
/// # Ancient Proverb
/// "He who loads scripture without a progress bar, waits in darkness."
pub(crate) struct ProgressMetrics {
    /// 🏷️ shown above the bar; the file path, honest and boring
    input_name: String,
    /// 📏 total bytes expected, 0 if unknown
    total_size: u64,
    total_bytes: u64,
    total_records: u64,
    progress_bar: ProgressBar,
    /// 🔄 (when, bytes, records) samples inside the rate window
    rate_samples: VecDeque<(Instant, u64, u64)>,
    start_time: Instant,
}

impl std::fmt::Debug for ProgressMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- 🎭 ProgressBar is a diva and doesn't derive Debug
        f.debug_struct("ProgressMetrics")
            .field("input_name", &self.input_name)
            .field("total_size", &self.total_size)
            .field("total_bytes", &self.total_bytes)
            .field("total_records", &self.total_records)
            .finish()
    }
}

impl ProgressMetrics {
    pub(crate) fn new(input_name: String, total_size: u64) -> Self {
        let progress_bar = ProgressBar::new(total_size);
        // -- the template is a literal; if indicatif ever rejects it, a plain bar is fine
        let style = ProgressStyle::default_bar()
            .template("{msg}\n| [{bar:40.cyan/blue}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        progress_bar.set_style(style);

        let start_time = Instant::now();
        // -- 🔄 seed with t=0 so the first rate isn't a division by zero
        let mut rate_samples = VecDeque::new();
        rate_samples.push_back((start_time, 0u64, 0u64));

        Self {
            input_name,
            total_size,
            total_bytes: 0,
            total_records: 0,
            progress_bar,
            rate_samples,
            start_time,
        }
    }

    /// 🔄 Feed in one decoded array's worth of bytes and records.
    pub(crate) fn update(&mut self, bytes_read: u64, records_read: u64) {
        self.total_bytes += bytes_read;
        self.total_records += records_read;

        let rates = self.calculate_rates(Instant::now());
        self.render(rates);
        self.progress_bar.set_position(self.total_bytes);
    }

    /// ✅ Ring the bell. We hit EOF.
    pub(crate) fn finish(&self) {
        self.progress_bar.finish();
    }

    fn calculate_rates(&mut self, now: Instant) -> Rates {
        while let Some(&(timestamp, _, _)) = self.rate_samples.front() {
            if now.duration_since(timestamp) > RATE_WINDOW {
                self.rate_samples.pop_front();
            } else {
                break;
            }
        }
        self.rate_samples
            .push_back((now, self.total_bytes, self.total_records));

        let Some(&(oldest_time, oldest_bytes, oldest_records)) = self.rate_samples.front() else {
            return Rates::default();
        };
        let elapsed = now.duration_since(oldest_time).as_secs_f64();
        if elapsed <= 0.0 {
            // -- 💤 not enough history yet; zeros, and composure
            return Rates::default();
        }

        let bytes_delta = self.total_bytes.saturating_sub(oldest_bytes);
        let records_delta = self.total_records.saturating_sub(oldest_records);
        let percent_delta = if self.total_size > 0 {
            (bytes_delta as f64 / self.total_size as f64) * 100.0
        } else {
            0.0
        };
        Rates {
            records_per_sec: records_delta as f64 / elapsed,
            mib_per_sec: (bytes_delta as f64 / elapsed) / MIB as f64,
            percent_per_sec: percent_delta / elapsed,
        }
    }

    fn percent_done(&self) -> f64 {
        if self.total_size > 0 {
            (self.total_bytes as f64 / self.total_size as f64) * 100.0
        } else {
            0.0
        }
    }

    /// 🎨 Render the table into the bar's message.
    ///
    /// ```text
    /// input: <name>
    /// | [=====>----------]
    ///   <records/s>   <total records>
    ///   <MiB/s>       <bytes progress>
    ///   <%/s>         <%>
    ///   <elapsed>     <remaining>
    /// ```
    fn render(&self, rates: Rates) {
        let percent = self.percent_done();
        let elapsed = self.start_time.elapsed();
        let remaining = if percent > 0.0 {
            // 🔮 linear extrapolation: the future looks like the past, until it doesn't
            let total_estimated = elapsed.as_secs_f64() / (percent / 100.0);
            let remaining_secs = total_estimated - elapsed.as_secs_f64();
            if remaining_secs > 0.0 {
                format_duration(Duration::from_secs_f64(remaining_secs))
            } else {
                "--:--".to_string()
            }
        } else {
            "--:--".to_string()
        };

        let bytes_progress = format!(
            "{} / {}",
            format_bytes(self.total_bytes, self.total_size),
            format_bytes(self.total_size, self.total_size)
        );

        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.add_row(vec![
            Cell::new(format!("{} Records/s", format_number(rates.records_per_sec as u64)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{} Records", format_number(self.total_records)))
                .set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{:.2} MiB/s", rates.mib_per_sec)).set_alignment(CellAlignment::Right),
            Cell::new(bytes_progress).set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{:.2} %/s", rates.percent_per_sec))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}%", percent)).set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{} elapsed", format_duration(elapsed)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{} remaining", remaining)).set_alignment(CellAlignment::Right),
        ]);

        self.progress_bar
            .set_message(format!("input: {}\n{}", self.input_name, table));
    }
}
