//! Display utilities for simulation results.

use bytesize::ByteSize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use console::style;

use crate::stats::Summary;
use crate::types::Direction;

const LABEL_WIDTH: usize = 21;

/// Formats a byte count with decimal units.
pub fn format_bytes(bytes: usize) -> String {
    ByteSize::b(bytes as u64).display().si().to_string()
}

/// Formats a memory figure with binary units.
pub fn format_memory(bytes: usize) -> String {
    ByteSize::b(bytes as u64).display().iec().to_string()
}

fn format_ratio(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "n/a".to_string(), |ratio| format!("{ratio:.4}"))
}

fn format_percent(percent: Option<f64>) -> String {
    percent.map_or_else(|| "n/a".to_string(), |percent| format!("{percent:.2}%"))
}

fn format_millis(summary: &Summary) -> String {
    format!("{:.3} ms", summary.elapsed.as_secs_f64() * 1000.0)
}

fn line(label: &str, value: &str) -> String {
    format!("{} {value}", style(format!("{:<LABEL_WIDTH$}", format!("{label}:"))).bold())
}

/// Renders the report for a single run.
pub fn render_report(summary: &Summary) -> String {
    let params = &summary.parameters;
    let memory = &summary.memory;
    let mut lines = vec![
        format!("{} {} {}", style("simulating:").cyan(), params.role(), params.direction()),
        format!(
            "{} context_takeover={} speed_level={} window_bits={} memory_level={}",
            style("settings:").cyan(),
            params.context_takeover(),
            params.speed_level(),
            params.window_bits(),
            params.memory_level()
        ),
        String::new(),
        line("Messages sent", &summary.messages.to_string()),
        line("Source bytes", &format_bytes(summary.total_payload)),
        line("Compressed bytes", &format_bytes(summary.total_compressed_size)),
        line(
            "Frame overhead",
            &format!(
                "{} ({}) uncompressed, {} ({}) compressed",
                format_bytes(summary.total_frame_overhead),
                format_percent(summary.frame_overhead_percent),
                format_bytes(summary.total_compressed_frame_overhead),
                format_percent(summary.compressed_frame_overhead_percent)
            ),
        ),
        line("Bytes on wire", &format!("{} uncompressed, {} compressed", format_bytes(summary.wire_uncompressed), format_bytes(summary.wire_compressed))),
        line("Compression ratio", &format_ratio(summary.ratio)),
        line("Elapsed time", &format_millis(summary)),
        String::new(),
        format!("{} {} {} for {} state.", style("Memory used:").bold(), format_memory(memory.local), memory.scope, params.direction().state_label()),
    ];

    if params.direction() == Direction::Sending {
        lines.push(format!(
            "{} {} (32 bit systems), {} (64 bit systems)",
            style("Minimum memory required to decompress:").bold(),
            format_memory(memory.peer_inflate_32),
            format_memory(memory.peer_inflate_64)
        ));
    }

    lines.join("\n")
}

/// Renders one table row per sweep grid point.
pub fn render_sweep(summaries: &[Summary]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Takeover", "Window bits", "Memory level", "Ratio", "Wire bytes", "Elapsed", "Memory"]);

    for summary in summaries {
        let params = &summary.parameters;
        table.add_row(vec![
            Cell::new(if params.context_takeover() { "yes" } else { "no" }),
            Cell::new(params.window_bits()).set_alignment(CellAlignment::Right),
            Cell::new(params.memory_level()).set_alignment(CellAlignment::Right),
            Cell::new(format_ratio(summary.ratio)).set_alignment(CellAlignment::Right),
            Cell::new(format_bytes(summary.wire_compressed)).set_alignment(CellAlignment::Right),
            Cell::new(format_millis(summary)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{} {}", format_memory(summary.memory.local), summary.memory.scope)).set_alignment(CellAlignment::Right),
        ]);
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::parameters::Parameters;
    use crate::session::MessageRecord;

    fn summary(tokens: &[&str]) -> Summary {
        let record = MessageRecord { payload_size: 100, frame_overhead: 2, compressed_size: 40, compressed_frame_overhead: 2, ratio: 0.4, elapsed: Duration::from_micros(250) };
        Summary::from_records(&Parameters::from_tokens(tokens).unwrap(), &[record])
    }

    #[test]
    fn test_report_for_sender() {
        console::set_colors_enabled(false);
        let report = render_report(&summary(&[]));

        assert!(report.contains("simulating: server sending"));
        assert!(report.contains("settings: context_takeover=true speed_level=6 window_bits=15 memory_level=8"));
        assert!(report.contains("Messages sent:"));
        assert!(report.contains("Compression ratio:    0.4000"));
        assert!(report.contains("(2.00%) uncompressed"));
        assert!(report.contains("(5.00%) compressed"));
        assert!(report.contains("0.250 ms"));
        assert!(report.contains("per connection for compression state."));
        assert!(report.contains("(32 bit systems)"));
    }

    #[test]
    fn test_report_for_receiver() {
        console::set_colors_enabled(false);
        let report = render_report(&summary(&["sending=false", "context_takeover=false"]));

        assert!(report.contains("simulating: server receiving"));
        assert!(report.contains("Messages sent:        1"));
        assert!(report.contains("total for decompression state."));
        assert!(!report.contains("Minimum memory required"));
    }

    #[test]
    fn test_report_without_payload() {
        console::set_colors_enabled(false);
        let report = render_report(&Summary::from_records(&Parameters::default(), &[]));

        assert!(report.contains("Compression ratio:    n/a"));
    }

    #[test]
    fn test_sweep_table() {
        let rows = [summary(&[]), summary(&["context_takeover=false", "window_bits=9"])];
        let table = render_sweep(&rows);

        assert!(table.contains("Window bits"));
        assert!(table.contains("0.4000"));
        assert!(table.contains("per connection"));
        assert!(table.contains("total"));
        assert_eq!(table.matches("0.4000").count(), 2);
    }
}
