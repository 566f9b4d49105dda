/// Status Report Rendering
///
/// The read-only surface published by the core: per-pool sizing rows in
/// plain-text (aligned columns, humanized sizes, blank cells for unset
/// optional values) or structured JSON.

use crate::error::Result;
use crate::scaler::PoolScaleResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFormat {
    Plain,
    Json,
}

impl std::str::FromStr for StatusFormat {
    type Err = crate::error::ScalerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "plain" => Ok(StatusFormat::Plain),
            "json" | "json-pretty" => Ok(StatusFormat::Json),
            other => Err(crate::error::ScalerError::InvalidInput(format!(
                "unknown status format '{}'",
                other
            ))),
        }
    }
}

/// Humanize a byte count with binary units.
pub fn format_bytes(n: u64) -> String {
    const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
    if n < 1024 {
        return format!("{}B", n);
    }
    let mut value = n as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if value >= 100.0 {
        format!("{:.0}{}", value, UNITS[unit])
    } else {
        format!("{:.1}{}", value, UNITS[unit])
    }
}

const HEADERS: [&str; 12] = [
    "POOL",
    "SIZE",
    "TARGET SIZE",
    "RATE",
    "RAW CAPACITY",
    "RATIO",
    "TARGET RATIO",
    "EFFECTIVE RATIO",
    "BIAS",
    "PG_NUM",
    "NEW PG_NUM",
    "AUTOSCALE",
];

// POOL and AUTOSCALE read left-aligned; everything else is numeric.
const LEFT_ALIGNED: [bool; 12] = [
    true, false, false, false, false, false, false, false, false, false, false, true,
];

fn status_row(r: &PoolScaleResult) -> [String; 12] {
    [
        r.pool_name.clone(),
        format_bytes(r.logical_used),
        if r.target_bytes > 0 {
            format_bytes(r.target_bytes)
        } else {
            String::new()
        },
        format!("{}", r.raw_used_rate),
        format_bytes(r.subtree_capacity),
        format!("{:.4}", r.capacity_ratio),
        if r.target_ratio > 0.0 {
            format!("{:.4}", r.target_ratio)
        } else {
            String::new()
        },
        if r.effective_target_ratio > 0.0 {
            format!("{:.4}", r.effective_target_ratio)
        } else {
            String::new()
        },
        format!("{}", r.bias),
        r.pg_num_target.to_string(),
        if r.would_adjust {
            r.pg_num_final.to_string()
        } else {
            String::new()
        },
        r.pg_autoscale_mode.to_string(),
    ]
}

/// Render sizing results in the requested format.
pub fn render_status(results: &[PoolScaleResult], format: StatusFormat) -> Result<String> {
    match format {
        StatusFormat::Json => Ok(serde_json::to_string_pretty(results)?),
        StatusFormat::Plain => {
            let rows: Vec<[String; 12]> = results.iter().map(status_row).collect();

            let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
            for row in &rows {
                for (width, cell) in widths.iter_mut().zip(row.iter()) {
                    *width = (*width).max(cell.len());
                }
            }

            let mut out = String::new();
            render_line(&mut out, &HEADERS.map(String::from), &widths);
            for row in &rows {
                render_line(&mut out, row, &widths);
            }
            Ok(out)
        }
    }
}

fn render_line(out: &mut String, cells: &[String; 12], widths: &[usize]) {
    let mut line = String::new();
    for (i, cell) in cells.iter().enumerate() {
        if LEFT_ALIGNED[i] {
            line.push_str(&format!("{:<width$}", cell, width = widths[i]));
        } else {
            line.push_str(&format!("{:>width$}", cell, width = widths[i]));
        }
        if i + 1 < cells.len() {
            line.push_str("  ");
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::AutoscaleMode;

    fn result() -> PoolScaleResult {
        PoolScaleResult {
            pool_id: 1,
            pool_name: "rbd".to_string(),
            crush_root_id: -1,
            pg_autoscale_mode: AutoscaleMode::On,
            pg_num_target: 32,
            logical_used: 5 << 30,
            target_bytes: 0,
            raw_used_rate: 3.0,
            subtree_capacity: 10 << 40,
            actual_raw_used: (5u64 << 30) as f64 * 3.0,
            raw_used: (5u64 << 30) as f64 * 3.0,
            actual_capacity_ratio: 0.0015,
            capacity_ratio: 0.0015,
            target_ratio: 0.0,
            effective_target_ratio: 0.0,
            pg_num_ideal: 14,
            pg_num_final: 128,
            would_adjust: true,
            bias: 1.0,
        }
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0B");
        assert_eq!(format_bytes(512), "512B");
        assert_eq!(format_bytes(1024), "1.0KiB");
        assert_eq!(format_bytes(5 << 30), "5.0GiB");
        assert_eq!(format_bytes(10 << 40), "10.0TiB");
        assert_eq!(format_bytes(200 << 30), "200GiB");
    }

    #[test]
    fn test_plain_render() {
        let out = render_status(&[result()], StatusFormat::Plain).unwrap();
        let mut lines = out.lines();
        let header = lines.next().unwrap();
        assert!(header.contains("POOL"));
        assert!(header.contains("NEW PG_NUM"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("rbd"));
        assert!(row.contains("5.0GiB"));
        assert!(row.contains("128"));
        assert!(row.ends_with("on"));
    }

    #[test]
    fn test_plain_render_blank_cells() {
        let mut r = result();
        r.would_adjust = false;
        let out = render_status(&[r], StatusFormat::Plain).unwrap();
        let row = out.lines().nth(1).unwrap();
        // No new pg_num suggestion when nothing would change.
        assert!(!row.contains("128"));
    }

    #[test]
    fn test_json_render_parses_back() {
        let out = render_status(&[result()], StatusFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["pool_name"], "rbd");
        assert_eq!(parsed[0]["pg_num_final"], 128);
        assert_eq!(parsed[0]["would_adjust"], true);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("plain".parse::<StatusFormat>().unwrap(), StatusFormat::Plain);
        assert_eq!("json".parse::<StatusFormat>().unwrap(), StatusFormat::Json);
        assert!("yaml".parse::<StatusFormat>().is_err());
    }
}
