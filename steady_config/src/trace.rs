//! Recorded position traces (CSV) for offline replay.
//!
//! Expected headers:
//! t_ms,x,y
//!
//! Example (second row is a frame without a detection):
//! t_ms,x,y
//! 0,320.0,240.0
//! 33,,
//! 66,321.5,240.2

use serde::Deserialize;
use std::path::Path;
use steady_traits::Centroid;

#[derive(Debug, Deserialize, Clone, Copy)]
struct TraceRow {
    t_ms: u64,
    x: Option<f64>,
    y: Option<f64>,
}

/// One replayable tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceSample {
    pub t_ms: u64,
    pub centroid: Option<Centroid>,
}

/// Parse a trace from any reader. See the module docs for the format.
pub fn read_trace<R: std::io::Read>(reader: R) -> eyre::Result<Vec<TraceSample>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read trace headers: {e}"))?
        .clone();
    let expected = ["t_ms", "x", "y"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "trace CSV must have headers 't_ms,x,y', got: {}",
            actual.join(",")
        );
    }

    let mut out = Vec::new();
    let mut last_t: Option<u64> = None;
    for (idx, rec) in rdr.deserialize::<TraceRow>().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let line = idx + 2;
        let row = rec.map_err(|e| eyre::eyre!("invalid trace row {line}: {e}"))?;
        if let Some(prev) = last_t
            && row.t_ms < prev
        {
            eyre::bail!("trace timestamps must be non-decreasing (row {line}: {} < {prev})", row.t_ms);
        }
        last_t = Some(row.t_ms);
        let centroid = match (row.x, row.y) {
            (Some(x), Some(y)) => Some(Centroid::new(x, y)),
            (None, None) => None,
            _ => eyre::bail!("trace row {line} must set both x and y or neither"),
        };
        out.push(TraceSample {
            t_ms: row.t_ms,
            centroid,
        });
    }
    Ok(out)
}

pub fn load_trace_csv(path: &Path) -> eyre::Result<Vec<TraceSample>> {
    let file = std::fs::File::open(path).map_err(|e| eyre::eyre!("open trace CSV {path:?}: {e}"))?;
    read_trace(file).map_err(|e| e.wrap_err(format!("trace {path:?}")))
}
