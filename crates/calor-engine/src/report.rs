//! Text dumps of grids for verbose runs.

use calor_core::CellFlags;

/// One row per line, each cell as `" {:6.2}"`.
///
/// ```
/// let text = calor_engine::report::format_state(&[1.0, 2.5, 0.0, 100.0], 2);
/// assert_eq!(text, "   1.00   2.50\n   0.00 100.00\n");
/// ```
pub fn format_state(state: &[f32], n: usize) -> String {
    format_rows(state, n, |out, v| out.push_str(&format!(" {v:6.2}")))
}

/// One row per line, each cell as its raw property word.
pub fn format_properties(properties: &[CellFlags], n: usize) -> String {
    format_rows(properties, n, |out, p| {
        out.push_str(&format!(" {:6}", p.bits()))
    })
}

fn format_rows<T>(cells: &[T], n: usize, mut cell: impl FnMut(&mut String, &T)) -> String {
    let mut out = String::new();
    if n == 0 {
        return out;
    }
    for row in cells.chunks(n) {
        for v in row {
            cell(&mut out, v);
        }
        out.push('\n');
    }
    out
}

/// Log the property grid at `debug` level.
pub fn dump_properties(properties: &[CellFlags], n: usize) {
    if tracing::enabled!(tracing::Level::DEBUG) {
        tracing::debug!("property grid:\n{}", format_properties(properties, n));
    }
}

/// Log a temperature grid at `debug` level.
pub fn dump_state(label: &str, state: &[f32], n: usize) {
    if tracing::enabled!(tracing::Level::DEBUG) {
        tracing::debug!("{label}:\n{}", format_state(state, n));
    }
}
