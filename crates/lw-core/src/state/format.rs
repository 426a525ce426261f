//! Number formatting applied before a value enters the snapshot.
//!
//! - glucose: no fraction digits, ties rounded away from zero
//! - delta: at most one fraction digit, always signed (`+0`, `+1.5`, `-3`)
//! - eventual glucose: no fraction digits, ties to even
//!
//! 数值在写入快照前统一格式化，传输层只接收字符串。

/// Format a glucose value (mg/dL) for display.
pub fn glucose(mg_dl: f64) -> String {
    whole_number(mg_dl.round())
}

/// Format a glucose delta (mg/dL) with an explicit sign.
pub fn delta(mg_dl: f64) -> String {
    let text = format!("{:.1}", mg_dl);
    let text = text.strip_suffix(".0").unwrap_or(&text);
    let text = if text == "-0" { "0" } else { text };

    if text.starts_with('-') {
        text.to_string()
    } else {
        format!("+{text}")
    }
}

/// Format the eventual (predicted) glucose.
pub fn eventual_glucose(mg_dl: f64) -> String {
    whole_number(mg_dl)
}

fn whole_number(value: f64) -> String {
    let text = format!("{:.0}", value);
    if text == "-0" {
        "0".to_string()
    } else {
        text
    }
}
