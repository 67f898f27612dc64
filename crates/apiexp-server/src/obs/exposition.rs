//! Prometheus text exposition (format 0.0.4).

use std::fmt::Write;

use super::registry::FamilySnapshot;

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v.is_infinite() {
        if v > 0.0 { "+Inf".into() } else { "-Inf".into() }
    } else {
        v.to_string()
    }
}

fn render_family(f: &FamilySnapshot, out: &mut String) {
    let _ = writeln!(out, "# HELP {} {}", f.name, escape_help(&f.help));
    let _ = writeln!(out, "# TYPE {} {}", f.name, f.kind.as_str());
    for (key, val) in &f.samples {
        if key.is_empty() {
            let _ = writeln!(out, "{} {}", f.name, format_value(*val));
            continue;
        }
        let label_str = f
            .label_names
            .iter()
            .zip(key.values())
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(out, "{}{{{}}} {}", f.name, label_str, format_value(*val));
    }
}

pub fn render(families: &[FamilySnapshot]) -> String {
    let mut out = String::new();
    for f in families {
        render_family(f, &mut out);
    }
    out
}
