// =============================================================================
// HTML Dashboard Renderer
// =============================================================================
//
// The rendering edge: unavailable metrics are shown with their zero default
// and flagged with the `stale` class plus the reason as a tooltip.
// =============================================================================

use crate::aggregator::DashboardSnapshot;
use crate::error::Metric;
use crate::metrics::{Direction, TimeframeQuote};

const STYLE: &str = "body{font-family:monospace;background:#111;color:#ddd;margin:1.5em}\
table{border-collapse:collapse;margin-bottom:1.5em}\
th,td{border:1px solid #333;padding:4px 8px;text-align:right}\
th{background:#1d1d1d}.up{color:#3c3}.down{color:#e44}\
.stale{color:#777;font-style:italic}";

/// Minimal escaping for text and attribute content.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn sign_class(v: f64) -> &'static str {
    if v > 0.0 {
        "up"
    } else if v < 0.0 {
        "down"
    } else {
        ""
    }
}

/// One `<td>`; unavailable metrics render `T::default()` flagged as stale.
fn cell<T: Clone + Default>(metric: &Metric<T>, render: impl Fn(&T) -> (String, &'static str)) -> String {
    match metric {
        Metric::Ok { value } => {
            let (text, class) = render(value);
            format!("<td class=\"{class}\">{}</td>", escape(&text))
        }
        Metric::Unavailable { reason } => {
            let (text, _) = render(&metric.value_or_default());
            format!(
                "<td class=\"stale\" title=\"{}\">{}</td>",
                escape(&reason.to_string()),
                escape(&text)
            )
        }
    }
}

fn quote_cells(metric: &Metric<TimeframeQuote>) -> String {
    let mut out = String::new();
    out.push_str(&cell(metric, |q| (format!("{:.2}", q.price), "")));
    out.push_str(&cell(metric, |q| (format!("{:+.2}%", q.change_pct), sign_class(q.change_pct))));
    out.push_str(&cell(metric, |q| (q.volume.to_string(), "")));
    out.push_str(&cell(metric, |q| (format!("{:.2}x", q.vol_ratio), "")));
    out
}

/// Render the full dashboard page. `refresh_secs` drives the browser's
/// auto-reload.
pub fn render_dashboard(snapshot: &DashboardSnapshot, refresh_secs: u64) -> String {
    let mut html = String::with_capacity(32 * 1024);

    html.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    html.push_str(&format!(
        "<meta http-equiv=\"refresh\" content=\"{}\">",
        refresh_secs.max(30)
    ));
    html.push_str("<title>Market Pulse</title>");
    html.push_str(&format!("<style>{STYLE}</style></head><body>"));
    html.push_str(&format!(
        "<h1>Market Pulse</h1><p>Updated {} UTC &middot; snapshot {} &middot; {} ms</p>",
        snapshot.computed_at.format("%Y-%m-%d %H:%M:%S"),
        snapshot.id,
        snapshot.elapsed_ms
    ));

    // ── Multi-timeframe ─────────────────────────────────────────────────
    for asset in &snapshot.assets {
        html.push_str(&format!(
            "<h2>{} <small>{}</small></h2><table><tr><th>TF</th><th>Price</th><th>Change</th><th>Volume</th><th>Vol ratio</th></tr>",
            escape(asset.label),
            escape(asset.symbol)
        ));
        for tf in &asset.timeframes {
            html.push_str(&format!("<tr><th>{}</th>{}</tr>", escape(tf.label), quote_cells(&tf.quote)));
        }
        html.push_str("</table>");
    }

    // ── Gaps ────────────────────────────────────────────────────────────
    html.push_str("<h2>Gaps</h2><table>");
    for gap in &snapshot.gaps {
        html.push_str(&format!(
            "<tr><th>{}</th>{}</tr>",
            escape(gap.label),
            cell(&gap.gap_pct, |g| (format!("{g:+.2}%"), sign_class(*g)))
        ));
    }
    html.push_str("</table>");

    // ── Breadth ─────────────────────────────────────────────────────────
    let breadth = &snapshot.breadth;
    html.push_str(&format!(
        "<h2>Dow 30 Breadth</h2><p><span class=\"up\">{} advancing</span> / <span class=\"down\">{} declining</span>",
        breadth.positive, breadth.negative
    ));
    if !breadth.failed.is_empty() {
        html.push_str(&format!(
            " <span class=\"stale\">({} unavailable: {})</span>",
            breadth.failed.len(),
            escape(&breadth.failed_symbols().join(", "))
        ));
    }
    html.push_str("</p><table>");
    for d in &breadth.detail {
        let class = match d.direction {
            Direction::Advancing => "up",
            Direction::Declining => "down",
        };
        html.push_str(&format!(
            "<tr><th>{}</th><td class=\"{class}\">{}</td><td class=\"{class}\">{:+.2}%</td></tr>",
            escape(&d.symbol),
            d.direction.glyph(),
            d.change_pct
        ));
    }
    html.push_str("</table>");

    // ── Point of control ────────────────────────────────────────────────
    let poc = &snapshot.point_of_control;
    html.push_str("<h2>Volume Profile</h2><table><tr><th>POC</th><th>Volume</th><th>Current</th></tr><tr>");
    html.push_str(&cell(poc, |p| (p.price.to_string(), "")));
    html.push_str(&cell(poc, |p| (p.volume.to_string(), "")));
    html.push_str(&cell(poc, |p| (format!("{:.2}", p.current), "")));
    html.push_str("</tr></table>");

    // ── Overnight ───────────────────────────────────────────────────────
    let on = &snapshot.overnight;
    html.push_str("<h2>Overnight Structure</h2><table><tr><th>High</th><th>Low</th><th>Mid</th><th>Range</th><th>Current</th><th>Position</th></tr><tr>");
    html.push_str(&cell(on, |o| (format!("{:.2}", o.high), "")));
    html.push_str(&cell(on, |o| (format!("{:.2}", o.low), "")));
    html.push_str(&cell(on, |o| (format!("{:.2}", o.mid), "")));
    html.push_str(&cell(on, |o| (format!("{:.2}", o.range), "")));
    html.push_str(&cell(on, |o| (format!("{:.2}", o.current), "")));
    html.push_str(&cell(on, |o| (format!("{:.2}%", o.position_pct), "")));
    html.push_str("</tr></table>");

    html.push_str("</body></html>");
    html
}
