use chrono::Utc;

use super::{algorithm_label, line_label, ReportView};
use crate::rules::{ComplianceVerdict, Finding};

/// Render findings as a self-contained HTML report. Rows keep scan order;
/// non-compliant rows are marked `danger`, the rest `safe`.
pub fn render(view: &ReportView<'_>) -> String {
    let findings = view.findings;
    let verdict = view.verdict;
    let status_class = if verdict.pass { "pass" } else { "fail" };
    let status_text = if verdict.pass { "PASS" } else { "FAIL" };

    let fips = findings
        .iter()
        .filter(|f| f.provider_verdict == ComplianceVerdict::Fips)
        .count();
    let unresolved = findings.iter().filter(|f| f.has_unresolved()).count();

    let finding_rows: String = findings.iter().map(row).collect();

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>FIPS Crypto Usage Report: {target}</title>
<style>
  :root {{
    --bg: #0d1117; --fg: #c9d1d9; --border: #30363d; --card: #161b22;
    --muted: #8b949e; --accent: #58a6ff; --pass: #3fb950; --fail: #f85149;
  }}
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
    background: var(--bg); color: var(--fg); line-height: 1.5; padding: 2rem; }}
  .container {{ max-width: 1400px; margin: 0 auto; }}
  header {{ display: flex; align-items: center; justify-content: space-between;
    padding: 1.5rem; background: var(--card); border: 1px solid var(--border);
    border-radius: 8px; margin-bottom: 1.5rem; }}
  header h1 {{ font-size: 1.4rem; }}
  header h1 span {{ color: var(--accent); font-weight: 400; }}
  .verdict {{ font-size: 1.2rem; font-weight: 700; padding: 0.4rem 1.2rem; border-radius: 6px; }}
  .verdict.pass {{ background: var(--pass); color: #000; }}
  .verdict.fail {{ background: var(--fail); color: #fff; }}
  .summary {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(140px, 1fr));
    gap: 1rem; margin-bottom: 1.5rem; }}
  .stat {{ background: var(--card); border: 1px solid var(--border);
    border-radius: 8px; padding: 1rem; text-align: center; }}
  .stat .count {{ font-size: 2rem; font-weight: 700; }}
  .stat .label {{ font-size: 0.85rem; color: var(--muted); }}
  .stat.danger .count {{ color: var(--fail); }}
  .stat.safe .count {{ color: var(--pass); }}
  table {{ width: 100%; border-collapse: collapse; background: var(--card);
    border: 1px solid var(--border); border-radius: 8px; overflow: hidden; }}
  th {{ text-align: left; padding: 0.75rem 1rem; border-bottom: 2px solid var(--border);
    font-size: 0.8rem; text-transform: uppercase; color: var(--muted); }}
  td {{ padding: 0.6rem 1rem; border-bottom: 1px solid var(--border);
    font-size: 0.9rem; vertical-align: top; }}
  tr.danger td {{ background: rgba(248, 81, 73, 0.12); }}
  tr.safe td {{ background: rgba(63, 185, 80, 0.08); }}
  .trace {{ display: block; font-size: 0.75rem; color: var(--muted); }}
  footer {{ margin-top: 1.5rem; text-align: center; font-size: 0.8rem; color: var(--muted); }}
  .empty {{ text-align: center; padding: 3rem; color: var(--pass); font-size: 1.2rem; }}
</style>
</head>
<body>
<div class="container">
  <header>
    <h1>fipsscan <span>v{version}</span></h1>
    <div class="verdict {status_class}">{status_text}</div>
  </header>

  <div class="summary">
    <div class="stat"><div class="count">{total}</div><div class="label">Call sites</div></div>
    <div class="stat danger"><div class="count">{non_compliant}</div><div class="label">Non-compliant</div></div>
    <div class="stat safe"><div class="count">{fips}</div><div class="label">FIPS provider</div></div>
    <div class="stat"><div class="count">{unresolved}</div><div class="label">Unresolved</div></div>
  </div>

  {content}

  <footer>
    Scanned <strong>{target}</strong> at {generated} (threshold: {threshold}, fingerprint: <code>{fingerprint}</code>)
  </footer>
</div>
</body>
</html>"##,
        target = html_escape(view.target_name),
        version = env!("CARGO_PKG_VERSION"),
        status_class = status_class,
        status_text = status_text,
        total = findings.len(),
        non_compliant = verdict.non_compliant_findings,
        fips = fips,
        unresolved = unresolved,
        generated = Utc::now().to_rfc3339(),
        threshold = verdict.fail_threshold,
        fingerprint = html_escape(view.fingerprint),
        content = if findings.is_empty() {
            "<div class=\"empty\">No sensitive crypto API usage detected.</div>".to_string()
        } else {
            format!(
                r#"<table>
  <thead>
    <tr>
      <th>Category</th><th>Class</th><th>Method</th><th>Algorithm</th>
      <th>Resolution</th><th>Line</th><th>Provider</th><th>Provider Status</th>
    </tr>
  </thead>
  <tbody>
    {rows}
  </tbody>
</table>"#,
                rows = finding_rows
            )
        },
    )
}

fn row(f: &Finding) -> String {
    let row_class = if f.is_non_compliant() { "danger" } else { "safe" };
    let trace = if f.algorithm_trace.is_empty() {
        String::new()
    } else {
        format!(
            "<span class=\"trace\">{}</span>",
            html_escape(&f.algorithm_trace.join(" \u{2192} "))
        )
    };

    format!(
        r#"<tr class="{row_class}">
  <td>{category}</td>
  <td><code>{class}</code></td>
  <td><code>{method}</code></td>
  <td>{algorithm}</td>
  <td>{resolution}{trace}</td>
  <td>{line}</td>
  <td>{provider}</td>
  <td>{status}</td>
</tr>
"#,
        row_class = row_class,
        category = html_escape(&f.category),
        class = html_escape(&f.class_name),
        method = html_escape(&f.method_signature),
        algorithm = html_escape(algorithm_label(f)),
        resolution = f.algorithm_provenance,
        trace = trace,
        line = line_label(f),
        provider = html_escape(&f.resolved_provider),
        status = f.provider_verdict,
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
