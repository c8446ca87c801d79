//! Minimal server-rendered pages for the upload flow.
use crate::types::InputFormat;

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Whole mebibytes when the value is at least 1 MiB, bytes otherwise.
pub fn format_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB {
        format!("{} MB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 40rem; margin: 3rem auto; padding: 0 1rem; color: #333; }}
.error {{ background: #fdecea; border: 1px solid #f5c2c0; padding: .75rem 1rem; border-radius: 6px; }}
.ok {{ background: #edf7ed; border: 1px solid #b7dfb9; padding: .75rem 1rem; border-radius: 6px; }}
button, .button {{ background: #6b5b4b; color: #fff; border: 0; padding: .6rem 1.2rem; border-radius: 6px; text-decoration: none; }}
</style>
</head>
<body>
<h1>Sticker Processor</h1>
{body}
</body>
</html>
"#,
        title = escape_html(title),
        body = body
    )
}

pub fn index_page(max_files: usize, max_file_bytes: u64, canvas_size: u32) -> String {
    let accept: Vec<String> = InputFormat::ALL
        .iter()
        .map(|f| format!(".{}", f.extension()))
        .collect();
    let body = format!(
        r#"<p>Upload up to {max_files} images (max {size} each). Backgrounds are removed and each
image is centered on a {canvas_size}&times;{canvas_size} transparent canvas.</p>
<form action="/upload" method="post" enctype="multipart/form-data">
<p><input type="file" name="files" multiple accept="{accept}"></p>
<p><button type="submit">Process images</button></p>
</form>"#,
        size = format_size(max_file_bytes),
        accept = accept.join(","),
    );
    layout("Sticker Processor", &body)
}

pub fn result_page(
    session_id: &str,
    archive: &str,
    processed: usize,
    failures: &[(String, String)],
) -> String {
    let mut body = format!(
        r#"<div class="ok"><p>{processed} image(s) processed.</p></div>
<p><a class="button" href="/download/{id}/{archive}">Download {archive}</a></p>
<p>The archive can be downloaded once.</p>"#,
        id = escape_html(session_id),
        archive = escape_html(archive),
    );
    if !failures.is_empty() {
        body.push_str(&failure_list(failures));
    }
    body.push_str(r#"<p><a href="/">Process more images</a></p>"#);
    layout("Processing complete", &body)
}

pub fn error_page(message: &str, failures: &[(String, String)]) -> String {
    let mut body = format!(
        r#"<div class="error"><p>{}</p></div>"#,
        escape_html(message)
    );
    if !failures.is_empty() {
        body.push_str(&failure_list(failures));
    }
    body.push_str(r#"<p><a href="/">Back to upload</a></p>"#);
    layout("Error", &body)
}

fn failure_list(failures: &[(String, String)]) -> String {
    let items: String = failures
        .iter()
        .map(|(name, reason)| {
            format!(
                "<li><strong>{}</strong>: {}</li>",
                escape_html(name),
                escape_html(reason)
            )
        })
        .collect();
    format!(r#"<div class="error"><p>Some files failed:</p><ul>{items}</ul></div>"#)
}
