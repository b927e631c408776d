//! Synthetic responses served when neither network nor cache can answer.

use crate::Response;
use crate::config::OfflinePageText;

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";

pub const PLACEHOLDER_WIDTH: u32 = 200;
pub const PLACEHOLDER_HEIGHT: u32 = 150;

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Standalone offline page with a reload button.
///
/// Served with status 200 so the browser renders it as a normal page.
pub fn offline_page(text: &OfflinePageText) -> Response {
    let lang = escape_html(&text.lang);
    let title = escape_html(&text.title);
    let message = escape_html(&text.message);
    let reload = escape_html(&text.reload_label);

    let body = format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; text-align: center; padding: 50px 20px; color: #333; }}
button {{ padding: 10px 20px; margin-top: 20px; border: 0; border-radius: 4px; background: #4cbf30; color: #fff; cursor: pointer; }}
</style>
</head>
<body>
<div class="offline">
<h1>{title}</h1>
<p>{message}</p>
<button type="button" onclick="location.reload()">{reload}</button>
</div>
</body>
</html>
"#
    );

    Response::new(200, body).with_header("Content-Type", HTML_CONTENT_TYPE)
}

/// 200×150 light-gray SVG with a centered caption.
pub fn placeholder_image(caption: &str) -> Response {
    let caption = escape_html(caption);
    let body = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="100%" height="100%" fill="#f0f0f0"/><text x="50%" y="50%" text-anchor="middle" dominant-baseline="middle" font-family="sans-serif" font-size="14" fill="#999">{caption}</text></svg>"##,
        w = PLACEHOLDER_WIDTH,
        h = PLACEHOLDER_HEIGHT,
    );

    Response::new(200, body).with_header("Content-Type", SVG_CONTENT_TYPE)
}
