//! The viewer page: one image element, updated from the `/ws` stream.

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>frame-bridge</title>
<style>
  body { margin: 0; background: #111; display: flex; justify-content: center; align-items: center; min-height: 100vh; }
  img { max-width: 100vw; max-height: 100vh; }
</style>
</head>
<body>
<img id="__ELEMENT_ID_ATTR__" alt="">
<script>
  const image = document.getElementById(__ELEMENT_ID_JS__);
  const scheme = location.protocol === "https:" ? "wss" : "ws";
  const socket = new WebSocket(`${scheme}://${location.host}/ws`);
  socket.onmessage = (event) => { image.src = event.data; };
</script>
</body>
</html>
"#;

/// Render the page for an element id.
pub fn render_page(element_id: &str) -> String {
    let js_id = serde_json::to_string(element_id).unwrap_or_else(|_| "\"\"".to_string());
    PAGE_TEMPLATE
        .replace("__ELEMENT_ID_ATTR__", &escape_attr(element_id))
        .replace("__ELEMENT_ID_JS__", &js_id.replace("</", "<\\/"))
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_has_element_and_lookup() {
        let page = render_page("hl-image");
        assert!(page.contains(r#"<img id="hl-image""#));
        assert!(page.contains(r#"document.getElementById("hl-image")"#));
        assert!(!page.contains("__ELEMENT_ID"));
    }

    #[test]
    fn element_id_is_escaped() {
        let page = render_page(r#"a"<b"#);
        assert!(page.contains(r#"<img id="a&quot;&lt;b""#));
        assert!(page.contains(r#"getElementById("a\"<b")"#));
    }
}
