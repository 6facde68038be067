//! HTML to markdown conversion for webpage tools.
//!
//! Deliberately small: headings, paragraphs, lists, links, images, emphasis
//! and code survive; scripts, styles and comments are dropped; everything
//! else degrades to its text content.

/// Converts an HTML document to markdown. The output never contains a run
/// of three or more consecutive newlines.
pub fn html_to_markdown(html: &str) -> String {
    let stripped = strip_enclosed(html, "<script", "</script");
    let stripped = strip_enclosed(&stripped, "<style", "</style");
    let converted = convert(&stripped);
    collapse_blank_lines(converted.trim())
}

/// Caps every newline run at two, so blocks are separated by at most one
/// blank line.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;

    for ch in text.chars() {
        if ch == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push('\n');
            }
        } else {
            newlines = 0;
            out.push(ch);
        }
    }

    out
}

/// Decodes the handful of entities that actually show up in page text.
pub fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

/// Case-insensitive ASCII substring search, byte-offset based. The needle
/// must be ASCII.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let ned = needle.as_bytes();
    if from >= hay.len() || ned.is_empty() || ned.len() > hay.len() - from {
        return None;
    }
    hay[from..]
        .windows(ned.len())
        .position(|w| w.eq_ignore_ascii_case(ned))
        .map(|i| i + from)
}

/// Removes every `open_tag ... close_tag>` region, content included.
fn strip_enclosed(html: &str, open_tag: &str, close_tag: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;

    while let Some(start) = find_ci(html, open_tag, pos) {
        out.push_str(&html[pos..start]);
        match find_ci(html, close_tag, start).and_then(|c| html[c..].find('>').map(|g| c + g + 1)) {
            Some(end) => pos = end,
            None => {
                pos = html.len();
                break;
            }
        }
    }

    out.push_str(&html[pos..]);
    out
}

struct Emitter {
    out: String,
    // Link text accumulates separately until the anchor closes.
    link: Option<(String, String)>,
    in_pre: bool,
}

impl Emitter {
    fn new() -> Self {
        Self {
            out: String::new(),
            link: None,
            in_pre: false,
        }
    }

    fn sink(&mut self) -> &mut String {
        match &mut self.link {
            Some((_, text)) => text,
            None => &mut self.out,
        }
    }

    fn push_str(&mut self, s: &str) {
        self.sink().push_str(s);
    }

    fn ends_with_whitespace(&mut self) -> bool {
        self.sink()
            .chars()
            .next_back()
            .is_none_or(|c| c.is_whitespace())
    }

    /// Ensures the output ends with a blank line (unless it is still empty).
    fn block_break(&mut self) {
        let sink = self.sink();
        while sink.ends_with(' ') || sink.ends_with('\t') {
            sink.pop();
        }
        if sink.is_empty() {
            return;
        }
        while !sink.ends_with("\n\n") {
            sink.push('\n');
        }
    }

    /// Ensures the output ends with a single newline.
    fn line_break(&mut self) {
        let sink = self.sink();
        while sink.ends_with(' ') || sink.ends_with('\t') {
            sink.pop();
        }
        if !sink.is_empty() && !sink.ends_with('\n') {
            sink.push('\n');
        }
    }

    fn text(&mut self, chunk: &str) {
        let decoded = decode_entities(chunk);

        if self.in_pre {
            self.push_str(&decoded);
            return;
        }

        // Whitespace runs collapse to a single space; whether a chunk had
        // leading/trailing whitespace decides spacing across inline tags.
        let words: Vec<&str> = decoded.split_whitespace().collect();
        if words.is_empty() {
            // Whitespace between inline tags still separates words; after a
            // block break it carries nothing.
            if !decoded.is_empty() && !self.ends_with_whitespace() {
                self.sink().push(' ');
            }
            return;
        }

        if decoded.starts_with(|c: char| c.is_whitespace()) && !self.ends_with_whitespace() {
            self.sink().push(' ');
        }
        let joined = words.join(" ");
        self.push_str(&joined);
        if decoded.ends_with(|c: char| c.is_whitespace()) {
            self.sink().push(' ');
        }
    }
}

/// Pulls a quoted attribute value out of a raw tag body.
fn attr_value(tag_body: &str, attr: &str) -> Option<String> {
    for quote in ['"', '\''] {
        let marker = format!("{}={}", attr, quote);
        if let Some(start) = find_ci(tag_body, &marker, 0) {
            let rest = &tag_body[start + marker.len()..];
            if let Some(end) = rest.find(quote) {
                return Some(rest[..end].to_string());
            }
        }
    }
    None
}

fn tag_name(tag_body: &str) -> (String, bool) {
    let body = tag_body.trim();
    let (closing, body) = match body.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let name: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    (name.to_ascii_lowercase(), closing)
}

fn convert(html: &str) -> String {
    let mut em = Emitter::new();
    let mut rest = html;

    loop {
        match rest.find('<') {
            None => {
                em.text(rest);
                break;
            }
            Some(lt) => {
                em.text(&rest[..lt]);
                let after = &rest[lt + 1..];

                // Comments are skipped wholesale.
                if let Some(stripped) = after.strip_prefix("!--") {
                    match stripped.find("-->") {
                        Some(end) => {
                            rest = &stripped[end + 3..];
                            continue;
                        }
                        None => break,
                    }
                }

                let Some(gt) = after.find('>') else {
                    // Unterminated tag: emit the remainder as text.
                    em.text(rest);
                    break;
                };
                let tag_body = &after[..gt];
                rest = &after[gt + 1..];

                let (name, closing) = tag_name(tag_body);
                handle_tag(&mut em, &name, closing, tag_body);
            }
        }
    }

    // An anchor left open by truncated markup still surrenders its text.
    if let Some((_, text)) = em.link.take() {
        em.out.push_str(text.trim());
    }

    em.out
}

fn handle_tag(em: &mut Emitter, name: &str, closing: bool, tag_body: &str) {
    match name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            em.block_break();
            if !closing {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                em.push_str(&"#".repeat(level));
                em.push_str(" ");
            }
        }
        "p" | "div" | "section" | "article" | "header" | "footer" | "table" | "ul" | "ol"
        | "blockquote" => em.block_break(),
        "br" => em.line_break(),
        "li" => {
            em.line_break();
            if !closing {
                em.push_str("- ");
            }
        }
        "tr" => em.line_break(),
        "td" | "th" => {
            if closing && !em.ends_with_whitespace() {
                em.push_str(" ");
            }
        }
        "a" => {
            if closing {
                if let Some((href, text)) = em.link.take() {
                    let text = text.trim().to_string();
                    if text.is_empty() {
                        em.out.push_str(&href);
                    } else if href.is_empty() {
                        em.out.push_str(&text);
                    } else {
                        em.out.push_str(&format!("[{}]({})", text, href));
                    }
                }
            } else if em.link.is_none() {
                let href = attr_value(tag_body, "href").unwrap_or_default();
                em.link = Some((href, String::new()));
            }
        }
        "img" => {
            if !closing {
                let alt = attr_value(tag_body, "alt").unwrap_or_default();
                let src = attr_value(tag_body, "src").unwrap_or_default();
                if !src.is_empty() {
                    em.push_str(&format!("![{}]({})", alt, src));
                }
            }
        }
        "strong" | "b" => em.push_str("**"),
        "em" | "i" => em.push_str("*"),
        "code" => {
            if !em.in_pre {
                em.push_str("`");
            }
        }
        "pre" => {
            em.block_break();
            if closing {
                em.in_pre = false;
                em.line_break();
                em.push_str("```");
                em.block_break();
            } else {
                em.in_pre = true;
                em.push_str("```\n");
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_and_paragraph_round_trip() {
        let md = html_to_markdown("<h1>Title</h1><p>Para one.</p>");
        assert_eq!(md, "# Title\n\nPara one.");
    }

    #[test]
    fn excess_breaks_collapse_to_one_blank_line() {
        let md = html_to_markdown("<p>A</p>\n\n\n\n<p>B</p>");
        assert_eq!(md, "A\n\nB");
    }

    #[test]
    fn output_never_has_three_consecutive_newlines() {
        let html = "<div><p>one</p><br><br><br><p></p><p>two</p></div>\n\n\n\n<h2>three</h2>";
        let md = html_to_markdown(html);
        assert!(!md.contains("\n\n\n"), "got: {:?}", md);
    }

    #[test]
    fn collapse_caps_runs_at_two() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\nb"), "a\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn scripts_and_styles_are_dropped() {
        let html = "<p>keep</p><script type=\"text/javascript\">var x = 1;</script>\
                    <style>p { color: red }</style><p>also keep</p>";
        let md = html_to_markdown(html);
        assert!(md.contains("keep"));
        assert!(md.contains("also keep"));
        assert!(!md.contains("var x"));
        assert!(!md.contains("color"));
    }

    #[test]
    fn links_become_markdown_links() {
        let md = html_to_markdown(r#"<p>See <a href="https://example.com">the docs</a>.</p>"#);
        assert!(md.contains("[the docs](https://example.com)"));
    }

    #[test]
    fn lists_get_dashes() {
        let md = html_to_markdown("<ul><li>first</li><li>second</li></ul>");
        assert!(md.contains("- first"));
        assert!(md.contains("- second"));
    }

    #[test]
    fn emphasis_markers() {
        let md = html_to_markdown("<p><strong>bold</strong> and <em>slanted</em></p>");
        assert!(md.contains("**bold**"));
        assert!(md.contains("*slanted*"));
    }

    #[test]
    fn entities_are_decoded() {
        let md = html_to_markdown("<p>ham &amp; eggs &lt;3</p>");
        assert_eq!(md, "ham & eggs <3");
    }

    #[test]
    fn comments_are_skipped() {
        let md = html_to_markdown("<p>a</p><!-- hidden --><p>b</p>");
        assert_eq!(md, "a\n\nb");
    }

    #[test]
    fn whitespace_inside_text_is_normalized() {
        let md = html_to_markdown("<p>spaced    out\n\twords</p>");
        assert_eq!(md, "spaced out words");
    }

    #[test]
    fn inline_tags_do_not_glue_words() {
        let md = html_to_markdown("<p>one <b>two</b> three</p>");
        assert_eq!(md, "one **two** three");
    }

    #[test]
    fn subheadings_use_matching_depth() {
        let md = html_to_markdown("<h3>Deep</h3>");
        assert_eq!(md, "### Deep");
    }
}
