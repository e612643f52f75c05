//! Branded HTML documents for PDF rendering
//!
//! Generated text is treated as light Markdown: `#`-style headings,
//! `-`/`*` bullet lists, `---` rules and blank-line separated paragraphs.
//! Everything else is escaped.

use crate::config::Branding;

/// Document-level metadata
#[derive(Debug, Clone, Default)]
pub struct DocumentMeta {
    pub title: String,
    pub subtitle: Option<String>,
    pub generated_at: Option<String>,
}

/// Full HTML document for one section
pub fn section_document(text: &str, branding: &Branding, meta: &DocumentMeta) -> String {
    let mut html = String::with_capacity(text.len() * 2 + 2048);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape(&meta.title)));
    html.push_str(&stylesheet(branding));
    html.push_str("</head>\n<body>\n<header>\n");

    if let Some(logo) = branding.resolve_logo() {
        html.push_str(&format!(
            "<img class=\"logo\" src=\"{}\" alt=\"{}\">\n",
            escape(&logo),
            escape(&branding.company_name)
        ));
    }
    html.push_str(&format!("<h1 class=\"title\">{}</h1>\n", escape(&meta.title)));
    if let Some(subtitle) = &meta.subtitle {
        html.push_str(&format!("<p class=\"subtitle\">{}</p>\n", escape(subtitle)));
    }
    html.push_str("</header>\n<main>\n");
    html.push_str(&markdown_to_html(text));
    html.push_str("</main>\n");

    let mut footer_parts = Vec::new();
    if !branding.footer_text.is_empty() {
        footer_parts.push(escape(&branding.footer_text));
    }
    if let Some(generated_at) = &meta.generated_at {
        footer_parts.push(escape(generated_at));
    }
    if !footer_parts.is_empty() {
        html.push_str(&format!("<footer>{}</footer>\n", footer_parts.join(" · ")));
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn stylesheet(branding: &Branding) -> String {
    format!(
        "<style>\n\
         body {{ font-family: Helvetica, Arial, sans-serif; line-height: 1.6; color: #222; margin: 0 2em; }}\n\
         header {{ border-bottom: 4px solid {primary}; margin-bottom: 1.5em; padding-bottom: 0.5em; }}\n\
         .logo {{ max-height: 60px; }}\n\
         h1, h2 {{ color: {primary}; }}\n\
         h3, h4 {{ color: {secondary}; }}\n\
         .subtitle {{ color: {secondary}; font-size: 1.1em; }}\n\
         hr {{ border: 0; border-top: 1px solid {secondary}; margin: 2em 0; }}\n\
         footer {{ border-top: 1px solid #ddd; color: #666; font-size: 0.8em; margin-top: 3em; padding-top: 0.5em; }}\n\
         </style>\n",
        primary = escape(&branding.primary_color),
        secondary = escape(&branding.secondary_color),
    )
}

fn markdown_to_html(text: &str) -> String {
    let mut html = String::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut in_list = false;

    let flush_paragraph = |html: &mut String, paragraph: &mut Vec<&str>| {
        if !paragraph.is_empty() {
            let body = paragraph
                .iter()
                .map(|line| inline(line))
                .collect::<Vec<_>>()
                .join("<br>\n");
            html.push_str(&format!("<p>{}</p>\n", body));
            paragraph.clear();
        }
    };

    for raw in text.lines() {
        let line = raw.trim();

        let bullet = line.strip_prefix("- ").or_else(|| line.strip_prefix("* "));
        if bullet.is_none() && in_list {
            html.push_str("</ul>\n");
            in_list = false;
        }

        if line.is_empty() {
            flush_paragraph(&mut html, &mut paragraph);
        } else if let Some(item) = bullet {
            flush_paragraph(&mut html, &mut paragraph);
            if !in_list {
                html.push_str("<ul>\n");
                in_list = true;
            }
            html.push_str(&format!("<li>{}</li>\n", inline(item)));
        } else if line == "---" || line == "***" {
            flush_paragraph(&mut html, &mut paragraph);
            html.push_str("<hr>\n");
        } else if let Some((level, heading)) = heading(line) {
            flush_paragraph(&mut html, &mut paragraph);
            html.push_str(&format!("<h{0}>{1}</h{0}>\n", level, inline(heading)));
        } else {
            paragraph.push(line);
        }
    }

    flush_paragraph(&mut html, &mut paragraph);
    if in_list {
        html.push_str("</ul>\n");
    }
    html
}

/// `#` → h2 ... `####` → h5; the document title owns h1
fn heading(line: &str) -> Option<(usize, &str)> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if !(1..=4).contains(&hashes) {
        return None;
    }
    line[hashes..]
        .strip_prefix(' ')
        .map(|rest| (hashes + 1, rest.trim()))
}

/// Escape and apply `**bold**`
fn inline(text: &str) -> String {
    let escaped = escape(text);
    let mut out = String::with_capacity(escaped.len());
    let mut open = false;
    let mut rest = escaped.as_str();
    while let Some(pos) = rest.find("**") {
        out.push_str(&rest[..pos]);
        out.push_str(if open { "</strong>" } else { "<strong>" });
        open = !open;
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    if open {
        out.push_str("</strong>");
    }
    out
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_markdown_blocks() {
        let html = markdown_to_html(
            "# Intro\nFirst line\nsecond line\n\n- one\n- **two**\n\n---\n\nClosing <b>",
        );
        assert!(html.contains("<h2>Intro</h2>"));
        assert!(html.contains("<p>First line<br>\nsecond line</p>"));
        assert!(html.contains("<ul>\n<li>one</li>\n<li><strong>two</strong></li>\n</ul>"));
        assert!(html.contains("<hr>"));
        assert!(html.contains("<p>Closing &lt;b&gt;</p>"));
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(heading("## Title"), Some((3, "Title")));
        assert_eq!(heading("#hashtag"), None);
        assert_eq!(heading("##### too deep"), None);
    }

    #[test]
    fn test_document_uses_branding() {
        let branding = Branding {
            company_name: "Acme".to_string(),
            primary_color: "#ff0000".to_string(),
            footer_text: "© Acme".to_string(),
            logo_url: Some("https://acme.test/logo.png".to_string()),
            ..Default::default()
        };
        let meta = DocumentMeta {
            title: "Guide & Tips".to_string(),
            subtitle: Some("Part of the bundle".to_string()),
            generated_at: Some("2024-01-01".to_string()),
        };

        let html = section_document("Body text", &branding, &meta);
        assert!(html.contains("<title>Guide &amp; Tips</title>"));
        assert!(html.contains("#ff0000"));
        assert!(html.contains("src=\"https://acme.test/logo.png\""));
        assert!(html.contains("<footer>© Acme · 2024-01-01</footer>"));
        assert!(html.contains("<p>Body text</p>"));
    }
}
