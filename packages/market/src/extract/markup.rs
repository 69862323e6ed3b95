//! Structured queries over unversioned marketplace markup.
//!
//! Extraction rules are declarative patterns over this interface
//! ("first text by class", "first attribute by tag") so the
//! traversal mechanism can change without touching the rules. The
//! implementation is regex-backed and heuristic: the markup format is
//! third-party and unversioned, and best-effort is the contract.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static TEXT_NODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">([^<>]+)<").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Matches the opening tag of any element carrying a given class.
#[derive(Debug, Clone)]
pub struct ClassSelector {
    class: String,
    open_re: Regex,
}

impl ClassSelector {
    pub fn new(class: &str) -> Self {
        let pattern = format!(
            r#"(?i)<([a-zA-Z][a-zA-Z0-9]*)\b[^>]*class\s*=\s*["'][^"']*\b{}\b[^"']*["'][^>]*>"#,
            regex::escape(class)
        );
        Self {
            class: class.to_string(),
            open_re: Regex::new(&pattern).expect("class selector pattern is valid"),
        }
    }

    /// The class this selector targets (for logging).
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Inner text of the first element with this class, tags stripped
    /// and entities decoded. `None` when the class is absent.
    pub fn first_text(&self, html: &str) -> Option<String> {
        let caps = self.open_re.captures(html)?;
        let tag = caps.get(1)?.as_str();
        let open_end = caps.get(0)?.end();
        let inner = element_inner(html, open_end, tag);
        let text = clean_text(inner);
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Byte offsets of every opening tag carrying this class.
    fn match_starts(&self, html: &str) -> Vec<usize> {
        self.open_re.find_iter(html).map(|m| m.start()).collect()
    }
}

/// Matches the first value of `attr` on the first `tag` element.
#[derive(Debug, Clone)]
pub struct AttrSelector {
    re: Regex,
}

impl AttrSelector {
    pub fn new(tag: &str, attr: &str) -> Self {
        let pattern = format!(
            r#"(?i)<{}\b[^>]*\b{}\s*=\s*["']([^"']+)["']"#,
            regex::escape(tag),
            regex::escape(attr)
        );
        Self {
            re: Regex::new(&pattern).expect("attr selector pattern is valid"),
        }
    }

    pub fn first_value(&self, html: &str) -> Option<String> {
        self.re
            .captures(html)?
            .get(1)
            .map(|m| decode_entities(m.as_str().trim()))
    }
}

/// Split a results page into candidate listing fragments.
///
/// Fragments are the slices between consecutive container-class
/// opening tags; nested close-tag bookkeeping is deliberately avoided
/// because result containers are siblings in practice.
pub fn split_fragments<'a>(html: &'a str, container: &ClassSelector) -> Vec<&'a str> {
    let starts = container.match_starts(html);
    let mut fragments = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(html.len());
        fragments.push(&html[start..end]);
    }
    fragments
}

/// All bare text nodes of a fragment, trimmed, empties dropped.
///
/// Used as the last-resort scan for "Sold"/"Ended" date signals.
pub fn text_nodes(html: &str) -> Vec<String> {
    TEXT_NODE_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let text = clean_text(caps.get(1)?.as_str());
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        })
        .collect()
}

/// Inner markup of an element, walking past same-tag nesting.
fn element_inner<'a>(html: &'a str, open_end: usize, tag: &str) -> &'a str {
    let tag = tag.to_ascii_lowercase();
    let lower = html.to_ascii_lowercase();
    let open_pat = format!("<{tag}");
    let close_pat = format!("</{tag}");

    let mut depth = 1usize;
    let mut pos = open_end;
    loop {
        let next_open = lower[pos..].find(&open_pat);
        let next_close = lower[pos..].find(&close_pat);
        match (next_open, next_close) {
            // Unclosed element: take everything to the end.
            (_, None) => return &html[open_end..],
            (Some(o), Some(c)) if o < c => {
                depth += 1;
                pos += o + open_pat.len();
            }
            (_, Some(c)) => {
                depth -= 1;
                if depth == 0 {
                    return &html[open_end..pos + c];
                }
                pos += c + close_pat.len();
            }
        }
    }
}

/// Strip tags, decode entities, collapse whitespace.
pub fn clean_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_text_finds_class() {
        let sel = ClassSelector::new("s-item__title");
        let html = r#"<div><span class="s-item__title">2020 Prizm #398</span></div>"#;
        assert_eq!(sel.first_text(html), Some("2020 Prizm #398".to_string()));
    }

    #[test]
    fn first_text_survives_same_tag_nesting() {
        let sel = ClassSelector::new("s-item__title");
        let html = r#"<span class="s-item__title"><span class="flag">New Listing</span>Justin Jefferson PSA 10</span>"#;
        assert_eq!(
            sel.first_text(html),
            Some("New Listing Justin Jefferson PSA 10".to_string())
        );
    }

    #[test]
    fn first_text_absent_class_is_none() {
        let sel = ClassSelector::new("s-item__price");
        assert_eq!(sel.first_text("<div class=\"other\">x</div>"), None);
    }

    #[test]
    fn attr_selector_reads_img_src() {
        let sel = AttrSelector::new("img", "src");
        let html = r#"<img alt="card" src="https://i.ebayimg.com/thumbs/abc.jpg">"#;
        assert_eq!(
            sel.first_value(html),
            Some("https://i.ebayimg.com/thumbs/abc.jpg".to_string())
        );
    }

    #[test]
    fn fragments_split_on_container_class() {
        let sel = ClassSelector::new("s-item");
        let html = r#"<ul>
            <li class="s-item"><span class="s-item__title">A</span></li>
            <li class="s-item"><span class="s-item__title">B</span></li>
        </ul>"#;
        let frags = split_fragments(html, &sel);
        // The title spans also carry an "s-item"-prefixed class but not
        // the bare token, so only the two containers split.
        assert_eq!(frags.len(), 2);
        assert!(frags[0].contains(">A<"));
        assert!(frags[1].contains(">B<"));
    }

    #[test]
    fn text_nodes_skip_markup() {
        let html = r#"<div><span>Sold Oct 3, 2024</span><b> </b><span>$12.00</span></div>"#;
        let nodes = text_nodes(html);
        assert_eq!(nodes, vec!["Sold Oct 3, 2024", "$12.00"]);
    }

    #[test]
    fn clean_text_decodes_entities() {
        assert_eq!(clean_text("<b>Tom &amp; Jerry&nbsp;#1</b>"), "Tom & Jerry #1");
    }
}
