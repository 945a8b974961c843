// src/extract/link.rs
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use url::Url;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("anchor selector"));

fn href_of(el: ElementRef<'_>) -> Option<&str> {
    el.value()
        .attr("href")
        .map(str::trim)
        .filter(|h| !h.is_empty())
}

/// Find the link that belongs to `node`.
///
/// Order: the node's own `href` (or an anchor inside it), an enclosing `<a>`
/// parent, then anchors among the parent's direct children. Falls back to
/// `base_url`. Relative links are resolved against `base_url`.
pub fn resolve_link(node: ElementRef<'_>, base_url: &str) -> String {
    let parent = node.parent().and_then(ElementRef::wrap);

    let href = href_of(node)
        .or_else(|| node.select(&ANCHOR).find_map(href_of))
        .or_else(|| {
            let parent = parent?;
            if parent.value().name() == "a" {
                href_of(parent)
            } else {
                parent
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|sib| sib.value().name() == "a")
                    .find_map(href_of)
            }
        });

    match href {
        Some(h) => absolutize(base_url, h),
        None => base_url.to_string(),
    }
}

/// Join `href` onto `base_url`; returns `href` unchanged when either does not parse.
pub fn absolutize(base_url: &str, href: &str) -> String {
    Url::parse(base_url)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}
