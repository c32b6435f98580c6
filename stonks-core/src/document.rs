//! Document lookup capability.
//!
//! The scrape stages only need a handful of lookups: by tag and class, by tag
//! and attribute, by label text followed by a value element, and plain text
//! extraction. `DocumentLocator` names exactly those so the stages stay
//! independent of the HTML parser behind them.

use scraper::{ElementRef, Html, Node, Selector};

/// How a label is matched against text nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch<'p> {
    /// Whole text node equals the label (surrounding whitespace ignored).
    Exact(&'p str),
    /// Text node contains the label anywhere.
    Contains(&'p str),
}

impl TextMatch<'_> {
    fn matches(&self, text: &str) -> bool {
        match self {
            TextMatch::Exact(label) => text.trim() == *label,
            TextMatch::Contains(label) => text.contains(label),
        }
    }
}

/// Outcome of a label-then-value lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Labelled<H> {
    /// No text node matched the label.
    LabelMissing,
    /// The label exists but no value element follows it.
    ValueMissing,
    Found(H),
}

impl<H> Labelled<H> {
    pub fn found(self) -> Option<H> {
        match self {
            Labelled::Found(h) => Some(h),
            _ => None,
        }
    }
}

/// Lookups the scrape stages perform on a parsed document.
///
/// Handles are cheap copies borrowed from the document. Tag and attribute
/// names are matched case-insensitively.
pub trait DocumentLocator {
    type Handle<'a>: Copy
    where
        Self: 'a;

    /// All elements matching a CSS selector, in document order.
    fn select_all<'a>(&'a self, css: &str) -> Vec<Self::Handle<'a>>;

    /// First `tag` element under `scope` (or anywhere).
    fn find_first<'a>(
        &'a self,
        scope: Option<Self::Handle<'a>>,
        tag: &str,
    ) -> Option<Self::Handle<'a>>;

    /// All `tag` elements under `scope`, in document order.
    fn find_all<'a>(&'a self, scope: Self::Handle<'a>, tag: &str) -> Vec<Self::Handle<'a>>;

    /// First `tag` element under `scope` (or anywhere) carrying `class`.
    fn find_by_class<'a>(
        &'a self,
        scope: Option<Self::Handle<'a>>,
        tag: &str,
        class: &str,
    ) -> Option<Self::Handle<'a>>;

    /// First `tag` element whose `attr` equals `value`.
    fn find_by_attr<'a>(&'a self, tag: &str, attr: &str, value: &str)
        -> Option<Self::Handle<'a>>;

    /// First `tag` element after the first text node matching `label`.
    fn find_after_text<'a>(&'a self, label: TextMatch<'_>, tag: &str)
        -> Labelled<Self::Handle<'a>>;

    /// Concatenated text of the element and its descendants.
    fn text(&self, node: Self::Handle<'_>) -> String;

    fn attr<'a>(&'a self, node: Self::Handle<'a>, name: &str) -> Option<&'a str>;
}

/// `DocumentLocator` backed by the `scraper` HTML parser.
///
/// XML documents parse too: element and attribute names come out lowercased.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(text: &str) -> Self {
        Self {
            html: Html::parse_document(text),
        }
    }

    fn scope_elements<'a>(
        &'a self,
        scope: Option<ElementRef<'a>>,
    ) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        let root = scope.unwrap_or_else(|| self.html.root_element());
        root.descendants().filter_map(ElementRef::wrap)
    }
}

impl std::fmt::Debug for HtmlDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlDocument").finish_non_exhaustive()
    }
}

fn is_tag(el: &ElementRef<'_>, tag: &str) -> bool {
    el.value().name().eq_ignore_ascii_case(tag)
}

impl DocumentLocator for HtmlDocument {
    type Handle<'a> = ElementRef<'a>;

    fn select_all<'a>(&'a self, css: &str) -> Vec<ElementRef<'a>> {
        match Selector::parse(css) {
            Ok(selector) => self.html.select(&selector).collect(),
            Err(e) => {
                tracing::error!(selector = css, "invalid selector: {e}");
                Vec::new()
            }
        }
    }

    fn find_first<'a>(
        &'a self,
        scope: Option<ElementRef<'a>>,
        tag: &str,
    ) -> Option<ElementRef<'a>> {
        self.scope_elements(scope)
            .filter(|el| Some(*el) != scope)
            .find(|el| is_tag(el, tag))
    }

    fn find_all<'a>(&'a self, scope: ElementRef<'a>, tag: &str) -> Vec<ElementRef<'a>> {
        self.scope_elements(Some(scope))
            .filter(|el| *el != scope && is_tag(el, tag))
            .collect()
    }

    fn find_by_class<'a>(
        &'a self,
        scope: Option<ElementRef<'a>>,
        tag: &str,
        class: &str,
    ) -> Option<ElementRef<'a>> {
        self.scope_elements(scope)
            .find(|el| is_tag(el, tag) && el.value().classes().any(|c| c == class))
    }

    fn find_by_attr<'a>(&'a self, tag: &str, attr: &str, value: &str) -> Option<ElementRef<'a>> {
        let attr = attr.to_ascii_lowercase();
        self.scope_elements(None)
            .find(|el| is_tag(el, tag) && el.value().attr(&attr) == Some(value))
    }

    fn find_after_text<'a>(&'a self, label: TextMatch<'_>, tag: &str) -> Labelled<ElementRef<'a>> {
        let mut nodes = self.html.tree.root().descendants();

        let label_found = nodes.by_ref().any(|node| match node.value() {
            Node::Text(text) => label.matches(text),
            _ => false,
        });
        if !label_found {
            return Labelled::LabelMissing;
        }

        nodes
            .filter_map(ElementRef::wrap)
            .find(|el| is_tag(el, tag))
            .map_or(Labelled::ValueMissing, Labelled::Found)
    }

    fn text(&self, node: ElementRef<'_>) -> String {
        node.text().collect()
    }

    fn attr<'a>(&'a self, node: ElementRef<'a>, name: &str) -> Option<&'a str> {
        node.value().attr(&name.to_ascii_lowercase())
    }
}
