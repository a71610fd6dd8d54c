//! Markdown to HTML for text pages and card descriptions.

pub mod highlight;

use crate::slug::slugify;
use pulldown_cmark::{html, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use highlight::HighlightTransformer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocItem {
    pub level: u32,
    pub title: String,
    pub id: String,
}

/// HTML plus the heading outline it was built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderedMarkdown {
    pub html: String,
    pub headings: Vec<TocItem>,
}

impl RenderedMarkdown {
    /// Table of contents, or `None` when there are no headings
    pub fn toc_html(&self) -> Option<String> {
        if self.headings.is_empty() {
            None
        } else {
            Some(render_toc(&self.headings))
        }
    }
}

/// Markdown processor with heading anchors and code highlighting
pub struct MarkdownProcessor {
    options: Options,
    highlighter: HighlightTransformer,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);

        Self {
            options,
            highlighter: HighlightTransformer::new(),
        }
    }

    /// Convert markdown to HTML, assigning ids and anchors to headings
    pub fn render(&self, markdown: &str) -> RenderedMarkdown {
        let events: Vec<Event> = Parser::new_ext(markdown, self.options).collect();

        let headings = collect_headings(&events);
        let events = attach_heading_ids(events, &headings);
        let events = add_heading_anchors(events);
        let events = self.highlighter.transform(events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        RenderedMarkdown {
            html: html_output,
            headings,
        }
    }

    /// Convert markdown to HTML without the heading outline
    pub fn render_html(&self, markdown: &str) -> String {
        self.render(markdown).html
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_headings(events: &[Event]) -> Vec<TocItem> {
    let mut toc = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut current: Option<(HeadingLevel, Option<String>, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some((*level, id.as_ref().map(|s| s.to_string()), String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, ref mut title)) = current {
                    title.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, explicit, title)) = current.take() {
                    let id = explicit.unwrap_or_else(|| {
                        let base = match slugify(&title) {
                            s if s.is_empty() => "section".to_string(),
                            s => s,
                        };
                        let count = seen.entry(base.clone()).or_insert(0);
                        *count += 1;
                        if *count == 1 {
                            base
                        } else {
                            format!("{}-{}", base, *count - 1)
                        }
                    });
                    toc.push(TocItem {
                        level: level as u32,
                        title,
                        id,
                    });
                }
            }
            _ => {}
        }
    }

    toc
}

fn attach_heading_ids<'a>(events: Vec<Event<'a>>, headings: &[TocItem]) -> Vec<Event<'a>> {
    let mut heading_iter = headings.iter();

    events
        .into_iter()
        .map(|event| match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let next = heading_iter.next();
                let id = id.or_else(|| {
                    next.map(|h| CowStr::Boxed(h.id.clone().into_boxed_str()))
                });
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                })
            }
            other => other,
        })
        .collect()
}

fn add_heading_anchors(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut result = Vec::with_capacity(events.len());
    let mut current_id: Option<String> = None;

    for event in events {
        if let Event::Start(Tag::Heading { id, .. }) = &event {
            current_id = id.as_ref().map(|s| s.to_string());
        }

        match event {
            Event::End(TagEnd::Heading(level)) => {
                if let Some(id) = current_id.take() {
                    let anchor = format!(
                        "<a class=\"heading-anchor\" href=\"#{}\" aria-label=\"Link to heading\">#</a>",
                        html_escape(&id)
                    );
                    result.push(Event::Html(CowStr::Boxed(anchor.into_boxed_str())));
                }
                result.push(Event::End(TagEnd::Heading(level)));
            }
            other => result.push(other),
        }
    }

    result
}

fn render_toc(headings: &[TocItem]) -> String {
    let mut html = String::from(r#"<nav class="toc"><h2>Contents</h2><ul>"#);
    for h in headings {
        html.push_str(&format!(
            r##"<li class="toc-level-{}"><a href="#{}">{}</a></li>"##,
            h.level,
            html_escape(&h.id),
            html_escape(&h.title)
        ));
    }
    html.push_str("</ul></nav>");
    html
}

pub(crate) fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
