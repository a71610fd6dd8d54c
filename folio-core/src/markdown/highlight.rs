//! Code syntax highlighting using syntect.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};
use std::sync::OnceLock;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME: OnceLock<Theme> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme() -> &'static Theme {
    THEME.get_or_init(|| {
        let mut theme_set = ThemeSet::load_defaults();
        theme_set
            .themes
            .remove("InspiredGitHub")
            .or_else(|| theme_set.themes.remove("base16-ocean.light"))
            .unwrap_or_default()
    })
}

/// Replaces fenced code blocks that name a language with highlighted HTML.
#[derive(Debug, Default)]
pub struct HighlightTransformer;

impl HighlightTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform<'a>(&self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        let mut result = Vec::with_capacity(events.len());
        let mut fenced: Option<(String, String)> = None;

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang)))
                    if !lang.trim().is_empty() =>
                {
                    fenced = Some((lang.trim().to_string(), String::new()));
                }
                Event::Text(text) if fenced.is_some() => {
                    if let Some((_, code)) = fenced.as_mut() {
                        code.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) if fenced.is_some() => {
                    if let Some((lang, code)) = fenced.take() {
                        let html = highlight_code(&code, &lang);
                        result.push(Event::Html(CowStr::Boxed(html.into_boxed_str())));
                    }
                }
                other => result.push(other),
            }
        }

        result
    }
}

fn highlight_code(code: &str, lang: &str) -> String {
    let ss = syntax_set();
    let syntax = ss
        .find_syntax_by_token(lang)
        .or_else(|| ss.find_syntax_by_extension(lang))
        .unwrap_or_else(|| ss.find_syntax_plain_text());

    match highlighted_html_for_string(code, ss, syntax, theme()) {
        Ok(html) => html,
        Err(err) => {
            tracing::debug!("Highlighting {} block failed: {}", lang, err);
            format!("<pre><code>{}</code></pre>", super::html_escape(code))
        }
    }
}
