//! Markdown to display tree conversion for generated answers.
//!
//! Parsing is plain CommonMark via `pulldown-cmark`. The tree keeps headings,
//! paragraphs, lists, code blocks, quotes and rules; nested lists are
//! flattened and raw HTML is shown as text.

use std::mem;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayTree {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, spans: Vec<Span> },
    Paragraph(Vec<Span>),
    List { ordered: bool, items: Vec<Vec<Span>> },
    CodeBlock { language: Option<String>, code: String },
    Quote(Vec<Span>),
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Strong(String),
    Emphasis(String),
    Code(String),
    Link { text: String, url: String },
}

impl Span {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text)
            | Self::Strong(text)
            | Self::Emphasis(text)
            | Self::Code(text)
            | Self::Link { text, .. } => text,
        }
    }
}

impl DisplayTree {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Flattens the tree into readable plain text (links keep their target).
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|block| match block {
                Block::Heading { spans, .. } | Block::Paragraph(spans) => spans_to_text(spans),
                Block::List { ordered, items } => items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| {
                        if *ordered {
                            format!("{}. {}", idx + 1, spans_to_text(item))
                        } else {
                            format!("- {}", spans_to_text(item))
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
                Block::CodeBlock { code, .. } => code.clone(),
                Block::Quote(spans) => format!("> {}", spans_to_text(spans)),
                Block::Rule => "---".to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

pub fn spans_to_text(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Link { text, url } if text != url => format!("{text} ({url})"),
            other => other.text().to_string(),
        })
        .collect()
}

/// Parses CommonMark and folds its events into a [`DisplayTree`].
pub fn render(markdown: &str) -> DisplayTree {
    let mut builder = TreeBuilder::default();
    for event in Parser::new_ext(markdown, Options::empty()) {
        builder.event(event);
    }
    DisplayTree {
        blocks: builder.blocks,
    }
}

#[derive(Default)]
struct TreeBuilder {
    blocks: Vec<Block>,
    spans: Vec<Span>,
    strong: usize,
    emphasis: usize,
    link: Option<(String, String)>,
    heading: Option<u8>,
    code: Option<(Option<String>, String)>,
    quote_depth: usize,
    quote: Vec<Span>,
    // Nested lists are flattened into the outermost one.
    lists: Vec<(bool, Vec<Vec<Span>>)>,
}

impl TreeBuilder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => match self.code.as_mut() {
                Some((_, code)) => code.push_str(&text),
                None => self.text(&text),
            },
            Event::Code(code) => match self.link.as_mut() {
                Some((_, label)) => label.push_str(&code),
                None => self.spans.push(Span::Code(code.into_string())),
            },
            Event::SoftBreak | Event::HardBreak => self.text(" "),
            Event::Html(html) | Event::InlineHtml(html) => self.text(&html),
            Event::Rule => self.blocks.push(Block::Rule),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => self.heading = Some(heading_level(level)),
            Tag::Strong => self.strong += 1,
            Tag::Emphasis => self.emphasis += 1,
            Tag::Link { dest_url, .. } => {
                self.link = Some((dest_url.into_string(), String::new()));
            }
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some((language, String::new()));
            }
            Tag::BlockQuote(_) => self.quote_depth += 1,
            Tag::List(start) => {
                if let Some((_, items)) = self.lists.last_mut() {
                    push_item(items, &mut self.spans);
                }
                self.lists.push((start.is_some(), Vec::new()));
            }
            Tag::Paragraph | Tag::Item => self.separate(),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                let level = self.heading.take().unwrap_or(1);
                let spans = trimmed(&mut self.spans);
                self.blocks.push(Block::Heading { level, spans });
            }
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            TagEnd::Link => {
                if let Some((url, label)) = self.link.take() {
                    let text = if label.trim().is_empty() {
                        url.clone()
                    } else {
                        label
                    };
                    self.spans.push(Span::Link { text, url });
                }
            }
            TagEnd::CodeBlock => {
                if let Some((language, mut code)) = self.code.take() {
                    code.truncate(code.trim_end_matches('\n').len());
                    self.blocks.push(Block::CodeBlock { language, code });
                }
            }
            TagEnd::Paragraph => {
                if self.lists.is_empty() && self.quote_depth == 0 {
                    let spans = trimmed(&mut self.spans);
                    if !spans.is_empty() {
                        self.blocks.push(Block::Paragraph(spans));
                    }
                } else if self.lists.is_empty() {
                    self.quote.append(&mut self.spans);
                }
            }
            TagEnd::Item => {
                if let Some((_, items)) = self.lists.last_mut() {
                    push_item(items, &mut self.spans);
                }
            }
            TagEnd::List(_) => {
                let Some((ordered, items)) = self.lists.pop() else {
                    return;
                };
                match self.lists.last_mut() {
                    Some((_, outer)) => outer.extend(items),
                    None if !items.is_empty() => self.blocks.push(Block::List { ordered, items }),
                    None => {}
                }
            }
            TagEnd::BlockQuote(_) => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                if self.quote_depth == 0 {
                    let spans = trimmed(&mut self.quote);
                    if !spans.is_empty() {
                        self.blocks.push(Block::Quote(spans));
                    }
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some((_, label)) = self.link.as_mut() {
            label.push_str(text);
            return;
        }

        let span = if self.strong > 0 {
            Span::Strong(text.to_string())
        } else if self.emphasis > 0 {
            Span::Emphasis(text.to_string())
        } else {
            Span::Text(text.to_string())
        };
        let merged = match (self.spans.last_mut(), &span) {
            (Some(Span::Text(prev)), Span::Text(next))
            | (Some(Span::Strong(prev)), Span::Strong(next))
            | (Some(Span::Emphasis(prev)), Span::Emphasis(next)) => {
                prev.push_str(next);
                true
            }
            _ => false,
        };
        if !merged {
            self.spans.push(span);
        }
    }

    // Paragraphs inside quotes and list items share one span run.
    fn separate(&mut self) {
        let in_quote = self.lists.is_empty() && self.quote_depth > 0;
        let run = if in_quote { &self.quote } else { &self.spans };
        if !run.last().is_some_and(|span| !span.text().ends_with(' ')) {
            return;
        }
        if in_quote {
            self.quote.push(Span::Text(" ".to_string()));
        } else {
            self.text(" ");
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn push_item(items: &mut Vec<Vec<Span>>, spans: &mut Vec<Span>) {
    let item = trimmed(spans);
    if !item.is_empty() {
        items.push(item);
    }
}

/// Takes `spans`, dropping separator whitespace at either end.
fn trimmed(spans: &mut Vec<Span>) -> Vec<Span> {
    let mut spans = mem::take(spans);
    if let Some(Span::Text(first)) = spans.first_mut() {
        *first = first.trim_start().to_string();
    }
    if let Some(Span::Text(last)) = spans.last_mut() {
        *last = last.trim_end().to_string();
    }
    spans.retain(|span| !matches!(span, Span::Text(text) if text.is_empty()));
    spans
}
