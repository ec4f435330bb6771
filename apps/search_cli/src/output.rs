//! Terminal formatting for search states.

use client_core::markdown::{self, Block, DisplayTree};
use shared::protocol::{HealthResponse, QueryResponse};

const SNIPPET_CHARS: usize = 240;

pub fn pending_line(query: &str) -> String {
    format!("Searching for \"{query}\" ...")
}

pub fn health_line(health: &HealthResponse) -> String {
    match &health.model {
        Some(model) => format!("status: {} (model {model})", health.status),
        None => format!("status: {}", health.status),
    }
}

pub fn render_response(response: &QueryResponse) -> String {
    let mut out = String::from("AI Answer\n=========\n");
    out.push_str(&render_tree(&markdown::render(&response.answer)));

    if !response.results.is_empty() {
        out.push_str("\n\nSources\n-------");
        for (idx, result) in response.results.iter().enumerate() {
            out.push_str(&format!(
                "\n{}. {} [{:.2}]\n   {}\n   {}",
                idx + 1,
                result.title,
                result.score,
                result.url,
                snippet(&result.content)
            ));
        }
    }
    out
}

fn render_tree(tree: &DisplayTree) -> String {
    tree.blocks
        .iter()
        .map(|block| match block {
            Block::Heading { spans, .. } => {
                let title = markdown::spans_to_text(spans);
                let underline = "-".repeat(title.chars().count().max(3));
                format!("{title}\n{underline}")
            }
            Block::CodeBlock { code, .. } => code
                .lines()
                .map(|line| format!("    {line}"))
                .collect::<Vec<_>>()
                .join("\n"),
            other => DisplayTree {
                blocks: vec![other.clone()],
            }
            .plain_text(),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn snippet(content: &str) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= SNIPPET_CHARS {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(SNIPPET_CHARS).collect();
    cut.push('…');
    cut
}
