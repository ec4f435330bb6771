//! Widgets drawing a rendered answer and the ordered source list.

use client_core::markdown::{spans_to_text, Block, DisplayTree, Span};
use egui::RichText;
use shared::protocol::SearchResult;

pub fn show_display_tree(ui: &mut egui::Ui, tree: &DisplayTree) {
    for block in &tree.blocks {
        match block {
            Block::Heading { level, spans } => {
                let size = match *level {
                    1 => 22.0,
                    2 => 19.0,
                    3 => 17.0,
                    _ => 15.0,
                };
                ui.label(RichText::new(spans_to_text(spans)).strong().size(size));
            }
            Block::Paragraph(spans) => show_paragraph(ui, spans),
            Block::List { ordered, items } => {
                for (idx, item) in items.iter().enumerate() {
                    let marker = if *ordered {
                        format!("{}. ", idx + 1)
                    } else {
                        "• ".to_string()
                    };
                    ui.horizontal_wrapped(|ui| {
                        ui.spacing_mut().item_spacing.x = 0.0;
                        ui.label(marker);
                        show_inline(ui, item);
                    });
                }
            }
            Block::CodeBlock { code, .. } => {
                egui::Frame::NONE
                    .fill(ui.visuals().extreme_bg_color)
                    .corner_radius(6.0)
                    .inner_margin(egui::Margin::same(8))
                    .show(ui, |ui| {
                        ui.label(RichText::new(code.as_str()).monospace());
                    });
            }
            Block::Quote(spans) => {
                ui.horizontal_wrapped(|ui| {
                    ui.label(RichText::new("│ ").weak());
                    ui.spacing_mut().item_spacing.x = 0.0;
                    show_inline(ui, spans);
                });
            }
            Block::Rule => {
                ui.separator();
            }
        }
        ui.add_space(6.0);
    }
}

fn show_paragraph(ui: &mut egui::Ui, spans: &[Span]) {
    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing.x = 0.0;
        show_inline(ui, spans);
    });
}

fn show_inline(ui: &mut egui::Ui, spans: &[Span]) {
    for span in spans {
        match span {
            Span::Text(text) => {
                ui.label(text.as_str());
            }
            Span::Strong(text) => {
                ui.label(RichText::new(text).strong());
            }
            Span::Emphasis(text) => {
                ui.label(RichText::new(text).italics());
            }
            Span::Code(text) => {
                ui.label(RichText::new(text).code());
            }
            Span::Link { text, url } => {
                ui.hyperlink_to(text.as_str(), url);
            }
        }
    }
}

/// Draws results in the order the backend returned them.
pub fn show_results(ui: &mut egui::Ui, results: &[SearchResult]) {
    if results.is_empty() {
        ui.weak("No source passages were returned.");
        return;
    }

    ui.label(RichText::new("Sources / search results").weak().size(13.0));
    ui.add_space(4.0);

    for result in results {
        egui::Frame::NONE
            .fill(ui.visuals().faint_bg_color)
            .corner_radius(10.0)
            .inner_margin(egui::Margin::symmetric(14, 10))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.label(RichText::new(result.title.as_str()).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.weak(format!("{:.2}", result.score));
                    });
                });
                ui.hyperlink_to(RichText::new(result.url.as_str()).small(), &result.url);
                ui.label(result.content.as_str());
            });
        ui.add_space(6.0);
    }
}
