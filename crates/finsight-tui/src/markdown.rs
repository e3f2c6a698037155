//! Markdown → ratatui Lines renderer for assistant answers.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const HEADING: Color = Color::Yellow;
const SUBHEADING: Color = Color::Cyan;
const BULLET: Color = Color::Cyan;
const CODE_BG: Color = Color::Rgb(43, 48, 59);
const LINK: Color = Color::Blue;
const DIM: Color = Color::DarkGray;

/// Convert markdown text to ratatui Lines.
pub fn markdown_to_lines(md: &str) -> Vec<Line<'static>> {
    let parser = Parser::new(md);
    let mut lines: Vec<Line<'static>> = Vec::new();

    let mut current_spans: Vec<Span<'static>> = Vec::new();
    // Style stack for nested formatting
    let mut style_stack: Vec<Style> = vec![Style::default()];

    let mut in_code_block = false;
    let mut code_buffer = String::new();
    // One entry per open list: next ordinal for numbered lists, None for bullets
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut in_heading = false;

    for event in parser {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                flush_line(&mut current_spans, &mut lines);
                let style = match level {
                    HeadingLevel::H1 => Style::default().fg(HEADING).add_modifier(Modifier::BOLD),
                    HeadingLevel::H2 => Style::default().fg(SUBHEADING).add_modifier(Modifier::BOLD),
                    _ => Style::default().add_modifier(Modifier::BOLD),
                };
                style_stack.push(style);
                in_heading = true;
            }
            Event::End(TagEnd::Heading(_)) => {
                style_stack.pop();
                flush_line(&mut current_spans, &mut lines);
                in_heading = false;
            }

            Event::Start(Tag::Strong) => {
                let base = current_style(&style_stack);
                style_stack.push(base.add_modifier(Modifier::BOLD));
            }
            Event::End(TagEnd::Strong) => {
                style_stack.pop();
            }
            Event::Start(Tag::Emphasis) => {
                let base = current_style(&style_stack);
                style_stack.push(base.add_modifier(Modifier::ITALIC));
            }
            Event::End(TagEnd::Emphasis) => {
                style_stack.pop();
            }

            Event::Code(code) => {
                current_spans.push(Span::styled(
                    format!(" {} ", code),
                    Style::default().bg(CODE_BG),
                ));
            }

            Event::Start(Tag::CodeBlock(_)) => {
                flush_line(&mut current_spans, &mut lines);
                in_code_block = true;
                code_buffer.clear();
            }
            Event::End(TagEnd::CodeBlock) => {
                for code_line in code_buffer.lines() {
                    lines.push(Line::styled(
                        format!("  {}", code_line),
                        Style::default().bg(CODE_BG),
                    ));
                }
                lines.push(Line::raw(""));
                in_code_block = false;
            }

            Event::Start(Tag::List(start)) => {
                flush_line(&mut current_spans, &mut lines);
                lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                lists.pop();
                if lists.is_empty() {
                    lines.push(Line::raw(""));
                }
            }
            Event::Start(Tag::Item) => {
                flush_line(&mut current_spans, &mut lines);
                let indent = "  ".repeat(lists.len().saturating_sub(1));
                let marker = match lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                current_spans.push(Span::styled(marker, Style::default().fg(BULLET)));
            }
            Event::End(TagEnd::Item) => {
                flush_line(&mut current_spans, &mut lines);
            }

            Event::Start(Tag::Link { .. }) => {
                style_stack.push(Style::default().fg(LINK).add_modifier(Modifier::UNDERLINED));
            }
            Event::End(TagEnd::Link) => {
                style_stack.pop();
            }

            Event::Start(Tag::Paragraph) => {}
            Event::End(TagEnd::Paragraph) => {
                flush_line(&mut current_spans, &mut lines);
                // Tight list items carry no paragraph break
                if !in_heading && lists.is_empty() {
                    lines.push(Line::raw(""));
                }
            }

            Event::Text(text) => {
                if in_code_block {
                    code_buffer.push_str(&text);
                } else {
                    let style = current_style(&style_stack);
                    current_spans.push(Span::styled(text.to_string(), style));
                }
            }

            Event::SoftBreak => {
                if !in_code_block {
                    current_spans.push(Span::raw(" "));
                }
            }
            Event::HardBreak => {
                flush_line(&mut current_spans, &mut lines);
            }

            Event::Rule => {
                flush_line(&mut current_spans, &mut lines);
                lines.push(Line::styled("─".repeat(30), Style::default().fg(DIM)));
                lines.push(Line::raw(""));
            }

            Event::Start(Tag::BlockQuote) => {
                flush_line(&mut current_spans, &mut lines);
                let base = current_style(&style_stack);
                style_stack.push(base.fg(DIM).add_modifier(Modifier::ITALIC));
                current_spans.push(Span::styled("│ ", Style::default().fg(DIM)));
            }
            Event::End(TagEnd::BlockQuote) => {
                flush_line(&mut current_spans, &mut lines);
                style_stack.pop();
            }

            _ => {}
        }
    }

    flush_line(&mut current_spans, &mut lines);

    // Trim trailing empty lines
    while lines.last().is_some_and(|l| l.to_string().is_empty()) {
        lines.pop();
    }

    lines
}

fn current_style(stack: &[Style]) -> Style {
    stack.last().copied().unwrap_or_default()
}

fn flush_line(spans: &mut Vec<Span<'static>>, lines: &mut Vec<Line<'static>>) {
    if !spans.is_empty() {
        lines.push(Line::from(std::mem::take(spans)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(lines: &[Line]) -> String {
        lines.iter().map(|l| l.to_string()).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_plain_text() {
        let lines = markdown_to_lines("Revenue increased by 12%.");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].to_string(), "Revenue increased by 12%.");
    }

    #[test]
    fn test_bold_text() {
        let lines = markdown_to_lines("Net income was **$4.2M**");
        assert!(lines[0]
            .spans
            .iter()
            .any(|s| s.content == "$4.2M" && s.style.add_modifier.contains(Modifier::BOLD)));
    }

    #[test]
    fn test_italic_text() {
        let lines = markdown_to_lines("*unaudited*");
        assert!(lines[0]
            .spans
            .iter()
            .any(|s| s.style.add_modifier.contains(Modifier::ITALIC)));
    }

    #[test]
    fn test_headings() {
        let lines = markdown_to_lines("# Summary\n## Details");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[0].style.fg, Some(HEADING));
        assert_eq!(lines[1].spans[0].style.fg, Some(SUBHEADING));
    }

    #[test]
    fn test_bullet_list() {
        let lines = markdown_to_lines("- assets\n- liabilities");
        let text = text_of(&lines);
        assert!(text.contains("• assets"));
        assert!(text.contains("• liabilities"));
    }

    #[test]
    fn test_numbered_list() {
        let lines = markdown_to_lines("1. first\n2. second");
        let text = text_of(&lines);
        assert!(text.contains("1. first"));
        assert!(text.contains("2. second"));
    }

    #[test]
    fn test_code_block_background() {
        let lines = markdown_to_lines("```\nEBITDA = 10\n```");
        assert!(lines
            .iter()
            .any(|l| l.style.bg == Some(CODE_BG) && l.to_string().contains("EBITDA")));
    }

    #[test]
    fn test_paragraphs_separated_by_blank_line() {
        let lines = markdown_to_lines("First.\n\nSecond.");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].to_string().is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(markdown_to_lines("").is_empty());
    }
}
