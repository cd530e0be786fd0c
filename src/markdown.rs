//! Renders Reddit comment markdown into styled terminal text.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

pub fn render(input: &str) -> Text<'static> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);

    let mut writer = Writer::default();
    writer.walk(Parser::new_ext(input, opts));
    writer.into_text()
}

#[derive(Default)]
struct Writer {
    lines: Vec<Line<'static>>,
    buffer: String,
    quote_depth: usize,
    list_stack: Vec<Option<u64>>,
    item_marker: Option<String>,
    heading: Option<u8>,
    code: Option<String>,
    link: Option<String>,
}

impl Writer {
    fn walk<'a, I>(&mut self, parser: I)
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in parser {
            match event {
                Event::Start(tag) => self.start(tag),
                Event::End(tag) => self.end(tag),
                Event::Text(text) => {
                    if let Some(code) = self.code.as_mut() {
                        code.push_str(&text);
                    } else {
                        self.buffer.push_str(&text);
                    }
                }
                Event::Code(code) => {
                    self.buffer.push('`');
                    self.buffer.push_str(&code);
                    self.buffer.push('`');
                }
                Event::SoftBreak => self.buffer.push(' '),
                Event::HardBreak => self.flush(),
                Event::Rule => {
                    self.flush();
                    self.lines.push(Line::from(Span::styled(
                        "─".repeat(20),
                        Style::default().fg(Color::DarkGray),
                    )));
                    self.blank();
                }
                _ => {}
            }
        }
        self.flush();
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.flush(),
            Tag::Heading { level, .. } => {
                self.flush();
                self.heading = Some(level_to_u8(level));
            }
            Tag::BlockQuote => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                let fence = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => format!("```{lang}"),
                    _ => "```".to_string(),
                };
                self.lines.push(Line::from(Span::raw(fence)));
                self.code = Some(String::new());
            }
            Tag::List(start) => {
                self.flush();
                self.list_stack.push(start);
            }
            Tag::Item => {
                self.flush();
                let indent = "  ".repeat(self.list_stack.len().saturating_sub(1));
                let marker = match self.list_stack.last() {
                    Some(Some(index)) => format!("{indent}{index}. "),
                    _ => format!("{indent}• "),
                };
                self.item_marker = Some(marker);
            }
            Tag::Link { dest_url, .. } => {
                self.link = Some(dest_url.into_string());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                self.blank();
            }
            TagEnd::Heading(_) => {
                self.flush();
                self.heading = None;
                self.blank();
            }
            TagEnd::BlockQuote => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank();
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    for line in code.trim_end_matches('\n').split('\n') {
                        self.lines.push(Line::from(Span::styled(
                            line.to_string(),
                            Style::default().fg(Color::Cyan),
                        )));
                    }
                }
                self.lines.push(Line::from(Span::raw("```")));
                self.blank();
            }
            TagEnd::List(_) => {
                self.flush();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => {
                self.flush();
                if let Some(Some(index)) = self.list_stack.last_mut() {
                    *index += 1;
                }
                self.item_marker = None;
            }
            TagEnd::Link => {
                if let Some(url) = self.link.take() {
                    // Terminal output carries no hyperlinks; append the target.
                    if !self.buffer.ends_with(&url) {
                        self.buffer.push_str(&format!(" ({url})"));
                    }
                }
            }
            _ => {}
        }
    }

    fn flush(&mut self) {
        let text = self.buffer.trim().to_string();
        self.buffer.clear();
        if text.is_empty() {
            return;
        }

        let line = if let Some(level) = self.heading {
            Line::from(Span::styled(text, heading_style(level)))
        } else if self.quote_depth > 0 {
            let prefix = ">".repeat(self.quote_depth);
            Line::from(vec![
                Span::styled(format!("{prefix} "), Style::default().fg(Color::Green)),
                Span::styled(text, Style::default().fg(Color::Green)),
            ])
        } else if let Some(marker) = self.item_marker.clone() {
            Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Yellow)),
                Span::raw(text),
            ])
        } else {
            Line::from(Span::raw(text))
        };
        self.lines.push(line);
    }

    fn blank(&mut self) {
        if !matches!(self.lines.last(), Some(line) if line.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }

    fn into_text(mut self) -> Text<'static> {
        while matches!(self.lines.last(), Some(line) if line.spans.is_empty()) {
            self.lines.pop();
        }
        if self.lines.is_empty() {
            self.lines.push(Line::from(Span::raw("")));
        }
        Text::from(self.lines)
    }
}

fn heading_style(level: u8) -> Style {
    match level {
        1 | 2 => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        _ => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
    }
}

fn level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &Text<'_>) -> Vec<String> {
        text.lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn paragraphs_are_separated_by_blank_lines() {
        let text = render("first\n\nsecond");
        assert_eq!(plain(&text), vec!["first", "", "second"]);
    }

    #[test]
    fn quote_lines_carry_a_prefix() {
        let text = render("> quoted words");
        assert_eq!(plain(&text)[0], "> quoted words");
    }

    #[test]
    fn fenced_code_keeps_its_fences() {
        let text = render("```\nlet x = 1;\n```");
        let lines = plain(&text);
        assert_eq!(lines[0], "```");
        assert_eq!(lines[1], "let x = 1;");
        assert_eq!(lines[2], "```");
    }

    #[test]
    fn links_append_their_target() {
        let text = render("see [docs](https://example.com)");
        assert!(plain(&text)[0].contains("docs (https://example.com)"));
    }

    #[test]
    fn empty_input_yields_one_empty_line() {
        let text = render("");
        assert_eq!(text.lines.len(), 1);
    }

    #[test]
    fn ordered_lists_count_up() {
        let text = render("1. one\n2. two");
        let lines = plain(&text);
        assert!(lines[0].starts_with("1. "));
        assert!(lines[1].starts_with("2. "));
    }
}
