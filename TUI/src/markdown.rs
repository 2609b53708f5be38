//! Markdown parsing and rendering for solution text.
//!
//! Solutions mix prose, numbered steps and TeX-style math (`$...$` inline,
//! `$$` blocks). Emphasis markers glued to a word on the left are kept as
//! literal text so arithmetic like `2*3` or `x**2` survives untouched.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const CODE_BG: Color = Color::Rgb(40, 44, 52);
const CODE_FG: Color = Color::Rgb(171, 178, 191);
const HEADING_COLOR: Color = Color::Rgb(97, 175, 239);
const BOLD_COLOR: Color = Color::Rgb(224, 208, 183);
const ITALIC_COLOR: Color = Color::Rgb(152, 195, 121);
const MATH_COLOR: Color = Color::Rgb(229, 192, 123);
const LIST_BULLET_COLOR: Color = Color::Rgb(198, 120, 221);
const BLOCKQUOTE_COLOR: Color = Color::Rgb(128, 128, 128);
const RULE_COLOR: Color = Color::Rgb(80, 80, 80);

#[derive(Debug, Clone, PartialEq)]
pub enum MarkdownElement {
    Text(String),
    Bold(String),
    Italic(String),
    Code(String),
    /// `$...$`, already converted to display symbols
    Math(String),
    MathBlock(String),
    CodeBlock { language: Option<String>, code: String },
    Heading { level: u8, text: String },
    ListItem { indent: usize, marker: String, text: String },
    BlockQuote(String),
    HorizontalRule,
    Newline,
}

enum Fence {
    None,
    Code { language: Option<String>, body: Vec<String> },
    Math { body: Vec<String> },
}

pub fn parse_markdown(text: &str) -> Vec<MarkdownElement> {
    let mut elements = Vec::new();
    let mut fence = Fence::None;

    for line in text.lines() {
        let trimmed = line.trim();

        match &mut fence {
            Fence::Code { language, body } => {
                if trimmed.starts_with("```") {
                    elements.push(MarkdownElement::CodeBlock {
                        language: language.take(),
                        code: body.join("\n"),
                    });
                    fence = Fence::None;
                } else {
                    body.push(line.to_string());
                }
                continue;
            }
            Fence::Math { body } => {
                if trimmed == "$$" {
                    elements.push(MarkdownElement::MathBlock(tex_to_display(&body.join(" "))));
                    fence = Fence::None;
                } else {
                    body.push(trimmed.to_string());
                }
                continue;
            }
            Fence::None => {}
        }

        if let Some(lang) = trimmed.strip_prefix("```") {
            let lang = lang.trim();
            fence = Fence::Code {
                language: (!lang.is_empty()).then(|| lang.to_string()),
                body: Vec::new(),
            };
            continue;
        }

        if trimmed == "$$" {
            fence = Fence::Math { body: Vec::new() };
            continue;
        }

        // Single-line display math
        if trimmed.len() > 4 && trimmed.starts_with("$$") && trimmed.ends_with("$$") {
            let inner = &trimmed[2..trimmed.len() - 2];
            elements.push(MarkdownElement::MathBlock(tex_to_display(inner.trim())));
            continue;
        }

        if matches!(trimmed, "---" | "***" | "___") {
            elements.push(MarkdownElement::HorizontalRule);
            continue;
        }

        if let Some(heading) = parse_heading(trimmed) {
            elements.push(heading);
            continue;
        }

        if let Some(quote) = trimmed.strip_prefix('>') {
            elements.push(MarkdownElement::BlockQuote(quote.trim().to_string()));
            continue;
        }

        if let Some(item) = parse_list_item(line) {
            elements.push(item);
            continue;
        }

        if trimmed.is_empty() {
            elements.push(MarkdownElement::Newline);
            continue;
        }

        parse_inline(line, &mut elements);
        elements.push(MarkdownElement::Newline);
    }

    // Unterminated fences keep their content
    match fence {
        Fence::Code { language, body } if !body.is_empty() => {
            elements.push(MarkdownElement::CodeBlock { language, code: body.join("\n") });
        }
        Fence::Math { body } if !body.is_empty() => {
            elements.push(MarkdownElement::MathBlock(tex_to_display(&body.join(" "))));
        }
        _ => {}
    }

    elements
}

fn parse_heading(line: &str) -> Option<MarkdownElement> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    Some(MarkdownElement::Heading {
        level: level as u8,
        text: rest.trim().to_string(),
    })
}

fn parse_list_item(line: &str) -> Option<MarkdownElement> {
    let trimmed = line.trim_start();
    let indent = line.len() - trimmed.len();

    for bullet in ["- ", "* ", "+ "] {
        if let Some(text) = trimmed.strip_prefix(bullet) {
            return Some(MarkdownElement::ListItem {
                indent,
                marker: "•".to_string(),
                text: text.to_string(),
            });
        }
    }

    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(text) = trimmed[digits..].strip_prefix(". ") {
            return Some(MarkdownElement::ListItem {
                indent,
                marker: format!("{}.", &trimmed[..digits]),
                text: text.to_string(),
            });
        }
    }

    None
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

fn flush(text: &mut String, elements: &mut Vec<MarkdownElement>) {
    if !text.is_empty() {
        elements.push(MarkdownElement::Text(std::mem::take(text)));
    }
}

/// Read up to the closing `delim`, which must repeat `width` times and not
/// sit inside a word. Returns `None` (consuming nothing) when unclosed.
fn read_emphasis(rest: &[char], delim: char, width: usize) -> Option<(String, usize)> {
    let mut i = 0;
    while i < rest.len() {
        if rest[i] == delim {
            let run = rest[i..].iter().take_while(|c| **c == delim).count();
            let before = i.checked_sub(1).map(|j| rest[j]);
            let after = rest.get(i + run).copied();
            let inside_word = before.is_some_and(is_word_char) && after.is_some_and(is_word_char);
            if run >= width && i > 0 && !inside_word {
                return Some((rest[..i].iter().collect(), i + width));
            }
            i += run;
        } else {
            i += 1;
        }
    }
    None
}

fn parse_inline(line: &str, elements: &mut Vec<MarkdownElement>) {
    let chars: Vec<char> = line.chars().collect();
    let mut text = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '`' | '$' => {
                let close = chars[i + 1..].iter().position(|n| *n == c);
                match close {
                    Some(len) if len > 0 => {
                        flush(&mut text, elements);
                        let inner: String = chars[i + 1..i + 1 + len].iter().collect();
                        elements.push(if c == '`' {
                            MarkdownElement::Code(inner)
                        } else {
                            MarkdownElement::Math(tex_to_display(&inner))
                        });
                        i += len + 2;
                    }
                    _ => {
                        text.push(c);
                        i += 1;
                    }
                }
            }
            '*' | '_' => {
                let glued_left = text.chars().last().is_some_and(is_word_char);
                let width = chars[i..].iter().take_while(|n| **n == c).count().min(2);
                let opens = chars.get(i + width).is_some_and(|n| !n.is_whitespace());

                if glued_left || !opens {
                    text.push(c);
                    i += 1;
                    continue;
                }

                match read_emphasis(&chars[i + width..], c, width) {
                    Some((inner, consumed)) => {
                        flush(&mut text, elements);
                        elements.push(if width == 2 {
                            MarkdownElement::Bold(inner)
                        } else {
                            MarkdownElement::Italic(inner)
                        });
                        i += width + consumed;
                    }
                    None => {
                        for _ in 0..width {
                            text.push(c);
                        }
                        i += width;
                    }
                }
            }
            _ => {
                text.push(c);
                i += 1;
            }
        }
    }

    flush(&mut text, elements);
}

const TEX_SYMBOLS: &[(&str, &str)] = &[
    ("\\times", "×"),
    ("\\cdot", "·"),
    ("\\div", "÷"),
    ("\\pm", "±"),
    ("\\leq", "≤"),
    ("\\geq", "≥"),
    ("\\neq", "≠"),
    ("\\approx", "≈"),
    ("\\infty", "∞"),
    ("\\int", "∫"),
    ("\\sum", "∑"),
    ("\\sqrt", "√"),
    ("\\pi", "π"),
    ("\\theta", "θ"),
    ("\\alpha", "α"),
    ("\\beta", "β"),
    ("\\Delta", "Δ"),
    ("\\to", "→"),
    ("\\left", ""),
    ("\\right", ""),
    ("\\,", " "),
];

/// Best-effort conversion of TeX math to plain terminal text.
pub fn tex_to_display(tex: &str) -> String {
    let mut out = expand_frac(tex);
    for (command, symbol) in TEX_SYMBOLS {
        out = out.replace(command, symbol);
    }
    out.replace(['{', '}'], "")
}

/// `\frac{a}{b}` becomes `(a)/(b)`; nested fractions are handled inside out.
fn expand_frac(tex: &str) -> String {
    let mut out = tex.to_string();
    while let Some(start) = out.find("\\frac{") {
        let after = start + "\\frac".len();
        let Some((numerator, next)) = braced(&out, after) else {
            break;
        };
        let Some((denominator, end)) = braced(&out, next) else {
            break;
        };
        let replacement = format!("({})/({})", expand_frac(&numerator), expand_frac(&denominator));
        out.replace_range(start..end, &replacement);
    }
    out
}

/// Contents of the `{...}` group starting at byte `open`, plus the byte
/// offset just past its closing brace.
fn braced(s: &str, open: usize) -> Option<(String, usize)> {
    if !s[open..].starts_with('{') {
        return None;
    }
    let mut depth = 0usize;
    for (offset, c) in s[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = open + offset;
                    return Some((s[open + 1..end].to_string(), end + 1));
                }
            }
            _ => {}
        }
    }
    None
}

pub fn render_markdown(elements: &[MarkdownElement], width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    // Inline spans collect here until the source line ends
    let mut pending: Vec<Span<'static>> = Vec::new();
    let dim = Style::default().fg(Color::Rgb(60, 60, 60));

    for element in elements {
        let block: Vec<Line<'static>> = match element {
            MarkdownElement::Text(text) => {
                pending.push(Span::raw(text.clone()));
                continue;
            }
            MarkdownElement::Bold(text) => {
                pending.push(Span::styled(
                    text.clone(),
                    Style::default().fg(BOLD_COLOR).add_modifier(Modifier::BOLD),
                ));
                continue;
            }
            MarkdownElement::Italic(text) => {
                pending.push(Span::styled(
                    text.clone(),
                    Style::default().fg(ITALIC_COLOR).add_modifier(Modifier::ITALIC),
                ));
                continue;
            }
            MarkdownElement::Code(code) => {
                pending.push(Span::styled(format!(" {} ", code), Style::default().fg(CODE_FG).bg(CODE_BG)));
                continue;
            }
            MarkdownElement::Math(math) => {
                pending.push(Span::styled(math.clone(), Style::default().fg(MATH_COLOR)));
                continue;
            }
            MarkdownElement::Newline => {
                if !pending.is_empty() {
                    lines.push(Line::from(std::mem::take(&mut pending)));
                } else if lines.last().is_some_and(|l| !is_blank(l)) {
                    lines.push(Line::default());
                }
                continue;
            }
            MarkdownElement::MathBlock(math) => vec![Line::from(vec![
                Span::raw("    "),
                Span::styled(math.clone(), Style::default().fg(MATH_COLOR).add_modifier(Modifier::BOLD)),
            ])],
            MarkdownElement::CodeBlock { language, code } => {
                let lang = language.as_deref().unwrap_or("code");
                let mut block = vec![Line::from(vec![
                    Span::styled(format!("┌─ {} ", lang), Style::default().fg(CODE_FG)),
                    Span::styled("─".repeat(width.saturating_sub(lang.len() + 4)), dim),
                ])];
                for code_line in code.lines() {
                    block.push(Line::from(vec![
                        Span::styled("│ ", dim),
                        Span::styled(code_line.to_string(), Style::default().fg(CODE_FG).bg(CODE_BG)),
                    ]));
                }
                block.push(Line::from(Span::styled(format!("└{}", "─".repeat(width.saturating_sub(1))), dim)));
                block
            }
            MarkdownElement::Heading { level, text } => {
                let style = match level {
                    1 => Style::default().fg(HEADING_COLOR).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                    2 => Style::default().fg(HEADING_COLOR).add_modifier(Modifier::BOLD),
                    _ => Style::default().fg(HEADING_COLOR).add_modifier(Modifier::BOLD | Modifier::DIM),
                };
                vec![Line::from(Span::styled(text.clone(), style))]
            }
            MarkdownElement::ListItem { indent, marker, text } => {
                // List text still carries inline markup
                let mut inline = Vec::new();
                parse_inline(text, &mut inline);
                let mut spans = vec![
                    Span::raw(" ".repeat(*indent)),
                    Span::styled(format!("{} ", marker), Style::default().fg(LIST_BULLET_COLOR)),
                ];
                for line in render_markdown(&inline, width) {
                    spans.extend(line.spans);
                }
                vec![Line::from(spans)]
            }
            MarkdownElement::BlockQuote(text) => vec![Line::from(vec![
                Span::styled("│ ", Style::default().fg(BLOCKQUOTE_COLOR)),
                Span::styled(
                    text.clone(),
                    Style::default().fg(BLOCKQUOTE_COLOR).add_modifier(Modifier::ITALIC),
                ),
            ])],
            MarkdownElement::HorizontalRule => {
                vec![Line::from(Span::styled("─".repeat(width), Style::default().fg(RULE_COLOR)))]
            }
        };

        if !pending.is_empty() {
            lines.push(Line::from(std::mem::take(&mut pending)));
        }
        lines.extend(block);
    }

    if !pending.is_empty() {
        lines.push(Line::from(pending));
    }

    lines
}

fn is_blank(line: &Line) -> bool {
    line.spans.iter().all(|s| s.content.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.to_string()).collect())
            .collect()
    }

    fn count(elements: &[MarkdownElement], pred: impl Fn(&MarkdownElement) -> bool) -> usize {
        elements.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn test_plain_line() {
        let elements = parse_markdown("Add the two numbers");
        assert_eq!(
            elements,
            vec![
                MarkdownElement::Text("Add the two numbers".to_string()),
                MarkdownElement::Newline
            ]
        );
    }

    #[test]
    fn test_headings() {
        let elements = parse_markdown("## Step 1\n#hashtag");
        assert_eq!(
            elements[0],
            MarkdownElement::Heading { level: 2, text: "Step 1".to_string() }
        );
        // Needs a space after the hashes
        assert!(matches!(&elements[1], MarkdownElement::Text(t) if t == "#hashtag"));
    }

    #[test]
    fn test_emphasis() {
        let elements = parse_markdown("The result is **12** and _exact_ or *approx*");
        assert!(elements.contains(&MarkdownElement::Bold("12".to_string())));
        assert!(elements.contains(&MarkdownElement::Italic("exact".to_string())));
        assert!(elements.contains(&MarkdownElement::Italic("approx".to_string())));
    }

    #[test]
    fn test_arithmetic_asterisks_are_literal() {
        let elements = parse_markdown("Compute 2*3*4 and x**2 + y**2");
        assert_eq!(count(&elements, |e| matches!(e, MarkdownElement::Italic(_))), 0);
        assert_eq!(count(&elements, |e| matches!(e, MarkdownElement::Bold(_))), 0);
        assert!(matches!(&elements[0], MarkdownElement::Text(t) if t == "Compute 2*3*4 and x**2 + y**2"));
    }

    #[test]
    fn test_spaced_operator_is_literal() {
        let elements = parse_markdown("3 * 4 = 12");
        assert!(matches!(&elements[0], MarkdownElement::Text(t) if t == "3 * 4 = 12"));
    }

    #[test]
    fn test_snake_case_untouched() {
        let elements = parse_markdown("call final_answer_value");
        assert!(matches!(&elements[0], MarkdownElement::Text(t) if t == "call final_answer_value"));
    }

    #[test]
    fn test_unclosed_bold_kept() {
        let elements = parse_markdown("**oops");
        assert!(matches!(&elements[0], MarkdownElement::Text(t) if t == "**oops"));
    }

    #[test]
    fn test_inline_math_and_code() {
        let elements = parse_markdown("So $x \\times 2$ gives `42`");
        assert!(elements.contains(&MarkdownElement::Math("x × 2".to_string())));
        assert!(elements.contains(&MarkdownElement::Code("42".to_string())));
    }

    #[test]
    fn test_lone_dollar_is_text() {
        let elements = parse_markdown("costs $5");
        assert!(matches!(&elements[0], MarkdownElement::Text(t) if t == "costs $5"));
    }

    #[test]
    fn test_math_blocks() {
        let elements = parse_markdown("$$\n\\frac{1}{2} \\cdot 4\n$$\n$$x^{2}$$");
        assert_eq!(elements[0], MarkdownElement::MathBlock("(1)/(2) · 4".to_string()));
        assert_eq!(elements[1], MarkdownElement::MathBlock("x^2".to_string()));
    }

    #[test]
    fn test_nested_fraction() {
        assert_eq!(tex_to_display("\\frac{\\frac{a}{b}}{c}"), "((a)/(b))/(c)");
        assert_eq!(tex_to_display("\\sqrt{16} = 4"), "√16 = 4");
        assert_eq!(tex_to_display("\\frac{1"), "\\frac1");
    }

    #[test]
    fn test_numbered_steps_keep_numbers() {
        let elements = parse_markdown("1. Expand\n10. Simplify");
        assert_eq!(
            elements,
            vec![
                MarkdownElement::ListItem { indent: 0, marker: "1.".to_string(), text: "Expand".to_string() },
                MarkdownElement::ListItem { indent: 0, marker: "10.".to_string(), text: "Simplify".to_string() },
            ]
        );
        assert!(parse_list_item("3.14 is pi").is_none());
    }

    #[test]
    fn test_code_fence() {
        let elements = parse_markdown("```python\nprint(2 ** 8)\n```");
        assert_eq!(
            elements,
            vec![MarkdownElement::CodeBlock {
                language: Some("python".to_string()),
                code: "print(2 ** 8)".to_string(),
            }]
        );
    }

    #[test]
    fn test_unterminated_fence_keeps_body() {
        let elements = parse_markdown("```\nlet x = 1;");
        assert_eq!(
            elements,
            vec![MarkdownElement::CodeBlock { language: None, code: "let x = 1;".to_string() }]
        );
    }

    #[test]
    fn test_quote_and_rule() {
        let elements = parse_markdown("> remember units\n---");
        assert_eq!(elements[0], MarkdownElement::BlockQuote("remember units".to_string()));
        assert_eq!(elements[1], MarkdownElement::HorizontalRule);
    }

    #[test]
    fn test_render_strips_markers() {
        let lines = render_markdown(&parse_markdown("## Answer\nThe sum is **4**.\n\n- uses $a+b$"), 40);
        assert_eq!(plain(&lines), vec!["Answer", "The sum is 4.", "", "• uses a+b"]);
    }

    #[test]
    fn test_render_code_block_frame() {
        let lines = render_markdown(
            &[MarkdownElement::CodeBlock { language: None, code: "a\nb".to_string() }],
            20,
        );
        let text = plain(&lines);
        assert_eq!(text.len(), 4);
        assert!(text[0].starts_with("┌─ code"));
        assert_eq!(text[1], "│ a");
        assert!(text[3].starts_with('└'));
    }

    #[test]
    fn test_render_collapses_blank_runs() {
        let lines = render_markdown(&parse_markdown("a\n\n\n\nb"), 20);
        assert_eq!(plain(&lines), vec!["a", "", "b"]);
    }
}
