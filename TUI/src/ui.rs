use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, BorderType, Borders, Chart, Clear, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, SidebarItem};
use crate::chart::PlotView;
use crate::command::COMMANDS;
use crate::keypad::Key;
use crate::mascot::Mood;
use crate::presenter::ResultCard;
use crate::session::DispatchPhase;
use crate::solve::ResultKind;
use crate::ui_state::{Focus, Screen};

// Copper Sapphire Morning color palette
const BG_DARK: Color = Color::Rgb(12, 12, 16);
const BG_PANEL: Color = Color::Rgb(18, 18, 24);

const SAPPHIRE: Color = Color::Rgb(101, 150, 243);
const CYAN_LIGHT: Color = Color::Rgb(178, 220, 226);

const COPPER: Color = Color::Rgb(138, 72, 38);
const WARM_BROWN: Color = Color::Rgb(164, 103, 38);
const TAN: Color = Color::Rgb(216, 180, 169);
const PALE_YELLOW: Color = Color::Rgb(234, 208, 148);

const BURGUNDY: Color = Color::Rgb(204, 92, 68);
const OLIVE: Color = Color::Rgb(131, 179, 102);
const LAVENDER: Color = Color::Rgb(211, 164, 234);

const TEXT_PRIMARY: Color = Color::Rgb(240, 240, 245);
const TEXT_SECONDARY: Color = Color::Rgb(180, 180, 190);
const TEXT_MUTED: Color = Color::Rgb(105, 116, 133);

const BORDER_DIM: Color = Color::Rgb(45, 50, 60);
const BORDER_ACCENT: Color = Color::Rgb(70, 85, 110);
const GRID: Color = Color::Rgb(32, 36, 46);

const LABEL_WIDTH: usize = 5;

pub fn draw(frame: &mut Frame, app: &App) {
    let bg = Block::default().style(Style::default().bg(BG_DARK));
    frame.render_widget(bg, frame.area());

    match app.ui.screen {
        Screen::Home => draw_home(frame, app),
        Screen::Calculator => draw_calculator(frame, app),
    }
}

fn panel(title: String, title_color: Color, border_color: Color) -> Block<'static> {
    Block::default()
        .title(Span::styled(title, Style::default().fg(title_color).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
}

fn focus_color(app: &App, focus: Focus) -> Color {
    if app.ui.focus == focus {
        SAPPHIRE
    } else {
        BORDER_DIM
    }
}

/// Cut `text` to `max` display columns, ending in an ellipsis when shortened.
fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Greedy word wrap by display width.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![text.to_string()];
    }
    let mut result = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.width() + 1 + word.width() <= max_width {
            current.push(' ');
            current.push_str(word);
        } else {
            result.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() || result.is_empty() {
        result.push(current);
    }
    result
}

/// Linear mix of two RGB colors, `t` in 0..=1.
fn blend(from: (u8, u8, u8), to: (u8, u8, u8), t: f64) -> Color {
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t.clamp(0.0, 1.0)) as u8;
    Color::Rgb(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

fn draw_home(frame: &mut Frame, app: &App) {
    let area = frame.area();

    draw_background_pattern(frame, area, app.animation_frame);

    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Length(11), // Logo container
            Constraint::Length(3),  // Subtitle
            Constraint::Length(3),  // Hint
            Constraint::Min(0),
        ])
        .split(area);

    let logo_width = 48;
    let h_padding = (area.width.saturating_sub(logo_width)) / 2;
    let logo_area = Rect {
        x: area.x + h_padding,
        y: v_chunks[1].y,
        width: logo_width.min(area.width),
        height: v_chunks[1].height,
    };

    draw_glass_border(frame, logo_area, app.animation_frame);

    let inner = Rect {
        x: logo_area.x + 2,
        y: logo_area.y + 1,
        width: logo_area.width.saturating_sub(4),
        height: logo_area.height.saturating_sub(2),
    };
    draw_animated_logo(frame, inner, app.animation_frame);

    // Subtitle types itself out over the first two seconds
    let subtitle_text = "Step-by-step math with Benny Toon";
    let typed: String = subtitle_text.chars().take(app.animation_frame / 3).collect();
    let caret = if typed.len() < subtitle_text.len() { "_" } else { "" };
    frame.render_widget(
        Paragraph::new(format!("{typed}{caret}"))
            .alignment(Alignment::Center)
            .style(Style::default().fg(TEXT_SECONDARY)),
        v_chunks[2],
    );

    let hint_color = blend((101, 150, 243), (178, 220, 226), (app.animation_frame as f64 / 40.0).sin().abs());
    frame.render_widget(
        Paragraph::new("[ Press any key to start ]")
            .alignment(Alignment::Center)
            .style(Style::default().fg(hint_color)),
        v_chunks[3],
    );

    let version_area = Rect {
        x: area.x,
        y: area.height.saturating_sub(2),
        width: area.width,
        height: 1,
    };
    let version = Paragraph::new(format!("v{}  ·  {}", env!("CARGO_PKG_VERSION"), app.solver_label))
        .alignment(Alignment::Center)
        .style(Style::default().fg(TEXT_MUTED));
    frame.render_widget(version, version_area);
}

fn draw_background_pattern(frame: &mut Frame, area: Rect, anim_frame: usize) {
    const GLYPHS: [&str; 4] = ["+", "−", "×", "÷"];
    let drift = (anim_frame / 30) % 4;

    let mut lines: Vec<Line> = Vec::with_capacity(area.height as usize);
    for y in 0..area.height as usize {
        let mut spans: Vec<Span> = Vec::with_capacity(area.width as usize);
        for x in 0..area.width as usize {
            if (x + drift) % 14 == 0 && (y + drift) % 7 == 0 {
                let brightness = 28 + ((anim_frame as f64 / 60.0 + x as f64 / 14.0).sin().abs() * 14.0) as u8;
                let glyph = GLYPHS[(x / 14 + y / 7) % GLYPHS.len()];
                spans.push(Span::styled(
                    glyph,
                    Style::default().fg(Color::Rgb(brightness, brightness + 2, brightness + 6)),
                ));
            } else {
                spans.push(Span::raw(" "));
            }
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(BG_DARK)), area);
}

fn draw_glass_border(frame: &mut Frame, area: Rect, anim_frame: usize) {
    // Copper fading into olive and back
    let t = (anim_frame as f64 / 100.0).sin() * 0.5 + 0.5;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(blend((138, 72, 38), (131, 179, 102), t)));
    frame.render_widget(block, area);
}

fn draw_animated_logo(frame: &mut Frame, area: Rect, anim_frame: usize) {
    let logo_lines = [
        "",
        "██████╗ ███████╗███╗   ██╗███╗   ██╗██╗   ██╗",
        "██╔══██╗██╔════╝████╗  ██║████╗  ██║╚██╗ ██╔╝",
        "██████╔╝█████╗  ██╔██╗ ██║██╔██╗ ██║ ╚████╔╝ ",
        "██╔══██╗██╔══╝  ██║╚██╗██║██║╚██╗██║  ╚██╔╝  ",
        "██████╔╝███████╗██║ ╚████║██║ ╚████║   ██║   ",
        "╚═════╝ ╚══════╝╚═╝  ╚═══╝╚═╝  ╚═══╝   ╚═╝   ",
        "",
        "           [ C A L C U L A T O R ]           ",
    ];

    let mut lines: Vec<Line> = Vec::new();
    for (line_idx, logo_line) in logo_lines.iter().enumerate() {
        let spans: Vec<Span> = logo_line
            .chars()
            .enumerate()
            .map(|(char_idx, ch)| {
                // Copper to pale yellow wave sweeping left to right
                let phase = anim_frame as f64 / 25.0 + char_idx as f64 / 6.0 - line_idx as f64 / 2.0;
                let color = blend((164, 103, 38), (234, 208, 148), phase.sin() * 0.5 + 0.5);
                Span::styled(ch.to_string(), Style::default().fg(color))
            })
            .collect();
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn draw_calculator(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let padded = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(app.config.sidebar_width),
            Constraint::Length(1),
            Constraint::Min(40),
        ])
        .split(padded);

    draw_sidebar(frame, app, main_chunks[0]);

    let work = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(50), // Transcript + input
            Constraint::Length(1),
            Constraint::Percentage(50), // Result + keypad
        ])
        .split(main_chunks[2]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1), Constraint::Length(3)])
        .split(work[0]);
    draw_transcript(frame, app, left[0]);
    draw_input(frame, app, left[2]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(9)])
        .split(work[2]);
    draw_result(frame, app, right[0]);
    draw_keypad(frame, app, right[1]);

    if app.ui.show_help {
        draw_help_popup(frame, main_chunks[2]);
    }
}

fn draw_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Modes
            Constraint::Min(5),    // History
            Constraint::Length(4), // Session info
            Constraint::Length(4), // Keyboard hints
        ])
        .split(area);

    let items = app.sidebar_items();
    let cursor = (app.ui.focus == Focus::Sidebar).then_some(app.ui.sidebar_cursor);
    let width = chunks[1].width.saturating_sub(4) as usize;

    let mut mode_lines = Vec::new();
    let mut history_lines = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        let selected = cursor == Some(idx);
        let marker = if selected { "▸ " } else { "  " };
        match item {
            SidebarItem::Mode(mode) => {
                let active = *mode == app.session.mode;
                let style = if selected {
                    Style::default().fg(CYAN_LIGHT).add_modifier(Modifier::BOLD)
                } else if active {
                    Style::default().fg(PALE_YELLOW)
                } else {
                    Style::default().fg(TEXT_SECONDARY)
                };
                mode_lines.push(Line::from(vec![
                    Span::styled(marker, Style::default().fg(SAPPHIRE)),
                    Span::styled(truncate(mode.label(), width), style),
                ]));
            }
            SidebarItem::Entry(id) => {
                let Some(entry) = app.session.history().get(*id) else {
                    continue;
                };
                let is_current = app.session.current_entry().map(|e| e.id()) == Some(*id);
                let text = format!("{} = {}", entry.expression(), entry.result().final_answer());
                let style = if selected {
                    Style::default().fg(CYAN_LIGHT).add_modifier(Modifier::BOLD)
                } else if is_current {
                    Style::default().fg(TAN)
                } else {
                    Style::default().fg(TEXT_MUTED)
                };
                history_lines.push(Line::from(vec![
                    Span::styled(marker, Style::default().fg(SAPPHIRE)),
                    Span::styled(truncate(&text, width), style),
                ]));
            }
        }
    }

    let sidebar_border = focus_color(app, Focus::Sidebar);
    let modes = panel(" Modes ".to_string(), COPPER, sidebar_border);
    frame.render_widget(Paragraph::new(mode_lines).block(modes), chunks[0]);

    if history_lines.is_empty() {
        history_lines.push(Line::from(Span::styled(" No history yet", Style::default().fg(TEXT_MUTED))));
    }
    let history = panel(" History ".to_string(), COPPER, sidebar_border);
    frame.render_widget(Paragraph::new(history_lines).block(history), chunks[1]);

    let (status_icon, status_color) = if app.solver_label == "offline" {
        ("o", TEXT_MUTED)
    } else {
        ("*", OLIVE)
    };
    let info = vec![
        Line::from(vec![
            Span::styled(format!(" {} ", status_icon), Style::default().fg(status_color)),
            Span::styled(truncate(&app.solver_label, width), Style::default().fg(status_color)),
        ]),
        Line::from(vec![
            Span::styled(" > ", Style::default().fg(SAPPHIRE)),
            Span::styled(
                format!("{} solved", app.session.history().len()),
                Style::default().fg(TEXT_PRIMARY),
            ),
        ]),
    ];
    let info_block = panel(" Session ".to_string(), SAPPHIRE, BORDER_DIM);
    frame.render_widget(Paragraph::new(info).block(info_block), chunks[2]);

    let hints = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Tab", Style::default().fg(SAPPHIRE).add_modifier(Modifier::BOLD)),
            Span::styled(" focus  ", Style::default().fg(TEXT_MUTED)),
            Span::styled("F5", Style::default().fg(COPPER).add_modifier(Modifier::BOLD)),
            Span::styled(" help", Style::default().fg(TEXT_MUTED)),
        ]),
        Line::from(vec![
            Span::styled("^L", Style::default().fg(LAVENDER).add_modifier(Modifier::BOLD)),
            Span::styled(" new  ", Style::default().fg(TEXT_MUTED)),
            Span::styled("ESC", Style::default().fg(SAPPHIRE).add_modifier(Modifier::BOLD)),
            Span::styled(" quit", Style::default().fg(TEXT_MUTED)),
        ]),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_DIM)),
    );
    frame.render_widget(hints, chunks[3]);
}

fn draw_transcript(frame: &mut Frame, app: &App, area: Rect) {
    let border_color = if app.ui.send_animation > 0 {
        let intensity = app.ui.send_animation as f64 / app.config.send_animation_ticks.max(1) as f64;
        blend((70, 85, 110), (234, 208, 148), intensity)
    } else {
        BORDER_DIM
    };

    let block = panel(" Transcript ".to_string(), TEXT_PRIMARY, border_color);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let padded = Rect {
        x: inner.x + 1,
        y: inner.y,
        width: inner.width.saturating_sub(2),
        height: inner.height,
    };

    let history = app.session.history();
    if history.is_empty() && !app.session.is_processing() {
        let welcome = vec![
            Line::from(""),
            Line::from(Span::styled(
                "◆ B E N N Y ◆",
                Style::default().fg(SAPPHIRE).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled("Type a problem or use the keypad:", Style::default().fg(TEXT_SECONDARY))),
            Line::from(""),
            Line::from(Span::styled("\"2+2\"", Style::default().fg(TEXT_MUTED).add_modifier(Modifier::ITALIC))),
            Line::from(Span::styled("\"y=x^2\"", Style::default().fg(TEXT_MUTED).add_modifier(Modifier::ITALIC))),
            Line::from(Span::styled(
                "\"A train leaves at 3pm...\"",
                Style::default().fg(TEXT_MUTED).add_modifier(Modifier::ITALIC),
            )),
        ];
        frame.render_widget(Paragraph::new(welcome).alignment(Alignment::Center), padded);
        return;
    }

    let content_width = (padded.width as usize).saturating_sub(LABEL_WIDTH);
    let indent = " ".repeat(LABEL_WIDTH);
    let current = app.session.current_entry().map(|e| e.id());
    let mut lines: Vec<Line> = Vec::new();

    for entry in history.iter() {
        let is_current = current == Some(entry.id());
        let q_style = if is_current {
            Style::default().fg(CYAN_LIGHT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(SAPPHIRE).add_modifier(Modifier::BOLD)
        };

        for (i, chunk) in wrap_text(entry.expression(), content_width).into_iter().enumerate() {
            let label = if i == 0 { format!("{:>2} │ ", "Q") } else { indent.clone() };
            lines.push(Line::from(vec![
                Span::styled(label, q_style),
                Span::styled(chunk, Style::default().fg(TEXT_PRIMARY)),
            ]));
        }

        let result = entry.result();
        let answer_fg = answer_color(result.kind());
        let mut answer = vec![
            Span::styled(format!("{:>2} │ ", "A"), Style::default().fg(COPPER).add_modifier(Modifier::BOLD)),
            Span::styled(
                truncate(result.final_answer(), content_width.saturating_sub(16)),
                Style::default().fg(answer_fg).add_modifier(Modifier::BOLD),
            ),
        ];
        if result.plot_points().is_some() {
            answer.push(Span::styled(" graph ", Style::default().fg(BG_DARK).bg(OLIVE)));
        }
        answer.push(Span::styled(
            format!("  {}", entry.created_at().format("%H:%M:%S")),
            Style::default().fg(TEXT_MUTED),
        ));
        lines.push(Line::from(answer));
        lines.push(Line::from(""));
    }

    if let (Some(expression), DispatchPhase::Processing { started_at, .. }) =
        (app.session.pending_expression(), app.session.phase())
    {
        let dots = match (app.animation_frame / 15) % 4 {
            0 => ".  ",
            1 => ".. ",
            2 => "...",
            _ => " ..",
        };
        let elapsed = (Utc::now() - *started_at).num_seconds().max(0);
        lines.push(Line::from(vec![
            Span::styled(format!("{:>2} │ ", "Q"), Style::default().fg(SAPPHIRE).add_modifier(Modifier::BOLD)),
            Span::styled(truncate(expression, content_width), Style::default().fg(TEXT_PRIMARY)),
        ]));
        lines.push(Line::from(vec![
            Span::raw(indent.clone()),
            Span::styled(
                format!("Benny is thinking{} {}s", dots, elapsed),
                Style::default().fg(COPPER).add_modifier(Modifier::ITALIC),
            ),
        ]));
    }

    let total_lines = lines.len();
    let visible_height = padded.height as usize;

    // Scrolled from the bottom
    let max_scroll = total_lines.saturating_sub(visible_height);
    let clamped_offset = app.ui.scroll_offset.min(max_scroll);
    let scroll_pos = max_scroll.saturating_sub(clamped_offset);

    frame.render_widget(Paragraph::new(lines).scroll((scroll_pos as u16, 0)), padded);

    if total_lines > visible_height && area.width > 2 && area.height > 2 {
        if scroll_pos > 0 {
            let up_area = Rect { x: area.x + area.width - 2, y: area.y + 1, width: 1, height: 1 };
            frame.render_widget(Paragraph::new("▲").style(Style::default().fg(SAPPHIRE)), up_area);
        }
        if clamped_offset > 0 {
            let down_area = Rect {
                x: area.x + area.width - 2,
                y: area.y + area.height - 2,
                width: 1,
                height: 1,
            };
            frame.render_widget(Paragraph::new("▼").style(Style::default().fg(SAPPHIRE)), down_area);
        }
    }
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let border_color = if app.ui.focus == Focus::Input {
        blend((45, 50, 60), (101, 150, 243), (app.animation_frame as f64 / 90.0).sin() * 0.3 + 0.7)
    } else {
        BORDER_DIM
    };

    let mut block = panel(" Expression ".to_string(), TEXT_SECONDARY, border_color);
    if let Some(status) = &app.ui.status_message {
        block = block.title_bottom(Span::styled(format!(" {} ", status), Style::default().fg(WARM_BROWN)));
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cursor = if app.animation_frame % 30 < 15 { "|" } else { " " };
    let badge = format!(" {} ", app.session.mode.badge());
    let prompt = vec![
        Span::styled(badge, Style::default().fg(BG_DARK).bg(COPPER).add_modifier(Modifier::BOLD)),
        Span::styled(" > ", Style::default().fg(SAPPHIRE)),
        Span::styled(app.session.expression.as_str().to_string(), Style::default().fg(TEXT_PRIMARY)),
        Span::styled(cursor, Style::default().fg(TEXT_PRIMARY)),
    ];

    // Keep the tail of long expressions visible
    let used = app.session.mode.badge().width() + 5 + app.session.expression.char_count();
    let overflow = used.saturating_sub(inner.width as usize) as u16;
    frame.render_widget(Paragraph::new(Line::from(prompt)).scroll((0, overflow)), inner);
}

fn answer_color(kind: ResultKind) -> Color {
    match kind {
        ResultKind::Math => PALE_YELLOW,
        ResultKind::Chat => BURGUNDY,
    }
}

fn mood_color(mood: Mood) -> Color {
    match mood {
        Mood::Idle => TEXT_SECONDARY,
        Mood::Thinking => SAPPHIRE,
        Mood::Happy => OLIVE,
        Mood::Excited => PALE_YELLOW,
        Mood::Puzzled => BURGUNDY,
    }
}

fn draw_result(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.session.current_result();
    let mood = Mood::for_state(app.session.is_processing(), active);

    let toggle = if app.ui.show_raw_markdown { " ○ Raw " } else { " ◉ Preview " };
    let block = panel(" Result ".to_string(), TEXT_PRIMARY, BORDER_ACCENT)
        .title_bottom(Span::styled(toggle, Style::default().fg(TEXT_MUTED)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let card = active.map(ResultCard::new);

    let has_chart = card.as_ref().is_some_and(|c| c.has_chart());
    let constraints = if has_chart {
        vec![Constraint::Length(4), Constraint::Percentage(55), Constraint::Min(3)]
    } else {
        vec![Constraint::Length(4), Constraint::Length(0), Constraint::Min(3)]
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    // Mascot on the left, answer and remark beside it
    let header = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(14), Constraint::Min(10)])
        .split(chunks[0]);

    let face: Vec<Line> = mood
        .face(app.animation_frame)
        .iter()
        .map(|l| Line::from(Span::styled(*l, Style::default().fg(mood_color(mood)))))
        .collect();
    frame.render_widget(Paragraph::new(face), header[0]);

    let answer_fg = card.as_ref().map_or(PALE_YELLOW, |c| answer_color(c.kind));
    let summary = match &card {
        Some(card) => vec![
            Line::from(vec![
                Span::styled("= ", Style::default().fg(COPPER)),
                Span::styled(
                    card.final_answer.to_string(),
                    Style::default().fg(answer_fg).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                format!("\"{}\"", card.remark),
                Style::default().fg(TAN).add_modifier(Modifier::ITALIC),
            )),
        ],
        None => vec![
            Line::from(""),
            Line::from(Span::styled(mood.caption(), Style::default().fg(TEXT_MUTED))),
        ],
    };
    let summary = if app.session.is_processing() {
        vec![Line::from(""), Line::from(Span::styled(mood.caption(), Style::default().fg(SAPPHIRE)))]
    } else {
        summary
    };
    frame.render_widget(Paragraph::new(summary).wrap(Wrap { trim: true }), header[1]);

    let Some(card) = card else {
        return;
    };

    if let Some(view) = card.plot.as_ref().filter(|_| chunks[1].height >= 6 && chunks[1].width >= 24) {
        draw_plot(frame, view, app.ui.plot_cursor, chunks[1]);
    }

    let body = chunks[2];
    let lines = card.solution_lines(body.width as usize, app.ui.show_raw_markdown);
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), body);
}

fn draw_plot(frame: &mut Frame, view: &PlotView, cursor: usize, area: Rect) {
    let cursor = cursor.min(view.len().saturating_sub(1));
    let highlight: Vec<(f64, f64)> = view.series.get(cursor).copied().into_iter().collect();

    let mut datasets: Vec<Dataset> = view
        .grid
        .iter()
        .map(|segment| {
            Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(GRID))
                .data(segment)
        })
        .collect();

    for zero in [&view.x_zero, &view.y_zero].into_iter().flatten() {
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(TEXT_MUTED))
                .data(zero),
        );
    }

    datasets.push(
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(SAPPHIRE))
            .data(&view.series),
    );
    datasets.push(
        Dataset::default()
            .marker(symbols::Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(PALE_YELLOW))
            .data(&highlight),
    );

    let tooltip = view.tooltip(cursor).unwrap_or_default();
    let block = Block::default()
        .title(Span::styled(
            format!(" Graph ({} pts) ", view.len()),
            Style::default().fg(CYAN_LIGHT).add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Span::styled(
            format!(" ◆ {} ", tooltip),
            Style::default().fg(BG_DARK).bg(PALE_YELLOW),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_DIM))
        .style(Style::default().bg(BG_PANEL));

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds(view.x_bounds)
                .labels(view.x_labels.clone())
                .style(Style::default().fg(TEXT_MUTED)),
        )
        .y_axis(
            Axis::default()
                .bounds(view.y_bounds)
                .labels(view.y_labels.clone())
                .style(Style::default().fg(TEXT_MUTED)),
        );
    frame.render_widget(chart, area);
}

fn draw_keypad(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.ui.focus == Focus::Keypad;
    let title = if app.keypad.is_alt() { " Keypad · calculus " } else { " Keypad " };
    let block = panel(title.to_string(), COPPER, focus_color(app, Focus::Keypad));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (cursor_row, cursor_col) = app.keypad.cursor();
    let lines: Vec<Line> = app
        .keypad
        .rows()
        .iter()
        .enumerate()
        .map(|(r, row)| {
            let cell_width = (inner.width as usize / row.len().max(1)).clamp(3, 9);
            let spans: Vec<Span> = row
                .iter()
                .enumerate()
                .map(|(c, key)| {
                    let label = key.label(app.keypad.is_alt());
                    let base = match key {
                        Key::Solve => Style::default().fg(BG_DARK).bg(SAPPHIRE),
                        Key::Clear | Key::Backspace => Style::default().fg(BURGUNDY),
                        Key::ToggleFunctions => Style::default().fg(LAVENDER),
                        Key::Token { .. } if r == 0 || r == 6 => Style::default().fg(CYAN_LIGHT),
                        Key::Token { .. } => Style::default().fg(TEXT_PRIMARY),
                    };
                    let style = if focused && (r, c) == (cursor_row, cursor_col) {
                        Style::default().fg(BG_DARK).bg(PALE_YELLOW).add_modifier(Modifier::BOLD)
                    } else {
                        base
                    };
                    let pad = cell_width.saturating_sub(label.width());
                    let cell = format!("{}{}{}", " ".repeat(pad / 2), label, " ".repeat(pad - pad / 2));
                    Span::styled(cell, style)
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn draw_help_popup(frame: &mut Frame, area: Rect) {
    let keys: &[(&str, &str)] = &[
        ("Enter", "solve / press key / select row"),
        ("Tab", "cycle input, keypad, sidebar"),
        ("←/→", "move along the graph"),
        ("↑/↓", "scroll, move keypad or sidebar"),
        ("F1-F4", "switch mode"),
        ("F6", "raw / preview solution"),
        ("Ctrl+L", "new session"),
        ("Ctrl+V", "paste"),
    ];

    let height = (keys.len() + COMMANDS.len() + 5) as u16;
    let width = 52.min(area.width.saturating_sub(4));
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + 2,
        width,
        height: height.min(area.height.saturating_sub(2)),
    }
    .intersection(area);
    frame.render_widget(Clear, popup);

    let block = panel(" Help ".to_string(), COPPER, COPPER).style(Style::default().bg(BG_PANEL));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let mut lines: Vec<Line> = keys
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(format!(" {:<8}", key), Style::default().fg(SAPPHIRE).add_modifier(Modifier::BOLD)),
                Span::styled(*desc, Style::default().fg(TEXT_SECONDARY)),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    for (cmd, desc) in COMMANDS {
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<8}", cmd), Style::default().fg(COPPER).add_modifier(Modifier::BOLD)),
            Span::styled(*desc, Style::default().fg(TEXT_MUTED)),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" ESC to close", Style::default().fg(TEXT_MUTED).add_modifier(Modifier::ITALIC))));

    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::config::Config;
    use crate::dispatcher::tests::{answer, parabola, ScriptedSolver};
    use crate::dispatcher::{DispatchOutcome, Dispatcher};
    use crate::solve::{SolvePayload, SolveResult};
    use ratatui::{backend::TestBackend, Terminal};
    use tokio::runtime::Handle;

    fn calculator() -> App {
        let solver = ScriptedSolver::new(vec![]);
        let mut app = App::new(Config::default(), Dispatcher::new(solver), Handle::current(), "scripted");
        app.apply(Action::Start);
        app
    }

    fn record(app: &mut App, expression: &str, payload: SolvePayload) {
        app.session.expression.replace(expression);
        let request = app.session.begin_dispatch(2).unwrap();
        app.session.complete_dispatch(DispatchOutcome {
            ticket: request.ticket,
            result: SolveResult::math(payload),
        });
    }

    fn render(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_home_screen_renders() {
        let solver = ScriptedSolver::new(vec![]);
        let app = App::new(Config::default(), Dispatcher::new(solver), Handle::current(), "offline");
        let screen = render(&app, 100, 30);
        assert!(screen.contains("Press any key"));
    }

    #[tokio::test]
    async fn test_empty_calculator_renders() {
        let app = calculator();
        let screen = render(&app, 140, 45);
        assert!(screen.contains("Transcript"));
        assert!(screen.contains("No history yet"));
        assert!(screen.contains("GENERAL"));
    }

    #[tokio::test]
    async fn test_plain_answer_renders_without_chart() {
        let mut app = calculator();
        record(&mut app, "2+2", answer("4"));

        let screen = render(&app, 140, 45);
        assert!(screen.contains("2+2 = 4"));
        assert!(!screen.contains("Graph ("));
    }

    #[tokio::test]
    async fn test_graph_with_twenty_points_renders() {
        let mut app = calculator();
        record(&mut app, "y=x^2", parabola(20));
        app.ui.plot_cursor = 19;

        let screen = render(&app, 140, 45);
        assert!(screen.contains("Graph (20 pts)"));
        assert!(screen.contains("x = 10, y = 100"));
        assert!(screen.contains(" graph "));
    }

    #[tokio::test]
    async fn test_tiny_terminal_does_not_panic() {
        let mut app = calculator();
        record(&mut app, "y=x^2", parabola(20));
        app.ui.show_help = true;
        render(&app, 20, 8);
    }

    #[tokio::test]
    async fn test_processing_and_help_render() {
        let mut app = calculator();
        app.session.expression.replace("sin(pi)");
        app.session.begin_dispatch(2).unwrap();
        app.ui.show_help = true;

        let screen = render(&app, 140, 45);
        assert!(screen.contains("Benny is thinking"));
        assert!(screen.contains("Help"));
    }

    #[test]
    fn test_answer_color_follows_result_kind() {
        let literal = SolveResult::math(answer("Error"));
        assert_eq!(answer_color(literal.kind()), PALE_YELLOW);
        assert_eq!(answer_color(SolveResult::fallback().kind()), BURGUNDY);
    }

    #[test]
    fn test_truncate_by_display_width() {
        assert_eq!(truncate("2+2", 10), "2+2");
        assert_eq!(truncate("sqrt(144) = 12", 8), "sqrt(14…");
        assert_eq!(truncate("∫ x dx", 6), "∫ x dx");
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("a bb ccc", 4), vec!["a bb", "ccc"]);
        assert_eq!(wrap_text("", 4), vec![""]);
    }
}
