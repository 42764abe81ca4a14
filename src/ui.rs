use carreira_core::{ai::MODEL, ChatRole, KeySource};
use ratatui::{
    layout::{Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};

use crate::app::{App, FocusPane, InputMode, NoticeLevel, StartupNotice};

const TITLE: &str = "🤖 CarreiraTI - Assistente de Carreira de TI";
const SUBTITLE: &str = "Seu guia para carreiras em Tecnologia da Informação!";
const TAGLINE: &str =
    "CarreiraTI - Seu assistente de carreiras em TI favorito | Feito com ❤️ para demonstração";
const INPUT_PLACEHOLDER: &str = "Digite sua mensagem sobre carreiras em TI...";
const SIDEBAR_WIDTH: u16 = 36;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_inline(text: &str) -> Vec<Span<'static>> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            // Consume the second *
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    spans
}

/// Renders one line of an assistant reply: headings, bullets and bold.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let trimmed = text.trim_start();

    if trimmed.starts_with('#') {
        let heading = trimmed.trim_start_matches('#').trim_start();
        return Line::from(parse_inline(heading))
            .patch_style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));
    }

    let indent = &text[..text.len() - trimmed.len()];
    if let Some(item) = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
    {
        let mut spans = vec![Span::raw(format!("{}• ", indent))];
        spans.extend(parse_inline(item));
        return Line::from(spans);
    }

    let spans = parse_inline(text);
    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn role_style(role: ChatRole) -> (&'static str, Color) {
    match role {
        ChatRole::User => ("Você:", Color::Cyan),
        ChatRole::Assistant | ChatRole::System => ("CarreiraTI:", Color::Magenta),
    }
}

fn bar(color: Color) -> Span<'static> {
    Span::styled("▌ ", Style::default().fg(color))
}

/// The transcript as drawn in the chat pane, without its border.
///
/// Scroll math measures this same paragraph, so the two never disagree on
/// how many rows a reply takes.
pub fn transcript_paragraph(app: &App) -> Paragraph<'static> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.conversation.snapshot() {
        let (label, color) = role_style(msg.role());
        lines.push(Line::from(vec![
            bar(color),
            Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ]));

        for text in msg.content().lines() {
            let mut line = match msg.role() {
                ChatRole::User => Line::from(text.to_string()),
                _ => parse_markdown_line(text),
            };
            line.spans.insert(0, bar(color));
            lines.push(line);
        }
        lines.push(Line::default());
    }

    if app.is_loading() {
        let (label, color) = role_style(ChatRole::Assistant);
        lines.push(Line::from(vec![
            bar(color),
            Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ]));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(vec![
            bar(color),
            Span::styled(
                format!("CarreiraTI está pensando{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]));
    }

    Paragraph::new(lines).wrap(Wrap { trim: false })
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, tagline, footer
    let [header_area, body_area, tagline_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);

    let main_area = if app.show_sidebar && body_area.width > SIDEBAR_WIDTH * 2 {
        let [sidebar_area, main_area] =
            Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
                .areas(body_area);
        render_sidebar(app.key_source, frame, sidebar_area);
        main_area
    } else {
        body_area
    };

    render_main(app, frame, main_area);

    let tagline = Paragraph::new(Line::from(TAGLINE).centered())
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(tagline, tagline_area);

    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(format!(" {} ", TITLE), Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  "),
        Span::styled(MODEL, Style::default().fg(Color::DarkGray)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_sidebar(key_source: Option<KeySource>, frame: &mut Frame, area: Rect) {
    let heading = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(Color::DarkGray);

    let key_status = match key_source {
        Some(KeySource::Env) => Span::styled("variável de ambiente", Style::default().fg(Color::Green)),
        Some(KeySource::Config) => {
            Span::styled("arquivo de configuração", Style::default().fg(Color::Green))
        }
        None => Span::styled("não configurada", Style::default().fg(Color::Yellow)),
    };

    let lines = vec![
        Line::from(Span::styled("Como usar:", heading)),
        Line::from("1. Faça perguntas sobre carreiras em TI!"),
        Line::from("2. Receba dicas sobre análise de dados e IA!"),
        Line::from("3. Obtenha recomendações de tecnologias!"),
        Line::default(),
        Line::from(Span::styled("Exemplos:", heading)),
        Line::from("• 'Quais tecnologias usar para análise de dados?'"),
        Line::from("• 'Como começar com desenvolvimento de IA?'"),
        Line::from("• 'Ferramentas open source para desenvolvimento?'"),
        Line::default(),
        Line::from(Span::styled("🛠️ Sobre CarreiraTI", heading)),
        Line::from("Sou seu assistente especializado em carreiras de tecnologia!"),
        Line::default(),
        Line::from(vec![Span::styled("Chave Groq: ", muted), key_status]),
        Line::from(Span::styled(format!("Modelo: {}", MODEL), muted)),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" CarreiraTI ");

    let sidebar = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(sidebar, area);
}

fn render_main(app: &mut App, frame: &mut Frame, area: Rect) {
    let notice_height = if app.notice.is_some() { 3 } else { 0 };

    let [notice_area, chat_area, input_area] = Layout::vertical([
        Constraint::Length(notice_height),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    if let Some(notice) = &app.notice {
        render_notice(notice, frame, notice_area);
    }

    // Store areas for mouse hit-testing
    app.chat_area = Some(chat_area);
    app.input_area = Some(input_area);

    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
}

fn render_notice(notice: &StartupNotice, frame: &mut Frame, area: Rect) {
    let (color, title) = match notice.level {
        NoticeLevel::Warning => (Color::Yellow, " Aviso (x para fechar) "),
        NoticeLevel::Error => (Color::Red, " Erro (x para fechar) "),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title);

    let paragraph = Paragraph::new(notice.text.as_str())
        .style(Style::default().fg(color))
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Transcript;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Conversa ");

    // Store chat area dimensions for scroll calculations
    let inner = block.inner(area);
    app.chat_height = inner.height;
    app.chat_width = inner.width;

    let chat = if app.conversation.is_empty() && !app.is_loading() {
        Paragraph::new(Text::from(vec![
            Line::default(),
            Line::from(Span::styled(SUBTITLE, Style::default().fg(Color::Gray).italic()))
                .centered(),
            Line::default(),
            Line::from(Span::styled(
                "Pergunte sobre tecnologias, estágios ou como montar seu portfólio.",
                Style::default().fg(Color::DarkGray),
            ))
            .centered(),
        ]))
        .wrap(Wrap { trim: true })
    } else {
        transcript_paragraph(app)
    };

    let chat = chat.block(block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);

    let total = app.transcript_lines();
    if total > app.chat_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state =
            ScrollbarState::new(total as usize).position(app.chat_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", INPUT_PLACEHOLDER));

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = if app.is_loading() && app.input.is_empty() {
        Paragraph::new(Span::styled(
            "aguardando resposta...",
            Style::default().fg(Color::DarkGray).italic(),
        ))
    } else {
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(input.block(block), area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NAVEGAR ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" DIGITAR ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" enviar ", label_style),
            Span::styled(" PgUp/PgDn ", key_style),
            Span::styled(" rolar ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" navegar ", label_style),
        ],
        InputMode::Normal => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" rolar ", label_style),
            Span::styled(" g/G ", key_style),
            Span::styled(" início/fim ", label_style),
            Span::styled(" i ", key_style),
            Span::styled(" digitar ", label_style),
            Span::styled(" s ", key_style),
            Span::styled(" painel ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" sair ", label_style),
        ],
    };
    if app.notice.is_some() && app.input_mode == InputMode::Normal {
        hints.extend(vec![
            Span::styled(" x ", key_style),
            Span::styled(" fechar aviso ", label_style),
        ]);
    }

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
