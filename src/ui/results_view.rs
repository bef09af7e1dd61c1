//! The result presenter.
//!
//! Pure rendering of `(items, is_loading, exhausted)` into the count line,
//! the card list and the load-more footer. Selection and scrolling are UI
//! state owned by the caller and passed in; nothing here mutates search
//! state.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::api_client::Volume;

/// Everything the presenter needs for one frame.
pub struct ResultsProps<'a> {
    pub items: &'a [Volume],
    pub selected: Option<usize>,
    pub is_loading: bool,
    pub exhausted: bool,
    /// Indices of cards matched by the local filter, for highlighting.
    pub filter_matches: &'a [usize],
    pub show_thumbnail_marker: bool,
    pub show_published_date: bool,
}

/// Author display rule: at most two names, then "and N more".
pub fn format_authors(authors: &[String]) -> String {
    match authors {
        [] => "Unknown author".to_string(),
        [one] => one.clone(),
        [a, b] => format!("{a}, {b}"),
        [a, b, rest @ ..] => format!("{a}, {b} and {} more", rest.len()),
    }
}

/// First category, or a fallback when the provider sent none.
pub fn primary_category(volume: &Volume) -> &str {
    volume
        .info
        .categories
        .first()
        .map(String::as_str)
        .unwrap_or("Uncategorized")
}

/// The count line above the list.
pub fn count_text(item_count: usize, is_loading: bool) -> String {
    if is_loading && item_count == 0 {
        "Searching…".to_string()
    } else if item_count == 1 {
        "1 book found".to_string()
    } else {
        format!("{item_count} books found")
    }
}

/// Footer text. None once the result set is exhausted: the affordance
/// disappears entirely rather than rendering disabled.
pub fn load_more_text(is_loading: bool, exhausted: bool) -> Option<&'static str> {
    if exhausted {
        None
    } else if is_loading {
        Some("Loading…")
    } else {
        Some("[ Load more — press m ]")
    }
}

fn card_item<'a>(volume: &'a Volume, marked: bool, props: &ResultsProps<'a>) -> ListItem<'a> {
    let mut title_spans = vec![Span::styled(
        volume.display_title(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if props.show_thumbnail_marker && volume.has_thumbnail() {
        title_spans.push(Span::styled(" [img]", Style::default().fg(Color::DarkGray)));
    }
    if marked {
        title_spans.push(Span::styled(
            " *",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }

    let mut meta = primary_category(volume).to_string();
    if props.show_published_date {
        if let Some(date) = &volume.info.published_date {
            meta.push_str(" · ");
            meta.push_str(date);
        }
    }

    ListItem::new(vec![
        Line::from(title_spans),
        Line::from(Span::styled(
            format_authors(&volume.info.authors),
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(meta, Style::default().fg(Color::DarkGray))),
        Line::from(""),
    ])
}

/// Render the full results area: count line, card list, load-more footer.
pub fn render_results(f: &mut Frame, area: Rect, props: &ResultsProps) {
    let footer_height = if load_more_text(props.is_loading, props.exhausted).is_some() {
        1
    } else {
        0
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(footer_height),
        ])
        .split(area);

    let count = Paragraph::new(count_text(props.items.len(), props.is_loading))
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(count, chunks[0]);

    let items: Vec<ListItem> = props
        .items
        .iter()
        .enumerate()
        .map(|(idx, volume)| card_item(volume, props.filter_matches.contains(&idx), props))
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::NONE))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    let mut list_state = ListState::default();
    list_state.select(props.selected);
    f.render_stateful_widget(list, chunks[1], &mut list_state);

    if let Some(text) = load_more_text(props.is_loading, props.exhausted) {
        let style = if props.is_loading {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Green)
        };
        let footer = Paragraph::new(text).style(style).alignment(Alignment::Center);
        f.render_widget(footer, chunks[2]);
    }
}
