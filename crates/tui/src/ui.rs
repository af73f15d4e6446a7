//! Rendering.

use bitsmuggler_core::{Session, ViewMode};
use ratatui::{
    layout::{Constraint, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::theme::Theme;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Frontend-only state drawn next to the session.
#[derive(Debug, Default)]
pub struct ViewState {
    pub input: String,
    pub spinner_frame: usize,
    pub theme: Theme,
}

impl ViewState {
    pub fn advance_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
    }
}

pub fn draw(frame: &mut Frame, session: &Session, view: &ViewState) {
    let [input_area, table_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(5),
        Constraint::Length(2),
    ])
    .areas(frame.area());

    let input = Paragraph::new(format!("> {}", view.input)).block(
        Block::bordered()
            .border_style(view.theme.border_style())
            .title(" Search (genre: rating: year: order:) "),
    );
    frame.render_widget(input, input_area);

    let block = Block::bordered()
        .border_style(view.theme.border_style())
        .title(session.page_header());

    if session.is_loading() {
        let spinner = Paragraph::new(Line::from(vec![
            Span::styled(
                SPINNER_FRAMES[view.spinner_frame % SPINNER_FRAMES.len()],
                Style::default().fg(view.theme.spinner),
            ),
            Span::raw(" searching movies"),
        ]))
        .block(block);
        frame.render_widget(spinner, table_area);
    } else {
        let table = match session.view_mode() {
            ViewMode::Results => results_table(session),
            ViewMode::Subtitles => subtitles_table(session),
        }
        .block(block)
        .row_highlight_style(view.theme.selection_style());

        let mut state = TableState::default().with_selected(Some(session.selected_index()));
        frame.render_stateful_widget(table, table_area, &mut state);
    }

    let mut lines = Vec::new();
    if !session.download_status().line.is_empty() {
        lines.push(Line::styled(
            session.download_status().line.clone(),
            Style::default().fg(view.theme.download),
        ));
    }
    if let Some(notice) = session.notice() {
        lines.push(Line::raw(notice.to_string()));
    }
    frame.render_widget(Paragraph::new(lines), status_area);
}

fn header(cells: &[&'static str]) -> Row<'static> {
    Row::new(cells.to_vec()).style(Style::default().add_modifier(Modifier::BOLD))
}

fn results_table(session: &Session) -> Table<'static> {
    let rows: Vec<Row> = session
        .items()
        .iter()
        .map(|item| {
            let spec = item.tech_spec();
            Row::new(vec![
                item.title.clone(),
                item.year.clone(),
                item.genre.clone(),
                item.rating.clone(),
                spec.resolution.clone(),
                spec.size.clone(),
                spec.duration.clone(),
                spec.language.clone(),
            ])
        })
        .collect();

    Table::new(
        rows,
        [
            Constraint::Fill(3),
            Constraint::Length(6),
            Constraint::Fill(2),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Fill(1),
        ],
    )
    .header(header(&[
        "Title", "Year", "Genre", "Rating", "Quality", "Size", "Duration", "Language",
    ]))
}

fn subtitles_table(session: &Session) -> Table<'static> {
    let rows: Vec<Row> = session
        .subtitles()
        .iter()
        .map(|sub| {
            Row::new(vec![
                sub.title.clone(),
                sub.upload_date.clone(),
                sub.download_count.to_string(),
            ])
        })
        .collect();

    Table::new(
        rows,
        [Constraint::Fill(1), Constraint::Length(12), Constraint::Length(10)],
    )
    .header(header(&["Subtitle", "Uploaded", "Downloads"]))
}
