use crate::catalog::types::Album;
use crate::catalog::CatalogClient;
use crate::query::{Query, QueryClient, QueryKey, QueryState};
use crate::route::Route;
use crate::ui::ensure_valid_table_selection;
use crate::ui::format::{format_count, format_price, playtime_label};
use crate::ui::model::{detail_view, track_rows, PageView, Populated};
use crate::ui::renderfns::format_color;
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};

/// Detail page: one album's metadata and tracklist
pub struct AlbumDetailView {
  id: u64,
  queries: QueryClient,
  query: Query<Album>,
  state: QueryState<Album>,
  table_state: TableState,
}

impl AlbumDetailView {
  pub fn new(id: u64, catalog: CatalogClient, queries: QueryClient) -> Self {
    let query = Query::new(&queries, QueryKey::album(id), move || {
      let catalog = catalog.clone();
      async move { catalog.album(id).await }
    });

    let state = query.state();

    Self {
      id,
      queries,
      query,
      state,
      table_state: TableState::default(),
    }
  }
}

fn block(title: String) -> Block<'static> {
  Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue))
}

fn label(name: &str) -> Span<'static> {
  Span::styled(format!("{:<16}", name), Style::default().fg(Color::DarkGray))
}

fn album_info(album: &Album) -> Vec<Line<'static>> {
  let year = match (album.release_year, album.release_date) {
    (Some(year), Some(date)) => format!("{} ({})", year, date.format("%-d %B %Y")),
    (Some(year), None) => year.to_string(),
    (None, Some(date)) => date.format("%-d %B %Y").to_string(),
    (None, None) => "Unknown".to_string(),
  };
  let format = album
    .format
    .as_ref()
    .map(|f| format!("{} ({})", f.code(), f.label()))
    .unwrap_or_else(|| "Unknown".to_string());
  let price = album
    .price
    .as_deref()
    .map(format_price)
    .unwrap_or_else(|| "Unknown".to_string());

  vec![
    Line::from(Span::styled(
      album.title.clone(),
      Style::default().fg(Color::White).bold(),
    )),
    Line::from(vec![
      Span::styled("by ", Style::default().fg(Color::DarkGray)),
      Span::styled(album.artist.clone(), Style::default().fg(Color::Cyan)),
    ]),
    Line::from(""),
    Line::from(vec![label("Release Year:"), Span::raw(year)]),
    Line::from(vec![
      label("Format:"),
      Span::styled(format, Style::default().fg(format_color(album.format.as_ref()))),
    ]),
    Line::from(vec![label("Price:"), Span::raw(price)]),
    Line::from(vec![
      label("Total Playtime:"),
      Span::raw(playtime_label(album.total_playtime)),
    ]),
    Line::from(vec![
      label("Tracks:"),
      Span::raw(format_count(album.tracklist.len(), "track")),
    ]),
    Line::from(vec![
      label("Cover:"),
      Span::raw(album.cover().unwrap_or("none").to_string()),
    ]),
  ]
}

fn draw_album(
  frame: &mut Frame,
  area: Rect,
  page: Populated<'_, Album>,
  table_state: &mut TableState,
) {
  let album = page.data;
  let title = match (page.refreshing, page.stale_error) {
    (true, _) => format!(" {} (refreshing...) ", album.title),
    (false, Some(e)) => format!(" {} (refresh failed: {}) ", album.title, e),
    (false, None) => format!(" {} ", album.title),
  };

  let outer = block(title);
  let inner = outer.inner(area);
  frame.render_widget(outer, area);

  let info = album_info(album);
  let description_height = if album.description.is_some() { 5 } else { 0 };
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(info.len() as u16 + 1), // Metadata
      Constraint::Length(description_height),    // Description
      Constraint::Min(3),                        // Tracklist
    ])
    .split(inner);

  frame.render_widget(Paragraph::new(info), chunks[0]);

  if let Some(description) = &album.description {
    let paragraph = Paragraph::new(description.as_str())
      .wrap(Wrap { trim: true })
      .block(
        Block::default()
          .title(" Description ")
          .borders(Borders::TOP)
          .border_style(Style::default().fg(Color::DarkGray)),
      );
    frame.render_widget(paragraph, chunks[1]);
  }

  let rows = track_rows(&album.tracklist);
  let tracklist_block = Block::default()
    .title(" Tracklist ")
    .borders(Borders::TOP)
    .border_style(Style::default().fg(Color::DarkGray));

  if rows.is_empty() {
    let notice = Paragraph::new(vec![
      Line::from("No tracks available".bold()),
      Line::from("This album doesn't have any tracks listed yet."),
    ])
    .alignment(Alignment::Center)
    .style(Style::default().fg(Color::DarkGray))
    .block(tracklist_block);
    frame.render_widget(notice, chunks[2]);
    return;
  }

  ensure_valid_table_selection(table_state, rows.len());

  let table_rows: Vec<Row> = rows
    .into_iter()
    .map(|row| {
      Row::new(vec![
        Cell::from(Span::styled(
          format!("{:>3}", row.number),
          Style::default().fg(Color::Yellow),
        )),
        Cell::from(row.title),
        Cell::from(Span::styled(row.duration, Style::default().fg(Color::Cyan))),
      ])
    })
    .collect();

  let table = Table::new(
    table_rows,
    [
      Constraint::Length(4),
      Constraint::Min(20),
      Constraint::Length(8),
    ],
  )
  .header(
    Row::new(vec!["#", "Track Title", "Duration"])
      .style(Style::default().fg(Color::DarkGray).bold()),
  )
  .block(tracklist_block)
  .row_highlight_style(Style::default().bg(Color::DarkGray));

  frame.render_stateful_widget(table, chunks[2], table_state);
}

impl View for AlbumDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.table_state.select_next();
        ViewAction::None
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.table_state.select_previous();
        ViewAction::None
      }
      KeyCode::Char('r') => {
        self.state = self.query.refetch();
        // Listing rows are derived from the same albums
        self.queries.invalidate(&QueryKey::albums());
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Char('h') | KeyCode::Esc | KeyCode::Backspace => {
        ViewAction::Pop
      }
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    match detail_view(&self.state) {
      PageView::Populated(page) => draw_album(frame, area, page, &mut self.table_state),
      PageView::Error { message, recovery } => {
        let paragraph = Paragraph::new(vec![
          Line::from(""),
          Line::from("Oops! Album Not Found.".bold()),
          Line::from(
            "We couldn't load the album you're looking for. It might have been moved or deleted.",
          ),
          Line::from(""),
          Line::from(Span::styled(message, Style::default().italic())),
          Line::from(""),
          Line::from(recovery.hint()),
        ])
        .block(block(format!(" Album {} (error) ", self.id)))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Red));
        frame.render_widget(paragraph, area);
      }
      // An album is never empty
      PageView::Loading | PageView::Empty => {
        let paragraph = Paragraph::new(vec![Line::from(""), Line::from("Loading album details...")])
          .block(block(format!(" Album {} (loading...) ", self.id)))
          .alignment(Alignment::Center)
          .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
      }
    }
  }

  fn breadcrumb_label(&self) -> String {
    match self.state.data() {
      Some(album) => album.title.clone(),
      None => format!("Album {}", self.id),
    }
  }

  fn route(&self) -> Route {
    Route::Album(self.id)
  }

  fn tick(&mut self) {
    self.state = self.query.state();
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("j/k", "tracks"),
      Shortcut::new("r", "refresh"),
      Shortcut::new("q", "all albums"),
    ]
  }
}
