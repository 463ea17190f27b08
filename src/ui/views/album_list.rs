use crate::catalog::types::AlbumSummary;
use crate::catalog::CatalogClient;
use crate::query::{into_loader, Query, QueryClient, QueryKey, QueryState};
use crate::route::Route;
use crate::ui::ensure_valid_selection;
use crate::ui::format::{format_count, format_total_playtime};
use crate::ui::model::{listing_view, PageView, Populated};
use crate::ui::renderfns::{format_color, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::AlbumDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

/// Listing page: every album in the catalog
pub struct AlbumListView {
  catalog: CatalogClient,
  queries: QueryClient,
  query: Query<Vec<AlbumSummary>>,
  state: QueryState<Vec<AlbumSummary>>,
  list_state: ListState,
  /// Album whose details were last prefetched
  prefetched: Option<u64>,
}

impl AlbumListView {
  pub fn new(catalog: CatalogClient, queries: QueryClient) -> Self {
    let catalog_for_query = catalog.clone();
    let query = Query::new(&queries, QueryKey::albums(), move || {
      let catalog = catalog_for_query.clone();
      async move { catalog.albums().await }
    });

    // Mounting reads the cache and starts a fetch if needed
    let state = query.state();

    Self {
      catalog,
      queries,
      query,
      state,
      list_state: ListState::default(),
      prefetched: None,
    }
  }

  fn albums(&self) -> &[AlbumSummary] {
    self.state.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn open_selected(&self) -> ViewAction {
    let selected = self
      .list_state
      .selected()
      .and_then(|idx| self.albums().get(idx));
    match selected {
      Some(album) => ViewAction::Push(Box::new(AlbumDetailView::new(
        album.id,
        self.catalog.clone(),
        self.queries.clone(),
      ))),
      None => ViewAction::None,
    }
  }

  /// Warm the cache with the selected album's details.
  ///
  /// Ticks only arrive once input goes quiet, so scrolling through the list
  /// does not fetch every album it passes.
  fn prefetch_selected(&mut self) {
    let selected = self
      .list_state
      .selected()
      .and_then(|idx| self.albums().get(idx))
      .map(|album| album.id);
    let Some(id) = selected else {
      return;
    };
    if self.prefetched == Some(id) {
      return;
    }
    self.prefetched = Some(id);

    let catalog = self.catalog.clone();
    let loader = into_loader(move || {
      let catalog = catalog.clone();
      async move { catalog.album(id).await }
    });
    let queries = self.queries.clone();
    let options = queries.default_options();
    tokio::spawn(async move {
      if let Err(error) = queries.fetch(&QueryKey::album(id), &loader, &options).await {
        tracing::debug!(id, %error, "prefetch failed");
      }
    });
  }
}

fn block(title: String) -> Block<'static> {
  Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue))
}

fn draw_notice(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>, color: Color) {
  let paragraph = Paragraph::new(lines)
    .block(block(format!(" {} ", title)))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .style(Style::default().fg(color));
  frame.render_widget(paragraph, area);
}

fn album_item(album: &AlbumSummary) -> ListItem<'static> {
  let year = album
    .release_year
    .map(|y| y.to_string())
    .unwrap_or_else(|| "----".to_string());
  let format = album.format.as_ref().map(|f| f.code()).unwrap_or_default();
  let playtime = album
    .total_playtime
    .filter(|t| *t > 0.0)
    .map(|t| format_total_playtime(Some(t)))
    .unwrap_or_default();

  let mut lines = vec![Line::from(vec![
    Span::styled(format!("{:<40}", truncate(&album.title, 40)), Style::default().bold()),
    Span::raw(" "),
    Span::styled(
      format!("{:<28}", truncate(&album.artist, 28)),
      Style::default().fg(Color::Cyan),
    ),
    Span::raw(" "),
    Span::styled(year, Style::default().fg(Color::Yellow)),
    Span::raw(" "),
    Span::styled(
      format!("{:<4}", format),
      Style::default().fg(format_color(album.format.as_ref())),
    ),
    Span::raw(" "),
    Span::styled(playtime, Style::default().fg(Color::DarkGray)),
  ])];

  if let Some(description) = &album.short_description {
    lines.push(Line::from(Span::styled(
      format!("  {}", truncate(description, 100)),
      Style::default().fg(Color::DarkGray),
    )));
  }

  ListItem::new(lines)
}

fn draw_albums(
  frame: &mut Frame,
  area: Rect,
  page: Populated<'_, Vec<AlbumSummary>>,
  list_state: &mut ListState,
) {
  ensure_valid_selection(list_state, page.data.len());

  let count = format_count(page.data.len(), "album");
  let title = match (page.refreshing, page.stale_error) {
    (true, _) => format!(" Albums ({}, refreshing...) ", count),
    (false, Some(e)) => format!(" Albums ({}, refresh failed: {}) ", count, e),
    (false, None) => format!(" Albums ({}) ", count),
  };

  let items: Vec<ListItem> = page.data.iter().map(album_item).collect();
  let list = List::new(items)
    .block(block(title))
    .highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  frame.render_stateful_widget(list, area, list_state);
}

impl View for AlbumListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
      }
      KeyCode::Char('r') => {
        self.state = self.query.refetch();
      }
      KeyCode::Enter | KeyCode::Char('l') => return self.open_selected(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    match listing_view(&self.state) {
      PageView::Loading => draw_notice(
        frame,
        area,
        "Albums (loading...)",
        vec![Line::from(""), Line::from("Loading albums...")],
        Color::DarkGray,
      ),
      PageView::Error { message, recovery } => draw_notice(
        frame,
        area,
        "Albums (error)",
        vec![
          Line::from(""),
          Line::from("Oops! Something went wrong.".bold()),
          Line::from("We couldn't load the music catalog. It might be a temporary issue."),
          Line::from(""),
          Line::from(Span::styled(message, Style::default().italic())),
          Line::from(""),
          Line::from(recovery.hint()),
        ],
        Color::Red,
      ),
      PageView::Empty => draw_notice(
        frame,
        area,
        "Albums (0)",
        vec![
          Line::from(""),
          Line::from("No albums yet".bold()),
          Line::from("There are no albums in the catalog yet. Check back soon!"),
        ],
        Color::DarkGray,
      ),
      PageView::Populated(page) => draw_albums(frame, area, page, &mut self.list_state),
    }
  }

  fn breadcrumb_label(&self) -> String {
    "Albums".to_string()
  }

  fn route(&self) -> Route {
    Route::Albums
  }

  fn tick(&mut self) {
    self.state = self.query.state();
    self.prefetch_selected();
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("enter", "details"),
      Shortcut::new("r", "reload"),
      Shortcut::new("q", "quit"),
    ]
  }
}
