use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::query::QueryClient;
use crate::route::Route;
use crate::ui;
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{AlbumDetailView, AlbumListView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{self, stdout};
use std::time::Duration;

const TICK_RATE: Duration = Duration::from_millis(250);

/// Main application state
pub struct App {
  /// Navigation stack - the album listing is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Shared query cache; outlives the views that read from it
  queries: QueryClient,

  api_url: String,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  /// Build the view stack for `route`. Must be called inside the runtime,
  /// since mounting a page starts its fetch.
  pub fn new(config: &Config, route: Route) -> Result<Self> {
    let catalog = CatalogClient::new(&config.api)?;
    let queries = QueryClient::new(config.queries.query_options());

    let mut view_stack: Vec<Box<dyn View>> = vec![Box::new(AlbumListView::new(
      catalog.clone(),
      queries.clone(),
    ))];
    if let Route::Album(id) = route {
      view_stack.push(Box::new(AlbumDetailView::new(id, catalog, queries.clone())));
    }

    tracing::info!(%route, api = %config.api.base_url, "starting");

    Ok(Self {
      view_stack,
      queries,
      api_url: config.api.base_url.clone(),
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enter_terminal(
      enable_raw_mode,
      || stdout().execute(EnterAlternateScreen).map(|_| ()),
      disable_raw_mode,
    )?;

    let result = self.main_loop().await;

    // Restore the terminal even if the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn main_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Resize => {}
      Event::Tick => self.tick(),
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::Pop,
    };
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => {
        tracing::debug!(route = %view.route(), "navigate");
        self.view_stack.push(view);
      }
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
          if let Some(view) = self.view_stack.last_mut() {
            // Remounting the previous page revalidates it if stale
            view.tick();
          }
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn tick(&mut self) {
    if let Some(view) = self.view_stack.last_mut() {
      view.tick();
    }
    let evicted = self.queries.collect_garbage();
    if evicted > 0 {
      tracing::debug!(evicted, "collected unused queries");
    }
  }

  // Accessors for UI rendering
  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn api_url(&self) -> &str {
    &self.api_url
  }

  pub fn view_breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect()
  }
}

/// Run both terminal setup steps. If the second fails, the first is undone
/// so the shell is not left in raw mode.
fn enter_terminal(
  raw_mode: impl FnOnce() -> io::Result<()>,
  alternate_screen: impl FnOnce() -> io::Result<()>,
  undo_raw_mode: impl FnOnce() -> io::Result<()>,
) -> io::Result<()> {
  raw_mode()?;
  if let Err(e) = alternate_screen() {
    if let Err(restore) = undo_raw_mode() {
      tracing::warn!(error = %restore, "failed to leave raw mode");
    }
    return Err(e);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ApiConfig;

  fn config() -> Config {
    Config {
      api: ApiConfig {
        base_url: "http://127.0.0.1:9/api".to_string(),
        timeout_secs: 1,
      },
      ..Config::default()
    }
  }

  fn route(app: &App) -> Option<Route> {
    app.view_stack.last().map(|v| v.route())
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::from(code)
  }

  #[test]
  fn test_raw_mode_undone_when_alternate_screen_fails() {
    let undone = std::cell::Cell::new(false);
    let result = enter_terminal(
      || Ok(()),
      || Err(io::Error::new(io::ErrorKind::Other, "no tty")),
      || {
        undone.set(true);
        Ok(())
      },
    );

    assert!(result.is_err());
    assert!(undone.get());
  }

  #[test]
  fn test_raw_mode_kept_when_setup_succeeds() {
    let undone = std::cell::Cell::new(false);
    let result = enter_terminal(
      || Ok(()),
      || Ok(()),
      || {
        undone.set(true);
        Ok(())
      },
    );

    assert!(result.is_ok());
    assert!(!undone.get());
  }

  #[tokio::test]
  async fn test_starts_on_listing() {
    let app = App::new(&config(), Route::Albums).unwrap();
    assert_eq!(route(&app), Some(Route::Albums));
    assert_eq!(app.view_breadcrumb(), vec!["Albums".to_string()]);
  }

  #[tokio::test]
  async fn test_detail_route_keeps_listing_below() {
    let mut app = App::new(&config(), Route::Album(5)).unwrap();
    assert_eq!(route(&app), Some(Route::Album(5)));
    assert_eq!(app.view_breadcrumb(), vec!["Albums", "Album 5"]);

    app.handle_key(key(KeyCode::Char('q')));
    assert_eq!(route(&app), Some(Route::Albums));
    assert!(!app.should_quit);

    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_ctrl_c_quits_from_any_page() {
    let mut app = App::new(&config(), Route::Album(5)).unwrap();
    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_listing_cached_while_detail_open() {
    let mut app = App::new(&config(), Route::Album(5)).unwrap();
    app.tick();
    // Both pages stay subscribed, so neither entry is collectable
    assert_eq!(app.queries.collect_garbage(), 0);
    assert_eq!(app.queries.len(), 2);
  }
}
