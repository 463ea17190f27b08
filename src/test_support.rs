//! Fixtures shared by tests that talk to a catalog over HTTP.

use crate::catalog::CatalogClient;
use crate::config::ApiConfig;
use crate::ui::view::View;
use axum::Router;
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::time::Duration;

/// Serve `router` on an ephemeral port and return the API base URL
pub async fn serve(router: Router) -> String {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, router).await.unwrap();
  });
  format!("http://{}/api", addr)
}

pub fn catalog(base_url: String) -> CatalogClient {
  CatalogClient::new(&ApiConfig {
    base_url,
    timeout_secs: 5,
  })
  .unwrap()
}

/// Draw a view into an off-screen buffer and return its text, one line per row
pub fn render_view(view: &mut dyn View, width: u16, height: u16) -> String {
  let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
  terminal
    .draw(|frame| view.render(frame, frame.area()))
    .unwrap();

  let buffer = terminal.backend().buffer();
  let mut text = String::new();
  for y in 0..buffer.area.height {
    for x in 0..buffer.area.width {
      text.push_str(buffer[(x, y)].symbol());
    }
    text.push('\n');
  }
  text
}

/// Tick `view` until `done` holds, failing after a couple of seconds
pub async fn tick_until<V: View>(view: &mut V, done: impl Fn(&V) -> bool) {
  for _ in 0..200 {
    view.tick();
    if done(&*view) {
      return;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  panic!("view never reached the expected state");
}
