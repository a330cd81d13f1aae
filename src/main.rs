use anyhow::Result;

mod app;
mod backend;
mod catalog;
mod chat;
mod config;
mod handler;
mod selector;
mod tui;
mod ui;

use app::App;
use config::Config;
use tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = Config::load().unwrap_or_else(|_| Config::new());

    // Env var wins over the config file
    if let Ok(url) = std::env::var("POWERUP_BACKEND_URL") {
        config.backend_url = Some(url);
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, config).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, config: Config) -> Result<()> {
    let mut app = App::new(&config);
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };

        let was_pending = app.chat.is_pending();
        handler::handle_event(&mut app, event)?;

        // Reap the in-flight exchange; when it lands, pin the chat to the
        // newest entry.
        app.chat.poll().await;
        if was_pending && !app.chat.is_pending() {
            app.scroll_chat_to_bottom();
        }
    }

    Ok(())
}
