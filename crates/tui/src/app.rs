//! The terminal event loop.
//!
//! Key presses, background results and the spinner tick are multiplexed on
//! one task, which is the only place the session is mutated.

use std::time::Duration;

use anyhow::{Context, Result};
use bitsmuggler_core::{Command, Config, Session, SessionMessage, SessionRuntime};
use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::input::{map_key, KeyAction};
use crate::theme::Theme;
use crate::ui::{self, ViewState};

const TICK: Duration = Duration::from_millis(100);

pub struct App {
    session: Session,
    runtime: SessionRuntime,
    view: ViewState,
}

impl App {
    pub fn new(config: &Config, runtime: SessionRuntime) -> Self {
        Self {
            session: Session::new(config),
            runtime,
            view: ViewState {
                theme: Theme::from_config(&config.theme),
                ..ViewState::default()
            },
        }
    }

    fn dispatch(&mut self, command: Command) {
        for effect in self.session.handle(command) {
            debug!(?effect, "Executing effect");
            self.runtime.execute(effect);
        }
    }

    /// Returns `false` when the user asked to quit.
    fn on_key(&mut self, key: KeyEvent) -> bool {
        match map_key(key) {
            KeyAction::Quit => return false,
            KeyAction::Submit => self.dispatch(Command::Submit(self.view.input.clone())),
            KeyAction::Session(command) => self.dispatch(command),
            KeyAction::Insert(c) => self.view.input.push(c),
            KeyAction::Backspace => {
                self.view.input.pop();
            }
            KeyAction::Ignore => {}
        }
        true
    }

    fn on_message(&mut self, message: SessionMessage) {
        if !self.session.apply(message) {
            debug!("Ignored stale session message");
        }
    }
}

/// Run the UI until the user quits. The terminal must already be in raw mode.
pub async fn run(
    terminal: &mut DefaultTerminal,
    mut app: App,
    mut rx: mpsc::UnboundedReceiver<SessionMessage>,
    init_search: bool,
) -> Result<()> {
    let _forwarder = app.runtime.spawn_status_forwarder();
    app.runtime.startup(&mut app.session, init_search).await;

    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(TICK);

    loop {
        terminal
            .draw(|f| ui::draw(f, &app.session, &app.view))
            .context("Failed to draw frame")?;

        tokio::select! {
            Some(event) = events.next() => {
                match event.context("Failed to read terminal event")? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if !app.on_key(key) {
                            break;
                        }
                    }
                    _ => {}
                }
            }
            Some(message) = rx.recv() => app.on_message(message),
            _ = tick.tick() => {
                if app.session.is_loading() {
                    app.view.advance_spinner();
                }
            }
        }
    }

    info!("Quit requested");
    Ok(())
}
