pub mod config;
pub mod generator;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    sync::mpsc::{Receiver, Sender},
    time::Duration,
};

use config::{Config, ConfigStore, FileConfigStore};
use generator::TextGenerator;
use runtime::{spawn_input_listener, Event, TickTimer};
use session::{KeyInput, Session, SessionEvent, SessionState};

/// terminal typing speed test
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing speed test: type randomly generated words, watch live wpm, and get accuracy and mistake counts at the end."
)]
pub struct Cli {
    /// number of words to use in the test (overrides the saved config)
    #[clap(short = 'w', long)]
    number_of_words: Option<usize>,

    /// live stats refresh interval in milliseconds
    #[clap(short = 't', long)]
    tick_rate_ms: Option<u64>,
}

#[derive(Debug)]
pub struct App {
    pub session: Session,
    pub menu_input: String,
    pub menu_error: Option<String>,
    pub tick_rate: Duration,
}

impl App {
    pub fn new(number_of_words: usize, tick_rate: Duration) -> Self {
        Self {
            session: Session::new(TextGenerator::default()),
            menu_input: number_of_words.to_string(),
            menu_error: None,
            tick_rate,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let saved = store.load();
    let number_of_words = cli.number_of_words.unwrap_or(saved.number_of_words);
    let tick_rate = Duration::from_millis(cli.tick_rate_ms.unwrap_or(saved.tick_rate_ms));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(number_of_words, tick_rate);
    let result = start_tui(&mut terminal, &mut app, &store);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &dyn ConfigStore,
) -> Result<(), Box<dyn Error>> {
    let (tx, rx) = std::sync::mpsc::channel();
    spawn_input_listener(tx.clone());
    run_event_loop(terminal, app, store, tx, rx)
}

fn run_event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &dyn ConfigStore,
    tx: Sender<Event>,
    rx: Receiver<Event>,
) -> Result<(), Box<dyn Error>> {
    // The tick timer exists only while a session is running; it is taken
    // out and cancelled exactly once on every exit from Running.
    let mut timer: Option<TickTimer> = None;

    loop {
        terminal.draw(|f| ui(app, f))?;

        match rx.recv()? {
            Event::Tick | Event::Resize => {
                // Redraw happens at the top of the loop; ticks only arrive
                // while a session is running and keep live wpm fresh.
            }
            Event::Key(key) => {
                if is_quit_combo(&key) {
                    stop_timer(&mut timer);
                    break;
                }

                match app.session.state() {
                    SessionState::Idle => {
                        if !handle_menu_key(app, &key, store, &tx, &mut timer) {
                            break;
                        }
                    }
                    SessionState::Running => match key.code {
                        KeyCode::Esc => {
                            // end() forces the final snapshot; timer goes first
                            stop_timer(&mut timer);
                            app.session.end();
                        }
                        _ => {
                            let event = app.session.apply_keystroke(KeyInput::from(&key));
                            if event == Some(SessionEvent::Finished) {
                                stop_timer(&mut timer);
                            }
                        }
                    },
                    SessionState::Finished => match key.code {
                        KeyCode::Esc => break,
                        KeyCode::Char('r') => {
                            app.session.restart();
                        }
                        _ => {}
                    },
                }
            }
        }
    }

    Ok(())
}

/// Returns false when the app should exit.
fn handle_menu_key(
    app: &mut App,
    key: &KeyEvent,
    store: &dyn ConfigStore,
    tx: &Sender<Event>,
    timer: &mut Option<TickTimer>,
) -> bool {
    match key.code {
        KeyCode::Esc => return false,
        KeyCode::Enter => match app.menu_input.parse::<usize>() {
            Ok(count) => match app.session.start(count) {
                Ok(_) => {
                    app.menu_error = None;
                    let _ = store.save(&Config {
                        number_of_words: count,
                        tick_rate_ms: app.tick_rate.as_millis() as u64,
                    });
                    *timer = Some(TickTimer::start(tx.clone(), app.tick_rate));
                }
                Err(e) => app.menu_error = Some(e.to_string()),
            },
            Err(_) => {
                app.menu_error = Some("enter a whole number greater than zero".to_string());
            }
        },
        KeyCode::Backspace => {
            app.menu_input.pop();
        }
        KeyCode::Char(c) if c.is_ascii_digit() => {
            app.menu_input.push(c);
        }
        _ => {}
    }
    true
}

fn is_quit_combo(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

fn stop_timer(timer: &mut Option<TickTimer>) {
    if let Some(t) = timer.take() {
        t.cancel();
    }
}

fn ui(app: &mut App, f: &mut Frame) {
    f.render_widget(&*app, f.area());
}
