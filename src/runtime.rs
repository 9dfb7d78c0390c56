use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the app loop
#[derive(Clone, Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Forwards terminal input into the app channel from a background thread.
/// The thread exits once the receiving side is dropped.
pub fn spawn_input_listener(tx: Sender<Event>) {
    thread::spawn(move || loop {
        match event::read() {
            Ok(CtEvent::Key(key)) => {
                if tx.send(Event::Key(key)).is_err() {
                    break;
                }
            }
            Ok(CtEvent::Resize(_, _)) => {
                if tx.send(Event::Resize).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(_) => break,
        }
    });
}

/// Recurring tick that refreshes live stats while a session is running.
///
/// The app owns at most one of these at a time: it is started on entering
/// a running session and cancelled on every exit transition (finish, end,
/// restart). `cancel` takes effect synchronously; ticks already queued in
/// the channel may still be drained by the loop but no new ones are sent
/// after the flag clears.
#[derive(Debug)]
pub struct TickTimer {
    active: Arc<AtomicBool>,
}

impl TickTimer {
    pub fn start(tx: Sender<Event>, interval: Duration) -> Self {
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);

        thread::spawn(move || {
            while flag.load(Ordering::SeqCst) {
                thread::sleep(interval);
                if !flag.load(Ordering::SeqCst) {
                    break;
                }
                if tx.send(Event::Tick).is_err() {
                    break;
                }
            }
        });

        Self { active }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

impl Drop for TickTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
