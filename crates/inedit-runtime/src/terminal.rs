#![forbid(unsafe_code)]

//! Terminal session for the field host.
//!
//! [`TerminalSession`] holds raw mode plus the [`SessionOptions`] modes the
//! program asked for, kept as a stack and popped in reverse when the session
//! drops. Two other exits restore the terminal: a panic nothing recovers
//! (panic hook) and SIGINT/SIGTERM (signal thread, unix only).
//!
//! Panics raised by a field's update function are not fatal. The commit
//! pipeline catches them inside an [`inedit_core::recovery`] scope; the hook
//! logs those and leaves the screen, and the default hook, alone.

use std::io::{self, Write};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crossterm::{cursor, event as ct, execute, terminal};
use inedit_core::event::Event;
use inedit_core::recovery;

#[cfg(unix)]
use signal_hook::consts::signal::{SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

/// Which terminal modes a session enables. All default to `false`.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Switch to the alternate screen buffer.
    pub alternate_screen: bool,
    /// Report mouse presses, drags and scrolls.
    pub mouse_capture: bool,
    /// Deliver pastes as a single paste event.
    pub bracketed_paste: bool,
    /// Report terminal focus gained and lost.
    pub focus_events: bool,
}

/// An optional terminal mode, in the order sessions enable them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    AlternateScreen,
    MouseCapture,
    BracketedPaste,
    FocusChange,
}

impl Mode {
    const ALL: [Mode; 4] = [
        Mode::AlternateScreen,
        Mode::MouseCapture,
        Mode::BracketedPaste,
        Mode::FocusChange,
    ];

    fn requested(options: &SessionOptions) -> impl Iterator<Item = Mode> + '_ {
        Self::ALL.into_iter().filter(|mode| match mode {
            Mode::AlternateScreen => options.alternate_screen,
            Mode::MouseCapture => options.mouse_capture,
            Mode::BracketedPaste => options.bracketed_paste,
            Mode::FocusChange => options.focus_events,
        })
    }

    fn enable(self, out: &mut impl Write) -> io::Result<()> {
        match self {
            Mode::AlternateScreen => execute!(out, terminal::EnterAlternateScreen),
            Mode::MouseCapture => execute!(out, ct::EnableMouseCapture),
            Mode::BracketedPaste => execute!(out, ct::EnableBracketedPaste),
            Mode::FocusChange => execute!(out, ct::EnableFocusChange),
        }
    }

    fn disable(self, out: &mut impl Write) -> io::Result<()> {
        match self {
            Mode::AlternateScreen => execute!(out, terminal::LeaveAlternateScreen),
            Mode::MouseCapture => execute!(out, ct::DisableMouseCapture),
            Mode::BracketedPaste => execute!(out, ct::DisableBracketedPaste),
            Mode::FocusChange => execute!(out, ct::DisableFocusChange),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Mode::AlternateScreen => "alternate screen",
            Mode::MouseCapture => "mouse capture",
            Mode::BracketedPaste => "bracketed paste",
            Mode::FocusChange => "focus events",
        }
    }
}

/// Owns raw mode and the enabled modes until dropped.
///
/// Only one session should exist at a time.
#[derive(Debug)]
pub struct TerminalSession {
    enabled: Vec<Mode>,
    #[cfg(unix)]
    signals: Option<SignalWatch>,
}

impl TerminalSession {
    /// Enter raw mode and enable the requested modes.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode or any requested mode cannot be enabled.
    /// Whatever was enabled before the failure is undone when the partial
    /// session drops.
    pub fn new(options: SessionOptions) -> io::Result<Self> {
        install_panic_hook();

        terminal::enable_raw_mode()?;
        tracing::info!("terminal raw mode enabled");

        let mut session = Self {
            enabled: Vec::with_capacity(Mode::ALL.len()),
            #[cfg(unix)]
            signals: None,
        };
        #[cfg(unix)]
        {
            session.signals = Some(SignalWatch::spawn()?);
        }

        let mut stdout = io::stdout();
        for mode in Mode::requested(&options) {
            mode.enable(&mut stdout)?;
            session.enabled.push(mode);
            tracing::info!(mode = mode.name(), "terminal mode enabled");
        }
        Ok(session)
    }

    /// Current terminal size (columns, rows).
    pub fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    /// Wait up to `timeout` for an event. `Ok(true)` if one is ready.
    pub fn poll_event(&self, timeout: Duration) -> io::Result<bool> {
        ct::poll(timeout)
    }

    /// Read the next event, blocking until one is available.
    ///
    /// Returns `Ok(None)` for events the controller has no use for.
    pub fn read_event(&self) -> io::Result<Option<Event>> {
        Ok(Event::from_crossterm(ct::read()?))
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        #[cfg(unix)]
        drop(self.signals.take());

        let mut stdout = io::stdout();
        let _ = execute!(stdout, cursor::Show);
        while let Some(mode) = self.enabled.pop() {
            let _ = mode.disable(&mut stdout);
            tracing::info!(mode = mode.name(), "terminal mode disabled");
        }
        let _ = terminal::disable_raw_mode();
        tracing::info!("terminal raw mode disabled");
        let _ = stdout.flush();
    }
}

static PANIC_RESTORES: AtomicUsize = AtomicUsize::new(0);

/// Install the terminal-restoring panic hook, once per process.
///
/// Sessions install it themselves. The hook chains to whatever hook was set
/// before, except for panics raised inside a recovery scope, which are only
/// logged.
pub fn install_panic_hook() {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if recovery::is_active() {
                tracing::warn!(
                    target: "inedit.field",
                    panic = %info,
                    "update function panicked"
                );
                return;
            }
            restore_all();
            PANIC_RESTORES.fetch_add(1, Ordering::Relaxed);
            previous(info);
        }));
    });
}

/// How many times the panic hook has restored the terminal in this process.
pub fn panic_restores() -> usize {
    PANIC_RESTORES.load(Ordering::Relaxed)
}

// Used where the session's own bookkeeping is out of reach.
fn restore_all() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::Show);
    for mode in Mode::ALL.into_iter().rev() {
        let _ = mode.disable(&mut stdout);
    }
    let _ = terminal::disable_raw_mode();
    let _ = stdout.flush();
}

/// Restores the terminal and exits on SIGINT/SIGTERM while a session lives.
#[cfg(unix)]
#[derive(Debug)]
struct SignalWatch {
    handle: signal_hook::iterator::Handle,
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl SignalWatch {
    fn spawn() -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = std::thread::Builder::new()
            .name("inedit-signals".into())
            .spawn(move || {
                // Ends without a signal once the handle is closed.
                if let Some(signal) = signals.forever().next() {
                    tracing::warn!(signal, "termination signal, restoring terminal");
                    restore_all();
                    std::process::exit(128 + signal);
                }
            })?;
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

#[cfg(unix)]
impl Drop for SignalWatch {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
