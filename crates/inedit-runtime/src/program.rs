#![forbid(unsafe_code)]

//! Elm-style runtime for terminal applications.
//!
//! The program owns a [`Model`], feeds it messages converted from terminal
//! events and background task results, and redraws after every change. Side
//! effects are requested through [`Cmd`].
//!
//! # Example
//!
//! ```ignore
//! use inedit_core::event::Event;
//! use inedit_runtime::frame::Frame;
//! use inedit_runtime::program::{Cmd, Model};
//!
//! struct Counter {
//!     count: i32,
//! }
//!
//! enum Msg {
//!     Increment,
//!     Quit,
//!     Ignore,
//! }
//!
//! impl From<Event> for Msg {
//!     fn from(event: Event) -> Self {
//!         match event {
//!             Event::Key(k) if k.is_char('q') => Msg::Quit,
//!             Event::Key(k) if k.is_char('+') => Msg::Increment,
//!             _ => Msg::Ignore,
//!         }
//!     }
//! }
//!
//! impl Model for Counter {
//!     type Message = Msg;
//!
//!     fn update(&mut self, msg: Msg) -> Cmd<Msg> {
//!         match msg {
//!             Msg::Increment => { self.count += 1; Cmd::none() }
//!             Msg::Quit => Cmd::quit(),
//!             Msg::Ignore => Cmd::none(),
//!         }
//!     }
//!
//!     fn view(&self, frame: &mut Frame) {
//!         frame.print(0, 0, &self.count.to_string(), Default::default());
//!     }
//! }
//! ```

use std::io::{self, Stdout, Write};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossterm::style::{ContentStyle, PrintStyledContent, StyledContent};
use crossterm::{cursor, queue, terminal};
use inedit_core::event::Event;
use tracing::{debug, debug_span, info_span};

use crate::frame::Frame;
use crate::terminal::{SessionOptions, TerminalSession};

/// Application state and behavior.
pub trait Model: Sized {
    /// Message type. Terminal events convert into it.
    type Message: From<Event> + Send + 'static;

    /// Startup commands. Called once before the first frame.
    fn init(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    /// Apply a message and return follow-up commands.
    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message>;

    /// Draw the current state.
    fn view(&self, frame: &mut Frame);
}

/// Side effects requested by `init` and `update`.
#[derive(Default)]
pub enum Cmd<M> {
    /// No operation.
    #[default]
    None,
    /// Stop the program.
    Quit,
    /// Execute commands in order.
    Batch(Vec<Cmd<M>>),
    /// Send a message to the model immediately.
    Msg(M),
    /// Run a blocking closure on a background thread and send its result
    /// back as a message.
    Task(Box<dyn FnOnce() -> M + Send>),
    /// Deliver a message after the next frame has been presented.
    NextFrame(M),
    /// Emit a log line.
    ///
    /// The terminal is owned by the UI, so log lines go to `tracing` at info
    /// level under the `inedit.app` target.
    Log(String),
}

impl<M: std::fmt::Debug> std::fmt::Debug for Cmd<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Quit => write!(f, "Quit"),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::Msg(m) => f.debug_tuple("Msg").field(m).finish(),
            Self::Task(_) => write!(f, "Task"),
            Self::NextFrame(m) => f.debug_tuple("NextFrame").field(m).finish(),
            Self::Log(s) => f.debug_tuple("Log").field(s).finish(),
        }
    }
}

impl<M> Cmd<M> {
    /// No-op command.
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    /// Quit command.
    #[inline]
    pub fn quit() -> Self {
        Self::Quit
    }

    /// Message command.
    #[inline]
    pub fn msg(m: M) -> Self {
        Self::Msg(m)
    }

    /// Log command.
    #[inline]
    pub fn log(msg: impl Into<String>) -> Self {
        Self::Log(msg.into())
    }

    /// Message delivered after the next presented frame.
    #[inline]
    pub fn next_frame(m: M) -> Self {
        Self::NextFrame(m)
    }

    /// Batch of commands. Collapses empty and single-element batches.
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds
            .into_iter()
            .filter(|cmd| !matches!(cmd, Self::None))
            .collect();
        if cmds.len() > 1 {
            return Self::Batch(cmds);
        }
        cmds.pop().unwrap_or(Self::None)
    }

    /// Background task command.
    pub fn task<F>(f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Task(Box::new(f))
    }

    /// Stable name for tracing.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Quit => "Quit",
            Self::Batch(_) => "Batch",
            Self::Msg(_) => "Msg",
            Self::Task(_) => "Task",
            Self::NextFrame(_) => "NextFrame",
            Self::Log(_) => "Log",
        }
    }

    /// Whether this is [`Cmd::None`].
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct ProgramConfig {
    /// Use the alternate screen.
    pub alternate_screen: bool,
    /// Enable mouse capture.
    pub mouse: bool,
    /// Enable bracketed paste.
    pub bracketed_paste: bool,
    /// Enable focus reporting (focus lost blurs the editing field).
    pub focus_reporting: bool,
    /// Input poll timeout; bounds how long task results wait to be applied.
    pub poll_timeout: Duration,
    /// Render at this size instead of the terminal size.
    pub forced_size: Option<(u16, u16)>,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            alternate_screen: true,
            mouse: true,
            bracketed_paste: true,
            focus_reporting: true,
            poll_timeout: Duration::from_millis(50),
            forced_size: None,
        }
    }
}

impl ProgramConfig {
    /// Set the poll timeout.
    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Enable or disable mouse capture.
    #[must_use]
    pub fn with_mouse(mut self, enabled: bool) -> Self {
        self.mouse = enabled;
        self
    }

    /// Force a render size.
    #[must_use]
    pub fn with_forced_size(mut self, width: u16, height: u16) -> Self {
        self.forced_size = Some((width, height));
        self
    }

    fn session_options(&self) -> SessionOptions {
        SessionOptions {
            alternate_screen: self.alternate_screen,
            mouse_capture: self.mouse,
            bracketed_paste: self.bracketed_paste,
            focus_events: self.focus_reporting,
        }
    }
}

/// The program runtime.
pub struct Program<M: Model> {
    model: M,
    config: ProgramConfig,
    session: TerminalSession,
    stdout: Stdout,
    running: bool,
    dirty: bool,
    width: u16,
    height: u16,
    frame_idx: u64,
    /// Messages waiting for the next presented frame.
    after_present: Vec<M::Message>,
    task_sender: mpsc::Sender<M::Message>,
    task_receiver: mpsc::Receiver<M::Message>,
    task_handles: Vec<JoinHandle<()>>,
}

impl<M: Model> Program<M> {
    /// Take over the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal session cannot be set up.
    pub fn new(model: M, config: ProgramConfig) -> io::Result<Self> {
        let session = TerminalSession::new(config.session_options())?;
        let (width, height) = match config.forced_size {
            Some(size) => size,
            None => session.size()?,
        };
        let (task_sender, task_receiver) = mpsc::channel();
        Ok(Self {
            model,
            config,
            session,
            stdout: io::stdout(),
            running: true,
            dirty: true,
            width,
            height,
            frame_idx: 0,
            after_present: Vec::new(),
            task_sender,
            task_receiver,
            task_handles: Vec::new(),
        })
    }

    /// Run until the model quits.
    ///
    /// # Errors
    ///
    /// Terminal I/O errors end the loop and are returned.
    pub fn run(&mut self) -> io::Result<()> {
        let cmd = {
            let _span = info_span!("inedit.program.init").entered();
            self.model.init()
        };
        self.execute_cmd(cmd)?;
        self.render_frame()?;

        while self.running {
            if self.session.poll_event(self.config.poll_timeout)? {
                loop {
                    if let Some(event) = self.session.read_event()? {
                        self.handle_event(event)?;
                    }
                    if !self.running || !self.session.poll_event(Duration::ZERO)? {
                        break;
                    }
                }
            }

            self.process_task_results()?;
            self.reap_finished_tasks();

            if self.dirty && self.running {
                self.render_frame()?;
            }
        }

        self.reap_finished_tasks();
        if !self.task_handles.is_empty() {
            debug!(
                count = self.task_handles.len(),
                "exiting with background tasks still running"
            );
        }
        Ok(())
    }

    /// The model.
    pub fn model(&self) -> &M {
        &self.model
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        if let Event::Resize { width, height } = event
            && self.config.forced_size.is_none()
        {
            self.width = width;
            self.height = height;
            self.dirty = true;
        }
        self.update(M::Message::from(event), "event")
    }

    fn update(&mut self, msg: M::Message, source: &'static str) -> io::Result<()> {
        let cmd = {
            let _span = debug_span!(
                "inedit.program.update",
                msg_source = source,
                duration_us = tracing::field::Empty,
                cmd_type = tracing::field::Empty
            )
            .entered();
            let start = Instant::now();
            let cmd = self.model.update(msg);
            tracing::Span::current().record("duration_us", start.elapsed().as_micros() as u64);
            tracing::Span::current().record("cmd_type", cmd.type_name());
            cmd
        };
        self.dirty = true;
        self.execute_cmd(cmd)
    }

    fn process_task_results(&mut self) -> io::Result<()> {
        while let Ok(msg) = self.task_receiver.try_recv() {
            self.update(msg, "task")?;
        }
        Ok(())
    }

    fn execute_cmd(&mut self, cmd: Cmd<M::Message>) -> io::Result<()> {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => self.running = false,
            Cmd::Msg(m) => self.update(m, "cmd")?,
            Cmd::Batch(cmds) => {
                for c in cmds {
                    self.execute_cmd(c)?;
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Task(f) => {
                let sender = self.task_sender.clone();
                let handle = std::thread::spawn(move || {
                    let msg = f();
                    // The receiver is gone only after the program stopped.
                    let _ = sender.send(msg);
                });
                self.task_handles.push(handle);
            }
            Cmd::NextFrame(m) => {
                self.after_present.push(m);
                self.dirty = true;
            }
            Cmd::Log(text) => {
                tracing::info!(target: "inedit.app", "{}", text.trim_end());
            }
        }
        Ok(())
    }

    fn reap_finished_tasks(&mut self) {
        if self.task_handles.is_empty() {
            return;
        }
        let mut remaining = Vec::with_capacity(self.task_handles.len());
        for handle in self.task_handles.drain(..) {
            if handle.is_finished() {
                if let Err(payload) = handle.join() {
                    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                        (*s).to_owned()
                    } else if let Some(s) = payload.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "unknown panic payload".to_owned()
                    };
                    tracing::error!("background task panicked: {msg}");
                }
            } else {
                remaining.push(handle);
            }
        }
        self.task_handles = remaining;
    }

    fn render_frame(&mut self) -> io::Result<()> {
        self.frame_idx = self.frame_idx.wrapping_add(1);
        let _span = debug_span!("inedit.program.render", frame_idx = self.frame_idx).entered();

        let mut frame = Frame::new(self.width, self.height);
        self.model.view(&mut frame);
        present(&mut self.stdout, &frame)?;
        self.dirty = false;

        // The frame is on screen: release messages that waited for it.
        for msg in std::mem::take(&mut self.after_present) {
            self.update(msg, "next_frame")?;
        }
        Ok(())
    }
}

/// Write a whole frame to `out`.
fn present<W: Write>(out: &mut W, frame: &Frame) -> io::Result<()> {
    queue!(out, cursor::Hide, terminal::BeginSynchronizedUpdate)?;
    for y in 0..frame.height() {
        queue!(out, cursor::MoveTo(0, y))?;
        let mut run = String::new();
        let mut run_style: Option<ContentStyle> = None;
        for x in 0..frame.width() {
            let Some(cell) = frame.cell(x, y) else { break };
            if cell.is_continuation() {
                continue;
            }
            if run_style != Some(cell.style) {
                if let Some(style) = run_style {
                    queue!(out, PrintStyledContent(StyledContent::new(style, run.as_str())))?;
                }
                run.clear();
                run_style = Some(cell.style);
            }
            run.push_str(&cell.symbol);
        }
        if let Some(style) = run_style {
            queue!(out, PrintStyledContent(StyledContent::new(style, run.as_str())))?;
        }
    }
    if let Some((x, y)) = frame.cursor() {
        queue!(out, cursor::MoveTo(x, y), cursor::Show)?;
    }
    queue!(out, terminal::EndSynchronizedUpdate)?;
    out.flush()
}
