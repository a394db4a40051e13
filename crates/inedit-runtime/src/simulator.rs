#![forbid(unsafe_code)]

//! Deterministic program simulator for testing.
//!
//! `ProgramSimulator` runs a [`Model`] without a terminal. Events and
//! messages are injected directly, frames are captured on demand and
//! `Cmd::NextFrame` messages are released each time a frame is captured, the
//! same way the real program releases them after presenting.
//!
//! Background tasks either run inline as soon as they are issued
//! ([`TaskMode::Inline`]) or are held until the test releases them
//! ([`TaskMode::Deferred`]), which makes "result arrives later" scenarios
//! reproducible.
//!
//! # Example
//!
//! ```ignore
//! use inedit_runtime::simulator::{ProgramSimulator, TaskMode};
//!
//! let mut sim = ProgramSimulator::new(app).with_task_mode(TaskMode::Deferred);
//! sim.init();
//! sim.send(Msg::Save);
//! assert_eq!(sim.pending_task_count(), 1);
//! sim.run_pending_tasks();
//! ```

use std::collections::VecDeque;

use inedit_core::event::Event;

use crate::frame::Frame;
use crate::program::{Cmd, Model};

/// Record of a command executed during simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmdRecord {
    /// No-op command.
    None,
    /// Quit command.
    Quit,
    /// Message sent to the model.
    Msg,
    /// Batch of commands.
    Batch(usize),
    /// Background task issued.
    Task,
    /// Message queued for after the next frame.
    NextFrame,
    /// Log line emitted.
    Log(String),
}

/// How the simulator runs `Cmd::Task` closures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskMode {
    /// Run immediately and deliver the result before returning.
    #[default]
    Inline,
    /// Queue until [`ProgramSimulator::run_pending_tasks`] or
    /// [`ProgramSimulator::run_next_task`].
    Deferred,
}

type PendingTask<M> = Box<dyn FnOnce() -> M + Send>;

/// Deterministic simulator for [`Model`] testing.
pub struct ProgramSimulator<M: Model> {
    model: M,
    frames: Vec<Frame>,
    command_log: Vec<CmdRecord>,
    running: bool,
    logs: Vec<String>,
    task_mode: TaskMode,
    pending_tasks: VecDeque<PendingTask<M::Message>>,
    after_present: Vec<M::Message>,
}

impl<M: Model> ProgramSimulator<M> {
    /// Wrap `model`. Call [`init`](Self::init) before injecting anything.
    pub fn new(model: M) -> Self {
        Self {
            model,
            frames: Vec::new(),
            command_log: Vec::new(),
            running: true,
            logs: Vec::new(),
            task_mode: TaskMode::Inline,
            pending_tasks: VecDeque::new(),
            after_present: Vec::new(),
        }
    }

    /// Choose how tasks run.
    #[must_use]
    pub fn with_task_mode(mut self, mode: TaskMode) -> Self {
        self.task_mode = mode;
        self
    }

    /// Call `Model::init` and execute the returned commands.
    pub fn init(&mut self) {
        let cmd = self.model.init();
        self.execute_cmd(cmd);
    }

    /// Convert each event into a message and dispatch it.
    pub fn inject_events(&mut self, events: &[Event]) {
        for event in events {
            if !self.running {
                break;
            }
            let msg = M::Message::from(event.clone());
            let cmd = self.model.update(msg);
            self.execute_cmd(cmd);
        }
    }

    /// Dispatch a single event.
    pub fn inject_event(&mut self, event: Event) {
        self.inject_events(&[event]);
    }

    /// Dispatch a message directly.
    pub fn send(&mut self, msg: M::Message) {
        if !self.running {
            return;
        }
        let cmd = self.model.update(msg);
        self.execute_cmd(cmd);
    }

    /// Render a frame, store it, then release `Cmd::NextFrame` messages.
    pub fn capture_frame(&mut self, width: u16, height: u16) -> &Frame {
        let mut frame = Frame::new(width, height);
        self.model.view(&mut frame);
        self.frames.push(frame);

        for msg in std::mem::take(&mut self.after_present) {
            self.send(msg);
        }
        &self.frames[self.frames.len() - 1]
    }

    /// Run the oldest held task and deliver its result.
    ///
    /// Returns `false` if no task was pending.
    pub fn run_next_task(&mut self) -> bool {
        let Some(task) = self.pending_tasks.pop_front() else {
            return false;
        };
        let msg = task();
        self.send(msg);
        true
    }

    /// Run every held task, including tasks issued while running them.
    /// Returns how many ran.
    pub fn run_pending_tasks(&mut self) -> usize {
        let mut count = 0;
        while self.run_next_task() {
            count += 1;
        }
        count
    }

    /// Drop held tasks without running them.
    pub fn discard_pending_tasks(&mut self) -> usize {
        let count = self.pending_tasks.len();
        self.pending_tasks.clear();
        count
    }

    /// Number of held tasks.
    pub fn pending_task_count(&self) -> usize {
        self.pending_tasks.len()
    }

    /// Number of messages waiting for the next frame.
    pub fn pending_next_frame_count(&self) -> usize {
        self.after_present.len()
    }

    /// All captured frames.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Most recent frame, if any.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// The model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The model, mutably.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// `false` after `Cmd::Quit`.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Lines emitted through `Cmd::Log`.
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// Every executed command, in order.
    pub fn command_log(&self) -> &[CmdRecord] {
        &self.command_log
    }

    fn execute_cmd(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {
                self.command_log.push(CmdRecord::None);
            }
            Cmd::Quit => {
                self.running = false;
                self.command_log.push(CmdRecord::Quit);
            }
            Cmd::Msg(m) => {
                self.command_log.push(CmdRecord::Msg);
                let cmd = self.model.update(m);
                self.execute_cmd(cmd);
            }
            Cmd::Batch(cmds) => {
                self.command_log.push(CmdRecord::Batch(cmds.len()));
                for c in cmds {
                    self.execute_cmd(c);
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Task(f) => {
                self.command_log.push(CmdRecord::Task);
                match self.task_mode {
                    TaskMode::Inline => {
                        let msg = f();
                        let cmd = self.model.update(msg);
                        self.execute_cmd(cmd);
                    }
                    TaskMode::Deferred => self.pending_tasks.push_back(f),
                }
            }
            Cmd::NextFrame(m) => {
                self.command_log.push(CmdRecord::NextFrame);
                self.after_present.push(m);
            }
            Cmd::Log(text) => {
                self.command_log.push(CmdRecord::Log(text.clone()));
                self.logs.push(text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inedit_core::event::{KeyCode, KeyEvent};

    // ---------- Test model ----------

    #[derive(Default)]
    struct Counter {
        value: i32,
        initialized: bool,
        settled: u32,
    }

    #[derive(Debug)]
    enum CounterMsg {
        Increment,
        Quit,
        LogValue,
        Slow,
        Settle,
        Noop,
    }

    impl From<Event> for CounterMsg {
        fn from(event: Event) -> Self {
            match event {
                Event::Key(k) if k.is_char('+') => CounterMsg::Increment,
                Event::Key(k) if k.is_char('q') => CounterMsg::Quit,
                _ => CounterMsg::Noop,
            }
        }
    }

    impl Model for Counter {
        type Message = CounterMsg;

        fn init(&mut self) -> Cmd<Self::Message> {
            self.initialized = true;
            Cmd::none()
        }

        fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message> {
            match msg {
                CounterMsg::Increment => {
                    self.value += 1;
                    Cmd::none()
                }
                CounterMsg::Quit => Cmd::quit(),
                CounterMsg::LogValue => Cmd::log(format!("value={}", self.value)),
                CounterMsg::Slow => Cmd::task(|| CounterMsg::Increment),
                CounterMsg::Settle => {
                    self.settled += 1;
                    Cmd::none()
                }
                CounterMsg::Noop => Cmd::next_frame(CounterMsg::Settle),
            }
        }

        fn view(&self, frame: &mut Frame) {
            frame.print(0, 0, &format!("Count: {}", self.value), Default::default());
        }
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c)))
    }

    #[test]
    fn init_and_events() {
        let mut sim = ProgramSimulator::new(Counter::default());
        sim.init();
        assert!(sim.model().initialized);
        sim.inject_events(&[key('+'), key('+')]);
        assert_eq!(sim.model().value, 2);
        assert_eq!(sim.capture_frame(12, 1).row_text(0), "Count: 2    ");
    }

    #[test]
    fn quit_stops_dispatch() {
        let mut sim = ProgramSimulator::new(Counter::default());
        sim.inject_events(&[key('q'), key('+')]);
        assert!(!sim.is_running());
        assert_eq!(sim.model().value, 0);
        assert_eq!(sim.command_log(), &[CmdRecord::Quit]);
    }

    #[test]
    fn logs_are_recorded() {
        let mut sim = ProgramSimulator::new(Counter::default());
        sim.send(CounterMsg::Increment);
        sim.send(CounterMsg::LogValue);
        assert_eq!(sim.logs(), ["value=1".to_string()]);
    }

    #[test]
    fn inline_tasks_deliver_immediately() {
        let mut sim = ProgramSimulator::new(Counter::default());
        sim.send(CounterMsg::Slow);
        assert_eq!(sim.model().value, 1);
        assert_eq!(sim.pending_task_count(), 0);
    }

    #[test]
    fn deferred_tasks_wait_for_release() {
        let mut sim = ProgramSimulator::new(Counter::default()).with_task_mode(TaskMode::Deferred);
        sim.send(CounterMsg::Slow);
        sim.send(CounterMsg::Slow);
        assert_eq!(sim.model().value, 0);
        assert_eq!(sim.pending_task_count(), 2);
        assert!(sim.run_next_task());
        assert_eq!(sim.model().value, 1);
        assert_eq!(sim.run_pending_tasks(), 1);
        assert_eq!(sim.model().value, 2);
        assert!(!sim.run_next_task());
    }

    #[test]
    fn discarded_tasks_never_deliver() {
        let mut sim = ProgramSimulator::new(Counter::default()).with_task_mode(TaskMode::Deferred);
        sim.send(CounterMsg::Slow);
        assert_eq!(sim.discard_pending_tasks(), 1);
        assert_eq!(sim.model().value, 0);
    }

    #[test]
    fn next_frame_messages_follow_capture() {
        let mut sim = ProgramSimulator::new(Counter::default());
        sim.send(CounterMsg::Noop);
        assert_eq!(sim.model().settled, 0);
        assert_eq!(sim.pending_next_frame_count(), 1);
        sim.capture_frame(10, 1);
        assert_eq!(sim.model().settled, 1);
        sim.capture_frame(10, 1);
        assert_eq!(sim.model().settled, 1);
        assert_eq!(sim.frames().len(), 2);
    }
}
