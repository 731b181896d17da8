#![forbid(unsafe_code)]

//! Elm-style runtime for the editor.
//!
//! All state lives in one [`Model`]. Every mutation goes through
//! [`Program::dispatch`], which calls [`Model::update`] and executes the
//! returned [`Cmd`]. Side effects that block (network I/O, file appends)
//! are [`Cmd::Task`]s: the closure runs on a spawned thread and its return
//! value comes back as a message on a channel that [`Program::pump`]
//! drains on the caller's thread. The model is therefore only ever touched
//! from one thread.
//!
//! # Example
//!
//! ```
//! use ledwall_runtime::program::{Cmd, Model, Program};
//!
//! struct Counter {
//!     count: i32,
//! }
//!
//! enum Msg {
//!     Increment,
//!     Loaded(i32),
//! }
//!
//! impl Model for Counter {
//!     type Message = Msg;
//!
//!     fn update(&mut self, msg: Msg) -> Cmd<Msg> {
//!         match msg {
//!             Msg::Increment => {
//!                 self.count += 1;
//!                 Cmd::task(|| Msg::Loaded(10))
//!             }
//!             Msg::Loaded(n) => {
//!                 self.count += n;
//!                 Cmd::none()
//!             }
//!         }
//!     }
//! }
//!
//! let mut program = Program::new(Counter { count: 0 });
//! program.dispatch(Msg::Increment);
//! program.pump_until_idle(std::time::Duration::from_secs(5));
//! assert_eq!(program.model().count, 11);
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::subscription::{ObserverRegistry, SubId};

/// Application state and behavior.
pub trait Model: Sized {
    /// Messages that drive [`update`](Self::update).
    type Message: Send + 'static;

    /// Startup commands, run once by [`Program::init`].
    fn init(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    /// Apply one message. This is the only place state changes.
    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message>;
}

/// Metadata for background tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSpec {
    /// Optional task name for logging.
    pub name: Option<String>,
}

impl TaskSpec {
    /// Set the task name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Side effects requested by `init()` and `update()`.
#[derive(Default)]
pub enum Cmd<M> {
    /// No operation.
    #[default]
    None,
    /// Execute commands independently. Tasks run concurrently and their
    /// results arrive in completion order.
    Batch(Vec<Cmd<M>>),
    /// Execute commands in order. Tasks run one after another on a single
    /// background thread, so their results arrive in the order given.
    /// Other commands run immediately.
    Sequence(Vec<Cmd<M>>),
    /// Feed a message straight back into the model.
    Msg(M),
    /// Emit an informational log line.
    Log(String),
    /// Run a blocking closure on a background thread; its return value is
    /// delivered as a message.
    Task(TaskSpec, Box<dyn FnOnce() -> M + Send>),
}

impl<M: std::fmt::Debug> std::fmt::Debug for Cmd<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::Sequence(cmds) => f.debug_tuple("Sequence").field(cmds).finish(),
            Self::Msg(m) => f.debug_tuple("Msg").field(m).finish(),
            Self::Log(s) => f.debug_tuple("Log").field(s).finish(),
            Self::Task(spec, _) => f.debug_struct("Task").field("spec", spec).finish(),
        }
    }
}

impl<M> Cmd<M> {
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    #[inline]
    pub fn msg(m: M) -> Self {
        Self::Msg(m)
    }

    #[inline]
    pub fn log(msg: impl Into<String>) -> Self {
        Self::Log(msg.into())
    }

    /// Create a batch of commands, collapsing trivial cases.
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or_default(),
            _ => Self::Batch(cmds),
        }
    }

    /// Create a sequence of commands, collapsing trivial cases.
    pub fn sequence(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or_default(),
            _ => Self::Sequence(cmds),
        }
    }

    /// Background task.
    pub fn task<F>(f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Task(TaskSpec::default(), Box::new(f))
    }

    /// Named background task.
    pub fn task_named<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Task(TaskSpec::default().with_name(name), Box::new(f))
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Stable name for logging.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Batch(_) => "Batch",
            Self::Sequence(_) => "Sequence",
            Self::Msg(_) => "Msg",
            Self::Log(_) => "Log",
            Self::Task(..) => "Task",
        }
    }

    /// Number of atomic commands.
    ///
    /// Returns 0 for None, 1 for atomic commands, and recursively counts for Batch/Sequence.
    pub fn count(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Batch(cmds) | Self::Sequence(cmds) => cmds.iter().map(Self::count).sum(),
            _ => 1,
        }
    }
}

/// Threaded runtime around a [`Model`].
pub struct Program<M: Model> {
    model: M,
    task_sender: mpsc::Sender<M::Message>,
    task_receiver: mpsc::Receiver<M::Message>,
    /// Each thread returns how many of its messages it failed to deliver.
    task_handles: Vec<JoinHandle<usize>>,
    in_flight: usize,
    observers: ObserverRegistry<M>,
}

impl<M: Model> Program<M> {
    pub fn new(model: M) -> Self {
        let (task_sender, task_receiver) = mpsc::channel();
        Self {
            model,
            task_sender,
            task_receiver,
            task_handles: Vec::new(),
            in_flight: 0,
            observers: ObserverRegistry::new(),
        }
    }

    /// Run `Model::init()` and its commands.
    pub fn init(&mut self) {
        let cmd = self.model.init();
        self.execute_cmd(cmd);
        self.observers.notify(&self.model);
    }

    /// Apply one message, execute the resulting commands, notify observers.
    pub fn dispatch(&mut self, msg: M::Message) {
        let cmd = self.model.update(msg);
        self.execute_cmd(cmd);
        self.observers.notify(&self.model);
    }

    /// Deliver every finished task result without blocking.
    ///
    /// Returns the number of messages dispatched.
    pub fn pump(&mut self) -> usize {
        self.reap_finished_tasks();
        let mut delivered = 0;
        while let Ok(msg) = self.task_receiver.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.dispatch(msg);
            delivered += 1;
        }
        delivered
    }

    /// Deliver task results until none are in flight or `timeout` elapses.
    ///
    /// Tasks spawned by delivered messages are waited on too.
    pub fn pump_until_idle(&mut self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut delivered = self.pump();
        while self.in_flight > 0 {
            let now = Instant::now();
            if now >= deadline {
                debug!(in_flight = self.in_flight, "pump_until_idle timed out");
                break;
            }
            match self
                .task_receiver
                .recv_timeout((deadline - now).min(Duration::from_millis(50)))
            {
                Ok(msg) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    self.dispatch(msg);
                    delivered += 1;
                }
                Err(mpsc::RecvTimeoutError::Timeout) => self.reap_finished_tasks(),
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
        delivered
    }

    /// Tasks spawned but not yet delivered.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Register an observer called with the model after every dispatch.
    pub fn subscribe(&mut self, observer: impl Fn(&M) + 'static) -> SubId {
        self.observers.subscribe(observer)
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubId) -> bool {
        self.observers.unsubscribe(id)
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    fn execute_cmd(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {}
            Cmd::Batch(cmds) => {
                for c in cmds {
                    self.execute_cmd(c);
                }
            }
            Cmd::Sequence(cmds) => {
                let mut tasks = Vec::new();
                for c in cmds {
                    self.collect_tasks(c, &mut tasks);
                }
                self.spawn_in_order(tasks);
            }
            Cmd::Msg(m) => {
                let cmd = self.model.update(m);
                self.execute_cmd(cmd);
            }
            Cmd::Log(text) => {
                info!(target: "ledwall::editor", "{text}");
            }
            Cmd::Task(spec, f) => {
                let sender = self.task_sender.clone();
                debug!(task = spec.name.as_deref().unwrap_or("anonymous"), "spawning task");
                let handle = std::thread::spawn(move || {
                    let msg = f();
                    usize::from(sender.send(msg).is_err())
                });
                self.in_flight += 1;
                self.task_handles.push(handle);
            }
        }
    }

    /// Flatten `cmd` for a sequence: tasks are queued in order, everything
    /// else runs now.
    fn collect_tasks(&mut self, cmd: Cmd<M::Message>, tasks: &mut Vec<QueuedTask<M::Message>>) {
        match cmd {
            Cmd::Batch(cmds) | Cmd::Sequence(cmds) => {
                for c in cmds {
                    self.collect_tasks(c, tasks);
                }
            }
            Cmd::Task(spec, f) => tasks.push((spec, f)),
            other => self.execute_cmd(other),
        }
    }

    fn spawn_in_order(&mut self, tasks: Vec<QueuedTask<M::Message>>) {
        if tasks.is_empty() {
            return;
        }
        let count = tasks.len();
        let sender = self.task_sender.clone();
        debug!(tasks = count, "spawning task sequence");
        let handle = std::thread::spawn(move || {
            let mut undelivered = 0;
            for (spec, f) in tasks {
                match panic::catch_unwind(AssertUnwindSafe(f)) {
                    Ok(msg) => {
                        if sender.send(msg).is_err() {
                            undelivered += 1;
                        }
                    }
                    Err(payload) => {
                        let name = spec.name.as_deref().unwrap_or("anonymous");
                        error!(task = name, "sequenced task panicked: {}", panic_message(&*payload));
                        undelivered += 1;
                    }
                }
            }
            undelivered
        });
        self.in_flight += count;
        self.task_handles.push(handle);
    }

    fn reap_finished_tasks(&mut self) {
        if self.task_handles.is_empty() {
            return;
        }

        let mut remaining = Vec::with_capacity(self.task_handles.len());
        for handle in self.task_handles.drain(..) {
            if handle.is_finished() {
                match handle.join() {
                    Ok(undelivered) => {
                        self.in_flight = self.in_flight.saturating_sub(undelivered);
                    }
                    Err(payload) => {
                        error!("spawned task panicked: {}", panic_message(&*payload));
                        // A panicked task never delivers its message.
                        self.in_flight = self.in_flight.saturating_sub(1);
                    }
                }
            } else {
                remaining.push(handle);
            }
        }
        self.task_handles = remaining;
    }
}

type QueuedTask<M> = (TaskSpec, Box<dyn FnOnce() -> M + Send>);

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug)]
    enum Msg {
        Add(i32),
        Fetch(i32),
        Chain,
    }

    struct Acc {
        total: i32,
    }

    impl Model for Acc {
        type Message = Msg;

        fn init(&mut self) -> Cmd<Msg> {
            Cmd::msg(Msg::Add(1))
        }

        fn update(&mut self, msg: Msg) -> Cmd<Msg> {
            match msg {
                Msg::Add(n) => {
                    self.total += n;
                    Cmd::none()
                }
                Msg::Fetch(n) => Cmd::task_named("fetch", move || Msg::Add(n)),
                Msg::Chain => Cmd::batch(vec![
                    Cmd::msg(Msg::Add(2)),
                    Cmd::log("chained"),
                    Cmd::task(|| Msg::Fetch(5)),
                ]),
            }
        }
    }

    #[test]
    fn batch_collapses_trivial_cases() {
        let empty: Cmd<Msg> = Cmd::batch(vec![]);
        assert!(empty.is_none());
        let single: Cmd<Msg> = Cmd::batch(vec![Cmd::none(), Cmd::log("x")]);
        assert_eq!(single.type_name(), "Log");
        let seq: Cmd<Msg> = Cmd::sequence(vec![Cmd::log("a"), Cmd::log("b")]);
        assert_eq!(seq.count(), 2);
    }

    #[test]
    fn cmd_debug_format() {
        let cmd: Cmd<Msg> = Cmd::task_named("load", || Msg::Add(1));
        assert_eq!(
            format!("{cmd:?}"),
            r#"Task { spec: TaskSpec { name: Some("load") } }"#
        );
    }

    #[test]
    fn init_and_dispatch_update_model() {
        let mut program = Program::new(Acc { total: 0 });
        program.init();
        assert_eq!(program.model().total, 1);
        program.dispatch(Msg::Add(4));
        assert_eq!(program.model().total, 5);
    }

    #[test]
    fn tasks_deliver_through_pump() {
        let mut program = Program::new(Acc { total: 0 });
        program.dispatch(Msg::Fetch(7));
        assert_eq!(program.in_flight(), 1);
        let delivered = program.pump_until_idle(Duration::from_secs(5));
        assert_eq!(delivered, 1);
        assert_eq!(program.in_flight(), 0);
        assert_eq!(program.model().total, 7);
    }

    #[test]
    fn nested_tasks_are_awaited() {
        let mut program = Program::new(Acc { total: 0 });
        program.dispatch(Msg::Chain);
        program.pump_until_idle(Duration::from_secs(5));
        assert_eq!(program.model().total, 7);
    }

    #[derive(Debug)]
    enum Step {
        Done(u32),
        Run,
    }

    struct Log {
        order: Vec<u32>,
    }

    impl Model for Log {
        type Message = Step;

        fn update(&mut self, msg: Step) -> Cmd<Step> {
            match msg {
                Step::Done(n) => {
                    self.order.push(n);
                    Cmd::none()
                }
                Step::Run => Cmd::sequence(vec![
                    Cmd::task(|| {
                        std::thread::sleep(Duration::from_millis(50));
                        Step::Done(1)
                    }),
                    Cmd::batch(vec![Cmd::task(|| Step::Done(2)), Cmd::task(|| Step::Done(3))]),
                    Cmd::msg(Step::Done(0)),
                ]),
            }
        }
    }

    #[test]
    fn sequenced_tasks_deliver_in_order() {
        let mut program = Program::new(Log { order: Vec::new() });
        program.dispatch(Step::Run);
        assert_eq!(program.in_flight(), 3);
        program.pump_until_idle(Duration::from_secs(5));
        assert_eq!(program.model().order, [0, 1, 2, 3]);
        assert_eq!(program.in_flight(), 0);
    }

    #[test]
    fn panicking_sequenced_task_does_not_stall_the_rest() {
        struct Quiet(Vec<u32>);
        impl Model for Quiet {
            type Message = u32;
            fn update(&mut self, msg: u32) -> Cmd<u32> {
                self.0.push(msg);
                Cmd::none()
            }
        }
        let mut program = Program::new(Quiet(Vec::new()));
        program.execute_cmd(Cmd::sequence(vec![
            Cmd::task(|| -> u32 { panic!("boom") }),
            Cmd::task(|| 9),
        ]));
        program.pump_until_idle(Duration::from_secs(5));
        assert_eq!(program.model().0, [9]);
        assert_eq!(program.in_flight(), 0);
    }

    #[test]
    fn observers_see_every_dispatch() {
        let mut program = Program::new(Acc { total: 0 });
        let seen = Rc::new(Cell::new(0));
        let sink = Rc::clone(&seen);
        let id = program.subscribe(move |m: &Acc| sink.set(m.total));
        program.dispatch(Msg::Add(3));
        assert_eq!(seen.get(), 3);
        assert!(program.unsubscribe(id));
        program.dispatch(Msg::Add(3));
        assert_eq!(seen.get(), 3);
        assert!(!program.unsubscribe(id));
    }
}
