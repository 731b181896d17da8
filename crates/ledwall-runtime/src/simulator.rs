#![forbid(unsafe_code)]

//! Deterministic program simulator for testing.
//!
//! `ProgramSimulator` runs a [`Model`] without threads. By default every
//! [`Cmd::Task`] runs synchronously, right where it is executed. With
//! [`defer_tasks`](ProgramSimulator::defer_tasks) enabled, tasks queue up
//! instead and the test decides when (and in which order) each completes,
//! which is how out-of-order network responses are reproduced.
//!
//! # Example
//!
//! ```ignore
//! let mut sim = ProgramSimulator::new(EditorModel::new(config, sync));
//! sim.init();
//! sim.send(EditorMsg::MoveToLayer { current: 3, target: 1 });
//! assert_eq!(sim.model().stack().layer_list(), ["e3", "e1", "e2"]);
//! ```

use std::collections::VecDeque;

use crate::program::{Cmd, Model, TaskSpec};

/// Record of a command that was executed during simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmdRecord {
    None,
    /// Message fed back to the model (not stored, just noted).
    Msg,
    Batch(usize),
    Sequence(usize),
    Log(String),
    /// Background task executed (or queued) with this name.
    Task(Option<String>),
}

type PendingTask<M> = (TaskSpec, Box<dyn FnOnce() -> M + Send>);

/// Deterministic simulator for [`Model`] testing.
pub struct ProgramSimulator<M: Model> {
    model: M,
    command_log: Vec<CmdRecord>,
    logs: Vec<String>,
    defer: bool,
    pending: VecDeque<PendingTask<M::Message>>,
}

impl<M: Model> ProgramSimulator<M> {
    /// The model is not initialized until [`init`](Self::init) is called.
    pub fn new(model: M) -> Self {
        Self {
            model,
            command_log: Vec::new(),
            logs: Vec::new(),
            defer: false,
            pending: VecDeque::new(),
        }
    }

    /// Queue tasks instead of running them inline.
    pub fn defer_tasks(&mut self, defer: bool) {
        self.defer = defer;
    }

    pub fn init(&mut self) {
        let cmd = self.model.init();
        self.execute_cmd(cmd);
    }

    /// Send a message through `Model::update()` and execute the result.
    pub fn send(&mut self, msg: M::Message) {
        let cmd = self.model.update(msg);
        self.execute_cmd(cmd);
    }

    /// Send several messages in order.
    pub fn send_all(&mut self, msgs: impl IntoIterator<Item = M::Message>) {
        for msg in msgs {
            self.send(msg);
        }
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    #[must_use]
    pub fn command_log(&self) -> &[CmdRecord] {
        &self.command_log
    }

    /// Names of every task executed or queued so far.
    #[must_use]
    pub fn task_names(&self) -> Vec<&str> {
        self.command_log
            .iter()
            .filter_map(|r| match r {
                CmdRecord::Task(name) => Some(name.as_deref().unwrap_or("")),
                _ => None,
            })
            .collect()
    }

    /// Log lines emitted via `Cmd::Log`.
    #[must_use]
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// Deferred tasks waiting to run.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.pending.len()
    }

    /// Names of deferred tasks, oldest first.
    #[must_use]
    pub fn pending_task_names(&self) -> Vec<Option<&str>> {
        self.pending
            .iter()
            .map(|(spec, _)| spec.name.as_deref())
            .collect()
    }

    /// Complete the deferred task at `index` (0 = oldest). Returns `false`
    /// if there is none.
    pub fn complete_task(&mut self, index: usize) -> bool {
        match self.pending.remove(index) {
            Some((_, f)) => {
                self.send(f());
                true
            }
            None => false,
        }
    }

    /// Complete every deferred task, oldest first, including tasks queued
    /// by their results. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while self.complete_task(0) {
            ran += 1;
        }
        ran
    }

    /// Execute a command directly, as if returned from `update()`.
    pub fn execute_cmd(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {
                self.command_log.push(CmdRecord::None);
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
                }
            }
            Cmd::Sequence(cmds) => {
                self.command_log.push(CmdRecord::Sequence(cmds.len()));
                for c in cmds {
                    self.execute_cmd(c);
                }
            }
            Cmd::Log(text) => {
                self.command_log.push(CmdRecord::Log(text.clone()));
                self.logs.push(text);
            }
            Cmd::Task(spec, f) => {
                self.command_log.push(CmdRecord::Task(spec.name.clone()));
                if self.defer {
                    self.pending.push_back((spec, f));
                } else {
                    let msg = f();
                    let cmd = self.model.update(msg);
                    self.execute_cmd(cmd);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum Msg {
        Set(i32),
        Load(i32),
        Note,
    }

    #[derive(Default)]
    struct Last {
        value: i32,
    }

    impl Model for Last {
        type Message = Msg;

        fn update(&mut self, msg: Msg) -> Cmd<Msg> {
            match msg {
                Msg::Set(v) => {
                    self.value = v;
                    Cmd::none()
                }
                Msg::Load(v) => Cmd::task_named(format!("load-{v}"), move || Msg::Set(v)),
                Msg::Note => Cmd::log("noted"),
            }
        }
    }

    #[test]
    fn tasks_run_inline_by_default() {
        let mut sim = ProgramSimulator::new(Last::default());
        sim.send(Msg::Load(4));
        assert_eq!(sim.model().value, 4);
        assert_eq!(sim.task_names(), ["load-4"]);
        assert_eq!(sim.pending_tasks(), 0);
    }

    #[test]
    fn deferred_tasks_complete_in_chosen_order() {
        let mut sim = ProgramSimulator::new(Last::default());
        sim.defer_tasks(true);
        sim.send_all([Msg::Load(1), Msg::Load(2)]);
        assert_eq!(sim.model().value, 0);
        assert_eq!(sim.pending_task_names(), [Some("load-1"), Some("load-2")]);

        assert!(sim.complete_task(1));
        assert_eq!(sim.model().value, 2);
        assert_eq!(sim.run_pending(), 1);
        assert_eq!(sim.model().value, 1);
        assert!(!sim.complete_task(0));
    }

    #[test]
    fn logs_are_captured() {
        let mut sim = ProgramSimulator::new(Last::default());
        sim.send(Msg::Note);
        assert_eq!(sim.logs(), ["noted"]);
        assert_eq!(sim.command_log(), [CmdRecord::Log("noted".into())]);
    }
}
