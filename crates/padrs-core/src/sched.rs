// padrs Cooperative Scheduler
// Single-threaded, priority-ordered resumption of suspended routines

use std::panic::{catch_unwind, AssertUnwindSafe};

use smallvec::SmallVec;

use crate::event::GameEvent;

/// Default priority for routines that do not care about ordering.
pub const DEFAULT_PRIORITY: i32 = 0;

/// Identifies a task for the lifetime of its scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// The condition a suspended routine is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOn {
    /// Resume after the named event fires.
    Event(GameEvent),
    /// Resume after the given task terminates.
    Task(TaskId),
}

/// Outcome of resuming a routine once.
///
/// Routines are written as one loop iteration per resumption: do the work
/// for this wake-up, then return the next suspension point. Returning
/// [`Step::Wait`] with the same condition re-arms the routine, which is how
/// the typical `loop { wait(E); update }` shape is expressed.
pub enum Step {
    /// Suspend until the condition holds.
    Wait(WaitOn),
    /// The routine is finished; the task is dropped.
    Done,
}

type Routine = Box<dyn FnMut() -> Step>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskState {
    Waiting(WaitOn),
    Ready,
}

struct Task {
    id: TaskId,
    name: String,
    priority: i32,
    seq: u64,
    state: TaskState,
    routine: Routine,
}

/// Cooperative scheduler driven by the host's per-cycle tick.
///
/// All registered routines run on the caller's thread, one at a time, so
/// routines share state freely without locking as long as they suspend
/// promptly. A routine that panics is removed and logged; its peers and the
/// scheduler itself keep running.
#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<Task>,
    next_seq: u64,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_seq: 0,
        }
    }

    /// Register a routine and return its handle.
    ///
    /// The routine stays suspended on `initial_wait` until that condition
    /// holds. Among tasks that become ready for the same tick, higher
    /// `priority` resumes first; ties resume in registration order.
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        priority: i32,
        initial_wait: WaitOn,
        routine: impl FnMut() -> Step + 'static,
    ) -> TaskId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = TaskId(seq);
        let name = name.into();
        log::debug!("scheduler: spawn '{}' priority={}", name, priority);
        self.tasks.push(Task {
            id,
            name,
            priority,
            seq,
            state: TaskState::Waiting(initial_wait),
            routine: Box::new(routine),
        });
        id
    }

    /// Mark every task waiting on `event` as ready for the next tick.
    pub fn notify(&mut self, event: GameEvent) {
        for task in &mut self.tasks {
            if task.state == TaskState::Waiting(WaitOn::Event(event)) {
                task.state = TaskState::Ready;
            }
        }
    }

    /// Resume every task that is ready at the start of this call, once
    /// each, in descending priority order (registration order on ties).
    ///
    /// Tasks that become ready while the tick runs (for example because a
    /// resumed routine terminated and woke its completion-waiters) are left
    /// for the next tick.
    pub fn tick(&mut self) {
        let mut ready: SmallVec<[(i32, u64, TaskId); 8]> = self
            .tasks
            .iter()
            .filter(|t| t.state == TaskState::Ready)
            .map(|t| (t.priority, t.seq, t.id))
            .collect();
        ready.sort_by_key(|&(priority, seq, _)| (std::cmp::Reverse(priority), seq));

        for (_, _, id) in ready {
            self.resume(id);
        }
    }

    /// Number of live tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks remain.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether the task is still registered (has not terminated).
    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// Display name of a live task.
    pub fn task_name(&self, id: TaskId) -> Option<&str> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.name.as_str())
    }

    fn resume(&mut self, id: TaskId) {
        // Take the task out while its routine runs so the routine cannot
        // observe a half-updated registry through re-entrant calls.
        let Some(idx) = self.tasks.iter().position(|t| t.id == id) else {
            return;
        };
        let mut task = self.tasks.remove(idx);

        match catch_unwind(AssertUnwindSafe(|| (task.routine)())) {
            Ok(Step::Wait(wait)) => {
                task.state = TaskState::Waiting(wait);
                self.tasks.push(task);
            }
            Ok(Step::Done) => {
                log::debug!("scheduler: task '{}' finished", task.name);
                self.wake_dependents(id);
            }
            Err(panic) => {
                let detail = panic_message(&panic);
                log::error!("scheduler: task '{}' panicked: {}", task.name, detail);
                self.wake_dependents(id);
            }
        }
    }

    fn wake_dependents(&mut self, finished: TaskId) {
        for task in &mut self.tasks {
            if task.state == TaskState::Waiting(WaitOn::Task(finished)) {
                task.state = TaskState::Ready;
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn wait_found() -> WaitOn {
        WaitOn::Event(GameEvent::AddressFound)
    }

    #[test]
    fn test_task_waits_until_event() {
        let hits = Rc::new(RefCell::new(0));
        let mut sched = Scheduler::new();
        let h = hits.clone();
        sched.spawn("counter", DEFAULT_PRIORITY, wait_found(), move || {
            *h.borrow_mut() += 1;
            Step::Wait(wait_found())
        });

        sched.tick();
        assert_eq!(*hits.borrow(), 0);

        sched.notify(GameEvent::AddressFound);
        sched.tick();
        assert_eq!(*hits.borrow(), 1);

        // Not re-armed by the tick itself.
        sched.tick();
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_rearm_fires_once_per_notification() {
        let hits = Rc::new(RefCell::new(0));
        let mut sched = Scheduler::new();
        let h = hits.clone();
        sched.spawn("counter", DEFAULT_PRIORITY, wait_found(), move || {
            *h.borrow_mut() += 1;
            Step::Wait(wait_found())
        });

        for _ in 0..3 {
            sched.notify(GameEvent::AddressFound);
            sched.tick();
        }
        assert_eq!(*hits.borrow(), 3);
    }

    #[test]
    fn test_priority_order_then_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        for (name, priority) in [("low", 1), ("high", 9), ("mid-a", 5), ("mid-b", 5)] {
            let o = order.clone();
            sched.spawn(name, priority, wait_found(), move || {
                o.borrow_mut().push(name);
                Step::Wait(wait_found())
            });
        }

        sched.notify(GameEvent::AddressFound);
        sched.tick();
        assert_eq!(*order.borrow(), vec!["high", "mid-a", "mid-b", "low"]);
    }

    #[test]
    fn test_events_are_independent() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        let l = log.clone();
        sched.spawn("found", 0, wait_found(), move || {
            l.borrow_mut().push("found");
            Step::Wait(wait_found())
        });
        let l = log.clone();
        sched.spawn(
            "closed",
            0,
            WaitOn::Event(GameEvent::ProcessClosed),
            move || {
                l.borrow_mut().push("closed");
                Step::Wait(WaitOn::Event(GameEvent::ProcessClosed))
            },
        );

        sched.notify(GameEvent::ProcessClosed);
        sched.tick();
        assert_eq!(*log.borrow(), vec!["closed"]);
    }

    #[test]
    fn test_wait_on_task_completion() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        let l = log.clone();
        let one_shot = sched.spawn("one-shot", 0, wait_found(), move || {
            l.borrow_mut().push("one-shot");
            Step::Done
        });
        let l = log.clone();
        sched.spawn("follower", 0, WaitOn::Task(one_shot), move || {
            l.borrow_mut().push("follower");
            Step::Done
        });

        sched.notify(GameEvent::AddressFound);
        sched.tick();
        // Completion wakes the follower for the next tick, not this one.
        assert_eq!(*log.borrow(), vec!["one-shot"]);
        assert!(!sched.contains(one_shot));

        sched.tick();
        assert_eq!(*log.borrow(), vec!["one-shot", "follower"]);
        assert!(sched.is_empty());
    }

    #[test]
    fn test_panic_terminates_only_the_faulting_routine() {
        let hits = Rc::new(RefCell::new(0));
        let mut sched = Scheduler::new();
        let faulty = sched.spawn("faulty", 5, wait_found(), || -> Step {
            panic!("routine fault");
        });
        let h = hits.clone();
        let survivor = sched.spawn("survivor", 0, wait_found(), move || {
            *h.borrow_mut() += 1;
            Step::Wait(wait_found())
        });

        sched.notify(GameEvent::AddressFound);
        sched.tick();

        assert!(!sched.contains(faulty));
        assert!(sched.contains(survivor));
        assert_eq!(*hits.borrow(), 1);

        // Scheduler keeps working after the fault.
        sched.notify(GameEvent::AddressFound);
        sched.tick();
        assert_eq!(*hits.borrow(), 2);
    }

    #[test]
    fn test_panic_wakes_completion_waiters() {
        let woke = Rc::new(RefCell::new(false));
        let mut sched = Scheduler::new();
        let faulty = sched.spawn("faulty", 0, wait_found(), || -> Step {
            panic!("boom");
        });
        let w = woke.clone();
        sched.spawn("waiter", 0, WaitOn::Task(faulty), move || {
            *w.borrow_mut() = true;
            Step::Done
        });

        sched.notify(GameEvent::AddressFound);
        sched.tick();
        sched.tick();
        assert!(*woke.borrow());
    }

    #[test]
    fn test_task_name_lookup() {
        let mut sched = Scheduler::new();
        let id = sched.spawn("named", 0, wait_found(), || Step::Done);
        assert_eq!(sched.task_name(id), Some("named"));
        assert_eq!(sched.len(), 1);
    }
}
