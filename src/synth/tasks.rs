use crate::sequencing::grid::Cell;

/// Handle to a scheduled task; cancelling by id is always safe, even after
/// the task has already fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Remove a released voice once its tail has fully faded.
    ReapVoice(Cell),
    /// Drop the arpeggiator's held voice after its fade-out.
    TearDownArp,
}

struct Task {
    id: TaskId,
    due_frame: u64,
    kind: TaskKind,
}

/// Deadline queue drained at the top of every render block.
///
/// Replaces wall-clock timers with deadlines in audio frames, so teardown
/// lands at a deterministic sample position and a cancelled task is
/// guaranteed never to fire. The queue is small (one entry per releasing
/// voice) so a plain Vec scan beats a heap here.
#[derive(Default)]
pub struct TaskQueue {
    tasks: Vec<Task>,
    next_id: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_frame: u64, kind: TaskKind) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task {
            id,
            due_frame,
            kind,
        });
        id
    }

    /// Returns true if the task was still pending.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Pop one task whose deadline has passed, earliest first.
    pub fn pop_due(&mut self, frame: u64) -> Option<TaskKind> {
        let idx = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_frame <= frame)
            .min_by_key(|(_, t)| t.due_frame)
            .map(|(i, _)| i)?;
        Some(self.tasks.swap_remove(idx).kind)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
