//! Pending motion requests.

use heapless::Deque;

use crate::config::Degrees;

use super::axis::Axis;

/// Maximum number of jobs waiting behind the active move.
pub const QUEUE_CAPACITY: usize = 2;

/// One requested relative displacement of one axis.
///
/// Immutable once created; moved into the engine when dequeued.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionJob {
    /// Axis to move.
    pub axis: Axis,
    /// Signed displacement.
    pub delta: Degrees,
    /// Conversion factor captured at enqueue time.
    pub steps_per_degree: f32,
}

impl MotionJob {
    /// Create a job.
    pub fn new(axis: Axis, delta: Degrees, steps_per_degree: f32) -> Self {
        Self {
            axis,
            delta,
            steps_per_degree,
        }
    }
}

/// Bounded FIFO of pending jobs. Overflow is rejected, never queued.
#[derive(Debug)]
pub struct JobQueue {
    jobs: Deque<MotionJob, QUEUE_CAPACITY>,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self { jobs: Deque::new() }
    }

    /// Append a job. Returns `false` and drops the job when full.
    pub fn enqueue(&mut self, job: MotionJob) -> bool {
        self.jobs.push_back(job).is_ok()
    }

    /// Remove the oldest job.
    pub fn dequeue(&mut self) -> Option<MotionJob> {
        self.jobs.pop_front()
    }

    /// Drop every pending job.
    pub fn clear(&mut self) {
        self.jobs.clear();
    }

    /// Number of pending jobs.
    #[inline]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// No pending jobs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Queue cannot take another job.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.jobs.is_full()
    }
}
