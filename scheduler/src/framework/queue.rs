use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::Arc;

use super::interface::{PodInfo, QueueSortPlugin};

/// Turn a `less` function into a total `Ordering` for `sort_by`.
pub fn compare(sorter: &dyn QueueSortPlugin, a: &PodInfo, b: &PodInfo) -> Ordering {
    if sorter.less(a, b) {
        Ordering::Less
    } else if sorter.less(b, a) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Sort pods into dequeue order.
pub fn sort_pods(sorter: &dyn QueueSortPlugin, pods: &mut [PodInfo]) {
    pods.sort_by(|a, b| compare(sorter, a, b));
}

/// Pending pods, kept in the order given by the queue sort plugin.
/// Pods that compare equal leave in insertion order.
pub struct SchedulingQueue {
    sorter: Arc<dyn QueueSortPlugin>,
    pending: VecDeque<PodInfo>,
}

impl SchedulingQueue {
    pub fn new(sorter: Arc<dyn QueueSortPlugin>) -> Self {
        Self {
            sorter,
            pending: VecDeque::new(),
        }
    }

    pub fn add(&mut self, pod: PodInfo) {
        let idx = self
            .pending
            .partition_point(|queued| !self.sorter.less(&pod, queued));
        tracing::trace!(pod=%pod.pod.metadata.name, position=idx, "Queued pod");
        self.pending.insert(idx, pod);
    }

    pub fn pop(&mut self) -> Option<PodInfo> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Extend<PodInfo> for SchedulingQueue {
    fn extend<T: IntoIterator<Item = PodInfo>>(&mut self, iter: T) {
        for pod in iter {
            self.add(pod);
        }
    }
}
