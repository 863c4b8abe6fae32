use shared::models::{Pod, QuantityError};

use super::{BinPacking, CPU_WEIGHT};
use crate::framework::{PodInfo, QueueSortPlugin};

/// Weighted resource footprint of a pod: the sum over all containers of
/// `cpu limit * CPU_WEIGHT + memory limit`. Missing limits count as zero.
///
/// Any limit that is not an exact integer, or a sum that overflows,
/// fails the whole footprint.
pub fn footprint(pod: &Pod) -> Result<i64, QuantityError> {
    let mut total: i64 = 0;
    for container in &pod.spec.containers {
        if let Some(cpu) = container.cpu_limit() {
            total = cpu
                .as_i64()?
                .checked_mul(CPU_WEIGHT)
                .and_then(|weighted| total.checked_add(weighted))
                .ok_or_else(|| QuantityError::Overflow(cpu.to_string()))?;
        }
        if let Some(mem) = container.memory_limit() {
            total = total
                .checked_add(mem.as_i64()?)
                .ok_or_else(|| QuantityError::Overflow(mem.to_string()))?;
        }
    }
    Ok(total)
}

fn arrived_first(a: &PodInfo, b: &PodInfo) -> bool {
    a.timestamp < b.timestamp
}

impl QueueSortPlugin for BinPacking {
    fn less(&self, a: &PodInfo, b: &PodInfo) -> bool {
        let (prio_a, prio_b) = (a.pod.priority(), b.pod.priority());
        if prio_a != prio_b {
            return prio_a > prio_b;
        }

        match (footprint(&a.pod), footprint(&b.pod)) {
            (Ok(size_a), Ok(size_b)) if size_a != size_b => size_a > size_b,
            (Ok(_), Ok(_)) => arrived_first(a, b),
            (Err(err), _) | (_, Err(err)) => {
                tracing::trace!(error=%err, "Footprint unavailable, ordering by arrival");
                arrived_first(a, b)
            }
        }
    }
}
