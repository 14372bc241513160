//! CPU affinity for worker threads
//!
//! Workers can be pinned to a configured set of cores. Worker `w` takes core
//! `cores[w % cores.len()]`, so a pool larger than the core list wraps around
//! it. Pinning is best effort: a failure is logged by the worker and the
//! search continues unpinned.
//!
//! # Example
//!
//! ```
//! use runsearch::worker::affinity::{core_for_worker, parse_cpu_list};
//!
//! let cores = parse_cpu_list("0,2-4").unwrap();
//! assert_eq!(cores, vec![0, 2, 3, 4]);
//! assert_eq!(core_for_worker(&cores, 5), Some(2));
//! ```

use crate::Result;
use anyhow::Context;

/// Pin the calling thread to `cores`
#[cfg(target_os = "linux")]
pub fn set_cpu_affinity(cores: &[usize]) -> Result<()> {
    use libc::{cpu_set_t, sched_setaffinity, CPU_SET, CPU_ZERO};
    use std::mem;

    if cores.is_empty() {
        anyhow::bail!("CPU core list cannot be empty");
    }

    // SAFETY: cpu_set_t is plain data; CPU_SET is bounds-checked by the
    // explicit core limit below, and sched_setaffinity only reads the set.
    unsafe {
        let mut cpu_set: cpu_set_t = mem::zeroed();
        CPU_ZERO(&mut cpu_set);

        for &core in cores {
            if core >= 1024 {
                anyhow::bail!("CPU core ID {} is too large (max 1023)", core);
            }
            CPU_SET(core, &mut cpu_set);
        }

        let result = sched_setaffinity(0, mem::size_of::<cpu_set_t>(), &cpu_set);
        if result != 0 {
            let err = std::io::Error::last_os_error();
            return Err(err).context(format!("Failed to set CPU affinity to cores {:?}", cores));
        }
    }

    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn set_cpu_affinity(_cores: &[usize]) -> Result<()> {
    anyhow::bail!("CPU affinity is only supported on Linux")
}

/// Parse a core list such as `"0,2-4,7"` into sorted, deduplicated ids
pub fn parse_cpu_list(spec: &str) -> Result<Vec<usize>> {
    let mut cores = Vec::new();

    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start: usize = start
                .trim()
                .parse()
                .with_context(|| format!("Invalid CPU core number: {}", start))?;
            let end: usize = end
                .trim()
                .parse()
                .with_context(|| format!("Invalid CPU core number: {}", end))?;
            if start > end {
                anyhow::bail!("Invalid CPU range: start ({}) > end ({})", start, end);
            }
            cores.extend(start..=end);
        } else {
            let core: usize = part
                .parse()
                .with_context(|| format!("Invalid CPU core number: {}", part))?;
            cores.push(core);
        }
    }

    if cores.is_empty() {
        anyhow::bail!("CPU core list cannot be empty");
    }

    cores.sort_unstable();
    cores.dedup();
    Ok(cores)
}

/// Core assigned to worker `worker_id`, or None without a core list
pub fn core_for_worker(cores: &[usize], worker_id: usize) -> Option<usize> {
    if cores.is_empty() {
        None
    } else {
        Some(cores[worker_id % cores.len()])
    }
}

/// Logical CPUs available to this process
pub fn num_cpus() -> usize {
    num_cpus::get()
}

/// Log a warning when the pool is larger than the machine; returns true if so
pub fn warn_if_oversubscribed(worker_count: usize) -> bool {
    let cpu_count = num_cpus();
    if worker_count > cpu_count {
        log::warn!(
            "worker count ({}) exceeds CPU count ({}); workers will time-share cores",
            worker_count,
            cpu_count
        );
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpu_list_single() {
        assert_eq!(parse_cpu_list("0").unwrap(), vec![0]);
    }

    #[test]
    fn test_parse_cpu_list_mixed() {
        assert_eq!(parse_cpu_list("0,2-4,7").unwrap(), vec![0, 2, 3, 4, 7]);
    }

    #[test]
    fn test_parse_cpu_list_with_spaces() {
        assert_eq!(parse_cpu_list("0, 2 - 4, 7").unwrap(), vec![0, 2, 3, 4, 7]);
    }

    #[test]
    fn test_parse_cpu_list_duplicates_unsorted() {
        assert_eq!(parse_cpu_list("3,1,1,2,0-1").unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_parse_cpu_list_empty() {
        assert!(parse_cpu_list("").is_err());
        assert!(parse_cpu_list(" , ").is_err());
    }

    #[test]
    fn test_parse_cpu_list_invalid() {
        assert!(parse_cpu_list("0,abc,2").is_err());
        assert!(parse_cpu_list("5-2").is_err());
        assert!(parse_cpu_list("0-2-4").is_err());
    }

    #[test]
    fn test_core_for_worker_wraps() {
        let cores = vec![4, 6];
        assert_eq!(core_for_worker(&cores, 0), Some(4));
        assert_eq!(core_for_worker(&cores, 1), Some(6));
        assert_eq!(core_for_worker(&cores, 2), Some(4));
        assert_eq!(core_for_worker(&[], 3), None);
    }

    #[test]
    fn test_warn_if_oversubscribed() {
        let cpu_count = num_cpus();
        assert!(cpu_count > 0);
        assert!(!warn_if_oversubscribed(cpu_count));
        assert!(warn_if_oversubscribed(cpu_count + 1));
    }

    #[cfg(not(target_os = "linux"))]
    #[test]
    fn test_set_cpu_affinity_unsupported() {
        assert!(set_cpu_affinity(&[0]).is_err());
    }

    #[test]
    fn test_set_cpu_affinity_empty() {
        assert!(set_cpu_affinity(&[]).is_err());
    }
}
