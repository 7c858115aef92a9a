use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic id source shared by reference between producers, e.g. to give
/// concurrently spawned jobs distinct scope names.
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    next: AtomicU64,
}

impl SequenceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn counts_up_from_start() {
        let ids = SequenceGenerator::starting_at(5);
        assert_eq!(ids.next(), 5);
        assert_eq!(ids.next(), 6);
    }

    #[test]
    fn ids_are_unique_across_threads() {
        let ids = Arc::new(SequenceGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || (0..100).map(|_| ids.next()).collect::<Vec<_>>())
            })
            .collect();
        let seen: HashSet<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(seen.len(), 400);
    }
}
