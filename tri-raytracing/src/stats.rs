use std::{
    collections::BTreeMap,
    fmt::Display,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use lazy_static::lazy_static;

pub type StatsNode = Arc<Mutex<Stats>>;

lazy_static! {
    static ref ROOT_STATS: StatsNode = Arc::new(Mutex::new(Stats::new(1)));
}

/// A node of the hierarchical run statistics, holding the time spent and named counters.
pub struct Stats {
    /// The hierarchical depth of the stats node
    depth: usize,

    /// The node specific timings in nanoseconds
    timings_ns: u128,

    /// Named counters, e.g., the number of triangle tests
    counters: BTreeMap<String, u64>,

    /// Further children
    children: BTreeMap<String, StatsNode>,
}

/// Adds the elapsed time to its node when dropped.
pub struct TimeRecording {
    dst_node: StatsNode,
    t0: Instant,
}

pub trait StatsNodeTrait {
    /// Starts a time recording that ends when the returned guard is dropped.
    fn register_timing(&self) -> TimeRecording;

    /// Returns the child node with the given name, creating it if necessary.
    fn get_child(&self, name: &str) -> StatsNode;

    /// Adds the value to the named counter.
    fn add_to_counter(&self, name: &str, value: u64);
}

impl TimeRecording {
    pub fn new(dst_node: StatsNode) -> Self {
        let t0 = Instant::now();

        Self { dst_node, t0 }
    }
}

impl Drop for TimeRecording {
    #[inline]
    fn drop(&mut self) {
        let ns = self.t0.elapsed().as_nanos();
        lock(&self.dst_node).timings_ns += ns;
    }
}

impl Stats {
    /// Returns the root stats node
    #[inline]
    pub fn root() -> StatsNode {
        ROOT_STATS.clone()
    }

    /// Creates a new detached root node, e.g., for isolated runs.
    pub fn new_root() -> StatsNode {
        Arc::new(Mutex::new(Stats::new(1)))
    }

    /// Returns a children node for the given identifier.
    ///
    /// # Arguments
    /// * `name` - The name of the child.
    pub fn get_child(&mut self, name: String) -> StatsNode {
        let depth = self.depth + 1;

        self.children
            .entry(name)
            .or_insert_with(|| Arc::new(Mutex::new(Stats::new(depth))))
            .clone()
    }

    /// Returns the value of the named counter, zero if it was never increased.
    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// Returns the elapsed time of the node in nano-seconds
    #[inline]
    pub fn as_nanos(&self) -> u128 {
        self.timings_ns
    }

    /// Returns the elapsed time of the node in milli-seconds
    #[inline]
    pub fn as_millis(&self) -> u128 {
        self.timings_ns / 1000000u128
    }

    fn new(depth: usize) -> Self {
        Self {
            depth,
            timings_ns: 0u128,
            counters: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    fn indent(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:width$}", "", width = self.depth * 2)
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.children.is_empty() && self.counters.is_empty() {
            return writeln!(f, "{} ms,", self.as_millis());
        }

        if self.timings_ns == 0u128 {
            writeln!(f, "{{")?;
        } else {
            writeln!(f, "{} ms {{", self.as_millis())?;
        }

        for (name, value) in self.counters.iter() {
            self.indent(f)?;
            writeln!(f, "{} = {},", name, value)?;
        }

        for (name, child) in self.children.iter() {
            self.indent(f)?;
            write!(f, "{}: ", name)?;
            lock(child).fmt(f)?;
        }

        writeln!(f, "}},")
    }
}

impl StatsNodeTrait for StatsNode {
    #[inline]
    fn register_timing(&self) -> TimeRecording {
        TimeRecording::new(self.clone())
    }

    #[inline]
    fn get_child(&self, name: &str) -> StatsNode {
        lock(self).get_child(name.to_owned())
    }

    fn add_to_counter(&self, name: &str, value: u64) {
        *lock(self).counters.entry(name.to_owned()).or_insert(0) += value;
    }
}

/// Locks the node. A panic while holding the lock leaves the statistics usable.
#[inline]
fn lock(node: &StatsNode) -> MutexGuard<'_, Stats> {
    node.lock().unwrap_or_else(PoisonError::into_inner)
}
