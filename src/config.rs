//! Host runtime configuration.

/// Collector tuning for a [`Vm`](crate::Vm).
///
/// Thresholds count live heap objects. The first automatic collection runs
/// once the heap holds more than `initial_heap_objects`; afterwards the
/// threshold is the surviving count grown by `heap_growth_percent`, never
/// below `min_heap_objects`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    pub initial_heap_objects: usize,
    pub min_heap_objects: usize,
    pub heap_growth_percent: usize,
    /// Collect automatically at call boundaries.
    pub auto_collect: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            initial_heap_objects: 1024,
            min_heap_objects: 256,
            heap_growth_percent: 50,
            auto_collect: true,
        }
    }
}

impl VmConfig {
    pub fn with_initial_heap_objects(mut self, objects: usize) -> Self {
        self.initial_heap_objects = objects;
        self
    }

    pub fn with_min_heap_objects(mut self, objects: usize) -> Self {
        self.min_heap_objects = objects;
        self
    }

    pub fn with_heap_growth_percent(mut self, percent: usize) -> Self {
        self.heap_growth_percent = percent;
        self
    }

    pub fn with_auto_collect(mut self, enabled: bool) -> Self {
        self.auto_collect = enabled;
        self
    }

    /// Threshold for the next automatic collection given the surviving
    /// object count.
    pub fn next_threshold(&self, live: usize) -> usize {
        let grown = live + live * self.heap_growth_percent / 100;
        grown.max(self.min_heap_objects)
    }
}
