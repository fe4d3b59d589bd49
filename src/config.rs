use crate::common::DEFAULT_K;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Routing table configurations
pub struct Config {
    /// K (as in k-bucket) is the maximum number of contacts per distance class.
    ///
    /// This controls the redundancy factor of the DHT, the higher it is,
    /// the more contacts are kept, and returned from [crate::RoutingTable::closest].
    ///
    /// Defaults to [DEFAULT_K]
    pub k: usize,
}

impl Config {
    /// Set the bucket capacity `k`.
    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { k: DEFAULT_K }
    }
}
