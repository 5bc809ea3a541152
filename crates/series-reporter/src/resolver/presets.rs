//! Ready-made resolvers for common metric families.
//!
//! The runtime family follows the naming of the usual JVM metric sets
//! registered under `jvm.*` (classes, garbage collectors, memory, threads),
//! the circuit breaker family follows Hystrix command and thread pool names.

use super::MetricInfoResolver;
use super::SegmentResolver;

const THREAD_STATES: &[&str] = &[
    "new",
    "runnable",
    "blocked",
    "waiting",
    "timed_waiting",
    "terminated",
];

/// `HystrixCommand.<group>.<command>.<metric>`
pub fn command() -> SegmentResolver {
    SegmentResolver::new("HystrixCommand", &["group", "command"])
}

/// `HystrixThreadPool.<pool>.<metric>`
pub fn thread_pool() -> SegmentResolver {
    SegmentResolver::new("HystrixThreadPool", &["pool"])
}

/// `jvm.classes.loaded`, `jvm.classes.unloaded`
pub fn classes() -> SegmentResolver {
    SegmentResolver::new("jvm.classes", &["state"]).with_values(&["loaded", "unloaded"])
}

/// `jvm.gc.<collector>.count`, `jvm.gc.<collector>.time`
pub fn garbage_collectors() -> SegmentResolver {
    SegmentResolver::new("jvm.gc", &["collector"])
}

/// `jvm.memory.<heap|non-heap|total>.<metric>`
pub fn memory() -> SegmentResolver {
    SegmentResolver::new("jvm.memory", &["area"]).with_values(&["heap", "non-heap", "total"])
}

/// `jvm.memory.pools.<pool>.<metric>`
pub fn memory_pools() -> SegmentResolver {
    SegmentResolver::new("jvm.memory.pools", &["pool"])
}

/// `jvm.threads.<state>.count`
pub fn thread_states() -> SegmentResolver {
    SegmentResolver::new("jvm.threads", &["state"]).with_values(THREAD_STATES)
}

/// `jvm.threads.daemon.count`, `jvm.threads.deadlock.count`
pub fn thread_counts() -> SegmentResolver {
    SegmentResolver::new("jvm.threads", &["kind"]).with_values(&["daemon", "deadlock"])
}

pub fn circuit_breaker() -> Vec<Box<dyn MetricInfoResolver>> {
    vec![Box::new(command()), Box::new(thread_pool())]
}

pub fn runtime() -> Vec<Box<dyn MetricInfoResolver>> {
    vec![
        Box::new(classes()),
        Box::new(garbage_collectors()),
        Box::new(memory()),
        Box::new(memory_pools()),
        Box::new(thread_states()),
        Box::new(thread_counts()),
    ]
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::resolver::MetricInfo;
    use crate::resolver::ResolverChain;

    fn resolve(id: &str) -> MetricInfo {
        let mut resolvers = runtime();
        resolvers.extend(circuit_breaker());
        ResolverChain::new(resolvers, vec![])
            .resolve(id)
            .expect("should resolve")
    }

    #[test]
    fn garbage_collector_names() {
        let info = resolve("jvm.gc.G1-Young-Generation.count");
        assert_eq!(info.name, "jvm.gc.count");
        assert_eq!(info.tags, vec!["collector:G1-Young-Generation".to_string()]);
    }

    #[test]
    fn memory_areas_and_pools_do_not_collide() {
        let heap = resolve("jvm.memory.heap.used");
        assert_eq!(heap.name, "jvm.memory.used");
        assert_eq!(heap.tags, vec!["area:heap".to_string()]);

        let pool = resolve("jvm.memory.pools.G1-Eden-Space.usage");
        assert_eq!(pool.name, "jvm.memory.pools.usage");
        assert_eq!(pool.tags, vec!["pool:G1-Eden-Space".to_string()]);
    }

    #[test]
    fn thread_states_and_counts() {
        let blocked = resolve("jvm.threads.blocked.count");
        assert_eq!(blocked.name, "jvm.threads.count");
        assert_eq!(blocked.tags, vec!["state:blocked".to_string()]);

        let daemon = resolve("jvm.threads.daemon.count");
        assert_eq!(daemon.name, "jvm.threads.count");
        assert_eq!(daemon.tags, vec!["kind:daemon".to_string()]);

        let total = resolve("jvm.threads.count");
        assert_eq!(total.name, "jvm.threads.count");
        assert!(total.tags.is_empty());
    }

    #[test]
    fn class_loading() {
        let info = resolve("jvm.classes.unloaded");
        assert_eq!(info.name, "jvm.classes");
        assert_eq!(info.tags, vec!["state:unloaded".to_string()]);
    }

    #[test]
    fn circuit_breaker_names() {
        let command = resolve("HystrixCommand.payments.Charge.latencyTotal_mean");
        assert_eq!(command.name, "HystrixCommand.latencyTotal_mean");
        assert_eq!(command.tags, vec![
            "group:payments".to_string(),
            "command:Charge".to_string()
        ]);

        let pool = resolve("HystrixThreadPool.payments.rollingMaxActiveThreads");
        assert_eq!(pool.name, "HystrixThreadPool.rollingMaxActiveThreads");
        assert_eq!(pool.tags, vec!["pool:payments".to_string()]);
    }
}
