//! Benchmarks for the swarm runtime live under `benches/`.
