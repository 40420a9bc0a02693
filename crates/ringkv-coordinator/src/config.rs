//! Per-node configuration the coordinator needs at construction (spec
//! §6 "Configuration").

/// Validates a raw `replication.factor` setting. `R=1` disables
/// replication; `R=2` keeps one replica, and so on. Any value below 1
/// is invalid and is coerced to `2` with a logged warning rather than
/// rejected outright — the coordinator always needs *some* factor to
/// size its store's replica tiers.
pub fn validate_replication_factor(raw: i64) -> usize {
    if raw < 1 {
        tracing::warn!(raw, "invalid replication.factor, defaulting to 2");
        2
    } else {
        raw as usize
    }
}
