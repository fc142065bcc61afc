//! Lifecycle hooks for the bridge (open, pause, finish, abort).
//!
//! Compiles to nothing without the `tracing` feature. Subscribers are wired
//! up by the embedding binary.

#[cfg(feature = "tracing")]
pub fn emit_span(event: &str, key_values: &[(&str, String)]) {
    let span = tracing::debug_span!("rowcast", event);
    let _enter = span.enter();
    if key_values.is_empty() {
        tracing::debug!(%event, "bridge");
    }
    for (k, v) in key_values {
        tracing::debug!(%event, %k, %v, "bridge");
    }
}

#[cfg(not(feature = "tracing"))]
pub fn emit_span(_event: &str, _key_values: &[(&str, String)]) { /* no-op */
}
