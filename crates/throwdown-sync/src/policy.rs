//! The merge policy: deciding what to do with a remote document.
//!
//! Pure and synchronous — the decision depends only on the remote header,
//! the local device identity, and the timestamp of the last accepted remote
//! document. The inbound task applies it to every delivery.

use chrono::{DateTime, Utc};

use throwdown_types::{DeviceId, DocMeta};

/// Decision for a remote document delivered by the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    /// Replace the local document wholesale and advance the acceptance
    /// watermark.
    Accept,
    /// The delivery merely reflects this device's own prior write. Ignore.
    SelfEcho,
    /// The delivery is not newer than what was already accepted
    /// (out-of-order or duplicate). Ignore.
    Stale,
}

/// Evaluate a remote document's header against the local merge state.
///
/// Applied in order:
/// 1. A document written by the local device is a self-echo.
/// 2. A document not strictly newer than the last accepted remote
///    timestamp is stale — this makes acceptance idempotent (the same
///    `updated_at` twice is a no-op) and monotonic under out-of-order
///    delivery.
/// 3. Everything else is accepted wholesale. Concurrent edits from the
///    slower writer are silently discarded; that coarseness is the
///    design, not an accident.
pub fn evaluate_remote(
    remote: &DocMeta,
    local_device: DeviceId,
    last_accepted: Option<DateTime<Utc>>,
) -> MergeDecision {
    if remote.updated_by == local_device {
        return MergeDecision::SelfEcho;
    }
    if last_accepted.is_some_and(|watermark| remote.updated_at <= watermark) {
        return MergeDecision::Stale;
    }
    MergeDecision::Accept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meta(secs: i64, device: DeviceId) -> DocMeta {
        DocMeta {
            updated_at: Utc.timestamp_opt(secs, 0).single().unwrap_or_default(),
            updated_by: device,
            version: 1,
        }
    }

    #[test]
    fn accepts_fresh_remote() {
        let local = DeviceId::generate();
        let remote = DeviceId::generate();
        assert_eq!(
            evaluate_remote(&meta(100, remote), local, None),
            MergeDecision::Accept
        );
    }

    #[test]
    fn suppresses_self_echo() {
        let local = DeviceId::generate();
        // Echo suppression wins even for a "newer" timestamp.
        assert_eq!(
            evaluate_remote(&meta(9_999, local), local, Some(meta(100, local).updated_at)),
            MergeDecision::SelfEcho
        );
    }

    #[test]
    fn same_timestamp_twice_is_stale() {
        let local = DeviceId::generate();
        let remote = DeviceId::generate();
        let first = meta(500, remote);
        assert_eq!(
            evaluate_remote(&first, local, None),
            MergeDecision::Accept
        );
        // Applying the same document again changes nothing.
        assert_eq!(
            evaluate_remote(&first, local, Some(first.updated_at)),
            MergeDecision::Stale
        );
    }

    #[test]
    fn out_of_order_delivery_keeps_the_later_writer() {
        let local = DeviceId::generate();
        let remote = DeviceId::generate();
        let earlier = meta(100, remote);
        let later = meta(200, remote);

        // In-order: both accepted, final state is the later one.
        assert_eq!(evaluate_remote(&earlier, local, None), MergeDecision::Accept);
        assert_eq!(
            evaluate_remote(&later, local, Some(earlier.updated_at)),
            MergeDecision::Accept
        );

        // Out-of-order: the later one is accepted, the earlier discarded.
        assert_eq!(evaluate_remote(&later, local, None), MergeDecision::Accept);
        assert_eq!(
            evaluate_remote(&earlier, local, Some(later.updated_at)),
            MergeDecision::Stale
        );
    }
}
