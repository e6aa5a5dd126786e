//! Building the retransmit request a receiver sends to ask for what it's
//! missing (spec §4.10).

use std::collections::BTreeSet;

use allnet_proto::RetransmitRequest;

use crate::missing::get_missing;

/// Builds a [`RetransmitRequest`] describing everything missing below
/// `highest_seen`, or `None` if `highest_seen` is `0` (nothing has been
/// received yet, so there is nothing to request) or nothing is missing.
pub fn build_retransmit_request(
    seen: &BTreeSet<u64>,
    highest_seen: u64,
) -> Option<RetransmitRequest> {
    if highest_seen == 0 {
        return None;
    }
    let (singles, ranges) = get_missing(seen, highest_seen);
    if singles.is_empty() && ranges.is_empty() {
        return None;
    }
    Some(RetransmitRequest {
        singles,
        ranges,
        last_received: highest_seen,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_received_yet_produces_no_request() {
        let seen = BTreeSet::new();
        assert!(build_retransmit_request(&seen, 0).is_none());
    }

    #[test]
    fn no_gaps_produces_no_request() {
        let seen: BTreeSet<u64> = [1, 2, 3].into_iter().collect();
        assert!(build_retransmit_request(&seen, 3).is_none());
    }

    #[test]
    fn gaps_produce_a_populated_request() {
        let seen: BTreeSet<u64> = [1, 2, 3, 5, 7, 8].into_iter().collect();
        let req = build_retransmit_request(&seen, 8).unwrap();
        assert_eq!(req.last_received, 8);
        assert_eq!(req.singles, vec![4, 6]);
        assert!(req.ranges.is_empty());
    }
}
