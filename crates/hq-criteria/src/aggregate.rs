//! Room and report verdicts over many test instances.

use std::collections::BTreeMap;

use hq_core::TestKind;
use serde::{Deserialize, Serialize};

use crate::evaluate::TestOutcome;
use crate::table::AggregationPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindVerdict {
    pub kind: TestKind,
    pub instances: usize,
    pub passed: usize,
    pub meets_criteria: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomVerdict {
    /// One entry per kind present, in `TestKind` order.
    pub kinds: Vec<KindVerdict>,
    /// False for a room without tests.
    pub meets_criteria: bool,
}

pub fn room_verdict<'a, I>(outcomes: I, policy: AggregationPolicy) -> RoomVerdict
where
    I: IntoIterator<Item = (TestKind, &'a TestOutcome)>,
{
    let mut tally: BTreeMap<TestKind, (usize, usize)> = BTreeMap::new();
    for (kind, outcome) in outcomes {
        let entry = tally.entry(kind).or_insert((0, 0));
        entry.0 += 1;
        if outcome.meets_criteria {
            entry.1 += 1;
        }
    }

    let kinds: Vec<KindVerdict> = tally
        .into_iter()
        .map(|(kind, (instances, passed))| {
            // every pressure reading must hold on its own
            let effective = if kind == TestKind::PressureDifference {
                AggregationPolicy::AllMustPass
            } else {
                policy
            };
            let meets_criteria = match effective {
                AggregationPolicy::AllMustPass => passed == instances,
                AggregationPolicy::AnyMustPass => passed > 0,
            };
            KindVerdict {
                kind,
                instances,
                passed,
                meets_criteria,
            }
        })
        .collect();

    let meets_criteria = !kinds.is_empty() && kinds.iter().all(|k| k.meets_criteria);
    RoomVerdict {
        kinds,
        meets_criteria,
    }
}

/// A report passes when it has rooms and every room passes.
pub fn report_verdict(rooms: &[RoomVerdict]) -> bool {
    !rooms.is_empty() && rooms.iter().all(|r| r.meets_criteria)
}
