//! Voter transfers: where each voter's choice in one count went in a later one.
//!
//! Contract:
//! - Both choice lists are indexed by voter and refer to the same party list.
//!   Pairs are formed up to the shorter list.
//! - Only observed (from, to) pairs are reported; `None` stands for abstention.
//! - `percentage = count / from_total · 100`, where `from_total` is the number
//!   of voters who made the `from` choice in the earlier count.
//! - Rows are sorted by count descending, ties by (from, to) with abstention
//!   first and parties in list order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use es_core::ids::PartyId;

use crate::assignment::Choice;

/// One cell of the transfer matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoterTransfer {
    pub from: Option<PartyId>,
    pub to: Option<PartyId>,
    pub count: u64,
    pub from_total: u64,
    pub percentage: f64,
}

fn key(choice: Choice) -> Option<usize> {
    match choice {
        Choice::Vote(i) => Some(i),
        Choice::Abstain => None,
    }
}

pub fn transfer_matrix(parties: &[PartyId], before: &[Choice], after: &[Choice]) -> Vec<VoterTransfer> {
    let mut cells: BTreeMap<(Option<usize>, Option<usize>), u64> = BTreeMap::new();
    let mut totals: BTreeMap<Option<usize>, u64> = BTreeMap::new();
    for (&b, &a) in before.iter().zip(after.iter()) {
        *cells.entry((key(b), key(a))).or_insert(0) += 1;
        *totals.entry(key(b)).or_insert(0) += 1;
    }

    let id = |k: Option<usize>| k.and_then(|i| parties.get(i).copied());
    let mut rows: Vec<VoterTransfer> = cells
        .into_iter()
        .map(|((from, to), count)| {
            let from_total = totals.get(&from).copied().unwrap_or(count);
            VoterTransfer {
                from: id(from),
                to: id(to),
                count,
                from_total,
                percentage: count as f64 / from_total as f64 * 100.0,
            }
        })
        .collect();
    // stable: equal counts keep key order
    rows.sort_by(|x, y| y.count.cmp(&x.count));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use Choice::{Abstain, Vote};

    fn ids(n: u32) -> Vec<PartyId> {
        (0..n).map(PartyId::new).collect()
    }

    #[test]
    fn counts_and_percentages() {
        let before = [Vote(0), Vote(0), Vote(0), Vote(1), Abstain, Vote(0)];
        let after = [Vote(0), Vote(1), Vote(0), Vote(1), Vote(0), Abstain];
        let m = transfer_matrix(&ids(2), &before, &after);

        assert_eq!(m.iter().map(|r| r.count).sum::<u64>(), 6);
        let stay = &m[0];
        assert_eq!((stay.from, stay.to, stay.count), (Some(PartyId::new(0)), Some(PartyId::new(0)), 2));
        assert_eq!(stay.from_total, 4);
        assert!((stay.percentage - 50.0).abs() < 1e-12);

        let joined = m.iter().find(|r| r.from.is_none()).unwrap();
        assert_eq!(joined.to, Some(PartyId::new(0)));
        assert_eq!((joined.count, joined.from_total), (1, 1));
        assert_eq!(joined.percentage, 100.0);
    }

    #[test]
    fn ties_break_by_key_with_abstention_first() {
        let before = [Vote(1), Abstain, Vote(0)];
        let after = [Vote(1), Abstain, Vote(1)];
        let m = transfer_matrix(&ids(2), &before, &after);
        let keys: Vec<_> = m.iter().map(|r| (r.from, r.to)).collect();
        assert_eq!(
            keys,
            vec![
                (None, None),
                (Some(PartyId::new(0)), Some(PartyId::new(1))),
                (Some(PartyId::new(1)), Some(PartyId::new(1))),
            ]
        );
    }

    #[test]
    fn shorter_list_bounds_the_pairs() {
        let m = transfer_matrix(&ids(1), &[Vote(0), Vote(0), Vote(0)], &[Vote(0)]);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].count, 1);
        assert_eq!(m[0].from_total, 1);
    }
}
