//! Leaderboard Ranker
//!
//! Groups delivered orders by user, ranks by cumulative carbon and keeps the
//! top `limit`. Per-user sums go through [`ImpactTotals`], the same
//! accumulator as the lifetime view, so a user's leaderboard figure always
//! equals their own `total_carbon_reduced`.
//!
//! Equal carbon totals are ordered by ascending user id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifetime::{ImpactTotals, OrderSnapshot};

/// Default number of ranked users
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

/// Public identity shown next to a ranked user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDisplay {
    pub name: String,
}

/// One ranked user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: Uuid,
    pub total_carbon_reduced: f64,
    pub total_orders: u64,
    pub total_items: u64,
    /// `None` when the user record no longer exists
    pub user: Option<UserDisplay>,
}

/// Rank users by carbon reduced over their delivered orders
///
/// Returns at most `limit` entries, never padded. Non-delivered orders are
/// ignored, and users with no delivered orders do not appear.
pub fn rank_leaderboard<I>(orders: I, limit: usize) -> Vec<LeaderboardEntry>
where
    I: IntoIterator<Item = (Uuid, OrderSnapshot)>,
{
    let mut per_user: BTreeMap<Uuid, ImpactTotals> = BTreeMap::new();

    for (user_id, order) in orders {
        if !order.status.counts_towards_impact() {
            continue;
        }
        per_user.entry(user_id).or_default().add(&order);
    }

    rank_totals(per_user, limit)
}

/// Rank users whose delivered totals were already summed per user
///
/// Used when the store groups orders itself. Users with no delivered orders
/// are dropped.
pub fn rank_totals<I>(totals: I, limit: usize) -> Vec<LeaderboardEntry>
where
    I: IntoIterator<Item = (Uuid, ImpactTotals)>,
{
    let mut ranked: Vec<(Uuid, ImpactTotals)> = totals
        .into_iter()
        .filter(|(_, totals)| totals.orders > 0)
        .collect();

    // Ascending ids first; the stable sort keeps that order for ties
    ranked.sort_by_key(|(user_id, _)| *user_id);
    ranked.sort_by(|(_, a), (_, b)| b.carbon_reduced().total_cmp(&a.carbon_reduced()));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .enumerate()
        .map(|(index, (user_id, totals))| LeaderboardEntry {
            rank: index + 1,
            user_id,
            total_carbon_reduced: totals.carbon_reduced(),
            total_orders: totals.orders,
            total_items: totals.items,
            user: None,
        })
        .collect()
}

/// Fill in display identities after ranking
pub fn attach_display<F>(entries: &mut [LeaderboardEntry], mut lookup: F)
where
    F: FnMut(&Uuid) -> Option<UserDisplay>,
{
    for entry in entries.iter_mut() {
        entry.user = lookup(&entry.user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderImpactSummary, OrderStatus};

    fn order(carbon: f64, items: u32, status: OrderStatus) -> OrderSnapshot {
        OrderSnapshot {
            status,
            impact: OrderImpactSummary {
                total_carbon_footprint: carbon,
                ..Default::default()
            },
            item_count: items,
        }
    }

    fn user(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn test_fewer_users_than_limit() {
        let orders = vec![
            (user(1), order(10.0, 1, OrderStatus::Delivered)),
            (user(2), order(30.0, 2, OrderStatus::Delivered)),
            (user(1), order(5.0, 4, OrderStatus::Delivered)),
        ];

        let board = rank_leaderboard(orders, DEFAULT_LEADERBOARD_SIZE);
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].user_id, user(2));
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].user_id, user(1));
        assert_eq!(board[1].total_carbon_reduced, 15.0);
        assert_eq!(board[1].total_orders, 2);
        assert_eq!(board[1].total_items, 5);
    }

    #[test]
    fn test_truncates_to_limit() {
        let orders: Vec<_> = (1..=15)
            .map(|n| (user(n), order(n as f64, 1, OrderStatus::Delivered)))
            .collect();

        let board = rank_leaderboard(orders, 10);
        assert_eq!(board.len(), 10);
        assert_eq!(board[0].total_carbon_reduced, 15.0);
        assert_eq!(board[9].total_carbon_reduced, 6.0);
        assert!(board
            .windows(2)
            .all(|w| w[0].total_carbon_reduced >= w[1].total_carbon_reduced));
    }

    #[test]
    fn test_ties_ordered_by_user_id() {
        let orders = vec![
            (user(9), order(12.0, 1, OrderStatus::Delivered)),
            (user(3), order(12.0, 1, OrderStatus::Delivered)),
            (user(5), order(12.0, 1, OrderStatus::Delivered)),
        ];

        let board = rank_leaderboard(orders, 10);
        let ids: Vec<_> = board.iter().map(|e| e.user_id).collect();
        assert_eq!(ids, vec![user(3), user(5), user(9)]);
    }

    #[test]
    fn test_undelivered_orders_do_not_rank() {
        let orders = vec![
            (user(1), order(99.0, 1, OrderStatus::Shipped)),
            (user(2), order(1.0, 1, OrderStatus::Delivered)),
        ];

        let board = rank_leaderboard(orders, 10);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].user_id, user(2));
    }

    #[test]
    fn test_rank_pre_grouped_totals() {
        let totals = |carbon: f64, orders: u64| ImpactTotals {
            carbon,
            orders,
            items: orders,
            ..Default::default()
        };
        let rows = vec![
            (user(7), totals(4.004, 1)),
            (user(2), totals(4.0, 2)),
            (user(4), totals(50.0, 0)),
            (user(1), totals(9.5, 3)),
        ];

        let board = rank_totals(rows, 10);
        let ids: Vec<_> = board.iter().map(|e| e.user_id).collect();
        // 4.004 and 4.0 both display as 4.0 and tie; the zero-order row is dropped
        assert_eq!(ids, vec![user(1), user(2), user(7)]);
        assert_eq!(board[1].total_carbon_reduced, 4.0);
        assert_eq!(board[0].total_orders, 3);
    }

    #[test]
    fn test_attach_display() {
        let orders = vec![
            (user(1), order(2.0, 1, OrderStatus::Delivered)),
            (user(2), order(1.0, 1, OrderStatus::Delivered)),
        ];
        let mut board = rank_leaderboard(orders, 10);

        attach_display(&mut board, |id| {
            (*id == user(1)).then(|| UserDisplay {
                name: "Ada".to_string(),
            })
        });

        assert_eq!(board[0].user.as_ref().map(|u| u.name.as_str()), Some("Ada"));
        assert!(board[1].user.is_none());
    }
}
