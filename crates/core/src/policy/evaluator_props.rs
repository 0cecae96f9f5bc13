//! Property-based tests for the SoD evaluator.

use proptest::prelude::*;
use uuid::Uuid;

use kontor_shared::SodEnforcement;
use kontor_shared::types::{RoleId, UserId};

use crate::policy::error::PolicyError;
use crate::policy::evaluator::{ActionContext, GrantChange, GrantOutcome, PolicyEvaluator};
use crate::policy::graph::RolePermissionGraph;
use crate::policy::types::{Permission, SodRule};

fn arb_permission() -> impl Strategy<Value = Permission> {
    (0..Permission::ALL.len()).prop_map(|i| Permission::ALL[i])
}

fn arb_user() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(Uuid::from_u128(n)))
}

fn baseline() -> Vec<SodRule> {
    SodRule::BASELINE
        .iter()
        .map(|(a, b, d)| SodRule::new(*a, *b, d))
        .collect()
}

/// Builds a graph of up to four roles and four users from index pairs.
fn arb_graph() -> impl Strategy<Value = RolePermissionGraph> {
    (
        prop::collection::vec((0usize..4, arb_permission()), 0..12),
        prop::collection::vec((0usize..4, 0usize..4), 0..8),
    )
        .prop_map(|(grants, assignments)| {
            let roles: Vec<RoleId> = (0..4u128).map(|i| RoleId::from_uuid(Uuid::from_u128(i + 1))).collect();
            let users: Vec<UserId> = (0..4u128).map(|i| UserId::from_uuid(Uuid::from_u128(i + 100))).collect();
            let mut graph = RolePermissionGraph::new();
            for (role, permission) in grants {
                graph.grant_permission(roles[role], permission);
            }
            for (user, role) in assignments {
                graph.assign_role(users[user], roles[role]);
            }
            graph
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A maker can never approve, whatever they hold.
    #[test]
    fn prop_maker_never_approves(maker in arb_user(), other in arb_user()) {
        let makers = [maker, other];
        let ctx = ActionContext {
            actor: maker,
            permission: Permission::JournalApprove,
            makers: &makers,
            prior_steps: &[],
        };
        let is_maker_checker = matches!(
            PolicyEvaluator::check_action(&ctx, &baseline()),
            Err(PolicyError::MakerChecker { .. })
        );
        prop_assert!(is_maker_checker);
    }

    /// Every flagged user really holds both halves of the rule, and every
    /// user holding both halves is flagged.
    #[test]
    fn prop_user_conflicts_match_effective_permissions(graph in arb_graph()) {
        let rules = baseline();
        let conflicts = PolicyEvaluator::evaluate(&graph, &rules);

        for user in graph.users() {
            let effective = graph.effective_permissions(*user);
            for rule in &rules {
                let flagged = conflicts
                    .users
                    .iter()
                    .any(|c| c.user_id == *user && c.rule_id == rule.id);
                prop_assert_eq!(flagged, rule.is_violated_by(&effective));
            }
        }
    }

    /// Evaluation never mutates its input and is deterministic.
    #[test]
    fn prop_evaluate_is_deterministic(graph in arb_graph()) {
        let rules = baseline();
        let first = PolicyEvaluator::evaluate(&graph, &rules);
        let second = PolicyEvaluator::evaluate(&graph, &rules);
        prop_assert_eq!(first, second);
    }

    /// Warn enforcement never refuses; block enforcement never warns.
    #[test]
    fn prop_enforcement_modes(graph in arb_graph(), role_index in 1u128..5, permission in arb_permission()) {
        let rules = baseline();
        let change = GrantChange::RolePermission {
            role: RoleId::from_uuid(Uuid::from_u128(role_index)),
            permission,
        };

        let warn = PolicyEvaluator::check_grant(&graph, &rules, change, SodEnforcement::Warn);
        prop_assert!(warn.is_ok());

        let block = PolicyEvaluator::check_grant(&graph, &rules, change, SodEnforcement::Block);
        let block_warned = matches!(block, Ok(GrantOutcome::Warned(_)));
        prop_assert!(!block_warned);
    }
}
