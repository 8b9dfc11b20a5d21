// src/services/routing.rs

use crate::models::{
    account::Account,
    funnel::{FunnelRoute, RoutingDecision},
    lead::{Lead, LeadStatus},
};

/// Decide a página do funil para a conta, em ordem estrita de prioridade:
/// recusa > portal > etapa do lead > calculadora.
///
/// O status do lead mais recente é a fonte autoritativa; os flags da conta
/// só entram como reforço (uma conta marcada KO nunca volta ao funil, mesmo
/// com um lead antigo ainda ativo).
pub fn derive_routing_state(account: &Account, latest: Option<&Lead>) -> RoutingDecision {
    let status = latest
        .filter(|lead| lead.owner_id == account.id)
        .map(|lead| lead.status);

    let route = if account.is_ko || status == Some(LeadStatus::Ko) {
        FunnelRoute::Rejection
    } else if account.has_active_policy || status == Some(LeadStatus::Signed) {
        FunnelRoute::Portal
    } else {
        match status {
            Some(LeadStatus::Calculated) => FunnelRoute::Underwriting,
            Some(LeadStatus::Subscription) => FunnelRoute::Payment,
            Some(LeadStatus::Payment) => FunnelRoute::Signature,
            _ => FunnelRoute::Calculator,
        }
    };

    if cache_disagrees(account, status) {
        tracing::warn!(
            account_id = %account.id,
            ?status,
            has_active_lead = account.has_active_lead,
            has_active_policy = account.has_active_policy,
            is_ko = account.is_ko,
            "flags da conta divergem do status do lead"
        );
    }

    let progress = match route {
        FunnelRoute::Portal => 100,
        FunnelRoute::Rejection | FunnelRoute::Calculator => 0,
        _ => status.map(|s| s.progress_percent()).unwrap_or(0),
    };

    RoutingDecision { route, path: route.path(), progress }
}

fn cache_disagrees(account: &Account, status: Option<LeadStatus>) -> bool {
    match status {
        Some(LeadStatus::Calculated | LeadStatus::Subscription | LeadStatus::Payment) => !account.has_active_lead,
        Some(LeadStatus::Signed) => !account.has_active_policy,
        Some(LeadStatus::Ko) => !account.is_ko,
        None => account.has_active_lead,
    }
}
