//! Text rendering for the operator dashboard.

use crate::models::{PaymentRecord, PaymentStatus, Statistics, Timestamp};
use clap::ValueEnum;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Approved,
    Rejected,
}

impl StatusFilter {
    const ORDER: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Pending,
        StatusFilter::Approved,
        StatusFilter::Rejected,
    ];

    pub fn matches(&self, payment: &PaymentRecord) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => payment.status == PaymentStatus::Pending,
            StatusFilter::Approved => payment.status == PaymentStatus::Approved,
            StatusFilter::Rejected => payment.status == PaymentStatus::Rejected,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Pending => "Pending",
            StatusFilter::Approved => "Approved",
            StatusFilter::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Approve,
    Reject,
    ViewDetails,
}

impl CardAction {
    pub fn target_status(&self) -> Option<PaymentStatus> {
        match self {
            CardAction::Approve => Some(PaymentStatus::Approved),
            CardAction::Reject => Some(PaymentStatus::Rejected),
            CardAction::ViewDetails => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CardAction::Approve => "approve",
            CardAction::Reject => "reject",
            CardAction::ViewDetails => "view details",
        }
    }
}

pub fn card_actions(payment: &PaymentRecord) -> &'static [CardAction] {
    match payment.status.known() {
        Some(PaymentStatus::Pending) => &[CardAction::Approve, CardAction::Reject],
        _ => &[CardAction::ViewDetails],
    }
}

pub fn filter_payments(payments: &[PaymentRecord], filter: StatusFilter) -> Vec<&PaymentRecord> {
    payments.iter().filter(|p| filter.matches(p)).collect()
}

// `All (3)  [Pending (1)]  Approved (2)  Rejected (0)`
pub fn filter_bar(payments: &[PaymentRecord], active: StatusFilter) -> String {
    StatusFilter::ORDER
        .iter()
        .map(|filter| {
            let count = payments.iter().filter(|p| filter.matches(p)).count();
            let text = format!("{} ({})", filter.label(), count);
            if *filter == active {
                format!("[{}]", text)
            } else {
                text
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn format_date(date: &Timestamp) -> String {
    match date {
        Timestamp::Parsed(at) => at.format("%b %-d, %Y, %I:%M %p").to_string(),
        Timestamp::Raw(serde_json::Value::String(raw)) => raw.clone(),
        Timestamp::Raw(raw) => raw.to_string(),
    }
}

fn date_or_na(date: &Option<Timestamp>) -> String {
    date.as_ref()
        .map(format_date)
        .unwrap_or_else(|| "N/A".to_string())
}

fn or_na(value: &Option<String>) -> &str {
    value.as_deref().filter(|v| !v.is_empty()).unwrap_or("N/A")
}

fn amount_text(payment: &PaymentRecord) -> String {
    payment
        .amount
        .as_ref()
        .map(|a| a.to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| "0.00".to_string())
}

pub fn render_card(payment: &PaymentRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{}  [{}]", payment.short_id(), payment.status.label());
    let _ = writeln!(out, "  User:    {}", or_na(&payment.user_name));
    let _ = writeln!(out, "  Package: {}", or_na(&payment.package_name));
    let _ = writeln!(out, "  Amount:  ${}", amount_text(payment));
    let _ = writeln!(out, "  Date:    {}", date_or_na(&payment.created_at));
    if let Some(utr) = payment.utr.as_deref().filter(|u| !u.is_empty()) {
        let _ = writeln!(out, "  UTR:     {}", utr);
    }
    if payment.screenshot.as_deref().is_some_and(|s| !s.is_empty()) {
        let _ = writeln!(out, "  Screenshot attached");
    }

    let actions = card_actions(payment)
        .iter()
        .map(CardAction::label)
        .collect::<Vec<_>>()
        .join(" | ");
    let _ = writeln!(out, "  Actions: {}", actions);
    out
}

pub fn render_detail(payment: &PaymentRecord, asset_url: impl Fn(&str) -> String) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Payment {}", payment.id);
    let _ = writeln!(out, "  Status:     {}", payment.status.label());
    let _ = writeln!(out, "  User:       {}", or_na(&payment.user_name));
    let _ = writeln!(out, "  Package:    {}", or_na(&payment.package_name));
    let _ = writeln!(out, "  Amount:     ${}", amount_text(payment));
    let _ = writeln!(out, "  UTR:        {}", or_na(&payment.utr));
    let _ = writeln!(out, "  Created:    {}", date_or_na(&payment.created_at));
    if let Some(updated) = &payment.updated_at {
        let _ = writeln!(out, "  Updated:    {}", format_date(updated));
    }
    match payment.screenshot.as_deref().filter(|s| !s.is_empty()) {
        Some(screenshot) => {
            let _ = writeln!(out, "  Screenshot: {}", asset_url(screenshot));
        }
        None => {
            let _ = writeln!(out, "  Screenshot: none");
        }
    }
    for (key, value) in &payment.extra {
        let _ = writeln!(out, "  {}: {}", key, value);
    }
    out
}

pub fn render_board(payments: &[PaymentRecord], stats: &Statistics, filter: StatusFilter) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Payment Requests  total {}  pending {}  approved {}  rejected {}  approved amount ${:.2}",
        stats.total, stats.pending, stats.approved, stats.rejected, stats.total_amount
    );
    let _ = writeln!(out, "{}", filter_bar(payments, filter));
    let _ = writeln!(out);

    let visible = filter_payments(payments, filter);
    if visible.is_empty() {
        let _ = writeln!(out, "No payments found");
    }
    for payment in visible {
        let _ = writeln!(out, "{}", render_card(payment));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payments() -> Vec<PaymentRecord> {
        serde_json::from_value(json!([
            {"id": "aaaaaaaa-1111", "userName": "ravi", "packageName": "Gold", "amount": "499",
             "utr": "UTR123", "screenshot": "/uploads/s1.png", "status": "pending",
             "createdAt": "2024-05-01T10:05:00Z"},
            {"id": "bbbbbbbb-2222", "amount": 10, "status": "approved",
             "createdAt": "2024-05-02T15:30:00Z", "updatedAt": "2024-05-02T16:00:00Z"},
            {"id": "cccccccc-3333", "status": "rejected", "createdAt": "2024-05-03T09:00:00Z"},
            {"id": "dddddddd-4444", "status": "on-hold", "createdAt": "2024-05-04"}
        ]))
        .unwrap()
    }

    #[test]
    fn filters_by_status() {
        let all = payments();
        assert_eq!(filter_payments(&all, StatusFilter::All).len(), 4);
        let pending = filter_payments(&all, StatusFilter::Pending);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "aaaaaaaa-1111");
    }

    #[test]
    fn filter_bar_counts_and_marks_active() {
        assert_eq!(
            filter_bar(&payments(), StatusFilter::Approved),
            "All (4)  Pending (1)  [Approved (1)]  Rejected (1)"
        );
    }

    #[test]
    fn only_pending_cards_offer_decisions() {
        let all = payments();
        assert_eq!(card_actions(&all[0]), &[CardAction::Approve, CardAction::Reject]);
        assert_eq!(card_actions(&all[1]), &[CardAction::ViewDetails]);
        assert_eq!(card_actions(&all[2]), &[CardAction::ViewDetails]);
        assert!(card_actions(&all[1])
            .iter()
            .all(|a| a.target_status() != Some(PaymentStatus::Pending)));
    }

    #[test]
    fn card_shows_fallbacks() {
        let all = payments();
        let card = render_card(&all[2]);
        assert!(card.starts_with("#cccccccc  [Rejected]"));
        assert!(card.contains("User:    N/A"));
        assert!(card.contains("Amount:  $0.00"));
        assert!(!card.contains("UTR"));

        let pending = render_card(&all[0]);
        assert!(pending.contains("UTR:     UTR123"));
        assert!(pending.contains("Date:    May 1, 2024, 10:05 AM"));
        assert!(pending.contains("Actions: approve | reject"));
    }

    #[test]
    fn unrecognized_status_card_is_view_only() {
        let all = payments();
        assert_eq!(card_actions(&all[3]), &[CardAction::ViewDetails]);

        let card = render_card(&all[3]);
        assert!(card.starts_with("#dddddddd  [on-hold]"));
        assert!(card.contains("Date:    2024-05-04"));
    }

    #[test]
    fn detail_links_full_screenshot() {
        let all = payments();
        let detail = render_detail(&all[0], |p| format!("http://localhost:5000{}", p));
        assert!(detail.contains("Screenshot: http://localhost:5000/uploads/s1.png"));
        assert!(detail.contains("Payment aaaaaaaa-1111"));

        let approved = render_detail(&all[1], |p| p.to_string());
        assert!(approved.contains("Updated:    May 2, 2024, 04:00 PM"));
        assert!(approved.contains("Screenshot: none"));
    }

    #[test]
    fn empty_board() {
        let board = render_board(&[], &Statistics::default(), StatusFilter::Pending);
        assert!(board.contains("No payments found"));
    }
}
