use crate::models::{PaymentRecord, PaymentStatus, Statistics};

pub fn compute_statistics(payments: &[PaymentRecord]) -> Statistics {
    payments.iter().fold(
        Statistics {
            total: payments.len(),
            ..Statistics::default()
        },
        |mut stats, payment| {
            match payment.status.known() {
                Some(PaymentStatus::Pending) => stats.pending += 1,
                Some(PaymentStatus::Approved) => {
                    stats.approved += 1;
                    stats.total_amount += payment.amount_value();
                }
                Some(PaymentStatus::Rejected) => stats.rejected += 1,
                None => {}
            }
            stats
        },
    )
}
