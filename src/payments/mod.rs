pub mod repayment;

use chrono::NaiveDate;

use crate::decimal::Amount;
use crate::types::Payment;

pub use repayment::{annuity_payment, RepaymentScheme};

/// Payments sorted once by date and handed out monotonically.
///
/// Each payment is yielded exactly once; a cursor belongs to a single
/// simulation run.
#[derive(Debug, Clone)]
pub struct SortedPayments {
    payments: Vec<Payment>,
    position: usize,
}

impl SortedPayments {
    pub fn new(mut payments: Vec<Payment>) -> Self {
        // stable, so same-day payments keep their input order
        payments.sort_by_key(|payment| payment.date);
        Self { payments, position: 0 }
    }

    /// next payment not yet handed out
    pub fn peek(&self) -> Option<&Payment> {
        self.payments.get(self.position)
    }

    /// take every remaining payment dated before `end_exclusive`
    pub fn pop_before(&mut self, end_exclusive: NaiveDate) -> Vec<Payment> {
        let start = self.position;
        while self
            .payments
            .get(self.position)
            .is_some_and(|payment| payment.date < end_exclusive)
        {
            self.position += 1;
        }
        self.payments[start..self.position].to_vec()
    }

    /// payments not yet handed out
    pub fn remaining(&self) -> &[Payment] {
        &self.payments[self.position..]
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.payments.len()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.payments.first().map(|payment| payment.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.payments.last().map(|payment| payment.date)
    }

    pub fn total(&self) -> Amount {
        self.payments.iter().map(|payment| &payment.amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(m: u32, d: u32, amount: i64) -> Payment {
        Payment::new(NaiveDate::from_ymd_opt(2024, m, d).unwrap(), Amount::from_major(amount))
    }

    fn first_of(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, 1).unwrap()
    }

    #[test]
    fn test_payments_are_popped_in_date_order() {
        let mut cursor = SortedPayments::new(vec![
            payment(3, 10, 300),
            payment(1, 15, 100),
            payment(2, 1, 200),
        ]);
        assert_eq!(cursor.first_date(), Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()));
        assert_eq!(cursor.total(), Amount::from_major(600));

        let january = cursor.pop_before(first_of(2));
        assert_eq!(january, vec![payment(1, 15, 100)]);

        let february = cursor.pop_before(first_of(3));
        assert_eq!(february, vec![payment(2, 1, 200)]);

        assert_eq!(cursor.peek(), Some(&payment(3, 10, 300)));
        assert!(!cursor.is_exhausted());
    }

    #[test]
    fn test_popped_payments_are_never_revisited() {
        let mut cursor = SortedPayments::new(vec![payment(1, 15, 100), payment(1, 20, 50)]);
        assert_eq!(cursor.pop_before(first_of(2)).len(), 2);
        assert!(cursor.pop_before(first_of(2)).is_empty());
        assert!(cursor.pop_before(first_of(12)).is_empty());
        assert!(cursor.is_exhausted());
        assert!(cursor.remaining().is_empty());
    }

    #[test]
    fn test_same_day_payments_keep_input_order() {
        let first = payment(5, 1, 1).with_description("first");
        let second = payment(5, 1, 2).with_description("second");
        let mut cursor = SortedPayments::new(vec![first.clone(), second.clone()]);
        assert_eq!(cursor.pop_before(first_of(6)), vec![first, second]);
    }
}
