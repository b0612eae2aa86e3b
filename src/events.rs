use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Amount, Fraction};
use crate::types::MortgagePartId;

/// everything noteworthy that happens during a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimulationEvent {
    // rate events
    InterestRateChanged {
        part_id: MortgagePartId,
        date: NaiveDate,
        old_rate: Fraction,
        new_rate: Fraction,
    },

    // extra payment events
    ExtraPaymentApplied {
        part_id: MortgagePartId,
        date: NaiveDate,
        amount: Amount,
    },
    /// `part_id` is `None` for an extra payment on the mortgage as a whole
    ExtraPaymentClamped {
        part_id: Option<MortgagePartId>,
        date: NaiveDate,
        requested: Amount,
        applied: Amount,
    },

    // construction account events
    ConstructionBillPaid {
        date: NaiveDate,
        amount: Amount,
        description: Option<String>,
    },
    ConstructionInterestStopped {
        date: NaiveDate,
    },

    // lifecycle
    MortgageRepaid {
        date: NaiveDate,
    },
}

impl SimulationEvent {
    /// the day the event took effect
    pub fn date(&self) -> NaiveDate {
        match self {
            SimulationEvent::InterestRateChanged { date, .. }
            | SimulationEvent::ExtraPaymentApplied { date, .. }
            | SimulationEvent::ExtraPaymentClamped { date, .. }
            | SimulationEvent::ConstructionBillPaid { date, .. }
            | SimulationEvent::ConstructionInterestStopped { date }
            | SimulationEvent::MortgageRepaid { date } => *date,
        }
    }

    /// the mortgage part the event concerns, if any
    pub fn part_id(&self) -> Option<MortgagePartId> {
        match self {
            SimulationEvent::InterestRateChanged { part_id, .. }
            | SimulationEvent::ExtraPaymentApplied { part_id, .. } => Some(*part_id),
            SimulationEvent::ExtraPaymentClamped { part_id, .. } => *part_id,
            _ => None,
        }
    }
}

/// event store collecting events during a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventStore {
    events: Vec<SimulationEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: SimulationEvent) {
        log::trace!("event: {event:?}");
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<SimulationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[SimulationEvent] {
        &self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimulationEvent> {
        self.events.iter()
    }

    /// events concerning one mortgage part
    pub fn for_part(&self, part_id: MortgagePartId) -> impl Iterator<Item = &SimulationEvent> {
        self.events.iter().filter(move |event| event.part_id() == Some(part_id))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_store_collects_in_order() {
        let part = Uuid::new_v4();
        let mut store = EventStore::new();
        assert!(store.is_empty());

        store.emit(SimulationEvent::ConstructionBillPaid {
            date: date(2024, 1, 10),
            amount: Amount::from_major(40_000),
            description: Some("foundation".to_string()),
        });
        store.emit(SimulationEvent::ExtraPaymentApplied {
            part_id: part,
            date: date(2024, 2, 1),
            amount: Amount::from_major(5_000),
        });

        assert_eq!(store.len(), 2);
        assert_eq!(store.events()[0].date(), date(2024, 1, 10));
        assert_eq!(store.for_part(part).count(), 1);
        assert_eq!(store.events()[0].part_id(), None);

        let taken = store.take_events();
        assert_eq!(taken.len(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_events_serialize_by_variant_name() {
        let event = SimulationEvent::MortgageRepaid { date: date(2054, 1, 1) };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"MortgageRepaid":{"date":"2054-01-01"}}"#);
    }
}
