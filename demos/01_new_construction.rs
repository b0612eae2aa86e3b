/// new construction - two parts, LTV-tiered rates and a construction account
use mortgage_simulator::chrono::NaiveDate;
use mortgage_simulator::{
    simulate, Amount, ConstructionAccountPolicy, ConstructionInstallment, DayCountConvention,
    DynamicLtvRate, Fraction, Mortgage, MortgagePart, Payment, Property, RepaymentScheme,
    RoundingMode, SimulationSettings,
};
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    Ok(NaiveDate::from_ymd_opt(y, m, d).ok_or("invalid date")?)
}

fn tiers() -> Result<DynamicLtvRate, Box<dyn std::error::Error>> {
    let pct = Fraction::from_percentage;
    Ok(DynamicLtvRate::new(
        vec![
            (pct(dec!(60)), pct(dec!(3.58))),
            (pct(dec!(80)), pct(dec!(3.67))),
            (pct(dec!(90)), pct(dec!(3.77))),
            (pct(dec!(100)), pct(dec!(3.82))),
        ],
        pct(dec!(3.87)),
        DayCountConvention::ThirtyE360Isda,
    )?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mortgage = Mortgage::builder()
        .start_date(date(2023, 11, 17)?)
        .term_in_years(30)
        .part(MortgagePart::new(Amount::from_major(350_000), tiers()?.into(), RepaymentScheme::Annuity))
        .part(MortgagePart::new(Amount::from_major(350_000), tiers()?.into(), RepaymentScheme::Linear))
        .build()?;

    // the builder invoices shares of the contract sum, rounded up
    let contract = Amount::from_major(300_000);
    let stages = [
        (date(2023, 12, 12)?, dec!(15), "foundation"),
        (date(2024, 2, 20)?, dec!(25), "structure"),
        (date(2024, 5, 15)?, dec!(25), "roof"),
        (date(2024, 9, 10)?, dec!(25), "finishing"),
        (date(2025, 1, 20)?, dec!(10), "delivery"),
    ];
    let installments = stages
        .into_iter()
        .map(|(date, share, description)| {
            ConstructionInstallment::share_of(
                date,
                &contract,
                &Fraction::from_percentage(share),
                RoundingMode::Ceiling,
                description,
            )
        })
        .collect();

    let property = Property::NewConstruction {
        notarial_payment: Payment::new(date(2023, 11, 17)?, Amount::from_major(450_000)),
        construction_installments: installments,
        declared_value: Amount::from_major(725_000),
    };

    let settings = SimulationSettings::new(mortgage, property)
        .with_construction_policy(ConstructionAccountPolicy::with_interest_months(12));
    let result = simulate(&settings)?;

    println!("month     collected   construction credit   depot");
    for month in result.months.iter().take(18) {
        let (credit, depot) = match &month.construction {
            Some(construction) => (construction.interest_deducted.clone(), construction.balance_after()),
            None => (Amount::zero(), Amount::zero()),
        };
        println!(
            "{}  {:>10}  {:>20}  {:>10}",
            month.month,
            month.amount_collected().format(2)?,
            credit.format(2)?,
            depot.format(2)?
        );
    }

    println!("\nevents:");
    for event in result.events.iter() {
        println!("  {event:?}");
    }

    Ok(())
}
