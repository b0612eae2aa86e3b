/// rate scenarios - compare a fixed rate against a predicted rate change
use mortgage_simulator::chrono::NaiveDate;
use mortgage_simulator::{
    simulate, Amount, DayCountConvention, Fraction, InterestRate, Mortgage, MortgagePart, Payment,
    PredictedRate, Property, RepaymentScheme, SimulationSettings,
};
use rust_decimal_macros::dec;

fn settings(rate: InterestRate, extra: Option<Payment>) -> Result<SimulationSettings, Box<dyn std::error::Error>> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("invalid date")?;
    let mut part = MortgagePart::new(Amount::from_major(300_000), rate, RepaymentScheme::Annuity);
    if let Some(extra) = extra {
        part = part.with_extra_payment(extra);
    }
    let mortgage = Mortgage::builder().start_date(start).term_in_years(30).part(part).build()?;
    let property = Property::Existing {
        purchase: Payment::new(start, Amount::from_major(375_000)),
        appraised_value: Amount::from_major(375_000),
    };
    Ok(SimulationSettings::new(mortgage, property))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let convention = DayCountConvention::ThirtyE360;
    let fixed = InterestRate::fixed(Fraction::from_percentage(dec!(3.9)), convention);
    let predicted: InterestRate = PredictedRate::new(
        NaiveDate::from_ymd_opt(2034, 1, 1).ok_or("invalid date")?,
        InterestRate::fixed(Fraction::from_percentage(dec!(3.9)), convention),
        InterestRate::fixed(Fraction::from_percentage(dec!(5.2)), convention),
    )?
    .into();
    let bonus = Payment::new(NaiveDate::from_ymd_opt(2029, 6, 15).ok_or("invalid date")?, Amount::from_major(25_000))
        .with_description("bonus");

    let scenarios = [
        ("fixed 3.9%", settings(fixed.clone(), None)?),
        ("fixed 3.9% + extra", settings(fixed, Some(bonus.clone()))?),
        ("3.9% -> 5.2% in 2034", settings(predicted.clone(), None)?),
        ("3.9% -> 5.2% + extra", settings(predicted, Some(bonus))?),
    ];

    println!("{:<24} {:>14} {:>10} {:>10} {:>10}", "scenario", "interest", "p10", "median", "p90");
    for (name, settings) in &scenarios {
        let result = simulate(settings)?;
        let distribution = result.payment_distribution()?;
        println!(
            "{:<24} {:>14} {:>10} {:>10} {:>10}",
            name,
            result.total_interest().format(2)?,
            distribution.p10.format(2)?,
            distribution.median.format(2)?,
            distribution.p90.format(2)?
        );
    }

    let (_, baseline) = &scenarios[0];
    let result = simulate(baseline)?;
    println!("\nyearly totals for the baseline:");
    for year in result.yearly_summaries().iter().take(5) {
        println!(
            "{}  principal {:>10}  interest {:>10}  closing {:>12}",
            year.year,
            year.principal.format(2)?,
            year.interest.format(2)?,
            year.closing_balance.format(2)?
        );
    }

    Ok(())
}
