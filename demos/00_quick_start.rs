/// quick start - minimal example to get started
use mortgage_simulator::chrono::NaiveDate;
use mortgage_simulator::{
    simulate, Amount, DayCountConvention, Fraction, InterestRate, Mortgage, MortgagePart, Payment,
    Property, RepaymentScheme, SimulationSettings,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("invalid date")?;

    // a 250,000 annuity at 4.1% over 30 years
    let mortgage = Mortgage::builder()
        .start_date(start)
        .term_in_years(30)
        .part(MortgagePart::new(
            Amount::from_major(250_000),
            InterestRate::fixed(Fraction::from_percentage(dec!(4.1)), DayCountConvention::ThirtyE360),
            RepaymentScheme::Annuity,
        ))
        .build()?;

    let property = Property::Existing {
        purchase: Payment::new(start, Amount::from_major(300_000)),
        appraised_value: Amount::from_major(310_000),
    };

    let result = simulate(&SimulationSettings::new(mortgage, property))?;

    for month in result.months.iter().take(12) {
        println!(
            "{}  due {:>10}  interest {:>10}  balance {:>12}",
            month.month,
            month.payment.total_due().format(2)?,
            month.payment.interest().format(2)?,
            month.payment.balance_after().format(2)?
        );
    }
    println!("total interest: {}", result.total_interest().format(2)?);

    Ok(())
}
