/// loan tracker - fixed then floating rate, a year of payments and a payoff estimate
use loan_ledger_rs::chrono::{Duration, TimeZone, Utc};
use loan_ledger_rs::{
    AmortizationLedger, Decimal, Loan, Money, Payment, PayoffPredictor, Rate, RateSegment,
    ReferenceRate,
};
use simple_logger::SimpleLogger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()?;

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    // 3 years fixed at 2.99%, then MRR - 1.5%
    let loan = Loan::new(
        "home",
        Money::from_major(2_000_000),
        start,
        vec![
            RateSegment::fixed(start, Rate::from_percent(Decimal::new(299, 2))),
            RateSegment::float(
                start + Duration::days(3 * 365),
                Rate::from_percent(Decimal::new(-150, 2)),
            ),
        ],
    )?;
    let mrr = vec![ReferenceRate::new(start, Rate::from_percent(Decimal::new(725, 2)))];

    let payments = (1..=12)
        .map(|month| {
            let amount = if month == 6 { 50_000 } else { 15_000 };
            Payment::new(loan.id, start + Duration::days(30 * month), Money::from_major(amount))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let ledger = AmortizationLedger::build(&loan, &payments, &mrr)?;
    for entry in &ledger.entries {
        println!(
            "{}  paid {:>10}  interest {:>9}  principal {:>10}  balance {:>12}  {}",
            entry.date,
            entry.amount.round_dp(2),
            entry.interest.round_dp(2),
            entry.principal_paid.round_dp(2),
            entry.remaining_principal.round_dp(2),
            entry.rate_breakdown,
        );
    }

    println!("{}", ledger.summary(&loan).to_json()?);

    let as_of = start + Duration::days(365);
    let prediction = PayoffPredictor::default().predict_at(
        &loan,
        &payments,
        ledger.current_balance(),
        &mrr,
        as_of,
    )?;
    match prediction {
        Some(prediction) => println!(
            "paid off in ~{} months ({} years) around {}, {:?} confidence",
            prediction.estimated_months_left,
            prediction.estimated_years_left,
            prediction.estimated_payoff_date.date_naive(),
            prediction.confidence,
        ),
        None => println!("no payoff estimate at the current payment trend"),
    }

    Ok(())
}
