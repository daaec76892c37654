/// Amounts derived from one reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillBreakdown {
    pub consumption: f64,
    pub base_charge: f64,
    pub vat_amount: f64,
    pub final_payment: f64,
}

/// Energy used since the previous reading. A meter that went backwards counts as zero.
pub fn consumption(current: f64, previous: f64) -> f64 {
    (current - previous).max(0.0)
}

pub fn vat_amount(consumption: f64, tariff_rate: f64, vat_percent: f64) -> f64 {
    consumption * tariff_rate * vat_percent / 100.0
}

/// Price a reading against the previous one for the same block.
///
/// Never fails: inputs are expected to be validated (parsed, non-negative)
/// before they get here, and a decreasing meter only floors consumption.
pub fn compute_bill(
    current: f64,
    previous: f64,
    tariff_rate: f64,
    vat_percent: f64,
    additional_fee: f64,
) -> BillBreakdown {
    let consumption = consumption(current, previous);
    let base_charge = consumption * tariff_rate;
    let vat_amount = base_charge * vat_percent / 100.0;

    BillBreakdown {
        consumption,
        base_charge,
        vat_amount,
        final_payment: base_charge + vat_amount + additional_fee,
    }
}
