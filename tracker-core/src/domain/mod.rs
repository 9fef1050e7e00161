pub mod financial_goals;
pub mod health_screening;
pub mod mortgage;
pub mod time_audit;
pub mod vehicle_maintenance;

/// Rounds a money amount to whole cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::round_cents;

    #[test]
    fn rounds_to_cents() {
        assert_eq!(round_cents(937.499), 937.5);
        assert_eq!(round_cents(10.0 / 3.0), 3.33);
        assert_eq!(round_cents(-12.344), -12.34);
    }
}
