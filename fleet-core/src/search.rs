use crate::models::DriverStat;

/// Drivers whose id contains `query`, ignoring case, in feed order.
/// An empty query keeps every driver.
pub fn filter<'a>(drivers: &'a [DriverStat], query: &str) -> Vec<&'a DriverStat> {
    if query.is_empty() {
        return drivers.iter().collect();
    }
    let needle = query.to_lowercase();
    drivers
        .iter()
        .filter(|d| d.driver_id.to_lowercase().contains(&needle))
        .collect()
}
