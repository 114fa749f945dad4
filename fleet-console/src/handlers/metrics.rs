use crate::error::ConsoleError;

pub async fn metrics() -> Result<String, ConsoleError> {
    Ok(crate::services::metrics::get_metrics()?)
}
