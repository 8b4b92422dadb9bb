use crate::error::Result;

/// Reverse geocoding: coordinates to a human readable address
///
/// `Ok(None)` means the lookup worked but found nothing; lookup problems are
/// `RecorderError::LookupFailure`.
#[async_trait::async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Option<String>>;
}
