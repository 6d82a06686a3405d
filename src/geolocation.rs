//! Device position lookups feeding `location` fields.
//!
//! A lookup is requested explicitly by the user, runs independently of the
//! submission state and may resolve long after it was issued. Each request
//! hands out a [`LocationTicket`]; a result is only applied while its ticket
//! is still the current one for the field.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::messages;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `"lat, lon"` with six decimals.
    pub fn to_text(&self) -> String {
        format!("{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Categorised reasons a lookup can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoErrorKind {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    Unsupported,
}

impl GeoErrorKind {
    /// Localized inline message.
    pub fn message(self) -> &'static str {
        messages::geolocation_error(self)
    }
}

/// Capability answering "where is the device right now".
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeoErrorKind>;
}

/// Provider for hosts without positioning support.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedGeolocation;

#[async_trait]
impl GeolocationProvider for UnsupportedGeolocation {
    async fn current_position(&self) -> Result<Coordinates, GeoErrorKind> {
        Err(GeoErrorKind::Unsupported)
    }
}

/// Always answers with the same position. Used by the CLI `--position` flag.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl GeolocationProvider for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates, GeoErrorKind> {
        Ok(self.0)
    }
}

/// Runs one lookup, mapping an elapsed `limit` to [`GeoErrorKind::Timeout`].
pub async fn locate_with_timeout<G: GeolocationProvider + ?Sized>(
    provider: &G,
    limit: Duration,
) -> Result<Coordinates, GeoErrorKind> {
    match tokio::time::timeout(limit, provider.current_position()).await {
        Ok(result) => result,
        Err(_) => Err(GeoErrorKind::Timeout),
    }
}

/// Lookup status of a single location field.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LocationStatus {
    #[default]
    Idle,
    Pending,
    Located(Coordinates),
    Failed(GeoErrorKind),
}

impl LocationStatus {
    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            LocationStatus::Failed(kind) => Some(kind.message()),
            _ => None,
        }
    }
}

/// Proof of an outstanding lookup for one field.
#[derive(Debug, PartialEq, Eq)]
pub struct LocationTicket {
    field_id: String,
    token: u64,
}

impl LocationTicket {
    pub fn field_id(&self) -> &str {
        &self.field_id
    }
}

/// Per-field lookup bookkeeping owned by a wizard.
#[derive(Debug, Default)]
pub(crate) struct LocationLookups {
    next_token: u64,
    pending: HashMap<String, u64>,
    statuses: HashMap<String, LocationStatus>,
}

impl LocationLookups {
    /// Issues a ticket unless a lookup for the field is already pending.
    pub(crate) fn begin(&mut self, field_id: &str) -> Option<LocationTicket> {
        if self.pending.contains_key(field_id) {
            return None;
        }
        self.next_token += 1;
        let token = self.next_token;
        self.pending.insert(field_id.to_string(), token);
        self.statuses
            .insert(field_id.to_string(), LocationStatus::Pending);
        Some(LocationTicket {
            field_id: field_id.to_string(),
            token,
        })
    }

    /// Consumes the ticket; returns `false` for stale tickets, whose result
    /// must be dropped.
    pub(crate) fn settle(
        &mut self,
        ticket: &LocationTicket,
        result: Result<Coordinates, GeoErrorKind>,
    ) -> bool {
        if self.pending.get(&ticket.field_id) != Some(&ticket.token) {
            return false;
        }
        self.pending.remove(&ticket.field_id);
        let status = match result {
            Ok(coordinates) => LocationStatus::Located(coordinates),
            Err(kind) => LocationStatus::Failed(kind),
        };
        self.statuses.insert(ticket.field_id.clone(), status);
        true
    }

    pub(crate) fn abandon(&mut self, field_id: &str) {
        if self.pending.remove(field_id).is_some() {
            self.statuses.insert(field_id.to_string(), LocationStatus::Idle);
        }
    }

    /// Abandons the lookup only if `ticket` is still the pending one.
    pub(crate) fn discard(&mut self, ticket: &LocationTicket) {
        if self.pending.get(&ticket.field_id) == Some(&ticket.token) {
            self.abandon(&ticket.field_id);
        }
    }

    pub(crate) fn abandon_all(&mut self) {
        let fields: Vec<String> = self.pending.keys().cloned().collect();
        for field in fields {
            self.abandon(&field);
        }
    }

    pub(crate) fn clear_failure(&mut self, field_id: &str) {
        if matches!(self.statuses.get(field_id), Some(LocationStatus::Failed(_))) {
            self.statuses.insert(field_id.to_string(), LocationStatus::Idle);
        }
    }

    pub(crate) fn status(&self, field_id: &str) -> LocationStatus {
        self.statuses.get(field_id).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Never;

    #[async_trait]
    impl GeolocationProvider for Never {
        async fn current_position(&self) -> Result<Coordinates, GeoErrorKind> {
            std::future::pending().await
        }
    }

    #[test]
    fn second_request_while_pending_is_ignored() {
        let mut lookups = LocationLookups::default();
        assert!(lookups.begin("address").is_some());
        assert!(lookups.begin("address").is_none());
        assert_eq!(lookups.status("address"), LocationStatus::Pending);
    }

    #[test]
    fn abandoned_ticket_does_not_apply() {
        let mut lookups = LocationLookups::default();
        let ticket = lookups.begin("address").unwrap();
        lookups.abandon("address");
        assert!(!lookups.settle(&ticket, Ok(Coordinates::new(1.0, 2.0))));
        assert_eq!(lookups.status("address"), LocationStatus::Idle);
    }

    #[test]
    fn discarding_stale_ticket_keeps_newer_lookup() {
        let mut lookups = LocationLookups::default();
        let first = lookups.begin("address").unwrap();
        lookups.abandon("address");
        let second = lookups.begin("address").unwrap();

        lookups.discard(&first);
        assert_eq!(lookups.status("address"), LocationStatus::Pending);
        lookups.discard(&second);
        assert_eq!(lookups.status("address"), LocationStatus::Idle);
    }

    #[test]
    fn superseded_ticket_is_stale() {
        let mut lookups = LocationLookups::default();
        let first = lookups.begin("address").unwrap();
        lookups.abandon("address");
        let second = lookups.begin("address").unwrap();
        assert!(!lookups.settle(&first, Err(GeoErrorKind::Timeout)));
        assert!(lookups.settle(&second, Err(GeoErrorKind::PermissionDenied)));
        assert_eq!(
            lookups.status("address").error_message(),
            Some("Konum izni reddedildi.")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let result = locate_with_timeout(&Never, Duration::from_secs(5)).await;
        assert_eq!(result, Err(GeoErrorKind::Timeout));
    }

    #[tokio::test]
    async fn fixed_position_resolves_within_limit() {
        let provider = FixedPosition(Coordinates::new(41.0082, 28.9784));
        let result = locate_with_timeout(&provider, Duration::from_secs(1)).await;
        assert_eq!(result.map(|c| c.to_text()).as_deref(), Ok("41.008200, 28.978400"));
    }

    #[tokio::test]
    async fn unsupported_provider_reports_kind() {
        let result = UnsupportedGeolocation.current_position().await;
        assert_eq!(result, Err(GeoErrorKind::Unsupported));
    }
}
