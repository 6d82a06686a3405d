//! User-facing strings. The product ships in Turkish.

use crate::geolocation::GeoErrorKind;

pub const GENERIC_SUBMIT_ERROR: &str = "Bir hata oluştu. Lütfen tekrar deneyin.";
pub const REPORT_REASON_REQUIRED: &str = "Lütfen bir neden seçin.";
pub const QUOTE_SUBMITTED: &str = "Teklif talebiniz alındı.";
pub const REPORT_SUBMITTED: &str = "Bildiriminiz alındı. Teşekkür ederiz.";

/// Inline message for a required field left empty.
pub fn required_field(label: &str) -> String {
    format!("{label} alanı zorunludur.")
}

pub fn geolocation_error(kind: GeoErrorKind) -> &'static str {
    match kind {
        GeoErrorKind::PermissionDenied => "Konum izni reddedildi.",
        GeoErrorKind::PositionUnavailable => "Konum bilgisi alınamadı.",
        GeoErrorKind::Timeout => "Konum isteği zaman aşımına uğradı.",
        GeoErrorKind::Unsupported => "Cihazınız konum servisini desteklemiyor.",
    }
}
