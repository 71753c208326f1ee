//! Shared domain enumerations aligned with persisted database enums.

use serde::{Deserialize, Serialize};

pub use florista_api_types::MediaKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Customer,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Customer => "customer",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// Parse the `bouquet_media.kind` column.
pub fn parse_media_kind(value: &str) -> Option<MediaKind> {
    match value {
        "image" => Some(MediaKind::Image),
        "video" => Some(MediaKind::Video),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_round_trips_through_column_text() {
        for kind in [MediaKind::Image, MediaKind::Video] {
            assert_eq!(parse_media_kind(kind.as_str()), Some(kind));
        }
        assert_eq!(parse_media_kind("gif"), None);
    }

    #[test]
    fn only_admin_role_is_admin() {
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Customer.is_admin());
    }
}
