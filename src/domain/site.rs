//! Site definitions referenced during conversion.

use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct SiteDefinition {
    pub id: Uuid,
    pub name: String,
    pub last_saved: OffsetDateTime,
}
