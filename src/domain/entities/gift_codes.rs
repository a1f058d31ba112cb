use chrono::Duration;
use rand::Rng;
use uuid::Uuid;

use crate::domain::value_objects::random_codes::random_gift_code;

#[derive(Debug, Clone, PartialEq)]
pub struct GiftCodeEntity {
    pub id: Uuid,
    pub code: String,
    pub granted_duration: Duration,
    /// Only redeemable by accounts that are not currently paid.
    pub free_only: bool,
    pub redeemed_by: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertGiftCodeEntity {
    pub code: String,
    pub granted_duration: Duration,
    pub free_only: bool,
}

impl InsertGiftCodeEntity {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, granted_duration: Duration, free_only: bool) -> Self {
        Self {
            code: random_gift_code(rng),
            granted_duration,
            free_only,
        }
    }

    pub fn into_entity(self, id: Uuid) -> GiftCodeEntity {
        GiftCodeEntity {
            id,
            code: self.code,
            granted_duration: self.granted_duration,
            free_only: self.free_only,
            redeemed_by: None,
        }
    }
}

impl GiftCodeEntity {
    pub fn is_redeemed(&self) -> bool {
        self.redeemed_by.is_some()
    }
}
