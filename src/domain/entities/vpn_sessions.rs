use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// One tunnel connection reported by a gateway. `gateway_id` and `profile_id`
/// are opaque references owned by the gateway side.
#[derive(Debug, Clone, PartialEq)]
pub struct VpnSessionEntity {
    pub id: Uuid,
    pub account_id: Uuid,
    pub gateway_id: Uuid,
    pub gateway_version: i32,
    pub profile_id: Option<Uuid>,
    pub connect_date: DateTime<Utc>,
    pub disconnect_date: Option<DateTime<Utc>>,
    pub remote_addr: String,
    pub internal_ip4: Option<String>,
    pub internal_ip6: Option<String>,
    pub bytes_up: Option<i64>,
    pub bytes_down: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertVpnSessionEntity {
    pub account_id: Uuid,
    pub gateway_id: Uuid,
    pub gateway_version: i32,
    pub profile_id: Option<Uuid>,
    pub connect_date: DateTime<Utc>,
    pub remote_addr: String,
    pub internal_ip4: Option<String>,
    pub internal_ip6: Option<String>,
}

/// Final counters written when a session ends.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseVpnSessionEntity {
    pub disconnect_date: DateTime<Utc>,
    pub bytes_up: Option<i64>,
    pub bytes_down: Option<i64>,
}

impl VpnSessionEntity {
    pub fn is_online(&self) -> bool {
        self.disconnect_date.is_none()
    }

    /// Time between connect and disconnect. `None` while still online.
    pub fn duration(&self) -> Option<Duration> {
        self.disconnect_date
            .map(|disconnect_date| disconnect_date - self.connect_date)
    }

    pub fn close(&mut self, close: CloseVpnSessionEntity) {
        self.disconnect_date = Some(close.disconnect_date);
        self.bytes_up = close.bytes_up;
        self.bytes_down = close.bytes_down;
    }
}

impl InsertVpnSessionEntity {
    pub fn into_entity(self, id: Uuid) -> VpnSessionEntity {
        VpnSessionEntity {
            id,
            account_id: self.account_id,
            gateway_id: self.gateway_id,
            gateway_version: self.gateway_version,
            profile_id: self.profile_id,
            connect_date: self.connect_date,
            disconnect_date: None,
            remote_addr: self.remote_addr,
            internal_ip4: self.internal_ip4,
            internal_ip6: self.internal_ip6,
            bytes_up: None,
            bytes_down: None,
        }
    }
}
