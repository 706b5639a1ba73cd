//! Access-control roles and default-admin transfer state

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{aliases::U48, keccak256, Address, B256};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A role known to the registry's access control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// `DEFAULT_ADMIN_ROLE`, the zero hash
    DefaultAdmin,
    /// `ADMIN_ROLE`
    Admin,
    /// `NODE_MANAGER_ROLE`
    NodeManager,
    /// Any other role id
    Custom(B256),
}

impl Role {
    pub const KNOWN: [Role; 3] = [Role::DefaultAdmin, Role::Admin, Role::NodeManager];

    /// The 32-byte role id used on chain
    pub fn id(&self) -> B256 {
        match self {
            Role::DefaultAdmin => B256::ZERO,
            Role::Admin => keccak256("ADMIN_ROLE"),
            Role::NodeManager => keccak256("NODE_MANAGER_ROLE"),
            Role::Custom(id) => *id,
        }
    }

    /// Map a role id back to a known role where possible
    pub fn from_id(id: B256) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|role| role.id() == id)
            .unwrap_or(Role::Custom(id))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::DefaultAdmin => write!(f, "DEFAULT_ADMIN_ROLE"),
            Role::Admin => write!(f, "ADMIN_ROLE"),
            Role::NodeManager => write!(f, "NODE_MANAGER_ROLE"),
            Role::Custom(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "default-admin" | "default-admin-role" => Ok(Role::DefaultAdmin),
            "admin" | "admin-role" => Ok(Role::Admin),
            "node-manager" | "node-manager-role" | "manager" => Ok(Role::NodeManager),
            _ => s
                .trim()
                .parse::<B256>()
                .map(Role::from_id)
                .map_err(|_| format!("unknown role '{s}' (expected a role name or 32-byte hex)")),
        }
    }
}

/// A scheduled default-admin transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingAdminTransfer {
    pub new_admin: Address,
    pub schedule: U48,
}

impl PendingAdminTransfer {
    /// Nothing is pending when the schedule is unset
    pub fn is_pending(&self) -> bool {
        !self.schedule.is_zero()
    }

    /// Whether the new admin may accept at `now` (unix seconds)
    pub fn is_acceptable_at(&self, now: u64) -> bool {
        self.is_pending() && self.schedule.to::<u64>() <= now
    }

    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        schedule_time(self.schedule)
    }
}

/// A scheduled default-admin delay change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingDelayChange {
    pub new_delay: U48,
    pub schedule: U48,
}

impl PendingDelayChange {
    pub fn is_pending(&self) -> bool {
        !self.schedule.is_zero()
    }

    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        schedule_time(self.schedule)
    }
}

/// Convert a uint48 schedule to a UTC timestamp; zero means unset
pub fn schedule_time(schedule: U48) -> Option<DateTime<Utc>> {
    if schedule.is_zero() {
        return None;
    }
    DateTime::<Utc>::from_timestamp(schedule.to::<u64>() as i64, 0)
}

/// Render a delay in seconds as `1d 2h 3m 4s`
pub fn format_delay(delay: U48) -> String {
    let mut secs = delay.to::<u64>();
    if secs == 0 {
        return "0s".to_string();
    }
    let mut parts = Vec::new();
    for (unit, label) in [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")] {
        if secs >= unit {
            parts.push(format!("{}{}", secs / unit, label));
            secs %= unit;
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ids() {
        assert_eq!(Role::DefaultAdmin.id(), B256::ZERO);
        assert_eq!(Role::Admin.id(), keccak256(b"ADMIN_ROLE"));
        assert_eq!(Role::from_id(keccak256(b"NODE_MANAGER_ROLE")), Role::NodeManager);
        assert_eq!(Role::from_id(B256::repeat_byte(1)), Role::Custom(B256::repeat_byte(1)));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("NODE_MANAGER_ROLE".parse::<Role>().unwrap(), Role::NodeManager);
        assert_eq!("default-admin".parse::<Role>().unwrap(), Role::DefaultAdmin);

        let hex = format!("0x{}", hex::encode(keccak256(b"ADMIN_ROLE")));
        assert_eq!(hex.parse::<Role>().unwrap(), Role::Admin);

        assert!("operator".parse::<Role>().is_err());
    }

    #[test]
    fn test_pending_transfer() {
        let idle = PendingAdminTransfer {
            new_admin: Address::ZERO,
            schedule: U48::ZERO,
        };
        assert!(!idle.is_pending());
        assert!(idle.scheduled_at().is_none());
        assert!(!idle.is_acceptable_at(u64::MAX));

        let pending = PendingAdminTransfer {
            new_admin: Address::repeat_byte(7),
            schedule: U48::from(1_700_000_000u64),
        };
        assert!(pending.is_pending());
        assert!(!pending.is_acceptable_at(1_699_999_999));
        assert!(pending.is_acceptable_at(1_700_000_000));
        assert_eq!(
            pending.scheduled_at().unwrap().to_rfc3339(),
            "2023-11-14T22:13:20+00:00"
        );
    }

    #[test]
    fn test_format_delay() {
        assert_eq!(format_delay(U48::ZERO), "0s");
        assert_eq!(format_delay(U48::from(90u64)), "1m 30s");
        assert_eq!(format_delay(U48::from(86_400u64 * 3 + 7_200)), "3d 2h");
    }
}
