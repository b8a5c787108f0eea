use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// The two kinds of account on the platform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Farmer,
    Consumer,
}

impl Role {
    /// Case-insensitive, whitespace-tolerant parse.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "farmer" => Some(Role::Farmer),
            "consumer" => Some(Role::Consumer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Farmer => "farmer",
            Role::Consumer => "consumer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row as stored in the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub mobile: String,
    pub password_hash: String,
    pub role: String,
    pub name: String,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub alternate_phone: Option<String>,
    pub aadhar_number: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
    pub pincode: Option<String>,
    pub soil_type: Option<String>,
    pub land_area: Option<String>,
    pub primary_crops: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Farming attributes; present only on farmer accounts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FarmDetails {
    pub soil_type: Option<String>,
    pub land_area: Option<String>,
    pub primary_crops: Option<String>,
}

/// Registered user.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub mobile: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string
    pub role: Role,
    pub name: String,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub alternate_phone: Option<String>,
    pub aadhar_number: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
    pub pincode: Option<String>,
    pub farm: FarmDetails,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&r.role)
            .ok_or_else(|| anyhow::anyhow!("unknown role {:?} on user {}", r.role, r.id))?;
        Ok(Self {
            id: r.id,
            mobile: r.mobile,
            password_hash: r.password_hash,
            role,
            name: r.name,
            email: r.email,
            age: r.age,
            alternate_phone: r.alternate_phone,
            aadhar_number: r.aadhar_number,
            state: r.state,
            district: r.district,
            village: r.village,
            pincode: r.pincode,
            farm: FarmDetails {
                soil_type: r.soil_type,
                land_area: r.land_area,
                primary_crops: r.primary_crops,
            },
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Validated input for a new user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub mobile: String,
    pub password_hash: String,
    pub role: Role,
    pub name: String,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub alternate_phone: Option<String>,
    pub aadhar_number: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
    pub pincode: Option<String>,
    pub farm: FarmDetails,
}

/// Fields mutable through the profile endpoint. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ProfileUpdate::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_is_case_insensitive_and_trimmed() {
        assert_eq!(Role::parse("  Farmer "), Some(Role::Farmer));
        assert_eq!(Role::parse("CONSUMER"), Some(Role::Consumer));
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn user_row_with_unknown_role_is_rejected() {
        let now = OffsetDateTime::now_utc();
        let row = UserRow {
            id: Uuid::new_v4(),
            mobile: "9876543210".into(),
            password_hash: "x".into(),
            role: "wizard".into(),
            name: "Asha".into(),
            email: None,
            age: None,
            alternate_phone: None,
            aadhar_number: None,
            state: None,
            district: None,
            village: None,
            pincode: None,
            soil_type: None,
            land_area: None,
            primary_crops: None,
            created_at: now,
            updated_at: now,
        };
        assert!(User::try_from(row).is_err());
    }

    #[test]
    fn user_serialization_never_exposes_password_hash() {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            mobile: "9876543210".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::Consumer,
            name: "Ravi".into(),
            email: None,
            age: None,
            alternate_phone: None,
            aadhar_number: None,
            state: None,
            district: None,
            village: None,
            pincode: None,
            farm: FarmDetails::default(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"role\":\"consumer\""));
    }
}
