use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::repo_types::{Role, User};

/// Accepts a string, a number, or null. Forms post `age` and phone numbers either way.
fn lenient_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
    }
    Ok(Option::<Raw>::deserialize(d)?.map(|raw| match raw {
        Raw::Str(s) => s,
        Raw::Int(i) => i.to_string(),
        Raw::Float(f) => f.to_string(),
    }))
}

/// Request body for registration. Every field is optional at the wire level;
/// the registration validator decides what is required for the role.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mobile: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub alternate_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub aadhar_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub village: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pincode: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub soil_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub land_area: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub primary_crops: Option<String>,
}

impl RegisterRequest {
    /// Raw submitted value of a field by its wire name.
    pub fn field(&self, name: &str) -> Option<&str> {
        let v = match name {
            "role" => &self.role,
            "name" => &self.name,
            "mobile" => &self.mobile,
            "password" => &self.password,
            "email" => &self.email,
            "age" => &self.age,
            "alternate_phone" => &self.alternate_phone,
            "aadhar_number" => &self.aadhar_number,
            "state" => &self.state,
            "district" => &self.district,
            "village" => &self.village,
            "pincode" => &self.pincode,
            "soil_type" => &self.soil_type,
            "land_area" => &self.land_area,
            "primary_crops" => &self.primary_crops,
            _ => return None,
        };
        v.as_deref()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub mobile: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Body of `PUT /profile`. Anything other than these fields is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocationView {
    pub state: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
    pub pincode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub role: Role,
    pub user_id: Uuid,
    pub name: String,
    pub access_token: String,
    pub token_type: &'static str,
    pub location: LocationView,
}

/// Public part of the user returned by `GET /profile`.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub role: Role,
    pub state: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
    pub pincode: Option<String>,
}

impl From<&User> for LocationView {
    fn from(u: &User) -> Self {
        Self {
            state: u.state.clone(),
            district: u.district.clone(),
            village: u.village.clone(),
            pincode: u.pincode.clone(),
        }
    }
}

impl From<User> for ProfileResponse {
    fn from(u: User) -> Self {
        Self {
            name: u.name,
            mobile: u.mobile,
            email: u.email,
            role: u.role,
            state: u.state,
            district: u.district,
            village: u.village,
            pincode: u.pincode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_accepts_numbers_and_nulls() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"role":"farmer","age":42,"pincode":560001,"email":null,"land_area":"2.5"}"#,
        )
        .unwrap();
        assert_eq!(req.field("age"), Some("42"));
        assert_eq!(req.field("pincode"), Some("560001"));
        assert_eq!(req.field("email"), None);
        assert_eq!(req.field("land_area"), Some("2.5"));
        assert_eq!(req.field("soil_type"), None);
        assert_eq!(req.field("no_such_field"), None);
    }

    #[test]
    fn update_request_ignores_immutable_fields() {
        let req: UpdateProfileRequest =
            serde_json::from_str(r#"{"name":"New","mobile":"111","role":"farmer"}"#).unwrap();
        assert_eq!(req.name.as_deref(), Some("New"));
        assert!(req.email.is_none());
    }
}
