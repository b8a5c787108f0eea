use lazy_static::lazy_static;
use regex::Regex;

use super::dto::RegisterRequest;
use super::repo_types::{FarmDetails, NewUser, Role};
use crate::error::AppError;

const ALWAYS_REQUIRED: &[&str] = &["name", "mobile", "password"];

const FARMER_REQUIRED: &[&str] = &[
    "age",
    "alternate_phone",
    "aadhar_number",
    "state",
    "district",
    "village",
    "pincode",
    "soil_type",
    "land_area",
    "primary_crops",
];

const CONSUMER_REQUIRED: &[&str] = &["alternate_phone", "state", "district", "village"];

/// Fields stored as bare digit strings; forms send them with spaces or dashes.
const DIGIT_FIELDS: &[&str] = &["mobile", "alternate_phone", "aadhar_number", "pincode"];

fn digits_only(s: &str) -> String {
    lazy_static! {
        static ref NON_DIGIT: Regex = Regex::new(r"\D").unwrap();
    }
    NON_DIGIT.replace_all(s, "").into_owned()
}

/// Ordered list of fields a registration for `role` must carry.
pub fn required_fields(role: Role) -> Vec<&'static str> {
    let specific = match role {
        Role::Farmer => FARMER_REQUIRED,
        Role::Consumer => CONSUMER_REQUIRED,
    };
    ALWAYS_REQUIRED.iter().chain(specific).copied().collect()
}

/// Cleaned value of a submitted field, or `None` if it counts as absent.
fn cleaned(req: &RegisterRequest, field: &str) -> Option<String> {
    let raw = req.field(field)?;
    let value = if DIGIT_FIELDS.contains(&field) {
        digits_only(raw)
    } else {
        raw.trim().to_string()
    };
    (!value.is_empty()).then_some(value)
}

fn missing_fields(role: Role, req: &RegisterRequest) -> Vec<String> {
    required_fields(role)
        .into_iter()
        .filter(|f| match *f {
            // stored verbatim, but whitespace alone is still no password
            "password" => req.password.as_deref().map_or(true, |p| p.trim().is_empty()),
            other => cleaned(req, other).is_none(),
        })
        .map(str::to_string)
        .collect()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trimmed, lowercased email, or `InvalidField` if it is not shaped like one.
pub fn checked_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::InvalidField {
            field: "email",
            reason: "must be a valid email address".into(),
        });
    }
    Ok(email)
}

fn checked_age(req: &RegisterRequest) -> Result<Option<i32>, AppError> {
    cleaned(req, "age")
        .map(|a| {
            a.parse::<i32>().map_err(|_| AppError::InvalidField {
                field: "age",
                reason: "must be a whole number".into(),
            })
        })
        .transpose()
}

/// A registration that passed every check; only the password still needs hashing.
pub struct ValidRegistration {
    password: String,
    draft: NewUser,
}

impl ValidRegistration {
    pub fn role(&self) -> Role {
        self.draft.role
    }

    pub fn mobile(&self) -> &str {
        &self.draft.mobile
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            password_hash,
            ..self.draft
        }
    }
}

impl std::fmt::Debug for ValidRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidRegistration")
            .field("role", &self.draft.role)
            .field("mobile", &self.draft.mobile)
            .finish_non_exhaustive()
    }
}

/// Role check, then required fields, then field formats. Each failure short-circuits the next.
pub fn validate(req: &RegisterRequest) -> Result<ValidRegistration, AppError> {
    let role = req
        .role
        .as_deref()
        .and_then(Role::parse)
        .ok_or(AppError::InvalidRole)?;

    let missing = missing_fields(role, req);
    if !missing.is_empty() {
        return Err(AppError::MissingFields(missing));
    }

    let age = checked_age(req)?;
    let email = req
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .map(checked_email)
        .transpose()?;

    Ok(ValidRegistration {
        password: req.password.clone().unwrap_or_default(),
        draft: NewUser {
            mobile: cleaned(req, "mobile").unwrap_or_default(),
            password_hash: String::new(),
            role,
            name: cleaned(req, "name").unwrap_or_default(),
            email,
            age,
            alternate_phone: cleaned(req, "alternate_phone"),
            aadhar_number: cleaned(req, "aadhar_number"),
            state: cleaned(req, "state"),
            district: cleaned(req, "district"),
            village: cleaned(req, "village"),
            pincode: cleaned(req, "pincode"),
            farm: FarmDetails {
                soil_type: cleaned(req, "soil_type"),
                land_area: cleaned(req, "land_area"),
                primary_crops: cleaned(req, "primary_crops"),
            },
        },
    })
}

/// Mobile as it is keyed in the directory.
pub fn normalize_mobile(raw: &str) -> String {
    digits_only(raw)
}
