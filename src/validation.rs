use crate::error::{ApiError, ApiResult};
use crate::models::{AddressForm, LoginRequest, RegisterRequest};

pub fn is_valid_pincode(pincode: &str) -> bool {
    (5..=8).contains(&pincode.len()) && pincode.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !email.chars().any(char::is_whitespace)
}

fn required(value: &str, label: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} is required", label)));
    }
    Ok(())
}

/// Trims the form and checks it before anything is sent.
pub fn address_form(form: &AddressForm) -> ApiResult<AddressForm> {
    let cleaned = AddressForm {
        recipient_name: form.recipient_name.trim().to_string(),
        street: form.street.trim().to_string(),
        city: form.city.trim().to_string(),
        state: form.state.trim().to_string(),
        pincode: form.pincode.trim().to_string(),
        country: form
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
    };

    required(&cleaned.recipient_name, "Recipient name")?;
    required(&cleaned.street, "Street")?;
    required(&cleaned.city, "City")?;
    required(&cleaned.state, "State")?;
    if !is_valid_pincode(&cleaned.pincode) {
        return Err(ApiError::Validation("Pincode must be 5 to 8 digits".to_string()));
    }
    Ok(cleaned)
}

pub fn login(request: &LoginRequest) -> ApiResult<()> {
    if !is_valid_email(request.email.trim()) {
        return Err(ApiError::Validation("Enter a valid email address".to_string()));
    }
    required(&request.password, "Password")
}

pub fn register(request: &RegisterRequest) -> ApiResult<()> {
    let name_len = request.user_name.trim().chars().count();
    if !(3..=30).contains(&name_len) {
        return Err(ApiError::Validation("User name must be 3 to 30 characters".to_string()));
    }
    if !is_valid_email(request.email.trim()) {
        return Err(ApiError::Validation("Enter a valid email address".to_string()));
    }
    if request.password.chars().count() < 6 {
        return Err(ApiError::Validation("Password must be at least 6 characters".to_string()));
    }
    Ok(())
}
