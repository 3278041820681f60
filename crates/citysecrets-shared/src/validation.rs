//! Field checks for spot creation and other user input.
//!
//! Each step check returns the first failing field, in form order.

use crate::error::ValidationError;
use crate::models::{Location, PhotoUpload};
use crate::types::SpotCategory;

/// Raw form input, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpotForm {
    pub name: String,
    pub description: String,
    pub category: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub latitude: String,
    pub longitude: String,
    pub photos: Vec<PhotoUpload>,
}

/// A fully validated creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotDraft {
    pub name: String,
    pub description: String,
    pub category: SpotCategory,
    pub location: Location,
    pub photos: Vec<PhotoUpload>,
}

fn required(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

/// Step 1: name, description, category.
pub fn validate_info(form: &SpotForm) -> Result<(), ValidationError> {
    required(&form.name, "Spot name")?;
    required(&form.description, "Description")?;
    required(&form.category, "Category")?;
    form.category.parse::<SpotCategory>()?;
    Ok(())
}

/// Step 2: location fields, with numeric coordinates.
pub fn validate_location(form: &SpotForm) -> Result<(), ValidationError> {
    required(&form.city, "City")?;
    required(&form.state, "State")?;
    required(&form.address, "Address")?;
    required(&form.latitude, "Latitude")?;
    required(&form.longitude, "Longitude")?;
    parse_coordinates(&form.latitude, &form.longitude)?;
    Ok(())
}

/// Step 3: at least one photo.
pub fn validate_photos(form: &SpotForm) -> Result<(), ValidationError> {
    if form.photos.is_empty() {
        return Err(ValidationError::NoPhotos);
    }
    Ok(())
}

/// Parse latitude / longitude, rejecting anything that is not a finite number.
pub fn parse_coordinates(latitude: &str, longitude: &str) -> Result<(f64, f64), ValidationError> {
    let lat: f64 = latitude
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidCoordinates)?;
    let lon: f64 = longitude
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidCoordinates)?;
    if !lat.is_finite() || !lon.is_finite() {
        return Err(ValidationError::InvalidCoordinates);
    }
    Ok((lat, lon))
}

/// Run every step and build the draft.
pub fn validate_form(form: &SpotForm) -> Result<SpotDraft, ValidationError> {
    validate_info(form)?;
    validate_location(form)?;
    validate_photos(form)?;

    let category = form.category.parse()?;
    let (latitude, longitude) = parse_coordinates(&form.latitude, &form.longitude)?;

    Ok(SpotDraft {
        name: form.name.trim().to_string(),
        description: form.description.trim().to_string(),
        category,
        location: Location {
            city: form.city.trim().to_string(),
            state: form.state.trim().to_string(),
            full_address: form.address.trim().to_string(),
            latitude,
            longitude,
        },
        photos: form.photos.clone(),
    })
}

pub fn validate_username(username: &str) -> Result<String, ValidationError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ValidationError::EmptyUsername);
    }
    Ok(username.to_string())
}

pub fn validate_comment(content: &str) -> Result<String, ValidationError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyComment);
    }
    Ok(content.to_string())
}
