//! Roster API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::content;
use crate::models::{Contact, SaveContactRequest};
use crate::AppState;

/// GET /api/contacts - The roster, sorted by role.
pub async fn list_contacts(State(state): State<AppState>) -> ApiResult<Vec<Contact>> {
    success(content::load_roster(state.repos.contacts.as_ref()).await)
}

/// GET /api/contacts/:role - One contact.
pub async fn get_contact(State(state): State<AppState>, Path(role): Path<String>) -> ApiResult<Contact> {
    match content::find_contact(state.repos.contacts.as_ref(), &role).await {
        Ok(contact) => success(contact),
        Err(e) => error(e),
    }
}

/// PUT /api/contacts/:role - Create or replace the contact for a role.
pub async fn put_contact(
    State(state): State<AppState>,
    Path(role): Path<String>,
    Json(request): Json<SaveContactRequest>,
) -> ApiResult<Contact> {
    let contact = request.into_contact(&role);

    match content::save_contact(state.repos.contacts.as_ref(), &contact).await {
        Ok(contact) => success(contact),
        Err(e) => error(e),
    }
}

/// DELETE /api/contacts/:role - Remove a contact.
pub async fn delete_contact(State(state): State<AppState>, Path(role): Path<String>) -> ApiResult<()> {
    match content::remove_contact(state.repos.contacts.as_ref(), &role).await {
        Ok(()) => success(()),
        Err(e) => error(e),
    }
}
