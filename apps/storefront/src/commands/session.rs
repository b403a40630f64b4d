//! # Session Commands
//!
//! Server-held configuration sessions. The shopper's picks live in a
//! [`ConfigurationSession`](crate::state::ConfigurationSession); every call
//! reloads the product snapshot and runs forma-core against the session's
//! selection.
//!
//! A pick is accepted only if the resolver offers it against the session's
//! selection at the moment of the write, so a session can never hold an
//! option the validator would reject because of a rule, even when picks on
//! the same session overlap.

use std::time::Instant;

use forma_core::resolver::{available_options_with_mode, is_option_available, resolve_all};
use forma_core::{AvailableOptions, CoreError, EffectiveProduct, OptionRef, Selection};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::configure::{configured_line, ConfiguredLine};
use super::load_product;
use crate::error::ApiError;
use crate::state::{ConfigState, ConfigurationSession, DbState, SessionState};

/// A session with what the shopper may pick next.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: Uuid,
    pub product_id: String,
    pub selections: Selection,
    /// Per live attribute, resolved without that attribute's own pick.
    pub available: Vec<AvailableOptions>,
    /// Every live attribute has a pick.
    pub complete: bool,
}

fn session_view(session: &ConfigurationSession, effective: &EffectiveProduct) -> SessionView {
    let catalog = &effective.catalog;
    SessionView {
        session_id: session.id,
        product_id: session.product_id.clone(),
        available: resolve_all(catalog, &effective.constraints, &session.selection),
        complete: catalog
            .attributes()
            .iter()
            .all(|a| session.selection.has_attribute(a.id)),
        selections: session.selection.clone(),
    }
}

fn session_not_found(id: &Uuid) -> ApiError {
    ApiError::not_found("Configuration session", &id.to_string())
}

fn get_session(sessions: &SessionState, id: &Uuid) -> Result<ConfigurationSession, ApiError> {
    sessions.get(id).ok_or_else(|| session_not_found(id))
}

/// Explains why `pair` is not offered under `selection`.
fn rejection(
    effective: &EffectiveProduct,
    selection: &Selection,
    pair: OptionRef,
) -> ApiError {
    let Some(option) = effective.catalog.option(pair) else {
        return CoreError::unknown_selection(format!(
            "option {} is not available for attribute {}",
            pair.option_id, pair.attribute_id
        ))
        .into();
    };

    let mut candidate = selection.clone();
    candidate.select(pair.attribute_id, pair.option_id);
    match effective.constraints.violated_by(|a| candidate.get(a)) {
        Some(rule) => CoreError::ForbiddenCombination(rule).into(),
        None => ApiError::validation(format!("{} is out of stock", option.name)),
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Opens a session for a product.
pub async fn start_session(
    db: &DbState,
    sessions: &SessionState,
    product_id: &str,
) -> Result<SessionView, ApiError> {
    debug!(product_id = %product_id, "start_session command");
    let snapshot = load_product(db, product_id).await?;

    let session = ConfigurationSession::new(&snapshot.product.id);
    sessions
        .insert(session.clone())
        .map_err(ApiError::validation)?;

    info!(session_id = %session.id, product_id = %product_id, "Configuration session started");
    Ok(session_view(&session, &snapshot.effective))
}

/// Picks an option, replacing an earlier pick for the same attribute.
///
/// ## Errors
/// - `InvalidAttribute` for a deactivated attribute
/// - `UnknownSelection` for an option the product does not offer
/// - `ForbiddenCombination` if the option conflicts with the other picks
/// - `ValidationError` for an out-of-stock option in strict mode
pub async fn select_option(
    db: &DbState,
    config: &ConfigState,
    sessions: &SessionState,
    session_id: &Uuid,
    attribute_id: i64,
    option_id: i64,
) -> Result<SessionView, ApiError> {
    debug!(session_id = %session_id, attribute_id, option_id, "select_option command");

    let session = get_session(sessions, session_id)?;
    let snapshot = load_product(db, &session.product_id).await?;
    let effective = &snapshot.effective;

    let pair = OptionRef::new(attribute_id, option_id);
    let mode = config.availability_mode();

    // Checked against the selection as it is under the lock, not the copy
    // taken before the database read.
    let updated = sessions
        .with_session_mut(session_id, |s| -> Result<ConfigurationSession, ApiError> {
            let offered = is_option_available(
                &effective.catalog,
                &effective.constraints,
                &s.selection,
                pair,
                mode,
            )?;
            if !offered {
                return Err(rejection(effective, &s.selection, pair));
            }
            s.selection.select(attribute_id, option_id);
            Ok(s.clone())
        })
        .ok_or_else(|| session_not_found(session_id))??;

    Ok(session_view(&updated, effective))
}

/// Removes the pick for an attribute.
pub async fn clear_option(
    db: &DbState,
    sessions: &SessionState,
    session_id: &Uuid,
    attribute_id: i64,
) -> Result<SessionView, ApiError> {
    debug!(session_id = %session_id, attribute_id, "clear_option command");

    let updated = sessions
        .with_session_mut(session_id, |s| {
            s.selection.clear(attribute_id);
            s.clone()
        })
        .ok_or_else(|| session_not_found(session_id))?;

    let snapshot = load_product(db, &updated.product_id).await?;
    Ok(session_view(&updated, &snapshot.effective))
}

/// Options of one attribute given the session's other picks.
pub async fn session_available_options(
    db: &DbState,
    config: &ConfigState,
    sessions: &SessionState,
    session_id: &Uuid,
    attribute_id: i64,
) -> Result<AvailableOptions, ApiError> {
    debug!(session_id = %session_id, attribute_id, "session_available_options command");

    let session = get_session(sessions, session_id)?;
    let snapshot = load_product(db, &session.product_id).await?;

    Ok(available_options_with_mode(
        &snapshot.effective.catalog,
        &snapshot.effective.constraints,
        &session.selection,
        attribute_id,
        config.availability_mode(),
    )?)
}

/// Validates the session's picks and closes it.
///
/// On failure the session stays open so the shopper can fix the picks.
pub async fn finish_session(
    db: &DbState,
    sessions: &SessionState,
    session_id: &Uuid,
    quantity: Option<u32>,
) -> Result<ConfiguredLine, ApiError> {
    let start = Instant::now();
    debug!(session_id = %session_id, "finish_session command");

    let session = get_session(sessions, session_id)?;
    let snapshot = load_product(db, &session.product_id).await?;
    let line = configured_line(&snapshot, &session.selection, quantity.unwrap_or(1))?;

    sessions.remove(session_id);

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        session_id = %session_id,
        "finish_session complete"
    );
    Ok(line)
}

/// Discards a session without validating it.
pub async fn end_session(sessions: &SessionState, session_id: &Uuid) -> Result<(), ApiError> {
    debug!(session_id = %session_id, "end_session command");

    sessions
        .remove(session_id)
        .ok_or_else(|| session_not_found(session_id))?;

    info!(session_id = %session_id, open_sessions = sessions.len(), "Configuration session ended");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::product::{
        create_product, AttributeOverridesDto, CreateProductRequest,
        NotAllowedCombinationsOverridesDto,
    };
    use crate::commands::test_support::{db, shirt, Shirt};
    use crate::error::ErrorCode;

    async fn tee(db: &DbState, shirt: &Shirt) -> String {
        create_product(
            db,
            CreateProductRequest {
                product_type_id: shirt.product_type_id.clone(),
                name: "Tee".to_string(),
                sku: "TEE-S".to_string(),
                description: None,
                attribute_overrides: AttributeOverridesDto::default(),
                not_allowed_combinations_overrides: NotAllowedCombinationsOverridesDto::default(),
                product_not_allowed_combinations: Vec::new(),
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_session_round() {
        let db = db().await;
        let shirt = shirt(&db).await;
        let product_id = tee(&db, &shirt).await;
        let config = ConfigState::default();
        let sessions = SessionState::new(10);

        let view = start_session(&db, &sessions, &product_id).await.unwrap();
        assert!(!view.complete);
        assert_eq!(view.available.len(), 2);
        let id = view.session_id;

        let view = select_option(&db, &config, &sessions, &id, shirt.color, shirt.red)
            .await
            .unwrap();
        let sizes = view.available.iter().find(|a| a.attribute_id == shirt.size).unwrap();
        assert!(!sizes.contains(shirt.small));

        let err = select_option(&db, &config, &sessions, &id, shirt.size, shirt.small)
            .await
            .unwrap_err();
        assert_eq!(err.error, ErrorCode::ForbiddenCombination);

        let view = select_option(&db, &config, &sessions, &id, shirt.size, shirt.medium)
            .await
            .unwrap();
        assert!(view.complete);

        let line = finish_session(&db, &sessions, &id, Some(2)).await.unwrap();
        assert_eq!(line.quantity, 2);
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_clear_reopens_options() {
        let db = db().await;
        let shirt = shirt(&db).await;
        let product_id = tee(&db, &shirt).await;
        let config = ConfigState::default();
        let sessions = SessionState::new(10);

        let id = start_session(&db, &sessions, &product_id)
            .await
            .unwrap()
            .session_id;
        select_option(&db, &config, &sessions, &id, shirt.color, shirt.red)
            .await
            .unwrap();

        let sizes = session_available_options(&db, &config, &sessions, &id, shirt.size)
            .await
            .unwrap();
        assert!(!sizes.contains(shirt.small));

        let view = clear_option(&db, &sessions, &id, shirt.color).await.unwrap();
        assert!(view.selections.is_empty());

        let sizes = session_available_options(&db, &config, &sessions, &id, shirt.size)
            .await
            .unwrap();
        assert!(sizes.contains(shirt.small));
    }

    #[tokio::test]
    async fn test_incomplete_finish_keeps_session() {
        let db = db().await;
        let shirt = shirt(&db).await;
        let product_id = tee(&db, &shirt).await;
        let sessions = SessionState::new(10);

        let id = start_session(&db, &sessions, &product_id)
            .await
            .unwrap()
            .session_id;

        let err = finish_session(&db, &sessions, &id, None).await.unwrap_err();
        assert_eq!(err.error, ErrorCode::Incomplete);
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_option_and_session() {
        let db = db().await;
        let shirt = shirt(&db).await;
        let product_id = tee(&db, &shirt).await;
        let config = ConfigState::default();
        let sessions = SessionState::new(1);

        let id = start_session(&db, &sessions, &product_id)
            .await
            .unwrap()
            .session_id;

        let err = select_option(&db, &config, &sessions, &id, shirt.color, shirt.small)
            .await
            .unwrap_err();
        assert_eq!(err.error, ErrorCode::UnknownSelection);

        let err = start_session(&db, &sessions, &product_id).await.unwrap_err();
        assert_eq!(err.error, ErrorCode::ValidationError);

        let err = finish_session(&db, &sessions, &Uuid::new_v4(), None)
            .await
            .unwrap_err();
        assert_eq!(err.error, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_overlapping_picks_cannot_store_a_forbidden_pair() {
        let db = db().await;
        let shirt = shirt(&db).await;
        let product_id = tee(&db, &shirt).await;
        let config = ConfigState::default();
        let sessions = SessionState::new(10);

        let id = start_session(&db, &sessions, &product_id)
            .await
            .unwrap()
            .session_id;

        let (color, size) = tokio::join!(
            select_option(&db, &config, &sessions, &id, shirt.color, shirt.red),
            select_option(&db, &config, &sessions, &id, shirt.size, shirt.small),
        );

        let outcomes = [color.map(|_| ()), size.map(|_| ())];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        let rejected = outcomes.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert_eq!(rejected.error, ErrorCode::ForbiddenCombination);

        let session = sessions.get(&id).unwrap();
        assert_eq!(session.selection.len(), 1);
        let err = finish_session(&db, &sessions, &id, None).await.unwrap_err();
        assert_eq!(err.error, ErrorCode::Incomplete);
    }

    #[tokio::test]
    async fn test_end_session_frees_the_limit() {
        let db = db().await;
        let shirt = shirt(&db).await;
        let product_id = tee(&db, &shirt).await;
        let sessions = SessionState::new(1);

        let id = start_session(&db, &sessions, &product_id)
            .await
            .unwrap()
            .session_id;
        assert!(start_session(&db, &sessions, &product_id).await.is_err());

        end_session(&sessions, &id).await.unwrap();
        assert!(sessions.is_empty());
        assert!(start_session(&db, &sessions, &product_id).await.is_ok());

        let err = end_session(&sessions, &id).await.unwrap_err();
        assert_eq!(err.error, ErrorCode::NotFound);
    }
}
