//! # Configuration Commands
//!
//! The two shopper endpoints: which options may be offered for an attribute,
//! and the final check before a configuration leaves for the cart.
//!
//! ## Dropdown Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Shopper opens "Size" with Color=Red picked                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  available_options({ productId, requestedAttributeId: Size,             │
//! │                      currentSelections: [Red] })                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  snapshot = product type + override                                     │
//! │  selection = option ids mapped back to attributes (Size entry dropped)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  forma-core resolver ──► { attributeId: Size, options: [M] }            │
//! │                                                                         │
//! │  "Add to cart" ──► add_to_configuration ──► forma-core validator        │
//! │                        Ok ──► ConfiguredLine                            │
//! │                        Err ──► ForbiddenCombination / Incomplete / ...  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Instant;

use forma_core::resolver::available_options_with_mode;
use forma_core::validator::validate;
use forma_core::{AvailableOptions, Selection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{load_product, ProductSnapshot};
use crate::error::ApiError;
use crate::state::{ConfigState, DbState};

/// Largest quantity accepted for one configured line.
pub const MAX_LINE_QUANTITY: u32 = 999;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub product_id: String,
    pub requested_attribute_id: i64,
    #[serde(default)]
    pub current_selections: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToConfigurationRequest {
    pub product_id: String,
    /// `{ attributeId: optionId }`
    pub selections: Selection,
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// One chosen option of a configured line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguredOptionDto {
    pub attribute_id: i64,
    pub attribute_name: String,
    pub option_id: i64,
    pub option_name: String,
    pub out_of_stock: bool,
}

/// A validated configuration, ready for a cart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguredLine {
    pub product_id: String,
    pub product_name: String,
    pub sku: String,
    pub quantity: u32,
    /// In attribute order.
    pub options: Vec<ConfiguredOptionDto>,
    /// True if any chosen option is flagged out of stock.
    pub has_out_of_stock: bool,
}

/// Validates `selection` against the snapshot and names the chosen options.
pub(crate) fn configured_line(
    snapshot: &ProductSnapshot,
    selection: &Selection,
    quantity: u32,
) -> Result<ConfiguredLine, ApiError> {
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(ApiError::validation(format!(
            "Quantity must be between 1 and {}",
            MAX_LINE_QUANTITY
        )));
    }

    let effective = &snapshot.effective;
    if let Err(e) = validate(&effective.catalog, &effective.constraints, selection) {
        warn!(product_id = %snapshot.product.id, reason = %e, "Configuration rejected");
        return Err(e.into());
    }

    let options: Vec<ConfiguredOptionDto> = effective
        .catalog
        .attributes()
        .iter()
        .filter_map(|attribute| {
            let option_id = selection.get(attribute.id)?;
            let option = attribute.option(option_id)?;
            Some(ConfiguredOptionDto {
                attribute_id: attribute.id,
                attribute_name: attribute.name.clone(),
                option_id,
                option_name: option.name.clone(),
                out_of_stock: option.out_of_stock,
            })
        })
        .collect();

    Ok(ConfiguredLine {
        product_id: snapshot.product.id.clone(),
        product_name: snapshot.product.name.clone(),
        sku: snapshot.product.sku.clone(),
        quantity,
        has_out_of_stock: options.iter().any(|o| o.out_of_stock),
        options,
    })
}

// =============================================================================
// Commands
// =============================================================================

/// Options of the requested attribute compatible with the current picks.
///
/// ## Errors
/// - `NotFound` for an unknown product or attribute
/// - `InvalidAttribute` if the product deactivates the attribute
/// - `UnknownSelection` if a current selection cannot be mapped to one
///   live option
pub async fn available_options(
    db: &DbState,
    config: &ConfigState,
    request: AvailabilityRequest,
) -> Result<AvailableOptions, ApiError> {
    let start = Instant::now();
    debug!(
        product_id = %request.product_id,
        attribute_id = request.requested_attribute_id,
        selections = request.current_selections.len(),
        "available_options command"
    );

    let snapshot = load_product(db, &request.product_id).await?;
    let catalog = &snapshot.effective.catalog;

    // Checked first so a deactivated attribute is reported as such.
    catalog.attribute(request.requested_attribute_id)?;
    let selection = catalog.selection_from_option_ids(
        &request.current_selections,
        Some(request.requested_attribute_id),
    )?;

    let available = available_options_with_mode(
        catalog,
        &snapshot.effective.constraints,
        &selection,
        request.requested_attribute_id,
        config.availability_mode(),
    )?;

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        count = available.options.len(),
        "available_options complete"
    );
    Ok(available)
}

/// Final check of a full configuration.
///
/// Out-of-stock options do not fail the check; they are flagged on the
/// returned line.
pub async fn add_to_configuration(
    db: &DbState,
    request: AddToConfigurationRequest,
) -> Result<ConfiguredLine, ApiError> {
    let start = Instant::now();
    debug!(
        product_id = %request.product_id,
        selections = request.selections.len(),
        "add_to_configuration command"
    );

    let snapshot = load_product(db, &request.product_id).await?;
    let line = configured_line(&snapshot, &request.selections, request.quantity.unwrap_or(1))?;

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        product_id = %line.product_id,
        "add_to_configuration complete"
    );
    Ok(line)
}

// =============================================================================
// Unit Tests
// =============================================================================
