//! # Command Dispatch
//!
//! Routes a command name plus JSON arguments to the matching command
//! function and serializes its result. This is the registry an embedding
//! transport (HTTP server, IPC bridge, the JSON-lines binary) calls into.
//!
//! ```json
//! { "command": "available_options",
//!   "args": { "productId": "…", "requestedAttributeId": 2, "currentSelections": [4] } }
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

use forma_core::NewAttribute;

use crate::commands::{catalog, configure, product, session, CombinationPairDto};
use crate::error::{ApiError, ErrorCode};
use crate::Storefront;

/// One command invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct Invocation {
    pub command: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdArgs {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddAttributesArgs {
    product_type_id: String,
    attributes: Vec<NewAttribute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddCombinationsArgs {
    product_type_id: String,
    combinations: Vec<Vec<CombinationPairDto>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ListArgs {
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartSessionArgs {
    product_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionArgs {
    session_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionAttributeArgs {
    session_id: Uuid,
    attribute_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectOptionArgs {
    session_id: Uuid,
    attribute_id: i64,
    option_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinishSessionArgs {
    session_id: Uuid,
    #[serde(default)]
    quantity: Option<u32>,
}

fn args<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    // Commands without arguments accept a missing `args`.
    let value = if value.is_null() {
        Value::Object(Default::default())
    } else {
        value
    };
    serde_json::from_value(value).map_err(|e| ApiError::validation(format!("Invalid arguments: {e}")))
}

fn reply<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(e.to_string()))
}

fn error_reply(err: ApiError) -> Value {
    serde_json::to_value(&err)
        .unwrap_or_else(|e| json!({ "error": ErrorCode::Internal, "detail": e.to_string() }))
}

impl Storefront {
    /// Serves one JSON command per line of `input`, writing one reply per
    /// line to `output`, until `input` closes.
    ///
    /// Replies are `{"ok": value}` or the [`ApiError`] payload. Blank lines
    /// are skipped.
    pub async fn serve_lines<R, W>(&self, input: R, output: &mut W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let reply = match serde_json::from_str::<Invocation>(&line) {
                Ok(invocation) => match self.invoke(invocation).await {
                    Ok(value) => json!({ "ok": value }),
                    Err(err) => error_reply(err),
                },
                Err(e) => {
                    warn!(error = %e, "Malformed command line");
                    error_reply(ApiError::validation(format!("Malformed command: {e}")))
                }
            };

            let mut out = reply.to_string();
            out.push('\n');
            output.write_all(out.as_bytes()).await?;
            output.flush().await?;
        }

        Ok(())
    }

    /// Runs one command against this storefront's state.
    pub async fn invoke(&self, invocation: Invocation) -> Result<Value, ApiError> {
        debug!(command = %invocation.command, "invoke");
        let db = &self.db;
        let a = invocation.args;

        match invocation.command.as_str() {
            // Catalog commands
            "create_product_type" => reply(catalog::create_product_type(db, args(a)?).await?),
            "list_product_types" => reply(catalog::list_product_types(db).await?),
            "add_attributes" => {
                let a: AddAttributesArgs = args(a)?;
                reply(catalog::add_attributes(db, &a.product_type_id, a.attributes).await?)
            }
            "add_not_allowed_combinations" => {
                let a: AddCombinationsArgs = args(a)?;
                reply(
                    catalog::add_not_allowed_combinations(db, &a.product_type_id, a.combinations)
                        .await?,
                )
            }
            "get_product_type_details" => {
                let a: IdArgs = args(a)?;
                reply(catalog::get_product_type_details(db, &a.id).await?)
            }
            "delete_product_type" => {
                let a: IdArgs = args(a)?;
                reply(catalog::delete_product_type(db, &a.id).await?)
            }
            // Product commands
            "create_product" => reply(product::create_product(db, args(a)?).await?),
            "get_product_details" => {
                let a: IdArgs = args(a)?;
                reply(product::get_product_details(db, &a.id).await?)
            }
            "list_products" => {
                let a: ListArgs = args(a)?;
                reply(product::list_products(db, a.limit).await?)
            }
            "delete_product" => {
                let a: IdArgs = args(a)?;
                reply(product::delete_product(db, &a.id).await?)
            }
            // Configuration commands
            "available_options" => {
                reply(configure::available_options(db, &self.config, args(a)?).await?)
            }
            "add_to_configuration" => reply(configure::add_to_configuration(db, args(a)?).await?),
            // Session commands
            "start_session" => {
                let a: StartSessionArgs = args(a)?;
                reply(session::start_session(db, &self.sessions, &a.product_id).await?)
            }
            "select_option" => {
                let a: SelectOptionArgs = args(a)?;
                reply(
                    session::select_option(
                        db,
                        &self.config,
                        &self.sessions,
                        &a.session_id,
                        a.attribute_id,
                        a.option_id,
                    )
                    .await?,
                )
            }
            "clear_option" => {
                let a: SessionAttributeArgs = args(a)?;
                reply(session::clear_option(db, &self.sessions, &a.session_id, a.attribute_id).await?)
            }
            "session_available_options" => {
                let a: SessionAttributeArgs = args(a)?;
                reply(
                    session::session_available_options(
                        db,
                        &self.config,
                        &self.sessions,
                        &a.session_id,
                        a.attribute_id,
                    )
                    .await?,
                )
            }
            "finish_session" => {
                let a: FinishSessionArgs = args(a)?;
                reply(session::finish_session(db, &self.sessions, &a.session_id, a.quantity).await?)
            }
            "end_session" => {
                let a: SessionArgs = args(a)?;
                reply(session::end_session(&self.sessions, &a.session_id).await?)
            }
            other => Err(ApiError::new(
                ErrorCode::NotFound,
                format!("Unknown command: {other}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorefrontConfig;

    async fn storefront() -> Storefront {
        let config = StorefrontConfig {
            db_path: ":memory:".into(),
            ..StorefrontConfig::default()
        };
        Storefront::start(&config).await.unwrap()
    }

    async fn call(storefront: &Storefront, command: &str, args: Value) -> Result<Value, ApiError> {
        storefront
            .invoke(Invocation {
                command: command.to_string(),
                args,
            })
            .await
    }

    #[tokio::test]
    async fn test_json_flow() {
        let sf = storefront().await;

        let shirt = call(&sf, "create_product_type", json!({"name": "Shirt", "customisation": "fully_customizable"}))
            .await
            .unwrap();
        let type_id = shirt["id"].as_str().unwrap().to_string();

        let attributes = call(
            &sf,
            "add_attributes",
            json!({"productTypeId": type_id, "attributes": [
                {"attributeName": "Color", "possibleOptions": ["Red", "Blue"]},
                {"attributeName": "Size", "possibleOptions": ["S", "M"]}
            ]}),
        )
        .await
        .unwrap();
        let color = &attributes[0];
        let size = &attributes[1];

        call(
            &sf,
            "add_not_allowed_combinations",
            json!({"productTypeId": type_id, "combinations": [[
                {"attributeId": color["id"], "attributeOptionId": color["options"][0]["id"]},
                {"attributeId": size["id"], "attributeOptionId": size["options"][0]["id"]}
            ]]}),
        )
        .await
        .unwrap();

        let product = call(
            &sf,
            "create_product",
            json!({"productTypeId": type_id, "name": "Tee", "sku": "TEE-1"}),
        )
        .await
        .unwrap();

        let available = call(
            &sf,
            "available_options",
            json!({
                "productId": product["id"],
                "requestedAttributeId": size["id"],
                "currentSelections": [color["options"][0]["id"]]
            }),
        )
        .await
        .unwrap();
        assert_eq!(available["attributeId"], size["id"]);
        assert_eq!(available["options"].as_array().unwrap().len(), 1);
        assert_eq!(available["options"][0]["name"], "M");
        assert_eq!(available["options"][0]["outOfStock"], false);

        let mut selections = serde_json::Map::new();
        selections.insert(color["id"].to_string(), color["options"][0]["id"].clone());
        selections.insert(size["id"].to_string(), size["options"][0]["id"].clone());
        let err = call(
            &sf,
            "add_to_configuration",
            json!({"productId": product["id"], "selections": selections}),
        )
        .await
        .unwrap_err();
        assert_eq!(
            serde_json::to_value(&err).unwrap()["error"],
            "ForbiddenCombination"
        );
    }

    #[tokio::test]
    async fn test_bad_invocations() {
        let sf = storefront().await;

        let err = call(&sf, "launch_rocket", Value::Null).await.unwrap_err();
        assert_eq!(err.error, ErrorCode::NotFound);

        let err = call(&sf, "get_product_details", json!({"name": "x"}))
            .await
            .unwrap_err();
        assert_eq!(err.error, ErrorCode::ValidationError);

        let listed = call(&sf, "list_products", Value::Null).await.unwrap();
        assert_eq!(listed, json!([]));

        let err = call(&sf, "end_session", json!({"sessionId": Uuid::new_v4()}))
            .await
            .unwrap_err();
        assert_eq!(err.error, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_serve_lines() {
        let sf = storefront().await;
        let input = "{\"command\": \"list_products\"}\n\nnot json\n{\"command\": \"launch_rocket\"}\n";
        let mut output = Vec::new();

        sf.serve_lines(input.as_bytes(), &mut output).await.unwrap();

        let replies: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0], json!({ "ok": [] }));
        assert_eq!(replies[1]["error"], "ValidationError");
        assert_eq!(replies[2]["error"], "NotFound");
    }
}
