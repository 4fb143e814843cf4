//! Community alert subscriptions.

use moosicbox_json_utils::database::ToValue as _;
use safer_database_models::NewSubscription;
use switchy_database::{Database, DatabaseValue};

use crate::DbError;

/// Stores a subscription and returns its id, or `None` when the WhatsApp
/// number is already subscribed. Existing subscriptions are left as they
/// are.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails or the new id cannot be read.
pub async fn subscribe(db: &dyn Database, subscription: &NewSubscription) -> Result<Option<i64>, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO comm_sub (name, whatsapp_number, email, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (whatsapp_number) DO NOTHING
             RETURNING id",
            &[
                DatabaseValue::String(subscription.name.clone()),
                DatabaseValue::String(subscription.whatsapp_number.clone()),
                DatabaseValue::String(subscription.email.clone()),
                DatabaseValue::DateTime(chrono::Utc::now().naive_utc()),
            ],
        )
        .await?;

    let Some(row) = rows.first() else {
        log::debug!(
            "WhatsApp number {} is already subscribed",
            subscription.whatsapp_number
        );
        return Ok(None);
    };

    let id = row.to_value("id").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse subscription id: {e}"),
    })?;
    Ok(Some(id))
}
