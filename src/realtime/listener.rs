//! Bridges Postgres `NOTIFY doctrack_changes` into the in-process [`ChangeFeed`].

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::task::JoinHandle;

use super::{ChangeFeed, ChangeOp, NOTIFY_CHANNEL, Table, TableChange};

/// Start listening and republish every recognised notification.
///
/// `PgListener` reconnects by itself after a dropped connection, but anything
/// notified in between is lost; after an error subscribers are told to refetch.
pub async fn spawn(pool: &PgPool, feed: ChangeFeed) -> Result<JoinHandle<()>, sqlx::Error> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(NOTIFY_CHANNEL).await?;
    log::info!("Listening for store changes on '{NOTIFY_CHANNEL}'");

    Ok(tokio::spawn(async move {
        loop {
            match listener.recv().await {
                Ok(notification) => match TableChange::parse_notification(notification.payload()) {
                    Some(change) => feed.publish(change),
                    None => log::debug!("Ignoring notification '{}'", notification.payload()),
                },
                Err(e) => {
                    log::warn!("Change listener error: {e}; retrying");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    feed.publish(TableChange::new(Table::Documents, ChangeOp::Update));
                    feed.publish(TableChange::new(Table::SiteConfigs, ChangeOp::Update));
                }
            }
        }
    }))
}
