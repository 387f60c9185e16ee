use derive_more::{From, Into};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction};

use super::UserId;
use crate::error::{AppError, AppResult};
use crate::{platform, AppState};

id_struct!(PublisherId, Publisher);
/// An external content author. May be linked to a platform member id and/or a
/// site user account.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Publisher {
    pub id: PublisherId,
    pub name: String,
    pub platform_member_id: Option<i64>,
    pub user_id: Option<UserId>,
}

/// How a mod submission identifies its publisher. Exactly one field is
/// expected; they are checked in declaration order.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct PublisherQuery {
    pub user_id: Option<UserId>,
    pub platform_member_id: Option<i64>,
    pub publisher_id: Option<PublisherId>,
    pub publisher_name: Option<String>,
}

/// Resolved publisher attachment for a mod about to be created: either an
/// existing row or a row to create from a platform lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublisherConnection {
    Existing(PublisherId),
    Create {
        name: String,
        platform_member_id: i64,
    },
}

impl AppState {
    pub async fn get_publisher(&self, id: PublisherId) -> AppResult<Publisher> {
        sqlx::query_as::<_, Publisher>(
            "SELECT id, name, platform_member_id, user_id FROM Publisher WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::UnknownPublisher)
    }

    /// Resolves a [`PublisherQuery`] to a [`PublisherConnection`].
    ///
    /// Unseen platform member ids and names are looked up against the
    /// external platform; an ambiguous name must be disambiguated by id.
    pub async fn resolve_publisher(&self, query: &PublisherQuery) -> AppResult<PublisherConnection> {
        if let Some(user_id) = query.user_id {
            self.get_user(user_id)
                .await?
                .ok_or(AppError::UserDoesNotExist(user_id.0))?;

            let publishers = sqlx::query_as::<_, Publisher>(
                "SELECT id, name, platform_member_id, user_id FROM Publisher WHERE user_id = $1",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

            return match publishers.as_slice() {
                [] => Err(AppError::UserHasNoPublisher),
                [publisher] => Ok(PublisherConnection::Existing(publisher.id)),
                many => Err(AppError::UserHasMultiplePublishers(
                    many.iter().map(|p| p.id.0).collect(),
                )),
            };
        }

        if let Some(member_id) = query.platform_member_id {
            let existing = sqlx::query_as::<_, Publisher>(
                "SELECT id, name, platform_member_id, user_id FROM Publisher
                    WHERE platform_member_id = $1
                ",
            )
            .bind(member_id)
            .fetch_optional(&self.pool)
            .await?;

            return match existing {
                Some(publisher) => Ok(PublisherConnection::Existing(publisher.id)),
                None => {
                    let name = platform::member_name_by_id(&self.http, member_id)
                        .await?
                        .ok_or(AppError::PlatformMemberNotFound(member_id))?;
                    Ok(PublisherConnection::Create {
                        name,
                        platform_member_id: member_id,
                    })
                }
            };
        }

        if let Some(publisher_id) = query.publisher_id {
            return Ok(PublisherConnection::Existing(
                self.get_publisher(publisher_id).await?.id,
            ));
        }

        if let Some(name) = &query.publisher_name {
            let matches = sqlx::query_as::<_, Publisher>(
                "SELECT id, name, platform_member_id, user_id FROM Publisher WHERE name = $1",
            )
            .bind(name)
            .fetch_all(&self.pool)
            .await?;

            return match matches.as_slice() {
                [publisher] => Ok(PublisherConnection::Existing(publisher.id)),
                [] => {
                    let member_id = platform::member_id_by_name(&self.http, name)
                        .await?
                        .ok_or_else(|| AppError::PlatformUsernameNotFound(name.clone()))?;
                    Ok(PublisherConnection::Create {
                        name: name.clone(),
                        platform_member_id: member_id,
                    })
                }
                many => Err(AppError::AmbiguousPublisherName(
                    many.iter().map(|p| p.id.0).collect(),
                )),
            };
        }

        Err(AppError::UnknownPublisher)
    }
}

/// Turns a [`PublisherConnection`] into a concrete publisher id, creating the
/// row if needed.
pub(crate) async fn connect_publisher(
    transaction: &mut Transaction<'_, Postgres>,
    connection: PublisherConnection,
) -> sqlx::Result<PublisherId> {
    match connection {
        PublisherConnection::Existing(id) => Ok(id),
        PublisherConnection::Create {
            name,
            platform_member_id,
        } => {
            let row: (PublisherId,) = sqlx::query_as(
                "INSERT INTO Publisher (name, platform_member_id) VALUES ($1, $2) RETURNING id",
            )
            .bind(&name)
            .bind(platform_member_id)
            .fetch_one(&mut **transaction)
            .await?;

            tracing::info!(publisher_id = ?row.0, name, "Created publisher from platform lookup.");
            Ok(row.0)
        }
    }
}
