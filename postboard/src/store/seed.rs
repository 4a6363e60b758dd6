//! Development fixtures: two admin users with fixed uuids.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use tracing::{debug, info};
use uuid::{uuid, Uuid};

use super::{user, Store, StoreError, StoreResult};

const FIXTURE_TIMESTAMP: &str = "2020-11-01T16:30:07.592Z";

pub const FIXTURE_USER_UUIDS: [Uuid; 2] = [
    uuid!("35cf1b89-56d3-433c-9f43-4198eb3725de"),
    uuid!("35cf1b89-56d3-433c-9f43-4198eb8135de"),
];

struct Fixture {
    uuid: Uuid,
    name: &'static str,
    email: &'static str,
}

const FIXTURES: [Fixture; 2] = [
    Fixture {
        uuid: FIXTURE_USER_UUIDS[0],
        name: "John Doe2",
        email: "john@email.com",
    },
    Fixture {
        uuid: FIXTURE_USER_UUIDS[1],
        name: "Jane Doe2",
        email: "jane@email.com",
    },
];

impl Store {
    /// Inserts the fixture users that are not already present. Returns how many were added.
    pub async fn seed_fixtures(&self) -> StoreResult<usize> {
        let stamp: DateTime<Utc> = FIXTURE_TIMESTAMP
            .parse()
            .map_err(|e| StoreError::Query(format!("invalid fixture timestamp: {e}")))?;

        let mut inserted = 0;
        for fixture in &FIXTURES {
            if self.find_user(fixture.uuid).await?.is_some() {
                debug!(uuid = %fixture.uuid, "fixture user already present");
                continue;
            }
            user::ActiveModel {
                uuid: Set(fixture.uuid),
                name: Set(fixture.name.to_string()),
                email: Set(fixture.email.to_string()),
                role: Set(String::from("admin")),
                created_at: Set(stamp),
                updated_at: Set(stamp),
                ..Default::default()
            }
            .insert(&self.conn)
            .await?;
            inserted += 1;
        }

        info!(inserted, "fixture users seeded");
        Ok(inserted)
    }

    /// Reverts seeding by removing every user.
    pub async fn unseed_fixtures(&self) -> StoreResult<u64> {
        let result = user::Entity::delete_many().exec(&self.conn).await?;
        info!(removed = result.rows_affected, "users removed");
        Ok(result.rows_affected)
    }
}
