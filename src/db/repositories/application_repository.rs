use crate::db::connection::DbPool;
use crate::db::models::Application;
use sqlx::Error;

pub struct NewApplication<'a> {
    pub name: &'a str,
    pub category: &'a str,
    pub icon: &'a str,
    pub url: &'a str,
}

/// Tools shipped with the dashboard, written by `seed_applications`.
pub const DEFAULT_APPLICATIONS: [NewApplication<'static>; 4] = [
    NewApplication {
        name: "Image to PDF",
        category: "Utility",
        icon: "https://cdn-icons-png.flaticon.com/512/337/337946.png",
        url: "#",
    },
    NewApplication {
        name: "Image Compressor",
        category: "Utility",
        icon: "https://cdn-icons-png.flaticon.com/512/337/337926.png",
        url: "#",
    },
    NewApplication {
        name: "Word to PDF",
        category: "Utility",
        icon: "https://cdn-icons-png.flaticon.com/512/337/337956.png",
        url: "#",
    },
    NewApplication {
        name: "PDF to Word",
        category: "Utility",
        icon: "https://cdn-icons-png.flaticon.com/512/337/337956.png",
        url: "#",
    },
];

pub async fn list_applications(
    pool: &DbPool,
    skip: i64,
    limit: i64,
) -> Result<Vec<Application>, Error> {
    sqlx::query_as::<_, Application>(
        r#"
        SELECT id, name, category, icon, url, status
        FROM applications
        ORDER BY id
        OFFSET $1 LIMIT $2
        "#,
    )
    .bind(skip)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn create_application(
    pool: &DbPool,
    app: &NewApplication<'_>,
) -> Result<Application, Error> {
    sqlx::query_as::<_, Application>(
        r#"
        INSERT INTO applications (name, category, icon, url)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, category, icon, url, status
        "#,
    )
    .bind(app.name)
    .bind(app.category)
    .bind(app.icon)
    .bind(app.url)
    .fetch_one(pool)
    .await
}

/// Replaces the whole catalogue with [`DEFAULT_APPLICATIONS`].
pub async fn seed_applications(pool: &DbPool) -> Result<usize, Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM applications")
        .execute(&mut *tx)
        .await?;

    for app in &DEFAULT_APPLICATIONS {
        sqlx::query(
            r#"
            INSERT INTO applications (name, category, icon, url, status)
            VALUES ($1, $2, $3, $4, 'active')
            "#,
        )
        .bind(app.name)
        .bind(app.category)
        .bind(app.icon)
        .bind(app.url)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(DEFAULT_APPLICATIONS.len())
}
