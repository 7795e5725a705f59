use actix_web::http::header;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::pooled_connection::deadpool::Object;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde_json::json;
use tracing::instrument;

use errors::{CustomError, DbError};
use helpers::auth_jwt::auth::Claims;
use helpers::validations::validations::{format_released_on, FieldError, GameFormBody};
use lib_config::db::db::PgPool;

use super::model::{
    DeleteConfirmation, GameDetails, GameDetailsRow, GameFormView, GameSummary, GameSummaryRow,
    Genre, NewGame,
};
use crate::schema::{gamers_games, games, genres, users};

type PgConn = Object<AsyncPgConnection>;

const GAMES_LISTING: &str = "/api/v1/games";
const MYZONE_LISTING: &str = "/api/v1/myzone";

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// 400 echoing the submitted values with the offending field flagged.
fn validation_echo(form: &GameFormBody, err: FieldError) -> HttpResponse {
    let mut errors = serde_json::Map::new();
    errors.insert(err.field.to_string(), json!(err.message));

    HttpResponse::BadRequest().json(json!({
        "values": form,
        "errors": errors,
    }))
}

async fn load_genres(conn: &mut PgConn) -> Result<Vec<Genre>, CustomError> {
    let all_genres = genres::table
        .order(genres::id.asc())
        .load::<Genre>(conn)
        .await?;
    Ok(all_genres)
}

async fn genre_exists(conn: &mut PgConn, genre_id: i32) -> Result<bool, CustomError> {
    let found: Option<i32> = genres::table
        .filter(genres::id.eq(genre_id))
        .select(genres::id)
        .first(conn)
        .await
        .optional()?;
    Ok(found.is_some())
}

/// A membership insert can lose a race with a concurrent delete; the broken
/// foreign key means the game is gone, which is the same not-found the
/// existence check reports.
fn membership_insert_error(game_id: i32, err: DieselError) -> CustomError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            CustomError::NotFound(format!("Game {} does not exist", game_id))
        }
        other => CustomError::DatabaseError(DbError::InsertionError(other.to_string())),
    }
}

/// 404 unless `game_id` resolves to a catalog entry.
async fn ensure_game_exists(conn: &mut PgConn, game_id: i32) -> Result<(), CustomError> {
    let found: Option<i32> = games::table
        .filter(games::id.eq(game_id))
        .select(games::id)
        .first(conn)
        .await
        .optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(CustomError::NotFound(format!(
            "Game {} does not exist",
            game_id
        ))),
    }
}

/******************************************/
// Prepare add Route
/******************************************/
/**
 * @route   GET /games/new
 * @access  Protected
 */
#[instrument(name = "Prepare game draft", skip_all)]
pub async fn prepare_add(pool: web::Data<PgPool>) -> Result<HttpResponse, CustomError> {
    let mut conn = pool
        .get()
        .await
        .map_err(|err| CustomError::DatabaseError(DbError::ConnectionError(err.to_string())))?;

    let all_genres = load_genres(&mut conn).await?;
    let draft = GameFormBody {
        title: String::new(),
        description: String::new(),
        image_url: None,
        released_on: format_released_on(Utc::now().date_naive()),
        genre_id: 0,
    };

    Ok(HttpResponse::Ok().json(GameFormView {
        form: draft,
        genres: all_genres,
    }))
}

/******************************************/
// Submit add Route
/******************************************/
/**
 * @route   POST /games
 * @access  Protected
 */
#[instrument(name = "Add a game", skip(pool, form, caller), fields(publisher = %caller.sub))]
pub async fn submit_add(
    pool: web::Data<PgPool>,
    form: web::Json<GameFormBody>,
    caller: web::ReqData<Claims>,
) -> Result<HttpResponse, CustomError> {
    let caller = caller.into_inner();
    let form = form.into_inner();

    let validated = match form.clone().validate() {
        Ok(validated) => validated,
        Err(err) => return Ok(validation_echo(&form, err)),
    };

    let mut conn = pool
        .get()
        .await
        .map_err(|err| CustomError::DatabaseError(DbError::ConnectionError(err.to_string())))?;

    if !genre_exists(&mut conn, validated.genre_id).await? {
        return Ok(validation_echo(
            &form,
            FieldError {
                field: "genre_id",
                message: "Genre does not exist.".to_string(),
            },
        ));
    }

    let new_game = NewGame {
        title: validated.title.as_ref().to_string(),
        description: validated.description.as_ref().to_string(),
        image_url: validated.image_url.map(|url| url.as_ref().to_string()),
        publisher_id: caller.sub,
        released_on: validated.released_on.date(),
        genre_id: validated.genre_id,
    };

    let new_id: i32 = diesel::insert_into(games::table)
        .values(&new_game)
        .returning(games::id)
        .get_result(&mut conn)
        .await
        .map_err(|err| CustomError::DatabaseError(DbError::InsertionError(err.to_string())))?;

    tracing::info!("Game {} added to the catalog", new_id);

    Ok(see_other(GAMES_LISTING))
}

/******************************************/
// List all games Route
/******************************************/
/**
 * @route   GET /games
 * @access  Protected
 */
#[instrument(name = "List all games", skip_all)]
pub async fn list_all(pool: web::Data<PgPool>) -> Result<HttpResponse, CustomError> {
    let mut conn = pool
        .get()
        .await
        .map_err(|err| CustomError::DatabaseError(DbError::ConnectionError(err.to_string())))?;

    // Insertion order keeps the listing deterministic
    let rows: Vec<GameSummaryRow> = games::table
        .inner_join(genres::table)
        .inner_join(users::table)
        .order(games::id.asc())
        .select((
            games::id,
            games::title,
            games::image_url,
            genres::name,
            games::released_on,
            users::username,
        ))
        .load(&mut conn)
        .await?;

    let model: Vec<GameSummary> = rows.into_iter().map(GameSummary::from).collect();

    Ok(HttpResponse::Ok().json(model))
}

/******************************************/
// Prepare edit Route
/******************************************/
/**
 * @route   GET /games/{id}/edit
 * @access  Protected
 */
#[instrument(name = "Prepare game edit", skip(pool))]
pub async fn prepare_edit(
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, CustomError> {
    let game_id = path.into_inner();

    let mut conn = pool
        .get()
        .await
        .map_err(|err| CustomError::DatabaseError(DbError::ConnectionError(err.to_string())))?;

    let (game_title, game_description, game_image_url, released, game_genre_id) = games::table
        .filter(games::id.eq(game_id))
        .select((
            games::title,
            games::description,
            games::image_url,
            games::released_on,
            games::genre_id,
        ))
        .first::<(String, String, Option<String>, chrono::NaiveDate, i32)>(&mut conn)
        .await?;

    let all_genres = load_genres(&mut conn).await?;

    Ok(HttpResponse::Ok().json(GameFormView {
        form: GameFormBody {
            title: game_title,
            description: game_description,
            image_url: game_image_url,
            released_on: format_released_on(released),
            genre_id: game_genre_id,
        },
        genres: all_genres,
    }))
}

/******************************************/
// Submit edit Route
/******************************************/
/**
 * @route   POST /games/{id}/edit
 * @access  Protected
 */
#[instrument(name = "Edit a game", skip(pool, form))]
pub async fn submit_edit(
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
    form: web::Json<GameFormBody>,
) -> Result<HttpResponse, CustomError> {
    let game_id = path.into_inner();
    let form = form.into_inner();

    let validated = match form.clone().validate() {
        Ok(validated) => validated,
        Err(err) => return Ok(validation_echo(&form, err)),
    };

    let mut conn = pool
        .get()
        .await
        .map_err(|err| CustomError::DatabaseError(DbError::ConnectionError(err.to_string())))?;

    if !genre_exists(&mut conn, validated.genre_id).await? {
        return Ok(validation_echo(
            &form,
            FieldError {
                field: "genre_id",
                message: "Genre does not exist.".to_string(),
            },
        ));
    }

    // Publisher stays untouched: ownership is fixed at creation
    let updated = diesel::update(games::table.filter(games::id.eq(game_id)))
        .set((
            games::title.eq(validated.title.as_ref()),
            games::description.eq(validated.description.as_ref()),
            games::image_url.eq(validated.image_url.as_ref().map(|url| url.as_ref())),
            games::released_on.eq(validated.released_on.date()),
            games::genre_id.eq(validated.genre_id),
        ))
        .execute(&mut conn)
        .await
        .map_err(|err| CustomError::DatabaseError(DbError::UpdationError(err.to_string())))?;

    if updated == 0 {
        return Err(CustomError::NotFound(format!(
            "Game {} does not exist",
            game_id
        )));
    }

    Ok(see_other(GAMES_LISTING))
}

/******************************************/
// MyZone listing Route
/******************************************/
/**
 * @route   GET /myzone
 * @access  Protected
 */
#[instrument(name = "List MyZone games", skip(pool, caller), fields(gamer = %caller.sub))]
pub async fn my_zone(
    pool: web::Data<PgPool>,
    caller: web::ReqData<Claims>,
) -> Result<HttpResponse, CustomError> {
    let caller = caller.into_inner();

    let mut conn = pool
        .get()
        .await
        .map_err(|err| CustomError::DatabaseError(DbError::ConnectionError(err.to_string())))?;

    let rows: Vec<GameSummaryRow> = games::table
        .inner_join(genres::table)
        .inner_join(users::table)
        .inner_join(gamers_games::table)
        .filter(gamers_games::gamer_id.eq(&caller.sub))
        .order(games::id.asc())
        .select((
            games::id,
            games::title,
            games::image_url,
            genres::name,
            games::released_on,
            users::username,
        ))
        .load(&mut conn)
        .await?;

    let model: Vec<GameSummary> = rows.into_iter().map(GameSummary::from).collect();

    Ok(HttpResponse::Ok().json(model))
}

/******************************************/
// Add to MyZone Route
/******************************************/
/**
 * @route   GET /myzone/add/{id}
 * @access  Protected
 */
#[instrument(name = "Add game to MyZone", skip(pool, caller), fields(gamer = %caller.sub))]
pub async fn add_to_my_zone(
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
    caller: web::ReqData<Claims>,
) -> Result<HttpResponse, CustomError> {
    let game_id = path.into_inner();
    let caller = caller.into_inner();

    let mut conn = pool
        .get()
        .await
        .map_err(|err| CustomError::DatabaseError(DbError::ConnectionError(err.to_string())))?;

    ensure_game_exists(&mut conn, game_id).await?;

    // Membership is a set: a second add converges to the same state
    diesel::insert_into(gamers_games::table)
        .values((
            gamers_games::gamer_id.eq(&caller.sub),
            gamers_games::game_id.eq(game_id),
        ))
        .on_conflict_do_nothing()
        .execute(&mut conn)
        .await
        .map_err(|err| membership_insert_error(game_id, err))?;

    Ok(see_other(MYZONE_LISTING))
}

/******************************************/
// Strike out of MyZone Route
/******************************************/
/**
 * @route   GET /myzone/strikeout/{id}
 * @access  Protected
 */
#[instrument(name = "Strike game out of MyZone", skip(pool, caller), fields(gamer = %caller.sub))]
pub async fn strike_out(
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
    caller: web::ReqData<Claims>,
) -> Result<HttpResponse, CustomError> {
    let game_id = path.into_inner();
    let caller = caller.into_inner();

    let mut conn = pool
        .get()
        .await
        .map_err(|err| CustomError::DatabaseError(DbError::ConnectionError(err.to_string())))?;

    ensure_game_exists(&mut conn, game_id).await?;

    // Absent membership deletes zero rows, which is a no-op, not an error
    diesel::delete(
        gamers_games::table
            .filter(gamers_games::gamer_id.eq(&caller.sub))
            .filter(gamers_games::game_id.eq(game_id)),
    )
    .execute(&mut conn)
    .await?;

    Ok(see_other(MYZONE_LISTING))
}

/******************************************/
// Game details Route
/******************************************/
/**
 * @route   GET /games/{id}
 * @access  Protected
 */
#[instrument(name = "Get game details", skip(pool))]
pub async fn details(
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, CustomError> {
    let game_id = path.into_inner();

    let mut conn = pool
        .get()
        .await
        .map_err(|err| CustomError::DatabaseError(DbError::ConnectionError(err.to_string())))?;

    let row: GameDetailsRow = games::table
        .inner_join(genres::table)
        .inner_join(users::table)
        .filter(games::id.eq(game_id))
        .select((
            games::id,
            games::title,
            games::image_url,
            games::description,
            games::released_on,
            genres::name,
            users::username,
        ))
        .first(&mut conn)
        .await?;

    Ok(HttpResponse::Ok().json(GameDetails::from(row)))
}

/******************************************/
// Prepare delete Route
/******************************************/
/**
 * @route   GET /games/{id}/delete
 * @access  Protected
 */
#[instrument(name = "Prepare game delete", skip(pool))]
pub async fn prepare_delete(
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, CustomError> {
    let game_id = path.into_inner();

    let mut conn = pool
        .get()
        .await
        .map_err(|err| CustomError::DatabaseError(DbError::ConnectionError(err.to_string())))?;

    let confirmation: DeleteConfirmation = games::table
        .inner_join(users::table)
        .filter(games::id.eq(game_id))
        .select((games::id, games::title, users::username))
        .first(&mut conn)
        .await?;

    Ok(HttpResponse::Ok().json(confirmation))
}

/******************************************/
// Confirm delete Route
/******************************************/
/**
 * @route   POST /games/{id}/delete
 * @access  Protected
 */
#[instrument(name = "Delete a game", skip(pool))]
pub async fn confirm_delete(
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, CustomError> {
    let game_id = path.into_inner();

    let mut conn = pool
        .get()
        .await
        .map_err(|err| CustomError::DatabaseError(DbError::ConnectionError(err.to_string())))?;

    // The game owns its memberships: both go in one transaction, and an
    // already-deleted id removes zero rows without complaint
    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        async move {
            diesel::delete(gamers_games::table.filter(gamers_games::game_id.eq(game_id)))
                .execute(conn)
                .await?;
            diesel::delete(games::table.filter(games::id.eq(game_id)))
                .execute(conn)
                .await?;
            Ok(())
        }
        .scope_boxed()
    })
    .await?;

    tracing::info!("Game {} removed from the catalog", game_id);

    Ok(see_other(GAMES_LISTING))
}

#[cfg(test)]
mod tests {
    use super::{membership_insert_error, see_other, validation_echo, GAMES_LISTING};
    use actix_web::http::{header, StatusCode};
    use actix_web::ResponseError;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use helpers::validations::validations::{FieldError, GameFormBody};

    #[test]
    fn redirects_point_at_the_canonical_listing() {
        let response = see_other(GAMES_LISTING);
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/api/v1/games"
        );
    }

    #[test]
    fn validation_failures_are_bad_requests() {
        let form = GameFormBody {
            title: "x".to_string(),
            description: "A classic strategy game for two players.".to_string(),
            image_url: None,
            released_on: "15/03/2021".to_string(),
            genre_id: 1,
        };
        let err = FieldError {
            field: "title",
            message: "Title should be between 2 and 50 symbols".to_string(),
        };
        let response = validation_echo(&form, err);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn a_broken_membership_foreign_key_reads_as_not_found() {
        let err = DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            Box::new(
                "insert or update on table \"gamers_games\" violates foreign key constraint"
                    .to_string(),
            ),
        );
        let mapped = membership_insert_error(42, err);
        assert_eq!(mapped.error_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn other_membership_insert_failures_stay_database_errors() {
        let mapped = membership_insert_error(42, DieselError::RollbackTransaction);
        assert_eq!(
            mapped.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
