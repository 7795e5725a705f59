use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use helpers::validations::validations::{format_released_on, GameFormBody};

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::games)]
pub struct NewGame {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub publisher_id: String,
    pub released_on: NaiveDate,
    pub genre_id: i32,
}

#[derive(Queryable, Serialize, Deserialize, Debug)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

/// Listing row: ids and display strings only, dates already formatted.
#[derive(Serialize, Debug)]
pub struct GameSummary {
    pub id: i32,
    pub title: String,
    pub image_url: Option<String>,
    pub genre: String,
    pub released_on: String,
    pub publisher: String,
}

pub type GameSummaryRow = (i32, String, Option<String>, String, NaiveDate, String);

impl From<GameSummaryRow> for GameSummary {
    fn from((id, title, image_url, genre, released_on, publisher): GameSummaryRow) -> Self {
        Self {
            id,
            title,
            image_url,
            genre,
            released_on: format_released_on(released_on),
            publisher,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct GameDetails {
    pub id: i32,
    pub title: String,
    pub image_url: Option<String>,
    pub description: String,
    pub released_on: String,
    pub genre: String,
    pub publisher: String,
}

pub type GameDetailsRow = (i32, String, Option<String>, String, NaiveDate, String, String);

impl From<GameDetailsRow> for GameDetails {
    fn from(
        (id, title, image_url, description, released_on, genre, publisher): GameDetailsRow,
    ) -> Self {
        Self {
            id,
            title,
            image_url,
            description,
            released_on: format_released_on(released_on),
            genre,
            publisher,
        }
    }
}

/// Minimal data for the delete confirmation step.
#[derive(Queryable, Serialize, Debug)]
pub struct DeleteConfirmation {
    pub id: i32,
    pub title: String,
    pub publisher: String,
}

/// An add/edit form plus the genre list for its selection control. The
/// genre list is per-request presentation data, never part of the entity.
#[derive(Serialize, Debug)]
pub struct GameFormView {
    pub form: GameFormBody,
    pub genres: Vec<Genre>,
}

#[cfg(test)]
mod tests {
    use super::{GameDetails, GameSummary};
    use chrono::NaiveDate;

    #[test]
    fn summary_rows_format_the_release_date() {
        let row = (
            1,
            "Chess Master".to_string(),
            None,
            "Strategy".to_string(),
            NaiveDate::from_ymd_opt(2021, 3, 15).unwrap(),
            "alice".to_string(),
        );
        let summary = GameSummary::from(row);
        assert_eq!(summary.released_on, "15/03/2021");
        assert_eq!(summary.genre, "Strategy");
    }

    #[test]
    fn detail_rows_format_the_release_date() {
        let row = (
            7,
            "Chess Master".to_string(),
            Some("https://example.com/cover.png".to_string()),
            "A classic strategy game for two players.".to_string(),
            NaiveDate::from_ymd_opt(2021, 3, 15).unwrap(),
            "Strategy".to_string(),
            "alice".to_string(),
        );
        let details = GameDetails::from(row);
        assert_eq!(details.released_on, "15/03/2021");
        assert_eq!(details.publisher, "alice");
    }
}
