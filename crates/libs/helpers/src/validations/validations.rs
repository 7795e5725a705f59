// Grapheme-aware length checks so multi-byte titles count the way a user
// would count them
use chrono::NaiveDate;
use errors::CustomError;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

pub const TITLE_MIN_LENGTH: usize = 2;
pub const TITLE_MAX_LENGTH: usize = 50;
pub const DESCRIPTION_MIN_LENGTH: usize = 10;
pub const DESCRIPTION_MAX_LENGTH: usize = 500;

/// The one fixed exchange format for release dates, e.g. "15/03/2021".
pub const RELEASED_ON_FORMAT: &str = "%d/%m/%Y";

/// A validation failure attributed to a single form field.
#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl From<FieldError> for CustomError {
    fn from(err: FieldError) -> Self {
        CustomError::ValidationError(format!("{}: {}", err.field, err.message))
    }
}

#[derive(Debug)]
pub struct GameTitle(String);

impl GameTitle {
    pub fn parse(s: String) -> Result<GameTitle, FieldError> {
        let length = s.trim().graphemes(true).count();

        if length < TITLE_MIN_LENGTH || length > TITLE_MAX_LENGTH {
            Err(FieldError::new(
                "title",
                format!(
                    "Title should be between {} and {} symbols",
                    TITLE_MIN_LENGTH, TITLE_MAX_LENGTH
                ),
            ))
        } else {
            Ok(Self(s))
        }
    }
}

impl AsRef<str> for GameTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug)]
pub struct GameDescription(String);

impl GameDescription {
    pub fn parse(s: String) -> Result<GameDescription, FieldError> {
        let length = s.trim().graphemes(true).count();

        if length < DESCRIPTION_MIN_LENGTH || length > DESCRIPTION_MAX_LENGTH {
            Err(FieldError::new(
                "description",
                format!(
                    "Description should be between {} and {} symbols",
                    DESCRIPTION_MIN_LENGTH, DESCRIPTION_MAX_LENGTH
                ),
            ))
        } else {
            Ok(Self(s))
        }
    }
}

impl AsRef<str> for GameDescription {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug)]
pub struct ImageUrl(String);

impl ImageUrl {
    /// A blank submission means "no image", not an invalid one.
    pub fn parse(s: Option<String>) -> Result<Option<ImageUrl>, FieldError> {
        match s {
            Some(url) if url.trim().is_empty() => Ok(None),
            Some(url) => Ok(Some(Self(url))),
            None => Ok(None),
        }
    }
}

impl AsRef<str> for ImageUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleasedOn(NaiveDate);

impl ReleasedOn {
    pub fn parse(s: &str) -> Result<ReleasedOn, FieldError> {
        NaiveDate::parse_from_str(s.trim(), RELEASED_ON_FORMAT)
            .map(Self)
            .map_err(|_| FieldError::new("released_on", "Invalid date format."))
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn format(&self) -> String {
        self.0.format(RELEASED_ON_FORMAT).to_string()
    }
}

/// Formats a stored date back into the fixed exchange format.
pub fn format_released_on(date: NaiveDate) -> String {
    date.format(RELEASED_ON_FORMAT).to_string()
}

/// The submitted add/edit form, exactly as the client sent it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameFormBody {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub released_on: String,
    pub genre_id: i32,
}

/// Field values that passed every per-field check. The genre reference is
/// still unresolved at this point; the store lookup settles it.
#[derive(Debug)]
pub struct ValidatedGame {
    pub title: GameTitle,
    pub description: GameDescription,
    pub image_url: Option<ImageUrl>,
    pub released_on: ReleasedOn,
    pub genre_id: i32,
}

impl GameFormBody {
    pub fn validate(self) -> Result<ValidatedGame, FieldError> {
        let title = GameTitle::parse(self.title)?;
        let description = GameDescription::parse(self.description)?;
        let image_url = ImageUrl::parse(self.image_url)?;
        let released_on = ReleasedOn::parse(&self.released_on)?;

        Ok(ValidatedGame {
            title,
            description,
            image_url,
            released_on,
            genre_id: self.genre_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        format_released_on, GameDescription, GameFormBody, GameTitle, ImageUrl, ReleasedOn,
    };
    use chrono::NaiveDate;
    use claim::{assert_err, assert_none, assert_ok, assert_some};

    #[test]
    fn a_2_grapheme_title_is_valid() {
        let title = "a".repeat(2);
        assert_ok!(GameTitle::parse(title));
    }

    #[test]
    fn a_50_grapheme_title_is_valid() {
        let title = "a".repeat(50);
        assert_ok!(GameTitle::parse(title));
    }

    #[test]
    fn a_1_grapheme_title_is_rejected() {
        let title = "a".to_string();
        assert_err!(GameTitle::parse(title));
    }

    #[test]
    fn a_title_longer_than_50_graphemes_is_rejected() {
        let title = "a".repeat(51);
        assert_err!(GameTitle::parse(title));
    }

    #[test]
    fn whitespace_only_titles_are_rejected() {
        let title = "   ".to_string();
        assert_err!(GameTitle::parse(title));
    }

    #[test]
    fn a_10_grapheme_description_is_valid() {
        let description = "d".repeat(10);
        assert_ok!(GameDescription::parse(description));
    }

    #[test]
    fn a_9_grapheme_description_is_rejected() {
        let description = "d".repeat(9);
        assert_err!(GameDescription::parse(description));
    }

    #[test]
    fn a_description_longer_than_500_graphemes_is_rejected() {
        let description = "d".repeat(501);
        assert_err!(GameDescription::parse(description));
    }

    #[test]
    fn a_blank_image_url_collapses_to_none() {
        let parsed = ImageUrl::parse(Some("   ".to_string())).unwrap();
        assert_none!(parsed);
    }

    #[test]
    fn a_present_image_url_is_kept() {
        let parsed = ImageUrl::parse(Some("https://example.com/cover.png".to_string())).unwrap();
        assert_some!(parsed);
    }

    #[test]
    fn a_well_formed_date_is_parsed() {
        let released_on = ReleasedOn::parse("15/03/2021").unwrap();
        assert_eq!(
            released_on.date(),
            NaiveDate::from_ymd_opt(2021, 3, 15).unwrap()
        );
    }

    #[test]
    fn an_iso_formatted_date_is_rejected() {
        assert_err!(ReleasedOn::parse("2021-03-15"));
    }

    #[test]
    fn a_nonsense_date_is_rejected() {
        assert_err!(ReleasedOn::parse("32/13/2021"));
    }

    #[test]
    fn formatting_then_parsing_round_trips() {
        let date = NaiveDate::from_ymd_opt(1998, 11, 30).unwrap();
        let reparsed = ReleasedOn::parse(&format_released_on(date)).unwrap();
        assert_eq!(reparsed.date(), date);
    }

    #[test]
    fn a_valid_form_passes_every_field() {
        let form = GameFormBody {
            title: "Chess Master".to_string(),
            description: "A classic strategy game for two players.".to_string(),
            image_url: None,
            released_on: "15/03/2021".to_string(),
            genre_id: 1,
        };
        let validated = form.validate().unwrap();
        assert_eq!(validated.title.as_ref(), "Chess Master");
        assert_eq!(validated.genre_id, 1);
    }

    #[test]
    fn a_bad_title_is_attributed_to_the_title_field() {
        let form = GameFormBody {
            title: "x".to_string(),
            description: "A classic strategy game for two players.".to_string(),
            image_url: None,
            released_on: "15/03/2021".to_string(),
            genre_id: 1,
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.field, "title");
    }

    #[test]
    fn a_bad_date_is_attributed_to_the_released_on_field() {
        let form = GameFormBody {
            title: "Chess Master".to_string(),
            description: "A classic strategy game for two players.".to_string(),
            image_url: None,
            released_on: "March 15th 2021".to_string(),
            genre_id: 1,
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.field, "released_on");
    }
}
