use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub type AppResult<T = ()> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    SqlError(sqlx::Error),

    // Auth
    NotLoggedIn,
    InvalidToken,

    // Lookups
    ModRevisionDoesNotExist { mod_id: i32, revision: i32 },
    ModDoesNotExist,
    MapDoesNotExist,
    TechDoesNotExist,
    UnknownDifficultyName(String),
    UnknownTechName(String),
    UnknownLengthName(String),
    UnknownMapperUserId(i32),
    UserDoesNotExist(i32),

    // Submission validation
    IncompleteNormalMap(String),
    InvalidModDifficulty,
    UnknownPublisher,
    AmbiguousPublisherName(Vec<i32>),
    UserHasNoPublisher,
    UserHasMultiplePublishers(Vec<i32>),
    PlatformMemberNotFound(i64),
    PlatformUsernameNotFound(String),
    EmptyRating,

    // Formatting invariant violations
    NoModDetails(i32),
    NonContinuousParentOrder(i32),
    NonContinuousChildOrder { mod_id: i32, parent: String },
    MissingChapterOrSide(i32),
    MissingModDifficulty(i32),

    // Reference-data invariant violations
    NoDefaultDifficulty,
    AmbiguousDefaultOrdering,
    AmbiguousTechOrdering,

    // External platform
    PlatformApi(String),
}

impl AppError {
    pub fn message(&self) -> String {
        match self {
            Self::SqlError(err) => format!("Internal SQL error: {err}"),

            Self::NotLoggedIn => "Not signed in".to_string(),
            Self::InvalidToken => "Invalid token".to_string(),

            Self::ModRevisionDoesNotExist { mod_id, revision } => {
                format!("Revision {revision} does not exist for mod {mod_id}")
            }
            Self::ModDoesNotExist => "Mod does not exist".to_string(),
            Self::MapDoesNotExist => "Map does not exist".to_string(),
            Self::TechDoesNotExist => "Tech does not exist".to_string(),
            Self::UnknownDifficultyName(name) => {
                format!("\"{name}\" does not match any default parent difficulty name")
            }
            Self::UnknownTechName(name) => {
                format!("\"{name}\" does not match the name of any tech")
            }
            Self::UnknownLengthName(name) => {
                format!("\"{name}\" does not match the name of any map length")
            }
            Self::UnknownMapperUserId(id) => format!("No user found with id {id}"),
            Self::UserDoesNotExist(id) => format!("User {id} does not exist"),

            Self::IncompleteNormalMap(name) => {
                format!("Map \"{name}\" in a Normal mod must specify a chapter and a side")
            }
            Self::InvalidModDifficulty => "All maps in a non-Normal mod must be assigned \
                a modDifficulty that matches the difficulties used by the mod (whether \
                default or custom). Against the default difficulties, modDifficulty must \
                be given as a [difficulty, sub-difficulty] pair."
                .to_string(),
            Self::UnknownPublisher => "Publisher not found".to_string(),
            Self::AmbiguousPublisherName(ids) => format!(
                "More than one publisher has the specified name. Please specify a \
                 publisher id instead. Matching publisher ids: {ids:?}"
            ),
            Self::UserHasNoPublisher => "Specified user has no associated publisher".to_string(),
            Self::UserHasMultiplePublishers(ids) => format!(
                "Specified user has more than one associated publisher. Please specify a \
                 publisher id instead. Publisher ids associated with the user: {ids:?}"
            ),
            Self::PlatformMemberNotFound(id) => {
                format!("Member id {id} does not exist on the platform")
            }
            Self::PlatformUsernameNotFound(name) => {
                format!("Username \"{name}\" does not exist on the platform")
            }
            Self::EmptyRating => "A rating must include a quality or a difficulty".to_string(),

            Self::NoModDetails(mod_id) => format!("Mod {mod_id} has no detail revisions"),
            Self::NonContinuousParentOrder(mod_id) => {
                format!("Parent difficulty orders for mod {mod_id} are not continuous")
            }
            Self::NonContinuousChildOrder { mod_id, parent } => format!(
                "Child difficulty orders for parent difficulty \"{parent}\" in mod \
                 {mod_id} are not continuous"
            ),
            Self::MissingChapterOrSide(map_id) => {
                format!("Chapter or side is missing in Normal map {map_id}")
            }
            Self::MissingModDifficulty(map_id) => {
                format!("modDifficulty is missing in non-Normal map {map_id}")
            }

            Self::NoDefaultDifficulty => "No default parent difficulties exist".to_string(),
            Self::AmbiguousDefaultOrdering => {
                "Two default parent difficulties have the same order".to_string()
            }
            Self::AmbiguousTechOrdering => {
                "Two matching techs have difficulties with the same order".to_string()
            }

            Self::PlatformApi(msg) => format!("Platform API error: {msg}"),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,

            Self::NotLoggedIn => StatusCode::UNAUTHORIZED,
            Self::InvalidToken => StatusCode::UNAUTHORIZED,

            Self::ModDoesNotExist => StatusCode::NOT_FOUND,
            Self::MapDoesNotExist => StatusCode::NOT_FOUND,
            Self::TechDoesNotExist => StatusCode::NOT_FOUND,
            Self::UnknownDifficultyName(_) => StatusCode::NOT_FOUND,
            Self::ModRevisionDoesNotExist { .. } => StatusCode::NOT_FOUND,
            Self::UnknownTechName(_) => StatusCode::NOT_FOUND,
            Self::UnknownLengthName(_) => StatusCode::NOT_FOUND,
            Self::UnknownMapperUserId(_) => StatusCode::NOT_FOUND,
            Self::UserDoesNotExist(_) => StatusCode::NOT_FOUND,

            Self::IncompleteNormalMap(_) => StatusCode::BAD_REQUEST,
            Self::InvalidModDifficulty => StatusCode::BAD_REQUEST,
            Self::UnknownPublisher => StatusCode::NOT_FOUND,
            Self::AmbiguousPublisherName(_) => StatusCode::BAD_REQUEST,
            Self::UserHasNoPublisher => StatusCode::BAD_REQUEST,
            Self::UserHasMultiplePublishers(_) => StatusCode::BAD_REQUEST,
            Self::PlatformMemberNotFound(_) => StatusCode::NOT_FOUND,
            Self::PlatformUsernameNotFound(_) => StatusCode::NOT_FOUND,
            Self::EmptyRating => StatusCode::BAD_REQUEST,

            // These indicate corrupt rows rather than a bad request.
            Self::NoModDetails(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NonContinuousParentOrder(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NonContinuousChildOrder { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingChapterOrSide(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingModDifficulty(_) => StatusCode::INTERNAL_SERVER_ERROR,

            Self::NoDefaultDifficulty => StatusCode::INTERNAL_SERVER_ERROR,
            Self::AmbiguousDefaultOrdering => StatusCode::INTERNAL_SERVER_ERROR,
            Self::AmbiguousTechOrdering => StatusCode::INTERNAL_SERVER_ERROR,

            Self::PlatformApi(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response<Body> {
        (self.status_code(), self.message()).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> AppError {
        AppError::SqlError(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> AppError {
        AppError::PlatformApi(err.to_string())
    }
}
