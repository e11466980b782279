use crate::coordinate::Coordinate;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("coordinate {0} was initialized twice while building the board graph")]
    DuplicateCoordinate(Coordinate),
    #[error("a {width}x{height} board does not fit the coordinate space")]
    BoardTooLarge { width: usize, height: usize },
    #[error("invalid block: {0}")]
    InvalidBlock(String),
    #[error("malformed coordinate key {0:?}, expected \"i,j\"")]
    InvalidCoordinateKey(String),
    #[error("malformed colour {0:?}")]
    InvalidColour(String),
    #[error("malformed tileset snapshot: {0}")]
    MalformedSnapshot(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
