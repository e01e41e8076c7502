pub type RaceResult<T> = Result<T, RaceError>;

#[derive(thiserror::Error, Debug)]
pub enum RaceError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("playback error: {0}")]
    Playback(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RaceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for RaceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

impl From<std::io::Error> for RaceError {
    fn from(err: std::io::Error) -> Self {
        Self::Other(anyhow::Error::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            RaceError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            RaceError::playback("x")
                .to_string()
                .contains("playback error:")
        );
        assert!(
            RaceError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn io_errors_keep_their_message() {
        let err: RaceError = std::io::Error::other("disk gone").into();
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn json_errors_map_to_serde() {
        let err: RaceError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, RaceError::Serde(_)));
    }
}
