/// Core error type for the mirror.
///
/// Adapter crates map their transport errors into this type so the dispatcher
/// can tell fatal startup failures apart from per-message ones.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("cannot access {channel}: {reason}")]
    ChannelAccess { channel: String, reason: String },

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("translation failed: {0}")]
    Translation(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_part() {
        let e = Error::ChannelAccess {
            channel: "@src".to_string(),
            reason: "bot is member".to_string(),
        };
        assert_eq!(e.to_string(), "cannot access @src: bot is member");

        let io: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(io, Error::Io(_)));
        assert_eq!(io.to_string(), "i/o error: gone");
    }
}
