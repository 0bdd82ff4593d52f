use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    JsonError(String),
    MissingField(&'static str),
    DirectoryDoesNotExist(String),
    NotInRange(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::JsonError(e) => write!(f, "JSON parsing error: {}", e),
            ConfigError::MissingField(name) => write!(f, "Missing configuration field: {}", name),
            ConfigError::DirectoryDoesNotExist(e) => write!(f, "Directory error: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

#[derive(Debug)]
pub enum SupervisorError {
    SpawnFailed(std::io::Error),
    InvalidCommand(String),
    SignalFailed(String),
    ChannelClosed,
}

impl fmt::Display for SupervisorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorError::SpawnFailed(e) => write!(f, "Capture process spawn failed: {}", e),
            SupervisorError::InvalidCommand(e) => write!(f, "Invalid capture command: {}", e),
            SupervisorError::SignalFailed(e) => write!(f, "Signal delivery failed: {}", e),
            SupervisorError::ChannelClosed => write!(f, "Supervisor channel closed"),
        }
    }
}

impl std::error::Error for SupervisorError {}
