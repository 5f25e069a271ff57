use failure::Fail;

#[derive(Debug, Fail)]
pub enum SluError {
    #[fail(display = "Configuration error: {}", _0)]
    Configuration(String),
    #[fail(display = "Insufficient data to train classifier '{}': {}", dai, reason)]
    InsufficientData { dai: String, reason: String },
    #[fail(display = "Malformed input: {}", _0)]
    MalformedInput(String),
    #[fail(display = "Unable to read file '{}'", _0)]
    ModelLoad(String),
    #[fail(display = "Expected model version {} but found {}", runner, model)]
    WrongModelVersion { model: String, runner: &'static str },
    #[fail(display = "Incompatible model: {}", _0)]
    IncompatibleModel(String),
}

pub type Result<T> = ::std::result::Result<T, ::failure::Error>;
