use crate::domain::{ErrorClass, PredictError, StartupError};

/// Exit code for startup/configuration failures (dataset, model, I/O).
pub const EXIT_CONFIG: u8 = 2;
/// Exit code for input the user should correct.
pub const EXIT_INVALID_INPUT: u8 = 3;
/// Exit code for schema/model/taxonomy drift.
pub const EXIT_DRIFT: u8 = 4;
/// Exit code for estimator failures.
pub const EXIT_INFERENCE: u8 = 5;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<StartupError> for AppError {
    fn from(err: StartupError) -> Self {
        AppError::new(EXIT_CONFIG, format!("Startup failed: {err}"))
    }
}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        let (code, prefix) = match err.class() {
            ErrorClass::InvalidInput => (EXIT_INVALID_INPUT, "Invalid input"),
            ErrorClass::Drift => (EXIT_DRIFT, "Model/schema drift"),
            ErrorClass::Inference => (EXIT_INFERENCE, "Prediction failed"),
        };
        AppError::new(code, format!("{prefix}: {err}"))
    }
}
