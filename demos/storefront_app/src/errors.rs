// demos/storefront_app/src/errors.rs

use bookcart::CartError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Cart Error: {source}")]
  Cart {
    #[from] // Allows conversion from bookcart::CartError
    source: CartError,
  },

  #[error("Checkout blocked, {} line(s) cannot be fulfilled", .short.len())]
  CheckoutBlocked { short: Vec<String> },

  #[error("Internal Error: {0}")]
  Internal(String), // For miscellaneous errors
}

// Lets the session script use `?` on anyhow results.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<CartError>() {
      Ok(source) => AppError::Cart { source },
      Err(err) => AppError::Internal(err.to_string()),
    }
  }
}

impl AppError {
  /// Whether the session may carry on after logging this error.
  pub fn is_recoverable(&self) -> bool {
    match self {
      AppError::Cart { source } => source.is_retryable(),
      AppError::CheckoutBlocked { .. } => true,
      AppError::Config(_) | AppError::Internal(_) => false,
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
