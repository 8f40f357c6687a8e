//! Catalog service errors.

use checkout::items::VariantId;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogServiceError {
    #[error("unknown variant {0}")]
    UnknownVariant(VariantId),
}
