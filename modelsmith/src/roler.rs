//! Role capability for storage models.

/// Implemented by models that carry an authorization role.
pub trait Roler {
    fn role(&self) -> &str;
}
