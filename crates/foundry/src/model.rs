use serde::Serialize;
use serde::de::DeserializeOwned;

/// A type factories can build and stores can hold.
///
/// ```rust,ignore
/// #[derive(Serialize, Deserialize)]
/// struct User {
///     name: String,
/// }
///
/// impl Model for User {
///     const NAME: &'static str = "user";
/// }
/// ```
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Model name used as the store key.
    const NAME: &'static str;
}
