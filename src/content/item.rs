use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One interchangeable piece of notification content.
///
/// Fields are private so an item cannot change once it is in a pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentItem {
    title: String,
    body: String,
    /// Image URI, fetched as an attachment when the notification is armed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

impl ContentItem {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            image: None,
        }
    }

    /// Attach an image reference
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Decode a loosely-typed host argument.
    ///
    /// `title` and `body` must be strings. A non-string `image` is ignored
    /// rather than rejecting the whole item.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let title = object.get("title")?.as_str()?;
        let body = object.get("body")?.as_str()?;
        let image = object.get("image").and_then(Value::as_str);

        Some(Self {
            title: title.to_string(),
            body: body.to_string(),
            image: image.map(str::to_string),
        })
    }

    /// Decode a pool, dropping malformed entries.
    pub fn parse_pool(values: &[Value]) -> Vec<Self> {
        let items: Vec<Self> = values.iter().filter_map(Self::from_json).collect();

        if items.len() < values.len() {
            tracing::warn!(
                received = values.len(),
                accepted = items.len(),
                "Dropped malformed content items"
            );
        }

        items
    }
}
