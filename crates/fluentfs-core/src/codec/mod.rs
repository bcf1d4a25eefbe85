//! How a file's text maps to the content callers read and write.
//!
//! Every [`File`](crate::File) carries a [`Codec`]. Plain files use [`Text`];
//! structured files use [`Structured`], which pairs a [`Format`] (JSON,
//! YAML, TOML) with a [`Schema`] that validates parsed values into typed
//! content.

pub mod format;
pub mod schema;

pub use format::{Format, Json, Spacing, Toml, Yaml};
pub use schema::{from_value, Issue, Issues, Schema, SerdeSchema, ValueSchema};

use crate::error::Cause;

/// Decoding of file text into content, and encoding of content back.
pub trait Codec: Clone + Send + Sync + 'static {
    /// What a write accepts.
    type Content: Send + Sync;
    /// What a read yields.
    type Parsed: Send;

    fn decode(&self, text: &str) -> Result<Self::Parsed, Cause>;
    fn encode(&self, content: &Self::Content, spacing: &Spacing) -> Result<String, Cause>;
}

/// Text in, text out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Text;

impl Codec for Text {
    type Content = String;
    type Parsed = String;

    fn decode(&self, text: &str) -> Result<String, Cause> {
        Ok(text.to_owned())
    }

    fn encode(&self, content: &String, _spacing: &Spacing) -> Result<String, Cause> {
        Ok(content.clone())
    }
}

/// A format plus a schema.
#[derive(Debug, Clone, Default)]
pub struct Structured<F, S> {
    format: F,
    schema: S,
}

impl<F, S> Structured<F, S> {
    pub fn new(format: F, schema: S) -> Self {
        Self { format, schema }
    }

    pub fn format(&self) -> &F {
        &self.format
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }
}

impl<F: Format, S: Schema> Codec for Structured<F, S> {
    type Content = S::Content;
    type Parsed = S::Parsed;

    fn decode(&self, text: &str) -> Result<S::Parsed, Cause> {
        let value = self.format.parse(text).map_err(|message| Cause::Parse {
            format: F::NAME,
            message,
        })?;
        self.schema.validate(value).map_err(Cause::Invalid)
    }

    fn encode(&self, content: &S::Content, spacing: &Spacing) -> Result<String, Cause> {
        let value = self.schema.to_value(content).map_err(Cause::Invalid)?;
        let text = self
            .format
            .stringify(&value, spacing)
            .map_err(Cause::Stringify)?;
        if text.trim().is_empty() {
            return Err(Cause::Stringify(format!("{} output was empty", F::NAME)));
        }
        Ok(text)
    }
}

pub type JsonCodec<S> = Structured<Json, S>;
pub type YamlCodec<S> = Structured<Yaml, S>;
pub type TomlCodec<S> = Structured<Toml, S>;
