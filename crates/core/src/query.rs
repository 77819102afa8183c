//! Structured builder for Directus query parameters.
//!
//! Produces ordered `(key, value)` pairs such as `fields=id,title` or
//! `filter[collection_many][eq]=posts`. Encoding is left to the transport.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    /// Attribute IS NULL.
    Null,
    /// Attribute IS NOT NULL.
    NotNull,
}

impl FilterOp {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Null => "null",
            FilterOp::NotNull => "nnull",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned attributes: `fields=a,b,c`.
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.pairs.push(("fields".to_string(), fields.join(",")));
        self
    }

    /// Page size: `limit=n`. Directus reads `-1` as "every row".
    pub fn limit(mut self, limit: i64) -> Self {
        self.pairs.push(("limit".to_string(), limit.to_string()));
        self
    }

    /// `filter[attr][op]=value`.
    pub fn filter(mut self, attr: &str, op: FilterOp, value: &str) -> Self {
        self.pairs
            .push((format!("filter[{}][{}]", attr, op.as_str()), value.to_string()));
        self
    }

    /// `filter[attr][null]=1`.
    pub fn filter_null(self, attr: &str) -> Self {
        self.filter(attr, FilterOp::Null, "1")
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }
}
