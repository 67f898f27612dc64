//! Request observations and the label keys derived from them.

use std::borrow::Cow;
use std::time::Duration;

use crate::metric::LabelName;

/// One completed HTTP request, captured by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEvent {
    pub client_ip: String,
    pub user_agent: String,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub latency: Duration,
}

impl RequestEvent {
    /// Value of one label for this request. `code` is the decimal status.
    pub fn label_value(&self, label: LabelName) -> Cow<'_, str> {
        match label {
            LabelName::Ip => Cow::Borrowed(&self.client_ip),
            LabelName::Method => Cow::Borrowed(&self.method),
            LabelName::Path => Cow::Borrowed(&self.path),
            LabelName::Code => Cow::Owned(self.status.to_string()),
            LabelName::UserAgent => Cow::Borrowed(&self.user_agent),
        }
    }

    /// Whether this request came from the metrics scraper.
    /// An empty signature never matches.
    pub fn is_scrape(&self, signature: &str) -> bool {
        !signature.is_empty() && self.user_agent.contains(signature)
    }

    pub fn latency_nanos(&self) -> f64 {
        self.latency.as_nanos() as f64
    }
}

/// Positional label values, one per declared label of a metric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LabelKey(Box<[String]>);

impl LabelKey {
    /// Key of an unlabeled series.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the key for `labels` (in declared order) from `event`.
    pub fn derive(labels: &[LabelName], event: &RequestEvent) -> Self {
        Self(
            labels
                .iter()
                .map(|l| event.label_value(*l).into_owned())
                .collect(),
        )
    }

    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(values.into_iter().map(Into::into).collect())
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
