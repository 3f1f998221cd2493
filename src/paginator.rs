use futures_util::{Stream, TryStreamExt, stream};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::client::AdminClient;
use crate::{GateviewError, Result};

/// One page of a cursor-walked collection. `next` is the server-supplied
/// cursor, used verbatim to request the following page.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_empty")]
    pub data: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Walks paginated admin-API collections, following the `next` cursor until
/// exhausted. Walks are lazy and every call starts from the first page.
#[derive(Clone)]
pub struct Paginator {
    client: AdminClient,
    page_size: usize,
}

impl Paginator {
    pub fn new(client: AdminClient, page_size: usize) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
        }
    }

    /// Page-at-a-time cursor walk. A page without a cursor is terminal even
    /// when its `data` is non-empty; a request failure aborts the walk with
    /// the resource path and 1-based page number attached.
    pub fn pages<'a, T>(&'a self, path: &str) -> impl Stream<Item = Result<Page<T>>> + use<'a, T>
    where
        T: DeserializeOwned + 'a,
    {
        let path = path.to_string();
        let first = format!("{path}?size={}", self.page_size);
        stream::try_unfold((Some(first), 1usize), move |(cursor, page_no)| {
            let path = path.clone();
            async move {
                let Some(url) = cursor else {
                    return Ok(None);
                };
                tracing::debug!(path = %path, page = page_no, "fetching admin api page");
                let page: Page<T> =
                    self.client
                        .get_json(&url)
                        .await
                        .map_err(|source| GateviewError::Fetch {
                            path,
                            page: page_no,
                            source,
                        })?;
                let next = page
                    .next
                    .as_deref()
                    .filter(|cursor| !cursor.trim().is_empty())
                    .map(str::to_string);
                Ok(Some((page, (next, page_no + 1))))
            }
        })
    }

    /// The walk's records flattened in server order.
    pub fn records<'a, T>(&'a self, path: &str) -> impl Stream<Item = Result<T>> + use<'a, T>
    where
        T: DeserializeOwned + 'a,
    {
        self.pages(path)
            .map_ok(|page: Page<T>| stream::iter(page.data.into_iter().map(Ok)))
            .try_flatten()
    }

    pub async fn collect<T>(&self, path: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.records(path).try_collect().await
    }

    pub async fn count(&self, path: &str) -> Result<usize> {
        self.records::<serde::de::IgnoredAny>(path)
            .try_fold(0usize, |count, _| async move { Ok(count + 1) })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_decodes_null_data_as_empty() {
        let page: Page<serde_json::Value> =
            serde_json::from_str(r#"{"data":null,"next":null}"#).unwrap();
        assert!(page.data.is_empty());
        assert!(page.next.is_none());
    }

    #[test]
    fn page_decodes_missing_fields() {
        let page: Page<serde_json::Value> = serde_json::from_str("{}").unwrap();
        assert!(page.data.is_empty());
        assert!(page.next.is_none());
    }
}
