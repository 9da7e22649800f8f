//! Resource collections and bounded parallel member fetches.

use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;

use crate::client::Client;
use crate::entity::{Resource, decode_raw, get_object};
use crate::error::{CollectionError, Result};
use crate::query::{QueryOption, build_query_for_collection};
use crate::types::Link;

/// A decoded collection envelope.
///
/// Member references come from `Links.Members` when that list is non-empty,
/// otherwise from the top-level `Members`.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// `@odata.id` of the collection.
    pub odata_id: String,
    /// `Name` of the collection.
    pub name: String,
    /// Member URIs in service order.
    pub item_links: Vec<String>,
    /// `Members@odata.count`, when reported.
    pub count: Option<u64>,
    /// `Members@odata.nextLink`: the next page of members.
    pub members_next_link: Option<String>,
    members: Vec<Box<RawValue>>,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "@odata.id", default)]
    odata_id: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Members", default)]
    members: Option<Vec<Box<RawValue>>>,
    #[serde(rename = "Members@odata.count", default)]
    count: Option<u64>,
    #[serde(rename = "Members@odata.nextLink", default)]
    next_link: Option<String>,
    #[serde(rename = "Links", default)]
    links: Option<EnvelopeLinks>,
}

#[derive(Deserialize)]
struct EnvelopeLinks {
    #[serde(rename = "Members", default)]
    members: Vec<Link>,
    #[serde(rename = "Members@odata.count", default)]
    count: Option<u64>,
}

#[derive(Deserialize)]
struct MemberShape {
    #[serde(rename = "@odata.id", default)]
    odata_id: Option<String>,
    #[serde(default)]
    href: Option<String>,
    #[serde(rename = "Id", default)]
    id: Option<String>,
}

impl MemberShape {
    fn link(&self) -> Option<&str> {
        self.odata_id.as_deref().or(self.href.as_deref())
    }
}

impl<'de> Deserialize<'de> for Collection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let envelope = Envelope::deserialize(deserializer)?;
        let members = envelope.members.unwrap_or_default();

        let (item_links, count) = match envelope.links {
            Some(links) if !links.members.is_empty() => (
                links.members.into_iter().map(String::from).collect(),
                links.count.or(envelope.count),
            ),
            _ => (
                members
                    .iter()
                    .filter_map(|raw| serde_json::from_str::<MemberShape>(raw.get()).ok())
                    .filter_map(|shape| shape.link().map(str::to_owned))
                    .filter(|link| !link.is_empty())
                    .collect(),
                envelope.count,
            ),
        };

        Ok(Self {
            odata_id: envelope.odata_id,
            name: envelope.name,
            item_links,
            count,
            members_next_link: envelope.next_link.filter(|l| !l.is_empty()),
            members,
        })
    }
}

/// Members fetched from a collection, with the ones that failed.
#[derive(Debug)]
pub struct Members<T> {
    /// Successfully decoded members, in no particular order.
    pub items: Vec<T>,
    /// Members that could not be fetched or decoded.
    pub failures: CollectionError,
}

impl<T> Default for Members<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            failures: CollectionError::default(),
        }
    }
}

impl<T> Members<T> {
    /// Whether every member was retrieved.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// All members, or the [`CollectionError`] when any failed.
    pub fn into_result(self) -> Result<Vec<T>> {
        if self.failures.is_empty() {
            Ok(self.items)
        } else {
            Err(self.failures.into())
        }
    }
}

/// GET and decode the collection envelope at `uri`.
pub fn get_collection(client: &Client, uri: &str) -> Result<Collection> {
    Ok(client.get(uri)?.json()?)
}

/// Fetch every member of the collection at `uri` as `T`.
///
/// Members the service already expanded inline are decoded without another
/// request; the rest are fetched concurrently, at most
/// [`Client::max_concurrency`] at a time. `Members@odata.nextLink` pages are
/// followed, each page at most once. Failing to read the first page is an error; failures of single
/// members (or of later pages) are collected in [`Members::failures`].
pub fn get_collection_objects<T: Resource>(
    client: &Client,
    uri: &str,
    options: &[QueryOption],
) -> Result<Members<T>> {
    let mut members = Members::default();
    if uri.is_empty() {
        return Ok(members);
    }

    let mut page = build_query_for_collection(uri, options);
    let mut collection = get_collection(client, &page)?;
    let mut visited = HashSet::from([page.clone()]);
    loop {
        let mut inline = HashSet::new();
        for raw in std::mem::take(&mut collection.members) {
            let Ok(shape) = serde_json::from_str::<MemberShape>(raw.get()) else {
                continue;
            };
            if shape.id.is_none() {
                continue;
            }
            let link = shape.link().unwrap_or_default().to_owned();
            let bytes: Arc<[u8]> = Arc::from(raw.get().as_bytes());
            match decode_raw::<T>(client, &link, bytes, None) {
                Ok(item) => members.items.push(item),
                Err(err) => members.failures.insert(link.clone(), err),
            }
            inline.insert(link);
        }

        let pending: Vec<String> = collection
            .item_links
            .iter()
            .filter(|link| !inline.contains(*link))
            .cloned()
            .collect();

        let fetched = fetch_all(pending, client.max_concurrency(), |link| {
            get_object::<T>(client, link, &[])
        });
        members.items.extend(fetched.items);
        members.failures.failures.extend(fetched.failures.failures);

        let Some(next) = collection.members_next_link.take() else {
            break;
        };
        if !visited.insert(next.clone()) {
            #[cfg(feature = "tracing")]
            tracing::warn!(uri, next = %next, "collection paging loops back, stopping");
            break;
        }
        page = next;
        collection = match get_collection(client, &page) {
            Ok(collection) => collection,
            Err(err) => {
                members.failures.insert(page, err);
                break;
            }
        };
    }
    Ok(members)
}

/// Fetch each URI in `uris` as `T`, [`Client::max_concurrency`] at a time.
pub fn get_objects<T: Resource>(
    client: &Client,
    uris: &[String],
    options: &[QueryOption],
) -> Members<T> {
    fetch_all(uris.to_vec(), client.max_concurrency(), |link| {
        get_object::<T>(client, link, options)
    })
}

/// Run `fetch` over `links` on `fan_out` worker threads.
///
/// Workers pull links from a shared queue and report on a channel; the
/// channel closes once the last worker has drained the queue.
pub(crate) fn fetch_all<T, F>(links: Vec<String>, fan_out: usize, fetch: F) -> Members<T>
where
    T: Send,
    F: Fn(&str) -> Result<T> + Sync,
{
    let mut members = Members::default();
    if links.is_empty() {
        return members;
    }

    let workers = fan_out.clamp(1, links.len());
    let queue = Mutex::new(links.into_iter());
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let queue = &queue;
            let fetch = &fetch;
            scope.spawn(move || {
                loop {
                    let next = queue.lock().unwrap_or_else(PoisonError::into_inner).next();
                    let Some(link) = next else {
                        break;
                    };
                    let result = fetch(&link);
                    if tx.send((link, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        for (link, result) in rx {
            match result {
                Ok(item) => members.items.push(item),
                Err(err) => members.failures.insert(link, err),
            }
        }
    });

    members
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::error::Error;

    #[test]
    fn links_members_win_over_members() {
        let collection: Collection = serde_json::from_str(
            r#"{
                "Name": "Drives",
                "Members": [{"@odata.id": "/a"}],
                "Links": {"Members": [{"@odata.id": "/b"}, {"@odata.id": "/c"}]}
            }"#,
        )
        .expect("parse");
        assert_eq!(collection.item_links, vec!["/b", "/c"]);
        assert_eq!(collection.name, "Drives");
    }

    #[test]
    fn members_are_used_without_links() {
        let collection: Collection = serde_json::from_str(
            r#"{"Members": [{"@odata.id": "/a"}, {"href": "/b"}], "Members@odata.count": 2,
                "Members@odata.nextLink": "/redfish/v1/Systems?$skip=2"}"#,
        )
        .expect("parse");
        assert_eq!(collection.item_links, vec!["/a", "/b"]);
        assert_eq!(collection.count, Some(2));
        assert_eq!(
            collection.members_next_link.as_deref(),
            Some("/redfish/v1/Systems?$skip=2")
        );
    }

    #[test]
    fn empty_collection() {
        let collection: Collection =
            serde_json::from_str(r#"{"Members": [], "Members@odata.count": 0}"#).expect("parse");
        assert!(collection.item_links.is_empty());
    }

    #[test]
    fn fetch_all_partitions_results() {
        let links: Vec<String> = (0..10).map(|i| format!("/item/{i}")).collect();
        let members = fetch_all(links, 3, |link| {
            if link.ends_with('7') {
                Err(Error::InvalidArgument("boom"))
            } else {
                Ok(link.to_owned())
            }
        });
        assert_eq!(members.items.len(), 9);
        assert_eq!(members.failures.len(), 1);
        assert!(members.failures.failures.contains_key("/item/7"));
    }

    #[test]
    fn fetch_all_respects_fan_out() {
        let running = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let links: Vec<String> = (0..12).map(|i| i.to_string()).collect();
        let members = fetch_all(links, 3, |link| {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            running.fetch_sub(1, Ordering::SeqCst);
            Ok(link.to_owned())
        });
        assert_eq!(members.items.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }
}
