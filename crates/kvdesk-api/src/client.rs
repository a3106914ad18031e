use std::time::Duration;

use kvdesk_core::{
    DirectoryListing, KvError, Record, RecordStore, Result, SearchHit, StoreConfig,
};
use reqwest::Method;
use reqwest::blocking::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::wire::{self, Envelope};

/// [`RecordStore`] backed by the store's HTTP API.
pub struct HttpStore {
    base_url: String,
    client: Client,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KvError::Network(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn record_url(&self, key: &str) -> String {
        format!("{}/api/record/{}", self.base_url, urlencoding::encode(key))
    }

    fn call<T, B>(&self, method: Method, url: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        log::debug!("{method} {url}");
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .map_err(|e| KvError::Network(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|e| KvError::Network(e.to_string()))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<Envelope<wire::Ack>>(&text)
                .ok()
                .and_then(Envelope::detail);
            return Err(KvError::Network(match detail {
                Some(detail) => format!("HTTP {status}: {detail}"),
                None => format!("HTTP {status}"),
            }));
        }

        let envelope: Envelope<T> = serde_json::from_str(&text)?;
        envelope.into_result()
    }

    fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.call::<T, ()>(Method::GET, url, None)
    }
}

impl RecordStore for HttpStore {
    fn list_keys(&self) -> Result<Vec<String>> {
        let keys: wire::Keys = self.get(&format!("{}/api/keys", self.base_url))?;
        Ok(keys.keys)
    }

    fn fetch_record(&self, key: &str) -> Result<Record> {
        let data: wire::RecordData = self.get(&self.record_url(key))?;
        data.data
            .ok_or_else(|| KvError::Api(format!("No data returned for \"{key}\"")))
    }

    fn update_record(&self, key: &str, value: &str) -> Result<()> {
        self.call::<wire::Ack, _>(
            Method::PUT,
            &self.record_url(key),
            Some(&wire::UpdateRecord { value }),
        )?;
        Ok(())
    }

    fn delete_record(&self, key: &str) -> Result<()> {
        self.call::<wire::Ack, ()>(Method::DELETE, &self.record_url(key), None)?;
        Ok(())
    }

    fn search(&self, term: &str) -> Result<Vec<SearchHit>> {
        let url = format!(
            "{}/api/search?q={}",
            self.base_url,
            urlencoding::encode(term)
        );
        let found: wire::SearchResults = self.get(&url)?;
        Ok(found.results)
    }

    fn get_config(&self) -> Result<StoreConfig> {
        let config: wire::Config = self.get(&format!("{}/api/config", self.base_url))?;
        Ok(config.config)
    }

    fn put_config(&self, db_path: &str) -> Result<StoreConfig> {
        let config: wire::Config = self.call(
            Method::PUT,
            &format!("{}/api/config", self.base_url),
            Some(&wire::UpdateConfig { db_path }),
        )?;
        Ok(config.config)
    }

    fn browse(&self, directory: &str) -> Result<DirectoryListing> {
        let url = format!(
            "{}/api/browse?directory={}",
            self.base_url,
            urlencoding::encode(directory)
        );
        self.get(&url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_percent_encoded_and_base_url_trimmed() {
        let store = HttpStore::new("http://localhost:5001/", Duration::from_secs(1)).unwrap();
        assert_eq!(store.base_url(), "http://localhost:5001");
        assert_eq!(
            store.record_url("a b/c?d"),
            "http://localhost:5001/api/record/a%20b%2Fc%3Fd"
        );
    }
}
