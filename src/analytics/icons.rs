use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use eframe::egui::ColorImage;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const ICON_OVERRIDES: &[(&str, &str, &str)] = &[(
    "EURC",
    "GDHU6WRG4IEQXM5NZ4BMPKOXHW76MZM4Y2IEMFDVXBSDP6SJY4ITNPP2",
    "https://www.circle.com/eurc-icon",
)];

const NATIVE_CODE: &str = "XLM";

#[derive(Clone, Debug)]
pub struct AssetMeta {
    pub home_domain: Option<String>,
    pub url: String,
    pub image: Arc<ColorImage>,
}

#[derive(Debug, Error)]
pub enum IconError {
    #[error("icon request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid stellar.toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("icon could not be decoded: {0}")]
    Image(#[from] image::ImageError),
}

pub trait IconResolver: Send + Sync {
    fn resolve(&self, code: &str, issuer: &str) -> Result<Option<AssetMeta>, IconError>;
}

#[derive(Deserialize)]
struct HorizonAccount {
    #[serde(default)]
    home_domain: Option<String>,
}

#[derive(Deserialize)]
struct StellarToml {
    #[serde(default, rename = "CURRENCIES")]
    currencies: Vec<CurrencyEntry>,
}

#[derive(Deserialize)]
struct CurrencyEntry {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    issuer: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

fn currency_image(toml_text: &str, code: &str, issuer: &str) -> Result<Option<String>, IconError> {
    let parsed: StellarToml = toml::from_str(toml_text)?;
    Ok(parsed
        .currencies
        .into_iter()
        .find(|entry| {
            entry.code.as_deref() == Some(code) && entry.issuer.as_deref() == Some(issuer)
        })
        .and_then(|entry| entry.image))
}

fn decode_image(bytes: &[u8]) -> Result<ColorImage, IconError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

pub struct HorizonIconResolver {
    horizon_url: String,
    client: reqwest::blocking::Client,
    cache: Mutex<HashMap<String, Option<AssetMeta>>>,
}

impl HorizonIconResolver {
    pub fn new(horizon_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            horizon_url: horizon_url.trim_end_matches('/').to_owned(),
            client,
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn fetch_text(&self, url: &str) -> Result<String, IconError> {
        Ok(self.client.get(url).send()?.error_for_status()?.text()?)
    }

    fn image_url(&self, code: &str, issuer: &str) -> Result<Option<(Option<String>, String)>, IconError> {
        if let Some((_, _, url)) = ICON_OVERRIDES
            .iter()
            .find(|(known_code, known_issuer, _)| *known_code == code && *known_issuer == issuer)
        {
            return Ok(Some((None, (*url).to_owned())));
        }

        let account_url = format!("{}/accounts/{issuer}", self.horizon_url);
        let account: HorizonAccount = self
            .client
            .get(&account_url)
            .send()?
            .error_for_status()?
            .json()?;
        let Some(home_domain) = account.home_domain.filter(|domain| !domain.is_empty()) else {
            return Ok(None);
        };

        let toml_text = self.fetch_text(&format!("https://{home_domain}/.well-known/stellar.toml"))?;
        Ok(currency_image(&toml_text, code, issuer)?.map(|url| (Some(home_domain), url)))
    }

    fn resolve_uncached(&self, code: &str, issuer: &str) -> Result<Option<AssetMeta>, IconError> {
        if code == NATIVE_CODE || issuer.is_empty() {
            return Ok(None);
        }

        let Some((home_domain, url)) = self.image_url(code, issuer)? else {
            return Ok(None);
        };

        debug!(code, issuer, %url, "downloading asset icon");
        let bytes = self.client.get(&url).send()?.error_for_status()?.bytes()?;
        let image = decode_image(&bytes)?;

        Ok(Some(AssetMeta {
            home_domain,
            url,
            image: Arc::new(image),
        }))
    }
}

impl IconResolver for HorizonIconResolver {
    fn resolve(&self, code: &str, issuer: &str) -> Result<Option<AssetMeta>, IconError> {
        let cache_key = format!("{code}:{issuer}");
        if let Ok(cache) = self.cache.lock()
            && let Some(cached) = cache.get(&cache_key)
        {
            return Ok(cached.clone());
        }

        let resolved = self.resolve_uncached(code, issuer)?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(cache_key, resolved.clone());
        }
        Ok(resolved)
    }
}
