//! Page providers: where portal content comes from.
//!
//! [`FormProvider`] drives the beneficiary portal's CSRF-protected form
//! endpoint over HTTP. [`DumpProvider`] replays pages saved to disk, which is
//! how the text portals (whose pages arrive out of band) and offline runs are
//! fed.

use async_trait::async_trait;
use janseva_core::{Error, PageContent, PageProvider, Result};
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

// The portal rejects clients that do not look like a desktop browser.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const FORM_PATH: &str = "/Services/DynamicControlsDataSet";
const CSRF_PATTERN: &str = r#"name="__RequestVerificationToken"[^>]*value="([^"]+)""#;

fn beneficiary_endpoint_from_env() -> String {
    std::env::var("JANSEVA_BENEFICIARY_ENDPOINT")
        .ok()
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "https://jansoochna.rajasthan.gov.in".to_string())
}

fn transport(e: reqwest::Error) -> Error {
    Error::Transport(e.to_string())
}

/// Fetches beneficiary payloads: GET the form page, lift the verification
/// token out of the HTML, POST the search form, decode the JSON answer.
/// Cookies must persist across the two requests or the token is rejected.
pub struct FormProvider {
    client: reqwest::Client,
    base: String,
    csrf: Regex,
}

impl FormProvider {
    pub fn from_env() -> Result<Self> {
        Self::new(beneficiary_endpoint_from_env())
    }

    pub fn new(base: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .cookie_store(true)
            .build()
            .map_err(transport)?;
        let csrf =
            Regex::new(CSRF_PATTERN).map_err(|e| Error::Parse(format!("csrf pattern: {e}")))?;
        Ok(Self {
            client,
            base: base.into(),
            csrf,
        })
    }

    fn form_url(&self) -> String {
        format!("{}{}", self.base, FORM_PATH)
    }

    /// The full dynamic-controls field set the portal's own page submits.
    /// Everything is fixed except the identifier, which rides in the second
    /// control's value and again in `SelectedValue`.
    fn form_fields(&self, token: &str, identifier: &str) -> Vec<(&'static str, String)> {
        vec![
            ("__RequestVerificationToken", token.to_string()),
            ("serviceID", "5s6nLtXarUM=".to_string()),
            ("machineId", String::new()),
            ("ipAddress", String::new()),
            ("_ListDynamicControlParent[0].EncryptedID", "AScGcOfnRUA=".to_string()),
            ("_ListDynamicControlParent[0].DateFormat", String::new()),
            ("_ListDynamicControlParent[0].Control_Type", "RADIO".to_string()),
            ("_ListDynamicControlParent[0].EncryptedValue", String::new()),
            ("_ListDynamicControlParent[0].Submit_Sequence", "0".to_string()),
            ("_ListDynamicControlParent[0].English_Control_Name", "प्रकार चुनें".to_string()),
            ("रजिस्ट्रेशन नंबर", String::new()),
            ("आधार नंबर", String::new()),
            ("प्रकार_चुनें", "False".to_string()),
            ("जन-आधार नंबर", String::new()),
            ("_ListDynamicControlParent[1].EncryptedID", "UEecLGeEG1g=".to_string()),
            ("_ListDynamicControlParent[1].DateFormat", String::new()),
            ("_ListDynamicControlParent[1].Control_Type", "TEXTBOX".to_string()),
            ("_ListDynamicControlParent[1].EncryptedValue", String::new()),
            ("_ListDynamicControlParent[1].Submit_Sequence", "4".to_string()),
            ("_ListDynamicControlParent[1].English_Control_Name", "आई डी नंबर दर्ज़ करें".to_string()),
            ("_ListDynamicControlParent[1].ControlValue", identifier.to_string()),
            ("_ListDynamicControlParent[2].EncryptedID", "yXsOYFWCGD0=".to_string()),
            ("_ListDynamicControlParent[2].DateFormat", String::new()),
            ("_ListDynamicControlParent[2].Control_Type", "BUTTON".to_string()),
            ("_ListDynamicControlParent[2].EncryptedValue", String::new()),
            ("_ListDynamicControlParent[2].Submit_Sequence", "7".to_string()),
            ("_ListDynamicControlParent[2].English_Control_Name", "खोजें".to_string()),
            // "seletedValue" is the portal's own typo; it is load-bearing.
            ("seletedValue", "yXsOYFWCGD0=".to_string()),
            ("value", "c2dXlstdFew=".to_string()),
            ("selectedClass", "08DTNHkX+SU=".to_string()),
            ("RequiredValue", "false".to_string()),
            ("SelectedValue", format!("आई डी नंबर दर्ज़ करें:{identifier}")),
        ]
    }
}

#[async_trait]
impl PageProvider for FormProvider {
    async fn fetch(&self, identifier: &str) -> Result<PageContent> {
        let url = self.form_url();

        let page = self.client.get(&url).send().await.map_err(transport)?;
        if !page.status().is_success() {
            return Err(Error::Transport(format!(
                "form page returned {}",
                page.status()
            )));
        }
        let html = page.text().await.map_err(transport)?;
        let token = self
            .csrf
            .captures(&html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| Error::Form("no verification token on the form page".to_string()))?;

        let response = self
            .client
            .post(&url)
            .header("Origin", &self.base)
            .header("Referer", &url)
            .header("X-Requested-With", "XMLHttpRequest")
            .form(&self.form_fields(&token, identifier))
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(Error::Transport(format!(
                "search returned {}",
                response.status()
            )));
        }
        let body = response.text().await.map_err(transport)?;
        parse_portal_json(&body)
    }
}

/// The portal serializes its answer twice: the body is a JSON string whose
/// content is the actual JSON object. Single-encoded answers also occur.
pub fn parse_portal_json(body: &str) -> Result<PageContent> {
    let first: serde_json::Value =
        serde_json::from_str(body).map_err(|e| Error::Parse(format!("response body: {e}")))?;
    let value = match first {
        serde_json::Value::String(inner) => serde_json::from_str(&inner)
            .map_err(|e| Error::Parse(format!("inner response body: {e}")))?,
        other => other,
    };
    match value {
        serde_json::Value::Object(map) => Ok(PageContent::Structured(map)),
        _ => Err(Error::Parse("response is not a JSON object".to_string())),
    }
}

/// Replays saved pages from a directory: `<id>.json` for structured payloads,
/// `<id>.txt` for page text (blocks separated by blank lines).
pub struct DumpProvider {
    root: PathBuf,
}

impl DumpProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn split_blocks(body: &str) -> Vec<String> {
    body.split("\n\n")
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl PageProvider for DumpProvider {
    async fn fetch(&self, identifier: &str) -> Result<PageContent> {
        let json_path = self.root.join(format!("{identifier}.json"));
        match tokio::fs::read_to_string(&json_path).await {
            Ok(body) => return parse_portal_json(&body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::Transport(format!("{}: {e}", json_path.display()))),
        }

        let txt_path = self.root.join(format!("{identifier}.txt"));
        match tokio::fs::read_to_string(&txt_path).await {
            Ok(body) => Ok(PageContent::Text(split_blocks(&body))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NoData(format!("no saved page for {identifier}")))
            }
            Err(e) => Err(Error::Transport(format!("{}: {e}", txt_path.display()))),
        }
    }
}
