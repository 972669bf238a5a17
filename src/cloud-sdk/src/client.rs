use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::SdkError;

/// Authenticated HTTP transport shared by every higher-level client.
///
/// Requests are sent with HTTP basic credentials (`key:secret`). Paths are joined
/// onto the base URL unless they are already absolute, which lets callers follow
/// the `next` links returned by paginated endpoints.
#[derive(Clone)]
pub struct HttpTransport {
    base_url: String,
    key: String,
    secret: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("key", &self.key)
            .field("secret", &"***")
            .finish()
    }
}

impl HttpTransport {
    /// Create a new transport pointing at the given base URL
    pub fn new(
        base_url: &str,
        key: &str,
        secret: &str,
        request_timeout: Duration,
    ) -> Result<Self, SdkError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self::with_client(base_url, key, secret, http))
    }

    /// Create a transport around an existing `reqwest` client
    pub fn with_client(base_url: &str, key: &str, secret: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            secret: secret.to_string(),
            http,
        }
    }

    /// Send a GET request and deserialize the response
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, SdkError> {
        let request = self.request(Method::GET, path);
        self.send(Method::GET, path, request).await
    }

    /// Send a GET request with query parameters and deserialize the response
    pub async fn get_with_query<Q, T>(&self, path: &str, query: &Q) -> Result<T, SdkError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::GET, path).query(query);
        self.send(Method::GET, path, request).await
    }

    /// Send a POST request with a JSON body and deserialize the response
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, SdkError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path).json(body);
        self.send(Method::POST, path, request).await
    }

    /// Send a POST request with query parameters and a JSON body
    pub async fn post_with_query<Q, B, T>(&self, path: &str, query: &Q, body: &B) -> Result<T, SdkError>
    where
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path).query(query).json(body);
        self.send(Method::POST, path, request).await
    }

    /// Send a DELETE request, expecting no response body
    pub async fn delete(&self, path: &str) -> Result<(), SdkError> {
        let resp = self.request(Method::DELETE, path).send().await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(api_error(Method::DELETE, resp).await)
        }
    }

    /// Send a DELETE request with query parameters and deserialize the response
    pub async fn delete_with_query<Q, T>(&self, path: &str, query: &Q) -> Result<T, SdkError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::DELETE, path).query(query);
        self.send(Method::DELETE, path, request).await
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{path}", self.base_url)
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.url(path))
            .basic_auth(&self.key, Some(&self.secret))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SdkError> {
        log::debug!("{method} {}", self.url(path));
        let resp = request.send().await?;
        handle_response(method, resp).await
    }
}

#[derive(serde::Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(serde::Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    detail: Option<String>,
}

async fn handle_response<T: DeserializeOwned>(
    method: Method,
    resp: reqwest::Response,
) -> Result<T, SdkError> {
    if resp.status().is_success() {
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    } else {
        Err(api_error(method, resp).await)
    }
}

async fn api_error(method: Method, resp: reqwest::Response) -> SdkError {
    let status = resp.status().as_u16();
    let url = resp.url().to_string();
    let text = resp.text().await.unwrap_or_default();
    SdkError::Api {
        method: method.to_string(),
        url,
        status,
        message: error_message(text),
    }
}

fn error_message(text: String) -> String {
    match serde_json::from_str::<ApiErrorBody>(&text) {
        Ok(ApiErrorBody {
            message: Some(message),
            ..
        }) => message,
        Ok(body) => body
            .errors
            .into_iter()
            .find_map(|e| e.detail)
            .unwrap_or(text),
        Err(_) => text,
    }
}
