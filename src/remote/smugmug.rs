//! SmugMug API 1.2.2 client
//!
//! Method calls are form posts against the JSON endpoint; every response
//! carries a `stat` field that is either `ok` or `fail` with a code and a
//! message. Uploads are raw PUTs of the file body to the upload endpoint
//! with `X-Smug-*` headers.

use super::RemoteApi;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{Album, AlbumDetails, Extras, ImageInfo, RemoteItem, Session};
use chrono::NaiveDateTime;
use reqwest::Url;
use reqwest::blocking::{Body, Client};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, trace, warn};

const API_VERSION: &str = "1.2.2";

/// Failure code the service uses for "no results"
const EMPTY_SET: i64 = 15;

/// Format of image dates reported by `smugmug.images.getInfo`
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Blocking HTTP client for the SmugMug 1.2.2 API
pub struct SmugMugClient {
    client: Client,
    api_key: String,
    api_url: String,
    upload_url: String,
}

impl SmugMugClient {
    pub fn new(api_key: impl Into<String>, config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("smugline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            api_url: config.api_url.clone(),
            upload_url: config.upload_url.clone(),
        })
    }

    /// Invoke an API method and return the decoded body of a successful call
    fn call(
        &self,
        method: &str,
        session: Option<&Session>,
        params: &[(&str, String)],
    ) -> Result<Value> {
        let mut form: Vec<(&str, String)> = vec![
            ("method", method.to_string()),
            ("APIKey", self.api_key.clone()),
        ];
        if let Some(session) = session {
            form.push(("SessionID", session.id.clone()));
        }
        form.extend(params.iter().cloned());

        debug!(method, "Calling remote API");
        let body: Value = self
            .client
            .post(&self.api_url)
            .form(&form)
            .send()?
            .error_for_status()?
            .json()?;

        check_stat(method, body)
    }

    /// Like [`Self::call`], but an "empty set" failure yields `None`
    fn call_list(
        &self,
        method: &str,
        session: &Session,
        params: &[(&str, String)],
    ) -> Result<Option<Value>> {
        empty_set_as_none(method, self.call(method, Some(session), params))
    }
}

impl RemoteApi for SmugMugClient {
    fn login(&self, email: &str, password: &str) -> Result<Session> {
        let params = [
            ("EmailAddress", email.to_string()),
            ("Password", password.to_string()),
        ];
        let body = self
            .call("smugmug.login.withPassword", None, &params)
            .map_err(login_error)?;
        parse_session(&body)
    }

    fn list_albums(&self, session: &Session) -> Result<Vec<Album>> {
        let params = [("NickName", session.nickname.clone())];
        let Some(body) = self.call_list("smugmug.albums.get", session, &params)? else {
            return Ok(Vec::new());
        };

        body.get("Albums")
            .and_then(Value::as_array)
            .ok_or_else(|| response_error("smugmug.albums.get", "missing Albums"))?
            .iter()
            .map(parse_album)
            .collect()
    }

    fn create_album(&self, session: &Session, title: &str, public: bool) -> Result<Album> {
        let method = "smugmug.albums.create";
        let params = [("Title", title.to_string()), ("Public", public.to_string())];
        let body = self.call(method, Some(session), &params)?;
        let created = body
            .get("Album")
            .ok_or_else(|| response_error(method, "missing Album"))?;

        Ok(Album {
            id: required_i64(method, created, "id")?,
            key: required_str(method, created, "Key")?,
            title: title.to_string(),
            is_public: public,
            url: optional_str(created, "URL"),
        })
    }

    fn album_info(&self, session: &Session, album: &Album) -> Result<AlbumDetails> {
        let params = [
            ("AlbumID", album.id.to_string()),
            ("AlbumKey", album.key.clone()),
        ];
        let body = self.call("smugmug.albums.getInfo", Some(session), &params)?;
        Ok(AlbumDetails {
            url: body.get("Album").and_then(|a| optional_str(a, "URL")),
        })
    }

    fn list_images(
        &self,
        session: &Session,
        album: &Album,
        extras: Extras,
    ) -> Result<Vec<RemoteItem>> {
        let method = "smugmug.images.get";
        let mut params = vec![
            ("AlbumID", album.id.to_string()),
            ("AlbumKey", album.key.clone()),
        ];
        let extras = extras.to_param();
        if !extras.is_empty() {
            params.push(("Extras", extras));
        }

        let Some(body) = self.call_list(method, session, &params)? else {
            return Ok(Vec::new());
        };

        body.get("Album")
            .and_then(|a| a.get("Images"))
            .and_then(Value::as_array)
            .ok_or_else(|| response_error(method, "missing Album.Images"))?
            .iter()
            .map(parse_image)
            .collect()
    }

    fn upload_image(
        &self,
        session: &Session,
        album: &Album,
        path: &Path,
        digest: &str,
        metadata: &Map<String, Value>,
    ) -> Result<()> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::FileName(path.display().to_string()))?;

        let mut headers = upload_headers(metadata);
        let fixed: [(&'static str, String); 6] = [
            ("content-md5", digest.to_string()),
            ("x-smug-sessionid", session.id.clone()),
            ("x-smug-version", API_VERSION.to_string()),
            ("x-smug-responsetype", "JSON".to_string()),
            ("x-smug-albumid", album.id.to_string()),
            ("x-smug-filename", file_name.to_string()),
        ];
        for (name, value) in fixed {
            let value = HeaderValue::from_str(&value).map_err(|e| Error::Header {
                name: name.to_string(),
                message: e.to_string(),
            })?;
            headers.insert(HeaderName::from_static(name), value);
        }

        let file = File::open(path)?;
        let length = file.metadata()?.len();
        let url = upload_endpoint(&self.upload_url, file_name)?;

        let body: Value = self
            .client
            .put(url)
            .headers(headers)
            .body(Body::sized(file, length))
            .send()?
            .error_for_status()?
            .json()?;

        check_stat("upload", body).map(|_| ())
    }

    fn delete_image(&self, session: &Session, image: &RemoteItem) -> Result<()> {
        let params = [("ImageID", image.id.to_string())];
        self.call("smugmug.images.delete", Some(session), &params)?;
        Ok(())
    }

    fn image_info(&self, session: &Session, image_key: &str) -> Result<ImageInfo> {
        let params = [("ImageKey", image_key.to_string())];
        let body = self.call("smugmug.images.getInfo", Some(session), &params)?;
        let captured_at = body
            .get("Image")
            .and_then(|i| i.get("Date"))
            .and_then(Value::as_str)
            .and_then(parse_date);
        Ok(ImageInfo { captured_at })
    }

    fn open_original(&self, _session: &Session, url: &str) -> Result<Box<dyn Read>> {
        let response = self.client.get(url).send()?.error_for_status()?;
        Ok(Box::new(response))
    }
}

/// Turn pass-through metadata into `X-Smug-<Field>` headers
///
/// Values that cannot be sent as a header are dropped with a warning.
fn upload_headers(metadata: &Map<String, Value>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (field, value) in metadata {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Null => continue,
            other => other.to_string(),
        };
        match (
            HeaderName::from_bytes(format!("X-Smug-{}", field).as_bytes()),
            HeaderValue::from_str(&text),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(field, "Metadata field cannot be sent as a header, dropping"),
        }
    }
    headers
}

/// Append `file_name` to the upload endpoint as one escaped path segment
fn upload_endpoint(base: &str, file_name: &str) -> Result<Url> {
    let mut url =
        Url::parse(base).map_err(|e| Error::Config(format!("Invalid upload_url {}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("upload_url {} cannot take a path", base)))?
        .pop_if_empty()
        .push(file_name);
    Ok(url)
}

/// The service answers a listing with nothing in it as a failure with
/// code 15; treat that as an empty result
fn empty_set_as_none(method: &str, response: Result<Value>) -> Result<Option<Value>> {
    match response {
        Ok(body) => Ok(Some(body)),
        Err(Error::Api { code: EMPTY_SET, .. }) => {
            trace!(method, "Remote reported an empty set");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Any failure the service reports for a login is a credentials problem
fn login_error(err: Error) -> Error {
    match err {
        Error::Api { message, .. } => Error::Auth(message),
        other => other,
    }
}

fn check_stat(method: &str, body: Value) -> Result<Value> {
    match body.get("stat").and_then(Value::as_str) {
        Some("ok") => Ok(body),
        Some("fail") => Err(Error::Api {
            code: body.get("code").and_then(Value::as_i64).unwrap_or(-1),
            message: body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        }),
        _ => Err(response_error(method, "missing stat")),
    }
}

fn parse_session(body: &Value) -> Result<Session> {
    let method = "smugmug.login.withPassword";
    let login = body
        .get("Login")
        .ok_or_else(|| response_error(method, "missing Login"))?;
    let session = login
        .get("Session")
        .ok_or_else(|| response_error(method, "missing Login.Session"))?;
    let user = login
        .get("User")
        .ok_or_else(|| response_error(method, "missing Login.User"))?;

    Ok(Session {
        id: required_str(method, session, "id")?,
        nickname: required_str(method, user, "NickName")?,
    })
}

fn parse_album(value: &Value) -> Result<Album> {
    let method = "smugmug.albums.get";
    Ok(Album {
        id: required_i64(method, value, "id")?,
        key: required_str(method, value, "Key")?,
        title: optional_str(value, "Title").unwrap_or_default(),
        is_public: value.get("Public").and_then(Value::as_bool).unwrap_or(false),
        url: optional_str(value, "URL"),
    })
}

fn parse_image(value: &Value) -> Result<RemoteItem> {
    let method = "smugmug.images.get";
    Ok(RemoteItem {
        id: required_i64(method, value, "id")?,
        key: required_str(method, value, "Key")?,
        file_name: optional_str(value, "FileName").unwrap_or_default(),
        content_digest: optional_str(value, "MD5Sum").unwrap_or_default(),
        original_url: optional_str(value, "OriginalURL"),
        captured_at: optional_str(value, "Date").as_deref().and_then(parse_date),
    })
}

fn parse_date(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, DATE_FORMAT).ok()
}

fn required_i64(method: &str, value: &Value, field: &str) -> Result<i64> {
    value
        .get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| response_error(method, &format!("missing numeric field {}", field)))
}

fn required_str(method: &str, value: &Value, field: &str) -> Result<String> {
    optional_str(value, field)
        .ok_or_else(|| response_error(method, &format!("missing field {}", field)))
}

fn optional_str(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}

fn response_error(method: &str, message: &str) -> Error {
    Error::Response {
        method: method.to_string(),
        message: message.to_string(),
    }
}
